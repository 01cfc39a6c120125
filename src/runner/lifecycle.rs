//! Conversation lifecycle operations
//!
//! A conversation has no stored status; whether it is registered or
//! running is derived from the nodes themselves. Every operation here
//! addresses a conversation by name and fails with `UnknownConversation`
//! when no node of that name is registered.

use tracing::{debug, info};

use crate::error::{DialogError, DialogResult};
use crate::listeners::ListenerHandle;
use crate::runner::DialogRunner;

impl DialogRunner {
    /// Start a conversation at its entry node
    ///
    /// The entry node for the current language is activated and whatever
    /// it hands back is routed. Starting a conversation that already has
    /// an active node for the current language is rejected; activity in
    /// other languages does not block a start.
    pub fn start_conversation(&mut self, conversation: &str) -> DialogResult<()> {
        if !self.nodes.has_conversation(conversation) {
            return Err(DialogError::UnknownConversation {
                conversation: conversation.to_string(),
            });
        }

        if self
            .nodes
            .active_in_conversation(conversation, &self.language)
            .is_some()
        {
            return Err(DialogError::AlreadyRunning {
                conversation: conversation.to_string(),
            });
        }

        let entry = self
            .nodes
            .entry_row(conversation, &self.language)
            .ok_or_else(|| DialogError::MissingStartNode {
                conversation: conversation.to_string(),
                language: self.language.to_string(),
            })?;

        info!(conversation = %conversation, language = %self.language, "conversation started");
        self.activate_row(entry)
    }

    /// Stop a conversation
    ///
    /// Every active node of the conversation is deactivated, in any
    /// language, and the conversation's listeners are deregistered.
    /// Stopping a conversation that is not running changes nothing.
    pub fn stop_conversation(&mut self, conversation: &str) -> DialogResult<()> {
        if !self.nodes.has_conversation(conversation) {
            return Err(DialogError::UnknownConversation {
                conversation: conversation.to_string(),
            });
        }

        let mut deactivated = 0usize;
        for row in self.nodes.rows_in_conversation(conversation) {
            if let Some(node) = self.nodes.node_by_row_mut(row) {
                if node.core().is_on {
                    node.deactivate();
                    deactivated += 1;
                }
            }
        }

        let deregistered = self.listeners.remove_conversation(conversation);
        info!(conversation = %conversation, deactivated, deregistered, "conversation stopped");
        Ok(())
    }

    /// Soft end of a conversation
    ///
    /// The conversation's registered listeners are disarmed; nodes stay
    /// registered and whatever is on stays on. This is what a node chain
    /// reaching its natural end goes through.
    pub fn conversation_ended(&mut self, conversation: &str) -> DialogResult<()> {
        if !self.nodes.has_conversation(conversation) {
            return Err(DialogError::UnknownConversation {
                conversation: conversation.to_string(),
            });
        }

        let mut disarmed = 0usize;
        for row in self.listeners.rows_for_conversation(conversation) {
            if let Some(node) = self.nodes.node_by_row_mut(row) {
                if let Some(listening) = node.listening_mut() {
                    if listening.is_listening {
                        listening.disarm();
                        disarmed += 1;
                    }
                }
            }
        }

        info!(conversation = %conversation, disarmed, "conversation ended");
        Ok(())
    }

    /// Disarm the conversation's listeners scoped under `scope`
    ///
    /// Listeners without a scope, or under another scope, stay armed.
    pub fn scope_ended(&mut self, conversation: &str, scope: &str) -> DialogResult<()> {
        if !self.nodes.has_conversation(conversation) {
            return Err(DialogError::UnknownConversation {
                conversation: conversation.to_string(),
            });
        }

        let mut disarmed = 0usize;
        for row in self.listeners.rows_for_conversation(conversation) {
            if let Some(node) = self.nodes.node_by_row_mut(row) {
                if let Some(listening) = node.listening_mut() {
                    if listening.is_listening && listening.scope_node.as_deref() == Some(scope) {
                        listening.disarm();
                        disarmed += 1;
                    }
                }
            }
        }

        info!(conversation = %conversation, scope = %scope, disarmed, "scope ended");
        Ok(())
    }

    /// Disarm the single listener registered under `handle`
    ///
    /// A handle that matches nothing is a no-op; cancelling something
    /// already gone is not a fault.
    pub fn cancel_by_handle(
        &mut self,
        conversation: &str,
        handle: ListenerHandle,
    ) -> DialogResult<()> {
        if !self.nodes.has_conversation(conversation) {
            return Err(DialogError::UnknownConversation {
                conversation: conversation.to_string(),
            });
        }

        let row = self
            .listeners
            .entries()
            .iter()
            .find(|entry| entry.conversation == conversation && entry.handle == handle)
            .map(|entry| entry.row);

        match row {
            Some(row) => {
                if let Some(node) = self.nodes.node_by_row_mut(row) {
                    if let Some(listening) = node.listening_mut() {
                        listening.disarm();
                        debug!(conversation = %conversation, "listener cancelled by handle");
                    }
                }
            }
            None => {
                debug!(conversation = %conversation, "cancel by handle matched nothing");
            }
        }

        Ok(())
    }

    /// Remove a conversation entirely: nodes, listeners, and backing rows
    pub fn remove_conversation(&mut self, conversation: &str) -> DialogResult<()> {
        if !self.nodes.has_conversation(conversation) {
            return Err(DialogError::UnknownConversation {
                conversation: conversation.to_string(),
            });
        }

        self.listeners.remove_conversation(conversation);
        let rows = self.nodes.remove_conversation(conversation);
        for row in &rows {
            self.table.remove_row(*row);
        }

        info!(conversation = %conversation, nodes = rows.len(), "conversation removed");
        Ok(())
    }
}
