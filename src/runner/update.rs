//! Frame advancement and signal dispatch
//!
//! Both the update loop and event dispatch iterate over snapshots taken
//! up front, then re-check each node as they reach it. Nodes removed
//! mid-iteration are skipped; nodes created mid-iteration wait for the
//! next call.

use tracing::{debug, info};

use crate::error::DialogResult;
use crate::nodes::{Language, NodeCommand};
use crate::runner::DialogRunner;
use crate::signals::Speech;
use crate::store::RowId;

impl DialogRunner {
    /// Advance every active node by `dt` seconds
    pub fn update(&mut self, dt: f32) -> DialogResult<()> {
        for row in self.nodes.rows_snapshot() {
            let Some(node) = self.nodes.node_by_row_mut(row) else {
                continue;
            };
            if !node.core().is_on {
                continue;
            }

            let conversation = node.core().conversation.clone();
            let language = node.core().language.clone();
            let commands = node.tick(dt);
            self.apply_commands(&conversation, &language, commands)?;
        }

        Ok(())
    }

    /// Raise a named event
    ///
    /// Listening nodes react first, in registration order, then the
    /// generic subscribers are notified. Only nodes that are still
    /// present and armed for this name when dispatch reaches them react.
    pub fn emit_event(&mut self, name: &str) -> DialogResult<()> {
        let mut reactions = 0usize;
        for entry in self.listeners.snapshot() {
            let Some(node) = self.nodes.node_by_row_mut(entry.row) else {
                continue;
            };
            let armed = node
                .listening()
                .is_some_and(|listening| listening.is_listening && listening.event_name == name);
            if !armed {
                continue;
            }

            let conversation = node.core().conversation.clone();
            let language = node.core().language.clone();
            let commands = node.on_event();
            self.apply_commands(&conversation, &language, commands)?;
            reactions += 1;
        }

        let notified = self.hub.emit_event(name);
        if reactions == 0 && notified == 0 {
            debug!(event = %name, "event emitted with no reactions");
        } else {
            info!(event = %name, reactions, notified, "event dispatched");
        }

        Ok(())
    }

    /// Deliver a line of speech to the subscribers
    pub fn emit_speech(&mut self, speech: &Speech) {
        self.hub.emit_speech(speech);
    }

    /// Raise the focus signal for a conversation
    pub fn focus_conversation(&mut self, conversation: &str) -> DialogResult<()> {
        self.hub.notify_focus(conversation)?;
        debug!(conversation = %conversation, "focus raised");
        Ok(())
    }

    /// Raise the defocus signal for a conversation
    pub fn defocus_conversation(&mut self, conversation: &str) -> DialogResult<()> {
        self.hub.notify_defocus(conversation)?;
        debug!(conversation = %conversation, "defocus raised");
        Ok(())
    }

    /// Activate the node at `row` and route what it hands back
    pub(super) fn activate_row(&mut self, row: RowId) -> DialogResult<()> {
        let Some(node) = self.nodes.node_by_row_mut(row) else {
            return Ok(());
        };

        let conversation = node.core().conversation.clone();
        let language = node.core().language.clone();
        debug!(conversation = %conversation, node = %node.core().name, "node activated");
        let commands = node.activate();
        self.apply_commands(&conversation, &language, commands)
    }

    /// Route commands a node handed back
    ///
    /// Activation targets resolve within the issuing node's conversation
    /// and language, and their own commands are routed in turn.
    pub(super) fn apply_commands(
        &mut self,
        conversation: &str,
        language: &Language,
        commands: Vec<NodeCommand>,
    ) -> DialogResult<()> {
        for command in commands {
            match command {
                NodeCommand::Activate(name) => {
                    let row = self.nodes.find(conversation, &name, language)?.core().row;
                    self.activate_row(row)?;
                }
                NodeCommand::Speak(speech) => self.emit_speech(&speech),
                NodeCommand::RaiseEvent(name) => self.emit_event(&name)?,
                NodeCommand::EndConversation => self.conversation_ended(conversation)?,
            }
        }

        Ok(())
    }
}
