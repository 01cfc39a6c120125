//! Listener registration bookkeeping
//!
//! Which nodes want events is tracked here, apart from the nodes
//! themselves, so dispatch can iterate a stable snapshot while reacting
//! nodes mutate the store. The registry only says who is registered;
//! whether a node actually reacts is decided by its own listening state
//! at dispatch time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::store::RowId;

/// Cancellation token for one listening node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerHandle(pub Uuid);

impl ListenerHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ListenerHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// One registered listening node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListenerEntry {
    /// Conversation the listening node belongs to
    pub conversation: String,

    /// The node's cancellation handle
    pub handle: ListenerHandle,

    /// Storage row of the listening node
    pub row: RowId,

    /// When the node was registered
    pub registered_at: DateTime<Utc>,
}

/// Registration-ordered listener bookkeeping
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    entries: Vec<ListenerEntry>,
}

impl ListenerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listening node
    pub fn register(
        &mut self,
        conversation: impl Into<String>,
        handle: ListenerHandle,
        row: RowId,
    ) {
        let conversation = conversation.into();
        debug!(conversation = %conversation, row = %row, "listener registered");
        self.entries.push(ListenerEntry {
            conversation,
            handle,
            row,
            registered_at: Utc::now(),
        });
    }

    /// Deregister every listener of a conversation, returning how many
    pub fn remove_conversation(&mut self, conversation: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.conversation != conversation);
        before - self.entries.len()
    }

    /// Whether a handle is registered for the conversation
    pub fn contains(&self, conversation: &str, handle: ListenerHandle) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.conversation == conversation && entry.handle == handle)
    }

    /// Registered entries in registration order
    pub fn entries(&self) -> &[ListenerEntry] {
        &self.entries
    }

    /// Copy of the entries, for iteration that mutates node state
    pub fn snapshot(&self) -> Vec<ListenerEntry> {
        self.entries.to_vec()
    }

    /// Rows of the conversation's registered listeners
    pub fn rows_for_conversation(&self, conversation: &str) -> Vec<RowId> {
        self.entries
            .iter()
            .filter(|entry| entry.conversation == conversation)
            .map(|entry| entry.row)
            .collect()
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
