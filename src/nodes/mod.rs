//! Dialog nodes and their runtime contract
//!
//! A conversation is a group of nodes sharing a conversation name. Each
//! node carries its identity and on/off state in a [`NodeCore`] and its
//! behavior in the [`DialogNode`] hooks. Hooks return [`NodeCommand`]s
//! instead of touching the engine directly; the runner routes them, which
//! keeps node behavior testable in isolation and lets the engine iterate
//! over snapshots while nodes mutate themselves.

pub mod builtin;
pub mod factory;

use serde::{Deserialize, Serialize};

use crate::listeners::ListenerHandle;
use crate::signals::Speech;
use crate::store::RowId;

/// Language tag scoping node lookups
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Language(pub String);

impl Language {
    /// Create a language tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The tag as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Language {
    fn default() -> Self {
        Self("en".to_string())
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Language {
    fn from(tag: &str) -> Self {
        Self(tag.to_string())
    }
}

impl From<String> for Language {
    fn from(tag: String) -> Self {
        Self(tag)
    }
}

/// Identity and shared state every node carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeCore {
    /// Conversation this node belongs to
    pub conversation: String,

    /// Node name, unique within conversation and language
    pub name: String,

    /// Language variant of this node
    pub language: Language,

    /// Storage row backing this node
    pub row: RowId,

    /// Whether the node is currently active
    pub is_on: bool,
}

impl NodeCore {
    /// Create the core for a freshly built node (starts off)
    pub fn new(
        conversation: impl Into<String>,
        name: impl Into<String>,
        language: Language,
        row: RowId,
    ) -> Self {
        Self {
            conversation: conversation.into(),
            name: name.into(),
            language,
            row,
            is_on: false,
        }
    }
}

/// Listening payload of nodes that react to named events
///
/// Armed and on are independent: a node can sit off but armed (created
/// ahead of its conversation) or on but disarmed (dormant after its
/// event fired).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListeningState {
    /// Event name this node reacts to
    pub event_name: String,

    /// Scope grouping for bulk cancellation
    pub scope_node: Option<String>,

    /// Handle for targeted cancellation
    pub handle: ListenerHandle,

    /// Whether the node currently reacts to its event
    pub is_listening: bool,
}

impl ListeningState {
    /// Create a disarmed listening state with a fresh handle
    pub fn new(event_name: impl Into<String>, scope_node: Option<String>) -> Self {
        Self {
            event_name: event_name.into(),
            scope_node,
            handle: ListenerHandle::new(),
            is_listening: false,
        }
    }

    /// Start reacting to the event
    pub fn arm(&mut self) {
        self.is_listening = true;
    }

    /// Stop reacting, keeping the registration
    pub fn disarm(&mut self) {
        self.is_listening = false;
    }
}

/// Effects a node hands back to the runner for routing
#[derive(Debug, Clone)]
pub enum NodeCommand {
    /// Activate a sibling node by name, same conversation and language
    Activate(String),

    /// Deliver a line of speech to the subscribers
    Speak(Speech),

    /// Raise a named event through the dispatcher
    RaiseEvent(String),

    /// Soft-end the conversation: listeners disarm, nodes stay registered
    EndConversation,
}

/// Runtime contract for dialog nodes
pub trait DialogNode: Send {
    /// Shared identity and state
    fn core(&self) -> &NodeCore;

    /// Mutable access to the shared state
    fn core_mut(&mut self) -> &mut NodeCore;

    /// Kind tag this node was constructed under
    fn kind(&self) -> &'static str;

    /// Whether this node can start its conversation
    fn is_entry(&self) -> bool {
        false
    }

    /// Listening payload, if this node reacts to events
    fn listening(&self) -> Option<&ListeningState> {
        None
    }

    /// Mutable listening payload
    fn listening_mut(&mut self) -> Option<&mut ListeningState> {
        None
    }

    /// Turn the node on
    fn activate(&mut self) -> Vec<NodeCommand>;

    /// Advance the node by `dt` seconds
    fn tick(&mut self, dt: f32) -> Vec<NodeCommand> {
        let _ = dt;
        Vec::new()
    }

    /// Turn the node off
    fn deactivate(&mut self) {
        self.core_mut().is_on = false;
    }

    /// React to the node's registered event
    fn on_event(&mut self) -> Vec<NodeCommand> {
        Vec::new()
    }
}
