//! Dialog runtime engine
//!
//! This crate runs conversations as groups of named nodes. It provides:
//! - Node creation from serialized blueprints with host-registered kinds
//! - Language-scoped lookup that tells wrong language apart from absence
//! - Conversation lifecycle: start, stop, soft end, scope end, removal
//! - Event listening with scope and handle cancellation
//! - Host-registered boolean expressions and void functions
//! - Speech fan-out and mandatory focus/defocus delivery
//!
//! The engine is single threaded and suspension free: every operation
//! runs to completion on the caller's thread, and collections are
//! snapshotted before iteration so reacting nodes may mutate the engine
//! underneath. Time only advances through [`DialogRunner::update`].

pub mod callables;
pub mod error;
pub mod listeners;
pub mod loader;
pub mod nodes;
pub mod runner;
pub mod signals;
pub mod store;

// Re-export main types
pub use callables::{CallableKind, CallableRegistry, Expression, HostExpression, HostFunction};
pub use error::{DialogError, DialogResult};
pub use listeners::{ListenerEntry, ListenerHandle, ListenerRegistry};
pub use loader::ScriptLoader;
pub use nodes::builtin::{
    EntryNode, EntryPayload, LineNode, LinePayload, ListenNode, ListenPayload,
};
pub use nodes::factory::{NodeBlueprint, NodeConstructor, NodeKindRegistry};
pub use nodes::{DialogNode, Language, ListeningState, NodeCommand, NodeCore};
pub use runner::{DialogRunner, COMMAND_CONVERSATION, IS_ACTIVE};
pub use signals::{
    EventSubscriber, FocusSignal, FocusSubscriber, SignalHub, Speech, SpeechSubscriber,
    SubscriberId,
};
pub use store::{MemoryNodeTable, NodeStore, NodeTable, RowId};
