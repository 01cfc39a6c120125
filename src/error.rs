//! Error types for the dialog runtime

use thiserror::Error;

use crate::callables::CallableKind;
use crate::signals::FocusSignal;

/// The error type for dialog runtime operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DialogError {
    /// No node with this name exists in the conversation under any language.
    #[error("node '{name}' not found in conversation '{conversation}'")]
    NodeNotFound {
        /// The conversation that was searched.
        conversation: String,
        /// The node name that was looked up.
        name: String,
    },

    /// The node exists, but not in the requested language.
    #[error(
        "node '{name}' in conversation '{conversation}' has no '{requested}' variant (available: {available})"
    )]
    NodeWrongLanguage {
        /// The conversation that was searched.
        conversation: String,
        /// The node name that was looked up.
        name: String,
        /// The language the lookup asked for.
        requested: String,
        /// Languages the node does exist under.
        available: String,
    },

    /// No node of this conversation is registered at all.
    #[error("unknown conversation '{conversation}'")]
    UnknownConversation {
        /// The conversation that was addressed.
        conversation: String,
    },

    /// The conversation has no entry node for the requested language.
    #[error("conversation '{conversation}' has no start node for language '{language}'")]
    MissingStartNode {
        /// The conversation that was started.
        conversation: String,
        /// The language the start was scoped to.
        language: String,
    },

    /// The conversation already has an active node for the requested language.
    #[error("conversation '{conversation}' is already running")]
    AlreadyRunning {
        /// The conversation that was started twice.
        conversation: String,
    },

    /// A node with this conversation, name, and language already exists.
    #[error(
        "node '{name}' already exists in conversation '{conversation}' for language '{language}'"
    )]
    DuplicateNode {
        /// The conversation the node was created in.
        conversation: String,
        /// The colliding node name.
        name: String,
        /// The colliding language variant.
        language: String,
    },

    /// No constructor is registered under this node kind tag.
    #[error("unknown node kind '{kind}'")]
    UnknownNodeKind {
        /// The kind tag that was requested.
        kind: String,
    },

    /// A node constructor rejected its payload.
    #[error("invalid payload for node kind '{kind}': {source}")]
    InvalidNodePayload {
        /// The kind tag whose constructor failed.
        kind: String,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// An expression or function was used without being registered.
    #[error("no {kind} registered under '{name}'")]
    UnregisteredCallable {
        /// Which registry the lookup was addressed to.
        kind: CallableKind,
        /// The name that was looked up.
        name: String,
    },

    /// A focus or defocus signal was raised with nobody to receive it.
    #[error("no subscriber registered for the {signal} signal")]
    MissingRequiredSubscriber {
        /// The signal that had no subscriber.
        signal: FocusSignal,
    },

    /// The script loader refused or failed to load a source string.
    #[error("script rejected: {reason}")]
    ScriptRejected {
        /// What the loader objected to.
        reason: String,
    },
}

/// A specialized Result type for dialog runtime operations.
pub type DialogResult<T> = std::result::Result<T, DialogError>;
