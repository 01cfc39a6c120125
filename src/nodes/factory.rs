//! Node construction from serialized blueprints
//!
//! Kinds are plain constructor functions keyed by a string tag. The
//! engine never needs to know a concrete node type; hosts describe nodes
//! as [`NodeBlueprint`]s and the registry builds them.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{DialogError, DialogResult};
use crate::nodes::builtin::{
    EntryNode, EntryPayload, LineNode, LinePayload, ListenNode, ListenPayload,
};
use crate::nodes::{DialogNode, Language, NodeCore};

/// Constructor for one node kind
pub type NodeConstructor = fn(NodeCore, &Value) -> DialogResult<Box<dyn DialogNode>>;

/// Serialized description of a node to create
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeBlueprint {
    /// Registered kind tag
    pub kind: String,

    /// Conversation the node belongs to
    pub conversation: String,

    /// Node name within the conversation
    pub name: String,

    /// Language variant
    #[serde(default)]
    pub language: Language,

    /// Kind-specific payload
    #[serde(default)]
    pub payload: Value,
}

impl NodeBlueprint {
    /// Describe a node of `kind` in `conversation` under `name`
    pub fn new(
        kind: impl Into<String>,
        conversation: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            conversation: conversation.into(),
            name: name.into(),
            language: Language::default(),
            payload: Value::Null,
        }
    }

    /// Set the language variant
    pub fn with_language(mut self, language: impl Into<Language>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the kind-specific payload
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Decode a kind payload, reading a missing payload as an empty object
pub fn decode_payload<P: DeserializeOwned>(kind: &str, payload: &Value) -> DialogResult<P> {
    let value = match payload {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other.clone(),
    };

    serde_json::from_value(value).map_err(|source| DialogError::InvalidNodePayload {
        kind: kind.to_string(),
        source,
    })
}

fn build_entry(core: NodeCore, payload: &Value) -> DialogResult<Box<dyn DialogNode>> {
    let payload: EntryPayload = decode_payload(EntryNode::KIND, payload)?;
    Ok(Box::new(EntryNode::new(core, payload)))
}

fn build_line(core: NodeCore, payload: &Value) -> DialogResult<Box<dyn DialogNode>> {
    let payload: LinePayload = decode_payload(LineNode::KIND, payload)?;
    Ok(Box::new(LineNode::new(core, payload)))
}

fn build_listen(core: NodeCore, payload: &Value) -> DialogResult<Box<dyn DialogNode>> {
    let payload: ListenPayload = decode_payload(ListenNode::KIND, payload)?;
    Ok(Box::new(ListenNode::new(core, payload)))
}

/// Registry of node constructors, keyed by kind tag
#[derive(Debug)]
pub struct NodeKindRegistry {
    constructors: HashMap<String, NodeConstructor>,
}

impl NodeKindRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Create a registry pre-seeded with the built-in kinds
    pub fn with_builtin_kinds() -> Self {
        let mut registry = Self::new();
        registry.register(EntryNode::KIND, build_entry);
        registry.register(LineNode::KIND, build_line);
        registry.register(ListenNode::KIND, build_listen);
        registry
    }

    /// Register a constructor, replacing any previous one under the tag
    pub fn register(&mut self, kind: impl Into<String>, constructor: NodeConstructor) {
        let kind = kind.into();
        debug!(kind = %kind, "node kind registered");
        self.constructors.insert(kind, constructor);
    }

    /// Build a node from its blueprint parts
    pub fn construct(
        &self,
        core: NodeCore,
        kind: &str,
        payload: &Value,
    ) -> DialogResult<Box<dyn DialogNode>> {
        let constructor =
            self.constructors
                .get(kind)
                .ok_or_else(|| DialogError::UnknownNodeKind {
                    kind: kind.to_string(),
                })?;

        constructor(core, payload)
    }

    /// Whether a constructor is registered under the tag
    pub fn contains(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }
}

impl Default for NodeKindRegistry {
    fn default() -> Self {
        Self::with_builtin_kinds()
    }
}
