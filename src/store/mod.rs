//! Node store and lookup
//!
//! Live nodes are held in creation order, which is also the order the
//! update loop ticks them in. Lookups are linear scans; node counts stay
//! dialogue sized. A lookup that misses tells the caller whether the
//! node exists under another language or not at all.

pub mod table;

pub use table::{MemoryNodeTable, NodeTable, RowId};

use crate::error::{DialogError, DialogResult};
use crate::nodes::{DialogNode, Language};

/// Creation-ordered collection of live nodes
#[derive(Default)]
pub struct NodeStore {
    nodes: Vec<Box<dyn DialogNode>>,
}

impl NodeStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the store holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Live nodes in creation order
    pub fn iter(&self) -> impl Iterator<Item = &dyn DialogNode> {
        self.nodes.iter().map(|node| node.as_ref())
    }

    /// Insert a node, enforcing name uniqueness per conversation and language
    pub fn insert(&mut self, node: Box<dyn DialogNode>) -> DialogResult<()> {
        let core = node.core();
        if self
            .get(&core.conversation, &core.name, &core.language)
            .is_some()
        {
            return Err(DialogError::DuplicateNode {
                conversation: core.conversation.clone(),
                name: core.name.clone(),
                language: core.language.to_string(),
            });
        }

        self.nodes.push(node);
        Ok(())
    }

    fn get(&self, conversation: &str, name: &str, language: &Language) -> Option<&dyn DialogNode> {
        self.nodes
            .iter()
            .find(|node| {
                let core = node.core();
                core.conversation == conversation && core.name == name && core.language == *language
            })
            .map(|node| node.as_ref())
    }

    /// Find a node by its full conversation, name, and language triple
    ///
    /// A miss distinguishes wrong language from absence: when the name
    /// exists under other languages the error lists them.
    pub fn find(
        &self,
        conversation: &str,
        name: &str,
        language: &Language,
    ) -> DialogResult<&dyn DialogNode> {
        if let Some(node) = self.get(conversation, name, language) {
            return Ok(node);
        }

        let available: Vec<String> = self
            .nodes
            .iter()
            .filter(|node| {
                let core = node.core();
                core.conversation == conversation && core.name == name
            })
            .map(|node| node.core().language.to_string())
            .collect();

        if available.is_empty() {
            Err(DialogError::NodeNotFound {
                conversation: conversation.to_string(),
                name: name.to_string(),
            })
        } else {
            Err(DialogError::NodeWrongLanguage {
                conversation: conversation.to_string(),
                name: name.to_string(),
                requested: language.to_string(),
                available: available.join(", "),
            })
        }
    }

    /// Find a node by conversation and name alone, first match in creation order
    pub fn find_ignoring_language(
        &self,
        conversation: &str,
        name: &str,
    ) -> Option<&dyn DialogNode> {
        self.nodes
            .iter()
            .find(|node| {
                let core = node.core();
                core.conversation == conversation && core.name == name
            })
            .map(|node| node.as_ref())
    }

    /// The active node of a conversation for a language, if any
    pub fn active_in_conversation(
        &self,
        conversation: &str,
        language: &Language,
    ) -> Option<&dyn DialogNode> {
        self.nodes
            .iter()
            .find(|node| {
                let core = node.core();
                core.is_on && core.conversation == conversation && core.language == *language
            })
            .map(|node| node.as_ref())
    }

    /// Whether the conversation has any node registered, in any language
    pub fn has_conversation(&self, conversation: &str) -> bool {
        self.nodes
            .iter()
            .any(|node| node.core().conversation == conversation)
    }

    /// Row of the conversation's entry node for a language
    pub fn entry_row(&self, conversation: &str, language: &Language) -> Option<RowId> {
        self.nodes
            .iter()
            .find(|node| {
                let core = node.core();
                node.is_entry() && core.conversation == conversation && core.language == *language
            })
            .map(|node| node.core().row)
    }

    /// Rows of every live node, in creation order
    pub fn rows_snapshot(&self) -> Vec<RowId> {
        self.nodes.iter().map(|node| node.core().row).collect()
    }

    /// Rows of the conversation's nodes, any language, in creation order
    pub fn rows_in_conversation(&self, conversation: &str) -> Vec<RowId> {
        self.nodes
            .iter()
            .filter(|node| node.core().conversation == conversation)
            .map(|node| node.core().row)
            .collect()
    }

    /// The node backed by a row
    pub fn node_by_row(&self, row: RowId) -> Option<&dyn DialogNode> {
        self.nodes
            .iter()
            .find(|node| node.core().row == row)
            .map(|node| node.as_ref())
    }

    /// Mutable access to the node backed by a row
    pub fn node_by_row_mut(&mut self, row: RowId) -> Option<&mut dyn DialogNode> {
        // Through `map` the trait object keeps its `'static` bound behind
        // an invariant `&mut` and the borrow cannot shorten it; a direct
        // return is a coercion site, so it can.
        match self.nodes.iter_mut().find(|node| node.core().row == row) {
            Some(node) => Some(node.as_mut()),
            None => None,
        }
    }

    /// Remove every node of a conversation, returning the freed rows
    pub fn remove_conversation(&mut self, conversation: &str) -> Vec<RowId> {
        let rows = self.rows_in_conversation(conversation);
        self.nodes
            .retain(|node| node.core().conversation != conversation);
        rows
    }
}
