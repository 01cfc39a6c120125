//! Storage rows backing dialog nodes

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of the storage row backing one node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowId(pub Uuid);

impl RowId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RowId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Backing table owning one row per node
///
/// The engine only needs rows created and removed in step with node
/// lifetimes. What a row looks like on the other side of this trait is
/// the host's business.
pub trait NodeTable: Send {
    /// Create a row for a node of `kind`, returning its id
    fn create_row(&mut self, kind: &str) -> RowId;

    /// Remove a row, reporting whether it existed
    fn remove_row(&mut self, row: RowId) -> bool;

    /// Kind recorded for a row
    fn row_kind(&self, row: RowId) -> Option<&str>;

    /// Number of live rows
    fn len(&self) -> usize;

    /// Whether the table has no rows
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory table, the default backing
#[derive(Debug, Default)]
pub struct MemoryNodeTable {
    rows: HashMap<RowId, String>,
}

impl MemoryNodeTable {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NodeTable for MemoryNodeTable {
    fn create_row(&mut self, kind: &str) -> RowId {
        let row = RowId::new();
        self.rows.insert(row, kind.to_string());
        row
    }

    fn remove_row(&mut self, row: RowId) -> bool {
        self.rows.remove(&row).is_some()
    }

    fn row_kind(&self, row: RowId) -> Option<&str> {
        self.rows.get(&row).map(String::as_str)
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}
