//! Common types used throughout the storage engine.

mod page_id;
mod row;

pub use page_id::PageId;
pub use row::{Row, EMAIL_SIZE, ROW_SIZE, USERNAME_SIZE};

use crate::error::{Result, StorageError};
use crate::page::{INTERNAL_NODE_MAX_KEYS, LEAF_NODE_MAX_CELLS};
use serde::{Deserialize, Serialize};

/// Page size in bytes (4KB)
pub const PAGE_SIZE: usize = 4096;

/// Default hard limit on the number of pages a table may hold
pub const TABLE_MAX_PAGES: u32 = 100;

/// Smallest leaf capacity that still leaves both halves of a split non-empty
pub const MIN_LEAF_CELLS: usize = 2;

/// Smallest internal node capacity
pub const MIN_INTERNAL_KEYS: usize = 1;

/// BTree configuration for node limits.
///
/// Both limits default to what physically fits in a page. Lower values make
/// splits happen sooner, which is mostly useful for tests and visualization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BTreeConfig {
    /// Maximum cells per leaf node
    pub max_leaf_cells: usize,
    /// Maximum keys per internal node
    pub max_internal_keys: usize,
}

impl Default for BTreeConfig {
    fn default() -> Self {
        Self {
            max_leaf_cells: LEAF_NODE_MAX_CELLS,
            max_internal_keys: INTERNAL_NODE_MAX_KEYS,
        }
    }
}

impl BTreeConfig {
    /// Create a new config with custom limits, clamped to the page layout
    pub fn new(max_leaf_cells: usize, max_internal_keys: usize) -> Self {
        Self {
            max_leaf_cells: max_leaf_cells.clamp(MIN_LEAF_CELLS, LEAF_NODE_MAX_CELLS),
            max_internal_keys: max_internal_keys.clamp(MIN_INTERNAL_KEYS, INTERNAL_NODE_MAX_KEYS),
        }
    }

    /// Check the limits against the page layout.
    ///
    /// `new` clamps, but a deserialized config can carry anything.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_LEAF_CELLS..=LEAF_NODE_MAX_CELLS).contains(&self.max_leaf_cells) {
            return Err(StorageError::invalid_config(format!(
                "max_leaf_cells must be in {}..={}, got {}",
                MIN_LEAF_CELLS, LEAF_NODE_MAX_CELLS, self.max_leaf_cells
            )));
        }
        if !(MIN_INTERNAL_KEYS..=INTERNAL_NODE_MAX_KEYS).contains(&self.max_internal_keys) {
            return Err(StorageError::invalid_config(format!(
                "max_internal_keys must be in {}..={}, got {}",
                MIN_INTERNAL_KEYS, INTERNAL_NODE_MAX_KEYS, self.max_internal_keys
            )));
        }
        Ok(())
    }

    /// Number of cells that stay in the old (left) leaf on a split
    pub fn leaf_left_split_count(&self) -> usize {
        (self.max_leaf_cells + 1) - self.leaf_right_split_count()
    }

    /// Number of cells that move to the new (right) leaf on a split
    pub fn leaf_right_split_count(&self) -> usize {
        (self.max_leaf_cells + 1) / 2
    }
}

/// Node type tag stored in the first byte of every B-tree page.
///
/// Zero is not a valid tag: a page that was never initialized reads as
/// corrupt, not as an empty internal node.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    /// Internal node (keys + child pointers)
    Internal = 0x02,
    /// Leaf node (keys + rows)
    Leaf = 0x0D,
}

impl NodeType {
    /// Convert from byte value
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x02 => Some(Self::Internal),
            0x0D => Some(Self::Leaf),
            _ => None,
        }
    }
}
