//! Page layer: fixed-layout B-tree nodes inside raw pages.
//!
//! A page is a `PAGE_SIZE` byte buffer owned by the pager. The node views in
//! this module borrow a page and read or write its fields at fixed offsets:
//! - [`LeafNode`]: sorted `key -> row` cells plus a next-leaf link
//! - [`InternalNode`]: sorted `child -> key` cells plus a right child
//!
//! [`Node`] decodes the type tag once and hands out the matching view.

mod internal;
mod layout;
mod leaf;

pub use internal::InternalNode;
pub use layout::{
    COMMON_NODE_HEADER_SIZE, INTERNAL_NODE_CELL_SIZE, INTERNAL_NODE_HEADER_SIZE,
    INTERNAL_NODE_MAX_KEYS, LEAF_NODE_CELL_SIZE, LEAF_NODE_HEADER_SIZE, LEAF_NODE_MAX_CELLS,
};
pub use leaf::LeafNode;

use crate::error::{Result, StorageError};
use crate::types::{NodeType, PageId, PAGE_SIZE};
use layout::{read_u32, write_u32, IS_ROOT_OFFSET, NODE_TYPE_OFFSET, PARENT_POINTER_OFFSET};
use std::borrow::{Borrow, BorrowMut};

/// A raw page buffer
#[derive(Clone)]
pub struct PageBuf {
    data: [u8; PAGE_SIZE],
}

impl PageBuf {
    /// Create a new zeroed page buffer
    pub fn new() -> Self {
        Self {
            data: [0u8; PAGE_SIZE],
        }
    }

    /// Get a reference to the raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the raw bytes
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Node type tag, if the page holds a known one
    pub fn node_type(&self) -> Option<NodeType> {
        NodeType::from_byte(self.data[NODE_TYPE_OFFSET])
    }

    fn set_node_type(&mut self, node_type: NodeType) {
        self.data[NODE_TYPE_OFFSET] = node_type as u8;
    }

    /// Whether this page is the root of its tree
    pub fn is_root(&self) -> bool {
        self.data[IS_ROOT_OFFSET] != 0
    }

    /// Set or clear the root flag
    pub fn set_root(&mut self, is_root: bool) {
        self.data[IS_ROOT_OFFSET] = u8::from(is_root);
    }

    /// Parent page; meaningless on the root
    pub fn parent(&self) -> PageId {
        PageId::new(read_u32(&self.data, PARENT_POINTER_OFFSET))
    }

    /// Set the parent page
    pub fn set_parent(&mut self, parent: PageId) {
        write_u32(&mut self.data, PARENT_POINTER_OFFSET, parent.value());
    }
}

impl Default for PageBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for PageBuf {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl std::ops::DerefMut for PageBuf {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.data
    }
}

/// A page interpreted as a B-tree node
pub enum Node<B> {
    Leaf(LeafNode<B>),
    Internal(InternalNode<B>),
}

impl<B: Borrow<PageBuf>> Node<B> {
    /// Decode the type tag of `page` and wrap it in the matching view.
    ///
    /// The stored cell or key count is checked against what fits in a page,
    /// so every index below it stays inside the buffer.
    pub fn from_page(page_id: PageId, page: B) -> Result<Self> {
        let tag = page.borrow()[NODE_TYPE_OFFSET];
        match NodeType::from_byte(tag) {
            Some(NodeType::Leaf) => {
                let leaf = LeafNode::new(page_id, page);
                check_count(page_id, "cells", leaf.cell_count(), LEAF_NODE_MAX_CELLS)?;
                Ok(Self::Leaf(leaf))
            }
            Some(NodeType::Internal) => {
                let node = InternalNode::new(page_id, page);
                check_count(page_id, "keys", node.num_keys(), INTERNAL_NODE_MAX_KEYS)?;
                Ok(Self::Internal(node))
            }
            None => Err(StorageError::corruption(format!(
                "page {} has unknown node type tag {:#04x}",
                page_id, tag
            ))),
        }
    }

    /// The node's kind
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Leaf(_) => NodeType::Leaf,
            Self::Internal(_) => NodeType::Internal,
        }
    }

    /// Largest key stored directly in this node.
    ///
    /// For an internal node this is the key of its last key cell, not the
    /// maximum of the right child's subtree. `None` if the node is empty.
    pub fn max_key(&self) -> Option<u32> {
        match self {
            Self::Leaf(leaf) => leaf.max_key(),
            Self::Internal(internal) => internal.max_key(),
        }
    }

    /// Whether this node is the tree's root
    pub fn is_root(&self) -> bool {
        match self {
            Self::Leaf(leaf) => leaf.is_root(),
            Self::Internal(internal) => internal.is_root(),
        }
    }
}

fn check_count(page_id: PageId, what: &str, count: usize, max: usize) -> Result<()> {
    if count > max {
        return Err(StorageError::corruption(format!(
            "page {} claims {} {}, at most {} fit",
            page_id, count, what, max
        )));
    }
    Ok(())
}

impl<B: BorrowMut<PageBuf>> Node<B> {
    /// Set or clear the root flag
    pub fn set_root(&mut self, is_root: bool) {
        match self {
            Self::Leaf(leaf) => leaf.set_root(is_root),
            Self::Internal(internal) => internal.set_root(is_root),
        }
    }
}
