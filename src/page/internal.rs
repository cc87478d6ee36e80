//! Internal node view.

use crate::error::{Result, StorageError};
use crate::page::layout::{
    internal_cell_offset, read_u32, write_u32, INTERNAL_NODE_CELL_SIZE,
    INTERNAL_NODE_KEY_OFFSET, INTERNAL_NODE_NUM_KEYS_OFFSET, INTERNAL_NODE_RIGHT_CHILD_OFFSET,
};
use crate::page::PageBuf;
use crate::types::{NodeType, PageId};
use std::borrow::{Borrow, BorrowMut};

/// A page viewed as an internal node.
///
/// With `k` keys the node has `k + 1` children: child `i < k` sits in cell
/// `i` next to key `i`, which is the largest key reachable through it;
/// child `k` is the right child.
pub struct InternalNode<B> {
    page_id: PageId,
    page: B,
}

impl<B: Borrow<PageBuf>> InternalNode<B> {
    /// Wrap a page without checking its type tag
    pub fn new(page_id: PageId, page: B) -> Self {
        Self { page_id, page }
    }

    fn bytes(&self) -> &[u8] {
        self.page.borrow().as_bytes()
    }

    /// Page this view is over
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Whether this node is the root
    pub fn is_root(&self) -> bool {
        self.page.borrow().is_root()
    }

    /// Parent page; meaningless on the root
    pub fn parent(&self) -> PageId {
        self.page.borrow().parent()
    }

    /// Number of keys (one less than the number of children)
    pub fn num_keys(&self) -> usize {
        read_u32(self.bytes(), INTERNAL_NODE_NUM_KEYS_OFFSET) as usize
    }

    /// Rightmost child
    pub fn right_child(&self) -> PageId {
        PageId::new(read_u32(self.bytes(), INTERNAL_NODE_RIGHT_CHILD_OFFSET))
    }

    /// Key of cell `index`
    pub fn key(&self, index: usize) -> u32 {
        read_u32(self.bytes(), internal_cell_offset(index) + INTERNAL_NODE_KEY_OFFSET)
    }

    /// Child `index`; `index == num_keys()` is the right child
    pub fn child(&self, index: usize) -> Result<PageId> {
        let num_keys = self.num_keys();
        if index > num_keys {
            return Err(StorageError::ChildIndexOutOfBounds {
                page_id: self.page_id,
                index,
                num_keys,
            });
        }
        if index == num_keys {
            Ok(self.right_child())
        } else {
            Ok(PageId::new(read_u32(self.bytes(), internal_cell_offset(index))))
        }
    }

    /// All children, left to right
    pub fn children(&self) -> Result<Vec<PageId>> {
        (0..=self.num_keys()).map(|i| self.child(i)).collect()
    }

    /// All keys in cell order
    pub fn keys(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.num_keys()).map(move |i| self.key(i))
    }

    /// Key of the last key cell
    pub fn max_key(&self) -> Option<u32> {
        match self.num_keys() {
            0 => None,
            n => Some(self.key(n - 1)),
        }
    }

    /// Index of the child whose subtree should contain `key`.
    ///
    /// Binary search for the first key cell with `key <= cell key`; keys
    /// greater than every cell key land on the right child (`num_keys()`).
    pub fn find_child_index(&self, key: u32) -> usize {
        let mut min_index = 0;
        let mut max_index = self.num_keys();

        while min_index != max_index {
            let index = (min_index + max_index) / 2;
            if self.key(index) >= key {
                max_index = index;
            } else {
                min_index = index + 1;
            }
        }

        min_index
    }
}

impl<B: BorrowMut<PageBuf>> InternalNode<B> {
    fn bytes_mut(&mut self) -> &mut [u8] {
        self.page.borrow_mut().as_bytes_mut()
    }

    /// Format the page as an empty, non-root internal node.
    ///
    /// The right child is left as-is; callers must set it before the node is
    /// read.
    pub fn initialize(&mut self) {
        let page = self.page.borrow_mut();
        page.set_node_type(NodeType::Internal);
        page.set_root(false);
        page.set_parent(PageId::ROOT);
        self.set_num_keys(0);
    }

    /// Set or clear the root flag
    pub fn set_root(&mut self, is_root: bool) {
        self.page.borrow_mut().set_root(is_root);
    }

    /// Set the parent page
    pub fn set_parent(&mut self, parent: PageId) {
        self.page.borrow_mut().set_parent(parent);
    }

    /// Set the number of keys
    pub fn set_num_keys(&mut self, num_keys: usize) {
        write_u32(self.bytes_mut(), INTERNAL_NODE_NUM_KEYS_OFFSET, num_keys as u32);
    }

    /// Set the rightmost child
    pub fn set_right_child(&mut self, child: PageId) {
        write_u32(self.bytes_mut(), INTERNAL_NODE_RIGHT_CHILD_OFFSET, child.value());
    }

    /// Set the key of cell `index`
    pub fn set_key(&mut self, index: usize, key: u32) {
        let offset = internal_cell_offset(index) + INTERNAL_NODE_KEY_OFFSET;
        write_u32(self.bytes_mut(), offset, key);
    }

    /// Set child `index`; `index == num_keys()` sets the right child
    pub fn set_child(&mut self, index: usize, child: PageId) -> Result<()> {
        let num_keys = self.num_keys();
        if index > num_keys {
            return Err(StorageError::ChildIndexOutOfBounds {
                page_id: self.page_id,
                index,
                num_keys,
            });
        }
        if index == num_keys {
            self.set_right_child(child);
        } else {
            write_u32(self.bytes_mut(), internal_cell_offset(index), child.value());
        }
        Ok(())
    }

    /// Copy cell `from` over cell `to` within this page
    pub fn copy_cell(&mut self, from: usize, to: usize) {
        let src = internal_cell_offset(from);
        let dst = internal_cell_offset(to);
        self.bytes_mut().copy_within(src..src + INTERNAL_NODE_CELL_SIZE, dst);
    }
}
