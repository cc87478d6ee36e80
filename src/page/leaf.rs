//! Leaf node view.

use crate::page::layout::{
    leaf_cell_offset, read_u32, write_u32, LEAF_NODE_CELL_SIZE, LEAF_NODE_NEXT_LEAF_OFFSET,
    LEAF_NODE_NUM_CELLS_OFFSET, LEAF_NODE_VALUE_OFFSET,
};
use crate::page::PageBuf;
use crate::types::{NodeType, PageId, Row, ROW_SIZE};
use std::borrow::{Borrow, BorrowMut};

/// A page viewed as a leaf node.
///
/// `B` is `&PageBuf` for read-only access or `&mut PageBuf` for writes. Cell
/// indices must stay below [`LEAF_NODE_MAX_CELLS`](crate::page::LEAF_NODE_MAX_CELLS);
/// every offset is then inside the page.
pub struct LeafNode<B> {
    page_id: PageId,
    page: B,
}

impl<B: Borrow<PageBuf>> LeafNode<B> {
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

    /// Whether this leaf is the root
    pub fn is_root(&self) -> bool {
        self.page.borrow().is_root()
    }

    /// Parent page; meaningless on the root
    pub fn parent(&self) -> PageId {
        self.page.borrow().parent()
    }

    /// Number of cells in use
    pub fn cell_count(&self) -> usize {
        read_u32(self.bytes(), LEAF_NODE_NUM_CELLS_OFFSET) as usize
    }

    /// Right sibling, or `None` for the rightmost leaf
    pub fn next_leaf(&self) -> Option<PageId> {
        // Page 0 is always the root, so it can never be a right sibling.
        match read_u32(self.bytes(), LEAF_NODE_NEXT_LEAF_OFFSET) {
            0 => None,
            page => Some(PageId::new(page)),
        }
    }

    /// Raw bytes of cell `index` (key followed by row)
    pub fn cell(&self, index: usize) -> &[u8] {
        let offset = leaf_cell_offset(index);
        &self.bytes()[offset..offset + LEAF_NODE_CELL_SIZE]
    }

    /// Key of cell `index`
    pub fn key(&self, index: usize) -> u32 {
        read_u32(self.bytes(), leaf_cell_offset(index))
    }

    /// Encoded row of cell `index`
    pub fn value(&self, index: usize) -> &[u8] {
        let offset = leaf_cell_offset(index) + LEAF_NODE_VALUE_OFFSET;
        &self.bytes()[offset..offset + ROW_SIZE]
    }

    /// Decoded row of cell `index`
    pub fn row(&self, index: usize) -> Row {
        Row::decode(self.value(index))
    }

    /// Key of the last cell
    pub fn max_key(&self) -> Option<u32> {
        match self.cell_count() {
            0 => None,
            n => Some(self.key(n - 1)),
        }
    }

    /// All keys in cell order
    pub fn keys(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.cell_count()).map(move |i| self.key(i))
    }
}

impl<'a> LeafNode<&'a PageBuf> {
    /// Encoded row of cell `index`, borrowed for as long as the page is
    pub fn into_value(self, index: usize) -> &'a [u8] {
        let offset = leaf_cell_offset(index) + LEAF_NODE_VALUE_OFFSET;
        &self.page.as_bytes()[offset..offset + ROW_SIZE]
    }
}

impl<B: BorrowMut<PageBuf>> LeafNode<B> {
    fn bytes_mut(&mut self) -> &mut [u8] {
        self.page.borrow_mut().as_bytes_mut()
    }

    /// Format the page as an empty, non-root leaf with no parent or sibling
    pub fn initialize(&mut self) {
        let page = self.page.borrow_mut();
        page.set_node_type(NodeType::Leaf);
        page.set_root(false);
        page.set_parent(PageId::ROOT);
        self.set_cell_count(0);
        self.set_next_leaf(None);
    }

    /// Set or clear the root flag
    pub fn set_root(&mut self, is_root: bool) {
        self.page.borrow_mut().set_root(is_root);
    }

    /// Set the parent page
    pub fn set_parent(&mut self, parent: PageId) {
        self.page.borrow_mut().set_parent(parent);
    }

    /// Set the number of cells in use
    pub fn set_cell_count(&mut self, count: usize) {
        write_u32(self.bytes_mut(), LEAF_NODE_NUM_CELLS_OFFSET, count as u32);
    }

    /// Set or clear the right sibling
    pub fn set_next_leaf(&mut self, next: Option<PageId>) {
        let raw = next.map_or(0, PageId::value);
        write_u32(self.bytes_mut(), LEAF_NODE_NEXT_LEAF_OFFSET, raw);
    }

    /// Set the key of cell `index`
    pub fn set_key(&mut self, index: usize, key: u32) {
        write_u32(self.bytes_mut(), leaf_cell_offset(index), key);
    }

    /// Mutable encoded row of cell `index`
    pub fn value_mut(&mut self, index: usize) -> &mut [u8] {
        let offset = leaf_cell_offset(index) + LEAF_NODE_VALUE_OFFSET;
        &mut self.bytes_mut()[offset..offset + ROW_SIZE]
    }

    /// Write `key` and the encoded `row` into cell `index`
    pub fn write_cell(&mut self, index: usize, key: u32, row: &Row) {
        self.set_key(index, key);
        row.encode(self.value_mut(index));
    }

    /// Overwrite cell `index` with raw cell bytes taken from another leaf
    pub fn set_cell(&mut self, index: usize, cell: &[u8]) {
        let offset = leaf_cell_offset(index);
        self.bytes_mut()[offset..offset + LEAF_NODE_CELL_SIZE].copy_from_slice(cell);
    }

    /// Copy cell `from` over cell `to` within this page
    pub fn copy_cell(&mut self, from: usize, to: usize) {
        let src = leaf_cell_offset(from);
        let dst = leaf_cell_offset(to);
        self.bytes_mut().copy_within(src..src + LEAF_NODE_CELL_SIZE, dst);
    }
}
