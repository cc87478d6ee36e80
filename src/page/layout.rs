//! Byte offsets of the B-tree node formats.
//!
//! Common header (both node kinds, 6 bytes):
//! ```text
//! Offset  Size  Description
//! 0       1     Node type tag
//! 1       1     Root flag (0 or 1)
//! 2       4     Parent page number
//! ```
//!
//! Leaf node:
//! ```text
//! 6       4     Number of cells
//! 10      4     Next leaf page number (0 if this is the rightmost leaf)
//! 14      ...   Cells: [key:4][row:ROW_SIZE]
//! ```
//!
//! Internal node:
//! ```text
//! 6       4     Number of keys
//! 10      4     Right child page number
//! 14      ...   Cells: [child:4][key:4]
//! ```
//!
//! All integers are big-endian.

use crate::types::{PAGE_SIZE, ROW_SIZE};

const U32_SIZE: usize = std::mem::size_of::<u32>();

pub const NODE_TYPE_OFFSET: usize = 0;
pub const IS_ROOT_OFFSET: usize = NODE_TYPE_OFFSET + 1;
pub const PARENT_POINTER_OFFSET: usize = IS_ROOT_OFFSET + 1;
pub const COMMON_NODE_HEADER_SIZE: usize = PARENT_POINTER_OFFSET + U32_SIZE;

pub const LEAF_NODE_NUM_CELLS_OFFSET: usize = COMMON_NODE_HEADER_SIZE;
pub const LEAF_NODE_NEXT_LEAF_OFFSET: usize = LEAF_NODE_NUM_CELLS_OFFSET + U32_SIZE;
pub const LEAF_NODE_HEADER_SIZE: usize = LEAF_NODE_NEXT_LEAF_OFFSET + U32_SIZE;

pub const LEAF_NODE_KEY_SIZE: usize = U32_SIZE;
pub const LEAF_NODE_VALUE_OFFSET: usize = LEAF_NODE_KEY_SIZE;
pub const LEAF_NODE_CELL_SIZE: usize = LEAF_NODE_KEY_SIZE + ROW_SIZE;
pub const LEAF_NODE_SPACE_FOR_CELLS: usize = PAGE_SIZE - LEAF_NODE_HEADER_SIZE;

/// Most cells a leaf page can physically hold
pub const LEAF_NODE_MAX_CELLS: usize = LEAF_NODE_SPACE_FOR_CELLS / LEAF_NODE_CELL_SIZE;

pub const INTERNAL_NODE_NUM_KEYS_OFFSET: usize = COMMON_NODE_HEADER_SIZE;
pub const INTERNAL_NODE_RIGHT_CHILD_OFFSET: usize = INTERNAL_NODE_NUM_KEYS_OFFSET + U32_SIZE;
pub const INTERNAL_NODE_HEADER_SIZE: usize = INTERNAL_NODE_RIGHT_CHILD_OFFSET + U32_SIZE;

pub const INTERNAL_NODE_CHILD_SIZE: usize = U32_SIZE;
pub const INTERNAL_NODE_KEY_OFFSET: usize = INTERNAL_NODE_CHILD_SIZE;
pub const INTERNAL_NODE_CELL_SIZE: usize = INTERNAL_NODE_CHILD_SIZE + U32_SIZE;

/// Most keys an internal page can physically hold
pub const INTERNAL_NODE_MAX_KEYS: usize =
    (PAGE_SIZE - INTERNAL_NODE_HEADER_SIZE) / INTERNAL_NODE_CELL_SIZE;

/// Byte offset of leaf cell `index`
pub const fn leaf_cell_offset(index: usize) -> usize {
    LEAF_NODE_HEADER_SIZE + index * LEAF_NODE_CELL_SIZE
}

/// Byte offset of internal cell `index`
pub const fn internal_cell_offset(index: usize) -> usize {
    INTERNAL_NODE_HEADER_SIZE + index * INTERNAL_NODE_CELL_SIZE
}

pub(crate) fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut buf = [0u8; U32_SIZE];
    buf.copy_from_slice(&bytes[offset..offset + U32_SIZE]);
    u32::from_be_bytes(buf)
}

pub(crate) fn write_u32(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + U32_SIZE].copy_from_slice(&value.to_be_bytes());
}
