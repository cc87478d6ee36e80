//! B-tree implementation.
//!
//! This module provides a paged B-tree keyed by row id that supports:
//! - Point lookups (get)
//! - Ordered insertions with leaf splits (insert)
//! - Range scans over linked leaves

mod cursor;
mod tree;

pub use cursor::Cursor;
pub use tree::Table;
