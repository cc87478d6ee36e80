//! Error types for the storage engine.

use thiserror::Error;
use crate::types::PageId;

/// Result type alias for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Coarse classification of a [`StorageError`].
///
/// Callers match on the kind to decide whether to abort one operation or the
/// whole process; tests use it to assert on a specific limitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The file or a page does not hold a valid layout
    Corruption,
    /// A hard page limit was reached
    CapacityExceeded,
    /// The backing file failed a seek, read, write or sync
    Io,
    /// The caller (or the engine itself) asked for something impossible
    InvalidRequest,
    /// The operation needs a tree shape this engine does not support yet
    Unimplemented,
    /// The primary key is already present
    DuplicateKey,
}

/// Errors that can occur in the storage engine
#[derive(Error, Debug)]
pub enum StorageError {
    /// I/O error from the underlying file system
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Data corruption detected
    #[error("Corruption detected: {0}")]
    Corruption(String),

    /// Requested page lies beyond the pager's hard page limit
    #[error("Page {page_id} out of bounds (max pages: {max_pages})")]
    PageOutOfBounds { page_id: PageId, max_pages: u32 },

    /// Child index past the right child of an internal node
    #[error("Child index {index} out of bounds on page {page_id} ({num_keys} keys)")]
    ChildIndexOutOfBounds {
        page_id: PageId,
        index: usize,
        num_keys: usize,
    },

    /// Cell index past the last cell of a leaf
    #[error("Cell index {index} out of bounds on page {page_id} ({cell_count} cells)")]
    CellIndexOutOfBounds {
        page_id: PageId,
        index: usize,
        cell_count: usize,
    },

    /// Flush requested for a page that was never loaded
    #[error("Page {0} is not cached")]
    PageNotCached(PageId),

    /// Two mutable views of the same page were requested at once
    #[error("Page {0} requested twice in one borrow")]
    AliasedPages(PageId),

    /// A text column does not fit its fixed width
    #[error("{field} too long: {len} bytes (max: {max})")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// B-tree configuration outside the limits of the page layout
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Tree shape the engine cannot handle yet
    #[error("Not yet supported: {0}")]
    Unimplemented(&'static str),

    /// Key already present in the table
    #[error("Duplicate key: {0}")]
    DuplicateKey(u32),
}

impl StorageError {
    /// Create a corruption error with a message
    pub fn corruption(msg: impl Into<String>) -> Self {
        Self::Corruption(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::Corruption(_) => ErrorKind::Corruption,
            Self::PageOutOfBounds { .. } => ErrorKind::CapacityExceeded,
            Self::ChildIndexOutOfBounds { .. }
            | Self::CellIndexOutOfBounds { .. }
            | Self::PageNotCached(_)
            | Self::AliasedPages(_)
            | Self::FieldTooLong { .. }
            | Self::InvalidConfig(_) => ErrorKind::InvalidRequest,
            Self::Unimplemented(_) => ErrorKind::Unimplemented,
            Self::DuplicateKey(_) => ErrorKind::DuplicateKey,
        }
    }
}
