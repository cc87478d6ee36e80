//! Page number type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Zero-based page number within the table file.
///
/// Page 0 is the root of the table for its whole lifetime; a root split
/// rewrites page 0 in place rather than moving the root elsewhere.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PageId(pub u32);

impl PageId {
    /// The root page of every table
    pub const ROOT: PageId = PageId(0);

    /// Create a new page number
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw page number
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Index into the pager's page table
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Page number directly after this one
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Byte offset of this page in the file
    pub const fn file_offset(self, page_size: usize) -> u64 {
        self.0 as u64 * page_size as u64
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PageId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<PageId> for u32 {
    fn from(id: PageId) -> Self {
        id.0
    }
}
