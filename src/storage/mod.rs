//! Storage layer: disk I/O and the page cache.
//!
//! The disk manager moves whole pages between memory and the table file; the
//! pager caches them, hands out mutable views, and assigns new page numbers.

mod disk_manager;
mod pager;

pub use disk_manager::{DiskManager, DiskManagerImpl};
pub use pager::Pager;
