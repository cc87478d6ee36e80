//! # tinytable
//!
//! A small, disk-backed, single-table storage engine. Rows with a fixed
//! schema `(id, username, email)` are kept in a B-tree keyed by `id`, stored
//! as 4096-byte pages in one flat file.
//!
//! ## Architecture
//!
//! - **Page Layer** (`page`): fixed-offset leaf and internal node views over raw pages
//! - **Storage Layer** (`storage`): page-granular disk I/O and the page cache
//! - **B-Tree Layer** (`btree`): ordered insert with leaf splits, lookups and cursors
//! - **Types** (`types`): page ids, the row codec, node limits
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tinytable::{Config, Db, Row};
//!
//! let db = Db::open(Config::new("users.db"))?;
//!
//! db.insert(&Row::new(1, "alice", "alice@example.com")?)?;
//! let alice = db.get(1)?;
//!
//! for row in db.range(Some(1), Some(100))? {
//!     println!("{}", row);
//! }
//!
//! db.close()?;
//! ```

pub mod btree;
pub mod error;
pub mod page;
pub mod storage;
pub mod types;

pub use error::{ErrorKind, Result, StorageError};
pub use types::{BTreeConfig, PageId, Row, PAGE_SIZE, TABLE_MAX_PAGES};

// Re-export main public API
pub use btree::{Cursor, Table};
pub use storage::{DiskManager, DiskManagerImpl, Pager};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

/// Database configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the table file
    pub path: PathBuf,
    /// Hard limit on pages in the file (default: 100)
    pub max_pages: u32,
    /// Whether to sync every page write immediately (default: false)
    pub sync_on_write: bool,
    /// B-tree configuration for node limits
    pub btree_config: BTreeConfig,
}

impl Config {
    /// Create a new configuration with default settings
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            max_pages: TABLE_MAX_PAGES,
            sync_on_write: false,
            btree_config: BTreeConfig::default(),
        }
    }

    /// Set the page limit
    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Enable sync on write for durability
    pub fn sync_on_write(mut self, enabled: bool) -> Self {
        self.sync_on_write = enabled;
        self
    }

    /// Set B-tree configuration
    pub fn btree_config(mut self, config: BTreeConfig) -> Self {
        self.btree_config = config;
        self
    }
}

/// Node type for visualization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    /// Page ID
    pub page_id: u32,
    /// Whether this is a leaf node
    pub is_leaf: bool,
    /// Keys in this node
    pub keys: Vec<u32>,
    /// Child nodes (only for internal nodes), right child last
    pub children: Vec<TreeNode>,
}

/// Main database handle over one table file.
///
/// All access goes through a single lock; a `Db` may be shared between
/// threads but operations never overlap.
pub struct Db {
    table: Mutex<Table>,
    config: Config,
    closed: bool,
}

impl Db {
    /// Open or create a database at the configured path
    pub fn open(config: Config) -> Result<Self> {
        let pager = Pager::open(&config.path, config.max_pages, config.sync_on_write)?;
        let table = Table::open(pager, config.btree_config.clone())?;

        info!(path = %config.path.display(), "opened database");

        Ok(Self {
            table: Mutex::new(table),
            config,
            closed: false,
        })
    }

    /// Get the current B-tree configuration
    pub fn btree_config(&self) -> BTreeConfig {
        self.config.btree_config.clone()
    }

    /// Insert a row keyed by its id
    ///
    /// Fails with `DuplicateKey` if a row with the same id exists.
    pub fn insert(&self, row: &Row) -> Result<()> {
        self.table.lock().insert(row)
    }

    /// Get a row by id
    ///
    /// Returns `None` if the id does not exist.
    pub fn get(&self, id: u32) -> Result<Option<Row>> {
        self.table.lock().get(id)
    }

    /// Check if an id exists
    pub fn contains(&self, id: u32) -> Result<bool> {
        Ok(self.get(id)?.is_some())
    }

    /// All rows in id order
    pub fn iter(&self) -> Result<Vec<Row>> {
        self.table.lock().select_all()
    }

    /// Rows with `start <= id < end`
    ///
    /// Both bounds are optional; `None` means unbounded on that side.
    pub fn range(&self, start: Option<u32>, end: Option<u32>) -> Result<Vec<Row>> {
        self.table.lock().scan(start, end)
    }

    /// Write every cached page to disk
    pub fn flush(&self) -> Result<()> {
        self.table.lock().flush()
    }

    /// Flush and close the database
    pub fn close(mut self) -> Result<()> {
        self.flush()?;
        self.closed = true;
        info!(path = %self.config.path.display(), "closed database");
        Ok(())
    }

    /// Get statistics about the database
    pub fn stats(&self) -> Result<DbStats> {
        let mut table = self.table.lock();
        Ok(DbStats {
            page_count: table.pager().num_pages(),
            max_pages: table.pager().max_pages(),
            tree_height: table.height()?,
        })
    }

    /// Export the tree structure for visualization
    pub fn export_tree(&self) -> Result<TreeNode> {
        self.table.lock().export_tree()
    }
}

impl Drop for Db {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.table.get_mut().flush() {
            warn!(error = %e, "failed to flush database on drop");
        }
    }
}

/// Database statistics
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbStats {
    /// Pages materialized so far
    pub page_count: u32,
    /// Hard page limit
    pub max_pages: u32,
    /// Height of the B-tree
    pub tree_height: usize,
}
