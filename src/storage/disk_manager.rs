//! Disk manager implementation.
//!
//! The disk manager is responsible for reading and writing whole pages at
//! `page_number * PAGE_SIZE` in the table file. It sits behind a trait so the
//! pager can be tested against backends that fail on purpose.

use crate::error::{Result, StorageError};
use crate::page::PageBuf;
use crate::types::{PageId, PAGE_SIZE};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind as IoErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, info};

/// Trait for page-granular disk I/O
pub trait DiskManager: Send {
    /// Pages present in the file, counting a trailing partial page as whole
    fn page_count(&self) -> u32;

    /// Read a page from disk into `buf`
    fn read_page(&mut self, page_id: PageId, buf: &mut PageBuf) -> Result<()>;

    /// Write a full page to disk
    fn write_page(&mut self, page_id: PageId, buf: &PageBuf) -> Result<()>;

    /// Sync all data to disk
    fn sync(&mut self) -> Result<()>;
}

/// File-based disk manager implementation
pub struct DiskManagerImpl {
    /// The table file
    file: File,
    /// Current file length in bytes
    file_length: u64,
    /// Whether to sync on each write
    sync_on_write: bool,
}

impl DiskManagerImpl {
    /// Open or create a table file.
    ///
    /// Fails with a corruption error if the file length is not a whole
    /// number of pages; nothing is read in that case.
    pub fn open(path: &Path, sync_on_write: bool) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let file_length = file.metadata()?.len();
        if file_length % PAGE_SIZE as u64 != 0 {
            return Err(StorageError::corruption(format!(
                "db file is not a whole number of pages: {} bytes",
                file_length
            )));
        }

        info!(path = %path.display(), pages = file_length / PAGE_SIZE as u64, "opened table file");

        Ok(Self {
            file,
            file_length,
            sync_on_write,
        })
    }
}

impl DiskManager for DiskManagerImpl {
    fn page_count(&self) -> u32 {
        self.file_length.div_ceil(PAGE_SIZE as u64) as u32
    }

    fn read_page(&mut self, page_id: PageId, buf: &mut PageBuf) -> Result<()> {
        self.file.seek(SeekFrom::Start(page_id.file_offset(PAGE_SIZE)))?;

        // A short final page leaves the rest of the buffer zeroed.
        let bytes = buf.as_bytes_mut();
        let mut filled = 0;
        while filled < PAGE_SIZE {
            match self.file.read(&mut bytes[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == IoErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        debug!(page = %page_id, bytes = filled, "read page");
        Ok(())
    }

    fn write_page(&mut self, page_id: PageId, buf: &PageBuf) -> Result<()> {
        let offset = page_id.file_offset(PAGE_SIZE);
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(buf.as_bytes())?;

        if self.sync_on_write {
            self.file.sync_data()?;
        }

        self.file_length = self.file_length.max(offset + PAGE_SIZE as u64);
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }
}
