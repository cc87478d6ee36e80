//! Pager: a fixed-capacity page cache over a disk manager.
//!
//! Pages are loaded on first access and stay resident until the pager is
//! dropped; nothing is evicted. Writing back only happens through `flush`
//! and `flush_all`.

use crate::error::{Result, StorageError};
use crate::page::PageBuf;
use crate::storage::{DiskManager, DiskManagerImpl};
use crate::types::PageId;
use std::path::Path;
use tracing::{debug, trace};

/// Page cache and page allocator for one table file
pub struct Pager {
    /// Backing file
    disk: Box<dyn DiskManager>,
    /// Cached pages indexed by page number; the length is the hard page limit
    pages: Vec<Option<Box<PageBuf>>>,
    /// One past the highest page number materialized so far
    num_pages: u32,
}

impl Pager {
    /// Open the file at `path` and wrap it in an empty cache
    pub fn open(path: &Path, max_pages: u32, sync_on_write: bool) -> Result<Self> {
        let disk = DiskManagerImpl::open(path, sync_on_write)?;
        Ok(Self::new(Box::new(disk), max_pages))
    }

    /// Create a pager over any disk manager
    pub fn new(disk: Box<dyn DiskManager>, max_pages: u32) -> Self {
        let num_pages = disk.page_count();
        Self {
            disk,
            pages: (0..max_pages).map(|_| None).collect(),
            num_pages,
        }
    }

    /// One past the highest page number materialized so far
    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }

    /// Hard limit on the number of pages
    pub fn max_pages(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Whether `page_id` is resident in the cache
    pub fn is_cached(&self, page_id: PageId) -> bool {
        self.pages
            .get(page_id.index())
            .is_some_and(|slot| slot.is_some())
    }

    fn check_bounds(&self, page_id: PageId) -> Result<()> {
        if page_id.index() >= self.pages.len() {
            return Err(StorageError::PageOutOfBounds {
                page_id,
                max_pages: self.max_pages(),
            });
        }
        Ok(())
    }

    /// Fetch a page, loading it from disk on a cache miss.
    ///
    /// Pages past the end of the file come back zeroed. Fetching a page past
    /// the current watermark raises the watermark to `page_id + 1`.
    pub fn get_page(&mut self, page_id: PageId) -> Result<&mut PageBuf> {
        self.check_bounds(page_id)?;

        let index = page_id.index();
        if self.pages[index].is_none() {
            let mut page = Box::new(PageBuf::new());
            if page_id.value() < self.disk.page_count() {
                self.disk.read_page(page_id, &mut page)?;
            } else {
                trace!(page = %page_id, "materialized fresh page");
            }
            self.pages[index] = Some(page);

            if page_id.value() >= self.num_pages {
                self.num_pages = page_id.value() + 1;
            }
        }

        self.pages[index]
            .as_deref_mut()
            .ok_or(StorageError::PageNotCached(page_id))
    }

    /// Fetch two distinct pages for simultaneous mutation
    pub fn get_page_pair(
        &mut self,
        first: PageId,
        second: PageId,
    ) -> Result<(&mut PageBuf, &mut PageBuf)> {
        if first == second {
            return Err(StorageError::AliasedPages(first));
        }
        self.get_page(first)?;
        self.get_page(second)?;

        let (low, high) = if first < second {
            (first, second)
        } else {
            (second, first)
        };
        let (head, tail) = self.pages.split_at_mut(high.index());
        let low_page = head[low.index()]
            .as_deref_mut()
            .ok_or(StorageError::PageNotCached(low))?;
        let high_page = tail[0]
            .as_deref_mut()
            .ok_or(StorageError::PageNotCached(high))?;

        if first < second {
            Ok((low_page, high_page))
        } else {
            Ok((high_page, low_page))
        }
    }

    /// Next unused page number.
    ///
    /// Pages are never recycled, so this is always the end of the file. The
    /// number is only taken once the page is fetched.
    pub fn allocate_page_number(&self) -> PageId {
        PageId::new(self.num_pages)
    }

    /// Fail unless `extra` more pages can still be materialized
    pub fn ensure_capacity(&self, extra: u32) -> Result<()> {
        let needed = self.num_pages + extra;
        if needed > self.max_pages() {
            return Err(StorageError::PageOutOfBounds {
                page_id: PageId::new(needed - 1),
                max_pages: self.max_pages(),
            });
        }
        Ok(())
    }

    /// Write one cached page back to its slot in the file
    pub fn flush(&mut self, page_id: PageId) -> Result<()> {
        let page = self
            .pages
            .get(page_id.index())
            .and_then(|slot| slot.as_deref())
            .ok_or(StorageError::PageNotCached(page_id))?;

        self.disk.write_page(page_id, page)?;
        debug!(page = %page_id, "flushed page");
        Ok(())
    }

    /// Flush every cached page in page order, then sync the file
    pub fn flush_all(&mut self) -> Result<()> {
        let mut flushed = 0;
        for (index, slot) in self.pages.iter().enumerate() {
            if let Some(page) = slot.as_deref() {
                self.disk.write_page(PageId::new(index as u32), page)?;
                flushed += 1;
            }
        }
        self.disk.sync()?;
        debug!(pages = flushed, "flushed all cached pages");
        Ok(())
    }
}
