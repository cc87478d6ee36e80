//! B-tree cursor for iteration.
//!
//! A cursor names one cell position in one leaf: either an existing row, or
//! the slot where a key would be inserted. Leaves are chained left to right,
//! so advancing past the last cell of a leaf moves to the first cell of its
//! right sibling.

use crate::btree::Table;
use crate::error::{Result, StorageError};
use crate::page::{LeafNode, Node, PageBuf};
use crate::types::{PageId, Row};
use std::borrow::Borrow;

/// A position in a table
pub struct Cursor<'a> {
    /// The table the cursor walks
    table: &'a mut Table,
    /// Leaf the cursor is in
    page_id: PageId,
    /// Cell index within the leaf
    cell_num: usize,
    /// Whether the cursor has moved past the last row
    end_of_table: bool,
}

impl<'a> Cursor<'a> {
    /// Cursor at the first row in key order
    pub fn table_start(table: &'a mut Table) -> Result<Self> {
        Self::table_find(table, 0)?.settled()
    }

    /// Cursor at `key`, or at the position where `key` would be inserted.
    ///
    /// Descends from the root through internal nodes to the one leaf whose
    /// range covers `key`.
    pub fn table_find(table: &'a mut Table, key: u32) -> Result<Self> {
        let mut page_id = table.root_page_num();
        let mut depth = 1;

        loop {
            let child = match Node::from_page(page_id, &*table.pager_mut().get_page(page_id)?)? {
                Node::Leaf(_) => None,
                Node::Internal(node) => Some(node.child(node.find_child_index(key))?),
            };

            match child {
                None => return Self::leaf_find(table, page_id, key),
                Some(child) => page_id = child,
            }

            depth += 1;
            table.check_depth(depth)?;
        }
    }

    /// Cursor at `key` within leaf `page_id`, or where it would be inserted
    pub fn leaf_find(table: &'a mut Table, page_id: PageId, key: u32) -> Result<Self> {
        let cell_num = search_leaf(&table.leaf(page_id)?, key);
        Ok(Self {
            table,
            page_id,
            cell_num,
            end_of_table: false,
        })
    }

    /// Leaf the cursor is in
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Cell index within the leaf
    pub fn cell_num(&self) -> usize {
        self.cell_num
    }

    /// Whether the cursor has moved past the last row
    pub fn end_of_table(&self) -> bool {
        self.end_of_table
    }

    /// Encoded row at the cursor
    pub fn value(&mut self) -> Result<&[u8]> {
        let page_id = self.page_id;
        let page: &PageBuf = self.table.pager_mut().get_page(page_id)?;
        match Node::from_page(page_id, page)? {
            Node::Leaf(leaf) => {
                check_cell(page_id, self.cell_num, leaf.cell_count())?;
                Ok(leaf.into_value(self.cell_num))
            }
            Node::Internal(_) => Err(StorageError::corruption(format!(
                "page {} is not a leaf",
                page_id
            ))),
        }
    }

    /// Key at the cursor
    pub fn key(&mut self) -> Result<u32> {
        let (page_id, cell_num) = (self.page_id, self.cell_num);
        let leaf = self.table.leaf(page_id)?;
        check_cell(page_id, cell_num, leaf.cell_count())?;
        Ok(leaf.key(cell_num))
    }

    /// Decoded row at the cursor
    pub fn row(&mut self) -> Result<Row> {
        Ok(Row::decode(self.value()?))
    }

    /// Whether the cursor sits on an existing cell holding `key`
    pub fn points_at(&mut self, key: u32) -> Result<bool> {
        let cell_num = self.cell_num;
        let leaf = self.table.leaf(self.page_id)?;
        Ok(cell_num < leaf.cell_count() && leaf.key(cell_num) == key)
    }

    /// Step to the next row, following the sibling link at the end of a
    /// leaf. Does nothing once the cursor is past the last row.
    pub fn advance(&mut self) -> Result<()> {
        if self.end_of_table {
            return Ok(());
        }
        self.cell_num += 1;
        self.settle()
    }

    /// Insert `key`/`row` at the cursor position
    pub fn insert(&mut self, key: u32, row: &Row) -> Result<()> {
        self.table.leaf_insert(self.page_id, self.cell_num, key, row)
    }

    /// Consume the cursor and return it settled on a real row or the end
    pub(crate) fn settled(mut self) -> Result<Self> {
        self.settle()?;
        Ok(self)
    }

    /// Move off a one-past-the-end position onto the next leaf. Only the
    /// root leaf of an empty table can be empty, so one hop is enough.
    fn settle(&mut self) -> Result<()> {
        let (cell_count, next_leaf) = {
            let leaf = self.table.leaf(self.page_id)?;
            (leaf.cell_count(), leaf.next_leaf())
        };

        if self.cell_num >= cell_count {
            match next_leaf {
                Some(next) => {
                    self.page_id = next;
                    self.cell_num = 0;
                }
                None => self.end_of_table = true,
            }
        }
        Ok(())
    }
}

/// Fail unless `cell_num` names an existing cell
fn check_cell(page_id: PageId, cell_num: usize, cell_count: usize) -> Result<()> {
    if cell_num >= cell_count {
        return Err(StorageError::CellIndexOutOfBounds {
            page_id,
            index: cell_num,
            cell_count,
        });
    }
    Ok(())
}

/// Binary search a leaf for `key`.
///
/// Returns the index of the cell holding `key`, or the index where it would
/// be inserted to keep the leaf sorted.
fn search_leaf<B: Borrow<PageBuf>>(leaf: &LeafNode<B>, key: u32) -> usize {
    let mut min_index = 0;
    let mut one_past_max_index = leaf.cell_count();

    while one_past_max_index != min_index {
        let index = (min_index + one_past_max_index) / 2;
        let key_at_index = leaf.key(index);
        if key == key_at_index {
            return index;
        }
        if key < key_at_index {
            one_past_max_index = index;
        } else {
            min_index = index + 1;
        }
    }

    min_index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::storage::Pager;
    use crate::types::{BTreeConfig, TABLE_MAX_PAGES};
    use proptest::prelude::*;
    use tempfile::tempdir;

    fn create_test_table(config: BTreeConfig) -> Result<(Table, tempfile::TempDir)> {
        let dir = tempdir().unwrap();
        let pager = Pager::open(&dir.path().join("test.db"), TABLE_MAX_PAGES, false)?;
        Ok((Table::open(pager, config)?, dir))
    }

    fn row(id: u32) -> Row {
        Row::new(id, &format!("user{}", id), "someone@example.com").unwrap()
    }

    fn leaf_with_keys(keys: &[u32]) -> PageBuf {
        let mut page = PageBuf::new();
        let mut leaf = LeafNode::new(PageId::ROOT, &mut page);
        leaf.initialize();
        for (i, &key) in keys.iter().enumerate() {
            leaf.write_cell(i, key, &row(key));
        }
        leaf.set_cell_count(keys.len());
        page
    }

    #[test]
    fn test_search_leaf() {
        let page = leaf_with_keys(&[2, 4, 6, 8]);
        let leaf = LeafNode::new(PageId::ROOT, &page);

        assert_eq!(search_leaf(&leaf, 6), 2);
        assert_eq!(search_leaf(&leaf, 5), 2);
        assert_eq!(search_leaf(&leaf, 0), 0);
        assert_eq!(search_leaf(&leaf, 9), 4);
        assert_eq!(search_leaf(&leaf, 2), 0);
        assert_eq!(search_leaf(&leaf, 8), 3);
    }

    #[test]
    fn test_advance_stops_at_end() -> Result<()> {
        let (mut table, _dir) = create_test_table(BTreeConfig::default())?;
        table.insert(&row(1))?;

        let mut cursor = table.start()?;
        assert_eq!(cursor.key()?, 1);
        for _ in 0..20 {
            cursor.advance()?;
        }
        assert!(cursor.end_of_table());
        assert_eq!(cursor.cell_num(), 1);

        let err = cursor.value().err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert!(matches!(
            err,
            StorageError::CellIndexOutOfBounds { index: 1, cell_count: 1, .. }
        ));
        assert_eq!(cursor.key().unwrap_err().kind(), ErrorKind::InvalidRequest);
        assert_eq!(cursor.row().unwrap_err().kind(), ErrorKind::InvalidRequest);

        Ok(())
    }

    #[test]
    fn test_search_empty_leaf() {
        let page = leaf_with_keys(&[]);
        assert_eq!(search_leaf(&LeafNode::new(PageId::ROOT, &page), 42), 0);
    }

    #[test]
    fn test_start_on_empty_table() -> Result<()> {
        let (mut table, _dir) = create_test_table(BTreeConfig::default())?;

        let cursor = table.start()?;
        assert!(cursor.end_of_table());
        assert_eq!(cursor.page_id(), PageId::ROOT);
        assert_eq!(cursor.cell_num(), 0);

        Ok(())
    }

    #[test]
    fn test_walk_across_leaves() -> Result<()> {
        let (mut table, _dir) = create_test_table(BTreeConfig::new(3, 8))?;
        for id in [5, 1, 9, 3, 7, 2, 8] {
            table.insert(&row(id))?;
        }

        let mut cursor = table.start()?;
        let first_leaf = cursor.page_id();
        let mut seen = Vec::new();
        let mut leaves = vec![first_leaf];
        while !cursor.end_of_table() {
            seen.push(cursor.key()?);
            assert_eq!(cursor.row()?, row(cursor.key()?));
            cursor.advance()?;
            if !leaves.contains(&cursor.page_id()) {
                leaves.push(cursor.page_id());
            }
        }

        assert_eq!(seen, vec![1, 2, 3, 5, 7, 8, 9]);
        assert!(leaves.len() > 1);
        assert_ne!(first_leaf, PageId::ROOT);

        Ok(())
    }

    #[test]
    fn test_find_existing_and_missing() -> Result<()> {
        let (mut table, _dir) = create_test_table(BTreeConfig::new(3, 8))?;
        for id in (10..=60).step_by(10) {
            table.insert(&row(id))?;
        }

        let mut cursor = table.find(40)?;
        assert!(cursor.points_at(40)?);
        assert_eq!(Row::decode(cursor.value()?), row(40));

        let mut cursor = table.find(45)?;
        assert!(!cursor.points_at(45)?);
        cursor.insert(45, &row(45))?;
        assert_eq!(table.get(45)?, Some(row(45)));
        assert_eq!(table.scan(Some(40), Some(51))?.len(), 3);

        Ok(())
    }

    #[test]
    fn test_find_past_last_key() -> Result<()> {
        let (mut table, _dir) = create_test_table(BTreeConfig::default())?;
        table.insert(&row(1))?;

        let cursor = table.find(2)?;
        assert_eq!(cursor.cell_num(), 1);
        assert!(!cursor.end_of_table());
        assert!(cursor.settled()?.end_of_table());

        Ok(())
    }

    #[test]
    fn test_leaf_find_on_internal_page() -> Result<()> {
        let (mut table, _dir) = create_test_table(BTreeConfig::new(2, 4))?;
        for id in 1..=3 {
            table.insert(&row(id))?;
        }

        let err = Cursor::leaf_find(&mut table, PageId::ROOT, 1).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Corruption);

        Ok(())
    }

    proptest! {
        #[test]
        fn prop_inserts_come_back_sorted(keys in proptest::collection::hash_set(any::<u32>(), 0..60)) {
            let (mut table, _dir) = create_test_table(BTreeConfig::new(4, 32)).unwrap();
            for &key in &keys {
                table.insert(&row(key)).unwrap();
            }

            let mut expected: Vec<u32> = keys.into_iter().collect();
            expected.sort_unstable();

            let mut cursor = table.start().unwrap();
            let mut seen = Vec::new();
            while !cursor.end_of_table() {
                seen.push(cursor.key().unwrap());
                cursor.advance().unwrap();
            }
            prop_assert_eq!(seen, expected);
        }
    }
}
