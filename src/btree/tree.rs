//! B-tree core implementation.
//!
//! This module provides the `Table` struct with operations for:
//! - insert: ordered insert with leaf splits and root promotion
//! - get: point lookups
//! - scan: ordered range scans across linked leaves
//!
//! Internal nodes never split. A leaf split whose parent is already full is
//! rejected before anything is written, so the tree is at most two levels
//! deep.

use crate::btree::Cursor;
use crate::error::{Result, StorageError};
use crate::page::{InternalNode, LeafNode, Node, PageBuf};
use crate::storage::Pager;
use crate::types::{BTreeConfig, PageId, Row};
use crate::TreeNode;
use tracing::{debug, trace};

/// A single table stored as a B-tree keyed by `Row::id`
pub struct Table {
    /// Page cache for the table file
    pager: Pager,
    /// Root page number; a root split rewrites this page in place
    root_page_num: PageId,
    /// Node limits
    config: BTreeConfig,
}

impl Table {
    /// Wrap a pager, formatting page 0 as an empty root leaf if the file is new
    pub fn open(mut pager: Pager, config: BTreeConfig) -> Result<Self> {
        config.validate()?;

        if pager.num_pages() == 0 {
            let mut root = LeafNode::new(PageId::ROOT, pager.get_page(PageId::ROOT)?);
            root.initialize();
            root.set_root(true);
            debug!("initialized empty table");
        } else {
            Node::from_page(PageId::ROOT, &*pager.get_page(PageId::ROOT)?)?;
        }

        Ok(Self {
            pager,
            root_page_num: PageId::ROOT,
            config,
        })
    }

    /// Root page number
    pub fn root_page_num(&self) -> PageId {
        self.root_page_num
    }

    /// Node limits in effect
    pub fn config(&self) -> &BTreeConfig {
        &self.config
    }

    /// The underlying pager
    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    /// The underlying pager, mutably
    pub fn pager_mut(&mut self) -> &mut Pager {
        &mut self.pager
    }

    /// Insert a row keyed by its id
    pub fn insert(&mut self, row: &Row) -> Result<()> {
        let key = row.id;
        let mut cursor = self.find(key)?;
        if cursor.points_at(key)? {
            return Err(StorageError::DuplicateKey(key));
        }
        cursor.insert(key, row)
    }

    /// Look up a row by id
    pub fn get(&mut self, key: u32) -> Result<Option<Row>> {
        let mut cursor = self.find(key)?;
        if cursor.points_at(key)? {
            return cursor.row().map(Some);
        }
        Ok(None)
    }

    /// Scan a range of keys
    ///
    /// Returns all rows where start <= id < end.
    /// If start is None, scan from the beginning.
    /// If end is None, scan to the end.
    pub fn scan(&mut self, start: Option<u32>, end: Option<u32>) -> Result<Vec<Row>> {
        let mut cursor = match start {
            Some(key) => self.find(key)?.settled()?,
            None => self.start()?,
        };

        let mut rows = Vec::new();
        while !cursor.end_of_table() {
            if let Some(end) = end {
                if cursor.key()? >= end {
                    break;
                }
            }
            rows.push(cursor.row()?);
            cursor.advance()?;
        }
        Ok(rows)
    }

    /// Every row in key order
    pub fn select_all(&mut self) -> Result<Vec<Row>> {
        self.scan(None, None)
    }

    /// Cursor at the first row
    pub fn start(&mut self) -> Result<Cursor<'_>> {
        Cursor::table_start(self)
    }

    /// Cursor at `key`, or where `key` would be inserted
    pub fn find(&mut self, key: u32) -> Result<Cursor<'_>> {
        Cursor::table_find(self, key)
    }

    /// Number of levels from the root down to the leaves
    pub fn height(&mut self) -> Result<usize> {
        let mut height = 1;
        let mut page_id = self.root_page_num;
        loop {
            match Node::from_page(page_id, &*self.pager.get_page(page_id)?)? {
                Node::Leaf(_) => return Ok(height),
                Node::Internal(node) => page_id = node.child(0)?,
            }
            height += 1;
            self.check_depth(height)?;
        }
    }

    /// Write every cached page back to the file
    pub fn flush(&mut self) -> Result<()> {
        self.pager.flush_all()
    }

    /// Flush and release the table
    pub fn close(mut self) -> Result<()> {
        self.flush()?;
        debug!(pages = self.pager.num_pages(), "closed table");
        Ok(())
    }

    /// Export the tree structure for inspection
    pub fn export_tree(&mut self) -> Result<TreeNode> {
        self.export_node(self.root_page_num, 1)
    }

    fn export_node(&mut self, page_id: PageId, depth: usize) -> Result<TreeNode> {
        self.check_depth(depth)?;

        let (keys, children) = match Node::from_page(page_id, &*self.pager.get_page(page_id)?)? {
            Node::Leaf(leaf) => (leaf.keys().collect(), Vec::new()),
            Node::Internal(node) => (node.keys().collect(), node.children()?),
        };

        let is_leaf = children.is_empty();
        let children = children
            .into_iter()
            .map(|child| self.export_node(child, depth + 1))
            .collect::<Result<Vec<_>>>()?;

        Ok(TreeNode {
            page_id: page_id.value(),
            is_leaf,
            keys,
            children,
        })
    }

    /// A corrupt child pointer can form a cycle; no real path is longer than
    /// the number of pages.
    pub(crate) fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > self.pager.max_pages() as usize {
            return Err(StorageError::corruption("child pointers form a cycle"));
        }
        Ok(())
    }

    /// View `page_id` as a leaf
    pub(crate) fn leaf(&mut self, page_id: PageId) -> Result<LeafNode<&mut PageBuf>> {
        match Node::from_page(page_id, self.pager.get_page(page_id)?)? {
            Node::Leaf(leaf) => Ok(leaf),
            Node::Internal(_) => Err(StorageError::corruption(format!(
                "page {} is not a leaf",
                page_id
            ))),
        }
    }

    /// View `page_id` as an internal node
    fn internal(&mut self, page_id: PageId) -> Result<InternalNode<&mut PageBuf>> {
        match Node::from_page(page_id, self.pager.get_page(page_id)?)? {
            Node::Internal(node) => Ok(node),
            Node::Leaf(_) => Err(StorageError::corruption(format!(
                "page {} is not an internal node",
                page_id
            ))),
        }
    }

    /// Largest key stored in `page_id`; only empty root leaves have none
    fn node_max_key(&mut self, page_id: PageId) -> Result<u32> {
        Node::from_page(page_id, &*self.pager.get_page(page_id)?)?
            .max_key()
            .ok_or_else(|| StorageError::corruption(format!("page {} is empty", page_id)))
    }

    /// Insert `key`/`row` at `cell_num` of leaf `page_id`, splitting if full.
    ///
    /// `cell_num` must be the sorted position of `key`, as found by a cursor.
    pub(crate) fn leaf_insert(
        &mut self,
        page_id: PageId,
        cell_num: usize,
        key: u32,
        row: &Row,
    ) -> Result<()> {
        let max_cells = self.config.max_leaf_cells;
        let num_cells = self.leaf(page_id)?.cell_count();

        if cell_num > num_cells {
            return Err(StorageError::CellIndexOutOfBounds {
                page_id,
                index: cell_num,
                cell_count: num_cells,
            });
        }
        if num_cells > max_cells {
            return Err(StorageError::invalid_config(format!(
                "leaf {} holds {} cells, more than max_leaf_cells {}",
                page_id, num_cells, max_cells
            )));
        }
        if num_cells == max_cells {
            return self.leaf_split_and_insert(page_id, cell_num, key, row);
        }

        let mut leaf = self.leaf(page_id)?;
        // Open a gap at `cell_num`, copying the last cell first so every
        // cell is read before its slot is overwritten.
        for i in (cell_num + 1..=num_cells).rev() {
            leaf.copy_cell(i - 1, i);
        }
        leaf.set_cell_count(num_cells + 1);
        leaf.write_cell(cell_num, key, row);

        trace!(page = %page_id, cell = cell_num, key, "inserted into leaf");
        Ok(())
    }

    /// Split the full leaf `page_id` in two while inserting `key`/`row`.
    ///
    /// The old page keeps the lower half and a new page takes the upper half.
    fn leaf_split_and_insert(
        &mut self,
        page_id: PageId,
        cell_num: usize,
        key: u32,
        row: &Row,
    ) -> Result<()> {
        let (is_root, parent_id, old_max) = {
            let leaf = self.leaf(page_id)?;
            (leaf.is_root(), leaf.parent(), leaf.max_key())
        };

        // Refuse unsupported shapes and missing pages before touching anything.
        if is_root {
            self.pager.ensure_capacity(2)?;
        } else {
            if self.internal(parent_id)?.num_keys() >= self.config.max_internal_keys {
                return Err(StorageError::Unimplemented("splitting an internal node"));
            }
            self.pager.ensure_capacity(1)?;
        }

        let max_cells = self.config.max_leaf_cells;
        let left_count = self.config.leaf_left_split_count();
        let right_count = self.config.leaf_right_split_count();
        let new_page_id = self.pager.allocate_page_number();

        {
            let (old_page, new_page) = self.pager.get_page_pair(page_id, new_page_id)?;
            let mut old = LeafNode::new(page_id, old_page);
            let mut new = LeafNode::new(new_page_id, new_page);

            new.initialize();
            new.set_parent(parent_id);
            new.set_next_leaf(old.next_leaf());
            old.set_next_leaf(Some(new_page_id));

            // Walk the max_cells + 1 logical positions from the top down.
            // Position i holds old cell i below the insertion point and old
            // cell i - 1 above it; going downwards, old cell i - 1 is always
            // read before slot i - 1 of the old page is rewritten.
            for i in (0..=max_cells).rev() {
                let goes_right = i >= left_count;
                let slot = if goes_right { i - left_count } else { i };

                if i == cell_num {
                    if goes_right {
                        new.write_cell(slot, key, row);
                    } else {
                        old.write_cell(slot, key, row);
                    }
                } else if i > cell_num {
                    if goes_right {
                        new.set_cell(slot, old.cell(i - 1));
                    } else {
                        old.copy_cell(i - 1, slot);
                    }
                } else if goes_right {
                    new.set_cell(slot, old.cell(i));
                }
            }

            old.set_cell_count(left_count);
            new.set_cell_count(right_count);
        }

        debug!(
            page = %page_id,
            new_page = %new_page_id,
            left = left_count,
            right = right_count,
            "split leaf"
        );

        if is_root {
            return self.create_new_root(new_page_id);
        }

        let old_max = old_max
            .ok_or_else(|| StorageError::corruption(format!("page {} is empty", page_id)))?;
        let new_max = self.node_max_key(page_id)?;
        self.update_internal_node_key(parent_id, old_max, new_max)?;
        self.internal_node_insert(parent_id, new_page_id)
    }

    /// Promote a new root after the root leaf split into itself and
    /// `right_child_id`.
    ///
    /// The old root's bytes move to a fresh left child and the root page is
    /// rewritten in place as an internal node, so the root keeps its page
    /// number.
    fn create_new_root(&mut self, right_child_id: PageId) -> Result<()> {
        let root_id = self.root_page_num;
        let left_child_id = self.pager.allocate_page_number();

        {
            let (root_page, left_page) = self.pager.get_page_pair(root_id, left_child_id)?;
            left_page.clone_from(root_page);
            left_page.set_root(false);
            left_page.set_parent(root_id);

            let mut root = InternalNode::new(root_id, root_page);
            root.initialize();
            root.set_root(true);
            root.set_num_keys(1);
            root.set_child(0, left_child_id)?;
            root.set_right_child(right_child_id);
        }

        let left_max = self.node_max_key(left_child_id)?;
        self.internal(root_id)?.set_key(0, left_max);
        self.pager.get_page(right_child_id)?.set_parent(root_id);

        debug!(
            root = %root_id,
            left = %left_child_id,
            right = %right_child_id,
            key = left_max,
            "promoted new root"
        );
        Ok(())
    }

    /// Replace the parent's key for a child whose max changed from `old_key`
    /// to `new_key`. The right child has no key, so nothing changes for it.
    fn update_internal_node_key(
        &mut self,
        parent_id: PageId,
        old_key: u32,
        new_key: u32,
    ) -> Result<()> {
        let mut parent = self.internal(parent_id)?;
        let index = parent.find_child_index(old_key);
        if index < parent.num_keys() {
            parent.set_key(index, new_key);
        }
        Ok(())
    }

    /// Link `child_id` into `parent_id` at its sorted position
    fn internal_node_insert(&mut self, parent_id: PageId, child_id: PageId) -> Result<()> {
        let child_max = self.node_max_key(child_id)?;
        let right_child_id = self.internal(parent_id)?.right_child();
        let right_max = self.node_max_key(right_child_id)?;
        let max_keys = self.config.max_internal_keys;

        let mut parent = self.internal(parent_id)?;
        let num_keys = parent.num_keys();
        if num_keys >= max_keys {
            return Err(StorageError::Unimplemented("splitting an internal node"));
        }

        if child_max > right_max {
            // The old right child moves into the last key cell
            parent.set_num_keys(num_keys + 1);
            parent.set_child(num_keys, right_child_id)?;
            parent.set_key(num_keys, right_max);
            parent.set_right_child(child_id);
        } else {
            let index = parent.find_child_index(child_max);
            // Open a gap at `index`, last cell first
            for i in (index + 1..=num_keys).rev() {
                parent.copy_cell(i - 1, i);
            }
            parent.set_num_keys(num_keys + 1);
            parent.set_child(index, child_id)?;
            parent.set_key(index, child_max);
        }

        debug!(parent = %parent_id, child = %child_id, key = child_max, "linked leaf into parent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::page::LEAF_NODE_MAX_CELLS;
    use crate::types::TABLE_MAX_PAGES;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use tempfile::tempdir;

    fn create_test_table(config: BTreeConfig) -> Result<(Table, tempfile::TempDir)> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let pager = Pager::open(&path, TABLE_MAX_PAGES, false)?;
        let table = Table::open(pager, config)?;
        Ok((table, dir))
    }

    fn row(id: u32) -> Row {
        Row::new(id, &format!("user{}", id), &format!("person{}@example.com", id)).unwrap()
    }

    fn ids(rows: &[Row]) -> Vec<u32> {
        rows.iter().map(|r| r.id).collect()
    }

    fn leaf_keys(table: &mut Table, page_id: PageId) -> Vec<u32> {
        table.leaf(page_id).unwrap().keys().collect()
    }

    #[test]
    fn test_empty_table() -> Result<()> {
        let (mut table, _dir) = create_test_table(BTreeConfig::default())?;
        assert!(table.select_all()?.is_empty());
        assert_eq!(table.get(1)?, None);
        assert_eq!(table.height()?, 1);
        assert!(table.pager().is_cached(PageId::ROOT));
        Ok(())
    }

    #[test]
    fn test_insert_out_of_order() -> Result<()> {
        let (mut table, _dir) = create_test_table(BTreeConfig::default())?;

        for id in [3, 1, 2] {
            table.insert(&row(id))?;
        }

        let rows = table.select_all()?;
        assert_eq!(ids(&rows), vec![1, 2, 3]);
        assert_eq!(rows[1].username(), "user2");
        assert_eq!(table.get(3)?, Some(row(3)));
        assert_eq!(table.get(4)?, None);

        Ok(())
    }

    #[test]
    fn test_duplicate_key() -> Result<()> {
        let (mut table, _dir) = create_test_table(BTreeConfig::default())?;

        table.insert(&row(1))?;
        let err = table
            .insert(&Row::new(1, "other", "other@example.com")?)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);

        let rows = table.select_all()?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].username(), "user1");

        Ok(())
    }

    #[test]
    fn test_fill_single_leaf_without_split() -> Result<()> {
        let (mut table, _dir) = create_test_table(BTreeConfig::default())?;

        for id in (1..=LEAF_NODE_MAX_CELLS as u32).rev() {
            table.insert(&row(id))?;
        }

        assert_eq!(table.height()?, 1);
        assert_eq!(table.pager().num_pages(), 1);
        assert_eq!(
            ids(&table.select_all()?),
            (1..=LEAF_NODE_MAX_CELLS as u32).collect::<Vec<_>>()
        );

        Ok(())
    }

    #[test]
    fn test_root_split_partition() -> Result<()> {
        let (mut table, _dir) = create_test_table(BTreeConfig::default())?;

        let max = LEAF_NODE_MAX_CELLS as u32;
        let mut keys: Vec<u32> = (1..=max + 1).map(|k| k * 10).collect();
        keys.shuffle(&mut StdRng::seed_from_u64(42));
        for &key in &keys {
            table.insert(&row(key))?;
        }

        let (left_id, right_id, root_key) = {
            let root = table.internal(PageId::ROOT)?;
            assert!(root.is_root());
            assert_eq!(root.num_keys(), 1);
            (root.child(0)?, root.right_child(), root.key(0))
        };

        let left = leaf_keys(&mut table, left_id);
        let right = leaf_keys(&mut table, right_id);
        assert_eq!(left.len(), 7);
        assert_eq!(right.len(), 7);
        assert_eq!(*left.last().unwrap(), root_key);
        assert!(right[0] > root_key);

        let all: Vec<u32> = left.iter().chain(right.iter()).copied().collect();
        keys.sort_unstable();
        assert_eq!(all, keys);

        // Children point back at the root, left links to right
        assert!(!table.leaf(left_id)?.is_root());
        assert_eq!(table.leaf(left_id)?.parent(), PageId::ROOT);
        assert_eq!(table.leaf(right_id)?.parent(), PageId::ROOT);
        assert_eq!(table.leaf(left_id)?.next_leaf(), Some(right_id));
        assert_eq!(table.leaf(right_id)?.next_leaf(), None);

        assert_eq!(ids(&table.select_all()?), keys);
        assert_eq!(table.height()?, 2);

        Ok(())
    }

    #[test]
    fn test_split_keeps_rows_intact() -> Result<()> {
        let (mut table, _dir) = create_test_table(BTreeConfig::new(4, 8))?;

        // New key lands in the middle of the left half
        for id in [10, 20, 30, 40, 15] {
            table.insert(&row(id))?;
        }

        let (left_id, right_id) = {
            let root = table.internal(PageId::ROOT)?;
            (root.child(0)?, root.right_child())
        };
        assert_eq!(leaf_keys(&mut table, left_id), vec![10, 15, 20]);
        assert_eq!(leaf_keys(&mut table, right_id), vec![30, 40]);

        for id in [10, 15, 20, 30, 40] {
            assert_eq!(table.get(id)?, Some(row(id)), "row {}", id);
        }

        Ok(())
    }

    #[test]
    fn test_insert_position_past_last_cell() -> Result<()> {
        let (mut table, _dir) = create_test_table(BTreeConfig::default())?;
        table.insert(&row(1))?;

        let err = table.leaf_insert(PageId::ROOT, 5, 9, &row(9)).unwrap_err();
        assert!(matches!(
            err,
            StorageError::CellIndexOutOfBounds { index: 5, cell_count: 1, .. }
        ));
        assert_eq!(ids(&table.select_all()?), vec![1]);

        Ok(())
    }

    #[test]
    fn test_leaf_split_under_internal_parent() -> Result<()> {
        let (mut table, _dir) = create_test_table(BTreeConfig::new(4, 8))?;

        for id in 1..=5 {
            table.insert(&row(id))?;
        }
        // Leaves: [1,2,3] [4,5]. Fill and split the left leaf (not the root).
        table.insert(&row(0))?;
        table.insert(&row(100))?;
        table.insert(&row(101))?;
        let before = table.pager().num_pages();
        table.insert(&row(102))?;
        table.insert(&row(103))?;

        assert!(table.pager().num_pages() > before);
        let root = table.export_tree()?;
        assert_eq!(root.children.len(), root.keys.len() + 1);
        for (i, key) in root.keys.iter().enumerate() {
            assert_eq!(root.children[i].keys.last(), Some(key));
            assert!(root.children[i + 1].keys[0] > *key);
        }

        // Split in the middle of a non-rightmost leaf
        table.insert(&row(6))?;
        table.insert(&row(7))?;
        table.insert(&row(8))?;

        let expected = vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 100, 101, 102, 103];
        assert_eq!(ids(&table.select_all()?), expected);
        for id in expected {
            assert_eq!(table.get(id)?, Some(row(id)));
        }
        assert_eq!(table.height()?, 2);

        Ok(())
    }

    #[test]
    fn test_full_parent_is_unimplemented() -> Result<()> {
        let (mut table, _dir) = create_test_table(BTreeConfig::new(4, 2))?;

        // Leaves [1,2,3] [4,5,6] [7,8,9,10]; the root holds two keys
        for id in 1..=10 {
            table.insert(&row(id))?;
        }
        assert_eq!(table.internal(PageId::ROOT)?.num_keys(), 2);
        let pages_before = table.pager().num_pages();
        let tree_before = table.export_tree()?;

        let err = table.insert(&row(11)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unimplemented);
        assert!(matches!(err, StorageError::Unimplemented("splitting an internal node")));

        // Nothing was written or allocated
        assert_eq!(table.pager().num_pages(), pages_before);
        assert_eq!(table.export_tree()?, tree_before);
        assert_eq!(ids(&table.select_all()?), (1..=10).collect::<Vec<_>>());
        assert_eq!(table.get(11)?, None);

        // Leaves with room still accept rows
        table.insert(&row(0))?;
        assert_eq!(table.get(0)?, Some(row(0)));

        Ok(())
    }

    #[test]
    fn test_page_limit_rejects_split_up_front() -> Result<()> {
        let dir = tempdir().unwrap();
        let pager = Pager::open(&dir.path().join("test.db"), 2, false)?;
        let mut table = Table::open(pager, BTreeConfig::new(2, 4))?;

        table.insert(&row(1))?;
        table.insert(&row(2))?;
        let err = table.insert(&row(3)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CapacityExceeded);

        // The root is still an intact leaf
        assert_eq!(table.pager().num_pages(), 1);
        assert_eq!(ids(&table.select_all()?), vec![1, 2]);

        Ok(())
    }

    #[test]
    fn test_scan_ranges() -> Result<()> {
        let (mut table, _dir) = create_test_table(BTreeConfig::new(3, 8))?;

        for id in (2..=20).step_by(2) {
            table.insert(&row(id))?;
        }

        assert_eq!(ids(&table.scan(Some(5), Some(11))?), vec![6, 8, 10]);
        assert_eq!(ids(&table.scan(Some(6), Some(7))?), vec![6]);
        assert_eq!(ids(&table.scan(None, Some(4))?), vec![2]);
        assert_eq!(ids(&table.scan(Some(19), None)?), vec![20]);
        assert!(table.scan(Some(21), None)?.is_empty());
        assert!(table.scan(Some(8), Some(8))?.is_empty());

        Ok(())
    }

    #[test]
    fn test_shuffled_inserts_scan_sorted() -> Result<()> {
        let (mut table, _dir) = create_test_table(BTreeConfig::default())?;

        let mut keys: Vec<u32> = (1..=200).collect();
        keys.shuffle(&mut StdRng::seed_from_u64(7));
        for &key in &keys {
            table.insert(&row(key))?;
        }

        let rows = table.select_all()?;
        assert_eq!(ids(&rows), (1..=200).collect::<Vec<_>>());
        assert_eq!(rows[99], row(100));

        Ok(())
    }

    #[test]
    fn test_reopen_after_split() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let pager = Pager::open(&path, TABLE_MAX_PAGES, false)?;
            let mut table = Table::open(pager, BTreeConfig::default())?;
            for id in 1..=30 {
                table.insert(&row(id))?;
            }
            table.close()?;
        }

        let pager = Pager::open(&path, TABLE_MAX_PAGES, false)?;
        let mut table = Table::open(pager, BTreeConfig::default())?;
        assert_eq!(ids(&table.select_all()?), (1..=30).collect::<Vec<_>>());
        table.insert(&row(31))?;
        assert_eq!(table.get(31)?, Some(row(31)));

        Ok(())
    }

    /// Overwrite the big-endian count at bytes 6..10 of `page_id` in the file
    fn corrupt_count(path: &std::path::Path, page_id: PageId, count: u32) {
        use std::io::{Seek, SeekFrom, Write};

        let mut file = std::fs::OpenOptions::new().write(true).open(path).unwrap();
        file.seek(SeekFrom::Start(page_id.file_offset(crate::types::PAGE_SIZE) + 6))
            .unwrap();
        file.write_all(&count.to_be_bytes()).unwrap();
    }

    #[test]
    fn test_oversized_cell_count_on_disk() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let pager = Pager::open(&path, TABLE_MAX_PAGES, false)?;
            let mut table = Table::open(pager, BTreeConfig::default())?;
            table.insert(&row(1))?;
            table.close()?;
        }
        corrupt_count(&path, PageId::ROOT, 1000);

        let pager = Pager::open(&path, TABLE_MAX_PAGES, false)?;
        let err = Table::open(pager, BTreeConfig::default()).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Corruption);

        Ok(())
    }

    #[test]
    fn test_oversized_cell_count_in_child_leaf() -> Result<()> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let right_id = {
            let pager = Pager::open(&path, TABLE_MAX_PAGES, false)?;
            let mut table = Table::open(pager, BTreeConfig::new(3, 8))?;
            for id in 1..=4 {
                table.insert(&row(id))?;
            }
            let right_id = table.internal(PageId::ROOT)?.right_child();
            table.close()?;
            right_id
        };
        corrupt_count(&path, right_id, 1000);

        let pager = Pager::open(&path, TABLE_MAX_PAGES, false)?;
        let mut table = Table::open(pager, BTreeConfig::new(3, 8))?;
        assert_eq!(table.select_all().unwrap_err().kind(), ErrorKind::Corruption);
        assert_eq!(table.get(4).unwrap_err().kind(), ErrorKind::Corruption);
        assert_eq!(table.insert(&row(5)).unwrap_err().kind(), ErrorKind::Corruption);

        Ok(())
    }

    #[test]
    fn test_open_rejects_garbage_root() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        std::fs::write(&path, vec![0u8; crate::types::PAGE_SIZE]).unwrap();

        let pager = Pager::open(&path, TABLE_MAX_PAGES, false).unwrap();
        let err = Table::open(pager, BTreeConfig::default()).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Corruption);
    }
}
