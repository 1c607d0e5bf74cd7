// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Persistent B+-tree over a scalar key, with a compile-time branching
//! factor and a fixed on-disk layout (see `format.rs`).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ BPlusTree<B>                 │
//! ├──────────────────────────────┤
//! │ - arena: Arena (mmap)        │
//! │ - header: Header (cached)    │
//! │ - config: BTreeConfig        │
//! └──────────────────────────────┘
//!            │
//!            ▼ offsets, never raw pointers
//! ┌──────────────────────────────┐
//! │ [Header][Leaf][Node][Leaf]...│   single arena, bump-allocated
//! └──────────────────────────────┘
//! ```
//!
//! Insertion descends to a leaf, inserts, and on overflow asks the *parent*
//! (which alone knows the overflowing child's siblings) to redistribute
//! left, then right, then split — recursively, so a split that itself
//! overflows the parent is handled the same way one level up. Deletion is
//! lazy: an item is removed from its leaf but the tree is never rebalanced.

use super::format::*;
use super::node::{is_leaf, BinBlock, InternalNode, KvPair, Leaf};
use crate::arena::{Arena, OpenStatus};
use crate::error::{ReedError, ReedResult};
use crate::log;
use std::path::Path;

/// How `insert` behaves when a key already exists in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Reject the insert; the existing value is kept.
    Reject,
    /// Keep the original leaf slot but chain additional values off it in a
    /// doubling-capacity bin.
    Bin,
    /// Allow multiple leaf slots with the same key, visited in insertion
    /// order during a range scan.
    Allow,
}

#[derive(Debug, Clone, Copy)]
pub struct BTreeConfig {
    pub duplicate_policy: DuplicatePolicy,
}

impl Default for BTreeConfig {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::Reject,
        }
    }
}

/// A persistent B+-tree with branching factor `B`, mapping `f32` keys to
/// `u32` values.
pub struct BPlusTree<const B: usize> {
    arena: Arena,
    header: Header,
    config: BTreeConfig,
}

impl<const B: usize> BPlusTree<B> {
    /// Opens `path`, creating and initialising it if it doesn't exist.
    pub fn open<P: AsRef<Path>>(path: P, config: BTreeConfig) -> ReedResult<(Self, OpenStatus)> {
        let initial_size = HEADER_SIZE + leaf_size(B);
        let (arena, status) = Arena::open(path, initial_size)?;

        let mut tree = Self {
            arena,
            header: Header {
                magic: BTREE_MAGIC,
                branching_factor: B as u16,
                itemattrib: config.duplicate_policy == DuplicatePolicy::Bin,
                depth: 0,
                dirty: false,
                nnodes: 0,
                nleaves: 1,
                nitems: 0,
                usedsize: initial_size as u32,
                root_offset: HEADER_SIZE as u32,
            },
            config,
        };

        match status {
            OpenStatus::New => tree.initialise()?,
            OpenStatus::Existing => tree.load()?,
        }

        Ok((tree, status))
    }

    fn initialise(&mut self) -> ReedResult<()> {
        self.header.write(self.arena.as_mut_slice());
        let root_offset = self.header.root_offset as usize;
        Leaf::new_empty().write(self.arena.as_mut_slice(), root_offset, B);
        Ok(())
    }

    fn load(&mut self) -> ReedResult<()> {
        let header = Header::read(self.arena.as_slice());
        if header.magic != BTREE_MAGIC {
            return Err(ReedError::SignatureMismatch {
                expected: BTREE_MAGIC,
                found: header.magic,
            });
        }
        if header.branching_factor != B as u16 {
            return Err(ReedError::BranchingFactorMismatch {
                expected: B as u16,
                found: header.branching_factor,
            });
        }
        if header.dirty {
            // Repair is a stub: warn and open the tree as-is.
            log::warn(
                "btree",
                format!("{} was not closed cleanly (dirty bit set)", self.arena.path().display()),
            );
        }
        self.header = header;
        Ok(())
    }

    /// Number of live items, per the header watermark.
    pub fn len(&self) -> usize {
        self.header.nitems as usize
    }

    pub fn is_empty(&self) -> bool {
        self.header.nitems == 0
    }

    fn commit_header(&mut self) {
        self.header.write(self.arena.as_mut_slice());
    }

    fn begin_mutation(&mut self) {
        self.header.dirty = true;
        self.commit_header();
    }

    fn end_mutation(&mut self) {
        self.header.dirty = false;
        self.commit_header();
    }

    // ---- allocation -----------------------------------------------------

    fn alloc_bytes(&mut self, size: usize) -> ReedResult<u32> {
        let offset = self.header.usedsize as usize;
        let needed = offset + size;
        if needed > self.arena.len() {
            let mut new_len = self.arena.len().max(1);
            while new_len < needed {
                new_len *= 2;
            }
            self.arena.resize(new_len)?;
        }
        self.header.usedsize = needed as u32;
        Ok(offset as u32)
    }

    fn alloc_leaf(&mut self) -> ReedResult<u32> {
        let offset = self.alloc_bytes(leaf_size(B))?;
        self.header.nleaves += 1;
        Ok(offset)
    }

    fn alloc_node(&mut self) -> ReedResult<u32> {
        let offset = self.alloc_bytes(node_size(B))?;
        self.header.nnodes += 1;
        Ok(offset)
    }

    fn alloc_bin(&mut self, capacity: usize) -> ReedResult<u32> {
        self.alloc_bytes(bin_size(capacity))
    }

    fn read_leaf(&self, offset: u32) -> Leaf {
        Leaf::read(self.arena.as_slice(), offset as usize, B)
    }

    fn write_leaf(&mut self, offset: u32, leaf: &Leaf) {
        leaf.write(self.arena.as_mut_slice(), offset as usize, B);
    }

    fn read_node(&self, offset: u32) -> InternalNode {
        InternalNode::read(self.arena.as_slice(), offset as usize, B)
    }

    fn write_node(&mut self, offset: u32, node: &InternalNode) {
        node.write(self.arena.as_mut_slice(), offset as usize, B);
    }

    fn read_bin(&self, offset: u32) -> BinBlock {
        BinBlock::read(self.arena.as_slice(), offset as usize)
    }

    fn write_bin(&mut self, offset: u32, bin: &BinBlock) {
        bin.write(self.arena.as_mut_slice(), offset as usize);
    }

    /// Smallest `i` with `key <= keys[i]`, or `keys.len()` if none.
    fn find_child_index(keys: &[Key], key: Key) -> usize {
        keys.iter().position(|&k| key <= k).unwrap_or(keys.len())
    }

    /// Flattens one leaf slot into its value(s): the direct value, or every
    /// value in its bin chain if it's indirect.
    fn expand_values(&self, item: &KvPair) -> Vec<Value> {
        if !item.indirect {
            return vec![item.value];
        }
        let mut values = Vec::new();
        let mut offset = item.value;
        while offset != NULL_OFFSET {
            let bin = self.read_bin(offset);
            if !bin.tombstoned {
                values.extend(bin.values.iter().copied());
            }
            offset = bin.next;
        }
        values
    }

    // ---- point lookup -----------------------------------------------------

    fn descend_to_leaf(&self, key: Key) -> u32 {
        let mut offset = self.header.root_offset;
        for _ in 0..self.header.depth {
            let node = self.read_node(offset);
            let i = Self::find_child_index(&node.keys, key);
            offset = node.children[i];
        }
        offset
    }

    /// Point lookup. Returns the first value stored for `key` (with `Bin`
    /// or `Allow` duplicates there may be more; see [`Self::search_all`]).
    pub fn search(&self, key: Key) -> ReedResult<Option<Value>> {
        Ok(self.search_all(key)?.into_iter().next())
    }

    /// Point lookup returning every value stored for `key`.
    pub fn search_all(&self, key: Key) -> ReedResult<Vec<Value>> {
        let leaf_offset = self.descend_to_leaf(key);
        let leaf = self.read_leaf(leaf_offset);
        let mut out = Vec::new();
        for item in leaf.items.iter().filter(|it| it.key == key) {
            out.extend(self.expand_values(item));
        }
        Ok(out)
    }

    /// All pairs with `kmin <= key <= kmax`, in ascending key order.
    pub fn search_range(&self, kmin: Key, kmax: Key) -> ReedResult<Vec<(Key, Value)>> {
        if kmax < kmin {
            return Err(ReedError::InvalidRange { kmin, kmax });
        }

        let mut results = Vec::new();
        let mut leaf_offset = self.descend_to_leaf(kmin);

        loop {
            let leaf = self.read_leaf(leaf_offset);
            let mut stop = false;
            for item in &leaf.items {
                if item.key < kmin {
                    continue;
                }
                if item.key > kmax {
                    stop = true;
                    break;
                }
                for v in self.expand_values(item) {
                    results.push((item.key, v));
                }
            }
            if stop || leaf.next == NULL_OFFSET {
                break;
            }
            leaf_offset = leaf.next;
        }

        Ok(results)
    }

    /// Leftmost item, skipping past any empty leaves left behind by
    /// deletions.
    pub fn min(&self) -> ReedResult<Option<(Key, Value)>> {
        let mut offset = self.header.root_offset;
        for _ in 0..self.header.depth {
            let node = self.read_node(offset);
            offset = node.children[0];
        }
        loop {
            let leaf = self.read_leaf(offset);
            if let Some(item) = leaf.items.first() {
                return Ok(Some((item.key, self.expand_values(item)[0])));
            }
            if leaf.next == NULL_OFFSET {
                return Ok(None);
            }
            offset = leaf.next;
        }
    }

    /// Rightmost item, skipping past any empty leaves left behind by
    /// deletions.
    pub fn max(&self) -> ReedResult<Option<(Key, Value)>> {
        let mut offset = self.header.root_offset;
        for _ in 0..self.header.depth {
            let node = self.read_node(offset);
            offset = *node.children.last().unwrap();
        }
        loop {
            let leaf = self.read_leaf(offset);
            if let Some(item) = leaf.items.last() {
                return Ok(Some((item.key, *self.expand_values(item).last().unwrap())));
            }
            if leaf.prev == NULL_OFFSET {
                return Ok(None);
            }
            offset = leaf.prev;
        }
    }

    /// Full in-order traversal via the leaf linked list.
    pub fn enumerate(&self) -> ReedResult<Vec<(Key, Value)>> {
        let mut offset = self.header.root_offset;
        for _ in 0..self.header.depth {
            let node = self.read_node(offset);
            offset = node.children[0];
        }

        let mut results = Vec::with_capacity(self.header.nitems as usize);
        loop {
            let leaf = self.read_leaf(offset);
            for item in &leaf.items {
                for v in self.expand_values(item) {
                    results.push((item.key, v));
                }
            }
            if leaf.next == NULL_OFFSET {
                break;
            }
            offset = leaf.next;
        }
        Ok(results)
    }

    // ---- insertion ----------------------------------------------------

    pub fn insert(&mut self, key: Key, value: Value) -> ReedResult<()> {
        self.begin_mutation();
        let result = self.insert_impl(key, value);
        self.end_mutation();
        result
    }

    fn insert_impl(&mut self, key: Key, value: Value) -> ReedResult<()> {
        let root_offset = self.header.root_offset;
        let depth = self.header.depth;
        let overflowed = self.insert_node(root_offset, depth, key, value)?;
        if overflowed {
            self.split_root(root_offset, depth);
        }
        Ok(())
    }

    /// Inserts into the subtree rooted at `offset` (`level` levels above the
    /// leaves). Returns `true` if this node now holds one more item/key
    /// than its at-rest capacity and the caller must redistribute or split
    /// it.
    fn insert_node(&mut self, offset: u32, level: u8, key: Key, value: Value) -> ReedResult<bool> {
        if level == 0 {
            return self.insert_into_leaf(offset, key, value);
        }

        let mut node = self.read_node(offset);
        let i = Self::find_child_index(&node.keys, key);
        let child_offset = node.children[i];
        let child_overflowed = self.insert_node(child_offset, level - 1, key, value)?;
        if !child_overflowed {
            return Ok(false);
        }

        let parent_overflowed = self.fix_child_overflow(&mut node, i, level - 1)?;
        self.write_node(offset, &node);
        Ok(parent_overflowed)
    }

    fn insert_into_leaf(&mut self, offset: u32, key: Key, value: Value) -> ReedResult<bool> {
        let mut leaf = self.read_leaf(offset);

        let insert_at = leaf.items.partition_point(|it| it.key < key);
        let exact_match = insert_at < leaf.items.len() && leaf.items[insert_at].key == key;

        if exact_match {
            match self.config.duplicate_policy {
                DuplicatePolicy::Reject => return Err(ReedError::DuplicateKey { key }),
                DuplicatePolicy::Allow => {
                    let after = leaf.items[insert_at..]
                        .iter()
                        .take_while(|it| it.key == key)
                        .count();
                    leaf.items.insert(
                        insert_at + after,
                        KvPair {
                            key,
                            value,
                            indirect: false,
                        },
                    );
                    self.header.nitems += 1;
                }
                DuplicatePolicy::Bin => {
                    let item = &mut leaf.items[insert_at];
                    if item.indirect {
                        item.value = self.insert_value_into_bin_chain(item.value, value)?;
                    } else {
                        let bin_offset = self.alloc_bin(BIN_INITIAL_CAPACITY.max(2))?;
                        self.write_bin(
                            bin_offset,
                            &BinBlock {
                                capacity: BIN_INITIAL_CAPACITY.max(2) as u32,
                                values: vec![item.value, value],
                                next: NULL_OFFSET,
                                tombstoned: false,
                            },
                        );
                        item.value = bin_offset;
                        item.indirect = true;
                    }
                }
            }
        } else {
            leaf.items.insert(
                insert_at,
                KvPair {
                    key,
                    value,
                    indirect: false,
                },
            );
            self.header.nitems += 1;
        }

        self.write_leaf(offset, &leaf);
        Ok(leaf.items.len() > B)
    }

    fn insert_value_into_bin_chain(&mut self, head: u32, value: Value) -> ReedResult<u32> {
        let mut head_block = self.read_bin(head);
        if head_block.values.len() < head_block.capacity as usize {
            head_block.values.push(value);
            self.write_bin(head, &head_block);
            return Ok(head);
        }

        let new_capacity = head_block.capacity as usize * 2;
        let new_offset = self.alloc_bin(new_capacity)?;
        self.write_bin(
            new_offset,
            &BinBlock {
                capacity: new_capacity as u32,
                values: vec![value],
                next: head,
                tombstoned: false,
            },
        );
        Ok(new_offset)
    }

    /// Redistributes or splits `parent.children[child_index]`, which has
    /// just overflowed. Returns whether `parent` itself now overflowed.
    fn fix_child_overflow(
        &mut self,
        parent: &mut InternalNode,
        child_index: usize,
        child_level: u8,
    ) -> ReedResult<bool> {
        if child_level == 0 {
            self.fix_leaf_overflow(parent, child_index)
        } else {
            self.fix_node_overflow(parent, child_index, child_level)
        }
    }

    fn fix_leaf_overflow(
        &mut self,
        parent: &mut InternalNode,
        child_index: usize,
    ) -> ReedResult<bool> {
        let child_offset = parent.children[child_index];
        let mut child = self.read_leaf(child_offset);

        // Redistribute left.
        if child_index > 0 {
            let left_offset = parent.children[child_index - 1];
            let mut left = self.read_leaf(left_offset);
            if left.items.len() < B {
                let moved = child.items.remove(0);
                left.items.push(moved);
                parent.keys[child_index - 1] = child.items[0].key;
                self.write_leaf(left_offset, &left);
                self.write_leaf(child_offset, &child);
                return Ok(false);
            }
        }

        // Redistribute right.
        if child_index + 1 < parent.children.len() {
            let right_offset = parent.children[child_index + 1];
            let mut right = self.read_leaf(right_offset);
            if right.items.len() < B {
                let moved = child.items.pop().unwrap();
                right.items.insert(0, moved);
                parent.keys[child_index] = right.items[0].key;
                self.write_leaf(right_offset, &right);
                self.write_leaf(child_offset, &child);
                return Ok(false);
            }
        }

        // Split. The existing leaf keeps the first (larger-when-odd) half;
        // a newly allocated leaf takes the rest.
        let total = child.items.len();
        let left_count = (total + 1) / 2;
        let right_items = child.items.split_off(left_count);
        let promoted_key = right_items[0].key;

        let new_offset = self.alloc_leaf()?;
        let mut new_leaf = Leaf {
            items: right_items,
            prev: child_offset,
            next: child.next,
        };

        if child.next != NULL_OFFSET {
            let mut next_of_child = self.read_leaf(child.next);
            next_of_child.prev = new_offset;
            self.write_leaf(child.next, &next_of_child);
        }
        child.next = new_offset;

        self.write_leaf(child_offset, &child);
        self.write_leaf(new_offset, &new_leaf);
        let _ = &mut new_leaf; // already written

        parent.keys.insert(child_index, promoted_key);
        parent.children.insert(child_index + 1, new_offset);

        Ok(parent.keys.len() > B - 1)
    }

    fn fix_node_overflow(
        &mut self,
        parent: &mut InternalNode,
        child_index: usize,
        child_level: u8,
    ) -> ReedResult<bool> {
        let child_offset = parent.children[child_index];
        let mut child = self.read_node(child_offset);

        // Redistribute left.
        if child_index > 0 {
            let left_offset = parent.children[child_index - 1];
            let mut left = self.read_node(left_offset);
            if left.keys.len() < B - 1 {
                left.keys.push(parent.keys[child_index - 1]);
                left.children.push(child.children.remove(0));
                parent.keys[child_index - 1] = child.keys.remove(0);
                self.write_node(left_offset, &left);
                self.write_node(child_offset, &child);
                return Ok(false);
            }
        }

        // Redistribute right.
        if child_index + 1 < parent.children.len() {
            let right_offset = parent.children[child_index + 1];
            let mut right = self.read_node(right_offset);
            if right.keys.len() < B - 1 {
                right.keys.insert(0, parent.keys[child_index]);
                right.children.insert(0, child.children.pop().unwrap());
                parent.keys[child_index] = child.keys.pop().unwrap();
                self.write_node(right_offset, &right);
                self.write_node(child_offset, &child);
                return Ok(false);
            }
        }

        // Split: the middle key is promoted, not duplicated into either side.
        // One key leaves as the promotion, so the remaining `len - 1` split
        // floor/ceil between left/right — left gets the floor share, right
        // the ceil, matching `_BptSplitNode`'s `[012] 3 [4567]` for B=8 and
        // the leaf split's right-favoring tie-break.
        let mid = (child.keys.len() - 1) / 2;
        let promoted_key = child.keys[mid];
        let right_keys = child.keys.split_off(mid + 1);
        child.keys.truncate(mid);
        let right_children = child.children.split_off(mid + 1);

        let new_offset = self.alloc_node()?;
        let new_node = InternalNode {
            keys: right_keys,
            children: right_children,
        };

        self.write_node(child_offset, &child);
        self.write_node(new_offset, &new_node);
        let _ = child_level;

        parent.keys.insert(child_index, promoted_key);
        parent.children.insert(child_index + 1, new_offset);

        Ok(parent.keys.len() > B - 1)
    }

    /// The root has no siblings to redistribute with: it always splits
    /// directly and grows the tree by one level.
    fn split_root(&mut self, root_offset: u32, depth: u8) {
        if depth == 0 {
            let mut root = self.read_leaf(root_offset);
            let total = root.items.len();
            let left_count = (total + 1) / 2;
            let right_items = root.items.split_off(left_count);
            let promoted_key = right_items[0].key;

            let left_offset = self.alloc_leaf().expect("arena growth failed");
            let right_offset = self.alloc_leaf().expect("arena growth failed");

            let left_leaf = Leaf {
                items: root.items,
                prev: NULL_OFFSET,
                next: right_offset,
            };
            let right_leaf = Leaf {
                items: right_items,
                prev: left_offset,
                next: NULL_OFFSET,
            };
            self.write_leaf(left_offset, &left_leaf);
            self.write_leaf(right_offset, &right_leaf);

            let new_root = InternalNode {
                keys: vec![promoted_key],
                children: vec![left_offset, right_offset],
            };
            let new_root_offset = self.alloc_node().expect("arena growth failed");
            self.write_node(new_root_offset, &new_root);

            self.header.root_offset = new_root_offset;
            self.header.depth = 1;
        } else {
            let mut root = self.read_node(root_offset);
            let mid = (root.keys.len() - 1) / 2;
            let promoted_key = root.keys[mid];
            let right_keys = root.keys.split_off(mid + 1);
            root.keys.truncate(mid);
            let right_children = root.children.split_off(mid + 1);

            let left_offset = root_offset;
            let right_offset = self.alloc_node().expect("arena growth failed");
            let right_node = InternalNode {
                keys: right_keys,
                children: right_children,
            };
            self.write_node(left_offset, &root);
            self.write_node(right_offset, &right_node);

            let new_root = InternalNode {
                keys: vec![promoted_key],
                children: vec![left_offset, right_offset],
            };
            let new_root_offset = self.alloc_node().expect("arena growth failed");
            self.write_node(new_root_offset, &new_root);

            self.header.root_offset = new_root_offset;
            self.header.depth = depth + 1;
        }
    }

    // ---- deletion -------------------------------------------------------

    /// Removes the first matching item from its leaf. The tree is never
    /// rebalanced (lazy delete); see the module docs.
    pub fn remove(&mut self, key: Key) -> ReedResult<bool> {
        self.begin_mutation();
        let result = self.remove_impl(key);
        self.end_mutation();
        result
    }

    fn remove_impl(&mut self, key: Key) -> ReedResult<bool> {
        let leaf_offset = self.descend_to_leaf(key);
        let mut leaf = self.read_leaf(leaf_offset);

        let idx = match leaf.items.iter().position(|it| it.key == key) {
            Some(i) => i,
            None => return Ok(false),
        };

        if leaf.items[idx].indirect {
            let mut offset = leaf.items[idx].value;
            while offset != NULL_OFFSET {
                let mut bin = self.read_bin(offset);
                bin.tombstoned = true;
                let next = bin.next;
                self.write_bin(offset, &bin);
                offset = next;
            }
        }

        leaf.items.remove(idx);
        self.header.nitems -= 1;
        self.write_leaf(leaf_offset, &leaf);
        Ok(true)
    }
}

/// Reads the leaf tag bit at `offset`, without knowing the branching
/// factor — useful for assertions and debug tooling.
pub fn peek_is_leaf(bytes: &[u8], offset: usize) -> bool {
    is_leaf(bytes, offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn open<const B: usize>(dir: &tempfile::TempDir, name: &str, policy: DuplicatePolicy) -> BPlusTree<B> {
        let path = dir.path().join(name);
        let (tree, _) = BPlusTree::<B>::open(&path, BTreeConfig { duplicate_policy: policy }).unwrap();
        tree
    }

    #[test]
    fn insert_and_search_ten_thousand_random_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut tree: BPlusTree<8> = open(&dir, "t.btree", DuplicatePolicy::Allow);
        let mut rng = StdRng::seed_from_u64(0xC0FFEE);

        let mut entries: Vec<(Key, Value)> = (0..10_000u32)
            .map(|v| (rng.random_range(-1.0e6..1.0e6), v))
            .collect();

        for &(k, v) in &entries {
            tree.insert(k, v).unwrap();
        }

        assert_eq!(tree.len(), entries.len());
        for &(k, v) in &entries {
            assert!(tree.search_all(k).unwrap().contains(&v));
        }

        entries.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        let (min_key, _) = tree.min().unwrap().unwrap();
        let (max_key, _) = tree.max().unwrap().unwrap();
        assert_eq!(min_key, entries.first().unwrap().0);
        assert_eq!(max_key, entries.last().unwrap().0);
        assert_eq!(tree.enumerate().unwrap().len(), entries.len());
    }

    #[test]
    fn leaf_split_boundary_with_branching_factor_four() {
        let dir = tempfile::tempdir().unwrap();
        let mut tree: BPlusTree<4> = open(&dir, "t.btree", DuplicatePolicy::Reject);

        for k in 1..=5u32 {
            tree.insert(k as f32, k * 10).unwrap();
        }

        assert_eq!(tree.len(), 5);
        for k in 1..=5u32 {
            assert_eq!(tree.search(k as f32).unwrap(), Some(k * 10));
        }
        let enumerated = tree.enumerate().unwrap();
        let keys: Vec<Key> = enumerated.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn range_scan_spans_multiple_leaves() {
        let dir = tempfile::tempdir().unwrap();
        let mut tree: BPlusTree<4> = open(&dir, "t.btree", DuplicatePolicy::Reject);

        for k in 1..=20u32 {
            tree.insert(k as f32, k).unwrap();
        }

        let got = tree.search_range(5.0, 15.0).unwrap();
        assert_eq!(got.len(), 11);
        assert_eq!(got.first().unwrap().0, 5.0);
        assert_eq!(got.last().unwrap().0, 15.0);

        assert!(tree.search_range(15.0, 5.0).is_err());
    }

    #[test]
    fn duplicate_key_rejected_in_reject_mode() {
        let dir = tempfile::tempdir().unwrap();
        let mut tree: BPlusTree<8> = open(&dir, "t.btree", DuplicatePolicy::Reject);

        tree.insert(1.0, 100).unwrap();
        let err = tree.insert(1.0, 200).unwrap_err();
        assert!(matches!(err, ReedError::DuplicateKey { key } if key == 1.0));
        assert_eq!(tree.search(1.0).unwrap(), Some(100));
    }

    #[test]
    fn duplicate_key_chains_in_bin_mode() {
        let dir = tempfile::tempdir().unwrap();
        let mut tree: BPlusTree<8> = open(&dir, "t.btree", DuplicatePolicy::Bin);

        for v in 0..10u32 {
            tree.insert(1.0, v).unwrap();
        }
        let mut got = tree.search_all(1.0).unwrap();
        got.sort_unstable();
        assert_eq!(got, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn lazy_delete_removes_item_without_rebalancing() {
        let dir = tempfile::tempdir().unwrap();
        let mut tree: BPlusTree<4> = open(&dir, "t.btree", DuplicatePolicy::Reject);

        for k in 1..=8u32 {
            tree.insert(k as f32, k).unwrap();
        }
        assert!(tree.remove(4.0).unwrap());
        assert_eq!(tree.search(4.0).unwrap(), None);
        assert_eq!(tree.len(), 7);
        assert!(!tree.remove(4.0).unwrap());
    }

    #[test]
    fn reopening_an_existing_file_preserves_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.btree");
        {
            let (mut tree, status) =
                BPlusTree::<8>::open(&path, BTreeConfig::default()).unwrap();
            assert_eq!(status, OpenStatus::New);
            tree.insert(42.0, 1).unwrap();
        }
        let (tree, status) = BPlusTree::<8>::open(&path, BTreeConfig::default()).unwrap();
        assert_eq!(status, OpenStatus::Existing);
        assert_eq!(tree.search(42.0).unwrap(), Some(1));
    }

    #[test]
    fn branching_factor_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.btree");
        let (_tree, _) = BPlusTree::<8>::open(&path, BTreeConfig::default()).unwrap();

        let err = BPlusTree::<4>::open(&path, BTreeConfig::default()).unwrap_err();
        assert!(matches!(err, ReedError::BranchingFactorMismatch { .. }));
    }
}
