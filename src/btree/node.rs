// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Owned, in-memory views of B+-tree nodes, leaves, and bins, with explicit
//! read-from-arena / write-to-arena conversions.
//!
//! Mirrors the shape of `current/src/store/btree/page.rs`'s
//! `read_from`/`write_to` pair, but against the spec's packed layout instead
//! of a 4KB bincode page.

use super::format::*;

/// An internal (routing) node: `n` keys partition `n+1` children.
#[derive(Debug, Clone)]
pub struct InternalNode {
    pub keys: Vec<Key>,
    pub children: Vec<u32>,
}

impl InternalNode {
    pub fn n(&self) -> usize {
        self.keys.len()
    }

    /// Reads an internal node of branching factor `b` at `offset`.
    pub fn read(bytes: &[u8], offset: usize, b: usize) -> Self {
        let base = offset;
        let nitems = u32::from_le_bytes(bytes[base..base + 4].try_into().unwrap()) as usize;

        let mut keys = Vec::with_capacity(nitems);
        let keys_base = base + 4;
        for i in 0..nitems {
            let off = keys_base + i * 4;
            keys.push(f32::from_le_bytes(bytes[off..off + 4].try_into().unwrap()));
        }

        let mut children = Vec::with_capacity(nitems + 1);
        let children_base = base + 4 + 4 * b;
        for i in 0..=nitems {
            let off = children_base + i * 4;
            children.push(u32::from_le_bytes(bytes[off..off + 4].try_into().unwrap()));
        }

        Self { keys, children }
    }

    /// Writes this node into `bytes` at `offset`, sized for branching
    /// factor `b`. Any slots beyond `n`/`n+1` are left as zero.
    pub fn write(&self, bytes: &mut [u8], offset: usize, b: usize) {
        let base = offset;
        let n = self.keys.len() as u32;
        debug_assert!(n as usize & !(COUNT_MASK as usize) == 0, "internal node overflowed count field");
        bytes[base..base + 4].copy_from_slice(&n.to_le_bytes());

        let keys_base = base + 4;
        for (i, k) in self.keys.iter().enumerate() {
            let off = keys_base + i * 4;
            bytes[off..off + 4].copy_from_slice(&k.to_le_bytes());
        }

        let children_base = base + 4 + 4 * b;
        for (i, c) in self.children.iter().enumerate() {
            let off = children_base + i * 4;
            bytes[off..off + 4].copy_from_slice(&c.to_le_bytes());
        }
    }
}

/// One key/value slot in a leaf. `indirect` marks that `value` is an offset
/// to a [`BinBlock`] rather than a literal payload (duplicate-key bin mode).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KvPair {
    pub key: Key,
    pub value: Value,
    pub indirect: bool,
}

/// A leaf: a sorted run of key/value pairs plus links to its neighbours in
/// key order.
#[derive(Debug, Clone)]
pub struct Leaf {
    pub items: Vec<KvPair>,
    pub prev: u32,
    pub next: u32,
}

impl Leaf {
    pub fn new_empty() -> Self {
        Self {
            items: Vec::new(),
            prev: NULL_OFFSET,
            next: NULL_OFFSET,
        }
    }

    pub fn read(bytes: &[u8], offset: usize, b: usize) -> Self {
        let base = offset;
        let attribs = u32::from_le_bytes(bytes[base..base + 4].try_into().unwrap());
        debug_assert!(attribs & LEAF_FLAG != 0, "attempted to read a non-leaf as a leaf");
        let count = (attribs & COUNT_MASK) as usize;

        let mut items = Vec::with_capacity(count);
        let items_base = base + 4;
        for i in 0..count {
            let off = items_base + i * 8;
            let key = f32::from_le_bytes(bytes[off..off + 4].try_into().unwrap());
            let value = u32::from_le_bytes(bytes[off + 4..off + 8].try_into().unwrap());
            let indirect = attribs & (1 << (BIN_BIT_SHIFT + i as u32)) != 0;
            items.push(KvPair { key, value, indirect });
        }

        let links_base = items_base + 8 * (b + 1);
        let prev = u32::from_le_bytes(bytes[links_base..links_base + 4].try_into().unwrap());
        let next =
            u32::from_le_bytes(bytes[links_base + 4..links_base + 8].try_into().unwrap());

        Self { items, prev, next }
    }

    pub fn write(&self, bytes: &mut [u8], offset: usize, b: usize) {
        let base = offset;
        let count = self.items.len() as u32;
        debug_assert!(count <= COUNT_MASK, "leaf overflowed count field");

        let mut attribs = LEAF_FLAG | count;
        for (i, item) in self.items.iter().enumerate() {
            if item.indirect {
                attribs |= 1 << (BIN_BIT_SHIFT + i as u32);
            }
        }
        bytes[base..base + 4].copy_from_slice(&attribs.to_le_bytes());

        let items_base = base + 4;
        for (i, item) in self.items.iter().enumerate() {
            let off = items_base + i * 8;
            bytes[off..off + 4].copy_from_slice(&item.key.to_le_bytes());
            bytes[off + 4..off + 8].copy_from_slice(&item.value.to_le_bytes());
        }
        // Zero any trailing slots so a stale bin-indirection bit can never
        // survive a shrink (e.g. after a redistribute/remove).
        for i in self.items.len()..=b {
            let off = items_base + i * 8;
            bytes[off..off + 8].fill(0);
        }

        let links_base = items_base + 8 * (b + 1);
        bytes[links_base..links_base + 4].copy_from_slice(&self.prev.to_le_bytes());
        bytes[links_base + 4..links_base + 8].copy_from_slice(&self.next.to_le_bytes());
    }
}

/// Returns `true` if the u32 at `offset` has the leaf tag bit set. Used
/// while descending, per invariant 2 ("a node's LEAF bit distinguishes
/// variants; callers inspect that bit before interpreting the memory").
pub fn is_leaf(bytes: &[u8], offset: usize) -> bool {
    let word = u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap());
    word & LEAF_FLAG != 0
}

/// A duplicate-value overflow chain ("bin"). Each block's capacity doubles
/// on overflow; old blocks are kept and linked via `next` rather than
/// resized in place.
#[derive(Debug, Clone)]
pub struct BinBlock {
    pub capacity: u32,
    pub values: Vec<Value>,
    pub next: u32,
    pub tombstoned: bool,
}

impl BinBlock {
    pub fn read(bytes: &[u8], offset: usize) -> Self {
        let base = offset;
        let capacity = u32::from_le_bytes(bytes[base..base + 4].try_into().unwrap());
        let count = u32::from_le_bytes(bytes[base + 4..base + 8].try_into().unwrap());
        let next = u32::from_le_bytes(bytes[base + 8..base + 12].try_into().unwrap());
        let tombstoned = bytes[base + 12] != 0;

        let values_base = base + BIN_HEADER_SIZE;
        let mut values = Vec::with_capacity(count as usize);
        for i in 0..count as usize {
            let off = values_base + i * 4;
            values.push(u32::from_le_bytes(bytes[off..off + 4].try_into().unwrap()));
        }

        Self {
            capacity,
            values,
            next,
            tombstoned,
        }
    }

    pub fn write(&self, bytes: &mut [u8], offset: usize) {
        let base = offset;
        bytes[base..base + 4].copy_from_slice(&self.capacity.to_le_bytes());
        bytes[base + 4..base + 8].copy_from_slice(&(self.values.len() as u32).to_le_bytes());
        bytes[base + 8..base + 12].copy_from_slice(&self.next.to_le_bytes());
        bytes[base + 12] = self.tombstoned as u8;

        let values_base = base + BIN_HEADER_SIZE;
        for (i, v) in self.values.iter().enumerate() {
            let off = values_base + i * 4;
            bytes[off..off + 4].copy_from_slice(&v.to_le_bytes());
        }
    }
}
