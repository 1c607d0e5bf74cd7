// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Append-structured thumbnail cache store (component 4.C).
//!
//! Records are appended to a single arena; updates either overwrite in
//! place (new thumbnail no larger than the old one) or append and tombstone
//! the old record. An in-memory filename index is rebuilt by a single
//! forward scan, skipping tombstones and oversized records.

mod format;

pub use format::{CacheHeader, CacheRecord, CACHE_MAGIC, MAX_RECORD_SIZE};

use crate::arena::{Arena, OpenStatus};
use crate::codec::Thumbnail;
use crate::codec;
use crate::error::{ReedError, ReedResult};
use crate::log;
use std::collections::HashMap;
use std::path::Path;

/// What the filename index remembers about one live record, without
/// re-reading it from the arena on every lookup.
#[derive(Debug, Clone)]
struct IndexEntry {
    offset: u32,
    mtime: i64,
    signature: f32,
}

/// The thumbnail cache store.
pub struct Cache {
    arena: Arena,
    lastupdate: i64,
    usedsize: u32,
    index: HashMap<String, IndexEntry>,
    burst: bool,
}

impl Cache {
    /// Opens or creates the cache file at `path`. The filename index starts
    /// empty; call [`Self::rebuild_index`] before relying on lookups.
    pub fn open<P: AsRef<Path>>(path: P) -> ReedResult<(Self, OpenStatus)> {
        let (mut arena, status) = Arena::open(path, format::CACHE_HEADER_SIZE)?;

        let (lastupdate, usedsize) = match status {
            OpenStatus::New => {
                let header = CacheHeader {
                    magic: CACHE_MAGIC,
                    lastupdate: 0,
                };
                header.write(arena.as_mut_slice());
                (0, format::CACHE_HEADER_SIZE as u32)
            }
            OpenStatus::Existing => {
                let header = CacheHeader::read(arena.as_slice());
                if header.magic != CACHE_MAGIC {
                    return Err(ReedError::CacheSignatureMismatch {
                        expected: CACHE_MAGIC,
                        found: header.magic,
                    });
                }
                (header.lastupdate, arena.len() as u32)
            }
        };

        Ok((
            Self {
                arena,
                lastupdate,
                usedsize,
                index: HashMap::new(),
                burst: false,
            },
            status,
        ))
    }

    /// Timestamp of the last directory scan the synchronizer recorded.
    pub fn lastupdate(&self) -> i64 {
        self.lastupdate
    }

    pub fn set_lastupdate(&mut self, lastupdate: i64) {
        self.lastupdate = lastupdate;
        let mut header_bytes = [0u8; format::CACHE_HEADER_SIZE];
        CacheHeader {
            magic: CACHE_MAGIC,
            lastupdate,
        }
        .write(&mut header_bytes);
        self.arena.as_mut_slice()[0..format::CACHE_HEADER_SIZE].copy_from_slice(&header_bytes);
    }

    /// Maps the cache for the duration of a batch of reads. The store is
    /// mmap-backed regardless, so this only affects whether callers are
    /// expected to issue many lookups back to back; it does not change
    /// `lookup`'s return type the way a pointer-returning C API would.
    pub fn open_burst(&mut self) {
        self.burst = true;
    }

    pub fn close_burst(&mut self) {
        self.burst = false;
    }

    /// Rebuilds the filename index by a single forward scan, skipping
    /// tombstones and warning on (then skipping) oversized records.
    pub fn rebuild_index(&mut self) -> ReedResult<()> {
        self.index.clear();
        let mut offset = format::CACHE_HEADER_SIZE;
        let end = self.usedsize as usize;

        while offset < end {
            let (record, next) = CacheRecord::read(self.arena.as_slice(), offset)?;
            if record.mtime != format::TOMBSTONE_MTIME {
                if record.thumbnail.len() > MAX_RECORD_SIZE {
                    log::warn(
                        "cache",
                        format!(
                            "record for '{}' is {} bytes, exceeds 10 MiB ceiling, skipping",
                            record.filename,
                            record.thumbnail.len()
                        ),
                    );
                } else {
                    self.index.insert(
                        record.filename.clone(),
                        IndexEntry {
                            offset: offset as u32,
                            mtime: record.mtime,
                            signature: record.signature,
                        },
                    );
                }
            }
            offset = next;
        }
        Ok(())
    }

    /// Looks up a filename's recorded mtime, if it's in the index.
    pub fn recorded_mtime(&self, filename: &str) -> Option<i64> {
        self.index.get(filename).map(|e| e.mtime)
    }

    pub fn recorded_offset(&self, filename: &str) -> Option<u32> {
        self.index.get(filename).map(|e| e.offset)
    }

    /// Every filename currently live in the index, in arbitrary order.
    pub fn filenames(&self) -> Vec<String> {
        self.index.keys().cloned().collect()
    }

    fn alloc(&mut self, size: usize) -> ReedResult<u32> {
        let offset = self.usedsize as usize;
        let needed = offset + size;
        if needed > self.arena.len() {
            let mut new_len = self.arena.len().max(1);
            while new_len < needed {
                new_len *= 2;
            }
            self.arena.resize(new_len)?;
        }
        self.usedsize = needed as u32;
        Ok(offset as u32)
    }

    /// Appends a new record and indexes it. Returns its offset.
    pub fn add(&mut self, filename: &str, mtime: i64, signature: f32, thumbnail: Vec<u8>) -> ReedResult<u32> {
        if filename.len() > u8::MAX as usize {
            return Err(ReedError::FilenameTooLong {
                filename: filename.to_string(),
            });
        }
        let record = CacheRecord {
            mtime,
            signature,
            filename: filename.to_string(),
            thumbnail,
        };
        let offset = self.alloc(record.padded_size())?;
        record.write(self.arena.as_mut_slice(), offset as usize);
        self.index.insert(
            filename.to_string(),
            IndexEntry {
                offset,
                mtime,
                signature,
            },
        );
        Ok(offset)
    }

    /// Replaces the record for `filename`. If the new thumbnail is no
    /// larger than the old one, overwrites in place; otherwise appends and
    /// tombstones the old record.
    pub fn replace(
        &mut self,
        filename: &str,
        mtime: i64,
        signature: f32,
        thumbnail: Vec<u8>,
    ) -> ReedResult<u32> {
        let old_offset = match self.recorded_offset(filename) {
            Some(o) => o,
            None => return self.add(filename, mtime, signature, thumbnail),
        };
        let (old_record, _) = CacheRecord::read(self.arena.as_slice(), old_offset as usize)?;

        if thumbnail.len() <= old_record.thumbnail.len() {
            let record = CacheRecord {
                mtime,
                signature,
                filename: filename.to_string(),
                thumbnail,
            };
            record.write(self.arena.as_mut_slice(), old_offset as usize);
            self.index.insert(
                filename.to_string(),
                IndexEntry {
                    offset: old_offset,
                    mtime,
                    signature,
                },
            );
            Ok(old_offset)
        } else {
            CacheRecord::write_tombstone(self.arena.as_mut_slice(), old_offset as usize);
            self.add(filename, mtime, signature, thumbnail)
        }
    }

    /// Tombstones the record for `filename` and drops it from the index.
    pub fn remove(&mut self, filename: &str) -> ReedResult<bool> {
        let entry = match self.index.remove(filename) {
            Some(e) => e,
            None => return Ok(false),
        };
        CacheRecord::write_tombstone(self.arena.as_mut_slice(), entry.offset as usize);
        Ok(true)
    }

    /// Tombstones the record at a known offset (used by the match engine's
    /// dedup consumer, which already has the offset from a range scan).
    pub fn remove_at_offset(&mut self, offset: u32) -> ReedResult<()> {
        CacheRecord::write_tombstone(self.arena.as_mut_slice(), offset as usize);
        self.index.retain(|_, e| e.offset != offset);
        Ok(())
    }

    /// Reads a single record.
    pub fn lookup(&self, offset: u32) -> ReedResult<CacheRecord> {
        let (record, _) = CacheRecord::read(self.arena.as_slice(), offset as usize)?;
        Ok(record)
    }

    /// Batch fetch with PNG decode.
    pub fn get(&self, offsets: &[u32]) -> ReedResult<Vec<(CacheRecord, Thumbnail)>> {
        offsets
            .iter()
            .map(|&offset| {
                let record = self.lookup(offset)?;
                let thumb = codec::decode_png(&record.thumbnail)?;
                Ok((record, thumb))
            })
            .collect()
    }

    /// Deletes the cache file and resets in-memory state.
    pub fn flush(self) -> ReedResult<()> {
        let path = self.arena.path().to_path_buf();
        drop(self.arena);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(dir: &tempfile::TempDir, name: &str) -> Cache {
        let (cache, _) = Cache::open(dir.path().join(name)).unwrap();
        cache
    }

    #[test]
    fn add_lookup_replace_remove_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = open(&dir, "c.cache");

        let offset = cache.add("a.png", 100, 1.5, vec![1, 2, 3]).unwrap();
        assert_eq!(cache.recorded_mtime("a.png"), Some(100));
        assert_eq!(cache.lookup(offset).unwrap().thumbnail, vec![1, 2, 3]);

        // Shrinking update: overwrites in place, same offset.
        let replaced_offset = cache.replace("a.png", 200, 2.5, vec![9]).unwrap();
        assert_eq!(replaced_offset, offset);
        assert_eq!(cache.recorded_mtime("a.png"), Some(200));
        assert_eq!(cache.lookup(offset).unwrap().thumbnail, vec![9]);

        // Growing update: appends and tombstones the old record.
        let grown_offset = cache.replace("a.png", 300, 3.5, vec![1, 2, 3, 4, 5]).unwrap();
        assert_ne!(grown_offset, offset);
        assert_eq!(cache.recorded_offset("a.png"), Some(grown_offset));

        assert!(cache.remove("a.png").unwrap());
        assert_eq!(cache.recorded_mtime("a.png"), None);
        assert!(!cache.remove("a.png").unwrap());
    }

    #[test]
    fn rebuild_index_skips_tombstones() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.cache");
        {
            let mut cache = open(&dir, "c.cache");
            cache.add("a.png", 1, 1.0, vec![1]).unwrap();
            cache.add("b.png", 2, 2.0, vec![2]).unwrap();
            cache.remove("a.png").unwrap();
        }

        let (mut reopened, status) = Cache::open(&path).unwrap();
        assert_eq!(status, OpenStatus::Existing);
        reopened.rebuild_index().unwrap();
        assert_eq!(reopened.recorded_mtime("a.png"), None);
        assert_eq!(reopened.recorded_mtime("b.png"), Some(2));
        assert_eq!(reopened.filenames().len(), 1);
    }

    #[test]
    fn lastupdate_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.cache");
        {
            let mut cache = open(&dir, "c.cache");
            cache.set_lastupdate(12345);
        }
        let (reopened, _) = Cache::open(&path).unwrap();
        assert_eq!(reopened.lastupdate(), 12345);
    }
}
