// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Memory-mapped file arena.
//!
//! A contiguous byte region backed by a file, mapped read-write, that a
//! caller bump-allocates into. The mapping's base address can move whenever
//! the file is resized, so every reference into an arena must be an
//! **offset from the base** rather than a raw pointer; `Arena` never hands
//! out anything it can't safely revalidate after a remap.
//!
//! Grounded in `mmfile.c`'s `MMFileOpen` / `MMFileResize` / `MMFileClose`,
//! translated onto `memmap2::MmapMut` the way `btree/tree.rs` maps its own
//! backing file.

use crate::error::{ReedError, ReedResult};
use memmap2::MmapMut;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Outcome of [`Arena::open`]: did the file already exist with enough room,
/// or was it freshly created / grown to meet `initial_size`?
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenStatus {
    /// The file existed and was already at least `initial_size` bytes.
    Existing,
    /// The file was created, or existed but was smaller than `initial_size`.
    New,
}

/// A memory-mapped, file-backed byte region.
pub struct Arena {
    path: PathBuf,
    file: File,
    mmap: MmapMut,
}

impl Arena {
    /// Opens or creates `path`, ensuring it is at least `initial_size` bytes,
    /// and maps it read-write.
    pub fn open<P: AsRef<Path>>(path: P, initial_size: usize) -> ReedResult<(Self, OpenStatus)> {
        let path = path.as_ref().to_path_buf();
        let existed = path.exists();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)
            .map_err(|e| ReedError::ArenaError {
                operation: "open".to_string(),
                reason: e.to_string(),
            })?;

        let current_len = file
            .metadata()
            .map_err(|e| ReedError::ArenaError {
                operation: "stat".to_string(),
                reason: e.to_string(),
            })?
            .len() as usize;

        let status = if existed && current_len >= initial_size {
            OpenStatus::Existing
        } else {
            OpenStatus::New
        };

        if current_len < initial_size {
            file.set_len(initial_size as u64)
                .map_err(|e| ReedError::ArenaError {
                    operation: "grow".to_string(),
                    reason: e.to_string(),
                })?;
        }

        let mmap = unsafe {
            MmapMut::map_mut(&file).map_err(|e| ReedError::ArenaError {
                operation: "mmap".to_string(),
                reason: e.to_string(),
            })?
        };

        Ok((Self { path, file, mmap }, status))
    }

    /// Unmaps, truncates (or extends) to `new_size`, then remaps. The base
    /// address may change; any offset derived before this call remains
    /// valid, but any raw pointer or slice does not.
    pub fn resize(&mut self, new_size: usize) -> ReedResult<()> {
        // Drop the existing mapping before resizing the underlying file.
        self.mmap = MmapMut::map_anon(0).map_err(|e| ReedError::ArenaError {
            operation: "unmap".to_string(),
            reason: e.to_string(),
        })?;

        self.file
            .set_len(new_size as u64)
            .map_err(|e| ReedError::ArenaError {
                operation: "resize".to_string(),
                reason: e.to_string(),
            })?;

        self.mmap = unsafe {
            MmapMut::map_mut(&self.file).map_err(|e| ReedError::ArenaError {
                operation: "remap".to_string(),
                reason: e.to_string(),
            })?
        };

        Ok(())
    }

    /// Requests the OS persist the first `len` bytes of the mapping.
    pub fn flush(&self, len: usize) -> ReedResult<()> {
        let len = len.min(self.mmap.len());
        self.mmap
            .flush_range(0, len)
            .map_err(|e| ReedError::ArenaError {
                operation: "flush".to_string(),
                reason: e.to_string(),
            })
    }

    /// Current mapped length in bytes.
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.mmap
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.mmap
    }
}

// `close()` in the source is simply drop-on-scope-exit in Rust: unmapping
// and closing the file handle happen automatically when `Arena` is dropped.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_file_of_requested_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arena.bin");
        let (arena, status) = Arena::open(&path, 64).unwrap();
        assert_eq!(status, OpenStatus::New);
        assert_eq!(arena.len(), 64);
        assert!(path.exists());
    }

    #[test]
    fn reopen_of_large_enough_file_is_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arena.bin");
        let (arena, _) = Arena::open(&path, 64).unwrap();
        drop(arena);

        let (_, status) = Arena::open(&path, 64).unwrap();
        assert_eq!(status, OpenStatus::Existing);
    }

    #[test]
    fn writes_survive_a_resize() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arena.bin");
        let (mut arena, _) = Arena::open(&path, 16).unwrap();
        arena.as_mut_slice()[0..4].copy_from_slice(&[1, 2, 3, 4]);

        arena.resize(128).unwrap();
        assert_eq!(arena.len(), 128);
        assert_eq!(&arena.as_slice()[0..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn flush_does_not_panic_on_partial_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arena.bin");
        let (arena, _) = Arena::open(&path, 32).unwrap();
        arena.flush(16).unwrap();
        arena.flush(1024).unwrap();
    }
}
