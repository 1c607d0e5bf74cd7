// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! The top-level engine context (DESIGN NOTES, "Global mutable state"):
//! owns both memory-mapped arenas (via the B+-tree and the cache), the
//! config the source kept as process-wide globals, and an advisory
//! single-writer lock standing in for the source's mentioned-but-unspecified
//! SysV-semaphore option.
//!
//! Everything the CLI does — synchronize, find matches, dedup, flush —
//! goes through one `Engine` handle opened for the lifetime of a run.

use crate::btree::{BPlusTree, BTreeConfig, DuplicatePolicy};
use crate::cache::Cache;
use crate::config::EngineConfig;
use crate::dedup::{self, DedupReport};
use crate::error::ReedResult;
use crate::matcher::{self, Match};
use crate::sync::{self, SyncReport};
use fs2::FileExt;
use std::fs::File;
use std::path::Path;

/// Branching factor the tree is compiled for. Chosen in the middle of the
/// spec's "typically 4-16" range, matching the source's own comment on
/// `BT_NBRANCHES` ("8 is good usually").
pub const BRANCHING_FACTOR: usize = 8;

/// Signatures are not unique (many images share the same average color),
/// so the index is built in `Bin` mode: every signature keeps all of its
/// cache offsets rather than rejecting or silently dropping later inserts.
const DUPLICATE_POLICY: DuplicatePolicy = DuplicatePolicy::Bin;

/// An open handle over the index and cache described by an [`EngineConfig`].
pub struct Engine {
    config: EngineConfig,
    index: BPlusTree<BRANCHING_FACTOR>,
    cache: Cache,
    /// Advisory exclusive lock on the index file, held for the lifetime of
    /// this handle. Not a crash-consistency mechanism — just the "caller
    /// must serialize writers" contract from the CONCURRENCY model, made
    /// concrete instead of left to convention.
    _lock: File,
}

impl Engine {
    /// Opens (creating if necessary) the index and cache named in `config`,
    /// taking an advisory exclusive lock on the index file.
    pub fn open(config: EngineConfig) -> ReedResult<Self> {
        let lock_file = File::open(&config.cache_index_path).or_else(|_| {
            std::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .open(&config.cache_index_path)
        })?;
        lock_file.try_lock_exclusive().map_err(|e| {
            crate::error::ReedError::ArenaError {
                operation: "lock".to_string(),
                reason: e.to_string(),
            }
        })?;

        let (index, _) = BPlusTree::open(
            &config.cache_index_path,
            BTreeConfig {
                duplicate_policy: DUPLICATE_POLICY,
            },
        )?;
        let (mut cache, status) = Cache::open(&config.cache_data_path)?;
        if matches!(status, crate::arena::OpenStatus::Existing) {
            cache.rebuild_index()?;
        }

        Ok(Self {
            config,
            index,
            cache,
            _lock: lock_file,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Brings the cache and index up to date with the working directory.
    /// A no-op if `config.cache_no_update` or `config.cache_dont_use` is set.
    pub fn synchronize(&mut self) -> ReedResult<SyncReport> {
        if self.config.cache_no_update || self.config.cache_dont_use {
            return Ok(SyncReport::default());
        }
        sync::update_cache(&self.config, &mut self.cache, &mut self.index)
    }

    /// Finds up to `max_matches` duplicates of `path` among indexed images.
    pub fn find_matches(&self, path: &Path, max_matches: usize) -> ReedResult<Vec<Match>> {
        matcher::find_matches(&self.config, &self.index, &self.cache, path, max_matches)
    }

    /// Runs the dedup consumer over the whole working directory.
    pub fn dedup(&mut self) -> ReedResult<DedupReport> {
        dedup::perform(&self.config, &mut self.cache, &mut self.index)
    }

    /// Deletes both backing files and drops the in-memory index/cache
    /// state. The engine must be reopened (or dropped) afterward.
    pub fn flush(self) -> ReedResult<()> {
        let index_path = self.config.cache_index_path.clone();
        drop(self.index);
        self.cache.flush()?;
        if index_path.exists() {
            std::fs::remove_file(&index_path)?;
        }
        Ok(())
    }

    pub fn index(&self) -> &BPlusTree<BRANCHING_FACTOR> {
        &self.index
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }
}
