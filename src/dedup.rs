// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Dedup consumer (component 4.D, the source's `dedup.c`): walks the
//! working directory, runs [`crate::matcher::find_matches`] against each
//! image, and moves every duplicate it finds into a folder named from a
//! stable hash of the *querying* filename.

use crate::btree::BPlusTree;
use crate::cache::Cache;
use crate::codec;
use crate::config::EngineConfig;
use crate::error::ReedResult;
use crate::log;
use crate::matcher::{self, Match};
use crate::walk;
use std::collections::HashSet;
use std::path::Path;

/// Outcome of a dedup pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct DedupReport {
    pub scanned: usize,
    pub moved: usize,
}

/// Jenkins' one-at-a-time hash, transcribed from `hashtable.c`'s
/// `HtDefaultHash`. Used to name the per-query output folder a duplicate is
/// moved into, so repeated runs against the same query file land its
/// duplicates in the same place.
pub fn stable_hash(bytes: &[u8]) -> u32 {
    let mut hash: u32 = 0;
    for &b in bytes {
        hash = hash.wrapping_add(b as u32);
        hash = hash.wrapping_add(hash << 10);
        hash ^= hash >> 6;
    }
    hash = hash.wrapping_add(hash << 3);
    hash ^= hash >> 11;
    hash = hash.wrapping_add(hash << 15);
    hash
}

/// Moves `dupfn` (a duplicate of `query_filename`, found at `dup_offset` in
/// the cache) under `config.outpath`, in a subfolder named from a hash of
/// `query_filename` — not the duplicate's own name, per `DedupHandleDuplicate`.
/// Path separators in `dupfn`'s relative name are replaced with underscores
/// so the flattened name can't collide with the folder structure.
///
/// Removing a duplicate means removing it from *both* stores: the cache
/// entry is tombstoned, and its signature is unregistered from the
/// B+-tree, mirroring `sync::replace_entry`'s `index.remove(old_sig)` —
/// otherwise a later `find_matches` range scan still turns up the
/// tombstoned offset, since `cache.lookup` never checks `mtime`.
fn handle_duplicate<const B: usize>(
    config: &EngineConfig,
    cache: &mut Cache,
    index: &mut BPlusTree<B>,
    query_filename: &str,
    dup: &Match,
) -> ReedResult<()> {
    let folder = format!("dup-{:08x}", stable_hash(query_filename.as_bytes()));
    let flattened = dup.filename.replace(['/', '\\'], "_");
    let dest = config.outpath.join(&folder).join(&flattened);
    let src = config.workdir.join(&dup.filename);

    walk::rename(&src, &dest)?;
    cache.remove_at_offset(dup.offset)?;
    let _ = index.remove(dup.signature);

    log::progress(
        config.verbose,
        "dedup",
        format!("duplicate of '{}' found, '{}' moved to {}", query_filename, dup.filename, dest.display()),
    );
    Ok(())
}

/// Walks `config.workdir`, and for every recognized image not already
/// claimed as someone else's duplicate, runs the match engine and moves any
/// duplicates found into `config.outpath`.
///
/// Mirrors `DedupPerform`/`DedupDirScan`: a file already moved as a
/// duplicate of an earlier query is skipped (`ht_files_processed` in the
/// source) rather than being checked again itself.
pub fn perform<const B: usize>(
    config: &EngineConfig,
    cache: &mut Cache,
    index: &mut BPlusTree<B>,
) -> ReedResult<DedupReport> {
    let mut report = DedupReport::default();
    let mut already_moved: HashSet<String> = HashSet::new();

    let entries = walk::list(&config.workdir, config.recursive)?;
    for entry in entries {
        if entry.is_dir || !codec::is_image_file(&entry.path) {
            continue;
        }
        let relative = entry
            .path
            .strip_prefix(&config.workdir)
            .unwrap_or(&entry.path)
            .to_string_lossy()
            .into_owned();

        if already_moved.contains(&relative) {
            continue;
        }

        report.scanned += 1;
        log::progress(config.verbose, "dedup", format!("checking {}...", relative));

        let full_path = Path::new(&entry.path);
        let dups = matcher::find_matches(config, index, cache, full_path, 32)?;

        for dup in &dups {
            handle_duplicate(config, cache, index, &relative, dup)?;
            already_moved.insert(dup.filename.clone());
            report.moved += 1;
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::btree::{BTreeConfig, DuplicatePolicy};

    #[test]
    fn stable_hash_is_deterministic() {
        assert_eq!(stable_hash(b"holiday.jpg"), stable_hash(b"holiday.jpg"));
    }

    #[test]
    fn stable_hash_differs_for_different_inputs() {
        assert_ne!(stable_hash(b"holiday.jpg"), stable_hash(b"vacation.jpg"));
    }

    #[test]
    fn stable_hash_of_empty_input_is_zero() {
        assert_eq!(stable_hash(b""), 0);
    }

    #[test]
    fn handle_duplicate_flattens_separators_and_moves_by_query_hash() {
        let dir = tempfile::tempdir().unwrap();
        let workdir = dir.path().join("work");
        std::fs::create_dir_all(workdir.join("albums/summer")).unwrap();
        std::fs::write(workdir.join("albums/summer/beach.jpg"), b"fake-image-bytes").unwrap();

        let mut config = EngineConfig::new(&workdir);
        config.outpath = dir.path().join("dups");
        let (mut cache, _) = Cache::open(dir.path().join("c.cache")).unwrap();
        let (mut index, _) = BPlusTree::<8>::open(
            dir.path().join("i.btree"),
            BTreeConfig { duplicate_policy: DuplicatePolicy::Bin },
        )
        .unwrap();
        let offset = cache.add("albums/summer/beach.jpg", 1, 7.5, vec![]).unwrap();
        index.insert(7.5, offset).unwrap();

        let dup = Match {
            offset,
            filename: "albums/summer/beach.jpg".to_string(),
            signature: 7.5,
        };
        handle_duplicate(&config, &mut cache, &mut index, "query.jpg", &dup).unwrap();

        let expected_folder = format!("dup-{:08x}", stable_hash(b"query.jpg"));
        let expected_path = config
            .outpath
            .join(&expected_folder)
            .join("albums_summer_beach.jpg");
        assert!(expected_path.exists());
        assert!(!workdir.join("albums/summer/beach.jpg").exists());
        assert_eq!(cache.recorded_offset("albums/summer/beach.jpg"), None);
        assert_eq!(index.search(7.5).unwrap(), None);
    }
}
