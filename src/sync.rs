// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Directory synchronizer (`update_cache`, component 4.D first half): keeps
//! the thumbnail cache and B+-tree index in step with a live directory by
//! comparing recorded modification times.

use crate::btree::BPlusTree;
use crate::cache::Cache;
use crate::codec;
use crate::config::EngineConfig;
use crate::error::ReedResult;
use crate::log;
use crate::walk;

/// Outcome of a synchronize pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncReport {
    pub added: usize,
    pub replaced: usize,
    pub skipped: usize,
}

/// Brings the cache and index up to date with `config.workdir`.
///
/// 1. Compare the recorded directory timestamp against the directory's own
///    mtime; if the recording is current, this is a no-op.
/// 2. Rebuild the filename index from the cache.
/// 3. Walk the directory (optionally recursively); for each recognized
///    image, ADD if unseen, REPLACE if its mtime changed, otherwise skip.
pub fn update_cache<const B: usize>(
    config: &EngineConfig,
    cache: &mut Cache,
    index: &mut BPlusTree<B>,
) -> ReedResult<SyncReport> {
    let dir_mtime = walk::mtime(&config.workdir)?;
    let dir_mtime_secs = dir_mtime
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);

    if cache.lastupdate() >= dir_mtime_secs {
        log::progress(config.verbose, "sync", "cache already up to date");
        return Ok(SyncReport::default());
    }

    cache.rebuild_index()?;
    cache.set_lastupdate(dir_mtime_secs);

    let mut report = SyncReport::default();
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
        let file_mtime = entry
            .mtime
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        match cache.recorded_mtime(&relative) {
            None => {
                if let Some(offset) = add_entry(config, cache, index, &relative, &entry.path, file_mtime)? {
                    let _ = offset;
                    report.added += 1;
                }
            }
            Some(recorded) if recorded != file_mtime => {
                if replace_entry(config, cache, index, &relative, &entry.path, file_mtime)? {
                    report.replaced += 1;
                }
            }
            Some(_) => report.skipped += 1,
        }
    }

    log::progress(
        config.verbose,
        "sync",
        format!(
            "added {}, replaced {}, skipped {}",
            report.added, report.replaced, report.skipped
        ),
    );

    Ok(report)
}

fn add_entry<const B: usize>(
    config: &EngineConfig,
    cache: &mut Cache,
    index: &mut BPlusTree<B>,
    relative: &str,
    path: &std::path::Path,
    mtime: i64,
) -> ReedResult<Option<u32>> {
    let (thumb, _source_bytes) = codec::thumb_create(path)?;
    let thumb = match thumb {
        Some(t) => t,
        None => {
            log::warn("sync", format!("'{}' could not be decoded, skipping", relative));
            return Ok(None);
        }
    };
    let signature = codec::signature(&thumb);
    let png = codec::encode_png(&thumb)?;
    let offset = cache.add(relative, mtime, signature, png)?;
    index.insert(signature, offset)?;
    Ok(Some(offset))
}

fn replace_entry<const B: usize>(
    config: &EngineConfig,
    cache: &mut Cache,
    index: &mut BPlusTree<B>,
    relative: &str,
    path: &std::path::Path,
    mtime: i64,
) -> ReedResult<bool> {
    let old_offset = cache.recorded_offset(relative);
    let old_signature = old_offset.map(|_| cache.lookup(old_offset.unwrap())).transpose()?.map(|r| r.signature);

    let (thumb, _source_bytes) = codec::thumb_create(path)?;
    let thumb = match thumb {
        Some(t) => t,
        None => {
            log::warn("sync", format!("'{}' could not be decoded, skipping", relative));
            return Ok(false);
        }
    };
    let signature = codec::signature(&thumb);
    let png = codec::encode_png(&thumb)?;

    if let (Some(old_sig), Some(old_off)) = (old_signature, old_offset) {
        // Best-effort: remove the stale signature registration. A
        // not-found here just means it was already gone.
        let _ = old_off;
        let _ = index.remove(old_sig);
    }

    cache.replace(relative, mtime, signature, png)?;
    index.insert(signature, cache.recorded_offset(relative).unwrap())?;
    Ok(true)
}
