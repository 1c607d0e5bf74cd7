// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Directory collaborator (§6-FULL): listing, renaming, and mtimes, built
//! directly on `std::fs` — there is no ecosystem crate the rest of this
//! repository or the pack reaches for here, so plain `std` is the idiomatic
//! choice rather than an exception to it.

use crate::error::ReedResult;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// One directory entry: its name, whether it's a directory, and its last
/// modification time.
#[derive(Debug, Clone)]
pub struct Entry {
    pub path: PathBuf,
    pub is_dir: bool,
    pub mtime: SystemTime,
}

/// Lists `path`, optionally recursing into subdirectories.
pub fn list(path: &Path, recursive: bool) -> ReedResult<Vec<Entry>> {
    let mut out = Vec::new();
    list_into(path, recursive, &mut out)?;
    Ok(out)
}

fn list_into(path: &Path, recursive: bool, out: &mut Vec<Entry>) -> ReedResult<()> {
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let meta = entry.metadata()?;
        let is_dir = meta.is_dir();
        out.push(Entry {
            path: entry.path(),
            is_dir,
            mtime: meta.modified()?,
        });
        if is_dir && recursive {
            list_into(&entry.path(), recursive, out)?;
        }
    }
    Ok(())
}

/// Creates `path` and any missing parent directories.
pub fn ensure_dir(path: &Path) -> ReedResult<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// Renames `src` to `dst`. If `dst`'s parent directory doesn't exist yet,
/// creates it and retries once, mirroring `DedupHandleDuplicate`'s
/// `ENOENT`-then-`BuildPath`-then-retry fallback.
pub fn rename(src: &Path, dst: &Path) -> ReedResult<()> {
    match std::fs::rename(src, dst) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if let Some(parent) = dst.parent() {
                ensure_dir(parent)?;
            }
            std::fs::rename(src, dst)?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Last modification time of `path`.
pub fn mtime(path: &Path) -> ReedResult<SystemTime> {
    Ok(std::fs::metadata(path)?.modified()?)
}
