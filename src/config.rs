// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Engine configuration.
//!
//! The original tool kept its working directory, output path, and comparison
//! knobs in process-wide globals (`verbose`, `workdir`, `outpath`, ...). Here
//! they are collected into one `EngineConfig` that every operation takes by
//! reference instead of reaching into statics.

use std::path::PathBuf;

/// Pixel-comparison strategy. Only `Range` (the signature/B+-tree path this
/// crate implements) runs; the others are accepted as configuration values
/// so a CLI built against this engine can name them, but selecting one
/// rejects with [`crate::error::ReedError::UnsupportedCompareMethod`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareMethod {
    None,
    Abs,
    Range,
    HistRgb,
    HistHsv,
    PHash,
}

impl CompareMethod {
    pub fn name(&self) -> &'static str {
        match self {
            CompareMethod::None => "none",
            CompareMethod::Abs => "abs",
            CompareMethod::Range => "range",
            CompareMethod::HistRgb => "histrgb",
            CompareMethod::HistHsv => "histhsv",
            CompareMethod::PHash => "phash",
        }
    }
}

/// Explicit engine context, threaded by reference through every operation
/// that the original implementation read from a global.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Print progress/diagnostic lines to stderr.
    pub verbose: bool,

    /// Directory the synchronizer walks.
    pub workdir: PathBuf,

    /// Directory duplicates are moved into.
    pub outpath: PathBuf,

    /// Recurse into subdirectories while scanning.
    pub recursive: bool,

    /// Path to the `.btree` index file.
    pub cache_index_path: PathBuf,

    /// Path to the `.cache` thumbnail data file.
    pub cache_data_path: PathBuf,

    /// Which comparison strategy `find_matches` should use.
    pub compare_method: CompareMethod,

    /// Maximum number of matches `find_matches` returns per query.
    pub pixels_diff: usize,

    /// Per-channel pixel tolerance fed to `pixel_compare_fuzzy` (DIFF_TOLERANCE in the source).
    pub pixel_tolerance: f32,

    /// Skip the cache entirely (always re-thumbnail).
    pub cache_dont_use: bool,

    /// Skip the directory synchronize step.
    pub cache_no_update: bool,

    /// Dump cache contents for debugging (not implemented; see §6 debug tree renderer).
    pub cache_dump: bool,
}

impl EngineConfig {
    /// A sensible default configuration rooted at `workdir`.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        let workdir = workdir.into();
        Self {
            verbose: false,
            cache_index_path: workdir.join(".imgcmp.btree"),
            cache_data_path: workdir.join(".imgcmp.cache"),
            outpath: workdir.join("duplicates"),
            workdir,
            recursive: false,
            compare_method: CompareMethod::Range,
            pixels_diff: 32,
            pixel_tolerance: crate::codec::DIFF_TOLERANCE,
            cache_dont_use: false,
            cache_no_update: false,
            cache_dump: false,
        }
    }
}
