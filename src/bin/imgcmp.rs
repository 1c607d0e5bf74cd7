// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! CLI front-end over [`imgcmp::engine::Engine`] (not core; summarized in
//! `SPEC_FULL.md` §6). Mirrors the source's flag vocabulary — `-c` cache
//! control, `-d` dedup, `-m` pixel compare, `-o`/`-r`/`-p`/`-t`/`-v`/`-V` —
//! as `clap` derive flags rather than a hand-rolled getopt loop.

mod commands;

use clap::{Parser, ValueEnum};
use imgcmp::config::{CompareMethod, EngineConfig};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CacheCmd {
    /// Dump every live cache entry.
    Dumpall,
    /// Dump just the cache header (last-scan timestamp, entry count).
    Dumpinfo,
    /// Skip the cache entirely (always re-thumbnail).
    Disable,
    /// Skip the directory synchronize step.
    Noupdate,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CompareArg {
    Abs,
    Range,
    Hr,
    Hh,
    P,
}

impl From<CompareArg> for CompareMethod {
    fn from(value: CompareArg) -> Self {
        match value {
            CompareArg::Abs => CompareMethod::Abs,
            CompareArg::Range => CompareMethod::Range,
            CompareArg::Hr => CompareMethod::HistRgb,
            CompareArg::Hh => CompareMethod::HistHsv,
            CompareArg::P => CompareMethod::PHash,
        }
    }
}

/// Perceptual image deduplication: thumbnail, signature, index, match.
#[derive(Debug, Parser)]
#[command(name = "imgcmp", version, about)]
struct Cli {
    /// Working directory to scan. Defaults to the current directory.
    workdir: Option<PathBuf>,

    /// Cache control command.
    #[arg(short = 'c', long = "cache", value_enum)]
    cache_cmd: Option<CacheCmd>,

    /// Path to the B+-tree index file (overrides the default under workdir).
    #[arg(long = "setindex")]
    set_index: Option<PathBuf>,

    /// Path to the thumbnail cache data file (overrides the default).
    #[arg(long = "setdata")]
    set_data: Option<PathBuf>,

    /// Deduplicate the working directory: move found duplicates to --outpath.
    #[arg(short = 'd')]
    dedup: bool,

    /// Compare two images directly instead of scanning a directory.
    #[arg(short = 'm', value_enum)]
    compare: Option<CompareArg>,

    /// First image for `-m`.
    #[arg(long = "img1")]
    img1: Option<PathBuf>,

    /// Second image for `-m`.
    #[arg(long = "img2")]
    img2: Option<PathBuf>,

    /// Output directory for deduplicated files.
    #[arg(short = 'o', long = "outpath")]
    outpath: Option<PathBuf>,

    /// Recurse into subdirectories.
    #[arg(short = 'r')]
    recursive: bool,

    /// Maximum number of duplicates to report per query image.
    #[arg(short = 'p', long = "maxdups", default_value_t = 32)]
    pixels_diff: usize,

    /// Per-channel pixel tolerance.
    #[arg(short = 't', long = "tolerance", default_value_t = imgcmp::codec::DIFF_TOLERANCE)]
    tolerance: f32,

    /// Print progress as it happens.
    #[arg(short = 'v')]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            log::LevelFilter::Info
        } else {
            log::LevelFilter::Warn
        })
        .parse_default_env()
        .init();

    let workdir = cli.workdir.clone().unwrap_or_else(|| PathBuf::from("."));

    let mut config = EngineConfig::new(&workdir);
    config.verbose = cli.verbose;
    config.recursive = cli.recursive;
    config.pixels_diff = cli.pixels_diff;
    config.pixel_tolerance = cli.tolerance;
    if let Some(outpath) = &cli.outpath {
        config.outpath = outpath.clone();
    }
    if let Some(path) = &cli.set_index {
        config.cache_index_path = path.clone();
    }
    if let Some(path) = &cli.set_data {
        config.cache_data_path = path.clone();
    }
    if let Some(method) = cli.compare {
        config.compare_method = method.into();
    }
    match cli.cache_cmd {
        Some(CacheCmd::Disable) => config.cache_dont_use = true,
        Some(CacheCmd::Noupdate) => config.cache_no_update = true,
        Some(CacheCmd::Dumpall) | Some(CacheCmd::Dumpinfo) => config.cache_dump = true,
        None => {}
    }

    if let (Some(img1), Some(img2)) = (&cli.img1, &cli.img2) {
        return commands::compare::run(&config, img1, img2);
    }

    if matches!(cli.cache_cmd, Some(CacheCmd::Dumpall)) {
        return commands::cache::dump_all(&config);
    }
    if matches!(cli.cache_cmd, Some(CacheCmd::Dumpinfo)) {
        return commands::cache::dump_info(&config);
    }

    let mut engine = imgcmp::Engine::open(config)?;
    let report = engine.synchronize()?;
    if engine.config().verbose {
        println!(
            "sync: {} added, {} replaced, {} skipped",
            report.added, report.replaced, report.skipped
        );
    }

    if cli.dedup {
        let report = engine.dedup()?;
        println!("{} scanned, {} duplicates moved", report.scanned, report.moved);
    }

    Ok(())
}
