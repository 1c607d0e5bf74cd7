// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! `-c dumpall` / `-c dumpinfo`: the debug tree renderer's thumbnail-cache
//! side (the B+-tree renderer itself is out of scope per spec.md §1).

use anyhow::Result;
use chrono::{Local, TimeZone};
use imgcmp::cache::Cache;
use imgcmp::config::EngineConfig;

pub fn dump_info(config: &EngineConfig) -> Result<()> {
    let (mut cache, _) = Cache::open(&config.cache_data_path)?;
    cache.rebuild_index()?;
    let lastupdate = cache.lastupdate();
    let when = Local
        .timestamp_opt(lastupdate, 0)
        .single()
        .map(|dt| dt.to_rfc2822())
        .unwrap_or_else(|| "never".to_string());
    println!("Last directory scan: {}", when);
    Ok(())
}

pub fn dump_all(config: &EngineConfig) -> Result<()> {
    let (mut cache, _) = Cache::open(&config.cache_data_path)?;
    cache.rebuild_index()?;

    for filename in cache.filenames() {
        if let Some(offset) = cache.recorded_offset(&filename) {
            let record = cache.lookup(offset)?;
            println!(
                "{:>10}  sig={:<12.3}  {}",
                record.mtime, record.signature, record.filename
            );
        }
    }
    Ok(())
}
