// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! `-m` direct two-file compare (`ImageComparisonPerform` in the source).
//! Only `CompareMethod::Range` is implemented by the core; every other
//! method named on the CLI surface is accepted but rejected here with a
//! clear error, matching `EngineConfig::compare_method`'s documented stance.

use anyhow::{bail, Context, Result};
use imgcmp::codec;
use imgcmp::config::{CompareMethod, EngineConfig};
use std::path::Path;

pub fn run(config: &EngineConfig, img1: &Path, img2: &Path) -> Result<()> {
    if config.compare_method != CompareMethod::Range {
        bail!(
            "compare method '{}' is not implemented",
            config.compare_method.name()
        );
    }

    let (thumb1, _) = codec::thumb_create(img1)
        .with_context(|| format!("failed to thumbnail {}", img1.display()))?;
    let (thumb2, _) = codec::thumb_create(img2)
        .with_context(|| format!("failed to thumbnail {}", img2.display()))?;
    let (thumb1, thumb2) = match (thumb1, thumb2) {
        (Some(a), Some(b)) => (a, b),
        _ => bail!("failed to create thumbnail of image"),
    };

    let is_match = codec::pixel_compare_fuzzy(&thumb1, &thumb2, config.pixel_tolerance)?;
    println!(
        "{} and {}: {}",
        img1.display(),
        img2.display(),
        if is_match { "match" } else { "no match" }
    );
    Ok(())
}
