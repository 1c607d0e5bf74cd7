// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Diagnostic output.
//!
//! `reedbase`'s own `log` module is an encoded version-history log (integer
//! op codes, CRC32 validation) — a durability concern unrelated to run-time
//! diagnostics, and not a fit to imitate here. For the latter this crate
//! follows `fjall-rs`'s `lsm-tree`, the pack's closest storage-engine
//! analog, which logs through the `log` facade (`log::trace!`/`log::warn!`)
//! rather than a bespoke stderr writer, leaving the subscriber
//! (`env_logger`, wired up in `src/bin/imgcmp.rs`) to decide where lines
//! go. Thin wrappers are kept here only so call sites can name a component
//! without repeating a `target:` clause at every site.

/// Emit a warning. Used for the soft-failure paths the engine must surface
/// but not abort on: dirty bit at open, oversized cache records,
/// match-engine overcount, per-file scan errors.
pub fn warn(component: &str, message: impl std::fmt::Display) {
    ::log::warn!(target: "imgcmp", "[{}] {}", component, message);
}

/// Emit a progress line at `info` level, only when `verbose` is enabled.
/// `verbose` is a per-run config flag (`EngineConfig::verbose`), not the
/// process-wide log level `env_logger` reads from `RUST_LOG`, so the check
/// happens here rather than being left to level filtering.
pub fn progress(verbose: bool, component: &str, message: impl std::fmt::Display) {
    if verbose {
        ::log::info!(target: "imgcmp", "[{}] {}", component, message);
    }
}
