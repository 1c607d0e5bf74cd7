// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! A perceptual image-deduplication engine: thumbnails images on disk,
//! indexes them by an average-color signature in a memory-mapped B+-tree,
//! and reports near-duplicates via a range scan plus a pixel-level compare.
//!
//! ## Architecture
//!
//! - [`arena`] — the memory-mapped, self-growing byte region both on-disk
//!   structures are built over.
//! - [`btree`] — a persistent B+-tree mapping a `f32` signature to a `u32`
//!   cache offset, with point lookup, range scan, min/max, and lazy delete.
//! - [`cache`] — the append-structured thumbnail store: variable-length
//!   records of metadata, filename, and PNG bytes.
//! - [`codec`] — decode/encode/resample/compare/signature, the codec
//!   collaborator the core spec treats as external, implemented here on
//!   the `image` crate.
//! - [`sync`] — the directory synchronizer (`update_cache`) that keeps the
//!   cache and index in step with a live directory tree.
//! - [`matcher`] — the range-based fuzzy match engine (`find_matches`).
//! - [`dedup`] — the dedup consumer that moves duplicates into an output
//!   folder and removes their cache entries.
//! - [`engine`] — the `Engine` handle that ties all of the above together
//!   behind one open/close lifetime, replacing the source's process-wide
//!   globals with an explicit, threaded context.
//!
//! ## Quick start
//!
//! ```no_run
//! use imgcmp::config::EngineConfig;
//! use imgcmp::engine::Engine;
//!
//! let config = EngineConfig::new("./photos");
//! let mut engine = Engine::open(config)?;
//! engine.synchronize()?;
//! let matches = engine.find_matches(std::path::Path::new("./photos/a.jpg"), 32)?;
//! # Ok::<(), imgcmp::error::ReedError>(())
//! ```

pub mod arena;
pub mod btree;
pub mod cache;
pub mod codec;
pub mod config;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod log;
pub mod matcher;
pub mod sync;
pub mod walk;

pub use btree::{BPlusTree, Key, Value};
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{ReedError, ReedResult};
pub use matcher::Match;
