// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end exercise of `Engine::open` / `synchronize` / `find_matches` /
//! `dedup` / `flush` against a real (tiny, synthetic) image directory.

use image::{Rgba, RgbaImage};
use imgcmp::config::EngineConfig;
use imgcmp::Engine;
use std::path::Path;

fn write_solid_png(path: &Path, width: u32, height: u32, rgba: [u8; 4]) {
    let img = RgbaImage::from_pixel(width, height, Rgba(rgba));
    img.save(path).unwrap();
}

#[test]
fn synchronize_indexes_new_files_and_skips_on_second_pass() {
    let dir = tempfile::tempdir().unwrap();
    let workdir = dir.path().join("photos");
    std::fs::create_dir_all(&workdir).unwrap();
    write_solid_png(&workdir.join("red.png"), 32, 32, [200, 10, 10, 255]);
    write_solid_png(&workdir.join("blue.png"), 32, 32, [10, 10, 200, 255]);

    let config = EngineConfig::new(&workdir);
    let mut engine = Engine::open(config).unwrap();

    let report = engine.synchronize().unwrap();
    assert_eq!(report.added, 2);
    assert_eq!(report.replaced, 0);

    // A second synchronize against an unchanged directory mtime is a no-op.
    let report = engine.synchronize().unwrap();
    assert_eq!(report.added, 0);
    assert_eq!(report.skipped, 0); // directory mtime unchanged -> short-circuits entirely

    engine.flush().unwrap();
}

#[test]
fn find_matches_locates_a_near_duplicate_and_ignores_distinct_images() {
    let dir = tempfile::tempdir().unwrap();
    let workdir = dir.path().join("photos");
    std::fs::create_dir_all(&workdir).unwrap();
    write_solid_png(&workdir.join("original.png"), 32, 32, [120, 130, 140, 255]);
    // Off by one per channel: within DIFF_TOLERANCE, should match.
    write_solid_png(&workdir.join("near_duplicate.png"), 32, 32, [121, 131, 141, 255]);
    write_solid_png(&workdir.join("unrelated.png"), 32, 32, [5, 200, 60, 255]);

    let config = EngineConfig::new(&workdir);
    let mut engine = Engine::open(config).unwrap();
    engine.synchronize().unwrap();

    let matches = engine
        .find_matches(&workdir.join("original.png"), 32)
        .unwrap();
    let names: Vec<&str> = matches.iter().map(|m| m.filename.as_str()).collect();
    assert!(names.contains(&"near_duplicate.png"));
    assert!(!names.contains(&"unrelated.png"));
    assert!(!names.contains(&"original.png"));

    engine.flush().unwrap();
}

#[test]
fn dedup_moves_duplicates_into_a_folder_named_for_the_query() {
    let dir = tempfile::tempdir().unwrap();
    let workdir = dir.path().join("photos");
    std::fs::create_dir_all(&workdir).unwrap();
    write_solid_png(&workdir.join("a.png"), 32, 32, [50, 60, 70, 255]);
    write_solid_png(&workdir.join("a_copy.png"), 32, 32, [50, 60, 70, 255]);

    let mut config = EngineConfig::new(&workdir);
    config.outpath = dir.path().join("dups");
    let mut engine = Engine::open(config).unwrap();
    engine.synchronize().unwrap();

    let report = engine.dedup().unwrap();
    assert_eq!(report.moved, 1);

    // Exactly one of the two files should have been moved out of workdir.
    let remaining = std::fs::read_dir(&workdir).unwrap().count();
    assert_eq!(remaining, 1);

    engine.flush().unwrap();
}
