// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Smoke tests for the `imgcmp` binary.

use assert_cmd::Command;
use image::{Rgba, RgbaImage};
use predicates::prelude::*;
use std::path::Path;

fn write_solid_png(path: &Path, rgba: [u8; 4]) {
    let img = RgbaImage::from_pixel(16, 16, Rgba(rgba));
    img.save(path).unwrap();
}

#[test]
fn dash_m_reports_a_match_between_identical_images() {
    let dir = tempfile::tempdir().unwrap();
    let img1 = dir.path().join("one.png");
    let img2 = dir.path().join("two.png");
    write_solid_png(&img1, [10, 20, 30, 255]);
    write_solid_png(&img2, [10, 20, 30, 255]);

    Command::cargo_bin("imgcmp")
        .unwrap()
        .args(["-m", "range", "--img1"])
        .arg(&img1)
        .arg("--img2")
        .arg(&img2)
        .assert()
        .success()
        .stdout(predicate::str::contains("match"));
}

#[test]
fn dash_m_reports_no_match_between_distinct_images() {
    let dir = tempfile::tempdir().unwrap();
    let img1 = dir.path().join("one.png");
    let img2 = dir.path().join("two.png");
    write_solid_png(&img1, [0, 0, 0, 255]);
    write_solid_png(&img2, [255, 255, 255, 255]);

    Command::cargo_bin("imgcmp")
        .unwrap()
        .args(["-m", "range", "--img1"])
        .arg(&img1)
        .arg("--img2")
        .arg(&img2)
        .assert()
        .success()
        .stdout(predicate::str::contains("no match"));
}

#[test]
fn unimplemented_compare_method_fails_clearly() {
    let dir = tempfile::tempdir().unwrap();
    let img1 = dir.path().join("one.png");
    let img2 = dir.path().join("two.png");
    write_solid_png(&img1, [0, 0, 0, 255]);
    write_solid_png(&img2, [0, 0, 0, 255]);

    Command::cargo_bin("imgcmp")
        .unwrap()
        .args(["-m", "hr", "--img1"])
        .arg(&img1)
        .arg("--img2")
        .arg(&img2)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not implemented"));
}

#[test]
fn scanning_a_workdir_without_dedup_reports_sync_progress() {
    let dir = tempfile::tempdir().unwrap();
    let workdir = dir.path().join("photos");
    std::fs::create_dir_all(&workdir).unwrap();
    write_solid_png(&workdir.join("a.png"), [1, 2, 3, 255]);

    Command::cargo_bin("imgcmp")
        .unwrap()
        .arg(&workdir)
        .arg("-v")
        .assert()
        .success()
        .stdout(predicate::str::contains("sync:"));
}
