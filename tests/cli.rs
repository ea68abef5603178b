// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate assert_cmd;
extern crate predicates;
extern crate tempfile;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn fractalmesh() -> Command {
    Command::cargo_bin("fractalmesh").unwrap()
}

fn count_prefixed(text: &str, prefix: &str) -> usize {
    text.lines().filter(|l| l.starts_with(prefix)).count()
}

#[test]
fn writes_a_small_mandelbrot_mesh() {
    let dir = tempdir().unwrap();
    let obj = dir.path().join("m.obj");
    fractalmesh()
        .args(&["--size", "4", "--output"])
        .arg(&obj)
        .assert()
        .success()
        .stdout(predicate::str::contains("64 vertices, 96 indices"));

    let text = fs::read_to_string(&obj).unwrap();
    assert_eq!(count_prefixed(&text, "v "), 64);
    assert_eq!(count_prefixed(&text, "f "), 32);
}

#[test]
fn writes_a_julia_wireframe_and_height_map() {
    let dir = tempdir().unwrap();
    let obj = dir.path().join("j.obj");
    let pgm = dir.path().join("j.pgm");
    fractalmesh()
        .args(&["--kind", "julia", "--size", "8", "--topology", "lines", "--threads", "1"])
        .args(&["--constant", "-0.8,0.156", "--output"])
        .arg(&obj)
        .arg("--heightmap")
        .arg(&pgm)
        .assert()
        .success()
        .stdout(predicate::str::contains("256 vertices, 640 indices (lines)"));

    let text = fs::read_to_string(&obj).unwrap();
    assert_eq!(count_prefixed(&text, "l "), 8 * 8 * 5);
    let bytes = fs::read(&pgm).unwrap();
    assert!(bytes.starts_with(b"P5"));
}

#[test]
fn draws_the_tree() {
    let dir = tempdir().unwrap();
    let obj = dir.path().join("t.obj");
    fractalmesh()
        .args(&["-k", "tree", "-s", "30", "-o"])
        .arg(&obj)
        .assert()
        .success()
        .stdout(predicate::str::contains("3600 vertices"));
}

#[test]
fn requires_an_output_file() {
    fractalmesh()
        .args(&["--size", "4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--output"));
}

#[test]
fn rejects_unknown_kinds() {
    fractalmesh()
        .args(&["--kind", "sierpinski", "--output", "never.obj"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown fractal kind"));
}

#[test]
fn rejects_bad_sizes_and_zooms() {
    fractalmesh()
        .args(&["--size", "0", "--output", "never.obj"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Grid size must be between"));
    fractalmesh()
        .args(&["--zoom", "-2", "--output", "never.obj"])
        .assert()
        .failure();
    fractalmesh()
        .args(&["--center", "1.0", "--output", "never.obj"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not parse center point"));
}
