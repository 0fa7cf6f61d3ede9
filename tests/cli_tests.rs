//! Integration tests for CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_cli_version() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("bm25-enrich"));
    cmd.arg("--version");
    cmd.assert().success().stdout(predicate::str::contains("bm25-enrich"));
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("bm25-enrich"));
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("BM25"))
        .stdout(predicate::str::contains("process"))
        .stdout(predicate::str::contains("averages"));
}

#[test]
fn test_process_requires_input() {
    let work = TempDir::new().expect("temp work dir");
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("bm25-enrich"));
    cmd.current_dir(work.path());
    cmd.args(["process", "--working-dir", "work"]);
    cmd.assert().failure().stderr(predicate::str::contains("--input must be specified"));
}

#[test]
fn test_process_rejects_unknown_language() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("bm25-enrich"));
    cmd.args(["process", "--input", ".", "--language", "klingon"]);
    cmd.assert().failure().stderr(predicate::str::contains("unsupported language"));
}

#[test]
fn test_process_rejects_zero_workers() {
    let input = TempDir::new().expect("temp input dir");
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("bm25-enrich"));
    cmd.args([
        "process",
        "--input",
        input.path().to_str().expect("utf8 path"),
        "--workers",
        "0",
    ]);
    cmd.assert().failure().stderr(predicate::str::contains("workers must be at least 1"));
}

#[test]
fn test_process_missing_input_dir() {
    let work = TempDir::new().expect("temp work dir");
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("bm25-enrich"));
    cmd.args([
        "process",
        "--input",
        work.path().join("absent").to_str().expect("utf8 path"),
        "--working-dir",
        work.path().join("work").to_str().expect("utf8 path"),
        "--quiet",
    ]);
    cmd.assert().failure().stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_terms_requires_previous_run() {
    let work = TempDir::new().expect("temp work dir");
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("bm25-enrich"));
    cmd.args(["terms", "--working-dir", work.path().to_str().expect("utf8 path")]);
    cmd.assert().failure().stderr(predicate::str::contains("No statistics store"));
}

#[test]
fn test_clean_removes_artifacts() {
    let work = TempDir::new().expect("temp work dir");
    fs::write(work.path().join("output.txt"), "0\tkiwi\t6\n").expect("write output");
    fs::write(work.path().join("features.jsonl"), "{}\n").expect("write features");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("bm25-enrich"));
    cmd.args(["clean", "--working-dir", work.path().to_str().expect("utf8 path")]);
    cmd.assert().success().stdout(predicate::str::contains("Removed 2 file(s)"));

    assert!(!work.path().join("output.txt").exists());
    assert!(!work.path().join("features.jsonl").exists());
}
