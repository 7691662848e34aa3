//! End-to-end driver tests

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_targets_lists_every_language() {
    let mut cmd = Command::cargo_bin("mgen").unwrap();
    cmd.arg("targets")
        .assert()
        .success()
        .stdout(predicate::str::contains("haskell"))
        .stdout(predicate::str::contains("llvm"))
        .stdout(predicate::str::contains("rust"));
}

#[test]
fn test_convert_writes_the_generated_files() {
    let temp_dir = tempdir().unwrap();
    let source_path = temp_dir.path().join("fib.py");
    fs::write(
        &source_path,
        "def fib(n: int) -> int:\n    if n <= 1: return n\n    return fib(n-1) + fib(n-2)\n",
    )
    .unwrap();

    let out_dir = temp_dir.path().join("out");
    let mut cmd = Command::cargo_bin("mgen").unwrap();
    cmd.arg("convert")
        .arg(&source_path)
        .arg("--target")
        .arg("c")
        .arg("--output-dir")
        .arg(&out_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));

    let generated = fs::read_to_string(out_dir.join("fib.c")).unwrap();
    assert!(generated.contains("long long fib(long long n)"));
    assert!(out_dir.join("mgen_runtime.h").exists());
    assert!(out_dir.join("Makefile").exists());
}

#[test]
fn test_missing_input_exits_with_noinput() {
    let mut cmd = Command::cargo_bin("mgen").unwrap();
    cmd.arg("convert")
        .arg("does_not_exist.py")
        .assert()
        .failure()
        .code(66);
}

#[test]
fn test_invalid_source_exits_with_dataerr() {
    let temp_dir = tempdir().unwrap();
    let source_path = temp_dir.path().join("bad.py");
    fs::write(
        &source_path,
        "async def fetch(n: int) -> int:\n    return n\n",
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("mgen").unwrap();
    cmd.arg("convert")
        .arg(&source_path)
        .assert()
        .failure()
        .code(65)
        .stderr(predicate::str::contains("asynchronous"));
}

#[test]
fn test_check_reports_without_writing() {
    let temp_dir = tempdir().unwrap();
    let source_path = temp_dir.path().join("ok.py");
    fs::write(&source_path, "def id(n: int) -> int:\n    return n\n").unwrap();

    let mut cmd = Command::cargo_bin("mgen").unwrap();
    cmd.arg("check")
        .arg(&source_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("passed validation and analysis"));
    assert!(!temp_dir.path().join("ok.c").exists());
}
