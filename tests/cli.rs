use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;

#[test]
fn prints_version() {
    let exe = env!("CARGO_BIN_EXE_clonernews");
    let output = Command::new(exe)
        .arg("--version")
        .output()
        .expect("run clonernews --version");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout utf8");
    assert!(
        stdout.contains(env!("CARGO_PKG_VERSION")),
        "stdout was: {}",
        stdout.trim()
    );
}

#[test]
fn prints_help() {
    Command::cargo_bin("clonernews")
        .expect("binary built")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--demo"))
        .stdout(predicate::str::contains("--category"));
}

#[test]
fn rejects_unknown_category() {
    Command::cargo_bin("clonernews")
        .expect("binary built")
        .args(["--category", "frontpage"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown category"));
}
