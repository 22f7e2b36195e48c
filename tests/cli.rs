// SPDX-License-Identifier: MIT OR Apache-2.0

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Command rooted in `dir`, isolated from user config and pointed at a
/// port nothing listens on.
fn codeseek(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("codeseek"));
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("CODESEEK_HOST", "http://127.0.0.1:1")
        .env_remove("CODESEEK_INDEX")
        .env_remove("CODESEEK_OVERWRITE")
        .env_remove("CODESEEK_FORCE_MERGE")
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn blank_search_returns_empty_page_without_engine() {
    let dir = TempDir::new().expect("tempdir");
    codeseek(&dir)
        .args(["--format", "json", "search", "  "])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total\": 0"))
        .stdout(predicate::str::contains("\"took\": 0"));
}

#[test]
fn search_against_unreachable_engine_reports_error_page() {
    let dir = TempDir::new().expect("tempdir");
    codeseek(&dir)
        .args(["--format", "json", "--compact", "search", "struct", "rtl8169_private"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"total\":-1"))
        .stdout(predicate::str::contains("\"error\""));
}

#[test]
fn status_without_record_prints_placeholder() {
    let dir = TempDir::new().expect("tempdir");
    fs::write(
        dir.path().join(".codeseekrc.toml"),
        "source_root = \"sources\"\n",
    )
    .expect("write config");
    codeseek(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains(".. unable to open the status file .."));
}

#[test]
fn status_prints_existing_record() {
    let dir = TempDir::new().expect("tempdir");
    fs::create_dir_all(dir.path().join("sources")).expect("mkdir");
    fs::write(
        dir.path().join("sources/git.status"),
        "2024-05-01T12:00:00Z redis 0123abcd\n",
    )
    .expect("write status");
    fs::write(
        dir.path().join(".codeseekrc.toml"),
        "source_root = \"sources\"\n",
    )
    .expect("write config");
    codeseek(&dir)
        .args(["--format", "json", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"available\": true"))
        .stdout(predicate::str::contains("redis 0123abcd"));
}

#[test]
fn index_missing_root_suggests_fix() {
    let dir = TempDir::new().expect("tempdir");
    codeseek(&dir)
        .args(["index", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Source root not found"));
}

#[test]
fn index_against_unreachable_engine_fails() {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path().join("src-tree/proj");
    fs::create_dir_all(&root).expect("mkdir");
    fs::write(root.join("main.c"), "int main(void) { return 0; }\n").expect("write");
    codeseek(&dir)
        .args(["index", "src-tree"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not reachable"))
        .stderr(predicate::str::contains("batch 1"));
}

#[test]
fn search_requires_query_words() {
    let dir = TempDir::new().expect("tempdir");
    codeseek(&dir).arg("search").assert().failure();
}
