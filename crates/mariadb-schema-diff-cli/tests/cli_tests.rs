//! CLI integration tests for mariadb-schema-diff.
//!
//! These tests verify command-line argument parsing, help output,
//! and exit codes for various error conditions. None of them require a
//! database.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

/// Get a command for the mariadb-schema-diff binary.
fn cmd() -> Command {
    Command::cargo_bin("mariadb-schema-diff").unwrap()
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("compare"))
        .stdout(predicate::str::contains("health-check"));
}

#[test]
fn test_compare_subcommand_help() {
    cmd()
        .args(["compare", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--source-schema"))
        .stdout(predicate::str::contains("--dest-schema"))
        .stdout(predicate::str::contains("--output-dir"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mariadb-schema-diff"));
}

// =============================================================================
// Configuration Error Tests
// =============================================================================

#[test]
fn test_missing_config_file_fails() {
    cmd()
        .args(["--config", "/nonexistent/config.yaml", "compare"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_invalid_config_rejected_with_exit_code_2() {
    let mut file = tempfile::NamedTempFile::with_suffix(".yaml").unwrap();
    file.write_all(b"source: {host: '', user: u, schema: s}\ndest: {host: h, user: u, schema: d}\n")
        .unwrap();
    file.flush().unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "compare"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("source.host"));
}

#[test]
fn test_missing_subcommand_fails() {
    cmd().assert().failure();
}
