//! These tests are mostly here just to ensure that invalid results will be
//! caught when passing arguments.

use assert_cmd::prelude::*;
use predicates::prelude::*;

use crate::util::sysload_command;

#[test]
fn test_small_rate() {
    sysload_command(&["-r", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'--rate' must be at least"));
}

#[test]
fn test_invalid_rate() {
    sysload_command(&["--rate", "whenever"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_invalid_backend() {
    sysload_command(&["--backend", "wmi"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'wmi'"));
}

#[test]
fn test_once_conflicts_with_count() {
    sysload_command(&["--once", "-n", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_zero_count() {
    sysload_command(&["-n", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value '0'"));
}

#[test]
fn test_help() {
    sysload_command(&["--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Source Options"))
        .stdout(predicate::str::contains("--proc-root"));
}

#[test]
fn test_version() {
    sysload_command(&["-V"])
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
