//! Runs sysload against frozen procfs snapshots.

use assert_cmd::prelude::*;
use predicates::prelude::*;

use crate::util::{sysload_command, write_procfs_snapshot};

#[test]
fn test_once_reads_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    write_procfs_snapshot(dir.path());
    let root = dir.path().to_str().unwrap();

    let used = 4705 + 356 + 584 + 277;
    let total = used + 3699176 + 23060;

    sysload_command(&["--once", "-b", "procfs", "-p", root])
        .assert()
        .success()
        .stdout(predicate::str::contains("backend: Procfs"))
        .stdout(predicate::str::contains("uptime: 12345\n"))
        .stdout(predicate::str::contains(format!("cpu: {used} {total}\n")))
        .stdout(predicate::str::contains("memswap: 650 1000 0 500\n"));
}

#[test]
fn test_auto_detects_snapshot_mount() {
    let dir = tempfile::tempdir().unwrap();
    write_procfs_snapshot(dir.path());
    let root = dir.path().to_str().unwrap();

    sysload_command(&["--once", "-p", root])
        .assert()
        .success()
        .stdout(predicate::str::contains("backend: Procfs"));
}

#[test]
fn test_auto_detects_relative_root() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("proc");
    std::fs::create_dir(&root).unwrap();
    write_procfs_snapshot(&root);

    sysload_command(&["--once", "-p", "proc"])
        .current_dir(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("backend: Procfs"))
        .stdout(predicate::str::contains("uptime: 12345\n"));
}

#[test]
fn test_sampling_stops_after_count() {
    let dir = tempfile::tempdir().unwrap();
    write_procfs_snapshot(dir.path());
    let root = dir.path().to_str().unwrap();

    // A frozen snapshot never advances, so there is never a CPU usage to show.
    sysload_command(&["-b", "procfs", "-p", root, "-n", "2", "-r", "100ms"])
        .assert()
        .success()
        .stdout(predicate::str::contains("up 3h 25m 45s").count(2))
        .stdout(predicate::str::contains("cpu     --").count(2))
        .stdout(predicate::str::contains("mem 650 KiB / 1000 KiB  swap 0 KiB / 500 KiB"));
}

#[test]
fn test_missing_snapshot_fails() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("nope");

    sysload_command(&["--once", "-b", "procfs", "-p", root.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unable to read uptime."));
}

#[cfg(target_os = "linux")]
#[test]
fn test_live_system() {
    sysload_command(&["-n", "2", "-r", "100ms"])
        .assert()
        .success()
        .stdout(predicate::str::contains("up ").count(2));
}
