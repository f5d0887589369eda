use std::{collections::HashMap, env, fs, path::Path, process::Command};

/// Returns a QEMU runner target given an architecture.
fn get_qemu_target(arch: &str) -> &str {
    match arch {
        "armv7" => "arm",
        "i686" => "i386",
        "powerpc" => "ppc",
        "powerpc64le" => "ppc64le",
        _ => arch,
    }
}

/// Running binary tests via cross needs the right runner, which we find by
/// inspecting env variables that only show up while using cross.
///
/// Originally inspired by [ripgrep's test files](https://cs.github.com/BurntSushi/ripgrep/blob/9f0e88bcb14e02da1b88872435b17d74786640b5/tests/util.rs#L470),
/// but adapted to work more generally with the architectures supported after looking through cross'
/// [linux-runner](https://github.com/cross-rs/cross/blob/main/docker/linux-runner) file.
fn cross_runner() -> Option<String> {
    const TARGET_RUNNER: &str = "CARGO_TARGET_RUNNER";
    const CROSS_RUNNER: &str = "CROSS_RUNNER";

    let env_mapping = env::vars_os()
        .filter_map(|(k, v)| {
            let (k, v) = (k.to_string_lossy(), v.to_string_lossy());

            if k.starts_with("CARGO_TARGET_") && k.ends_with("_RUNNER") && !v.is_empty() {
                Some((TARGET_RUNNER.to_string(), v.to_string()))
            } else if k == CROSS_RUNNER && !v.is_empty() {
                Some((k.to_string(), v.to_string()))
            } else {
                None
            }
        })
        .collect::<HashMap<_, _>>();

    if let Some(cross_runner) = env_mapping.get(CROSS_RUNNER) {
        if cross_runner == "qemu-user" {
            env_mapping.get(TARGET_RUNNER).and_then(|target_runner| {
                target_runner
                    .split_ascii_whitespace()
                    .last()
                    .map(|arch| format!("qemu-{}", get_qemu_target(arch)))
            })
        } else {
            None
        }
    } else {
        env_mapping.get(TARGET_RUNNER).cloned()
    }
}

const SYSLOAD_EXE_PATH: &str = env!("CARGO_BIN_EXE_sysload");

/// Returns the [`Command`] of a binary invocation of sysload.
pub fn sysload_command(args: &[&str]) -> Command {
    let mut cmd = match cross_runner() {
        None => Command::new(SYSLOAD_EXE_PATH),
        Some(runner) => {
            let mut cmd = Command::new(runner);
            cmd.arg(SYSLOAD_EXE_PATH);
            cmd
        }
    };

    cmd.args(args);
    cmd
}

/// Writes a frozen procfs snapshot into `root`, including a mount table that
/// lists `root` as a procfs mount.
pub fn write_procfs_snapshot(root: &Path) {
    fs::write(root.join("uptime"), "12345.67 8901.23\n").unwrap();
    fs::write(
        root.join("stat"),
        "cpu  4705 356 584 3699176 23060 0 277 0 0 0\ncpu0 1393 280 234 925470 6320 0 146 0 0 0\n",
    )
    .unwrap();
    fs::write(
        root.join("meminfo"),
        "MemTotal:        1000 kB\nMemFree:          200 kB\nMemAvailable:     600 kB\nBuffers:           50 kB\nCached:           100 kB\nSwapCached:         0 kB\nSwapTotal:        500 kB\nSwapFree:         500 kB\n",
    )
    .unwrap();
    fs::write(
        root.join("mounts"),
        format!(
            "sysfs /sys sysfs rw 0 0\nproc {} proc rw,relatime 0 0\n",
            root.canonicalize().unwrap().display()
        ),
    )
    .unwrap();
}
