//! Detects whether procfs is available by reading the mount table.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    str::FromStr,
    sync::OnceLock,
};

use anyhow::bail;

use crate::constants::DEFAULT_PROC_ROOT;

static HAS_PROCFS: OnceLock<bool> = OnceLock::new();

/// One line of the mount table. Only the fields needed to spot procfs are
/// kept.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct MountEntry {
    mount_point: PathBuf,
    fs_type: String,
}

fn fix_mount_point(s: &str) -> String {
    const ESCAPED_BACKSLASH: &str = "\\134";
    const ESCAPED_SPACE: &str = "\\040";
    const ESCAPED_TAB: &str = "\\011";
    const ESCAPED_NEWLINE: &str = "\\012";

    s.replace(ESCAPED_BACKSLASH, "\\")
        .replace(ESCAPED_SPACE, " ")
        .replace(ESCAPED_TAB, "\t")
        .replace(ESCAPED_NEWLINE, "\n")
}

impl FromStr for MountEntry {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> anyhow::Result<MountEntry> {
        // Example: `proc /proc proc rw,nosuid,nodev,noexec,relatime 0 0`
        let mut parts = line.split_whitespace();

        if parts.next().is_none() {
            bail!("missing device");
        }

        let mount_point = match parts.next() {
            Some(mount_point) => PathBuf::from(fix_mount_point(mount_point)),
            None => {
                bail!("missing mount point");
            }
        };

        let fs_type = match parts.next() {
            Some(fs) => fs.to_string(),
            None => {
                bail!("missing filesystem type");
            }
        };

        Ok(MountEntry {
            mount_point,
            fs_type,
        })
    }
}

impl MountEntry {
    fn is_procfs_at(&self, proc_root: &Path) -> bool {
        self.fs_type == "proc" && self.mount_point == proc_root
    }
}

/// Returns whether procfs is mounted at its usual location. The answer is
/// computed on first use and cached for the rest of the process.
pub fn has_procfs() -> bool {
    *HAS_PROCFS.get_or_init(|| {
        let available = probe_procfs(Path::new(DEFAULT_PROC_ROOT));
        log::debug!("procfs available: {available}");
        available
    })
}

/// Checks the mount table found under `proc_root` for a procfs mount at
/// `proc_root`. Relative roots are resolved first, since the mount table only
/// lists absolute paths. Any failure to read the table counts as "not mounted".
pub fn probe_procfs(proc_root: &Path) -> bool {
    let proc_root = match proc_root.canonicalize() {
        Ok(proc_root) => proc_root,
        Err(err) => {
            log::debug!("unable to resolve {}: {err}", proc_root.display());
            return false;
        }
    };

    let file = match File::open(proc_root.join("mounts")) {
        Ok(file) => file,
        Err(err) => {
            log::debug!("unable to read mount table under {}: {err}", proc_root.display());
            return false;
        }
    };

    let mut reader = BufReader::new(file);
    let mut line = Vec::new();

    // Read as bytes, so a mount point that isn't UTF-8 doesn't end the scan early.
    while let Ok(bytes) = reader.read_until(b'\n', &mut line) {
        if bytes == 0 {
            break;
        }

        if let Ok(entry) = MountEntry::from_str(&String::from_utf8_lossy(&line)) {
            if entry.is_procfs_at(&proc_root) {
                return true;
            }
        }

        line.clear();
    }

    false
}
