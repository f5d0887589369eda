//! This is the main file to house data collection functions.

pub mod cpu;
pub mod memory;
pub mod probe;
pub mod procfs;
pub mod sysctl;

use std::path::PathBuf;

use self::{
    cpu::{CpuLoad, CpuTicks},
    memory::MemSwap,
    procfs::ProcfsSource,
    sysctl::SysctlSource,
};
use crate::utils::error::Result;

/// The trait representing what a source of system load data should implement.
pub trait MetricSource {
    /// Return the seconds elapsed since boot.
    fn uptime(&self) -> Result<u64>;

    /// Return the raw per-category tick counters.
    fn cpu_ticks(&self) -> Result<CpuTicks>;

    /// Return the cumulative busy and total ticks.
    fn cpu_load(&self) -> Result<CpuLoad> {
        self.cpu_ticks().map(|ticks| ticks.load())
    }

    /// Return memory and swap usage in kibibytes.
    fn mem_swap(&self) -> Result<MemSwap>;
}

/// Which mechanism to read system load through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backend {
    /// procfs if it is mounted, sysctl otherwise.
    #[default]
    Auto,
    Procfs,
    Sysctl,
}

/// How to build a [`SystemSource`].
#[derive(Debug, Clone, Default)]
pub struct SourceOptions {
    pub backend: Backend,

    /// Where procfs lives. Defaults to `/proc`.
    pub proc_root: Option<PathBuf>,
}

/// A [`MetricSource`] whose backend was picked once, up front.
#[derive(Debug, Clone)]
pub enum SystemSource {
    Procfs(ProcfsSource),
    Sysctl(SysctlSource),
}

impl Default for SystemSource {
    fn default() -> Self {
        Self::detect()
    }
}

impl SystemSource {
    /// Picks procfs if it is mounted at `/proc`, and sysctl otherwise. The
    /// check itself only runs once per process.
    pub fn detect() -> Self {
        if probe::has_procfs() {
            SystemSource::Procfs(ProcfsSource::default())
        } else {
            SystemSource::Sysctl(SysctlSource::default())
        }
    }

    /// Builds a source from [`SourceOptions`].
    pub fn from_options(options: &SourceOptions) -> Self {
        let procfs = || match &options.proc_root {
            Some(root) => ProcfsSource::new(root),
            None => ProcfsSource::default(),
        };

        let source = match options.backend {
            Backend::Procfs => SystemSource::Procfs(procfs()),
            Backend::Sysctl => SystemSource::Sysctl(SysctlSource::default()),
            Backend::Auto => match &options.proc_root {
                Some(root) if probe::probe_procfs(root) => SystemSource::Procfs(procfs()),
                Some(_) => SystemSource::Sysctl(SysctlSource::default()),
                None => Self::detect(),
            },
        };

        log::debug!("using the {:?} backend", source.backend());
        source
    }

    /// Returns which backend this source reads through.
    pub fn backend(&self) -> Backend {
        match self {
            SystemSource::Procfs(_) => Backend::Procfs,
            SystemSource::Sysctl(_) => Backend::Sysctl,
        }
    }
}

impl MetricSource for SystemSource {
    fn uptime(&self) -> Result<u64> {
        match self {
            SystemSource::Procfs(source) => source.uptime(),
            SystemSource::Sysctl(source) => source.uptime(),
        }
    }

    fn cpu_ticks(&self) -> Result<CpuTicks> {
        match self {
            SystemSource::Procfs(source) => source.cpu_ticks(),
            SystemSource::Sysctl(source) => source.cpu_ticks(),
        }
    }

    fn mem_swap(&self) -> Result<MemSwap> {
        match self {
            SystemSource::Procfs(source) => source.mem_swap(),
            SystemSource::Sysctl(source) => source.mem_swap(),
        }
    }
}

#[cfg(test)]
mod test {
    use std::{fs, path::Path};

    use super::*;

    fn write_fixture(root: &Path) {
        fs::write(root.join("uptime"), "12345.67 8901.23\n").unwrap();
        fs::write(
            root.join("stat"),
            "cpu  10 20 30 40\ncpu0 10 20 30 40\nintr 0\n",
        )
        .unwrap();
        fs::write(
            root.join("meminfo"),
            "MemTotal: 1000 kB\nMemFree: 200 kB\nBuffers: 50 kB\nCached: 100 kB\nSwapTotal: 500 kB\nSwapFree: 500 kB\n",
        )
        .unwrap();
        fs::write(
            root.join("mounts"),
            format!("proc {} proc rw 0 0\n", root.canonicalize().unwrap().display()),
        )
        .unwrap();
    }

    #[test]
    fn reads_procfs_fixture() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());

        let source = SystemSource::from_options(&SourceOptions {
            backend: Backend::Procfs,
            proc_root: Some(dir.path().to_path_buf()),
        });

        assert_eq!(source.backend(), Backend::Procfs);
        assert_eq!(source.uptime().unwrap(), 12345);
        assert_eq!(source.cpu_load().unwrap(), CpuLoad { used: 60, total: 100 });
        assert_eq!(source.mem_swap().unwrap().as_tuple(), (650, 1000, 0, 500));
    }

    #[test]
    fn frozen_fixture_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());
        let source = ProcfsSource::new(dir.path());

        assert_eq!(source.uptime().unwrap(), source.uptime().unwrap());
        assert_eq!(source.cpu_ticks().unwrap(), source.cpu_ticks().unwrap());
        assert_eq!(source.mem_swap().unwrap(), source.mem_swap().unwrap());
    }

    #[test]
    fn auto_picks_procfs_when_mounted() {
        let dir = tempfile::tempdir().unwrap();
        write_fixture(dir.path());

        let source = SystemSource::from_options(&SourceOptions {
            backend: Backend::Auto,
            proc_root: Some(dir.path().to_path_buf()),
        });
        assert_eq!(source.backend(), Backend::Procfs);
    }

    #[test]
    fn auto_falls_back_to_sysctl() {
        let dir = tempfile::tempdir().unwrap();

        let source = SystemSource::from_options(&SourceOptions {
            backend: Backend::Auto,
            proc_root: Some(dir.path().to_path_buf()),
        });
        assert_eq!(source.backend(), Backend::Sysctl);
    }

    #[test]
    fn missing_procfs_files_are_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        let source = ProcfsSource::new(dir.path());

        assert!(matches!(
            source.uptime(),
            Err(crate::utils::error::SysloadError::Io(_))
        ));
    }

    #[test]
    fn detection_matches_probe() {
        let expected = if probe::has_procfs() {
            Backend::Procfs
        } else {
            Backend::Sysctl
        };
        assert_eq!(SystemSource::detect().backend(), expected);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn live_procfs_counters_only_grow() {
        let source = ProcfsSource::default();
        let first = source.cpu_load().unwrap();
        let second = source.cpu_load().unwrap();

        assert!(second.used >= first.used);
        assert!(second.total >= first.total);

        let usage = source.mem_swap().unwrap();
        assert!(usage.mem_used <= usage.mem_total);
    }
}
