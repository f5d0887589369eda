//! A small library to read uptime, CPU, memory and swap usage on Unix-like
//! systems.
//!
//! Readings come from procfs when it is mounted, and from sysctl otherwise.
//! Either way they come back in the same shape:
//!
//! ```no_run
//! let before = sysload::cpu_load()?;
//! std::thread::sleep(std::time::Duration::from_secs(1));
//! let after = sysload::cpu_load()?;
//!
//! if let Some(usage) = after.usage_since(&before) {
//!     println!("CPU: {:.1}%", usage * 100.0);
//! }
//! # Ok::<(), sysload::SysloadError>(())
//! ```

#![warn(rust_2018_idioms)]

#[cfg(not(unix))]
compile_error!("sysload only supports Unix-like systems");

pub mod collection;
pub mod constants;
pub mod options;

pub mod utils {
    pub mod error;
    pub mod logging;
}

pub use collection::{
    cpu::{CpuLoad, CpuTicks},
    memory::MemSwap,
    probe::has_procfs,
    procfs::ProcfsSource,
    sysctl::{
        query_as, sysctl, sysctl_as, sysctl_by_name, sysctl_by_name_as, BootTime, FromKernelBytes,
        KernelKey, KernelQuery, SwapRecord, Sysctl, SysctlSource,
    },
    Backend, MetricSource, SourceOptions, SystemSource,
};
pub use utils::error::{Result, SysloadError};

/// Returns the seconds elapsed since boot.
pub fn uptime() -> Result<u64> {
    SystemSource::detect().uptime()
}

/// Returns the cumulative busy and total CPU ticks since boot. Sample twice
/// and use [`CpuLoad::usage_since`] to get a usage ratio.
pub fn cpu_load() -> Result<CpuLoad> {
    SystemSource::detect().cpu_load()
}

/// Returns memory and swap usage, in kibibytes.
pub fn mem_swap() -> Result<MemSwap> {
    SystemSource::detect().mem_swap()
}
