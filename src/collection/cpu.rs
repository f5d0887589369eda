//! CPU tick counters and usage derived from them.

/// The number of tick categories reported through procfs: user, nice,
/// system, idle, iowait, irq, softirq and steal.
pub const PROCFS_CATEGORIES: usize = 8;

/// The number of tick categories reported through `kern.cp_time`: user, nice,
/// system, interrupt and idle.
pub const CP_TIME_CATEGORIES: usize = 5;

/// Accumulated ticks per category since boot, as reported by one of the
/// backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CpuTicks {
    /// The `cpu` line of `/proc/stat`, zero padded to eight categories.
    Procfs([u64; PROCFS_CATEGORIES]),

    /// The `kern.cp_time` array.
    CpTime([u64; CP_TIME_CATEGORIES]),
}

impl CpuTicks {
    /// Builds procfs ticks from however many categories the kernel reported.
    /// Older kernels report fewer than eight; the missing ones count as zero.
    /// Anything past the eighth (guest time, already part of user time) is
    /// dropped.
    pub fn from_procfs_fields(fields: impl IntoIterator<Item = u64>) -> Self {
        let mut ticks = [0; PROCFS_CATEGORIES];
        for (slot, value) in ticks.iter_mut().zip(fields) {
            *slot = value;
        }

        CpuTicks::Procfs(ticks)
    }

    /// Returns the ticks of every category.
    pub fn categories(&self) -> &[u64] {
        match self {
            CpuTicks::Procfs(ticks) => ticks,
            CpuTicks::CpTime(ticks) => ticks,
        }
    }

    /// Returns the sum of every category.
    pub fn total(&self) -> u64 {
        self.categories().iter().fold(0, |acc, v| acc.saturating_add(*v))
    }

    /// Returns the ticks spent idle. On procfs this is idle plus iowait.
    pub fn idle(&self) -> u64 {
        match self {
            CpuTicks::Procfs(ticks) => ticks[3].saturating_add(ticks[4]),
            CpuTicks::CpTime(ticks) => ticks[4],
        }
    }

    /// Returns the ticks spent doing anything but idling.
    pub fn used(&self) -> u64 {
        self.total().saturating_sub(self.idle())
    }

    /// Collapses the categories into the `(used, total)` pair.
    pub fn load(&self) -> CpuLoad {
        CpuLoad {
            used: self.used(),
            total: self.total(),
        }
    }
}

/// Cumulative busy and total ticks since boot.
///
/// A single sample is *not* a percentage; take two and use
/// [`CpuLoad::usage_since`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuLoad {
    pub used: u64,
    pub total: u64,
}

impl CpuLoad {
    /// Returns the fraction (between 0 and 1) of ticks spent busy between
    /// `earlier` and `self`. Returns [`None`] if no ticks elapsed, or if the
    /// counters went backwards.
    pub fn usage_since(&self, earlier: &CpuLoad) -> Option<f64> {
        let total = self.total.checked_sub(earlier.total)?;
        let used = self.used.checked_sub(earlier.used)?;

        if total == 0 {
            None
        } else {
            Some(used as f64 / total as f64)
        }
    }
}
