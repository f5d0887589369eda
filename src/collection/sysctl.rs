//! Reading system load through sysctl kernel queries, for systems without
//! procfs.

mod bindings;
#[cfg(target_os = "freebsd")]
mod kvm;

use std::{
    ffi::{c_int, c_long, c_void},
    fmt, mem, ptr,
    time::{SystemTime, UNIX_EPOCH},
};

pub use self::bindings::{sysctl, sysctl_as, sysctl_by_name, sysctl_by_name_as, Sysctl};
use crate::{
    collection::{
        cpu::{CpuTicks, CP_TIME_CATEGORIES},
        memory::{pages_to_kib, MemSwap},
        MetricSource,
    },
    utils::error::{Result, SysloadError},
};

const CTL_KERN: c_int = 1;
const KERN_BOOTTIME: c_int = 21;

const BOOT_TIME_KEY: KernelKey<'static> = KernelKey::Path(&[CTL_KERN, KERN_BOOTTIME]);

cfg_if::cfg_if! {
    if #[cfg(target_os = "netbsd")] {
        const KERN_CP_TIME: c_int = 51;
        const CP_TIME_KEY: KernelKey<'static> = KernelKey::Path(&[CTL_KERN, KERN_CP_TIME]);
    } else if #[cfg(target_os = "openbsd")] {
        const KERN_CPTIME: c_int = 40;
        const CP_TIME_KEY: KernelKey<'static> = KernelKey::Path(&[CTL_KERN, KERN_CPTIME]);
    } else {
        #[cfg_attr(any(target_os = "dragonfly", target_os = "macos"), allow(dead_code))]
        const CP_TIME_KEY: KernelKey<'static> = KernelKey::Name("kern.cp_time");
    }
}

/// The number of tick categories in OpenBSD's `kern.cp_time`: user, nice,
/// system, spin, interrupt and idle.
const OPENBSD_CP_TIME_CATEGORIES: usize = 6;

const PAGE_COUNT_KEY: KernelKey<'static> = KernelKey::Name("vm.stats.vm.v_page_count");
const FREE_COUNT_KEY: KernelKey<'static> = KernelKey::Name("vm.stats.vm.v_free_count");
const INACTIVE_COUNT_KEY: KernelKey<'static> = KernelKey::Name("vm.stats.vm.v_inactive_count");

/// Identifies a kernel value, either by its numeric path or by its dotted
/// name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelKey<'a> {
    Path(&'a [c_int]),
    Name(&'a str),
}

impl fmt::Display for KernelKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelKey::Path(path) => {
                let parts: Vec<String> = path.iter().map(c_int::to_string).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
            KernelKey::Name(name) => f.write_str(name),
        }
    }
}

/// The first swap device reported by the kernel. Sizes are in pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRecord {
    pub device_name: String,
    pub used: u64,
    pub total: u64,
    pub flags: i32,
}

/// Read-only access to kernel state.
pub trait KernelQuery {
    /// Reads the value behind `key`.
    ///
    /// With `len`, a buffer of that many bytes is handed to the kernel and
    /// trimmed to however much it filled in. Without, the kernel is first
    /// asked how large the value is, and the read must fill exactly that much.
    fn query(&self, key: KernelKey<'_>, len: Option<usize>) -> Result<Vec<u8>>;

    /// Returns the size of a memory page in bytes.
    fn page_size(&self) -> u64;

    /// Returns the first swap device, or [`None`] if there is none. Errors if
    /// the kernel memory interface itself is unavailable.
    fn swap_info(&self) -> Result<Option<SwapRecord>>;
}

impl<K: KernelQuery + ?Sized> KernelQuery for Box<K> {
    fn query(&self, key: KernelKey<'_>, len: Option<usize>) -> Result<Vec<u8>> {
        (**self).query(key, len)
    }

    fn page_size(&self) -> u64 {
        (**self).page_size()
    }

    fn swap_info(&self) -> Result<Option<SwapRecord>> {
        (**self).swap_info()
    }
}

/// A fixed-layout value that can be decoded from a kernel buffer in native
/// byte order.
pub trait FromKernelBytes: Sized {
    /// The buffer size to request from the kernel.
    const SIZE: usize;

    /// Decodes the value, or returns [`None`] if `bytes` has the wrong length.
    fn from_kernel_bytes(bytes: &[u8]) -> Option<Self>;
}

macro_rules! impl_from_kernel_bytes {
    ( $( $t:ty ),+ $(,)? ) => {
        $(
            impl FromKernelBytes for $t {
                const SIZE: usize = mem::size_of::<$t>();

                #[inline]
                fn from_kernel_bytes(bytes: &[u8]) -> Option<Self> {
                    <[u8; mem::size_of::<$t>()]>::try_from(bytes)
                        .ok()
                        .map(<$t>::from_ne_bytes)
                }
            }
        )+
    };
}

impl_from_kernel_bytes!(i32, u32, i64, u64);

impl<T: FromKernelBytes, const N: usize> FromKernelBytes for [T; N] {
    const SIZE: usize = T::SIZE * N;

    fn from_kernel_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::SIZE {
            return None;
        }

        let items = bytes
            .chunks_exact(T::SIZE)
            .map(T::from_kernel_bytes)
            .collect::<Option<Vec<T>>>()?;

        items.try_into().ok()
    }
}

/// The kernel's boot time, as a `timeval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootTime {
    pub sec: i64,
    pub usec: i64,
}

impl FromKernelBytes for BootTime {
    /// Large enough for the widest layout; the kernel reports how much of it
    /// was filled in.
    const SIZE: usize = 2 * mem::size_of::<i64>();

    fn from_kernel_bytes(bytes: &[u8]) -> Option<Self> {
        let (sec, usec) = match bytes.len() {
            16 => (
                i64::from_kernel_bytes(&bytes[..8])?,
                i64::from_kernel_bytes(&bytes[8..])?,
            ),
            12 => (
                i64::from_kernel_bytes(&bytes[..8])?,
                i64::from(i32::from_kernel_bytes(&bytes[8..])?),
            ),
            8 => (
                i64::from(i32::from_kernel_bytes(&bytes[..4])?),
                i64::from(i32::from_kernel_bytes(&bytes[4..])?),
            ),
            _ => return None,
        };

        Some(BootTime { sec, usec })
    }
}

/// Reads `key` and decodes it as `T`.
pub fn query_as<T: FromKernelBytes>(
    kernel: &(impl KernelQuery + ?Sized), key: KernelKey<'_>,
) -> Result<T> {
    let bytes = kernel.query(key, Some(T::SIZE))?;

    T::from_kernel_bytes(&bytes).ok_or_else(|| SysloadError::SizeMismatch {
        key: key.to_string(),
        expected: T::SIZE,
        actual: bytes.len(),
    })
}

/// Drives one sysctl-style call into a buffer: `call` gets the output pointer
/// and the in/out length, and returns the call's status.
///
/// Without `len`, the first call gets a null buffer so the kernel reports the
/// size it needs.
#[cfg_attr(
    not(any(
        target_os = "freebsd",
        target_os = "dragonfly",
        target_os = "netbsd",
        target_os = "openbsd",
        target_os = "macos"
    )),
    allow(dead_code)
)]
pub(crate) fn read_kernel_value(
    name: &'static str, key: KernelKey<'_>, len: Option<usize>,
    mut call: impl FnMut(*mut c_void, &mut usize) -> c_int,
) -> Result<Vec<u8>> {
    let mut size = match len {
        Some(len) => len,
        None => {
            let mut size = 0;
            if call(ptr::null_mut(), &mut size) != 0 {
                return Err(SysloadError::last_kernel_error(name, key));
            }
            size
        }
    };

    let allocated = size;
    let mut buffer = vec![0_u8; allocated];
    if call(buffer.as_mut_ptr().cast(), &mut size) != 0 {
        return Err(SysloadError::last_kernel_error(name, key));
    }

    if (len.is_none() && size != allocated) || size > allocated {
        return Err(SysloadError::SizeMismatch {
            key: key.to_string(),
            expected: allocated,
            actual: size,
        });
    }

    buffer.truncate(size);
    Ok(buffer)
}

/// A [`MetricSource`] backed by sysctl, for systems without procfs.
#[derive(Debug, Default, Clone)]
pub struct SysctlSource<K = Sysctl> {
    kernel: K,
}

impl<K: KernelQuery> SysctlSource<K> {
    /// Creates a source that reads through `kernel`.
    pub fn new(kernel: K) -> Self {
        Self { kernel }
    }

    /// Returns the boot time reported by the kernel.
    pub fn boot_time(&self) -> Result<BootTime> {
        query_as(&self.kernel, BOOT_TIME_KEY)
    }

    fn page_count(&self, key: KernelKey<'_>) -> Result<u64> {
        query_as::<u32>(&self.kernel, key).map(u64::from)
    }
}

impl<K: KernelQuery> MetricSource for SysctlSource<K> {
    fn uptime(&self) -> Result<u64> {
        let boot_time = self.boot_time()?;
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|now| now.as_secs())
            .unwrap_or(0);

        Ok(uptime_since(now, &boot_time))
    }

    fn cpu_ticks(&self) -> Result<CpuTicks> {
        read_cp_time(&self.kernel).map(CpuTicks::CpTime)
    }

    fn mem_swap(&self) -> Result<MemSwap> {
        let page_size = self.kernel.page_size();
        let convert = |pages| pages_to_kib(pages, page_size);

        let mem_total = convert(self.page_count(PAGE_COUNT_KEY)?);
        let mem_free = convert(
            self.page_count(FREE_COUNT_KEY)?
                .saturating_add(self.page_count(INACTIVE_COUNT_KEY)?),
        );

        let (swap_used, swap_total) = match self.kernel.swap_info() {
            Ok(Some(swap)) => (convert(swap.used), convert(swap.total)),
            Ok(None) => (0, 0),
            Err(err) => {
                log::warn!("unable to read swap devices: {err}");
                (0, 0)
            }
        };

        Ok(MemSwap {
            mem_used: mem_total.saturating_sub(mem_free),
            mem_total,
            swap_used,
            swap_total,
        })
    }
}

/// Reads `kern.cp_time` in the running kernel's layout, as user, nice,
/// system, interrupt and idle ticks.
///
/// - FreeBSD: five `long`s.
/// - NetBSD: five `u64`s.
/// - OpenBSD: six `long`s, with spin time folded into system time.
/// - DragonFly and macOS are unsupported. DragonFly reports a per-CPU
///   `kinfo_cputime` struct and macOS has no `kern.cp_time` at all.
fn read_cp_time(kernel: &impl KernelQuery) -> Result<[u64; CP_TIME_CATEGORIES]> {
    cfg_if::cfg_if! {
        if #[cfg(target_os = "netbsd")] {
            query_as(kernel, CP_TIME_KEY)
        } else if #[cfg(target_os = "openbsd")] {
            let ticks: [c_long; OPENBSD_CP_TIME_CATEGORIES] = query_as(kernel, CP_TIME_KEY)?;
            Ok(fold_spin_time(ticks.map(tick_count)))
        } else if #[cfg(any(target_os = "dragonfly", target_os = "macos"))] {
            let _ = kernel;
            Err(SysloadError::Unsupported)
        } else {
            let ticks: [c_long; CP_TIME_CATEGORIES] = query_as(kernel, CP_TIME_KEY)?;
            Ok(ticks.map(tick_count))
        }
    }
}

#[cfg_attr(target_os = "netbsd", allow(dead_code))]
fn tick_count(tick: c_long) -> u64 {
    u64::try_from(tick).unwrap_or(0)
}

/// Folds OpenBSD's spin ticks into system ticks.
#[cfg_attr(not(target_os = "openbsd"), allow(dead_code))]
fn fold_spin_time(
    [user, nice, system, spin, interrupt, idle]: [u64; OPENBSD_CP_TIME_CATEGORIES],
) -> [u64; CP_TIME_CATEGORIES] {
    [user, nice, system.saturating_add(spin), interrupt, idle]
}

/// Seconds between `boot_time` and `now`, clamped at zero.
fn uptime_since(now: u64, boot_time: &BootTime) -> u64 {
    let now = i64::try_from(now).unwrap_or(i64::MAX);
    u64::try_from(now.saturating_sub(boot_time.sec)).unwrap_or(0)
}
