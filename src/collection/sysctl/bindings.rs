//! The native sysctl interface. On systems without sysctl every query reports
//! [`SysloadError::Unsupported`].

#[cfg(any(
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "netbsd",
    target_os = "openbsd",
    target_os = "macos"
))]
use std::ptr;
use std::ffi::c_int;

use super::{query_as, FromKernelBytes, KernelKey, KernelQuery, SwapRecord};
use crate::utils::error::{Result, SysloadError};

/// The running kernel.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sysctl;

impl KernelQuery for Sysctl {
    fn query(&self, key: KernelKey<'_>, len: Option<usize>) -> Result<Vec<u8>> {
        match key {
            KernelKey::Path(path) => sysctl(path, len),
            KernelKey::Name(name) => sysctl_by_name(name, len),
        }
    }

    fn page_size(&self) -> u64 {
        rustix::param::page_size() as u64
    }

    fn swap_info(&self) -> Result<Option<SwapRecord>> {
        cfg_if::cfg_if! {
            if #[cfg(target_os = "freebsd")] {
                // The handle only lives for this call and is closed on drop.
                let kd = super::kvm::KvmHandle::open()?;
                Ok(kd.swap_info())
            } else {
                Err(SysloadError::Unsupported)
            }
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(any(
        target_os = "freebsd",
        target_os = "dragonfly",
        target_os = "netbsd",
        target_os = "openbsd",
        target_os = "macos"
    ))] {
        /// Reads the kernel value at the numeric `path`. See
        /// [`KernelQuery::query`] for how `len` is used.
        pub fn sysctl(path: &[c_int], len: Option<usize>) -> Result<Vec<u8>> {
            let path_len = libc::c_uint::try_from(path.len())
                .map_err(|_| SysloadError::Io(std::io::ErrorKind::InvalidInput.into()))?;

            super::read_kernel_value("sysctl", KernelKey::Path(path), len, |buf, size| {
                // SAFETY: libc binding. `path` outlives the call, `buf` is either null
                // or points to `*size` writable bytes, and no new value is set.
                unsafe {
                    libc::sysctl(
                        path.as_ptr().cast_mut(),
                        path_len,
                        buf,
                        size,
                        ptr::null_mut(),
                        0,
                    )
                }
            })
        }
    } else {
        /// Reads the kernel value at the numeric `path`. Unsupported here.
        pub fn sysctl(_path: &[c_int], _len: Option<usize>) -> Result<Vec<u8>> {
            Err(SysloadError::Unsupported)
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(any(
        target_os = "freebsd",
        target_os = "dragonfly",
        target_os = "netbsd",
        target_os = "macos"
    ))] {
        /// Reads the kernel value called `name`. See [`KernelQuery::query`]
        /// for how `len` is used.
        pub fn sysctl_by_name(name: &str, len: Option<usize>) -> Result<Vec<u8>> {
            let c_name = std::ffi::CString::new(name)
                .map_err(|_| SysloadError::Io(std::io::ErrorKind::InvalidInput.into()))?;

            super::read_kernel_value("sysctlbyname", KernelKey::Name(name), len, |buf, size| {
                // SAFETY: libc binding. `c_name` is a valid C string that outlives the
                // call, `buf` is either null or points to `*size` writable bytes, and
                // no new value is set.
                unsafe { libc::sysctlbyname(c_name.as_ptr(), buf, size, ptr::null_mut(), 0) }
            })
        }
    } else {
        /// Reads the kernel value called `name`. Unsupported here.
        pub fn sysctl_by_name(_name: &str, _len: Option<usize>) -> Result<Vec<u8>> {
            Err(SysloadError::Unsupported)
        }
    }
}

/// Reads the kernel value at `path` and decodes it as `T`.
pub fn sysctl_as<T: FromKernelBytes>(path: &[c_int]) -> Result<T> {
    query_as(&Sysctl, KernelKey::Path(path))
}

/// Reads the kernel value called `name` and decodes it as `T`.
pub fn sysctl_by_name_as<T: FromKernelBytes>(name: &str) -> Result<T> {
    query_as(&Sysctl, KernelKey::Name(name))
}
