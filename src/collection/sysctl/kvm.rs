//! Swap device statistics through FreeBSD's `libkvm`.

use std::{ffi::CStr, mem, ptr::NonNull};

use super::SwapRecord;
use crate::utils::error::{Result, SysloadError};

const DEV_NULL: &CStr = c"/dev/null";

/// An open `libkvm` descriptor, closed on drop.
pub(crate) struct KvmHandle(NonNull<libc::kvm_t>);

impl KvmHandle {
    /// Opens a descriptor against the running kernel. No kernel image or core
    /// file is needed for swap statistics, so every path points at `/dev/null`.
    pub(crate) fn open() -> Result<Self> {
        // SAFETY: libc binding, all paths are valid C strings and the error
        // prefix is only read.
        let kd = unsafe {
            libc::kvm_open(
                DEV_NULL.as_ptr(),
                DEV_NULL.as_ptr(),
                DEV_NULL.as_ptr(),
                libc::O_RDONLY,
                c"kvm_open".as_ptr(),
            )
        };

        NonNull::new(kd)
            .map(KvmHandle)
            .ok_or_else(|| SysloadError::last_kernel_error("kvm_open", "/dev/null"))
    }

    /// Returns the swap summary, or [`None`] if the kernel couldn't provide
    /// one. Only one slot is requested, so multiple devices are folded into a
    /// single record.
    pub(crate) fn swap_info(&self) -> Option<SwapRecord> {
        // SAFETY: `kvm_swap` is plain old data, zeroes are a valid value.
        let mut swap: libc::kvm_swap = unsafe { mem::zeroed() };

        // SAFETY: the descriptor is open and `swap` has room for the one entry
        // we ask for.
        let status = unsafe { libc::kvm_getswapinfo(self.0.as_ptr(), &mut swap, 1, 0) };
        if status < 0 {
            log::debug!("kvm_getswapinfo returned {status}");
            return None;
        }

        // SAFETY: the kernel NUL-terminates the device name within the array.
        let device_name = unsafe { CStr::from_ptr(swap.ksw_devname.as_ptr()) }
            .to_string_lossy()
            .into_owned();

        Some(SwapRecord {
            device_name,
            used: u64::from(swap.ksw_used),
            total: u64::from(swap.ksw_total),
            flags: swap.ksw_flags,
        })
    }
}

impl Drop for KvmHandle {
    fn drop(&mut self) {
        // SAFETY: the descriptor came from `kvm_open` and is closed exactly once.
        unsafe {
            libc::kvm_close(self.0.as_ptr());
        }
    }
}
