use std::{io, result};

use thiserror::Error;

/// A type alias for handling errors related to sysload.
pub type Result<T> = result::Result<T, SysloadError>;

/// An error that can occur while reading system load data.
#[derive(Debug, Error)]
pub enum SysloadError {
    /// A kernel query returned a non-zero status. `errno` is the OS error
    /// number captured right after the failing call.
    #[error("{call}({key}) returned with error {errno}")]
    Kernel {
        call: &'static str,
        key: String,
        errno: i32,
    },

    /// A kernel query succeeded but the buffer it filled does not have the
    /// size the caller expected.
    #[error("{key} returned {actual} bytes, expected {expected}")]
    SizeMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },

    /// An error when there is an IO exception while reading a pseudo-file.
    #[error("IO exception, {0}")]
    Io(#[from] io::Error),

    /// A pseudo-file held no usable data.
    #[error("failed to parse {0}")]
    Parse(&'static str),

    /// The reading is unsupported on this platform.
    #[error("sysload does not support this reading on this platform")]
    Unsupported,
}

impl SysloadError {
    /// Builds a [`SysloadError::Kernel`] from the current value of `errno`.
    ///
    /// This must be called immediately after the failing call, before anything
    /// else gets a chance to overwrite `errno`.
    pub fn last_kernel_error(call: &'static str, key: impl ToString) -> Self {
        SysloadError::Kernel {
            call,
            key: key.to_string(),
            errno: io::Error::last_os_error().raw_os_error().unwrap_or(0),
        }
    }

    /// Returns the captured OS error number, if this is a kernel error.
    pub fn errno(&self) -> Option<i32> {
        match self {
            SysloadError::Kernel { errno, .. } => Some(*errno),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn kernel_error_captures_errno() {
        // SAFETY: closing an invalid descriptor is harmless and sets errno to EBADF.
        let status = unsafe { libc::close(-1) };
        assert_eq!(status, -1);

        let err = SysloadError::last_kernel_error("close", -1);
        assert_eq!(err.errno(), Some(libc::EBADF));
        assert_eq!(
            err.to_string(),
            format!("close(-1) returned with error {}", libc::EBADF)
        );
    }

    #[test]
    fn non_kernel_errors_have_no_errno() {
        assert_eq!(SysloadError::Parse("uptime").errno(), None);
        assert_eq!(SysloadError::Unsupported.errno(), None);
    }
}
