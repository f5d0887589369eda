//! Memory and swap usage.

/// Memory and swap usage, all in kibibytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemSwap {
    pub mem_used: u64,
    pub mem_total: u64,
    pub swap_used: u64,
    pub swap_total: u64,
}

impl MemSwap {
    /// Return the memory use percentage, or [`None`] if there is no memory to
    /// speak of.
    #[inline]
    pub fn mem_percentage(&self) -> Option<f64> {
        percentage(self.mem_used, self.mem_total)
    }

    /// Return the swap use percentage, or [`None`] if there is no swap.
    #[inline]
    pub fn swap_percentage(&self) -> Option<f64> {
        percentage(self.swap_used, self.swap_total)
    }

    /// Returns the values as a `(mem_used, mem_total, swap_used, swap_total)`
    /// tuple.
    pub fn as_tuple(&self) -> (u64, u64, u64, u64) {
        (self.mem_used, self.mem_total, self.swap_used, self.swap_total)
    }
}

#[inline]
fn percentage(used: u64, total: u64) -> Option<f64> {
    if total == 0 {
        None
    } else {
        Some(used as f64 / total as f64 * 100.0)
    }
}

/// Converts a page count to kibibytes, rounding down.
#[inline]
pub fn pages_to_kib(pages: u64, page_size: u64) -> u64 {
    pages.saturating_mul(page_size) / 1024
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn percentages() {
        let usage = MemSwap {
            mem_used: 250,
            mem_total: 1000,
            swap_used: 0,
            swap_total: 0,
        };

        assert_eq!(usage.mem_percentage(), Some(25.0));
        assert_eq!(usage.swap_percentage(), None);
    }

    #[test]
    fn page_conversion_floors() {
        assert_eq!(pages_to_kib(3, 4096), 12);
        assert_eq!(pages_to_kib(1, 1000), 0);
        assert_eq!(pages_to_kib(5, 16384), 80);
    }
}
