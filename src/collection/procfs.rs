//! Reading system load through procfs pseudo-files.

use std::{
    fs::{self, File},
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::{
    collection::{cpu::CpuTicks, memory::MemSwap, MetricSource},
    constants::DEFAULT_PROC_ROOT,
    utils::error::{Result, SysloadError},
};

/// A [`MetricSource`] backed by procfs.
#[derive(Debug, Clone)]
pub struct ProcfsSource {
    root: PathBuf,
}

impl Default for ProcfsSource {
    fn default() -> Self {
        Self::new(DEFAULT_PROC_ROOT)
    }
}

impl ProcfsSource {
    /// Creates a source reading pseudo-files under `root` rather than `/proc`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the directory this source reads from.
    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl MetricSource for ProcfsSource {
    fn uptime(&self) -> Result<u64> {
        let contents = fs::read(self.root.join("uptime"))?;
        parse_uptime(&String::from_utf8_lossy(&contents))
    }

    fn cpu_ticks(&self) -> Result<CpuTicks> {
        let mut reader = BufReader::new(File::open(self.root.join("stat"))?);
        let mut line = Vec::new();
        reader.read_until(b'\n', &mut line)?;

        parse_stat_line(&String::from_utf8_lossy(&line))
    }

    fn mem_swap(&self) -> Result<MemSwap> {
        let mut reader = BufReader::new(File::open(self.root.join("meminfo"))?);
        let mut meminfo = MemInfo::default();
        let mut line = Vec::new();

        // Lines are read as bytes so one that isn't UTF-8 is skipped like any other
        // malformed line, rather than failing the whole read.
        while reader.read_until(b'\n', &mut line)? > 0 {
            if meminfo.feed(&String::from_utf8_lossy(&line)) {
                break;
            }
            line.clear();
        }

        Ok(meminfo.finish())
    }
}

/// Parses the contents of `uptime`, truncating the first field to whole
/// seconds.
pub(crate) fn parse_uptime(contents: &str) -> Result<u64> {
    contents
        .split_whitespace()
        .next()
        .and_then(|token| token.parse::<f64>().ok())
        .map(|seconds| seconds as u64)
        .ok_or(SysloadError::Parse("uptime"))
}

/// Parses the aggregate `cpu` line of `stat`. Tokens that aren't numbers are
/// skipped.
pub(crate) fn parse_stat_line(line: &str) -> Result<CpuTicks> {
    let mut parts = line.split_whitespace();
    if parts.next().is_none() {
        return Err(SysloadError::Parse("stat"));
    }

    let fields: Vec<u64> = parts.filter_map(|token| token.parse().ok()).collect();
    if fields.is_empty() {
        return Err(SysloadError::Parse("stat"));
    }

    Ok(CpuTicks::from_procfs_fields(fields))
}

/// Accumulates the `meminfo` fields needed for [`MemSwap`].
#[derive(Debug, Default)]
pub(crate) struct MemInfo {
    mem_total: u64,
    mem_free: u64,
    buffers: u64,
    cached: u64,
    swap_total: u64,
    swap_free: u64,
    seen: u8,
}

impl MemInfo {
    const ALL_SEEN: u8 = 0b11_1111;

    /// Feeds one line of `meminfo`. Lines that don't look like
    /// `Label: number [unit]` are ignored. Returns true once every needed
    /// label has been read.
    pub(crate) fn feed(&mut self, line: &str) -> bool {
        let Some((label, rest)) = line.split_once(':') else {
            return false;
        };

        let (slot, bit) = match label.trim() {
            "MemTotal" => (&mut self.mem_total, 0),
            "MemFree" => (&mut self.mem_free, 1),
            "Buffers" => (&mut self.buffers, 2),
            "Cached" => (&mut self.cached, 3),
            "SwapTotal" => (&mut self.swap_total, 4),
            "SwapFree" => (&mut self.swap_free, 5),
            _ => return false,
        };

        if let Some(value) = rest
            .split_whitespace()
            .next()
            .and_then(|v| v.parse::<u64>().ok())
        {
            *slot = value;
            self.seen |= 1 << bit;
        }

        self.seen == Self::ALL_SEEN
    }

    pub(crate) fn finish(self) -> MemSwap {
        MemSwap {
            mem_used: self
                .mem_total
                .saturating_sub(self.mem_free)
                .saturating_sub(self.buffers)
                .saturating_sub(self.cached),
            mem_total: self.mem_total,
            swap_used: self.swap_total.saturating_sub(self.swap_free),
            swap_total: self.swap_total,
        }
    }
}

#[cfg(test)]
pub(crate) fn parse_meminfo(contents: &str) -> MemSwap {
    let mut meminfo = MemInfo::default();
    for line in contents.lines() {
        if meminfo.feed(line) {
            break;
        }
    }
    meminfo.finish()
}
