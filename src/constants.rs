/// Where procfs is normally mounted.
pub const DEFAULT_PROC_ROOT: &str = "/proc";
