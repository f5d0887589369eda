//! Integration tests for sysload.

mod util;

mod arg_tests;
mod procfs_tests;
