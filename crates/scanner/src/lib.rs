//! # sigscout-scanner
//!
//! Bounded-concurrency file system traversal.
//!
//! [`collect`] walks a root directory and hands every eligible file to an
//! async evaluation callback, keeping at most `max_concurrency` units of
//! work (directory reads, file evaluations) in flight at once. Dependency,
//! VCS, build-output and test directories are pruned without descending;
//! generated, backup, duplicate-copy and test files are filtered before
//! evaluation.

mod error;
mod filters;
mod scanner;

pub use error::{Result, ScanError};
pub use filters::{is_eligible_file, DEFAULT_SKIP_DIRS};
pub use scanner::{collect, default_concurrency, ScanOptions};
