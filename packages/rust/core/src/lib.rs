//! Import orchestration for Catfeed.
//!
//! Ties the parser and storage crates together: parse a vendor catalog
//! file, then upsert groups and articles by natural key, groups first.

pub mod import;

pub use import::{ImportConfig, ImportResult, ProgressReporter, SilentProgress, run_import};
