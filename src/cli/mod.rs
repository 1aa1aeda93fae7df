//! CLI module
//!
//! Command-line interface for ingestion runs. The binary takes no required arguments: it reads
//! `stage-ingest.yaml`, ingests every staged file and prints a summary.
//!
//! # Exit status
//!
//! - `0` - every file succeeded (or was skipped in a dry run)
//! - `1` - fatal error (configuration, authentication, connectivity)
//! - `2` - at least one file failed

mod commands;
mod runner;

pub use commands::{Cli, OutputFormat};
pub use runner::{exit_status, render_pretty, Runner, EXIT_FATAL, EXIT_FILES_FAILED, EXIT_OK};
