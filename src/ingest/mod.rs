//! Ingestion module
//!
//! Turns every staged file under a stage root into a provisioned, loaded table.
//!
//! # Overview
//!
//! The ingest module provides:
//! - `Orchestrator` - lists the stage and runs each file's sequence with failure isolation
//! - `IngestOptions` - stage root, file formats, concurrency, timeout, artifacts, dry run
//! - `RunSummary` / `FileOutcome` - per-file results in listing order
//! - `TableLocks` - mutual exclusion for files that target the same table

mod orchestrator;
mod types;

pub use orchestrator::{Orchestrator, TableLocks};
pub use types::{FileOutcome, FileStage, FileStatus, IngestOptions, RunSummary};

#[cfg(test)]
mod tests;
