//! Ingestion types
//!
//! Per-file outcomes, the run summary, and run options.

use crate::artifact::ArtifactWriter;
use crate::config::IngestConfig;
use crate::error::Result;
use crate::naming::TableName;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// File Progress
// ============================================================================

/// Stages a staged file passes through, in processing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStage {
    /// Returned by the stage listing
    Listed,
    /// Column schema inferred by the warehouse
    SchemaInferred,
    /// `CREATE TABLE IF NOT EXISTS` text generated
    DdlGenerated,
    /// `COPY INTO` text generated
    LoadCommandGenerated,
    /// DDL executed
    TableCreated,
    /// Load executed
    Loaded,
    /// Finished
    Done,
}

impl fmt::Display for FileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileStage::Listed => "listed",
            FileStage::SchemaInferred => "schema_inferred",
            FileStage::DdlGenerated => "ddl_generated",
            FileStage::LoadCommandGenerated => "load_command_generated",
            FileStage::TableCreated => "table_created",
            FileStage::Loaded => "loaded",
            FileStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Final status of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    /// Table created (or already present) and file loaded
    Succeeded,
    /// Processing stopped; `stage` is the last stage the file reached
    Failed {
        /// Last stage reached before the failure
        stage: FileStage,
        /// Error message
        reason: String,
    },
    /// Statements generated but not executed (dry run)
    Skipped,
}

/// Outcome of processing one staged file
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    /// Path as reported by the stage listing
    pub path: String,
    /// Target table, when the name could be derived
    pub table: Option<TableName>,
    /// Final status
    #[serde(flatten)]
    pub status: FileStatus,
    /// Non-fatal problems, e.g. an artifact that could not be written
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Artifact written for this file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<PathBuf>,
    /// Wall-clock time spent on this file, including waiting for its table lock
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl FileOutcome {
    /// Whether the file was loaded
    pub fn is_success(&self) -> bool {
        matches!(self.status, FileStatus::Succeeded)
    }

    /// Whether processing failed
    pub fn is_failure(&self) -> bool {
        matches!(self.status, FileStatus::Failed { .. })
    }

    /// Failure reason, if failed
    pub fn failure_reason(&self) -> Option<&str> {
        match &self.status {
            FileStatus::Failed { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

// ============================================================================
// Run Summary
// ============================================================================

/// Aggregate result of one ingestion run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
    /// Total wall-clock duration
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    /// One outcome per processed file, in listing order
    pub files: Vec<FileOutcome>,
}

impl RunSummary {
    /// Number of files loaded
    pub fn succeeded(&self) -> usize {
        self.files.iter().filter(|f| f.is_success()).count()
    }

    /// Number of files that failed
    pub fn failed(&self) -> usize {
        self.files.iter().filter(|f| f.is_failure()).count()
    }

    /// Number of files skipped
    pub fn skipped(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.status, FileStatus::Skipped))
            .count()
    }

    /// Whether any file failed
    pub fn has_failures(&self) -> bool {
        self.files.iter().any(FileOutcome::is_failure)
    }

    /// Outcome for a listed path
    pub fn outcome(&self, path: &str) -> Option<&FileOutcome> {
        self.files.iter().find(|f| f.path == path)
    }
}

fn serialize_millis<S: Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

// ============================================================================
// Options
// ============================================================================

/// Options for one ingestion run
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Stage root to list
    pub stage_root: String,
    /// Named file format for schema inference
    pub infer_file_format: String,
    /// Named file format for COPY INTO
    pub load_file_format: String,
    /// Only listed paths matching this are processed
    pub pattern: Option<Regex>,
    /// Files processed at once (at least 1)
    pub concurrency: usize,
    /// Limit on each file's sequence, measured once its table lock is held
    pub file_timeout: Option<Duration>,
    /// Where artifacts go; `None` disables them
    pub artifacts: Option<ArtifactWriter>,
    /// Generate statements without executing them
    pub dry_run: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            stage_root: "@my_stage".to_string(),
            infer_file_format: "file_format_parse_header".to_string(),
            load_file_format: "file_format_csv".to_string(),
            pattern: None,
            concurrency: 1,
            file_timeout: None,
            artifacts: None,
            dry_run: false,
        }
    }
}

impl IngestOptions {
    /// Build options from a loaded config
    pub fn from_config(config: &IngestConfig) -> Result<Self> {
        Ok(Self {
            stage_root: config.stage.root.clone(),
            infer_file_format: config.stage.infer_file_format.clone(),
            load_file_format: config.stage.load_file_format.clone(),
            pattern: config.stage.compiled_pattern()?,
            concurrency: config.ingest.concurrency.max(1),
            file_timeout: config.ingest.file_timeout(),
            artifacts: config
                .ingest
                .write_artifacts
                .then(|| ArtifactWriter::new(&config.ingest.artifact_dir)),
            dry_run: false,
        })
    }

    /// Set the stage root
    #[must_use]
    pub fn with_stage_root(mut self, root: impl Into<String>) -> Self {
        self.stage_root = root.into();
        self
    }

    /// Set the path filter
    #[must_use]
    pub fn with_pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Set concurrency (values below 1 are treated as 1)
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the per-file timeout
    #[must_use]
    pub fn with_file_timeout(mut self, timeout: Duration) -> Self {
        self.file_timeout = Some(timeout);
        self
    }

    /// Write artifacts with `writer`
    #[must_use]
    pub fn with_artifacts(mut self, writer: ArtifactWriter) -> Self {
        self.artifacts = Some(writer);
        self
    }

    /// Enable or disable dry-run mode
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
