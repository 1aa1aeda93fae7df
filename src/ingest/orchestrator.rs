//! Ingestion orchestrator
//!
//! Lists the stage once, then runs each file's sequence:
//! derive names, infer schema, generate DDL, generate load, write artifact, create table, load.
//!
//! Files are independent: a per-file error marks that file failed and the run moves on. Only
//! fatal errors (`Error::is_fatal`) stop the run. Files deriving the same table name are
//! serialized by a per-table lock held for the whole sequence.

use super::types::{FileOutcome, FileStage, FileStatus, IngestOptions, RunSummary};
use crate::error::{Error, Result};
use crate::naming::{derive_names, DerivedNames, TableName};
use crate::schema::{ColumnDef, SchemaDescriptor};
use crate::sql::{copy_into_statement, create_table_statement};
use crate::types::GeneratedStatement;
use crate::warehouse::{Session, StagedObject};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Async mutexes keyed by table name
#[derive(Debug, Default)]
pub struct TableLocks {
    locks: Mutex<HashMap<TableName, Arc<tokio::sync::Mutex<()>>>>,
}

impl TableLocks {
    /// Create an empty lock table
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `table`
    pub async fn acquire(&self, table: &TableName) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(table.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }
}

/// Progress of one file, kept outside the timed future so it survives a timeout
#[derive(Debug)]
struct Progress {
    stage: FileStage,
    warnings: Vec<String>,
    artifact: Option<PathBuf>,
}

impl Progress {
    fn new() -> Self {
        Self {
            stage: FileStage::Listed,
            warnings: Vec::new(),
            artifact: None,
        }
    }
}

/// Drives ingestion of every staged file under a root
#[derive(Debug)]
pub struct Orchestrator {
    options: IngestOptions,
    locks: TableLocks,
}

impl Orchestrator {
    /// Create an orchestrator
    pub fn new(options: IngestOptions) -> Self {
        Self {
            options,
            locks: TableLocks::new(),
        }
    }

    /// Run options
    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    /// List the stage and ingest every matching file.
    ///
    /// Returns `Err` only for fatal errors; per-file failures are reported in the summary.
    pub async fn run(&self, session: &Session) -> Result<RunSummary> {
        let started_at = Utc::now();
        let start = Instant::now();

        info!("Listing staged files under {}", self.options.stage_root);
        let listed = session.list_staged_objects(&self.options.stage_root).await?;
        let objects: Vec<StagedObject> = listed
            .into_iter()
            .filter(|object| {
                self.options
                    .pattern
                    .as_ref()
                    .is_none_or(|pattern| pattern.is_match(&object.path))
            })
            .collect();
        info!("Found {} staged file(s) to ingest", objects.len());

        self.warn_on_collisions(&objects);

        let concurrency = self.options.concurrency.max(1);
        let mut results = stream::iter(objects.iter().enumerate())
            .map(|(index, object)| async move {
                self.process_file(session, &object.path)
                    .await
                    .map(|outcome| (index, outcome))
            })
            .buffer_unordered(concurrency);

        let mut outcomes = Vec::with_capacity(objects.len());
        while let Some(result) = results.next().await {
            // A fatal error drops the stream, cancelling files still in flight
            outcomes.push(result?);
        }
        outcomes.sort_by_key(|(index, _)| *index);

        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            elapsed: start.elapsed(),
            files: outcomes.into_iter().map(|(_, outcome)| outcome).collect(),
        };

        info!(
            "Ingestion finished in {:.2?}: {} succeeded, {} failed, {} skipped",
            summary.elapsed,
            summary.succeeded(),
            summary.failed(),
            summary.skipped()
        );

        Ok(summary)
    }

    /// Process one listed path. `Err` means the error was fatal.
    async fn process_file(&self, session: &Session, path: &str) -> Result<FileOutcome> {
        let start = Instant::now();

        let names = match derive_names(path) {
            Ok(names) => names,
            Err(e) => {
                warn!("Skipping '{}': {}", path, e);
                return Ok(FileOutcome {
                    path: path.to_string(),
                    table: None,
                    status: FileStatus::Failed {
                        stage: FileStage::Listed,
                        reason: e.to_string(),
                    },
                    warnings: Vec::new(),
                    artifact: None,
                    elapsed: start.elapsed(),
                });
            }
        };

        let _guard = self.locks.acquire(&names.table).await;
        debug!("Processing '{}' into {}", path, names.table);

        let mut progress = Progress::new();
        let result = match self.options.file_timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, self.run_sequence(session, &names, &mut progress))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(Error::FileTimeout {
                        file: path.to_string(),
                        timeout_ms: limit.as_millis() as u64,
                    }),
                }
            }
            None => self.run_sequence(session, &names, &mut progress).await,
        };

        let status = match result {
            Ok(status) => {
                info!("Ingested '{}' into {}", path, names.table);
                status
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(
                    "Failed to ingest '{}' after stage {}: {}",
                    path, progress.stage, e
                );
                FileStatus::Failed {
                    stage: progress.stage,
                    reason: e.to_string(),
                }
            }
        };

        Ok(FileOutcome {
            path: path.to_string(),
            table: Some(names.table),
            status,
            warnings: progress.warnings,
            artifact: progress.artifact,
            elapsed: start.elapsed(),
        })
    }

    /// The per-file sequence, run while the table lock is held
    async fn run_sequence(
        &self,
        session: &Session,
        names: &DerivedNames,
        progress: &mut Progress,
    ) -> Result<FileStatus> {
        let staged = &names.staged;
        let table = &names.table;

        let columns = session
            .infer_schema(
                staged.prefix(),
                staged.file_name(),
                &self.options.infer_file_format,
            )
            .await?;
        let schema = SchemaDescriptor::new(columns.into_iter().map(ColumnDef::from).collect())?;
        progress.stage = FileStage::SchemaInferred;
        debug!("Inferred {} column(s) for {}", schema.len(), staged);

        let ddl = GeneratedStatement::ddl(create_table_statement(&schema, table)?);
        progress.stage = FileStage::DdlGenerated;

        let load = GeneratedStatement::load(copy_into_statement(
            table,
            staged.prefix(),
            staged.file_name(),
            &self.options.load_file_format,
        ));
        progress.stage = FileStage::LoadCommandGenerated;

        if let Some(writer) = &self.options.artifacts {
            match writer.write(table, staged, &ddl, &load).await {
                Ok(path) => progress.artifact = Some(path),
                Err(e) => {
                    warn!("Artifact for {} not written: {}", table, e);
                    progress.warnings.push(e.to_string());
                }
            }
        }

        if self.options.dry_run {
            info!("Dry run: not executing statements for {}", staged);
            return Ok(FileStatus::Skipped);
        }

        session.execute(ddl.text()).await?;
        progress.stage = FileStage::TableCreated;

        session.execute(load.text()).await?;
        progress.stage = FileStage::Loaded;

        progress.stage = FileStage::Done;
        Ok(FileStatus::Succeeded)
    }

    /// Log files that will load into the same table
    fn warn_on_collisions(&self, objects: &[StagedObject]) {
        let mut by_table: BTreeMap<TableName, Vec<&str>> = BTreeMap::new();
        for object in objects {
            if let Ok(names) = derive_names(&object.path) {
                by_table.entry(names.table).or_default().push(&object.path);
            }
        }

        for (table, paths) in by_table.iter().filter(|(_, paths)| paths.len() > 1) {
            warn!(
                "{} staged files load into table {}: {}",
                paths.len(),
                table,
                paths.join(", ")
            );
        }
    }
}
