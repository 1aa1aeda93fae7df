//! CLI runner - executes an ingestion run

use crate::artifact::ArtifactWriter;
use crate::auth::Authenticator;
use crate::cli::commands::{Cli, OutputFormat};
use crate::config::IngestConfig;
use crate::error::{Result, ResultExt};
use crate::http::HttpClient;
use crate::ingest::{FileStatus, IngestOptions, Orchestrator, RunSummary};
use crate::warehouse::{Session, SnowflakeWarehouse, Warehouse};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::info;

/// Every file succeeded or was skipped
pub const EXIT_OK: u8 = 0;
/// Configuration or connectivity failure
pub const EXIT_FATAL: u8 = 1;
/// At least one file failed
pub const EXIT_FILES_FAILED: u8 = 2;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run ingestion against the configured Snowflake account and print the summary.
    ///
    /// Returns the process exit status; `Err` is a fatal error.
    pub async fn run(&self) -> Result<u8> {
        let config = IngestConfig::load(&self.cli.config)?;
        let warehouse = Self::connect(&config)?;
        let summary = self.ingest(&config, warehouse).await?;

        self.print_summary(&summary)?;
        Ok(exit_status(&summary))
    }

    /// Build the SQL API backend
    fn connect(config: &IngestConfig) -> Result<Arc<dyn Warehouse>> {
        let authenticator = Authenticator::new(config.auth_config()?);
        let http = HttpClient::with_auth(config.http_client_config(), authenticator)?;
        info!("Connecting to {}", config.base_url());
        Ok(Arc::new(SnowflakeWarehouse::new(
            http,
            config.snowflake_settings(),
        )))
    }

    /// Open a session, run the orchestrator and close the session
    pub async fn ingest(
        &self,
        config: &IngestConfig,
        warehouse: Arc<dyn Warehouse>,
    ) -> Result<RunSummary> {
        let options = self.options(config)?;
        let session = Session::open(warehouse, config.session.clone()).await?;

        let result = Orchestrator::new(options).run(&session).await;
        session.close();
        result
    }

    /// Run options with command-line overrides applied
    pub fn options(&self, config: &IngestConfig) -> Result<IngestOptions> {
        let mut options = IngestOptions::from_config(config)?.with_dry_run(self.cli.dry_run);

        if let Some(concurrency) = self.cli.concurrency {
            options = options.with_concurrency(concurrency);
        }
        if let Some(dir) = &self.cli.artifact_dir {
            options = options.with_artifacts(ArtifactWriter::new(dir));
        }

        Ok(options)
    }

    /// Print the summary to stdout
    fn print_summary(&self, summary: &RunSummary) -> Result<()> {
        match self.cli.format {
            OutputFormat::Json => {
                let json = serde_json::to_string(summary).context("Failed to encode summary")?;
                println!("{json}");
            }
            OutputFormat::Pretty => print!("{}", render_pretty(summary)),
        }
        Ok(())
    }
}

/// Exit status for a finished run
pub fn exit_status(summary: &RunSummary) -> u8 {
    if summary.has_failures() {
        EXIT_FILES_FAILED
    } else {
        EXIT_OK
    }
}

/// Human-readable summary: one line per file, then totals and elapsed time
pub fn render_pretty(summary: &RunSummary) -> String {
    let mut out = String::new();

    for file in &summary.files {
        let table = file.table.as_ref().map_or("-", |t| t.as_str());
        let _ = match &file.status {
            FileStatus::Succeeded => writeln!(out, "OK      {} -> {}", file.path, table),
            FileStatus::Skipped => writeln!(out, "SKIPPED {} -> {}", file.path, table),
            FileStatus::Failed { stage, reason } => writeln!(
                out,
                "FAILED  {} -> {} (after {}): {}",
                file.path, table, stage, reason
            ),
        };
        for warning in &file.warnings {
            let _ = writeln!(out, "        warning: {warning}");
        }
    }

    let _ = writeln!(
        out,
        "{} succeeded, {} failed, {} skipped",
        summary.succeeded(),
        summary.failed(),
        summary.skipped()
    );
    let _ = writeln!(out, "Elapsed: {:.2?}", summary.elapsed);
    out
}
