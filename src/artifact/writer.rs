//! Artifact writer implementation

use crate::error::{Error, Result};
use crate::naming::{StagedFileRef, TableName};
use crate::types::GeneratedStatement;
use chrono::{DateTime, SecondsFormat, Utc};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Distinguishes temporary files written by concurrent tasks of one process
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Render the artifact text for one file
pub fn render_artifact(
    table: &TableName,
    source: &StagedFileRef,
    ddl: &GeneratedStatement,
    load: &GeneratedStatement,
    generated_at: DateTime<Utc>,
) -> String {
    format!(
        "-- stage-ingest artifact for {table}\n\
         -- source: {source}\n\
         -- generated: {}\n\
         \n\
         -- Creating table\n\
         {}\n\
         \n\
         -- Execute copy command\n\
         {}\n",
        generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        ddl.text(),
        load.text()
    )
}

/// Writes `<TABLE>.sql` artifacts into a directory
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    /// Create a writer targeting `dir`. The directory is created on first write.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// Target directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Artifact path for a table
    pub fn path_for(&self, table: &TableName) -> PathBuf {
        self.dir.join(format!("{table}.sql"))
    }

    /// Write the artifact for one file, replacing any previous one for the same table.
    ///
    /// The temporary file handle is closed before the rename and the temporary file is removed
    /// if any step fails.
    pub async fn write(
        &self,
        table: &TableName,
        source: &StagedFileRef,
        ddl: &GeneratedStatement,
        load: &GeneratedStatement,
    ) -> Result<PathBuf> {
        let target = self.path_for(table);
        let contents = render_artifact(table, source, ddl, load, Utc::now());

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Error::artifact(self.dir.display().to_string(), e.to_string()))?;

        let temp = self.dir.join(format!(
            ".{table}.sql.{}.{}.tmp",
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        let written = async {
            let mut file = tokio::fs::File::create(&temp).await?;
            file.write_all(contents.as_bytes()).await?;
            file.flush().await?;
            file.sync_all().await?;
            Ok::<_, std::io::Error>(())
        }
        .await;

        let renamed = match written {
            Ok(()) => tokio::fs::rename(&temp, &target).await,
            Err(e) => Err(e),
        };

        if let Err(e) = renamed {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(Error::artifact(target.display().to_string(), e.to_string()));
        }

        debug!("Wrote artifact {}", target.display());
        Ok(target)
    }
}
