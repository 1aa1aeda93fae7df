//! Warehouse session
//!
//! A `Session` pairs a warehouse backend with the context every statement runs under. It is
//! opened once before ingestion starts (verifying connectivity) and closed when the run ends.

use super::types::{InferredColumn, QueryResult, SessionContext, StagedObject};
use super::Warehouse;
use crate::error::{Error, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// An open warehouse session
pub struct Session {
    warehouse: Arc<dyn Warehouse>,
    context: SessionContext,
    opened_at: Instant,
}

impl Session {
    /// Open a session, probing the warehouse once.
    ///
    /// Any probe failure is a fatal `Connectivity` error: no file can be processed without a
    /// working session.
    pub async fn open(warehouse: Arc<dyn Warehouse>, context: SessionContext) -> Result<Self> {
        debug!(?context, "Opening warehouse session");

        warehouse.check_connection(&context).await.map_err(|e| {
            if e.is_fatal() {
                e
            } else {
                Error::connectivity(format!("session setup failed: {e}"))
            }
        })?;

        info!(
            role = context.role.as_deref().unwrap_or("-"),
            database = context.database.as_deref().unwrap_or("-"),
            schema = context.schema.as_deref().unwrap_or("-"),
            warehouse = context.warehouse.as_deref().unwrap_or("-"),
            "Warehouse session opened"
        );

        Ok(Self {
            warehouse,
            context,
            opened_at: Instant::now(),
        })
    }

    /// Session context
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Enumerate files under a stage root
    pub async fn list_staged_objects(&self, root: &str) -> Result<Vec<StagedObject>> {
        self.warehouse
            .list_staged_objects(&self.context, root)
            .await
    }

    /// Infer the schema of one staged file
    pub async fn infer_schema(
        &self,
        location: &str,
        file_name: &str,
        file_format: &str,
    ) -> Result<Vec<InferredColumn>> {
        self.warehouse
            .infer_schema(&self.context, location, file_name, file_format)
            .await
    }

    /// Run a statement
    pub async fn execute(&self, statement: &str) -> Result<QueryResult> {
        self.warehouse.execute(&self.context, statement).await
    }

    /// Close the session
    pub fn close(self) {
        info!(
            "Warehouse session closed after {:.2?}",
            self.opened_at.elapsed()
        );
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
