//! Warehouse collaborator module
//!
//! The ingestion pipeline talks to the data warehouse only through the `Warehouse` trait:
//!
//! - `list_staged_objects` - enumerate files under a stage root
//! - `infer_schema` - sample one file and report its columns in inference order
//! - `execute` - run any statement
//! - `check_connection` - cheap probe run once when a `Session` opens
//!
//! Listing, inference and the probe have default implementations built on `execute`, so a
//! backend only needs to run SQL. Implementations must be safe to share between concurrent
//! workers (`Send + Sync`).
//!
//! # Backends
//!
//! - `SnowflakeWarehouse` - Snowflake SQL API v2 over HTTPS
//! - `MemoryWarehouse` - scripted in-process warehouse for tests and local runs

mod memory;
mod session;
mod snowflake;
mod types;

pub use memory::MemoryWarehouse;
pub use session::Session;
pub use snowflake::{SnowflakeSettings, SnowflakeWarehouse, STATEMENTS_PATH};
pub use types::{InferredColumn, QueryResult, SessionContext, StagedObject};

use crate::error::{Error, Result};
use crate::sql::{infer_schema_statement, list_statement};
use async_trait::async_trait;

/// Statement used to verify that a session can reach the warehouse
pub const CONNECTION_PROBE: &str =
    "SELECT CURRENT_ROLE(), CURRENT_DATABASE(), CURRENT_SCHEMA(), CURRENT_WAREHOUSE()";

/// Data warehouse collaborator
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Run a statement and return its rows
    async fn execute(&self, ctx: &SessionContext, statement: &str) -> Result<QueryResult>;

    /// Verify connectivity and credentials for `ctx`
    async fn check_connection(&self, ctx: &SessionContext) -> Result<()> {
        self.execute(ctx, CONNECTION_PROBE).await.map(|_| ())
    }

    /// Enumerate files under a stage root
    async fn list_staged_objects(
        &self,
        ctx: &SessionContext,
        root: &str,
    ) -> Result<Vec<StagedObject>> {
        let statement = list_statement(root);
        let result = self.execute(ctx, &statement).await?;
        let Some(name_index) = result.column_index("name") else {
            return Err(Error::execution(
                statement,
                "",
                "stage listing returned no 'name' column",
            ));
        };

        let size_index = result.column_index("size");
        let modified_index = result.column_index("last_modified");

        Ok(result
            .rows
            .iter()
            .filter_map(|row| {
                let path = row.get(name_index).cloned().flatten()?;
                Some(StagedObject {
                    path,
                    size: cell(row, size_index).and_then(|s| s.parse().ok()),
                    last_modified: cell(row, modified_index),
                })
            })
            .collect())
    }

    /// Infer the column schema of one staged file. Zero columns is a `SchemaEmpty` error.
    async fn infer_schema(
        &self,
        ctx: &SessionContext,
        location: &str,
        file_name: &str,
        file_format: &str,
    ) -> Result<Vec<InferredColumn>> {
        let statement = infer_schema_statement(location, file_name, file_format);
        let result = self.execute(ctx, &statement).await?;
        if result.is_empty() {
            return Err(Error::schema_empty(file_name));
        }

        let (Some(name_index), Some(type_index)) =
            (result.column_index("COLUMN_NAME"), result.column_index("TYPE"))
        else {
            return Err(Error::execution(
                statement,
                "",
                "schema inference returned no COLUMN_NAME/TYPE columns",
            ));
        };
        let nullable_index = result.column_index("NULLABLE");

        result
            .rows
            .iter()
            .map(|row| {
                let value = |index: usize| row.get(index).cloned().flatten();
                let name = value(name_index).ok_or_else(|| {
                    Error::invalid_schema(format!("column without a name in '{file_name}'"))
                })?;
                let data_type = value(type_index).ok_or_else(|| {
                    Error::invalid_schema(format!("column '{name}' has no inferred type"))
                })?;
                Ok(InferredColumn {
                    name,
                    data_type,
                    nullable: nullable_index
                        .and_then(value)
                        .map(|v| v.eq_ignore_ascii_case("true") || v == "1" || v == "Y"),
                })
            })
            .collect()
    }
}

/// Value of an optional column in one result row
fn cell(row: &[Option<String>], index: Option<usize>) -> Option<String> {
    index.and_then(|i| row.get(i).cloned().flatten())
}
