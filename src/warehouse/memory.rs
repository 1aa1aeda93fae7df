//! In-memory warehouse
//!
//! A scripted warehouse for tests and local runs. Staged files and their inferred schemas are
//! registered up front; executed statements are recorded in order.
//!
//! Table statements are emulated closely enough to observe ingestion semantics:
//! - `CREATE TABLE IF NOT EXISTS` is a no-op when the table exists
//! - plain `CREATE TABLE` on an existing table fails
//! - `COPY INTO` fails when the target table does not exist

use super::types::{InferredColumn, QueryResult, SessionContext, StagedObject};
use super::Warehouse;
use crate::error::{Error, Result};
use crate::naming::STAGE_MARKER;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
struct MemoryState {
    staged: Vec<String>,
    schemas: HashMap<String, Vec<InferredColumn>>,
    tables: BTreeMap<String, String>,
    loads: Vec<(String, String)>,
    executed: Vec<String>,
    failing_fragments: Vec<String>,
    disconnect_fragments: Vec<String>,
    unreachable: bool,
}

/// Scripted in-process warehouse
#[derive(Debug, Default)]
pub struct MemoryWarehouse {
    state: Mutex<MemoryState>,
    latency: Duration,
}

impl MemoryWarehouse {
    /// Create an empty warehouse
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a file whose inference yields `columns`. An empty slice makes inference fail
    /// with `SchemaEmpty`.
    #[must_use]
    pub fn with_file(self, path: impl Into<String>, columns: &[(&str, &str)]) -> Self {
        let path = path.into();
        {
            let mut state = self.lock();
            state.staged.push(path.clone());
            state.schemas.insert(
                path,
                columns
                    .iter()
                    .map(|(name, data_type)| InferredColumn::new(*name, *data_type))
                    .collect(),
            );
        }
        self
    }

    /// Reject every statement containing `fragment` with a `WarehouseExecution` error
    #[must_use]
    pub fn failing_statements_containing(self, fragment: impl Into<String>) -> Self {
        self.lock().failing_fragments.push(fragment.into());
        self
    }

    /// Drop the connection when a statement containing `fragment` runs
    #[must_use]
    pub fn disconnecting_on(self, fragment: impl Into<String>) -> Self {
        self.lock().disconnect_fragments.push(fragment.into());
        self
    }

    /// Make every call fail with `Connectivity`
    #[must_use]
    pub fn unreachable(self) -> Self {
        self.lock().unreachable = true;
        self
    }

    /// Delay every table statement by `latency`
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Names of existing tables, sorted
    pub fn table_names(&self) -> Vec<String> {
        self.lock().tables.keys().cloned().collect()
    }

    /// The DDL that created `table`
    pub fn table_definition(&self, table: &str) -> Option<String> {
        self.lock().tables.get(table).cloned()
    }

    /// `(table, source)` pairs of every load, in execution order; quoted sources are unquoted
    pub fn loads(&self) -> Vec<(String, String)> {
        self.lock().loads.clone()
    }

    /// Every statement passed to `execute`, in order
    pub fn executed(&self) -> Vec<String> {
        self.lock().executed.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_reachable(&self) -> Result<()> {
        if self.lock().unreachable {
            return Err(Error::connectivity("memory warehouse is unreachable"));
        }
        Ok(())
    }

    fn apply(&self, statement: &str) -> Result<QueryResult> {
        let mut state = self.lock();
        state.executed.push(statement.to_string());

        if state
            .disconnect_fragments
            .iter()
            .any(|f| statement.contains(f.as_str()))
        {
            state.unreachable = true;
            return Err(Error::connectivity("connection lost"));
        }
        if state
            .failing_fragments
            .iter()
            .any(|f| statement.contains(f.as_str()))
        {
            return Err(Error::execution(statement, "000001", "injected failure"));
        }

        let upper = statement.trim_start().to_ascii_uppercase();
        if let Some(rest) = upper.strip_prefix("CREATE TABLE IF NOT EXISTS ") {
            let table = leading_identifier(rest);
            if state.tables.contains_key(&table) {
                return Ok(status_result(format!(
                    "{table} already exists, statement succeeded."
                )));
            }
            state.tables.insert(table.clone(), statement.to_string());
            return Ok(status_result(format!("Table {table} successfully created.")));
        }

        if let Some(rest) = upper.strip_prefix("CREATE TABLE ") {
            let table = leading_identifier(rest);
            if state.tables.contains_key(&table) {
                return Err(Error::execution(
                    statement,
                    "002002",
                    format!("Object '{table}' already exists."),
                ));
            }
            state.tables.insert(table.clone(), statement.to_string());
            return Ok(status_result(format!("Table {table} successfully created.")));
        }

        if let Some(rest) = upper.strip_prefix("COPY INTO ") {
            let table = leading_identifier(rest);
            if !state.tables.contains_key(&table) {
                return Err(Error::execution(
                    statement,
                    "002003",
                    format!("Table '{table}' does not exist or not authorized."),
                ));
            }
            let source = statement
                .lines()
                .find_map(|line| line.trim().strip_prefix("FROM "))
                .map(|source| unquote_literal(source.trim()))
                .unwrap_or_default();
            state.loads.push((table, source));
            return Ok(QueryResult::new(
                vec!["status".to_string()],
                vec![vec![Some("LOADED".to_string())]],
            ));
        }

        Ok(QueryResult::default())
    }
}

#[async_trait]
impl Warehouse for MemoryWarehouse {
    async fn execute(&self, _ctx: &SessionContext, statement: &str) -> Result<QueryResult> {
        self.ensure_reachable()?;
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.apply(statement)
    }

    async fn check_connection(&self, _ctx: &SessionContext) -> Result<()> {
        self.ensure_reachable()
    }

    async fn list_staged_objects(
        &self,
        _ctx: &SessionContext,
        root: &str,
    ) -> Result<Vec<StagedObject>> {
        self.ensure_reachable()?;
        let root = root
            .trim()
            .trim_start_matches(STAGE_MARKER)
            .trim_end_matches('/')
            .to_ascii_lowercase();

        Ok(self
            .lock()
            .staged
            .iter()
            .filter(|path| {
                let lower = path.to_ascii_lowercase();
                lower.starts_with(&format!("{root}/"))
            })
            .map(StagedObject::new)
            .collect())
    }

    async fn infer_schema(
        &self,
        _ctx: &SessionContext,
        location: &str,
        file_name: &str,
        _file_format: &str,
    ) -> Result<Vec<InferredColumn>> {
        self.ensure_reachable()?;
        let path = format!(
            "{}/{}",
            location.trim_start_matches(STAGE_MARKER).trim_end_matches('/'),
            file_name
        );

        match self.lock().schemas.get(&path) {
            Some(columns) if columns.is_empty() => Err(Error::schema_empty(file_name)),
            Some(columns) => Ok(columns.clone()),
            None => Err(Error::execution(
                format!("INFER_SCHEMA {path}"),
                "091016",
                format!("Remote file '{path}' was not found."),
            )),
        }
    }
}

/// Identifier at the start of `rest`, up to whitespace or `(`
fn leading_identifier(rest: &str) -> String {
    rest.split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Strip a single-quoted literal back to its value; bare text is returned as is
fn unquote_literal(text: &str) -> String {
    match text.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')) {
        Some(inner) => inner.replace("''", "'"),
        None => text.to_string(),
    }
}

fn status_result(message: String) -> QueryResult {
    QueryResult::new(vec!["status".to_string()], vec![vec![Some(message)]])
}
