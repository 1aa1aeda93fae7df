//! Snowflake SQL API backend
//!
//! Runs statements through the Snowflake SQL API v2:
//!
//! - `POST /api/v2/statements` with the statement and session context in the body
//! - `202 Accepted` responses are polled through `statementStatusUrl` until the statement ends
//! - results spanning several partitions are fetched with `?partition=N`
//!
//! Error mapping:
//! - `400`/`422` - the warehouse rejected the statement (`WarehouseExecution`, per file)
//! - `401`/`403` and transport failures after retries - `Connectivity` (fatal)
//!
//! Reference: https://docs.snowflake.com/en/developer-guide/sql-api/reference

use super::types::{QueryResult, SessionContext};
use super::Warehouse;
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::{Duration, Instant};
use tracing::debug;

/// Statement endpoint, relative to the account URL
pub const STATEMENTS_PATH: &str = "/api/v2/statements";

/// Execution settings for the SQL API
#[derive(Debug, Clone)]
pub struct SnowflakeSettings {
    /// Server-side statement timeout
    pub statement_timeout: Duration,
    /// Delay between polls of a running statement
    pub poll_interval: Duration,
}

impl Default for SnowflakeSettings {
    fn default() -> Self {
        Self {
            statement_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Warehouse backend speaking the Snowflake SQL API
#[derive(Debug)]
pub struct SnowflakeWarehouse {
    http: HttpClient,
    settings: SnowflakeSettings,
}

impl SnowflakeWarehouse {
    /// Create a backend. `http` must carry the account base URL and authentication.
    pub fn new(http: HttpClient, settings: SnowflakeSettings) -> Self {
        Self { http, settings }
    }

    /// Default account URL for an account identifier
    pub fn account_url(account: &str) -> String {
        format!("https://{}.snowflakecomputing.com", account.to_ascii_lowercase())
    }

    /// Request body for one statement
    fn statement_body(&self, ctx: &SessionContext, statement: &str) -> Value {
        let mut body = Map::new();
        body.insert("statement".to_string(), json!(statement));
        body.insert(
            "timeout".to_string(),
            json!(self.settings.statement_timeout.as_secs()),
        );

        for (key, value) in [
            ("role", &ctx.role),
            ("database", &ctx.database),
            ("schema", &ctx.schema),
            ("warehouse", &ctx.warehouse),
        ] {
            if let Some(value) = value {
                body.insert(key.to_string(), json!(value));
            }
        }

        Value::Object(body)
    }

    /// Poll a running statement until it leaves the `202 Accepted` state
    async fn wait_for_completion(
        &self,
        statement: &str,
        mut payload: StatementResponse,
    ) -> Result<StatementResponse> {
        // Allow the server-side timeout plus a margin before giving up locally
        let deadline = Instant::now() + self.settings.statement_timeout + Duration::from_secs(30);

        loop {
            let status_url = payload
                .status_url()
                .ok_or_else(|| Error::connectivity("running statement has no status URL"))?;

            if Instant::now() >= deadline {
                return Err(Error::execution(
                    statement,
                    payload.code.unwrap_or_default(),
                    "statement did not finish before the client deadline",
                ));
            }

            tokio::time::sleep(self.settings.poll_interval).await;
            debug!("Polling statement status at {}", status_url);

            let response = self
                .http
                .get_with_config(&status_url, RequestConfig::new())
                .await
                .map_err(|e| classify_error(statement, e))?;

            let accepted = response.status() == StatusCode::ACCEPTED;
            payload = parse_response(statement, response).await?;
            if !accepted {
                return Ok(payload);
            }
        }
    }

    /// Fetch the rows of every partition after the first
    async fn fetch_remaining_partitions(
        &self,
        statement: &str,
        payload: &StatementResponse,
        rows: &mut Vec<Vec<Option<String>>>,
    ) -> Result<()> {
        let partitions = payload
            .result_set_meta_data
            .as_ref()
            .map_or(0, |meta| meta.partition_info.len());
        if partitions <= 1 {
            return Ok(());
        }

        let handle = payload.statement_handle.as_deref().ok_or_else(|| {
            Error::connectivity("partitioned result has no statement handle")
        })?;

        for partition in 1..partitions {
            let url = format!("{STATEMENTS_PATH}/{handle}");
            let response = self
                .http
                .get_with_config(
                    &url,
                    RequestConfig::new().query("partition", partition.to_string()),
                )
                .await
                .map_err(|e| classify_error(statement, e))?;
            let page = parse_response(statement, response).await?;
            rows.extend(page.data);
        }

        Ok(())
    }
}

#[async_trait]
impl Warehouse for SnowflakeWarehouse {
    async fn execute(&self, ctx: &SessionContext, statement: &str) -> Result<QueryResult> {
        debug!("Executing statement: {}", statement);

        let response = self
            .http
            .post_with_config(
                STATEMENTS_PATH,
                RequestConfig::new().json(self.statement_body(ctx, statement)),
            )
            .await
            .map_err(|e| classify_error(statement, e))?;

        let accepted = response.status() == StatusCode::ACCEPTED;
        let mut payload = parse_response(statement, response).await?;
        if accepted {
            payload = self.wait_for_completion(statement, payload).await?;
        }

        let columns = payload
            .result_set_meta_data
            .as_ref()
            .map(|meta| meta.row_type.iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default();
        let mut rows = std::mem::take(&mut payload.data);
        self.fetch_remaining_partitions(statement, &payload, &mut rows)
            .await?;

        Ok(QueryResult::new(columns, rows))
    }
}

/// Statement response body (success, running, or failure)
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementResponse {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    statement_handle: Option<String>,
    #[serde(default)]
    statement_status_url: Option<String>,
    #[serde(default)]
    result_set_meta_data: Option<ResultSetMetaData>,
    #[serde(default)]
    data: Vec<Vec<Option<String>>>,
}

impl StatementResponse {
    /// Where to poll a running statement
    fn status_url(&self) -> Option<String> {
        self.statement_status_url.clone().or_else(|| {
            self.statement_handle
                .as_ref()
                .map(|handle| format!("{STATEMENTS_PATH}/{handle}"))
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultSetMetaData {
    #[serde(default)]
    row_type: Vec<RowType>,
    #[serde(default)]
    partition_info: Vec<PartitionInfo>,
}

#[derive(Debug, Deserialize)]
struct RowType {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartitionInfo {
    #[serde(default)]
    #[allow(dead_code)]
    row_count: Option<u64>,
}

/// Decode a response body
async fn parse_response(statement: &str, response: Response) -> Result<StatementResponse> {
    let text = response
        .text()
        .await
        .map_err(|e| Error::connectivity(format!("failed to read SQL API response: {e}")))?;
    if text.trim().is_empty() {
        return Ok(StatementResponse::default());
    }

    serde_json::from_str(&text).map_err(|e| {
        Error::execution(
            statement,
            "",
            format!("unexpected SQL API response: {e}"),
        )
    })
}

/// Map a transport error onto the ingestion error taxonomy
fn classify_error(statement: &str, err: Error) -> Error {
    match err {
        Error::HttpStatus { status, body } => {
            let payload: StatementResponse = serde_json::from_str(&body).unwrap_or_default();
            let message = payload.message.unwrap_or(body);
            match status {
                400 | 408 | 422 => {
                    Error::execution(statement, payload.code.unwrap_or_default(), message)
                }
                401 | 403 => {
                    Error::connectivity(format!("authentication rejected ({status}): {message}"))
                }
                _ => Error::connectivity(format!("SQL API returned {status}: {message}")),
            }
        }
        Error::Http(e) => Error::connectivity(e.to_string()),
        e @ (Error::Timeout { .. }
        | Error::RateLimited { .. }
        | Error::MaxRetriesExceeded { .. }) => Error::connectivity(e.to_string()),
        other => other,
    }
}
