//! Error types for stage-ingest
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Errors fall into two propagation classes:
//! - **fatal** (`Error::is_fatal`): session, auth and transport failures. These abort the run.
//! - **per-file**: everything else. The orchestrator marks the offending file failed and continues.

use thiserror::Error;

/// The main error type for stage-ingest
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Undefined variable in template: {variable}")]
    UndefinedVariable { variable: String },

    // ============================================================================
    // Session / Authentication Errors
    // ============================================================================
    #[error("Warehouse connectivity error: {message}")]
    Connectivity { message: String },

    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("JWT generation failed: {message}")]
    JwtGeneration { message: String },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Rate limited, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Max retries ({max_retries}) exceeded")]
    MaxRetriesExceeded { max_retries: u32 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Per-file Ingestion Errors
    // ============================================================================
    #[error("Invalid staged path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    #[error("Invalid table name '{name}': {message}")]
    InvalidTableName { name: String, message: String },

    #[error("Schema inference returned no columns for '{file}'")]
    SchemaEmpty { file: String },

    #[error("Invalid inferred schema: {message}")]
    InvalidSchema { message: String },

    #[error("Warehouse rejected statement ({code}): {message}")]
    WarehouseExecution {
        statement: String,
        code: String,
        message: String,
    },

    #[error("Failed to write artifact '{path}': {message}")]
    ArtifactWrite { path: String, message: String },

    #[error("Processing '{file}' timed out after {timeout_ms}ms")]
    FileTimeout { file: String, timeout_ms: u64 },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an undefined variable error
    pub fn undefined_var(variable: impl Into<String>) -> Self {
        Self::UndefinedVariable {
            variable: variable.into(),
        }
    }

    /// Create a connectivity error
    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::Connectivity {
            message: message.into(),
        }
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid table name error
    pub fn invalid_table_name(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidTableName {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an empty schema error
    pub fn schema_empty(file: impl Into<String>) -> Self {
        Self::SchemaEmpty { file: file.into() }
    }

    /// Create an invalid schema error
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            message: message.into(),
        }
    }

    /// Create a warehouse execution error
    pub fn execution(
        statement: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::WarehouseExecution {
            statement: statement.into(),
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create an artifact write error
    pub fn artifact(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ArtifactWrite {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether this error must abort the whole run instead of a single file
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Connectivity { .. } | Error::Auth { .. } | Error::JwtGeneration { .. }
        )
    }

    /// Check if a failed request is worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_connect() || e.is_timeout(),
            Error::RateLimited { .. } | Error::Timeout { .. } => true,
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(
        status,
        429 | 500 | 502 | 503 | 504 | 520 | 521 | 522 | 523 | 524
    )
}

/// Result type alias for stage-ingest
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }
}
