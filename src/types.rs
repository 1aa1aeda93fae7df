//! Common types used throughout stage-ingest
//!
//! This module contains shared type definitions used across multiple modules.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Generated Statements
// ============================================================================

/// Kind of statement generated for a staged file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatementKind {
    /// Table creation
    Ddl,
    /// Bulk load (COPY)
    Load,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementKind::Ddl => write!(f, "DDL"),
            StatementKind::Load => write!(f, "LOAD"),
        }
    }
}

/// A statement produced for one file. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedStatement {
    kind: StatementKind,
    text: String,
}

impl GeneratedStatement {
    /// Create a DDL statement
    pub fn ddl(text: impl Into<String>) -> Self {
        Self {
            kind: StatementKind::Ddl,
            text: text.into(),
        }
    }

    /// Create a load statement
    pub fn load(text: impl Into<String>) -> Self {
        Self {
            kind: StatementKind::Load,
            text: text.into(),
        }
    }

    /// Statement kind
    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    /// Statement text
    pub fn text(&self) -> &str {
        &self.text
    }
}

// ============================================================================
// Backoff Strategy
// ============================================================================

/// Backoff strategy for HTTP retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Same delay every attempt
    Constant,
    /// Delay grows linearly
    Linear,
    /// Delay doubles every attempt
    #[default]
    Exponential,
}
