// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # stage-ingest
//!
//! Provisions warehouse tables from staged CSV files and bulk-loads them, without hand-written
//! schemas.
//!
//! ## Features
//!
//! - **Schema-driven DDL**: the warehouse infers each file's columns, we emit an idempotent
//!   `CREATE TABLE IF NOT EXISTS`
//! - **Bulk load**: `COPY INTO` through a named file format
//! - **Failure isolation**: one bad file never blocks the rest of the batch
//! - **Audit artifacts**: every file's statements are written to `<TABLE>.sql`
//! - **Snowflake SQL API**: OAuth, programmatic access token and key-pair JWT auth
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stage_ingest::ingest::{IngestOptions, Orchestrator};
//! use stage_ingest::warehouse::{MemoryWarehouse, Session, SessionContext};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> stage_ingest::Result<()> {
//!     let warehouse = Arc::new(
//!         MemoryWarehouse::new().with_file("my_stage/orders.csv", &[("ID", "NUMBER")]),
//!     );
//!     let session = Session::open(warehouse, SessionContext::new()).await?;
//!
//!     let summary = Orchestrator::new(IngestOptions::default()).run(&session).await?;
//!     println!("{} succeeded, {} failed", summary.succeeded(), summary.failed());
//!
//!     session.close();
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Orchestrator                            │
//! │  list → derive names → infer → DDL → load → artifact → execute  │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │  Naming  │    SQL    │   Artifact    │ Warehouse │    HTTP     │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Prefix   │ CREATE    │ <TABLE>.sql   │ Session   │ Retry       │
//! │ File     │ COPY INTO │ Atomic rename │ SQL API   │ Rate Limit  │
//! │ Table    │ LIST      │               │ In-memory │ Auth        │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)] // TODO: document error variant fields before 1.0

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Inferred column schemas
pub mod schema;

/// Staged path to table name derivation
pub mod naming;

/// SQL statement generation
pub mod sql;

/// Audit artifact persistence
pub mod artifact;

/// Authentication for the SQL API
pub mod auth;

/// HTTP client with retry and rate limiting
pub mod http;

/// Warehouse collaborator and session
pub mod warehouse;

/// Ingestion orchestration
pub mod ingest;

/// Run configuration
pub mod config;

/// Template interpolation
pub mod template;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::IngestConfig;
pub use ingest::{IngestOptions, Orchestrator, RunSummary};
pub use warehouse::{Session, SessionContext, Warehouse};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
