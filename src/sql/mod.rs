//! SQL statement generation
//!
//! Pure string assembly for every statement the pipeline issues. Nothing here executes SQL.
//!
//! - `create_table_statement` - idempotent `CREATE TABLE IF NOT EXISTS` from an inferred schema
//! - `copy_into_statement` - bulk load of one staged file through a named file format
//! - `list_statement` / `infer_schema_statement` - queries the warehouse collaborator runs

mod ddl;
mod load;
mod stage;

pub use ddl::{create_table_statement, quote_identifier};
pub use load::copy_into_statement;
pub use stage::{infer_schema_statement, list_statement, quote_literal};
