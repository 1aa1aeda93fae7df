//! Inferred schema module
//!
//! Holds the column schema the warehouse inferred for one staged file.
//!
//! Column types are opaque strings taken verbatim from the warehouse. Nothing here maps
//! them onto a local type enumeration: the warehouse vocabulary is authoritative.

mod types;

pub use types::{ColumnDef, SchemaDescriptor};

#[cfg(test)]
mod tests;
