//! Name derivation module
//!
//! Maps a staged file path, as reported by a stage listing, onto:
//! - the staging location prefix used as a load source (`@stage/dir`)
//! - the file name (`orders.csv`)
//! - the canonical table name (`ORDERS`)
//!
//! Table names are sanitised into valid unquoted identifiers and reserved words are rejected.

mod deriver;

pub use deriver::{
    derive_names, is_plain_identifier, is_reserved_word, DerivedNames, StagedFileRef, TableName,
    STAGE_MARKER,
};

#[cfg(test)]
mod tests;
