//! Stage listing and schema inference queries

use crate::naming::STAGE_MARKER;

/// Quote a string literal, doubling embedded single quotes
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// `LIST` every object under a stage root
pub fn list_statement(root: &str) -> String {
    let root = root.trim().trim_end_matches('/');
    if root.starts_with(STAGE_MARKER) {
        format!("LIST {root}")
    } else {
        format!("LIST {STAGE_MARKER}{root}")
    }
}

/// Query inferring the column schema of a single staged file
pub fn infer_schema_statement(location: &str, file_name: &str, file_format: &str) -> String {
    let location = format!("{}/", location.trim_end_matches('/'));
    format!(
        "SELECT *\nFROM TABLE(\n    INFER_SCHEMA(\n        LOCATION => {},\n        FILES => {},\n        FILE_FORMAT => {}\n    )\n)",
        quote_literal(&location),
        quote_literal(file_name),
        quote_literal(file_format)
    )
}
