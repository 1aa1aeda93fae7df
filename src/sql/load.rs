//! Bulk load statements

use super::stage::quote_literal;
use crate::naming::TableName;

/// Build a `COPY INTO` statement loading one staged file into `table`.
///
/// The source is `staging_prefix` joined to `file_name` with a single `/`, written as a quoted
/// stage path so file names with spaces or quotes survive. The file format is referenced by name
/// only; its delimiter and header handling live in the warehouse.
pub fn copy_into_statement(
    table: &TableName,
    staging_prefix: &str,
    file_name: &str,
    file_format: &str,
) -> String {
    let prefix = staging_prefix.trim_end_matches('/');
    format!(
        "COPY INTO {table}\nFROM {}\nFILE_FORMAT = (FORMAT_NAME = {});",
        quote_literal(&format!("{prefix}/{file_name}")),
        quote_literal(file_format)
    )
}
