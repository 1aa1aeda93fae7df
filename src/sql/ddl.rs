//! Table creation statements

use crate::error::{Error, Result};
use crate::naming::{is_plain_identifier, is_reserved_word, TableName};
use crate::schema::SchemaDescriptor;

/// Quote an identifier when it cannot be used bare.
///
/// Plain, non-reserved identifiers are returned unchanged. Anything else is wrapped in double
/// quotes with embedded quotes doubled.
pub fn quote_identifier(name: &str) -> String {
    if is_plain_identifier(name) && !is_reserved_word(name) {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

/// Build a `CREATE TABLE IF NOT EXISTS` statement for `table`.
///
/// One column per line in schema order. Types are emitted verbatim.
/// Fails with `SchemaEmpty` when the schema has no columns.
pub fn create_table_statement(schema: &SchemaDescriptor, table: &TableName) -> Result<String> {
    if schema.is_empty() {
        return Err(Error::schema_empty(table.as_str()));
    }

    let columns = schema
        .columns()
        .iter()
        .map(|column| format!("    {} {}", quote_identifier(&column.name), column.data_type))
        .collect::<Vec<_>>()
        .join(",\n");

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {table} (\n{columns}\n);"
    ))
}
