//! Staged path to table name derivation

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Marker prepended to a staging prefix so it can be used directly as a load source
pub const STAGE_MARKER: char = '@';

/// Regex for identifiers that need no quoting
static PLAIN_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").expect("valid identifier regex"));

/// Reserved keywords that cannot be used as unquoted table names
const RESERVED_WORDS: &[&str] = &[
    "ALL", "ALTER", "AND", "ANY", "AS", "BETWEEN", "BY", "CASE", "CAST", "CHECK", "COLUMN",
    "CONNECT", "CONSTRAINT", "CREATE", "CROSS", "CURRENT", "CURRENT_DATE", "CURRENT_TIME",
    "CURRENT_TIMESTAMP", "CURRENT_USER", "DELETE", "DISTINCT", "DROP", "ELSE", "EXISTS", "FALSE",
    "FOLLOWING", "FOR", "FROM", "FULL", "GRANT", "GROUP", "HAVING", "ILIKE", "IN", "INCREMENT",
    "INNER", "INSERT", "INTERSECT", "INTO", "IS", "JOIN", "LATERAL", "LEFT", "LIKE", "LOCALTIME",
    "LOCALTIMESTAMP", "MINUS", "NATURAL", "NOT", "NULL", "OF", "ON", "OR", "ORDER", "QUALIFY",
    "REGEXP", "REVOKE", "RIGHT", "RLIKE", "ROW", "ROWS", "SAMPLE", "SELECT", "SET", "SOME",
    "START", "TABLE", "TABLESAMPLE", "THEN", "TO", "TRIGGER", "TRUE", "TRY_CAST", "UNION",
    "UNIQUE", "UPDATE", "USING", "VALUES", "WHEN", "WHENEVER", "WHERE", "WITH",
];

/// Whether `name` can be used without double quotes
pub fn is_plain_identifier(name: &str) -> bool {
    PLAIN_IDENTIFIER.is_match(name)
}

/// Whether `name` is a reserved keyword (case-insensitive)
pub fn is_reserved_word(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    RESERVED_WORDS.contains(&upper.as_str())
}

/// Where a staged file lives: a stage-marked prefix plus the file name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedFileRef {
    prefix: String,
    file_name: String,
}

impl StagedFileRef {
    /// Staging prefix including the stage marker, e.g. `@my_stage/2024`
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Final path segment, e.g. `orders.csv`
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Full load-source location: prefix and file name joined by `/`
    pub fn location(&self) -> String {
        format!("{}/{}", self.prefix, self.file_name)
    }
}

impl fmt::Display for StagedFileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.prefix, self.file_name)
    }
}

/// Canonical upper-cased table name, always a valid unquoted identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableName(String);

impl TableName {
    /// Sanitise a raw base name into a table name.
    ///
    /// Upper-cases, replaces characters outside `[A-Z0-9_$]` with `_`, and prefixes `_` when
    /// the result would start with a digit or `$`. Reserved words are rejected.
    pub fn sanitize(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(Error::invalid_table_name(raw, "table name is empty"));
        }

        let mut name: String = raw
            .chars()
            .map(|c| {
                let c = c.to_ascii_uppercase();
                if c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_' || c == '$' {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        if name.starts_with(|c: char| c.is_ascii_digit() || c == '$') {
            name.insert(0, '_');
        }

        if is_reserved_word(&name) {
            return Err(Error::invalid_table_name(
                name,
                "reserved word cannot be used as a table name",
            ));
        }

        debug_assert!(is_plain_identifier(&name));
        Ok(Self(name))
    }

    /// Table name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TableName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for TableName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Everything derived from one staged path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedNames {
    /// Location of the staged file
    pub staged: StagedFileRef,
    /// Target table
    pub table: TableName,
}

/// Derive the staging prefix, file name and table name from a staged path.
///
/// `my_stage/2024/orders.csv` gives `@my_stage/2024`, `orders.csv` and `ORDERS`.
/// The table name is the part of the file name before its first `.`, so
/// `daily.sales.csv` gives `DAILY`.
pub fn derive_names(path: &str) -> Result<DerivedNames> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_path(path, "path is empty"));
    }

    let unmarked = trimmed.trim_start_matches(STAGE_MARKER);
    let Some((dir, file_name)) = unmarked.rsplit_once('/') else {
        return Err(Error::invalid_path(
            path,
            "path has no stage prefix before the file name",
        ));
    };

    if dir.is_empty() {
        return Err(Error::invalid_path(path, "stage prefix is empty"));
    }
    if file_name.is_empty() {
        return Err(Error::invalid_path(path, "path does not name a file"));
    }

    let base = file_name.split('.').next().unwrap_or_default();
    if base.is_empty() {
        return Err(Error::invalid_path(path, "derived table name is empty"));
    }

    let table = TableName::sanitize(base)?;

    Ok(DerivedNames {
        staged: StagedFileRef {
            prefix: format!("{STAGE_MARKER}{dir}"),
            file_name: file_name.to_string(),
        },
        table,
    })
}
