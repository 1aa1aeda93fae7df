//! Warehouse collaborator types

use crate::schema::ColumnDef;
use serde::{Deserialize, Serialize};

/// Role, database, schema and compute selection applied to every statement.
///
/// Passed by reference into each collaborator call instead of living in global session state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    /// Role to assume
    #[serde(default)]
    pub role: Option<String>,
    /// Default database
    #[serde(default)]
    pub database: Option<String>,
    /// Default schema
    #[serde(default)]
    pub schema: Option<String>,
    /// Virtual warehouse (compute) to run on
    #[serde(default)]
    pub warehouse: Option<String>,
}

impl SessionContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the role
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Set the database
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the schema
    #[must_use]
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Set the compute warehouse
    #[must_use]
    pub fn with_warehouse(mut self, warehouse: impl Into<String>) -> Self {
        self.warehouse = Some(warehouse.into());
        self
    }
}

/// One object found under a stage root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedObject {
    /// Path as reported by the listing, e.g. `my_stage/2024/orders.csv`
    pub path: String,
    /// Size in bytes, when reported
    pub size: Option<u64>,
    /// Last modification time, when reported
    pub last_modified: Option<String>,
}

impl StagedObject {
    /// Create an object with only a path
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            size: None,
            last_modified: None,
        }
    }
}

/// One column reported by schema inference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredColumn {
    /// Column name
    pub name: String,
    /// Warehouse type string
    pub data_type: String,
    /// Nullability, when reported
    pub nullable: Option<bool>,
}

impl InferredColumn {
    /// Create a column with unknown nullability
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: None,
        }
    }
}

impl From<InferredColumn> for ColumnDef {
    fn from(column: InferredColumn) -> Self {
        ColumnDef::new(column.name, column.data_type)
    }
}

/// Rows returned by a statement. Every value is kept as the warehouse's string rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    /// Column names in result order
    pub columns: Vec<String>,
    /// Row values, `None` for SQL NULL
    pub rows: Vec<Vec<Option<String>>>,
}

impl QueryResult {
    /// Create a result from columns and rows
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    /// Index of a column, matched case-insensitively
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    /// Value of `column` in row `row`
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)?.as_deref()
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Whether the result has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
