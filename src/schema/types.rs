//! Schema types

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One inferred column: a name and the warehouse's type string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name as reported by inference
    pub name: String,
    /// Warehouse type, e.g. `NUMBER(38, 0)` or `TEXT`
    pub data_type: String,
}

impl ColumnDef {
    /// Create a new column definition
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Ordered column schema of a single staged file.
///
/// Order is the warehouse-reported inference order. Column names are non-empty and unique.
/// A descriptor may hold zero columns; rejecting that is left to DDL generation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    columns: Vec<ColumnDef>,
}

impl SchemaDescriptor {
    /// Build a descriptor, validating column names
    pub fn new(columns: Vec<ColumnDef>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        for (position, column) in columns.iter().enumerate() {
            if column.name.trim().is_empty() {
                return Err(Error::invalid_schema(format!(
                    "column at position {} has an empty name",
                    position + 1
                )));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(Error::invalid_schema(format!(
                    "duplicate column name '{}'",
                    column.name
                )));
            }
        }
        Ok(Self { columns })
    }

    /// Build a descriptor from `(name, type)` pairs
    pub fn from_pairs<N, T>(pairs: impl IntoIterator<Item = (N, T)>) -> Result<Self>
    where
        N: Into<String>,
        T: Into<String>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(name, data_type)| ColumnDef::new(name, data_type))
                .collect(),
        )
    }

    /// Columns in inference order
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether inference produced no columns
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}
