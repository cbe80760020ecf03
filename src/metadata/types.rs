//! Physical metadata types supplied by a metadata provider.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Metadata for one physical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Metadata for one physical table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub table_name: String,
    pub columns: HashMap<String, ColumnMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<u64>,
}

impl TableMetadata {
    /// Create empty metadata for a table.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: HashMap::new(),
            row_count: None,
        }
    }

    /// Add a column, builder-style. Useful in tests and snapshots.
    pub fn with_column(
        mut self,
        column_name: impl Into<String>,
        data_type: impl Into<String>,
        description: Option<&str>,
    ) -> Self {
        let column_name = column_name.into();
        self.columns.insert(
            column_name.clone(),
            ColumnMetadata {
                table_name: self.table_name.clone(),
                column_name,
                data_type: data_type.into(),
                description: description.map(str::to_string),
            },
        );
        self
    }
}
