//! Snapshot-backed metadata provider.
//!
//! Serves column metadata from an in-memory table map, typically loaded from
//! a JSON snapshot file exported from the warehouse's information schema.
//! This is the provider used by the CLI and by tests; a live warehouse
//! client would implement [`MetadataProvider`] the same way.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use async_trait::async_trait;

use super::provider::{MetadataError, MetadataProvider, MetadataResult};
use super::types::TableMetadata;

/// A metadata provider backed by a static snapshot.
#[derive(Debug, Clone, Default)]
pub struct StaticMetadataProvider {
    tables: HashMap<String, TableMetadata>,
}

impl StaticMetadataProvider {
    /// Build a provider from an in-memory table map.
    pub fn new(tables: HashMap<String, TableMetadata>) -> Self {
        Self { tables }
    }

    /// Build a provider from a list of tables, keyed by table name.
    pub fn from_tables(tables: impl IntoIterator<Item = TableMetadata>) -> Self {
        Self {
            tables: tables
                .into_iter()
                .map(|t| (t.table_name.clone(), t))
                .collect(),
        }
    }

    /// Load a snapshot from a JSON file containing `{table_name: TableMetadata}`.
    pub fn from_json_file(path: &Path) -> MetadataResult<Self> {
        if !path.exists() {
            return Err(MetadataError::SnapshotNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let tables: HashMap<String, TableMetadata> = serde_json::from_str(&content)?;
        tracing::info!(path = %path.display(), tables = tables.len(), "loaded metadata snapshot");
        Ok(Self { tables })
    }

    /// Number of tables in the snapshot.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// True when the snapshot holds no tables.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[async_trait]
impl MetadataProvider for StaticMetadataProvider {
    async fn load_metadata(
        &self,
        table_names: &BTreeSet<String>,
    ) -> MetadataResult<HashMap<String, TableMetadata>> {
        let found: HashMap<String, TableMetadata> = table_names
            .iter()
            .filter_map(|name| self.tables.get(name).map(|t| (name.clone(), t.clone())))
            .collect();

        let missing = table_names.len() - found.len();
        if missing > 0 {
            tracing::debug!(requested = table_names.len(), missing, "snapshot missing some tables");
        }

        Ok(found)
    }
}
