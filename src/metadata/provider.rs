//! MetadataProvider trait definition.
//!
//! Abstracts over sources of physical column metadata. The core treats
//! `load_metadata` as a pure function of the requested table set; caching and
//! retries belong to the provider, not to the pipeline.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;

use super::types::TableMetadata;

/// Errors that can occur while fetching metadata.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("metadata snapshot not found: {0}")]
    SnapshotNotFound(std::path::PathBuf),

    #[error("failed to read metadata snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode metadata snapshot: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("metadata backend error: {0}")]
    Backend(String),
}

pub type MetadataResult<T> = Result<T, MetadataError>;

/// Trait for fetching physical table metadata.
///
/// Implementations answer for the requested table names only; tables the
/// provider does not know are simply absent from the result map.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Load metadata for the given set of bare table names.
    async fn load_metadata(
        &self,
        table_names: &BTreeSet<String>,
    ) -> MetadataResult<HashMap<String, TableMetadata>>;
}
