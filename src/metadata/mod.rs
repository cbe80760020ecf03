//! Metadata provider module.
//!
//! The grounding index asks a [`MetadataProvider`] for physical column
//! metadata once, at build time. The provider is an external collaborator;
//! the core neither caches nor retries.
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │               MetadataProvider                 │
//! │   load_metadata(table names) -> table map      │
//! └────────────────────────────────────────────────┘
//!          │                          │
//!          ▼                          ▼
//! ┌──────────────────────┐  ┌──────────────────────┐
//! │ StaticMetadataProvider│  │  warehouse client    │
//! │ (JSON snapshot)       │  │  (external)          │
//! └──────────────────────┘  └──────────────────────┘
//! ```

mod provider;
mod snapshot;
mod types;

pub use provider::{MetadataError, MetadataProvider, MetadataResult};
pub use snapshot::StaticMetadataProvider;
pub use types::{ColumnMetadata, TableMetadata};
