//! # GroundSQL
//!
//! A semantic-model grounding layer that compiles natural-ish requests to
//! BigQuery SQL.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │          Model Repository (.model.lkml / .view.lkml)     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [lookml parser]
//! ┌─────────────────────────────────────────────────────────┐
//! │              Project (views, explores, joins)            │
//! └─────────────────────────────────────────────────────────┘
//!                          │        ┌────────────────────┐
//!                          ▼        │  MetadataProvider  │
//! ┌─────────────────────────────────┴───────────────────────┐
//! │       GroundingIndex (fields, join graph, glossary)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [planner]
//! ┌─────────────────────────────────────────────────────────┐
//! │     QueryPlan (explore, fields, joins, filters, limit)   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [sql builder + limit guard]
//! ┌─────────────────────────────────────────────────────────┐
//! │                    BigQuery SQL                          │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod compile;
pub mod config;
pub mod grounding;
pub mod lookml;
pub mod metadata;
pub mod model;
pub mod planner;
pub mod sql;
pub mod validation;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::compile::{
        compile_and_validate, compile_plan, compile_request, CompileError, CompileOptions,
        CompileOutput,
    };
    pub use crate::config::Settings;
    pub use crate::grounding::{ExpressionResolver, FieldInfo, FieldRole, GroundingIndex};
    pub use crate::lookml::parse_project;
    pub use crate::metadata::{MetadataProvider, StaticMetadataProvider, TableMetadata};
    pub use crate::model::{Explore, Model, Project, View};
    pub use crate::planner::{QueryPlan, QueryPlanner};
    pub use crate::sql::{enforce_limit, SqlBuilder};
    pub use crate::validation::{SqlValidator, SyntaxValidator, Validation};
}
