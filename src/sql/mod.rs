//! SQL generation.
//!
//! [`SqlBuilder`] turns a query plan into BigQuery SQL text, and
//! [`enforce_limit`] guarantees a row cap on anything handed outward.

mod builder;

pub use builder::{enforce_limit, BuildError, BuildResult, SqlBuilder};
