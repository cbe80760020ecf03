//! Grounding: merging the semantic model with physical metadata.
//!
//! The [`GroundingIndex`] is the searchable product of a parsed project and
//! one metadata snapshot; the [`ExpressionResolver`] turns the model's macro
//! expressions into physical SQL at compile time.

mod index;
mod resolver;

pub use index::{ExploreInfo, FieldInfo, FieldRole, GroundingIndex, IndexError, IndexResult};
pub use resolver::{extract_column_name, is_simple_column_reference, ExpressionResolver};

pub(crate) use index::bare_table_name;
