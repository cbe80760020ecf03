//! End-to-end compilation facade.
//!
//! Ties the pipeline together: request text goes through the planner, the
//! SQL builder, the limit guard, and optionally a validator.
//!
//! ```text
//! request ──> QueryPlanner ──> QueryPlan ──> SqlBuilder ──> enforce_limit ──> SQL
//!                                                                │
//!                                                          SqlValidator (optional)
//! ```

use thiserror::Error;

use crate::grounding::GroundingIndex;
use crate::planner::{PlanError, QueryPlan, QueryPlanner, DEFAULT_MAX_JOINS};
use crate::sql::{enforce_limit, BuildError, SqlBuilder};
use crate::validation::{SqlValidator, Validation, ValidationError};

/// Default row limit when neither the request nor the caller names one.
pub const DEFAULT_LIMIT: u32 = 100;

/// Errors from any pipeline stage.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Knobs for one compilation.
#[derive(Debug, Clone, Copy)]
pub struct CompileOptions {
    /// Row limit applied when the request names none.
    pub default_limit: u32,
    /// Cap on joined views per query.
    pub max_joins: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_joins: DEFAULT_MAX_JOINS,
        }
    }
}

impl CompileOptions {
    pub fn with_default_limit(mut self, limit: u32) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn with_max_joins(mut self, max_joins: usize) -> Self {
        self.max_joins = max_joins;
        self
    }
}

/// What a compilation produced.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// Final SQL, limit-guarded.
    pub sql: String,
    /// The plan the SQL was built from.
    pub plan: QueryPlan,
    /// Validator finding, when a validator ran.
    pub validation: Option<Validation>,
}

/// Compile request text into SQL.
pub fn compile_request(
    index: &GroundingIndex,
    request: &str,
    options: CompileOptions,
) -> CompileResult<CompileOutput> {
    let planner = QueryPlanner::new(index).with_max_joins(options.max_joins);
    let plan = planner.plan(request, options.default_limit)?;
    compile_plan(index, plan, options)
}

/// Compile an already-constructed plan into SQL.
///
/// This is the entry point for externally produced plans, including
/// [`QueryPlan::prebuilt`] passthroughs; the limit guard still applies.
pub fn compile_plan(
    index: &GroundingIndex,
    plan: QueryPlan,
    options: CompileOptions,
) -> CompileResult<CompileOutput> {
    let sql = SqlBuilder::new(index).build(&plan)?;
    let sql = enforce_limit(&sql, options.default_limit);
    Ok(CompileOutput {
        sql,
        plan,
        validation: None,
    })
}

/// Compile request text and run the result past a validator.
pub async fn compile_and_validate(
    index: &GroundingIndex,
    request: &str,
    options: CompileOptions,
    validator: &dyn SqlValidator,
) -> CompileResult<CompileOutput> {
    let mut output = compile_request(index, request, options)?;
    let validation = validator.validate(&output.sql).await?;
    if !validation.ok {
        tracing::warn!(message = ?validation.message, "generated SQL failed validation");
    }
    output.validation = Some(validation);
    Ok(output)
}
