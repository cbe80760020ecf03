//! SQL validation collaborators.
//!
//! Validation is a pluggable boundary: the compiler can hand generated SQL
//! to any [`SqlValidator`] before returning it. The bundled
//! [`SyntaxValidator`] runs a parse-only check with no warehouse access; a
//! warehouse-backed dry-run validator plugs in behind the same trait.

use async_trait::async_trait;
use sqlparser::dialect::BigQueryDialect;
use sqlparser::parser::Parser;
use thiserror::Error;

/// Errors from the validation backend itself, as opposed to findings about
/// the SQL under test.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("validation backend error: {0}")]
    Backend(String),
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Broad category of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The SQL text does not parse.
    Syntax,
    /// The SQL references a table or column the backend does not know.
    Reference,
    /// Anything else the backend reported.
    Other,
}

/// Outcome of validating one SQL statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validation {
    pub ok: bool,
    pub kind: Option<FailureKind>,
    pub message: Option<String>,
}

impl Validation {
    pub fn passed() -> Self {
        Validation {
            ok: true,
            kind: None,
            message: None,
        }
    }

    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        Validation {
            ok: false,
            kind: Some(kind),
            message: Some(message.into()),
        }
    }
}

/// External collaborator that judges generated SQL.
#[async_trait]
pub trait SqlValidator: Send + Sync {
    /// Validate one SQL statement. A failed validation is an `Ok` result
    /// carrying the finding; `Err` means the backend itself broke.
    async fn validate(&self, sql: &str) -> ValidationResult<Validation>;
}

/// Parse-only validator using the BigQuery grammar. Catches malformed SQL
/// without any warehouse round trip; it cannot see missing tables or
/// columns.
#[derive(Debug, Default)]
pub struct SyntaxValidator;

impl SyntaxValidator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SqlValidator for SyntaxValidator {
    async fn validate(&self, sql: &str) -> ValidationResult<Validation> {
        match Parser::parse_sql(&BigQueryDialect {}, sql) {
            Ok(statements) if statements.is_empty() => Ok(Validation::failed(
                FailureKind::Syntax,
                "no SQL statement found",
            )),
            Ok(_) => Ok(Validation::passed()),
            Err(err) => {
                let message = err.to_string();
                tracing::warn!(%message, "SQL failed syntax validation");
                Ok(Validation::failed(categorize(&message), message))
            }
        }
    }
}

/// Map a parser or backend message onto a failure category.
fn categorize(message: &str) -> FailureKind {
    let lowered = message.to_lowercase();
    if lowered.contains("unrecognized name")
        || lowered.contains("not found")
        || lowered.contains("does not exist")
    {
        FailureKind::Reference
    } else if lowered.contains("expected") || lowered.contains("syntax") {
        FailureKind::Syntax
    } else {
        FailureKind::Other
    }
}
