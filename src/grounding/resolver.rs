//! Resolves semantic-model macro expressions into physical SQL.
//!
//! Macro expressions carry two placeholder forms: `${TABLE}` for the owning
//! view's physical table, and `${view.field}` / `${field}` for field
//! references. Resolution is best-effort: an unresolved field reference is
//! left in place with a warning, so callers can surface degraded SQL instead
//! of failing.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Pattern for the table placeholder `${TABLE}`.
static TABLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{TABLE\}").unwrap());

/// Pattern for field references `${view.field}` or `${field}`.
static FIELD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{(?:([^.}]+)\.)?([^}]+)\}").unwrap());

/// Pattern for a bare `${TABLE}.column` reference with no surrounding SQL.
static SIMPLE_COLUMN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$\{TABLE\}\.\w+$").unwrap());

/// True when the expression is a plain `${TABLE}.column` reference.
pub fn is_simple_column_reference(expression: &str) -> bool {
    SIMPLE_COLUMN_PATTERN.is_match(expression.trim())
}

/// Extract the bare column name from a simple `${TABLE}.column` expression.
pub fn extract_column_name(expression: &str) -> Option<&str> {
    let trimmed = expression.trim();
    if is_simple_column_reference(trimmed) {
        trimmed.split_once('.').map(|(_, column)| column)
    } else {
        None
    }
}

/// Resolves macro expressions against registered table aliases and field
/// mappings.
///
/// Alias state is scoped to one compilation: the compiler uses a fresh
/// resolver per compile call, so aliases never leak across requests.
#[derive(Debug, Default)]
pub struct ExpressionResolver {
    table_aliases: HashMap<String, String>,
}

impl ExpressionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an alias for a physical table.
    pub fn set_alias(&mut self, table_name: impl Into<String>, alias: impl Into<String>) {
        self.table_aliases.insert(table_name.into(), alias.into());
    }

    /// Drop all registered aliases.
    pub fn clear_aliases(&mut self) {
        self.table_aliases.clear();
    }

    /// Resolve a macro expression into physical SQL.
    ///
    /// `${TABLE}` becomes the registered alias for `table_name` (or the raw
    /// table name when none is registered). Field references are looked up
    /// in `field_mappings`, first by `view.field`, then by bare `field`,
    /// defaulting the view to `view_name`. Unresolved references stay in the
    /// output unchanged.
    pub fn resolve(
        &self,
        expression: &str,
        table_name: &str,
        view_name: &str,
        field_mappings: &HashMap<String, String>,
    ) -> String {
        if expression.is_empty() {
            return String::new();
        }

        let table_ref = self
            .table_aliases
            .get(table_name)
            .map(String::as_str)
            .unwrap_or(table_name);

        let resolved = TABLE_PATTERN.replace_all(expression, regex::NoExpand(table_ref));

        let resolved = FIELD_PATTERN.replace_all(&resolved, |caps: &Captures| {
            let view = caps.get(1).map(|m| m.as_str()).unwrap_or(view_name);
            let field = &caps[2];
            let qualified = format!("{}.{}", view, field);

            if let Some(mapped) = field_mappings.get(&qualified) {
                mapped.clone()
            } else if let Some(mapped) = field_mappings.get(field) {
                mapped.clone()
            } else {
                tracing::warn!(reference = %&caps[0], "could not resolve field reference");
                caps[0].to_string()
            }
        });

        tracing::debug!(from = expression, to = %resolved, "resolved expression");
        resolved.into_owned()
    }

    /// Extract all qualified field references from an expression.
    ///
    /// References without an explicit view come back bare. The table
    /// placeholder is not a field reference and is excluded.
    pub fn referenced_fields(&self, expression: &str) -> BTreeSet<String> {
        let mut references = BTreeSet::new();
        for caps in FIELD_PATTERN.captures_iter(expression) {
            match (caps.get(1), caps.get(2)) {
                (Some(view), Some(field)) => {
                    references.insert(format!("{}.{}", view.as_str(), field.as_str()));
                }
                (None, Some(field)) if field.as_str() != "TABLE" => {
                    references.insert(field.as_str().to_string());
                }
                _ => {}
            }
        }
        references
    }
}
