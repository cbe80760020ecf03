//! Assembles SQL text from a query plan.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::grounding::{ExpressionResolver, FieldInfo, GroundingIndex};
use crate::model::JoinKind;
use crate::planner::QueryPlan;

/// Detects an existing `LIMIT n` clause.
static LIMIT_CLAUSE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bLIMIT\s+\d+\b").unwrap());

/// Errors that can occur while assembling SQL.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("unknown explore `{name}`")]
    UnknownExplore { name: String },

    #[error("view `{view}` is not defined in the project")]
    MissingView { view: String },

    #[error("view `{view}` has no sql_table_name; cannot reference it in FROM or JOIN")]
    MissingTableRef { view: String },

    #[error("explore `{explore}` declares no join for view `{view}`")]
    MissingJoin { explore: String, view: String },

    #[error("join to view `{view}` has no sql_on condition")]
    MissingJoinCondition { view: String },
}

pub type BuildResult<T> = Result<T, BuildError>;

/// Builds a SQL string from a [`QueryPlan`] against one grounding index.
///
/// Each call uses a fresh [`ExpressionResolver`], so alias state never
/// carries over between plans.
pub struct SqlBuilder<'a> {
    index: &'a GroundingIndex,
}

impl<'a> SqlBuilder<'a> {
    pub fn new(index: &'a GroundingIndex) -> Self {
        Self { index }
    }

    /// Assemble the SQL for a plan.
    ///
    /// Prebuilt plans pass through verbatim (trimmed). Rule-based plans are
    /// assembled clause by clause in SELECT / FROM / JOIN / WHERE / GROUP BY
    /// / LIMIT order.
    pub fn build(&self, plan: &QueryPlan) -> BuildResult<String> {
        if let Some(prebuilt) = &plan.prebuilt_sql {
            tracing::debug!(explore = %plan.explore_name, "passing through prebuilt SQL");
            return Ok(prebuilt.trim().to_string());
        }

        let explore = self
            .index
            .explore(&plan.explore_name)
            .ok_or_else(|| BuildError::UnknownExplore {
                name: plan.explore_name.clone(),
            })?;

        let views = self.index.project().all_views();

        let base_view = views
            .get(explore.base_view.as_str())
            .ok_or_else(|| BuildError::MissingView {
                view: explore.base_view.clone(),
            })?;
        let base_table = base_view
            .sql_table_name
            .as_deref()
            .ok_or_else(|| BuildError::MissingTableRef {
                view: explore.base_view.clone(),
            })?;

        let mut resolver = ExpressionResolver::new();

        let base_alias = view_alias(&explore.base_view);
        resolver.set_alias(base_table, &base_alias);

        // Register aliases for every joined view up front so that join
        // conditions can reference either side.
        let mut join_tables: Vec<(String, String, String)> = Vec::new();
        for join_view in &plan.required_joins {
            let view = views
                .get(join_view.as_str())
                .ok_or_else(|| BuildError::MissingView {
                    view: join_view.clone(),
                })?;
            let table = view
                .sql_table_name
                .as_deref()
                .ok_or_else(|| BuildError::MissingTableRef {
                    view: join_view.clone(),
                })?;
            let alias = view_alias(join_view);
            resolver.set_alias(table, &alias);
            join_tables.push((join_view.clone(), table.to_string(), alias));
        }

        let field_mappings = self.build_field_mappings(explore, &views, &resolver);

        // SELECT
        let select_lines: Vec<String> = plan
            .fields
            .iter()
            .map(|field| {
                let expr = self.field_expression(field, &resolver, &field_mappings);
                format!("  {} AS {}", expr, field.name)
            })
            .collect();
        let mut sql = format!("SELECT\n{}", select_lines.join(",\n"));

        // FROM
        sql.push_str(&format!(
            "\nFROM {} AS {}",
            format_table_ref(base_table),
            base_alias
        ));

        // JOIN
        for (join_view, table, alias) in &join_tables {
            let kind = explore
                .join_graph
                .get(join_view)
                .copied()
                .ok_or_else(|| BuildError::MissingJoin {
                    explore: explore.name.clone(),
                    view: join_view.clone(),
                })?;

            match explore.join_conditions.get(join_view) {
                Some(condition) => {
                    let resolved =
                        resolver.resolve(condition, table, join_view, &field_mappings);
                    sql.push_str(&format!(
                        "\n{} JOIN {} AS {} ON {}",
                        kind.sql_keyword(),
                        format_table_ref(table),
                        alias,
                        resolved
                    ));
                }
                None if kind == JoinKind::Cross => {
                    sql.push_str(&format!(
                        "\nCROSS JOIN {} AS {}",
                        format_table_ref(table),
                        alias
                    ));
                }
                None => {
                    return Err(BuildError::MissingJoinCondition {
                        view: join_view.clone(),
                    });
                }
            }
        }

        // WHERE
        if !plan.filters.is_empty() {
            sql.push_str(&format!("\nWHERE {}", plan.filters.join(" AND ")));
        }

        // GROUP BY: positional ordinals of the non-aggregated select items.
        // Emitted whenever the plan aggregates, even with no grouping fields.
        if plan.has_aggregation {
            let ordinals: Vec<String> = plan
                .fields
                .iter()
                .enumerate()
                .filter(|(_, field)| !field.is_measure())
                .map(|(position, _)| (position + 1).to_string())
                .collect();
            sql.push_str(&format!("\nGROUP BY {}", ordinals.join(", ")));
        }

        // LIMIT
        sql.push_str(&format!("\nLIMIT {}", plan.limit));

        tracing::debug!(explore = %plan.explore_name, "built SQL");
        Ok(sql)
    }

    /// Resolved column reference for every available field in the explore,
    /// keyed by qualified name. Used to resolve `${view.field}` references in
    /// join conditions and select expressions.
    fn build_field_mappings(
        &self,
        explore: &crate::grounding::ExploreInfo,
        views: &indexmap::IndexMap<&str, &crate::model::View>,
        resolver: &ExpressionResolver,
    ) -> HashMap<String, String> {
        let empty = HashMap::new();
        let mut mappings = HashMap::new();

        for (qualified, field) in &explore.available_fields {
            let Some(table) = views
                .get(field.view_name.as_str())
                .and_then(|view| view.sql_table_name.as_deref())
            else {
                continue;
            };

            let expression = field
                .sql
                .clone()
                .unwrap_or_else(|| format!("${{TABLE}}.{}", field.name));
            let resolved = resolver.resolve(&expression, table, &field.view_name, &empty);
            mappings.insert(qualified.clone(), resolved);
        }

        mappings
    }

    fn field_expression(
        &self,
        field: &FieldInfo,
        resolver: &ExpressionResolver,
        field_mappings: &HashMap<String, String>,
    ) -> String {
        if let Some(mapped) = field_mappings.get(&field.qualified_name()) {
            return mapped.clone();
        }

        // Field from a view without a physical table; resolve best-effort so
        // the reference at least carries the view alias.
        let expression = field
            .sql
            .clone()
            .unwrap_or_else(|| format!("${{TABLE}}.{}", field.name));
        resolver.resolve(
            &expression,
            &field.view_name,
            &field.view_name,
            field_mappings,
        )
    }
}

/// Deterministic table alias for a view: lowercase, hyphens to underscores.
pub(crate) fn view_alias(view_name: &str) -> String {
    view_name.to_lowercase().replace('-', "_")
}

/// Quote a dot-qualified table reference for BigQuery unless it is already
/// quoted.
pub(crate) fn format_table_ref(table: &str) -> String {
    let trimmed = table.trim();
    if trimmed.contains('.') && !trimmed.starts_with('`') {
        format!("`{}`", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Append a `LIMIT` clause unless the SQL already carries one. Idempotent.
pub fn enforce_limit(sql: &str, default_limit: u32) -> String {
    let trimmed = sql.trim_end();
    if LIMIT_CLAUSE_PATTERN.is_match(trimmed) {
        trimmed.to_string()
    } else {
        format!("{}\nLIMIT {}", trimmed, default_limit)
    }
}
