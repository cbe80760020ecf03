//! Rule-based query planner.
//!
//! Converts a tokenized request into a [`QueryPlan`]: chosen explore,
//! selected fields, required joins, filters, and limit. The pipeline runs in
//! strict stage order with no backtracking; ambiguity is resolved by scoring
//! and deterministic fallbacks, so the only failures are an empty index or
//! an explore with no usable fields.
//!
//! An external planner (e.g. an LLM-driven one) can bypass these stages by
//! constructing a plan via [`QueryPlan::prebuilt`], which the SQL builder
//! passes through unchanged.

use std::sync::LazyLock;

use indexmap::IndexSet;
use regex::Regex;
use thiserror::Error;

use crate::grounding::{FieldInfo, GroundingIndex};

/// Word tokens considered for scoring.
static TERM_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[a-zA-Z_]\w*\b").unwrap());

/// Limit spellings, checked in priority order.
static LIMIT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"\blimit\s+(\d+)").unwrap(),
        Regex::new(r"\btop\s+(\d+)").unwrap(),
        Regex::new(r"\bfirst\s+(\d+)").unwrap(),
    ]
});

static LAST_DAYS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"last\s+(\d+)\s+days?").unwrap());
static LAST_MONTHS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"last\s+(\d+)\s+months?").unwrap());
static THIS_YEAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"this\s+year").unwrap());
static THIS_MONTH_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"this\s+month").unwrap());

/// Request words that never name fields.
const STOP_WORDS: &[&str] = &[
    "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "from", "up",
    "about", "into", "over", "after", "what", "when", "where", "how", "show", "get", "find",
    "list", "give", "me", "i", "want", "need", "can", "you", "please",
];

/// Hard cap on selected fields per plan.
const MAX_SELECTED_FIELDS: usize = 10;

/// Number of fields picked when nothing scores.
const FALLBACK_FIELD_COUNT: usize = 5;

/// Default cap on joined views per plan.
pub const DEFAULT_MAX_JOINS: usize = 10;

// ============================================================================
// Plan Types
// ============================================================================

/// The intermediate structure consumed by the SQL builder.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    /// Namespaced explore name (`model.explore`).
    pub explore_name: String,
    /// Selected fields, highest-scoring first.
    pub fields: Vec<FieldInfo>,
    /// Joined views required by the selected fields, in the explore's
    /// declared join order.
    pub required_joins: IndexSet<String>,
    /// Filter expressions, AND-joined by the builder.
    pub filters: Vec<String>,
    /// Row limit.
    pub limit: u32,
    /// True when any selected field is a measure.
    pub has_aggregation: bool,
    /// Escape hatch: SQL already produced by an external planner. When set,
    /// the builder returns it verbatim instead of assembling clauses.
    pub prebuilt_sql: Option<String>,
}

impl QueryPlan {
    /// Wrap SQL produced by an external planner.
    pub fn prebuilt(explore_name: impl Into<String>, sql: impl Into<String>) -> Self {
        QueryPlan {
            explore_name: explore_name.into(),
            fields: Vec::new(),
            required_joins: IndexSet::new(),
            filters: Vec::new(),
            limit: 0,
            has_aggregation: false,
            prebuilt_sql: Some(sql.into()),
        }
    }
}

/// Planning failures. Reported to the caller; the planner never retries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("no explores available in the grounding index")]
    NoExplores,

    #[error("no fields could be selected for explore `{explore}`")]
    NoFields { explore: String },
}

pub type PlanResult<T> = Result<T, PlanError>;

// ============================================================================
// Planner
// ============================================================================

/// Plans SQL generation from a tokenized request.
pub struct QueryPlanner<'a> {
    index: &'a GroundingIndex,
    max_joins: usize,
}

impl<'a> QueryPlanner<'a> {
    pub fn new(index: &'a GroundingIndex) -> Self {
        Self {
            index,
            max_joins: DEFAULT_MAX_JOINS,
        }
    }

    /// Set the cap on joined views per plan.
    pub fn with_max_joins(mut self, max_joins: usize) -> Self {
        self.max_joins = max_joins;
        self
    }

    /// Plan a query from request text.
    pub fn plan(&self, request: &str, default_limit: u32) -> PlanResult<QueryPlan> {
        tracing::info!(request, "planning query");

        let terms = extract_terms(request);
        let limit = extract_limit(request).unwrap_or(default_limit);

        let explore_name = self.select_explore(&terms)?;
        tracing::info!(explore = %explore_name, "selected explore");

        let fields = self.select_fields(&explore_name, &terms)?;
        tracing::info!(fields = fields.len(), "selected fields");

        let required_joins = self.required_joins(&explore_name, &fields);
        let has_aggregation = fields.iter().any(FieldInfo::is_measure);
        let filters = extract_filters(request, &fields);

        Ok(QueryPlan {
            explore_name,
            fields,
            required_joins,
            filters,
            limit,
            has_aggregation,
            prebuilt_sql: None,
        })
    }

    /// Pick the best-scoring explore, falling back to the first one in the
    /// index when nothing scores.
    fn select_explore(&self, terms: &[String]) -> PlanResult<String> {
        let scored = self.index.find_relevant_explores(terms);
        if let Some((name, _)) = scored.first() {
            return Ok(name.clone());
        }

        self.index
            .explores()
            .keys()
            .next()
            .cloned()
            .ok_or(PlanError::NoExplores)
    }

    fn select_fields(&self, explore_name: &str, terms: &[String]) -> PlanResult<Vec<FieldInfo>> {
        let scored = self.index.find_relevant_fields(explore_name, terms);

        // Keep only meaningful matches; the list arrives sorted descending,
        // so truncation drops the lowest-scoring overflow.
        let mut selected: Vec<FieldInfo> = scored
            .into_iter()
            .filter(|(_, score)| *score >= 1.0)
            .map(|(field, _)| field)
            .collect();

        if selected.is_empty() {
            if let Some(info) = self.index.explore(explore_name) {
                selected = info
                    .available_fields
                    .values()
                    .filter(|f| !f.hidden)
                    .take(FALLBACK_FIELD_COUNT)
                    .cloned()
                    .collect();
            }
        }

        selected.truncate(MAX_SELECTED_FIELDS);

        // Aggregating without a grouping key produces a single-row query the
        // caller rarely wants; guarantee at least one dimension.
        let has_measure = selected.iter().any(FieldInfo::is_measure);
        let has_dimension = selected.iter().any(|f| !f.is_measure());
        if has_measure && !has_dimension {
            if let Some(info) = self.index.explore(explore_name) {
                let grouping = info
                    .available_fields
                    .values()
                    .find(|f| !f.is_measure() && !f.hidden)
                    .cloned();
                if let Some(dimension) = grouping {
                    if selected.len() == MAX_SELECTED_FIELDS {
                        selected.pop();
                    }
                    selected.push(dimension);
                }
            }
        }

        if selected.is_empty() {
            return Err(PlanError::NoFields {
                explore: explore_name.to_string(),
            });
        }

        Ok(selected)
    }

    /// Views that must be joined for the selected fields, in the explore's
    /// declared join order, truncated at `max_joins`.
    fn required_joins(&self, explore_name: &str, fields: &[FieldInfo]) -> IndexSet<String> {
        let Some(info) = self.index.explore(explore_name) else {
            return IndexSet::new();
        };

        let needed: IndexSet<&str> = fields
            .iter()
            .map(|f| f.view_name.as_str())
            .filter(|view| *view != info.base_view)
            .collect();

        let mut required: IndexSet<String> = info
            .join_graph
            .keys()
            .filter(|view| needed.contains(view.as_str()))
            .cloned()
            .collect();

        if required.len() > self.max_joins {
            tracing::warn!(
                required = required.len(),
                max_joins = self.max_joins,
                "too many joins required, truncating"
            );
            required.truncate(self.max_joins);
        }

        required
    }
}

// ============================================================================
// Request Text Extraction
// ============================================================================

/// Lowercase word tokens, stopword-filtered, length > 2.
fn extract_terms(request: &str) -> Vec<String> {
    let lowered = request.to_lowercase();
    let terms: Vec<String> = TERM_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .filter(|term| term.len() > 2 && !STOP_WORDS.contains(&term.as_str()))
        .collect();
    tracing::debug!(?terms, "extracted terms");
    terms
}

/// First limit spelling that matches, in `limit`/`top`/`first` priority.
fn extract_limit(request: &str) -> Option<u32> {
    let lowered = request.to_lowercase();
    for pattern in LIMIT_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(&lowered) {
            if let Ok(limit) = caps[1].parse() {
                return Some(limit);
            }
        }
    }
    None
}

/// At most one relative-time filter, templated against the first temporal
/// selected field. No temporal field selected means no filter.
fn extract_filters(request: &str, fields: &[FieldInfo]) -> Vec<String> {
    let Some(time_field) = fields.iter().find(|f| f.is_temporal()) else {
        return Vec::new();
    };

    let target = format!("{}.{}", time_field.view_name, time_field.name);
    let lowered = request.to_lowercase();

    let filter = if let Some(caps) = LAST_DAYS_PATTERN.captures(&lowered) {
        Some(format!(
            "DATE_DIFF(CURRENT_DATE(), DATE({}), DAY) <= {}",
            target, &caps[1]
        ))
    } else if let Some(caps) = LAST_MONTHS_PATTERN.captures(&lowered) {
        Some(format!(
            "DATE_DIFF(CURRENT_DATE(), DATE({}), MONTH) <= {}",
            target, &caps[1]
        ))
    } else if THIS_YEAR_PATTERN.is_match(&lowered) {
        Some(format!(
            "EXTRACT(YEAR FROM {}) = EXTRACT(YEAR FROM CURRENT_DATE())",
            target
        ))
    } else if THIS_MONTH_PATTERN.is_match(&lowered) {
        Some(format!(
            "DATE_TRUNC(DATE({}), MONTH) = DATE_TRUNC(CURRENT_DATE(), MONTH)",
            target
        ))
    } else {
        None
    };

    filter.into_iter().collect()
}
