//! Grounding index combining the semantic model with physical metadata.
//!
//! Built once per project + metadata snapshot, then read-only: retrieval
//! methods take `&self` and the index is safe to share across concurrent
//! planning requests. Rebuilding means constructing a new index.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use thiserror::Error;

use crate::metadata::{MetadataError, MetadataProvider, TableMetadata};
use crate::model::{DimensionType, JoinKind, MeasureType, Project, View};

use super::resolver::extract_column_name;

/// Pattern for keywords worth indexing from description text.
static KEYWORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-zA-Z]{3,}\b").unwrap());

/// Common words excluded from the glossary.
static KEYWORD_STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "the", "and", "for", "are", "but", "not", "you", "all", "can", "had", "her", "was",
        "one", "our", "out", "day", "get", "has", "him", "his", "how", "man", "new", "now",
        "old", "see", "two", "way", "who", "boy", "did", "its", "let", "put", "say", "she",
        "too", "use",
    ])
});

/// Errors that can occur while building the index.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("metadata provider error: {0}")]
    Metadata(#[from] MetadataError),
}

pub type IndexResult<T> = Result<T, IndexError>;

// ============================================================================
// Field and Explore Catalogs
// ============================================================================

/// Whether a field is a dimension or a measure, with its semantic type.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldRole {
    Dimension(DimensionType),
    Measure(Option<MeasureType>),
}

/// A field enriched with any matching physical column metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub name: String,
    pub view_name: String,
    /// The owning view's physical table reference.
    pub table: Option<String>,
    pub role: FieldRole,
    /// Raw macro expression from the model.
    pub sql: Option<String>,
    /// Description from the model.
    pub description: Option<String>,
    /// Physical column type, when the field is a simple column reference.
    pub column_type: Option<String>,
    /// Physical column description, when available.
    pub column_description: Option<String>,
    pub hidden: bool,
}

impl FieldInfo {
    /// Qualified name, unique within an explore's available fields.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.view_name, self.name)
    }

    pub fn is_measure(&self) -> bool {
        matches!(self.role, FieldRole::Measure(_))
    }

    /// True when the field carries a point in time.
    pub fn is_temporal(&self) -> bool {
        matches!(&self.role, FieldRole::Dimension(t) if t.is_temporal())
    }
}

/// One explore's field catalog and join graph.
#[derive(Debug, Clone)]
pub struct ExploreInfo {
    pub name: String,
    pub base_view: String,
    /// Qualified name → field, insertion order following declaration order.
    pub available_fields: IndexMap<String, FieldInfo>,
    /// Joined view → join kind.
    pub join_graph: IndexMap<String, JoinKind>,
    /// Joined view → raw `ON` condition.
    pub join_conditions: IndexMap<String, String>,
}

// ============================================================================
// Grounding Index
// ============================================================================

/// Immutable index of explores, fields, and glossary terms.
#[derive(Debug)]
pub struct GroundingIndex {
    project: Project,
    explores: IndexMap<String, ExploreInfo>,
    /// Lowercase term → qualified field names (deduplicated).
    glossary: IndexMap<String, Vec<String>>,
}

impl GroundingIndex {
    /// Build the index from a parsed project and a metadata provider.
    ///
    /// Makes exactly one `load_metadata` call for the distinct set of
    /// physical tables the project references.
    pub async fn build(
        project: Project,
        provider: &dyn MetadataProvider,
    ) -> IndexResult<GroundingIndex> {
        tracing::info!("building grounding index");

        let referenced = referenced_tables(&project);
        tracing::info!(tables = referenced.len(), "found referenced physical tables");

        let table_metadata = provider.load_metadata(&referenced).await?;

        let explores = build_explores(&project, &table_metadata);
        let glossary = build_glossary(&explores);

        tracing::info!(
            explores = explores.len(),
            glossary_terms = glossary.len(),
            "built grounding index"
        );

        Ok(GroundingIndex {
            project,
            explores,
            glossary,
        })
    }

    /// The parsed project this index was built from.
    pub fn project(&self) -> &Project {
        &self.project
    }

    /// All explores, in insertion order.
    pub fn explores(&self) -> &IndexMap<String, ExploreInfo> {
        &self.explores
    }

    /// Look up one explore by its namespaced name.
    pub fn explore(&self, name: &str) -> Option<&ExploreInfo> {
        self.explores.get(name)
    }

    /// Score explores against query terms.
    ///
    /// Each term adds 2.0 per available field whose qualified name contains
    /// the term, plus 1.0 per glossary match belonging to the explore. Only
    /// explores scoring above zero are returned, sorted by descending score;
    /// ties keep insertion order (stable, but not otherwise meaningful).
    pub fn find_relevant_explores(&self, terms: &[String]) -> Vec<(String, f64)> {
        let mut scored = Vec::new();

        for (explore_name, info) in &self.explores {
            let mut score = 0.0;

            for term in terms {
                let term = term.to_lowercase();

                for field_name in info.available_fields.keys() {
                    if field_name.to_lowercase().contains(&term) {
                        score += 2.0;
                    }
                }

                if let Some(matches) = self.glossary.get(&term) {
                    for qualified in matches {
                        if info.available_fields.contains_key(qualified) {
                            score += 1.0;
                        }
                    }
                }
            }

            if score > 0.0 {
                scored.push((explore_name.clone(), score));
            }
        }

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored
    }

    /// Score an explore's fields against query terms.
    ///
    /// Each term adds 3.0 per field whose bare name contains the term, plus
    /// 1.0 per glossary match. Sorted by descending score, ties keeping
    /// first-match order.
    pub fn find_relevant_fields(&self, explore_name: &str, terms: &[String]) -> Vec<(FieldInfo, f64)> {
        let Some(info) = self.explores.get(explore_name) else {
            return Vec::new();
        };

        let mut scores: IndexMap<String, f64> = IndexMap::new();

        for term in terms {
            let term = term.to_lowercase();

            for (qualified, field) in &info.available_fields {
                if field.name.to_lowercase().contains(&term) {
                    *scores.entry(qualified.clone()).or_insert(0.0) += 3.0;
                }
            }

            if let Some(matches) = self.glossary.get(&term) {
                for qualified in matches {
                    if info.available_fields.contains_key(qualified) {
                        *scores.entry(qualified.clone()).or_insert(0.0) += 1.0;
                    }
                }
            }
        }

        let mut scored: Vec<(FieldInfo, f64)> = scores
            .into_iter()
            .map(|(qualified, score)| (info.available_fields[&qualified].clone(), score))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored
    }
}

// ============================================================================
// Build Helpers
// ============================================================================

/// Strip quoting from a physical table reference and keep the final
/// dot-segment as the bare table name.
pub(crate) fn bare_table_name(sql_table_name: &str) -> String {
    let cleaned = sql_table_name.trim_matches(|c| c == '`' || c == '"');
    cleaned.rsplit('.').next().unwrap_or(cleaned).to_string()
}

/// Distinct physical table names referenced by all views.
fn referenced_tables(project: &Project) -> BTreeSet<String> {
    project
        .all_views()
        .values()
        .filter_map(|view| view.sql_table_name.as_deref())
        .map(bare_table_name)
        .collect()
}

fn build_explores(
    project: &Project,
    table_metadata: &HashMap<String, TableMetadata>,
) -> IndexMap<String, ExploreInfo> {
    let all_views = project.all_views();
    let mut explores = IndexMap::new();

    for (explore_name, explore) in project.all_explores() {
        tracing::debug!(explore = %explore_name, "processing explore");

        let mut available_fields = IndexMap::new();
        let mut join_graph = IndexMap::new();
        let mut join_conditions = IndexMap::new();

        if let Some(base_view) = all_views.get(explore.base_view()) {
            collect_view_fields(base_view, table_metadata, &mut available_fields);
        }

        for join in &explore.joins {
            if let Some(join_view) = all_views.get(join.view_name.as_str()) {
                collect_view_fields(join_view, table_metadata, &mut available_fields);

                join_graph.insert(join.view_name.clone(), join.kind);
                if let Some(sql_on) = &join.sql_on {
                    join_conditions.insert(join.view_name.clone(), sql_on.clone());
                }
            }
        }

        explores.insert(
            explore_name.clone(),
            ExploreInfo {
                name: explore_name,
                base_view: explore.base_view().to_string(),
                available_fields,
                join_graph,
                join_conditions,
            },
        );
    }

    explores
}

/// Merge a view's non-hidden fields into the available-field map, enriching
/// simple column references with physical metadata.
fn collect_view_fields(
    view: &View,
    table_metadata: &HashMap<String, TableMetadata>,
    fields: &mut IndexMap<String, FieldInfo>,
) {
    let metadata = view
        .sql_table_name
        .as_deref()
        .and_then(|table| table_metadata.get(&bare_table_name(table)));

    for dimension in view.dimensions.values() {
        if dimension.hidden {
            continue;
        }
        let column = lookup_column(metadata, dimension.sql.as_deref());
        let field = FieldInfo {
            name: dimension.name.clone(),
            view_name: view.name.clone(),
            table: view.sql_table_name.clone(),
            role: FieldRole::Dimension(dimension.dimension_type.clone()),
            sql: dimension.sql.clone(),
            description: dimension.description.clone(),
            column_type: column.map(|c| c.data_type.clone()),
            column_description: column.and_then(|c| c.description.clone()),
            hidden: dimension.hidden,
        };
        fields.insert(field.qualified_name(), field);
    }

    for measure in view.measures.values() {
        if measure.hidden {
            continue;
        }
        let column = lookup_column(metadata, measure.sql.as_deref());
        let field = FieldInfo {
            name: measure.name.clone(),
            view_name: view.name.clone(),
            table: view.sql_table_name.clone(),
            role: FieldRole::Measure(measure.measure_type.clone()),
            sql: measure.sql.clone(),
            description: measure.description.clone(),
            column_type: column.map(|c| c.data_type.clone()),
            column_description: column.and_then(|c| c.description.clone()),
            hidden: measure.hidden,
        };
        fields.insert(field.qualified_name(), field);
    }
}

/// Find the physical column a simple `${TABLE}.column` expression points at.
/// Computed expressions get no enrichment.
fn lookup_column<'a>(
    metadata: Option<&'a TableMetadata>,
    sql: Option<&str>,
) -> Option<&'a crate::metadata::ColumnMetadata> {
    let metadata = metadata?;
    let column_name = extract_column_name(sql?)?;
    metadata.columns.get(column_name)
}

fn build_glossary(explores: &IndexMap<String, ExploreInfo>) -> IndexMap<String, Vec<String>> {
    let mut glossary: IndexMap<String, Vec<String>> = IndexMap::new();

    let mut add = |term: &str, qualified: &str, glossary: &mut IndexMap<String, Vec<String>>| {
        let term = term.trim().to_lowercase();
        if term.len() <= 2 {
            return;
        }
        let entries = glossary.entry(term).or_default();
        if !entries.iter().any(|q| q == qualified) {
            entries.push(qualified.to_string());
        }
    };

    for info in explores.values() {
        for (qualified, field) in &info.available_fields {
            add(&field.name, qualified, &mut glossary);

            for description in [&field.description, &field.column_description]
                .into_iter()
                .flatten()
            {
                for keyword in extract_keywords(description) {
                    add(&keyword, qualified, &mut glossary);
                }
            }
        }
    }

    glossary
}

/// Extract indexable keywords from description text: lowercase ASCII words
/// of length ≥ 3, stopword-filtered.
fn extract_keywords(text: &str) -> Vec<String> {
    KEYWORD_PATTERN
        .find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .filter(|word| !KEYWORD_STOP_WORDS.contains(word.as_str()))
        .collect()
}
