//! Typed semantic-model representation.
//!
//! The parser lowers LookML-style source into these types immediately; raw
//! key/value trees never cross the parser boundary. A [`Project`] is built
//! once at startup and is read-only afterward.

pub mod types;

pub use types::{DimensionType, JoinKind, MeasureType, Relationship};

use indexmap::IndexMap;

// ============================================================================
// Fields
// ============================================================================

/// A dimension owned by a view.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dimension {
    pub name: String,
    pub dimension_type: DimensionType,
    /// Raw SQL macro expression, e.g. `${TABLE}.created_at`.
    pub sql: Option<String>,
    pub description: Option<String>,
    pub hidden: bool,
    pub primary_key: bool,
    /// Time granularities for temporal dimensions (empty when unspecified).
    pub timeframes: Vec<String>,
}

/// A measure owned by a view.
#[derive(Debug, Clone, PartialEq)]
pub struct Measure {
    pub name: String,
    pub measure_type: Option<MeasureType>,
    pub sql: Option<String>,
    pub description: Option<String>,
    pub hidden: bool,
}

// ============================================================================
// Views
// ============================================================================

/// A named set of dimensions and measures mapped to one physical table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct View {
    pub name: String,
    /// Physical table reference, possibly backtick-quoted and dot-qualified.
    pub sql_table_name: Option<String>,
    pub dimensions: IndexMap<String, Dimension>,
    pub measures: IndexMap<String, Measure>,
    /// Name of the dimension marked as primary key, if any.
    pub primary_key: Option<String>,
}

// ============================================================================
// Explores
// ============================================================================

/// A join declared on an explore.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    /// Name of the joined view.
    pub view_name: String,
    pub kind: JoinKind,
    /// Raw `ON` macro expression.
    pub sql_on: Option<String>,
    pub relationship: Option<Relationship>,
    pub required: bool,
}

/// A named, joinable universe of views: one base view plus zero or more
/// joins.
#[derive(Debug, Clone, PartialEq)]
pub struct Explore {
    pub name: String,
    /// The `from` view, when it differs from the explore name.
    pub from_view: Option<String>,
    /// Explicit base-view override, preferred over `from_view`.
    pub view_name: Option<String>,
    pub joins: Vec<Join>,
    pub hidden: bool,
}

impl Explore {
    /// The base view this explore selects from.
    pub fn base_view(&self) -> &str {
        self.view_name
            .as_deref()
            .or(self.from_view.as_deref())
            .unwrap_or(&self.name)
    }
}

// ============================================================================
// Models and Projects
// ============================================================================

/// One model file: connection info, includes, explores, and inline views.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Model {
    pub name: String,
    pub connection: Option<String>,
    pub include: Vec<String>,
    pub views: IndexMap<String, View>,
    pub explores: IndexMap<String, Explore>,
}

/// The entire parsed project: models plus standalone views.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Project {
    pub models: IndexMap<String, Model>,
    /// Views declared in standalone view files.
    pub views: IndexMap<String, View>,
}

impl Project {
    /// Flatten standalone and model-owned views into one map.
    ///
    /// Name collisions at this level are a model defect; the first definition
    /// wins and a warning is emitted rather than silently overwriting.
    pub fn all_views(&self) -> IndexMap<&str, &View> {
        let mut all: IndexMap<&str, &View> = IndexMap::new();

        for (name, view) in &self.views {
            all.insert(name.as_str(), view);
        }

        for model in self.models.values() {
            for (name, view) in &model.views {
                if all.contains_key(name.as_str()) {
                    tracing::warn!(
                        view = %name,
                        model = %model.name,
                        "duplicate view name at project level, keeping first definition"
                    );
                    continue;
                }
                all.insert(name.as_str(), view);
            }
        }

        all
    }

    /// Flatten explores from all models, namespaced as `model.explore`.
    ///
    /// The namespacing makes collisions structurally impossible between
    /// models; a duplicate within one model would already have been collapsed
    /// at parse time.
    pub fn all_explores(&self) -> IndexMap<String, &Explore> {
        let mut all: IndexMap<String, &Explore> = IndexMap::new();

        for model in self.models.values() {
            for (explore_name, explore) in &model.explores {
                let key = format!("{}.{}", model.name, explore_name);
                if all.contains_key(&key) {
                    tracing::warn!(
                        explore = %key,
                        "duplicate explore name at project level, keeping first definition"
                    );
                    continue;
                }
                all.insert(key, explore);
            }
        }

        all
    }
}
