//! Lowering from the raw pair tree to typed model values.
//!
//! Normalization happens here: singular and plural key spellings collapse to
//! the same list-typed field, `dimension_group` blocks expand into temporal
//! dimensions, and yes/no barewords become booleans. Equivalence table:
//!
//! | singular          | plural             | lowers to          |
//! |-------------------|--------------------|--------------------|
//! | `explore`         | `explores`         | `Model::explores`  |
//! | `view`            | `views`            | view map           |
//! | `dimension`       | `dimensions`       | `View::dimensions` |
//! | `dimension_group` | `dimension_groups` | `View::dimensions` |
//! | `measure`         | `measures`         | `View::measures`   |
//! | `join`            | `joins`            | `Explore::joins`   |
//! | `include` (string)| `include` (list)   | `Model::include`   |

use crate::model::{
    Dimension, DimensionType, Explore, Join, JoinKind, Measure, MeasureType, Model, Relationship,
    View,
};

use super::parser::{Pair, Value};

// ============================================================================
// Pair Tree Helpers
// ============================================================================

/// Look up the first scalar value for `key`.
fn scalar<'a>(pairs: &'a [Pair], key: &str) -> Option<&'a str> {
    pairs.iter().find_map(|p| match (&p.key, &p.value) {
        (k, Value::Scalar(s)) if k == key => Some(s.as_str()),
        _ => None,
    })
}

/// Interpret a yes/no scalar; absent or anything but `yes` is false.
fn flag(pairs: &[Pair], key: &str) -> bool {
    scalar(pairs, key) == Some("yes")
}

/// Collect blocks under either the singular or plural key spelling, in
/// source order. Each entry is `(label, inner pairs)`.
fn blocks<'a>(pairs: &'a [Pair], singular: &str, plural: &str) -> Vec<(Option<&'a str>, &'a [Pair])> {
    let mut found = Vec::new();
    for pair in pairs {
        if pair.key != singular && pair.key != plural {
            continue;
        }
        if let Value::Block { label, pairs } = &pair.value {
            found.push((label.as_deref(), pairs.as_slice()));
        }
    }
    found
}

/// Collect string items accepting either a single scalar or a list.
fn string_list(pairs: &[Pair], key: &str) -> Vec<String> {
    let mut items = Vec::new();
    for pair in pairs {
        if pair.key != key {
            continue;
        }
        match &pair.value {
            Value::Scalar(s) => items.push(s.clone()),
            Value::List(list) => items.extend(list.iter().cloned()),
            Value::Block { .. } => {}
        }
    }
    items
}

// ============================================================================
// Views
// ============================================================================

pub(crate) fn lower_view(label: Option<&str>, pairs: &[Pair]) -> View {
    let mut view = View {
        name: label.unwrap_or_default().to_string(),
        sql_table_name: scalar(pairs, "sql_table_name").map(str::to_string),
        ..Default::default()
    };

    for (dim_label, dim_pairs) in blocks(pairs, "dimension", "dimensions") {
        let dimension = lower_dimension(dim_label, dim_pairs);
        if dimension.primary_key {
            if let Some(previous) = &view.primary_key {
                tracing::debug!(
                    view = %view.name,
                    previous = %previous,
                    replacement = %dimension.name,
                    "multiple primary key dimensions, last wins"
                );
            }
            view.primary_key = Some(dimension.name.clone());
        }
        view.dimensions.insert(dimension.name.clone(), dimension);
    }

    for (group_label, group_pairs) in blocks(pairs, "dimension_group", "dimension_groups") {
        let dimension = lower_dimension_group(group_label, group_pairs);
        view.dimensions.insert(dimension.name.clone(), dimension);
    }

    for (measure_label, measure_pairs) in blocks(pairs, "measure", "measures") {
        let measure = lower_measure(measure_label, measure_pairs);
        view.measures.insert(measure.name.clone(), measure);
    }

    view
}

fn lower_dimension(label: Option<&str>, pairs: &[Pair]) -> Dimension {
    let dimension_type = scalar(pairs, "type")
        .map(DimensionType::parse)
        .unwrap_or_default();

    // Timeframes only apply to temporal dimensions
    let timeframes = if dimension_type.is_temporal() {
        string_list(pairs, "timeframes")
    } else {
        Vec::new()
    };

    Dimension {
        name: label.unwrap_or_default().to_string(),
        dimension_type,
        sql: scalar(pairs, "sql").map(str::to_string),
        description: scalar(pairs, "description").map(str::to_string),
        hidden: flag(pairs, "hidden"),
        primary_key: flag(pairs, "primary_key"),
        timeframes,
    }
}

/// A `dimension_group` expands into one temporal dimension carrying its
/// timeframe list; granularities default to empty when unspecified.
fn lower_dimension_group(label: Option<&str>, pairs: &[Pair]) -> Dimension {
    let dimension_type = scalar(pairs, "type")
        .map(DimensionType::parse)
        .unwrap_or(DimensionType::Time);

    Dimension {
        name: label.unwrap_or_default().to_string(),
        dimension_type,
        sql: scalar(pairs, "sql").map(str::to_string),
        description: scalar(pairs, "description").map(str::to_string),
        hidden: flag(pairs, "hidden"),
        primary_key: flag(pairs, "primary_key"),
        timeframes: string_list(pairs, "timeframes"),
    }
}

fn lower_measure(label: Option<&str>, pairs: &[Pair]) -> Measure {
    Measure {
        name: label.unwrap_or_default().to_string(),
        measure_type: scalar(pairs, "type").map(MeasureType::parse),
        sql: scalar(pairs, "sql").map(str::to_string),
        description: scalar(pairs, "description").map(str::to_string),
        hidden: flag(pairs, "hidden"),
    }
}

// ============================================================================
// Explores
// ============================================================================

fn lower_explore(label: Option<&str>, pairs: &[Pair]) -> Explore {
    let joins = blocks(pairs, "join", "joins")
        .into_iter()
        .map(|(join_label, join_pairs)| lower_join(join_label, join_pairs))
        .collect();

    Explore {
        name: label.unwrap_or_default().to_string(),
        from_view: scalar(pairs, "from").map(str::to_string),
        view_name: scalar(pairs, "view_name").map(str::to_string),
        joins,
        hidden: flag(pairs, "hidden"),
    }
}

fn lower_join(label: Option<&str>, pairs: &[Pair]) -> Join {
    Join {
        view_name: label.unwrap_or_default().to_string(),
        kind: scalar(pairs, "type").map(JoinKind::parse).unwrap_or_default(),
        sql_on: scalar(pairs, "sql_on").map(str::to_string),
        relationship: scalar(pairs, "relationship").and_then(Relationship::parse),
        required: flag(pairs, "required"),
    }
}

// ============================================================================
// Models
// ============================================================================

pub(crate) fn lower_model(name: &str, pairs: &[Pair]) -> Model {
    let mut model = Model {
        name: name.to_string(),
        connection: scalar(pairs, "connection").map(str::to_string),
        include: string_list(pairs, "include"),
        ..Default::default()
    };

    for (label, explore_pairs) in blocks(pairs, "explore", "explores") {
        let explore = lower_explore(label, explore_pairs);
        model.explores.insert(explore.name.clone(), explore);
    }

    for (label, view_pairs) in blocks(pairs, "view", "views") {
        let view = lower_view(label, view_pairs);
        model.views.insert(view.name.clone(), view);
    }

    model
}

/// Lower all views declared at the top level of a view file.
pub(crate) fn lower_views(pairs: &[Pair]) -> Vec<View> {
    blocks(pairs, "view", "views")
        .into_iter()
        .map(|(label, view_pairs)| lower_view(label, view_pairs))
        .collect()
}
