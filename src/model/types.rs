//! Shared enums for the semantic model.
//!
//! These cover the closed sets of the LookML-style grammar: dimension and
//! measure types, join kinds, and join relationship cardinality. Open-ended
//! inputs are preserved in `Other(String)` variants rather than dropped.

use std::fmt;

// ============================================================================
// Dimension Types
// ============================================================================

/// The semantic type of a dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimensionType {
    String,
    Number,
    Time,
    Date,
    YesNo,
    Tier,
    Other(String),
}

impl DimensionType {
    /// Parse a dimension type keyword. Unknown keywords are preserved.
    pub fn parse(s: &str) -> Self {
        match s {
            "string" => DimensionType::String,
            "number" => DimensionType::Number,
            "time" => DimensionType::Time,
            "date" => DimensionType::Date,
            "yesno" => DimensionType::YesNo,
            "tier" => DimensionType::Tier,
            other => DimensionType::Other(other.to_string()),
        }
    }

    /// True for types that carry a point in time and can take relative-time
    /// filters.
    pub fn is_temporal(&self) -> bool {
        matches!(self, DimensionType::Time | DimensionType::Date)
    }
}

impl Default for DimensionType {
    fn default() -> Self {
        DimensionType::String
    }
}

impl fmt::Display for DimensionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DimensionType::String => "string",
            DimensionType::Number => "number",
            DimensionType::Time => "time",
            DimensionType::Date => "date",
            DimensionType::YesNo => "yesno",
            DimensionType::Tier => "tier",
            DimensionType::Other(s) => s,
        };
        write!(f, "{}", s)
    }
}

// ============================================================================
// Measure Types
// ============================================================================

/// The aggregation type of a measure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeasureType {
    Count,
    CountDistinct,
    Sum,
    Average,
    Min,
    Max,
    Median,
    Number,
    Other(String),
}

impl MeasureType {
    /// Parse a measure type keyword. Unknown keywords are preserved.
    pub fn parse(s: &str) -> Self {
        match s {
            "count" => MeasureType::Count,
            "count_distinct" => MeasureType::CountDistinct,
            "sum" => MeasureType::Sum,
            "average" => MeasureType::Average,
            "min" => MeasureType::Min,
            "max" => MeasureType::Max,
            "median" => MeasureType::Median,
            "number" => MeasureType::Number,
            other => MeasureType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for MeasureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MeasureType::Count => "count",
            MeasureType::CountDistinct => "count_distinct",
            MeasureType::Sum => "sum",
            MeasureType::Average => "average",
            MeasureType::Min => "min",
            MeasureType::Max => "max",
            MeasureType::Median => "median",
            MeasureType::Number => "number",
            MeasureType::Other(s) => s,
        };
        write!(f, "{}", s)
    }
}

// ============================================================================
// Join Kinds
// ============================================================================

/// The kind of join declared on an explore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    LeftOuter,
    RightOuter,
    FullOuter,
    Inner,
    Cross,
}

impl JoinKind {
    /// Parse a join type keyword. Unrecognized keywords fall back to
    /// `LeftOuter`, logged at debug level.
    pub fn parse(s: &str) -> Self {
        match s {
            "left_outer" => JoinKind::LeftOuter,
            "right_outer" => JoinKind::RightOuter,
            "full_outer" => JoinKind::FullOuter,
            "inner" => JoinKind::Inner,
            "cross" => JoinKind::Cross,
            other => {
                tracing::debug!(join_type = other, "unrecognized join type, using left_outer");
                JoinKind::LeftOuter
            }
        }
    }

    /// The SQL join keyword for this kind.
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            JoinKind::LeftOuter => "LEFT",
            JoinKind::RightOuter => "RIGHT",
            JoinKind::FullOuter => "FULL OUTER",
            JoinKind::Inner => "INNER",
            JoinKind::Cross => "CROSS",
        }
    }
}

impl Default for JoinKind {
    fn default() -> Self {
        JoinKind::LeftOuter
    }
}

// ============================================================================
// Relationship Cardinality
// ============================================================================

/// Declared join cardinality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relationship {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

impl Relationship {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "one_to_one" => Some(Relationship::OneToOne),
            "one_to_many" => Some(Relationship::OneToMany),
            "many_to_one" => Some(Relationship::ManyToOne),
            "many_to_many" => Some(Relationship::ManyToMany),
            _ => None,
        }
    }
}
