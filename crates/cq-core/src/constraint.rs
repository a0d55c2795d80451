//! # Constraint Vocabulary & Compiler
//!
//! A [`Constraint`] is one typed predicate applied to a field. Applying it
//! writes a fragment into the query's constraint document:
//!
//! ```text
//! { "<field>": { "<op>": <value>, ... },
//!   "$and": [ {"<field>": <value>}, ... ],         equality merges
//!   "$relatedTo": { "object": <ref>, "key": "<field>" } }
//! ```
//!
//! Every field holds a single operator document, so a second constraint on
//! the same field replaces the first. Equality is the exception: values are
//! kept in a per-field table and projected into `$and` on each write, which
//! lets equality on several fields coexist.

use indexmap::IndexMap;

use crate::query::Query;
use crate::value::{Document, GeoPoint, ObjectRef, Value};

/// Reserved operator tokens of the wire format.
pub mod op {
    pub const EXISTS: &str = "$exists";
    pub const NOT_EQUAL: &str = "$ne";
    pub const LESS_THAN: &str = "$lt";
    pub const LESS_THAN_OR_EQUAL: &str = "$lte";
    pub const GREATER_THAN: &str = "$gt";
    pub const GREATER_THAN_OR_EQUAL: &str = "$gte";
    pub const IN: &str = "$in";
    pub const NOT_IN: &str = "$nin";
    pub const ALL: &str = "$all";
    pub const SIZE: &str = "$size";
    pub const NEAR_SPHERE: &str = "$nearSphere";
    pub const WITHIN: &str = "$within";
    pub const BOX: &str = "$box";
    pub const IN_QUERY: &str = "$inQuery";
    pub const NOT_IN_QUERY: &str = "$notInQuery";
    pub const SELECT: &str = "$select";
    pub const DONT_SELECT: &str = "$dontSelect";
    pub const REGEX: &str = "$regex";
    pub const OPTIONS: &str = "$options";
    pub const RELATED_TO: &str = "$relatedTo";
    pub const AND: &str = "$and";
    pub const OR: &str = "$or";
}

// =============================================================================
// Types
// =============================================================================

/// Unit attached to a distance bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceUnit {
    Radian,
    Mile,
    Kilometer,
}

impl DistanceUnit {
    fn suffix(self) -> &'static str {
        match self {
            Self::Radian => "InRadians",
            Self::Mile => "InMiles",
            Self::Kilometer => "InKilometers",
        }
    }
}

/// A distance bound. Min and max bounds carry their units independently.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distance {
    pub value: f64,
    pub unit: DistanceUnit,
}

impl Distance {
    pub const fn new(value: f64, unit: DistanceUnit) -> Self {
        Self { value, unit }
    }
}

/// One typed predicate. The field it applies to is supplied by
/// [`Query::where_key`].
#[derive(Debug, Clone)]
pub enum Constraint {
    // Key presence
    Included,
    Selected,
    Existed,
    NotExisted,

    // Equality / comparison
    EqualTo(Value),
    NotEqualTo(Value),
    LessThan(Value),
    LessThanOrEqualTo(Value),
    GreaterThan(Value),
    GreaterThanOrEqualTo(Value),

    // Set membership
    ContainedIn(Vec<Value>),
    NotContainedIn(Vec<Value>),
    ContainedAllIn(Vec<Value>),
    EqualToSize(u32),

    // Geospatial
    NearbyPoint(GeoPoint),
    NearbyPointWithRange {
        origin: GeoPoint,
        from: Option<Distance>,
        to: Option<Distance>,
    },
    NearbyPointWithRectangle {
        southwest: GeoPoint,
        northeast: GeoPoint,
    },

    // Sub-query
    MatchedQuery(Query),
    NotMatchedQuery(Query),
    MatchedQueryAndKey {
        query: Query,
        key: String,
    },
    NotMatchedQueryAndKey {
        query: Query,
        key: String,
    },

    // Pattern
    MatchedPattern {
        pattern: String,
        options: Option<String>,
    },
    MatchedSubstring(String),
    PrefixedBy(String),
    SuffixedBy(String),

    // Relation
    RelatedTo(ObjectRef),

    // Ordering
    Ascending,
    Descending,
}

// =============================================================================
// Compiler
// =============================================================================

/// Write one `(field, constraint)` application into `query`. Never fails;
/// operands are validated when the query is compiled.
pub(crate) fn apply(query: &mut Query, field: &str, constraint: Constraint) {
    match constraint {
        Constraint::Included => query.include_key(field),
        Constraint::Selected => query.select_key(field),
        Constraint::Existed => query.set_field(field, operators([(op::EXISTS, true.into())])),
        Constraint::NotExisted => {
            query.set_field(field, operators([(op::EXISTS, false.into())]));
        }

        Constraint::EqualTo(value) => query.merge_equality(field, value),
        Constraint::NotEqualTo(value) => {
            query.set_field(field, operators([(op::NOT_EQUAL, value)]));
        }
        Constraint::LessThan(value) => query.set_field(field, operators([(op::LESS_THAN, value)])),
        Constraint::LessThanOrEqualTo(value) => {
            query.set_field(field, operators([(op::LESS_THAN_OR_EQUAL, value)]));
        }
        Constraint::GreaterThan(value) => {
            query.set_field(field, operators([(op::GREATER_THAN, value)]));
        }
        Constraint::GreaterThanOrEqualTo(value) => {
            query.set_field(field, operators([(op::GREATER_THAN_OR_EQUAL, value)]));
        }

        Constraint::ContainedIn(values) => {
            query.set_field(field, operators([(op::IN, Value::Array(values))]));
        }
        Constraint::NotContainedIn(values) => {
            query.set_field(field, operators([(op::NOT_IN, Value::Array(values))]));
        }
        Constraint::ContainedAllIn(values) => {
            query.set_field(field, operators([(op::ALL, Value::Array(values))]));
        }
        Constraint::EqualToSize(size) => {
            query.set_field(field, operators([(op::SIZE, size.into())]));
        }

        Constraint::NearbyPoint(point) => {
            query.set_field(field, operators([(op::NEAR_SPHERE, point.into())]));
        }
        Constraint::NearbyPointWithRange { origin, from, to } => {
            let mut document = Document::new();
            document.insert(op::NEAR_SPHERE.to_owned(), origin.into());
            if let Some(min) = from {
                document.insert(distance_key("$minDistance", min.unit), min.value.into());
            }
            if let Some(max) = to {
                document.insert(distance_key("$maxDistance", max.unit), max.value.into());
            }
            query.set_field(field, Value::Object(document));
        }
        Constraint::NearbyPointWithRectangle {
            southwest,
            northeast,
        } => {
            let corners = Value::Array(vec![southwest.into(), northeast.into()]);
            let within = operators([(op::BOX, corners)]);
            query.set_field(field, operators([(op::WITHIN, within)]));
        }

        Constraint::MatchedQuery(subquery) => {
            query.set_field(field, operators([(op::IN_QUERY, subquery.subquery_value())]));
        }
        Constraint::NotMatchedQuery(subquery) => {
            query.set_field(field, operators([(op::NOT_IN_QUERY, subquery.subquery_value())]));
        }
        Constraint::MatchedQueryAndKey { query: subquery, key } => {
            query.set_field(field, operators([(op::SELECT, keyed_subquery(&subquery, key))]));
        }
        Constraint::NotMatchedQueryAndKey { query: subquery, key } => {
            query.set_field(field, operators([(op::DONT_SELECT, keyed_subquery(&subquery, key))]));
        }

        Constraint::MatchedPattern { pattern, options } => {
            query.set_field(
                field,
                operators([
                    (op::REGEX, pattern.into()),
                    (op::OPTIONS, options.unwrap_or_default().into()),
                ]),
            );
        }
        Constraint::MatchedSubstring(literal) => {
            query.set_field(field, operators([(op::REGEX, regex::escape(&literal).into())]));
        }
        Constraint::PrefixedBy(literal) => {
            let pattern = format!("^{}", regex::escape(&literal));
            query.set_field(field, operators([(op::REGEX, pattern.into())]));
        }
        Constraint::SuffixedBy(literal) => {
            let pattern = format!("{}$", regex::escape(&literal));
            query.set_field(field, operators([(op::REGEX, pattern.into())]));
        }

        Constraint::RelatedTo(object) => {
            let relation = operators([("object", object.into()), ("key", field.into())]);
            query.set_field(op::RELATED_TO, relation);
        }

        Constraint::Ascending => query.append_order(field),
        Constraint::Descending => query.append_order(&format!("-{}", field)),
    }
}

fn operators<const N: usize>(entries: [(&str, Value); N]) -> Value {
    Value::Object(
        entries
            .into_iter()
            .map(|(token, value)| (token.to_owned(), value))
            .collect::<IndexMap<_, _>>(),
    )
}

fn distance_key(bound: &str, unit: DistanceUnit) -> String {
    format!("{}{}", bound, unit.suffix())
}

fn keyed_subquery(subquery: &Query, key: String) -> Value {
    operators([("query", subquery.subquery_value()), ("key", key.into())])
}
