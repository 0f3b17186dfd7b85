//! Seek conditions
//!
//! The normalized query vocabulary shared by the condition builder, the
//! controller contract, and the in-memory reference controller. A
//! [`SeekConditions`] set is constructed transiently per request and never
//! persisted.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::Record;

/// Sort direction for a query hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Match criterion applied to a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// Equal to
    Eq(Value),
    /// Not equal to
    Ne(Value),
    /// Greater than
    Gt(Value),
    /// Greater than or equal
    Gte(Value),
    /// Less than
    Lt(Value),
    /// Less than or equal
    Lte(Value),
    /// In list of values
    In(Vec<Value>),
    /// Contains substring (strings only)
    Contains(String),
    /// Logical OR across nested conditions; the owning field is ignored.
    AnyOf(Vec<SeekCondition>),
}

impl Criterion {
    /// Evaluate this criterion against a resolved field value.
    ///
    /// `AnyOf` is evaluated by [`SeekCondition::matches`] against the whole
    /// record; here it is always false.
    pub fn matches(&self, actual: Option<&Value>) -> bool {
        match self {
            Criterion::Eq(expected) => actual.is_some_and(|v| values_equal(v, expected)),
            Criterion::Ne(expected) => !actual.is_some_and(|v| values_equal(v, expected)),
            Criterion::Gt(bound) => ordered(actual, bound).is_some_and(|o| o.is_gt()),
            Criterion::Gte(bound) => ordered(actual, bound).is_some_and(|o| o.is_ge()),
            Criterion::Lt(bound) => ordered(actual, bound).is_some_and(|o| o.is_lt()),
            Criterion::Lte(bound) => ordered(actual, bound).is_some_and(|o| o.is_le()),
            Criterion::In(values) => {
                actual.is_some_and(|v| values.iter().any(|w| values_equal(v, w)))
            }
            Criterion::Contains(needle) => actual
                .and_then(Value::as_str)
                .is_some_and(|s| s.contains(needle.as_str())),
            Criterion::AnyOf(_) => false,
        }
    }
}

/// Equality that treats `1` and `1.0` as the same number.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Ordering comparison between two JSON values.
///
/// Numbers compare numerically, strings lexicographically; everything
/// else is incomparable. Also used by controllers for sort hints.
pub fn compare_values(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x.partial_cmp(&y);
    }
    if let (Some(x), Some(y)) = (a.as_str(), b.as_str()) {
        return Some(x.cmp(y));
    }
    None
}

fn ordered(actual: Option<&Value>, bound: &Value) -> Option<std::cmp::Ordering> {
    compare_values(actual?, bound)
}

/// A single field/criterion pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeekCondition {
    /// Field to match; ignored for [`Criterion::AnyOf`].
    pub field: String,
    /// Criterion to apply.
    pub criterion: Criterion,
}

impl SeekCondition {
    /// Create a condition on a named field.
    pub fn new(field: impl Into<String>, criterion: Criterion) -> Self {
        Self {
            field: field.into(),
            criterion,
        }
    }

    /// Create an equality condition.
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, Criterion::Eq(value))
    }

    /// Create a substring-match condition.
    pub fn contains(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Self::new(field, Criterion::Contains(needle.into()))
    }

    /// Create a disjunction over nested conditions.
    pub fn any_of(inner: Vec<SeekCondition>) -> Self {
        Self::new("*", Criterion::AnyOf(inner))
    }

    /// Evaluate this condition against a record.
    pub fn matches(&self, record: &Record) -> bool {
        match &self.criterion {
            Criterion::AnyOf(inner) => inner.iter().any(|c| c.matches(record)),
            criterion => criterion.matches(record.lookup(&self.field).as_ref()),
        }
    }
}

/// An ordered set of seek conditions, combined with logical AND.
///
/// An empty set matches every record (full scan).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeekConditions(Vec<SeekCondition>);

impl SeekConditions {
    /// Create an empty condition set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a condition, preserving insertion order.
    pub fn push(&mut self, condition: SeekCondition) {
        self.0.push(condition);
    }

    /// Builder-style append.
    pub fn with(mut self, condition: SeekCondition) -> Self {
        self.push(condition);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate conditions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &SeekCondition> {
        self.0.iter()
    }

    /// Evaluate the whole set against a record (AND semantics).
    pub fn matches(&self, record: &Record) -> bool {
        self.0.iter().all(|c| c.matches(record))
    }
}

impl FromIterator<SeekCondition> for SeekConditions {
    fn from_iter<I: IntoIterator<Item = SeekCondition>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Normalized output of the condition builder.
///
/// Carries the seek conditions together with the pagination, sort, and
/// projection hints recovered from the raw query options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuiltQuery {
    /// Conditions the controller must satisfy.
    pub conditions: SeekConditions,
    /// Records to skip before returning results.
    pub skip: u64,
    /// Maximum records to return; `None` means unbounded.
    pub limit: Option<u64>,
    /// Sort hints in priority order.
    pub sort: Vec<(String, SortOrder)>,
    /// Field projection; empty means return everything.
    pub fields_to_return: Vec<String>,
}

impl BuiltQuery {
    /// A query with no conditions or hints (full scan).
    pub fn empty() -> Self {
        Self::default()
    }

    /// A query carrying only seek conditions.
    pub fn from_conditions(conditions: SeekConditions) -> Self {
        Self {
            conditions,
            ..Self::default()
        }
    }
}
