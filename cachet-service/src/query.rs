//! Condition builder
//!
//! Translates raw query/option maps into a normalized [`BuiltQuery`].
//! A handful of reserved keys carry pagination, sort, and projection
//! hints; every other key becomes a seek condition on that field.

use serde_json::Value;

use cachet_core::{
    BuiltQuery, Criterion, JsonMap, SeekCondition, SeekConditions, SortOrder, ValidationError,
};

/// Hint key: comma-separated sort fields, `-` prefix for descending.
const SORT_BY: &str = "sort_by";
/// Hint key: zero-based page index; only effective with `population`.
const PAGE: &str = "page";
/// Hint key: page size.
const POPULATION: &str = "population";
/// Hint key: comma-separated field projection.
const RETURN_ONLY: &str = "return_only";

/// Build a normalized query from raw options.
///
/// Unknown operator names and non-integer pagination values are rejected
/// as validation errors; everything else is interpreted permissively.
pub fn build_query(options: &JsonMap) -> Result<BuiltQuery, ValidationError> {
    let mut query = BuiltQuery::empty();

    for (key, value) in options {
        match key.as_str() {
            SORT_BY => query.sort = parse_sort(value),
            PAGE | POPULATION => {} // handled together below
            RETURN_ONLY => query.fields_to_return = parse_list(value),
            field => query.conditions.push(build_condition(field, value)?),
        }
    }

    // Pagination: page is meaningless without a page size, so a lone
    // page hint is ignored rather than rejected.
    if let Some(population) = options.get(POPULATION) {
        let population = parse_count(POPULATION, population)?;
        query.limit = Some(population);
        if let Some(page) = options.get(PAGE) {
            let page = parse_count(PAGE, page)?;
            query.skip =
                page.checked_mul(population)
                    .ok_or_else(|| ValidationError::InvalidFieldValue {
                        field: PAGE.to_string(),
                        reason: "page offset overflows".to_string(),
                    })?;
        }
    }

    Ok(query)
}

/// Build the disjunction used by wildcard search: `keyword` must appear
/// as a substring in at least one of `keys`.
pub fn build_wildcard_options(keys: &[String], keyword: &str) -> SeekConditions {
    let mut conditions = SeekConditions::new();
    match keys {
        [only] => conditions.push(SeekCondition::contains(only.clone(), keyword)),
        keys => conditions.push(SeekCondition::any_of(
            keys.iter()
                .map(|key| SeekCondition::contains(key.clone(), keyword))
                .collect(),
        )),
    }
    conditions
}

fn build_condition(field: &str, value: &Value) -> Result<SeekCondition, ValidationError> {
    let criterion = match value {
        Value::Array(items) => Criterion::In(items.clone()),
        Value::Object(ops) => return build_operator_condition(field, ops),
        Value::String(s) if s.contains(',') => Criterion::In(
            s.split(',')
                .map(|part| Value::String(part.trim().to_string()))
                .collect(),
        ),
        scalar => Criterion::Eq(scalar.clone()),
    };
    Ok(SeekCondition::new(field, criterion))
}

/// An operator object holds exactly one comparison, e.g. `{"gt": 5}`.
/// Extra keys beyond the first recognized one are rejected.
fn build_operator_condition(field: &str, ops: &JsonMap) -> Result<SeekCondition, ValidationError> {
    let mut entries = ops.iter();
    let (op, operand) = entries.next().ok_or_else(|| ValidationError::InvalidFieldValue {
        field: field.to_string(),
        reason: "empty operator object".to_string(),
    })?;
    if entries.next().is_some() {
        return Err(ValidationError::InvalidFieldValue {
            field: field.to_string(),
            reason: "operator object must hold exactly one operator".to_string(),
        });
    }

    let criterion = match op.as_str() {
        "gt" => Criterion::Gt(operand.clone()),
        "gte" => Criterion::Gte(operand.clone()),
        "lt" => Criterion::Lt(operand.clone()),
        "lte" => Criterion::Lte(operand.clone()),
        "ne" => Criterion::Ne(operand.clone()),
        "in" => match operand {
            Value::Array(items) => Criterion::In(items.clone()),
            other => Criterion::In(vec![other.clone()]),
        },
        "contains" => match operand.as_str() {
            Some(needle) => Criterion::Contains(needle.to_string()),
            None => {
                return Err(ValidationError::InvalidFieldValue {
                    field: field.to_string(),
                    reason: "contains operand must be a string".to_string(),
                })
            }
        },
        unknown => {
            return Err(ValidationError::InvalidFieldValue {
                field: field.to_string(),
                reason: format!("unknown operator: {unknown}"),
            })
        }
    };
    Ok(SeekCondition::new(field, criterion))
}

fn parse_sort(value: &Value) -> Vec<(String, SortOrder)> {
    parse_list(value)
        .into_iter()
        .map(|field| match field.strip_prefix('-') {
            Some(rest) => (rest.to_string(), SortOrder::Desc),
            None => (field, SortOrder::Asc),
        })
        .collect()
}

/// Comma-separated string or string array, trimmed, empties dropped.
fn parse_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(String::from)
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

/// Pagination values arrive as numbers or numeric strings.
fn parse_count(field: &str, value: &Value) -> Result<u64, ValidationError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ValidationError::InvalidFieldValue {
        field: field.to_string(),
        reason: "expected a non-negative integer".to_string(),
    })
}
