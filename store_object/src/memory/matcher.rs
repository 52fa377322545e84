//! Query filter evaluation for the in-memory store.
//!
//! Covers the operators the entity executors and typical caller stages use:
//! logical `$and`/`$or`/`$nor`, comparisons, `$in`/`$nin`, `$exists`,
//! `$regex` with `$options`, and `$not`. Numbers compare across integer and
//! double representations.

use super::path;
use crate::errors::StoreError;
use mongodb::bson::{Bson, Document};
use regex::RegexBuilder;
use std::cmp::Ordering;

/// Whether `document` satisfies `filter`
pub fn matches(document: &Document, filter: &Document) -> Result<bool, StoreError> {
    for (key, condition) in filter {
        let satisfied = match key.as_str() {
            "$and" => logical(document, condition, key)?
                .iter()
                .all(|&matched| matched),
            "$or" => logical(document, condition, key)?
                .iter()
                .any(|&matched| matched),
            "$nor" => !logical(document, condition, key)?
                .iter()
                .any(|&matched| matched),
            op if op.starts_with('$') => {
                return Err(StoreError::store(format!("unknown top level operator: {}", op)));
            }
            field => field_matches(&path::lookup(document, field), condition)?,
        };

        if !satisfied {
            return Ok(false);
        }
    }
    Ok(true)
}

fn logical(document: &Document, clauses: &Bson, operator: &str) -> Result<Vec<bool>, StoreError> {
    let Bson::Array(clauses) = clauses else {
        return Err(StoreError::store(format!("{} must be an array", operator)));
    };
    if clauses.is_empty() {
        return Err(StoreError::store(format!(
            "$and/$or/$nor entries need to be full objects ({} is empty)",
            operator
        )));
    }

    clauses
        .iter()
        .map(|clause| match clause {
            Bson::Document(inner) => matches(document, inner),
            _ => Err(StoreError::store(format!(
                "$or/$and/$nor entries need to be full objects ({})",
                operator
            ))),
        })
        .collect()
}

fn is_operator_document(condition: &Bson) -> Option<&Document> {
    match condition {
        Bson::Document(inner) if inner.keys().next().is_some_and(|k| k.starts_with('$')) => {
            Some(inner)
        }
        _ => None,
    }
}

fn field_matches(values: &[&Bson], condition: &Bson) -> Result<bool, StoreError> {
    match is_operator_document(condition) {
        Some(operators) => {
            for (operator, argument) in operators {
                if operator == "$options" {
                    continue;
                }
                if !apply_operator(values, operator, argument, operators)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        None => Ok(equals_any(values, condition)),
    }
}

fn apply_operator(
    values: &[&Bson],
    operator: &str,
    argument: &Bson,
    siblings: &Document,
) -> Result<bool, StoreError> {
    let result = match operator {
        "$eq" => equals_any(values, argument),
        "$ne" => !equals_any(values, argument),
        "$gt" => compares_any(values, argument, |o| o == Ordering::Greater),
        "$gte" => compares_any(values, argument, |o| o != Ordering::Less),
        "$lt" => compares_any(values, argument, |o| o == Ordering::Less),
        "$lte" => compares_any(values, argument, |o| o != Ordering::Greater),
        "$in" => in_list(values, argument)?,
        "$nin" => !in_list(values, argument)?,
        "$exists" => values.is_empty() != truthy(argument),
        "$regex" => {
            let options = match siblings.get("$options") {
                Some(Bson::String(options)) => options.as_str(),
                _ => "",
            };
            regex_any(values, argument, options)?
        }
        "$not" => !field_matches(values, argument)?,
        other => return Err(StoreError::store(format!("unknown operator: {}", other))),
    };
    Ok(result)
}

/// Equality with array containment; a missing field equals null
fn equals_any(values: &[&Bson], expected: &Bson) -> bool {
    if values.is_empty() {
        return matches!(expected, Bson::Null);
    }
    values.iter().any(|value| {
        values_equal(value, expected)
            || matches!(value, Bson::Array(items) if items.iter().any(|item| values_equal(item, expected)))
    })
}

fn compares_any<F>(values: &[&Bson], bound: &Bson, accept: F) -> bool
where
    F: Fn(Ordering) -> bool,
{
    values.iter().any(|value| match value {
        Bson::Array(items) => items
            .iter()
            .any(|item| compare_values(item, bound).is_some_and(&accept)),
        other => compare_values(other, bound).is_some_and(&accept),
    })
}

fn in_list(values: &[&Bson], list: &Bson) -> Result<bool, StoreError> {
    let Bson::Array(candidates) = list else {
        return Err(StoreError::store("$in needs an array"));
    };
    Ok(candidates
        .iter()
        .any(|candidate| equals_any(values, candidate)))
}

fn regex_any(values: &[&Bson], pattern: &Bson, options: &str) -> Result<bool, StoreError> {
    let (pattern, options) = match pattern {
        Bson::String(pattern) => (pattern.as_str(), options.to_string()),
        Bson::RegularExpression(regex) => (regex.pattern.as_str(), regex.options.clone()),
        _ => return Err(StoreError::store("$regex has to be a string")),
    };

    let regex = RegexBuilder::new(pattern)
        .case_insensitive(options.contains('i'))
        .multi_line(options.contains('m'))
        .dot_matches_new_line(options.contains('s'))
        .ignore_whitespace(options.contains('x'))
        .build()
        .map_err(|e| StoreError::store(format!("Regular expression is invalid: {}", e)))?;

    Ok(values.iter().any(|value| match value {
        Bson::String(text) => regex.is_match(text),
        Bson::Array(items) => items
            .iter()
            .any(|item| matches!(item, Bson::String(text) if regex.is_match(text))),
        _ => false,
    }))
}

fn truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(b) => *b,
        Bson::Null | Bson::Undefined => false,
        other => as_number(other).map_or(true, |n| n != 0.0),
    }
}

pub(crate) fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

/// Equality where numbers compare by value regardless of width
pub(crate) fn values_equal(a: &Bson, b: &Bson) -> bool {
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x == y,
        _ => match (a, b) {
            (Bson::Array(xs), Bson::Array(ys)) => {
                xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
            }
            (Bson::Document(x), Bson::Document(y)) => {
                x.len() == y.len()
                    && x.iter()
                        .zip(y.iter())
                        .all(|((kx, vx), (ky, vy))| kx == ky && values_equal(vx, vy))
            }
            _ => a == b,
        },
    }
}

/// Ordering between values of the same type class; `None` across classes
pub(crate) fn compare_values(a: &Bson, b: &Bson) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
        return x.partial_cmp(&y);
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        (Bson::DateTime(x), Bson::DateTime(y)) => Some(x.cmp(y)),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => Some(x.bytes().cmp(&y.bytes())),
        (Bson::Null, Bson::Null) => Some(Ordering::Equal),
        _ => None,
    }
}
