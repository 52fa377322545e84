//! Aggregation stages for the in-memory store.

use super::matcher::{self, compare_values};
use super::path;
use crate::errors::StoreError;
use mongodb::bson::{Bson, Document};
use std::cmp::Ordering;

/// Run `pipeline` over `documents` in stage order
pub fn run(mut documents: Vec<Document>, pipeline: &[Document]) -> Result<Vec<Document>, StoreError> {
    for stage in pipeline {
        let mut entries = stage.iter();
        let (name, spec) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            _ => {
                return Err(StoreError::store(
                    "A pipeline stage specification object must contain exactly one field.",
                ))
            }
        };

        documents = match name.as_str() {
            "$match" => {
                let filter = expect_document(name, spec)?;
                let mut kept = Vec::with_capacity(documents.len());
                for document in documents {
                    if matcher::matches(&document, filter)? {
                        kept.push(document);
                    }
                }
                kept
            }
            "$skip" => {
                let count = expect_count(name, spec, true)?;
                documents.into_iter().skip(count).collect()
            }
            "$limit" => {
                let count = expect_count(name, spec, false)?;
                documents.truncate(count);
                documents
            }
            "$project" => {
                let spec = expect_document(name, spec)?;
                documents
                    .iter()
                    .map(|document| project(document, spec))
                    .collect::<Result<_, _>>()?
            }
            "$count" => {
                let Bson::String(field) = spec else {
                    return Err(StoreError::store("the count field must be a non-empty string"));
                };
                if field.is_empty() || field.starts_with('$') || field.contains('.') {
                    return Err(StoreError::store("the count field must be a non-empty string"));
                }
                if documents.is_empty() {
                    Vec::new()
                } else {
                    let mut counted = Document::new();
                    counted.insert(field.clone(), Bson::Int32(documents.len() as i32));
                    vec![counted]
                }
            }
            "$sort" => {
                let keys = expect_document(name, spec)?;
                sort(&mut documents, keys)?;
                documents
            }
            other => {
                return Err(StoreError::store(format!(
                    "Unrecognized pipeline stage name: '{}'",
                    other
                )))
            }
        };
    }

    Ok(documents)
}

fn expect_document<'a>(stage: &str, spec: &'a Bson) -> Result<&'a Document, StoreError> {
    match spec {
        Bson::Document(inner) => Ok(inner),
        _ => Err(StoreError::store(format!(
            "the {} specification must be an object",
            stage
        ))),
    }
}

fn expect_count(stage: &str, spec: &Bson, allow_zero: bool) -> Result<usize, StoreError> {
    let value = matcher::as_number(spec)
        .filter(|n| n.fract() == 0.0)
        .ok_or_else(|| StoreError::store(format!("invalid argument to {} stage", stage)))?;

    if value < 0.0 || (!allow_zero && value == 0.0) {
        return Err(StoreError::store(format!(
            "invalid argument to {} stage: must be positive",
            stage
        )));
    }
    Ok(value as usize)
}

/// Apply a `$project` spec to one document
pub fn project(document: &Document, spec: &Document) -> Result<Document, StoreError> {
    let mut id_rule: Option<bool> = None;
    let mut inclusions: Vec<(&str, Option<Bson>)> = Vec::new();
    let mut exclusions: Vec<&str> = Vec::new();

    for (field, rule) in spec {
        let computed = match rule {
            Bson::String(reference) if reference.starts_with('$') => {
                Some(path::get(document, &reference[1..]).cloned().unwrap_or(Bson::Null))
            }
            Bson::Boolean(_) | Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) => None,
            _ => {
                return Err(StoreError::store(format!(
                    "unsupported projection for field '{}'",
                    field
                )))
            }
        };

        let included = computed.is_some() || is_truthy(rule);
        if field == "_id" && computed.is_none() {
            id_rule = Some(included);
            continue;
        }

        if included {
            inclusions.push((field.as_str(), computed));
        } else {
            exclusions.push(field.as_str());
        }
    }

    if !inclusions.is_empty() && !exclusions.is_empty() {
        return Err(StoreError::store(
            "Cannot do exclusion on a field in inclusion projection",
        ));
    }

    let include_id = id_rule.unwrap_or(true);
    let inclusion_mode = !inclusions.is_empty() || (exclusions.is_empty() && id_rule == Some(true));

    if !inclusion_mode {
        let mut projected = document.clone();
        for field in exclusions {
            path::remove(&mut projected, field);
        }
        if !include_id {
            projected.remove("_id");
        }
        return Ok(projected);
    }

    let mut projected = Document::new();
    if include_id {
        if let Some(id) = document.get("_id") {
            projected.insert("_id", id.clone());
        }
    }
    for (field, computed) in inclusions {
        let value = match computed {
            Some(value) => Some(value),
            None => path::get(document, field).cloned(),
        };
        if let Some(value) = value {
            path::set(&mut projected, field, value).map_err(StoreError::store)?;
        }
    }
    Ok(projected)
}

fn is_truthy(rule: &Bson) -> bool {
    match rule {
        Bson::Boolean(b) => *b,
        other => matcher::as_number(other).is_some_and(|n| n != 0.0),
    }
}

fn sort(documents: &mut [Document], keys: &Document) -> Result<(), StoreError> {
    let mut order = Vec::with_capacity(keys.len());
    for (field, direction) in keys {
        let direction = match matcher::as_number(direction) {
            Some(n) if n == 1.0 => Ordering::Less,
            Some(n) if n == -1.0 => Ordering::Greater,
            _ => return Err(StoreError::store("$sort key ordering must be 1 (for ascending) or -1 (for descending)")),
        };
        order.push((field.as_str(), direction));
    }

    documents.sort_by(|a, b| {
        for (field, direction) in &order {
            let ordering = sort_key_cmp(path::get(a, field), path::get(b, field));
            let ordering = if *direction == Ordering::Less {
                ordering
            } else {
                ordering.reverse()
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
    Ok(())
}

/// Missing and null sort first, then by type class, then by value
fn sort_key_cmp(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    let rank = |value: Option<&Bson>| match value {
        None | Some(Bson::Null) => 0,
        Some(v) if matcher::as_number(v).is_some() => 1,
        Some(Bson::String(_)) => 2,
        Some(Bson::Document(_)) => 3,
        Some(Bson::Array(_)) => 4,
        Some(Bson::ObjectId(_)) => 5,
        Some(Bson::Boolean(_)) => 6,
        Some(Bson::DateTime(_)) => 7,
        Some(_) => 8,
    };

    match rank(a).cmp(&rank(b)) {
        Ordering::Equal => match (a, b) {
            (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    fn people() -> Vec<Document> {
        vec![
            doc! { "_id": 1, "name": "b", "age": 30, "status": "active" },
            doc! { "_id": 2, "name": "a", "age": 25, "status": "inactive" },
            doc! { "_id": 3, "name": "c", "age": 41, "status": "active" },
        ]
    }

    #[test]
    fn test_match_skip_limit() {
        let pipeline = vec![
            doc! { "$match": { "status": "active" } },
            doc! { "$skip": 1_i64 },
            doc! { "$limit": 10_i64 },
        ];
        let out = run(people(), &pipeline).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get_i32("_id").unwrap(), 3);
    }

    #[test]
    fn test_count_stage() {
        let out = run(people(), &[doc! { "$count": "total" }]).unwrap();
        assert_eq!(out, vec![doc! { "total": 3 }]);

        let none = run(
            people(),
            &[doc! { "$match": { "age": { "$gt": 100 } } }, doc! { "$count": "total" }],
        )
        .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_projection_modes() {
        let document = doc! { "_id": 1, "name": "x", "email": "e", "nested": { "a": 1, "b": 2 } };

        let included = project(&document, &doc! { "name": 1, "nested.a": 1 }).unwrap();
        assert_eq!(included, doc! { "_id": 1, "name": "x", "nested": { "a": 1 } });

        let excluded = project(&document, &doc! { "email": 0, "_id": 0 }).unwrap();
        assert_eq!(excluded, doc! { "name": "x", "nested": { "a": 1, "b": 2 } });

        let ids = project(&document, &doc! { "_id": 1 }).unwrap();
        assert_eq!(ids, doc! { "_id": 1 });

        assert!(project(&document, &doc! { "name": 1, "email": 0 }).is_err());
    }

    #[test]
    fn test_sort() {
        let out = run(people(), &[doc! { "$sort": { "age": -1 } }]).unwrap();
        let ages: Vec<i32> = out.iter().map(|d| d.get_i32("age").unwrap()).collect();
        assert_eq!(ages, vec![41, 30, 25]);
    }

    #[test]
    fn test_unknown_stage() {
        let err = run(people(), &[doc! { "$lookup": {} }]).unwrap_err();
        assert!(err.to_string().contains("Unrecognized pipeline stage name"));
    }
}
