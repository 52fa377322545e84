//! Update operators for the in-memory store.

use super::matcher::values_equal;
use super::path;
use crate::errors::StoreError;
use mongodb::bson::{Bson, Document};

/// Apply an operator-style update (`$set`, `$unset`) in place
pub fn apply(document: &mut Document, update: &Document) -> Result<(), StoreError> {
    if update.is_empty() {
        return Err(StoreError::store("Update document requires atomic operators"));
    }

    for (operator, fields) in update {
        let Bson::Document(fields) = fields else {
            return Err(StoreError::store(format!(
                "Modifiers operate on fields but we found type {:?} instead",
                fields.element_type()
            )));
        };

        match operator.as_str() {
            "$set" => {
                for (field, value) in fields {
                    guard_id(document, field, Some(value))?;
                    path::set(document, field, value.clone()).map_err(StoreError::store)?;
                }
            }
            "$unset" => {
                for (field, _) in fields {
                    guard_id(document, field, None)?;
                    path::remove(document, field);
                }
            }
            other if other.starts_with('$') => {
                return Err(StoreError::store(format!(
                    "Unknown modifier: {}. Expected a valid update modifier",
                    other
                )));
            }
            _ => {
                return Err(StoreError::store("Update document requires atomic operators"));
            }
        }
    }

    Ok(())
}

/// Build the stored form of a replacement, keeping the original `_id` first
pub fn replacement(original: &Document, replacement: &Document) -> Result<Document, StoreError> {
    if replacement.keys().any(|key| key.starts_with('$')) {
        return Err(StoreError::store("Replacement document must not contain update operators"));
    }

    let mut stored = Document::new();
    if let Some(id) = original.get("_id") {
        if let Some(new_id) = replacement.get("_id") {
            if !values_equal(id, new_id) {
                return Err(immutable_id());
            }
        }
        stored.insert("_id", id.clone());
    }
    for (key, value) in replacement {
        if key != "_id" {
            stored.insert(key.clone(), value.clone());
        }
    }
    Ok(stored)
}

fn guard_id(document: &Document, field: &str, value: Option<&Bson>) -> Result<(), StoreError> {
    if field != "_id" && !field.starts_with("_id.") {
        return Ok(());
    }
    match (document.get("_id"), value) {
        (Some(current), Some(value)) if field == "_id" && values_equal(current, value) => Ok(()),
        _ => Err(immutable_id()),
    }
}

fn immutable_id() -> StoreError {
    StoreError::store("Performing an update on the path '_id' would modify the immutable field '_id'")
}
