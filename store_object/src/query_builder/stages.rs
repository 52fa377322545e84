//! Constructors for the pipeline stages the builder emits.

use crate::id_type::EntityId;
use crate::validation::ValidatedFieldName;
use mongodb::bson::{doc, Bson, Document};

pub fn match_stage(conditions: Document) -> Document {
    doc! { "$match": conditions }
}

pub fn skip(count: i64) -> Document {
    doc! { "$skip": count }
}

pub fn limit(count: i64) -> Document {
    doc! { "$limit": count }
}

/// `{"$project": {field: 1, ...}}`
pub fn project_fields(fields: &[ValidatedFieldName]) -> Document {
    let spec: Document = fields
        .iter()
        .map(|field| (field.as_str().to_string(), Bson::Int32(1)))
        .collect();
    doc! { "$project": spec }
}

pub fn count(field: &str) -> Document {
    doc! { "$count": field }
}

/// Keep only `_id`
pub fn project_ids() -> Document {
    doc! { "$project": { "_id": 1 } }
}

/// `{"_id": {"$in": [...]}}`
pub fn ids_filter(ids: &[EntityId]) -> Document {
    let ids: Vec<Bson> = ids.iter().map(|id| Bson::from(*id)).collect();
    doc! { "_id": { "$in": ids } }
}
