//! Selection pipeline for bulk deletes.

use crate::id_type::EntityId;
use crate::query_builder::stages;
use mongodb::bson::Document;

/// Caller stages, then the id restriction (if any), then `_id` projection
///
/// Supplying both stages and ids selects their intersection.
pub fn selection_pipeline(caller_stages: Vec<Document>, ids: &[EntityId]) -> Vec<Document> {
    let mut pipeline = caller_stages;
    if !ids.is_empty() {
        pipeline.push(stages::match_stage(stages::ids_filter(ids)));
    }
    pipeline.push(stages::project_ids());
    pipeline
}
