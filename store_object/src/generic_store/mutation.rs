//! Create, update and delete execution
//!
//! Store failures carry the operation that hit them (`failed to create
//! entity: ...`); cancellation and deadline errors pass through untouched.

use super::core::{now, stamp_created, EntityStore, UPDATED_AT};
use crate::context::RequestContext;
use crate::errors::StoreError;
use crate::id_type::{id_to_string, EntityId};
use crate::query_builder::{selection_pipeline, stages};
use crate::traits::{AggregateOptions, WriteFailure};
use futures::future::join_all;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Bson, Document};
use type_mapping::{from_document, to_document, TypedStruct};

/// A freshly stored entity
#[derive(Debug, Clone, PartialEq)]
pub struct Created {
    pub id: String,
    pub entity: TypedStruct,
}

/// Result of a bulk insert that reached the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    /// Ids of the documents that were written, in batch order
    pub ids: Vec<String>,
    /// Stored documents read back; only filled when the whole batch succeeded
    pub entities: Vec<TypedStruct>,
    pub errors: Vec<WriteFailure>,
}

impl BatchOutcome {
    pub fn created_count(&self) -> usize {
        self.ids.len()
    }

    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// What a bulk delete removes: listed ids, a selection pipeline, or both
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteSelection {
    pub ids: Vec<EntityId>,
    pub pipeline: Vec<Document>,
}

/// Put `_id` first, generating one when the caller supplied none
fn with_object_id(document: Document) -> (Bson, Document) {
    let id = document
        .get("_id")
        .cloned()
        .unwrap_or_else(|| Bson::ObjectId(ObjectId::new()));

    let mut stored = Document::new();
    stored.insert("_id", id.clone());
    for (key, value) in document {
        if key != "_id" {
            stored.insert(key, value);
        }
    }
    (id, stored)
}

/// Caller data as an update body: no `_id`, fresh `updatedAt`
fn update_body(data: &TypedStruct) -> Document {
    let mut body = to_document(data);
    body.remove("_id");
    body.insert(UPDATED_AT, now());
    body
}

impl EntityStore {
    /// Insert one entity and return it as stored
    pub async fn create(
        &self,
        ctx: &RequestContext,
        data: &TypedStruct,
    ) -> Result<Created, StoreError> {
        let mut document = to_document(data);
        stamp_created(&mut document);

        let id = ctx
            .run(self.store.insert_one(&self.collection, document.clone()))
            .await
            .map_err(|e| e.context("failed to create entity"))?;

        let (_, stored) = with_object_id({
            document.insert("_id", id.clone());
            document
        });

        debug_log!("[CREATE] {} id={}", self.collection, id_to_string(&id));

        Ok(Created {
            id: id_to_string(&id),
            entity: from_document(&stored)?,
        })
    }

    /// Insert a batch, each document with its own timestamps and id
    ///
    /// An ordered batch that hits a write error fails as a whole. An unordered
    /// one reports what was written alongside the per-item errors.
    pub async fn create_many(
        &self,
        ctx: &RequestContext,
        entities: &[TypedStruct],
        ordered: bool,
    ) -> Result<BatchOutcome, StoreError> {
        let documents: Vec<Document> = entities
            .iter()
            .map(|entity| {
                let mut document = to_document(entity);
                stamp_created(&mut document);
                with_object_id(document).1
            })
            .collect();

        let outcome = ctx
            .run(self.store.insert_many(&self.collection, documents, ordered))
            .await
            .map_err(|e| e.context("batch insert failed"))?;

        let ids: Vec<Bson> = outcome.inserted.iter().map(|(_, id)| id.clone()).collect();

        if !outcome.errors.is_empty() {
            if ordered {
                let detail = outcome
                    .errors
                    .iter()
                    .map(|e| format!("index {}: {}", e.index, e.message))
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(StoreError::store(format!("batch insert failed: {}", detail)));
            }

            tracing::warn!(
                "[CREATE_MANY] {}: {} of {} documents failed",
                self.collection,
                outcome.errors.len(),
                entities.len()
            );
            return Ok(BatchOutcome {
                ids: ids.iter().map(id_to_string).collect(),
                entities: Vec::new(),
                errors: outcome.errors,
            });
        }

        let entities = self.read_back(ctx, &ids).await?;

        Ok(BatchOutcome {
            ids: ids.iter().map(id_to_string).collect(),
            entities,
            errors: Vec::new(),
        })
    }

    /// Fetch freshly inserted documents concurrently, skipping any that fail
    async fn read_back(
        &self,
        ctx: &RequestContext,
        ids: &[Bson],
    ) -> Result<Vec<TypedStruct>, StoreError> {
        let reads = ids.iter().map(|id| {
            ctx.run(
                self.store
                    .find_one(&self.collection, doc! { "_id": id.clone() }, None),
            )
        });

        let mut entities = Vec::with_capacity(ids.len());
        for (id, result) in ids.iter().zip(join_all(reads).await) {
            match result {
                Ok(Some(document)) => match from_document(&document) {
                    Ok(entity) => entities.push(entity),
                    Err(e) => tracing::warn!(
                        "[CREATE_MANY] omitting {} from response: {}",
                        id_to_string(id),
                        e
                    ),
                },
                Ok(None) => tracing::warn!(
                    "[CREATE_MANY] inserted document {} not found on read-back",
                    id_to_string(id)
                ),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => tracing::warn!(
                    "[CREATE_MANY] read-back of {} failed: {}",
                    id_to_string(id),
                    e
                ),
            }
        }
        Ok(entities)
    }

    /// Update an entity by id and return it as updated
    ///
    /// Partial mode sets only the supplied fields; otherwise the stored
    /// document is replaced by the supplied fields. Either way a caller `_id`
    /// is ignored and `updatedAt` is refreshed.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: EntityId,
        data: &TypedStruct,
        partial: bool,
    ) -> Result<TypedStruct, StoreError> {
        let filter = doc! { "_id": id };
        let body = update_body(data);

        let updated = if partial {
            ctx.run(
                self.store
                    .update_one(&self.collection, filter, doc! { "$set": body }),
            )
            .await
        } else {
            ctx.run(self.store.replace_one(&self.collection, filter, body))
                .await
        }
        .map_err(|e| e.context("failed to update entity"))?
        .ok_or(StoreError::NotFound)?;

        debug_log!("[UPDATE] {} id={} partial={}", self.collection, id, partial);

        Ok(from_document(&updated)?)
    }

    /// Delete one entity; a missing entity is `NotFound`
    pub async fn delete(&self, ctx: &RequestContext, id: EntityId) -> Result<u64, StoreError> {
        let deleted = ctx
            .run(self.store.delete_one(&self.collection, doc! { "_id": id }))
            .await
            .map_err(|e| e.context("failed to delete entity"))?;

        if deleted == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(deleted)
    }

    /// Delete by id list, selection pipeline, or the intersection of both
    pub async fn delete_many(
        &self,
        ctx: &RequestContext,
        selection: DeleteSelection,
    ) -> Result<u64, StoreError> {
        let filter = if selection.pipeline.is_empty() {
            if selection.ids.is_empty() {
                return Ok(0);
            }
            stages::ids_filter(&selection.ids)
        } else {
            let pipeline = selection_pipeline(selection.pipeline, &selection.ids);
            let selected = ctx
                .run(self.store.aggregate(
                    &self.collection,
                    pipeline,
                    AggregateOptions::default(),
                ))
                .await
                .map_err(|e| e.context("failed to execute pipeline"))?;

            let ids: Vec<Bson> = selected
                .into_iter()
                .filter_map(|mut document| document.remove("_id"))
                .collect();
            if ids.is_empty() {
                return Ok(0);
            }
            doc! { "_id": { "$in": ids } }
        };

        let deleted = ctx
            .run(self.store.delete_many(&self.collection, filter))
            .await
            .map_err(|e| e.context("failed to delete entities"))?;

        debug_log!("[DELETE_MANY] {} deleted={}", self.collection, deleted);
        Ok(deleted)
    }
}
