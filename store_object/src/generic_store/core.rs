use crate::traits::DocumentStore;
use crate::validation::ValidatedCollectionName;
use mongodb::bson::{self, Document};
use std::sync::Arc;

/// Field stamped when a document is first written
pub const CREATED_AT: &str = "createdAt";
/// Field stamped on every write
pub const UPDATED_AT: &str = "updatedAt";

/// Entity operations for one collection, run against a shared store handle
#[derive(Clone)]
pub struct EntityStore {
    pub(crate) store: Arc<dyn DocumentStore>,
    pub(crate) collection: ValidatedCollectionName,
}

impl std::fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityStore")
            .field("collection", &self.collection.as_str())
            .field("store", &self.store)
            .finish()
    }
}

impl EntityStore {
    pub fn new(store: Arc<dyn DocumentStore>, collection: ValidatedCollectionName) -> Self {
        Self { store, collection }
    }

    pub fn collection(&self) -> &ValidatedCollectionName {
        &self.collection
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }
}

pub(crate) fn now() -> bson::DateTime {
    bson::DateTime::now()
}

/// Stamp both lifecycle fields with the same instant
pub(crate) fn stamp_created(document: &mut Document) {
    let at = now();
    document.insert(CREATED_AT, at);
    document.insert(UPDATED_AT, at);
}
