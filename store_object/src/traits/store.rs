//! Document store capability
//!
//! A store supporting filter, projection, pipeline aggregation, and
//! ordered/unordered bulk insert. Collections are addressed by validated name.

use crate::errors::StoreError;
use crate::validation::ValidatedCollectionName;
use async_trait::async_trait;
use mongodb::bson::{Bson, Document};
use std::fmt::Debug;
use std::time::Duration;

/// Server code for a duplicate key on a unique index
pub const DUPLICATE_KEY_CODE: i32 = 11000;

/// One document that a bulk insert could not write
#[derive(Debug, Clone, PartialEq)]
pub struct WriteFailure {
    /// Position in the submitted batch
    pub index: usize,
    pub code: i32,
    pub message: String,
}

/// Result of a bulk insert that reached the store
///
/// Ordered inserts stop at the first failure, so `errors` holds at most one
/// entry and `inserted` only the prefix before it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertManyOutcome {
    /// `(batch index, _id)` for every written document
    pub inserted: Vec<(usize, Bson)>,
    pub errors: Vec<WriteFailure>,
}

impl InsertManyOutcome {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateOptions {
    pub allow_disk_use: bool,
    /// Server-side execution limit
    pub max_time: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Ascending,
    Descending,
    Text,
}

impl IndexKind {
    /// Key value as the server expects it in an index spec
    pub fn to_bson(self) -> Bson {
        match self {
            IndexKind::Ascending => Bson::Int32(1),
            IndexKind::Descending => Bson::Int32(-1),
            IndexKind::Text => Bson::String("text".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    pub keys: Vec<(String, IndexKind)>,
    pub unique: bool,
    pub name: Option<String>,
}

impl IndexSpec {
    pub fn keys_document(&self) -> Document {
        self.keys
            .iter()
            .map(|(field, kind)| (field.clone(), kind.to_bson()))
            .collect()
    }

    /// Name the server would generate: `field_1_other_-1`
    pub fn default_name(&self) -> String {
        self.keys
            .iter()
            .map(|(field, kind)| match kind {
                IndexKind::Ascending => format!("{}_1", field),
                IndexKind::Descending => format!("{}_-1", field),
                IndexKind::Text => format!("{}_text", field),
            })
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// Async capability the entity executors run against
#[async_trait]
pub trait DocumentStore: Send + Sync + Debug {
    /// Insert one document and return its `_id`
    async fn insert_one(
        &self,
        collection: &ValidatedCollectionName,
        document: Document,
    ) -> Result<Bson, StoreError>;

    /// Insert a batch; per-document write failures are reported in the outcome
    async fn insert_many(
        &self,
        collection: &ValidatedCollectionName,
        documents: Vec<Document>,
        ordered: bool,
    ) -> Result<InsertManyOutcome, StoreError>;

    async fn find_one(
        &self,
        collection: &ValidatedCollectionName,
        filter: Document,
        projection: Option<Document>,
    ) -> Result<Option<Document>, StoreError>;

    /// Apply an update document to the first match and return it as updated
    async fn update_one(
        &self,
        collection: &ValidatedCollectionName,
        filter: Document,
        update: Document,
    ) -> Result<Option<Document>, StoreError>;

    /// Replace the first match (keeping its `_id`) and return the replacement
    async fn replace_one(
        &self,
        collection: &ValidatedCollectionName,
        filter: Document,
        replacement: Document,
    ) -> Result<Option<Document>, StoreError>;

    /// Returns the number of documents deleted (0 or 1)
    async fn delete_one(
        &self,
        collection: &ValidatedCollectionName,
        filter: Document,
    ) -> Result<u64, StoreError>;

    async fn delete_many(
        &self,
        collection: &ValidatedCollectionName,
        filter: Document,
    ) -> Result<u64, StoreError>;

    async fn aggregate(
        &self,
        collection: &ValidatedCollectionName,
        pipeline: Vec<Document>,
        options: AggregateOptions,
    ) -> Result<Vec<Document>, StoreError>;

    /// Create an index and return its name
    async fn create_index(
        &self,
        collection: &ValidatedCollectionName,
        index: IndexSpec,
    ) -> Result<String, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    async fn shutdown(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_spec_keys_and_name() {
        let spec = IndexSpec {
            keys: vec![
                ("email".to_string(), IndexKind::Ascending),
                ("createdAt".to_string(), IndexKind::Descending),
            ],
            unique: true,
            name: None,
        };

        let keys = spec.keys_document();
        assert_eq!(keys.get("email"), Some(&Bson::Int32(1)));
        assert_eq!(keys.get("createdAt"), Some(&Bson::Int32(-1)));
        assert_eq!(spec.default_name(), "email_1_createdAt_-1");
    }

    #[test]
    fn test_outcome_completeness() {
        let mut outcome = InsertManyOutcome::default();
        assert!(outcome.is_complete());
        outcome.errors.push(WriteFailure {
            index: 2,
            code: DUPLICATE_KEY_CODE,
            message: "E11000 duplicate key error".to_string(),
        });
        assert!(!outcome.is_complete());
    }
}
