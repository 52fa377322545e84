//! In-process document store
//!
//! A thread-safe [`DocumentStore`] kept entirely in memory. It evaluates the
//! same filters, pipeline stages and update operators the entity executors
//! emit, assigns `_id`s the way the driver does, and enforces unique indexes
//! with the server's duplicate-key code. Used for tests and local development.

pub mod matcher;
pub mod path;
pub mod pipeline;
pub mod update;

use crate::errors::StoreError;
use crate::traits::store::DUPLICATE_KEY_CODE;
use crate::traits::{
    AggregateOptions, DocumentStore, IndexKind, IndexSpec, InsertManyOutcome, WriteFailure,
};
use crate::validation::ValidatedCollectionName;
use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, Document};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct NamedIndex {
    name: String,
    spec: IndexSpec,
}

#[derive(Debug, Default)]
struct MemoryCollection {
    documents: Vec<Document>,
    indexes: Vec<NamedIndex>,
}

impl MemoryCollection {
    fn position(&self, filter: &Document) -> Result<Option<usize>, StoreError> {
        for (index, document) in self.documents.iter().enumerate() {
            if matcher::matches(document, filter)? {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    /// Reject `candidate` if it collides with another document on `_id` or a unique index
    fn check_unique(
        &self,
        collection: &str,
        candidate: &Document,
        skip: Option<usize>,
    ) -> Result<(), WriteFailure> {
        let others = self
            .documents
            .iter()
            .enumerate()
            .filter(|(position, _)| Some(*position) != skip)
            .map(|(_, document)| document);

        let id = candidate.get("_id").cloned().unwrap_or(Bson::Null);
        for other in others.clone() {
            if other.get("_id").is_some_and(|existing| matcher::values_equal(existing, &id)) {
                return Err(duplicate(collection, "_id_", &[("_id", &id)]));
            }
        }

        for index in self.indexes.iter().filter(|index| index.spec.unique) {
            let fields: Vec<&str> = index
                .spec
                .keys
                .iter()
                .filter(|(_, kind)| *kind != IndexKind::Text)
                .map(|(field, _)| field.as_str())
                .collect();
            if fields.is_empty() {
                continue;
            }

            let key = index_key(candidate, &fields);
            for other in others.clone() {
                let other_key = index_key(other, &fields);
                if key
                    .iter()
                    .zip(&other_key)
                    .all(|(a, b)| matcher::values_equal(a, b))
                {
                    let parts: Vec<(&str, &Bson)> =
                        fields.iter().copied().zip(key.iter()).collect();
                    return Err(duplicate(collection, &index.name, &parts));
                }
            }
        }

        Ok(())
    }
}

fn index_key(document: &Document, fields: &[&str]) -> Vec<Bson> {
    fields
        .iter()
        .map(|field| path::get(document, field).cloned().unwrap_or(Bson::Null))
        .collect()
}

fn duplicate(collection: &str, index: &str, key: &[(&str, &Bson)]) -> WriteFailure {
    let rendered = key
        .iter()
        .map(|(field, value)| format!("{}: {}", field, value))
        .collect::<Vec<_>>()
        .join(", ");
    WriteFailure {
        index: 0,
        code: DUPLICATE_KEY_CODE,
        message: format!(
            "E11000 duplicate key error collection: {} index: {} dup key: {{ {} }}",
            collection, index, rendered
        ),
    }
}

fn with_id(document: Document) -> Document {
    if document.contains_key("_id") {
        return document;
    }
    let mut stored = Document::new();
    stored.insert("_id", ObjectId::new());
    for (key, value) in document {
        stored.insert(key, value);
    }
    stored
}

/// In-memory implementation of [`DocumentStore`]
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, MemoryCollection>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently stored in `collection`
    pub async fn len(&self, collection: &ValidatedCollectionName) -> usize {
        self.collections
            .read()
            .await
            .get(collection.as_str())
            .map_or(0, |c| c.documents.len())
    }

    pub async fn is_empty(&self, collection: &ValidatedCollectionName) -> bool {
        self.len(collection).await == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_one(
        &self,
        collection: &ValidatedCollectionName,
        document: Document,
    ) -> Result<Bson, StoreError> {
        let document = with_id(document);
        let mut collections = self.collections.write().await;
        let target = collections.entry(collection.as_str().to_string()).or_default();

        target
            .check_unique(collection.as_str(), &document, None)
            .map_err(|failure| StoreError::store(failure.message))?;

        let id = document.get("_id").cloned().unwrap_or(Bson::Null);
        target.documents.push(document);
        Ok(id)
    }

    async fn insert_many(
        &self,
        collection: &ValidatedCollectionName,
        documents: Vec<Document>,
        ordered: bool,
    ) -> Result<InsertManyOutcome, StoreError> {
        let mut collections = self.collections.write().await;
        let target = collections.entry(collection.as_str().to_string()).or_default();
        let mut outcome = InsertManyOutcome::default();

        for (index, document) in documents.into_iter().enumerate() {
            let document = with_id(document);
            match target.check_unique(collection.as_str(), &document, None) {
                Ok(()) => {
                    outcome
                        .inserted
                        .push((index, document.get("_id").cloned().unwrap_or(Bson::Null)));
                    target.documents.push(document);
                }
                Err(failure) => {
                    outcome.errors.push(WriteFailure { index, ..failure });
                    if ordered {
                        break;
                    }
                }
            }
        }

        Ok(outcome)
    }

    async fn find_one(
        &self,
        collection: &ValidatedCollectionName,
        filter: Document,
        projection: Option<Document>,
    ) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        let Some(source) = collections.get(collection.as_str()) else {
            return Ok(None);
        };

        match source.position(&filter)? {
            Some(position) => {
                let document = &source.documents[position];
                match projection {
                    Some(spec) if !spec.is_empty() => pipeline::project(document, &spec).map(Some),
                    _ => Ok(Some(document.clone())),
                }
            }
            None => Ok(None),
        }
    }

    async fn update_one(
        &self,
        collection: &ValidatedCollectionName,
        filter: Document,
        update: Document,
    ) -> Result<Option<Document>, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(target) = collections.get_mut(collection.as_str()) else {
            return Ok(None);
        };
        let Some(position) = target.position(&filter)? else {
            return Ok(None);
        };

        let mut updated = target.documents[position].clone();
        update::apply(&mut updated, &update)?;
        target
            .check_unique(collection.as_str(), &updated, Some(position))
            .map_err(|failure| StoreError::store(failure.message))?;

        target.documents[position] = updated.clone();
        Ok(Some(updated))
    }

    async fn replace_one(
        &self,
        collection: &ValidatedCollectionName,
        filter: Document,
        replacement: Document,
    ) -> Result<Option<Document>, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(target) = collections.get_mut(collection.as_str()) else {
            return Ok(None);
        };
        let Some(position) = target.position(&filter)? else {
            return Ok(None);
        };

        let stored = update::replacement(&target.documents[position], &replacement)?;
        target
            .check_unique(collection.as_str(), &stored, Some(position))
            .map_err(|failure| StoreError::store(failure.message))?;

        target.documents[position] = stored.clone();
        Ok(Some(stored))
    }

    async fn delete_one(
        &self,
        collection: &ValidatedCollectionName,
        filter: Document,
    ) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(target) = collections.get_mut(collection.as_str()) else {
            return Ok(0);
        };

        match target.position(&filter)? {
            Some(position) => {
                target.documents.remove(position);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_many(
        &self,
        collection: &ValidatedCollectionName,
        filter: Document,
    ) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(target) = collections.get_mut(collection.as_str()) else {
            return Ok(0);
        };

        // Match every document first; a filter error leaves the collection untouched
        let matched = target
            .documents
            .iter()
            .map(|document| matcher::matches(document, &filter))
            .collect::<Result<Vec<bool>, _>>()?;

        let mut verdicts = matched.iter();
        target
            .documents
            .retain(|_| !verdicts.next().copied().unwrap_or(false));
        Ok(matched.iter().filter(|&&hit| hit).count() as u64)
    }

    async fn aggregate(
        &self,
        collection: &ValidatedCollectionName,
        pipeline: Vec<Document>,
        _options: AggregateOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let snapshot = {
            let collections = self.collections.read().await;
            collections
                .get(collection.as_str())
                .map(|c| c.documents.clone())
                .unwrap_or_default()
        };

        pipeline::run(snapshot, &pipeline)
    }

    async fn create_index(
        &self,
        collection: &ValidatedCollectionName,
        index: IndexSpec,
    ) -> Result<String, StoreError> {
        if index.keys.is_empty() {
            return Err(StoreError::store("Index keys cannot be empty"));
        }

        let name = index.name.clone().unwrap_or_else(|| index.default_name());
        let mut collections = self.collections.write().await;
        let target = collections.entry(collection.as_str().to_string()).or_default();

        if let Some(existing) = target.indexes.iter().find(|existing| existing.name == name) {
            if existing.spec.keys != index.keys || existing.spec.unique != index.unique {
                return Err(StoreError::store(format!(
                    "An existing index has the same name as the requested index: {}",
                    name
                )));
            }
            return Ok(name);
        }

        let candidate = NamedIndex {
            name: name.clone(),
            spec: index,
        };
        if candidate.spec.unique {
            let mut probe = MemoryCollection {
                documents: Vec::new(),
                indexes: vec![candidate.clone()],
            };
            for document in &target.documents {
                probe
                    .check_unique(collection.as_str(), document, None)
                    .map_err(|failure| StoreError::store(failure.message))?;
                probe.documents.push(document.clone());
            }
        }

        target.indexes.push(candidate);
        Ok(name)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    fn users() -> ValidatedCollectionName {
        ValidatedCollectionName::new("users").unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_object_id() {
        let store = MemoryStore::new();
        let id = store.insert_one(&users(), doc! { "name": "a" }).await.unwrap();
        assert!(matches!(id, Bson::ObjectId(_)));

        let found = store
            .find_one(&users(), doc! { "_id": id.clone() }, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.keys().next().map(String::as_str), Some("_id"));
        assert_eq!(found.get_str("name").unwrap(), "a");
    }

    #[tokio::test]
    async fn test_unique_index_in_unordered_batch() {
        let store = MemoryStore::new();
        store
            .create_index(
                &users(),
                IndexSpec {
                    keys: vec![("email".to_string(), IndexKind::Ascending)],
                    unique: true,
                    name: None,
                },
            )
            .await
            .unwrap();

        let batch = vec![
            doc! { "email": "a@x" },
            doc! { "email": "b@x" },
            doc! { "email": "a@x" },
            doc! { "email": "c@x" },
        ];
        let outcome = store.insert_many(&users(), batch.clone(), false).await.unwrap();
        assert_eq!(outcome.inserted.len(), 3);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].index, 2);
        assert_eq!(outcome.errors[0].code, DUPLICATE_KEY_CODE);
        assert!(outcome.errors[0].message.contains("email_1"));

        let ordered = store.insert_many(&users(), batch, true).await.unwrap();
        assert!(ordered.inserted.is_empty());
        assert_eq!(ordered.errors.len(), 1);
        assert_eq!(ordered.errors[0].index, 0);
    }

    #[tokio::test]
    async fn test_update_replace_delete() {
        let store = MemoryStore::new();
        let id = store
            .insert_one(&users(), doc! { "name": "a", "age": 1 })
            .await
            .unwrap();

        let updated = store
            .update_one(&users(), doc! { "_id": id.clone() }, doc! { "$set": { "age": 2 } })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.get_i32("age").unwrap(), 2);
        assert_eq!(updated.get_str("name").unwrap(), "a");

        let replaced = store
            .replace_one(&users(), doc! { "_id": id.clone() }, doc! { "name": "b" })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(replaced, doc! { "_id": id.clone(), "name": "b" });

        assert_eq!(store.delete_one(&users(), doc! { "_id": id.clone() }).await.unwrap(), 1);
        assert_eq!(store.delete_one(&users(), doc! { "_id": id }).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_collection_reads_empty() {
        let store = MemoryStore::new();
        let empty = ValidatedCollectionName::new("nothing").unwrap();
        assert!(store.find_one(&empty, doc! {}, None).await.unwrap().is_none());
        assert!(store
            .aggregate(&empty, vec![doc! { "$count": "total" }], AggregateOptions::default())
            .await
            .unwrap()
            .is_empty());
        assert_eq!(store.delete_many(&empty, doc! {}).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_many_with_bad_filter_keeps_documents() {
        let store = MemoryStore::new();
        for name in ["a", "b", "c"] {
            store.insert_one(&users(), doc! { "name": name }).await.unwrap();
        }

        let result = store.delete_many(&users(), doc! { "$bogus": 1 }).await;
        assert!(result.is_err());
        assert_eq!(store.len(&users()).await, 3);

        let deleted = store
            .delete_many(&users(), doc! { "name": { "$in": ["a", "c"] } })
            .await
            .unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(store.len(&users()).await, 1);
    }

    #[tokio::test]
    async fn test_unique_index_rejects_existing_duplicates() {
        let store = MemoryStore::new();
        store.insert_one(&users(), doc! { "email": "a" }).await.unwrap();
        store.insert_one(&users(), doc! { "email": "a" }).await.unwrap();

        let result = store
            .create_index(
                &users(),
                IndexSpec {
                    keys: vec![("email".to_string(), IndexKind::Ascending)],
                    unique: true,
                    name: Some("uniq_email".to_string()),
                },
            )
            .await;
        assert!(result.is_err());
    }
}
