//! MongoDB-backed document store.

use crate::errors::StoreError;
use crate::traits::{AggregateOptions, DocumentStore, IndexSpec, InsertManyOutcome, WriteFailure};
use crate::validation::ValidatedCollectionName;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::ErrorKind;
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};
use std::collections::HashSet;

/// [`DocumentStore`] over a driver client and one database
#[derive(Debug, Clone)]
pub struct MongoStore {
    client: Client,
    database: Database,
}

impl MongoStore {
    pub fn new(client: Client, database_name: &str) -> Self {
        let database = client.database(database_name);
        Self { client, database }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    fn collection(&self, name: &ValidatedCollectionName) -> Collection<Document> {
        self.database.collection::<Document>(name.as_str())
    }
}

/// Give every document a client-side `_id` so inserted ids are known up front
fn assign_ids(documents: Vec<Document>) -> Vec<(Bson, Document)> {
    documents
        .into_iter()
        .map(|mut document| {
            let id = match document.get("_id") {
                Some(id) => id.clone(),
                None => {
                    let id = Bson::ObjectId(ObjectId::new());
                    document.insert("_id", id.clone());
                    id
                }
            };
            (id, document)
        })
        .collect()
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn insert_one(
        &self,
        collection: &ValidatedCollectionName,
        document: Document,
    ) -> Result<Bson, StoreError> {
        let result = self.collection(collection).insert_one(document).await?;
        Ok(result.inserted_id)
    }

    async fn insert_many(
        &self,
        collection: &ValidatedCollectionName,
        documents: Vec<Document>,
        ordered: bool,
    ) -> Result<InsertManyOutcome, StoreError> {
        let batch = assign_ids(documents);
        let ids: Vec<Bson> = batch.iter().map(|(id, _)| id.clone()).collect();
        let documents: Vec<Document> = batch.into_iter().map(|(_, document)| document).collect();

        let result = self
            .collection(collection)
            .insert_many(documents)
            .ordered(ordered)
            .await;

        match result {
            Ok(_) => Ok(InsertManyOutcome {
                inserted: ids.into_iter().enumerate().collect(),
                errors: Vec::new(),
            }),
            Err(err) => {
                let ErrorKind::InsertMany(failure) = err.kind.as_ref() else {
                    return Err(err.into());
                };
                let Some(write_errors) = failure.write_errors.as_ref() else {
                    return Err(err.into());
                };

                let errors: Vec<WriteFailure> = write_errors
                    .iter()
                    .map(|e| WriteFailure {
                        index: e.index,
                        code: e.code,
                        message: e.message.clone(),
                    })
                    .collect();

                // Ordered inserts stop at the first failing document
                let cutoff = if ordered {
                    errors.iter().map(|e| e.index).min().unwrap_or(ids.len())
                } else {
                    ids.len()
                };
                let failed: HashSet<usize> = errors.iter().map(|e| e.index).collect();

                let inserted = ids
                    .into_iter()
                    .enumerate()
                    .take(cutoff)
                    .filter(|(index, _)| !failed.contains(index))
                    .collect();

                Ok(InsertManyOutcome { inserted, errors })
            }
        }
    }

    async fn find_one(
        &self,
        collection: &ValidatedCollectionName,
        filter: Document,
        projection: Option<Document>,
    ) -> Result<Option<Document>, StoreError> {
        let target = self.collection(collection);
        let mut action = target.find_one(filter);
        if let Some(projection) = projection.filter(|p| !p.is_empty()) {
            action = action.projection(projection);
        }
        Ok(action.await?)
    }

    async fn update_one(
        &self,
        collection: &ValidatedCollectionName,
        filter: Document,
        update: Document,
    ) -> Result<Option<Document>, StoreError> {
        let updated = self
            .collection(collection)
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await?;
        Ok(updated)
    }

    async fn replace_one(
        &self,
        collection: &ValidatedCollectionName,
        filter: Document,
        replacement: Document,
    ) -> Result<Option<Document>, StoreError> {
        let replaced = self
            .collection(collection)
            .find_one_and_replace(filter, replacement)
            .return_document(ReturnDocument::After)
            .await?;
        Ok(replaced)
    }

    async fn delete_one(
        &self,
        collection: &ValidatedCollectionName,
        filter: Document,
    ) -> Result<u64, StoreError> {
        let result = self.collection(collection).delete_one(filter).await?;
        Ok(result.deleted_count)
    }

    async fn delete_many(
        &self,
        collection: &ValidatedCollectionName,
        filter: Document,
    ) -> Result<u64, StoreError> {
        let result = self.collection(collection).delete_many(filter).await?;
        Ok(result.deleted_count)
    }

    async fn aggregate(
        &self,
        collection: &ValidatedCollectionName,
        pipeline: Vec<Document>,
        options: AggregateOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let target = self.collection(collection);
        let mut action = target
            .aggregate(pipeline)
            .allow_disk_use(options.allow_disk_use);
        if let Some(max_time) = options.max_time {
            action = action.max_time(max_time);
        }

        let cursor = action.await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        Ok(documents)
    }

    async fn create_index(
        &self,
        collection: &ValidatedCollectionName,
        index: IndexSpec,
    ) -> Result<String, StoreError> {
        let mut options = IndexOptions::default();
        if index.unique {
            options.unique = Some(true);
        }
        options.name = index.name.clone();

        let model = IndexModel::builder()
            .keys(index.keys_document())
            .options(options)
            .build();

        let result = self.collection(collection).create_index(model).await?;
        Ok(result.index_name)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), StoreError> {
        self.client.clone().shutdown().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_ids_keeps_existing() {
        let existing = ObjectId::new();
        let batch = assign_ids(vec![doc! { "_id": existing, "a": 1 }, doc! { "b": 2 }]);

        assert_eq!(batch[0].0, Bson::ObjectId(existing));
        assert!(matches!(batch[1].0, Bson::ObjectId(_)));
        assert_eq!(batch[1].1.get("_id"), Some(&batch[1].0));
    }
}
