//! Walk through the entity service against the in-memory store.
//!
//! Run with: cargo run --example quickstart

use dochaus::prelude::*;
use serde_json::json;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dochaus = DocHaus::with_store(Arc::new(MemoryStore::new()), ServiceConfig::default());

    dochaus
        .ensure_indexes(&[IndexConfig {
            collection: "users".to_string(),
            keys: vec![IndexKeyConfig {
                field: "email".to_string(),
                order: IndexOrder::Asc,
            }],
            unique: true,
            name: None,
        }])
        .await?;

    let service = dochaus.service();
    let ctx = RequestContext::new();

    let batch = service
        .create_many(
            &ctx,
            CreateManyRequest {
                entity_type: "users".to_string(),
                entities: vec![
                    TypedStruct::try_from(json!({"name": "Ada", "email": "ada@example.com", "role": "admin"}))?,
                    TypedStruct::try_from(json!({"name": "Grace", "email": "grace@example.com", "role": "dev"}))?,
                    TypedStruct::try_from(json!({"name": "Ada again", "email": "ada@example.com"}))?,
                    TypedStruct::try_from(json!({"name": "Linus", "email": "linus@example.com", "role": "dev"}))?,
                ],
                ordered: false,
            },
        )
        .await?;
    println!(
        "batch: created={} errors={} ({})",
        batch.created_count,
        batch.errors.len(),
        batch.message
    );

    let page = service
        .query(
            &ctx,
            QueryRequest {
                entity_type: "users".to_string(),
                filters: TypedStruct::try_from(json!({"role": "dev"}))?,
                fields: vec!["name".to_string()],
                page: 1,
                page_size: 10,
                ..Default::default()
            },
        )
        .await?;
    println!("query: {}", serde_json::to_string_pretty(&page)?);

    if let Some(id) = batch.ids.first() {
        let updated = service
            .update(
                &ctx,
                UpdateRequest {
                    entity_type: "users".to_string(),
                    id: id.clone(),
                    data: Some(TypedStruct::new().with("role", "owner")),
                    partial_update: true,
                },
            )
            .await?;
        println!("update: {}", serde_json::to_string_pretty(&updated)?);
    }

    let removed = service
        .delete_many(
            &ctx,
            DeleteManyRequest {
                entity_type: "users".to_string(),
                ids: batch.ids.iter().cloned().chain(["bad-id".to_string()]).collect(),
                ..Default::default()
            },
        )
        .await?;
    println!(
        "delete_many: deleted={} failed={:?}",
        removed.deleted_count, removed.failed_ids
    );

    dochaus.shutdown().await?;
    Ok(())
}
