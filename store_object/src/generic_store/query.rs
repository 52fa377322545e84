//! Read execution: lookup by id, paginated queries, aggregation.

use super::core::EntityStore;
use crate::context::RequestContext;
use crate::errors::StoreError;
use crate::id_type::EntityId;
use crate::limits::clamp_aggregate_time;
use crate::query_builder::builder::COUNT_FIELD;
use crate::query_builder::{PageRequest, Pagination, PipelineBuilder, QueryFilter, TextSearch};
use crate::traits::AggregateOptions;
use crate::validation::{utils, ValidationError};
use mongodb::bson::{doc, Bson, Document};
use std::time::Instant;
use type_mapping::{from_document, TypedStruct};

/// Declarative query parameters, already decoded from the request
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pub filters: TypedStruct,
    pub search_text: String,
    pub search_fields: Vec<String>,
    /// Caller stages, appended to the data pipeline only
    pub pipeline: Vec<Document>,
    pub fields: Vec<String>,
    pub page: PageRequest,
}

/// One page of entities
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub entities: Vec<TypedStruct>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult {
    pub results: Vec<TypedStruct>,
    pub execution_time_ms: i64,
}

/// Numeric `total` of the count pipeline's single document, 0 if none
fn read_total(documents: &[Document]) -> i64 {
    match documents.first().and_then(|d| d.get(COUNT_FIELD)) {
        Some(Bson::Int32(n)) => i64::from(*n),
        Some(Bson::Int64(n)) => *n,
        Some(Bson::Double(n)) => *n as i64,
        _ => 0,
    }
}

/// Convert result documents, omitting any that cannot be represented
fn convert_all(collection: &str, documents: &[Document]) -> Vec<TypedStruct> {
    documents
        .iter()
        .filter_map(|document| match from_document(document) {
            Ok(entity) => Some(entity),
            Err(e) => {
                tracing::warn!(
                    "[QUERY] {}: omitting document {:?}: {}",
                    collection,
                    document.get("_id"),
                    e
                );
                None
            }
        })
        .collect()
}

impl EntityStore {
    /// Fetch one entity, optionally restricted to `fields`
    pub async fn get_by_id<S: AsRef<str>>(
        &self,
        ctx: &RequestContext,
        id: EntityId,
        fields: &[S],
    ) -> Result<TypedStruct, StoreError> {
        let projection: Document = utils::validate_field_names(fields)?
            .into_iter()
            .map(|field| (field.into_string(), Bson::Int32(1)))
            .collect();
        let projection = (!projection.is_empty()).then_some(projection);

        let document = ctx
            .run(
                self.store
                    .find_one(&self.collection, doc! { "_id": id }, projection),
            )
            .await
            .map_err(|e| e.context("failed to get entity"))?
            .ok_or(StoreError::NotFound)?;

        Ok(from_document(&document)?)
    }

    /// Run the count and data pipelines concurrently and join both
    ///
    /// Neither sub-query short-circuits the other. When both fail, the count
    /// error is the one reported.
    pub async fn query(&self, ctx: &RequestContext, request: QueryParams) -> Result<Page, StoreError> {
        let plan = self.plan(request)?;

        let count = ctx.run(self.store.aggregate(
            &self.collection,
            plan.count,
            AggregateOptions::default(),
        ));
        let data = ctx.run(self.store.aggregate(
            &self.collection,
            plan.data,
            AggregateOptions::default(),
        ));

        let (count, data) = tokio::join!(count, data);

        let counted = count.map_err(|e| e.context("failed to count entities"))?;
        let documents = data.map_err(|e| e.context("failed to query entities"))?;

        let total = read_total(&counted);
        trace_log!(
            "[QUERY] {} total={} returned={}",
            self.collection,
            total,
            documents.len()
        );

        Ok(Page {
            entities: convert_all(self.collection.as_str(), &documents),
            pagination: Pagination::new(plan.page, total),
        })
    }

    fn plan(&self, request: QueryParams) -> Result<crate::query_builder::QueryPlan, ValidationError> {
        let search = TextSearch::new(&request.search_text, &request.search_fields)?;
        let filter = QueryFilter::new()
            .with_filters(request.filters)
            .with_search(search);

        Ok(PipelineBuilder::new()
            .filter(filter)
            .stages(request.pipeline)
            .fields(&request.fields)?
            .page(request.page)
            .build())
    }

    /// Run a caller pipeline with a clamped server-side time limit
    pub async fn aggregate(
        &self,
        ctx: &RequestContext,
        pipeline: Vec<Document>,
        allow_disk_use: bool,
        max_time_ms: i64,
    ) -> Result<AggregateResult, StoreError> {
        let options = AggregateOptions {
            allow_disk_use,
            max_time: Some(clamp_aggregate_time(max_time_ms)),
        };

        let started = Instant::now();
        let documents = ctx
            .run(self.store.aggregate(&self.collection, pipeline, options))
            .await
            .map_err(|e| e.context("aggregation failed"))?;
        let results = convert_all(self.collection.as_str(), &documents);
        let execution_time_ms = started.elapsed().as_millis() as i64;

        Ok(AggregateResult {
            results,
            execution_time_ms,
        })
    }
}
