//! Entity service
//!
//! Validates and normalizes requests, dispatches them to the entity
//! executors and shapes the responses. Every failure except cancellation
//! and deadline exhaustion is reported inside the response with
//! `success = false`.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use store_object::limits::clamp_aggregate_time;
use store_object::{
    partition_ids, DeleteSelection, DocumentStore, EntityId, EntityStore, PageRequest,
    QueryParams, RequestContext, StoreError, ValidatedCollectionName, ValidationError,
};
use type_mapping::{to_document, TypedStruct};

use crate::errors::ServiceError;
use crate::messages::{
    AggregateRequest, AggregateResponse, BatchResponse, CreateManyRequest, CreateRequest,
    DeleteManyRequest, DeleteManyResponse, DeleteRequest, DeleteResponse, EntityResponse,
    ErrorDetail, GetByIdRequest, QueryRequest, QueryResponse, ServiceResponse, UpdateRequest,
};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Unwrap a validated value or return the failure response it carries
macro_rules! ensure {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(response) => return Ok(response),
        }
    };
}

/// Turn a store error into a failure response, or the hard error it is
fn settle<R: ServiceResponse>(operation: &str, err: StoreError) -> ServiceResult<R> {
    if let Some(hard) = ServiceError::from_store(&err) {
        tracing::warn!("[{}] aborted: {}", operation, hard);
        return Err(hard);
    }
    tracing::warn!("[{}] failed: {}", operation, err);
    Ok(R::failure(err.to_string()))
}

fn parse_id<R: ServiceResponse>(id: &str) -> Result<EntityId, R> {
    if id.is_empty() {
        return Err(R::failure(ValidationError::Missing("id").to_string()));
    }
    EntityId::parse(id).map_err(|e| R::failure(e.to_string()))
}

fn stages(pipeline: &[TypedStruct]) -> Vec<mongodb::bson::Document> {
    pipeline.iter().map(to_document).collect()
}

/// Request-level facade over the entity executors
#[derive(Debug, Clone)]
pub struct EntityService {
    store: Arc<dyn DocumentStore>,
    request_timeout: Option<Duration>,
}

impl EntityService {
    pub fn new(store: Arc<dyn DocumentStore>, request_timeout: Option<Duration>) -> Self {
        Self {
            store,
            request_timeout,
        }
    }

    /// The caller's context with the default deadline applied when it has none
    fn scoped(&self, ctx: &RequestContext) -> RequestContext {
        ctx.clone().with_timeout_if_unset(self.request_timeout)
    }

    fn entities<R: ServiceResponse>(&self, entity_type: &str) -> Result<EntityStore, R> {
        if entity_type.is_empty() {
            return Err(R::failure(
                ValidationError::Missing("entity_type").to_string(),
            ));
        }
        let collection =
            ValidatedCollectionName::new(entity_type).map_err(|e| R::failure(e.to_string()))?;
        Ok(EntityStore::new(Arc::clone(&self.store), collection))
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        request: CreateRequest,
    ) -> ServiceResult<EntityResponse> {
        let store = ensure!(self.entities(&request.entity_type));
        let Some(data) = request.data else {
            return Ok(EntityResponse::failure(ValidationError::Missing("data").to_string()));
        };

        match store.create(&self.scoped(ctx), &data).await {
            Ok(created) => Ok(EntityResponse {
                success: true,
                message: "Entity created successfully".to_string(),
                id: Some(created.id),
                entity: Some(created.entity),
                timestamp: Some(Utc::now()),
            }),
            Err(e) => settle("CREATE", e),
        }
    }

    pub async fn create_many(
        &self,
        ctx: &RequestContext,
        request: CreateManyRequest,
    ) -> ServiceResult<BatchResponse> {
        let store = ensure!(self.entities(&request.entity_type));
        if request.entities.is_empty() {
            return Ok(BatchResponse::failure("entities array cannot be empty"));
        }

        let outcome = match store
            .create_many(&self.scoped(ctx), &request.entities, request.ordered)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => return settle("CREATE_MANY", e),
        };

        let created_count = outcome.created_count() as i64;
        if outcome.is_complete() {
            return Ok(BatchResponse {
                success: true,
                message: "Batch insert completed successfully".to_string(),
                ids: outcome.ids,
                created_count,
                entities: outcome.entities,
                errors: Vec::new(),
            });
        }

        let message = StoreError::PartialBatch {
            created: outcome.created_count(),
            failed: outcome.errors.len(),
        }
        .to_string();

        Ok(BatchResponse {
            success: false,
            message,
            ids: outcome.ids,
            created_count,
            entities: Vec::new(),
            errors: outcome
                .errors
                .into_iter()
                .map(|failure| ErrorDetail {
                    code: failure.code.to_string(),
                    field: format!("entities[{}]", failure.index),
                    message: failure.message,
                })
                .collect(),
        })
    }

    pub async fn get_by_id(
        &self,
        ctx: &RequestContext,
        request: GetByIdRequest,
    ) -> ServiceResult<EntityResponse> {
        let store = ensure!(self.entities(&request.entity_type));
        let id = ensure!(parse_id(&request.id));

        match store.get_by_id(&self.scoped(ctx), id, request.fields.as_slice()).await {
            Ok(entity) => Ok(EntityResponse {
                success: true,
                message: "Entity retrieved successfully".to_string(),
                id: Some(id.to_hex()),
                entity: Some(entity),
                timestamp: Some(Utc::now()),
            }),
            Err(e) => settle("GET_BY_ID", e),
        }
    }

    pub async fn query(
        &self,
        ctx: &RequestContext,
        request: QueryRequest,
    ) -> ServiceResult<QueryResponse> {
        let store = ensure!(self.entities(&request.entity_type));

        let params = QueryParams {
            pipeline: stages(&request.pipeline),
            filters: request.filters,
            search_text: request.query,
            search_fields: request.search_fields,
            fields: request.fields,
            page: PageRequest::new(i64::from(request.page), i64::from(request.page_size)),
        };

        match store.query(&self.scoped(ctx), params).await {
            Ok(page) => Ok(QueryResponse {
                success: true,
                message: "Query executed successfully".to_string(),
                entities: page.entities,
                pagination: Some(page.pagination),
            }),
            Err(e) => settle("QUERY", e),
        }
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        request: UpdateRequest,
    ) -> ServiceResult<EntityResponse> {
        let store = ensure!(self.entities(&request.entity_type));
        if request.id.is_empty() {
            return Ok(EntityResponse::failure(ValidationError::Missing("id").to_string()));
        }
        let Some(data) = request.data else {
            return Ok(EntityResponse::failure(ValidationError::Missing("data").to_string()));
        };
        let id = ensure!(parse_id(&request.id));

        match store
            .update(&self.scoped(ctx), id, &data, request.partial_update)
            .await
        {
            Ok(entity) => Ok(EntityResponse {
                success: true,
                message: "Entity updated successfully".to_string(),
                id: Some(id.to_hex()),
                entity: Some(entity),
                timestamp: Some(Utc::now()),
            }),
            Err(e) => settle("UPDATE", e),
        }
    }

    pub async fn delete(
        &self,
        ctx: &RequestContext,
        request: DeleteRequest,
    ) -> ServiceResult<DeleteResponse> {
        let store = ensure!(self.entities(&request.entity_type));
        let id = ensure!(parse_id(&request.id));

        match store.delete(&self.scoped(ctx), id).await {
            Ok(deleted) => Ok(DeleteResponse {
                success: true,
                message: "Entity deleted successfully".to_string(),
                deleted_count: deleted as i64,
            }),
            Err(e) => settle("DELETE", e),
        }
    }

    /// Delete by ids, by selection pipeline, or by both (intersection)
    ///
    /// Ids that do not parse are reported in `failedIds`; the rest are
    /// still deleted.
    pub async fn delete_many(
        &self,
        ctx: &RequestContext,
        request: DeleteManyRequest,
    ) -> ServiceResult<DeleteManyResponse> {
        let store = ensure!(self.entities(&request.entity_type));
        if request.ids.is_empty() && request.pipeline.is_empty() {
            return Ok(DeleteManyResponse::failure(
                "either ids or pipeline must be provided",
            ));
        }

        let (ids, failed_ids) = partition_ids(&request.ids);
        if ids.is_empty() && !failed_ids.is_empty() {
            return Ok(DeleteManyResponse {
                failed_ids,
                ..DeleteManyResponse::failure("All provided IDs are invalid")
            });
        }

        let selection = DeleteSelection {
            ids,
            pipeline: stages(&request.pipeline),
        };

        match store.delete_many(&self.scoped(ctx), selection).await {
            Ok(deleted) => Ok(DeleteManyResponse {
                success: true,
                message: "Entities deleted successfully".to_string(),
                deleted_count: deleted as i64,
                failed_ids,
            }),
            Err(e) => {
                let response: DeleteManyResponse = settle("DELETE_MANY", e)?;
                Ok(DeleteManyResponse {
                    failed_ids,
                    ..response
                })
            }
        }
    }

    pub async fn aggregate(
        &self,
        ctx: &RequestContext,
        request: AggregateRequest,
    ) -> ServiceResult<AggregateResponse> {
        let store = ensure!(self.entities(&request.entity_type));
        if request.pipeline.is_empty() {
            return Ok(AggregateResponse::failure("pipeline cannot be empty"));
        }

        // The default deadline never cuts an aggregation short of its server time limit
        let time_limit = clamp_aggregate_time(i64::from(request.max_time_ms));
        let ctx = ctx
            .clone()
            .with_timeout_if_unset(self.request_timeout.map(|timeout| timeout.max(time_limit)));

        match store
            .aggregate(
                &ctx,
                stages(&request.pipeline),
                request.allow_disk_use,
                i64::from(request.max_time_ms),
            )
            .await
        {
            Ok(result) => Ok(AggregateResponse {
                success: true,
                message: "Aggregation completed successfully".to_string(),
                results: result.results,
                execution_time_ms: result.execution_time_ms,
            }),
            Err(e) => settle("AGGREGATE", e),
        }
    }
}
