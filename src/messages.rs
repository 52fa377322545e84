//! Request and response records for the entity service
//!
//! Field names serialize in camelCase so the records map one-to-one onto a
//! JSON or protobuf transport. Every response carries `success` and
//! `message`; missing request fields decode to their defaults.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use store_object::Pagination;
use type_mapping::TypedStruct;

// ========================================
// Requests
// ========================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateRequest {
    pub entity_type: String,
    pub data: Option<TypedStruct>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateManyRequest {
    pub entity_type: String,
    pub entities: Vec<TypedStruct>,
    pub ordered: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct GetByIdRequest {
    pub entity_type: String,
    pub id: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryRequest {
    pub entity_type: String,
    pub filters: TypedStruct,
    /// Free-text search applied to `search_fields`
    pub query: String,
    pub search_fields: Vec<String>,
    pub pipeline: Vec<TypedStruct>,
    pub fields: Vec<String>,
    pub page: i32,
    pub page_size: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateRequest {
    pub entity_type: String,
    pub id: String,
    pub data: Option<TypedStruct>,
    pub partial_update: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DeleteRequest {
    pub entity_type: String,
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DeleteManyRequest {
    pub entity_type: String,
    pub ids: Vec<String>,
    pub pipeline: Vec<TypedStruct>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AggregateRequest {
    pub entity_type: String,
    pub pipeline: Vec<TypedStruct>,
    pub allow_disk_use: bool,
    pub max_time_ms: i32,
}

// ========================================
// Responses
// ========================================

/// Responses that can report a failure as data
pub trait ServiceResponse: Default {
    fn failure(message: impl Into<String>) -> Self;
}

macro_rules! impl_service_response {
    ($($response:ty),* $(,)?) => {
        $(
            impl ServiceResponse for $response {
                fn failure(message: impl Into<String>) -> Self {
                    Self {
                        success: false,
                        message: message.into(),
                        ..Default::default()
                    }
                }
            }
        )*
    };
}

/// Create, GetById and Update
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EntityResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<TypedStruct>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// One failed item of a batch
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    /// Store error code, as text
    pub code: String,
    /// Position of the failed item, e.g. `entities[2]`
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub success: bool,
    pub message: String,
    pub ids: Vec<String>,
    pub created_count: i64,
    pub entities: Vec<TypedStruct>,
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub success: bool,
    pub message: String,
    pub entities: Vec<TypedStruct>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
    pub deleted_count: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteManyResponse {
    pub success: bool,
    pub message: String,
    pub deleted_count: i64,
    pub failed_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResponse {
    pub success: bool,
    pub message: String,
    pub results: Vec<TypedStruct>,
    pub execution_time_ms: i64,
}

impl_service_response!(
    EntityResponse,
    BatchResponse,
    QueryResponse,
    DeleteResponse,
    DeleteManyResponse,
    AggregateResponse,
);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_decodes_camel_case_with_defaults() {
        let request: QueryRequest = serde_json::from_value(json!({
            "entityType": "users",
            "filters": {"status": "active"},
            "searchFields": ["name"],
            "pageSize": 25
        }))
        .unwrap();

        assert_eq!(request.entity_type, "users");
        assert_eq!(request.page_size, 25);
        assert_eq!(request.page, 0);
        assert!(request.pipeline.is_empty());
        assert_eq!(request.filters.len(), 1);
    }

    #[test]
    fn test_failure_response_shape() {
        let response = DeleteManyResponse::failure("either ids or pipeline must be provided");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({
                "success": false,
                "message": "either ids or pipeline must be provided",
                "deletedCount": 0,
                "failedIds": []
            })
        );

        let value = serde_json::to_value(EntityResponse::failure("Entity not found")).unwrap();
        assert_eq!(value, json!({"success": false, "message": "Entity not found"}));
    }
}
