//! Convenience re-exports for common store-object usage

// Store capability and its implementations
pub use crate::traits::{AggregateOptions, DocumentStore, IndexKind, IndexSpec};
pub use crate::memory::MemoryStore;
pub use crate::mongo::MongoStore;

// Error types
pub use crate::errors::StoreError;

// Entity executors
pub use crate::generic_store::{DeleteSelection, EntityStore, QueryParams};

// Request scoping
pub use crate::context::RequestContext;

// Identifiers and validation
pub use crate::id_type::EntityId;
pub use crate::validation::{ValidatedCollectionName, ValidatedFieldName, ValidationError};

// Query building
pub use crate::query_builder::{PageRequest, Pagination};

// Common external dependencies that are frequently used
pub use async_trait::async_trait;
pub use type_mapping::{TypedStruct, TypedValue};
