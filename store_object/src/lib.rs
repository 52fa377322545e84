//! Store Object - Core document storage layer for DocHaus
//!
//! This crate provides the document store capability, the pipeline builder,
//! and the entity executors that run create/read/update/delete/aggregate
//! operations against a store handle.

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod context;
pub mod errors;
pub mod generic_store;
pub mod id_type;
pub mod limits;
pub mod memory;
pub mod mongo;
pub mod prelude;
pub mod query_builder;
pub mod traits;
pub mod validation;

pub use context::RequestContext;
pub use errors::StoreError;
pub use generic_store::{
    AggregateResult, BatchOutcome, Created, DeleteSelection, EntityStore, Page, QueryParams,
};
pub use id_type::{id_to_string, partition_ids, EntityId};
pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use query_builder::{PageRequest, Pagination, PipelineBuilder, QueryFilter, TextSearch};
pub use traits::*;
pub use validation::{ValidatedCollectionName, ValidatedFieldName, ValidationError};
