//! # DocHaus
//!
//! Generic entity storage over a document store. Callers create, read,
//! update, delete and aggregate entities in named collections without
//! declaring their shape; values cross the boundary as a typed,
//! self-describing value graph.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dochaus::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let dochaus = DocHaus::connect(&config).await?;
//!     dochaus.ensure_indexes(&config.indexes).await?;
//!
//!     let service = dochaus.service();
//!     let ctx = RequestContext::new();
//!
//!     let response = service
//!         .create(
//!             &ctx,
//!             CreateRequest {
//!                 entity_type: "users".to_string(),
//!                 data: Some(TypedStruct::new().with("name", "John Doe")),
//!             },
//!         )
//!         .await?;
//!     println!("Created user: {:?}", response.id);
//!
//!     dochaus.shutdown().await?;
//!     Ok(())
//! }
//! ```

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod core;
pub mod errors;
pub mod indexes;
pub mod messages;
pub mod prelude;
pub mod service;

// Re-export the main public types for convenience
pub use core::DocHaus;
pub use errors::{DocHausError, ServiceError};
pub use service::EntityService;

// Re-export centralized config
pub use config::{AppConfig, DatabaseConfig, IndexConfig, ServiceConfig};

// Re-export internal crates used by the public API
pub use store_object;
pub use type_mapping;

// Re-export external dependencies used in public API
pub use async_trait;
pub use mongodb;
pub use tokio_util;
