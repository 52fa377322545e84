//! Convenience re-exports for common DocHaus usage
//!
//! This prelude module re-exports the most commonly used items from the DocHaus crates,
//! making it easier to import everything you need with a single use statement.
//!
//! # Example
//!
//! ```rust
//! use dochaus::prelude::*;
//!
//! let request = CreateRequest {
//!     entity_type: "users".to_string(),
//!     data: Some(TypedStruct::new().with("name", "Ada")),
//! };
//! assert_eq!(request.entity_type, "users");
//! ```

// Core DocHaus components
pub use crate::core::DocHaus;
pub use crate::errors::{DocHausError, ServiceError};
pub use crate::messages::*;
pub use crate::service::{EntityService, ServiceResult};

// Re-export centralized config
pub use config::{AppConfig, DatabaseConfig, IndexConfig, IndexKeyConfig, IndexOrder, ServiceConfig};

// Re-export commonly used store-object types for convenience
pub use store_object::prelude::*;

// Re-export store_object module for downstream crates
pub use store_object;

// Common external dependencies
pub use anyhow;
pub use async_trait;
pub use tokio;
