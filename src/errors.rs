//! Error types for the DocHaus crate
//!
//! This module contains the startup errors returned by the coordinator and
//! the hard failures the entity service returns instead of a response.

use config::ConfigError;
use store_object::{StoreError, ValidationError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocHausError {
    #[error("Database connection error: {0}")]
    DatabaseConnection(#[from] mongodb::error::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid entity type: {0}")]
    InvalidEntityType(#[from] ValidationError),

    #[error("Failed to create index on '{collection}': {source}")]
    IndexCreation {
        collection: String,
        #[source]
        source: StoreError,
    },
}

/// Failures that abort a service call instead of producing a response
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceError {
    #[error("request cancelled")]
    Cancelled,

    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

impl ServiceError {
    /// The hard failure carried by `err`, if it is one
    pub fn from_store(err: &StoreError) -> Option<Self> {
        match err {
            StoreError::Cancelled => Some(ServiceError::Cancelled),
            StoreError::DeadlineExceeded => Some(ServiceError::DeadlineExceeded),
            _ => None,
        }
    }
}
