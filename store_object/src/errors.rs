use thiserror::Error;
use type_mapping::ConversionError;

use crate::validation::ValidationError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),

    #[error("Entity not found")]
    NotFound,

    #[error("failed to convert entity: {0}")]
    Conversion(#[from] ConversionError),

    #[error("{0}")]
    Store(String),

    #[error("Partial batch insert completed with errors ({created} created, {failed} failed)")]
    PartialBatch { created: usize, failed: usize },

    #[error("operation cancelled")]
    Cancelled,

    #[error("operation deadline exceeded")]
    DeadlineExceeded,
}

impl StoreError {
    /// Store failure with the driver's detail
    pub fn store(message: impl Into<String>) -> Self {
        StoreError::Store(message.into())
    }

    /// Prefix a store failure with the operation that hit it
    ///
    /// Cancellation and deadline errors keep their identity.
    pub fn context(self, operation: &str) -> Self {
        match self {
            StoreError::Store(message) => StoreError::Store(format!("{}: {}", operation, message)),
            other => other,
        }
    }

    /// Errors that abort the call instead of becoming a failed response
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Cancelled | StoreError::DeadlineExceeded)
    }
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Store(err.to_string())
    }
}

impl From<ValidationError> for StoreError {
    fn from(err: ValidationError) -> Self {
        StoreError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_prefixes_store_errors_only() {
        let err = StoreError::store("connection reset").context("failed to count entities");
        assert_eq!(err.to_string(), "failed to count entities: connection reset");

        assert_eq!(StoreError::Cancelled.context("failed to count entities"), StoreError::Cancelled);
        assert_eq!(StoreError::NotFound.context("x"), StoreError::NotFound);
    }

    #[test]
    fn test_fatal_kinds() {
        assert!(StoreError::Cancelled.is_fatal());
        assert!(StoreError::DeadlineExceeded.is_fatal());
        assert!(!StoreError::NotFound.is_fatal());
        assert!(!StoreError::store("boom").is_fatal());
    }
}
