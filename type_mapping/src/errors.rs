//! Error types for value conversion

use thiserror::Error;

/// Raised when a value graph cannot be represented on the other side of the mapping
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("Duplicate key in struct: {0}")]
    DuplicateKey(String),

    #[error("Value nesting exceeds {limit} levels")]
    DepthExceeded { limit: usize },

    #[error("Expected a struct, found {found}")]
    NotAStruct { found: &'static str },
}
