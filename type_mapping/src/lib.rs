//! Unified type mapping between the typed wire representation and BSON
//! This crate provides the conversion logic used across the dochaus ecosystem

pub mod convert;
pub mod errors;
pub mod json;
pub mod types;

// Re-export commonly used items
pub use convert::{
    format_timestamp, from_bson, from_document, to_bson, to_document, MAX_NESTING_DEPTH,
};
pub use errors::ConversionError;
pub use types::{TypedStruct, TypedValue};

// Re-export the BSON crate so downstream crates agree on one version
pub use bson;
