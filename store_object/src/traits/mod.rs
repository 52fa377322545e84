//! Traits for document store operations
//!
//! This module contains the capability trait the executors run against,
//! along with the plain data types that cross it.

pub mod store;

pub use store::{
    AggregateOptions, DocumentStore, IndexKind, IndexSpec, InsertManyOutcome, WriteFailure,
};
