//! Query builder utilities
//!
//! This module turns declarative request parameters into aggregation
//! pipelines: a data pipeline, a count pipeline, and the selection pipeline
//! used by bulk deletes.

pub mod builder;
pub mod filter;
pub mod pagination;
pub mod selection;
pub mod stages;

#[cfg(test)]
mod tests;

pub use builder::{PipelineBuilder, QueryPlan};
pub use filter::{QueryFilter, TextSearch};
pub use pagination::{PageRequest, Pagination};
pub use selection::selection_pipeline;
