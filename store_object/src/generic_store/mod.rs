pub mod core;
pub mod mutation;
pub mod query;

pub use core::{EntityStore, CREATED_AT, UPDATED_AT};
pub use mutation::{BatchOutcome, Created, DeleteSelection};
pub use query::{AggregateResult, Page, QueryParams};
