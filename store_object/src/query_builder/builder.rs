//! Pipeline builder
//!
//! Produces the data and count pipelines for a paginated query.

use crate::query_builder::filter::QueryFilter;
use crate::query_builder::pagination::PageRequest;
use crate::query_builder::stages;
use crate::validation::{utils, ValidatedFieldName, ValidationError};
use mongodb::bson::Document;

/// Name of the field the count pipeline reports
pub const COUNT_FIELD: &str = "total";

/// The two pipelines of a paginated query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub data: Vec<Document>,
    pub count: Vec<Document>,
    pub page: PageRequest,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    filter: QueryFilter,
    stages: Vec<Document>,
    fields: Vec<ValidatedFieldName>,
    page: PageRequest,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: QueryFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Caller stages, appended verbatim to the data pipeline
    pub fn stages(mut self, stages: Vec<Document>) -> Self {
        self.stages = stages;
        self
    }

    /// Restrict returned documents to these fields
    pub fn fields<S: AsRef<str>>(mut self, fields: &[S]) -> Result<Self, ValidationError> {
        self.fields = utils::validate_field_names(fields)?;
        Ok(self)
    }

    pub fn page(mut self, page: PageRequest) -> Self {
        self.page = page;
        self
    }

    pub fn build(self) -> QueryPlan {
        let mut data = Vec::with_capacity(self.stages.len() + 4);
        let mut count = Vec::with_capacity(2);

        let conditions = self.filter.to_match_document();
        if !conditions.is_empty() {
            data.push(stages::match_stage(conditions.clone()));
            count.push(stages::match_stage(conditions));
        }

        data.extend(self.stages);

        if self.page.skip() >= 0 && self.page.limit() > 0 {
            data.push(stages::skip(self.page.skip()));
            data.push(stages::limit(self.page.limit()));
        }

        if !self.fields.is_empty() {
            data.push(stages::project_fields(&self.fields));
        }

        count.push(stages::count(COUNT_FIELD));

        debug_log!(
            "[PIPELINE] data={} stages, count={} stages",
            data.len(),
            count.len()
        );

        QueryPlan {
            data,
            count,
            page: self.page,
        }
    }
}
