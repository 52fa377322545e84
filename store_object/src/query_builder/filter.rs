//! Match conditions built from caller filters and free-text search.

use crate::validation::{utils, ValidatedFieldName, ValidationError};
use mongodb::bson::{doc, Bson, Document};
use type_mapping::{to_bson, TypedStruct};

/// Case-insensitive substring search across several fields
#[derive(Debug, Clone, PartialEq)]
pub struct TextSearch {
    text: String,
    fields: Vec<ValidatedFieldName>,
}

impl TextSearch {
    /// `None` when either the text or the field list is empty
    pub fn new<S: AsRef<str>>(text: &str, fields: &[S]) -> Result<Option<Self>, ValidationError> {
        if text.is_empty() || fields.is_empty() {
            return Ok(None);
        }

        Ok(Some(Self {
            text: text.to_string(),
            fields: utils::validate_field_names(fields)?,
        }))
    }

    /// `{"$or": [{field: {"$regex": text, "$options": "i"}}, ...]}`
    pub fn to_clause(&self) -> Bson {
        Bson::Array(
            self.fields
                .iter()
                .map(|field| {
                    Bson::Document(doc! {
                        field.as_str(): { "$regex": self.text.as_str(), "$options": "i" }
                    })
                })
                .collect(),
        )
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn fields(&self) -> &[ValidatedFieldName] {
        &self.fields
    }
}

/// Implicit-AND filter map plus an optional search clause
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryFilter {
    filters: TypedStruct,
    search: Option<TextSearch>,
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filters(mut self, filters: TypedStruct) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_search(mut self, search: Option<TextSearch>) -> Self {
        self.search = search;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty() && self.search.is_none()
    }

    /// Merge search and filters into the body of a single `$match`
    ///
    /// Filters are applied after the search clause, so a filter key named
    /// `$or` replaces it.
    pub fn to_match_document(&self) -> Document {
        let mut merged = Document::new();

        if let Some(search) = &self.search {
            merged.insert("$or", search.to_clause());
        }

        for (key, value) in &self.filters {
            merged.insert(key.clone(), to_bson(value));
        }

        merged
    }
}
