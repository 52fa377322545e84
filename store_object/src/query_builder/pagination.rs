//! Page requests and the metadata reported with query results.

use crate::limits::{clamp_page, clamp_page_size};
use serde::{Deserialize, Serialize};

/// A normalized page request; page is 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    page_size: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, 0)
    }
}

impl PageRequest {
    /// Clamp raw caller input into a usable page
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: clamp_page(page),
            page_size: clamp_page_size(page_size),
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    pub fn skip(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

/// Pagination block returned with a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub total_items: i64,
}

impl Pagination {
    pub fn new(request: PageRequest, total_items: i64) -> Self {
        Self {
            current_page: request.page(),
            page_size: request.page_size(),
            total_pages: total_pages(total_items, request.page_size()),
            total_items,
        }
    }
}

/// `ceil(total / page_size)`, or 0 when there is nothing to page
pub fn total_pages(total_items: i64, page_size: i64) -> i64 {
    if page_size <= 0 || total_items <= 0 {
        return 0;
    }
    (total_items + page_size - 1) / page_size
}
