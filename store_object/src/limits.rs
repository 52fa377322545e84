//! Request limits applied before anything reaches the store.

use std::time::Duration;

/// Page size used when the caller asks for none (or a non-positive one)
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Largest page a single query returns
pub const MAX_PAGE_SIZE: i64 = 1000;

/// Server-side execution ceiling for aggregations
pub const MAX_AGGREGATE_TIME_MS: i64 = 300_000;

/// Normalize a 1-based page number
pub fn clamp_page(page: i64) -> i64 {
    if page <= 0 {
        1
    } else {
        page
    }
}

/// Normalize a page size into `[1, MAX_PAGE_SIZE]`
pub fn clamp_page_size(page_size: i64) -> i64 {
    if page_size <= 0 {
        DEFAULT_PAGE_SIZE
    } else {
        page_size.min(MAX_PAGE_SIZE)
    }
}

/// Normalize a requested aggregation time; non-positive means the ceiling
pub fn clamp_aggregate_time(max_time_ms: i64) -> Duration {
    let ms = if max_time_ms <= 0 {
        MAX_AGGREGATE_TIME_MS
    } else {
        max_time_ms.min(MAX_AGGREGATE_TIME_MS)
    };
    Duration::from_millis(ms as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_clamps() {
        assert_eq!(clamp_page(0), 1);
        assert_eq!(clamp_page(-4), 1);
        assert_eq!(clamp_page(3), 3);

        assert_eq!(clamp_page_size(0), 10);
        assert_eq!(clamp_page_size(-1), 10);
        assert_eq!(clamp_page_size(5000), 1000);
        assert_eq!(clamp_page_size(25), 25);
    }

    #[test]
    fn test_aggregate_time_clamp() {
        assert_eq!(clamp_aggregate_time(0), Duration::from_millis(300_000));
        assert_eq!(clamp_aggregate_time(-5), Duration::from_millis(300_000));
        assert_eq!(clamp_aggregate_time(900_000), Duration::from_millis(300_000));
        assert_eq!(clamp_aggregate_time(1500), Duration::from_millis(1500));
    }
}
