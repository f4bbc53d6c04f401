//! Page/limit query handling.

use serde::Deserialize;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// 1-based page number and page size as sent by clients.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl Pagination {
    /// Page number, never below 1.
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(DEFAULT_PAGE).max(1)
    }

    /// Page size clamped to `1..=MAX_LIMIT`.
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Rows to skip; saturates instead of overflowing for huge pages.
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page_of_ten() {
        let p = Pagination::default();
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), 10);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn second_page_skips_one_limit() {
        let p = Pagination {
            page: Some(2),
            limit: Some(1),
        };
        assert_eq!(p.offset(), 1);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let p = Pagination {
            page: Some(0),
            limit: Some(5000),
        };
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), MAX_LIMIT);

        let p = Pagination {
            page: Some(-3),
            limit: Some(0),
        };
        assert_eq!(p.limit(), 1);
        assert_eq!(p.offset(), 0);

        let p = Pagination {
            page: Some(i64::MAX),
            limit: Some(10),
        };
        assert_eq!(p.page(), i64::MAX);
        assert_eq!(p.offset(), i64::MAX);
    }
}
