use serde::{Deserialize, Serialize};

use super::MessageView;

pub const DEFAULT_LIMIT: u32 = 50;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct Query {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl Query {
    /// 1-based page number; page 0 is treated as page 1.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    #[must_use]
    pub fn new(page: u32, limit: u32, total: i64) -> Self {
        let limit_wide = i64::from(limit);
        Self {
            page,
            limit,
            total,
            total_pages: (total + limit_wide - 1) / limit_wide,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Response {
    pub data: Vec<MessageView>,
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_defaults_and_clamps() {
        let query = Query::default();
        assert_eq!(1, query.page());
        assert_eq!(DEFAULT_LIMIT, query.limit());

        let query = Query {
            page: Some(0),
            limit: Some(0),
        };
        assert_eq!(1, query.page());
        assert_eq!(1, query.limit());

        let query = Query {
            page: Some(7),
            limit: Some(100_000),
        };
        assert_eq!(7, query.page());
        assert_eq!(MAX_LIMIT, query.limit());
    }

    #[test]
    fn test_pagination_math() {
        let pagination = Pagination::new(1, 50, 0);
        assert_eq!(0, pagination.total_pages);

        let pagination = Pagination::new(1, 50, 50);
        assert_eq!(1, pagination.total_pages);

        let pagination = Pagination::new(2, 50, 51);
        assert_eq!(2, pagination.total_pages);
    }
}
