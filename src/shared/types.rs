use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub meta: Option<Meta>,
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Meta {
    pub total: i64,
}

// =============================================================================
// PAGINATION
// =============================================================================

/// Standard pagination query parameters for list endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct PaginationQuery {
    /// Page number (1-indexed, default: 1)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,

    /// Number of items per page (default: 10, max: 100)
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PaginationQuery {
    /// Calculate SQL OFFSET from page number
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1).saturating_mul(self.limit())
    }

    /// Get clamped page_size (respects MAX_PAGE_SIZE)
    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }
}

/// Page position echoed back by paginated endpoints
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct PaginationInfo {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_items: i64,
    pub items_per_page: i64,
}

impl PaginationInfo {
    pub fn new(page: i64, per_page: i64, total_items: i64) -> Self {
        let per_page = per_page.max(1);
        Self {
            current_page: page.max(1),
            total_pages: (total_items + per_page - 1) / per_page,
            total_items,
            items_per_page: per_page,
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: Option<T>, message: Option<String>, meta: Option<Meta>) -> Self {
        Self {
            success: true,
            data,
            message,
            meta,
            errors: None,
        }
    }

    pub fn error(message: Option<String>, errors: Option<Vec<String>>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message,
            meta: None,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_query_clamps() {
        let q = PaginationQuery {
            page: 0,
            page_size: 1000,
        };
        assert_eq!(q.limit(), MAX_PAGE_SIZE);
        assert_eq!(q.offset(), 0);

        let q = PaginationQuery {
            page: 3,
            page_size: 20,
        };
        assert_eq!(q.offset(), 40);

        let q = PaginationQuery {
            page: i64::MAX,
            page_size: 100,
        };
        assert_eq!(q.offset(), i64::MAX);
    }

    #[test]
    fn test_pagination_info_rounds_up() {
        let info = PaginationInfo::new(2, 20, 41);
        assert_eq!(info.total_pages, 3);
        assert_eq!(info.current_page, 2);

        assert_eq!(PaginationInfo::new(1, 20, 0).total_pages, 0);
    }
}
