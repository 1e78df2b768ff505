//! Shared pagination types for API query parameters.
//!
//! List endpoints use page-based pagination with `page` and `page_size`
//! parameters. Out-of-range values are rejected by validation rather than
//! clamped, so a caller always gets exactly the page it asked for.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// First page number.
pub const FIRST_PAGE: i64 = 1;

/// Default number of items to return per page.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Maximum number of items that can be requested per page.
pub const MAX_PAGE_SIZE: i64 = 100;

fn default_page() -> i64 {
    FIRST_PAGE
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

/// Standard pagination parameters for list endpoints.
///
/// - `page`: 1-based page number (default: 1)
/// - `page_size`: items per page (default: 20, between 1 and 100)
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Validate, IntoParams, ToSchema)]
pub struct Pagination {
    /// Page number, starting at 1
    #[param(default = 1, minimum = 1)]
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: i64,

    /// Number of items per page (default: 20, max: 100)
    #[param(default = 20, minimum = 1, maximum = 100)]
    #[serde_as(as = "DisplayFromStr")]
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100, message = "page_size must be between 1 and 100"))]
    pub page_size: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: FIRST_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    /// Build a checked pagination value.
    pub fn new(page: i64, page_size: i64) -> Result<Self, validator::ValidationErrors> {
        let pagination = Self { page, page_size };
        pagination.validate()?;
        Ok(pagination)
    }

    /// Number of rows to skip before this page starts.
    ///
    /// Saturates for huge page numbers, which simply land past the last row.
    #[inline]
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// Maximum number of rows in this page.
    #[inline]
    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

/// Paginated response envelope for list endpoints.
///
/// `total` counts every row matching the query, independent of the page slice.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T: ToSchema> {
    /// The items for the current page
    pub items: Vec<T>,
    /// Total number of items matching the query (before pagination)
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Requested page size
    pub page_size: i64,
}

impl<T: ToSchema> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: Pagination) -> Self {
        Self {
            items,
            total,
            page: pagination.page,
            page_size: pagination.page_size,
        }
    }
}
