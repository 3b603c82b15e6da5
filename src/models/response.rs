// src/models/response.rs
// DOCUMENTATION: Response envelopes shared by every endpoint
// PURPOSE: `{success, data}` bodies and pagination metadata

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_LIMIT: i64 = 10;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Highest page number whose offset still fits in an i64
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_LIMIT;

/// Successful single-object response
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Pointer to a neighbouring page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub page: i64,
    pub limit: i64,
}

/// Links to the previous/next page, omitted at the edges
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageLink>,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let next = if page.saturating_mul(limit) < total {
            Some(PageLink {
                page: page + 1,
                limit,
            })
        } else {
            None
        };
        let prev = if page > 1 {
            Some(PageLink {
                page: page - 1,
                limit,
            })
        } else {
            None
        };

        Self { next, prev }
    }
}

/// Paginated list response
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub success: bool,
    pub count: usize,
    pub total: i64,
    pub pagination: Pagination,
    pub data: Vec<T>,
}

impl<T: Serialize> ListResponse<T> {
    pub fn new(data: Vec<T>, total: i64, page: Page) -> Self {
        Self {
            success: true,
            count: data.len(),
            total,
            pagination: Pagination::new(page.page, page.limit, total),
            data,
        }
    }
}

/// Resolved page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    /// Clamp raw values: 1 <= page <= MAX_PAGE, 1 <= limit <= MAX_PAGE_LIMIT
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new(None, None)
    }
}

/// `?page=&limit=` query parameters
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    pub fn resolve(&self) -> Page {
        Page::new(self.page, self.limit)
    }
}
