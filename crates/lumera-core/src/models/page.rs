use serde::{Deserialize, Serialize};

const DEFAULT_PER_PAGE: u32 = 50;
const MAX_PER_PAGE: u32 = 200;

/// One-based page selector for listings.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        PageRequest { page, per_page }
    }

    /// Row offset for this page; page 0 is treated as page 1.
    pub fn offset(&self) -> i64 {
        let page = self.page.max(1);
        (page as i64 - 1) * self.limit()
    }

    /// Row limit for this page, clamped to keep single queries bounded.
    pub fn limit(&self) -> i64 {
        self.per_page.clamp(1, MAX_PER_PAGE) as i64
    }
}

/// One page of results plus the total match count.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, request: PageRequest) -> Self {
        Page {
            items,
            total,
            page: request.page.max(1),
            per_page: request.per_page.clamp(1, MAX_PER_PAGE),
        }
    }
}
