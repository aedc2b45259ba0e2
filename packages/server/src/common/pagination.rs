//! Offset pagination for story listings.
//!
//! Pages are 1-based. `PageInfo` is computed purely from the current page,
//! the total number of items and the page size, so it can be tested without
//! touching storage.

use serde::Serialize;

/// Fixed page size for the story listing
pub const STORIES_PER_PAGE: i64 = 10;

/// Pagination metadata handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    /// Current page (1-based)
    pub current: i64,
    /// Total number of pages (0 when there are no items)
    pub total: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageInfo {
    pub fn new(current: i64, total_items: i64, page_size: i64) -> Self {
        let total = total_pages(total_items, page_size);
        PageInfo {
            current,
            total,
            has_next: current < total,
            has_prev: current > 1,
        }
    }
}

/// Number of pages needed to show `total_items`
pub fn total_pages(total_items: i64, page_size: i64) -> i64 {
    if page_size <= 0 || total_items <= 0 {
        return 0;
    }
    (total_items + page_size - 1) / page_size
}

/// Row offset of the first item on `page`; saturates for pages far past the end
pub fn offset(page: i64, page_size: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(page_size.max(0))
}

/// Parse the `page` query parameter; anything missing, malformed or below 1 is page 1.
pub fn parse_page(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1)
}
