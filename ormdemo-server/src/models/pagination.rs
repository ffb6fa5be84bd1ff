//! Pagination types
//!
//! Offset/limit paging: page numbers are 1-based and a page never starts
//! before the first row.

use serde::{Deserialize, Serialize};

/// Default items per page
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Maximum items per page accepted from HTTP query strings
pub const MAX_PAGE_SIZE: u32 = 100;

/// A page request over a filtered data set
#[derive(Debug, Clone)]
pub struct PageQuery<F, C = i32> {
    pub filter: F,
    /// Page number (1-indexed, default 1)
    pub page: Option<i64>,
    /// Items per page (default 10)
    pub page_size: Option<u32>,
    /// Start the listing at this row instead of the first one
    pub cursor: Option<C>,
}

impl<F, C> PageQuery<F, C> {
    pub fn new(filter: F) -> Self {
        Self {
            filter,
            page: None,
            page_size: None,
            cursor: None,
        }
    }

    pub fn page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn cursor(mut self, cursor: C) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Page number reported back to the caller.
    ///
    /// Missing or non-positive page numbers report as page 1.
    pub fn current_page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Items per page; missing or zero sizes fall back to the default.
    pub fn take(&self) -> u32 {
        match self.page_size {
            Some(size) if size > 0 => size,
            _ => DEFAULT_PAGE_SIZE,
        }
    }

    /// Rows to skip: `(page - 1) * take`, never negative.
    pub fn offset(&self) -> i64 {
        let page = self.page.unwrap_or(1);
        page.saturating_sub(1)
            .saturating_mul(self.take() as i64)
            .max(0)
    }

    /// OFFSET/LIMIT pair for the list read.
    pub fn window(&self) -> Window {
        Window {
            offset: self.offset(),
            limit: self.take() as i64,
        }
    }
}

/// SQL OFFSET/LIMIT pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: i64,
    pub limit: i64,
}

/// Paginated response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items for current page
    pub items: Vec<T>,
    /// Current page number
    pub current_page: i64,
    /// Items per page
    pub page_size: u32,
    /// Total count across all pages
    pub total_count: i64,
    /// `ceil(total_count / page_size)`, 0 for an empty set
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, current_page: i64, page_size: u32, total_count: i64) -> Self {
        Self {
            items,
            current_page,
            page_size,
            total_count,
            total_pages: total_pages(total_count, page_size),
        }
    }

    /// Check if there's a next page.
    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Check if there's a previous page.
    pub fn has_prev(&self) -> bool {
        self.current_page > 1
    }

    /// Convert the items, keeping the envelope.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            current_page: self.current_page,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages,
        }
    }
}

fn total_pages(total_count: i64, page_size: u32) -> i64 {
    if total_count <= 0 || page_size == 0 {
        return 0;
    }
    let size = page_size as i64;
    (total_count + size - 1) / size
}

/// Query parameters for pagination
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<i64>,
    #[serde(alias = "limit")]
    pub page_size: Option<u32>,
}

impl PaginationParams {
    /// Build a page query, capping the page size at `MAX_PAGE_SIZE`.
    pub fn into_query<F, C>(self, filter: F) -> PageQuery<F, C> {
        PageQuery {
            filter,
            page: self.page,
            page_size: self.page_size.map(|size| size.min(MAX_PAGE_SIZE)),
            cursor: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_calculation() {
        let q = PageQuery::<(), i32>::new(()).page(1).page_size(10);
        assert_eq!(q.offset(), 0);

        let q = PageQuery::<(), i32>::new(()).page(2).page_size(10);
        assert_eq!(q.offset(), 10);

        let q = PageQuery::<(), i32>::new(()).page(3).page_size(25);
        assert_eq!(q.offset(), 50);
    }

    #[test]
    fn non_positive_page_starts_at_first_row() {
        for page in [0, -1, -40] {
            let q = PageQuery::<(), i32>::new(()).page(page).page_size(10);
            assert_eq!(q.offset(), 0);
            assert_eq!(q.current_page(), 1);
        }
    }

    #[test]
    fn defaults() {
        let q = PageQuery::<(), i32>::new(());
        assert_eq!(q.current_page(), 1);
        assert_eq!(q.take(), 10);
        assert_eq!(q.window(), Window { offset: 0, limit: 10 });

        let q = PageQuery::<(), i32>::new(()).page_size(0);
        assert_eq!(q.take(), 10);
    }

    #[test]
    fn huge_page_does_not_overflow() {
        let q = PageQuery::<(), i32>::new(()).page(i64::MAX).page_size(u32::MAX);
        assert_eq!(q.offset(), i64::MAX);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(Page::<()>::new(vec![], 1, 10, 0).total_pages, 0);
        assert_eq!(Page::<()>::new(vec![], 1, 10, 1).total_pages, 1);
        assert_eq!(Page::<()>::new(vec![], 1, 10, 25).total_pages, 3);
        assert_eq!(Page::<()>::new(vec![], 1, 10, 100).total_pages, 10);
    }

    #[test]
    fn has_next_prev() {
        let page = Page::<()>::new(vec![], 1, 10, 30);
        assert!(page.has_next());
        assert!(!page.has_prev());

        let page = Page::<()>::new(vec![], 2, 10, 30);
        assert!(page.has_next());
        assert!(page.has_prev());

        let page = Page::<()>::new(vec![], 3, 10, 30);
        assert!(!page.has_next());
        assert!(page.has_prev());
    }

    #[test]
    fn map_keeps_envelope() {
        let page = Page::new(vec![1, 2, 3], 2, 3, 7).map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20, 30]);
        assert_eq!(page.current_page, 2);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn params_cap_page_size() {
        let params = PaginationParams {
            page: Some(2),
            page_size: Some(1_000),
        };
        let q: PageQuery<(), i32> = params.into_query(());
        assert_eq!(q.take(), MAX_PAGE_SIZE);
        assert_eq!(q.offset(), 100);
    }

    #[test]
    fn params_accept_limit_alias() {
        let params: PaginationParams =
            serde_json::from_value(serde_json::json!({ "page": 3, "limit": 5 })).unwrap();
        assert_eq!(params.page_size, Some(5));
    }
}
