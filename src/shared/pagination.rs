//! Page/offset helpers shared by repositories and services.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 12;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Normalized page request (1-based page number).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Clamp raw query values: page >= 1, 1 <= page_size <= MAX_PAGE_SIZE.
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }

    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results plus totals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total_count: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total_count: i64, request: PageRequest) -> Self {
        let total_pages = if total_count <= 0 {
            0
        } else {
            ((total_count + request.page_size as i64 - 1) / request.page_size as i64) as u32
        };
        Self {
            items,
            total_count,
            page: request.page,
            page_size: request.page_size,
            total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(None, None => (1, 12); "defaults")]
    #[test_case(Some(0), Some(0) => (1, 1); "zero values clamp up")]
    #[test_case(Some(3), Some(500) => (3, 100); "page size clamps down")]
    fn test_page_request_normalization(page: Option<u32>, size: Option<u32>) -> (u32, u32) {
        let request = PageRequest::new(page, size);
        (request.page, request.page_size)
    }

    #[test]
    fn test_offset() {
        let request = PageRequest::new(Some(3), Some(12));
        assert_eq!(request.offset(), 24);
        assert_eq!(request.limit(), 12);
    }

    #[test_case(0 => 0)]
    #[test_case(1 => 1)]
    #[test_case(12 => 1)]
    #[test_case(13 => 2)]
    fn test_total_pages(total: i64) -> u32 {
        PagedResult::<()>::new(Vec::new(), total, PageRequest::default()).total_pages
    }

    #[test]
    fn test_map_keeps_totals() {
        let page = PagedResult::new(vec![1, 2], 30, PageRequest::new(Some(2), Some(2)));
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.items, vec![10, 20]);
        assert_eq!(mapped.total_pages, 15);
        assert!(mapped.has_next());
    }
}
