// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Page/page-size pagination translated to `Range`/`Content-Range` items.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// A 1-based page request. Construction clamps out-of-range values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Clamp `page` to at least 1 and `page_size` into `1..=100`.
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Inclusive zero-based item range covered by this page.
    pub fn item_range(&self) -> (u64, u64) {
        let size = u64::from(self.page_size);
        let start = (u64::from(self.page) - 1) * size;
        (start, start + size - 1)
    }

    /// Value for the `Range` request header, e.g. `items=20-39`.
    pub fn range_header(&self) -> String {
        let (start, end) = self.item_range();
        format!("items={start}-{end}")
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_PAGE_SIZE)
    }
}

/// One page of results in the BFF's list envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    /// Total matching rows; the item count when upstream reports none.
    pub total: u64,
}

impl<T> PageResult<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: Option<u64>) -> Self {
        let total = total.unwrap_or(items.len() as u64);
        Self {
            items,
            page: request.page(),
            page_size: request.page_size(),
            total,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResult<U> {
        PageResult {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total: self.total,
        }
    }
}

/// Total row count from a `Content-Range` header (`0-19/123`, `*/0`).
///
/// `None` when the header is absent, has no `/`, or the total is not a
/// non-negative integer (e.g. `0-19/*`).
pub fn extract_total(content_range: Option<&str>) -> Option<u64> {
    let (_, total) = content_range?.trim().rsplit_once('/')?;
    if total.is_empty() || !total.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    total.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_for_second_page() {
        let request = PageRequest::new(2, 20);
        assert_eq!(request.item_range(), (20, 39));
        assert_eq!(request.range_header(), "items=20-39");
    }

    #[test]
    fn range_matches_formula_across_valid_inputs() {
        for page in [1u32, 2, 7, 1000] {
            for page_size in [1u32, 2, 20, 99, 100] {
                let (start, end) = PageRequest::new(page, page_size).item_range();
                let expected_start = u64::from(page - 1) * u64::from(page_size);
                assert_eq!(start, expected_start);
                assert_eq!(end, expected_start + u64::from(page_size) - 1);
            }
        }
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let request = PageRequest::new(0, 0);
        assert_eq!((request.page(), request.page_size()), (1, 1));
        assert_eq!(request.range_header(), "items=0-0");

        let request = PageRequest::new(3, 500);
        assert_eq!(request.page_size(), MAX_PAGE_SIZE);
        assert_eq!(request.range_header(), "items=200-299");
    }

    #[test]
    fn extract_total_parses_content_range() {
        assert_eq!(extract_total(Some("0-19/123")), Some(123));
        assert_eq!(extract_total(Some("*/0")), Some(0));
        assert_eq!(extract_total(None), None);
        assert_eq!(extract_total(Some("abc")), None);
        assert_eq!(extract_total(Some("0-19/*")), None);
        assert_eq!(extract_total(Some("0-19/-4")), None);
        assert_eq!(extract_total(Some("0-19/+4")), None);
    }

    #[test]
    fn page_result_falls_back_to_item_count() {
        let page = PageResult::new(vec!["a", "b"], PageRequest::new(1, 2), None);
        assert_eq!(page.total, 2);

        let page = PageResult::new(vec!["a", "b"], PageRequest::new(1, 2), Some(5));
        assert_eq!(page.total, 5);
        assert_eq!((page.page, page.page_size), (1, 2));
    }
}
