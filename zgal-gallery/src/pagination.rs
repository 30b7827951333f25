//! Pagination utilities for the gallery grid

use serde::Serialize;

/// Pagination metadata calculated from the filtered set size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: usize,
    /// Total number of pages (0 for an empty set)
    pub total_pages: usize,
    /// Index of the first item on the page
    pub offset: usize,
}

impl Pagination {
    /// Index range of the page within a set of `total_results` items
    pub fn window(&self, total_results: usize, page_size: usize) -> std::ops::Range<usize> {
        let start = self.offset.min(total_results);
        let end = start.saturating_add(page_size).min(total_results);
        start..end
    }

    /// Controls to show, `None` when there is at most one page
    pub fn view(&self) -> Option<PaginationView> {
        if self.total_pages <= 1 {
            return None;
        }
        Some(PaginationView {
            current: self.page,
            pages: (1..=self.total_pages).collect(),
        })
    }
}

/// Page links of the pagination control
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationView {
    pub current: usize,
    pub pages: Vec<usize>,
}

/// Calculate pagination metadata from total results and requested page
///
/// The page is clamped to `[1, total_pages]`.
///
/// # Examples
/// ```
/// use zgal_gallery::pagination::calculate_pagination;
///
/// // 50 photos at 24 per page = 3 pages (24 + 24 + 2)
/// let p = calculate_pagination(50, 2, 24);
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.offset, 24);
///
/// let p = calculate_pagination(50, 99, 24);
/// assert_eq!(p.page, 3);
/// assert_eq!(p.offset, 48);
/// ```
pub fn calculate_pagination(total_results: usize, requested_page: usize, page_size: usize) -> Pagination {
    let page_size = page_size.max(1);
    let total_pages = total_results.div_ceil(page_size);
    let page = requested_page.max(1).min(total_pages.max(1));
    let offset = (page - 1) * page_size;

    Pagination {
        page,
        total_pages,
        offset,
    }
}
