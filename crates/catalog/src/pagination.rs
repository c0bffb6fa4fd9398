//! Result pages and the page-number strip

use audioteca_core::Book;
use serde::{Deserialize, Serialize};

/// Page numbers shown on each side of the current page
pub const PAGE_WINDOW: u32 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: usize,
    pub per_page: u32,
    /// 1-based
    pub current_page: u32,
    pub total_pages: u32,
}

impl Pagination {
    pub fn new(total: usize, per_page: u32, current_page: u32) -> Self {
        let per_page = per_page.max(1);
        let total_pages = u32::try_from(total.div_ceil(per_page as usize)).unwrap_or(u32::MAX);
        Self {
            total,
            per_page,
            current_page: current_page.max(1),
            total_pages,
        }
    }

    /// Index range of this page within the full result list
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = (self.current_page as usize)
            .saturating_sub(1)
            .saturating_mul(self.per_page as usize);
        let start = start.min(self.total);
        let end = start.saturating_add(self.per_page as usize).min(self.total);
        start..end
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// One page of catalog results
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogPage {
    pub books: Vec<Book>,
    pub pagination: Pagination,
}

/// An entry in the page-number strip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

impl std::fmt::Display for PageItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageItem::Page(n) => write!(f, "{}", n),
            PageItem::Ellipsis => f.write_str("..."),
        }
    }
}

/// First page, last page and a window around `current`, with gaps marked
///
/// A gap of exactly one page is filled with that page instead of an ellipsis.
pub fn page_numbers(current: u32, total_pages: u32) -> Vec<PageItem> {
    if total_pages <= 1 {
        return vec![PageItem::Page(1)];
    }

    let mut pages = vec![1];
    let low = current.saturating_sub(PAGE_WINDOW).max(2);
    let high = current.saturating_add(PAGE_WINDOW).min(total_pages - 1);
    pages.extend(low..=high);
    pages.push(total_pages);

    let mut items = Vec::with_capacity(pages.len() + 2);
    let mut previous: Option<u32> = None;
    for page in pages {
        if let Some(prev) = previous {
            match page - prev {
                2 => items.push(PageItem::Page(prev + 1)),
                1 => {}
                _ => items.push(PageItem::Ellipsis),
            }
        }
        items.push(PageItem::Page(page));
        previous = Some(page);
    }
    items
}
