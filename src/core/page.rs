//! Offset pagination shared by the list queries.

use crate::errors::Result;
use sea_orm::{ConnectionTrait, Paginator, SelectorTrait};
use serde::Serialize;

const DEFAULT_PAGE_SIZE: u64 = 10;

/// 1-based page number and page size requested by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    #[must_use]
    pub const fn new(page: u64, limit: u64) -> Self {
        Self { page, limit }
    }

    /// Page size, never zero.
    #[must_use]
    pub const fn page_size(&self) -> u64 {
        if self.limit == 0 { DEFAULT_PAGE_SIZE } else { self.limit }
    }

    /// Page number, treating 0 as the first page.
    #[must_use]
    pub const fn current_page(&self) -> u64 {
        if self.page == 0 { 1 } else { self.page }
    }
}

/// One page of results plus totals.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_items: u64,
    pub total_pages: u64,
    pub current_page: u64,
}

/// Fetches the requested page and the totals from a `SeaORM` paginator.
pub(crate) async fn fetch<'db, C, S>(
    paginator: Paginator<'db, C, S>,
    request: PageRequest,
) -> Result<Page<S::Item>>
where
    C: ConnectionTrait,
    S: SelectorTrait + 'db,
{
    let totals = paginator.num_items_and_pages().await?;
    let current_page = request.current_page();
    let items = paginator.fetch_page(current_page - 1).await?;

    Ok(Page {
        items,
        total_items: totals.number_of_items,
        total_pages: totals.number_of_pages,
        current_page,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_normalizes_zero_values() {
        let request = PageRequest::new(0, 0);
        assert_eq!(request.current_page(), 1);
        assert_eq!(request.page_size(), DEFAULT_PAGE_SIZE);

        let request = PageRequest::new(3, 25);
        assert_eq!(request.current_page(), 3);
        assert_eq!(request.page_size(), 25);
    }
}
