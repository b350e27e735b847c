use serde::{Deserialize, Serialize};

use crate::database::{PageRequest, PagedResult};
use crate::errors::PagingError;

/// Paging parameters as they arrive on the wire, e.g. `?page=3&pageSize=20`.
///
/// Missing values are filled in by [`PagingConfig::resolve`](crate::config::PagingConfig::resolve).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Pagination metadata for display, e.g. "showing 11-20 of 25, page 2 of 3"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page_index: i64,
    pub page_size: i64,
    pub total_count: i64,
    pub total_pages: i64,
    pub has_previous_page: bool,
    pub has_next_page: bool,
    /// 1-based ordinal of the first item on this page, `None` when the page is empty
    pub first_item: Option<i64>,
    pub last_item: Option<i64>,
}

/// Plain carrier for mapping and serialization.
///
/// Every field is public and nothing is enforced here. Go through
/// [`PageData::into_paged`] to get a [`PagedResult`] back, which recomputes the
/// derived fields instead of trusting them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData<T> {
    pub page_index: i64,
    pub total_pages: i64,
    pub total_count: i64,
    pub has_previous_page: bool,
    pub has_next_page: bool,
    pub items: Vec<T>,
}

impl<T> Default for PageData<T> {
    fn default() -> Self {
        Self {
            page_index: 1,
            total_pages: 0,
            total_count: 0,
            has_previous_page: false,
            has_next_page: false,
            items: Vec::new(),
        }
    }
}

impl<T> PageData<T> {
    pub fn into_paged(self, page_size: i64) -> Result<PagedResult<T>, PagingError> {
        let request = PageRequest::new(self.page_index, page_size)?;
        Ok(PagedResult::from_parts(self.items, self.total_count, request))
    }
}

impl<T> From<PagedResult<T>> for PageData<T> {
    fn from(page: PagedResult<T>) -> Self {
        Self {
            page_index: page.page_index(),
            total_pages: page.total_pages(),
            total_count: page.total_count(),
            has_previous_page: page.has_previous_page(),
            has_next_page: page.has_next_page(),
            items: page.into_items(),
        }
    }
}
