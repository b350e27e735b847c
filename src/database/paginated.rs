use crate::database::{Filter, PageRequest, QuerySource};
use crate::errors::PageError;
use crate::models::page::PageInfo;

/// One materialized page of a larger, ordered result set.
///
/// Built only through [`PagedResult::create`] or [`PagedResult::from_parts`], so
/// `total_pages` and both navigation flags always agree with the page index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagedResult<T> {
    request: PageRequest,
    total_count: i64,
    total_pages: i64,
    items: Vec<T>,
}

impl<T> PagedResult<T> {
    /// Validate the paging parameters, then build the page from `source`.
    pub async fn create<S>(
        page_index: i64,
        page_size: i64,
        source: &S,
        filter: &Filter<S::Predicate>,
    ) -> Result<Self, PageError<S::Error>>
    where
        S: QuerySource<Item = T> + ?Sized,
    {
        let request = PageRequest::new(page_index, page_size)?;
        Self::from_request(request, source, filter).await
    }

    /// Count the rows matching `filter`, then fetch the requested slice.
    ///
    /// These are two separate round trips. If the source changes in between, the
    /// count and the items can disagree.
    #[tracing::instrument(
        skip_all,
        fields(page_index = request.page_index(), page_size = request.page_size())
    )]
    pub async fn from_request<S>(
        request: PageRequest,
        source: &S,
        filter: &Filter<S::Predicate>,
    ) -> Result<Self, PageError<S::Error>>
    where
        S: QuerySource<Item = T> + ?Sized,
    {
        let total_count = source.count(filter).await.map_err(PageError::Source)?;
        let items = source
            .fetch(filter, request.offset(), request.page_size())
            .await
            .map_err(PageError::Source)?;

        tracing::debug!(total_count, fetched = items.len(), "Materialized page");

        Ok(Self::from_parts(items, total_count, request))
    }

    /// Assemble a page from rows that were already fetched.
    ///
    /// Extra rows beyond the page size are dropped and a negative count is
    /// treated as zero.
    pub fn from_parts(mut items: Vec<T>, total_count: i64, request: PageRequest) -> Self {
        let page_size = request.page_size();
        items.truncate(usize::try_from(page_size).unwrap_or(usize::MAX));

        let total_count = total_count.max(0);
        let total_pages = total_count / page_size + i64::from(total_count % page_size != 0);

        Self {
            request,
            total_count,
            total_pages,
            items,
        }
    }

    pub fn page_index(&self) -> i64 {
        self.request.page_index()
    }

    pub fn page_size(&self) -> i64 {
        self.request.page_size()
    }

    pub fn request(&self) -> PageRequest {
        self.request
    }

    pub fn total_count(&self) -> i64 {
        self.total_count
    }

    pub fn total_pages(&self) -> i64 {
        self.total_pages
    }

    pub fn has_previous_page(&self) -> bool {
        self.page_index() > 1
    }

    pub fn has_next_page(&self) -> bool {
        self.page_index() < self.total_pages
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn next_page(&self) -> Option<PageRequest> {
        if self.has_next_page() {
            self.request.next()
        } else {
            None
        }
    }

    pub fn previous_page(&self) -> Option<PageRequest> {
        self.request.previous()
    }

    pub fn info(&self) -> PageInfo {
        let offset = self.request.offset();
        let (first_item, last_item) = match self.items.len() as i64 {
            0 => (None, None),
            // Saturates on the last pages of an i64-sized range
            len => (Some(offset.saturating_add(1)), Some(offset.saturating_add(len))),
        };

        PageInfo {
            page_index: self.page_index(),
            page_size: self.page_size(),
            total_count: self.total_count,
            total_pages: self.total_pages,
            has_previous_page: self.has_previous_page(),
            has_next_page: self.has_next_page(),
            first_item,
            last_item,
        }
    }

    /// Transform the items while keeping the paging metadata
    pub fn map<U, F>(self, f: F) -> PagedResult<U>
    where
        F: FnMut(T) -> U,
    {
        PagedResult {
            request: self.request,
            total_count: self.total_count,
            total_pages: self.total_pages,
            items: self.items.into_iter().map(f).collect(),
        }
    }

    /// Like [`map`](Self::map), for conversions that can fail
    pub fn try_map<U, E, F>(self, f: F) -> Result<PagedResult<U>, E>
    where
        F: FnMut(T) -> Result<U, E>,
    {
        Ok(PagedResult {
            request: self.request,
            total_count: self.total_count,
            total_pages: self.total_pages,
            items: self.items.into_iter().map(f).collect::<Result<_, _>>()?,
        })
    }
}

impl<T> From<PagedResult<T>> for Vec<T> {
    fn from(page: PagedResult<T>) -> Self {
        page.items
    }
}

impl<T> IntoIterator for PagedResult<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a PagedResult<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
