use crate::errors::PagingError;

/// A validated page request: 1-based index and a positive size whose offset
/// fits in an `i64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    page_index: i64,
    page_size: i64,
}

impl PageRequest {
    pub fn new(page_index: i64, page_size: i64) -> Result<Self, PagingError> {
        if page_index < 1 {
            return Err(PagingError::InvalidPageIndex(page_index));
        }
        if page_size < 1 {
            return Err(PagingError::InvalidPageSize(page_size));
        }
        if (page_index - 1).checked_mul(page_size).is_none() {
            return Err(PagingError::OffsetOverflow {
                page_index,
                page_size,
            });
        }

        Ok(Self {
            page_index,
            page_size,
        })
    }

    pub fn first(page_size: i64) -> Result<Self, PagingError> {
        Self::new(1, page_size)
    }

    pub fn page_index(&self) -> i64 {
        self.page_index
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    /// Number of rows to skip
    pub fn offset(&self) -> i64 {
        // checked in `new`
        (self.page_index - 1) * self.page_size
    }

    pub fn next(&self) -> Option<Self> {
        let page_index = self.page_index.checked_add(1)?;
        Self::new(page_index, self.page_size).ok()
    }

    pub fn previous(&self) -> Option<Self> {
        (self.page_index > 1).then(|| Self {
            page_index: self.page_index - 1,
            page_size: self.page_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_skips_whole_pages() {
        assert_eq!(PageRequest::new(1, 10).unwrap().offset(), 0);
        assert_eq!(PageRequest::new(3, 10).unwrap().offset(), 20);
        assert_eq!(PageRequest::first(7).unwrap().offset(), 0);
    }

    #[test]
    fn rejects_non_positive_values() {
        assert_eq!(PageRequest::new(0, 10), Err(PagingError::InvalidPageIndex(0)));
        assert_eq!(PageRequest::new(-2, 10), Err(PagingError::InvalidPageIndex(-2)));
        assert_eq!(PageRequest::new(1, 0), Err(PagingError::InvalidPageSize(0)));
        assert_eq!(PageRequest::new(1, -5), Err(PagingError::InvalidPageSize(-5)));
    }

    #[test]
    fn index_is_checked_before_size() {
        assert_eq!(PageRequest::new(0, 0), Err(PagingError::InvalidPageIndex(0)));
    }

    #[test]
    fn rejects_overflowing_offsets() {
        assert_eq!(
            PageRequest::new(i64::MAX, 2),
            Err(PagingError::OffsetOverflow {
                page_index: i64::MAX,
                page_size: 2
            })
        );
        assert!(PageRequest::new(i64::MAX, 1).is_ok());
    }

    #[test]
    fn neighbours() {
        let request = PageRequest::new(2, 10).unwrap();
        assert_eq!(request.next(), Some(PageRequest::new(3, 10).unwrap()));
        assert_eq!(request.previous(), Some(PageRequest::new(1, 10).unwrap()));

        assert_eq!(PageRequest::first(10).unwrap().previous(), None);
        assert_eq!(PageRequest::new(i64::MAX, 1).unwrap().next(), None);
    }
}
