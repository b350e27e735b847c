pub mod memory;
pub mod paginated;
pub mod request;
pub mod sql;

use async_trait::async_trait;

pub use paginated::PagedResult;
pub use request::PageRequest;

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Invalid SQL identifier {0:?}")]
    InvalidIdentifier(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type Result<T, E = DatabaseError> = std::result::Result<T, E>;

/// A deferred, filterable collection that can be counted and sliced.
///
/// Implementations must return rows in a stable order, otherwise consecutive
/// pages may overlap or skip rows.
#[async_trait]
pub trait QuerySource: Send + Sync {
    type Item: Send;
    type Predicate: Send + Sync;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Counts every row matching `filter`, ignoring paging
    async fn count(&self, filter: &Filter<Self::Predicate>) -> Result<i64, Self::Error>;

    /// Skips `offset` matching rows and materializes up to `limit` of the rest
    async fn fetch(
        &self,
        filter: &Filter<Self::Predicate>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Self::Item>, Self::Error>;
}

/// Optional narrowing applied before counting and paging
#[derive(Debug, Clone, PartialEq)]
pub enum Filter<P> {
    None,
    Where(P),
}

impl<P> Default for Filter<P> {
    fn default() -> Self {
        Filter::None
    }
}

impl<P> Filter<P> {
    pub fn predicate(&self) -> Option<&P> {
        match self {
            Filter::None => None,
            Filter::Where(p) => Some(p),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Filter::None)
    }
}

impl<P> From<Option<P>> for Filter<P> {
    fn from(value: Option<P>) -> Self {
        value.map_or(Filter::None, Filter::Where)
    }
}
