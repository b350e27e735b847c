use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::database::{Filter, QuerySource};

type PredicateFn<T> = dyn Fn(&T) -> bool + Send + Sync;

/// A composable condition over `T`.
///
/// A fresh predicate is *unstarted*: it carries no condition at all and turns
/// into [`Filter::None`]. The first `and`/`or` starts it with that condition
/// alone, later ones combine with what is already there.
pub struct Predicate<T> {
    inner: Option<Arc<PredicateFn<T>>>,
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for Predicate<T> {
    fn default() -> Self {
        Self { inner: None }
    }
}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("started", &self.is_started())
            .finish()
    }
}

impl<T> Predicate<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_started(&self) -> bool {
        self.inner.is_some()
    }

    /// Unstarted predicates match everything
    pub fn matches(&self, item: &T) -> bool {
        self.inner.as_ref().is_none_or(|f| f(item))
    }
}

impl<T: 'static> Predicate<T> {
    pub fn and<F>(self, f: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.and_predicate(Self::from_fn(f))
    }

    pub fn or<F>(self, f: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.or_predicate(Self::from_fn(f))
    }

    pub fn and_predicate(self, other: Predicate<T>) -> Self {
        match (self.inner, other.inner) {
            (Some(a), Some(b)) => Self::from_fn(move |item| a(item) && b(item)),
            (a, b) => Self { inner: a.or(b) },
        }
    }

    pub fn or_predicate(self, other: Predicate<T>) -> Self {
        match (self.inner, other.inner) {
            (Some(a), Some(b)) => Self::from_fn(move |item| a(item) || b(item)),
            (a, b) => Self { inner: a.or(b) },
        }
    }

    /// Negates a started predicate. An unstarted one stays unstarted.
    pub fn not(self) -> Self {
        match self.inner {
            Some(f) => Self::from_fn(move |item| !f(item)),
            None => Self { inner: None },
        }
    }

    /// Same as `Filter::from(self)`
    pub fn into_filter(self) -> Filter<Self> {
        self.into()
    }

    fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            inner: Some(Arc::new(f)),
        }
    }
}

impl<T: 'static> From<Predicate<T>> for Filter<Predicate<T>> {
    fn from(predicate: Predicate<T>) -> Self {
        if predicate.is_started() {
            Filter::Where(predicate)
        } else {
            Filter::None
        }
    }
}

/// An in-memory, already ordered collection
#[derive(Debug, Clone)]
pub struct MemorySource<T> {
    rows: Arc<[T]>,
}

impl<T> MemorySource<T> {
    pub fn new(rows: Vec<T>) -> Self {
        Self { rows: rows.into() }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<T: 'static> MemorySource<T> {
    fn matching<'a>(&'a self, filter: &'a Filter<Predicate<T>>) -> impl Iterator<Item = &'a T> {
        self.rows
            .iter()
            .filter(move |row| filter.predicate().is_none_or(|p| p.matches(row)))
    }
}

impl<T> From<Vec<T>> for MemorySource<T> {
    fn from(rows: Vec<T>) -> Self {
        Self::new(rows)
    }
}

impl<T> FromIterator<T> for MemorySource<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

#[async_trait]
impl<T> QuerySource for MemorySource<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Item = T;
    type Predicate = Predicate<T>;
    type Error = Infallible;

    async fn count(&self, filter: &Filter<Predicate<T>>) -> Result<i64, Infallible> {
        Ok(self.matching(filter).count() as i64)
    }

    async fn fetch(
        &self,
        filter: &Filter<Predicate<T>>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<T>, Infallible> {
        let offset = usize::try_from(offset).unwrap_or(0);
        let limit = usize::try_from(limit).unwrap_or(0);

        Ok(self
            .matching(filter)
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}
