pub mod config;
pub mod database;
pub mod errors;
pub mod models;
pub mod utils;

pub use config::PagingConfig;
pub use database::memory::{MemorySource, Predicate};
pub use database::sql::{
    Comparison, Condition, SortDirection, SqlPredicate, SqlQuery, SqlSource, SqlValue,
};
pub use database::{Filter, PageRequest, PagedResult, QuerySource};
pub use errors::{PageError, PagingError};
pub use models::page::{PageData, PageInfo, PageParams};
