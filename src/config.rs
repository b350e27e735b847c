use crate::database::PageRequest;
use crate::errors::{ConfigError, PagingError};
use crate::models::page::PageParams;

pub const DEFAULT_PAGE_SIZE_VAR: &str = "PAGELIST_DEFAULT_PAGE_SIZE";
pub const MAX_PAGE_SIZE_VAR: &str = "PAGELIST_MAX_PAGE_SIZE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingConfig {
    pub default_page_size: i64,
    pub max_page_size: i64,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_page_size: 50,
            max_page_size: 1000,
        }
    }
}

impl PagingConfig {
    /// Read the limits from the environment, honouring a `.env` file.
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let defaults = Self::default();

        let default_page_size =
            parse_positive(DEFAULT_PAGE_SIZE_VAR, lookup(DEFAULT_PAGE_SIZE_VAR))?
                .unwrap_or(defaults.default_page_size);
        let max_page_size = parse_positive(MAX_PAGE_SIZE_VAR, lookup(MAX_PAGE_SIZE_VAR))?
            .unwrap_or(defaults.max_page_size);

        if default_page_size > max_page_size {
            return Err(ConfigError::DefaultExceedsMax {
                default: default_page_size,
                max: max_page_size,
            });
        }

        tracing::debug!(default_page_size, max_page_size, "Loaded paging config");

        Ok(Self {
            default_page_size,
            max_page_size,
        })
    }

    /// Turn wire parameters into a request.
    ///
    /// Missing values fall back to page 1 and the default size, and sizes above
    /// the maximum are clamped down to it. Values below 1 are still rejected.
    pub fn resolve(&self, params: &PageParams) -> Result<PageRequest, PagingError> {
        let page_index = params.page.unwrap_or(1);
        let page_size = params
            .page_size
            .unwrap_or(self.default_page_size)
            .min(self.max_page_size);

        PageRequest::new(page_index, page_size)
    }
}

fn parse_positive(key: &'static str, value: Option<String>) -> Result<Option<i64>, ConfigError> {
    let Some(value) = value else {
        return Ok(None);
    };

    match value.trim().parse::<i64>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => Err(ConfigError::InvalidNumber { key, value }),
    }
}
