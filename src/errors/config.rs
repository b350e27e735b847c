#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("Default page size {default} is larger than the maximum page size {max}")]
    DefaultExceedsMax { default: i64, max: i64 },
}
