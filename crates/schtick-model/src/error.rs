use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("timestamp cannot be rendered as ISO-8601: {0}")]
    InvalidTimestamp(String),
    #[error("invalid claim strategy: {0} (expected: atomic-script|transactional)")]
    InvalidStrategy(String),
    #[error("invalid store error policy: {0} (expected: propagate|swallow)")]
    InvalidPolicy(String),
}
