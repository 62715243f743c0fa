//! Error types for dacguard core.

use thiserror::Error;

/// Errors raised while building or parsing core records.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
