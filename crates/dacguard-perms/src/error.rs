//! Error types for the permissions module.

use thiserror::Error;

/// Errors that can occur while deciding an access-control operation.
///
/// Every variant is raised before any state is written.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PermsError {
    /// Authorization precondition failed.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A secure-mode chain would grow past its parent's depth budget.
    #[error("delegation depth {depth} exceeds maximum {max_depth}")]
    DepthExceeded { depth: u32, max_depth: u32 },

    /// Structurally invalid request (empty rights, self-delegation, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl PermsError {
    pub(crate) fn forbidden(reason: impl Into<String>) -> Self {
        PermsError::Forbidden(reason.into())
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        PermsError::InvalidInput(reason.into())
    }
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
