//! Error types for the guard.
//!
//! Engine errors are lifted onto one taxonomy so callers match on
//! [`GuardError::Forbidden`] or [`GuardError::Decryption`] whichever crate
//! raised them.

use dacguard_core::CoreError;
use dacguard_crypto::{CryptoError, DecryptFailure};
use dacguard_perms::PermsError;
use dacguard_store::StoreError;
use thiserror::Error;

/// Errors that can occur during guard operations.
#[derive(Debug, Error)]
pub enum GuardError {
    /// DH parameters or a shared secret are not in place yet.
    #[error("not initialized: {0}")]
    NotInitialized(String),

    /// A referenced user, document, message or delegation is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Authorization precondition failed.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A secure-mode delegation chain ran out of depth.
    #[error("delegation depth {depth} exceeds maximum {max_depth}")]
    DepthExceeded { depth: u32, max_depth: u32 },

    /// Wrong key or corrupt ciphertext. Re-run the handshake.
    #[error("decryption failed: {0}")]
    Decryption(DecryptFailure),

    /// Decrypted cleanly but the payload is not the expected JSON. Discard
    /// the message.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Malformed request (bad encoding, empty rights, self-reference, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[source] StoreError),

    /// Cryptographic error with no closer match above.
    #[error("crypto error: {0}")]
    Crypto(#[source] CryptoError),
}

impl From<StoreError> for GuardError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => GuardError::NotFound(what),
            StoreError::Conflict(what) => GuardError::InvalidInput(what),
            other => GuardError::Store(other),
        }
    }
}

impl From<PermsError> for GuardError {
    fn from(err: PermsError) -> Self {
        match err {
            PermsError::Forbidden(reason) => GuardError::Forbidden(reason),
            PermsError::DepthExceeded { depth, max_depth } => {
                GuardError::DepthExceeded { depth, max_depth }
            }
            PermsError::InvalidInput(reason) => GuardError::InvalidInput(reason),
        }
    }
}

impl From<CryptoError> for GuardError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::Decryption(failure) => GuardError::Decryption(failure),
            CryptoError::MalformedPayload(reason) => GuardError::MalformedPayload(reason),
            CryptoError::InvalidEncoding(reason) | CryptoError::InvalidKey(reason) => {
                GuardError::InvalidInput(reason)
            }
            other => GuardError::Crypto(other),
        }
    }
}

impl From<CoreError> for GuardError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidInput(reason) => GuardError::InvalidInput(reason),
        }
    }
}

impl GuardError {
    /// Whether the failure is an authorization refusal (including depth).
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            GuardError::Forbidden(_) | GuardError::DepthExceeded { .. }
        )
    }
}

/// Result type for guard operations.
pub type Result<T> = std::result::Result<T, GuardError>;
