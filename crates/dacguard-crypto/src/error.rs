//! Error types for the crypto module.

use std::fmt;

use thiserror::Error;

/// Why a decryption failed.
///
/// All three point at the key or the stored bytes, never at the payload
/// format: the remedy is to re-run the handshake or discard the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecryptFailure {
    /// The final block did not carry valid padding.
    BadPadding,
    /// Padding was valid but the plaintext is not UTF-8.
    BadKey,
    /// Base64, IV length, or ciphertext length is wrong.
    Malformed,
}

impl fmt::Display for DecryptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecryptFailure::BadPadding => f.write_str("bad padding"),
            DecryptFailure::BadKey => f.write_str("bad key"),
            DecryptFailure::Malformed => f.write_str("malformed ciphertext"),
        }
    }
}

/// Errors that can occur during key exchange or message encryption.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// A hex or base64 encoding could not be parsed.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    /// A DH parameter or public value is out of range.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Decryption failed; the key or the ciphertext is wrong.
    #[error("decryption error: {0}")]
    Decryption(DecryptFailure),

    /// Decryption succeeded but the plaintext is not the expected JSON.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for crypto operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
