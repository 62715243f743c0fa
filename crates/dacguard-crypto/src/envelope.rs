//! JSON payloads sealed under a derived key.
//!
//! Opening distinguishes a failed decryption (wrong key, corrupt bytes)
//! from a payload that decrypted cleanly but is not the expected JSON.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cipher::{Ciphertext, SymmetricKey};
use crate::error::{CryptoError, Result};

/// Serialize `value` to JSON and encrypt it.
pub fn seal_json<T: Serialize>(value: &T, key: &SymmetricKey) -> Result<Ciphertext> {
    let json = serde_json::to_string(value).map_err(|e| CryptoError::Serialization(e.to_string()))?;
    Ok(key.encrypt(&json))
}

/// Decrypt and parse a JSON payload.
///
/// Returns [`CryptoError::Decryption`] when the key is wrong and
/// [`CryptoError::MalformedPayload`] when the plaintext is not valid JSON
/// for `T`.
pub fn open_json<T: DeserializeOwned>(sealed: &Ciphertext, key: &SymmetricKey) -> Result<T> {
    let plaintext = sealed.decrypt(key)?;
    serde_json::from_str(&plaintext).map_err(|e| CryptoError::MalformedPayload(e.to_string()))
}
