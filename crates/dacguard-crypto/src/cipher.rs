//! AES-256-CBC with PKCS#7 padding.
//!
//! Every call to [`SymmetricKey::encrypt`] draws a fresh 16-byte IV from the
//! operating system CSPRNG. Ciphertext and IV travel as standard base64.

use std::fmt;

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, DecryptFailure, Result};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 16;
pub const BLOCK_LEN: usize = 16;

/// A 256-bit AES key.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey([u8; KEY_LEN]);

impl SymmetricKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Encrypt UTF-8 text under a fresh IV.
    pub fn encrypt(&self, plaintext: &str) -> Ciphertext {
        let iv = Iv::generate();
        let bytes = self.encrypt_with_iv(plaintext.as_bytes(), &iv);
        Ciphertext {
            ciphertext: STANDARD.encode(bytes),
            iv: iv.to_base64(),
        }
    }

    /// Encrypt raw bytes under a caller-chosen IV.
    ///
    /// Only for known-answer vectors; reusing an IV leaks plaintext equality.
    pub fn encrypt_with_iv(&self, plaintext: &[u8], iv: &Iv) -> Vec<u8> {
        Aes256CbcEnc::new(&self.0.into(), &iv.0.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
    }

    /// Decrypt base64 ciphertext and IV back to UTF-8 text.
    pub fn decrypt(&self, ciphertext_b64: &str, iv_b64: &str) -> Result<String> {
        let ciphertext = STANDARD
            .decode(ciphertext_b64)
            .map_err(|_| CryptoError::Decryption(DecryptFailure::Malformed))?;
        let iv = Iv::from_base64(iv_b64)?;
        let bytes = self.decrypt_bytes(&ciphertext, &iv)?;
        String::from_utf8(bytes).map_err(|_| CryptoError::Decryption(DecryptFailure::BadKey))
    }

    /// Decrypt raw bytes and strip the padding.
    pub fn decrypt_bytes(&self, ciphertext: &[u8], iv: &Iv) -> Result<Vec<u8>> {
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
            return Err(CryptoError::Decryption(DecryptFailure::Malformed));
        }
        Aes256CbcDec::new(&self.0.into(), &iv.0.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CryptoError::Decryption(DecryptFailure::BadPadding))
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

/// A 128-bit CBC initialization vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Iv(pub [u8; IV_LEN]);

impl Iv {
    /// Generate a new random IV.
    pub fn generate() -> Self {
        let mut bytes = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub const fn from_bytes(bytes: [u8; IV_LEN]) -> Self {
        Self(bytes)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    pub fn from_base64(s: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(s)
            .map_err(|_| CryptoError::Decryption(DecryptFailure::Malformed))?;
        let arr: [u8; IV_LEN] = bytes
            .try_into()
            .map_err(|_| CryptoError::Decryption(DecryptFailure::Malformed))?;
        Ok(Self(arr))
    }
}

/// Base64 ciphertext and the IV it was produced under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext {
    pub ciphertext: String,
    pub iv: String,
}

impl Ciphertext {
    pub fn decrypt(&self, key: &SymmetricKey) -> Result<String> {
        key.decrypt(&self.ciphertext, &self.iv)
    }
}
