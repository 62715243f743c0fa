//! # dacguard crypto
//!
//! Key exchange and message confidentiality.
//!
//! ## Overview
//!
//! Two principals agree on a secret with classic finite-field
//! Diffie-Hellman and use it to protect leave-request payloads:
//!
//! 1. **Parameters**: a fixed MODP group `(p, g)` shared by everyone
//! 2. **Handshake**: each side draws `x` in `[2, p-2]` and publishes `g^x mod p`
//! 3. **Key derivation**: SHA-256 over the big-endian bytes of the secret
//! 4. **Encryption**: AES-256-CBC, PKCS#7 padding, fresh random IV per message
//!
//! The group sizes are demonstration-scale.
//!
//! ## Usage
//!
//! ```rust
//! use dacguard_crypto::{DhGroup, DhParameters, Initiator};
//!
//! let params = DhParameters::for_group(DhGroup::Modp1536).unwrap();
//!
//! // Employee side keeps its private exponent local.
//! let employee = Initiator::new(&params);
//!
//! // Responder answers with its own public value.
//! let hr_private = params.generate_private_key();
//! let hr_public = params.public_key(&hr_private);
//! let hr_secret = params.shared_secret(employee.public_key(), &hr_private).unwrap();
//!
//! let employee_secret = employee.complete(&hr_public).unwrap();
//! let sealed = employee_secret.derive_symmetric_key().encrypt(r#"{"days":5}"#);
//! let opened = sealed.decrypt(&hr_secret.derive_symmetric_key()).unwrap();
//! assert_eq!(opened, r#"{"days":5}"#);
//! ```

pub mod bigint;
pub mod cipher;
pub mod dh;
pub mod envelope;
pub mod error;
pub mod session;

pub use cipher::{Ciphertext, Iv, SymmetricKey};
pub use dh::{
    compute_public_key, compute_shared_secret, derive_symmetric_key, generate_parameters,
    generate_private_key, DhGroup, DhParameters, Initiator, PrivateKey, PublicKey, SharedSecret,
};
pub use envelope::{open_json, seal_json};
pub use error::{CryptoError, DecryptFailure, Result};
pub use session::{KeyExchangeSession, SessionState};
