//! Finite-field Diffie-Hellman over fixed MODP groups.
//!
//! The group parameters are public and fixed (RFC 3526). Private exponents
//! are drawn from the operating system CSPRNG in `[2, p-2]`. The shared
//! secret is hashed with SHA-256 into the 256-bit AES key.

use std::fmt;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::bigint::{self, from_hex, mod_pow, random_in_range, to_hex};
use crate::cipher::SymmetricKey;
use crate::error::{CryptoError, Result};

/// RFC 3526 group 5 (1536-bit MODP), the demonstration default.
const MODP_1536: &str = concat!(
    "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD1",
    "29024E088A67CC74020BBEA63B139B22514A08798E3404DD",
    "EF9519B3CD3A431B302B0A6DF25F14374FE1356D6D51C245",
    "E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7ED",
    "EE386BFB5A899FA5AE9F24117C4B1FE649286651ECE45B3D",
    "C2007CB8A163BF0598DA48361C55D39A69163FA8FD24CF5F",
    "83655D23DCA3AD961C62F356208552BB9ED529077096966D",
    "670C354E4ABC9804F1746C08CA237327FFFFFFFFFFFFFFFF",
);

/// RFC 3526 group 14 (2048-bit MODP).
const MODP_2048: &str = concat!(
    "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD1",
    "29024E088A67CC74020BBEA63B139B22514A08798E3404DD",
    "EF9519B3CD3A431B302B0A6DF25F14374FE1356D6D51C245",
    "E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7ED",
    "EE386BFB5A899FA5AE9F24117C4B1FE649286651ECE45B3D",
    "C2007CB8A163BF0598DA48361C55D39A69163FA8FD24CF5F",
    "83655D23DCA3AD961C62F356208552BB9ED529077096966D",
    "670C354E4ABC9804F1746C08CA18217C32905E462E36CE3B",
    "E39E772C180E86039B2783A2EC07A28FB5C55DF06F4C52C9",
    "DE2BCBF6955817183995497CEA956AE515D2261898FA0510",
    "15728E5A8AACAA68FFFFFFFFFFFFFFFF",
);

/// Smallest modulus accepted by [`DhParameters::new`].
const MIN_PRIME: u32 = 5;

/// Named MODP group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DhGroup {
    #[default]
    Modp1536,
    Modp2048,
}

/// Parse a built-in group prime, refusing anything but a `bits`-wide value.
fn group_prime(hex: &str, bits: u64) -> Result<BigUint> {
    let p = BigUint::parse_bytes(hex.as_bytes(), 16)
        .ok_or_else(|| CryptoError::InvalidKey("group prime is not valid hex".into()))?;
    if p.bits() != bits {
        return Err(CryptoError::InvalidKey(format!(
            "group prime has {} bits, expected {bits}",
            p.bits()
        )));
    }
    Ok(p)
}

// ─────────────────────────────────────────────────────────────────────────────
// Raw operations
// ─────────────────────────────────────────────────────────────────────────────

/// The fixed `(p, g)` pair of the default group.
pub fn generate_parameters() -> Result<(BigUint, BigUint)> {
    let params = DhParameters::for_group(DhGroup::Modp1536)?;
    Ok((params.p, params.g))
}

/// Random private exponent in `[2, p-2]`.
pub fn generate_private_key(p: &BigUint) -> BigUint {
    random_in_range(&BigUint::from(2u32), &(p - 2u32))
}

/// `g^x mod p`.
pub fn compute_public_key(g: &BigUint, private_key: &BigUint, p: &BigUint) -> BigUint {
    mod_pow(g, private_key, p)
}

/// `other_public^private_key mod p`.
pub fn compute_shared_secret(other_public: &BigUint, private_key: &BigUint, p: &BigUint) -> BigUint {
    mod_pow(other_public, private_key, p)
}

/// SHA-256 of the minimal big-endian encoding of the secret.
pub fn derive_symmetric_key(shared_secret: &BigUint) -> [u8; 32] {
    let digest = Sha256::digest(bigint::to_be_bytes(shared_secret));
    digest.into()
}

// ─────────────────────────────────────────────────────────────────────────────
// Typed wrappers
// ─────────────────────────────────────────────────────────────────────────────

/// Public group parameters: prime `p` and generator `g`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhParameters {
    p: BigUint,
    g: BigUint,
}

impl DhParameters {
    /// The fixed parameters of a named group.
    pub fn for_group(group: DhGroup) -> Result<Self> {
        let (hex, bits) = match group {
            DhGroup::Modp1536 => (MODP_1536, 1536),
            DhGroup::Modp2048 => (MODP_2048, 2048),
        };
        Self::new(group_prime(hex, bits)?, BigUint::from(2u32))
    }

    /// Build from explicit values, rejecting degenerate groups.
    pub fn new(p: BigUint, g: BigUint) -> Result<Self> {
        if p < BigUint::from(MIN_PRIME) || !p.bit(0) {
            return Err(CryptoError::InvalidKey("prime must be odd and at least 5".into()));
        }
        if g < BigUint::from(2u32) || g >= &p - 1u32 {
            return Err(CryptoError::InvalidKey("generator must lie in [2, p-2]".into()));
        }
        Ok(Self { p, g })
    }

    /// Parse the hex pair used on the wire and at rest.
    pub fn from_hex(p: &str, g: &str) -> Result<Self> {
        Self::new(from_hex(p)?, from_hex(g)?)
    }

    /// `(p, g)` as `0x`-prefixed hex.
    pub fn to_hex(&self) -> (String, String) {
        (to_hex(&self.p), to_hex(&self.g))
    }

    pub fn prime(&self) -> &BigUint {
        &self.p
    }

    pub fn generator(&self) -> &BigUint {
        &self.g
    }

    pub fn generate_private_key(&self) -> PrivateKey {
        PrivateKey(generate_private_key(&self.p))
    }

    pub fn public_key(&self, private_key: &PrivateKey) -> PublicKey {
        PublicKey(compute_public_key(&self.g, &private_key.0, &self.p))
    }

    /// Check that a peer value lies in `[2, p-2]`.
    ///
    /// 0, 1 and p-1 would force the secret into a trivial subgroup.
    pub fn validate_public(&self, public: &PublicKey) -> Result<()> {
        let upper = &self.p - 2u32;
        if public.0 < BigUint::from(2u32) || public.0 > upper {
            return Err(CryptoError::InvalidKey("public value out of range".into()));
        }
        Ok(())
    }

    /// Derive the shared secret from a validated peer public value.
    pub fn shared_secret(&self, other: &PublicKey, private_key: &PrivateKey) -> Result<SharedSecret> {
        self.validate_public(other)?;
        Ok(SharedSecret(compute_shared_secret(&other.0, &private_key.0, &self.p)))
    }
}

/// A private exponent. Never serialized over the interface.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(BigUint);

impl PrivateKey {
    pub fn from_biguint(value: BigUint) -> Self {
        Self(value)
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    /// Hex form for at-rest storage only.
    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        from_hex(s).map(Self)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

/// A public value `g^x mod p`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey(BigUint);

impl PublicKey {
    pub fn from_biguint(value: BigUint) -> Self {
        Self(value)
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        from_hex(s).map(Self)
    }
}

/// The agreed value `g^(ab) mod p`.
#[derive(Clone, PartialEq, Eq)]
pub struct SharedSecret(BigUint);

impl SharedSecret {
    pub fn from_biguint(value: BigUint) -> Self {
        Self(value)
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        from_hex(s).map(Self)
    }

    /// Derive the 256-bit AES key. Deterministic.
    pub fn derive_symmetric_key(&self) -> SymmetricKey {
        SymmetricKey::from_bytes(derive_symmetric_key(&self.0))
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(..)")
    }
}

/// The initiating side of a handshake.
///
/// Holds its private exponent locally and only ever hands out the public
/// value. Consumed once the responder's public value arrives.
pub struct Initiator {
    params: DhParameters,
    private_key: PrivateKey,
    public_key: PublicKey,
}

impl Initiator {
    pub fn new(params: &DhParameters) -> Self {
        let private_key = params.generate_private_key();
        let public_key = params.public_key(&private_key);
        Self {
            params: params.clone(),
            private_key,
            public_key,
        }
    }

    /// The value to send to the responder.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Finish the handshake with the responder's public value.
    pub fn complete(self, responder_public: &PublicKey) -> Result<SharedSecret> {
        self.params.shared_secret(responder_public, &self.private_key)
    }
}
