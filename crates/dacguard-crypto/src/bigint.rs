//! Arbitrary-precision helpers underlying Diffie-Hellman.

use num_bigint::{BigUint, RandBigInt};
use rand::rngs::OsRng;

use crate::error::{CryptoError, Result};

/// `base^exponent mod modulus`.
///
/// The caller guarantees a non-zero modulus.
pub fn mod_pow(base: &BigUint, exponent: &BigUint, modulus: &BigUint) -> BigUint {
    base.modpow(exponent, modulus)
}

/// Uniform integer in `[low, high]`, drawn from the operating system CSPRNG.
///
/// Requires `low <= high`.
pub fn random_in_range(low: &BigUint, high: &BigUint) -> BigUint {
    let upper = high + 1u32;
    OsRng.gen_biguint_range(low, &upper)
}

/// Minimal big-endian encoding; zero encodes as the empty string.
pub fn to_be_bytes(value: &BigUint) -> Vec<u8> {
    if value.bits() == 0 {
        Vec::new()
    } else {
        value.to_bytes_be()
    }
}

/// `0x`-prefixed lowercase hex.
pub fn to_hex(value: &BigUint) -> String {
    format!("0x{}", value.to_str_radix(16))
}

/// Parse hex with or without a `0x` prefix.
pub fn from_hex(s: &str) -> Result<BigUint> {
    let digits = s
        .trim()
        .strip_prefix("0x")
        .or_else(|| s.trim().strip_prefix("0X"))
        .unwrap_or(s.trim());
    if digits.is_empty() {
        return Err(CryptoError::InvalidEncoding("empty hex integer".into()));
    }
    BigUint::parse_bytes(digits.as_bytes(), 16)
        .ok_or_else(|| CryptoError::InvalidEncoding(format!("not a hex integer: {s}")))
}
