//! Known-answer vectors for key derivation and AES-256-CBC.
//!
//! Computed independently with a reference AES/SHA-256 implementation so
//! that the Rust stack is checked against something other than itself.

use base64::{engine::general_purpose::STANDARD, Engine};
use dacguard_crypto::{bigint, derive_symmetric_key, Iv, SymmetricKey};

/// SHA-256 over the minimal big-endian bytes of a shared secret.
#[derive(Debug, Clone)]
pub struct KeyDerivationVector {
    pub name: &'static str,
    /// Secret as hex (no prefix).
    pub secret_hex: &'static str,
    /// Expected 32-byte key as hex.
    pub expected_key_hex: &'static str,
}

/// One AES-256-CBC encryption under a fixed IV.
#[derive(Debug, Clone)]
pub struct CipherVector {
    pub name: &'static str,
    pub key_hex: &'static str,
    pub iv: [u8; 16],
    pub plaintext: &'static str,
    /// Expected ciphertext, standard base64.
    pub expected_ciphertext_b64: &'static str,
}

/// The textbook exchange over p = 23, g = 5.
#[derive(Debug, Clone, Copy)]
pub struct TextbookExchange {
    pub p: u32,
    pub g: u32,
    pub a: u32,
    pub b: u32,
    pub public_a: u32,
    pub public_b: u32,
    pub secret: u32,
}

pub const TEXTBOOK: TextbookExchange = TextbookExchange {
    p: 23,
    g: 5,
    a: 6,
    b: 15,
    public_a: 8,
    public_b: 19,
    secret: 2,
};

const COUNTING_KEY: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";
const COUNTING_IV: [u8; 16] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];

pub fn key_derivation_vectors() -> Vec<KeyDerivationVector> {
    vec![
        KeyDerivationVector {
            name: "textbook secret 2",
            secret_hex: "2",
            expected_key_hex: "dbc1b4c900ffe48d575b5da5c638040125f65db0fe3e24494b76ea986457d986",
        },
        KeyDerivationVector {
            name: "ten byte secret",
            secret_hex: "0102030405060708090a",
            expected_key_hex: "c848e1013f9f04a9d63fa43ce7fd4af035152c7c669a4a404b67107cee5f2e4e",
        },
        KeyDerivationVector {
            name: "2^255 + 19",
            secret_hex: "8000000000000000000000000000000000000000000000000000000000000013",
            expected_key_hex: "5ee6efc133b2f4e8d092008b27fa3a16e9402b27321198bdc6841e726d24a4f0",
        },
        KeyDerivationVector {
            name: "zero encodes as no bytes",
            secret_hex: "0",
            expected_key_hex: "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
        },
    ]
}

pub fn cipher_vectors() -> Vec<CipherVector> {
    vec![
        CipherVector {
            name: "empty plaintext is one padding block",
            key_hex: COUNTING_KEY,
            iv: COUNTING_IV,
            plaintext: "",
            expected_ciphertext_b64: "6cPvirI0U+bwdJzWNueojg==",
        },
        CipherVector {
            name: "short text",
            key_hex: COUNTING_KEY,
            iv: COUNTING_IV,
            plaintext: "hello, world!",
            expected_ciphertext_b64: "5TMNm6OCk5aB031kWmWffg==",
        },
        CipherVector {
            name: "full block gets a whole padding block",
            key_hex: COUNTING_KEY,
            iv: COUNTING_IV,
            plaintext: "0123456789abcdef",
            expected_ciphertext_b64: "4j/AuRx71kQlxVlzbpsMWEhewdanHmFZMjJdZQbsNwA=",
        },
        CipherVector {
            name: "leave request json",
            key_hex: COUNTING_KEY,
            iv: COUNTING_IV,
            plaintext: r#"{"reason":"vacation","days":5}"#,
            expected_ciphertext_b64: "tBpO5FyYnixxyKmniTyTCAVYFK2N6BcU6XUmFYE+js4=",
        },
        CipherVector {
            name: "leave request under textbook key",
            key_hex: "dbc1b4c900ffe48d575b5da5c638040125f65db0fe3e24494b76ea986457d986",
            iv: [0; 16],
            plaintext: r#"{"reason":"vacation","days":5}"#,
            expected_ciphertext_b64: "RsPbUFg/l9wziPdU01sUKyJ5aoSVzXXCFdgIOEo26Yc=",
        },
    ]
}

fn key_from_hex(s: &str) -> Result<SymmetricKey, String> {
    let bytes = hex::decode(s).map_err(|e| e.to_string())?;
    let arr: [u8; 32] = bytes
        .try_into()
        .map_err(|_| "key must be 32 bytes".to_string())?;
    Ok(SymmetricKey::from_bytes(arr))
}

/// Check one derivation vector.
pub fn verify_key_derivation(vector: &KeyDerivationVector) -> Result<(), String> {
    let secret = bigint::from_hex(vector.secret_hex).map_err(|e| e.to_string())?;
    let key = hex::encode(derive_symmetric_key(&secret));
    if key == vector.expected_key_hex {
        Ok(())
    } else {
        Err(format!("{}: expected {}, got {}", vector.name, vector.expected_key_hex, key))
    }
}

/// Check one cipher vector in both directions.
pub fn verify_cipher(vector: &CipherVector) -> Result<(), String> {
    let key = key_from_hex(vector.key_hex)?;
    let iv = Iv(vector.iv);

    let produced = key.encrypt_with_iv(vector.plaintext.as_bytes(), &iv);
    if STANDARD.encode(&produced) != vector.expected_ciphertext_b64 {
        return Err(format!("{}: ciphertext mismatch", vector.name));
    }

    let plaintext = key
        .decrypt(vector.expected_ciphertext_b64, &iv.to_base64())
        .map_err(|e| format!("{}: {e}", vector.name))?;
    if plaintext != vector.plaintext {
        return Err(format!("{}: plaintext mismatch", vector.name));
    }
    Ok(())
}

/// Verify every vector, returning the first failure.
pub fn verify_all_vectors() -> Result<(), String> {
    for vector in key_derivation_vectors() {
        verify_key_derivation(&vector)?;
    }
    for vector in cipher_vectors() {
        verify_cipher(&vector)?;
    }
    Ok(())
}
