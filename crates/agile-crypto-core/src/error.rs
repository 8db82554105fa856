//! Cryptographic error types for `agile-crypto-core`.

use thiserror::Error;

/// Errors produced by cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key derivation failed (zero iteration count, bad output length).
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// AES-128-CBC encryption failure.
    #[error("encryption error: {0}")]
    Encryption(String),

    /// PKCS#7 padding check failed after CBC decryption: wrong key,
    /// truncated ciphertext, or corrupted data.
    #[error("decryption failed: invalid padding")]
    Decryption,

    /// Invalid key material (wrong length, corrupted bytes).
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// Salted container is truncated or lacks the `Salted__` tag.
    #[error("salted container error: {0}")]
    SaltedFormat(String),

    /// Base64 text could not be decoded.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Secure memory allocation failure (mlock, CSPRNG).
    #[error("secure memory error: {0}")]
    SecureMemory(String),
}
