//! Vault error types for `agile-vault`.

use agile_crypto_core::CryptoError;
use thiserror::Error;

/// Errors produced by vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// File content is malformed: no JSON found, wrong top-level shape,
    /// undecodable base64, or an invalid entry identifier.
    #[error("format error: {0}")]
    Format(String),

    /// Vault directory, index, key bundle, or entry file is missing.
    #[error("not found: {0}")]
    NotFound(String),

    /// The master password failed to decrypt or validate a key entry.
    ///
    /// Carries no detail: a wrong password and a corrupt key
    /// bundle are indistinguishable to the caller.
    #[error("incorrect master password")]
    Authentication,

    /// Vault is locked: the operation requires an unlocked key map.
    #[error("vault is locked")]
    Locked,

    /// A single entry's payload could not be decrypted or parsed.
    #[error("payload error: {0}")]
    Payload(String),

    /// Cryptographic primitive failed (delegated from crypto-core).
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// I/O error from the filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VaultError {
    /// Map an I/O error for `what`, turning `ErrorKind::NotFound` into
    /// [`VaultError::NotFound`].
    pub(crate) fn from_io(err: std::io::Error, what: &str) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(what.to_string())
        } else {
            Self::Io(err)
        }
    }
}
