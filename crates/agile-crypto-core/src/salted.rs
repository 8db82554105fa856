//! OpenSSL-style salted container: the byte layout of every encrypted
//! blob in an AgileKeychain vault.
//!
//! # Layout
//!
//! ```text
//! "Salted__" (8 B) | salt (8 B) | AES-128-CBC ciphertext (n × 16 B)
//! ```
//!
//! Containers travel as base64 text inside the vault's JSON files.
//! [`decode_base64`] accepts the sloppy encodings legacy producers emit
//! (embedded NULs, line breaks, missing padding).

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::CryptoError;
use crate::kdf::{self, KeyIv};
use crate::memory::SecretBuffer;
use crate::symmetric;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic tag opening every salted container.
pub const MAGIC: &[u8; 8] = b"Salted__";

/// Salt length in bytes.
pub const SALT_LEN: usize = 8;

/// Header length: magic + salt.
pub const HEADER_LEN: usize = MAGIC.len() + SALT_LEN;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A parsed salted container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaltedContainer {
    /// Per-blob salt fed to the key derivation.
    pub salt: [u8; SALT_LEN],
    /// AES-128-CBC ciphertext (padding included).
    pub ciphertext: Vec<u8>,
}

impl SaltedContainer {
    /// Parse raw container bytes.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::SaltedFormat` if the input is shorter than
    /// [`HEADER_LEN`] or does not start with [`MAGIC`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() < HEADER_LEN {
            return Err(CryptoError::SaltedFormat(format!(
                "container too short: {} bytes (minimum {HEADER_LEN})",
                bytes.len()
            )));
        }
        if &bytes[..MAGIC.len()] != MAGIC {
            return Err(CryptoError::SaltedFormat(
                "missing Salted__ magic tag".into(),
            ));
        }

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&bytes[MAGIC.len()..HEADER_LEN]);

        Ok(Self {
            salt,
            ciphertext: bytes[HEADER_LEN..].to_vec(),
        })
    }

    /// Decode base64 text, then parse the container.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Encoding` for undecodable base64 and
    /// `CryptoError::SaltedFormat` for a malformed container.
    pub fn from_base64(text: &str) -> Result<Self, CryptoError> {
        Self::from_bytes(&decode_base64(text)?)
    }

    /// Serialize to wire layout: `magic || salt || ciphertext`.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN.saturating_add(self.ciphertext.len()));
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Serialize and base64-encode.
    #[must_use]
    pub fn to_base64(&self) -> String {
        data_encoding::BASE64.encode(&self.to_bytes())
    }

    /// Decrypt with a key/IV pair the caller already derived from [`Self::salt`].
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Decryption` on a padding failure.
    pub fn open_with(&self, key_iv: &KeyIv) -> Result<SecretBuffer, CryptoError> {
        symmetric::decrypt(&self.ciphertext, key_iv)
    }

    /// Decrypt using the legacy MD5 stretch of `key_material` and the salt.
    ///
    /// This is how validation blobs and item payloads are opened.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Decryption` on a padding failure.
    pub fn open_stretched(&self, key_material: &[u8]) -> Result<SecretBuffer, CryptoError> {
        self.open_with(&kdf::stretch(key_material, &self.salt))
    }

    /// Encrypt `plaintext` under the legacy MD5 stretch of `key_material`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Encryption` if encryption fails.
    pub fn seal_stretched(
        plaintext: &[u8],
        key_material: &[u8],
        salt: [u8; SALT_LEN],
    ) -> Result<Self, CryptoError> {
        let key_iv = kdf::stretch(key_material, &salt);
        Ok(Self {
            salt,
            ciphertext: symmetric::encrypt(plaintext, &key_iv)?,
        })
    }

    /// Encrypt `plaintext` under PBKDF2-HMAC-SHA1 of `password`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::KeyDerivation` for a zero iteration count or
    /// `CryptoError::Encryption` if encryption fails.
    pub fn seal_pbkdf2(
        plaintext: &[u8],
        password: &[u8],
        salt: [u8; SALT_LEN],
        iterations: u32,
    ) -> Result<Self, CryptoError> {
        let key_iv = kdf::pbkdf2_sha1(password, &salt, iterations)?;
        Ok(Self {
            salt,
            ciphertext: symmetric::encrypt(plaintext, &key_iv)?,
        })
    }
}

/// Draw a fresh salt from the OS CSPRNG.
///
/// # Errors
///
/// Returns `CryptoError::SecureMemory` if the CSPRNG fails.
pub fn random_salt() -> Result<[u8; SALT_LEN], CryptoError> {
    let mut salt = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| CryptoError::SecureMemory(format!("CSPRNG fill failed: {e}")))?;
    Ok(salt)
}

/// Decode base64 the way legacy producers need it decoded.
///
/// NUL bytes and ASCII whitespace are dropped and missing `=` padding is
/// restored before strict standard-alphabet decoding.
///
/// # Errors
///
/// Returns `CryptoError::Encoding` if the cleaned text is still invalid.
pub fn decode_base64(text: &str) -> Result<Vec<u8>, CryptoError> {
    let mut cleaned: Vec<u8> = text
        .bytes()
        .filter(|b| *b != 0 && !b.is_ascii_whitespace())
        .collect();
    while cleaned.len().checked_rem(4) != Some(0) {
        cleaned.push(b'=');
    }
    data_encoding::BASE64
        .decode(&cleaned)
        .map_err(|e| CryptoError::Encoding(format!("invalid base64: {e}")))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
