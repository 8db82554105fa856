//! Key derivation for the two AgileKeychain decryption phases.
//!
//! This module provides:
//! - [`pbkdf2_sha1`] (phase 1): password + salt → AES key/IV for a master key
//! - [`stretch`] (phase 2): master key + salt → AES key/IV for validation
//!   blobs and item payloads (`EVP_BytesToKey` with MD5, one round)
//! - [`KeyIv`]: zeroize-on-drop AES-128 key + IV pair
//!
//! Both functions emit exactly 32 bytes: 16 bytes of AES-128 key followed
//! by a 16-byte CBC initialization vector.

use std::fmt;
use std::num::NonZeroU32;

use ring::pbkdf2;
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::memory::SecretBytes;

/// AES-128 key length in bytes.
pub const KEY_LEN: usize = 16;

/// CBC initialization vector length in bytes.
pub const IV_LEN: usize = 16;

/// Iteration count assumed when a key entry does not declare one.
pub const DEFAULT_ITERATIONS: u32 = 1000;

/// Bytes emitted by either derivation: key followed by IV.
const DERIVED_LEN: usize = KEY_LEN + IV_LEN;

/// AES-128 key + CBC IV derived for a single decryption.
pub struct KeyIv {
    key: SecretBytes<KEY_LEN>,
    iv: SecretBytes<IV_LEN>,
}

impl KeyIv {
    /// Build from raw halves. The arrays are moved in.
    #[must_use]
    pub fn new(key: [u8; KEY_LEN], iv: [u8; IV_LEN]) -> Self {
        Self {
            key: SecretBytes::new(key),
            iv: SecretBytes::new(iv),
        }
    }

    /// The AES-128 key half.
    #[must_use]
    pub const fn key(&self) -> &[u8; KEY_LEN] {
        self.key.expose()
    }

    /// The CBC IV half.
    #[must_use]
    pub const fn iv(&self) -> &[u8; IV_LEN] {
        self.iv.expose()
    }

    fn from_derived(derived: &[u8; DERIVED_LEN]) -> Self {
        let mut key = [0u8; KEY_LEN];
        let mut iv = [0u8; IV_LEN];
        key.copy_from_slice(&derived[..KEY_LEN]);
        iv.copy_from_slice(&derived[KEY_LEN..]);
        let out = Self::new(key, iv);
        key.zeroize();
        iv.zeroize();
        out
    }
}

impl fmt::Debug for KeyIv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyIv(***)")
    }
}

/// Derive the phase-1 AES key/IV with PBKDF2-HMAC-SHA1.
///
/// # Errors
///
/// Returns `CryptoError::KeyDerivation` if `iterations` is zero.
pub fn pbkdf2_sha1(password: &[u8], salt: &[u8], iterations: u32) -> Result<KeyIv, CryptoError> {
    let rounds = NonZeroU32::new(iterations)
        .ok_or_else(|| CryptoError::KeyDerivation("iteration count must be at least 1".into()))?;

    let mut derived = [0u8; DERIVED_LEN];
    pbkdf2::derive(pbkdf2::PBKDF2_HMAC_SHA1, rounds, salt, password, &mut derived);
    let out = KeyIv::from_derived(&derived);
    derived.zeroize();
    Ok(out)
}

/// Legacy MD5 key stretch used for validation blobs and item payloads.
///
/// `key = MD5(material ‖ salt)`, `iv = MD5(key ‖ material ‖ salt)`.
/// Identical to OpenSSL `EVP_BytesToKey(EVP_md5(), count = 1)` for AES-128.
#[must_use]
pub fn stretch(key_material: &[u8], salt: &[u8]) -> KeyIv {
    let mut first = md5::Context::new();
    first.consume(key_material);
    first.consume(salt);
    let mut h1 = first.compute().0;

    let mut second = md5::Context::new();
    second.consume(h1);
    second.consume(key_material);
    second.consume(salt);
    let mut h2 = second.compute().0;

    let out = KeyIv::new(h1, h2);
    h1.zeroize();
    h2.zeroize();
    out
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
