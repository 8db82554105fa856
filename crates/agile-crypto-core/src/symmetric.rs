//! AES-128-CBC with PKCS#7 padding.
//!
//! This module provides:
//! - [`decrypt`]: decrypt and unpad, returning [`SecretBuffer`]
//! - [`encrypt`]: pad and encrypt (fixture generation and tests)
//!
//! CBC carries no authentication tag. A wrong key is only detected when
//! the final block does not unpad; it is NOT a reliable wrong-password
//! signal on its own. Callers validating a master key must compare the
//! plaintext against a known value.

use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use zeroize::Zeroize;

use crate::error::CryptoError;
use crate::kdf::KeyIv;
use crate::memory::SecretBuffer;

/// AES block size in bytes.
pub const BLOCK_LEN: usize = 16;

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;

/// Decrypt AES-128-CBC ciphertext and strip PKCS#7 padding.
///
/// The working buffer is zeroized after its contents are moved into the
/// returned [`SecretBuffer`].
///
/// # Errors
///
/// Returns `CryptoError::Decryption` if the ciphertext is empty, not a
/// whole number of blocks, or its padding is malformed.
pub fn decrypt(ciphertext: &[u8], key_iv: &KeyIv) -> Result<SecretBuffer, CryptoError> {
    let cipher = Aes128CbcDec::new_from_slices(key_iv.key(), key_iv.iv())
        .map_err(|_| CryptoError::InvalidKeyMaterial("AES-128-CBC key/IV length".into()))?;

    let mut buf = ciphertext.to_vec();
    let Ok(plaintext) = cipher.decrypt_padded_mut::<Pkcs7>(&mut buf) else {
        buf.zeroize();
        return Err(CryptoError::Decryption);
    };
    let result = SecretBuffer::new(plaintext);
    buf.zeroize();
    Ok(result)
}

/// Encrypt `plaintext` with AES-128-CBC, appending PKCS#7 padding.
///
/// Output length is always the next multiple of [`BLOCK_LEN`] strictly
/// greater than the plaintext length.
///
/// # Errors
///
/// Returns `CryptoError::Encryption` if the padded length overflows.
pub fn encrypt(plaintext: &[u8], key_iv: &KeyIv) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes128CbcEnc::new_from_slices(key_iv.key(), key_iv.iv())
        .map_err(|_| CryptoError::InvalidKeyMaterial("AES-128-CBC key/IV length".into()))?;

    let padded_len = plaintext
        .len()
        .checked_div(BLOCK_LEN)
        .and_then(|blocks| blocks.checked_add(1))
        .and_then(|blocks| blocks.checked_mul(BLOCK_LEN))
        .ok_or_else(|| CryptoError::Encryption("plaintext too large".into()))?;

    let mut buf = vec![0u8; padded_len];
    buf[..plaintext.len()].copy_from_slice(plaintext);
    let written = cipher
        .encrypt_padded_mut::<Pkcs7>(&mut buf, plaintext.len())
        .map_err(|_| CryptoError::Encryption("padding buffer too small".into()))?
        .len();
    buf.truncate(written);
    Ok(buf)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
