//! `agile-crypto-core` — Legacy AgileKeychain cryptographic primitives.
//!
//! This crate is the audit target: zero file I/O, zero logging, zero async.
//! Everything here must stay bit-compatible with the on-disk format:
//! PBKDF2-HMAC-SHA1 master-key derivation, the MD5 `EVP_BytesToKey`
//! stretch, AES-128-CBC and OpenSSL salted containers.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod error;
pub mod memory;

pub mod kdf;
pub mod symmetric;

pub mod salted;

pub use error::CryptoError;
pub use kdf::{pbkdf2_sha1, stretch, KeyIv, DEFAULT_ITERATIONS};
pub use memory::{disable_core_dumps, SecretBuffer, SecretBytes};
pub use salted::{decode_base64, random_salt, SaltedContainer, MAGIC, SALT_LEN};
pub use symmetric::{decrypt, encrypt, BLOCK_LEN};
