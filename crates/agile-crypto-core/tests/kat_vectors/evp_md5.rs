//! OpenSSL `EVP_BytesToKey(MD5, count = 1)` compatibility vectors.
//!
//! Generated with:
//!
//! ```text
//! printf 'hello agile' | openssl enc -aes-128-cbc -md md5 \
//!     -S 0102030405060708 -pass pass:secret
//! ```

use agile_crypto_core::kdf::stretch;
use agile_crypto_core::salted::{SaltedContainer, MAGIC};
use data_encoding::HEXLOWER;

const SALT: [u8; 8] = [1, 2, 3, 4, 5, 6, 7, 8];
const OPENSSL_CT: [u8; 16] = [
    0x02, 0x4c, 0x7e, 0x5c, 0x26, 0xae, 0x01, 0xe5, 0x1c, 0x2a, 0xad, 0xc6, 0x47, 0x1b, 0x85, 0xeb,
];

#[test]
fn stretch_matches_openssl_key_and_iv() {
    let out = stretch(b"secret", &SALT);
    assert_eq!(HEXLOWER.encode(out.key()), "c9e5a1bd216dbe1317e230cef48f38ee");
    assert_eq!(HEXLOWER.encode(out.iv()), "7f0e17ad64022144bccec4a1aa2879ab");
}

#[test]
fn openssl_salted_blob_opens() {
    let mut raw = MAGIC.to_vec();
    raw.extend_from_slice(&SALT);
    raw.extend_from_slice(&OPENSSL_CT);
    let container = SaltedContainer::from_bytes(&raw).expect("parse should succeed");
    let pt = container.open_stretched(b"secret").expect("open should succeed");
    assert_eq!(pt.expose(), b"hello agile");
}

#[test]
fn fixed_material_vector() {
    let out = stretch(b"0123456789abcdef", &SALT);
    assert_eq!(HEXLOWER.encode(out.key()), "a0a7e9b874aad2a7b017cba7276f7321");
    assert_eq!(HEXLOWER.encode(out.iv()), "dc19fb5214a8d29fc0bca608ab405c28");
}
