//! NIST SP 800-38A F.2.1: CBC-AES128 known-answer vectors.
//!
//! Our wrapper always appends a PKCS#7 block, so the NIST ciphertext is
//! compared against the leading blocks only.

use agile_crypto_core::kdf::KeyIv;
use agile_crypto_core::symmetric::{decrypt, encrypt};

const KEY: [u8; 16] = [
    0x2b, 0x7e, 0x15, 0x16, 0x28, 0xae, 0xd2, 0xa6, 0xab, 0xf7, 0x15, 0x88, 0x09, 0xcf, 0x4f, 0x3c,
];
const IV: [u8; 16] = [
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f,
];
const PT_BLOCK_1: [u8; 16] = [
    0x6b, 0xc1, 0xbe, 0xe2, 0x2e, 0x40, 0x9f, 0x96, 0xe9, 0x3d, 0x7e, 0x11, 0x73, 0x93, 0x17, 0x2a,
];
const CT_BLOCK_1: [u8; 16] = [
    0x76, 0x49, 0xab, 0xac, 0x81, 0x19, 0xb2, 0x46, 0xce, 0xe9, 0x8e, 0x9b, 0x12, 0xe9, 0x19, 0x7d,
];

#[test]
fn nist_cbc_aes128_block_1_encrypt() {
    let ct = encrypt(&PT_BLOCK_1, &KeyIv::new(KEY, IV)).expect("encrypt should succeed");
    assert_eq!(ct.len(), 32);
    assert_eq!(ct[..16], CT_BLOCK_1);
}

#[test]
fn nist_cbc_aes128_block_1_decrypt() {
    let ct = encrypt(&PT_BLOCK_1, &KeyIv::new(KEY, IV)).expect("encrypt should succeed");
    let pt = decrypt(&ct, &KeyIv::new(KEY, IV)).expect("decrypt should succeed");
    assert_eq!(pt.expose(), &PT_BLOCK_1);
}

#[test]
fn nist_ciphertext_without_padding_block_is_rejected() {
    // A bare NIST block does not end in valid PKCS#7 padding.
    let result = decrypt(&CT_BLOCK_1, &KeyIv::new(KEY, IV));
    assert!(result.is_err());
}
