//! RFC 6070: PBKDF2-HMAC-SHA1 test vectors.
//!
//! The RFC lists 20-byte outputs. PBKDF2 output blocks are independent,
//! so the first 20 bytes of our 32-byte key‖IV must match exactly.

use agile_crypto_core::kdf::pbkdf2_sha1;
use data_encoding::HEXLOWER;

fn joined(password: &[u8], salt: &[u8], iterations: u32) -> Vec<u8> {
    let out = pbkdf2_sha1(password, salt, iterations).expect("derive should succeed");
    let mut bytes = out.key().to_vec();
    bytes.extend_from_slice(out.iv());
    bytes
}

fn unhex(s: &str) -> Vec<u8> {
    HEXLOWER.decode(s.as_bytes()).expect("hex")
}

#[test]
fn rfc6070_c1() {
    let out = joined(b"password", b"salt", 1);
    assert_eq!(out[..20], unhex("0c60c80f961f0e71f3a9b524af6012062fe037a6"));
}

#[test]
fn rfc6070_c2() {
    let out = joined(b"password", b"salt", 2);
    assert_eq!(out[..20], unhex("ea6c014dc72d6f8ccd1ed92ace1d41f0d8de8957"));
}

#[test]
fn rfc6070_c4096() {
    let out = joined(b"password", b"salt", 4096);
    assert_eq!(out[..20], unhex("4b007901b765489abead49d926f721d065a429c1"));
}

#[test]
fn full_32_byte_output_c1() {
    let out = joined(b"password", b"salt", 1);
    assert_eq!(
        out,
        unhex("0c60c80f961f0e71f3a9b524af6012062fe037a6e0f0eb94fe8fc46bdc637164")
    );
}
