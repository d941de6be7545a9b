//! RFC-5869 HMAC-SHA-256 extract+expand, in the two shapes this codec needs.
//!
//! Noise's internal `MixKey` extracts with the chaining key as salt and the
//! DH output as input key material, expanding with an empty info string.
//! The post-handshake modern-short key schedule
//! extracts with the chaining key as salt and *empty* input key material,
//! expanding with the step's ASCII label as info. Both produce a 64-byte
//! output split into a new 32-byte chaining key and a named 32-byte key.

use hkdf::Hkdf;
use sha2::Sha256;

fn split_64(okm: [u8; 64]) -> ([u8; 32], [u8; 32]) {
    let mut a = [0u8; 32];
    let mut b = [0u8; 32];
    a.copy_from_slice(&okm[..32]);
    b.copy_from_slice(&okm[32..]);
    (a, b)
}

/// Noise `MixKey(ck, ikm)`: salt = `ck`, IKM = `ikm`, info = "".
pub fn noise_mix_key(ck: &[u8; 32], ikm: &[u8]) -> ([u8; 32], [u8; 32]) {
    let hk = Hkdf::<Sha256>::new(Some(ck), ikm);
    let mut okm = [0u8; 64];
    hk.expand(&[], &mut okm)
        .expect("64 is a valid HKDF-SHA256 output length");
    split_64(okm)
}

/// Modern-short key-schedule step: salt = `ck`, IKM = "", info = `label`.
pub fn schedule_step(ck: &[u8; 32], label: &[u8]) -> ([u8; 32], [u8; 32]) {
    let hk = Hkdf::<Sha256>::new(Some(ck), &[]);
    let mut okm = [0u8; 64];
    hk.expand(label, &mut okm)
        .expect("64 is a valid HKDF-SHA256 output length");
    split_64(okm)
}
