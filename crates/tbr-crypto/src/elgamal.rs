//! Legacy 2048-bit discrete-log ElGamal encrypt/decrypt.
//!
//! Uses the RFC 3526 Group 14 MODP prime (public domain parameters, the
//! same group the legacy protocol this format comes from uses) with
//! generator 2. No ElGamal crate appears anywhere in the reference pack,
//! so this is built directly on `num-bigint`/`num-traits`, the way the
//! closest example repos in this pack reach for the same crates to
//! implement their own bignum-based primitives.
//!
//! The engine's output halves are 257 bytes each: a 2048-bit (256-byte)
//! big-endian value with a leading zero byte, mirroring big-integer
//! libraries whose `to_bytes` representation reserves a sign byte even for
//! values that are always positive. This is a property of the engine's
//! output encoding, not of the record format: the wire format strips the
//! leading byte on encode and the decoder reinserts it.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};
use tbr_core::ports::SecureRandom;

#[derive(Debug, thiserror::Error)]
pub enum ElGamalError {
    #[error("plaintext too large for the group modulus")]
    PlaintextTooLarge,
    #[error("ciphertext half malformed")]
    MalformedHalf,
    #[error("decryption failed")]
    DecryptFailed,
}

const GROUP_14_PRIME_HEX: &str = concat!(
    "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD129024E088A67CC74",
    "020BBEA63B139B22514A08798E3404DDEF9519B3CD3A431B302B0A6DF25F1437",
    "4FE1356D6D51C245E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7ED",
    "EE386BFB5A899FA5AE9F24117C4B1FE649286651ECE45B3DC2007CB8A163BF05",
    "98DA48361C55D39A69163FA8FD24CF5F83655D23DCA3AD961C62F356208552BB",
    "9ED529077096966D670C354E4ABC9804F1746C08CA18217C32905E462E36CE3B",
    "E39E772C180E86039B2783A2EC07A28FB5C55DF06F4C52C9DE2BCBF695581718",
    "3995497CEA956AE515D2261898FA051015728E5A8AACAA68FFFFFFFFFFFFFFFF",
);

/// ElGamal public key: the group element `y = g^x mod p`, 256-byte big-endian.
pub struct PublicKey(pub [u8; 256]);

/// ElGamal private key: the exponent `x`, 256-byte big-endian.
pub struct PrivateKey(pub [u8; 256]);

pub struct Engine {
    p: BigUint,
    g: BigUint,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        let p = BigUint::parse_bytes(GROUP_14_PRIME_HEX.as_bytes(), 16)
            .expect("GROUP_14_PRIME_HEX is a valid hex literal");
        Self { p, g: BigUint::from(2u32) }
    }

    /// Encrypt `plaintext` (at most 222 bytes, the legacy cleartext length)
    /// to `recipient_public`, returning the two 257-byte halves.
    pub fn encrypt(
        &self,
        plaintext: &[u8],
        recipient_public: &PublicKey,
        rng: &dyn SecureRandom,
    ) -> Result<([u8; 257], [u8; 257]), ElGamalError> {
        let m = BigUint::from_bytes_be(plaintext);
        if m >= self.p {
            return Err(ElGamalError::PlaintextTooLarge);
        }
        let y = BigUint::from_bytes_be(&recipient_public.0);

        let k = self.random_exponent(rng);
        let a = self.g.modpow(&k, &self.p);
        let b = (y.modpow(&k, &self.p) * &m) % &self.p;

        Ok((to_half(&a), to_half(&b)))
    }

    /// Decrypt the two 257-byte halves with our private key.
    pub fn decrypt(
        &self,
        half_a: &[u8; 257],
        half_b: &[u8; 257],
        our_private: &PrivateKey,
    ) -> Result<Vec<u8>, ElGamalError> {
        let a = from_half(half_a)?;
        let b = from_half(half_b)?;
        let x = BigUint::from_bytes_be(&our_private.0);

        if a.is_zero() || a >= self.p || b >= self.p {
            return Err(ElGamalError::DecryptFailed);
        }

        // m = b * (a^x)^-1 mod p
        let s = a.modpow(&x, &self.p);
        let s_inv = mod_inverse(&s, &self.p).ok_or(ElGamalError::DecryptFailed)?;
        let m = (&b * &s_inv) % &self.p;

        Ok(m.to_bytes_be())
    }

    fn random_exponent(&self, rng: &dyn SecureRandom) -> BigUint {
        let mut buf = [0u8; 256];
        loop {
            rng.fill_bytes(&mut buf);
            let candidate = BigUint::from_bytes_be(&buf) % (&self.p - BigUint::one());
            if !candidate.is_zero() {
                return candidate;
            }
        }
    }
}

fn to_half(value: &BigUint) -> [u8; 257] {
    let mut out = [0u8; 257];
    let bytes = value.to_bytes_be();
    debug_assert!(bytes.len() <= 256);
    out[257 - bytes.len()..].copy_from_slice(&bytes);
    out
}

fn from_half(half: &[u8; 257]) -> Result<BigUint, ElGamalError> {
    if half[0] != 0 {
        return Err(ElGamalError::MalformedHalf);
    }
    Ok(BigUint::from_bytes_be(&half[1..]))
}

/// Modular multiplicative inverse via the extended Euclidean algorithm.
fn mod_inverse(a: &BigUint, modulus: &BigUint) -> Option<BigUint> {
    let (g, x, _) = extended_gcd(&a.clone().into(), &modulus.clone().into());
    if g != num_bigint::BigInt::one() {
        return None;
    }
    let m = num_bigint::BigInt::from(modulus.clone());
    let result = ((x % &m) + &m) % &m;
    result.to_biguint()
}

fn extended_gcd(
    a: &num_bigint::BigInt,
    b: &num_bigint::BigInt,
) -> (num_bigint::BigInt, num_bigint::BigInt, num_bigint::BigInt) {
    if b.is_zero() {
        return (a.clone(), num_bigint::BigInt::one(), num_bigint::BigInt::zero());
    }
    let (q, r) = a.div_rem(b);
    let (g, x1, y1) = extended_gcd(b, &r);
    (g, y1.clone(), x1 - q * y1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tbr_core::ports::OsRandom;

    #[test]
    fn group_14_prime_matches_independent_hex_decode() {
        let bytes = hex::decode(GROUP_14_PRIME_HEX).unwrap();
        assert_eq!(bytes.len(), 256);
        assert_eq!(BigUint::from_bytes_be(&bytes), Engine::new().p);
    }

    fn keypair(engine: &Engine, x_seed: u8) -> (PrivateKey, PublicKey) {
        // Deterministic toy keypair for tests: small fixed private exponent.
        let mut x_bytes = [0u8; 256];
        x_bytes[255] = x_seed;
        let x = BigUint::from_bytes_be(&x_bytes);
        let y = engine.g.modpow(&x, &engine.p);
        let mut y_bytes = [0u8; 256];
        let yb = y.to_bytes_be();
        y_bytes[256 - yb.len()..].copy_from_slice(&yb);
        (PrivateKey(x_bytes), PublicKey(y_bytes))
    }

    #[test]
    fn round_trips_and_strips_leading_zero() {
        let engine = Engine::new();
        let (priv_key, pub_key) = keypair(&engine, 0x42);
        let plaintext = b"legacy tunnel build record cleartext!";

        let rng = OsRandom;
        let (half_a, half_b) = engine.encrypt(plaintext, &pub_key, &rng).unwrap();
        assert_eq!(half_a[0], 0);
        assert_eq!(half_b[0], 0);

        let decrypted = engine.decrypt(&half_a, &half_b, &priv_key).unwrap();
        // decrypt returns the minimal big-endian encoding; compare against
        // the plaintext with its own leading zero bytes stripped.
        let trimmed: Vec<u8> = {
            let mut v = plaintext.to_vec();
            while v.first() == Some(&0) {
                v.remove(0);
            }
            v
        };
        assert_eq!(decrypted, trimmed);
    }

    #[test]
    fn wrong_key_does_not_recover_plaintext() {
        let engine = Engine::new();
        let (_, pub_key) = keypair(&engine, 0x11);
        let (wrong_priv, _) = keypair(&engine, 0x22);
        let rng = OsRandom;

        let (half_a, half_b) = engine.encrypt(b"secret", &pub_key, &rng).unwrap();
        let decrypted = engine.decrypt(&half_a, &half_b, &wrong_priv).unwrap();
        assert_ne!(decrypted, b"secret".to_vec());
    }
}
