//! External collaborators the codec draws from but does not own: a clock, a
//! cryptographic random source, and an X25519 key/DH facility. Modeling
//! these as traits, rather than reaching for `SystemTime::now()` and
//! `OsRng` directly, is what lets the canonical-key-rejection property be
//! tested with a DH-invocation-counting double instead of a live X25519
//! implementation.

use rand::RngCore;
use x25519_dalek::{PublicKey, StaticSecret};

/// Monotonic wall-clock with millisecond resolution.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Cryptographic random byte generator.
pub trait SecureRandom: Send + Sync {
    /// Fill `buf` with random bytes.
    fn fill_bytes(&self, buf: &mut [u8]);

    /// A uniformly random integer in `[0, bound)`. `bound` must be nonzero.
    fn below(&self, bound: u64) -> u64;
}

/// Ephemeral X25519 key-pair generation and Diffie-Hellman.
///
/// `diffie_hellman` is a distinct method (rather than inlined at each call
/// site) specifically so a test double can count invocations and assert
/// that the cheap rejections in `RecordDecryptor` run before any DH ever
/// happens.
pub trait KeyFactory: Send + Sync {
    /// Generate a fresh ephemeral keypair, returning (private, public) bytes.
    fn generate_ephemeral(&self) -> ([u8; 32], [u8; 32]);

    /// Perform X25519 Diffie-Hellman, returning the raw shared-secret bytes.
    fn diffie_hellman(&self, our_private: &[u8; 32], their_public: &[u8; 32]) -> [u8; 32];
}

/// System clock, millisecond resolution.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// `rand::rngs::OsRng`-backed [`SecureRandom`].
#[derive(Clone, Copy, Debug, Default)]
pub struct OsRandom;

impl SecureRandom for OsRandom {
    fn fill_bytes(&self, buf: &mut [u8]) {
        rand::rngs::OsRng.fill_bytes(buf);
    }

    fn below(&self, bound: u64) -> u64 {
        assert!(bound > 0, "below() requires a nonzero bound");
        rand::rngs::OsRng.next_u64() % bound
    }
}

/// Plain X25519 [`KeyFactory`] backed by `x25519-dalek`.
#[derive(Clone, Copy, Debug, Default)]
pub struct X25519KeyFactory;

impl KeyFactory for X25519KeyFactory {
    fn generate_ephemeral(&self) -> ([u8; 32], [u8; 32]) {
        let secret = StaticSecret::random_from_rng(rand::rngs::OsRng);
        let public = PublicKey::from(&secret);
        (secret.to_bytes(), *public.as_bytes())
    }

    fn diffie_hellman(&self, our_private: &[u8; 32], their_public: &[u8; 32]) -> [u8; 32] {
        let secret = StaticSecret::from(*our_private);
        let public = PublicKey::from(*their_public);
        *secret.diffie_hellman(&public).as_bytes()
    }
}
