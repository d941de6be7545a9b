//! The two key families a hop's router identity can carry.

use crate::elgamal;

/// A recipient's public key, as handed to `RecordEncryptor`.
pub enum RecipientKey {
    ElGamal(elgamal::PublicKey),
    X25519([u8; 32]),
}

/// Our own static private key, as handed to `RecordDecryptor`. The X25519
/// variant also carries the matching public key since the Noise responder
/// mixes it into the handshake hash.
pub enum OurKey {
    ElGamal(elgamal::PrivateKey),
    X25519 {
        private: [u8; 32],
        public: [u8; 32],
    },
}
