//! Transforms a hop's framed wire record back into cleartext.

use tbr_core::error::{Error, Result};
use tbr_core::layout::offsets;
use tbr_core::ports::KeyFactory;
use tbr_core::Format;

use crate::elgamal::Engine as ElGamalEngine;
use crate::keys::DerivedKeys;
use crate::keytype::OurKey;
use crate::schedule;

/// Recovered cleartext and, for modern formats, the keys the handshake produced.
pub struct DecryptedRecord {
    pub cleartext: Vec<u8>,
    pub derived: Option<DerivedKeys>,
}

/// Decrypts a wire record addressed to our key. Callers are expected to have
/// already matched the wire record's 16-byte prefix against our own
/// identity hash before calling this — this type only ever sees the payload
/// that follows that prefix.
pub struct RecordDecryptor;

impl RecordDecryptor {
    pub fn decrypt(
        payload: &[u8],
        our_key: &OurKey,
        is_outbound_endpoint: bool,
        key_factory: &dyn KeyFactory,
    ) -> Result<DecryptedRecord> {
        match our_key {
            OurKey::ElGamal(private) => Self::decrypt_legacy(payload, private),
            OurKey::X25519 { private, public } => {
                Self::decrypt_modern(payload, private, public, is_outbound_endpoint, key_factory)
            }
        }
    }

    fn decrypt_legacy(payload: &[u8], our_private: &crate::elgamal::PrivateKey) -> Result<DecryptedRecord> {
        if payload.len() != offsets::legacy::ELG_HALF_1.len() + offsets::legacy::ELG_HALF_2.len() {
            return Err(Error::DecryptFailed);
        }

        let mut half_a = [0u8; 257];
        half_a[1..].copy_from_slice(&payload[..256]);
        let mut half_b = [0u8; 257];
        half_b[1..].copy_from_slice(&payload[256..512]);

        let engine = ElGamalEngine::new();
        let plaintext = engine
            .decrypt(&half_a, &half_b, our_private)
            .map_err(|e| {
                tracing::trace!(reason = %e, "legacy decrypt rejected");
                Error::DecryptFailed
            })?;

        if plaintext.len() > offsets::legacy::CLEARTEXT_LEN {
            return Err(Error::DecryptFailed);
        }
        let mut cleartext = vec![0u8; offsets::legacy::CLEARTEXT_LEN];
        let start = offsets::legacy::CLEARTEXT_LEN - plaintext.len();
        cleartext[start..].copy_from_slice(&plaintext);

        Ok(DecryptedRecord {
            cleartext,
            derived: None,
        })
    }

    fn decrypt_modern(
        payload: &[u8],
        our_static_private: &[u8; 32],
        our_static_public: &[u8; 32],
        is_outbound_endpoint: bool,
        key_factory: &dyn KeyFactory,
    ) -> Result<DecryptedRecord> {
        if payload.len() < 48 {
            return Err(Error::DecryptFailed);
        }
        let wire_len = payload.len() + 16; // + the 16-byte prefix the caller already consumed
        let format = Format::from_wire_len(wire_len)
            .and_then(|candidates| {
                candidates
                    .iter()
                    .copied()
                    .find(|f| matches!(f, Format::ModernLong | Format::ModernShort))
            })
            .ok_or(Error::DecryptFailed)?;

        let eph_pub: [u8; 32] = payload[..32].try_into().expect("checked len >= 48");

        // Cheap rejections before any scalar multiplication.
        if eph_pub[0] & 0x80 != 0 {
            tracing::trace!("rejected: ephemeral key not canonical (MSB set)");
            return Err(Error::DecryptFailed);
        }
        if &eph_pub == our_static_public {
            tracing::trace!("rejected: ephemeral key equals our own static key");
            return Err(Error::DecryptFailed);
        }
        if eph_pub == [0u8; 32] {
            tracing::trace!("rejected: ephemeral key is all-zero");
            return Err(Error::DecryptFailed);
        }

        let out = crate::noise::responder_read(our_static_private, our_static_public, payload, key_factory)
            .map_err(|e| {
                tracing::trace!(reason = %e, "modern decrypt rejected");
                Error::DecryptFailed
            })?;

        if out.plaintext.len() != format.cleartext_len() {
            return Err(Error::DecryptFailed);
        }

        let derived = match format {
            Format::ModernLong => schedule::derive_modern_long(out.chaining_key, out.handshake_hash),
            Format::ModernShort => {
                schedule::derive_modern_short(out.chaining_key, out.handshake_hash, is_outbound_endpoint)
            }
            Format::Legacy => unreachable!("filtered above"),
        };

        Ok(DecryptedRecord {
            cleartext: out.plaintext,
            derived: Some(derived),
        })
    }
}
