//! Transforms cleartext into a hop's framed wire record.

use tbr_core::error::{Error, Result};
use tbr_core::layout::offsets;
use tbr_core::ports::{KeyFactory, SecureRandom};
use tbr_core::Format;

use crate::elgamal::{self, Engine as ElGamalEngine};
use crate::keys::DerivedKeys;
use crate::keytype::RecipientKey;
use crate::schedule;

/// A framed wire record and, for modern formats, the keys the handshake produced.
pub struct EncryptedRecord {
    pub wire: Vec<u8>,
    pub derived: Option<DerivedKeys>,
}

/// Encrypts cleartext to a single hop's public key.
pub struct RecordEncryptor;

impl RecordEncryptor {
    /// `recipient_identity_hash` is the full 32-byte hash this hop is known
    /// by; only its first 16 bytes are written into the wire prefix.
    pub fn encrypt(
        cleartext: &[u8],
        recipient_identity_hash: &[u8; 32],
        recipient_key: &RecipientKey,
        key_factory: &dyn KeyFactory,
        rng: &dyn SecureRandom,
        is_outbound_endpoint: bool,
    ) -> Result<EncryptedRecord> {
        match recipient_key {
            RecipientKey::ElGamal(public) => {
                Self::encrypt_legacy(cleartext, recipient_identity_hash, public, rng)
            }
            RecipientKey::X25519(public) => Self::encrypt_modern(
                cleartext,
                recipient_identity_hash,
                public,
                key_factory,
                is_outbound_endpoint,
            ),
        }
    }

    fn encrypt_legacy(
        cleartext: &[u8],
        recipient_identity_hash: &[u8; 32],
        recipient_public: &elgamal::PublicKey,
        rng: &dyn SecureRandom,
    ) -> Result<EncryptedRecord> {
        match Format::from_cleartext_len(cleartext.len()) {
            Some(Format::Legacy) => {}
            Some(Format::ModernLong) | Some(Format::ModernShort) => {
                return Err(Error::UnsupportedKeyType)
            }
            None => return Err(Error::MalformedCleartext(cleartext.len())),
        }
        tracing::trace!("encrypting legacy tunnel build request record");
        let engine = ElGamalEngine::new();
        let (half_a, half_b) = engine
            .encrypt(cleartext, recipient_public, rng)
            .map_err(|_| Error::DecryptFailed)?;

        let mut wire = Vec::with_capacity(offsets::legacy::WIRE_LEN);
        wire.extend_from_slice(&recipient_identity_hash[..16]);
        wire.extend_from_slice(&half_a[1..]); // strip the engine's leading zero byte
        wire.extend_from_slice(&half_b[1..]);
        debug_assert_eq!(wire.len(), offsets::legacy::WIRE_LEN);

        Ok(EncryptedRecord { wire, derived: None })
    }

    fn encrypt_modern(
        cleartext: &[u8],
        recipient_identity_hash: &[u8; 32],
        recipient_static_public: &[u8; 32],
        key_factory: &dyn KeyFactory,
        is_outbound_endpoint: bool,
    ) -> Result<EncryptedRecord> {
        let format = match Format::from_cleartext_len(cleartext.len()) {
            Some(f @ (Format::ModernLong | Format::ModernShort)) => f,
            Some(Format::Legacy) => return Err(Error::UnsupportedKeyType),
            None => return Err(Error::MalformedCleartext(cleartext.len())),
        };
        tracing::trace!(?format, "encrypting modern tunnel build request record");

        let out = crate::noise::initiator_write(recipient_static_public, cleartext, key_factory)
            .map_err(|_| Error::DecryptFailed)?;

        let mut wire = Vec::with_capacity(16 + out.message.len());
        wire.extend_from_slice(&recipient_identity_hash[..16]);
        wire.extend_from_slice(&out.message);

        let derived = match format {
            Format::ModernLong => schedule::derive_modern_long(out.chaining_key, out.handshake_hash),
            Format::ModernShort => {
                schedule::derive_modern_short(out.chaining_key, out.handshake_hash, is_outbound_endpoint)
            }
            Format::Legacy => unreachable!("filtered above"),
        };

        Ok(EncryptedRecord {
            wire,
            derived: Some(derived),
        })
    }
}
