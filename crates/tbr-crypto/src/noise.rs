//! Single-message Noise `N` handshake: initiator encrypt, responder decrypt.
//!
//! Pattern `N`, DH = X25519, cipher = ChaCha20-Poly1305, hash = SHA-256,
//! with an empty prologue (assumed empty absent further guidance from the
//! enclosing protocol). `N` has a pre-message `<- s` (the responder's
//! static key is known to the initiator in advance) and a single message
//! pattern `-> e, es`. This
//! crate only ever runs one message per handshake instance, so the nonce
//! counter is always zero and the chaining key/handshake hash captured
//! right after that message are the codec's derived-key inputs — there is
//! no `Split()` into a second pair of transport keys.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Nonce,
};
use sha2::{Digest, Sha256};
use tbr_core::ports::KeyFactory;
use zeroize::Zeroize;

const PROTOCOL_NAME: &[u8] = b"Noise_N_25519_ChaChaPoly_SHA256";
const ZERO_NONCE: [u8; 12] = [0u8; 12];

#[derive(Debug, thiserror::Error)]
pub enum NoiseError {
    #[error("AEAD operation failed")]
    Aead,
    #[error("message too short")]
    Truncated,
}

struct SymmetricState {
    h: [u8; 32],
    ck: [u8; 32],
}

impl SymmetricState {
    fn initialize(protocol_name: &[u8]) -> Self {
        let h = if protocol_name.len() <= 32 {
            let mut h = [0u8; 32];
            h[..protocol_name.len()].copy_from_slice(protocol_name);
            h
        } else {
            let digest = Sha256::digest(protocol_name);
            let mut h = [0u8; 32];
            h.copy_from_slice(&digest);
            h
        };
        Self { h, ck: h }
    }

    fn mix_hash(&mut self, data: &[u8]) {
        let mut hasher = Sha256::new();
        hasher.update(self.h);
        hasher.update(data);
        self.h = hasher.finalize().into();
    }

    fn mix_key(&mut self, ikm: &[u8]) -> [u8; 32] {
        let (new_ck, temp_k) = crate::hkdf::noise_mix_key(&self.ck, ikm);
        self.ck = new_ck;
        temp_k
    }

    fn destroy(&mut self) {
        self.h.zeroize();
        self.ck.zeroize();
    }
}

fn encrypt_with_ad(key: &[u8; 32], ad: &[u8; 32], plaintext: &[u8]) -> Result<Vec<u8>, NoiseError> {
    let cipher = ChaCha20Poly1305::new_from_slice(key).map_err(|_| NoiseError::Aead)?;
    cipher
        .encrypt(
            Nonce::from_slice(&ZERO_NONCE),
            Payload {
                msg: plaintext,
                aad: ad,
            },
        )
        .map_err(|_| NoiseError::Aead)
}

fn decrypt_with_ad(key: &[u8; 32], ad: &[u8; 32], ciphertext: &[u8]) -> Result<Vec<u8>, NoiseError> {
    let cipher = ChaCha20Poly1305::new_from_slice(key).map_err(|_| NoiseError::Aead)?;
    cipher
        .decrypt(
            Nonce::from_slice(&ZERO_NONCE),
            Payload {
                msg: ciphertext,
                aad: ad,
            },
        )
        .map_err(|_| NoiseError::Aead)
}

/// Output of a completed initiator handshake write.
pub struct InitiatorOutput {
    /// `ephemeral_public || ciphertext || tag`, written at a fixed offset by the caller.
    pub message: Vec<u8>,
    pub chaining_key: [u8; 32],
    pub handshake_hash: [u8; 32],
}

/// Run the initiator side: encrypt `plaintext` to `responder_static_public`.
pub fn initiator_write(
    responder_static_public: &[u8; 32],
    plaintext: &[u8],
    key_factory: &dyn KeyFactory,
) -> Result<InitiatorOutput, NoiseError> {
    let mut st = SymmetricState::initialize(PROTOCOL_NAME);
    st.mix_hash(&[]); // empty prologue
    st.mix_hash(responder_static_public); // pre-message "<- s"

    let (mut e_priv, e_pub) = key_factory.generate_ephemeral();
    st.mix_hash(&e_pub);

    let dh = key_factory.diffie_hellman(&e_priv, responder_static_public);
    let temp_k = st.mix_key(&dh);
    e_priv.zeroize();

    let ciphertext = match encrypt_with_ad(&temp_k, &st.h, plaintext) {
        Ok(ct) => ct,
        Err(e) => {
            st.destroy();
            return Err(e);
        }
    };
    st.mix_hash(&ciphertext);

    let mut message = Vec::with_capacity(32 + ciphertext.len());
    message.extend_from_slice(&e_pub);
    message.extend_from_slice(&ciphertext);

    let chaining_key = st.ck;
    let handshake_hash = st.h;
    st.destroy();

    Ok(InitiatorOutput {
        message,
        chaining_key,
        handshake_hash,
    })
}

/// Output of a completed responder handshake read.
pub struct ResponderOutput {
    pub plaintext: Vec<u8>,
    pub chaining_key: [u8; 32],
    pub handshake_hash: [u8; 32],
}

/// Run the responder side: decrypt `message` (`ephemeral_public ||
/// ciphertext || tag`) using our static keypair.
///
/// Callers MUST perform the cheap rejections (canonical
/// ephemeral key, not our own key, not all-zero) before calling this —
/// this function always performs the DH.
pub fn responder_read(
    our_static_private: &[u8; 32],
    our_static_public: &[u8; 32],
    message: &[u8],
    key_factory: &dyn KeyFactory,
) -> Result<ResponderOutput, NoiseError> {
    if message.len() < 32 + 16 {
        return Err(NoiseError::Truncated);
    }
    let mut eph_pub = [0u8; 32];
    eph_pub.copy_from_slice(&message[..32]);
    let ciphertext = &message[32..];

    let mut st = SymmetricState::initialize(PROTOCOL_NAME);
    st.mix_hash(&[]);
    st.mix_hash(our_static_public);
    st.mix_hash(&eph_pub);

    let dh = key_factory.diffie_hellman(our_static_private, &eph_pub);
    let temp_k = st.mix_key(&dh);

    let plaintext = match decrypt_with_ad(&temp_k, &st.h, ciphertext) {
        Ok(pt) => pt,
        Err(e) => {
            st.destroy();
            return Err(e);
        }
    };
    st.mix_hash(ciphertext);

    let chaining_key = st.ck;
    let handshake_hash = st.h;
    st.destroy();

    Ok(ResponderOutput {
        plaintext,
        chaining_key,
        handshake_hash,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tbr_core::ports::X25519KeyFactory;

    #[test]
    fn handshake_round_trips_and_keys_agree() {
        let kf = X25519KeyFactory;
        let (resp_priv, resp_pub) = kf.generate_ephemeral();

        let plaintext = b"tunnel build request record cleartext";
        let out = initiator_write(&resp_pub, plaintext, &kf).unwrap();

        let resp = responder_read(&resp_priv, &resp_pub, &out.message, &kf).unwrap();

        assert_eq!(resp.plaintext, plaintext);
        assert_eq!(resp.chaining_key, out.chaining_key);
        assert_eq!(resp.handshake_hash, out.handshake_hash);
    }

    #[test]
    fn symmetric_state_destroy_zeroizes_h_and_ck() {
        let mut st = SymmetricState::initialize(PROTOCOL_NAME);
        st.mix_hash(b"anything");
        st.destroy();
        assert_eq!(st.h, [0u8; 32]);
        assert_eq!(st.ck, [0u8; 32]);
    }

    #[test]
    fn tampered_ciphertext_fails_closed() {
        let kf = X25519KeyFactory;
        let (resp_priv, resp_pub) = kf.generate_ephemeral();
        let mut out = initiator_write(&resp_pub, b"hello", &kf).unwrap();
        let last = out.message.len() - 1;
        out.message[last] ^= 0xFF;

        assert!(responder_read(&resp_priv, &resp_pub, &out.message, &kf).is_err());
    }
}
