//! Derived key state, owned independently of any cleartext buffer.
//!
//! Derived keys must outlive the cleartext they
//! were produced alongside, so a caller can zero the cleartext while still
//! holding the keys layer cryptography and the garlic session need. This
//! module is that owned structure.

/// Layer/IV keys, carried in-band for legacy/modern-long and derived for
/// modern-short.
#[derive(Clone)]
pub struct LayerKeys {
    pub layer_key: [u8; 32],
    pub iv_key: [u8; 32],
}

/// Garlic key/tag pair, produced only for modern-short outbound-endpoint
/// records and consumed by the (out-of-scope) post-build garlic session.
#[derive(Clone)]
pub struct GarlicKeys {
    pub garlic_key: [u8; 32],
    pub garlic_tag: [u8; 32],
}

/// Keys produced alongside a modern-format encrypt or decrypt.
///
/// `chacha_reply_key`/`chacha_reply_ad` are always present for modern
/// records. `layer` is only populated for modern-short (legacy/modern-long
/// readers serve layer/IV keys straight from the cleartext instead).
/// `garlic` is populated only for modern-short outbound-endpoint records.
#[derive(Clone)]
pub struct DerivedKeys {
    pub chacha_reply_key: [u8; 32],
    pub chacha_reply_ad: [u8; 32],
    pub layer: Option<LayerKeys>,
    pub garlic: Option<GarlicKeys>,
}
