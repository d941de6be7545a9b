//! Post-handshake key derivation, shared verbatim between encrypt and decrypt.
//!
//! The decryptor must run the "identical HKDF
//! chain" the encryptor does; living here once means there is only one
//! place that chain can drift.

use crate::hkdf::schedule_step;
use crate::keys::{DerivedKeys, GarlicKeys, LayerKeys};
use tbr_core::layout::hkdf_labels;

/// Modern-long: no further HKDF steps, the Noise outputs themselves are the
/// reply key/AD. Layer/IV keys are carried in-band, not derived.
pub fn derive_modern_long(ck: [u8; 32], h: [u8; 32]) -> DerivedKeys {
    DerivedKeys {
        chacha_reply_key: ck,
        chacha_reply_ad: h,
        layer: None,
        garlic: None,
    }
}

/// Modern-short: the four/six-step post-handshake HKDF chain.
/// `is_outbound_endpoint` selects whether the chain continues into the
/// garlic key pair or stops at a directly-reused chaining key for `ivKey`.
pub fn derive_modern_short(ck: [u8; 32], h: [u8; 32], is_outbound_endpoint: bool) -> DerivedKeys {
    let (ck1, reply_key) = schedule_step(&ck, hkdf_labels::REPLY_KEY);
    let (ck2, layer_key) = schedule_step(&ck1, hkdf_labels::LAYER_KEY);

    let (iv_key, garlic) = if is_outbound_endpoint {
        let (ck3, iv_key) = schedule_step(&ck2, hkdf_labels::IV_KEY);
        let (garlic_tag, garlic_key) = schedule_step(&ck3, hkdf_labels::GARLIC_KEY_AND_TAG);
        (iv_key, Some(GarlicKeys { garlic_key, garlic_tag }))
    } else {
        (ck2, None)
    };

    DerivedKeys {
        chacha_reply_key: reply_key,
        chacha_reply_ad: h,
        layer: Some(LayerKeys { layer_key, iv_key }),
        garlic,
    }
}
