//! Per-format offset tables and length constants.
//!
//! Replaces the scattered `isEC ? ... : ...` ternaries a naive port would
//! produce with a single tagged `Format` that carries its own byte layout.
//! Every offset below is load-bearing: it is checked against spec fixtures
//! in `tests` and must not be adjusted independently of the wire format.

/// Which of the three coexisting wire formats a record uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    /// 222-byte cleartext, 2048-bit ElGamal, 528-byte wire record.
    Legacy,
    /// 464-byte cleartext, Noise N / X25519 / ChaCha20-Poly1305, 528-byte wire record.
    ModernLong,
    /// 154-byte cleartext, same AEAD as ModernLong, 218-byte wire record, derived reply/layer keys.
    ModernShort,
}

impl Format {
    /// Determine the format from a cleartext buffer's length.
    pub fn from_cleartext_len(len: usize) -> Option<Self> {
        match len {
            offsets::legacy::CLEARTEXT_LEN => Some(Format::Legacy),
            offsets::modern_long::CLEARTEXT_LEN => Some(Format::ModernLong),
            offsets::modern_short::CLEARTEXT_LEN => Some(Format::ModernShort),
            _ => None,
        }
    }

    /// Determine the format from a wire (encrypted) record's length.
    ///
    /// Legacy and ModernLong share the same wire length (528 bytes); callers
    /// that need to tell them apart based on wire bytes alone must also
    /// consult the recipient key type, which this codec always has on hand
    /// at the point a wire-length decision matters.
    pub fn from_wire_len(len: usize) -> Option<&'static [Format]> {
        match len {
            528 => Some(&[Format::Legacy, Format::ModernLong]),
            218 => Some(&[Format::ModernShort]),
            _ => None,
        }
    }

    pub fn cleartext_len(self) -> usize {
        match self {
            Format::Legacy => offsets::legacy::CLEARTEXT_LEN,
            Format::ModernLong => offsets::modern_long::CLEARTEXT_LEN,
            Format::ModernShort => offsets::modern_short::CLEARTEXT_LEN,
        }
    }

    pub fn wire_len(self) -> usize {
        match self {
            Format::Legacy => offsets::legacy::WIRE_LEN,
            Format::ModernLong => offsets::modern_long::WIRE_LEN,
            Format::ModernShort => offsets::modern_short::WIRE_LEN,
        }
    }

    /// Millisecond width of one timestamp quantum (hour for legacy, minute for modern).
    pub fn quantum_ms(self) -> u64 {
        match self {
            Format::Legacy => offsets::legacy::QUANTUM_MS,
            Format::ModernLong | Format::ModernShort => offsets::modern_long::QUANTUM_MS,
        }
    }

    /// Width of the anti-correlation back-dating window, in milliseconds.
    pub fn anti_correlation_window_ms(self) -> u64 {
        match self {
            Format::Legacy => offsets::legacy::ANTI_CORRELATION_WINDOW_MS,
            Format::ModernLong | Format::ModernShort => {
                offsets::modern_long::ANTI_CORRELATION_WINDOW_MS
            }
        }
    }

    /// Record expiration, in seconds, fixed for every format.
    pub fn expiration_seconds(self) -> u32 {
        600
    }

    /// Maximum serialized options size (0 for legacy, which carries none).
    pub fn max_options_bytes(self) -> usize {
        match self {
            Format::Legacy => 0,
            Format::ModernLong => offsets::modern_long::MAX_OPTIONS_BYTES,
            Format::ModernShort => offsets::modern_short::MAX_OPTIONS_BYTES,
        }
    }

    /// Whether this format carries in-band layer/IV/reply keys and a reply IV,
    /// as opposed to deriving them from the handshake chaining key.
    pub fn carries_inline_keys(self) -> bool {
        matches!(self, Format::Legacy | Format::ModernLong)
    }
}

/// Byte offsets and sizes for each format. Kept as plain `usize` ranges
/// rather than a parsed struct so builder/reader/codec share one source of
/// truth without an intermediate allocation.
pub mod offsets {
    /// Legacy (ElGamal) cleartext and wire layout.
    pub mod legacy {
        pub const CLEARTEXT_LEN: usize = 222;
        pub const WIRE_LEN: usize = 528;
        pub const QUANTUM_MS: u64 = 3_600_000; // one hour
        pub const ANTI_CORRELATION_WINDOW_MS: u64 = 90_000;

        pub const RECV_ID: std::ops::Range<usize> = 0..4;
        pub const OUR_IDENT: std::ops::Range<usize> = 4..36;
        pub const NEXT_ID: std::ops::Range<usize> = 36..40;
        pub const NEXT_HASH: std::ops::Range<usize> = 40..72;
        pub const LAYER_KEY: std::ops::Range<usize> = 72..104;
        pub const IV_KEY: std::ops::Range<usize> = 104..136;
        pub const REPLY_KEY: std::ops::Range<usize> = 136..168;
        pub const REPLY_IV: std::ops::Range<usize> = 168..184;
        pub const FLAGS: usize = 184;
        pub const REQ_TIME: std::ops::Range<usize> = 185..189;
        pub const NEXT_MSG_ID: std::ops::Range<usize> = 189..193;
        pub const PAD: std::ops::Range<usize> = 193..222;

        /// Wire record: hashPrefix[16] || elg1[256] || elg2[256].
        pub const HASH_PREFIX: std::ops::Range<usize> = 0..16;
        pub const ELG_HALF_1: std::ops::Range<usize> = 16..272;
        pub const ELG_HALF_2: std::ops::Range<usize> = 272..528;
    }

    /// Modern long (Noise N, 464-byte cleartext) layout.
    pub mod modern_long {
        pub const CLEARTEXT_LEN: usize = 464;
        pub const WIRE_LEN: usize = 528;
        pub const QUANTUM_MS: u64 = 60_000; // one minute
        pub const ANTI_CORRELATION_WINDOW_MS: u64 = 2_048;
        pub const MAX_OPTIONS_BYTES: usize = 296;

        pub const RECV_ID: std::ops::Range<usize> = 0..4;
        pub const NEXT_ID: std::ops::Range<usize> = 4..8;
        pub const NEXT_HASH: std::ops::Range<usize> = 8..40;
        pub const LAYER_KEY: std::ops::Range<usize> = 40..72;
        pub const IV_KEY: std::ops::Range<usize> = 72..104;
        pub const REPLY_KEY: std::ops::Range<usize> = 104..136;
        pub const REPLY_IV: std::ops::Range<usize> = 136..152;
        pub const FLAGS: usize = 152;
        pub const UNUSED: std::ops::Range<usize> = 153..156;
        pub const REQ_TIME: std::ops::Range<usize> = 156..160;
        pub const EXPIRATION: std::ops::Range<usize> = 160..164;
        pub const NEXT_MSG_ID: std::ops::Range<usize> = 164..168;
        pub const OPTIONS_OFFSET: usize = 168;

        /// Wire record: hashPrefix[16] || ephPub[32] || ct[464] || tag[16].
        pub const HASH_PREFIX: std::ops::Range<usize> = 0..16;
        pub const EPH_PUB: std::ops::Range<usize> = 16..48;
        pub const CIPHERTEXT: std::ops::Range<usize> = 48..512;
        pub const TAG: std::ops::Range<usize> = 512..528;
    }

    /// Modern short (Noise N, 154-byte cleartext, derived keys) layout.
    pub mod modern_short {
        pub const CLEARTEXT_LEN: usize = 154;
        pub const WIRE_LEN: usize = 218;
        pub const MAX_OPTIONS_BYTES: usize = 98;

        pub const RECV_ID: std::ops::Range<usize> = 0..4;
        pub const NEXT_ID: std::ops::Range<usize> = 4..8;
        pub const NEXT_HASH: std::ops::Range<usize> = 8..40;
        pub const FLAGS: usize = 40;
        pub const UNUSED: std::ops::Range<usize> = 41..43;
        pub const LAYER_ENC_TYPE: usize = 43;
        pub const REQ_TIME: std::ops::Range<usize> = 44..48;
        pub const EXPIRATION: std::ops::Range<usize> = 48..52;
        pub const NEXT_MSG_ID: std::ops::Range<usize> = 52..56;
        pub const OPTIONS_OFFSET: usize = 56;

        /// Wire record: hashPrefix[16] || ephPub[32] || ct[154] || tag[16].
        pub const HASH_PREFIX: std::ops::Range<usize> = 0..16;
        pub const EPH_PUB: std::ops::Range<usize> = 16..48;
        pub const CIPHERTEXT: std::ops::Range<usize> = 48..202;
        pub const TAG: std::ops::Range<usize> = 202..218;
    }
}

/// HKDF labels used by the modern-short key schedule (ASCII, no terminator).
pub mod hkdf_labels {
    pub const REPLY_KEY: &[u8] = b"SMTunnelReplyKey";
    pub const LAYER_KEY: &[u8] = b"SMTunnelLayerKey";
    pub const IV_KEY: &[u8] = b"TunnelLayerIVKey";
    pub const GARLIC_KEY_AND_TAG: &[u8] = b"RGarlicKeyAndTag";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_layout_sums_to_cleartext_len() {
        assert_eq!(offsets::legacy::PAD.end, offsets::legacy::CLEARTEXT_LEN);
    }

    #[test]
    fn modern_long_options_budget_reaches_cleartext_end() {
        assert_eq!(
            offsets::modern_long::OPTIONS_OFFSET + offsets::modern_long::MAX_OPTIONS_BYTES,
            offsets::modern_long::CLEARTEXT_LEN
        );
    }

    #[test]
    fn modern_short_options_budget_reaches_cleartext_end() {
        assert_eq!(
            offsets::modern_short::OPTIONS_OFFSET + offsets::modern_short::MAX_OPTIONS_BYTES,
            offsets::modern_short::CLEARTEXT_LEN
        );
    }

    #[test]
    fn format_detection_round_trips_on_cleartext_len() {
        assert_eq!(Format::from_cleartext_len(222), Some(Format::Legacy));
        assert_eq!(Format::from_cleartext_len(464), Some(Format::ModernLong));
        assert_eq!(Format::from_cleartext_len(154), Some(Format::ModernShort));
        assert_eq!(Format::from_cleartext_len(223), None);
    }
}
