//! Serializes cleartext in each format with correct framing, flags,
//! timestamps, options, and padding.
//!
//! One constructor per format. Every builder
//! follows the same two-pass scheme: fill the whole buffer with random
//! bytes first (this doubles as the padding the format requires once
//! structured fields are overwritten on top of it), then write each
//! structured field at its fixed offset. Reserved/"unused" bytes
//! interspersed among structured fields are zeroed rather than left random,
//! unlike true trailing padding, since they are reserved-must-be-zero
//! fields rather than padding — see DESIGN.md for this interpretation.

use tbr_core::error::{Error, Result};
use tbr_core::layout::offsets;
use tbr_core::ports::{Clock, SecureRandom};
use tbr_core::{CommonFields, InlineKeys, Options};

/// Builds wire-ready cleartext blocks for all three formats.
pub struct RecordBuilder;

impl RecordBuilder {
    /// Legacy (ElGamal) format: 222-byte cleartext with in-band keys and no options.
    pub fn legacy(
        common: &CommonFields,
        our_ident: &[u8; 32],
        keys: &InlineKeys,
        clock: &dyn Clock,
        rng: &dyn SecureRandom,
    ) -> Result<Vec<u8>> {
        common.flags.validate()?;
        tracing::debug!(format = "legacy", "building tunnel build request record");

        let mut buf = vec![0u8; offsets::legacy::CLEARTEXT_LEN];
        rng.fill_bytes(&mut buf);

        buf[offsets::legacy::RECV_ID].copy_from_slice(&common.receive_tunnel_id.to_be_bytes());
        buf[offsets::legacy::OUR_IDENT].copy_from_slice(our_ident);
        buf[offsets::legacy::NEXT_ID].copy_from_slice(&common.next_tunnel_id.to_be_bytes());
        buf[offsets::legacy::NEXT_HASH].copy_from_slice(&common.next_hop);
        buf[offsets::legacy::LAYER_KEY].copy_from_slice(&keys.layer_key);
        buf[offsets::legacy::IV_KEY].copy_from_slice(&keys.iv_key);
        buf[offsets::legacy::REPLY_KEY].copy_from_slice(&keys.reply_key);
        buf[offsets::legacy::REPLY_IV].copy_from_slice(&keys.reply_iv);
        buf[offsets::legacy::FLAGS] = common.flags.to_byte();

        let quantum = quantize(tbr_core::Format::Legacy, clock, rng);
        buf[offsets::legacy::REQ_TIME].copy_from_slice(&quantum.to_be_bytes());
        buf[offsets::legacy::NEXT_MSG_ID].copy_from_slice(&common.next_msg_id.to_be_bytes());

        debug_assert_eq!(buf.len(), offsets::legacy::CLEARTEXT_LEN);
        Ok(buf)
    }

    /// Modern long format: 464-byte cleartext with in-band keys and options.
    pub fn modern_long(
        common: &CommonFields,
        keys: &InlineKeys,
        options: &Options,
        clock: &dyn Clock,
        rng: &dyn SecureRandom,
    ) -> Result<Vec<u8>> {
        common.flags.validate()?;
        tracing::debug!(format = "modern_long", "building tunnel build request record");

        let mut buf = vec![0u8; offsets::modern_long::CLEARTEXT_LEN];
        rng.fill_bytes(&mut buf);

        buf[offsets::modern_long::RECV_ID].copy_from_slice(&common.receive_tunnel_id.to_be_bytes());
        buf[offsets::modern_long::NEXT_ID].copy_from_slice(&common.next_tunnel_id.to_be_bytes());
        buf[offsets::modern_long::NEXT_HASH].copy_from_slice(&common.next_hop);
        buf[offsets::modern_long::LAYER_KEY].copy_from_slice(&keys.layer_key);
        buf[offsets::modern_long::IV_KEY].copy_from_slice(&keys.iv_key);
        buf[offsets::modern_long::REPLY_KEY].copy_from_slice(&keys.reply_key);
        buf[offsets::modern_long::REPLY_IV].copy_from_slice(&keys.reply_iv);
        buf[offsets::modern_long::FLAGS] = common.flags.to_byte();
        buf[offsets::modern_long::UNUSED].fill(0);

        let quantum = quantize(tbr_core::Format::ModernLong, clock, rng);
        buf[offsets::modern_long::REQ_TIME].copy_from_slice(&quantum.to_be_bytes());
        buf[offsets::modern_long::EXPIRATION]
            .copy_from_slice(&tbr_core::Format::ModernLong.expiration_seconds().to_be_bytes());
        buf[offsets::modern_long::NEXT_MSG_ID].copy_from_slice(&common.next_msg_id.to_be_bytes());

        write_options(
            &mut buf,
            offsets::modern_long::OPTIONS_OFFSET,
            options,
            offsets::modern_long::MAX_OPTIONS_BYTES,
        )?;

        debug_assert_eq!(buf.len(), offsets::modern_long::CLEARTEXT_LEN);
        Ok(buf)
    }

    /// Modern short format: 154-byte cleartext, derived reply/layer/IV/garlic
    /// keys (nothing in-band but `layer_enc_type`), and options.
    pub fn modern_short(
        common: &CommonFields,
        layer_enc_type: u8,
        options: &Options,
        clock: &dyn Clock,
        rng: &dyn SecureRandom,
    ) -> Result<Vec<u8>> {
        common.flags.validate()?;
        tracing::debug!(format = "modern_short", "building tunnel build request record");

        let mut buf = vec![0u8; offsets::modern_short::CLEARTEXT_LEN];
        rng.fill_bytes(&mut buf);

        buf[offsets::modern_short::RECV_ID].copy_from_slice(&common.receive_tunnel_id.to_be_bytes());
        buf[offsets::modern_short::NEXT_ID].copy_from_slice(&common.next_tunnel_id.to_be_bytes());
        buf[offsets::modern_short::NEXT_HASH].copy_from_slice(&common.next_hop);
        buf[offsets::modern_short::FLAGS] = common.flags.to_byte();
        buf[offsets::modern_short::UNUSED].fill(0);
        buf[offsets::modern_short::LAYER_ENC_TYPE] = layer_enc_type;

        let quantum = quantize(tbr_core::Format::ModernShort, clock, rng);
        buf[offsets::modern_short::REQ_TIME].copy_from_slice(&quantum.to_be_bytes());
        buf[offsets::modern_short::EXPIRATION]
            .copy_from_slice(&tbr_core::Format::ModernShort.expiration_seconds().to_be_bytes());
        buf[offsets::modern_short::NEXT_MSG_ID].copy_from_slice(&common.next_msg_id.to_be_bytes());

        write_options(
            &mut buf,
            offsets::modern_short::OPTIONS_OFFSET,
            options,
            offsets::modern_short::MAX_OPTIONS_BYTES,
        )?;

        debug_assert_eq!(buf.len(), offsets::modern_short::CLEARTEXT_LEN);
        Ok(buf)
    }
}

fn write_options(buf: &mut [u8], offset: usize, options: &Options, max_bytes: usize) -> Result<()> {
    let encoded = tbr_core::options::encode(options, max_bytes)?;
    buf[offset..offset + encoded.len()].copy_from_slice(&encoded);
    Ok(())
}

/// Truncated-hour/minute timestamp: `(now - rand[0, window)) / quantum`, the
/// anti-correlation defence against traffic-timing correlation, not a bug.
fn quantize(format: tbr_core::Format, clock: &dyn Clock, rng: &dyn SecureRandom) -> u32 {
    let now = clock.now_millis();
    let back_dated = now.saturating_sub(rng.below(format.anti_correlation_window_ms()));
    (back_dated / format.quantum_ms()) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use tbr_core::{CommonFields, Flags};
    use tbr_core::ports::{OsRandom, SystemClock};

    fn common() -> CommonFields {
        CommonFields {
            receive_tunnel_id: 1,
            next_tunnel_id: 2,
            next_hop: [0u8; 32],
            next_msg_id: 3,
            flags: Flags::new(true, false).unwrap(),
        }
    }

    fn keys() -> InlineKeys {
        InlineKeys {
            layer_key: [0x11; 32],
            iv_key: [0x22; 32],
            reply_key: [0x33; 32],
            reply_iv: [0x44; 16],
        }
    }

    #[test]
    fn legacy_build_matches_concrete_scenario() {
        let clock = SystemClock;
        let rng = OsRandom;
        let before = clock.now_millis();

        let cleartext =
            RecordBuilder::legacy(&common(), &[0u8; 32], &keys(), &clock, &rng).unwrap();

        assert_eq!(cleartext.len(), 222);
        assert_eq!(cleartext[184], 0x80);

        let hours = u32::from_be_bytes(cleartext[185..189].try_into().unwrap()) as u64;
        let millis = hours * 3_600_000;
        assert!(millis <= before);
        assert!(before - millis <= 90_000 + 3_600_000);
    }

    #[test]
    fn builder_rejects_conflicting_flags() {
        let mut fields = common();
        fields.flags = Flags {
            is_inbound_gateway: true,
            is_outbound_endpoint: true,
        };
        let clock = SystemClock;
        let rng = OsRandom;
        assert!(RecordBuilder::legacy(&fields, &[0u8; 32], &keys(), &clock, &rng).is_err());
    }

    #[test]
    fn modern_short_oversized_options_is_rejected() {
        let clock = SystemClock;
        let rng = OsRandom;
        let mut options = Options::new();
        options.insert("k".repeat(46), "v".repeat(47));
        let err = RecordBuilder::modern_short(&common(), 0, &options, &clock, &rng).unwrap_err();
        assert!(matches!(err, Error::OversizedOptions { .. }));
    }

    #[test]
    fn modern_long_round_trip_preserves_structured_fields() {
        let clock = SystemClock;
        let rng = OsRandom;
        let mut options = Options::new();
        options.insert("foo".into(), "bar".into());

        let cleartext =
            RecordBuilder::modern_long(&common(), &keys(), &options, &clock, &rng).unwrap();
        assert_eq!(cleartext.len(), 464);
        assert_eq!(cleartext[152], 0x80);
        assert_eq!(&cleartext[160..164], &600u32.to_be_bytes());
    }

    /// Padding bytes come straight from `rng.fill_bytes` with nothing
    /// structured written over them, so they should look statistically
    /// uniform. A single build's pad region (29 bytes) is too small a
    /// sample on its own, so this pools the pad region across many builds
    /// and bins by nibble (16 bins) rather than by full byte (256 bins),
    /// keeping expected-per-bin counts high enough for a fast, low-flake
    /// unit test instead of spec.md §8's full N=10,000 byte-level sample.
    #[test]
    fn legacy_pad_bytes_pass_a_reduced_sample_chi_square_uniformity_check() {
        let clock = SystemClock;
        let rng = OsRandom;
        const ROUNDS: usize = 200;
        const BINS: usize = 16;

        let mut counts = [0u64; BINS];
        let mut total = 0u64;
        for _ in 0..ROUNDS {
            let cleartext = RecordBuilder::legacy(&common(), &[0u8; 32], &keys(), &clock, &rng).unwrap();
            for &byte in &cleartext[offsets::legacy::PAD] {
                counts[(byte >> 4) as usize] += 1;
                total += 1;
            }
        }

        let expected = total as f64 / BINS as f64;
        let chi_square: f64 = counts
            .iter()
            .map(|&observed| {
                let diff = observed as f64 - expected;
                diff * diff / expected
            })
            .sum();

        // df = BINS - 1 = 15; chi-square critical value at alpha=0.001 is
        // ~37.7, so this leaves ample margin against one-in-a-thousand
        // flakes while still catching a badly skewed or constant fill.
        assert!(
            chi_square < 60.0,
            "pad bytes deviate from uniform: chi_square={chi_square}, counts={counts:?}"
        );
    }
}
