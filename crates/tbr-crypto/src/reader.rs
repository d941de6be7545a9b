//! Typed accessors over a cleartext buffer, hiding per-format layout.

use tbr_core::error::{Error, Result};
use tbr_core::fields::Flags;
use tbr_core::layout::offsets;
use tbr_core::Format;

use crate::keys::{DerivedKeys, GarlicKeys, LayerKeys};

/// Reads fields out of a decoded cleartext buffer, optionally paired with
/// the [`DerivedKeys`] a modern-short encrypt/decrypt produced.
pub struct RecordReader<'a> {
    format: Format,
    cleartext: &'a [u8],
    derived: Option<&'a DerivedKeys>,
}

impl<'a> RecordReader<'a> {
    /// `derived` must be supplied for modern-short records (from the paired
    /// encrypt/decrypt call); it is ignored for legacy/modern-long.
    pub fn new(cleartext: &'a [u8], derived: Option<&'a DerivedKeys>) -> Result<Self> {
        let format = Format::from_cleartext_len(cleartext.len())
            .ok_or_else(|| Error::MalformedCleartext(cleartext.len()))?;
        Ok(Self {
            format,
            cleartext,
            derived,
        })
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn receive_tunnel_id(&self) -> u32 {
        u32::from_be_bytes(self.field(self.recv_id_range()))
    }

    pub fn next_tunnel_id(&self) -> u32 {
        u32::from_be_bytes(self.field(self.next_id_range()))
    }

    pub fn next_hop(&self) -> [u8; 32] {
        self.field(self.next_hash_range())
    }

    pub fn next_msg_id(&self) -> u32 {
        u32::from_be_bytes(self.field(self.next_msg_id_range()))
    }

    /// `requestTimeMillis`: the stored quantum count scaled back to milliseconds.
    pub fn request_time_millis(&self) -> u64 {
        let raw = u32::from_be_bytes(self.field(self.req_time_range())) as u64;
        raw * self.format.quantum_ms()
    }

    pub fn expiration_millis(&self) -> u64 {
        match self.format {
            Format::Legacy => 600_000,
            Format::ModernLong => {
                u32::from_be_bytes(self.field(offsets::modern_long::EXPIRATION)) as u64 * 1_000
            }
            Format::ModernShort => {
                u32::from_be_bytes(self.field(offsets::modern_short::EXPIRATION)) as u64 * 1_000
            }
        }
    }

    pub fn is_inbound_gateway(&self) -> bool {
        self.flags().is_inbound_gateway
    }

    pub fn is_outbound_endpoint(&self) -> bool {
        self.flags().is_outbound_endpoint
    }

    fn flags(&self) -> Flags {
        let offset = match self.format {
            Format::Legacy => offsets::legacy::FLAGS,
            Format::ModernLong => offsets::modern_long::FLAGS,
            Format::ModernShort => offsets::modern_short::FLAGS,
        };
        Flags::from_byte(self.cleartext[offset])
    }

    pub fn layer_key(&self) -> Result<[u8; 32]> {
        match self.format {
            Format::Legacy => Ok(self.field(offsets::legacy::LAYER_KEY)),
            Format::ModernLong => Ok(self.field(offsets::modern_long::LAYER_KEY)),
            Format::ModernShort => self.derived_layer().map(|l| l.layer_key),
        }
    }

    pub fn iv_key(&self) -> Result<[u8; 32]> {
        match self.format {
            Format::Legacy => Ok(self.field(offsets::legacy::IV_KEY)),
            Format::ModernLong => Ok(self.field(offsets::modern_long::IV_KEY)),
            Format::ModernShort => self.derived_layer().map(|l| l.iv_key),
        }
    }

    pub fn reply_key(&self) -> Result<[u8; 32]> {
        match self.format {
            Format::Legacy => Ok(self.field(offsets::legacy::REPLY_KEY)),
            Format::ModernLong => Ok(self.field(offsets::modern_long::REPLY_KEY)),
            Format::ModernShort => Err(Error::IllegalState(
                "replyKey is not carried in-band on modern-short records",
            )),
        }
    }

    pub fn reply_iv(&self) -> Result<[u8; 16]> {
        match self.format {
            Format::Legacy => Ok(self.field(offsets::legacy::REPLY_IV)),
            Format::ModernLong => Ok(self.field(offsets::modern_long::REPLY_IV)),
            Format::ModernShort => Err(Error::IllegalState(
                "replyIv is not carried in-band on modern-short records",
            )),
        }
    }

    pub fn options(&self) -> tbr_core::Options {
        match self.format {
            Format::Legacy => tbr_core::Options::new(),
            Format::ModernLong => tbr_core::options::decode(&self.cleartext[offsets::modern_long::OPTIONS_OFFSET..]),
            Format::ModernShort => {
                tbr_core::options::decode(&self.cleartext[offsets::modern_short::OPTIONS_OFFSET..])
            }
        }
    }

    pub fn layer_enc_type(&self) -> u8 {
        match self.format {
            Format::ModernShort => self.cleartext[offsets::modern_short::LAYER_ENC_TYPE],
            _ => 0,
        }
    }

    pub fn garlic_keys(&self) -> Option<GarlicKeys> {
        match self.format {
            Format::ModernShort => self.derived.and_then(|d| d.garlic.clone()),
            _ => None,
        }
    }

    fn derived_layer(&self) -> Result<&LayerKeys> {
        self.derived
            .and_then(|d| d.layer.as_ref())
            .ok_or(Error::IllegalState(
                "layerKey/ivKey were requested on a modern-short record before derivation",
            ))
    }

    fn recv_id_range(&self) -> std::ops::Range<usize> {
        match self.format {
            Format::Legacy => offsets::legacy::RECV_ID,
            Format::ModernLong => offsets::modern_long::RECV_ID,
            Format::ModernShort => offsets::modern_short::RECV_ID,
        }
    }

    fn next_id_range(&self) -> std::ops::Range<usize> {
        match self.format {
            Format::Legacy => offsets::legacy::NEXT_ID,
            Format::ModernLong => offsets::modern_long::NEXT_ID,
            Format::ModernShort => offsets::modern_short::NEXT_ID,
        }
    }

    fn next_hash_range(&self) -> std::ops::Range<usize> {
        match self.format {
            Format::Legacy => offsets::legacy::NEXT_HASH,
            Format::ModernLong => offsets::modern_long::NEXT_HASH,
            Format::ModernShort => offsets::modern_short::NEXT_HASH,
        }
    }

    fn next_msg_id_range(&self) -> std::ops::Range<usize> {
        match self.format {
            Format::Legacy => offsets::legacy::NEXT_MSG_ID,
            Format::ModernLong => offsets::modern_long::NEXT_MSG_ID,
            Format::ModernShort => offsets::modern_short::NEXT_MSG_ID,
        }
    }

    fn req_time_range(&self) -> std::ops::Range<usize> {
        match self.format {
            Format::Legacy => offsets::legacy::REQ_TIME,
            Format::ModernLong => offsets::modern_long::REQ_TIME,
            Format::ModernShort => offsets::modern_short::REQ_TIME,
        }
    }

    fn field<const N: usize>(&self, range: std::ops::Range<usize>) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.cleartext[range]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::RecordBuilder;
    use tbr_core::fields::InlineKeys;
    use tbr_core::ports::{OsRandom, SystemClock};
    use tbr_core::{CommonFields, Flags};

    fn common(flags: Flags) -> CommonFields {
        CommonFields {
            receive_tunnel_id: 10,
            next_tunnel_id: 20,
            next_hop: [0x99; 32],
            next_msg_id: 30,
            flags,
        }
    }

    fn keys() -> InlineKeys {
        InlineKeys {
            layer_key: [1; 32],
            iv_key: [2; 32],
            reply_key: [3; 32],
            reply_iv: [4; 16],
        }
    }

    #[test]
    fn legacy_reader_exposes_inline_fields() {
        let clock = SystemClock;
        let rng = OsRandom;
        let fields = common(Flags::new(true, false).unwrap());
        let cleartext =
            RecordBuilder::legacy(&fields, &[0x55; 32], &keys(), &clock, &rng).unwrap();

        let reader = RecordReader::new(&cleartext, None).unwrap();
        assert_eq!(reader.receive_tunnel_id(), 10);
        assert_eq!(reader.next_tunnel_id(), 20);
        assert_eq!(reader.next_hop(), [0x99; 32]);
        assert_eq!(reader.next_msg_id(), 30);
        assert!(reader.is_inbound_gateway());
        assert!(!reader.is_outbound_endpoint());
        assert_eq!(reader.layer_key().unwrap(), [1; 32]);
        assert_eq!(reader.reply_iv().unwrap(), [4; 16]);
        assert_eq!(reader.expiration_millis(), 600_000);
    }

    #[test]
    fn modern_short_reply_key_fails_without_derivation() {
        let clock = SystemClock;
        let rng = OsRandom;
        let fields = common(Flags::default());
        let options = tbr_core::Options::new();
        let cleartext = RecordBuilder::modern_short(&fields, 0, &options, &clock, &rng).unwrap();

        let reader = RecordReader::new(&cleartext, None).unwrap();
        assert!(reader.reply_key().is_err());
        assert!(reader.layer_key().is_err());
    }

    #[test]
    fn modern_short_layer_key_succeeds_once_derived() {
        use crate::keys::{DerivedKeys, LayerKeys};

        let clock = SystemClock;
        let rng = OsRandom;
        let fields = common(Flags::default());
        let options = tbr_core::Options::new();
        let cleartext = RecordBuilder::modern_short(&fields, 0, &options, &clock, &rng).unwrap();

        let derived = DerivedKeys {
            chacha_reply_key: [7; 32],
            chacha_reply_ad: [8; 32],
            layer: Some(LayerKeys {
                layer_key: [9; 32],
                iv_key: [10; 32],
            }),
            garlic: None,
        };
        let reader = RecordReader::new(&cleartext, Some(&derived)).unwrap();
        assert_eq!(reader.layer_key().unwrap(), [9; 32]);
        assert_eq!(reader.iv_key().unwrap(), [10; 32]);
        assert!(reader.garlic_keys().is_none());
    }
}
