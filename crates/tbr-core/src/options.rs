//! Bounded length-prefixed string-to-string mapping embedded in modern records.
//!
//! Wire form: a 16-bit total length covering everything that follows, then
//! repeated `[1-byte klen || key || '=' || 1-byte vlen || value || ';']`.
//! Decoding tolerates trailing random padding: it reads exactly the declared
//! length and never looks past it.

use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// A short-string-to-short-string mapping, ordered for deterministic encoding.
pub type Options = BTreeMap<String, String>;

const LENGTH_PREFIX_BYTES: usize = 2;
const EQUALS: u8 = b'=';
const SEMICOLON: u8 = b';';

/// Encode `options` as the wire form, rejecting anything over `max_bytes`
/// (the format's options budget, including the 2-byte length prefix).
pub fn encode(options: &Options, max_bytes: usize) -> Result<Vec<u8>> {
    let mut entries = Vec::new();
    for (key, value) in options {
        encode_entry(key, value, &mut entries)?;
    }

    let total_len = entries.len();
    if total_len > u16::MAX as usize {
        return Err(Error::OversizedOptions {
            actual: LENGTH_PREFIX_BYTES + total_len,
            max: max_bytes,
        });
    }

    let mut out = Vec::with_capacity(LENGTH_PREFIX_BYTES + total_len);
    out.extend_from_slice(&(total_len as u16).to_be_bytes());
    out.extend_from_slice(&entries);

    if out.len() > max_bytes {
        return Err(Error::OversizedOptions {
            actual: out.len(),
            max: max_bytes,
        });
    }

    Ok(out)
}

fn encode_entry(key: &str, value: &str, out: &mut Vec<u8>) -> Result<()> {
    let kbytes = key.as_bytes();
    let vbytes = value.as_bytes();
    if kbytes.len() > u8::MAX as usize || vbytes.len() > u8::MAX as usize {
        return Err(Error::InvalidArgument(
            "option key/value must each be at most 255 bytes",
        ));
    }
    out.push(kbytes.len() as u8);
    out.extend_from_slice(kbytes);
    out.push(EQUALS);
    out.push(vbytes.len() as u8);
    out.extend_from_slice(vbytes);
    out.push(SEMICOLON);
    Ok(())
}

/// Decode options from the start of `region`. Non-fatal on any malformed
/// input: corrupted padding is indistinguishable from "no options", so a
/// parse failure returns an empty map rather than an error.
pub fn decode(region: &[u8]) -> Options {
    try_decode(region).unwrap_or_default()
}

fn try_decode(region: &[u8]) -> Option<Options> {
    if region.len() < LENGTH_PREFIX_BYTES {
        return None;
    }
    let declared_len = u16::from_be_bytes([region[0], region[1]]) as usize;
    let end = LENGTH_PREFIX_BYTES.checked_add(declared_len)?;
    let entries = region.get(LENGTH_PREFIX_BYTES..end)?;

    let mut options = Options::new();
    let mut pos = 0usize;
    while pos < entries.len() {
        let klen = *entries.get(pos)? as usize;
        pos += 1;
        let key = entries.get(pos..pos + klen)?;
        pos += klen;
        if *entries.get(pos)? != EQUALS {
            return None;
        }
        pos += 1;
        let vlen = *entries.get(pos)? as usize;
        pos += 1;
        let value = entries.get(pos..pos + vlen)?;
        pos += vlen;
        if *entries.get(pos)? != SEMICOLON {
            return None;
        }
        pos += 1;

        let key = String::from_utf8(key.to_vec()).ok()?;
        let value = String::from_utf8(value.to_vec()).ok()?;
        options.insert(key, value);
    }
    Some(options)
}
