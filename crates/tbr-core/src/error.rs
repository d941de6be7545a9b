//! Error taxonomy for the tunnel build request record codec.

use thiserror::Error;

/// Result type alias using our [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Codec error taxonomy.
///
/// `DecryptFailed` intentionally carries no detail: callers must not be
/// able to distinguish a bad MAC from a bad ephemeral key from a corrupt
/// legacy ciphertext (oracle resistance). The distinguishing reason is
/// only ever emitted as a `trace!`-level log, never through this type.
#[derive(Debug, Error)]
pub enum Error {
    /// Recipient or local key is neither ElGamal-2048 nor X25519.
    #[error("unsupported key type")]
    UnsupportedKeyType,

    /// Any rejection reason on the decrypt path: bad MSB, self-key, all-zero
    /// key, AEAD tag mismatch, or legacy ElGamal failure. Reasons are never
    /// distinguished outside this crate.
    #[error("decrypt failed")]
    DecryptFailed,

    /// Serialized options exceed the format's budget.
    #[error("options serialize to {actual} bytes, exceeding the {max} byte budget")]
    OversizedOptions { actual: usize, max: usize },

    /// Builder argument missing or the wrong length (e.g. a null/short key).
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Accessor called on a format/role that does not carry that field.
    #[error("illegal state: {0}")]
    IllegalState(&'static str),

    /// Cleartext length matches none of the three known formats.
    #[error("malformed cleartext: length {0} matches no known format")]
    MalformedCleartext(usize),
}
