//! Builder, encryptor, decryptor, and reader for the tunnel build request
//! record codec: the three coexisting cleartext/wire formats that carry a
//! single hop's forwarding instructions through an onion-routing tunnel
//! build.
//!
//! # Modules
//!
//! - [`builder`]: assembles a format's cleartext block.
//! - [`encryptor`] / [`decryptor`]: frame cleartext to/from a hop's wire record.
//! - [`reader`]: typed accessors over a decoded cleartext buffer.
//! - [`elgamal`]: legacy 2048-bit discrete-log engine.
//! - [`noise`]: single-message Noise `N` handshake.
//! - [`hkdf`] / [`schedule`]: the two HKDF shapes and the shared post-handshake key schedule.
//! - [`keys`] / [`keytype`]: owned derived-key state and the recipient/local key enums.

pub mod builder;
pub mod decryptor;
pub mod elgamal;
pub mod encryptor;
pub mod hkdf;
pub mod keys;
pub mod keytype;
pub mod noise;
pub mod reader;
pub mod schedule;

pub use builder::RecordBuilder;
pub use decryptor::{DecryptedRecord, RecordDecryptor};
pub use encryptor::{EncryptedRecord, RecordEncryptor};
pub use keys::{DerivedKeys, GarlicKeys, LayerKeys};
pub use keytype::{OurKey, RecipientKey};
pub use reader::RecordReader;
