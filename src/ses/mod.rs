//! Electronic seal (SES) signatures.
//!
//! A `SignedValue.dat` holds one DER-encoded `SES_Signature` in one of two
//! layouts: the original one ([`SesVersion::V1`]) and the GB/T 38540 one
//! ([`SesVersion::V4`]). Decoding yields a typed [`SesSignature`];
//! [`verify`] checks its signature over the to-be-signed structure.

pub mod asn1;
mod certificate;
mod decode;
#[cfg(test)]
pub(crate) mod fixtures;
mod seal;
mod verify;

pub use certificate::{Certificate, DistinguishedName, PublicKeyInfo};
pub use decode::{decode_der, decode_signed_value, decode_v1, decode_v4, to_der};
pub use seal::{
    CertDigest, PictureKind, Seal, SealHeader, SealMaker, SealPicture, SealProperty, SesSignature,
    SesVersion, SignTime,
};
pub use verify::{verify, VerificationOutcome, SM2_SIGNATURE_OID, SM2_USER_ID};

use thiserror::Error;

/// Result type for seal decoding.
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;

/// Errors from decoding seal blobs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("empty signed value")]
    Empty,

    #[error("signed value is neither DER, hex nor base64: {0}")]
    Encoding(String),

    #[error("truncated element at offset {offset}")]
    Truncated { offset: usize },

    #[error("invalid length at offset {offset}")]
    InvalidLength { offset: usize },

    #[error("elements nested deeper than {0} levels")]
    TooDeep(usize),

    #[error("missing field {0}")]
    MissingField(&'static str),

    #[error("field {field}: expected {expected}, found tag 0x{found:02X}")]
    UnexpectedTag {
        field: &'static str,
        expected: &'static str,
        found: u8,
    },

    #[error("field {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },

    #[error("unrecognized seal layout (v1: {v1}; v4: {v4})")]
    UnrecognizedLayout {
        v1: Box<DecodeError>,
        v4: Box<DecodeError>,
    },
}
