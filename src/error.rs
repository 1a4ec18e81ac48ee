//! Error types for unofd library.

use std::io;
use thiserror::Error;

use crate::ses::DecodeError;

/// Result type alias for unofd operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for unofd library.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not a readable zip archive.
    #[error("Archive error: {0}")]
    Archive(String),

    /// A part the document cannot exist without is absent.
    #[error("Missing required part: {0}")]
    MissingRequiredPart(String),

    /// A part exists but its XML could not be parsed.
    #[error("Malformed part {part}: {message}")]
    MalformedPart { part: String, message: String },

    /// No archive entry matches the requested path.
    #[error("Part not found: {0}")]
    PartNotFound(String),

    /// A part references another part that does not exist.
    #[error("Unresolved reference from {from}: {reference}")]
    UnresolvedReference { from: String, reference: String },

    /// A seal blob could not be decoded.
    #[error("Signature decode error: {0}")]
    SignatureDecode(#[from] DecodeError),

    /// A vector-document seal could not be parsed as a nested package.
    #[error("Seal document of signature {signature}: {message}")]
    SealDocument { signature: String, message: String },

    /// Seal documents nested deeper than the configured limit.
    #[error("Seal documents nested deeper than {0} levels")]
    SealNestingTooDeep(usize),

    /// Invalid or malformed data.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl Error {
    /// Returns true for errors that abort the whole document.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Archive(_) | Error::MissingRequiredPart(_) | Error::Io(_)
        )
    }

    pub(crate) fn malformed(part: &str, message: impl ToString) -> Self {
        Error::MalformedPart {
            part: part.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Archive(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(Error::MissingRequiredPart("OFD.xml".into()).is_fatal());
        assert!(Error::Archive("bad".into()).is_fatal());
        assert!(!Error::PartNotFound("Doc_0/Pages/Page_0/Content.xml".into()).is_fatal());
        assert!(!Error::malformed("a.xml", "oops").is_fatal());
        assert!(!Error::SealDocument {
            signature: "1".into(),
            message: "Missing required part: OFD.xml".into(),
        }
        .is_fatal());
    }

    #[test]
    fn test_display() {
        let err = Error::malformed("Doc_0/Document.xml", "unexpected end");
        assert_eq!(
            err.to_string(),
            "Malformed part Doc_0/Document.xml: unexpected end"
        );
    }
}
