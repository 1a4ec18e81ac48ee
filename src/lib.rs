//! # unofd
//!
//! A Rust library for reading OFD (Open Fixed-layout Document, GB/T 33190)
//! packages into one queryable, verifiable document model.
//!
//! An OFD file is a ZIP archive of cross-referencing XML parts, binary
//! resources and electronic-seal signatures. Parsing resolves the parts into
//! a [`Document`] with pages, resources, templates, outlines, annotations
//! and signatures whose seals have been decoded and verified.
//!
//! ## Quick Start
//!
//! ```no_run
//! use unofd::parse_file;
//!
//! fn main() -> unofd::Result<()> {
//!     let document = parse_file("invoice.ofd")?;
//!
//!     for page in document.pages() {
//!         println!("page {}: {}", page.id, page.text_codes().join(" "));
//!     }
//!     for signature in &document.signatures {
//!         println!("signature {}: {:?}", signature.id, signature.outcome);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `async`: Async I/O support with Tokio

pub mod detect;
pub mod error;
pub mod model;
pub mod ofd;
pub mod parse_options;
pub mod path;
pub mod ses;
pub mod units;
pub mod xml;

#[cfg(feature = "async")]
pub mod async_api;

// Re-exports
pub use detect::{detect_content, ContentKind};
pub use error::{Error, Result};
pub use model::{Document, FontLoader, Page, SignatureRecord};
pub use ofd::{OfdContainer, OfdParser};
pub use parse_options::{ErrorMode, ParseOptions};
pub use path::{DrawingOperation, PathDialect};
pub use ses::VerificationOutcome;
pub use units::UnitConverter;
pub use xml::Node;

use std::io::{Read, Seek};
use std::path::Path;

/// Parses a document from a file path.
///
/// # Example
///
/// ```no_run
/// use unofd::parse_file;
///
/// let document = parse_file("example.ofd")?;
/// println!("Pages: {}", document.page_count());
/// # Ok::<(), unofd::Error>(())
/// ```
pub fn parse_file(path: impl AsRef<Path>) -> Result<Document> {
    OfdParser::open(path)?.parse()
}

/// Parses a document from a reader.
pub fn parse_reader<R: Read + Seek>(reader: R) -> Result<Document> {
    OfdParser::from_reader(reader)?.parse()
}

/// Parses a document from bytes.
pub fn parse_bytes(data: &[u8]) -> Result<Document> {
    parse_bytes_with_options(data, ParseOptions::default())
}

/// Parses a document from bytes with explicit options.
pub fn parse_bytes_with_options(data: &[u8], options: ParseOptions) -> Result<Document> {
    if !detect::is_zip(data) {
        return Err(Error::Archive(format!(
            "not a zip archive (detected {})",
            detect_content(data)
        )));
    }
    OfdParser::from_bytes(data.to_vec())?
        .with_options(options)
        .parse()
}
