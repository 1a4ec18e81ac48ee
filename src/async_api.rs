//! Async API for non-blocking document processing.
//!
//! Enable the `async` feature to use these APIs:
//!
//! ```toml
//! [dependencies]
//! unofd = { version = "0.1", features = ["async"] }
//! ```

use crate::error::{Error, Result};
use crate::model::Document;
use crate::ParseOptions;
use std::path::Path;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Asynchronously parses a document from a file path.
///
/// # Example
///
/// ```no_run
/// # async fn example() -> unofd::Result<()> {
/// let document = unofd::async_api::parse_file("invoice.ofd").await?;
/// println!("Pages: {}", document.page_count());
/// # Ok(())
/// # }
/// ```
pub async fn parse_file(path: impl AsRef<Path>) -> Result<Document> {
    let data = fs::read(path).await?;
    parse_owned(data, ParseOptions::default()).await
}

/// Asynchronously parses a document from bytes.
pub async fn parse_bytes(data: &[u8]) -> Result<Document> {
    parse_owned(data.to_vec(), ParseOptions::default()).await
}

/// Asynchronously parses a document from bytes with explicit options.
pub async fn parse_bytes_with_options(data: &[u8], options: ParseOptions) -> Result<Document> {
    parse_owned(data.to_vec(), options).await
}

/// Asynchronously parses a document from an async reader.
pub async fn parse_reader<R: AsyncRead + Unpin>(mut reader: R) -> Result<Document> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data).await?;
    parse_owned(data, ParseOptions::default()).await
}

async fn parse_owned(data: Vec<u8>, options: ParseOptions) -> Result<Document> {
    // Parsing and seal verification are CPU-bound
    tokio::task::spawn_blocking(move || crate::parse_bytes_with_options(&data, options))
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_parse_bytes_rejects_non_zip() {
        let err = parse_bytes(b"not an archive").await.unwrap_err();
        assert!(matches!(err, Error::Archive(_)));
    }

    #[tokio::test]
    async fn test_parse_missing_file() {
        let err = parse_file("/nonexistent/path/doc.ofd").await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
