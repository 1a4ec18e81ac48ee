//! Content detection for archive entries and seal pictures.

use serde::Serialize;

/// Magic bytes for ZIP archive (OFD package)
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];
const GIF_MAGIC: &[u8] = b"GIF8";
const BMP_MAGIC: &[u8] = b"BM";
const TIFF_LE_MAGIC: [u8; 4] = [0x49, 0x49, 0x2A, 0x00];
const TIFF_BE_MAGIC: [u8; 4] = [0x4D, 0x4D, 0x00, 0x2A];

/// Kinds of binary content found inside OFD packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContentKind {
    /// A nested zip package (seal documents are OFD packages)
    Zip,
    Png,
    Jpeg,
    Gif,
    Bmp,
    Tiff,
    Unknown,
}

impl ContentKind {
    /// Returns the MIME type for this kind.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ContentKind::Zip => "application/ofd",
            ContentKind::Png => "image/png",
            ContentKind::Jpeg => "image/jpeg",
            ContentKind::Gif => "image/gif",
            ContentKind::Bmp => "image/bmp",
            ContentKind::Tiff => "image/tiff",
            ContentKind::Unknown => "application/octet-stream",
        }
    }

    /// Maps a format tag such as `png` or `JPG` to a kind.
    pub fn from_format_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "ofd" | "zip" => ContentKind::Zip,
            "png" => ContentKind::Png,
            "jpg" | "jpeg" => ContentKind::Jpeg,
            "gif" => ContentKind::Gif,
            "bmp" => ContentKind::Bmp,
            "tif" | "tiff" => ContentKind::Tiff,
            _ => ContentKind::Unknown,
        }
    }

    pub fn is_image(&self) -> bool {
        !matches!(self, ContentKind::Zip | ContentKind::Unknown)
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentKind::Zip => write!(f, "OFD"),
            ContentKind::Png => write!(f, "PNG"),
            ContentKind::Jpeg => write!(f, "JPEG"),
            ContentKind::Gif => write!(f, "GIF"),
            ContentKind::Bmp => write!(f, "BMP"),
            ContentKind::Tiff => write!(f, "TIFF"),
            ContentKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Detect content kind from leading bytes.
pub fn detect_content(data: &[u8]) -> ContentKind {
    if data.starts_with(&ZIP_MAGIC) {
        return ContentKind::Zip;
    }
    if data.starts_with(&PNG_MAGIC) {
        return ContentKind::Png;
    }
    if data.starts_with(&JPEG_MAGIC) {
        return ContentKind::Jpeg;
    }
    if data.starts_with(GIF_MAGIC) {
        return ContentKind::Gif;
    }
    if data.starts_with(&TIFF_LE_MAGIC) || data.starts_with(&TIFF_BE_MAGIC) {
        return ContentKind::Tiff;
    }
    // BMP last: two ASCII bytes are a weak signal
    if data.len() >= 14 && data.starts_with(BMP_MAGIC) {
        return ContentKind::Bmp;
    }
    ContentKind::Unknown
}

/// Returns true if the bytes look like a zip archive.
pub fn is_zip(data: &[u8]) -> bool {
    data.starts_with(&ZIP_MAGIC)
}
