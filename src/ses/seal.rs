//! Typed seal signature model.

use super::certificate::Certificate;
use crate::detect::{detect_content, ContentKind};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Layout of an `SES_Signature`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SesVersion {
    /// Original layout: the signer certificate and algorithm live inside the
    /// to-be-signed structure.
    V1,
    /// GB/T 38540 layout: certificate, algorithm and signature follow the
    /// to-be-signed structure.
    V4,
}

/// A decoded seal signature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SesSignature {
    pub version: SesVersion,
    /// Version number declared inside the to-be-signed structure.
    pub declared_version: i64,
    /// DER of the to-be-signed structure; the signed message.
    #[serde(skip)]
    pub to_sign: Bytes,
    pub seal: Seal,
    pub time_info: SignTime,
    /// Digest of the signed document content.
    #[serde(skip)]
    pub data_hash: Bytes,
    /// Path of the signature description the seal was applied through.
    pub property_info: String,
    /// Signer certificate.
    pub certificate: Certificate,
    /// Signature algorithm OID.
    pub signature_algorithm: String,
    #[serde(skip)]
    pub signature: Bytes,
    /// Raw DER of the timestamp token, when present.
    #[serde(skip)]
    pub timestamp: Option<Bytes>,
    /// Raw DER of signature extension data, when present.
    #[serde(skip)]
    pub ext_datas: Option<Bytes>,
}

impl SesSignature {
    /// Common name of the signer certificate.
    pub fn signer_name(&self) -> Option<&str> {
        self.certificate.subject.common_name()
    }
}

/// The seal (`SESeal`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Seal {
    pub header: SealHeader,
    /// Seal identifier (`esID`).
    pub es_id: String,
    pub property: SealProperty,
    pub picture: SealPicture,
    #[serde(skip)]
    pub ext_datas: Option<Bytes>,
    /// Maker certificate and signature over the seal info.
    pub maker: SealMaker,
}

/// `SES_Header`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SealHeader {
    /// Usually `ES`.
    pub id: String,
    pub version: i64,
    /// Vendor identifier.
    pub vendor_id: String,
}

/// `SES_ESPropertyInfo`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SealProperty {
    pub seal_type: i64,
    pub name: String,
    /// Certificate list type (V4 only).
    pub cert_list_type: Option<i64>,
    /// DER certificates of the seal owners.
    #[serde(skip)]
    pub cert_list: Vec<Bytes>,
    /// Owner certificate digests, used instead of certificates when
    /// `cert_list_type` is 2.
    pub cert_digests: Vec<CertDigest>,
    pub create_date: Option<DateTime<Utc>>,
    pub valid_start: Option<DateTime<Utc>>,
    pub valid_end: Option<DateTime<Utc>>,
}

/// `CertDigestObj`: a hash of a seal owner certificate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertDigest {
    pub digest_type: String,
    #[serde(skip)]
    pub value: Bytes,
}

impl SealProperty {
    /// Decodes the certificate list, skipping entries that fail to decode.
    pub fn certificates(&self) -> Vec<Certificate> {
        self.cert_list
            .iter()
            .filter_map(|der| match Certificate::from_der(der) {
                Ok(cert) => Some(cert),
                Err(e) => {
                    log::debug!("skipping seal owner certificate: {e}");
                    None
                }
            })
            .collect()
    }

    /// True if `at` lies inside the seal's validity window.
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.valid_start.map_or(true, |t| at >= t) && self.valid_end.map_or(true, |t| at <= t)
    }
}

/// What a seal picture contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PictureKind {
    /// A nested OFD package.
    Document,
    /// A raster image.
    Image(ContentKind),
}

/// `SES_ESPictrueInfo`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SealPicture {
    pub kind: PictureKind,
    /// Type tag as written (`ofd`, `png`, `jpg`, ...).
    pub format: String,
    #[serde(skip)]
    pub data: Bytes,
    /// Display width in millimetres.
    pub width: i64,
    /// Display height in millimetres.
    pub height: i64,
}

impl SealPicture {
    pub(crate) fn new(format: String, data: Bytes, width: i64, height: i64) -> Self {
        let kind = picture_kind(&format, &data);
        Self {
            kind,
            format,
            data,
            width,
            height,
        }
    }

    pub fn is_document(&self) -> bool {
        self.kind == PictureKind::Document
    }
}

fn picture_kind(format: &str, data: &[u8]) -> PictureKind {
    let kind = match ContentKind::from_format_tag(format) {
        ContentKind::Unknown => detect_content(data),
        kind => kind,
    };
    match kind {
        ContentKind::Zip => PictureKind::Document,
        other => PictureKind::Image(other),
    }
}

/// Certificate, algorithm and signature of the seal maker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SealMaker {
    #[serde(skip)]
    pub certificate: Bytes,
    pub algorithm: String,
    #[serde(skip)]
    pub signed_value: Bytes,
}

/// Signing time as written, with its parsed value when it is a time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignTime {
    pub raw: String,
    pub time: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_picture_kind_from_tag_and_bytes() {
        let png = SealPicture::new("png".into(), Bytes::from_static(b"xx"), 40, 40);
        assert_eq!(png.kind, PictureKind::Image(ContentKind::Png));

        let ofd = SealPicture::new("OFD".into(), Bytes::new(), 40, 40);
        assert!(ofd.is_document());

        let sniffed = SealPicture::new(
            "".into(),
            Bytes::from_static(&[0x50, 0x4B, 0x03, 0x04, 0, 0]),
            40,
            40,
        );
        assert!(sniffed.is_document());
    }

    #[test]
    fn test_property_validity() {
        let property = SealProperty {
            seal_type: 1,
            name: "Seal".into(),
            cert_list_type: None,
            cert_list: vec![Bytes::from_static(b"junk")],
            cert_digests: Vec::new(),
            create_date: None,
            valid_start: Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()),
            valid_end: Some(Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap()),
        };
        assert!(property.is_valid_at(Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap()));
        assert!(!property.is_valid_at(Utc.with_ymd_and_hms(2022, 6, 1, 0, 0, 0).unwrap()));
        assert!(property.certificates().is_empty());
    }
}
