//! X.509 certificates embedded in seals.
//!
//! Only the fields needed to identify the signer and verify a signature are
//! read; extensions and the issuer's signature are ignored.

use super::asn1::{tag, Element};
use super::DecodeResult;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Common name attribute type.
pub const COMMON_NAME_OID: &str = "2.5.4.3";

/// A decoded certificate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Certificate {
    /// The complete DER encoding.
    #[serde(skip)]
    pub der: Bytes,
    /// Serial number as uppercase hex.
    pub serial: String,
    pub issuer: DistinguishedName,
    pub subject: DistinguishedName,
    pub not_before: Option<DateTime<Utc>>,
    pub not_after: Option<DateTime<Utc>>,
    pub public_key: PublicKeyInfo,
}

/// Subject public key of a certificate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicKeyInfo {
    /// Key algorithm OID (`1.2.840.10045.2.1` for EC/SM2 keys,
    /// `1.2.840.113549.1.1.1` for RSA).
    pub algorithm: String,
    /// Named curve OID for EC keys.
    pub parameters: Option<String>,
    /// Key bytes: a SEC1 point or a PKCS#1 `RSAPublicKey`.
    #[serde(skip)]
    pub key: Bytes,
}

/// Relative distinguished names in order, as `(type OID, value)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DistinguishedName {
    pub attributes: Vec<(String, String)>,
}

impl DistinguishedName {
    fn from_element(name: &Element<'_>) -> DecodeResult<Self> {
        let mut attributes = Vec::new();
        for rdn in name.sequence("name")?.children() {
            for pair in rdn.children() {
                let kind = pair.field(0, "attribute type")?.oid("attribute type")?;
                let value = pair.field(1, "attribute value")?.string("attribute value")?;
                attributes.push((kind, value));
            }
        }
        Ok(Self { attributes })
    }

    /// The first value of attribute type `oid`.
    pub fn get(&self, oid: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == oid)
            .map(|(_, v)| v.as_str())
    }

    pub fn common_name(&self) -> Option<&str> {
        self.get(COMMON_NAME_OID)
    }
}

impl Certificate {
    /// Decodes a DER certificate.
    pub fn from_der(der: &[u8]) -> DecodeResult<Self> {
        let root = Element::parse(der)?;
        Self::from_element(&root)
    }

    pub(crate) fn from_element(root: &Element<'_>) -> DecodeResult<Self> {
        let tbs = root.sequence("certificate")?.field(0, "tbsCertificate")?;
        tbs.sequence("tbsCertificate")?;

        // Version is an optional explicit [0]
        let skip = usize::from(tbs.get(0).is_some_and(|e| e.is_context(0)));
        let field = |i: usize, name: &'static str| tbs.field(skip + i, name);

        let serial = hex_upper(field(0, "serialNumber")?.content());
        let issuer = DistinguishedName::from_element(field(2, "issuer")?)?;

        let validity = field(3, "validity")?;
        let not_before = validity.get(0).and_then(|t| t.time("notBefore").ok());
        let not_after = validity.get(1).and_then(|t| t.time("notAfter").ok());

        let subject = DistinguishedName::from_element(field(4, "subject")?)?;

        let spki = field(5, "subjectPublicKeyInfo")?.sequence("subjectPublicKeyInfo")?;
        let algorithm = spki.field(0, "algorithm")?.sequence("algorithm")?;
        let public_key = PublicKeyInfo {
            algorithm: algorithm.field(0, "algorithm")?.oid("algorithm")?,
            parameters: algorithm
                .get(1)
                .filter(|p| p.tag == tag::OID)
                .and_then(|p| p.oid("parameters").ok()),
            key: Bytes::copy_from_slice(spki.field(1, "subjectPublicKey")?.bits("subjectPublicKey")?),
        };

        Ok(Self {
            der: Bytes::copy_from_slice(root.raw()),
            serial,
            issuer,
            subject,
            not_before,
            not_after,
            public_key,
        })
    }

    /// True if `at` lies inside the validity window.
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.not_before.map_or(true, |t| at >= t) && self.not_after.map_or(true, |t| at <= t)
    }
}

fn hex_upper(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}
