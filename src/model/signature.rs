//! Signatures applied to a document.

use super::Document;
use crate::ses::{self, SesSignature, VerificationOutcome};
use crate::units::Rect;
use crate::xml::tags::{attr, tag};
use crate::xml::{find_all_by_tag, find_text, Node};
use bytes::Bytes;
use serde::Serialize;

/// A stamp placement (`ofd:StampAnnot`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StampAnnotation {
    pub id: Option<String>,
    /// ID of the page the stamp is drawn on.
    pub page_ref: String,
    pub boundary: Option<Rect>,
    pub clip: Option<Rect>,
}

impl StampAnnotation {
    pub(crate) fn collect(signature: &Node) -> Vec<Self> {
        find_all_by_tag(Some(signature), tag::STAMP_ANNOT)
            .into_iter()
            .filter_map(|stamp| {
                Some(Self {
                    id: stamp.id().map(str::to_string),
                    page_ref: stamp.attribute(attr::PAGE_REF)?.trim().to_string(),
                    boundary: stamp.attribute(attr::BOUNDARY).and_then(Rect::parse),
                    clip: stamp.attribute("Clip").and_then(Rect::parse),
                })
            })
            .collect()
    }
}

/// One signature: its description part, seal and verification result.
#[derive(Debug, Clone, Serialize)]
pub struct SignatureRecord {
    /// `ID` from the signature list.
    pub id: String,
    /// `Type` from the signature list (`Seal` or `Sign`).
    pub kind: Option<String>,
    /// Package path of `Signature.xml`.
    pub part: String,
    /// Parsed `Signature.xml`.
    pub node: Option<Node>,
    /// Package path of the signed value.
    pub signed_value_part: Option<String>,
    #[serde(skip)]
    pub signed_value: Bytes,
    pub stamps: Vec<StampAnnotation>,
    /// Decoded seal; absent when the signed value is missing or undecodable.
    pub seal: Option<SesSignature>,
    /// Why the seal is absent.
    pub decode_error: Option<String>,
    pub outcome: VerificationOutcome,
    pub verified: bool,
    /// The seal picture parsed as a document, for vector seals.
    pub seal_document: Option<Box<Document>>,
}

impl SignatureRecord {
    pub(crate) fn new(id: String, kind: Option<String>, part: String) -> Self {
        Self {
            id,
            kind,
            part,
            node: None,
            signed_value_part: None,
            signed_value: Bytes::new(),
            stamps: Vec::new(),
            seal: None,
            decode_error: None,
            outcome: VerificationOutcome::Malformed,
            verified: false,
            seal_document: None,
        }
    }

    /// Stores a decoded seal and its verification result.
    pub(crate) fn set_seal(&mut self, seal: SesSignature) {
        self.outcome = ses::verify(&seal);
        self.verified = self.outcome.is_valid();
        self.seal = Some(seal);
    }

    /// Re-runs verification of the decoded seal.
    pub fn verify(&self) -> VerificationOutcome {
        self.seal
            .as_ref()
            .map_or(VerificationOutcome::Malformed, ses::verify)
    }

    /// True if a stamp of this signature sits on page `page_id`.
    pub fn is_on_page(&self, page_id: &str) -> bool {
        self.stamps.iter().any(|s| s.page_ref == page_id)
    }

    /// `ofd:Provider` name.
    pub fn provider(&self) -> Option<&str> {
        find_all_by_tag(self.node.as_ref(), tag::PROVIDER)
            .into_iter()
            .next()
            .and_then(|p| p.attribute("ProviderName"))
    }

    pub fn signature_method(&self) -> Option<&str> {
        find_text(self.node.as_ref(), tag::SIGNATURE_METHOD)
    }

    pub fn signature_date_time(&self) -> Option<&str> {
        find_text(self.node.as_ref(), tag::SIGNATURE_DATE_TIME)
    }

    /// Package paths listed in `ofd:References` with their digests.
    pub fn references(&self) -> Vec<(&str, Option<&str>)> {
        find_all_by_tag(self.node.as_ref(), "ofd:Reference")
            .into_iter()
            .filter_map(|r| Some((r.attribute("FileRef")?, r.child_text("ofd:CheckValue"))))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_xml;

    const SIGNATURE: &str = r#"<ofd:Signature xmlns:ofd="http://www.ofdspec.org/2016">
        <ofd:SignedInfo>
            <ofd:Provider ProviderName="Vendor" Version="1.0"/>
            <ofd:SignatureMethod>1.2.156.10197.1.501</ofd:SignatureMethod>
            <ofd:SignatureDateTime>20240601120000Z</ofd:SignatureDateTime>
            <ofd:References CheckMethod="1.2.156.10197.1.401">
                <ofd:Reference FileRef="/Doc_0/Document.xml"><ofd:CheckValue>AAAA</ofd:CheckValue></ofd:Reference>
                <ofd:Reference FileRef="/Doc_0/Pages/Page_0/Content.xml"><ofd:CheckValue>BBBB</ofd:CheckValue></ofd:Reference>
            </ofd:References>
            <ofd:StampAnnot ID="1" PageRef="1" Boundary="10 10 40 40"/>
            <ofd:StampAnnot ID="2" PageRef=" 5 " Boundary="bad"/>
            <ofd:StampAnnot ID="3"/>
        </ofd:SignedInfo>
        <ofd:SignedValue>/Doc_0/Signs/Sign_0/SignedValue.dat</ofd:SignedValue>
    </ofd:Signature>"#;

    fn record() -> SignatureRecord {
        let mut record = SignatureRecord::new(
            "1".into(),
            Some("Seal".into()),
            "Doc_0/Signs/Sign_0/Signature.xml".into(),
        );
        let node = parse_xml(SIGNATURE, &record.part).unwrap();
        record.stamps = StampAnnotation::collect(&node);
        record.node = Some(node);
        record
    }

    #[test]
    fn test_stamps() {
        let record = record();
        assert_eq!(record.stamps.len(), 2);
        assert_eq!(record.stamps[0].boundary.unwrap().width, 40.0);
        assert!(record.stamps[1].boundary.is_none());
        assert!(record.is_on_page("1"));
        assert!(record.is_on_page("5"));
        assert!(!record.is_on_page("2"));
    }

    #[test]
    fn test_signed_info() {
        let record = record();
        assert_eq!(record.provider(), Some("Vendor"));
        assert_eq!(record.signature_method(), Some("1.2.156.10197.1.501"));
        assert_eq!(record.signature_date_time(), Some("20240601120000Z"));
        let references = record.references();
        assert_eq!(references.len(), 2);
        assert_eq!(references[1], ("/Doc_0/Pages/Page_0/Content.xml", Some("BBBB")));
    }

    #[test]
    fn test_without_seal() {
        let record = record();
        assert_eq!(record.outcome, VerificationOutcome::Malformed);
        assert_eq!(record.verify(), VerificationOutcome::Malformed);
        assert!(!record.verified);
    }
}
