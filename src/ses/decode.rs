//! `SES_Signature` layouts.
//!
//! V1:
//! ```text
//! SES_Signature ::= SEQUENCE {
//!     toSign   TBS_Sign { version, eseal SESeal { esealInfo, signInfo
//!                { cert, signatureAlgorithm, signData } },
//!                timeInfo BIT STRING, dataHash, propertyInfo, cert,
//!                signatureAlgorithm },
//!     signature BIT STRING }
//! ```
//! V4:
//! ```text
//! SES_Signature ::= SEQUENCE {
//!     toSign   TBS_Sign { version, eseal SESeal { esealInfo, cert,
//!                signAlgID, signedValue }, timeInfo GeneralizedTime,
//!                dataHash, propertyInfo, extDatas OPTIONAL },
//!     cert OCTET STRING, signatureAlgID, signature BIT STRING,
//!     timeStamp [0] OPTIONAL }
//! ```

use super::asn1::{parse_time, tag, Element};
use super::certificate::Certificate;
use super::seal::{
    CertDigest, Seal, SealHeader, SealMaker, SealPicture, SealProperty, SesSignature, SesVersion,
    SignTime,
};
use super::{DecodeError, DecodeResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

static HEX_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[0-9A-Fa-f][0-9A-Fa-f]\s*)+$").expect("valid regex"));

/// Decodes the content of a `SignedValue` part.
pub fn decode_signed_value(data: &[u8]) -> DecodeResult<SesSignature> {
    let der = to_der(data)?;
    decode_der(&der)
}

/// Normalizes a signed value to DER bytes.
///
/// Binary DER (leading SEQUENCE octet) is used as-is. Text is read as hex
/// when it consists of hex digit pairs, otherwise as base64.
pub fn to_der(data: &[u8]) -> DecodeResult<Cow<'_, [u8]>> {
    match data.first() {
        None => return Err(DecodeError::Empty),
        Some(&tag::SEQUENCE) => return Ok(Cow::Borrowed(data)),
        Some(_) => {}
    }

    let text = std::str::from_utf8(data)
        .map_err(|_| DecodeError::Encoding("binary data without a SEQUENCE".into()))?;
    if text.trim().is_empty() {
        return Err(DecodeError::Empty);
    }

    if HEX_TEXT.is_match(text) {
        let digits: Vec<u8> = text.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
        let der = digits
            .chunks_exact(2)
            .map(|pair| (hex_value(pair[0]) << 4) | hex_value(pair[1]))
            .collect();
        return Ok(Cow::Owned(der));
    }

    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map(Cow::Owned)
        .map_err(|e| DecodeError::Encoding(e.to_string()))
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        b'A'..=b'F' => digit - b'A' + 10,
        _ => 0,
    }
}

/// Decodes DER bytes, trying the V1 layout and then the V4 layout.
pub fn decode_der(der: &[u8]) -> DecodeResult<SesSignature> {
    let root = Element::parse(der)?;
    match decode_v1(&root) {
        Ok(signature) => Ok(signature),
        Err(v1) => decode_v4(&root).map_err(|v4| DecodeError::UnrecognizedLayout {
            v1: Box::new(v1),
            v4: Box::new(v4),
        }),
    }
}

/// Decodes the V1 layout.
pub fn decode_v1(root: &Element<'_>) -> DecodeResult<SesSignature> {
    let root = root.sequence("SES_Signature")?;
    let to_sign = root.field(0, "toSign")?.sequence("toSign")?;
    let signature = root.field(1, "signature")?.bits("signature")?;

    let declared_version = to_sign.field(0, "version")?.integer("version")?;
    let eseal = to_sign.field(1, "eseal")?.sequence("eseal")?;
    let info = eseal.field(0, "esealInfo")?;
    let sign_info = eseal.field(1, "signInfo")?.sequence("signInfo")?;

    let maker = SealMaker {
        certificate: bytes(sign_info.field(0, "signInfo.cert")?.octets("signInfo.cert")?),
        algorithm: sign_info
            .field(1, "signInfo.signatureAlgorithm")?
            .oid("signInfo.signatureAlgorithm")?,
        signed_value: bytes(sign_info.field(2, "signInfo.signData")?.bits("signInfo.signData")?),
    };
    let seal = decode_seal(info, SesVersion::V1, maker)?;

    let time_bytes = to_sign.field(2, "timeInfo")?.bits("timeInfo")?;
    let raw_time = String::from_utf8_lossy(time_bytes).trim().to_string();
    let time_info = SignTime {
        time: parse_time(&raw_time, false),
        raw: raw_time,
    };

    let data_hash = to_sign.field(3, "dataHash")?.bits("dataHash")?;
    let property_info = to_sign.field(4, "propertyInfo")?.string("propertyInfo")?;
    let certificate = to_sign
        .field(5, "cert")?
        .encapsulated("cert")
        .and_then(|cert| Certificate::from_element(&cert))?;
    let signature_algorithm = to_sign
        .field(6, "signatureAlgorithm")?
        .oid("signatureAlgorithm")?;

    Ok(SesSignature {
        version: SesVersion::V1,
        declared_version,
        to_sign: bytes(to_sign.raw()),
        seal,
        time_info,
        data_hash: bytes(data_hash),
        property_info,
        certificate,
        signature_algorithm,
        signature: bytes(signature),
        timestamp: None,
        ext_datas: None,
    })
}

/// Decodes the V4 layout.
pub fn decode_v4(root: &Element<'_>) -> DecodeResult<SesSignature> {
    let root = root.sequence("SES_Signature")?;
    let to_sign = root.field(0, "toSign")?.sequence("toSign")?;
    let certificate = root
        .field(1, "cert")?
        .encapsulated("cert")
        .and_then(|cert| Certificate::from_element(&cert))?;
    let signature_algorithm = root.field(2, "signatureAlgID")?.oid("signatureAlgID")?;
    let signature = root.field(3, "signature")?.bits("signature")?;
    let timestamp = root.get(4).map(|t| bytes(t.raw()));

    let declared_version = to_sign.field(0, "version")?.integer("version")?;
    let eseal = to_sign.field(1, "eseal")?.sequence("eseal")?;
    let info = eseal.field(0, "esealInfo")?;
    let maker = SealMaker {
        certificate: bytes(eseal.field(1, "eseal.cert")?.octets("eseal.cert")?),
        algorithm: eseal.field(2, "eseal.signAlgID")?.oid("eseal.signAlgID")?,
        signed_value: bytes(eseal.field(3, "eseal.signedValue")?.bits("eseal.signedValue")?),
    };
    let seal = decode_seal(info, SesVersion::V4, maker)?;

    let time = to_sign.field(2, "timeInfo")?.time("timeInfo")?;
    let time_info = SignTime {
        raw: String::from_utf8_lossy(to_sign.field(2, "timeInfo")?.content()).into_owned(),
        time: Some(time),
    };

    let data_hash = to_sign.field(3, "dataHash")?.bits("dataHash")?;
    let property_info = to_sign.field(4, "propertyInfo")?.string("propertyInfo")?;
    let ext_datas = to_sign.get(5).map(|e| bytes(e.raw()));

    Ok(SesSignature {
        version: SesVersion::V4,
        declared_version,
        to_sign: bytes(to_sign.raw()),
        seal,
        time_info,
        data_hash: bytes(data_hash),
        property_info,
        certificate,
        signature_algorithm,
        signature: bytes(signature),
        timestamp,
        ext_datas,
    })
}

/// `SES_SealInfo`: header, esID, property, picture, extDatas.
fn decode_seal(info: &Element<'_>, version: SesVersion, maker: SealMaker) -> DecodeResult<Seal> {
    let info = info.sequence("esealInfo")?;

    let header = info.field(0, "header")?.sequence("header")?;
    let header = SealHeader {
        id: header.field(0, "header.ID")?.string("header.ID")?,
        version: header.field(1, "header.version")?.integer("header.version")?,
        vendor_id: header.field(2, "header.Vid")?.string("header.Vid")?,
    };

    let es_id = info.field(1, "esID")?.string("esID")?;
    let property = decode_property(info.field(2, "property")?, version)?;

    let picture = info.field(3, "picture")?.sequence("picture")?;
    let picture = SealPicture::new(
        picture.field(0, "picture.type")?.string("picture.type")?,
        bytes(picture.field(1, "picture.data")?.octets("picture.data")?),
        picture.field(2, "picture.width")?.integer("picture.width")?,
        picture.field(3, "picture.height")?.integer("picture.height")?,
    );

    Ok(Seal {
        header,
        es_id,
        property,
        picture,
        ext_datas: info.get(4).map(|e| bytes(e.raw())),
        maker,
    })
}

/// `SES_ESPropertyInfo`. V4 inserts a certificate list type before the list.
fn decode_property(property: &Element<'_>, version: SesVersion) -> DecodeResult<SealProperty> {
    let property = property.sequence("property")?;
    let seal_type = property.field(0, "property.type")?.integer("property.type")?;
    let name = property.field(1, "property.name")?.string("property.name")?;

    let (cert_list_type, list_index) = match version {
        SesVersion::V1 => (None, 2),
        SesVersion::V4 => (
            Some(
                property
                    .field(2, "property.certListType")?
                    .integer("property.certListType")?,
            ),
            3,
        ),
    };

    let list = property
        .field(list_index, "property.certList")?
        .sequence("property.certList")?;
    // Entries are certificates, or digest objects when certListType is 2
    let mut cert_list = Vec::new();
    let mut cert_digests = Vec::new();
    for entry in list.children() {
        if let Ok(der) = entry.octets("property.certList") {
            cert_list.push(bytes(der));
            continue;
        }
        match cert_digest(entry) {
            Ok(digest) => cert_digests.push(digest),
            Err(e) => log::debug!("skipping seal owner certificate entry: {e}"),
        }
    }

    let time_at = |offset: usize, field: &'static str| {
        property
            .get(list_index + offset)
            .and_then(|t| t.time(field).ok())
    };

    Ok(SealProperty {
        seal_type,
        name,
        cert_list_type,
        cert_list,
        cert_digests,
        create_date: time_at(1, "property.createDate"),
        valid_start: time_at(2, "property.validStart"),
        valid_end: time_at(3, "property.validEnd"),
    })
}

fn cert_digest(entry: &Element<'_>) -> DecodeResult<CertDigest> {
    let entry = entry.sequence("property.certList")?;
    Ok(CertDigest {
        digest_type: entry.field(0, "certDigest.type")?.string("certDigest.type")?,
        value: bytes(entry.field(1, "certDigest.value")?.octets("certDigest.value")?),
    })
}

fn bytes(slice: &[u8]) -> Bytes {
    Bytes::copy_from_slice(slice)
}
