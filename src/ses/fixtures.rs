//! DER builders and signed seal samples for tests.

use sm2::dsa::signature::Signer;
use sm2::dsa::{Signature, SigningKey};
use sm2::elliptic_curve::sec1::ToEncodedPoint;
use sm2::SecretKey;

use super::verify::SM2_USER_ID;

pub const SM2_KEY_ALGORITHM: &str = "1.2.840.10045.2.1";
pub const SM2_CURVE: &str = "1.2.156.10197.1.301";
pub const SM2_WITH_SM3: &str = "1.2.156.10197.1.501";
pub const RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.1";
pub const SHA1_WITH_RSA: &str = "1.2.840.113549.1.1.5";

/// Minimal PNG signature plus padding.
pub const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

pub fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = content.len();
    if len < 0x80 {
        out.push(len as u8);
    } else {
        let bytes: Vec<u8> = len
            .to_be_bytes()
            .iter()
            .copied()
            .skip_while(|b| *b == 0)
            .collect();
        out.push(0x80 | bytes.len() as u8);
        out.extend(bytes);
    }
    out.extend_from_slice(content);
    out
}

pub fn seq(items: &[Vec<u8>]) -> Vec<u8> {
    tlv(0x30, &items.concat())
}

pub fn set(items: &[Vec<u8>]) -> Vec<u8> {
    tlv(0x31, &items.concat())
}

pub fn int(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < 7 {
        let b = bytes[start];
        let next_high = bytes[start + 1] & 0x80;
        if (b == 0x00 && next_high == 0) || (b == 0xFF && next_high != 0) {
            start += 1;
        } else {
            break;
        }
    }
    tlv(0x02, &bytes[start..])
}

/// Non-negative INTEGER from big-endian magnitude bytes.
pub fn uint(magnitude: &[u8]) -> Vec<u8> {
    let trimmed: Vec<u8> = magnitude.iter().copied().skip_while(|b| *b == 0).collect();
    let mut content = Vec::new();
    if trimmed.first().map_or(true, |b| b & 0x80 != 0) {
        content.push(0);
    }
    content.extend(trimmed);
    tlv(0x02, &content)
}

pub fn oid(dotted: &str) -> Vec<u8> {
    let arcs: Vec<u64> = dotted.split('.').map(|a| a.parse().unwrap()).collect();
    let mut content = Vec::new();
    let mut push_arc = |mut value: u64| {
        let mut chunk = vec![(value & 0x7F) as u8];
        value >>= 7;
        while value > 0 {
            chunk.push(0x80 | (value & 0x7F) as u8);
            value >>= 7;
        }
        chunk.reverse();
        content.extend(chunk);
    };
    push_arc(arcs[0] * 40 + arcs[1]);
    for arc in &arcs[2..] {
        push_arc(*arc);
    }
    tlv(0x06, &content)
}

pub fn null() -> Vec<u8> {
    vec![0x05, 0x00]
}

pub fn ia5(s: &str) -> Vec<u8> {
    tlv(0x16, s.as_bytes())
}

pub fn utf8(s: &str) -> Vec<u8> {
    tlv(0x0C, s.as_bytes())
}

pub fn octets(b: &[u8]) -> Vec<u8> {
    tlv(0x04, b)
}

pub fn bits(b: &[u8]) -> Vec<u8> {
    let mut content = vec![0];
    content.extend_from_slice(b);
    tlv(0x03, &content)
}

pub fn utc_time(s: &str) -> Vec<u8> {
    tlv(0x17, s.as_bytes())
}

pub fn gen_time(s: &str) -> Vec<u8> {
    tlv(0x18, s.as_bytes())
}

pub fn explicit(number: u8, inner: Vec<u8>) -> Vec<u8> {
    tlv(0xA0 | number, &inner)
}

/// X.509 certificate with the given subject key.
pub fn certificate(key_algorithm: &str, parameters: Vec<u8>, key: &[u8], cn: &str) -> Vec<u8> {
    let name = |cn: &str| {
        seq(&[
            set(&[seq(&[oid("2.5.4.6"), tlv(0x13, b"CN")])]),
            set(&[seq(&[oid("2.5.4.3"), utf8(cn)])]),
        ])
    };
    let tbs = seq(&[
        explicit(0, int(2)),
        uint(&[0x01, 0x23, 0x45]),
        seq(&[oid(SM2_WITH_SM3)]),
        name("Test CA"),
        seq(&[utc_time("200101000000Z"), utc_time("400101000000Z")]),
        name(cn),
        seq(&[seq(&[oid(key_algorithm), parameters]), bits(key)]),
    ]);
    seq(&[tbs, seq(&[oid(SM2_WITH_SM3)]), bits(&[0u8; 8])])
}

pub fn sm2_key() -> SigningKey {
    let secret = SecretKey::from_slice(&[0x42; 32]).unwrap();
    SigningKey::new(SM2_USER_ID, &secret).unwrap()
}

pub fn sm2_certificate(key: &SigningKey, cn: &str) -> Vec<u8> {
    let point = key.verifying_key().to_encoded_point(false);
    certificate(SM2_KEY_ALGORITHM, oid(SM2_CURVE), point.as_bytes(), cn)
}

/// DER `SEQUENCE { r, s }` SM2 signature over `message`.
pub fn sm2_sign(key: &SigningKey, message: &[u8]) -> Vec<u8> {
    let signature: Signature = key.sign(message);
    let bytes = signature.to_bytes();
    seq(&[uint(&bytes[..32]), uint(&bytes[32..])])
}

pub fn seal_info(picture_type: &str, picture: &[u8], property: Vec<u8>) -> Vec<u8> {
    seq(&[
        seq(&[ia5("ES"), int(4), ia5("VID-01")]),
        ia5("ES-0001"),
        property,
        seq(&[ia5(picture_type), octets(picture), int(40), int(40)]),
    ])
}

pub fn v4_property(cert: &[u8]) -> Vec<u8> {
    seq(&[
        int(1),
        utf8("Contract Seal"),
        int(1),
        seq(&[octets(cert)]),
        gen_time("20200101000000Z"),
        gen_time("20200101000000Z"),
        gen_time("20400101000000Z"),
    ])
}

pub fn v1_property(cert: &[u8]) -> Vec<u8> {
    seq(&[
        int(1),
        utf8("Contract Seal"),
        seq(&[octets(cert)]),
        utc_time("200101000000Z"),
        utc_time("200101000000Z"),
        utc_time("400101000000Z"),
    ])
}

/// V4 property listing owner certificate digests (`certListType` 2).
pub fn v4_digest_property() -> Vec<u8> {
    seq(&[
        int(1),
        utf8("Contract Seal"),
        int(2),
        seq(&[seq(&[tlv(0x13, b"SM3"), octets(&[0x5A; 32])])]),
        gen_time("20200101000000Z"),
        gen_time("20200101000000Z"),
        gen_time("20400101000000Z"),
    ])
}

/// A complete V4 `SES_Signature` signed with [`sm2_key`].
pub fn sm2_v4_signature(picture_type: &str, picture: &[u8]) -> Vec<u8> {
    let maker_cert = sm2_certificate(&sm2_key(), "Seal Maker");
    sm2_v4_signature_with(picture_type, picture, v4_property(&maker_cert))
}

/// A complete V4 `SES_Signature` with the given `SES_ESPropertyInfo`.
pub fn sm2_v4_signature_with(picture_type: &str, picture: &[u8], property: Vec<u8>) -> Vec<u8> {
    let key = sm2_key();
    let cert = sm2_certificate(&key, "Signer");
    let maker_cert = sm2_certificate(&key, "Seal Maker");

    let info = seal_info(picture_type, picture, property);
    let eseal = seq(&[
        info.clone(),
        octets(&maker_cert),
        oid(SM2_WITH_SM3),
        bits(&sm2_sign(&key, &info)),
    ]);
    let to_sign = seq(&[
        int(4),
        eseal,
        gen_time("20240601120000Z"),
        bits(&[0x11; 32]),
        ia5("/Doc_0/Signs/Sign_0/Signature.xml"),
    ]);
    let signature = sm2_sign(&key, &to_sign);
    seq(&[to_sign, octets(&cert), oid(SM2_WITH_SM3), bits(&signature)])
}

/// A complete V1 `SES_Signature` signed with [`sm2_key`].
pub fn sm2_v1_signature(picture_type: &str, picture: &[u8]) -> Vec<u8> {
    let key = sm2_key();
    let cert = sm2_certificate(&key, "Signer");
    let maker_cert = sm2_certificate(&key, "Seal Maker");

    let info = seal_info(picture_type, picture, v1_property(&maker_cert));
    let eseal = seq(&[
        info.clone(),
        seq(&[
            octets(&maker_cert),
            oid(SM2_WITH_SM3),
            bits(&sm2_sign(&key, &info)),
        ]),
    ]);
    let to_sign = seq(&[
        int(1),
        eseal,
        bits(b"20240601120000"),
        bits(&[0x22; 32]),
        ia5("/Doc_0/Signs/Sign_0/Signature.xml"),
        octets(&cert),
        oid(SM2_WITH_SM3),
    ]);
    let signature = sm2_sign(&key, &to_sign);
    seq(&[to_sign, bits(&signature)])
}

/// Flips the lowest bit of the last byte (inside the trailing signature).
pub fn tamper_last_byte(mut der: Vec<u8>) -> Vec<u8> {
    if let Some(last) = der.last_mut() {
        *last ^= 0x01;
    }
    der
}
