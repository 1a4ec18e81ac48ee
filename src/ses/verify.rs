//! Seal signature verification.
//!
//! SM2 signatures are checked with the SM2 default user id over the
//! DER of the to-be-signed structure (SM3 digest of Z‖M). Everything else is
//! checked as SHA1-with-RSA against the certificate key.

use super::asn1::{tag, Element};
use super::certificate::Certificate;
use super::seal::SesSignature;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use serde::Serialize;
use sha1::{Digest, Sha1};
use sm2::dsa::signature::Verifier;
use sm2::dsa::{Signature as Sm2Signature, VerifyingKey};

/// SM2 with SM3 signature algorithm.
pub const SM2_SIGNATURE_OID: &str = "1.2.156.10197.1.501";

/// Default SM2 user id (distinguishing identifier).
pub const SM2_USER_ID: &str = "1234567812345678";

const RSA_ENCRYPTION_OID: &str = "1.2.840.113549.1.1.1";

/// RSA signature algorithms with digests other than SHA1.
const OTHER_RSA_OIDS: &[&str] = &[
    "1.2.840.113549.1.1.4",  // md5WithRSAEncryption
    "1.2.840.113549.1.1.11", // sha256WithRSAEncryption
    "1.2.840.113549.1.1.12", // sha384WithRSAEncryption
    "1.2.840.113549.1.1.13", // sha512WithRSAEncryption
    "1.2.840.113549.1.1.14", // sha224WithRSAEncryption
];

/// Result of checking a seal signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VerificationOutcome {
    /// The signature matches the signed content.
    Valid,
    /// The signature does not match.
    Invalid,
    /// The algorithm or key type is not supported.
    UnsupportedAlgorithm,
    /// The key or signature could not be decoded.
    Malformed,
}

impl VerificationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerificationOutcome::Valid)
    }
}

/// Verifies a decoded seal signature.
pub fn verify(signature: &SesSignature) -> VerificationOutcome {
    let algorithm = signature.signature_algorithm.to_ascii_lowercase();

    if is_sm2(&algorithm) {
        verify_sm2(
            &signature.certificate.public_key.key,
            &signature.to_sign,
            &signature.signature,
        )
    } else if OTHER_RSA_OIDS.contains(&algorithm.as_str()) {
        VerificationOutcome::UnsupportedAlgorithm
    } else {
        verify_rsa_sha1(&signature.certificate, &signature.to_sign, &signature.signature)
    }
}

fn is_sm2(algorithm: &str) -> bool {
    algorithm.contains(SM2_SIGNATURE_OID) || algorithm.contains("sm2")
}

/// Verifies an SM2 signature with a SEC1-encoded public key.
pub(crate) fn verify_sm2(key: &[u8], message: &[u8], signature: &[u8]) -> VerificationOutcome {
    let key = strip_zero_padding(key, 65);
    let Ok(verifying_key) = VerifyingKey::from_sec1_bytes(SM2_USER_ID, key) else {
        return VerificationOutcome::Malformed;
    };
    let Some(signature) = sm2_signature(signature) else {
        return VerificationOutcome::Malformed;
    };

    match verifying_key.verify(message, &signature) {
        Ok(()) => VerificationOutcome::Valid,
        Err(_) => VerificationOutcome::Invalid,
    }
}

/// Reads an SM2 signature given as DER `SEQUENCE { r, s }` or raw `r‖s`.
fn sm2_signature(bytes: &[u8]) -> Option<Sm2Signature> {
    let bytes = strip_zero_padding(bytes, 64);
    if let Some(signature) = der_sm2_signature(bytes) {
        return Some(signature);
    }
    if bytes.len() == 64 {
        return Sm2Signature::from_slice(bytes).ok();
    }
    None
}

fn der_sm2_signature(bytes: &[u8]) -> Option<Sm2Signature> {
    let sequence = Element::parse(bytes).ok()?;
    if sequence.tag != tag::SEQUENCE
        || sequence.raw().len() != bytes.len()
        || sequence.children().len() != 2
    {
        return None;
    }
    let r = sequence.get(0)?.unsigned_bytes("r").ok()?;
    let s = sequence.get(1)?.unsigned_bytes("s").ok()?;
    if r.len() > 32 || s.len() > 32 {
        return None;
    }

    let mut rs = [0u8; 64];
    rs[32 - r.len()..32].copy_from_slice(r);
    rs[64 - s.len()..].copy_from_slice(s);
    Sm2Signature::from_slice(&rs).ok()
}

fn verify_rsa_sha1(cert: &Certificate, message: &[u8], signature: &[u8]) -> VerificationOutcome {
    if cert.public_key.algorithm != RSA_ENCRYPTION_OID {
        return VerificationOutcome::UnsupportedAlgorithm;
    }
    let Ok(key) = RsaPublicKey::from_pkcs1_der(&cert.public_key.key) else {
        return VerificationOutcome::Malformed;
    };

    let digest = Sha1::digest(message);
    match key.verify(Pkcs1v15Sign::new::<Sha1>(), &digest, signature) {
        Ok(()) => VerificationOutcome::Valid,
        Err(_) => VerificationOutcome::Invalid,
    }
}

/// Drops one leading zero octet left over from bit string encoding.
fn strip_zero_padding(bytes: &[u8], expected_len: usize) -> &[u8] {
    if bytes.len() == expected_len {
        return bytes;
    }
    match bytes.split_first() {
        Some((0, rest)) if rest.len() == expected_len || rest.first() == Some(&tag::SEQUENCE) => {
            rest
        }
        _ => bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ses::fixtures::*;
    use crate::ses::{decode_der, SesVersion};
    use bytes::Bytes;
    use rsa::pkcs1::EncodeRsaPublicKey;
    use rsa::RsaPrivateKey;
    use sm2::elliptic_curve::sec1::ToEncodedPoint;

    #[test]
    fn test_sm2_v4_valid() {
        let signature = decode_der(&sm2_v4_signature("png", PNG_BYTES)).unwrap();
        assert_eq!(verify(&signature), VerificationOutcome::Valid);
    }

    #[test]
    fn test_sm2_v1_valid() {
        let signature = decode_der(&sm2_v1_signature("png", PNG_BYTES)).unwrap();
        assert_eq!(signature.version, SesVersion::V1);
        assert_eq!(verify(&signature), VerificationOutcome::Valid);
    }

    #[test]
    fn test_tampered_signature_is_invalid() {
        let der = tamper_last_byte(sm2_v4_signature("png", PNG_BYTES));
        let signature = decode_der(&der).unwrap();
        assert_eq!(verify(&signature), VerificationOutcome::Invalid);
    }

    #[test]
    fn test_tampered_content_is_invalid() {
        let mut signature = decode_der(&sm2_v4_signature("png", PNG_BYTES)).unwrap();
        let mut to_sign = signature.to_sign.to_vec();
        let last = to_sign.len() - 1;
        to_sign[last] ^= 0x20;
        signature.to_sign = Bytes::from(to_sign);
        assert_eq!(verify(&signature), VerificationOutcome::Invalid);
    }

    #[test]
    fn test_verification_is_deterministic() {
        let der = tamper_last_byte(sm2_v1_signature("png", PNG_BYTES));
        let signature = decode_der(&der).unwrap();
        let first = verify(&signature);
        for _ in 0..3 {
            assert_eq!(verify(&signature), first);
        }
    }

    #[test]
    fn test_malformed_key_and_signature() {
        let mut signature = decode_der(&sm2_v4_signature("png", PNG_BYTES)).unwrap();
        signature.signature = Bytes::from_static(&[1, 2, 3]);
        assert_eq!(verify(&signature), VerificationOutcome::Malformed);

        let mut signature = decode_der(&sm2_v4_signature("png", PNG_BYTES)).unwrap();
        signature.certificate.public_key.key = Bytes::from_static(&[0x04, 0x01]);
        assert_eq!(verify(&signature), VerificationOutcome::Malformed);
    }

    #[test]
    fn test_raw_and_padded_sm2_signatures() {
        let key = sm2_key();
        let message = b"message";
        let der_sig = sm2_sign(&key, message);
        let parsed = Element::parse(&der_sig).unwrap();
        let r = parsed.get(0).unwrap().unsigned_bytes("r").unwrap();
        let s = parsed.get(1).unwrap().unsigned_bytes("s").unwrap();

        let mut raw = vec![0u8; 64];
        raw[32 - r.len()..32].copy_from_slice(r);
        raw[64 - s.len()..].copy_from_slice(s);

        let point = key.verifying_key().to_encoded_point(false);
        let public = point.as_bytes();
        assert_eq!(verify_sm2(public, message, &raw), VerificationOutcome::Valid);

        let mut padded = vec![0u8];
        padded.extend_from_slice(&der_sig);
        assert_eq!(verify_sm2(public, message, &padded), VerificationOutcome::Valid);

        let mut padded_key = vec![0u8];
        padded_key.extend_from_slice(public);
        assert_eq!(verify_sm2(&padded_key, message, &raw), VerificationOutcome::Valid);
    }

    fn rsa_signature(tamper: bool) -> SesSignature {
        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, 1024).unwrap();
        let public_der = private.to_public_key().to_pkcs1_der().unwrap();
        let cert = certificate(RSA_ENCRYPTION, null(), public_der.as_bytes(), "RSA Signer");

        let sm2 = sm2_key();
        let maker_cert = sm2_certificate(&sm2, "Seal Maker");
        let info = seal_info("png", PNG_BYTES, v1_property(&maker_cert));
        let eseal = seq(&[
            info.clone(),
            seq(&[octets(&maker_cert), oid(SHA1_WITH_RSA), bits(&[0])]),
        ]);
        let to_sign = |property_info: &str| {
            seq(&[
                int(1),
                eseal.clone(),
                bits(b"20240601120000"),
                bits(&[0x33; 20]),
                ia5(property_info),
                octets(&cert),
                oid(SHA1_WITH_RSA),
            ])
        };
        let signed = to_sign("/Doc_0/Signs/Sign_0/Signature.xml");
        let digest = Sha1::digest(&signed);
        let sig = private.sign(Pkcs1v15Sign::new::<Sha1>(), &digest).unwrap();
        let to_sign = if tamper {
            to_sign("/Doc_0/Signs/Sign_1/Signature.xml")
        } else {
            signed
        };
        decode_der(&seq(&[to_sign, bits(&sig)])).unwrap()
    }

    #[test]
    fn test_rsa_sha1() {
        assert_eq!(verify(&rsa_signature(false)), VerificationOutcome::Valid);
        assert_eq!(verify(&rsa_signature(true)), VerificationOutcome::Invalid);
    }

    #[test]
    fn test_unsupported_algorithms() {
        // SHA1-with-RSA claimed over an SM2 certificate key
        let mut signature = decode_der(&sm2_v4_signature("png", PNG_BYTES)).unwrap();
        signature.signature_algorithm = SHA1_WITH_RSA.into();
        assert_eq!(
            verify(&signature),
            VerificationOutcome::UnsupportedAlgorithm
        );

        signature.signature_algorithm = "1.2.840.113549.1.1.11".into();
        assert_eq!(
            verify(&signature),
            VerificationOutcome::UnsupportedAlgorithm
        );
    }

    #[test]
    fn test_algorithm_names() {
        assert!(is_sm2("1.2.156.10197.1.501"));
        assert!(is_sm2("sm2withsm3"));
        assert!(!is_sm2(SHA1_WITH_RSA));
    }
}
