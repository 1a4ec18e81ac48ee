//! BER/DER element reader.
//!
//! Elements are TLV triples: an identifier octet, a length (short, long or
//! indefinite form) and the content. Constructed elements are parsed into
//! children eagerly; primitive content stays a borrowed slice.

use super::{DecodeError, DecodeResult};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};

/// Maximum nesting of constructed elements.
pub const MAX_DEPTH: usize = 64;

/// Universal identifier octets.
pub mod tag {
    pub const INTEGER: u8 = 0x02;
    pub const BIT_STRING: u8 = 0x03;
    pub const OCTET_STRING: u8 = 0x04;
    pub const NULL: u8 = 0x05;
    pub const OID: u8 = 0x06;
    pub const UTF8_STRING: u8 = 0x0C;
    pub const PRINTABLE_STRING: u8 = 0x13;
    pub const T61_STRING: u8 = 0x14;
    pub const IA5_STRING: u8 = 0x16;
    pub const UTC_TIME: u8 = 0x17;
    pub const GENERALIZED_TIME: u8 = 0x18;
    pub const VISIBLE_STRING: u8 = 0x1A;
    pub const BMP_STRING: u8 = 0x1E;
    pub const SEQUENCE: u8 = 0x30;
    pub const SET: u8 = 0x31;
}

const CONSTRUCTED: u8 = 0x20;
const CLASS_MASK: u8 = 0xC0;
const CONTEXT_CLASS: u8 = 0x80;

/// One decoded element.
#[derive(Debug, Clone)]
pub struct Element<'a> {
    /// Identifier octet.
    pub tag: u8,
    /// Tag number (differs from the low bits of `tag` in high-tag form).
    pub number: u32,
    offset: usize,
    raw: &'a [u8],
    content: &'a [u8],
    children: Vec<Element<'a>>,
}

impl<'a> Element<'a> {
    /// Parses the element at the start of `data`. Trailing bytes are ignored.
    pub fn parse(data: &'a [u8]) -> DecodeResult<Self> {
        Self::parse_at(data, 0, 0).map(|(element, _)| element)
    }

    /// Parses the element at the start of `data`, which sits at `base` in
    /// the outermost buffer. Returns the element and the bytes consumed.
    fn parse_at(data: &'a [u8], base: usize, depth: usize) -> DecodeResult<(Self, usize)> {
        if depth > MAX_DEPTH {
            return Err(DecodeError::TooDeep(MAX_DEPTH));
        }

        let truncated = |pos: usize| DecodeError::Truncated { offset: base + pos };

        let tag = *data.first().ok_or_else(|| truncated(0))?;
        let mut pos = 1;

        let mut number = u32::from(tag & 0x1F);
        if number == 0x1F {
            number = 0;
            loop {
                let b = *data.get(pos).ok_or_else(|| truncated(pos))?;
                pos += 1;
                number = number
                    .checked_mul(128)
                    .and_then(|n| n.checked_add(u32::from(b & 0x7F)))
                    .ok_or(DecodeError::InvalidLength { offset: base + pos })?;
                if b & 0x80 == 0 {
                    break;
                }
            }
        }

        let first = *data.get(pos).ok_or_else(|| truncated(pos))?;
        pos += 1;
        let constructed = tag & CONSTRUCTED != 0;

        if first == 0x80 {
            if !constructed {
                return Err(DecodeError::InvalidLength { offset: base + pos - 1 });
            }
            return Self::parse_indefinite(data, base, depth, tag, number, pos);
        }

        let length = if first < 0x80 {
            usize::from(first)
        } else {
            let count = usize::from(first & 0x7F);
            if count > 4 {
                return Err(DecodeError::InvalidLength { offset: base + pos - 1 });
            }
            let bytes = data.get(pos..pos + count).ok_or_else(|| truncated(pos))?;
            pos += count;
            bytes.iter().fold(0usize, |acc, b| (acc << 8) | usize::from(*b))
        };

        let end = pos
            .checked_add(length)
            .filter(|end| *end <= data.len())
            .ok_or_else(|| truncated(pos))?;
        let content = &data[pos..end];

        let mut children = Vec::new();
        if constructed {
            let mut cursor = 0;
            while cursor < content.len() {
                let (child, used) =
                    Self::parse_at(&content[cursor..], base + pos + cursor, depth + 1)?;
                cursor += used;
                children.push(child);
            }
        }

        Ok((
            Self {
                tag,
                number,
                offset: base,
                raw: &data[..end],
                content,
                children,
            },
            end,
        ))
    }

    fn parse_indefinite(
        data: &'a [u8],
        base: usize,
        depth: usize,
        tag: u8,
        number: u32,
        start: usize,
    ) -> DecodeResult<(Self, usize)> {
        let mut cursor = start;
        let mut children = Vec::new();

        loop {
            match data.get(cursor..cursor + 2) {
                Some([0, 0]) => break,
                Some(_) => {
                    let (child, used) =
                        Self::parse_at(&data[cursor..], base + cursor, depth + 1)?;
                    cursor += used;
                    children.push(child);
                }
                None => return Err(DecodeError::Truncated { offset: base + cursor }),
            }
        }

        let end = cursor + 2;
        Ok((
            Self {
                tag,
                number,
                offset: base,
                raw: &data[..end],
                content: &data[start..cursor],
                children,
            },
            end,
        ))
    }

    /// The complete encoding: identifier, length and content.
    pub fn raw(&self) -> &'a [u8] {
        self.raw
    }

    pub fn content(&self) -> &'a [u8] {
        self.content
    }

    pub fn children(&self) -> &[Element<'a>] {
        &self.children
    }

    pub fn get(&self, index: usize) -> Option<&Element<'a>> {
        self.children.get(index)
    }

    /// Offset of this element in the outermost buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_constructed(&self) -> bool {
        self.tag & CONSTRUCTED != 0
    }

    /// True for a context-specific tag `[number]`.
    pub fn is_context(&self, number: u32) -> bool {
        self.tag & CLASS_MASK == CONTEXT_CLASS && self.number == number
    }

    /// Child `index`, or a missing-field error naming `field`.
    pub fn field(&self, index: usize, field: &'static str) -> DecodeResult<&Element<'a>> {
        self.children
            .get(index)
            .ok_or(DecodeError::MissingField(field))
    }

    /// Checks the identifier octet.
    pub fn expect(&self, tag: u8, field: &'static str, expected: &'static str) -> DecodeResult<&Self> {
        if self.tag == tag {
            Ok(self)
        } else {
            Err(self.unexpected(field, expected))
        }
    }

    /// A constructed SEQUENCE.
    pub fn sequence(&self, field: &'static str) -> DecodeResult<&Self> {
        self.expect(tag::SEQUENCE, field, "SEQUENCE")
    }

    pub fn integer(&self, field: &'static str) -> DecodeResult<i64> {
        self.expect(tag::INTEGER, field, "INTEGER")?;
        let bytes = self.content;
        if bytes.is_empty() || bytes.len() > 8 {
            return Err(DecodeError::InvalidValue {
                field,
                message: format!("{}-byte integer", bytes.len()),
            });
        }
        let negative = bytes[0] & 0x80 != 0;
        let init: i64 = if negative { -1 } else { 0 };
        Ok(bytes
            .iter()
            .fold(init, |acc, b| (acc << 8) | i64::from(*b)))
    }

    /// Magnitude bytes of a non-negative INTEGER without sign padding.
    pub fn unsigned_bytes(&self, field: &'static str) -> DecodeResult<&'a [u8]> {
        self.expect(tag::INTEGER, field, "INTEGER")?;
        let bytes = self.content;
        if bytes.is_empty() || bytes[0] & 0x80 != 0 {
            return Err(DecodeError::InvalidValue {
                field,
                message: "not a non-negative integer".into(),
            });
        }
        let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        Ok(&bytes[start..])
    }

    /// Dotted OBJECT IDENTIFIER.
    pub fn oid(&self, field: &'static str) -> DecodeResult<String> {
        self.expect(tag::OID, field, "OBJECT IDENTIFIER")?;
        decode_oid(self.content).ok_or_else(|| DecodeError::InvalidValue {
            field,
            message: "bad object identifier".into(),
        })
    }

    /// Any of the character string types.
    pub fn string(&self, field: &'static str) -> DecodeResult<String> {
        match self.tag {
            tag::UTF8_STRING
            | tag::PRINTABLE_STRING
            | tag::T61_STRING
            | tag::IA5_STRING
            | tag::VISIBLE_STRING => Ok(String::from_utf8_lossy(self.content).into_owned()),
            tag::BMP_STRING => {
                let units: Vec<u16> = self
                    .content
                    .chunks_exact(2)
                    .map(|c| u16::from_be_bytes([c[0], c[1]]))
                    .collect();
                Ok(String::from_utf16_lossy(&units))
            }
            _ => Err(self.unexpected(field, "string")),
        }
    }

    /// UTCTime or GeneralizedTime.
    pub fn time(&self, field: &'static str) -> DecodeResult<DateTime<Utc>> {
        let utc_time = match self.tag {
            tag::UTC_TIME => true,
            tag::GENERALIZED_TIME => false,
            _ => return Err(self.unexpected(field, "time")),
        };
        let text = String::from_utf8_lossy(self.content);
        parse_time(&text, utc_time).ok_or_else(|| DecodeError::InvalidValue {
            field,
            message: format!("bad time {text:?}"),
        })
    }

    /// Content of an OCTET STRING.
    pub fn octets(&self, field: &'static str) -> DecodeResult<&'a [u8]> {
        self.expect(tag::OCTET_STRING, field, "OCTET STRING")?;
        Ok(self.content)
    }

    /// Payload of a BIT STRING, without the unused-bits octet.
    pub fn bits(&self, field: &'static str) -> DecodeResult<&'a [u8]> {
        self.expect(tag::BIT_STRING, field, "BIT STRING")?;
        match self.content.split_first() {
            Some((_, payload)) => Ok(payload),
            None => Err(DecodeError::InvalidValue {
                field,
                message: "empty bit string".into(),
            }),
        }
    }

    /// Parses the content of an OCTET STRING as a nested element.
    pub fn encapsulated(&self, field: &'static str) -> DecodeResult<Element<'a>> {
        let content = self.octets(field)?;
        let base = self.offset + (self.raw.len() - self.content.len());
        Self::parse_at(content, base, 0).map(|(element, _)| element)
    }

    fn unexpected(&self, field: &'static str, expected: &'static str) -> DecodeError {
        DecodeError::UnexpectedTag {
            field,
            expected,
            found: self.tag,
        }
    }
}

fn decode_oid(bytes: &[u8]) -> Option<String> {
    let mut arcs: Vec<u64> = Vec::new();
    let mut value: u64 = 0;
    let mut pending = false;

    for b in bytes {
        value = value.checked_mul(128)?.checked_add(u64::from(b & 0x7F))?;
        pending = true;
        if b & 0x80 == 0 {
            if arcs.is_empty() {
                let first = (value / 40).min(2);
                arcs.push(first);
                arcs.push(value - first * 40);
            } else {
                arcs.push(value);
            }
            value = 0;
            pending = false;
        }
    }

    if pending || arcs.is_empty() {
        return None;
    }
    Some(
        arcs.iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join("."),
    )
}

/// Parses `YYMMDDHHMM[SS]` (UTCTime) or `YYYYMMDDHHMM[SS][.f]`
/// (GeneralizedTime) with an optional `Z` or `+hhmm`/`-hhmm` zone.
pub(crate) fn parse_time(text: &str, utc_time: bool) -> Option<DateTime<Utc>> {
    let text = text.trim();
    let (body, offset) = split_zone(text)?;
    let body = body.split(['.', ',']).next()?;
    if !body.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut full = String::with_capacity(14);
    if utc_time {
        let century = if body.as_bytes().first()? < &b'5' { "20" } else { "19" };
        full.push_str(century);
    }
    full.push_str(body);
    match full.len() {
        12 => full.push_str("00"),
        14 => {}
        _ => return None,
    }

    let naive = NaiveDateTime::parse_from_str(&full, "%Y%m%d%H%M%S").ok()?;
    Some(naive.and_utc() - offset)
}

fn split_zone(text: &str) -> Option<(&str, Duration)> {
    if let Some(body) = text.strip_suffix('Z') {
        return Some((body, Duration::zero()));
    }
    if text.len() > 5 {
        let (body, zone) = text.split_at(text.len() - 5);
        let sign = match zone.as_bytes()[0] {
            b'+' => 1,
            b'-' => -1,
            _ => return Some((text, Duration::zero())),
        };
        let hours: i64 = zone.get(1..3)?.parse().ok()?;
        let minutes: i64 = zone.get(3..5)?.parse().ok()?;
        return Some((body, Duration::minutes(sign * (hours * 60 + minutes))));
    }
    Some((text, Duration::zero()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ses::fixtures::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_short_and_long_lengths() {
        let short = octets(&[1, 2, 3]);
        let element = Element::parse(&short).unwrap();
        assert_eq!(element.octets("x").unwrap(), &[1, 2, 3]);
        assert_eq!(element.raw().len(), 5);

        let long = octets(&vec![7u8; 300]);
        assert_eq!(&long[..4], &[0x04, 0x82, 0x01, 0x2C]);
        let element = Element::parse(&long).unwrap();
        assert_eq!(element.content().len(), 300);
    }

    #[test]
    fn test_sequence_children() {
        let der = seq(&[int(5), ia5("ES"), oid("1.2.156.10197.1.501")]);
        let element = Element::parse(&der).unwrap();
        assert_eq!(element.children().len(), 3);
        assert_eq!(element.field(0, "n").unwrap().integer("n").unwrap(), 5);
        assert_eq!(element.field(1, "s").unwrap().string("s").unwrap(), "ES");
        assert_eq!(
            element.field(2, "o").unwrap().oid("o").unwrap(),
            "1.2.156.10197.1.501"
        );
        assert_eq!(
            element.field(3, "missing").unwrap_err(),
            DecodeError::MissingField("missing")
        );
    }

    #[test]
    fn test_indefinite_length() {
        let mut der = vec![0x30, 0x80];
        der.extend(int(1));
        der.extend(int(-2));
        der.extend([0, 0]);
        der.extend([0xFF, 0xFF]);

        let element = Element::parse(&der).unwrap();
        assert_eq!(element.children().len(), 2);
        assert_eq!(element.get(1).unwrap().integer("n").unwrap(), -2);
        assert_eq!(element.raw().len(), der.len() - 2);
    }

    #[test]
    fn test_truncated_input() {
        let der = seq(&[int(1), ia5("abc")]);
        let cut = &der[..der.len() - 1];
        assert!(matches!(
            Element::parse(cut),
            Err(DecodeError::Truncated { .. })
        ));
        assert!(matches!(
            Element::parse(&[]),
            Err(DecodeError::Truncated { offset: 0 })
        ));
    }

    #[test]
    fn test_depth_limit() {
        let mut der = int(0);
        for _ in 0..(MAX_DEPTH + 2) {
            der = seq(&[der]);
        }
        assert!(matches!(Element::parse(&der), Err(DecodeError::TooDeep(_))));
    }

    #[test]
    fn test_bit_string_and_encapsulation() {
        let inner = seq(&[int(42)]);
        let der = seq(&[bits(&[0xAA, 0xBB]), octets(&inner)]);
        let element = Element::parse(&der).unwrap();

        assert_eq!(element.get(0).unwrap().bits("b").unwrap(), &[0xAA, 0xBB]);
        let nested = element.get(1).unwrap().encapsulated("c").unwrap();
        assert_eq!(nested.get(0).unwrap().integer("n").unwrap(), 42);
    }

    #[test]
    fn test_unexpected_tag() {
        let der = ia5("x");
        let element = Element::parse(&der).unwrap();
        assert!(matches!(
            element.integer("version"),
            Err(DecodeError::UnexpectedTag { field: "version", .. })
        ));
    }

    #[test]
    fn test_times() {
        let der = utc_time("200102030405Z");
        let time = Element::parse(&der).unwrap().time("t").unwrap();
        assert_eq!((time.year(), time.month(), time.day()), (2020, 1, 2));
        assert_eq!((time.hour(), time.minute(), time.second()), (3, 4, 5));

        let der = gen_time("20301231235959Z");
        let time = Element::parse(&der).unwrap().time("t").unwrap();
        assert_eq!(time.year(), 2030);

        let zoned = parse_time("20200102120000+0800", false).unwrap();
        assert_eq!(zoned.hour(), 4);
        assert_eq!(parse_time("9912310000Z", true).unwrap().year(), 1999);
        assert!(parse_time("garbage", false).is_none());
    }

    #[test]
    fn test_unsigned_bytes_strip_padding() {
        let der = uint(&[0x00, 0x80, 0x01]);
        let element = Element::parse(&der).unwrap();
        assert_eq!(element.unsigned_bytes("r").unwrap(), &[0x80, 0x01]);
    }
}
