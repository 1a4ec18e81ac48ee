//! Builds [`Node`] trees from XML text.

use super::node::{strip_attr_prefix, Node};
use super::tags::is_multi_valued;
use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::sync::Arc;

/// Parses the XML text of `part` into a node tree rooted at its document
/// element.
///
/// Sibling elements with the same tag are grouped (see [`Node`]); the
/// document element itself is never wrapped.
pub fn parse_xml(xml: &str, part: &str) -> Result<Node> {
    let source: Arc<str> = Arc::from(part);
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<Node> = None;
    let mut ordinal = 0usize;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => return Err(malformed(part, &reader, e)),
        };

        match event {
            Event::Start(e) => {
                ensure_single_root(part, &root, &stack)?;
                stack.push(Frame::open(&e, ordinal, part)?);
                ordinal += 1;
            }
            Event::Empty(e) => {
                ensure_single_root(part, &root, &stack)?;
                let node = Frame::open(&e, ordinal, part)?.close(&source);
                ordinal += 1;
                attach(node, &mut stack, &mut root);
            }
            Event::End(_) => {
                // quick-xml checks that end names match
                let frame = stack
                    .pop()
                    .ok_or_else(|| Error::malformed(part, "unexpected closing tag"))?;
                let node = frame.close(&source);
                attach(node, &mut stack, &mut root);
            }
            Event::Text(e) => {
                if let Some(frame) = stack.last_mut() {
                    let text = e.unescape().map_err(|e| Error::malformed(part, e))?;
                    frame.text.push_str(&text);
                }
            }
            Event::CData(e) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(Error::malformed(
            part,
            format!("unexpected end of document inside <{}>", open.tag),
        ));
    }

    root.ok_or_else(|| Error::malformed(part, "no root element"))
}

/// An element whose end tag has not been read yet.
struct Frame {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
    text: String,
    ordinal: usize,
}

impl Frame {
    fn open(e: &BytesStart<'_>, ordinal: usize, part: &str) -> Result<Self> {
        let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let mut attributes = Vec::new();

        for attr in e.attributes() {
            let attr = attr.map_err(|err| Error::malformed(part, err))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|err| Error::malformed(part, err))?
                .into_owned();
            attributes.push((strip_attr_prefix(&key).to_string(), value));
        }

        Ok(Self {
            tag,
            attributes,
            children: Vec::new(),
            text: String::new(),
            ordinal,
        })
    }

    fn close(self, source: &Arc<str>) -> Node {
        let text = if self.text.is_empty()
            || (!self.children.is_empty() && self.text.trim().is_empty())
        {
            None
        } else {
            Some(self.text)
        };

        Node {
            tag: self.tag,
            attributes: self.attributes,
            children: group_children(self.children, source),
            text,
            source_part: Arc::clone(source),
            ordinal: self.ordinal,
        }
    }
}

fn attach(node: Node, stack: &mut [Frame], root: &mut Option<Node>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => *root = Some(node),
    }
}

fn ensure_single_root(part: &str, root: &Option<Node>, stack: &[Frame]) -> Result<()> {
    if root.is_some() && stack.is_empty() {
        return Err(Error::malformed(part, "multiple root elements"));
    }
    Ok(())
}

/// Groups sibling elements by tag, in order of first appearance.
fn group_children(children: Vec<Node>, source: &Arc<str>) -> Vec<Node> {
    let mut groups: Vec<(String, Vec<Node>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for child in children {
        match index.get(&child.tag) {
            Some(&i) => groups[i].1.push(child),
            None => {
                index.insert(child.tag.clone(), groups.len());
                groups.push((child.tag.clone(), vec![child]));
            }
        }
    }

    let mut grouped = Vec::with_capacity(groups.len());
    for (tag, mut occurrences) in groups {
        if occurrences.len() == 1 && !is_multi_valued(&tag) {
            grouped.extend(occurrences.pop());
            continue;
        }

        let mut group = Node::new(tag, Arc::clone(source));
        group.ordinal = occurrences.first().map_or(0, |n| n.ordinal);
        for (i, mut occurrence) in occurrences.into_iter().enumerate() {
            occurrence.tag = i.to_string();
            group.children.push(occurrence);
        }
        grouped.push(group);
    }
    grouped
}

fn malformed(part: &str, reader: &Reader<&[u8]>, err: quick_xml::Error) -> Error {
    Error::malformed(
        part,
        format!("{} at byte {}", err, reader.buffer_position()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_occurrence_not_grouped() {
        let xml = r#"<ofd:OFD xmlns:ofd="http://www.ofdspec.org/2016" Version="1.0">
            <ofd:DocBody><ofd:DocRoot>Doc_0/Document.xml</ofd:DocRoot></ofd:DocBody>
        </ofd:OFD>"#;
        let root = parse_xml(xml, "OFD.xml").unwrap();

        assert_eq!(root.tag, "ofd:OFD");
        assert_eq!(root.attribute("Version"), Some("1.0"));
        let body = root.child("ofd:DocBody").unwrap();
        assert!(!body.is_group());
        assert_eq!(body.child_text("ofd:DocRoot"), Some("Doc_0/Document.xml"));
        assert_eq!(&*body.source_part, "OFD.xml");
    }

    #[test]
    fn test_allow_listed_tag_always_grouped() {
        let xml = r#"<ofd:Pages><ofd:Page ID="1" BaseLoc="Pages/Page_0/Content.xml"/></ofd:Pages>"#;
        let root = parse_xml(xml, "Doc_0/Document.xml").unwrap();

        let group = root.child("ofd:Page").unwrap();
        assert!(group.is_group());
        assert_eq!(group.children.len(), 1);
        assert_eq!(group.children[0].tag, "0");
        assert_eq!(group.children[0].attribute("ID"), Some("1"));
    }

    #[test]
    fn test_repeated_tag_grouped_in_first_appearance_order() {
        let xml = "<r><b>1</b><a/><b>2</b><c/><b>3</b></r>";
        let root = parse_xml(xml, "x.xml").unwrap();

        let tags: Vec<&str> = root.children.iter().map(|c| c.tag.as_str()).collect();
        assert_eq!(tags, vec!["b", "a", "c"]);

        let b = &root.children[0];
        let texts: Vec<&str> = b.elements().filter_map(Node::text).collect();
        assert_eq!(texts, vec!["1", "2", "3"]);
        assert_eq!(b.children[2].tag, "2");
    }

    #[test]
    fn test_ordinals_follow_document_order() {
        let xml = "<r><b/><a/><b/></r>";
        let root = parse_xml(xml, "x.xml").unwrap();
        let b = root.child("b").unwrap();
        let a = root.child("a").unwrap();

        assert_eq!(root.ordinal, 0);
        assert_eq!(b.children[0].ordinal, 1);
        assert_eq!(a.ordinal, 2);
        assert_eq!(b.children[1].ordinal, 3);
    }

    #[test]
    fn test_text_entities_and_cdata() {
        let xml = "<r><t>a &amp; b</t><u><![CDATA[<raw>]]></u></r>";
        let root = parse_xml(xml, "x.xml").unwrap();
        assert_eq!(root.child_text("t"), Some("a & b"));
        assert_eq!(root.child_text("u"), Some("<raw>"));
    }

    #[test]
    fn test_whitespace_between_children_dropped() {
        let xml = "<r>\n  <a/>\n</r>";
        let root = parse_xml(xml, "x.xml").unwrap();
        assert_eq!(root.text, None);
    }

    #[test]
    fn test_mismatched_tags_are_malformed() {
        let err = parse_xml("<a><b></a>", "Doc_0/Bad.xml").unwrap_err();
        match err {
            Error::MalformedPart { part, .. } => assert_eq!(part, "Doc_0/Bad.xml"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unclosed_and_empty_documents_are_malformed() {
        assert!(matches!(
            parse_xml("<a><b/>", "x.xml"),
            Err(Error::MalformedPart { .. })
        ));
        assert!(matches!(
            parse_xml("  ", "x.xml"),
            Err(Error::MalformedPart { .. })
        ));
    }
}
