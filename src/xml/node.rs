//! The node tree shape shared by every parsed OFD part.

use super::tags::{is_numeric_tag, ATTR_PREFIX};
use serde::Serialize;
use std::sync::Arc;

/// One element of a parsed part.
///
/// Child elements are grouped by tag. A *group node* carries the tag of its
/// occurrences and holds them as children tagged `"0"`, `"1"`, ...; an
/// occurrence has no tag of its own and stands for its parent group's tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    /// Qualified element name, or a decimal index for group occurrences.
    pub tag: String,
    /// Attributes in declaration order, keys without the attribute prefix.
    pub attributes: Vec<(String, String)>,
    /// Child nodes, grouped by tag in order of first appearance.
    pub children: Vec<Node>,
    /// Character data of the element.
    pub text: Option<String>,
    /// Archive path of the part this node was read from.
    pub source_part: Arc<str>,
    /// Position of the element in document order within its part.
    pub ordinal: usize,
}

impl Node {
    /// Creates an empty element node.
    pub fn new(tag: impl Into<String>, source_part: Arc<str>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            text: None,
            source_part,
            ordinal: 0,
        }
    }

    /// Looks up an own attribute. `key` may carry the attribute prefix.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        let key = strip_attr_prefix(key);
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Sets or replaces an attribute.
    pub fn set_attribute(&mut self, key: &str, value: impl Into<String>) {
        let key = strip_attr_prefix(key);
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key.to_string(), value)),
        }
    }

    /// The `ID` attribute.
    pub fn id(&self) -> Option<&str> {
        self.attribute("ID")
    }

    /// Text content, trimmed. Blank text counts as absent.
    pub fn text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// True for group occurrences (numeric tags).
    pub fn is_occurrence(&self) -> bool {
        is_numeric_tag(&self.tag)
    }

    /// True for group nodes.
    pub fn is_group(&self) -> bool {
        self.children.first().is_some_and(Node::is_occurrence)
    }

    /// True for leaf values: text without child elements.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// The element occurrences this node stands for: a group's occurrences,
    /// or the node itself.
    pub fn elements(&self) -> std::slice::Iter<'_, Node> {
        if self.is_group() {
            self.children.iter()
        } else {
            std::slice::from_ref(self).iter()
        }
    }

    /// The direct child (or group) with `tag`.
    pub fn child(&self, tag: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// The first element occurrence among the direct children with `tag`.
    pub fn first_element(&self, tag: &str) -> Option<&Node> {
        self.child(tag).and_then(|c| c.elements().next())
    }

    /// Trimmed text of the first direct child element with `tag`.
    pub fn child_text(&self, tag: &str) -> Option<&str> {
        self.first_element(tag).and_then(Node::text)
    }

    /// Total number of nodes in this subtree, including the node itself.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Node::node_count).sum::<usize>()
    }
}

/// Removes the attribute prefix from a key, if present.
pub fn strip_attr_prefix(key: &str) -> &str {
    key.strip_prefix(ATTR_PREFIX).unwrap_or(key)
}
