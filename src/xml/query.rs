//! Read-only queries over node trees.
//!
//! Every query accepts an absent node and answers "not found". Traversal is
//! depth-first pre-order and the first match wins. Group occurrences carry
//! numeric tags and match as their parent group's tag.

use super::node::Node;

/// Returns the node itself or the first descendant whose tag is `tag`.
///
/// A repeated or multi-valued tag yields its group node; use
/// [`Node::elements`] to walk the occurrences.
pub fn find_first_by_tag<'a>(node: Option<&'a Node>, tag: &str) -> Option<&'a Node> {
    let node = node?;
    first_by_tag(node, &node.tag, tag)
}

fn first_by_tag<'a>(node: &'a Node, effective: &str, tag: &str) -> Option<&'a Node> {
    if effective == tag {
        return Some(node);
    }
    node.children.iter().find_map(|child| {
        let child_tag = if child.is_occurrence() {
            effective
        } else {
            child.tag.as_str()
        };
        first_by_tag(child, child_tag, tag)
    })
}

/// Returns every element occurrence with `tag`, in document order.
pub fn find_all_by_tag<'a>(node: Option<&'a Node>, tag: &str) -> Vec<&'a Node> {
    let mut found = Vec::new();
    if let Some(node) = node {
        all_by_tag(node, &node.tag, tag, &mut found);
    }
    found
}

fn all_by_tag<'a>(node: &'a Node, effective: &str, tag: &str, found: &mut Vec<&'a Node>) {
    if effective == tag && !node.is_group() {
        found.push(node);
    }
    for child in &node.children {
        let child_tag = if child.is_occurrence() {
            effective
        } else {
            child.tag.as_str()
        };
        all_by_tag(child, child_tag, tag, found);
    }
}

/// Returns the value of attribute `key` on the node, or else on the first
/// descendant that has it.
pub fn find_attribute<'a>(node: Option<&'a Node>, key: &str) -> Option<&'a str> {
    let node = node?;
    node.attribute(key)
        .or_else(|| node.children.iter().find_map(|c| find_attribute(Some(c), key)))
}

/// Returns the node itself or the first descendant whose own `ID` attribute
/// equals `id`.
pub fn find_by_id<'a>(node: Option<&'a Node>, id: &str) -> Option<&'a Node> {
    let node = node?;
    if node.id() == Some(id) {
        return Some(node);
    }
    node.children.iter().find_map(|c| find_by_id(Some(c), id))
}

/// Returns the first occurrence of a direct child with `tag`.
pub fn first_child_by_tag<'a>(node: Option<&'a Node>, tag: &str) -> Option<&'a Node> {
    node?.first_element(tag)
}

/// Trimmed text of the first element with `tag` at or below `node`.
pub fn find_text<'a>(node: Option<&'a Node>, tag: &str) -> Option<&'a str> {
    find_first_by_tag(node, tag)
        .and_then(|n| n.elements().next())
        .and_then(Node::text)
}
