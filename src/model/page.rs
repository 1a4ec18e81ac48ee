//! Pages of a document.

use crate::path::{decode_path_object, DrawingOperation};
use crate::units::Rect;
use crate::xml::tags::{attr, tag};
use crate::xml::{find_all_by_tag, find_text, Node};
use serde::Serialize;

/// One page, in `ofd:Pages` declaration order.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    /// Zero-based position in the document.
    pub index: usize,
    /// The page `ID`.
    pub id: String,
    /// Package path of the content part.
    pub part: String,
    /// Parsed content; absent when the part is missing or broken.
    pub node: Option<Node>,
    /// `TemplateID`s of the templates applied to this page.
    pub template_ids: Vec<String>,
    /// Indices into [`Document::signatures`](super::Document::signatures)
    /// of the seals stamped on this page.
    pub signatures: Vec<usize>,
    /// Annotation part content for this page.
    pub annotations: Option<Node>,
}

impl Page {
    pub(crate) fn new(index: usize, id: String, part: String) -> Self {
        Self {
            index,
            id,
            part,
            node: None,
            template_ids: Vec::new(),
            signatures: Vec::new(),
            annotations: None,
        }
    }

    /// True if the content part was parsed.
    pub fn is_loaded(&self) -> bool {
        self.node.is_some()
    }

    /// The page's own `PhysicalBox`, if it overrides the document default.
    pub fn physical_box(&self) -> Option<Rect> {
        let area = self.node.as_ref()?.child(tag::AREA)?;
        find_text(Some(area), tag::PHYSICAL_BOX).and_then(Rect::parse)
    }

    /// Layer elements in document order.
    pub fn layers(&self) -> Vec<&Node> {
        find_all_by_tag(self.node.as_ref(), "ofd:Layer")
    }

    pub fn path_objects(&self) -> Vec<&Node> {
        find_all_by_tag(self.node.as_ref(), tag::PATH_OBJECT)
    }

    pub fn text_objects(&self) -> Vec<&Node> {
        find_all_by_tag(self.node.as_ref(), "ofd:TextObject")
    }

    pub fn image_objects(&self) -> Vec<&Node> {
        find_all_by_tag(self.node.as_ref(), "ofd:ImageObject")
    }

    /// Decoded geometry of every path object, in document order.
    pub fn paths(&self) -> Vec<(&Node, Vec<DrawingOperation>)> {
        self.path_objects()
            .into_iter()
            .map(|object| (object, decode_path_object(object)))
            .collect()
    }

    /// Text of every `ofd:TextCode`, in document order.
    pub fn text_codes(&self) -> Vec<&str> {
        find_all_by_tag(self.node.as_ref(), "ofd:TextCode")
            .into_iter()
            .filter_map(Node::text)
            .collect()
    }

    /// Annotation elements from the page's annotation part.
    pub fn annots(&self) -> Vec<&Node> {
        find_all_by_tag(self.annotations.as_ref(), "ofd:Annot")
    }

    /// Resource IDs referenced by objects on this page.
    pub fn resource_refs(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        for object in self
            .image_objects()
            .into_iter()
            .chain(self.text_objects())
            .chain(self.path_objects())
        {
            for key in [attr::RESOURCE_ID, "Font", attr::DRAW_PARAM] {
                if let Some(id) = object.attribute(key) {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
            }
        }
        ids
    }
}
