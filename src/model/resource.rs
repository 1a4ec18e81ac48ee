//! Resources shared by pages: fonts, media, drawing parameters, templates.

use crate::xml::tags::{attr, tag};
use crate::xml::{find_all_by_tag, find_by_id, Node};
use serde::Serialize;

/// A parsed resource part (`PublicRes.xml` or `DocumentRes.xml`).
#[derive(Debug, Clone, Serialize)]
pub struct ResourcePart {
    /// Package path of the part.
    pub part: String,
    /// Directory that resource file references are relative to.
    pub base_dir: String,
    pub node: Node,
}

impl ResourcePart {
    /// Finds a resource by `ID`.
    pub fn find(&self, id: &str) -> Option<&Node> {
        find_by_id(Some(&self.node), id)
    }

    pub fn fonts(&self) -> Vec<&Node> {
        find_all_by_tag(Some(&self.node), tag::FONT)
    }

    pub fn multimedia(&self) -> Vec<&Node> {
        find_all_by_tag(Some(&self.node), tag::MULTI_MEDIA)
    }

    pub fn draw_params(&self) -> Vec<&Node> {
        find_all_by_tag(Some(&self.node), tag::DRAW_PARAM)
    }
}

/// A font declared in a resource part.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FontResource {
    pub id: String,
    pub font_name: String,
    pub family_name: Option<String>,
    pub charset: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub serif: bool,
    pub fixed_width: bool,
    /// Package path of the embedded font file.
    pub file: Option<String>,
}

impl FontResource {
    /// Reads a `ofd:Font` element. `file` is resolved by the caller.
    pub fn from_node(node: &Node) -> Option<Self> {
        let flag = |key: &str| node.attribute(key) == Some("true");
        Some(Self {
            id: node.id()?.to_string(),
            font_name: node.attribute(attr::FONT_NAME).unwrap_or_default().to_string(),
            family_name: node.attribute(attr::FAMILY_NAME).map(str::to_string),
            charset: node.attribute(attr::CHARSET).map(str::to_string),
            bold: flag(attr::BOLD),
            italic: flag(attr::ITALIC),
            serif: flag(attr::SERIF),
            fixed_width: flag(attr::FIXED_WIDTH),
            file: None,
        })
    }
}

/// Receives fonts as resources are assembled.
///
/// Installing a loader is how callers register embedded fonts with a
/// renderer; `data` is the font file when one is embedded.
pub trait FontLoader: Send + Sync {
    fn load(&self, font: &FontResource, data: Option<&[u8]>);
}

/// A template page declared in `ofd:CommonData`.
#[derive(Debug, Clone, Serialize)]
pub struct TemplatePage {
    pub id: String,
    /// `Background` or `Foreground` stacking.
    pub z_order: Option<String>,
    pub part: String,
    /// Parsed template content; absent when the part is missing or broken.
    pub node: Option<Node>,
}

/// Document information from `ofd:DocInfo`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Metadata {
    pub doc_id: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub abstract_text: Option<String>,
    /// Creation date as written (`YYYY-MM-DD`)
    pub created: Option<String>,
    /// Last modified date as written
    pub modified: Option<String>,
    pub creator: Option<String>,
    pub creator_version: Option<String>,
    pub keywords: Vec<String>,
    /// `ofd:CustomData` entries as (name, value)
    pub custom_data: Vec<(String, String)>,
    /// OFD format version
    pub format_version: Option<String>,
    pub doc_type: Option<String>,
}

impl Metadata {
    /// Reads the first `ofd:DocInfo` of a manifest.
    pub fn from_manifest(manifest: &Node) -> Self {
        let mut metadata = Self {
            format_version: manifest.attribute(attr::VERSION).map(str::to_string),
            doc_type: manifest.attribute(attr::DOC_TYPE).map(str::to_string),
            ..Self::default()
        };

        let Some(info) = find_all_by_tag(Some(manifest), tag::DOC_INFO).into_iter().next() else {
            return metadata;
        };

        let text = |name: &str| info.child_text(name).map(str::to_string);
        metadata.doc_id = text("ofd:DocID");
        metadata.title = text("ofd:Title");
        metadata.author = text("ofd:Author");
        metadata.subject = text("ofd:Subject");
        metadata.abstract_text = text("ofd:Abstract");
        metadata.created = text("ofd:CreationDate");
        metadata.modified = text("ofd:ModDate");
        metadata.creator = text("ofd:Creator");
        metadata.creator_version = text("ofd:CreatorVersion");
        metadata.keywords = find_all_by_tag(Some(info), "ofd:Keyword")
            .into_iter()
            .filter_map(Node::text)
            .map(str::to_string)
            .collect();
        metadata.custom_data = find_all_by_tag(Some(info), "ofd:CustomData")
            .into_iter()
            .map(|d| {
                (
                    d.attribute("Name").unwrap_or_default().to_string(),
                    d.text().unwrap_or_default().to_string(),
                )
            })
            .collect();

        metadata
    }
}

/// An entry of the outline (bookmark) tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutlineItem {
    pub title: String,
    pub expanded: bool,
    /// Target page ID of the first `Goto` action.
    pub page_id: Option<String>,
    pub children: Vec<OutlineItem>,
}

impl OutlineItem {
    /// Reads an `ofd:OutlineElem` occurrence and its nested entries.
    pub fn from_node(node: &Node) -> Self {
        let page_id = node
            .child(tag::ACTIONS)
            .and_then(|actions| find_all_by_tag(Some(actions), tag::DEST).into_iter().next())
            .and_then(|dest| dest.attribute(attr::PAGE_ID))
            .map(str::to_string);

        Self {
            title: node.attribute(attr::TITLE).unwrap_or_default().to_string(),
            expanded: node.attribute(attr::EXPANDED) != Some("false"),
            page_id,
            children: node
                .child(tag::OUTLINE_ELEM)
                .map(|group| group.elements().map(OutlineItem::from_node).collect())
                .unwrap_or_default(),
        }
    }

    /// Number of entries in this subtree, including this one.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(OutlineItem::count).sum::<usize>()
    }
}
