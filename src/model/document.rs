//! Document structure and read-only queries.

use super::{FontResource, MediaStore, Metadata, OutlineItem, Page, ResourcePart, SignatureRecord, TemplatePage};
use crate::ofd::paths;
use crate::units::Rect;
use crate::xml::tags::tag;
use crate::xml::{find_first_by_tag, find_text, Node};
use bytes::Bytes;
use serde::Serialize;

/// A complete document assembled from an OFD package.
///
/// Populated once by [`OfdParser`](crate::ofd::OfdParser) and read-only
/// afterwards; only the media cache fills in lazily.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Document {
    /// Document metadata
    pub metadata: Metadata,
    /// Parsed `OFD.xml`
    pub manifest: Option<Node>,
    /// Parsed `Document.xml`
    pub document_root: Option<Node>,
    /// Package path of `Document.xml`
    pub root_part: String,
    /// Pages in declaration order
    pub pages: Vec<Page>,
    /// `PublicRes.xml`
    pub public_res: Option<ResourcePart>,
    /// `DocumentRes.xml`
    pub document_res: Option<ResourcePart>,
    /// Fonts from both resource parts
    pub fonts: Vec<FontResource>,
    pub templates: Vec<TemplatePage>,
    /// Parsed `Signatures.xml`
    pub signature_list: Option<Node>,
    pub signatures: Vec<SignatureRecord>,
    pub outlines: Vec<OutlineItem>,
    /// Parsed annotation index (`Annotations.xml`)
    pub annotation_index: Option<Node>,
    #[serde(skip)]
    pub(crate) media: MediaStore,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn page_by_id(&self, id: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == id)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Signatures with a stamp on the page at `index`.
    pub fn signatures_for_page(&self, index: usize) -> Vec<&SignatureRecord> {
        self.page(index)
            .map(|page| {
                page.signatures
                    .iter()
                    .filter_map(|&i| self.signatures.get(i))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// True if every decoded signature verified.
    pub fn all_signatures_valid(&self) -> bool {
        self.signatures.iter().all(|s| s.verified)
    }

    pub fn fonts(&self) -> &[FontResource] {
        &self.fonts
    }

    pub fn font(&self, id: &str) -> Option<&FontResource> {
        self.fonts.iter().find(|f| f.id == id)
    }

    /// Finds a resource by `ID`, document resources first.
    pub fn find_resource(&self, id: &str) -> Option<&Node> {
        self.resource_parts().find_map(|part| part.find(id))
    }

    /// The `ofd:DrawParam` with `id`.
    pub fn draw_param(&self, id: &str) -> Option<&Node> {
        self.resource_parts()
            .flat_map(ResourcePart::draw_params)
            .find(|node| node.id() == Some(id))
    }

    /// The `ofd:MultiMedia` with `id`.
    pub fn multimedia(&self, id: &str) -> Option<&Node> {
        self.resource_parts()
            .flat_map(ResourcePart::multimedia)
            .find(|node| node.id() == Some(id))
    }

    fn resource_parts(&self) -> impl Iterator<Item = &ResourcePart> {
        [self.document_res.as_ref(), self.public_res.as_ref()]
            .into_iter()
            .flatten()
    }

    /// Package path of the media file behind multimedia resource `id`.
    pub fn media_path(&self, id: &str) -> Option<String> {
        self.resource_parts().find_map(|part| {
            let media = part.multimedia().into_iter().find(|n| n.id() == Some(id))?;
            let file = media.child_text(tag::MEDIA_FILE)?;
            Some(paths::resolve(&part.base_dir, file))
        })
    }

    /// Bytes of multimedia resource `id`, read on first use and memoized.
    pub fn load_media(&self, id: &str) -> Option<Bytes> {
        let path = self.media_path(id)?;
        self.media.load(&path)
    }

    /// Reads any package entry through the media cache.
    pub fn load_part(&self, path: &str) -> Option<Bytes> {
        self.media.load(&paths::normalize(path))
    }

    /// Default physical box from `ofd:CommonData/ofd:PageArea`.
    pub fn default_page_box(&self) -> Option<Rect> {
        let area = find_first_by_tag(self.document_root.as_ref(), tag::PAGE_AREA)?;
        find_text(Some(area), tag::PHYSICAL_BOX).and_then(Rect::parse)
    }

    /// Physical box of the page at `index`: its own, else the default.
    pub fn page_box(&self, index: usize) -> Option<Rect> {
        self.page(index)?
            .physical_box()
            .or_else(|| self.default_page_box())
    }

    pub fn templates(&self) -> &[TemplatePage] {
        &self.templates
    }

    pub fn template(&self, id: &str) -> Option<&TemplatePage> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Templates applied to the page at `index`, in reference order.
    pub fn templates_for_page(&self, index: usize) -> Vec<&TemplatePage> {
        self.page(index)
            .map(|page| {
                page.template_ids
                    .iter()
                    .filter_map(|id| self.template(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn outlines(&self) -> &[OutlineItem] {
        &self.outlines
    }

    /// Returns the model as pretty-printed JSON.
    pub fn raw_content(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}
