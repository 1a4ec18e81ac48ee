//! OFD package assembler.
//!
//! OFD files are ZIP archives of cross-referencing XML parts (GB/T 33190).
//! `OFD.xml` names the document root; the root names pages, resources,
//! templates, outlines and annotations; the signature list names seal
//! signatures whose stamps point back at pages.

mod container;
pub mod paths;

pub use container::OfdContainer;

use crate::error::{Error, Result};
use crate::model::{
    Document, FontLoader, FontResource, MediaStore, Metadata, OutlineItem, Page, ResourcePart,
    SignatureRecord, StampAnnotation, TemplatePage,
};
use crate::parse_options::ParseOptions;
use crate::ses;
use crate::xml::tags::{attr, tag};
use crate::xml::{find_all_by_tag, find_first_by_tag, find_text, parse_xml, Node};
use bytes::Bytes;
use container::names;
use rayon::prelude::*;
use std::io::{Read, Seek};
use std::path::Path;
use std::sync::Arc;

/// Below this many pages, page parts are parsed on the calling thread.
const PARALLEL_THRESHOLD: usize = 4;

/// OFD document parser.
pub struct OfdParser {
    container: OfdContainer,
    options: ParseOptions,
    /// Seal-document nesting level; 0 for the outermost package.
    depth: usize,
    font_loader: Option<Arc<dyn FontLoader>>,
}

impl OfdParser {
    /// Opens an OFD document from a file path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(OfdContainer::open(path)?))
    }

    /// Opens an OFD document from a reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        Ok(Self::new(OfdContainer::from_reader(reader)?))
    }

    /// Opens an OFD document from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Ok(Self::new(OfdContainer::from_bytes(data)?))
    }

    fn new(container: OfdContainer) -> Self {
        Self {
            container,
            options: ParseOptions::default(),
            depth: 0,
            font_loader: None,
        }
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Installs a loader that receives every font as resources are read.
    pub fn with_font_loader(mut self, loader: Arc<dyn FontLoader>) -> Self {
        self.font_loader = Some(loader);
        self
    }

    fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Parses the package into the document model.
    pub fn parse(mut self) -> Result<Document> {
        let mut document = Document::new();

        self.parse_manifest(&mut document)?;
        let root_dir = self.parse_document_root(&mut document)?;

        let signatures = self.parse_signatures(&mut document);
        self.absorb(signatures)?;

        self.parse_pages(&mut document, &root_dir)?;

        let resources = self.parse_resources(&mut document, &root_dir);
        self.absorb(resources)?;
        let templates = self.parse_templates(&mut document, &root_dir);
        self.absorb(templates)?;
        parse_outlines(&mut document);
        let annotations = self.parse_annotations(&mut document, &root_dir);
        self.absorb(annotations)?;

        log::debug!(
            "assembled {} pages, {} signatures, {} fonts (depth {})",
            document.pages.len(),
            document.signatures.len(),
            document.fonts.len(),
            self.depth
        );

        document.media = MediaStore::new(self.container);
        Ok(document)
    }

    /// Stage 1: `OFD.xml`.
    fn parse_manifest(&mut self, document: &mut Document) -> Result<()> {
        let entry = self
            .container
            .entry_names()
            .iter()
            .find(|name| paths::normalize(name).eq_ignore_ascii_case(names::MANIFEST))
            .cloned()
            .ok_or_else(|| Error::MissingRequiredPart(names::MANIFEST.to_string()))?;

        let text = self.container.read_text(&entry)?;
        let manifest = parse_xml(&text, &entry)?;
        document.metadata = Metadata::from_manifest(&manifest);
        document.manifest = Some(manifest);
        Ok(())
    }

    /// Stage 2: the document root. Returns its directory.
    fn parse_document_root(&mut self, document: &mut Document) -> Result<String> {
        let reference = doc_body(document.manifest.as_ref())
            .and_then(|body| body.child_text(tag::DOC_ROOT))
            .map(str::to_string)
            .ok_or_else(|| Error::MissingRequiredPart(tag::DOC_ROOT.to_string()))?;

        let (part, root) = match self.read_node(names::MANIFEST, &paths::normalize(&reference), &reference) {
            Ok(found) => found,
            Err(Error::UnresolvedReference { .. }) => {
                return Err(Error::MissingRequiredPart(reference));
            }
            Err(e) => return Err(e),
        };

        log::debug!("document root {part}");
        let root_dir = paths::parent_dir(&part).to_string();
        document.root_part = part;
        document.document_root = Some(root);
        Ok(root_dir)
    }

    /// Stage 3: signature list, signatures and their seals.
    fn parse_signatures(&mut self, document: &mut Document) -> Result<()> {
        let Some(reference) = doc_body(document.manifest.as_ref())
            .and_then(|body| body.child_text(tag::SIGNATURES))
            .map(str::to_string)
        else {
            log::debug!("no signature list");
            return Ok(());
        };

        let (list_part, list) =
            self.read_node(names::MANIFEST, &paths::normalize(&reference), &reference)?;
        let list_dir = paths::parent_dir(&list_part).to_string();

        let entries: Vec<(String, Option<String>, String)> = find_all_by_tag(Some(&list), tag::SIGNATURE)
            .into_iter()
            .filter_map(|entry| {
                Some((
                    entry.id().unwrap_or_default().to_string(),
                    entry.attribute(attr::TYPE).map(str::to_string),
                    entry.attribute(attr::BASE_LOC)?.to_string(),
                ))
            })
            .collect();
        document.signature_list = Some(list);

        for (id, kind, base_loc) in entries {
            let mut record = SignatureRecord::new(id, kind, paths::reroot(&list_dir, &base_loc));
            if let Err(e) = self.parse_signature(&list_part, &mut record, &base_loc) {
                record.decode_error.get_or_insert_with(|| e.to_string());
                self.absorb(Err::<(), _>(e))?;
            }
            document.signatures.push(record);
        }
        Ok(())
    }

    fn parse_signature(&mut self, list_part: &str, record: &mut SignatureRecord, base_loc: &str) -> Result<()> {
        let (part, node) = self.read_node(list_part, &record.part, base_loc)?;
        record.part = part;
        record.stamps = StampAnnotation::collect(&node);
        let value_ref = find_text(Some(&node), tag::SIGNED_VALUE).map(str::to_string);
        record.node = Some(node);

        let value_ref = value_ref.ok_or_else(|| Error::malformed(&record.part, "no ofd:SignedValue"))?;
        let value_path = paths::resolve(paths::parent_dir(&record.part), &value_ref);
        let entry = self
            .locate(&value_path, &value_ref)
            .ok_or_else(|| unresolved(&record.part, &value_ref))?;
        record.signed_value = Bytes::from(self.container.read_binary(&entry)?);
        record.signed_value_part = Some(entry);

        match ses::decode_signed_value(&record.signed_value) {
            Ok(seal) => record.set_seal(seal),
            Err(e) => {
                log::warn!("cannot decode seal of signature {}: {e}", record.id);
                record.decode_error = Some(e.to_string());
                return Ok(());
            }
        }
        if record.outcome != ses::VerificationOutcome::Valid {
            log::warn!("signature {} did not verify: {:?}", record.id, record.outcome);
        }

        let nested = self.parse_seal_document(record);
        self.absorb(nested)?;
        Ok(())
    }

    /// Parses a vector-document seal picture as a nested package.
    fn parse_seal_document(&self, record: &mut SignatureRecord) -> Result<()> {
        let Some(picture) = record
            .seal
            .as_ref()
            .map(|seal| &seal.seal.picture)
            .filter(|picture| picture.is_document())
        else {
            return Ok(());
        };
        if !self.options.decode_seal_documents {
            return Ok(());
        }
        if self.depth >= self.options.max_seal_depth {
            return Err(Error::SealNestingTooDeep(self.options.max_seal_depth));
        }

        // Nested package failures are never fatal to this document
        match self.parse_nested(picture.data.to_vec()) {
            Ok(nested) => {
                record.seal_document = Some(Box::new(nested));
                Ok(())
            }
            Err(e) => {
                let err = Error::SealDocument {
                    signature: record.id.clone(),
                    message: e.to_string(),
                };
                record.decode_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    fn parse_nested(&self, data: Vec<u8>) -> Result<Document> {
        let mut parser = OfdParser::from_bytes(data)?
            .with_options(self.options.clone())
            .with_depth(self.depth + 1);
        if let Some(loader) = &self.font_loader {
            parser = parser.with_font_loader(Arc::clone(loader));
        }
        parser.parse()
    }

    /// Stage 4: pages in declaration order, linked to their signatures.
    fn parse_pages(&mut self, document: &mut Document, root_dir: &str) -> Result<()> {
        let declared: Vec<(String, String)> = {
            let pages = find_first_by_tag(document.document_root.as_ref(), tag::PAGES);
            find_all_by_tag(pages, tag::PAGE)
                .into_iter()
                .map(|page| {
                    (
                        page.id().unwrap_or_default().to_string(),
                        page.attribute(attr::BASE_LOC).unwrap_or_default().to_string(),
                    )
                })
                .collect()
        };

        // Archive reads are sequential; XML parsing can fan out.
        let mut sources = Vec::with_capacity(declared.len());
        for (index, (id, base_loc)) in declared.into_iter().enumerate() {
            let path = paths::resolve(root_dir, &base_loc);
            let source = self.read_part(&document.root_part, &path, &base_loc);
            sources.push((Page::new(index, id, path), source));
        }

        let loaded: Vec<(Page, Option<Error>)> =
            if self.options.parallel && sources.len() >= PARALLEL_THRESHOLD {
                sources
                    .into_par_iter()
                    .map(|(page, source)| load_page(page, source))
                    .collect()
            } else {
                sources
                    .into_iter()
                    .map(|(page, source)| load_page(page, source))
                    .collect()
            };

        for (mut page, error) in loaded {
            if let Some(e) = error {
                self.absorb(Err::<(), _>(e))?;
            }
            page.template_ids = find_all_by_tag(page.node.as_ref(), tag::TEMPLATE)
                .into_iter()
                .filter_map(|t| t.attribute(attr::TEMPLATE_ID))
                .map(str::to_string)
                .collect();
            page.signatures = document
                .signatures
                .iter()
                .enumerate()
                .filter(|(_, signature)| signature.is_on_page(&page.id))
                .map(|(i, _)| i)
                .collect();
            document.pages.push(page);
        }
        Ok(())
    }

    /// Stage 5a: resource parts and fonts.
    fn parse_resources(&mut self, document: &mut Document, root_dir: &str) -> Result<()> {
        let common = common_data(document.document_root.as_ref());
        let document_res = find_text(common, tag::DOCUMENT_RES).map(str::to_string);
        let public_res = find_text(common, tag::PUBLIC_RES).map(str::to_string);

        if let Some(reference) = document_res {
            let part = self.parse_resource_part(&document.root_part, root_dir, &reference);
            document.document_res = self.absorb(part)?;
        }
        if let Some(reference) = public_res {
            let part = self.parse_resource_part(&document.root_part, root_dir, &reference);
            document.public_res = self.absorb(part)?;
        }

        let mut fonts: Vec<FontResource> = Vec::new();
        for res in [document.document_res.as_ref(), document.public_res.as_ref()]
            .into_iter()
            .flatten()
        {
            for node in res.fonts() {
                let Some(mut font) = FontResource::from_node(node) else {
                    continue;
                };
                if fonts.iter().any(|f| f.id == font.id) {
                    continue;
                }
                font.file = node
                    .child_text(tag::FONT_FILE)
                    .map(|file| paths::resolve(&res.base_dir, file));
                fonts.push(font);
            }
        }

        if let Some(loader) = self.font_loader.clone() {
            for font in &fonts {
                let data = match font.file.as_deref().filter(|_| self.options.load_fonts) {
                    Some(file) => match self.read_binary(&document.root_part, file) {
                        Ok(data) => Some(data),
                        Err(e) => {
                            log::warn!("font {} has no readable file: {e}", font.id);
                            None
                        }
                    },
                    None => None,
                };
                loader.load(font, data.as_deref());
            }
        }

        document.fonts = fonts;
        Ok(())
    }

    fn parse_resource_part(&mut self, from: &str, root_dir: &str, reference: &str) -> Result<ResourcePart> {
        let (part, node) = self.read_node(from, &paths::resolve(root_dir, reference), reference)?;
        let part_dir = paths::parent_dir(&part);
        let base_dir = match node.attribute(attr::BASE_LOC) {
            Some(base) => paths::resolve(part_dir, base),
            None => part_dir.to_string(),
        };
        Ok(ResourcePart { part, base_dir, node })
    }

    /// Stage 5b: template pages.
    fn parse_templates(&mut self, document: &mut Document, root_dir: &str) -> Result<()> {
        let declared: Vec<(String, Option<String>, String)> =
            find_all_by_tag(common_data(document.document_root.as_ref()), tag::TEMPLATE_PAGE)
                .into_iter()
                .filter_map(|t| {
                    Some((
                        t.id()?.to_string(),
                        t.attribute(attr::Z_ORDER).map(str::to_string),
                        t.attribute(attr::BASE_LOC)?.to_string(),
                    ))
                })
                .collect();

        for (id, z_order, base_loc) in declared {
            let path = paths::resolve(root_dir, &base_loc);
            let read = self.read_node(&document.root_part, &path, &base_loc);
            let (part, node) = match self.absorb(read)? {
                Some((part, node)) => (part, Some(node)),
                None => (path, None),
            };
            document.templates.push(TemplatePage { id, z_order, part, node });
        }
        Ok(())
    }

    /// Stage 5d: annotation index and per-page annotation parts.
    fn parse_annotations(&mut self, document: &mut Document, root_dir: &str) -> Result<()> {
        let Some(reference) =
            find_text(document.document_root.as_ref(), tag::ANNOTATIONS).map(str::to_string)
        else {
            return Ok(());
        };

        let (index_part, index) =
            self.read_node(&document.root_part, &paths::resolve(root_dir, &reference), &reference)?;
        let index_dir = paths::parent_dir(&index_part).to_string();

        let entries: Vec<(String, String)> = find_all_by_tag(Some(&index), tag::PAGE)
            .into_iter()
            .filter_map(|entry| {
                Some((
                    entry.attribute(attr::PAGE_ID)?.to_string(),
                    entry.child_text(tag::FILE_LOC)?.to_string(),
                ))
            })
            .collect();
        document.annotation_index = Some(index);

        for (page_id, file_loc) in entries {
            let read = self.read_node(&index_part, &paths::resolve(&index_dir, &file_loc), &file_loc);
            let Some((_, node)) = self.absorb(read)? else {
                continue;
            };
            match document.pages.iter_mut().find(|p| p.id == page_id) {
                Some(page) => page.annotations = Some(node),
                None => log::warn!("annotations for unknown page {page_id}"),
            }
        }
        Ok(())
    }

    /// Finds the entry for a re-rooted path, falling back to the reference
    /// as written.
    fn locate(&self, path: &str, reference: &str) -> Option<String> {
        self.container
            .find_entry(path)
            .or_else(|| self.container.find_entry(reference))
            .map(str::to_string)
    }

    /// Reads a part as text. Returns the entry name with the text.
    fn read_part(&mut self, from: &str, path: &str, reference: &str) -> Result<(String, String)> {
        if reference.trim().is_empty() {
            return Err(unresolved(from, reference));
        }
        let entry = self
            .locate(path, reference)
            .ok_or_else(|| unresolved(from, reference))?;
        let text = self.container.read_text(&entry)?;
        Ok((entry, text))
    }

    fn read_node(&mut self, from: &str, path: &str, reference: &str) -> Result<(String, Node)> {
        let (entry, text) = self.read_part(from, path, reference)?;
        let node = parse_xml(&text, &entry)?;
        Ok((entry, node))
    }

    fn read_binary(&mut self, from: &str, path: &str) -> Result<Vec<u8>> {
        let entry = self.locate(path, path).ok_or_else(|| unresolved(from, path))?;
        self.container.read_binary(&entry)
    }

    /// Lenient mode logs and drops optional-part failures; strict mode
    /// returns them.
    fn absorb<T>(&self, result: Result<T>) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(e) if self.options.is_lenient() && !e.is_fatal() => {
                log::warn!("{e}");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Stage 5c: outline tree from the document root.
fn parse_outlines(document: &mut Document) {
    let outlines = find_first_by_tag(document.document_root.as_ref(), tag::OUTLINES);
    document.outlines = outlines
        .and_then(|o| o.child(tag::OUTLINE_ELEM))
        .map(|group| group.elements().map(OutlineItem::from_node).collect())
        .unwrap_or_default();
}

fn load_page(mut page: Page, source: Result<(String, String)>) -> (Page, Option<Error>) {
    let parsed = source.and_then(|(entry, text)| Ok((parse_xml(&text, &entry)?, entry)));
    match parsed {
        Ok((node, entry)) => {
            page.part = entry;
            page.node = Some(node);
            (page, None)
        }
        Err(e) => (page, Some(e)),
    }
}

/// The first `ofd:DocBody` of the manifest.
fn doc_body(manifest: Option<&Node>) -> Option<&Node> {
    let bodies = find_first_by_tag(manifest, tag::DOC_BODY)?;
    if bodies.is_group() {
        log::debug!("{} document bodies; using the first", bodies.children.len());
    }
    bodies.elements().next()
}

/// The first `ofd:CommonData` of a document root.
fn common_data(root: Option<&Node>) -> Option<&Node> {
    find_first_by_tag(root, tag::COMMON_DATA).and_then(|c| c.elements().next())
}

fn unresolved(from: &str, reference: &str) -> Error {
    Error::UnresolvedReference {
        from: from.to_string(),
        reference: reference.to_string(),
    }
}
