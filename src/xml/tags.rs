//! Tag and attribute names used by OFD parts.
//!
//! The multi-valued table is schema knowledge for OFD (GB/T 33190-2016).
//! It decides which tags are always exposed as groups of numbered
//! occurrences, even when a part contains a single occurrence, so that
//! consumers see the same shape regardless of how many elements a producer
//! wrote. Revise it together with the format revision it targets.

/// Prefix some producers and tools put in front of attribute keys.
///
/// Attribute lookups accept keys with or without it.
pub const ATTR_PREFIX: &str = "@_";

/// Tags that are grouped even when they occur once.
pub const MULTI_VALUED: &[&str] = &[
    "ofd:DocInfo",
    "ofd:CustomData",
    "ofd:Font",
    "ofd:CommonData",
    "ofd:PageArea",
    "ofd:Page",
    "ofd:MaxSignId",
    "ofd:Layer",
    "ofd:PathObject",
    "ofd:TextObject",
    "ofd:Signature",
    "ofd:Reference",
    "ofd:Annot",
    "ofd:AxialShd",
    "ofd:Action",
    "ofd:ImageObject",
    "ofd:StampAnnot",
    "ofd:Clip",
    "ofd:TemplatePage",
    "ofd:OutlineElem",
    "ofd:Parameter",
];

/// Returns true if `tag` is always grouped.
pub fn is_multi_valued(tag: &str) -> bool {
    MULTI_VALUED.contains(&tag)
}

/// Returns true for the synthetic tags of group occurrences ("0", "1", ...).
pub fn is_numeric_tag(tag: &str) -> bool {
    !tag.is_empty() && tag.bytes().all(|b| b.is_ascii_digit())
}

/// Element names.
pub mod tag {
    pub const OFD: &str = "ofd:OFD";
    pub const DOC_BODY: &str = "ofd:DocBody";
    pub const DOC_INFO: &str = "ofd:DocInfo";
    pub const DOC_ROOT: &str = "ofd:DocRoot";
    pub const SIGNATURES: &str = "ofd:Signatures";
    pub const SIGNATURE: &str = "ofd:Signature";
    pub const SIGNED_VALUE: &str = "ofd:SignedValue";
    pub const SIGNED_INFO: &str = "ofd:SignedInfo";
    pub const PROVIDER: &str = "ofd:Provider";
    pub const SIGNATURE_METHOD: &str = "ofd:SignatureMethod";
    pub const SIGNATURE_DATE_TIME: &str = "ofd:SignatureDateTime";
    pub const STAMP_ANNOT: &str = "ofd:StampAnnot";

    pub const DOCUMENT: &str = "ofd:Document";
    pub const COMMON_DATA: &str = "ofd:CommonData";
    pub const PAGE_AREA: &str = "ofd:PageArea";
    pub const PHYSICAL_BOX: &str = "ofd:PhysicalBox";
    pub const APPLICATION_BOX: &str = "ofd:ApplicationBox";
    pub const PUBLIC_RES: &str = "ofd:PublicRes";
    pub const DOCUMENT_RES: &str = "ofd:DocumentRes";
    pub const TEMPLATE_PAGE: &str = "ofd:TemplatePage";
    pub const TEMPLATE: &str = "ofd:Template";
    pub const PAGES: &str = "ofd:Pages";
    pub const PAGE: &str = "ofd:Page";
    pub const AREA: &str = "ofd:Area";
    pub const OUTLINES: &str = "ofd:Outlines";
    pub const OUTLINE_ELEM: &str = "ofd:OutlineElem";
    pub const ACTIONS: &str = "ofd:Actions";
    pub const ACTION: &str = "ofd:Action";
    pub const GOTO: &str = "ofd:Goto";
    pub const DEST: &str = "ofd:Dest";
    pub const ANNOTATIONS: &str = "ofd:Annotations";
    pub const FILE_LOC: &str = "ofd:FileLoc";

    pub const FONTS: &str = "ofd:Fonts";
    pub const FONT: &str = "ofd:Font";
    pub const FONT_FILE: &str = "ofd:FontFile";
    pub const MULTI_MEDIAS: &str = "ofd:MultiMedias";
    pub const MULTI_MEDIA: &str = "ofd:MultiMedia";
    pub const MEDIA_FILE: &str = "ofd:MediaFile";
    pub const DRAW_PARAMS: &str = "ofd:DrawParams";
    pub const DRAW_PARAM: &str = "ofd:DrawParam";

    pub const PATH_OBJECT: &str = "ofd:PathObject";
    pub const CLIP: &str = "ofd:Clip";
    pub const ABBREVIATED_DATA: &str = "ofd:AbbreviatedData";
}

/// Attribute names.
pub mod attr {
    pub const ID: &str = "ID";
    pub const BASE_LOC: &str = "BaseLoc";
    pub const PAGE_REF: &str = "PageRef";
    pub const PAGE_ID: &str = "PageID";
    pub const TEMPLATE_ID: &str = "TemplateID";
    pub const Z_ORDER: &str = "ZOrder";
    pub const FONT_NAME: &str = "FontName";
    pub const FAMILY_NAME: &str = "FamilyName";
    pub const BOLD: &str = "Bold";
    pub const ITALIC: &str = "Italic";
    pub const SERIF: &str = "Serif";
    pub const FIXED_WIDTH: &str = "FixedWidth";
    pub const CHARSET: &str = "Charset";
    pub const RESOURCE_ID: &str = "ResourceID";
    pub const BOUNDARY: &str = "Boundary";
    pub const CTM: &str = "CTM";
    pub const DRAW_PARAM: &str = "DrawParam";
    pub const TITLE: &str = "Title";
    pub const EXPANDED: &str = "Expanded";
    pub const TYPE: &str = "Type";
    pub const SUBTYPE: &str = "Subtype";
    pub const FORMAT: &str = "Format";
    pub const EVENT: &str = "Event";
    pub const VERSION: &str = "Version";
    pub const DOC_TYPE: &str = "DocType";
}
