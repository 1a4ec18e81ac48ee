//! Document model.
//!
//! The aggregate produced by the assembler and read by renderers. Parts keep
//! their parsed node trees; typed views (pages, fonts, signatures, outlines)
//! sit alongside them.

mod document;
mod media;
mod page;
mod resource;
mod signature;

pub use document::*;
pub use media::*;
pub use page::*;
pub use resource::*;
pub use signature::*;
