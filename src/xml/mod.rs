//! XML parts as node trees.
//!
//! Every OFD part is read into a [`Node`] tree by [`parse_xml`] and queried
//! through the functions in [`query`].

mod builder;
mod node;
pub mod query;
pub mod tags;

pub use builder::parse_xml;
pub use node::{strip_attr_prefix, Node};
pub use query::{find_all_by_tag, find_attribute, find_by_id, find_first_by_tag, find_text};
