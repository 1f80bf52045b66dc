//! Whitespace-preserving, line-tracked XML for WiX source conversion.
//!
//! This crate wraps [`quick-xml`] to load a document into a mutable arena
//! tree ([`Document`]) where every node remembers the line it came from and
//! every run of insignificant whitespace survives as a text node. Converters
//! rewrite the tree in place and [`to_xml_string`] writes it back out.
//!
//! # Example
//!
//! ```rust
//! use wix_xml::{parse, to_xml_string, QName};
//!
//! let mut doc = parse(r#"<Wix xmlns="http://wixtoolset.org/schemas/v4/wxs">
//!   <Tag Regid="example.com"/>
//! </Wix>"#).unwrap();
//!
//! let root = doc.root_element().unwrap();
//! let tag = doc.element_children(root)[0];
//! assert_eq!(doc.line(tag), 2);
//!
//! let element = doc.element_mut(tag).unwrap();
//! element.name = QName::in_namespace("http://wixtoolset.org/schemas/v4/wxs", "SoftwareTag");
//!
//! assert!(to_xml_string(&doc).contains("<SoftwareTag Regid=\"example.com\"/>"));
//! ```
//!
//! Namespace prefixes are resolved while loading. Names are compared by
//! namespace and local name; the source prefix is only a hint the writer
//! tries to reuse.

pub mod error;
pub mod line_index;
pub mod parser;
pub mod types;
pub mod writer;

// Re-export main types
pub use error::{Error, Result};
pub use line_index::LineIndex;
pub use parser::{normalize_newlines, parse};
pub use types::{
    Attribute, Document, Element, NodeData, NodeId, NodeKind, QName, Text, TextKind,
    XML_NAMESPACE, XMLNS_NAMESPACE, XmlDeclaration, is_xml_whitespace,
};
pub use writer::to_xml_string;
