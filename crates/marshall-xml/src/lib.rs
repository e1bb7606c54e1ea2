//! Owned XML trees for General Marshall.
//!
//! This crate wraps [`quick-xml`] to provide a small element tree
//! ([`XmlElement`]) that the mapping layer can navigate and mutate, plus the
//! backends that turn it back into text.
//!
//! # Overview
//!
//! The main types are:
//! - [`XmlDocument`]: A parsed document holding its root element
//! - [`XmlElement`]: An element with name, attributes, text, and children
//! - [`XmlAttribute`]: A qualified attribute name and its value
//! - [`XmlBackend`]: A parser/serializer pair; [`QuickXmlBackend`] and
//!   [`CompactBackend`] are provided
//!
//! # Example
//!
//! ```rust
//! use marshall_xml::{parse, XmlBackend, QuickXmlBackend};
//!
//! let mut xml = parse(r#"<request version="1.0">
//!   <read database="roma"/>
//! </request>"#).unwrap();
//!
//! assert_eq!(xml.root.name, "request");
//! assert_eq!(xml.root.get_attribute("version"), Some("1.0"));
//!
//! let reads = xml.root.get_children("read");
//! assert_eq!(reads.len(), 1);
//! assert_eq!(reads[0].get_attribute("database"), Some("roma"));
//!
//! xml.root.set_attribute("version", "2.0");
//! let text = QuickXmlBackend.serialize(&xml).unwrap();
//! assert!(text.contains(r#"version="2.0""#));
//! ```

pub mod backend;
pub mod error;
pub mod parser;
pub mod types;
pub mod writer;

// Re-export main types
pub use backend::{CompactBackend, QuickXmlBackend, XmlBackend};
pub use error::{Error, Result};
pub use parser::parse;
pub use types::{XmlAttribute, XmlDocument, XmlElement};
