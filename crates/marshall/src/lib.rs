//! Schema-driven mapping between XML documents and attribute-style access.
//!
//! A [`Schema`] declares a document's tag hierarchy once: the root, which tags
//! nest under which, which tags are unique, and which XML attributes unique
//! tags carry. A [`Mapping`] bound to that schema then reads and writes the
//! document through plain names (`"date"`, `"read.select.category"`), creating
//! missing elements on write and refusing to guess when a repeatable tag has
//! several instances.
//!
//! # Example
//!
//! ```rust
//! use marshall::{Mapping, Schema};
//!
//! let schema = Schema::builder("SkyRequest", "requestCollection")
//!     .namespace("http://dwd.de/sky")
//!     .children("requestCollection", ["read"])
//!     .children("read", ["select"])
//!     .children("select", ["reference_date"])
//!     .xml_name("reference_date", "referenceDate")
//!     .unique(["read", "select", "reference_date"])
//!     .attributes("read", ["database"])
//!     .attributes("select", ["category"])
//!     .build()
//!     .unwrap();
//!
//! let mut request = Mapping::new(schema);
//! request.set("database", "roma").unwrap();
//! request.set("category", "c3_main_fc_rout").unwrap();
//! request.set("reference_date", 2013041600).unwrap();
//!
//! let xml = request.to_xml_string().unwrap();
//! assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#));
//! assert!(xml.contains("<referenceDate>2013041600</referenceDate>"));
//! ```
//!
//! # Modules
//!
//! - [`schema`]: hierarchy descriptors and name resolution
//! - [`resolver`]: walking and building the live tree
//! - [`validate`]: load-time checks of parsed documents
//! - [`mapping`]: the [`Mapping`] instance
//! - [`serializer`]: rendering, the correction pass, and export

pub mod error;
mod macros;
pub mod mapping;
pub mod resolver;
pub mod schema;
pub mod serializer;
pub mod validate;

// Re-export main types
pub use error::{DefinitionError, Error, ParseError, Result};
pub use mapping::{Mapping, Source};
pub use resolver::{NodeKind, Resolved};
pub use schema::{
    AttributeAlias, AttributeDecl, RESERVED_NAMES, Schema, SchemaBuilder, SchemaDefinition,
    TagDecl, Target,
};
pub use serializer::{CANONICAL_DECLARATION, correct};

pub use marshall_xml::{CompactBackend, QuickXmlBackend, XmlBackend, XmlDocument, XmlElement};

#[doc(hidden)]
pub mod __private {
    pub use once_cell::sync::Lazy;
}
