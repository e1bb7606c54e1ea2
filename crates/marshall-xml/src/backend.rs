//! Pluggable XML backends.
//!
//! A backend pairs a parser with a serializer. The mapping layer only talks to
//! XML through this trait, so it can run against backends whose serialization
//! fidelity differs.

use crate::{Result, XmlDocument, parser, writer};
use std::fmt;

/// Parse and serialize XML documents.
pub trait XmlBackend: fmt::Debug + Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Parse a document from text.
    fn parse(&self, content: &str) -> Result<XmlDocument>;

    /// Serialize a document to text.
    fn serialize(&self, document: &XmlDocument) -> Result<String>;
}

/// Full-featured backend: indented output with a complete declaration.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuickXmlBackend;

impl XmlBackend for QuickXmlBackend {
    fn name(&self) -> &'static str {
        "quick-xml"
    }

    fn parse(&self, content: &str) -> Result<XmlDocument> {
        parser::parse(content)
    }

    fn serialize(&self, document: &XmlDocument) -> Result<String> {
        writer::write_pretty(document)
    }
}

/// Minimal backend: compact single-line output.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompactBackend;

impl XmlBackend for CompactBackend {
    fn name(&self) -> &'static str {
        "compact"
    }

    fn parse(&self, content: &str) -> Result<XmlDocument> {
        parser::parse(content)
    }

    fn serialize(&self, document: &XmlDocument) -> Result<String> {
        writer::write_compact(document)
    }
}
