//! Mapping instances: one live XML tree bound to a schema.

use crate::error::{Error, Result};
use crate::resolver;
use crate::schema::Schema;
use crate::validate::validate_tree;
use marshall_xml::{QuickXmlBackend, XmlBackend, XmlDocument, XmlElement};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where a [`Mapping`] gets its initial tree from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A document holding only the root element.
    Empty,
    /// A file on disk; its path becomes the mapping's `source_file`.
    File(PathBuf),
    /// XML text.
    Text(String),
}

/// An XML document accessed through attribute names.
///
/// Names are resolved against the bound [`Schema`]; see
/// [`resolver`](crate::resolver) for the rules. Two names are handled by the
/// mapping itself:
///
/// - `source_file`: the path the document was loaded from, read/write
/// - `namespace`: the schema's namespace, read-only
///
/// ```rust
/// use marshall::{Mapping, Schema};
///
/// let schema = Schema::builder("Note", "note")
///     .children("note", ["to", "body"])
///     .unique(["to", "body"])
///     .build()
///     .unwrap();
///
/// let mut note = Mapping::new(schema);
/// note.set("to", "Tove").unwrap();
/// assert_eq!(note.get("to").unwrap(), Some("Tove"));
/// assert_eq!(note.get("body").unwrap(), None);
/// ```
pub struct Mapping {
    pub(crate) schema: Arc<Schema>,
    pub(crate) document: XmlDocument,
    pub(crate) source_file: Option<PathBuf>,
    pub(crate) backend: Box<dyn XmlBackend>,
}

impl Mapping {
    /// Open a mapping with the default backend.
    pub fn open(schema: Arc<Schema>, source: Source) -> Result<Self> {
        Self::open_with(schema, source, Box::new(QuickXmlBackend))
    }

    /// Open a mapping that parses and serializes through `backend`.
    pub fn open_with(
        schema: Arc<Schema>,
        source: Source,
        backend: Box<dyn XmlBackend>,
    ) -> Result<Self> {
        let (document, source_file) = match source {
            Source::Empty => (XmlDocument::new(empty_root(&schema)), None),
            Source::Text(text) => (backend.parse(&text)?, None),
            Source::File(path) => {
                let content =
                    std::fs::read_to_string(&path).map_err(|err| Error::io(&path, err))?;
                (backend.parse(&content)?, Some(path))
            }
        };
        validate_tree(&schema, &document.root)?;

        tracing::debug!(
            schema = schema.name(),
            backend = backend.name(),
            source = ?source_file,
            "Opened mapping"
        );
        Ok(Self {
            schema,
            document,
            source_file,
            backend,
        })
    }

    /// An empty document: just the root element.
    pub fn new(schema: Arc<Schema>) -> Self {
        let document = XmlDocument::new(empty_root(&schema));
        Self {
            schema,
            document,
            source_file: None,
            backend: Box::new(QuickXmlBackend),
        }
    }

    /// Parse XML text.
    pub fn parse(schema: Arc<Schema>, content: &str) -> Result<Self> {
        Self::open(schema, Source::Text(content.to_string()))
    }

    /// Load an XML file.
    pub fn load(schema: Arc<Schema>, path: impl AsRef<Path>) -> Result<Self> {
        Self::open(schema, Source::File(path.as_ref().to_path_buf()))
    }

    /// Read the value `name` addresses. Absent values are `Ok(None)`.
    pub fn get(&self, name: &str) -> Result<Option<&str>> {
        match name {
            "source_file" => Ok(self.source_file.as_deref().and_then(Path::to_str)),
            "namespace" => Ok(self.schema.namespace()),
            _ => Ok(resolver::resolve_for_read(&self.schema, &self.document.root, name)?.value()),
        }
    }

    /// Read a value that must be present.
    pub fn require(&self, name: &str) -> Result<&str> {
        self.get(name)?.ok_or_else(|| Error::MissingValue {
            name: name.to_string(),
        })
    }

    /// Store `value` at `name`, creating missing elements on the way.
    pub fn set(&mut self, name: &str, value: impl ToString) -> Result<()> {
        let value = value.to_string();
        match name {
            "source_file" => {
                self.source_file = Some(PathBuf::from(value));
                Ok(())
            }
            "namespace" => Err(read_only(name)),
            _ => resolver::resolve_for_write(&self.schema, &mut self.document.root, name, &value),
        }
    }

    /// Remove what `name` addresses. Returns whether anything was removed.
    pub fn delete(&mut self, name: &str) -> Result<bool> {
        match name {
            "source_file" => Ok(self.source_file.take().is_some()),
            "namespace" => Err(read_only(name)),
            _ => resolver::resolve_for_delete(&self.schema, &mut self.document.root, name),
        }
    }

    /// All instances of the tag `name`.
    pub fn elements(&self, name: &str) -> Result<Vec<&XmlElement>> {
        resolver::resolve_all(&self.schema, &self.document.root, name)
    }

    /// Number of instances of the tag `name`.
    pub fn count(&self, name: &str) -> Result<usize> {
        Ok(self.elements(name)?.len())
    }

    /// Add an instance of the tag `name` and return it for filling in.
    pub fn append(&mut self, name: &str) -> Result<&mut XmlElement> {
        resolver::append(&self.schema, &mut self.document.root, name)
    }

    /// Remove the `index`-th instance of the tag `name`.
    pub fn remove(&mut self, name: &str, index: usize) -> Result<Option<XmlElement>> {
        resolver::remove(&self.schema, &mut self.document.root, name, index)
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn root(&self) -> &XmlElement {
        &self.document.root
    }

    pub fn document(&self) -> &XmlDocument {
        &self.document
    }

    pub fn source_file(&self) -> Option<&Path> {
        self.source_file.as_deref()
    }

    pub fn backend(&self) -> &dyn XmlBackend {
        self.backend.as_ref()
    }
}

impl fmt::Debug for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapping")
            .field("schema", &self.schema.name())
            .field("source_file", &self.source_file)
            .field("backend", &self.backend.name())
            .finish()
    }
}

fn empty_root(schema: &Schema) -> XmlElement {
    let name = schema.root().xml_name.as_str();
    match schema.namespace() {
        Some(namespace) => XmlElement::with_namespace(name, namespace),
        None => XmlElement::new(name),
    }
}

fn read_only(name: &str) -> Error {
    Error::ReadOnlyAttribute {
        name: name.to_string(),
    }
}
