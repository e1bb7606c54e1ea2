//! Error types for schema definition, loading, and attribute access.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for marshall operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the mapping layer.
#[derive(Debug, Error)]
pub enum Error {
    /// The hierarchy definition is malformed.
    #[error("Invalid hierarchy definition: {0}")]
    Definition(#[from] DefinitionError),

    /// The source document could not be parsed or does not match the hierarchy.
    #[error("Failed to parse document: {0}")]
    Parse(#[from] ParseError),

    /// The name does not correspond to any declared tag or attribute.
    #[error("{schema} instance has no attribute '{name}'")]
    UnknownAttribute { schema: String, name: String },

    /// A repeatable tag has several instances, so attribute access cannot pick one.
    #[error("'{name}' is ambiguous: <{parent}> contains {count} <{tag}> elements")]
    AmbiguousTag {
        name: String,
        tag: String,
        parent: String,
        count: usize,
    },

    /// The live tree violates a uniqueness constraint.
    #[error("Invalid structure: {message}")]
    InvalidStructure { message: String },

    /// A definite value was requested but the node is absent.
    #[error("'{name}' has no value")]
    MissingValue { name: String },

    /// The name refers to instance state that cannot be written.
    #[error("'{name}' is read-only")]
    ReadOnlyAttribute { name: String },

    /// The backend failed to render the tree.
    #[error("Failed to serialize document: {0}")]
    Serialize(#[source] marshall_xml::Error),

    /// File access failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The export destination exists and overwriting was not allowed.
    #[error("{} already exists", .path.display())]
    AlreadyExists { path: PathBuf },
}

/// Problems found while validating a hierarchy definition.
#[derive(Debug, Error)]
pub enum DefinitionError {
    /// A tag, attribute, or XML name is not usable.
    #[error("'{name}' is not a valid {kind} name")]
    InvalidName { name: String, kind: &'static str },

    /// A tag is listed under more than one parent.
    #[error("Tag '{tag}' is declared under both '{first}' and '{second}'")]
    DuplicateTag {
        tag: String,
        first: String,
        second: String,
    },

    /// The root tag is listed as somebody's child.
    #[error("Root tag '{root}' cannot be a child of '{parent}'")]
    RootAsChild { root: String, parent: String },

    /// A tag cannot be reached by walking the hierarchy from the root.
    #[error("Tag '{tag}' (child of '{parent}') is not reachable from the root")]
    UnreachableTag { tag: String, parent: String },

    /// Two children of the same parent map to one XML name.
    #[error("Tags under '{parent}' share the XML name '{xml_name}'")]
    DuplicateXmlName { parent: String, xml_name: String },

    /// A tag is referenced but never placed in the hierarchy.
    #[error("Tag '{tag}' listed in {context} is not declared in the hierarchy")]
    UndeclaredTag { tag: String, context: &'static str },

    /// Attributes may only be declared on unique tags.
    #[error("Attribute '{attribute}' is declared on repeatable tag '{tag}'")]
    AttributeOnRepeatableTag { attribute: String, tag: String },

    /// Two declarations claim the same identifier.
    #[error("Identifier '{name}' is declared more than once")]
    NameCollision { name: String },

    /// An identifier shadows instance bookkeeping.
    #[error("'{name}' is reserved and cannot be used as an identifier")]
    ReservedName { name: String },

    /// A loaded unique tag carries an attribute the hierarchy does not declare.
    #[error("<{tag}> carries undeclared attribute '{attribute}'")]
    UndeclaredAttribute { tag: String, attribute: String },

    /// A JSON schema definition could not be decoded.
    #[error("Invalid schema configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Problems found while loading a document.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The source is not well-formed XML.
    #[error(transparent)]
    Xml(#[from] marshall_xml::Error),

    /// The root element is not the declared root.
    #[error("Expected root element <{expected}>, found <{found}>")]
    RootMismatch { expected: String, found: String },

    /// The document declares a different default namespace.
    #[error("Document namespace '{found}' does not match declared namespace '{expected}'")]
    NamespaceMismatch { expected: String, found: String },

    /// An element is not declared under its parent.
    #[error("Unexpected element <{tag}> in <{parent}>{}", position_suffix(.position))]
    UnknownTag {
        tag: String,
        parent: String,
        position: Option<usize>,
    },
}

fn position_suffix(position: &Option<usize>) -> String {
    position
        .map(|pos| format!(" at byte {}", pos))
        .unwrap_or_default()
}

impl From<marshall_xml::Error> for Error {
    fn from(err: marshall_xml::Error) -> Self {
        Error::Parse(ParseError::Xml(err))
    }
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
