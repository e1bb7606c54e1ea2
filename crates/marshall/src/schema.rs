//! Hierarchy descriptors.
//!
//! A [`Schema`] is the declared shape of a document: its root, the
//! parent→child tag hierarchy, which tags are unique, and which XML attributes
//! unique tags may carry. It is validated once and then shared, immutable, by
//! every [`Mapping`](crate::Mapping) bound to it.
//!
//! Schemas are declared in code with [`SchemaBuilder`] or loaded from JSON
//! into a [`SchemaDefinition`]. Both go through the same validation.
//!
//! ```rust
//! use marshall::Schema;
//!
//! let schema = Schema::builder("Request", "request")
//!     .children("request", ["read"])
//!     .children("read", ["date"])
//!     .unique(["read", "date"])
//!     .attributes("read", ["database"])
//!     .build()
//!     .unwrap();
//!
//! assert!(schema.is_unique("read"));
//! assert!(schema.target("read.date").is_some());
//! assert!(schema.target("database").is_some());
//! ```

use crate::error::{DefinitionError, Error, Result};
use crate::resolver::NodeKind;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

/// Names handled by the mapping itself rather than the tree.
pub const RESERVED_NAMES: &[&str] = &["source_file", "namespace"];

/// The declarative input for a [`Schema`].
///
/// Field names follow the hierarchy descriptor vocabulary, so a JSON file
/// looks like:
///
/// ```json
/// {
///   "name": "Request",
///   "namespace": "http://example.org/request",
///   "root_name": "request",
///   "unique_tags": ["read"],
///   "unique_tag_attributes": { "read": ["database"] },
///   "tag_hierarchy": { "request": ["read"] }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDefinition {
    /// Name used in error messages.
    pub name: String,

    /// Default namespace declared on the root element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Identifier of the root tag.
    pub root_name: String,

    /// Tags that occur at most once under their parent.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unique_tags: Vec<String>,

    /// XML attributes each unique tag may carry.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub unique_tag_attributes: IndexMap<String, Vec<String>>,

    /// Parent tag → ordered child tags.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub tag_hierarchy: IndexMap<String, Vec<String>>,

    /// Tag identifier → XML tag name, where they differ.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub xml_names: IndexMap<String, String>,

    /// Attribute identifier → owning tag and XML attribute name, where the
    /// identifier differs from the XML name.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attribute_aliases: IndexMap<String, AttributeAlias>,
}

/// Target of an attribute alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeAlias {
    pub tag: String,
    pub attribute: String,
}

/// A validated tag declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagDecl {
    /// Identifier used in attribute names.
    pub ident: String,
    /// Element name written to the document.
    pub xml_name: String,
    /// Parent identifier; `None` only for the root.
    pub parent: Option<String>,
    /// Child identifiers in declared order.
    pub children: Vec<String>,
    pub unique: bool,
    /// Identifiers of the attributes this tag may carry.
    pub attributes: Vec<String>,
}

/// A validated attribute declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDecl {
    pub ident: String,
    /// Identifier of the owning (unique) tag.
    pub tag: String,
    pub xml_name: String,
}

/// What an attribute name resolves to in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'s> {
    /// The text of a tag.
    Text { tag: &'s TagDecl },
    /// An XML attribute of a tag.
    Attribute {
        tag: &'s TagDecl,
        attribute: &'s AttributeDecl,
    },
}

impl<'s> Target<'s> {
    /// The tag that owns the value.
    pub fn tag(&self) -> &'s TagDecl {
        match self {
            Target::Text { tag } | Target::Attribute { tag, .. } => tag,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Target::Text { .. } => NodeKind::Text,
            Target::Attribute { .. } => NodeKind::Attribute,
        }
    }
}

/// A validated, immutable hierarchy descriptor.
#[derive(Debug)]
pub struct Schema {
    definition: SchemaDefinition,
    /// All tags, root first, then breadth-first in declaration order.
    tags: IndexMap<String, TagDecl>,
    attributes: IndexMap<String, AttributeDecl>,
}

impl Schema {
    /// Start declaring a schema.
    pub fn builder(name: impl Into<String>, root_name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            definition: SchemaDefinition {
                name: name.into(),
                root_name: root_name.into(),
                ..SchemaDefinition::default()
            },
        }
    }

    /// Validate a definition.
    pub fn from_definition(
        definition: SchemaDefinition,
    ) -> std::result::Result<Arc<Schema>, DefinitionError> {
        compile(definition).map(Arc::new)
    }

    /// Decode and validate a JSON definition.
    pub fn from_json(content: &str) -> std::result::Result<Arc<Schema>, DefinitionError> {
        let definition: SchemaDefinition = serde_json::from_str(content)?;
        Self::from_definition(definition)
    }

    /// Read, decode, and validate a JSON definition file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Arc<Schema>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
        Ok(Self::from_json(&content)?)
    }

    /// The definition this schema was built from.
    pub fn definition(&self) -> &SchemaDefinition {
        &self.definition
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.definition.namespace.as_deref()
    }

    /// The root tag declaration.
    pub fn root(&self) -> &TagDecl {
        &self.tags[0]
    }

    pub fn tag(&self, ident: &str) -> Option<&TagDecl> {
        self.tags.get(ident)
    }

    /// All tags, root first.
    pub fn tags(&self) -> impl Iterator<Item = &TagDecl> {
        self.tags.values()
    }

    pub fn attribute(&self, ident: &str) -> Option<&AttributeDecl> {
        self.attributes.get(ident)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &AttributeDecl> {
        self.attributes.values()
    }

    /// Whether `ident` is a unique tag. The root always is.
    pub fn is_unique(&self, ident: &str) -> bool {
        self.tags.get(ident).is_some_and(|tag| tag.unique)
    }

    /// The declared child of `parent` whose element name is `xml_name`.
    pub fn child_by_xml_name(&self, parent: &TagDecl, xml_name: &str) -> Option<&TagDecl> {
        parent
            .children
            .iter()
            .filter_map(|ident| self.tags.get(ident))
            .find(|tag| tag.xml_name == xml_name)
    }

    /// Declarations from the root's child down to `tag`. Empty for the root.
    pub fn lineage<'s>(&'s self, tag: &'s TagDecl) -> Vec<&'s TagDecl> {
        let mut path = Vec::new();
        let mut current = tag;
        while let Some(parent) = current.parent.as_deref().and_then(|p| self.tags.get(p)) {
            path.push(current);
            current = parent;
        }
        path.reverse();
        path
    }

    /// Resolve an attribute name against the hierarchy.
    ///
    /// A flat name is looked up among attribute identifiers first, then tag
    /// identifiers. A dotted name walks tag identifiers from the root (a
    /// leading root identifier is optional); its last segment may instead name
    /// an attribute of the preceding tag, by identifier or XML name.
    pub fn target(&self, name: &str) -> Option<Target<'_>> {
        if !name.contains('.') {
            if let Some(attribute) = self.attributes.get(name) {
                let tag = self.tags.get(&attribute.tag)?;
                return Some(Target::Attribute { tag, attribute });
            }
            return self.tags.get(name).map(|tag| Target::Text { tag });
        }

        let mut segments: Vec<&str> = name.split('.').collect();
        if segments.first() == Some(&self.root().ident.as_str()) {
            segments.remove(0);
        }

        let mut current = self.root();
        let last = segments.len().saturating_sub(1);
        for (index, segment) in segments.iter().enumerate() {
            let child = current
                .children
                .iter()
                .find(|ident| ident.as_str() == *segment)
                .and_then(|ident| self.tags.get(ident));
            if let Some(child) = child {
                current = child;
                continue;
            }
            if index == last {
                let attribute = current
                    .attributes
                    .iter()
                    .filter_map(|ident| self.attributes.get(ident))
                    .find(|a| a.ident == *segment || a.xml_name == *segment)?;
                return Some(Target::Attribute {
                    tag: current,
                    attribute,
                });
            }
            return None;
        }
        Some(Target::Text { tag: current })
    }
}

/// Declares a [`Schema`] in code.
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    definition: SchemaDefinition,
}

impl SchemaBuilder {
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.definition.namespace = Some(namespace.into());
        self
    }

    /// Append children to `parent`, in order.
    pub fn children<I, S>(mut self, parent: impl Into<String>, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.definition
            .tag_hierarchy
            .entry(parent.into())
            .or_default()
            .extend(children.into_iter().map(Into::into));
        self
    }

    pub fn child(self, parent: impl Into<String>, child: impl Into<String>) -> Self {
        self.children(parent, [child.into()])
    }

    /// Write `tag` to the document as `xml_name`.
    pub fn xml_name(mut self, tag: impl Into<String>, xml_name: impl Into<String>) -> Self {
        self.definition
            .xml_names
            .insert(tag.into(), xml_name.into());
        self
    }

    pub fn unique<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.definition
            .unique_tags
            .extend(tags.into_iter().map(Into::into));
        self
    }

    /// Declare XML attributes of a unique tag, addressed by their own names.
    pub fn attributes<I, S>(mut self, tag: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.definition
            .unique_tag_attributes
            .entry(tag.into())
            .or_default()
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Declare an XML attribute addressed by an identifier of its own.
    pub fn attribute_alias(
        mut self,
        ident: impl Into<String>,
        tag: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        self.definition.attribute_aliases.insert(
            ident.into(),
            AttributeAlias {
                tag: tag.into(),
                attribute: attribute.into(),
            },
        );
        self
    }

    pub fn build(self) -> std::result::Result<Arc<Schema>, DefinitionError> {
        Schema::from_definition(self.definition)
    }
}

fn compile(definition: SchemaDefinition) -> std::result::Result<Schema, DefinitionError> {
    let root_ident = definition.root_name.clone();
    check_identifier(&root_ident, "tag")?;

    // Each child names exactly one parent, and the root names none.
    let mut parents: IndexMap<&str, &str> = IndexMap::new();
    for (parent, children) in &definition.tag_hierarchy {
        check_identifier(parent, "tag")?;
        for child in children {
            check_identifier(child, "tag")?;
            if *child == root_ident {
                return Err(DefinitionError::RootAsChild {
                    root: root_ident,
                    parent: parent.clone(),
                });
            }
            if let Some(first) = parents.get(child.as_str()) {
                return Err(DefinitionError::DuplicateTag {
                    tag: child.clone(),
                    first: first.to_string(),
                    second: parent.clone(),
                });
            }
            parents.insert(child, parent);
        }
    }

    let xml_name_of = |ident: &str| -> String {
        definition
            .xml_names
            .get(ident)
            .cloned()
            .unwrap_or_else(|| ident.to_string())
    };

    let mut tags: IndexMap<String, TagDecl> = IndexMap::new();
    tags.insert(
        root_ident.clone(),
        TagDecl {
            ident: root_ident.clone(),
            xml_name: xml_name_of(&root_ident),
            parent: None,
            children: Vec::new(),
            unique: true,
            attributes: Vec::new(),
        },
    );

    let mut queue = VecDeque::from([root_ident.clone()]);
    while let Some(parent) = queue.pop_front() {
        let Some(children) = definition.tag_hierarchy.get(&parent) else {
            continue;
        };
        for child in children {
            tags.insert(
                child.clone(),
                TagDecl {
                    ident: child.clone(),
                    xml_name: xml_name_of(child),
                    parent: Some(parent.clone()),
                    children: Vec::new(),
                    unique: false,
                    attributes: Vec::new(),
                },
            );
            if let Some(decl) = tags.get_mut(&parent) {
                decl.children.push(child.clone());
            }
            queue.push_back(child.clone());
        }
    }

    for (child, parent) in &parents {
        if !tags.contains_key(*child) {
            return Err(DefinitionError::UnreachableTag {
                tag: child.to_string(),
                parent: parent.to_string(),
            });
        }
    }

    for (ident, xml_name) in &definition.xml_names {
        if !tags.contains_key(ident) {
            return Err(DefinitionError::UndeclaredTag {
                tag: ident.clone(),
                context: "xml_names",
            });
        }
        check_xml_name(xml_name, "tag")?;
    }

    for tag in tags.values() {
        let mut seen = Vec::with_capacity(tag.children.len());
        for child in tag.children.iter().filter_map(|c| tags.get(c)) {
            if seen.contains(&child.xml_name.as_str()) {
                return Err(DefinitionError::DuplicateXmlName {
                    parent: tag.ident.clone(),
                    xml_name: child.xml_name.clone(),
                });
            }
            seen.push(child.xml_name.as_str());
        }
    }

    for ident in &definition.unique_tags {
        match tags.get_mut(ident) {
            Some(decl) => decl.unique = true,
            None => {
                return Err(DefinitionError::UndeclaredTag {
                    tag: ident.clone(),
                    context: "unique_tags",
                });
            }
        }
    }

    let mut attributes: IndexMap<String, AttributeDecl> = IndexMap::new();
    let declared = definition
        .unique_tag_attributes
        .iter()
        .flat_map(|(tag, names)| {
            names
                .iter()
                .map(move |name| (name, tag, name, "unique_tag_attributes"))
        })
        .chain(
            definition
                .attribute_aliases
                .iter()
                .map(|(ident, alias)| (ident, &alias.tag, &alias.attribute, "attribute_aliases")),
        );
    for (ident, tag, xml_name, context) in declared {
        check_identifier(ident, "attribute")?;
        check_xml_name(xml_name, "attribute")?;
        let Some(decl) = tags.get_mut(tag) else {
            return Err(DefinitionError::UndeclaredTag {
                tag: tag.clone(),
                context,
            });
        };
        if !decl.unique {
            return Err(DefinitionError::AttributeOnRepeatableTag {
                attribute: ident.clone(),
                tag: tag.clone(),
            });
        }
        decl.attributes.push(ident.clone());
        let previous = attributes.insert(
            ident.clone(),
            AttributeDecl {
                ident: ident.clone(),
                tag: tag.clone(),
                xml_name: xml_name.clone(),
            },
        );
        if previous.is_some() {
            return Err(DefinitionError::NameCollision { name: ident.clone() });
        }
    }

    for ident in attributes.keys() {
        if tags.contains_key(ident) {
            return Err(DefinitionError::NameCollision { name: ident.clone() });
        }
    }
    for ident in tags.keys().chain(attributes.keys()) {
        if RESERVED_NAMES.contains(&ident.as_str()) {
            return Err(DefinitionError::ReservedName {
                name: ident.clone(),
            });
        }
    }

    tracing::debug!(
        schema = %definition.name,
        tags = tags.len(),
        attributes = attributes.len(),
        "Validated hierarchy"
    );

    Ok(Schema {
        definition,
        tags,
        attributes,
    })
}

/// Identifiers are XML-style names without dots, which separate path segments.
fn check_identifier(name: &str, kind: &'static str) -> std::result::Result<(), DefinitionError> {
    if is_name(name, &[]) {
        Ok(())
    } else {
        Err(DefinitionError::InvalidName {
            name: name.to_string(),
            kind,
        })
    }
}

fn check_xml_name(name: &str, kind: &'static str) -> std::result::Result<(), DefinitionError> {
    // Only attributes may be prefixed (xml:lang); tags match by local name.
    let extra: &[char] = if kind == "attribute" { &['.', ':'] } else { &['.'] };
    if is_name(name, extra) {
        Ok(())
    } else {
        Err(DefinitionError::InvalidName {
            name: name.to_string(),
            kind,
        })
    }
}

fn is_name(name: &str, extra: &[char]) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '-' || c == '_' || extra.contains(&c))
}
