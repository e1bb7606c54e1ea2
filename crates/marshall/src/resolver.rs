//! Resolution of attribute names to nodes of a live tree.
//!
//! Every access walks the declared lineage of the target tag from the root.
//! At each level the element is matched by XML name among the current
//! element's children:
//!
//! - no match: the value is absent (reads) or the element is created (writes)
//! - one match: descend
//! - several matches: [`Error::AmbiguousTag`] for repeatable tags,
//!   [`Error::InvalidStructure`] for unique ones
//!
//! Name lookup happens before the tree is touched, so an unknown name never
//! modifies it. Elements are only created below a level that had no match, so
//! a failed write never leaves partial structure behind either.

use crate::error::{Error, Result};
use crate::schema::{Schema, TagDecl, Target};
use marshall_xml::XmlElement;

/// The kind of node an attribute name addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Text content of an element.
    Text,
    /// An XML attribute of an element.
    Attribute,
}

/// Outcome of resolving a name for reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolved<'a> {
    /// The element exists; its text may still be empty.
    Text(&'a XmlElement),
    /// The element exists and carries the attribute.
    Attribute {
        element: &'a XmlElement,
        value: &'a str,
    },
    /// Some element on the path, or the attribute itself, is missing.
    Absent(NodeKind),
}

impl<'a> Resolved<'a> {
    pub fn kind(&self) -> NodeKind {
        match self {
            Resolved::Text(_) => NodeKind::Text,
            Resolved::Attribute { .. } => NodeKind::Attribute,
            Resolved::Absent(kind) => *kind,
        }
    }

    /// The addressed value, if present.
    pub fn value(&self) -> Option<&'a str> {
        match self {
            Resolved::Text(element) => element.text(),
            Resolved::Attribute { value, .. } => Some(value),
            Resolved::Absent(_) => None,
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, Resolved::Absent(_))
    }
}

/// Resolve `name` without modifying the tree.
pub fn resolve_for_read<'a>(
    schema: &Schema,
    root: &'a XmlElement,
    name: &str,
) -> Result<Resolved<'a>> {
    let target = lookup(schema, name)?;
    let path = schema.lineage(target.tag());
    let Some(element) = walk(root, name, &path)? else {
        return Ok(Resolved::Absent(target.kind()));
    };

    Ok(match target {
        Target::Text { .. } => Resolved::Text(element),
        Target::Attribute { attribute, .. } => match element.get_attribute(&attribute.xml_name) {
            Some(value) => Resolved::Attribute { element, value },
            None => Resolved::Absent(NodeKind::Attribute),
        },
    })
}

/// Resolve `name` and store `value` there, creating missing elements.
///
/// Whitespace-only text is not a value: writing it to a text target leaves
/// the element in place without text, matching how the document reloads.
pub fn resolve_for_write(
    schema: &Schema,
    root: &mut XmlElement,
    name: &str,
    value: &str,
) -> Result<()> {
    let target = lookup(schema, name)?;
    let path = schema.lineage(target.tag());
    let element = walk_or_create(schema, root, name, &path)?;

    match target {
        Target::Text { .. } if value.trim().is_empty() => {
            element.clear_text();
        }
        Target::Text { .. } => element.set_text(value),
        Target::Attribute { attribute, .. } => {
            element.set_attribute(attribute.xml_name.as_str(), value)
        }
    }
    tracing::trace!(name, value, "Stored value");
    Ok(())
}

/// Resolve `name` and remove what it addresses.
///
/// Text targets remove the whole element; ancestors are kept. The root cannot
/// be removed, so deleting its text only clears it. Returns whether anything
/// was removed.
pub fn resolve_for_delete(schema: &Schema, root: &mut XmlElement, name: &str) -> Result<bool> {
    let target = lookup(schema, name)?;
    let path = schema.lineage(target.tag());

    let removed = match target {
        Target::Attribute { attribute, .. } => match walk_mut(root, name, &path)? {
            Some(element) => element.remove_attribute(&attribute.xml_name).is_some(),
            None => false,
        },
        Target::Text { .. } => match path.split_last() {
            None => root.clear_text().is_some(),
            Some((tag, parents)) => match walk_mut(root, name, parents)? {
                Some(parent) => {
                    let indices = parent.child_indices(&tag.xml_name);
                    match indices.as_slice() {
                        [] => false,
                        [index] => parent.remove_child(*index).is_some(),
                        _ => return Err(multiple(name, tag, parent, indices.len())),
                    }
                }
                None => false,
            },
        },
    };

    tracing::trace!(name, removed, "Deleted value");
    Ok(removed)
}

/// All instances of the tag `name` under its (single) parent.
pub fn resolve_all<'a>(
    schema: &Schema,
    root: &'a XmlElement,
    name: &str,
) -> Result<Vec<&'a XmlElement>> {
    let tag = lookup_tag(schema, name)?;
    let path = schema.lineage(tag);
    let Some((tag, parents)) = path.split_last() else {
        return Ok(vec![root]);
    };
    Ok(match walk(root, name, parents)? {
        Some(parent) => parent.get_children(&tag.xml_name),
        None => Vec::new(),
    })
}

/// Add a new instance of the tag `name`, after any existing siblings of the
/// same tag. Unique tags may only be appended while absent.
pub fn append<'a>(
    schema: &Schema,
    root: &'a mut XmlElement,
    name: &str,
) -> Result<&'a mut XmlElement> {
    let tag = lookup_tag(schema, name)?;
    let path = schema.lineage(tag);
    let Some((tag, parents)) = path.split_last() else {
        return Err(Error::InvalidStructure {
            message: format!("cannot append a second root <{}>", root.name),
        });
    };

    let parent = walk_or_create(schema, root, name, parents)?;
    if tag.unique && !parent.child_indices(&tag.xml_name).is_empty() {
        return Err(Error::InvalidStructure {
            message: format!(
                "<{}> already contains unique element <{}>",
                parent.name, tag.xml_name
            ),
        });
    }
    let index = insertion_index(schema, parent, tag);
    tracing::debug!(name, tag = %tag.xml_name, index, "Appending element");
    Ok(parent.insert_child(index, XmlElement::new(tag.xml_name.as_str())))
}

/// Remove the `index`-th instance of the tag `name`.
pub fn remove(
    schema: &Schema,
    root: &mut XmlElement,
    name: &str,
    index: usize,
) -> Result<Option<XmlElement>> {
    let tag = lookup_tag(schema, name)?;
    let path = schema.lineage(tag);
    let Some((tag, parents)) = path.split_last() else {
        return Err(Error::InvalidStructure {
            message: format!("cannot remove the root <{}>", root.name),
        });
    };

    let Some(parent) = walk_mut(root, name, parents)? else {
        return Ok(None);
    };
    let removed = parent
        .child_indices(&tag.xml_name)
        .get(index)
        .copied()
        .and_then(|position| parent.remove_child(position));
    Ok(removed)
}

/// The element owning the value `name` addresses, or `None` when some
/// element on the path is missing.
pub fn locate<'a>(
    schema: &Schema,
    root: &'a XmlElement,
    name: &str,
) -> Result<Option<&'a XmlElement>> {
    let target = lookup(schema, name)?;
    walk(root, name, &schema.lineage(target.tag()))
}

/// The element owning the value `name` addresses, creating missing elements
/// on the way.
pub fn locate_or_create<'a>(
    schema: &Schema,
    root: &'a mut XmlElement,
    name: &str,
) -> Result<&'a mut XmlElement> {
    let target = lookup(schema, name)?;
    walk_or_create(schema, root, name, &schema.lineage(target.tag()))
}

fn lookup<'s>(schema: &'s Schema, name: &str) -> Result<Target<'s>> {
    schema.target(name).ok_or_else(|| unknown(schema, name))
}

fn lookup_tag<'s>(schema: &'s Schema, name: &str) -> Result<&'s TagDecl> {
    match lookup(schema, name)? {
        Target::Text { tag } => Ok(tag),
        Target::Attribute { .. } => Err(unknown(schema, name)),
    }
}

fn unknown(schema: &Schema, name: &str) -> Error {
    Error::UnknownAttribute {
        schema: schema.name().to_string(),
        name: name.to_string(),
    }
}

fn multiple(name: &str, tag: &TagDecl, parent: &XmlElement, count: usize) -> Error {
    if tag.unique {
        Error::InvalidStructure {
            message: format!(
                "<{}> contains {} <{}> elements but '{}' is unique",
                parent.name, count, tag.xml_name, tag.ident
            ),
        }
    } else {
        Error::AmbiguousTag {
            name: name.to_string(),
            tag: tag.xml_name.clone(),
            parent: parent.name.clone(),
            count,
        }
    }
}

fn walk<'a>(root: &'a XmlElement, name: &str, path: &[&TagDecl]) -> Result<Option<&'a XmlElement>> {
    let mut current = root;
    for tag in path {
        let mut matches = current.children.iter().filter(|c| c.name == tag.xml_name);
        let Some(first) = matches.next() else {
            return Ok(None);
        };
        let others = matches.count();
        if others > 0 {
            return Err(multiple(name, tag, current, others + 1));
        }
        current = first;
    }
    Ok(Some(current))
}

fn walk_mut<'a>(
    root: &'a mut XmlElement,
    name: &str,
    path: &[&TagDecl],
) -> Result<Option<&'a mut XmlElement>> {
    let mut current = root;
    for tag in path {
        let indices = current.child_indices(&tag.xml_name);
        match indices.as_slice() {
            [] => return Ok(None),
            [index] => current = &mut current.children[*index],
            _ => return Err(multiple(name, tag, current, indices.len())),
        }
    }
    Ok(Some(current))
}

fn walk_or_create<'a>(
    schema: &Schema,
    root: &'a mut XmlElement,
    name: &str,
    path: &[&TagDecl],
) -> Result<&'a mut XmlElement> {
    let mut current = root;
    for tag in path {
        let indices = current.child_indices(&tag.xml_name);
        let index = match indices.as_slice() {
            [] => {
                let index = insertion_index(schema, current, tag);
                tracing::debug!(name, tag = %tag.xml_name, parent = %current.name, "Creating element");
                current.insert_child(index, XmlElement::new(tag.xml_name.as_str()));
                index
            }
            [index] => *index,
            _ => return Err(multiple(name, tag, current, indices.len())),
        };
        current = &mut current.children[index];
    }
    Ok(current)
}

/// Where a new `tag` goes among `parent`'s children: before the first child
/// declared later than `tag`, otherwise at the end.
fn insertion_index(schema: &Schema, parent: &XmlElement, tag: &TagDecl) -> usize {
    let Some(parent_decl) = tag.parent.as_deref().and_then(|p| schema.tag(p)) else {
        return parent.children.len();
    };
    let rank = |ident: &str| parent_decl.children.iter().position(|c| c == ident);
    let Some(own) = rank(&tag.ident) else {
        return parent.children.len();
    };

    parent
        .children
        .iter()
        .position(|child| {
            schema
                .child_by_xml_name(parent_decl, &child.name)
                .and_then(|decl| rank(&decl.ident))
                .is_some_and(|other| other > own)
        })
        .unwrap_or(parent.children.len())
}
