//! Core types for the owned XML element tree.

use std::borrow::Cow;

/// A parsed XML document.
///
/// This is the top-level result of parsing and the input to serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    /// The root element of the document.
    pub root: XmlElement,
}

/// An XML element.
///
/// The model follows the element-tree shape used by the mapping layer: an
/// element has a name, ordered attributes, optional text, and ordered child
/// elements. Comments and processing instructions are not retained.
#[derive(Debug, Clone)]
pub struct XmlElement {
    /// The local name of the element (without namespace prefix).
    pub name: String,

    /// Namespace prefix, if any (e.g., "sky" in `<sky:read>`).
    pub prefix: Option<String>,

    /// Attributes of this element, in document order.
    pub attributes: Vec<XmlAttribute>,

    /// Text content (after unescaping XML entities).
    pub text: Option<String>,

    /// Child elements, in document order.
    pub children: Vec<XmlElement>,

    /// Byte offset of the element's `<` in the parsed source.
    ///
    /// `None` for elements built in memory. Ignored by equality.
    pub position: Option<usize>,
}

/// An XML attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    /// The qualified attribute name as written (e.g. `name` or `xml:lang`).
    pub name: String,

    /// The attribute value (after unescaping XML entities).
    pub value: String,
}

impl XmlDocument {
    /// Create a document around a root element.
    pub fn new(root: XmlElement) -> Self {
        Self { root }
    }
}

impl XmlElement {
    /// Create a new empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prefix: None,
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
            position: None,
        }
    }

    /// Create a new empty element declaring `namespace` as its default namespace.
    pub fn with_namespace(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        let mut element = Self::new(name);
        element.set_attribute("xmlns", namespace);
        element
    }

    /// The element name as written, including the prefix if present.
    pub fn qualified_name(&self) -> Cow<'_, str> {
        match &self.prefix {
            Some(prefix) => Cow::Owned(format!("{}:{}", prefix, self.name)),
            None => Cow::Borrowed(&self.name),
        }
    }

    /// The default namespace declared on this element, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.get_attribute("xmlns")
    }

    /// Get text content.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Replace the text content.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    /// Remove the text content, returning it.
    pub fn clear_text(&mut self) -> Option<String> {
        self.text.take()
    }

    /// Get an attribute value by qualified name.
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, replacing the value in place if it already exists.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(XmlAttribute { name, value }),
        }
    }

    /// Remove an attribute, returning its value.
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|a| a.name == name)?;
        Some(self.attributes.remove(index).value)
    }

    /// All attributes in document order.
    pub fn attributes(&self) -> &[XmlAttribute] {
        &self.attributes
    }

    /// All child elements in document order.
    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    /// Get child elements by local name.
    pub fn get_children(&self, name: &str) -> Vec<&XmlElement> {
        self.children.iter().filter(|e| e.name == name).collect()
    }

    /// Indices of the child elements with the given local name.
    pub fn child_indices(&self, name: &str) -> Vec<usize> {
        self.children
            .iter()
            .enumerate()
            .filter(|(_, e)| e.name == name)
            .map(|(i, _)| i)
            .collect()
    }

    /// Append a child element, returning a reference to it.
    pub fn append_child(&mut self, child: XmlElement) -> &mut XmlElement {
        let index = self.children.len();
        self.insert_child(index, child)
    }

    /// Insert a child element at `index`, returning a reference to it.
    ///
    /// `index` is clamped to the number of children.
    pub fn insert_child(&mut self, index: usize, child: XmlElement) -> &mut XmlElement {
        let index = index.min(self.children.len());
        self.children.insert(index, child);
        &mut self.children[index]
    }

    /// Remove the child element at `index`.
    pub fn remove_child(&mut self, index: usize) -> Option<XmlElement> {
        (index < self.children.len()).then(|| self.children.remove(index))
    }

    /// Check if this element has child elements.
    pub fn has_elements(&self) -> bool {
        !self.children.is_empty()
    }

    /// Check if this element has text content.
    pub fn has_text(&self) -> bool {
        self.text.is_some()
    }

    /// Check if this element is empty (no text and no children).
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.children.is_empty()
    }
}

impl PartialEq for XmlElement {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.prefix == other.prefix
            && self.attributes == other.attributes
            && self.text == other.text
            && self.children == other.children
    }
}

impl XmlAttribute {
    /// Create a new attribute.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// True for `xmlns` and `xmlns:*` declarations.
    pub fn is_namespace_declaration(&self) -> bool {
        self.name == "xmlns" || self.name.starts_with("xmlns:")
    }
}
