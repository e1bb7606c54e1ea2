//! XML parser that builds XmlDocument trees.

use crate::{Error, Result, XmlAttribute, XmlDocument, XmlElement};
use quick_xml::Reader;
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};

/// Parse XML from a string, producing an XmlDocument tree.
///
/// # Example
///
/// ```rust
/// use marshall_xml::parse;
///
/// let xml = parse("<root><child>value</child></root>").unwrap();
/// assert_eq!(xml.root.name, "root");
/// assert_eq!(xml.root.children()[0].text(), Some("value"));
/// ```
///
/// # Errors
///
/// Returns an error if the XML is malformed or if parsing fails.
pub fn parse(content: &str) -> Result<XmlDocument> {
    let mut parser = XmlParser::new(content);
    parser.parse()
}

/// Internal parser state.
struct XmlParser<'a> {
    /// The quick-xml reader.
    reader: Reader<&'a [u8]>,

    /// Stack of elements being built.
    stack: Vec<BuildNode>,
}

/// A node being constructed during parsing.
struct BuildNode {
    name: String,
    prefix: Option<String>,
    attributes: Vec<XmlAttribute>,

    /// Byte offset where this element started (the `<` character).
    start_offset: usize,

    /// Text segments in document order, including whitespace between children.
    text: Vec<String>,

    children: Vec<XmlElement>,
}

impl BuildNode {
    /// Fold the collected text segments into the element's single text value.
    ///
    /// Leaf text is kept verbatim unless it is whitespace only. Text around
    /// child elements is indentation plus any tail text, so it is trimmed.
    fn finish(self) -> XmlElement {
        let text = if self.children.is_empty() {
            let joined = self.text.concat();
            (!joined.trim().is_empty()).then_some(joined)
        } else {
            let joined: String = self
                .text
                .iter()
                .map(|segment| segment.trim())
                .filter(|segment| !segment.is_empty())
                .collect();
            (!joined.is_empty()).then_some(joined)
        };

        XmlElement {
            name: self.name,
            prefix: self.prefix,
            attributes: self.attributes,
            text,
            children: self.children,
            position: Some(self.start_offset),
        }
    }
}

impl<'a> XmlParser<'a> {
    fn new(source: &'a str) -> Self {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;

        Self {
            reader,
            stack: Vec::new(),
        }
    }

    fn parse(&mut self) -> Result<XmlDocument> {
        let mut root: Option<XmlElement> = None;

        loop {
            // Capture position before reading the event
            let event_start = self.reader.buffer_position() as usize;

            match self.reader.read_event() {
                Ok(Event::Start(e)) => {
                    self.handle_start(e, event_start)?;
                }
                Ok(Event::End(e)) => {
                    let element = self.handle_end(e)?;
                    self.attach(element, &mut root)?;
                }
                Ok(Event::Empty(e)) => {
                    let element = self.handle_empty(e, event_start)?;
                    self.attach(element, &mut root)?;
                }
                Ok(Event::Text(e)) => {
                    self.handle_text(e, event_start)?;
                }
                Ok(Event::CData(e)) => {
                    self.handle_cdata(e);
                }
                Ok(Event::Comment(_) | Event::PI(_) | Event::Decl(_)) => {
                    // Skip comments, processing instructions, and XML declarations
                }
                Ok(Event::DocType(_)) => {
                    // Skip DOCTYPE declarations
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlSyntax {
                        message: e.to_string(),
                        position: Some(self.reader.error_position()),
                    });
                }
            }
        }

        // Check for unclosed elements
        if let Some(node) = self.stack.last() {
            return Err(Error::UnexpectedEof {
                expected: format!("closing tag </{}>", node.name),
                position: Some(node.start_offset),
            });
        }

        let root = root.ok_or(Error::EmptyDocument)?;
        Ok(XmlDocument::new(root))
    }

    /// Add a finished element to its parent, or make it the document root.
    fn attach(&mut self, element: XmlElement, root: &mut Option<XmlElement>) -> Result<()> {
        match self.stack.last_mut() {
            Some(parent) => {
                parent.children.push(element);
                Ok(())
            }
            None if root.is_some() => Err(Error::MultipleRoots {
                position: element.position,
            }),
            None => {
                *root = Some(element);
                Ok(())
            }
        }
    }

    fn handle_start(&mut self, e: BytesStart<'_>, event_start: usize) -> Result<()> {
        let (name, prefix) = self.parse_name(&e);
        let attributes = self.parse_attributes(&e, event_start)?;

        self.stack.push(BuildNode {
            name,
            prefix,
            attributes,
            start_offset: event_start,
            text: Vec::new(),
            children: Vec::new(),
        });

        Ok(())
    }

    fn handle_end(&mut self, e: BytesEnd<'_>) -> Result<XmlElement> {
        let end_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
        let end_local_name = end_name.split(':').next_back().unwrap_or(&end_name);

        let node = self.stack.pop().ok_or_else(|| Error::InvalidStructure {
            message: format!("Unexpected closing tag </{}>", end_name),
            position: None,
        })?;

        // Verify tag names match
        if node.name != end_local_name {
            return Err(Error::MismatchedEndTag {
                expected: node.name.clone(),
                found: end_local_name.to_string(),
                position: Some(node.start_offset),
            });
        }

        Ok(node.finish())
    }

    fn handle_empty(&mut self, e: BytesStart<'_>, event_start: usize) -> Result<XmlElement> {
        let (name, prefix) = self.parse_name(&e);
        let attributes = self.parse_attributes(&e, event_start)?;

        Ok(XmlElement {
            name,
            prefix,
            attributes,
            text: None,
            children: Vec::new(),
            position: Some(event_start),
        })
    }

    fn handle_text(&mut self, e: BytesText<'_>, event_start: usize) -> Result<()> {
        let text = e.unescape().map_err(|err| Error::XmlSyntax {
            message: format!("Invalid text content: {}", err),
            position: Some(event_start as u64),
        })?;

        // Text outside the root element is ignored
        if let Some(node) = self.stack.last_mut() {
            node.text.push(text.into_owned());
        }
        Ok(())
    }

    fn handle_cdata(&mut self, e: BytesCData<'_>) {
        let text = String::from_utf8_lossy(e.as_ref()).to_string();
        if let Some(node) = self.stack.last_mut() {
            node.text.push(text);
        }
    }

    fn parse_name(&self, e: &BytesStart<'_>) -> (String, Option<String>) {
        let full_name = String::from_utf8_lossy(e.name().as_ref()).to_string();

        if let Some(pos) = full_name.find(':') {
            let prefix = full_name[..pos].to_string();
            let local_name = full_name[pos + 1..].to_string();
            (local_name, Some(prefix))
        } else {
            (full_name, None)
        }
    }

    fn parse_attributes(&self, e: &BytesStart<'_>, tag_start: usize) -> Result<Vec<XmlAttribute>> {
        let mut attributes = Vec::new();

        for attr_result in e.attributes() {
            let attr = attr_result?;
            let name = String::from_utf8_lossy(attr.key.as_ref()).to_string();

            let value = attr.unescape_value().map_err(|err| Error::XmlSyntax {
                message: format!("Invalid attribute value: {}", err),
                position: Some(tag_start as u64),
            })?;

            attributes.push(XmlAttribute {
                name,
                value: value.into_owned(),
            });
        }

        Ok(attributes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_element() {
        let xml = parse("<root/>").unwrap();
        assert_eq!(xml.root.name, "root");
        assert!(xml.root.is_empty());
    }

    #[test]
    fn test_parse_nested_elements() {
        let xml = parse("<root><child/></root>").unwrap();
        assert_eq!(xml.root.name, "root");
        assert!(xml.root.has_elements());

        let children = xml.root.children();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "child");
    }

    #[test]
    fn test_parse_text_content() {
        let xml = parse("<root>Hello, world!</root>").unwrap();
        assert_eq!(xml.root.name, "root");
        assert!(xml.root.has_text());
        assert_eq!(xml.root.text(), Some("Hello, world!"));
    }

    #[test]
    fn test_parse_escaped_text_and_attributes() {
        let xml = parse(r#"<root attr="a &amp; b">1 &lt; 2</root>"#).unwrap();
        assert_eq!(xml.root.get_attribute("attr"), Some("a & b"));
        assert_eq!(xml.root.text(), Some("1 < 2"));
    }

    #[test]
    fn test_parse_cdata_is_text() {
        let xml = parse("<root><![CDATA[<raw> & text]]></root>").unwrap();
        assert_eq!(xml.root.text(), Some("<raw> & text"));
    }

    #[test]
    fn test_whitespace_between_children_is_not_text() {
        let xml = parse("<root>\n  <a>x</a>\n  <b/>\n</root>").unwrap();
        assert_eq!(xml.root.text(), None);
        assert_eq!(xml.root.children().len(), 2);
        assert_eq!(xml.root.children()[0].text(), Some("x"));
    }

    #[test]
    fn test_whitespace_only_leaf_is_absent() {
        let xml = parse("<root>   </root>").unwrap();
        assert_eq!(xml.root.text(), None);
    }

    #[test]
    fn test_leaf_text_is_verbatim() {
        let xml = parse("<root>  padded </root>").unwrap();
        assert_eq!(xml.root.text(), Some("  padded "));
    }

    #[test]
    fn test_mixed_content_text_is_trimmed_and_joined() {
        let xml = parse("<root>\n  head\n  <a/>\n  tail\n</root>").unwrap();
        assert_eq!(xml.root.text(), Some("headtail"));
        assert_eq!(xml.root.children().len(), 1);
    }

    #[test]
    fn test_parse_attributes() {
        let xml = parse(r#"<root attr="value" other='test'/>"#).unwrap();
        assert_eq!(xml.root.get_attribute("attr"), Some("value"));
        assert_eq!(xml.root.get_attribute("other"), Some("test"));
    }

    #[test]
    fn test_parse_namespace_prefix() {
        let xml = parse(r#"<sky:request xmlns:sky="http://example.org" xml:lang="en"/>"#).unwrap();
        assert_eq!(xml.root.name, "request");
        assert_eq!(xml.root.prefix, Some("sky".to_string()));
        assert_eq!(xml.root.get_attribute("xml:lang"), Some("en"));
        assert!(xml.root.attributes()[0].is_namespace_declaration());
    }

    #[test]
    fn test_parse_default_namespace() {
        let xml = parse(r#"<root xmlns="http://example.org/ns"><child/></root>"#).unwrap();
        assert_eq!(xml.root.namespace(), Some("http://example.org/ns"));
        assert_eq!(xml.root.children()[0].namespace(), None);
    }

    #[test]
    fn test_position_tracking() {
        let content = "<root>\n  <child/>\n</root>";
        let xml = parse(content).unwrap();

        assert_eq!(xml.root.position, Some(0));
        let child = xml.root.children()[0].position.unwrap();
        assert!(child > 0 && child < content.len());
    }

    #[test]
    fn test_declaration_and_comments_skipped() {
        let xml = parse(
            "<?xml version='1.0' encoding='UTF-8'?>\n<!-- note -->\n<root><?pi x?><a/></root>",
        )
        .unwrap();
        assert_eq!(xml.root.name, "root");
        assert_eq!(xml.root.children().len(), 1);
    }

    // ==================== Error Behavior Tests ====================

    #[test]
    fn test_empty_document_error() {
        let result = parse("");
        assert!(matches!(result, Err(Error::EmptyDocument)));
    }

    #[test]
    fn test_mismatched_tags_error() {
        let result = parse("<root></wrong>");
        // quick-xml catches mismatched tags itself when check_end_names is enabled (default)
        assert!(
            matches!(
                result,
                Err(Error::MismatchedEndTag { .. } | Error::XmlSyntax { .. })
            ),
            "Expected MismatchedEndTag or XmlSyntax error, got: {:?}",
            result
        );
    }

    #[test]
    fn test_unclosed_element_error() {
        let result = parse("<root><child>");
        assert!(
            matches!(
                result,
                Err(Error::UnexpectedEof { .. } | Error::XmlSyntax { .. })
            ),
            "Expected UnexpectedEof or XmlSyntax error, got: {:?}",
            result
        );
    }

    #[test]
    fn test_multiple_roots_error() {
        let result = parse("<root/><another/>");
        assert!(matches!(result, Err(Error::MultipleRoots { .. })));
    }

    #[test]
    fn test_syntax_error() {
        let result = parse("<root attr=unquoted/>");
        assert!(matches!(result, Err(Error::XmlSyntax { .. })));
    }
}
