//! Writers that render an XmlElement tree back to text.
//!
//! [`write_pretty`] drives quick-xml's indenting writer and emits a complete
//! declaration. [`write_compact`] is a minimal single-line renderer: it uses
//! single quotes throughout, writes `<tag />` for empty elements, and omits the
//! `standalone` pseudo-attribute. Both produce text that parses back to the
//! same tree.

use crate::{Error, Result, XmlDocument, XmlElement};
use quick_xml::Writer;
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

/// Indentation width used by [`write_pretty`].
pub const INDENT: usize = 2;

/// Render a document with quick-xml, indented by [`INDENT`] spaces.
pub fn write_pretty(document: &XmlDocument) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(serialize_error)?;
    write_element(&mut writer, &document.root)?;

    String::from_utf8(writer.into_inner()).map_err(serialize_error)
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> Result<()> {
    let name = element.qualified_name();
    let mut start = BytesStart::new(name.as_ref());
    for attribute in &element.attributes {
        // Pre-escaped so both writers agree on entity forms.
        let value = escape(attribute.value.as_str());
        start.push_attribute((attribute.name.as_bytes(), value.as_bytes()));
    }

    if element.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(serialize_error);
    }

    writer
        .write_event(Event::Start(start))
        .map_err(serialize_error)?;
    if let Some(text) = &element.text {
        writer
            .write_event(Event::Text(BytesText::from_escaped(escape(text.as_str()))))
            .map_err(serialize_error)?;
    }
    for child in &element.children {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(name.as_ref())))
        .map_err(serialize_error)
}

/// Render a document on a single line with the minimal conventions.
pub fn write_compact(document: &XmlDocument) -> Result<String> {
    let mut out = String::from("<?xml version='1.0' encoding='UTF-8'?>");
    write_compact_element(&mut out, &document.root);
    Ok(out)
}

fn write_compact_element(out: &mut String, element: &XmlElement) {
    let name = element.qualified_name();
    out.push('<');
    out.push_str(&name);
    for attribute in &element.attributes {
        out.push(' ');
        out.push_str(&attribute.name);
        out.push_str("='");
        out.push_str(&escape(attribute.value.as_str()));
        out.push('\'');
    }

    if element.is_empty() {
        out.push_str(" />");
        return;
    }

    out.push('>');
    if let Some(text) = &element.text {
        out.push_str(&escape(text.as_str()));
    }
    for child in &element.children {
        write_compact_element(out, child);
    }
    out.push_str("</");
    out.push_str(&name);
    out.push('>');
}

fn serialize_error(err: impl std::fmt::Display) -> Error {
    Error::Serialize {
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn sample() -> XmlDocument {
        let mut root = XmlElement::with_namespace("request", "http://example.org/sky");
        let read = root.append_child(XmlElement::new("read"));
        read.set_attribute("database", "roma");
        read.append_child(XmlElement::new("date")).set_text("2013041600");
        root.append_child(XmlElement::new("transfer"));
        XmlDocument::new(root)
    }

    #[test]
    fn test_write_pretty_layout() {
        let output = write_pretty(&sample()).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(
            lines[0],
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#
        );
        assert_eq!(lines[1], r#"<request xmlns="http://example.org/sky">"#);
        assert_eq!(lines[2], r#"  <read database="roma">"#);
        assert_eq!(lines[3], "    <date>2013041600</date>");
    }

    #[test]
    fn test_write_compact_layout() {
        let output = write_compact(&sample()).unwrap();
        assert_eq!(
            output,
            "<?xml version='1.0' encoding='UTF-8'?><request xmlns='http://example.org/sky'>\
             <read database='roma'><date>2013041600</date></read><transfer /></request>"
        );
    }

    #[test]
    fn test_writers_escape_special_characters() {
        let mut root = XmlElement::new("root");
        root.set_attribute("q", "it's \"quoted\"");
        root.set_text("a < b & c");
        let document = XmlDocument::new(root);

        for output in [
            write_pretty(&document).unwrap(),
            write_compact(&document).unwrap(),
        ] {
            let reparsed = parse(&output).unwrap();
            assert_eq!(reparsed, document, "output: {}", output);
        }
    }

    #[test]
    fn test_writers_round_trip() {
        let document = sample();
        assert_eq!(parse(&write_pretty(&document).unwrap()).unwrap(), document);
        assert_eq!(parse(&write_compact(&document).unwrap()).unwrap(), document);
    }
}
