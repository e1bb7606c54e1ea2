//! Load-time validation of a parsed tree against a schema.
//!
//! Documents that do not fit the declared hierarchy are rejected up front
//! instead of having their unknown parts silently ignored.

use crate::error::{DefinitionError, Error, ParseError, Result};
use crate::schema::{Schema, TagDecl};
use marshall_xml::XmlElement;

/// Check that `root` is described by `schema`.
///
/// This verifies:
/// 1. The root element and default namespace match the declaration
/// 2. Every element is a declared child of its parent
/// 3. Unique tags occur at most once under each parent
/// 4. Unique tags carry only declared attributes
pub fn validate_tree(schema: &Schema, root: &XmlElement) -> Result<()> {
    let declared = schema.root();
    if root.name != declared.xml_name || root.prefix.is_some() {
        return Err(ParseError::RootMismatch {
            expected: declared.xml_name.clone(),
            found: root.qualified_name().into_owned(),
        }
        .into());
    }

    if let Some(expected) = schema.namespace() {
        let found = root.namespace().unwrap_or_default();
        if found != expected {
            return Err(ParseError::NamespaceMismatch {
                expected: expected.to_string(),
                found: found.to_string(),
            }
            .into());
        }
    }

    check_element(schema, declared, root)
}

fn check_element(schema: &Schema, decl: &TagDecl, element: &XmlElement) -> Result<()> {
    if decl.unique {
        check_attributes(schema, decl, element)?;
    }

    let mut unique_seen: Vec<&str> = Vec::new();
    for child in &element.children {
        let Some(child_decl) = schema.child_by_xml_name(decl, &child.name) else {
            return Err(ParseError::UnknownTag {
                tag: child.qualified_name().into_owned(),
                parent: element.name.clone(),
                position: child.position,
            }
            .into());
        };

        if child_decl.unique {
            if unique_seen.contains(&child.name.as_str()) {
                return Err(Error::InvalidStructure {
                    message: format!(
                        "<{}> contains more than one <{}> but '{}' is unique",
                        element.name, child.name, child_decl.ident
                    ),
                });
            }
            unique_seen.push(&child.name);
        }

        check_element(schema, child_decl, child)?;
    }
    Ok(())
}

fn check_attributes(schema: &Schema, decl: &TagDecl, element: &XmlElement) -> Result<()> {
    for attribute in &element.attributes {
        // Namespace declarations and prefixed attributes are outside the hierarchy.
        if attribute.is_namespace_declaration() || attribute.name.contains(':') {
            continue;
        }
        let declared = decl
            .attributes
            .iter()
            .filter_map(|ident| schema.attribute(ident))
            .any(|a| a.xml_name == attribute.name);
        if !declared {
            return Err(DefinitionError::UndeclaredAttribute {
                tag: element.name.clone(),
                attribute: attribute.name.clone(),
            }
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use marshall_xml::parse;
    use std::sync::Arc;

    fn schema() -> Arc<Schema> {
        Schema::builder("Order", "order")
            .namespace("http://example.org/order")
            .children("order", ["customer", "item"])
            .children("item", ["sku"])
            .unique(["customer", "sku"])
            .attributes("customer", ["id"])
            .build()
            .unwrap()
    }

    fn check(xml: &str) -> Result<()> {
        validate_tree(&schema(), &parse(xml).unwrap().root)
    }

    #[test]
    fn test_valid_document() {
        check(
            r#"<order xmlns="http://example.org/order">
                 <customer id="7"/>
                 <item sku-type="x"><sku>A1</sku></item>
                 <item><sku>B2</sku></item>
               </order>"#,
        )
        .unwrap();
    }

    #[test]
    fn test_root_mismatch() {
        match check(r#"<invoice xmlns="http://example.org/order"/>"#) {
            Err(Error::Parse(ParseError::RootMismatch { expected, found })) => {
                assert_eq!(expected, "order");
                assert_eq!(found, "invoice");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_namespace_mismatch() {
        let result = check(r#"<order xmlns="http://example.org/other"/>"#);
        assert!(matches!(
            result,
            Err(Error::Parse(ParseError::NamespaceMismatch { .. }))
        ));

        let result = check("<order/>");
        assert!(matches!(
            result,
            Err(Error::Parse(ParseError::NamespaceMismatch { ref found, .. })) if found.is_empty()
        ));
    }

    #[test]
    fn test_unknown_tag() {
        let result = check(r#"<order xmlns="http://example.org/order"><item><price/></item></order>"#);
        match result {
            Err(Error::Parse(ParseError::UnknownTag {
                tag,
                parent,
                position,
            })) => {
                assert_eq!(tag, "price");
                assert_eq!(parent, "item");
                assert!(position.is_some());
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_tag_under_wrong_parent() {
        let result = check(r#"<order xmlns="http://example.org/order"><sku>A1</sku></order>"#);
        assert!(matches!(
            result,
            Err(Error::Parse(ParseError::UnknownTag { .. }))
        ));
    }

    #[test]
    fn test_duplicate_unique_tag() {
        let result = check(r#"<order xmlns="http://example.org/order"><customer/><customer/></order>"#);
        assert!(matches!(result, Err(Error::InvalidStructure { .. })));
    }

    #[test]
    fn test_undeclared_attribute_on_unique_tag() {
        let result = check(r#"<order xmlns="http://example.org/order"><customer vip="yes"/></order>"#);
        match result {
            Err(Error::Definition(DefinitionError::UndeclaredAttribute { tag, attribute })) => {
                assert_eq!(tag, "customer");
                assert_eq!(attribute, "vip");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_namespace_and_prefixed_attributes_are_exempt() {
        check(
            r#"<order xmlns="http://example.org/order"
                      xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
                      xsi:schemaLocation="x">
                 <customer xml:lang="en" id="1"/>
               </order>"#,
        )
        .unwrap();
    }
}
