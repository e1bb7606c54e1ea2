//! Behavioural properties of mappings.
//!
//! Each test pins down one guarantee: round-tripping, idempotent rendering,
//! uniqueness, ambiguity detection, path creation, and the handling of
//! unknown names.

use marshall::{CompactBackend, Error, Mapping, QuickXmlBackend, Schema, Source, XmlBackend, correct};
use std::sync::Arc;

fn nested_schema() -> Arc<Schema> {
    Schema::builder("Nested", "root")
        .children("root", ["a", "item"])
        .children("a", ["b"])
        .children("b", ["c"])
        .children("item", ["label"])
        .unique(["a", "b", "c"])
        .attributes("a", ["kind"])
        .build()
        .unwrap()
}

const SAMPLE: &str = r#"<root>
  <a kind="x &amp; y"><b><c>deep</c></b></a>
  <item><label>one</label></item>
  <item><label>two &lt;2&gt;</label></item>
</root>"#;

#[test]
fn test_round_trip_with_both_backends() {
    for backend in [
        Box::new(QuickXmlBackend) as Box<dyn XmlBackend>,
        Box::new(CompactBackend),
    ] {
        let name = backend.name();
        let original =
            Mapping::open_with(nested_schema(), Source::Text(SAMPLE.to_string()), backend).unwrap();
        let rendered = original.to_xml_string().unwrap();
        let reparsed = Mapping::parse(nested_schema(), &rendered).unwrap();
        assert_eq!(reparsed.document(), original.document(), "backend: {}", name);
    }
}

#[test]
fn test_rendering_is_idempotent() {
    let mapping = Mapping::parse(nested_schema(), SAMPLE).unwrap();
    let once = mapping.to_xml_string().unwrap();
    assert_eq!(correct(&once), once);

    let raw = CompactBackend.serialize(mapping.document()).unwrap();
    let corrected = correct(&raw);
    assert_eq!(correct(&corrected), corrected);
    assert_eq!(corrected, once);
}

#[test]
fn test_unique_tag_is_never_duplicated() {
    let mut mapping = Mapping::new(nested_schema());
    for value in ["1", "2", "3"] {
        mapping.set("c", value).unwrap();
        mapping.set("kind", value).unwrap();
        mapping.set("a.b.c", value).unwrap();
    }

    let root = mapping.root();
    assert_eq!(root.get_children("a").len(), 1);
    let a = root.get_children("a")[0];
    assert_eq!(a.get_children("b").len(), 1);
    assert_eq!(a.get_children("b")[0].get_children("c").len(), 1);
    assert_eq!(mapping.get("c").unwrap(), Some("3"));
}

#[test]
fn test_ambiguity_is_detected_and_resolved_by_removal() {
    let mut mapping = Mapping::parse(nested_schema(), SAMPLE).unwrap();

    assert!(matches!(mapping.get("label"), Err(Error::AmbiguousTag { .. })));
    assert!(matches!(mapping.set("label", "x"), Err(Error::AmbiguousTag { .. })));
    assert!(matches!(mapping.delete("label"), Err(Error::AmbiguousTag { .. })));

    mapping.remove("item", 0).unwrap();
    assert_eq!(mapping.get("label").unwrap(), Some("two <2>"));
}

#[test]
fn test_missing_path_write_creates_intermediates() {
    let mut mapping = Mapping::new(nested_schema());
    mapping.set("a.b.c", "v").unwrap();

    assert_eq!(mapping.get("a.b.c").unwrap(), Some("v"));
    let a = &mapping.root().children[0];
    assert_eq!(a.name, "a");
    assert_eq!(a.children[0].name, "b");
    assert_eq!(a.children[0].children[0].name, "c");
    assert_eq!(a.children[0].children[0].text(), Some("v"));
}

#[test]
fn test_repeatable_write_creates_exactly_one_instance() {
    let mut mapping = Mapping::new(nested_schema());
    mapping.set("label", "only").unwrap();
    mapping.set("label", "still only").unwrap();

    assert_eq!(mapping.count("item").unwrap(), 1);
    assert_eq!(mapping.get("label").unwrap(), Some("still only"));
}

#[test]
fn test_unknown_names_leave_tree_unchanged() {
    let mut mapping = Mapping::parse(nested_schema(), SAMPLE).unwrap();
    let before = mapping.document().clone();

    for name in ["d", "a.c", "a.b.c.d", "kind.a", "", "root.", "a..b"] {
        assert!(
            matches!(mapping.get(name), Err(Error::UnknownAttribute { .. })),
            "get {:?}",
            name
        );
        assert!(
            matches!(mapping.set(name, "x"), Err(Error::UnknownAttribute { .. })),
            "set {:?}",
            name
        );
        assert!(
            matches!(mapping.delete(name), Err(Error::UnknownAttribute { .. })),
            "delete {:?}",
            name
        );
    }
    assert_eq!(mapping.document(), &before);
}

#[test]
fn test_delete_keeps_ancestors() {
    let mut mapping = Mapping::new(nested_schema());
    mapping.set("c", "v").unwrap();

    assert!(mapping.delete("c").unwrap());
    assert_eq!(mapping.get("c").unwrap(), None);
    assert!(mapping.get("b").unwrap().is_none());
    assert_eq!(mapping.root().children[0].children[0].name, "b");
    assert!(mapping.root().children[0].children[0].children.is_empty());
}

#[test]
fn test_blank_values_read_the_same_after_reload() {
    let mut mapping = Mapping::new(nested_schema());
    mapping.set("c", "  ").unwrap();
    mapping.set("label", "").unwrap();
    mapping.set("kind", " ").unwrap();

    let reloaded = Mapping::parse(nested_schema(), &mapping.to_xml_string().unwrap()).unwrap();
    for name in ["c", "label", "kind"] {
        assert_eq!(
            reloaded.get(name).unwrap(),
            mapping.get(name).unwrap(),
            "name: {}",
            name
        );
    }
    assert_eq!(reloaded.get("c").unwrap(), None);
    assert_eq!(reloaded.get("kind").unwrap(), Some(" "));
    assert_eq!(reloaded.document(), mapping.document());
}
