//! End-to-end binding tests
//!
//! Documents go through the full DataBinder path: event delivery, the
//! construction stack, node finalization and serialization back to text.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::fmt::Write as _;
use std::io::Cursor;
use xmlbind::{Child, DataBinder, Error, Limits, Node, NodeType, ParseOptions, Value, XML_NAMESPACE};

const CATALOG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<cat:catalog xmlns:cat="urn:catalog" xmlns:meta="urn:meta" xml:lang="en">
    <cat:title>Spring</cat:title>
    <cat:item meta:id="7" kind="book">
        <cat:price>12</cat:price>
        <cat:stock>true</cat:stock>
        <cat:note/>
    </cat:item>
    <cat:item meta:id="8" kind="pen">
        <cat:price>not a number</cat:price>
        <cat:stock>0</cat:stock>
    </cat:item>
</cat:catalog>"#;

fn catalog_binder() -> DataBinder {
    let mut binder = DataBinder::new();
    binder
        .register_type(NodeType::generic().with_promoted(["cat:title"]), Some("catalog"), Some("cat"))
        .unwrap();
    binder.register_type(NodeType::integer(), Some("price"), Some("cat")).unwrap();
    binder.register_type(NodeType::boolean(), Some("stock"), Some("cat")).unwrap();
    binder.register_type(NodeType::null(), Some("note"), Some("cat")).unwrap();
    binder
}

fn root_node(value: Value) -> Node {
    value.into_node().expect("structural root")
}

#[test]
fn test_catalog_binding() {
    let root = root_node(catalog_binder().parse_str(CATALOG).unwrap());

    assert_eq!(root.name(), "cat:catalog");
    assert_eq!(root.absolute_name(), "{urn:catalog}catalog");
    assert_eq!(root.get_attribute("lang", Some("xml")), Some("en"));
    assert_eq!(root.namespace_map().get(Some("xml")), Some(XML_NAMESPACE));

    let items = root.get_children("item", Some("cat"));
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].get_attribute_by_namespace("id", Some("urn:meta")), Some("7"));
    assert_eq!(items[0].get_attribute("kind", None), Some("book"));
    assert_eq!(
        items[0].children(),
        &[Child::Integer(12), Child::Boolean(true), Child::Null]
    );
    assert_eq!(items[1].children(), &[Child::Integer(0), Child::Boolean(false)]);
}

#[test]
fn test_promoted_title_is_not_a_child() {
    let root = root_node(catalog_binder().parse_str(CATALOG).unwrap());
    let title = root.promoted("cat:title").and_then(Child::as_node).unwrap();
    assert_eq!(title.get_text(), "Spring");
    assert!(root.get_children("title", Some("cat")).is_empty());
}

#[test]
fn test_catalog_round_trip() {
    let binder = catalog_binder();
    let root = binder.parse_str(CATALOG).unwrap();
    let xml = binder.to_xml(&root, true).unwrap();

    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
    assert!(xml.contains("<cat:catalog xmlns:cat=\"urn:catalog\" xmlns:meta=\"urn:meta\" xml:lang=\"en\">"));
    assert!(!xml.contains("xmlns:xml"));
    assert!(xml.contains("<cat:item kind=\"book\" meta:id=\"7\">true</cat:item>"));
    assert!(xml.contains("<cat:title>Spring</cat:title>"));

    let again = binder.parse_str(&xml).unwrap();
    let items = again.as_node().unwrap().get_children("item", Some("cat"));
    assert_eq!(items.len(), 2);
}

#[test]
fn test_child_order_applies_on_output() {
    let mut binder = DataBinder::new();
    binder
        .register_type(NodeType::generic().with_child_order(["head", "body"]), Some("page"), None)
        .unwrap();
    let root = binder.parse_str("<page><zeta/><body/><alpha/><head/></page>").unwrap();
    assert_eq!(
        binder.to_xml(&root, false).unwrap(),
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><page><head/><body/><alpha/><zeta/></page>"
    );
}

#[test]
fn test_default_namespace() {
    let root = root_node(
        DataBinder::new()
            .parse_str(r#"<feed xmlns="urn:feed"><entry id="1"/></feed>"#)
            .unwrap(),
    );
    assert_eq!(root.alias(), None);
    assert_eq!(root.namespace_uri(), Some("urn:feed"));
    assert_eq!(root.absolute_name(), "{urn:feed}feed");
    let entry = &root.get_children("entry", None)[0];
    assert_eq!(entry.absolute_name(), "{urn:feed}entry");
    assert_eq!(
        root.iter_attributes(),
        vec![("xmlns".to_string(), "urn:feed".to_string())]
    );
}

#[test]
fn test_alias_survives_shared_default_namespace() {
    let binder = DataBinder::new();
    let first = binder
        .parse_str(r#"<r xmlns="urn:d" xmlns:x="urn:d"><x:c/><c/></r>"#)
        .unwrap();
    let rendered = binder.to_xml(&first, false).unwrap();
    assert_eq!(
        rendered,
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><r xmlns=\"urn:d\" xmlns:x=\"urn:d\"><x:c/><c/></r>"
    );
    let second = binder.parse_str(&rendered).unwrap();
    assert_eq!(first, second);
    assert_eq!(root_node(second).get_children("c", Some("x")).len(), 1);
}

#[test]
fn test_scoped_declarations() {
    let err = DataBinder::new()
        .parse_str(r#"<r><a xmlns:p="urn:p"><p:x/></a><b><p:y/></b></r>"#)
        .unwrap_err();
    assert!(matches!(err, Error::UndefinedNamespace(ref alias) if alias == "p"));
}

#[test]
fn test_errors() {
    let binder = DataBinder::new();
    assert!(matches!(binder.parse_str("<a><b></a>"), Err(Error::InvalidXml(_))));
    assert!(matches!(binder.parse_str(""), Err(Error::InvalidXml(_))));
    assert!(matches!(binder.parse_str("<a/><b/>"), Err(Error::InvalidXml(_))));
    assert!(matches!(
        binder.parse_str("<a q:attr='1'/>"),
        Err(Error::UndefinedNamespace(ref alias)) if alias == "q"
    ));
}

#[test]
fn test_limits() {
    let binder = DataBinder::new().with_limits(Limits {
        max_attributes: 1,
        ..Limits::default()
    });
    assert!(matches!(binder.parse_str("<a x='1' y='2'/>"), Err(Error::LimitExceeded(_))));

    let binder = DataBinder::new().with_limits(Limits {
        max_document_size: 16,
        ..Limits::default()
    });
    let big = format!("<a>{}</a>", "x".repeat(64));
    assert!(matches!(binder.parse_str(&big), Err(Error::LimitExceeded(_))));
}

#[test]
fn test_parse_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.xml");
    std::fs::write(&path, "<doc><v>1</v></doc>").unwrap();

    let root = DataBinder::new().parse_path(&path, &ParseOptions::new()).unwrap();
    assert_eq!(root.as_node().unwrap().get_children("v", None)[0].get_text(), "1");

    let missing = dir.path().join("missing.xml");
    assert!(matches!(
        DataBinder::new().parse_path(&missing, &ParseOptions::new()),
        Err(Error::Io(_))
    ));
}

#[test]
fn test_parse_file_from_the_start() {
    let binder = DataBinder::new();
    let mut stream = Cursor::new(b"<doc>x</doc>".to_vec());
    stream.set_position(5);
    let root = root_node(binder.parse_file(&mut stream).unwrap());
    assert_eq!(root.get_text(), "x");
    assert_eq!(stream.position(), 5);
}

// ---------------------------------------------------------------------------
// Generated documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Body {
    Text(String),
    Children(Vec<GenElement>),
}

#[derive(Debug, Clone)]
struct GenElement {
    alias: Option<&'static str>,
    name: String,
    attrs: Vec<(Option<&'static str>, String, String)>,
    body: Body,
}

impl GenElement {
    fn render(&self, out: &mut String, declarations: &str) {
        let tag = match self.alias {
            Some(alias) => format!("{}:{}", alias, self.name),
            None => self.name.clone(),
        };
        let _ = write!(out, "<{}{}", tag, declarations);
        for (alias, key, value) in &self.attrs {
            match alias {
                Some(alias) => {
                    let _ = write!(out, r#" {}:{}="{}""#, alias, key, value);
                }
                None => {
                    let _ = write!(out, r#" {}="{}""#, key, value);
                }
            }
        }
        match &self.body {
            Body::Children(children) if children.is_empty() => out.push_str("/>"),
            Body::Children(children) => {
                out.push('>');
                for child in children {
                    child.render(out, "");
                }
                let _ = write!(out, "</{}>", tag);
            }
            Body::Text(text) => {
                let _ = write!(out, ">{}</{}>", text, tag);
            }
        }
    }
}

fn alias_strategy() -> impl Strategy<Value = Option<&'static str>> {
    prop_oneof![Just(None), Just(Some("a")), Just(Some("b"))]
}

fn attrs_strategy() -> impl Strategy<Value = Vec<(Option<&'static str>, String, String)>> {
    prop::collection::btree_map(
        ("[a-z]{1,5}", prop_oneof![Just(None), Just(Some("a"))]),
        "[a-z0-9 ]{0,8}",
        0..3,
    )
    .prop_map(|attrs| {
        attrs
            .into_iter()
            .map(|((key, alias), value)| (alias, key, value))
            .collect::<Vec<_>>()
    })
    .prop_filter("xmlns is a declaration, not an attribute", |attrs| {
        attrs.iter().all(|(_, key, _)| key != "xmlns")
    })
}

fn element_strategy() -> impl Strategy<Value = GenElement> {
    let leaf = (alias_strategy(), "[a-z]{1,6}", attrs_strategy(), "[a-z0-9]{1,8}").prop_map(
        |(alias, name, attrs, text)| GenElement {
            alias,
            name,
            attrs,
            body: Body::Text(text),
        },
    );
    leaf.prop_recursive(3, 24, 4, |inner| {
        (
            alias_strategy(),
            "[a-z]{1,6}",
            attrs_strategy(),
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|(alias, name, attrs, children)| GenElement {
                alias,
                name,
                attrs,
                body: Body::Children(children),
            })
    })
}

proptest! {
    #[test]
    fn parse_to_xml_parse_is_stable(
        doc in element_strategy(),
        shared_default in any::<bool>(),
        pretty in any::<bool>(),
    ) {
        // The default namespace may share its URI with alias `a`
        let declarations = if shared_default {
            r#" xmlns="urn:a" xmlns:a="urn:a" xmlns:b="urn:b""#
        } else {
            r#" xmlns:a="urn:a" xmlns:b="urn:b""#
        };
        let mut xml = String::new();
        doc.render(&mut xml, declarations);

        let binder = DataBinder::new();
        let first = binder.parse_str(&xml).unwrap();
        let rendered = binder.to_xml(&first, pretty).unwrap();
        let second = binder.parse_str(&rendered).unwrap();
        prop_assert_eq!(first, second);
    }
}
