//! Streaming binding tests

use pretty_assertions::assert_eq;
use std::io::Cursor;
use xmlbind::{to_xml, Child, Error, Limits, NodeType, StreamingDataBinder, Value};

fn feed(entries: usize) -> String {
    let mut xml = String::from(r#"<atom:feed xmlns:atom="urn:atom" xmlns:x="urn:extra">"#);
    for n in 0..entries {
        xml.push_str(&format!(
            r#"<atom:entry x:seq="{n}"><atom:title>entry {n}</atom:title><atom:size>{n}</atom:size></atom:entry>"#
        ));
    }
    xml.push_str("<atom:updated>today</atom:updated></atom:feed>");
    xml
}

fn entry_binder(chunk: usize) -> StreamingDataBinder {
    let mut binder = StreamingDataBinder::new().with_limits(Limits::default().with_stream_chunk_size(chunk));
    binder
        .register_type(NodeType::generic().yielding(), Some("entry"), Some("atom"))
        .unwrap();
    binder
        .register_type(NodeType::integer(), Some("size"), Some("atom"))
        .unwrap();
    binder
}

#[test]
fn test_entries_arrive_in_document_order() {
    let xml = feed(50);
    let binder = entry_binder(16);
    let mut stream = binder.parse_reader(Cursor::new(xml.into_bytes()));

    let mut seen = Vec::new();
    for item in stream.by_ref() {
        let entry = item.unwrap().into_node().unwrap();
        assert_eq!(entry.absolute_name(), "{urn:atom}entry");
        assert_eq!(
            entry.get_attribute_by_namespace("seq", Some("urn:extra")),
            Some(seen.len().to_string().as_str())
        );
        assert_eq!(entry.children()[1], Child::Integer(seen.len() as i64));
        seen.push(entry);
    }
    assert_eq!(seen.len(), 50);
    assert!(stream.is_finished());

    let root = stream.take_root().and_then(Value::into_node).unwrap();
    assert!(root.get_children("entry", Some("atom")).is_empty());
    assert_eq!(root.get_children("updated", Some("atom"))[0].get_text(), "today");
}

#[test]
fn test_chunk_size_does_not_change_the_result() {
    let xml = feed(7);
    let names = |chunk: usize| -> Vec<String> {
        entry_binder(chunk)
            .parse_str(&xml)
            .map(|item| {
                item.unwrap()
                    .as_node()
                    .map(|node| node.get_children("title", Some("atom"))[0].get_text().to_string())
                    .unwrap()
            })
            .collect()
    };
    let expected: Vec<String> = (0..7).map(|n| format!("entry {}", n)).collect();
    assert_eq!(names(1), expected);
    assert_eq!(names(64), expected);
    assert_eq!(names(64 * 1024), expected);
}

#[test]
fn test_yielded_leaves_are_finalized() {
    let mut binder = StreamingDataBinder::new();
    binder
        .register_type(NodeType::integer().yielding(), Some("n"), None)
        .unwrap();
    binder
        .register_type(NodeType::null().yielding(), Some("gap"), None)
        .unwrap();
    let values: Vec<Value> = binder
        .parse_str("<nums><n>1</n><gap/><n> 22 </n><n>x</n></nums>")
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        values,
        vec![Value::Integer(1), Value::Null, Value::Integer(22), Value::Integer(0)]
    );
}

#[test]
fn test_yielding_root_leaves_no_root() {
    let mut binder = StreamingDataBinder::new();
    binder
        .register_type(NodeType::generic().yielding(), Some("doc"), None)
        .unwrap();
    let mut stream = binder.parse_str("<doc><a/></doc>");
    let doc = stream.next().unwrap().unwrap();
    assert_eq!(doc.as_node().map(|node| node.name()), Some("doc".to_string()));
    assert!(stream.next().is_none());
    assert_eq!(stream.take_root(), None);
}

#[test]
fn test_no_yielding_types_gives_only_a_root() {
    let binder = StreamingDataBinder::new();
    let mut stream = binder.parse_str("<doc><a>1</a></doc>");
    assert!(stream.next().is_none());
    let root = stream.take_root().unwrap();
    assert_eq!(
        to_xml(&root, false).unwrap(),
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><doc><a>1</a></doc>"
    );
}

#[test]
fn test_undefined_alias_ends_the_stream() {
    let mut binder = StreamingDataBinder::new();
    binder
        .register_type(NodeType::generic().yielding(), Some("item"), None)
        .unwrap();
    let mut stream = binder.parse_str("<list><item/><item><q:bad/></item><item/></list>");
    assert!(stream.next().unwrap().is_ok());
    assert!(matches!(stream.next(), Some(Err(Error::UndefinedNamespace(ref alias))) if alias == "q"));
    assert!(stream.is_finished());
    assert!(stream.next().is_none());
}

#[test]
fn test_depth_limit_applies_while_streaming() {
    let binder = StreamingDataBinder::new().with_limits(Limits {
        max_depth: 3,
        ..Limits::default()
    });
    let results: Vec<_> = binder.parse_str("<a><b><c><d/></c></b></a>").collect();
    assert_eq!(results.len(), 1);
    assert!(matches!(results[0], Err(Error::LimitExceeded(_))));
}
