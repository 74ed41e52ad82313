//! Tree serialization protocol
//!
//! Anything that can turn itself into an [`Element`] implements
//! [`Serializable`]. Most implementors get there through [`Projection`]: they
//! expose a name, their local namespace declarations, their attributes and
//! their children, and [`build_tree`] assembles the element from those four
//! pieces.

use crate::error::Result;
use crate::namespaces::NamespaceMap;
use crate::tree::Element;
use indexmap::IndexMap;
use std::borrow::Cow;
use std::fmt;

/// Parse a boolean the way boolean leaves do: trimmed, case-insensitive
/// `true` or `1` is true, everything else is false.
pub fn boolean_from_str(text: &str) -> bool {
    let text = text.trim();
    text.eq_ignore_ascii_case("true") || text == "1"
}

/// Canonical string form of a boolean
pub fn boolean_to_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Scalar attribute value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    /// Boolean, rendered as `true`/`false`
    Boolean(bool),
    /// Integer
    Integer(i64),
    /// Text
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Boolean(b) => f.write_str(boolean_to_str(*b)),
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Boolean(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Integer(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

/// One child handed to [`build_tree`]
pub enum Content<'a> {
    /// Character data; becomes the element's text
    Text(Cow<'a, str>),
    /// A nested object that builds its own subtree
    Object(&'a dyn Serializable),
}

impl fmt::Debug for Content<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Content::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Content::Object(_) => f.write_str("Object(..)"),
        }
    }
}

/// An object that can produce its own element tree
pub trait Serializable {
    /// Build the element tree rooted at this object
    fn element_tree(&self) -> Result<Element>;
}

impl<T: Serializable + ?Sized> Serializable for &T {
    fn element_tree(&self) -> Result<Element> {
        (**self).element_tree()
    }
}

impl<T: Serializable + ?Sized> Serializable for Box<T> {
    fn element_tree(&self) -> Result<Element> {
        (**self).element_tree()
    }
}

/// The four primitives [`build_tree`] consumes
pub trait Projection {
    /// Element name, `{uri}local` or bare
    fn element_name(&self) -> String;

    /// Namespace declarations made by this element
    fn local_namespaces(&self) -> NamespaceMap;

    /// Attributes with `{uri}`-qualified names
    fn element_attributes(&self) -> Vec<(String, Scalar)>;

    /// Children in output order
    fn element_children(&self) -> Vec<Content<'_>>;

    /// Prefix the element name should keep when it is still in scope
    fn preferred_prefix(&self) -> Option<String> {
        None
    }
}

/// Assemble an element from a projection, recursing into object children.
/// When several text children are present the last one wins.
pub fn build_tree<P: Projection + ?Sized>(obj: &P) -> Result<Element> {
    let attributes: IndexMap<String, String> = obj
        .element_attributes()
        .into_iter()
        .map(|(name, value)| (name, value.to_string()))
        .collect();
    let mut elem = Element::with_parts(obj.element_name(), attributes, obj.local_namespaces());
    elem.prefix = obj.preferred_prefix();
    for child in obj.element_children() {
        match child {
            Content::Object(object) => elem.add_child(object.element_tree()?),
            Content::Text(text) => elem.set_text(text.into_owned()),
        }
    }
    Ok(elem)
}

/// Render any serializable object as a UTF-8 document with an XML
/// declaration, indented when `pretty_print` is set
pub fn to_xml<S: Serializable + ?Sized>(obj: &S, pretty_print: bool) -> Result<String> {
    obj.element_tree()?.to_xml_string(pretty_print)
}

/// A named sequence of serializable children with no attributes of its own
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SerializableList<T> {
    /// Element name of the container
    pub tag: String,
    /// Items, each serialized as a child element
    pub items: Vec<T>,
}

impl<T> SerializableList<T> {
    /// Create an empty list container
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            items: Vec::new(),
        }
    }

    /// Create a list container holding `items`
    pub fn with_items(tag: impl Into<String>, items: Vec<T>) -> Self {
        Self {
            tag: tag.into(),
            items,
        }
    }

    /// Append an item
    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the container is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T: Serializable> Serializable for SerializableList<T> {
    fn element_tree(&self) -> Result<Element> {
        let mut elem = Element::new(self.tag.clone());
        for item in &self.items {
            elem.add_child(item.element_tree()?);
        }
        Ok(elem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    struct Leaf {
        name: &'static str,
        text: &'static str,
    }

    impl Projection for Leaf {
        fn element_name(&self) -> String {
            self.name.to_string()
        }

        fn local_namespaces(&self) -> NamespaceMap {
            NamespaceMap::new()
        }

        fn element_attributes(&self) -> Vec<(String, Scalar)> {
            vec![
                ("enabled".to_string(), Scalar::Boolean(true)),
                ("count".to_string(), Scalar::Integer(7)),
            ]
        }

        fn element_children(&self) -> Vec<Content<'_>> {
            vec![Content::Text(Cow::Borrowed(self.text))]
        }
    }

    impl Serializable for Leaf {
        fn element_tree(&self) -> Result<Element> {
            build_tree(self)
        }
    }

    #[test]
    fn test_boolean_conversions() {
        assert!(boolean_from_str("true"));
        assert!(boolean_from_str(" TRUE \n"));
        assert!(boolean_from_str("1"));
        assert!(!boolean_from_str("yes"));
        assert!(!boolean_from_str(""));
        assert_eq!(boolean_to_str(true), "true");
        assert_eq!(boolean_to_str(false), "false");
    }

    #[test]
    fn test_build_tree_stringifies_attributes() {
        let leaf = Leaf { name: "leaf", text: "hello" };
        let elem = leaf.element_tree().unwrap();
        assert_eq!(elem.get_attribute("enabled"), Some("true"));
        assert_eq!(elem.get_attribute("count"), Some("7"));
        assert_eq!(elem.text.as_deref(), Some("hello"));
    }

    #[test]
    fn test_serializable_list() {
        let list = SerializableList::with_items(
            "leaves",
            vec![Leaf { name: "a", text: "1" }, Leaf { name: "b", text: "2" }],
        );
        let elem = list.element_tree().unwrap();
        assert_eq!(elem.name, "leaves");
        assert!(elem.attributes.is_empty());
        assert_eq!(elem.children.len(), 2);
        assert_eq!(elem.children[1].name, "b");
    }

    proptest! {
        #[test]
        fn boolean_round_trip(value in any::<bool>()) {
            prop_assert_eq!(boolean_from_str(boolean_to_str(value)), value);
        }
    }
}
