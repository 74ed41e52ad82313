//! Bound node model
//!
//! A [`Node`] is one XML element while it is being bound and, for structural
//! node types, after binding as well. What a node does when its end tag is
//! seen is decided by its [`NodeType`]: generic nodes finalize into
//! themselves, leaf kinds collapse into a scalar [`Value`].
//!
//! Content is either text or elements, never both: when an element child
//! arrives after a text run, the text run is dropped.

use crate::error::{Error, Result};
use crate::names::{order_items, split_namespace, unsplit_namespace};
use crate::namespaces::{clark_name, NamespaceMap};
use crate::serialize::{boolean_from_str, boolean_to_str, build_tree, Content, Projection, Scalar, Serializable};
use crate::tree::Element;
use crate::XML_NAMESPACE;
use indexmap::IndexMap;
use std::borrow::Cow;
use std::sync::Arc;

/// How a node finalizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeKind {
    /// Structural container; finalizes into itself
    #[default]
    Generic,
    /// Text parsed as an integer, 0 when not numeric
    Integer,
    /// Text kept as a string, empty when absent
    String,
    /// `true`/`1` (case-insensitive, trimmed) is true, anything else false
    Boolean,
    /// Discards everything, finalizes to [`Value::Null`]
    Null,
}

impl NodeKind {
    /// Tag name a node of this kind gets when none is given
    pub fn default_name(self) -> Option<&'static str> {
        match self {
            NodeKind::Generic => None,
            NodeKind::Integer => Some("int"),
            NodeKind::String => Some("string"),
            NodeKind::Boolean => Some("bool"),
            NodeKind::Null => Some("none"),
        }
    }

    /// Whether this kind collapses into a scalar value
    pub fn is_leaf(self) -> bool {
        self != NodeKind::Generic
    }
}

/// Describes how elements bound to it are built and finalized.
///
/// This is what gets registered against a tag: the kind, the tag identifier
/// used when registering without an explicit name, an optional child order,
/// the tags promoted to single-valued fields, and whether the node is handed
/// out on completion when streaming.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeType {
    kind: NodeKind,
    name: Option<String>,
    namespace: Option<String>,
    child_order: Option<Vec<String>>,
    promoted: Vec<String>,
    will_yield: bool,
}

impl NodeType {
    /// Create a node type of the given kind
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            name: kind.default_name().map(str::to_string),
            ..Default::default()
        }
    }

    /// Generic structural container
    pub fn generic() -> Self {
        Self::new(NodeKind::Generic)
    }

    /// Integer leaf
    pub fn integer() -> Self {
        Self::new(NodeKind::Integer)
    }

    /// String leaf
    pub fn string() -> Self {
        Self::new(NodeKind::String)
    }

    /// Boolean leaf
    pub fn boolean() -> Self {
        Self::new(NodeKind::Boolean)
    }

    /// Null leaf
    pub fn null() -> Self {
        Self::new(NodeKind::Null)
    }

    /// Set the tag identifier
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the namespace alias the tag identifier lives in
    pub fn in_namespace(mut self, alias: impl Into<String>) -> Self {
        self.namespace = Some(alias.into());
        self
    }

    /// Declare an explicit child order (qualified tag names)
    pub fn with_child_order<I, S>(mut self, order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.child_order = Some(order.into_iter().map(Into::into).collect());
        self
    }

    /// Declare tags stored as single-valued fields instead of children
    pub fn with_promoted<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.promoted = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Mark nodes of this type as yield-on-completion
    pub fn yielding(mut self) -> Self {
        self.will_yield = true;
        self
    }

    /// The kind
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// The tag identifier, if any
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The namespace alias of the tag identifier, if any
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The declared child order, if any
    pub fn child_order(&self) -> Option<&[String]> {
        self.child_order.as_deref()
    }

    /// Whether `tag` is promoted to a single-valued field
    pub fn is_promoted(&self, tag: &str) -> bool {
        self.promoted.iter().any(|t| t == tag)
    }

    /// Whether nodes of this type are yielded on completion
    pub fn will_yield(&self) -> bool {
        self.will_yield
    }
}

/// Result of finalizing a node
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A structural node
    Node(Node),
    /// Integer leaf value
    Integer(i64),
    /// String leaf value
    String(String),
    /// Boolean leaf value
    Boolean(bool),
    /// Null leaf value
    Null,
}

impl Value {
    /// The node, if this is a structural value
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Take the node out, if this is a structural value
    pub fn into_node(self) -> Option<Node> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    /// The integer, if this is an integer value
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// The string, if this is a string value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The boolean, if this is a boolean value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Whether this is the null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Canonical text of a scalar value; `None` for nodes and null
    pub fn canonical_text(&self) -> Option<String> {
        match self {
            Value::Integer(i) => Some(i.to_string()),
            Value::String(s) => Some(s.clone()),
            Value::Boolean(b) => Some(boolean_to_str(*b).to_string()),
            Value::Node(_) | Value::Null => None,
        }
    }
}

impl Serializable for Value {
    fn element_tree(&self) -> Result<Element> {
        match self {
            Value::Node(node) => node.element_tree(),
            other => Err(Error::Serialization(format!(
                "a finalized {:?} has no element name",
                other
            ))),
        }
    }
}

/// One entry in a node's ordered children
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    /// Character data run
    Text(String),
    /// Finalized structural child
    Node(Node),
    /// Finalized integer child
    Integer(i64),
    /// Finalized string child
    String(String),
    /// Finalized boolean child
    Boolean(bool),
    /// Finalized null child
    Null,
}

impl Child {
    /// The node, if this child is structural
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Child::Node(node) => Some(node),
            _ => None,
        }
    }

    /// The text, if this child is a character data run
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Child::Text(text) => Some(text),
            _ => None,
        }
    }

    fn is_text(&self) -> bool {
        matches!(self, Child::Text(_))
    }
}

impl From<Value> for Child {
    fn from(value: Value) -> Self {
        match value {
            Value::Node(node) => Child::Node(node),
            Value::Integer(i) => Child::Integer(i),
            Value::String(s) => Child::String(s),
            Value::Boolean(b) => Child::Boolean(b),
            Value::Null => Child::Null,
        }
    }
}

type AttributeKey = (Option<String>, String);

/// One XML element bound into the tree
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    node_type: Arc<NodeType>,
    ns_map: NamespaceMap,
    name: (Option<String>, String),
    ns_attributes: NamespaceMap,
    attributes: IndexMap<AttributeKey, String>,
    children: Vec<Child>,
    promoted: IndexMap<String, Child>,
}

impl Node {
    /// Create a node from raw attributes and the namespace map inherited
    /// from its parent.
    ///
    /// `xmlns`/`xmlns:alias` attributes extend the node's copy of the map;
    /// every other attribute must use an alias bound after that, except
    /// `xml`, which binds to the XML namespace when undeclared.
    pub fn new<I, K, V>(node_type: Arc<NodeType>, attributes: I, ns_map: NamespaceMap) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let local = node_type.name().unwrap_or_default().to_string();
        let mut node = Self {
            node_type,
            ns_map,
            name: (None, local),
            ns_attributes: NamespaceMap::new(),
            attributes: IndexMap::new(),
            children: Vec::new(),
            promoted: IndexMap::new(),
        };
        node.set_attributes(attributes)?;
        Ok(node)
    }

    /// Create a generic node with a name and no attributes
    pub fn generic(name: &str) -> Result<Self> {
        let mut node = Self::new(
            Arc::new(NodeType::generic()),
            std::iter::empty::<(&str, String)>(),
            NamespaceMap::new(),
        )?;
        node.set_name(name)?;
        Ok(node)
    }

    fn set_attributes<I, K, V>(&mut self, attributes: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut others = Vec::new();
        for (key, value) in attributes {
            let key = key.as_ref();
            let value = value.into();
            match key.split_once(':') {
                Some(("xmlns", alias)) => {
                    self.ns_map.insert(Some(alias), value.clone());
                    self.ns_attributes.insert(Some(alias), value);
                }
                None if key == "xmlns" => {
                    self.ns_map.insert(None, value.clone());
                    self.ns_attributes.insert(None, value);
                }
                Some((alias, local)) => {
                    others.push(((Some(alias.to_string()), local.to_string()), value))
                }
                None => others.push(((None, key.to_string()), value)),
            }
        }

        for ((alias, local), value) in others {
            if let Some(alias) = alias.as_deref() {
                if alias == "xml" && !self.ns_map.contains(Some("xml")) {
                    self.ns_map.insert(Some("xml"), XML_NAMESPACE);
                }
                if !self.ns_map.contains(Some(alias)) {
                    return Err(Error::UndefinedNamespace(alias.to_string()));
                }
            }
            self.attributes.insert((alias, local), value);
        }
        Ok(())
    }

    /// Set the node's qualified name; the alias must be in scope
    pub fn set_name(&mut self, name: &str) -> Result<&mut Self> {
        let (alias, local) = split_namespace(name);
        if let Some(alias) = alias {
            if !self.ns_map.contains(Some(alias)) {
                return Err(Error::UndefinedNamespace(alias.to_string()));
            }
        }
        self.name = (alias.map(str::to_string), local.to_string());
        Ok(self)
    }

    /// The node's type
    pub fn node_type(&self) -> &NodeType {
        &self.node_type
    }

    /// Qualified name, `alias:local` or `local`
    pub fn name(&self) -> String {
        unsplit_namespace(&self.name.1, self.name.0.as_deref())
    }

    /// Local part of the name
    pub fn local_name(&self) -> &str {
        &self.name.1
    }

    /// Alias part of the name
    pub fn alias(&self) -> Option<&str> {
        self.name.0.as_deref()
    }

    /// Namespace URI of the node, resolved through its alias
    pub fn namespace_uri(&self) -> Option<&str> {
        self.ns_map.get(self.alias())
    }

    /// Name in `{uri}local` form; bare when there is neither an alias nor
    /// a default namespace
    pub fn absolute_name(&self) -> String {
        match self.namespace_uri() {
            Some(uri) => clark_name(uri, &self.name.1),
            None => self.name.1.clone(),
        }
    }

    /// A copy of the namespace map in effect for this node
    pub fn namespace_map(&self) -> NamespaceMap {
        self.ns_map.clone()
    }

    /// Attach a child, finalizing it.
    ///
    /// A trailing text run is replaced by the child. Promoted tags are stored
    /// as single-valued fields, last occurrence wins.
    pub fn add_child(&mut self, child: Node) {
        let tag = child.name();
        let value = child.finalize();

        if self.children.last().is_some_and(Child::is_text) {
            tracing::trace!(parent = %self.name(), child = %tag, "dropping text run before element");
            self.children.pop();
        }
        if self.node_type.is_promoted(&tag) {
            self.promoted.insert(tag, value.into());
        } else {
            self.children.push(value.into());
        }
    }

    /// Add character data. Consecutive runs merge; text after an element
    /// child is ignored.
    pub fn characters(&mut self, text: &str) -> &mut Self {
        match self.children.last_mut() {
            Some(Child::Text(run)) => run.push_str(text),
            Some(_) => {}
            None => self.children.push(Child::Text(text.to_string())),
        }
        self
    }

    /// Transform the node once its end tag has been seen
    pub fn finalize(self) -> Value {
        match self.node_type.kind() {
            NodeKind::Generic => Value::Node(self),
            NodeKind::Integer => Value::Integer(self.get_text().trim().parse().unwrap_or(0)),
            NodeKind::String => Value::String(self.get_text().to_string()),
            NodeKind::Boolean => Value::Boolean(boolean_from_str(self.get_text())),
            NodeKind::Null => Value::Null,
        }
    }

    /// Children in iteration order: declared order first, then the rest
    /// sorted by tag; parse order when no order is declared
    pub fn iter_children(&self) -> Vec<&Child> {
        match self.node_type.child_order() {
            Some(order) => order_items(&self.children, order, |child| {
                child.as_node().map(Node::name)
            }),
            None => self.children.iter().collect(),
        }
    }

    /// Children in parse order
    pub fn children(&self) -> &[Child] {
        &self.children
    }

    /// A promoted single-valued child
    pub fn promoted(&self, tag: &str) -> Option<&Child> {
        self.promoted.get(tag)
    }

    /// All promoted children, keyed by tag
    pub fn iter_promoted(&self) -> impl Iterator<Item = (&str, &Child)> {
        self.promoted.iter().map(|(tag, child)| (tag.as_str(), child))
    }

    /// Direct structural children with the given name
    pub fn get_children(&self, name: &str, alias: Option<&str>) -> Vec<&Node> {
        let wanted = unsplit_namespace(name, alias);
        self.iter_children()
            .into_iter()
            .filter_map(Child::as_node)
            .filter(|node| node.name() == wanted)
            .collect()
    }

    /// The first text run, or the empty string
    pub fn get_text(&self) -> &str {
        self.children
            .iter()
            .find_map(Child::as_text)
            .unwrap_or("")
    }

    /// Attribute value by name and alias
    pub fn get_attribute(&self, name: &str, alias: Option<&str>) -> Option<&str> {
        self.attributes
            .get(&(alias.map(str::to_string), name.to_string()))
            .map(String::as_str)
    }

    /// Attribute value by name and namespace URI.
    ///
    /// Every alias bound to `uri` is tried, default alias first, then in
    /// alias order. A `None` URI is the same as [`Node::get_attribute`]
    /// without an alias.
    pub fn get_attribute_by_namespace(&self, name: &str, uri: Option<&str>) -> Option<&str> {
        let Some(uri) = uri else {
            return self.get_attribute(name, None);
        };
        self.ns_map
            .aliases_for(uri)
            .into_iter()
            .find_map(|alias| self.get_attribute(name, alias))
    }

    /// Non-declaration attributes sorted by alias, then by name; the
    /// unaliased ones come first
    fn sorted_attributes(&self) -> Vec<(&AttributeKey, &String)> {
        let mut sorted: Vec<_> = self.attributes.iter().collect();
        sorted.sort_by(|(a, _), (b, _)| a.cmp(b));
        sorted
    }

    /// All attributes: namespace declarations first (sorted by alias), then
    /// the others sorted by alias and name
    pub fn iter_attributes(&self) -> Vec<(String, String)> {
        let declarations = self.ns_attributes.iter_sorted().map(|(alias, uri)| {
            let key = match alias {
                Some(alias) => format!("xmlns:{}", alias),
                None => "xmlns".to_string(),
            };
            (key, uri.to_string())
        });
        let others = self
            .sorted_attributes()
            .into_iter()
            .map(|((alias, name), value)| (unsplit_namespace(name, alias.as_deref()), value.clone()));
        declarations.chain(others).collect()
    }

    /// Namespace declarations made on this node, sorted by alias
    pub fn iter_namespaces(&self) -> impl Iterator<Item = (Option<&str>, &str)> {
        self.ns_attributes.iter_sorted()
    }

    fn qualified_to_clark(&self, alias: Option<&str>, local: &str) -> String {
        match alias.and_then(|alias| self.ns_map.get(Some(alias))) {
            Some(uri) => clark_name(uri, local),
            None => local.to_string(),
        }
    }

    fn promoted_element(&self, tag: &str, child: &Child) -> Result<Option<Element>> {
        let (alias, local) = split_namespace(tag);
        let mut elem = Element::new(self.qualified_to_clark(alias, local));
        elem.prefix = alias.map(str::to_string);
        match child {
            Child::Node(node) => return node.element_tree().map(Some),
            Child::Null => return Ok(None),
            Child::Text(text) | Child::String(text) => elem.set_text(text.clone()),
            Child::Integer(i) => elem.set_text(i.to_string()),
            Child::Boolean(b) => elem.set_text(boolean_to_str(*b)),
        }
        Ok(Some(elem))
    }
}

impl Projection for Node {
    fn element_name(&self) -> String {
        self.qualified_to_clark(self.alias(), self.local_name())
    }

    fn local_namespaces(&self) -> NamespaceMap {
        self.ns_attributes.clone()
    }

    fn element_attributes(&self) -> Vec<(String, Scalar)> {
        if self.node_type.kind().is_leaf() {
            return Vec::new();
        }
        self.sorted_attributes()
            .into_iter()
            .map(|((alias, name), value)| {
                (
                    self.qualified_to_clark(alias.as_deref(), name),
                    Scalar::Text(value.clone()),
                )
            })
            .collect()
    }

    fn element_children(&self) -> Vec<Content<'_>> {
        if self.node_type.kind().is_leaf() {
            return match self.clone().finalize().canonical_text() {
                Some(text) => vec![Content::Text(Cow::Owned(text))],
                None => Vec::new(),
            };
        }
        self.iter_children()
            .into_iter()
            .filter_map(|child| match child {
                Child::Text(text) => Some(Content::Text(Cow::Borrowed(text.as_str()))),
                Child::Node(node) => Some(Content::Object(node)),
                Child::String(text) => Some(Content::Text(Cow::Borrowed(text.as_str()))),
                Child::Integer(i) => Some(Content::Text(Cow::Owned(i.to_string()))),
                Child::Boolean(b) => Some(Content::Text(Cow::Borrowed(boolean_to_str(*b)))),
                Child::Null => None,
            })
            .collect()
    }

    fn preferred_prefix(&self) -> Option<String> {
        self.alias().map(str::to_string)
    }
}

impl Serializable for Node {
    fn element_tree(&self) -> Result<Element> {
        let mut elem = build_tree(self)?;
        if !self.node_type.kind().is_leaf() {
            for (tag, child) in self.iter_promoted() {
                if let Some(promoted) = self.promoted_element(tag, child)? {
                    elem.add_child(promoted);
                }
            }
        }
        Ok(elem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_with(node_type: NodeType, attrs: &[(&str, &str)], name: &str) -> Result<Node> {
        let mut node = Node::new(
            Arc::new(node_type),
            attrs.iter().map(|(k, v)| (*k, v.to_string())),
            NamespaceMap::new(),
        )?;
        node.set_name(name)?;
        Ok(node)
    }

    fn leaf(node_type: NodeType, text: &str) -> Value {
        let mut node = Node::new(
            Arc::new(node_type),
            std::iter::empty::<(&str, String)>(),
            NamespaceMap::new(),
        )
        .unwrap();
        node.characters(text);
        node.finalize()
    }

    #[test]
    fn test_namespace_declarations_split_from_attributes() {
        let node = node_with(
            NodeType::generic(),
            &[("xmlns", "urn:default"), ("xmlns:x", "urn:x"), ("x:a", "1"), ("b", "2")],
            "x:root",
        )
        .unwrap();

        assert_eq!(node.name(), "x:root");
        assert_eq!(node.absolute_name(), "{urn:x}root");
        assert_eq!(node.get_attribute("a", Some("x")), Some("1"));
        assert_eq!(node.get_attribute("b", None), Some("2"));
        assert_eq!(
            node.iter_attributes(),
            vec![
                ("xmlns".to_string(), "urn:default".to_string()),
                ("xmlns:x".to_string(), "urn:x".to_string()),
                ("b".to_string(), "2".to_string()),
                ("x:a".to_string(), "1".to_string()),
            ]
        );
    }

    #[test]
    fn test_undefined_namespace() {
        let err = node_with(NodeType::generic(), &[("y:a", "1")], "root").unwrap_err();
        assert!(matches!(err, Error::UndefinedNamespace(ref a) if a == "y"));

        let err = node_with(NodeType::generic(), &[], "z:root").unwrap_err();
        assert!(matches!(err, Error::UndefinedNamespace(ref a) if a == "z"));
    }

    #[test]
    fn test_xml_alias_is_implicit() {
        let node = node_with(NodeType::generic(), &[("xml:lang", "en")], "root").unwrap();
        assert_eq!(node.get_attribute("lang", Some("xml")), Some("en"));
        assert_eq!(node.get_attribute_by_namespace("lang", Some(XML_NAMESPACE)), Some("en"));
        assert_eq!(node.iter_namespaces().count(), 0);
    }

    #[test]
    fn test_absolute_name_without_namespace() {
        let node = Node::generic("plain").unwrap();
        assert_eq!(node.absolute_name(), "plain");

        let node = node_with(NodeType::generic(), &[("xmlns", "urn:d")], "plain").unwrap();
        assert_eq!(node.absolute_name(), "{urn:d}plain");
    }

    #[test]
    fn test_get_attribute_by_namespace_prefers_default() {
        let node = node_with(
            NodeType::generic(),
            &[("xmlns", "urn:x"), ("xmlns:b", "urn:x"), ("xmlns:a", "urn:x"), ("a:k", "from-a"), ("b:k", "from-b")],
            "root",
        )
        .unwrap();
        assert_eq!(node.get_attribute_by_namespace("k", Some("urn:x")), Some("from-a"));
        assert_eq!(node.get_attribute_by_namespace("k", Some("urn:none")), None);
        assert_eq!(node.get_attribute_by_namespace("k", None), None);
    }

    #[test]
    fn test_mixed_content_drops_text() {
        let mut parent = Node::generic("node").unwrap();
        parent.characters("Some ");
        parent.characters("text");
        assert_eq!(parent.get_text(), "Some text");

        let mut child = Node::generic("child").unwrap();
        child.characters("X");
        parent.add_child(child);
        parent.characters("trailing");

        assert_eq!(parent.children().len(), 1);
        assert_eq!(parent.get_text(), "");
        let child = parent.children()[0].as_node().unwrap();
        assert_eq!(child.get_text(), "X");
    }

    #[test]
    fn test_leaf_finalize() {
        assert_eq!(leaf(NodeType::integer(), "42"), Value::Integer(42));
        assert_eq!(leaf(NodeType::integer(), " -7 "), Value::Integer(-7));
        assert_eq!(leaf(NodeType::integer(), "abc"), Value::Integer(0));
        assert_eq!(leaf(NodeType::integer(), ""), Value::Integer(0));
        assert_eq!(leaf(NodeType::string(), "hi"), Value::String("hi".into()));
        assert_eq!(leaf(NodeType::string(), ""), Value::String(String::new()));
        assert_eq!(leaf(NodeType::boolean(), " True "), Value::Boolean(true));
        assert_eq!(leaf(NodeType::boolean(), "1"), Value::Boolean(true));
        assert_eq!(leaf(NodeType::boolean(), "no"), Value::Boolean(false));
        assert_eq!(leaf(NodeType::null(), "ignored"), Value::Null);
    }

    #[test]
    fn test_leaf_default_names() {
        let node = Node::new(
            Arc::new(NodeType::boolean()),
            std::iter::empty::<(&str, String)>(),
            NamespaceMap::new(),
        )
        .unwrap();
        assert_eq!(node.name(), "bool");
        assert_eq!(NodeKind::Null.default_name(), Some("none"));
        assert_eq!(NodeKind::Generic.default_name(), None);
    }

    #[test]
    fn test_promoted_children_last_wins() {
        let mut parent = node_with(NodeType::generic().with_promoted(["title"]), &[], "doc").unwrap();
        for text in ["first", "second"] {
            let mut title = node_with(NodeType::string(), &[], "title").unwrap();
            title.characters(text);
            parent.add_child(title);
        }
        parent.add_child(Node::generic("body").unwrap());

        assert_eq!(parent.promoted("title"), Some(&Child::String("second".into())));
        assert_eq!(parent.children().len(), 1);
    }

    #[test]
    fn test_child_order() {
        let mut parent = node_with(NodeType::generic().with_child_order(["c", "a"]), &[], "p").unwrap();
        for name in ["b", "a", "z", "c", "a"] {
            parent.add_child(Node::generic(name).unwrap());
        }
        let names: Vec<String> = parent
            .iter_children()
            .into_iter()
            .filter_map(Child::as_node)
            .map(Node::name)
            .collect();
        assert_eq!(names, vec!["c", "a", "a", "b", "z"]);
        // parse order is untouched
        assert_eq!(parent.children()[0].as_node().unwrap().name(), "b");
        assert_eq!(parent.get_children("a", None).len(), 2);
    }

    #[test]
    fn test_leaf_serializes_canonical_text_only() {
        let mut node = node_with(NodeType::boolean(), &[("extra", "x")], "flag").unwrap();
        node.characters("TRUE");
        let elem = node.element_tree().unwrap();
        assert_eq!(elem.name, "flag");
        assert!(elem.attributes.is_empty());
        assert_eq!(elem.text.as_deref(), Some("true"));
    }

    #[test]
    fn test_serialize_qualifies_names() {
        let mut node = node_with(
            NodeType::generic(),
            &[("xmlns:x", "urn:x"), ("x:a", "1"), ("b", "2")],
            "x:root",
        )
        .unwrap();
        node.characters("body");
        let elem = node.element_tree().unwrap();
        assert_eq!(elem.name, "{urn:x}root");
        assert_eq!(elem.prefix.as_deref(), Some("x"));
        assert_eq!(elem.get_attribute("{urn:x}a"), Some("1"));
        assert_eq!(elem.get_attribute("b"), Some("2"));
        assert_eq!(elem.namespaces.get(Some("x")), Some("urn:x"));
        assert_eq!(elem.text.as_deref(), Some("body"));
    }

    #[test]
    fn test_finalized_scalar_is_not_serializable() {
        assert!(matches!(Value::Integer(3).element_tree(), Err(Error::Serialization(_))));
    }
}
