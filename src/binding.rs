//! Binding construction handlers
//!
//! [`BindingHandler`] is the stack machine that turns parse events into a
//! node tree: a node is pushed on its start tag, receives character data and
//! finalized children while open, and is finalized and attached to its
//! parent (or recorded as the root) on its end tag.
//!
//! [`StreamingBindingHandler`] adds yield-on-completion: nodes whose type is
//! marked yielding are queued instead of attached, so a caller can drain
//! them while the document is still being read.

use crate::error::{Error, Result};
use crate::names::split_namespace;
use crate::node::{Node, NodeType, Value};
use crate::sax::{Attributes, ContentHandler, Control};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

type TypeKey = (Option<String>, String);

/// Node types keyed by (namespace alias, tag)
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: HashMap<TypeKey, Arc<NodeType>>,
    default_type: Arc<NodeType>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Create an empty registry; unregistered tags bind as generic nodes
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
            default_type: Arc::new(NodeType::generic()),
        }
    }

    /// Register a node type.
    ///
    /// Without an explicit `name` the type's own tag identifier is used;
    /// without an explicit `namespace` the type's own alias is used.
    pub fn register(
        &mut self,
        node_type: NodeType,
        name: Option<&str>,
        namespace: Option<&str>,
    ) -> Result<()> {
        let name = match name.or(node_type.name()) {
            Some(name) => name.to_string(),
            None => {
                return Err(Error::Registration(
                    "node type has no tag name and none was given".to_string(),
                ))
            }
        };
        let namespace = namespace.or(node_type.namespace()).map(str::to_string);
        tracing::debug!(tag = %name, namespace = ?namespace, kind = ?node_type.kind(), "registering node type");
        self.types.insert((namespace, name), Arc::new(node_type));
        Ok(())
    }

    /// The type registered for an exact (alias, tag) pair
    pub fn get(&self, namespace: Option<&str>, tag: &str) -> Option<&Arc<NodeType>> {
        self.types
            .get(&(namespace.map(str::to_string), tag.to_string()))
    }

    /// The type to bind an element with, generic when unregistered
    pub fn lookup(&self, namespace: Option<&str>, tag: &str) -> Arc<NodeType> {
        self.get(namespace, tag)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.default_type))
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Event handler building a node tree
#[derive(Debug)]
pub struct BindingHandler<'r> {
    registry: &'r TypeRegistry,
    stack: Vec<Node>,
    root: Option<Value>,
}

impl<'r> BindingHandler<'r> {
    /// Create a handler with an empty stack
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            stack: Vec::new(),
            root: None,
        }
    }

    /// Number of open nodes
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Take the completed root, if the document has ended
    pub fn take_root(&mut self) -> Option<Value> {
        self.root.take()
    }

    fn open(&mut self, name: &str, attributes: Attributes) -> Result<()> {
        let (alias, tag) = split_namespace(name);
        let node_type = self.registry.lookup(alias, tag);
        let ns_map = self
            .stack
            .last()
            .map(Node::namespace_map)
            .unwrap_or_default();
        let mut node = Node::new(node_type, attributes, ns_map)?;
        node.set_name(name)?;
        self.stack.push(node);
        Ok(())
    }

    fn pop_matching(&mut self, name: &str) -> Node {
        let node = match self.stack.pop() {
            Some(node) => node,
            None => unreachable!("end tag </{}> with no open node", name),
        };
        assert_eq!(node.name(), name, "end tag does not match the open node");
        node
    }

    fn attach(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(parent) => parent.add_child(node),
            None => self.root = Some(node.finalize()),
        }
    }
}

impl ContentHandler for BindingHandler<'_> {
    fn start_element(&mut self, name: &str, attributes: Attributes) -> Result<Control> {
        self.open(name, attributes)?;
        Ok(Control::Continue)
    }

    fn characters(&mut self, text: &str) -> Result<Control> {
        if let Some(node) = self.stack.last_mut() {
            node.characters(text);
        }
        Ok(Control::Continue)
    }

    fn end_element(&mut self, name: &str) -> Result<Control> {
        let node = self.pop_matching(name);
        self.attach(node);
        Ok(Control::Continue)
    }
}

/// Event handler that queues yield-on-completion nodes instead of
/// attaching them to their parent
#[derive(Debug)]
pub struct StreamingBindingHandler<'r> {
    inner: BindingHandler<'r>,
    pending: VecDeque<Value>,
}

impl<'r> StreamingBindingHandler<'r> {
    /// Create a handler with an empty stack and queue
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            inner: BindingHandler::new(registry),
            pending: VecDeque::new(),
        }
    }

    /// Pop the oldest queued item
    pub fn next_item(&mut self) -> Option<Value> {
        self.pending.pop_front()
    }

    /// Drop every queued item
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Number of queued items
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Take the completed root, if the document has ended and the root
    /// was not itself yielded
    pub fn take_root(&mut self) -> Option<Value> {
        self.inner.take_root()
    }
}

impl ContentHandler for StreamingBindingHandler<'_> {
    fn start_element(&mut self, name: &str, attributes: Attributes) -> Result<Control> {
        self.inner.start_element(name, attributes)
    }

    fn characters(&mut self, text: &str) -> Result<Control> {
        self.inner.characters(text)
    }

    fn end_element(&mut self, name: &str) -> Result<Control> {
        let node = self.inner.pop_matching(name);
        if node.node_type().will_yield() {
            tracing::trace!(tag = %name, "queueing completed node");
            self.pending.push_back(node.finalize());
        } else {
            self.inner.attach(node);
        }
        Ok(Control::Continue)
    }
}
