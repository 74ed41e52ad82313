//! Post-parse dispatch
//!
//! A [`NodeDispatcher`] maps absolute element names to factories and turns
//! bound nodes into richer domain values after parsing. It never takes
//! part in binding itself.

use crate::names::split_namespace;
use crate::namespaces::{clark_name, NamespaceMap};
use crate::node::Node;
use std::collections::HashMap;
use std::fmt;

/// A value that can be built from a node carrying its declared tag
pub trait DispatchTarget: Sized {
    /// Qualified tag (`alias:name` or `name`) this target handles, if any
    fn tag() -> Option<&'static str>;

    /// Build the value from a node
    fn from_node(node: &Node) -> Self;
}

type Factory<T> = Box<dyn Fn(&Node) -> T + Send + Sync>;

/// Table from absolute element names to factories producing `T`
pub struct NodeDispatcher<T> {
    ns_map: NamespaceMap,
    table: HashMap<String, Factory<T>>,
}

impl<T> fmt::Debug for NodeDispatcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.table.keys().collect();
        keys.sort();
        f.debug_struct("NodeDispatcher")
            .field("ns_map", &self.ns_map)
            .field("keys", &keys)
            .finish()
    }
}

impl<T> Default for NodeDispatcher<T> {
    fn default() -> Self {
        Self::new(NamespaceMap::new())
    }
}

impl<T> NodeDispatcher<T> {
    /// Create a dispatcher resolving registration aliases through `ns_map`
    pub fn new(ns_map: NamespaceMap) -> Self {
        Self {
            ns_map,
            table: HashMap::new(),
        }
    }

    fn key(&self, name: &str, alias: Option<&str>) -> String {
        match self.ns_map.get(alias) {
            Some(uri) => clark_name(uri, name),
            None => name.to_string(),
        }
    }

    /// Register a factory for `name` in the namespace bound to `alias`
    pub fn register_fn<F>(&mut self, name: &str, alias: Option<&str>, factory: F)
    where
        F: Fn(&Node) -> T + Send + Sync + 'static,
    {
        let key = self.key(name, alias);
        tracing::debug!(key = %key, "registering dispatch target");
        self.table.insert(key, Box::new(factory));
    }

    /// Register a target under its declared tag.
    ///
    /// Returns `false`, registering nothing, when the target declares no tag.
    pub fn register<C>(&mut self) -> bool
    where
        C: DispatchTarget + Into<T> + 'static,
        T: 'static,
    {
        let Some(tag) = C::tag() else {
            return false;
        };
        let (alias, name) = split_namespace(tag);
        self.register_fn(name, alias, |node| C::from_node(node).into());
        true
    }

    /// Register several factories keyed by qualified tag
    pub fn register_all<I, S, F>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (S, F)>,
        S: AsRef<str>,
        F: Fn(&Node) -> T + Send + Sync + 'static,
    {
        for (tag, factory) in entries {
            let (alias, name) = split_namespace(tag.as_ref());
            self.register_fn(name, alias, factory);
        }
    }

    /// Whether a factory is registered for an absolute name
    pub fn contains(&self, absolute_name: &str) -> bool {
        self.table.contains_key(absolute_name)
    }

    /// Number of registered factories
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Build a value for `node` with the factory registered for its
    /// absolute name, or `None` when there is none
    pub fn dispatch(&self, node: &Node) -> Option<T> {
        self.table.get(&node.absolute_name()).map(|factory| factory(node))
    }
}
