//! XML namespace handling
//!
//! A [`NamespaceMap`] maps aliases (prefixes) to namespace URIs. The default
//! namespace is stored under the `None` alias. Maps are handed from parent to
//! child by value, so a declaration made on one node never leaks into a node
//! that was constructed before it.

use indexmap::IndexMap;

/// XML Namespace URI
pub type NamespaceUri = String;

/// Namespace alias; `None` is the default namespace
pub type Alias = Option<String>;

/// Format a name in `{uri}local` (Clark) notation
pub fn clark_name(uri: &str, local: &str) -> String {
    format!("{{{}}}{}", uri, local)
}

/// Split a Clark-notation name into its URI and local part
pub fn split_clark_name(name: &str) -> (Option<&str>, &str) {
    if let Some(rest) = name.strip_prefix('{') {
        if let Some((uri, local)) = rest.split_once('}') {
            return (Some(uri), local);
        }
    }
    (None, name)
}

/// Mapping from alias to namespace URI, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceMap {
    entries: IndexMap<Alias, NamespaceUri>,
}

impl NamespaceMap {
    /// Create a new empty namespace map
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an alias to a URI, replacing any previous binding
    pub fn insert(&mut self, alias: Option<&str>, uri: impl Into<String>) {
        self.entries.insert(alias.map(str::to_string), uri.into());
    }

    /// Get the URI bound to an alias
    pub fn get(&self, alias: Option<&str>) -> Option<&str> {
        self.entries
            .get(&alias.map(str::to_string))
            .map(String::as_str)
    }

    /// Whether the alias is bound
    pub fn contains(&self, alias: Option<&str>) -> bool {
        self.get(alias).is_some()
    }

    /// Get the default namespace
    pub fn default_namespace(&self) -> Option<&str> {
        self.get(None)
    }

    /// All aliases bound to `uri`, sorted so the default alias comes first
    pub fn aliases_for(&self, uri: &str) -> Vec<Option<&str>> {
        let mut aliases: Vec<Option<&str>> = self
            .entries
            .iter()
            .filter(|(_, bound)| bound.as_str() == uri)
            .map(|(alias, _)| alias.as_deref())
            .collect();
        aliases.sort();
        aliases
    }

    /// Iterate over (alias, uri) pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (Option<&str>, &str)> {
        self.entries
            .iter()
            .map(|(alias, uri)| (alias.as_deref(), uri.as_str()))
    }

    /// Iterate over (alias, uri) pairs sorted by alias, default first
    pub fn iter_sorted(&self) -> impl Iterator<Item = (Option<&str>, &str)> {
        let mut pairs: Vec<_> = self.iter().collect();
        pairs.sort();
        pairs.into_iter()
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no alias is bound
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> FromIterator<(Option<&'a str>, &'a str)> for NamespaceMap {
    fn from_iter<I: IntoIterator<Item = (Option<&'a str>, &'a str)>>(iter: I) -> Self {
        let mut map = NamespaceMap::new();
        for (alias, uri) in iter {
            map.insert(alias, uri);
        }
        map
    }
}
