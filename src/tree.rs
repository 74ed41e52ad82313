//! In-memory element tree and its rendering to XML text
//!
//! [`Element`] is the output-side tree every serializable object projects
//! onto. Names are stored in `{uri}local` notation (or bare when the name
//! has no namespace); each element also carries the namespace declarations
//! it introduces. Rendering maps URIs back onto prefixes that are in scope,
//! inventing `ns0`, `ns1`, ... declarations for URIs that have none.

use crate::error::{Error, Result};
use crate::namespaces::{split_clark_name, NamespaceMap};
use crate::XML_NAMESPACE;
use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

/// Element in an output tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Element name, `{uri}local` or bare
    pub name: String,
    /// Preferred prefix for the name, used when it is bound to the same URI
    /// in scope
    pub prefix: Option<String>,
    /// Attributes, names in `{uri}local` or bare form
    pub attributes: IndexMap<String, String>,
    /// Namespace declarations introduced by this element
    pub namespaces: NamespaceMap,
    /// Text content (if any)
    pub text: Option<String>,
    /// Child elements
    pub children: Vec<Element>,
}

impl Element {
    /// Create a new element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create an element from a name, attributes and namespace declarations
    pub fn with_parts(
        name: impl Into<String>,
        attributes: IndexMap<String, String>,
        namespaces: NamespaceMap,
    ) -> Self {
        Self {
            name: name.into(),
            prefix: None,
            attributes,
            namespaces,
            text: None,
            children: Vec::new(),
        }
    }

    /// Get the local name of the element
    pub fn local_name(&self) -> &str {
        split_clark_name(&self.name).1
    }

    /// Get the namespace URI of the element
    pub fn namespace(&self) -> Option<&str> {
        split_clark_name(&self.name).0
    }

    /// Get an attribute value by its (possibly `{uri}`-qualified) name
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Set an attribute
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Add a child element
    pub fn add_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Set text content
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    /// Find child elements by local name
    pub fn find_children(&self, local_name: &str) -> Vec<&Element> {
        self.children
            .iter()
            .filter(|e| e.local_name() == local_name)
            .collect()
    }

    /// Render the tree as a UTF-8 document with an XML declaration
    pub fn to_xml_string(&self, pretty_print: bool) -> Result<String> {
        let mut buf = Vec::with_capacity(512);
        {
            let mut writer = if pretty_print {
                Writer::new_with_indent(&mut buf, b' ', 2)
            } else {
                Writer::new(&mut buf)
            };
            writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
                .map_err(write_error)?;
            let mut scopes = Vec::new();
            write_element(&mut writer, self, &mut scopes)?;
        }
        if pretty_print {
            buf.push(b'\n');
        }
        String::from_utf8(buf).map_err(|e| Error::Serialization(e.to_string()))
    }
}

fn write_error(err: quick_xml::Error) -> Error {
    Error::Serialization(err.to_string())
}

type Scope = Vec<(Option<String>, String)>;

fn write_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    elem: &Element,
    scopes: &mut Vec<Scope>,
) -> Result<()> {
    let mut declared: Scope = elem
        .namespaces
        .iter_sorted()
        .filter(|(alias, _)| *alias != Some("xml"))
        .map(|(alias, uri)| (alias.map(str::to_string), uri.to_string()))
        .collect();

    let name = qualify(&elem.name, elem.prefix.as_deref(), false, scopes, &mut declared);
    let attributes: Vec<(String, &str)> = elem
        .attributes
        .iter()
        .map(|(key, value)| (qualify(key, None, true, scopes, &mut declared), value.as_str()))
        .collect();

    let mut start = BytesStart::new(name.as_str());
    for (alias, uri) in &declared {
        let key = match alias {
            Some(alias) => format!("xmlns:{}", alias),
            None => "xmlns".to_string(),
        };
        start.push_attribute((key.as_str(), uri.as_str()));
    }
    for (key, value) in &attributes {
        start.push_attribute((key.as_str(), *value));
    }

    let text = elem.text.as_deref().filter(|t| !t.is_empty());
    if text.is_none() && elem.children.is_empty() {
        writer.write_event(Event::Empty(start)).map_err(write_error)?;
        return Ok(());
    }

    writer.write_event(Event::Start(start)).map_err(write_error)?;
    if let Some(text) = text {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(write_error)?;
    }
    scopes.push(declared);
    for child in &elem.children {
        write_element(writer, child, scopes)?;
    }
    scopes.pop();
    writer
        .write_event(Event::End(BytesEnd::new(name.as_str())))
        .map_err(write_error)?;
    Ok(())
}

/// Turn a `{uri}local` name into `prefix:local` using the bindings in scope,
/// declaring a fresh prefix on the current element when none fits.
fn qualify(
    name: &str,
    preferred: Option<&str>,
    is_attribute: bool,
    scopes: &[Scope],
    declared: &mut Scope,
) -> String {
    let (uri, local) = split_clark_name(name);
    let uri = match uri {
        Some(uri) if !uri.is_empty() => uri,
        _ => return local.to_string(),
    };
    if uri == XML_NAMESPACE {
        return format!("xml:{}", local);
    }

    // Effective bindings, innermost wins
    let mut effective: IndexMap<Option<&str>, &str> = IndexMap::new();
    for scope in scopes.iter().chain(std::iter::once(&*declared)) {
        for (alias, bound) in scope {
            effective.insert(alias.as_deref(), bound.as_str());
        }
    }
    if let Some(alias) = preferred {
        if effective.get(&Some(alias)) == Some(&uri) {
            return format!("{}:{}", alias, local);
        }
    }
    let mut candidates: Vec<Option<&str>> = effective
        .iter()
        .filter(|(alias, bound)| **bound == uri && !(is_attribute && alias.is_none()))
        .map(|(alias, _)| *alias)
        .collect();
    candidates.sort();
    if let Some(alias) = candidates.first() {
        return match alias {
            Some(alias) => format!("{}:{}", alias, local),
            None => local.to_string(),
        };
    }

    let mut counter = 0;
    let prefix = loop {
        let candidate = format!("ns{}", counter);
        if !effective.contains_key(&Some(candidate.as_str())) {
            break candidate;
        }
        counter += 1;
    };
    let qualified = format!("{}:{}", prefix, local);
    declared.push((Some(prefix), uri.to_string()));
    qualified
}
