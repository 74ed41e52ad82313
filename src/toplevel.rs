//! Document element sniffing
//!
//! [`ToplevelNode`] reads only as far as the first start tag and records its
//! name and raw attributes, which is enough to find out which schemas a
//! document declares without binding the whole thing.

use crate::error::Result;
use crate::limits::Limits;
use crate::sax::{Attributes, ContentHandler, Control, EventReader};
use indexmap::IndexMap;
use std::io::{BufRead, BufReader, Read};

/// Name and attributes of a document's root element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToplevelNode {
    /// Qualified root name, `None` when the input had no readable root
    pub name: Option<String>,
    /// Raw root attributes, namespace declarations included
    pub attributes: IndexMap<String, String>,
}

impl ContentHandler for ToplevelNode {
    fn start_element(&mut self, name: &str, attributes: Attributes) -> Result<Control> {
        self.name = Some(name.to_string());
        self.attributes = attributes.into_iter().collect();
        Ok(Control::Stop)
    }

    fn characters(&mut self, _text: &str) -> Result<Control> {
        Ok(Control::Continue)
    }

    fn end_element(&mut self, _name: &str) -> Result<Control> {
        Ok(Control::Continue)
    }
}

impl ToplevelNode {
    /// Sniff the root element of a stream.
    ///
    /// Malformed input is not an error here: whatever was captured before
    /// the tokenizer gave up is kept, and an unreadable root leaves `name`
    /// unset.
    pub fn from_reader<R: Read>(source: R) -> Self {
        Self::from_buf_reader(BufReader::new(source))
    }

    /// Sniff the root element of a buffered stream
    pub fn from_buf_reader<R: BufRead>(source: R) -> Self {
        let mut node = Self::default();
        let mut events = EventReader::new(source, Limits::default());
        if let Err(err) = events.run(&mut node) {
            tracing::debug!(error = %err, "stopped sniffing the root element");
        }
        node
    }

    /// Sniff the root element of a string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(xml: &str) -> Self {
        Self::from_buf_reader(xml.as_bytes())
    }

    /// Attributes of the root that use an alias bound to `uri`, keyed by
    /// local name.
    ///
    /// Only declarations on the root itself are consulted. A default
    /// `xmlns` declaration selects the unaliased attributes. Returns an empty
    /// map when `uri` is not declared there.
    pub fn attributes_by_namespace(&self, uri: &str) -> IndexMap<String, String> {
        let aliases: Vec<Option<&str>> = self
            .attributes
            .iter()
            .filter(|(_, value)| value.as_str() == uri)
            .filter_map(|(key, _)| match key.as_str() {
                "xmlns" => Some(None),
                key => key.strip_prefix("xmlns:").map(Some),
            })
            .collect();

        self.attributes
            .iter()
            .filter(|(key, _)| key.as_str() != "xmlns" && !key.starts_with("xmlns:"))
            .filter_map(|(key, value)| {
                let (alias, local) = match key.split_once(':') {
                    Some((alias, local)) => (Some(alias), local),
                    None => (None, key.as_str()),
                };
                aliases
                    .contains(&alias)
                    .then(|| (local.to_string(), value.clone()))
            })
            .collect()
    }
}
