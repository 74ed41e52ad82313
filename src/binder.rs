//! Data binder facade
//!
//! [`DataBinder`] owns a [`TypeRegistry`], the [`Limits`] a parse runs under
//! and the [`SchemaValidator`] used for optional validation. It binds whole
//! documents in one call and serializes objects back to text.
//!
//! [`StreamingDataBinder`] binds incrementally: [`NodeStream`] reads the
//! source a chunk at a time and hands out each yield-on-completion node as
//! soon as its end tag has been seen.

use crate::binding::{BindingHandler, StreamingBindingHandler, TypeRegistry};
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::node::{NodeType, Value};
use crate::sax::{EventReader, Step};
use crate::schema::{self, SchemaValidator, XsdStructureValidator};
use crate::serialize::{self, Serializable};
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read, Seek, SeekFrom};
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};

/// Per-call options for [`DataBinder::parse_file_with`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Validate against the document's declared schema before binding
    pub validate: bool,
    /// Directory holding the candidate schema files
    pub schema_dir: Option<PathBuf>,
}

impl ParseOptions {
    /// Options with validation disabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that validate against schemas found in `schema_dir`
    pub fn validating(schema_dir: impl Into<PathBuf>) -> Self {
        Self {
            validate: true,
            schema_dir: Some(schema_dir.into()),
        }
    }
}

/// Binds XML documents to node trees and serializes objects to XML
#[derive(Debug)]
pub struct DataBinder {
    registry: TypeRegistry,
    limits: Limits,
    validator: Box<dyn SchemaValidator>,
}

impl Default for DataBinder {
    fn default() -> Self {
        Self::new()
    }
}

impl DataBinder {
    /// Create a binder with an empty registry, default limits and the
    /// built-in schema engine
    pub fn new() -> Self {
        Self {
            registry: TypeRegistry::new(),
            limits: Limits::default(),
            validator: Box::new(XsdStructureValidator::new()),
        }
    }

    /// Set the limits every parse runs under
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Replace the schema engine
    pub fn with_validator(mut self, validator: Box<dyn SchemaValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// The configured limits
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// The type registry
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Register a node type under `name` (default: the type's own tag) in
    /// `namespace` (default: the type's own alias)
    pub fn register_type(&mut self, node_type: NodeType, name: Option<&str>, namespace: Option<&str>) -> Result<()> {
        self.registry.register(node_type, name, namespace)
    }

    /// Bind a document held in a string
    pub fn parse_str(&self, xml: &str) -> Result<Value> {
        self.parse_buffered(xml.as_bytes())
    }

    /// Bind a document held in a string, validating it first when
    /// `options.validate` is set
    pub fn parse_str_with(&self, xml: &str, options: &ParseOptions) -> Result<Value> {
        self.parse_file_with(&mut Cursor::new(xml.as_bytes()), options)
    }

    /// Bind a document read from `source`
    pub fn parse_reader<R: Read>(&self, source: R) -> Result<Value> {
        self.parse_buffered(BufReader::new(source))
    }

    /// Bind a seekable stream from its start, without validation
    pub fn parse_file<R: Read + Seek>(&self, stream: &mut R) -> Result<Value> {
        self.parse_file_with(stream, &ParseOptions::default())
    }

    /// Bind a seekable stream from its start.
    ///
    /// With `options.validate` set, the document is validated first and a
    /// validation failure prevents the parse. The stream's position on entry
    /// is restored before returning, whatever the outcome.
    pub fn parse_file_with<R: Read + Seek>(&self, stream: &mut R, options: &ParseOptions) -> Result<Value> {
        let saved = stream.stream_position()?;
        let outcome = self.parse_from_start(stream, options);
        stream.seek(SeekFrom::Start(saved))?;
        outcome
    }

    /// Open and bind a file
    pub fn parse_path(&self, path: impl AsRef<Path>, options: &ParseOptions) -> Result<Value> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), validate = options.validate, "opening document");
        let mut file = File::open(path)?;
        self.parse_file_with(&mut file, options)
    }

    fn parse_from_start<R: Read + Seek>(&self, stream: &mut R, options: &ParseOptions) -> Result<Value> {
        stream.seek(SeekFrom::Start(0))?;
        if options.validate {
            self.validate(stream, options.schema_dir.as_deref())?;
        }
        self.parse_reader(&mut *stream)
    }

    fn parse_buffered<R: BufRead>(&self, source: R) -> Result<Value> {
        tracing::debug!(types = self.registry.len(), "parsing document");
        let mut handler = BindingHandler::new(&self.registry);
        let mut events = EventReader::new(source, self.limits.clone());
        events.run(&mut handler)?;
        let root = handler
            .take_root()
            .ok_or_else(|| Error::InvalidXml("no element found".to_string()))?;
        tracing::debug!(bytes = events.position(), "parsed document");
        Ok(root)
    }

    /// Serialize an object, with an XML declaration, indented when
    /// `pretty_print` is set
    pub fn to_xml<S: Serializable + ?Sized>(&self, obj: &S, pretty_print: bool) -> Result<String> {
        serialize::to_xml(obj, pretty_print)
    }

    /// Candidate schema file names declared by the stream's root element
    pub fn schema_locations_from_stream<R: Read + Seek>(stream: &mut R) -> Result<Vec<String>> {
        schema::schema_locations_from_stream(stream)
    }

    /// The first candidate present in `schema_dir`
    pub fn choose_schema_file<S: AsRef<str>>(files: &[S], schema_dir: Option<&Path>) -> Result<PathBuf> {
        schema::choose_schema_file(files, schema_dir)
    }

    /// Validate the whole stream against its declared schema with this
    /// binder's engine, returning the schema used
    pub fn validate<R: Read + Seek>(&self, stream: &mut R, schema_dir: Option<&Path>) -> Result<PathBuf> {
        schema::validate(stream, schema_dir, self.validator.as_ref())
    }
}

/// Binds documents incrementally, yielding completed nodes as they appear
#[derive(Debug, Clone, Default)]
pub struct StreamingDataBinder {
    registry: TypeRegistry,
    limits: Limits,
}

impl StreamingDataBinder {
    /// Create a streaming binder with an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the limits, including the read chunk size
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// The type registry
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Register a node type; see [`DataBinder::register_type`]
    pub fn register_type(&mut self, node_type: NodeType, name: Option<&str>, namespace: Option<&str>) -> Result<()> {
        self.registry.register(node_type, name, namespace)
    }

    /// Stream the yielding nodes of a document read from `source`
    pub fn parse_reader<R: Read>(&self, source: R) -> NodeStream<'_, R> {
        let reader = BufReader::with_capacity(self.limits.stream_chunk_size, source);
        NodeStream {
            events: EventReader::new(reader, self.limits.clone()),
            handler: StreamingBindingHandler::new(&self.registry),
            done: false,
        }
    }

    /// Stream the yielding nodes of a document held in a string
    pub fn parse_str<'a>(&'a self, xml: &'a str) -> NodeStream<'a, &'a [u8]> {
        self.parse_reader(xml.as_bytes())
    }
}

/// Lazy sequence of yielded nodes.
///
/// Input is consumed only when the queue of completed nodes is empty. The
/// iterator ends after the document ends or after the first error.
pub struct NodeStream<'r, R: Read> {
    events: EventReader<BufReader<R>>,
    handler: StreamingBindingHandler<'r>,
    done: bool,
}

impl<R: Read> NodeStream<'_, R> {
    /// The document root, once input is exhausted, unless the root was
    /// itself yielded
    pub fn take_root(&mut self) -> Option<Value> {
        self.handler.take_root()
    }

    /// Whether the stream has ended
    pub fn is_finished(&self) -> bool {
        self.done
    }
}

impl<R: Read> Iterator for NodeStream<'_, R> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.handler.next_item() {
                tracing::trace!(remaining = self.handler.pending(), "yielding node");
                return Some(Ok(item));
            }
            if self.done {
                return None;
            }
            match self.events.step(&mut self.handler) {
                Ok(Step::Continue) => {}
                Ok(Step::Finished) | Ok(Step::Stopped) => self.done = true,
                Err(err) => {
                    self.done = true;
                    self.handler.clear();
                    return Some(Err(err));
                }
            }
        }
    }
}

impl<R: Read> FusedIterator for NodeStream<'_, R> {}
