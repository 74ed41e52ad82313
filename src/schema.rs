//! Schema resolution and validation
//!
//! A document names its schemas in the root's `xsi:schemaLocation`
//! attribute. [`schema_locations_from_stream`] sniffs the candidate file
//! names, [`choose_schema_file`] picks the first one present in a schema
//! directory, and [`validate`] runs a [`SchemaValidator`] over the document
//! with that file. Every function that reads a stream puts the stream back
//! where it found it.
//!
//! [`XsdStructureValidator`] is the built-in engine. It compiles the global
//! element declarations of one XSD file and checks element structure,
//! occurrence bounds and attributes. Simple-type facets are not checked.

use crate::error::{Error, Result, SchemaValidationError};
use crate::namespaces::clark_name;
use crate::toplevel::ToplevelNode;
use crate::{XML_NAMESPACE, XSD_NAMESPACE, XSI_NAMESPACE};
use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// XSD element names
mod xsd_elements {
    pub const SCHEMA: &str = "schema";
    pub const ELEMENT: &str = "element";
    pub const COMPLEX_TYPE: &str = "complexType";
    pub const SIMPLE_TYPE: &str = "simpleType";
    pub const SEQUENCE: &str = "sequence";
    pub const CHOICE: &str = "choice";
    pub const ALL: &str = "all";
    pub const ANY: &str = "any";
    pub const ATTRIBUTE: &str = "attribute";
    pub const ANY_ATTRIBUTE: &str = "anyAttribute";
    pub const COMPLEX_CONTENT: &str = "complexContent";
    pub const SIMPLE_CONTENT: &str = "simpleContent";
    pub const EXTENSION: &str = "extension";
    pub const RESTRICTION: &str = "restriction";
}

/// XSD attribute names
mod xsd_attrs {
    pub const NAME: &str = "name";
    pub const TYPE: &str = "type";
    pub const REF: &str = "ref";
    pub const BASE: &str = "base";
    pub const USE: &str = "use";
    pub const FORM: &str = "form";
    pub const MIXED: &str = "mixed";
    pub const TARGET_NAMESPACE: &str = "targetNamespace";
    pub const ELEMENT_FORM_DEFAULT: &str = "elementFormDefault";
    pub const MIN_OCCURS: &str = "minOccurs";
    pub const MAX_OCCURS: &str = "maxOccurs";
    pub const SCHEMA_LOCATION: &str = "schemaLocation";
}

/// Candidate schema file names declared by a document, in document order.
///
/// Each whitespace-separated token of the root's `xsi:schemaLocation`
/// contributes its basename, namespace tokens included; the directory
/// lookup in [`choose_schema_file`] filters out whatever does not exist.
/// The stream is read from its start and its position restored afterwards.
pub fn schema_locations_from_stream<R: Read + Seek>(stream: &mut R) -> Result<Vec<String>> {
    let saved = stream.stream_position()?;
    let sniffed = stream
        .seek(SeekFrom::Start(0))
        .map(|_| ToplevelNode::from_reader(&mut *stream));
    stream.seek(SeekFrom::Start(saved))?;
    schema_locations(&sniffed?)
}

/// Candidate schema file names declared on an already sniffed root
pub fn schema_locations(root: &ToplevelNode) -> Result<Vec<String>> {
    let Some(name) = root.name.as_deref() else {
        return Err(Error::InvalidXml("no root element found".to_string()));
    };
    let attributes = root.attributes_by_namespace(XSI_NAMESPACE);
    let Some(locations) = attributes.get(xsd_attrs::SCHEMA_LOCATION) else {
        return Err(Error::UnknownSchema(format!(
            "root element <{}> declares no schemaLocation",
            name
        )));
    };
    Ok(locations
        .split_whitespace()
        .map(|location| match location.rsplit_once('/') {
            Some((_, base)) => base.to_string(),
            None => location.to_string(),
        })
        .collect())
}

/// The first candidate (in document order) present in `schema_dir`
pub fn choose_schema_file<S: AsRef<str>>(files: &[S], schema_dir: Option<&Path>) -> Result<PathBuf> {
    let Some(dir) = schema_dir else {
        return Err(Error::UnknownSchema("no schema directory given".to_string()));
    };
    if !dir.is_dir() {
        return Err(Error::UnknownSchema(format!(
            "schema directory {} does not exist",
            dir.display()
        )));
    }
    for file in files {
        let candidate = dir.join(file.as_ref());
        if candidate.is_file() {
            tracing::debug!(schema = %candidate.display(), "chose schema file");
            return Ok(candidate);
        }
    }
    let names: Vec<&str> = files.iter().map(AsRef::as_ref).collect();
    Err(Error::UnknownSchema(format!(
        "none of [{}] found in {}",
        names.join(", "),
        dir.display()
    )))
}

/// Resolve the document's schema in `schema_dir` and validate the whole
/// stream against it, returning the schema used.
///
/// The stream position is restored whether or not validation succeeds.
pub fn validate<R: Read + Seek>(
    stream: &mut R,
    schema_dir: Option<&Path>,
    validator: &dyn SchemaValidator,
) -> Result<PathBuf> {
    let saved = stream.stream_position()?;
    let outcome = validate_from_start(stream, schema_dir, validator);
    stream.seek(SeekFrom::Start(saved))?;
    outcome
}

fn validate_from_start<R: Read + Seek>(
    stream: &mut R,
    schema_dir: Option<&Path>,
    validator: &dyn SchemaValidator,
) -> Result<PathBuf> {
    let files = schema_locations_from_stream(stream)?;
    let schema = choose_schema_file(&files, schema_dir)?;

    stream.seek(SeekFrom::Start(0))?;
    let mut bytes = Vec::new();
    stream.read_to_end(&mut bytes)?;
    let document =
        String::from_utf8(bytes).map_err(|e| Error::InvalidXml(format!("document is not UTF-8: {}", e)))?;

    let report = validator.validate(&schema, &document)?;
    tracing::debug!(schema = %schema.display(), valid = report.valid, problems = report.log.len(), "validated document");
    if report.valid {
        Ok(schema)
    } else {
        Err(SchemaValidationError::new("document does not validate")
            .with_schema(schema)
            .with_log(report.log)
            .into())
    }
}

/// Verdict of a schema engine run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Whether the document is valid
    pub valid: bool,
    /// One line per problem found
    pub log: Vec<String>,
}

impl ValidationReport {
    /// A report that is valid exactly when `log` is empty
    pub fn from_log(log: Vec<String>) -> Self {
        Self {
            valid: log.is_empty(),
            log,
        }
    }
}

/// A schema engine: compiles the schema at `schema` and checks `document`
/// against it.
///
/// Implementations report schema problems as [`Error::UnknownSchema`],
/// unreadable documents as [`Error::InvalidXml`], and validity problems in
/// the returned report.
pub trait SchemaValidator: fmt::Debug + Send + Sync {
    /// Validate a document against a schema file
    fn validate(&self, schema: &Path, document: &str) -> Result<ValidationReport>;
}

/// Built-in structural XSD checker
#[derive(Debug, Clone, Copy, Default)]
pub struct XsdStructureValidator;

impl XsdStructureValidator {
    /// Create the validator
    pub fn new() -> Self {
        Self
    }
}

impl SchemaValidator for XsdStructureValidator {
    fn validate(&self, schema: &Path, document: &str) -> Result<ValidationReport> {
        let compiled = CompiledSchema::from_file(schema)?;
        Ok(ValidationReport::from_log(compiled.check(document)?))
    }
}

/// Occurrence bounds of a particle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    /// Minimum occurrences
    pub min: u32,
    /// Maximum occurrences, `None` for unbounded
    pub max: Option<u32>,
}

impl Occurs {
    /// Whether one more occurrence is allowed after `count`
    fn allows_another(&self, count: u32) -> bool {
        self.max.map_or(true, |max| count < max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModelType {
    Sequence,
    Choice,
    All,
}

#[derive(Debug, Clone)]
enum ElementContent {
    /// `xs:anyType` or no type at all
    Any,
    Simple,
    Complex(ComplexType),
    Named(String),
}

#[derive(Debug, Clone)]
struct ElementDecl {
    name: String,
    namespace: Option<String>,
    content: ElementContent,
}

#[derive(Debug, Clone)]
struct AttributeDecl {
    name: String,
    required: bool,
    by_ref: bool,
}

#[derive(Debug, Clone, Default)]
struct ComplexType {
    extends: Option<String>,
    mixed: bool,
    simple_content: bool,
    any_attribute: bool,
    model: Option<ModelGroup>,
    attributes: Vec<AttributeDecl>,
}

#[derive(Debug, Clone)]
struct ModelGroup {
    kind: ModelType,
    occurs: Occurs,
    particles: Vec<Particle>,
}

#[derive(Debug, Clone)]
enum Particle {
    Element(Box<ElementDecl>, Occurs),
    Ref(String, Occurs),
    Group(ModelGroup),
    Any(Occurs),
}

impl Particle {
    fn occurs(&self) -> Occurs {
        match self {
            Particle::Element(_, occurs) | Particle::Ref(_, occurs) | Particle::Any(occurs) => *occurs,
            Particle::Group(group) => group.occurs,
        }
    }
}

/// The global declarations of one XSD file
#[derive(Debug, Clone, Default)]
pub struct CompiledSchema {
    target_namespace: Option<String>,
    elements: HashMap<String, ElementDecl>,
    complex_types: HashMap<String, ComplexType>,
    simple_types: Vec<String>,
}

impl CompiledSchema {
    /// Compile the schema stored at `path`
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            Error::UnknownSchema(format!("cannot read schema {}: {}", path.display(), err))
        })?;
        Self::parse(&text).map_err(|err| match err {
            Error::UnknownSchema(message) => {
                Error::UnknownSchema(format!("{}: {}", path.display(), message))
            }
            other => other,
        })
    }

    /// Compile a schema from its source text
    pub fn parse(text: &str) -> Result<Self> {
        let doc = roxmltree::Document::parse(text)
            .map_err(|err| Error::UnknownSchema(format!("malformed schema: {}", err)))?;
        let root = doc.root_element();
        if root.tag_name().name() != xsd_elements::SCHEMA
            || root.tag_name().namespace() != Some(XSD_NAMESPACE)
        {
            return Err(Error::UnknownSchema(format!(
                "root element <{}> is not an XSD schema",
                root.tag_name().name()
            )));
        }

        let mut schema = CompiledSchema {
            target_namespace: root.attribute(xsd_attrs::TARGET_NAMESPACE).map(str::to_string),
            ..Default::default()
        };
        let parser = DeclParser {
            target_namespace: schema.target_namespace.clone(),
            qualified: root.attribute(xsd_attrs::ELEMENT_FORM_DEFAULT) == Some("qualified"),
        };

        for child in root.children().filter(is_xsd_element) {
            match child.tag_name().name() {
                xsd_elements::ELEMENT => {
                    let decl = parser.element(child, true)?;
                    schema.elements.insert(decl.name.clone(), decl);
                }
                xsd_elements::COMPLEX_TYPE => {
                    let name = required_name(child)?;
                    schema.complex_types.insert(name, parser.complex_type(child)?);
                }
                xsd_elements::SIMPLE_TYPE => schema.simple_types.push(required_name(child)?),
                _ => {}
            }
        }

        tracing::debug!(
            target_namespace = ?schema.target_namespace,
            elements = schema.elements.len(),
            complex_types = schema.complex_types.len(),
            "compiled schema"
        );
        Ok(schema)
    }

    /// Namespace of the global declarations
    pub fn target_namespace(&self) -> Option<&str> {
        self.target_namespace.as_deref()
    }

    /// Whether a global element with this local name is declared
    pub fn has_element(&self, name: &str) -> bool {
        self.elements.contains_key(name)
    }

    /// Check a document, returning one log line per problem
    pub fn check(&self, document: &str) -> Result<Vec<String>> {
        let doc = roxmltree::Document::parse(document)
            .map_err(|err| Error::InvalidXml(err.to_string()))?;
        let mut checker = Checker {
            schema: self,
            doc: &doc,
            log: Vec::new(),
        };
        let root = doc.root_element();
        match self.elements.get(root.tag_name().name()) {
            Some(decl) if checker.matches(decl, root) => checker.element(root, decl),
            _ => checker.report(root, "no global declaration for this element".to_string()),
        }
        Ok(checker.log)
    }

    fn resolve_named(&self, name: &str) -> Option<&ComplexType> {
        self.complex_types.get(name)
    }
}

fn is_xsd_element(node: &roxmltree::Node<'_, '_>) -> bool {
    node.is_element() && node.tag_name().namespace() == Some(XSD_NAMESPACE)
}

fn required_name(node: roxmltree::Node<'_, '_>) -> Result<String> {
    node.attribute(xsd_attrs::NAME)
        .map(str::to_string)
        .ok_or_else(|| {
            Error::UnknownSchema(format!(
                "<{}> declaration without a name",
                node.tag_name().name()
            ))
        })
}

/// Parse minOccurs and maxOccurs attributes into an Occurs
fn parse_occurs(node: roxmltree::Node<'_, '_>) -> Occurs {
    let min = node
        .attribute(xsd_attrs::MIN_OCCURS)
        .and_then(|s| s.parse::<u32>().ok())
        .unwrap_or(1);

    let max = match node.attribute(xsd_attrs::MAX_OCCURS) {
        Some("unbounded") => None,
        Some(s) => s.parse::<u32>().ok().or(Some(1)),
        None => Some(1),
    };

    Occurs { min, max }
}

fn local_part(qname: &str) -> &str {
    qname.rsplit_once(':').map_or(qname, |(_, local)| local)
}

/// Whether a QName-valued attribute refers into the XSD namespace
fn is_builtin(node: roxmltree::Node<'_, '_>, qname: &str) -> bool {
    let prefix = qname.split_once(':').map(|(prefix, _)| prefix);
    node.lookup_namespace_uri(prefix) == Some(XSD_NAMESPACE)
}

struct DeclParser {
    target_namespace: Option<String>,
    qualified: bool,
}

impl DeclParser {
    fn element(&self, node: roxmltree::Node<'_, '_>, global: bool) -> Result<ElementDecl> {
        let name = required_name(node)?;
        let qualified = global
            || match node.attribute(xsd_attrs::FORM) {
                Some(form) => form == "qualified",
                None => self.qualified,
            };
        let namespace = if qualified {
            self.target_namespace.clone()
        } else {
            None
        };

        let inline = node.children().filter(is_xsd_element).find(|child| {
            matches!(
                child.tag_name().name(),
                xsd_elements::COMPLEX_TYPE | xsd_elements::SIMPLE_TYPE
            )
        });
        let content = match (inline, node.attribute(xsd_attrs::TYPE)) {
            (Some(child), _) if child.tag_name().name() == xsd_elements::COMPLEX_TYPE => {
                ElementContent::Complex(self.complex_type(child)?)
            }
            (Some(_), _) => ElementContent::Simple,
            (None, Some(ty)) if is_builtin(node, ty) => match local_part(ty) {
                "anyType" => ElementContent::Any,
                _ => ElementContent::Simple,
            },
            (None, Some(ty)) => ElementContent::Named(local_part(ty).to_string()),
            (None, None) => ElementContent::Any,
        };

        Ok(ElementDecl {
            name,
            namespace,
            content,
        })
    }

    fn complex_type(&self, node: roxmltree::Node<'_, '_>) -> Result<ComplexType> {
        let mut ty = ComplexType {
            mixed: node.attribute(xsd_attrs::MIXED) == Some("true"),
            ..Default::default()
        };
        self.type_body(node, &mut ty)?;
        Ok(ty)
    }

    fn type_body(&self, node: roxmltree::Node<'_, '_>, ty: &mut ComplexType) -> Result<()> {
        for child in node.children().filter(is_xsd_element) {
            match child.tag_name().name() {
                xsd_elements::SEQUENCE => ty.model = Some(self.group(child, ModelType::Sequence)?),
                xsd_elements::CHOICE => ty.model = Some(self.group(child, ModelType::Choice)?),
                xsd_elements::ALL => ty.model = Some(self.group(child, ModelType::All)?),
                xsd_elements::ATTRIBUTE => {
                    if let Some(attribute) = attribute_decl(child) {
                        ty.attributes.push(attribute);
                    }
                }
                xsd_elements::ANY_ATTRIBUTE => ty.any_attribute = true,
                xsd_elements::COMPLEX_CONTENT | xsd_elements::SIMPLE_CONTENT => {
                    ty.simple_content = child.tag_name().name() == xsd_elements::SIMPLE_CONTENT;
                    if child.attribute(xsd_attrs::MIXED) == Some("true") {
                        ty.mixed = true;
                    }
                    for derivation in child.children().filter(is_xsd_element) {
                        let name = derivation.tag_name().name();
                        if name != xsd_elements::EXTENSION && name != xsd_elements::RESTRICTION {
                            continue;
                        }
                        if name == xsd_elements::EXTENSION {
                            ty.extends = derivation
                                .attribute(xsd_attrs::BASE)
                                .filter(|base| !is_builtin(derivation, base))
                                .map(|base| local_part(base).to_string());
                        }
                        self.type_body(derivation, ty)?;
                    }
                }
                other => tracing::trace!(particle = other, "ignoring unsupported type component"),
            }
        }
        Ok(())
    }

    fn group(&self, node: roxmltree::Node<'_, '_>, kind: ModelType) -> Result<ModelGroup> {
        let mut particles = Vec::new();
        for child in node.children().filter(is_xsd_element) {
            let particle = match child.tag_name().name() {
                xsd_elements::ELEMENT => match child.attribute(xsd_attrs::REF) {
                    Some(reference) => Particle::Ref(local_part(reference).to_string(), parse_occurs(child)),
                    None => Particle::Element(Box::new(self.element(child, false)?), parse_occurs(child)),
                },
                xsd_elements::SEQUENCE => Particle::Group(self.group(child, ModelType::Sequence)?),
                xsd_elements::CHOICE => Particle::Group(self.group(child, ModelType::Choice)?),
                xsd_elements::ALL => Particle::Group(self.group(child, ModelType::All)?),
                xsd_elements::ANY => Particle::Any(parse_occurs(child)),
                _ => continue,
            };
            particles.push(particle);
        }
        Ok(ModelGroup {
            kind,
            occurs: parse_occurs(node),
            particles,
        })
    }
}

fn attribute_decl(node: roxmltree::Node<'_, '_>) -> Option<AttributeDecl> {
    let usage = node.attribute(xsd_attrs::USE);
    if usage == Some("prohibited") {
        return None;
    }
    let (name, by_ref) = match (node.attribute(xsd_attrs::NAME), node.attribute(xsd_attrs::REF)) {
        (Some(name), _) => (name.to_string(), false),
        (None, Some(reference)) => (local_part(reference).to_string(), true),
        (None, None) => return None,
    };
    Some(AttributeDecl {
        name,
        required: usage == Some("required"),
        by_ref,
    })
}

/// Base-type chains longer than this are treated as cyclic
const MAX_DERIVATION_DEPTH: usize = 32;

type Matched<'s, 'a, 'input> = Vec<(roxmltree::Node<'a, 'input>, Option<&'s ElementDecl>)>;

struct Checker<'s, 'a, 'input> {
    schema: &'s CompiledSchema,
    doc: &'a roxmltree::Document<'input>,
    log: Vec<String>,
}

impl<'s, 'a, 'input> Checker<'s, 'a, 'input> {
    fn report(&mut self, node: roxmltree::Node<'a, 'input>, problem: String) {
        let pos = self.doc.text_pos_at(node.range().start);
        let name = match node.tag_name().namespace() {
            Some(uri) => clark_name(uri, node.tag_name().name()),
            None => node.tag_name().name().to_string(),
        };
        self.log.push(format!("line {}: element '{}': {}", pos.row, name, problem));
    }

    fn matches(&self, decl: &ElementDecl, node: roxmltree::Node<'a, 'input>) -> bool {
        node.tag_name().name() == decl.name && node.tag_name().namespace() == decl.namespace.as_deref()
    }

    fn particle_decl(&self, particle: &'s Particle) -> Option<&'s ElementDecl> {
        match particle {
            Particle::Element(decl, _) => Some(decl),
            Particle::Ref(name, _) => self.schema.elements.get(name),
            Particle::Group(_) | Particle::Any(_) => None,
        }
    }

    fn accepts(&self, particle: &'s Particle, node: roxmltree::Node<'a, 'input>) -> bool {
        match particle {
            Particle::Any(_) => true,
            Particle::Group(_) => false,
            _ => self
                .particle_decl(particle)
                .map_or(false, |decl| self.matches(decl, node)),
        }
    }

    fn element(&mut self, node: roxmltree::Node<'a, 'input>, decl: &'s ElementDecl) {
        let ty = match &decl.content {
            ElementContent::Any => return,
            ElementContent::Simple => None,
            ElementContent::Complex(ty) => Some(ty),
            ElementContent::Named(name) => match self.schema.resolve_named(name) {
                Some(ty) => Some(ty),
                None if self.schema.simple_types.iter().any(|simple| simple == name) => None,
                None => {
                    tracing::debug!(type_name = %name, "unresolved type, accepting any content");
                    return;
                }
            },
        };
        match ty {
            Some(ty) => self.complex(node, ty),
            None => self.simple(node),
        }
    }

    fn simple(&mut self, node: roxmltree::Node<'a, 'input>) {
        if node.children().any(|child| child.is_element()) {
            self.report(node, "element children are not allowed in simple content".to_string());
        }
        for attribute in node.attributes() {
            if !is_infrastructure(attribute.namespace()) {
                self.report(node, format!("undeclared attribute '{}'", attribute.name()));
            }
        }
    }

    fn complex(&mut self, node: roxmltree::Node<'a, 'input>, ty: &'s ComplexType) {
        let chain = self.derivation_chain(ty);
        self.attributes(node, &chain);

        let children: Vec<_> = node.children().filter(|child| child.is_element()).collect();
        let mixed = chain.iter().any(|ty| ty.mixed);
        let simple_content = chain.iter().any(|ty| ty.simple_content);

        if simple_content {
            if !children.is_empty() {
                self.report(node, "element children are not allowed in simple content".to_string());
            }
            return;
        }
        if !mixed
            && node
                .children()
                .any(|child| child.is_text() && !child.text().unwrap_or_default().trim().is_empty())
        {
            self.report(node, "character data is not allowed in element-only content".to_string());
        }

        // Base content comes first, then each extension's own model
        let groups: Vec<&'s ModelGroup> = chain.iter().rev().copied().filter_map(|ty| ty.model.as_ref()).collect();
        let mut matched = Matched::new();
        let mut pos = 0;
        for group in groups {
            match self.group_particle(group, &children, pos, &mut matched) {
                Some(next) => pos = next,
                None => {
                    self.report(
                        node,
                        "content does not match: required child elements are missing".to_string(),
                    );
                    return;
                }
            }
        }
        if let Some(extra) = children.get(pos) {
            let problem = format!("unexpected child element '{}'", extra.tag_name().name());
            self.report(node, problem);
        }

        for (child, decl) in matched {
            if let Some(decl) = decl {
                self.element(child, decl);
            }
        }
    }

    fn derivation_chain(&self, ty: &'s ComplexType) -> Vec<&'s ComplexType> {
        let mut chain = vec![ty];
        let mut current = ty;
        while let Some(base) = current.extends.as_deref() {
            match self.schema.resolve_named(base) {
                Some(next) if chain.len() < MAX_DERIVATION_DEPTH => {
                    chain.push(next);
                    current = next;
                }
                _ => break,
            }
        }
        chain
    }

    fn attributes(&mut self, node: roxmltree::Node<'a, 'input>, chain: &[&'s ComplexType]) {
        let declared: Vec<&AttributeDecl> = chain.iter().flat_map(|ty| ty.attributes.iter()).collect();
        let open = chain.iter().any(|ty| ty.any_attribute);

        for decl in declared.iter().filter(|decl| decl.required) {
            if !node.attributes().any(|attr| attr.name() == decl.name) {
                self.report(node, format!("missing required attribute '{}'", decl.name));
            }
        }
        if open {
            return;
        }
        for attribute in node.attributes() {
            if is_infrastructure(attribute.namespace()) {
                continue;
            }
            let known = declared.iter().any(|decl| {
                decl.name == attribute.name() && (attribute.namespace().is_none() || decl.by_ref)
            });
            if !known {
                self.report(node, format!("undeclared attribute '{}'", attribute.name()));
            }
        }
    }

    /// Match a particle as many times as its bounds allow, starting at
    /// `pos`. Returns the position after the last match, or `None` when the
    /// minimum was not reached.
    fn particle(
        &self,
        particle: &'s Particle,
        children: &[roxmltree::Node<'a, 'input>],
        mut pos: usize,
        out: &mut Matched<'s, 'a, 'input>,
    ) -> Option<usize> {
        if let Particle::Group(group) = particle {
            return self.group_particle(group, children, pos, out);
        }
        let occurs = particle.occurs();
        let mut count = 0;
        while occurs.allows_another(count) && pos < children.len() && self.accepts(particle, children[pos]) {
            out.push((children[pos], self.particle_decl(particle)));
            pos += 1;
            count += 1;
        }
        (count >= occurs.min).then_some(pos)
    }

    fn group_particle(
        &self,
        group: &'s ModelGroup,
        children: &[roxmltree::Node<'a, 'input>],
        mut pos: usize,
        out: &mut Matched<'s, 'a, 'input>,
    ) -> Option<usize> {
        let mut count = 0;
        while group.occurs.allows_another(count) {
            let mark = out.len();
            match self.group_once(group, children, pos, out) {
                Some(next) if next > pos => {
                    pos = next;
                    count += 1;
                }
                Some(_) => {
                    // an empty match satisfies any remaining minimum
                    out.truncate(mark);
                    count = count.max(group.occurs.min);
                    break;
                }
                None => {
                    out.truncate(mark);
                    break;
                }
            }
        }
        (count >= group.occurs.min).then_some(pos)
    }

    fn group_once(
        &self,
        group: &'s ModelGroup,
        children: &[roxmltree::Node<'a, 'input>],
        pos: usize,
        out: &mut Matched<'s, 'a, 'input>,
    ) -> Option<usize> {
        match group.kind {
            ModelType::Sequence => group
                .particles
                .iter()
                .try_fold(pos, |pos, particle| self.particle(particle, children, pos, out)),
            ModelType::Choice => {
                if group.particles.is_empty() {
                    return Some(pos);
                }
                let mut empty = false;
                for particle in &group.particles {
                    let mark = out.len();
                    match self.particle(particle, children, pos, out) {
                        Some(next) if next > pos => return Some(next),
                        Some(_) => {
                            empty = true;
                            out.truncate(mark);
                        }
                        None => out.truncate(mark),
                    }
                }
                empty.then_some(pos)
            }
            ModelType::All => {
                let mut counts = vec![0u32; group.particles.len()];
                let mut pos = pos;
                while let Some(child) = children.get(pos) {
                    let hit = group.particles.iter().enumerate().find(|(i, particle)| {
                        particle.occurs().allows_another(counts[*i]) && self.accepts(particle, *child)
                    });
                    let Some((i, particle)) = hit else { break };
                    counts[i] += 1;
                    out.push((*child, self.particle_decl(particle)));
                    pos += 1;
                }
                group
                    .particles
                    .iter()
                    .zip(&counts)
                    .all(|(particle, count)| *count >= particle.occurs().min)
                    .then_some(pos)
            }
        }
    }
}

fn is_infrastructure(namespace: Option<&str>) -> bool {
    matches!(namespace, Some(XSI_NAMESPACE) | Some(XML_NAMESPACE))
}
