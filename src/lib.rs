//! # xmlbind
//!
//! Namespace-aware XML data binding.
//!
//! Documents are bound to trees of [`Node`]s driven by a registry of
//! [`NodeType`] descriptors: registered tags become typed leaves (integers,
//! strings, booleans, nulls) or structural nodes with ordered and promoted
//! children, and everything else binds generically. Any bound tree, and any
//! object implementing [`Serializable`], renders back to XML with its
//! namespace declarations intact.
//!
//! ## Features
//!
//! - One-shot binding with [`DataBinder`] and incremental binding with
//!   [`StreamingDataBinder`], which yields completed nodes while the input
//!   is still being read
//! - Schema discovery through `xsi:schemaLocation` and optional validation
//!   before binding
//! - Output-only objects from any `serde::Serialize` struct
//! - Post-parse dispatch of nodes to domain types
//! - Limits on nesting depth, attribute count and document size
//!
//! ## Example
//!
//! ```rust
//! use xmlbind::{Child, DataBinder, NodeType};
//!
//! let mut binder = DataBinder::new();
//! binder.register_type(NodeType::integer(), Some("count"), None)?;
//!
//! let root = binder.parse_str("<stock><item>pen</item><count>12</count></stock>")?;
//! let stock = root.as_node().expect("structural root");
//! assert_eq!(stock.children()[1], Child::Integer(12));
//!
//! let xml = binder.to_xml(&root, false)?;
//! assert!(xml.contains("<item>pen</item>"));
//! # Ok::<(), xmlbind::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;

// Names and namespaces
pub mod names;
pub mod namespaces;

// Output trees
pub mod objects;
pub mod serialize;
pub mod tree;

// Binding
pub mod binder;
pub mod binding;
pub mod node;
pub mod sax;

// Schema discovery and dispatch
pub mod dispatch;
pub mod schema;
pub mod toplevel;

// Re-exports for convenience
pub use binder::{DataBinder, NodeStream, ParseOptions, StreamingDataBinder};
pub use binding::TypeRegistry;
pub use dispatch::{DispatchTarget, NodeDispatcher};
pub use error::{Error, Result, SchemaValidationError};
pub use limits::Limits;
pub use namespaces::NamespaceMap;
pub use node::{Child, Node, NodeKind, NodeType, Value};
pub use objects::SlotObject;
pub use schema::{SchemaValidator, ValidationReport, XsdStructureValidator};
pub use serialize::{to_xml, Serializable, SerializableList};
pub use toplevel::ToplevelNode;
pub use tree::Element;

/// Version of the xmlbind library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// XML namespace, bound to the reserved `xml` prefix
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// XML Schema instance namespace
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// XMLNS namespace
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// XSD 1.0 namespace
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";
