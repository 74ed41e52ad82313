//! Error types for xmlbind
//!
//! Every failure the library reports is a variant of [`Error`]. The
//! schema-related variants share [`Error::is_schema_error`] so callers can
//! treat "no usable schema" and "schema rejected the document" alike.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the xmlbind Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for binding and serialization
#[derive(Error, Debug)]
pub enum Error {
    /// A namespace alias was used before its declaration was in scope
    #[error("undefined namespace: {0}")]
    UndefinedNamespace(String),

    /// The tokenizer rejected the input as malformed XML
    #[error("invalid XML: {0}")]
    InvalidXml(String),

    /// No schema location declared, no schema directory, or no candidate found
    #[error("unknown schema: {0}")]
    UnknownSchema(String),

    /// A schema was found and run, but the document did not validate
    #[error("schema validation error: {0}")]
    SchemaValidation(#[from] SchemaValidationError),

    /// A node type could not be registered
    #[error("registration error: {0}")]
    Registration(String),

    /// An object could not be projected onto an element tree
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for both schema lookup failures and validation failures
    pub fn is_schema_error(&self) -> bool {
        matches!(self, Error::UnknownSchema(_) | Error::SchemaValidation(_))
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        match err {
            quick_xml::Error::Io(io) => Error::Io(std::io::Error::new(io.kind(), io.to_string())),
            other => Error::InvalidXml(other.to_string()),
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::InvalidXml(err.to_string())
    }
}

/// Schema validation failure with the engine's diagnostic log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaValidationError {
    /// Error message
    pub message: String,
    /// Schema file the document was checked against
    pub schema: Option<PathBuf>,
    /// One entry per problem reported by the schema engine
    pub log: Vec<String>,
}

impl SchemaValidationError {
    /// Create a new validation error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            schema: None,
            log: Vec::new(),
        }
    }

    /// Set the schema file
    pub fn with_schema(mut self, schema: impl Into<PathBuf>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Set the diagnostic log
    pub fn with_log(mut self, log: Vec<String>) -> Self {
        self.log = log;
        self
    }

    /// The diagnostic log joined into one block of text
    pub fn log_text(&self) -> String {
        self.log.join("\n")
    }
}

impl fmt::Display for SchemaValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref schema) = self.schema {
            write!(f, "\n\nSchema: {}", schema.display())?;
        }

        if !self.log.is_empty() {
            write!(f, "\n\nLog:\n{}", self.log_text())?;
        }

        Ok(())
    }
}

impl std::error::Error for SchemaValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = SchemaValidationError::new("Document does not validate")
            .with_schema("/schemas/book.xsd")
            .with_log(vec![
                "line 1: missing attribute 'id'".to_string(),
                "line 3: unexpected element 'foo'".to_string(),
            ]);

        let msg = format!("{}", err);
        assert!(msg.contains("Document does not validate"));
        assert!(msg.contains("Schema: /schemas/book.xsd"));
        assert!(msg.contains("Log:"));
        assert!(msg.contains("unexpected element 'foo'"));
    }

    #[test]
    fn test_error_conversion() {
        let val_err = SchemaValidationError::new("test");
        let err: Error = val_err.into();
        assert!(matches!(err, Error::SchemaValidation(_)));
        assert!(err.is_schema_error());
        assert!(Error::UnknownSchema("none".into()).is_schema_error());
        assert!(!Error::InvalidXml("bad".into()).is_schema_error());
    }

    #[test]
    fn test_undefined_namespace_message() {
        let err = Error::UndefinedNamespace("x".into());
        assert_eq!(err.to_string(), "undefined namespace: x");
    }
}
