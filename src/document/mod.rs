/// Workflow Document Layer
///
/// XML representation of persisted workflow documents:
/// - A small namespace-aware element tree
/// - Parsing with quick-xml
/// - Indented serialization and atomic write-then-rename persistence
/// - Schema constants for the fixed workflow document shape

// Element tree and document types
pub mod element;

// quick-xml based parsing
pub mod reader;

// Serialization and atomic persistence
pub mod writer;

// Element/attribute names and namespace of the workflow schema
pub mod schema;

pub use element::{Attribute, Document, Element, XmlNode};

/// Errors raised while reading or writing XML documents
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("malformed XML: {0}")]
    Malformed(String),

    #[error("failed to serialize XML: {0}")]
    Write(String),

    #[error("invalid XML content: {0}")]
    Invalid(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
