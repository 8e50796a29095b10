//! Error types for xmlfacets
//!
//! Document-validity findings are not errors in this sense: they are
//! collected into a [`Report`](crate::validators::Report). The variants here
//! describe requests that cannot be evaluated at all.

use crate::namespaces::QName;
use crate::validators::ErrorKind;
use thiserror::Error;

/// Result type alias using xmlfacets Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for xmlfacets operations
#[derive(Error, Debug)]
pub enum Error {
    /// A type or element name is not registered in the schema
    #[error("unknown type: {0}")]
    UnknownType(QName),

    /// The document could not be turned into a node tree
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The schema model is inconsistent (cycles, duplicates, bad facets)
    #[error("schema error: {0}")]
    Schema(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// The caller cancelled the validation between two elements
    #[error("validation cancelled")]
    Cancelled,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Validation error kind for the request-level failures that have one
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::UnknownType(_) => Some(ErrorKind::UnknownType),
            Error::MalformedInput(_) => Some(ErrorKind::MalformedInput),
            _ => None,
        }
    }
}
