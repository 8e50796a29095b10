//! Validation findings
//!
//! This module contains the machine-checkable description of a single
//! violation: its [`ErrorKind`], the [`ValidationPath`] from the document root
//! to the offending element or attribute, a message and the offending value.

use crate::namespaces::QName;
use serde::Serialize;
use std::fmt;

/// Kind of a validation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Text fails a full-match pattern facet
    PatternMismatch,
    /// Text for a range facet is not a number
    NotNumeric,
    /// Number outside the declared bounds
    RangeViolation,
    /// Value not in the declared literal set
    EnumViolation,
    /// Character count outside the declared length bounds
    LengthViolation,
    /// Required attribute absent, or present only under another namespace
    MissingRequiredAttribute,
    /// Child element count outside `[minOccurs, maxOccurs]`
    CardinalityViolation,
    /// Attribute not declared by the type and not admitted by a wildcard
    UnexpectedAttribute,
    /// Child element not declared by the type's content model
    UnexpectedElement,
    /// Character data inside element-only content
    UnexpectedText,
    /// Referenced type or element is not in the schema (fatal)
    UnknownType,
    /// The document could not be parsed (fatal)
    MalformedInput,
}

impl ErrorKind {
    /// Whether this kind aborts validation instead of being collected
    pub fn is_fatal(&self) -> bool {
        matches!(self, ErrorKind::UnknownType | ErrorKind::MalformedInput)
    }

    /// Get the kind as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::PatternMismatch => "PatternMismatch",
            ErrorKind::NotNumeric => "NotNumeric",
            ErrorKind::RangeViolation => "RangeViolation",
            ErrorKind::EnumViolation => "EnumViolation",
            ErrorKind::LengthViolation => "LengthViolation",
            ErrorKind::MissingRequiredAttribute => "MissingRequiredAttribute",
            ErrorKind::CardinalityViolation => "CardinalityViolation",
            ErrorKind::UnexpectedAttribute => "UnexpectedAttribute",
            ErrorKind::UnexpectedElement => "UnexpectedElement",
            ErrorKind::UnexpectedText => "UnexpectedText",
            ErrorKind::UnknownType => "UnknownType",
            ErrorKind::MalformedInput => "MalformedInput",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of a path from the document root
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PathSegment {
    /// An element, with its 1-based position among same-named siblings
    Element {
        /// Element name
        name: QName,
        /// Position among siblings with the same name
        position: usize,
    },
    /// An attribute of the preceding element
    Attribute {
        /// Attribute name
        name: QName,
    },
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Element { name, position } if *position > 1 => {
                write!(f, "/{}[{}]", name, position)
            }
            PathSegment::Element { name, .. } => write!(f, "/{}", name),
            PathSegment::Attribute { name } => write!(f, "/@{}", name),
        }
    }
}

/// Ordered path from the document root to a violation site
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ValidationPath(Vec<PathSegment>);

impl ValidationPath {
    /// Empty path
    pub fn new() -> Self {
        Self::default()
    }

    /// Segments, root first
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Last segment, if any
    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the path has no segments
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }

    pub(crate) fn pop(&mut self) {
        self.0.pop();
    }

    /// Copy of this path with one more segment
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut path = self.clone();
        path.push(segment);
        path
    }
}

impl fmt::Display for ValidationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.0 {
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// A single document-validity finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// What kind of constraint was violated
    pub kind: ErrorKind,
    /// Where in the document the violation is
    pub path: ValidationPath,
    /// Human-readable explanation
    pub message: String,
    /// The offending value, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ValidationError {
    /// Create a new finding at the document root
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: ValidationPath::new(),
            message: message.into(),
            value: None,
        }
    }

    /// Set the path
    pub fn with_path(mut self, path: ValidationPath) -> Self {
        self.path = path;
        self
    }

    /// Set the offending value
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.kind, self.path, self.message)
    }
}

impl std::error::Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "http://lca.jrc.it/ILCD/Process";

    fn sample_path() -> ValidationPath {
        let mut path = ValidationPath::new();
        path.push(PathSegment::Element {
            name: QName::namespaced(NS, "exchange"),
            position: 1,
        });
        path.push(PathSegment::Attribute {
            name: QName::namespaced("https://vellum.cauldron.ch", "unitName"),
        });
        path
    }

    #[test]
    fn test_path_display() {
        assert_eq!(
            sample_path().to_string(),
            "/{http://lca.jrc.it/ILCD/Process}exchange/@{https://vellum.cauldron.ch}unitName"
        );
        assert_eq!(ValidationPath::new().to_string(), "/");

        let repeated = ValidationPath::new().child(PathSegment::Element {
            name: QName::local("synonym"),
            position: 3,
        });
        assert_eq!(repeated.to_string(), "/synonym[3]");
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new(
            ErrorKind::MissingRequiredAttribute,
            "required attribute 'unitName' is missing",
        )
        .with_path(sample_path());

        let msg = err.to_string();
        assert!(msg.starts_with("MissingRequiredAttribute at /"));
        assert!(msg.contains("unitName"));
    }

    #[test]
    fn test_fatal_kinds() {
        assert!(ErrorKind::UnknownType.is_fatal());
        assert!(ErrorKind::MalformedInput.is_fatal());
        assert!(!ErrorKind::RangeViolation.is_fatal());
        assert!(!ErrorKind::CardinalityViolation.is_fatal());
    }

    #[test]
    fn test_serialize_error() {
        let err = ValidationError::new(ErrorKind::RangeViolation, "too big")
            .with_path(ValidationPath::new().child(PathSegment::Attribute {
                name: QName::local("latitude"),
            }))
            .with_value("95.0");

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "RangeViolation");
        assert_eq!(json["value"], "95.0");
        assert_eq!(json["path"][0]["type"], "attribute");
        assert_eq!(json["path"][0]["name"], "latitude");
    }
}
