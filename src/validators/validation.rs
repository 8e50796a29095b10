//! Validation context and results
//!
//! [`ErrorCollector`] accumulates the findings of one validation call and
//! decides, according to the [`ValidationMode`], whether the walk goes on
//! after each one. [`Report`] is the immutable outcome handed back to the
//! caller.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

use super::exceptions::{ErrorKind, PathSegment, ValidationError, ValidationPath};

/// Validation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Stop at the first finding
    #[default]
    Strict,
    /// Walk the whole document and report every finding
    Lax,
}

impl ValidationMode {
    /// Parse validation mode from string
    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "strict" => Ok(ValidationMode::Strict),
            "lax" => Ok(ValidationMode::Lax),
            _ => Err(Error::Schema(format!(
                "Invalid validation mode: '{}'. Must be 'strict' or 'lax'",
                s
            ))),
        }
    }

    /// Get the mode as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationMode::Strict => "strict",
            ValidationMode::Lax => "lax",
        }
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a walk stopped before its end
#[derive(Debug)]
pub(crate) enum Interrupt {
    /// Strict mode recorded its first finding
    Halt,
    /// The request itself cannot be evaluated
    Fatal(Error),
}

impl From<Error> for Interrupt {
    fn from(error: Error) -> Self {
        Interrupt::Fatal(error)
    }
}

/// Outcome of one step of the walk
pub(crate) type Flow = std::result::Result<(), Interrupt>;

/// Collects findings for a single validation call
#[derive(Debug)]
pub struct ErrorCollector {
    mode: ValidationMode,
    errors: Vec<ValidationError>,
    path: ValidationPath,
}

impl ErrorCollector {
    /// Create an empty collector
    pub fn new(mode: ValidationMode) -> Self {
        Self {
            mode,
            errors: Vec::new(),
            path: ValidationPath::new(),
        }
    }

    /// Current mode
    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Current location in the document
    pub fn path(&self) -> &ValidationPath {
        &self.path
    }

    /// Depth of the current location, counting elements and attributes
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Get the error count
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub(crate) fn enter(&mut self, segment: PathSegment) {
        self.path.push(segment);
    }

    pub(crate) fn leave(&mut self) {
        self.path.pop();
    }

    /// Record a finding at the current location
    pub(crate) fn report(
        &mut self,
        kind: ErrorKind,
        message: impl Into<String>,
        value: Option<&str>,
    ) -> Flow {
        let mut error = ValidationError::new(kind, message).with_path(self.path.clone());
        if let Some(v) = value {
            error = error.with_value(v);
        }
        self.push(error)
    }

    /// Record a finding; strict mode halts the walk
    pub(crate) fn push(&mut self, error: ValidationError) -> Flow {
        self.errors.push(error);
        match self.mode {
            ValidationMode::Strict => Err(Interrupt::Halt),
            ValidationMode::Lax => Ok(()),
        }
    }

    /// Finish the call
    pub fn into_report(self) -> Report {
        Report::new(self.errors)
    }
}

/// Result of validating one document or value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// Whether no violation was found
    pub valid: bool,
    /// Findings in the order they were encountered
    pub errors: Vec<ValidationError>,
}

impl Report {
    /// Build a report; it is valid exactly when `errors` is empty
    pub fn new(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// A report without findings
    pub fn success() -> Self {
        Self::new(Vec::new())
    }

    /// Whether validation passed
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// First finding, if any
    pub fn first(&self) -> Option<&ValidationError> {
        self.errors.first()
    }

    /// Findings of one kind
    pub fn errors_of(&self, kind: ErrorKind) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(move |e| e.kind == kind)
    }

    /// Whether any finding has the given kind
    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        self.errors_of(kind).next().is_some()
    }

    /// Number of findings
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether there are no findings
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Pretty-printed JSON rendering
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.valid {
            return write!(f, "valid");
        }
        write!(f, "invalid ({} error(s))", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}
