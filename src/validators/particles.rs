//! Occurrence constraints for child elements
//!
//! A [`ChildSpec`] declares how many times a named child element may appear
//! directly under its parent. Occurrences are counted by exact qualified
//! name; position among other children does not matter.

use crate::error::{Error, Result};
use crate::namespaces::QName;
use std::fmt;

/// Occurrence bounds (minOccurs, maxOccurs)
/// None for max means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    /// Minimum number of occurrences (default 1)
    pub min: u32,
    /// Maximum number of occurrences (None = unbounded, default 1)
    pub max: Option<u32>,
}

impl Occurs {
    /// Create new occurrence bounds
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Default occurrence (1, 1)
    pub fn once() -> Self {
        Self { min: 1, max: Some(1) }
    }

    /// Optional occurrence (0, 1)
    pub fn optional() -> Self {
        Self { min: 0, max: Some(1) }
    }

    /// Zero or more (0, unbounded)
    pub fn zero_or_more() -> Self {
        Self { min: 0, max: None }
    }

    /// One or more (1, unbounded)
    pub fn one_or_more() -> Self {
        Self { min: 1, max: None }
    }

    /// Check if zero occurrences are allowed
    pub fn is_emptiable(&self) -> bool {
        self.min == 0
    }

    /// Check if occurrence count is under the minimum
    pub fn is_missing(&self, count: usize) -> bool {
        count < self.min as usize
    }

    /// Check if occurrence count exceeds the maximum
    pub fn is_exceeded(&self, count: usize) -> bool {
        match self.max {
            Some(max) => count > max as usize,
            None => false,
        }
    }

    /// Check if an occurrence count satisfies these bounds
    pub fn contains(&self, count: usize) -> bool {
        !self.is_missing(count) && !self.is_exceeded(count)
    }

    /// Reject bounds where maxOccurs < minOccurs
    pub fn check(&self) -> Result<()> {
        match self.max {
            Some(max) if max < self.min => Err(Error::Schema(format!(
                "maxOccurs ({}) must be greater than or equal to minOccurs ({})",
                max, self.min
            ))),
            _ => Ok(()),
        }
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::once()
    }
}

impl fmt::Display for Occurs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "[{}, {}]", self.min, max),
            None => write!(f, "[{}, unbounded]", self.min),
        }
    }
}

/// Parse minOccurs/maxOccurs from their lexical forms
pub fn parse_occurs(min_occurs: Option<&str>, max_occurs: Option<&str>) -> Result<Occurs> {
    let mut occurs = Occurs::once();

    if let Some(min_str) = min_occurs {
        occurs.min = min_str.parse::<u32>().map_err(|_| {
            Error::Schema(format!(
                "minOccurs value '{}' is not a valid non-negative integer",
                min_str
            ))
        })?;
    }

    if let Some(max_str) = max_occurs {
        occurs.max = if max_str == "unbounded" {
            None
        } else {
            Some(max_str.parse::<u32>().map_err(|_| {
                Error::Schema(format!(
                    "maxOccurs value '{}' must be a non-negative integer or 'unbounded'",
                    max_str
                ))
            })?)
        };
    }

    occurs.check()?;
    Ok(occurs)
}

/// Declaration of a child element in a content model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildSpec {
    /// Qualified element name
    pub name: QName,
    /// Type the child is validated against
    pub type_name: QName,
    /// Occurrence bounds
    pub occurs: Occurs,
}

impl ChildSpec {
    /// Create a child declaration
    pub fn new(name: QName, type_name: QName, occurs: Occurs) -> Self {
        Self {
            name,
            type_name,
            occurs,
        }
    }

    /// A child that must appear exactly once
    pub fn required(name: QName, type_name: QName) -> Self {
        Self::new(name, type_name, Occurs::once())
    }

    /// A child that may appear at most once
    pub fn optional(name: QName, type_name: QName) -> Self {
        Self::new(name, type_name, Occurs::optional())
    }

    /// A child that may repeat any number of times, including zero
    pub fn repeated(name: QName, type_name: QName) -> Self {
        Self::new(name, type_name, Occurs::zero_or_more())
    }
}
