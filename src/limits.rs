//! Limits and constraints for validation
//!
//! This module defines limits that keep a validation call bounded in
//! stack depth and work, whatever document or schema it is handed.

use crate::error::{Error, Result};

/// Global limits configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum element nesting depth walked by the engine
    pub max_xml_depth: usize,

    /// Maximum number of child elements under a single element
    pub max_children: usize,

    /// Maximum length of a base-type chain
    pub max_type_depth: usize,

    /// Maximum size in bytes of a document or schema description read from disk
    pub max_source_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_xml_depth: 1000,
            max_children: 1_000_000,
            max_type_depth: 100,
            max_source_size: 100 * 1024 * 1024, // 100 MB
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_xml_depth: 100,
            max_children: 10_000,
            max_type_depth: 20,
            max_source_size: 10 * 1024 * 1024, // 10 MB
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    pub fn permissive() -> Self {
        Self {
            max_xml_depth: 10_000,
            max_children: usize::MAX,
            max_type_depth: 1000,
            max_source_size: 1024 * 1024 * 1024, // 1 GB
        }
    }

    /// Check if XML depth is within limits
    pub fn check_xml_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_xml_depth {
            Err(Error::LimitExceeded(format!(
                "XML depth {} exceeds maximum {}",
                depth, self.max_xml_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if the number of children is within limits
    pub fn check_children(&self, count: usize) -> Result<()> {
        if count > self.max_children {
            Err(Error::LimitExceeded(format!(
                "Child element count {} exceeds maximum {}",
                count, self.max_children
            )))
        } else {
            Ok(())
        }
    }

    /// Check if a base-type chain is within limits
    pub fn check_type_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_type_depth {
            Err(Error::LimitExceeded(format!(
                "Type derivation depth {} exceeds maximum {}",
                depth, self.max_type_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if a source size is within limits
    pub fn check_source_size(&self, size: usize) -> Result<()> {
        if size > self.max_source_size {
            Err(Error::LimitExceeded(format!(
                "Source size {} bytes exceeds maximum {} bytes",
                size, self.max_source_size
            )))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = Limits::default();
        assert_eq!(limits.max_xml_depth, 1000);
        assert!(limits.check_xml_depth(500).is_ok());
        assert!(limits.check_xml_depth(1500).is_err());
    }

    #[test]
    fn test_strict_limits() {
        let limits = Limits::strict();
        assert!(limits.max_xml_depth < Limits::default().max_xml_depth);
        assert!(limits.check_xml_depth(150).is_err());
        assert!(limits.check_children(20_000).is_err());
    }

    #[test]
    fn test_permissive_limits() {
        let limits = Limits::permissive();
        assert!(limits.max_xml_depth > Limits::default().max_xml_depth);
        assert!(limits.check_xml_depth(5000).is_ok());
    }

    #[test]
    fn test_check_source_size() {
        let limits = Limits::default();
        assert!(limits.check_source_size(1024).is_ok());
        assert!(limits.check_source_size(200 * 1024 * 1024).is_err());
    }

    #[test]
    fn test_check_type_depth() {
        let limits = Limits::strict();
        assert!(limits.check_type_depth(20).is_ok());
        assert!(matches!(
            limits.check_type_depth(21),
            Err(Error::LimitExceeded(_))
        ));
    }
}
