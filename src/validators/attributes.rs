//! Attribute declarations
//!
//! Attributes are identified by their full (namespace, local name) pair.
//! An attribute carrying the right local name under another namespace is a
//! different attribute altogether.

use crate::error::{Error, Result};
use crate::namespaces::{QName, XML_NAMESPACE};

/// Attribute use mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttributeUse {
    /// Attribute is optional (default)
    #[default]
    Optional,
    /// Attribute is required
    Required,
    /// Attribute is prohibited
    Prohibited,
}

impl AttributeUse {
    /// Parse from string value
    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "optional" => Ok(AttributeUse::Optional),
            "required" => Ok(AttributeUse::Required),
            "prohibited" => Ok(AttributeUse::Prohibited),
            _ => Err(Error::Schema(format!(
                "Invalid attribute use value: '{}'. Must be 'optional', 'required', or 'prohibited'",
                s
            ))),
        }
    }

    /// Get the use as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeUse::Optional => "optional",
            AttributeUse::Required => "required",
            AttributeUse::Prohibited => "prohibited",
        }
    }
}

impl std::fmt::Display for AttributeUse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Attribute declaration on a type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSpec {
    /// Qualified attribute name
    pub name: QName,
    /// Usage mode
    pub use_mode: AttributeUse,
    /// Simple type the value is checked against
    pub value_type: QName,
}

impl AttributeSpec {
    /// Create an attribute declaration
    pub fn new(name: QName, value_type: QName, use_mode: AttributeUse) -> Self {
        Self {
            name,
            use_mode,
            value_type,
        }
    }

    /// A required attribute
    pub fn required(name: QName, value_type: QName) -> Self {
        Self::new(name, value_type, AttributeUse::Required)
    }

    /// An optional attribute
    pub fn optional(name: QName, value_type: QName) -> Self {
        Self::new(name, value_type, AttributeUse::Optional)
    }

    /// Whether a node must carry this attribute
    pub fn is_required(&self) -> bool {
        self.use_mode == AttributeUse::Required
    }

    /// Whether a node must not carry this attribute
    pub fn is_prohibited(&self) -> bool {
        self.use_mode == AttributeUse::Prohibited
    }
}

/// Wildcard admitting attributes a type does not declare
///
/// Attributes admitted by a wildcard are accepted without any value check.
/// A wildcard never satisfies a required declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeWildcard {
    /// Any attribute in any namespace, or none
    Any,
    /// Attributes in a namespace other than the given one; unqualified excluded
    Other(Option<String>),
    /// Attributes in one of the listed namespaces (`None` = unqualified)
    Namespaces(Vec<Option<String>>),
}

impl AttributeWildcard {
    /// Parse the namespace constraint lexical form (`##any`, `##other`, or a
    /// whitespace-separated list with `##local` / `##targetNamespace`)
    pub fn parse(namespace: &str, target_namespace: Option<&str>) -> Result<Self> {
        match namespace.trim() {
            "##any" => Ok(AttributeWildcard::Any),
            "##other" => Ok(AttributeWildcard::Other(target_namespace.map(String::from))),
            list => {
                let mut namespaces = Vec::new();
                for item in list.split_whitespace() {
                    match item {
                        "##local" => namespaces.push(None),
                        "##targetNamespace" => {
                            namespaces.push(target_namespace.map(String::from))
                        }
                        other if other.starts_with("##") => {
                            return Err(Error::Schema(format!(
                                "invalid wildcard namespace token '{}'",
                                other
                            )))
                        }
                        uri => namespaces.push(Some(uri.to_string())),
                    }
                }
                Ok(AttributeWildcard::Namespaces(namespaces))
            }
        }
    }

    /// Check whether an undeclared attribute is admitted
    pub fn admits(&self, name: &QName) -> bool {
        match self {
            AttributeWildcard::Any => true,
            AttributeWildcard::Other(target) => {
                name.namespace.is_some() && name.namespace != *target
            }
            AttributeWildcard::Namespaces(list) => list.contains(&name.namespace),
        }
    }
}

/// The `xml:lang` attribute name
pub fn xml_lang() -> QName {
    QName::namespaced(XML_NAMESPACE, "lang")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::XSD_NAMESPACE;

    const VELLUM: &str = "https://vellum.cauldron.ch";
    const PROCESS: &str = "http://lca.jrc.it/ILCD/Process";

    #[test]
    fn test_attribute_use() {
        assert_eq!(AttributeUse::from_str("required").unwrap(), AttributeUse::Required);
        assert_eq!(AttributeUse::from_str("optional").unwrap(), AttributeUse::Optional);
        assert_eq!(AttributeUse::from_str("prohibited").unwrap(), AttributeUse::Prohibited);
        assert!(AttributeUse::from_str("mandatory").is_err());
        assert_eq!(AttributeUse::default(), AttributeUse::Optional);
        assert_eq!(AttributeUse::Required.to_string(), "required");
    }

    #[test]
    fn test_attribute_spec() {
        let spec = AttributeSpec::required(
            QName::namespaced(VELLUM, "unitName"),
            QName::namespaced(XSD_NAMESPACE, "string"),
        );
        assert!(spec.is_required());
        assert!(!spec.is_prohibited());
    }

    #[test]
    fn test_wildcard_any() {
        let wc = AttributeWildcard::parse("##any", Some(PROCESS)).unwrap();
        assert!(wc.admits(&QName::local("x")));
        assert!(wc.admits(&QName::namespaced("http://wrong.namespace.com", "unitName")));
    }

    #[test]
    fn test_wildcard_other() {
        let wc = AttributeWildcard::parse("##other", Some(PROCESS)).unwrap();
        assert!(wc.admits(&QName::namespaced("http://wrong.namespace.com", "unitName")));
        assert!(!wc.admits(&QName::namespaced(PROCESS, "unitName")));
        assert!(!wc.admits(&QName::local("unitName")));
    }

    #[test]
    fn test_wildcard_list() {
        let wc = AttributeWildcard::parse("##local ##targetNamespace urn:x", Some(PROCESS)).unwrap();
        assert!(wc.admits(&QName::local("a")));
        assert!(wc.admits(&QName::namespaced(PROCESS, "a")));
        assert!(wc.admits(&QName::namespaced("urn:x", "a")));
        assert!(!wc.admits(&QName::namespaced("urn:y", "a")));
        assert!(AttributeWildcard::parse("##bogus", None).is_err());
    }
}
