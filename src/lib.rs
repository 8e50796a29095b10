//! # xmlfacets
//!
//! A declarative constraint engine that validates XML element trees against a
//! compiled, in-memory schema of named types.
//!
//! ## Features
//!
//! - Simple-type facets: full-match patterns, decimal ranges, enumerations,
//!   character lengths and white space normalization
//! - Complex types with required, optional and prohibited attributes,
//!   namespace-exact attribute matching and attribute wildcards
//! - Child cardinality checks (`minOccurs`/`maxOccurs`, `unbounded`)
//! - Type derivation by restriction and extension, resolved once at build time
//! - Strict (first error) and lax (all errors) modes with structured,
//!   path-addressed findings
//! - Depth and size limits, and cooperative cancellation
//!
//! ## Example
//!
//! ```rust
//! use xmlfacets::{Facet, Node, QName, Schema, TypeDefinition, ValidationMode};
//!
//! let cas = QName::namespaced("http://lca.jrc.it/ILCD/Common", "CASNumber");
//! let schema = Schema::builder()
//!     .add_type(
//!         TypeDefinition::simple(cas.clone())
//!             .restriction_of(QName::xs("string"))
//!             .with_facet(Facet::pattern(r"\d{2,7}-\d{2}-\d")?),
//!     )
//!     .build()?;
//!
//! let node = Node::new(QName::local("cas")).with_text("7732-18-5");
//! let report = schema.validate(&node, &cas, ValidationMode::Strict)?;
//! assert!(report.valid);
//! # Ok::<(), xmlfacets::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod documents;
pub mod error;
pub mod limits;
pub mod loaders;
pub mod namespaces;
pub mod validators;

// Re-exports for convenience
pub use documents::Node;
pub use error::{Error, Result};
pub use limits::Limits;
pub use loaders::{Loader, SchemaDocument};
pub use namespaces::{NamespaceContext, QName, XML_NAMESPACE, XSD_NAMESPACE, XSI_NAMESPACE};
pub use validators::{
    validate, validate_element, validate_value, AttributeSpec, AttributeUse, AttributeWildcard,
    ChildSpec, ContentKind, ErrorKind, Facet, Occurs, Report, Schema, SchemaBuilder,
    TypeDefinition, ValidationError, ValidationMode, ValidationPath, Validator, WhiteSpace,
};

/// Version of the xmlfacets library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
