//! Schema model and validation engine
//!
//! Types, facets, attribute and child declarations are assembled into a
//! [`Schema`] by a [`SchemaBuilder`]; the engine in [`document_validation`]
//! walks node trees against it.

pub mod attributes;
pub mod document_validation;
pub mod exceptions;
pub mod facets;
pub mod particles;
pub mod schemas;
pub mod types;
pub mod validation;

// Re-exports
pub use attributes::{xml_lang, AttributeSpec, AttributeUse, AttributeWildcard};
pub use document_validation::{validate, validate_element, validate_value, Validator};
pub use exceptions::{ErrorKind, PathSegment, ValidationError, ValidationPath};
pub use facets::{
    evaluate_all, parse_decimal, EnumerationFacet, Facet, FacetViolation, LengthFacet,
    MaxLengthFacet, MinLengthFacet, Numeric, PatternFacet, RangeFacet, WhiteSpace,
};
pub use particles::{parse_occurs, ChildSpec, Occurs};
pub use schemas::{is_builtin, Schema, SchemaBuilder};
pub use types::{ContentKind, Derivation, EffectiveType, TypeDefinition};
pub use validation::{ErrorCollector, Report, ValidationMode};
