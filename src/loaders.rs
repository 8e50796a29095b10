//! Resource loading utilities
//!
//! Schemas are described in JSON and compiled through [`SchemaBuilder`].
//! Names in a description are written either in Clark notation
//! (`{uri}local`) or with a prefix declared under `"namespaces"`.
//! Unprefixed type, element and child names fall into the target namespace;
//! unprefixed attribute names stay unqualified.
//!
//! ```json
//! {
//!   "target_namespace": "http://lca.jrc.it/ILCD/Common",
//!   "namespaces": { "common": "http://lca.jrc.it/ILCD/Common" },
//!   "types": [
//!     {
//!       "name": "CASNumber",
//!       "restriction": "xs:string",
//!       "facets": [{ "pattern": "\\d{2,7}-\\d{2}-\\d" }]
//!     }
//!   ],
//!   "elements": [{ "name": "cas", "type": "CASNumber" }]
//! }
//! ```

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::documents::Node;
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::namespaces::{NamespaceContext, QName};
use crate::validators::facets::{
    parse_decimal, EnumerationFacet, LengthFacet, MaxLengthFacet, MinLengthFacet, RangeFacet,
};
use crate::validators::{
    parse_occurs, AttributeSpec, AttributeUse, AttributeWildcard, ChildSpec, ContentKind, Facet,
    Schema, SchemaBuilder, TypeDefinition, WhiteSpace,
};

/// Serialized schema description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    /// Target namespace of the declared types and elements
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_namespace: Option<String>,
    /// Prefix declarations used by names in this document
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub namespaces: IndexMap<String, String>,
    /// Type definitions
    #[serde(default)]
    pub types: Vec<TypeDocument>,
    /// Global element declarations
    #[serde(default)]
    pub elements: Vec<ElementDocument>,
}

/// Serialized type definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeDocument {
    /// Type name, prefixed or in Clark notation
    pub name: String,
    /// Content kind, `simple` when omitted
    #[serde(default)]
    pub content: ContentDocument,
    /// Base type narrowed by this definition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restriction: Option<String>,
    /// Base type extended by this definition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    /// Whitespace handling, inherited when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub white_space: Option<WhiteSpace>,
    /// Facets declared by this type
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub facets: Vec<FacetDocument>,
    /// Attribute declarations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributeDocument>,
    /// Namespace constraint of an attribute wildcard (`##any`, `##other`, list)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any_attribute: Option<String>,
    /// Child element declarations in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ChildDocument>,
    /// Accept undeclared child elements
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub open_content: bool,
}

/// Content kind as written in a description
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentDocument {
    /// Text only
    #[default]
    Simple,
    /// Child elements only
    Complex,
    /// Child elements and text
    Mixed,
}

impl From<ContentDocument> for ContentKind {
    fn from(content: ContentDocument) -> Self {
        match content {
            ContentDocument::Simple => ContentKind::Simple,
            ContentDocument::Complex => ContentKind::Complex,
            ContentDocument::Mixed => ContentKind::Mixed,
        }
    }
}

/// A number written either as a JSON number or as a string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Lexical {
    /// JSON number
    Number(serde_json::Number),
    /// Literal kept as text, e.g. `"unbounded"` or an exact decimal
    Text(String),
}

impl Lexical {
    fn as_text(&self) -> String {
        match self {
            Lexical::Number(n) => n.to_string(),
            Lexical::Text(s) => s.clone(),
        }
    }
}

/// Serialized facet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum FacetDocument {
    /// Full-match regular expression
    Pattern(String),
    /// Case-sensitive closed set of literals
    Enumeration(Vec<String>),
    /// Enumeration compared without regard to case
    EnumerationCi(Vec<String>),
    /// Numeric bounds, inclusive unless stated otherwise
    Range {
        /// Lower bound
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<Lexical>,
        /// Upper bound
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<Lexical>,
        /// Whether `min` itself is accepted
        #[serde(default = "inclusive")]
        min_inclusive: bool,
        /// Whether `max` itself is accepted
        #[serde(default = "inclusive")]
        max_inclusive: bool,
    },
    /// Exact character count
    Length(usize),
    /// Minimum character count
    MinLength(usize),
    /// Maximum character count
    MaxLength(usize),
}

fn inclusive() -> bool {
    true
}

/// Serialized attribute declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeDocument {
    /// Attribute name; unprefixed names are unqualified
    pub name: String,
    /// Simple value type
    #[serde(rename = "type")]
    pub value_type: String,
    /// `optional`, `required` or `prohibited`
    #[serde(default = "optional_use", rename = "use")]
    pub use_mode: String,
}

fn optional_use() -> String {
    AttributeUse::Optional.as_str().to_string()
}

/// Serialized child declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChildDocument {
    /// Element name
    pub name: String,
    /// Declared type of the element
    #[serde(rename = "type")]
    pub type_name: String,
    /// Minimum count, 1 when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_occurs: Option<Lexical>,
    /// A count or `"unbounded"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_occurs: Option<Lexical>,
}

/// Serialized global element declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElementDocument {
    /// Element name
    pub name: String,
    /// Type the element is validated against
    #[serde(rename = "type")]
    pub type_name: String,
}

impl SchemaDocument {
    /// Parse a description from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render the description as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn context(&self) -> NamespaceContext {
        let mut context = NamespaceContext::new();
        for (prefix, uri) in &self.namespaces {
            context.add_prefix(prefix.as_str(), uri.as_str());
        }
        if let Some(target) = &self.target_namespace {
            context.set_default_namespace(target.as_str());
        }
        context
    }

    /// Compile the description with default limits
    pub fn compile(&self) -> Result<Schema> {
        self.compile_with_limits(Limits::default())
    }

    /// Compile the description into a schema
    pub fn compile_with_limits(&self, limits: Limits) -> Result<Schema> {
        let context = self.context();
        let mut builder = SchemaBuilder::new().with_limits(limits);
        if let Some(target) = &self.target_namespace {
            builder = builder.target_namespace(target.as_str());
        }

        for ty in &self.types {
            builder = builder.add_type(ty.to_definition(&context, self.target_namespace.as_deref())?);
        }
        for element in &self.elements {
            builder = builder.add_element(
                context.resolve(&element.name)?,
                context.resolve(&element.type_name)?,
            );
        }

        debug!(
            "compiling schema description with {} types and {} elements",
            self.types.len(),
            self.elements.len()
        );
        builder.build()
    }
}

impl TypeDocument {
    fn to_definition(
        &self,
        context: &NamespaceContext,
        target_namespace: Option<&str>,
    ) -> Result<TypeDefinition> {
        let name = context.resolve(&self.name)?;
        let mut def = TypeDefinition::new(name, self.content.into());

        def = match (&self.restriction, &self.extension) {
            (Some(_), Some(_)) => {
                return Err(Error::Schema(format!(
                    "type '{}' cannot be both a restriction and an extension",
                    def.name
                )))
            }
            (Some(base), None) => def.restriction_of(context.resolve(base)?),
            (None, Some(base)) => def.extension_of(context.resolve(base)?),
            (None, None) => def,
        };

        if let Some(ws) = self.white_space {
            def = def.with_white_space(ws);
        }
        for facet in &self.facets {
            def = def.with_facet(facet.to_facet()?);
        }
        for attribute in &self.attributes {
            def = def.with_attribute(AttributeSpec::new(
                context.resolve_attribute(&attribute.name)?,
                context.resolve(&attribute.value_type)?,
                AttributeUse::from_str(&attribute.use_mode)?,
            ));
        }
        if let Some(namespace) = &self.any_attribute {
            def = def.with_any_attribute(AttributeWildcard::parse(namespace, target_namespace)?);
        }
        for child in &self.children {
            let min = child.min_occurs.as_ref().map(Lexical::as_text);
            let max = child.max_occurs.as_ref().map(Lexical::as_text);
            let occurs = parse_occurs(min.as_deref(), max.as_deref())?;
            def = def.with_child(ChildSpec::new(
                context.resolve(&child.name)?,
                context.resolve(&child.type_name)?,
                occurs,
            ));
        }
        if self.open_content {
            def = def.with_open_content();
        }
        Ok(def)
    }
}

impl FacetDocument {
    fn to_facet(&self) -> Result<Facet> {
        Ok(match self {
            FacetDocument::Pattern(pattern) => Facet::pattern(pattern)?,
            FacetDocument::Enumeration(values) => Facet::enumeration(values),
            FacetDocument::EnumerationCi(values) => {
                Facet::Enumeration(EnumerationFacet::new(values).case_insensitive())
            }
            FacetDocument::Range {
                min,
                max,
                min_inclusive,
                max_inclusive,
            } => {
                let mut range = RangeFacet::unbounded();
                if let Some(min) = min {
                    range = range.with_min(bound(min)?, *min_inclusive);
                }
                if let Some(max) = max {
                    range = range.with_max(bound(max)?, *max_inclusive);
                }
                Facet::Range(range)
            }
            FacetDocument::Length(n) => Facet::Length(LengthFacet::new(*n)),
            FacetDocument::MinLength(n) => Facet::MinLength(MinLengthFacet::new(*n)),
            FacetDocument::MaxLength(n) => Facet::MaxLength(MaxLengthFacet::new(*n)),
        })
    }
}

fn bound(value: &Lexical) -> Result<Decimal> {
    let text = value.as_text();
    parse_decimal(&text)
        .ok_or_else(|| Error::Schema(format!("range bound '{}' is not a decimal number", text)))
}

/// Reads schema descriptions and documents from disk
#[derive(Debug, Clone, Default)]
pub struct Loader {
    /// Resource limits
    limits: Limits,
}

impl Loader {
    /// Create a new loader with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Current limits
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Load a file as a string, refusing files over the size limit
    pub fn load(&self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        let size = fs::metadata(path)?.len();
        self.limits
            .check_source_size(usize::try_from(size).unwrap_or(usize::MAX))?;
        debug!("loading {} ({} bytes)", path.display(), size);
        Ok(fs::read_to_string(path)?)
    }

    /// Load and compile a JSON schema description
    pub fn load_schema(&self, path: impl AsRef<Path>) -> Result<Schema> {
        let text = self.load(path)?;
        SchemaDocument::from_json(&text)?.compile_with_limits(self.limits.clone())
    }

    /// Load and parse an XML document
    pub fn load_document(&self, path: impl AsRef<Path>) -> Result<Node> {
        let text = self.load(path)?;
        Node::parse(&text)
    }
}
