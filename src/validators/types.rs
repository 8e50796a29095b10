//! Type definitions
//!
//! A [`TypeDefinition`] is a named bundle of constraints: facets for simple
//! content, attribute declarations and a child-element content model. Types
//! may derive from one base type, by restriction or by extension; the
//! effective constraint set is computed by the schema at build time.

use crate::error::{Error, Result};
use crate::namespaces::QName;
use indexmap::IndexMap;

use super::attributes::{AttributeSpec, AttributeWildcard};
use super::facets::{Facet, WhiteSpace};
use super::particles::ChildSpec;

/// What an element of this type may contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentKind {
    /// Text only, checked against the facets
    #[default]
    Simple,
    /// Child elements only; whitespace between them is ignored
    Complex,
    /// Child elements interleaved with free text
    Mixed,
}

impl ContentKind {
    /// Parse from string value
    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "simple" => Ok(ContentKind::Simple),
            "complex" => Ok(ContentKind::Complex),
            "mixed" => Ok(ContentKind::Mixed),
            _ => Err(Error::Schema(format!(
                "Invalid content kind: '{}'. Must be 'simple', 'complex', or 'mixed'",
                s
            ))),
        }
    }

    /// Get the content kind as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Simple => "simple",
            ContentKind::Complex => "complex",
            ContentKind::Mixed => "mixed",
        }
    }

    /// Whether child elements are allowed
    pub fn has_children(&self) -> bool {
        !matches!(self, ContentKind::Simple)
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a type derives from its base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivation {
    /// Narrows the base: facets are added, the content model may be replaced
    Restriction,
    /// Widens the base: attributes and children are appended
    Extension,
}

/// A named constraint bundle
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinition {
    /// Qualified type name
    pub name: QName,
    /// Base type and derivation method
    pub base: Option<(Derivation, QName)>,
    /// Content kind
    pub content: ContentKind,
    /// Whitespace handling; inherited from the base when unset
    pub white_space: Option<WhiteSpace>,
    /// Facets declared on this type (not including inherited ones)
    pub facets: Vec<Facet>,
    /// Attribute declarations, by qualified name
    pub attributes: IndexMap<QName, AttributeSpec>,
    /// Child element declarations in content-model order
    pub children: Vec<ChildSpec>,
    /// Attribute wildcard, if any
    pub any_attribute: Option<AttributeWildcard>,
    /// Whether undeclared child elements are accepted
    pub open_content: bool,
}

impl TypeDefinition {
    /// Create a type with the given content kind and nothing else
    pub fn new(name: QName, content: ContentKind) -> Self {
        Self {
            name,
            base: None,
            content,
            white_space: None,
            facets: Vec::new(),
            attributes: IndexMap::new(),
            children: Vec::new(),
            any_attribute: None,
            open_content: false,
        }
    }

    /// Simple-content type
    pub fn simple(name: QName) -> Self {
        Self::new(name, ContentKind::Simple)
    }

    /// Element-only complex type
    pub fn complex(name: QName) -> Self {
        Self::new(name, ContentKind::Complex)
    }

    /// Mixed-content complex type
    pub fn mixed(name: QName) -> Self {
        Self::new(name, ContentKind::Mixed)
    }

    /// Derive by restriction from `base`
    pub fn restriction_of(mut self, base: QName) -> Self {
        self.base = Some((Derivation::Restriction, base));
        self
    }

    /// Derive by extension from `base`
    pub fn extension_of(mut self, base: QName) -> Self {
        self.base = Some((Derivation::Extension, base));
        self
    }

    /// Set whitespace handling
    pub fn with_white_space(mut self, white_space: WhiteSpace) -> Self {
        self.white_space = Some(white_space);
        self
    }

    /// Add a facet
    pub fn with_facet(mut self, facet: Facet) -> Self {
        self.facets.push(facet);
        self
    }

    /// Add (or replace) an attribute declaration
    pub fn with_attribute(mut self, attribute: AttributeSpec) -> Self {
        self.attributes.insert(attribute.name.clone(), attribute);
        self
    }

    /// Add a child element declaration
    pub fn with_child(mut self, child: ChildSpec) -> Self {
        self.children.push(child);
        self
    }

    /// Admit undeclared attributes matching the wildcard
    pub fn with_any_attribute(mut self, wildcard: AttributeWildcard) -> Self {
        self.any_attribute = Some(wildcard);
        self
    }

    /// Accept undeclared child elements
    pub fn with_open_content(mut self) -> Self {
        self.open_content = true;
        self
    }

    /// Base type name, if derived
    pub fn base_name(&self) -> Option<&QName> {
        self.base.as_ref().map(|(_, name)| name)
    }
}

/// A type with its whole base chain folded in
///
/// This is what the engine validates against; it is computed once per type
/// when the schema is built.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveType {
    /// Qualified type name
    pub name: QName,
    /// Content kind of the most derived type
    pub content: ContentKind,
    /// Whitespace handling applied before facets
    pub white_space: WhiteSpace,
    /// Facets of every type in the chain, root first
    pub facets: Vec<Facet>,
    /// Attribute declarations of every type in the chain
    pub attributes: IndexMap<QName, AttributeSpec>,
    /// Effective content model
    pub children: Vec<ChildSpec>,
    /// Effective attribute wildcard
    pub any_attribute: Option<AttributeWildcard>,
    /// Whether undeclared child elements are accepted
    pub open_content: bool,
    /// Names of the chain, most derived first
    pub lineage: Vec<QName>,
}

impl EffectiveType {
    /// Fold a chain of definitions given root first
    pub(crate) fn from_chain(chain: &[&TypeDefinition]) -> Self {
        let mut folded = EffectiveType {
            name: QName::local(""),
            content: ContentKind::Simple,
            white_space: WhiteSpace::Preserve,
            facets: Vec::new(),
            attributes: IndexMap::new(),
            children: Vec::new(),
            any_attribute: None,
            open_content: false,
            lineage: Vec::with_capacity(chain.len()),
        };

        for def in chain {
            folded.name = def.name.clone();
            folded.content = def.content;
            if let Some(ws) = def.white_space {
                folded.white_space = ws;
            }
            folded.facets.extend(def.facets.iter().cloned());

            for (name, spec) in &def.attributes {
                let mut spec = spec.clone();
                // A restriction may tighten an inherited attribute, never loosen it
                if let Some(inherited) = folded.attributes.get(name) {
                    if inherited.is_required() {
                        spec.use_mode = inherited.use_mode;
                    }
                }
                folded.attributes.insert(name.clone(), spec);
            }

            match def.base {
                Some((Derivation::Restriction, _)) if !def.children.is_empty() => {
                    folded.children = def.children.clone();
                }
                Some((Derivation::Restriction, _)) => {}
                _ => folded.children.extend(def.children.iter().cloned()),
            }

            if def.any_attribute.is_some() {
                folded.any_attribute = def.any_attribute.clone();
            }
            folded.open_content = def.open_content;
            folded.lineage.insert(0, def.name.clone());
        }

        folded
    }

    /// Declaration for a child element name
    pub fn child(&self, name: &QName) -> Option<&ChildSpec> {
        self.children.iter().find(|c| &c.name == name)
    }

    /// Whether this type is `name` or derives from it
    pub fn derives_from(&self, name: &QName) -> bool {
        self.lineage.contains(name)
    }
}
