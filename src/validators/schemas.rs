//! Schema model
//!
//! A [`Schema`] is a read-only registry of type definitions and global
//! element declarations. It is produced by [`SchemaBuilder::build`], which
//! checks the model for dangling references and derivation cycles and folds
//! every base chain into an [`EffectiveType`]. After that nothing mutates it,
//! so a `Schema` can be shared between any number of concurrent validations.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::{debug, trace};

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::namespaces::{QName, XSD_NAMESPACE};

use super::attributes::AttributeWildcard;
use super::facets::{EnumerationFacet, Facet, RangeFacet, WhiteSpace};
use super::types::{ContentKind, EffectiveType, TypeDefinition};

/// Compiled, immutable schema
#[derive(Debug, Clone)]
pub struct Schema {
    /// Target namespace of the schema, if any
    pub target_namespace: Option<String>,
    types: IndexMap<QName, TypeDefinition>,
    elements: IndexMap<QName, QName>,
    effective: IndexMap<QName, EffectiveType>,
}

impl Schema {
    /// Start building a schema
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Look up a type definition as declared
    pub fn lookup_type(&self, name: &QName) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    /// Look up the type name of a global element
    pub fn lookup_element(&self, name: &QName) -> Option<&QName> {
        self.elements.get(name)
    }

    /// Look up a type with its base chain folded in
    pub fn effective_type(&self, name: &QName) -> Option<&EffectiveType> {
        self.effective.get(name)
    }

    /// Resolve a type name, failing with `UnknownType`
    pub fn resolve(&self, name: &QName) -> Result<&EffectiveType> {
        self.effective_type(name)
            .ok_or_else(|| Error::UnknownType(name.clone()))
    }

    /// All type definitions, built-ins first
    pub fn types(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.types.values()
    }

    /// All global elements with their type names
    pub fn elements(&self) -> impl Iterator<Item = (&QName, &QName)> {
        self.elements.iter()
    }

    /// Number of user-defined types
    pub fn type_count(&self) -> usize {
        self.types.keys().filter(|name| !is_builtin(name)).count()
    }

    /// Number of global elements
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }
}

/// Whether a name belongs to the pre-registered built-in types
pub fn is_builtin(name: &QName) -> bool {
    name.in_namespace(XSD_NAMESPACE)
}

/// Built-in simple types registered in every schema
fn builtin_types() -> Result<Vec<TypeDefinition>> {
    Ok(vec![
        TypeDefinition::mixed(QName::xs("anyType"))
            .with_any_attribute(AttributeWildcard::Any)
            .with_open_content(),
        TypeDefinition::simple(QName::xs("anySimpleType")),
        TypeDefinition::simple(QName::xs("string")).with_white_space(WhiteSpace::Preserve),
        TypeDefinition::simple(QName::xs("token")).with_white_space(WhiteSpace::Collapse),
        TypeDefinition::simple(QName::xs("decimal"))
            .with_white_space(WhiteSpace::Collapse)
            .with_facet(Facet::Range(RangeFacet::unbounded())),
        TypeDefinition::simple(QName::xs("double"))
            .with_white_space(WhiteSpace::Collapse)
            .with_facet(Facet::Range(RangeFacet::unbounded())),
        TypeDefinition::simple(QName::xs("integer"))
            .with_white_space(WhiteSpace::Collapse)
            .with_facet(Facet::pattern(r"[+-]?\d+")?),
        TypeDefinition::simple(QName::xs("boolean"))
            .with_white_space(WhiteSpace::Collapse)
            .with_facet(Facet::Enumeration(EnumerationFacet::new([
                "true", "false", "1", "0",
            ]))),
    ])
}

/// Builder that validates and compiles a [`Schema`]
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    target_namespace: Option<String>,
    types: Vec<TypeDefinition>,
    elements: Vec<(QName, QName)>,
    limits: Limits,
}

impl SchemaBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target namespace
    pub fn target_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.target_namespace = Some(namespace.into());
        self
    }

    /// Set the limits checked while building
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Register a type definition
    pub fn add_type(mut self, definition: TypeDefinition) -> Self {
        self.types.push(definition);
        self
    }

    /// Register a global element of the given type
    pub fn add_element(mut self, name: QName, type_name: QName) -> Self {
        self.elements.push((name, type_name));
        self
    }

    /// Check the model and compile it
    pub fn build(self) -> Result<Schema> {
        let mut types: IndexMap<QName, TypeDefinition> = IndexMap::new();
        for def in builtin_types()?.into_iter().chain(self.types) {
            if types.contains_key(&def.name) {
                return Err(Error::Schema(format!("duplicate type definition '{}'", def.name)));
            }
            types.insert(def.name.clone(), def);
        }

        let mut elements: IndexMap<QName, QName> = IndexMap::new();
        for (name, type_name) in self.elements {
            if !types.contains_key(&type_name) {
                return Err(Error::UnknownType(type_name));
            }
            if elements.insert(name.clone(), type_name).is_some() {
                return Err(Error::Schema(format!("duplicate element declaration '{}'", name)));
            }
        }

        for def in types.values() {
            check_references(def, &types)?;
        }

        let mut effective = IndexMap::with_capacity(types.len());
        for name in types.keys() {
            let chain = base_chain(name, &types, &self.limits)?;
            check_attribute_uses(&chain)?;
            let folded = EffectiveType::from_chain(&chain);
            check_content_model(&folded)?;
            trace!("resolved type {} through {} definitions", name, chain.len());
            effective.insert(name.clone(), folded);
        }

        debug!(
            "built schema with {} types and {} global elements",
            types.len(),
            elements.len()
        );

        Ok(Schema {
            target_namespace: self.target_namespace,
            types,
            elements,
            effective,
        })
    }
}

fn check_references(def: &TypeDefinition, types: &IndexMap<QName, TypeDefinition>) -> Result<()> {
    if let Some(base) = def.base_name() {
        if !types.contains_key(base) {
            return Err(Error::UnknownType(base.clone()));
        }
    }

    for spec in def.attributes.values() {
        match types.get(&spec.value_type) {
            None => return Err(Error::UnknownType(spec.value_type.clone())),
            Some(value_type) if value_type.content != ContentKind::Simple => {
                return Err(Error::Schema(format!(
                    "attribute '{}' of type '{}' must have a simple value type, '{}' is not",
                    spec.name, def.name, spec.value_type
                )))
            }
            Some(_) => {}
        }
    }

    for child in &def.children {
        if !types.contains_key(&child.type_name) {
            return Err(Error::UnknownType(child.type_name.clone()));
        }
        child.occurs.check().map_err(|e| {
            Error::Schema(format!("child '{}' of type '{}': {}", child.name, def.name, e))
        })?;
    }

    Ok(())
}

/// Base chain of a type, root first
fn base_chain<'a>(
    name: &QName,
    types: &'a IndexMap<QName, TypeDefinition>,
    limits: &Limits,
) -> Result<Vec<&'a TypeDefinition>> {
    let mut chain = Vec::new();
    let mut seen = HashSet::new();
    let mut current = Some(name);

    while let Some(type_name) = current {
        if !seen.insert(type_name) {
            return Err(Error::Schema(format!(
                "circular derivation: '{}' derives from itself",
                name
            )));
        }
        let def = types
            .get(type_name)
            .ok_or_else(|| Error::UnknownType(type_name.clone()))?;
        chain.push(def);
        limits.check_type_depth(chain.len())?;
        current = def.base_name();
    }

    chain.reverse();
    Ok(chain)
}

/// A derived type may not prohibit an attribute its base requires
fn check_attribute_uses(chain: &[&TypeDefinition]) -> Result<()> {
    let mut required: HashSet<&QName> = HashSet::new();
    for def in chain {
        for (name, spec) in &def.attributes {
            if spec.is_prohibited() && required.contains(name) {
                return Err(Error::Schema(format!(
                    "type '{}' prohibits attribute '{}' which its base requires",
                    def.name, name
                )));
            }
            if spec.is_required() {
                required.insert(name);
            }
        }
    }
    Ok(())
}

fn check_content_model(folded: &EffectiveType) -> Result<()> {
    let mut names = HashSet::new();
    for child in &folded.children {
        if !names.insert(&child.name) {
            return Err(Error::Schema(format!(
                "type '{}' declares child '{}' more than once",
                folded.name, child.name
            )));
        }
    }
    if !folded.children.is_empty() && folded.content == ContentKind::Simple {
        return Err(Error::Schema(format!(
            "simple-content type '{}' cannot declare child elements",
            folded.name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::attributes::{AttributeSpec, AttributeUse};
    use crate::validators::facets::Facet;
    use crate::validators::particles::{ChildSpec, Occurs};
    use rust_decimal::Decimal;

    const COMMON: &str = "http://lca.jrc.it/ILCD/Common";

    fn q(name: &str) -> QName {
        QName::namespaced(COMMON, name)
    }

    #[test]
    fn test_builtins_registered() {
        let schema = Schema::builder().build().unwrap();
        assert!(schema.lookup_type(&QName::xs("string")).is_some());
        assert!(schema.effective_type(&QName::xs("decimal")).is_some());
        assert_eq!(schema.type_count(), 0);
        assert_eq!(schema.element_count(), 0);
    }

    #[test]
    fn test_resolve_inheritance_chain() {
        let schema = Schema::builder()
            .target_namespace(COMMON)
            .add_type(
                TypeDefinition::simple(q("Real"))
                    .restriction_of(QName::xs("double")),
            )
            .add_type(
                TypeDefinition::simple(q("Latitude"))
                    .restriction_of(q("Real"))
                    .with_facet(Facet::range(Decimal::from(-90), Decimal::from(90))),
            )
            .add_element(q("lat"), q("Latitude"))
            .build()
            .unwrap();

        let effective = schema.resolve(&q("Latitude")).unwrap();
        assert_eq!(effective.facets.len(), 2);
        assert_eq!(effective.white_space, WhiteSpace::Collapse);
        assert_eq!(effective.lineage, vec![q("Latitude"), q("Real"), QName::xs("double")]);
        assert_eq!(schema.lookup_element(&q("lat")), Some(&q("Latitude")));
        assert_eq!(schema.type_count(), 2);
    }

    #[test]
    fn test_unknown_type() {
        let schema = Schema::builder().build().unwrap();
        assert!(matches!(schema.resolve(&q("GIS")), Err(Error::UnknownType(_))));
    }

    #[test]
    fn test_dangling_references() {
        let missing_base = Schema::builder()
            .add_type(TypeDefinition::simple(q("A")).restriction_of(q("Missing")))
            .build();
        assert!(matches!(missing_base, Err(Error::UnknownType(name)) if name == q("Missing")));

        let missing_child = Schema::builder()
            .add_type(
                TypeDefinition::complex(q("A"))
                    .with_child(ChildSpec::required(q("c"), q("Nope"))),
            )
            .build();
        assert!(matches!(missing_child, Err(Error::UnknownType(_))));

        let missing_element_type = Schema::builder().add_element(q("e"), q("Nope")).build();
        assert!(matches!(missing_element_type, Err(Error::UnknownType(_))));
    }

    #[test]
    fn test_cycle_rejected() {
        let result = Schema::builder()
            .add_type(TypeDefinition::simple(q("A")).restriction_of(q("B")))
            .add_type(TypeDefinition::simple(q("B")).restriction_of(q("A")))
            .build();
        assert!(matches!(result, Err(Error::Schema(msg)) if msg.contains("circular")));
    }

    #[test]
    fn test_type_depth_limit() {
        let mut builder = Schema::builder().with_limits(Limits::strict());
        builder = builder.add_type(TypeDefinition::simple(q("T0")));
        for i in 1..30 {
            builder = builder.add_type(
                TypeDefinition::simple(q(&format!("T{}", i))).restriction_of(q(&format!("T{}", i - 1))),
            );
        }
        assert!(matches!(builder.build(), Err(Error::LimitExceeded(_))));
    }

    #[test]
    fn test_duplicates_rejected() {
        let result = Schema::builder()
            .add_type(TypeDefinition::simple(q("A")))
            .add_type(TypeDefinition::simple(q("A")))
            .build();
        assert!(matches!(result, Err(Error::Schema(_))));

        let result = Schema::builder()
            .add_type(TypeDefinition::simple(QName::xs("string")))
            .build();
        assert!(matches!(result, Err(Error::Schema(_))));

        let result = Schema::builder()
            .add_type(
                TypeDefinition::complex(q("A"))
                    .with_child(ChildSpec::optional(q("c"), QName::xs("string")))
                    .with_child(ChildSpec::required(q("c"), QName::xs("string"))),
            )
            .build();
        assert!(matches!(result, Err(Error::Schema(_))));
    }

    #[test]
    fn test_invalid_occurs_rejected() {
        let result = Schema::builder()
            .add_type(
                TypeDefinition::complex(q("A"))
                    .with_child(ChildSpec::new(q("c"), QName::xs("string"), Occurs::new(2, Some(1)))),
            )
            .build();
        assert!(matches!(result, Err(Error::Schema(_))));
    }

    #[test]
    fn test_attribute_value_type_must_be_simple() {
        let result = Schema::builder()
            .add_type(TypeDefinition::complex(q("C")))
            .add_type(
                TypeDefinition::complex(q("A"))
                    .with_attribute(AttributeSpec::optional(QName::local("x"), q("C"))),
            )
            .build();
        assert!(matches!(result, Err(Error::Schema(_))));
    }

    #[test]
    fn test_prohibiting_required_attribute_rejected() {
        let result = Schema::builder()
            .add_type(
                TypeDefinition::complex(q("Base"))
                    .with_attribute(AttributeSpec::required(QName::local("id"), QName::xs("string"))),
            )
            .add_type(
                TypeDefinition::complex(q("Derived"))
                    .restriction_of(q("Base"))
                    .with_attribute(AttributeSpec::new(
                        QName::local("id"),
                        QName::xs("string"),
                        AttributeUse::Prohibited,
                    )),
            )
            .build();
        match result {
            Err(Error::Schema(message)) => assert!(message.contains("prohibits attribute")),
            other => panic!("expected a schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_simple_type_with_children_rejected() {
        let result = Schema::builder()
            .add_type(
                TypeDefinition::simple(q("A"))
                    .with_child(ChildSpec::required(q("c"), QName::xs("string"))),
            )
            .build();
        assert!(matches!(result, Err(Error::Schema(_))));
    }

    #[test]
    fn test_schema_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Schema>();
    }
}
