//! Document Validation
//!
//! This module walks a [`Node`] tree against a resolved type. Per element the
//! order is fixed: attributes, then content, then children in document order.
//! In strict mode the first finding ends the walk; in lax mode every check
//! runs and every finding is reported.
//!
//! A walk owns its [`ErrorCollector`] and borrows the schema read-only, so
//! validations of different documents can run on different threads against
//! one shared [`Schema`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, trace};

use crate::documents::Node;
use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::namespaces::{QName, XSI_NAMESPACE};

use super::exceptions::{ErrorKind, PathSegment};
use super::facets::evaluate_all;
use super::schemas::Schema;
use super::types::{ContentKind, EffectiveType};
use super::validation::{ErrorCollector, Flow, Interrupt, Report, ValidationMode};

/// Validate a node against a named type
pub fn validate(
    schema: &Schema,
    node: &Node,
    type_name: &QName,
    mode: ValidationMode,
) -> Result<Report> {
    Validator::new(schema).with_mode(mode).validate(node, type_name)
}

/// Validate a node against the type of the global element with its name
pub fn validate_element(schema: &Schema, node: &Node, mode: ValidationMode) -> Result<Report> {
    Validator::new(schema).with_mode(mode).validate_element(node)
}

/// Validate a bare string against a simple type
pub fn validate_value(
    schema: &Schema,
    type_name: &QName,
    value: &str,
    mode: ValidationMode,
) -> Result<Report> {
    Validator::new(schema).with_mode(mode).validate_value(type_name, value)
}

impl Schema {
    /// Validate a node against a named type
    pub fn validate(&self, node: &Node, type_name: &QName, mode: ValidationMode) -> Result<Report> {
        validate(self, node, type_name, mode)
    }

    /// Check a node against a named type, stopping at the first finding
    pub fn is_valid(&self, node: &Node, type_name: &QName) -> Result<bool> {
        Ok(validate(self, node, type_name, ValidationMode::Strict)?.valid)
    }
}

/// Reusable validation settings bound to a schema
#[derive(Debug, Clone)]
pub struct Validator<'s> {
    schema: &'s Schema,
    mode: ValidationMode,
    limits: Limits,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'s> Validator<'s> {
    /// Strict validator with default limits
    pub fn new(schema: &'s Schema) -> Self {
        Self {
            schema,
            mode: ValidationMode::default(),
            limits: Limits::default(),
            cancel: None,
        }
    }

    /// Set the mode
    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Abort with [`Error::Cancelled`] once `flag` is set
    ///
    /// The flag is polled before each element, never in the middle of one.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Current mode
    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Validate a node against a named type
    pub fn validate(&self, node: &Node, type_name: &QName) -> Result<Report> {
        let ty = self.schema.resolve(type_name)?;
        debug!(
            "validating {} against {} ({} mode)",
            node.name, type_name, self.mode
        );
        self.run(|walker| walker.element(node, ty, 1))
    }

    /// Validate a node against the type of the global element with its name
    pub fn validate_element(&self, node: &Node) -> Result<Report> {
        let type_name = self
            .schema
            .lookup_element(&node.name)
            .ok_or_else(|| Error::UnknownType(node.name.clone()))?;
        self.validate(node, type_name)
    }

    /// Validate a bare string against a simple type
    pub fn validate_value(&self, type_name: &QName, value: &str) -> Result<Report> {
        let ty = self.schema.resolve(type_name)?;
        if ty.content != ContentKind::Simple {
            return Err(Error::Schema(format!(
                "type '{}' does not have simple content",
                type_name
            )));
        }
        self.run(|walker| walker.value(ty, value))
    }

    /// Parse XML text and validate its root element
    ///
    /// With no `type_name` the root is looked up among the global elements.
    pub fn validate_str(&self, xml: &str, type_name: Option<&QName>) -> Result<Report> {
        let node = Node::parse(xml)?;
        match type_name {
            Some(name) => self.validate(&node, name),
            None => self.validate_element(&node),
        }
    }

    fn run(&self, walk: impl FnOnce(&mut Walker<'_>) -> Flow) -> Result<Report> {
        let mut walker = Walker {
            schema: self.schema,
            limits: &self.limits,
            cancel: self.cancel.as_deref(),
            collector: ErrorCollector::new(self.mode),
            depth: 0,
        };

        match walk(&mut walker) {
            Ok(()) | Err(Interrupt::Halt) => {
                let report = walker.collector.into_report();
                debug!("validation finished with {} error(s)", report.len());
                Ok(report)
            }
            Err(Interrupt::Fatal(error)) => Err(error),
        }
    }
}

/// State of one walk
struct Walker<'a> {
    schema: &'a Schema,
    limits: &'a Limits,
    cancel: Option<&'a AtomicBool>,
    collector: ErrorCollector,
    depth: usize,
}

impl<'a> Walker<'a> {
    /// Run `f` with `segment` appended to the current path
    fn at(&mut self, segment: PathSegment, f: impl FnOnce(&mut Self) -> Flow) -> Flow {
        self.collector.enter(segment);
        let flow = f(self);
        self.collector.leave();
        flow
    }

    fn element(&mut self, node: &Node, ty: &EffectiveType, position: usize) -> Flow {
        if self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            return Err(Error::Cancelled.into());
        }
        self.depth += 1;
        self.limits.check_xml_depth(self.depth)?;
        trace!("element {} as {}", node.name, ty.name);

        let segment = PathSegment::Element {
            name: node.name.clone(),
            position,
        };
        let flow = self.at(segment, |w| {
            w.attributes(node, ty)?;
            match ty.content {
                ContentKind::Simple => w.simple_content(node, ty),
                ContentKind::Complex | ContentKind::Mixed => w.element_content(node, ty),
            }
        });
        self.depth -= 1;
        flow
    }

    fn attributes(&mut self, node: &Node, ty: &EffectiveType) -> Flow {
        let schema = self.schema;

        for spec in ty.attributes.values() {
            let segment = PathSegment::Attribute {
                name: spec.name.clone(),
            };
            match node.attribute(&spec.name) {
                None if spec.is_required() => {
                    self.at(segment, |w| {
                        w.collector.report(
                            ErrorKind::MissingRequiredAttribute,
                            format!(
                                "element '{}' is missing required attribute '{}'",
                                node.name, spec.name
                            ),
                            None,
                        )
                    })?;
                }
                None => {}
                Some(value) if spec.is_prohibited() => {
                    self.at(segment, |w| {
                        w.collector.report(
                            ErrorKind::UnexpectedAttribute,
                            format!("attribute '{}' is prohibited on '{}'", spec.name, node.name),
                            Some(value),
                        )
                    })?;
                }
                Some(value) => {
                    let value_type = schema.resolve(&spec.value_type)?;
                    self.at(segment, |w| w.value(value_type, value))?;
                }
            }
        }

        for (name, value) in &node.attributes {
            if ty.attributes.contains_key(name) || name.in_namespace(XSI_NAMESPACE) {
                continue;
            }
            if ty.any_attribute.as_ref().is_some_and(|wc| wc.admits(name)) {
                continue;
            }
            let segment = PathSegment::Attribute { name: name.clone() };
            self.at(segment, |w| {
                w.collector.report(
                    ErrorKind::UnexpectedAttribute,
                    format!("attribute '{}' is not allowed on '{}'", name, node.name),
                    Some(value),
                )
            })?;
        }

        Ok(())
    }

    /// Check a lexical value against every facet of a simple type
    fn value(&mut self, ty: &EffectiveType, value: &str) -> Flow {
        for violation in evaluate_all(&ty.facets, ty.white_space, value) {
            self.collector.report(
                violation.kind,
                format!("invalid value for {}: {}", ty.name, violation.message),
                Some(value),
            )?;
        }
        Ok(())
    }

    fn simple_content(&mut self, node: &Node, ty: &EffectiveType) -> Flow {
        self.value(ty, node.text_or_empty())?;

        for (child, position) in node.children.iter().zip(sibling_positions(&node.children)) {
            let segment = PathSegment::Element {
                name: child.name.clone(),
                position,
            };
            self.at(segment, |w| {
                w.collector.report(
                    ErrorKind::UnexpectedElement,
                    format!(
                        "element '{}' has simple content and cannot contain '{}'",
                        node.name, child.name
                    ),
                    None,
                )
            })?;
        }
        Ok(())
    }

    fn element_content(&mut self, node: &Node, ty: &EffectiveType) -> Flow {
        let schema = self.schema;
        self.limits.check_children(node.children.len())?;

        if ty.content == ContentKind::Complex {
            if let Some(text) = node.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
                self.collector.report(
                    ErrorKind::UnexpectedText,
                    format!("element '{}' does not allow character data", node.name),
                    Some(text),
                )?;
            }
        }

        let positions = sibling_positions(&node.children);

        if !ty.open_content {
            for (child, &position) in node.children.iter().zip(&positions) {
                if ty.child(&child.name).is_some() {
                    continue;
                }
                let segment = PathSegment::Element {
                    name: child.name.clone(),
                    position,
                };
                self.at(segment, |w| {
                    w.collector.report(
                        ErrorKind::UnexpectedElement,
                        format!(
                            "element '{}' is not allowed in '{}'; expected one of: {}",
                            child.name,
                            node.name,
                            expected_names(ty)
                        ),
                        None,
                    )
                })?;
            }
        }

        for spec in &ty.children {
            let count = node.children_named(&spec.name).count();
            if spec.occurs.contains(count) {
                continue;
            }
            let message = if spec.occurs.is_missing(count) {
                format!(
                    "element '{}' must contain at least {} '{}' element(s), found {}",
                    node.name, spec.occurs.min, spec.name, count
                )
            } else {
                format!(
                    "element '{}' may contain at most {} '{}' element(s), found {}",
                    node.name,
                    spec.occurs.max.unwrap_or_default(),
                    spec.name,
                    count
                )
            };
            self.collector.report(
                ErrorKind::CardinalityViolation,
                message,
                Some(&count.to_string()),
            )?;
        }

        for (child, &position) in node.children.iter().zip(&positions) {
            let child_type = match ty.child(&child.name) {
                Some(spec) => Some(&spec.type_name),
                // Open content still checks children the schema knows about
                None if ty.open_content => schema.lookup_element(&child.name),
                None => None,
            };
            if let Some(type_name) = child_type {
                let child_ty = schema.resolve(type_name)?;
                self.element(child, child_ty, position)?;
            }
        }

        Ok(())
    }
}

/// 1-based position of each child among its same-named siblings
fn sibling_positions(children: &[Node]) -> Vec<usize> {
    let mut seen: HashMap<&QName, usize> = HashMap::new();
    children
        .iter()
        .map(|child| {
            let count = seen.entry(&child.name).or_insert(0);
            *count += 1;
            *count
        })
        .collect()
}

fn expected_names(ty: &EffectiveType) -> String {
    if ty.children.is_empty() {
        return "(none)".to_string();
    }
    ty.children
        .iter()
        .map(|c| c.name.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::attributes::{AttributeSpec, AttributeWildcard};
    use crate::validators::facets::Facet;
    use crate::validators::particles::{ChildSpec, Occurs};
    use crate::validators::types::TypeDefinition;
    use rust_decimal::Decimal;

    const NS: &str = "urn:test";

    fn q(name: &str) -> QName {
        QName::namespaced(NS, name)
    }

    fn schema() -> Schema {
        Schema::builder()
            .add_type(
                TypeDefinition::simple(q("Code"))
                    .restriction_of(QName::xs("string"))
                    .with_facet(Facet::pattern("[A-Z]{3}").unwrap()),
            )
            .add_type(
                TypeDefinition::simple(q("Percent"))
                    .restriction_of(QName::xs("decimal"))
                    .with_facet(Facet::range(Decimal::from(0), Decimal::from(100))),
            )
            .add_type(
                TypeDefinition::complex(q("Item"))
                    .with_attribute(AttributeSpec::required(QName::local("code"), q("Code")))
                    .with_attribute(AttributeSpec::optional(QName::local("share"), q("Percent")))
                    .with_child(ChildSpec::required(q("name"), QName::xs("string")))
                    .with_child(ChildSpec::new(q("tag"), q("Code"), Occurs::new(0, Some(2)))),
            )
            .add_element(q("item"), q("Item"))
            .build()
            .unwrap()
    }

    fn item() -> Node {
        Node::new(q("item"))
            .with_attribute(QName::local("code"), "ABC")
            .with_child(Node::new(q("name")).with_text("widget"))
    }

    #[test]
    fn test_valid_item() {
        let report = validate_element(&schema(), &item(), ValidationMode::Strict).unwrap();
        assert!(report.valid, "{}", report);
    }

    #[test]
    fn test_order_attributes_content_children() {
        let node = Node::new(q("item"))
            .with_attribute(QName::local("share"), "150")
            .with_text("stray")
            .with_child(Node::new(q("tag")).with_text("x"));

        let report = validate(&schema(), &node, &q("Item"), ValidationMode::Lax).unwrap();
        let kinds: Vec<_> = report.errors.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ErrorKind::MissingRequiredAttribute,
                ErrorKind::RangeViolation,
                ErrorKind::UnexpectedText,
                ErrorKind::CardinalityViolation,
                ErrorKind::PatternMismatch,
            ]
        );

        let strict = validate(&schema(), &node, &q("Item"), ValidationMode::Strict).unwrap();
        assert_eq!(strict.errors.len(), 1);
        assert_eq!(strict.errors[0], report.errors[0]);
    }

    #[test]
    fn test_paths_and_positions() {
        let node = item()
            .with_child(Node::new(q("tag")).with_text("ABC"))
            .with_child(Node::new(q("tag")).with_text("bad"));

        let report = validate(&schema(), &node, &q("Item"), ValidationMode::Lax).unwrap();
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].path.to_string(), "/{urn:test}item/{urn:test}tag[2]");
        assert_eq!(report.errors[0].value.as_deref(), Some("bad"));
    }

    #[test]
    fn test_unexpected_element_and_attribute() {
        let node = item()
            .with_attribute(QName::local("colour"), "red")
            .with_child(Node::new(q("extra")));

        let report = validate(&schema(), &node, &q("Item"), ValidationMode::Lax).unwrap();
        assert!(report.has_kind(ErrorKind::UnexpectedAttribute));
        assert!(report.has_kind(ErrorKind::UnexpectedElement));
    }

    #[test]
    fn test_xsi_attributes_are_ignored() {
        let node = item().with_attribute(QName::namespaced(XSI_NAMESPACE, "type"), "Item");
        assert!(schema().is_valid(&node, &q("Item")).unwrap());
    }

    #[test]
    fn test_wildcard_admits_but_never_satisfies() {
        let schema = Schema::builder()
            .add_type(
                TypeDefinition::complex(q("Open"))
                    .with_attribute(AttributeSpec::required(QName::local("id"), QName::xs("string")))
                    .with_any_attribute(AttributeWildcard::Any),
            )
            .build()
            .unwrap();

        let node = Node::new(q("open")).with_attribute(QName::namespaced("urn:other", "id"), "1");
        let report = validate(&schema, &node, &q("Open"), ValidationMode::Lax).unwrap();
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].kind, ErrorKind::MissingRequiredAttribute);
    }

    #[test]
    fn test_simple_content_rejects_children() {
        let node = Node::new(q("code")).with_text("ABC").with_child(Node::new(q("x")));
        let report = validate(&schema(), &node, &q("Code"), ValidationMode::Lax).unwrap();
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].kind, ErrorKind::UnexpectedElement);
    }

    #[test]
    fn test_unknown_type_is_fatal_in_both_modes() {
        for mode in [ValidationMode::Strict, ValidationMode::Lax] {
            let err = validate(&schema(), &item(), &q("Nope"), mode).unwrap_err();
            assert_eq!(err.kind(), Some(ErrorKind::UnknownType));
        }
        let stray = Node::new(q("stray"));
        assert!(matches!(
            validate_element(&schema(), &stray, ValidationMode::Lax),
            Err(Error::UnknownType(_))
        ));
    }

    #[test]
    fn test_malformed_input_is_fatal() {
        let schema = schema();
        let validator = Validator::new(&schema).with_mode(ValidationMode::Lax);
        let err = validator.validate_str("<item", None).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::MalformedInput));
    }

    #[test]
    fn test_validate_value() {
        let schema = schema();
        assert!(validate_value(&schema, &q("Code"), "XYZ", ValidationMode::Strict).unwrap().valid);
        let report = validate_value(&schema, &q("Percent"), "abc", ValidationMode::Strict).unwrap();
        assert_eq!(report.errors[0].kind, ErrorKind::NotNumeric);
        assert!(report.errors[0].path.is_empty());
        assert!(matches!(
            validate_value(&schema, &q("Item"), "x", ValidationMode::Strict),
            Err(Error::Schema(_))
        ));
    }

    #[test]
    fn test_cancellation() {
        let schema = schema();
        let flag = Arc::new(AtomicBool::new(true));
        let validator = Validator::new(&schema).with_cancellation(flag.clone());
        assert!(matches!(validator.validate(&item(), &q("Item")), Err(Error::Cancelled)));

        flag.store(false, Ordering::Relaxed);
        assert!(validator.validate(&item(), &q("Item")).unwrap().valid);
    }

    #[test]
    fn test_depth_limit() {
        let schema = Schema::builder()
            .add_type(
                TypeDefinition::complex(q("Tree"))
                    .with_child(ChildSpec::new(q("node"), q("Tree"), Occurs::optional())),
            )
            .build()
            .unwrap();

        let mut node = Node::new(q("node"));
        for _ in 0..150 {
            node = Node::new(q("node")).with_child(node);
        }

        let limited = Validator::new(&schema).with_limits(Limits::strict());
        assert!(matches!(
            limited.validate(&node, &q("Tree")),
            Err(Error::LimitExceeded(_))
        ));
        assert!(Validator::new(&schema).validate(&node, &q("Tree")).unwrap().valid);
    }

    #[test]
    fn test_sibling_positions() {
        let children = vec![
            Node::new(q("a")),
            Node::new(q("b")),
            Node::new(q("a")),
            Node::new(q("a")),
        ];
        assert_eq!(sibling_positions(&children), vec![1, 1, 2, 3]);
    }
}
