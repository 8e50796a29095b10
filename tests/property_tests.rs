//! Property-based tests for the validation engine

use proptest::prelude::*;
use rust_decimal::Decimal;
use xmlfacets::validators::{ChildSpec, Occurs, WhiteSpace};
use xmlfacets::{
    validate, validate_value, ErrorKind, Facet, Node, QName, Schema, TypeDefinition,
    ValidationMode,
};

const NS: &str = "urn:props";

fn q(name: &str) -> QName {
    QName::namespaced(NS, name)
}

fn cas_schema() -> Schema {
    Schema::builder()
        .add_type(
            TypeDefinition::simple(q("CASNumber"))
                .restriction_of(QName::xs("string"))
                .with_facet(Facet::pattern(r"\d{2,7}-\d{2}-\d").unwrap()),
        )
        .build()
        .unwrap()
}

fn list_schema(occurs: Occurs) -> Schema {
    Schema::builder()
        .add_type(
            TypeDefinition::simple(q("Code"))
                .restriction_of(QName::xs("string"))
                .with_facet(Facet::enumeration(["a", "b"])),
        )
        .add_type(
            TypeDefinition::complex(q("List"))
                .with_child(ChildSpec::new(q("item"), q("Code"), occurs)),
        )
        .build()
        .unwrap()
}

fn list(values: &[String]) -> Node {
    values.iter().fold(Node::new(q("list")), |node, value| {
        node.with_child(Node::new(q("item")).with_text(value.as_str()))
    })
}

proptest! {
    /// Every string matching the CAS shape is accepted.
    #[test]
    fn cas_numbers_in_shape_are_valid(value in "[0-9]{2,7}-[0-9]{2}-[0-9]") {
        let report = validate_value(&cas_schema(), &q("CASNumber"), &value, ValidationMode::Strict).unwrap();
        prop_assert!(report.valid, "{} rejected: {}", value, report);
    }

    /// A first group of 1 or 8+ digits is rejected.
    #[test]
    fn cas_numbers_out_of_shape_are_invalid(value in "([0-9]|[0-9]{8,10})-[0-9]{2}-[0-9]") {
        let report = validate_value(&cas_schema(), &q("CASNumber"), &value, ValidationMode::Strict).unwrap();
        prop_assert_eq!(report.errors.len(), 1);
        prop_assert_eq!(report.errors[0].kind, ErrorKind::PatternMismatch);
    }

    /// A child count is accepted exactly when it lies inside the declared bounds.
    #[test]
    fn cardinality_matches_bounds(min in 0u32..4, extra in proptest::option::of(0u32..4), count in 0usize..10) {
        let occurs = Occurs::new(min, extra.map(|e| min + e));
        let schema = list_schema(occurs);
        let values = vec!["a".to_string(); count];

        let report = validate(&schema, &list(&values), &q("List"), ValidationMode::Lax).unwrap();
        prop_assert_eq!(report.valid, occurs.contains(count));
        if !report.valid {
            prop_assert_eq!(report.errors.len(), 1);
            prop_assert_eq!(report.errors[0].kind, ErrorKind::CardinalityViolation);
        }
    }

    /// The strict report is the first finding of the lax report.
    #[test]
    fn strict_is_prefix_of_lax(values in proptest::collection::vec("[a-c]", 0..6)) {
        let schema = list_schema(Occurs::new(1, Some(3)));
        let node = list(&values);

        let lax = validate(&schema, &node, &q("List"), ValidationMode::Lax).unwrap();
        let strict = validate(&schema, &node, &q("List"), ValidationMode::Strict).unwrap();

        prop_assert_eq!(strict.valid, lax.valid);
        prop_assert_eq!(strict.errors.first(), lax.errors.first());
        prop_assert!(strict.errors.len() <= 1);
    }

    /// Validation is a pure function of schema, document and mode.
    #[test]
    fn validation_is_deterministic(values in proptest::collection::vec("[a-c]{0,2}", 0..6)) {
        let schema = list_schema(Occurs::zero_or_more());
        let node = list(&values);
        let first = validate(&schema, &node, &q("List"), ValidationMode::Lax).unwrap();
        let second = validate(&schema, &node, &q("List"), ValidationMode::Lax).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Inclusive bounds accept exactly the values between them.
    #[test]
    fn range_accepts_values_within_bounds(value in -1000i64..1000) {
        let schema = Schema::builder()
            .add_type(
                TypeDefinition::simple(q("Latitude"))
                    .restriction_of(QName::xs("decimal"))
                    .with_facet(Facet::range(Decimal::from(-90), Decimal::from(90))),
            )
            .build()
            .unwrap();

        let report = validate_value(&schema, &q("Latitude"), &value.to_string(), ValidationMode::Strict).unwrap();
        prop_assert_eq!(report.valid, (-90..=90).contains(&value));
    }

    /// Collapsing white space twice changes nothing.
    #[test]
    fn collapse_is_idempotent(value in "[ \t\na-z]{0,20}") {
        let once = WhiteSpace::Collapse.normalize(&value).into_owned();
        let twice = WhiteSpace::Collapse.normalize(&once).into_owned();
        prop_assert_eq!(once, twice);
    }
}
