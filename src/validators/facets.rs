//! Constraining facets
//!
//! A facet is an atomic constraint on the lexical value of a simple type or
//! attribute. Facets are immutable once constructed; regular expressions are
//! compiled up front so that evaluation cannot fail for schema reasons.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use super::exceptions::ErrorKind;

// Lexical space shared by xs:decimal and xs:double (without INF/NaN)
static NUMERIC_LEXICAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?$").unwrap()
});

/// White space handling modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhiteSpace {
    /// Preserve all white space
    #[default]
    Preserve,
    /// Replace tabs and newlines with spaces
    Replace,
    /// Replace and collapse multiple spaces
    Collapse,
}

impl WhiteSpace {
    /// Parse from string value
    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "preserve" => Ok(WhiteSpace::Preserve),
            "replace" => Ok(WhiteSpace::Replace),
            "collapse" => Ok(WhiteSpace::Collapse),
            _ => Err(Error::Schema(format!(
                "Invalid whiteSpace value: '{}'. Must be 'preserve', 'replace', or 'collapse'",
                s
            ))),
        }
    }

    /// Normalize a string according to this white space mode
    pub fn normalize<'a>(&self, s: &'a str) -> Cow<'a, str> {
        match self {
            WhiteSpace::Preserve => Cow::Borrowed(s),
            WhiteSpace::Replace => {
                if s.contains(['\t', '\n', '\r']) {
                    Cow::Owned(s.replace(['\t', '\n', '\r'], " "))
                } else {
                    Cow::Borrowed(s)
                }
            }
            WhiteSpace::Collapse => {
                let mut result = String::with_capacity(s.len());
                for word in s.split([' ', '\t', '\n', '\r']).filter(|w| !w.is_empty()) {
                    if !result.is_empty() {
                        result.push(' ');
                    }
                    result.push_str(word);
                }
                Cow::Owned(result)
            }
        }
    }
}

/// A single failed facet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetViolation {
    /// Which kind of constraint was violated
    pub kind: ErrorKind,
    /// Human-readable explanation
    pub message: String,
}

impl FacetViolation {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Exact length facet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthFacet {
    /// Required length in characters
    pub value: usize,
}

impl LengthFacet {
    /// Create a new length facet
    pub fn new(value: usize) -> Self {
        Self { value }
    }

    /// Validate a value against this facet
    pub fn validate(&self, value: &str) -> std::result::Result<(), FacetViolation> {
        let len = value.chars().count();
        if len != self.value {
            Err(FacetViolation::new(
                ErrorKind::LengthViolation,
                format!("length must be exactly {}, found {}", self.value, len),
            ))
        } else {
            Ok(())
        }
    }
}

/// Minimum length facet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinLengthFacet {
    /// Minimum length in characters
    pub value: usize,
}

impl MinLengthFacet {
    /// Create a new minimum length facet
    pub fn new(value: usize) -> Self {
        Self { value }
    }

    /// Validate a value against this facet
    pub fn validate(&self, value: &str) -> std::result::Result<(), FacetViolation> {
        let len = value.chars().count();
        if len < self.value {
            Err(FacetViolation::new(
                ErrorKind::LengthViolation,
                format!("length must be at least {}, found {}", self.value, len),
            ))
        } else {
            Ok(())
        }
    }
}

/// Maximum length facet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaxLengthFacet {
    /// Maximum length in characters
    pub value: usize,
}

impl MaxLengthFacet {
    /// Create a new maximum length facet
    pub fn new(value: usize) -> Self {
        Self { value }
    }

    /// Validate a value against this facet
    pub fn validate(&self, value: &str) -> std::result::Result<(), FacetViolation> {
        let len = value.chars().count();
        if len > self.value {
            Err(FacetViolation::new(
                ErrorKind::LengthViolation,
                format!("length must be at most {}, found {}", self.value, len),
            ))
        } else {
            Ok(())
        }
    }
}

/// Pattern facet using regular expressions
#[derive(Debug, Clone)]
pub struct PatternFacet {
    /// Regular expression as written in the schema
    pub pattern: String,
    /// Whether the whole value must match (anchored at both ends)
    pub full_match: bool,
    /// Compiled regex
    regex: Regex,
}

impl PatternFacet {
    /// Create a full-match pattern facet, the XSD semantics
    pub fn new(pattern: &str) -> Result<Self> {
        Self::with_full_match(pattern, true)
    }

    /// Create a pattern facet choosing between full match and search
    pub fn with_full_match(pattern: &str, full_match: bool) -> Result<Self> {
        let source = if full_match {
            format!("^(?:{})$", pattern)
        } else {
            pattern.to_string()
        };
        let regex = Regex::new(&source)
            .map_err(|e| Error::Schema(format!("Invalid pattern '{}': {}", pattern, e)))?;

        Ok(Self {
            pattern: pattern.to_string(),
            full_match,
            regex,
        })
    }

    /// Validate a value against this pattern
    pub fn validate(&self, value: &str) -> std::result::Result<(), FacetViolation> {
        if self.regex.is_match(value) {
            Ok(())
        } else {
            Err(FacetViolation::new(
                ErrorKind::PatternMismatch,
                format!("value '{}' does not match pattern '{}'", value, self.pattern),
            ))
        }
    }
}

impl PartialEq for PatternFacet {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern && self.full_match == other.full_match
    }
}

/// Enumeration facet restricts values to a closed set of literals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerationFacet {
    /// Allowed values
    pub values: Vec<String>,
    /// Whether comparison is case-sensitive
    pub case_sensitive: bool,
}

impl EnumerationFacet {
    /// Create a case-sensitive enumeration facet
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            case_sensitive: true,
        }
    }

    /// Switch to case-insensitive comparison
    pub fn case_insensitive(mut self) -> Self {
        self.case_sensitive = false;
        self
    }

    /// Validate a value against this enumeration
    pub fn validate(&self, value: &str) -> std::result::Result<(), FacetViolation> {
        let found = if self.case_sensitive {
            self.values.iter().any(|v| v == value)
        } else {
            let lowered = value.to_lowercase();
            self.values.iter().any(|v| v.to_lowercase() == lowered)
        };

        if found {
            Ok(())
        } else {
            Err(FacetViolation::new(
                ErrorKind::EnumViolation,
                format!("value '{}' is not one of {:?}", value, self.values),
            ))
        }
    }
}

/// Numeric range facet with per-bound inclusivity
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RangeFacet {
    /// Lower bound, if any
    pub min: Option<Decimal>,
    /// Upper bound, if any
    pub max: Option<Decimal>,
    /// Whether a value equal to `min` is accepted
    pub min_inclusive: bool,
    /// Whether a value equal to `max` is accepted
    pub max_inclusive: bool,
}

impl RangeFacet {
    /// Range with both bounds inclusive
    pub fn inclusive(min: Decimal, max: Decimal) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            min_inclusive: true,
            max_inclusive: true,
        }
    }

    /// Range without bounds; only checks that the value is numeric
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Set the lower bound
    pub fn with_min(mut self, min: Decimal, inclusive: bool) -> Self {
        self.min = Some(min);
        self.min_inclusive = inclusive;
        self
    }

    /// Set the upper bound
    pub fn with_max(mut self, max: Decimal, inclusive: bool) -> Self {
        self.max = Some(max);
        self.max_inclusive = inclusive;
        self
    }

    /// Validate a value against this range
    pub fn validate(&self, value: &str) -> std::result::Result<(), FacetViolation> {
        let number = Numeric::parse(value).ok_or_else(|| {
            FacetViolation::new(
                ErrorKind::NotNumeric,
                format!("value '{}' is not a valid number", value),
            )
        })?;

        if let Some(min) = self.min {
            let bound = Numeric::from(min);
            let below = if self.min_inclusive { number < bound } else { number <= bound };
            if below {
                let op = if self.min_inclusive { ">=" } else { ">" };
                return Err(FacetViolation::new(
                    ErrorKind::RangeViolation,
                    format!("value {} must be {} {}", value, op, min),
                ));
            }
        }

        if let Some(max) = self.max {
            let bound = Numeric::from(max);
            let above = if self.max_inclusive { number > bound } else { number >= bound };
            if above {
                let op = if self.max_inclusive { "<=" } else { "<" };
                return Err(FacetViolation::new(
                    ErrorKind::RangeViolation,
                    format!("value {} must be {} {}", value, op, max),
                ));
            }
        }

        Ok(())
    }
}

// Exponents beyond this are clamped; no bound can tell them apart
const EXPONENT_LIMIT: i64 = 1 << 40;

/// A numeric literal held exactly as `digits × 10^exponent`
///
/// Values are compared without rounding, so literals with more digits or a
/// larger magnitude than [`Decimal`] can hold still order correctly against
/// the bounds of a range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Numeric {
    negative: bool,
    // No leading or trailing zeros; empty for zero
    digits: String,
    exponent: i64,
}

impl Numeric {
    fn new(negative: bool, digits: &str, exponent: i64) -> Self {
        let trimmed = digits.trim_start_matches('0');
        let significant = trimmed.trim_end_matches('0');
        if significant.is_empty() {
            return Self {
                negative: false,
                digits: String::new(),
                exponent: 0,
            };
        }
        Self {
            negative,
            digits: significant.to_string(),
            exponent: exponent + (trimmed.len() - significant.len()) as i64,
        }
    }

    /// Parse a decimal or scientific literal without any whitespace tolerance
    pub fn parse(value: &str) -> Option<Self> {
        if !NUMERIC_LEXICAL.is_match(value) {
            return None;
        }

        let unsigned = value.strip_prefix('+').unwrap_or(value);
        let (negative, body) = match unsigned.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, unsigned),
        };

        let (mantissa, exponent) = match body.split_once(['e', 'E']) {
            Some((mantissa, exponent)) => {
                let clamped = match exponent.parse::<i64>() {
                    Ok(e) => e.clamp(-EXPONENT_LIMIT, EXPONENT_LIMIT),
                    Err(_) if exponent.starts_with('-') => -EXPONENT_LIMIT,
                    Err(_) => EXPONENT_LIMIT,
                };
                (mantissa, clamped)
            }
            None => (body, 0),
        };

        let (integer, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        let digits = format!("{}{}", integer, fraction);
        Some(Self::new(negative, &digits, exponent - fraction.len() as i64))
    }

    /// Whether the value is zero
    pub fn is_zero(&self) -> bool {
        self.digits.is_empty()
    }

    /// Convert to a [`Decimal`] when it is exactly representable
    pub fn to_decimal(&self) -> Option<Decimal> {
        if self.is_zero() {
            return Some(Decimal::ZERO);
        }
        // Decimal holds at most 29 significant digits and a scale of 28
        let order = self.digits.len() as i64 + self.exponent;
        if order > 29 || -self.exponent > 28 {
            return None;
        }

        let mut literal = String::with_capacity(self.digits.len() + 32);
        if self.negative {
            literal.push('-');
        }
        if self.exponent >= 0 {
            literal.push_str(&self.digits);
            literal.extend(std::iter::repeat('0').take(self.exponent as usize));
        } else if order > 0 {
            let (integer, fraction) = self.digits.split_at(order as usize);
            literal.push_str(integer);
            literal.push('.');
            literal.push_str(fraction);
        } else {
            literal.push_str("0.");
            literal.extend(std::iter::repeat('0').take((-order) as usize));
            literal.push_str(&self.digits);
        }
        Decimal::from_str_exact(&literal).ok()
    }

    fn cmp_magnitude(&self, other: &Self) -> Ordering {
        match (self.is_zero(), other.is_zero()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }
        let order = self.digits.len() as i64 + self.exponent;
        let other_order = other.digits.len() as i64 + other.exponent;
        // Same leading position and no trailing zeros: digit strings compare left-aligned
        order
            .cmp(&other_order)
            .then_with(|| self.digits.as_bytes().cmp(other.digits.as_bytes()))
    }
}

impl From<Decimal> for Numeric {
    fn from(value: Decimal) -> Self {
        let mantissa = value.mantissa();
        Self::new(
            mantissa < 0,
            &mantissa.unsigned_abs().to_string(),
            -(value.scale() as i64),
        )
    }
}

impl Ord for Numeric {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (false, false) => self.cmp_magnitude(other),
            (true, true) => other.cmp_magnitude(self),
        }
    }
}

impl PartialOrd for Numeric {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Parse a decimal or scientific literal that fits a [`Decimal`] exactly
pub fn parse_decimal(value: &str) -> Option<Decimal> {
    Numeric::parse(value)?.to_decimal()
}

/// A constraining facet
#[derive(Debug, Clone, PartialEq)]
pub enum Facet {
    /// Regular expression
    Pattern(PatternFacet),
    /// Numeric bounds
    Range(RangeFacet),
    /// Closed set of literals
    Enumeration(EnumerationFacet),
    /// Exact character count
    Length(LengthFacet),
    /// Minimum character count
    MinLength(MinLengthFacet),
    /// Maximum character count
    MaxLength(MaxLengthFacet),
}

impl Facet {
    /// Full-match pattern facet
    pub fn pattern(pattern: &str) -> Result<Self> {
        PatternFacet::new(pattern).map(Facet::Pattern)
    }

    /// Inclusive range facet
    pub fn range(min: Decimal, max: Decimal) -> Self {
        Facet::Range(RangeFacet::inclusive(min, max))
    }

    /// Case-sensitive enumeration facet
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Facet::Enumeration(EnumerationFacet::new(values))
    }

    /// Short name used in messages and schema descriptions
    pub fn name(&self) -> &'static str {
        match self {
            Facet::Pattern(_) => "pattern",
            Facet::Range(_) => "range",
            Facet::Enumeration(_) => "enumeration",
            Facet::Length(_) => "length",
            Facet::MinLength(_) => "minLength",
            Facet::MaxLength(_) => "maxLength",
        }
    }

    /// Evaluate a single facet against an already normalized value
    pub fn evaluate(&self, value: &str) -> std::result::Result<(), FacetViolation> {
        match self {
            Facet::Pattern(f) => f.validate(value),
            Facet::Range(f) => f.validate(value),
            Facet::Enumeration(f) => f.validate(value),
            Facet::Length(f) => f.validate(value),
            Facet::MinLength(f) => f.validate(value),
            Facet::MaxLength(f) => f.validate(value),
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Facet::Pattern(p) => write!(f, "pattern '{}'", p.pattern),
            Facet::Range(r) => {
                let lo = r.min.map(|m| m.to_string()).unwrap_or_else(|| "-inf".into());
                let hi = r.max.map(|m| m.to_string()).unwrap_or_else(|| "+inf".into());
                let open = if r.min_inclusive { '[' } else { '(' };
                let close = if r.max_inclusive { ']' } else { ')' };
                write!(f, "range {}{}, {}{}", open, lo, hi, close)
            }
            Facet::Enumeration(e) => write!(f, "enumeration {:?}", e.values),
            Facet::Length(l) => write!(f, "length {}", l.value),
            Facet::MinLength(l) => write!(f, "minLength {}", l.value),
            Facet::MaxLength(l) => write!(f, "maxLength {}", l.value),
        }
    }
}

/// Evaluate every facet against a value, collecting all violations
///
/// The value is normalized once with `white_space`; no facet short-circuits
/// the others. A value that is not a number is reported once, however many
/// range facets the chain carries.
pub fn evaluate_all(facets: &[Facet], white_space: WhiteSpace, value: &str) -> Vec<FacetViolation> {
    let normalized = white_space.normalize(value);
    let mut not_numeric = false;
    facets
        .iter()
        .filter_map(|facet| facet.evaluate(&normalized).err())
        .filter(|violation| {
            violation.kind != ErrorKind::NotNumeric || !std::mem::replace(&mut not_numeric, true)
        })
        .collect()
}
