//! Declarative validation rules.
//!
//! Rules are data: a [`RuleSet`] maps each field key to an ordered list of
//! [`Constraint`]s. The rule engine in [`crate::io::validation`] evaluates
//! every constraint of every field without short-circuiting.

use super::HeaderSchema;
use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// Rule categories, as reported in [`super::ValidationError::rule_kind`].
///
/// Coercion failures are reported as [`RuleKind::Pattern`], the generic
/// "shape" violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Field must be present and non-blank.
    Required,
    /// Minimum text length.
    MinLength,
    /// Maximum text length.
    MaxLength,
    /// Minimum numeric value.
    MinValue,
    /// Maximum numeric value.
    MaxValue,
    /// Regular expression match (also used for coercion failures).
    Pattern,
    /// Membership in a caller-supplied literal set.
    OneOf,
    /// Comparison against another field of the same record.
    CrossField,
}

impl RuleKind {
    /// Returns the snake-case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::MinLength => "min_length",
            Self::MaxLength => "max_length",
            Self::MinValue => "min_value",
            Self::MaxValue => "max_value",
            Self::Pattern => "pattern",
            Self::OneOf => "one_of",
            Self::CrossField => "cross_field",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison operator for cross-field rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    /// `field < other`
    #[serde(rename = "<", alias = "lt")]
    LessThan,
    /// `field <= other`
    #[serde(rename = "<=", alias = "le")]
    LessOrEqual,
    /// `field == other`
    #[serde(rename = "==", alias = "eq")]
    Equal,
    /// `field != other`
    #[serde(rename = "!=", alias = "ne")]
    NotEqual,
    /// `field >= other`
    #[serde(rename = ">=", alias = "ge")]
    GreaterOrEqual,
    /// `field > other`
    #[serde(rename = ">", alias = "gt")]
    GreaterThan,
}

impl Comparison {
    /// Returns the operator symbol.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::LessThan => "<",
            Self::LessOrEqual => "<=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::GreaterOrEqual => ">=",
            Self::GreaterThan => ">",
        }
    }

    /// Returns whether `ordering` (of field relative to other) satisfies the operator.
    #[must_use]
    pub const fn holds(&self, ordering: Ordering) -> bool {
        match self {
            Self::LessThan => matches!(ordering, Ordering::Less),
            Self::LessOrEqual => !matches!(ordering, Ordering::Greater),
            Self::Equal => matches!(ordering, Ordering::Equal),
            Self::NotEqual => !matches!(ordering, Ordering::Equal),
            Self::GreaterOrEqual => !matches!(ordering, Ordering::Less),
            Self::GreaterThan => matches!(ordering, Ordering::Greater),
        }
    }
}

/// A compiled, fully anchored regular expression.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compiles `source` so that it must match the whole field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRule`] if the expression does not compile.
    pub fn new(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let regex = Regex::new(&format!("^(?:{source})$"))
            .map_err(|e| Error::InvalidRule(format!("invalid pattern '{source}': {e}")))?;
        Ok(Self { source, regex })
    }

    /// The expression as written by the caller.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns true if the whole of `text` matches.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// A single check with its parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Field must be present; `Text` must be non-blank.
    Required,
    /// Text length, in characters, must be at least this.
    MinLength(usize),
    /// Text length, in characters, must be at most this.
    MaxLength(usize),
    /// Number must be at least this.
    MinValue(f64),
    /// Number must be at most this.
    MaxValue(f64),
    /// Text form must fully match.
    Pattern(Pattern),
    /// Text form must be one of these literals.
    OneOf(BTreeSet<String>),
    /// Field must compare to `other` as stated.
    CrossField {
        /// The other field key.
        other: String,
        /// The operator, read as `field <op> other`.
        comparison: Comparison,
    },
}

impl Constraint {
    /// Compiles a pattern constraint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRule`] if the expression does not compile.
    pub fn pattern(source: impl Into<String>) -> Result<Self> {
        Pattern::new(source).map(Self::Pattern)
    }

    /// Builds a one-of constraint.
    #[must_use]
    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::OneOf(values.into_iter().map(Into::into).collect())
    }

    /// Builds a cross-field constraint.
    #[must_use]
    pub fn cross_field(other: impl Into<String>, comparison: Comparison) -> Self {
        Self::CrossField {
            other: other.into(),
            comparison,
        }
    }

    /// Returns the rule category.
    #[must_use]
    pub const fn kind(&self) -> RuleKind {
        match self {
            Self::Required => RuleKind::Required,
            Self::MinLength(_) => RuleKind::MinLength,
            Self::MaxLength(_) => RuleKind::MaxLength,
            Self::MinValue(_) => RuleKind::MinValue,
            Self::MaxValue(_) => RuleKind::MaxValue,
            Self::Pattern(_) => RuleKind::Pattern,
            Self::OneOf(_) => RuleKind::OneOf,
            Self::CrossField { .. } => RuleKind::CrossField,
        }
    }
}

/// A constraint bound to a field.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRule {
    /// The field key the rule applies to.
    pub field: String,
    /// The check.
    pub constraint: Constraint,
}

impl ValidationRule {
    /// Creates a rule.
    #[must_use]
    pub fn new(field: impl Into<String>, constraint: Constraint) -> Self {
        Self {
            field: field.into(),
            constraint,
        }
    }

    /// Returns the rule category.
    #[must_use]
    pub const fn kind(&self) -> RuleKind {
        self.constraint.kind()
    }
}

/// Field key to constraints, ordered by first declaration of each field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    entries: Vec<(String, Vec<Constraint>)>,
}

impl RuleSet {
    /// Creates an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a constraint for a field.
    #[must_use]
    pub fn rule(mut self, field: impl Into<String>, constraint: Constraint) -> Self {
        self.push(ValidationRule::new(field, constraint));
        self
    }

    /// Appends a `Required` constraint for a field.
    #[must_use]
    pub fn required(self, field: impl Into<String>) -> Self {
        self.rule(field, Constraint::Required)
    }

    /// Appends a rule in place.
    pub fn push(&mut self, rule: ValidationRule) {
        if let Some((_, constraints)) = self.entries.iter_mut().find(|(f, _)| *f == rule.field) {
            constraints.push(rule.constraint);
        } else {
            self.entries.push((rule.field, vec![rule.constraint]));
        }
    }

    /// Appends every rule of `other`, keeping this set's field order first.
    pub fn extend(&mut self, other: Self) {
        for (field, constraints) in other.entries {
            for constraint in constraints {
                self.push(ValidationRule::new(field.clone(), constraint));
            }
        }
    }

    /// Returns the constraints declared for a field.
    #[must_use]
    pub fn rules_for(&self, field: &str) -> &[Constraint] {
        self.entries
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, c)| c.as_slice())
            .unwrap_or_default()
    }

    /// Iterates over fields and their constraints in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Constraint])> {
        self.entries.iter().map(|(f, c)| (f.as_str(), c.as_slice()))
    }

    /// Returns the field keys in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(f, _)| f.as_str())
    }

    /// Returns the total number of constraints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.iter().map(|(_, c)| c.len()).sum()
    }

    /// Returns true if no constraint is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks that every field, and every cross-field reference, exists in `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRule`] naming the first unknown key.
    pub fn check_against(&self, schema: &HeaderSchema) -> Result<()> {
        for (field, constraints) in &self.entries {
            if !schema.contains(field) {
                return Err(Error::InvalidRule(format!(
                    "rule targets unknown field '{field}'"
                )));
            }
            for constraint in constraints {
                if let Constraint::CrossField { other, .. } = constraint {
                    if !schema.contains(other) {
                        return Err(Error::InvalidRule(format!(
                            "cross-field rule on '{field}' references unknown field '{other}'"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

impl FromIterator<ValidationRule> for RuleSet {
    fn from_iter<T: IntoIterator<Item = ValidationRule>>(iter: T) -> Self {
        let mut rules = Self::new();
        for rule in iter {
            rules.push(rule);
        }
        rules
    }
}
