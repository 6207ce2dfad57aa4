//! Validation rule engine.
//!
//! Evaluates a [`RuleSet`] against typed records. Every constraint of every
//! field is checked; nothing short-circuits. Rules other than `Required`
//! never fire on an absent field. A field whose cell failed coercion is
//! absent, so only `Required` can fire on it after its coercion error.

use super::traits::Validator;
use crate::models::{
    CandidateRecord, Comparison, Constraint, ErrorCode, FORM_ROW, FormValidation, Record, RuleSet,
    ValidationError, Value,
};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// The built-in [`Validator`] for declarative rules.
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    rules: RuleSet,
}

impl RuleEngine {
    /// Creates an engine for a rule set.
    #[must_use]
    pub const fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Returns the rule set.
    #[must_use]
    pub const fn rules(&self) -> &RuleSet {
        &self.rules
    }
}

impl Validator for RuleEngine {
    fn validate(&self, candidate: &CandidateRecord) -> Vec<ValidationError> {
        evaluate(candidate, &self.rules)
    }
}

/// Evaluates every rule against a candidate, in rule-set order.
#[must_use]
pub fn evaluate(candidate: &CandidateRecord, rules: &RuleSet) -> Vec<ValidationError> {
    let subject = Subject::from(candidate);
    rules
        .iter()
        .flat_map(|(field, constraints)| subject.check_field(field, constraints))
        .collect()
}

/// Evaluates the constraints of one field against a candidate.
#[must_use]
pub fn evaluate_field(
    candidate: &CandidateRecord,
    field: &str,
    constraints: &[Constraint],
) -> Vec<ValidationError> {
    Subject::from(candidate).check_field(field, constraints)
}

/// Validates a single record, such as a form submission, reporting row 0.
#[must_use]
pub fn validate_form(record: &Record, rules: &RuleSet) -> FormValidation {
    let rejected = BTreeSet::new();
    let subject = Subject {
        row: FORM_ROW,
        record,
        rejected: &rejected,
    };
    let errors = rules
        .iter()
        .flat_map(|(field, constraints)| subject.check_field(field, constraints))
        .collect::<Vec<_>>();

    tracing::trace!(errors = errors.len(), "validated form");
    FormValidation::from_errors(errors)
}

/// The record under evaluation plus the context its errors need.
struct Subject<'a> {
    row: usize,
    record: &'a Record,
    rejected: &'a BTreeSet<String>,
}

impl<'a> From<&'a CandidateRecord> for Subject<'a> {
    fn from(candidate: &'a CandidateRecord) -> Self {
        Self {
            row: candidate.source_row(),
            record: candidate.record(),
            rejected: candidate.rejected(),
        }
    }
}

impl Subject<'_> {
    fn check_field(&self, field: &str, constraints: &[Constraint]) -> Vec<ValidationError> {
        let rejected = self.rejected.contains(field);
        let value = self.record.get(field);
        constraints
            .iter()
            .filter(|constraint| !rejected || matches!(constraint, Constraint::Required))
            .filter_map(|constraint| self.check(field, value, constraint))
            .collect()
    }

    fn check(
        &self,
        field: &str,
        value: Option<&Value>,
        constraint: &Constraint,
    ) -> Option<ValidationError> {
        let fail = |code: ErrorCode, message: String| {
            Some(ValidationError::new(
                self.row,
                field,
                constraint.kind(),
                code,
                message,
            ))
        };

        if matches!(constraint, Constraint::Required) {
            return match value {
                None => fail(ErrorCode::Required, format!("{field} is required")),
                Some(v) if v.is_blank_text() => {
                    fail(ErrorCode::Required, format!("{field} is required"))
                },
                Some(_) => None,
            };
        }

        let value = value?;
        match constraint {
            Constraint::Required => None,
            Constraint::MinLength(min) => {
                let length = value.as_str()?.chars().count();
                if length >= *min {
                    return None;
                }
                fail(
                    ErrorCode::TooShort,
                    format!("{field} must be at least {min} characters (got {length})"),
                )
            },
            Constraint::MaxLength(max) => {
                let length = value.as_str()?.chars().count();
                if length <= *max {
                    return None;
                }
                fail(
                    ErrorCode::TooLong,
                    format!("{field} must be at most {max} characters (got {length})"),
                )
            },
            Constraint::MinValue(min) => {
                let number = value.as_number()?;
                if number >= *min {
                    return None;
                }
                fail(
                    ErrorCode::BelowMinimum,
                    format!("{field} must be at least {min} (got {value})"),
                )
            },
            Constraint::MaxValue(max) => {
                let number = value.as_number()?;
                if number <= *max {
                    return None;
                }
                fail(
                    ErrorCode::AboveMaximum,
                    format!("{field} must be at most {max} (got {value})"),
                )
            },
            Constraint::Pattern(pattern) => {
                let text = value.to_string();
                if pattern.is_match(&text) {
                    return None;
                }
                fail(
                    ErrorCode::PatternMismatch,
                    format!("{field} does not match pattern '{}'", pattern.as_str()),
                )
            },
            Constraint::OneOf(allowed) => {
                let text = value.to_string();
                if allowed.contains(&text) {
                    return None;
                }
                fail(
                    ErrorCode::NotAllowed,
                    format!("'{text}' is not an allowed value for {field}"),
                )
            },
            Constraint::CrossField { other, comparison } => {
                if self.rejected.contains(other) {
                    return None;
                }
                let ordering = compare(value, self.record.get(other)?)?;
                if comparison.holds(ordering) {
                    return None;
                }
                fail(
                    ErrorCode::ComparisonFailed,
                    format!("{field} must be {} {other}", describe(*comparison)),
                )
            },
        }
    }
}

/// Orders two values of comparable kinds; `None` means the rule does not apply.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        return a.partial_cmp(&b);
    }
    if let (Some(a), Some(b)) = (left.as_date(), right.as_date()) {
        return Some(a.cmp(&b));
    }
    if let (Some(a), Some(b)) = (left.as_str(), right.as_str()) {
        return Some(a.cmp(b));
    }
    None
}

const fn describe(comparison: Comparison) -> &'static str {
    match comparison {
        Comparison::LessThan => "less than",
        Comparison::LessOrEqual => "less than or equal to",
        Comparison::Equal => "equal to",
        Comparison::NotEqual => "different from",
        Comparison::GreaterOrEqual => "greater than or equal to",
        Comparison::GreaterThan => "greater than",
    }
}
