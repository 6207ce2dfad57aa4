//! Field coercion.
//!
//! Pure conversions from raw cell text to typed [`Value`]s, and back.
//! Every cell is trimmed first; an empty trimmed cell is absent (`Ok(None)`)
//! for every kind, since emptiness policy belongs to the `Required` rule.

use crate::models::{CellKind, DATE_FORMAT, ErrorCode, Value};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::fmt;

/// Tokens accepted for `true`, compared case-insensitively.
const TRUE_TOKENS: &[&str] = &["true", "yes", "1"];
/// Tokens accepted for `false`, compared case-insensitively.
const FALSE_TOKENS: &[&str] = &["false", "no", "0"];

/// A cell that does not fit its column kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionFailure {
    /// Kind-specific code.
    pub code: ErrorCode,
    /// Description naming the offending value.
    pub message: String,
}

impl CoercionFailure {
    fn new(code: ErrorCode, message: String) -> Self {
        Self { code, message }
    }
}

impl fmt::Display for CoercionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CoercionFailure {}

/// Coerces a raw cell into a value of `kind`.
///
/// # Errors
///
/// Returns a [`CoercionFailure`] if the trimmed text is not a valid `kind`.
pub fn coerce(kind: &CellKind, raw: &str) -> Result<Option<Value>, CoercionFailure> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value = match kind {
        CellKind::Text => Value::Text(trimmed.to_string()),
        CellKind::Integer => Value::Integer(parse_integer(trimmed)?),
        CellKind::Decimal => Value::Decimal(parse_decimal(trimmed)?),
        CellKind::Boolean => Value::Boolean(parse_boolean(trimmed)?),
        CellKind::Date => Value::Date(parse_date(trimmed)?),
        CellKind::Enum(allowed) => Value::Enum(parse_enum(trimmed, allowed)?),
    };
    Ok(Some(value))
}

/// Formats a value as cell text; absent values become the empty cell.
///
/// This is the inverse of [`coerce`]: `coerce(kind, format_value(v))`
/// yields `v` back for any value produced by coercion.
#[must_use]
pub fn format_value(value: Option<&Value>) -> String {
    value.map(ToString::to_string).unwrap_or_default()
}

/// Parses an optionally signed run of ASCII digits.
fn parse_integer(s: &str) -> Result<i64, CoercionFailure> {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoercionFailure::new(
            ErrorCode::InvalidInteger,
            format!("'{s}' is not an integer"),
        ));
    }
    s.parse::<i64>().map_err(|_| {
        CoercionFailure::new(
            ErrorCode::InvalidInteger,
            format!("'{s}' is out of integer range"),
        )
    })
}

/// Parses a locale-invariant decimal: `.` separator, optional exponent.
fn parse_decimal(s: &str) -> Result<f64, CoercionFailure> {
    let invalid = || {
        CoercionFailure::new(
            ErrorCode::InvalidDecimal,
            format!("'{s}' is not a decimal number"),
        )
    };

    // Rules out "inf", "NaN", grouping separators and locale commas before
    // handing the text to the float parser.
    let well_formed = s.bytes().any(|b| b.is_ascii_digit())
        && s
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if !well_formed {
        return Err(invalid());
    }

    let value = s.parse::<f64>().map_err(|_| invalid())?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CoercionFailure::new(
            ErrorCode::InvalidDecimal,
            format!("'{s}' is out of decimal range"),
        ))
    }
}

fn parse_boolean(s: &str) -> Result<bool, CoercionFailure> {
    let lower = s.to_ascii_lowercase();
    if TRUE_TOKENS.contains(&lower.as_str()) {
        Ok(true)
    } else if FALSE_TOKENS.contains(&lower.as_str()) {
        Ok(false)
    } else {
        Err(CoercionFailure::new(
            ErrorCode::InvalidBoolean,
            format!("'{s}' is not a boolean (expected true/false/yes/no/1/0)"),
        ))
    }
}

/// Parses exactly `YYYY-MM-DD`.
fn parse_date(s: &str) -> Result<NaiveDate, CoercionFailure> {
    let bytes = s.as_bytes();
    let shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return Err(CoercionFailure::new(
            ErrorCode::InvalidDate,
            format!("'{s}' is not a date (expected YYYY-MM-DD)"),
        ));
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| {
        CoercionFailure::new(
            ErrorCode::InvalidDate,
            format!("'{s}' is not a valid calendar date"),
        )
    })
}

fn parse_enum(s: &str, allowed: &BTreeSet<String>) -> Result<String, CoercionFailure> {
    if allowed.contains(s) {
        return Ok(s.to_string());
    }
    let choices = allowed
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    Err(CoercionFailure::new(
        ErrorCode::InvalidEnum,
        format!("'{s}' is not one of: {choices}"),
    ))
}
