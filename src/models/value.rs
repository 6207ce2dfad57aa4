//! Typed cell values and records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Format used for [`Value::Date`] on both sides of the exchange.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A typed cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Text value.
    Text(String),
    /// Integer value.
    Integer(i64),
    /// Decimal value. Always finite when produced by coercion.
    Decimal(f64),
    /// Boolean value.
    Boolean(bool),
    /// Calendar date.
    Date(NaiveDate),
    /// Member of an enum column's set.
    Enum(String),
}

impl Value {
    /// Creates a text value.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Creates an enum value.
    #[must_use]
    pub fn enumeration(value: impl Into<String>) -> Self {
        Self::Enum(value.into())
    }

    /// Returns the string payload of `Text` and `Enum` values.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the numeric payload of `Integer` and `Decimal` values.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Decimal(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the date payload.
    #[must_use]
    pub const fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns true for a `Text` value that is empty after trimming.
    #[must_use]
    pub fn is_blank_text(&self) -> bool {
        matches!(self, Self::Text(s) if s.trim().is_empty())
    }

    /// Returns the variant name.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Decimal(_) => "decimal",
            Self::Boolean(_) => "boolean",
            Self::Date(_) => "date",
            Self::Enum(_) => "enum",
        }
    }
}

/// Cell text form. This is the exact text written on export and is accepted
/// back by coercion for the same kind.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) | Self::Enum(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Decimal(n) => write!(f, "{n}"),
            Self::Boolean(b) => f.write_str(if *b { "true" } else { "false" }),
            Self::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Decimal(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

/// A mapping from field key to typed value.
///
/// A key mapped to `None` is explicitly absent (an empty optional cell); a
/// key that is not in the map at all is missing. Both read as absent through
/// [`Record::get`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, Option<Value>>,
}

impl Record {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), Some(value.into()));
        self
    }

    /// Marks a field as explicitly absent.
    #[must_use]
    pub fn with_absent(mut self, key: impl Into<String>) -> Self {
        self.fields.insert(key.into(), None);
        self
    }

    /// Sets or clears a field in place.
    pub fn set(&mut self, key: impl Into<String>, value: Option<Value>) {
        self.fields.insert(key.into(), value);
    }

    /// Returns the value of a field, or `None` if absent or missing.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).and_then(Option::as_ref)
    }

    /// Returns true if the key is in the map, even when explicitly absent.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Returns the number of keys, absent ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record has no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over keys and their values in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), Some(v.into())))
                .collect(),
        }
    }
}

/// A decoded and coerced row awaiting validation.
///
/// Immutable once built by the importer. Keys whose cell failed coercion are
/// listed in `rejected` and are absent from the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    source_row: usize,
    record: Record,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    rejected: BTreeSet<String>,
}

impl CandidateRecord {
    /// Creates a candidate for a source row.
    #[must_use]
    pub const fn new(source_row: usize, record: Record, rejected: BTreeSet<String>) -> Self {
        Self {
            source_row,
            record,
            rejected,
        }
    }

    /// The 1-based document row this candidate came from (the header is 1).
    #[must_use]
    pub const fn source_row(&self) -> usize {
        self.source_row
    }

    /// The coerced values.
    #[must_use]
    pub const fn record(&self) -> &Record {
        &self.record
    }

    /// Shortcut for `record().get(key)`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.record.get(key)
    }

    /// Returns true if the cell for `key` failed coercion.
    #[must_use]
    pub fn is_rejected(&self, key: &str) -> bool {
        self.rejected.contains(key)
    }

    /// Keys whose cells failed coercion.
    #[must_use]
    pub const fn rejected(&self) -> &BTreeSet<String> {
        &self.rejected
    }

    /// Consumes the candidate, returning its record.
    #[must_use]
    pub fn into_record(self) -> Record {
        self.record
    }
}
