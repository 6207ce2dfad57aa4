//! Header schema types.
//!
//! A [`HeaderSchema`] is the ordered list of columns an entity screen exchanges.
//! The same schema drives both directions: column order is the encoded column
//! order on export and the position-to-key mapping on import.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// The declared type of a column's cells.
///
/// Deserializes from `"text"`, `"integer"`, `"decimal"`, `"boolean"`, `"date"`
/// or `{ enum = ["a", "b"] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    /// Free text, trimmed.
    Text,
    /// Signed 64-bit integer.
    Integer,
    /// Locale-invariant decimal number.
    Decimal,
    /// `true/false/yes/no/1/0`, case-insensitive.
    Boolean,
    /// ISO-8601 calendar date (`YYYY-MM-DD`).
    Date,
    /// Closed set of case-sensitive literals.
    Enum(BTreeSet<String>),
}

impl CellKind {
    /// Builds an enum kind from any list of literals.
    #[must_use]
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enum(values.into_iter().map(Into::into).collect())
    }

    /// Returns the kind name used in messages and profile files.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Enum(_) => "enum",
        }
    }

    /// Returns true for the numeric kinds.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Decimal)
    }
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One column of a [`HeaderSchema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Record field key.
    pub key: String,
    /// Header text as it appears in the document.
    #[serde(alias = "label")]
    pub display_label: String,
    /// Cell type.
    pub kind: CellKind,
}

impl ColumnSpec {
    /// Creates a column.
    #[must_use]
    pub fn new(key: impl Into<String>, display_label: impl Into<String>, kind: CellKind) -> Self {
        Self {
            key: key.into(),
            display_label: display_label.into(),
            kind,
        }
    }

    /// Creates a text column.
    #[must_use]
    pub fn text(key: impl Into<String>, display_label: impl Into<String>) -> Self {
        Self::new(key, display_label, CellKind::Text)
    }

    /// Creates an integer column.
    #[must_use]
    pub fn integer(key: impl Into<String>, display_label: impl Into<String>) -> Self {
        Self::new(key, display_label, CellKind::Integer)
    }

    /// Creates a decimal column.
    #[must_use]
    pub fn decimal(key: impl Into<String>, display_label: impl Into<String>) -> Self {
        Self::new(key, display_label, CellKind::Decimal)
    }

    /// Creates a boolean column.
    #[must_use]
    pub fn boolean(key: impl Into<String>, display_label: impl Into<String>) -> Self {
        Self::new(key, display_label, CellKind::Boolean)
    }

    /// Creates a date column.
    #[must_use]
    pub fn date(key: impl Into<String>, display_label: impl Into<String>) -> Self {
        Self::new(key, display_label, CellKind::Date)
    }

    /// Creates an enum column.
    #[must_use]
    pub fn enumeration<I, S>(key: impl Into<String>, display_label: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(key, display_label, CellKind::enumeration(values))
    }
}

/// Ordered, key-unique column definitions.
///
/// Construction validates the schema; a duplicate key is a caller defect and
/// is reported as [`Error::InvalidSchema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HeaderSchema {
    columns: Vec<ColumnSpec>,
}

impl HeaderSchema {
    /// Creates a schema from its columns.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSchema`] if the schema is empty, or a key or a
    /// display label appears twice.
    pub fn new(columns: Vec<ColumnSpec>) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::InvalidSchema(
                "schema must declare at least one column".to_string(),
            ));
        }

        let mut keys = HashSet::with_capacity(columns.len());
        let mut labels = HashSet::with_capacity(columns.len());
        for column in &columns {
            if column.key.trim().is_empty() {
                return Err(Error::InvalidSchema("column key cannot be empty".to_string()));
            }
            if !keys.insert(column.key.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate column key '{}'",
                    column.key
                )));
            }
            if !labels.insert(column.display_label.as_str()) {
                return Err(Error::InvalidSchema(format!(
                    "duplicate display label '{}'",
                    column.display_label
                )));
            }
        }

        Ok(Self { columns })
    }

    /// Returns the columns in order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always false; an empty schema cannot be constructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Looks up a column by key.
    #[must_use]
    pub fn column(&self, key: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.key == key)
    }

    /// Returns true if the schema declares `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.column(key).is_some()
    }

    /// Returns the keys in column order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.key.as_str())
    }

    /// Returns the display labels in column order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.display_label.as_str())
    }
}

impl<'de> Deserialize<'de> for HeaderSchema {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let columns = Vec::<ColumnSpec>::deserialize(deserializer)?;
        Self::new(columns).map_err(serde::de::Error::custom)
    }
}
