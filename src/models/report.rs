//! Diagnostics produced by import and form validation.
//!
//! Two classes exist. Structural problems ([`DocumentError`]) make the whole
//! document untrustworthy and are reported once, with no candidates.
//! Semantic problems ([`ValidationError`]) are scoped to one cell of one row
//! and never stop processing of other rows.

use super::{CandidateRecord, RuleKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error as ThisError;

/// Field name used for errors that concern a whole row rather than one cell.
pub const ROW_FIELD: &str = "*";

/// Row number reported for single-record form validation.
pub const FORM_ROW: usize = 0;

/// Stable, machine-readable error identifier for caller-side localization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// A required field is absent or blank.
    Required,
    /// Text is shorter than the minimum length.
    TooShort,
    /// Text is longer than the maximum length.
    TooLong,
    /// Number is below the minimum.
    BelowMinimum,
    /// Number is above the maximum.
    AboveMaximum,
    /// Text does not match the pattern.
    PatternMismatch,
    /// Value is not in the allowed list.
    NotAllowed,
    /// Cross-field comparison does not hold.
    ComparisonFailed,
    /// Cell is not an integer.
    InvalidInteger,
    /// Cell is not a decimal number.
    InvalidDecimal,
    /// Cell is not a recognised boolean token.
    InvalidBoolean,
    /// Cell is not a `YYYY-MM-DD` calendar date.
    InvalidDate,
    /// Cell is not a member of the column's enum set.
    InvalidEnum,
    /// Row has a different number of cells than the header.
    CellCountMismatch,
}

impl ErrorCode {
    /// Returns the snake-case identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::TooShort => "too_short",
            Self::TooLong => "too_long",
            Self::BelowMinimum => "below_minimum",
            Self::AboveMaximum => "above_maximum",
            Self::PatternMismatch => "pattern_mismatch",
            Self::NotAllowed => "not_allowed",
            Self::ComparisonFailed => "comparison_failed",
            Self::InvalidInteger => "invalid_integer",
            Self::InvalidDecimal => "invalid_decimal",
            Self::InvalidBoolean => "invalid_boolean",
            Self::InvalidDate => "invalid_date",
            Self::InvalidEnum => "invalid_enum",
            Self::CellCountMismatch => "cell_count_mismatch",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field-level violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// 1-based document row (the header is row 1), or [`FORM_ROW`].
    pub row: usize,
    /// Field key, or [`ROW_FIELD`] for row-level problems.
    pub field: String,
    /// Rule category.
    pub rule_kind: RuleKind,
    /// Machine-readable identifier.
    pub code: ErrorCode,
    /// English description, for logs and fallback display.
    pub message: String,
}

impl ValidationError {
    /// Creates a validation error.
    #[must_use]
    pub fn new(
        row: usize,
        field: impl Into<String>,
        rule_kind: RuleKind,
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            row,
            field: field.into(),
            rule_kind,
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {}: {}", self.row, self.field, self.message)
    }
}

/// The codec could not tokenize the document.
#[derive(Debug, Clone, PartialEq, Eq, ThisError, Serialize, Deserialize)]
#[error("malformed document at line {line}: {reason}")]
pub struct MalformedDocument {
    /// 1-based physical line where the problem was detected.
    pub line: usize,
    /// What went wrong.
    pub reason: String,
}

impl MalformedDocument {
    /// Creates a malformed-document error.
    #[must_use]
    pub fn new(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            reason: reason.into(),
        }
    }
}

/// A structural, document-level failure.
#[derive(Debug, Clone, PartialEq, Eq, ThisError, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentError {
    /// The text could not be tokenized.
    #[error(transparent)]
    Malformed(MalformedDocument),

    /// The document has no header row.
    #[error("document is empty")]
    Empty,

    /// The header row has the wrong number of cells.
    #[error("header has {found} columns, expected {expected}")]
    HeaderLength {
        /// Columns in the schema.
        expected: usize,
        /// Cells in the header row.
        found: usize,
    },

    /// A header cell does not equal the schema's display label.
    #[error("header column {position} is '{found}', expected '{expected}'")]
    HeaderMismatch {
        /// 1-based column position.
        position: usize,
        /// Display label from the schema.
        expected: String,
        /// Text found in the document.
        found: String,
    },

    /// A data row has a different cell count than the header.
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        /// 1-based document row.
        row: usize,
        /// Columns in the schema.
        expected: usize,
        /// Cells in the row.
        found: usize,
    },

    /// The document exceeds the configured size limit.
    #[error("document is {actual} bytes, limit is {limit}")]
    TooLarge {
        /// Configured limit in bytes.
        limit: usize,
        /// Document size in bytes.
        actual: usize,
    },
}

impl From<MalformedDocument> for DocumentError {
    fn from(err: MalformedDocument) -> Self {
        Self::Malformed(err)
    }
}

/// Result of importing one document.
///
/// `succeeded` is true iff there is no document error and no row error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    candidates: Vec<CandidateRecord>,
    errors: Vec<ValidationError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    document_error: Option<DocumentError>,
    succeeded: bool,
}

impl ImportReport {
    /// Builds a report from processed rows.
    #[must_use]
    pub fn from_rows(candidates: Vec<CandidateRecord>, errors: Vec<ValidationError>) -> Self {
        let succeeded = errors.is_empty();
        Self {
            candidates,
            errors,
            document_error: None,
            succeeded,
        }
    }

    /// Builds a report for a structural failure: no candidates, no row errors.
    #[must_use]
    pub const fn structural(error: DocumentError) -> Self {
        Self {
            candidates: Vec::new(),
            errors: Vec::new(),
            document_error: Some(error),
            succeeded: false,
        }
    }

    /// Candidates in source row order, including rows with errors.
    #[must_use]
    pub fn candidates(&self) -> &[CandidateRecord] {
        &self.candidates
    }

    /// Row errors ordered by row, then by field.
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// The structural failure, if any.
    #[must_use]
    pub const fn document_error(&self) -> Option<&DocumentError> {
        self.document_error.as_ref()
    }

    /// True iff the document parsed and every row validated.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.succeeded
    }

    /// Errors reported for one source row.
    pub fn errors_for_row(&self, row: usize) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(move |e| e.row == row)
    }

    /// Candidates whose row produced no error, for partial-success callers.
    pub fn accepted(&self) -> impl Iterator<Item = &CandidateRecord> {
        let failed: BTreeSet<usize> = self.errors.iter().map(|e| e.row).collect();
        self.candidates
            .iter()
            .filter(move |c| !failed.contains(&c.source_row()))
    }

    /// Consumes the report, returning the candidates.
    #[must_use]
    pub fn into_candidates(self) -> Vec<CandidateRecord> {
        self.candidates
    }

    /// Serializes the report for callers that render it elsewhere.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string(self).map_err(|e| crate::Error::OperationFailed {
            operation: "serialize_import_report".to_string(),
            cause: e.to_string(),
        })
    }
}

/// Result of validating a single record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormValidation {
    /// True iff `errors` is empty.
    pub is_valid: bool,
    /// Violations, ordered by field.
    pub errors: Vec<ValidationError>,
}

impl FormValidation {
    /// Builds the result from its errors.
    #[must_use]
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// Errors for one field.
    pub fn errors_for(&self, field: &str) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(move |e| e.field == field)
    }
}
