//! # Bulkport
//!
//! Bulk CSV import/export engine with declarative field validation.
//!
//! Bulkport moves tabular entity data (assets, incidents, SLAs,
//! vulnerabilities) between an application and spreadsheet tools. Export turns
//! records into a CSV document; import turns a CSV document into typed
//! candidate records plus a complete, row-scoped error report.
//!
//! ## Features
//!
//! - Lossless encode/decode round trip, including commas, quotes, line breaks
//!   and Unicode in cells
//! - Strict decoding: malformed quoting is reported with its line number
//! - Typed coercion (text, integer, decimal, boolean, date, enum)
//! - Declarative rules evaluated without short-circuiting
//! - Entity shapes as data ([`profiles::EntityProfile`]), not code
//!
//! ## Example
//!
//! ```rust
//! use bulkport::models::{ColumnSpec, Constraint, HeaderSchema, RuleSet};
//!
//! let schema = HeaderSchema::new(vec![
//!     ColumnSpec::text("id", "id"),
//!     ColumnSpec::integer("qty", "qty"),
//! ])?;
//! let rules = RuleSet::new().rule("qty", Constraint::MinValue(0.0));
//!
//! let report = bulkport::import_document("id,qty\nA,5\nB,-1\n", &schema, &rules);
//! assert!(!report.succeeded());
//! assert_eq!(report.candidates().len(), 2);
//! assert_eq!(report.errors()[0].row, 3);
//! # Ok::<(), bulkport::Error>(())
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

// Module declarations
pub mod config;
pub mod io;
pub mod models;
pub mod observability;
pub mod profiles;

// Re-exports for convenience
pub use config::{ExchangeConfig, RowShapePolicy};
pub use io::{ExportService, ImportService, ToRecord, Validator};
pub use models::{
    CandidateRecord, CellKind, ColumnSpec, Constraint, DocumentError, ErrorCode, FormValidation,
    HeaderSchema, ImportReport, MalformedDocument, Record, RuleKind, RuleSet, ValidationError,
    Value,
};
pub use profiles::EntityProfile;

/// Error type for bulkport operations.
///
/// Only caller defects and environment failures are errors. Problems with the
/// content of an imported document are never `Err`: they are reported inside
/// [`ImportReport`].
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidSchema` | Empty schema, duplicate keys or labels |
/// | `InvalidRule` | Regex does not compile, rule names an unknown column |
/// | `InvalidProfile` | Profile file does not parse or is inconsistent |
/// | `InvalidInput` | Unknown enum token in configuration, or a row with no cells |
/// | `OperationFailed` | File I/O, config parsing, writer or subscriber failures |
#[derive(Debug, ThisError)]
pub enum Error {
    /// A header schema is unusable.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// A validation rule is unusable.
    #[error("invalid rule: {0}")]
    InvalidRule(String),

    /// An entity profile is unusable.
    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for bulkport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Encodes rows as a CSV document with LF terminators.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for a row with no cells and
/// [`Error::OperationFailed`] if the writer fails.
pub fn encode_csv<H: AsRef<str>>(
    header: &[H],
    rows: &[Vec<String>],
    include_header: bool,
) -> Result<String> {
    io::codec::encode_csv(header, rows, include_header)
}

/// Decodes a CSV document into rows of cells.
///
/// # Errors
///
/// Returns [`MalformedDocument`] for unterminated or misplaced quotes.
pub fn decode_csv(document: &str) -> std::result::Result<Vec<Vec<String>>, MalformedDocument> {
    io::codec::decode_csv(document)
}

/// Exports records with the default configuration.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if encoding fails.
pub fn export_records<I>(records: I, schema: &HeaderSchema) -> Result<String>
where
    I: IntoIterator,
    I::Item: ToRecord,
{
    ExportService::default().export_records(records, schema)
}

/// Imports a document with the default configuration.
#[must_use]
pub fn import_document(document: &str, schema: &HeaderSchema, rules: &RuleSet) -> ImportReport {
    ImportService::default().import_document(document, schema, rules)
}

/// Validates a single record, such as a form submission.
#[must_use]
pub fn validate_form(record: &Record, rules: &RuleSet) -> FormValidation {
    io::validate_form(record, rules)
}
