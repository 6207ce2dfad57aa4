//! Import/Export I/O subsystem.
//!
//! Bulk exchange of tabular entity data as CSV documents.
//!
//! # Architecture
//!
//! Three pure components joined by one orchestrator:
//!
//! - **Codec** ([`codec`]) tokenizes and encodes documents, knowing nothing
//!   about schemas
//! - **Coercion** ([`coercion`]) converts cell text to typed values and back
//! - **Validation** ([`validation`]) evaluates declarative rules against records
//! - **Services** ([`services`]) compose them into export and import
//!
//! # Examples
//!
//! ## Import a document
//!
//! ```rust
//! use bulkport::io::ImportService;
//! use bulkport::models::{ColumnSpec, Constraint, HeaderSchema, RuleSet};
//!
//! let schema = HeaderSchema::new(vec![
//!     ColumnSpec::text("id", "id"),
//!     ColumnSpec::integer("qty", "qty"),
//! ])?;
//! let rules = RuleSet::new().rule("qty", Constraint::MinValue(0.0));
//!
//! let report = ImportService::default().import_document("id,qty\nA,5\nB,-1\n", &schema, &rules);
//! assert!(!report.succeeded());
//! assert_eq!(report.errors()[0].row, 3);
//! # Ok::<(), bulkport::Error>(())
//! ```
//!
//! ## Export records
//!
//! ```rust
//! use bulkport::io::ExportService;
//! use bulkport::models::{ColumnSpec, HeaderSchema, Record};
//!
//! let schema = HeaderSchema::new(vec![ColumnSpec::text("id", "ID")])?;
//! let records = vec![Record::new().with("id", "A")];
//!
//! let document = ExportService::default().export_records(&records, &schema)?;
//! assert_eq!(document, "ID\nA\n");
//! # Ok::<(), bulkport::Error>(())
//! ```

pub mod codec;
pub mod coercion;
pub mod services;
pub mod traits;
pub mod validation;

// Re-exports for convenience
pub use codec::{EncodeOptions, LineTerminator, decode_csv, encode_csv, encode_csv_with};
pub use coercion::{CoercionFailure, coerce, format_value};
pub use services::export::{ExportResult, ExportService};
pub use services::import::{ImportProgress, ImportService, ProgressCallback};
pub use traits::{ToRecord, Validator};
pub use validation::{RuleEngine, evaluate, evaluate_field, validate_form};
