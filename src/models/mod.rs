//! Data models for bulkport.
//!
//! Schemas, typed values, rules and the reports produced by import and form
//! validation.

mod report;
mod rule;
mod schema;
mod value;

pub use report::{
    DocumentError, ErrorCode, FORM_ROW, FormValidation, ImportReport, MalformedDocument,
    ROW_FIELD, ValidationError,
};
pub use rule::{Comparison, Constraint, Pattern, RuleKind, RuleSet, ValidationRule};
pub use schema::{CellKind, ColumnSpec, HeaderSchema};
pub use value::{CandidateRecord, DATE_FORMAT, Record, Value};
