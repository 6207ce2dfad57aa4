//! Core traits for import/export operations.
//!
//! [`ToRecord`] is the export-side seam: anything that can present itself as
//! a [`Record`] can be exported. [`Validator`] is the import-side seam: custom
//! row checks run next to the declarative [`crate::io::validation::RuleEngine`].

use crate::models::{CandidateRecord, Record, ValidationError, Value};
use std::collections::{BTreeMap, HashMap};

/// A value that can be exported as one row.
///
/// Keys not present in the export schema are ignored; schema keys missing
/// from the record become empty cells.
///
/// # Example Implementation
///
/// ```rust
/// use bulkport::io::ToRecord;
/// use bulkport::models::Record;
///
/// struct Asset {
///     tag: String,
///     cost: f64,
/// }
///
/// impl ToRecord for Asset {
///     fn to_record(&self) -> Record {
///         Record::new()
///             .with("tag", self.tag.as_str())
///             .with("cost", self.cost)
///     }
/// }
/// ```
pub trait ToRecord {
    /// Returns the field values of this row.
    fn to_record(&self) -> Record;
}

impl ToRecord for Record {
    fn to_record(&self) -> Record {
        self.clone()
    }
}

impl ToRecord for CandidateRecord {
    fn to_record(&self) -> Record {
        self.record().clone()
    }
}

impl ToRecord for BTreeMap<String, Value> {
    fn to_record(&self) -> Record {
        self.iter().map(|(k, v)| (k.as_str(), v.clone())).collect()
    }
}

impl ToRecord for HashMap<String, Value> {
    fn to_record(&self) -> Record {
        self.iter().map(|(k, v)| (k.as_str(), v.clone())).collect()
    }
}

impl<T: ToRecord + ?Sized> ToRecord for &T {
    fn to_record(&self) -> Record {
        (**self).to_record()
    }
}

/// A row-level check run during import.
///
/// Implementations must be pure: the same candidate always yields the same
/// errors. Errors should carry `candidate.source_row()` as their row.
///
/// # Example Implementation
///
/// ```rust
/// use bulkport::io::Validator;
/// use bulkport::models::{CandidateRecord, ErrorCode, RuleKind, ValidationError};
/// use std::collections::HashSet;
///
/// struct UniqueTag {
///     existing: HashSet<String>,
/// }
///
/// impl Validator for UniqueTag {
///     fn validate(&self, candidate: &CandidateRecord) -> Vec<ValidationError> {
///         match candidate.get("tag").and_then(|v| v.as_str()) {
///             Some(tag) if self.existing.contains(tag) => vec![ValidationError::new(
///                 candidate.source_row(),
///                 "tag",
///                 RuleKind::OneOf,
///                 ErrorCode::NotAllowed,
///                 format!("tag '{tag}' already exists"),
///             )],
///             _ => Vec::new(),
///         }
///     }
/// }
/// ```
pub trait Validator: Send + Sync {
    /// Returns every violation found in the candidate.
    fn validate(&self, candidate: &CandidateRecord) -> Vec<ValidationError>;
}
