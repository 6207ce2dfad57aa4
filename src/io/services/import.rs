//! Document import service.
//!
//! Decodes a document, checks its structure against a [`HeaderSchema`],
//! coerces every row into a [`CandidateRecord`] and validates it. Nothing is
//! persisted; the caller decides what to do with the report.

#![allow(clippy::cast_precision_loss)]

use crate::config::{ExchangeConfig, RowShapePolicy};
use crate::io::codec::decode_csv;
use crate::io::coercion::coerce;
use crate::io::traits::Validator;
use crate::io::validation::evaluate_field;
use crate::models::{
    CandidateRecord, DocumentError, ErrorCode, HeaderSchema, ImportReport, ROW_FIELD, Record,
    RuleKind, RuleSet, ValidationError,
};
use crate::{Error, Result};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Progress callback for import operations.
pub type ProgressCallback = Box<dyn Fn(&ImportProgress) + Send>;

/// Progress information during import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportProgress {
    /// Data rows processed so far, skipped blank rows included.
    pub processed: usize,
    /// Data rows in the document.
    pub total: usize,
    /// Rows that produced at least one error so far.
    pub rows_with_errors: usize,
}

impl ImportProgress {
    /// Returns the percentage complete (0-100).
    #[must_use]
    pub fn percent_complete(&self) -> f32 {
        if self.total == 0 {
            100.0
        } else {
            (self.processed as f32 / self.total as f32) * 100.0
        }
    }
}

/// Service for importing CSV documents.
#[derive(Clone, Default)]
pub struct ImportService {
    config: ExchangeConfig,
    validators: Vec<Arc<dyn Validator>>,
}

impl std::fmt::Debug for ImportService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportService")
            .field("config", &self.config)
            .field("validators", &self.validators.len())
            .finish()
    }
}

impl ImportService {
    /// Creates a new import service.
    #[must_use]
    pub const fn new(config: ExchangeConfig) -> Self {
        Self {
            config,
            validators: Vec::new(),
        }
    }

    /// Adds a custom row validator, run after the declarative rules.
    #[must_use]
    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// Imports a document.
    ///
    /// Structural problems (size limit, malformed quoting, missing or
    /// mismatched header, ragged rows under the strict policy) produce a
    /// report with a single document error and no candidates. Otherwise every
    /// data row yields a candidate, and row errors are ordered by row, then by
    /// schema column, then by rules on fields outside the schema.
    #[must_use]
    pub fn import_document(
        &self,
        document: &str,
        schema: &HeaderSchema,
        rules: &RuleSet,
    ) -> ImportReport {
        self.import_document_with_progress(document, schema, rules, None)
    }

    /// Imports a document, reporting progress after each data row.
    #[must_use]
    #[instrument(skip_all, fields(bytes = document.len(), columns = schema.len()))]
    pub fn import_document_with_progress(
        &self,
        document: &str,
        schema: &HeaderSchema,
        rules: &RuleSet,
        progress: Option<ProgressCallback>,
    ) -> ImportReport {
        let start = Instant::now();
        let report = match self.decode_rows(document, schema) {
            Ok(rows) => self.process_rows(rows, schema, rules, progress.as_ref()),
            Err(error) => {
                tracing::warn!(error = %error, "document rejected");
                ImportReport::structural(error)
            },
        };

        record_metrics(&report, start);
        report
    }

    /// Imports a document read from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not UTF-8. Problems
    /// with the content itself are reported in the [`ImportReport`].
    pub fn import_file(
        &self,
        path: &Path,
        schema: &HeaderSchema,
        rules: &RuleSet,
    ) -> Result<ImportReport> {
        let document = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_import_file".to_string(),
            cause: e.to_string(),
        })?;
        Ok(self.import_document(&document, schema, rules))
    }

    /// Decodes the document and checks everything that makes it untrustworthy
    /// as a whole. Returns the data rows with their 1-based row numbers.
    fn decode_rows(
        &self,
        document: &str,
        schema: &HeaderSchema,
    ) -> std::result::Result<Vec<(usize, Vec<String>)>, DocumentError> {
        if let Some(limit) = self.config.max_document_bytes {
            if document.len() > limit {
                return Err(DocumentError::TooLarge {
                    limit,
                    actual: document.len(),
                });
            }
        }

        let mut rows = decode_csv(document)?.into_iter();
        let header = rows.next().ok_or(DocumentError::Empty)?;
        check_header(&header, schema)?;

        let data: Vec<(usize, Vec<String>)> = rows
            .enumerate()
            .map(|(index, cells)| (index + 2, cells))
            .collect();

        if self.config.row_shape == RowShapePolicy::Strict {
            let ragged = data
                .iter()
                .filter(|(_, cells)| !self.skips(cells, schema))
                .find(|(_, cells)| cells.len() != schema.len());
            if let Some((row, cells)) = ragged {
                return Err(DocumentError::RaggedRow {
                    row: *row,
                    expected: schema.len(),
                    found: cells.len(),
                });
            }
        }

        Ok(data)
    }

    /// Only bare blank lines are skipped; a full-width row of empty cells is
    /// data (an exported record with every field absent).
    fn skips(&self, cells: &[String], schema: &HeaderSchema) -> bool {
        self.config.skip_blank_rows && is_blank_line(cells, schema)
    }

    fn process_rows(
        &self,
        rows: Vec<(usize, Vec<String>)>,
        schema: &HeaderSchema,
        rules: &RuleSet,
        progress: Option<&ProgressCallback>,
    ) -> ImportReport {
        let mut state = ImportProgress {
            total: rows.len(),
            ..Default::default()
        };
        let mut candidates = Vec::with_capacity(rows.len());
        let mut errors = Vec::new();

        for (row, cells) in rows {
            state.processed += 1;

            if self.skips(&cells, schema) {
                tracing::trace!(row, "skipping blank row");
            } else {
                let (candidate, row_errors) = self.process_row(row, cells, schema, rules);
                if !row_errors.is_empty() {
                    state.rows_with_errors += 1;
                    tracing::debug!(row, errors = row_errors.len(), "row has errors");
                }
                candidates.push(candidate);
                errors.extend(row_errors);
            }

            if let Some(cb) = progress {
                cb(&state);
            }
        }

        tracing::debug!(
            candidates = candidates.len(),
            errors = errors.len(),
            "imported document"
        );
        ImportReport::from_rows(candidates, errors)
    }

    /// Coerces and validates one data row.
    fn process_row(
        &self,
        row: usize,
        mut cells: Vec<String>,
        schema: &HeaderSchema,
        rules: &RuleSet,
    ) -> (CandidateRecord, Vec<ValidationError>) {
        let mut errors = Vec::new();

        if cells.len() != schema.len() {
            // Only reachable under the pad policy; strict rejected the document
            errors.push(ValidationError::new(
                row,
                ROW_FIELD,
                RuleKind::Pattern,
                ErrorCode::CellCountMismatch,
                format!("row has {} cells, expected {}", cells.len(), schema.len()),
            ));
            cells.resize(schema.len(), String::new());
        }

        let mut record = Record::new();
        let mut rejected = BTreeSet::new();
        let mut coercion_errors = Vec::with_capacity(schema.len());
        for (column, cell) in schema.columns().iter().zip(&cells) {
            match coerce(&column.kind, cell) {
                Ok(value) => {
                    record.set(column.key.clone(), value);
                    coercion_errors.push(None);
                },
                Err(failure) => {
                    rejected.insert(column.key.clone());
                    coercion_errors.push(Some(ValidationError::new(
                        row,
                        column.key.clone(),
                        RuleKind::Pattern,
                        failure.code,
                        format!("{}: {}", column.key, failure.message),
                    )));
                },
            }
        }

        let candidate = CandidateRecord::new(row, record, rejected);

        for (column, coercion_error) in schema.columns().iter().zip(coercion_errors) {
            errors.extend(coercion_error);
            errors.extend(evaluate_field(
                &candidate,
                &column.key,
                rules.rules_for(&column.key),
            ));
        }
        for (field, constraints) in rules.iter().filter(|(f, _)| !schema.contains(f)) {
            errors.extend(evaluate_field(&candidate, field, constraints));
        }
        for validator in &self.validators {
            errors.extend(validator.validate(&candidate));
        }

        (candidate, errors)
    }
}

/// Checks the header row against the schema labels, length first.
fn check_header(header: &[String], schema: &HeaderSchema) -> std::result::Result<(), DocumentError> {
    if header.len() != schema.len() {
        return Err(DocumentError::HeaderLength {
            expected: schema.len(),
            found: header.len(),
        });
    }

    let mismatch = header
        .iter()
        .zip(schema.labels())
        .enumerate()
        .find(|(_, (found, expected))| found.as_str() != *expected);
    match mismatch {
        Some((index, (found, expected))) => Err(DocumentError::HeaderMismatch {
            position: index + 1,
            expected: expected.to_string(),
            found: found.clone(),
        }),
        None => Ok(()),
    }
}

/// A bare blank line decodes to a single empty cell. For a single-column
/// schema that is indistinguishable from an exported empty cell, so it is
/// never treated as blank there.
fn is_blank_line(cells: &[String], schema: &HeaderSchema) -> bool {
    schema.len() > 1 && matches!(cells, [cell] if cell.trim().is_empty())
}

fn record_metrics(report: &ImportReport, start: Instant) {
    let status = match (report.document_error(), report.succeeded()) {
        (Some(_), _) => "rejected",
        (None, true) => "succeeded",
        (None, false) => "partial",
    };
    metrics::counter!("bulkport_import_documents_total", "status" => status).increment(1);
    metrics::counter!("bulkport_import_rows_total").increment(report.candidates().len() as u64);
    for error in report.errors() {
        metrics::counter!("bulkport_import_errors_total", "code" => error.code.as_str())
            .increment(1);
    }
    metrics::histogram!("bulkport_import_duration_ms")
        .record(start.elapsed().as_secs_f64() * 1000.0);
}
