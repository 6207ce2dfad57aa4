//! Record export service.
//!
//! Maps records onto a [`HeaderSchema`] and encodes them as one document.

use crate::config::ExchangeConfig;
use crate::io::codec::encode_csv_with;
use crate::io::coercion::format_value;
use crate::io::traits::ToRecord;
use crate::models::HeaderSchema;
use crate::{Error, Result};
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::instrument;

/// Result of writing an export to a destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResult {
    /// Number of data rows written.
    pub exported: usize,
    /// Number of bytes written, header included.
    pub bytes: usize,
    /// Output path (if file export).
    pub output_path: Option<String>,
}

impl ExportResult {
    /// Returns whether any rows were exported.
    #[must_use]
    pub const fn has_exports(&self) -> bool {
        self.exported > 0
    }
}

/// Service for exporting records as CSV documents.
#[derive(Debug, Clone, Default)]
pub struct ExportService {
    config: ExchangeConfig,
}

impl ExportService {
    /// Creates a new export service.
    #[must_use]
    pub const fn new(config: ExchangeConfig) -> Self {
        Self { config }
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// Exports records as a complete document, header first.
    ///
    /// Column order and header text come only from `schema`. Fields the
    /// schema does not name are ignored; schema fields the record lacks are
    /// written as empty cells. The same input always yields the same bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if encoding fails.
    #[instrument(skip_all, fields(columns = schema.len()))]
    pub fn export_records<I>(&self, records: I, schema: &HeaderSchema) -> Result<String>
    where
        I: IntoIterator,
        I::Item: ToRecord,
    {
        let start = Instant::now();
        let rows = to_rows(records, schema);
        let labels: Vec<&str> = schema.labels().collect();
        let document = encode_csv_with(&labels, &rows, true, self.config.encode_options())?;

        metrics::counter!("bulkport_export_rows_total").increment(rows.len() as u64);
        metrics::histogram!("bulkport_export_duration_ms")
            .record(start.elapsed().as_secs_f64() * 1000.0);
        tracing::debug!(rows = rows.len(), bytes = document.len(), "exported records");

        Ok(document)
    }

    /// Exports records to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub fn export_to_writer<I, W>(
        &self,
        records: I,
        schema: &HeaderSchema,
        mut writer: W,
    ) -> Result<ExportResult>
    where
        I: IntoIterator,
        I::Item: ToRecord,
        W: Write,
    {
        let records: Vec<I::Item> = records.into_iter().collect();
        let exported = records.len();
        let document = self.export_records(records, schema)?;

        writer
            .write_all(document.as_bytes())
            .and_then(|()| writer.flush())
            .map_err(|e| Error::OperationFailed {
                operation: "write_export".to_string(),
                cause: e.to_string(),
            })?;

        Ok(ExportResult {
            exported,
            bytes: document.len(),
            output_path: None,
        })
    }

    /// Exports records to a file, creating or truncating it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn export_to_file<I>(
        &self,
        records: I,
        schema: &HeaderSchema,
        path: &Path,
    ) -> Result<ExportResult>
    where
        I: IntoIterator,
        I::Item: ToRecord,
    {
        let file = std::fs::File::create(path).map_err(|e| Error::OperationFailed {
            operation: "create_export_file".to_string(),
            cause: e.to_string(),
        })?;
        let writer = std::io::BufWriter::new(file);

        let mut result = self.export_to_writer(records, schema, writer)?;
        result.output_path = Some(path.display().to_string());
        Ok(result)
    }
}

/// Maps each record to its row of cell texts in schema order.
fn to_rows<I>(records: I, schema: &HeaderSchema) -> Vec<Vec<String>>
where
    I: IntoIterator,
    I::Item: ToRecord,
{
    records
        .into_iter()
        .map(|item| {
            let record = item.to_record();
            schema
                .columns()
                .iter()
                .map(|column| format_value(record.get(&column.key)))
                .collect()
        })
        .collect()
}
