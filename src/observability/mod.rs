//! Observability and telemetry.
//!
//! The library only emits `tracing` events and `metrics` counters; installing
//! a subscriber or a metrics recorder is the host application's choice.
//! [`init`] is a convenience for hosts that want the default subscriber.
//!
//! Counters emitted:
//!
//! | Name | Labels |
//! |------|--------|
//! | `bulkport_export_rows_total` | |
//! | `bulkport_import_documents_total` | `status`: `succeeded`, `partial`, `rejected` |
//! | `bulkport_import_rows_total` | |
//! | `bulkport_import_errors_total` | `code` |

mod logging;

pub use logging::{ENV_LOG, ENV_LOG_FILE, ENV_LOG_FORMAT, LogFormat, LoggingConfig};

use crate::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

static OBSERVABILITY_INIT: OnceLock<()> = OnceLock::new();

type FormatLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initializes logging using environment variables.
///
/// # Errors
///
/// Returns an error if logging has already been initialized.
pub fn init_from_env() -> Result<()> {
    init(LoggingConfig::from_env())
}

/// Installs the global `tracing` subscriber.
///
/// # Errors
///
/// Returns an error if logging has already been initialized, if the filter
/// directives are invalid, or if the log file cannot be opened.
pub fn init(config: LoggingConfig) -> Result<()> {
    if is_initialized() {
        return Err(init_error("observability already initialized"));
    }

    let filter = EnvFilter::try_new(&config.filter).map_err(|e| Error::OperationFailed {
        operation: "parse_log_filter".to_string(),
        cause: e.to_string(),
    })?;
    let layer = format_layer(&config)?;

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()
        .map_err(init_error)?;

    OBSERVABILITY_INIT
        .set(())
        .map_err(|()| init_error("failed to mark observability initialized"))?;

    tracing::debug!(
        filter = %config.filter,
        format = ?config.format,
        file = ?config.file,
        "logging initialized"
    );
    Ok(())
}

/// Returns true once [`init`] has succeeded in this process.
#[must_use]
pub fn is_initialized() -> bool {
    OBSERVABILITY_INIT.get().is_some()
}

/// Builds the formatting layer for the configured format and destination.
///
/// Files never receive ANSI escapes.
fn format_layer(config: &LoggingConfig) -> Result<FormatLayer> {
    let (writer, ansi) = match &config.file {
        Some(path) => (BoxMakeWriter::new(Mutex::new(open_log_file(path)?)), false),
        None => (BoxMakeWriter::new(io::stderr), true),
    };

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(true);
    Ok(match config.format {
        LogFormat::Json => layer
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .boxed(),
        LogFormat::Pretty => layer.pretty().with_ansi(ansi).boxed(),
    })
}

/// Opens a log file for appending, creating parent directories.
fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
            operation: "create_log_dir".to_string(),
            cause: e.to_string(),
        })?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::OperationFailed {
            operation: "open_log_file".to_string(),
            cause: format!("{}: {}", path.display(), e),
        })
}

fn init_error<E: std::fmt::Display>(cause: E) -> Error {
    Error::OperationFailed {
        operation: "observability_init".to_string(),
        cause: cause.to_string(),
    }
}
