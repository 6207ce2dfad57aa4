//! Import and export service implementations.
//!
//! Orchestrates the codec, coercion and the rule engine.

pub mod export;
pub mod import;

pub use export::{ExportResult, ExportService};
pub use import::{ImportProgress, ImportService, ProgressCallback};
