//! Configuration management.
//!
//! Settings come from three layers, later wins: built-in defaults, a TOML
//! file, and `BULKPORT_*` environment variables.

use crate::io::codec::{EncodeOptions, LineTerminator};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Environment variable overriding [`ExchangeConfig::row_shape`].
pub const ENV_ROW_SHAPE: &str = "BULKPORT_ROW_SHAPE";
/// Environment variable overriding [`ExchangeConfig::skip_blank_rows`].
pub const ENV_SKIP_BLANK_ROWS: &str = "BULKPORT_SKIP_BLANK_ROWS";
/// Environment variable overriding [`ExchangeConfig::line_terminator`].
pub const ENV_LINE_TERMINATOR: &str = "BULKPORT_LINE_TERMINATOR";
/// Environment variable overriding [`ExchangeConfig::byte_order_mark`].
pub const ENV_BOM: &str = "BULKPORT_BOM";
/// Environment variable overriding [`ExchangeConfig::max_document_bytes`].
pub const ENV_MAX_DOCUMENT_BYTES: &str = "BULKPORT_MAX_DOCUMENT_BYTES";

/// What to do with a data row whose cell count differs from the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowShapePolicy {
    /// The whole document is rejected as structurally invalid.
    #[default]
    Strict,
    /// The row is padded with empty cells or truncated, and a row error is
    /// recorded so the mismatch is still visible.
    Pad,
}

impl RowShapePolicy {
    /// Returns the policy name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Pad => "pad",
        }
    }
}

impl FromStr for RowShapePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "strict" | "reject" => Ok(Self::Strict),
            "pad" | "lenient" => Ok(Self::Pad),
            _ => Err(Error::InvalidInput(format!("unknown row shape policy: {s}"))),
        }
    }
}

/// Settings shared by the import and export services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeConfig {
    /// Handling of rows with the wrong number of cells.
    pub row_shape: RowShapePolicy,
    /// Skip bare blank lines in a multi-column document. A row of empty
    /// cells is always kept. Skipped lines still count toward row numbering.
    pub skip_blank_rows: bool,
    /// Record terminator for exported documents.
    pub line_terminator: LineTerminator,
    /// Prefix exported documents with a UTF-8 byte-order mark.
    pub byte_order_mark: bool,
    /// Reject imported documents larger than this many bytes.
    pub max_document_bytes: Option<usize>,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            row_shape: RowShapePolicy::Strict,
            skip_blank_rows: false,
            line_terminator: LineTerminator::Lf,
            byte_order_mark: false,
            max_document_bytes: None,
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Row shape policy.
    pub row_shape: Option<RowShapePolicy>,
    /// Skip blank rows.
    pub skip_blank_rows: Option<bool>,
    /// Export line terminator.
    pub line_terminator: Option<LineTerminator>,
    /// Export byte-order mark.
    pub byte_order_mark: Option<bool>,
    /// Import size limit in bytes.
    pub max_document_bytes: Option<usize>,
}

impl ExchangeConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path, then applies environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: e.to_string(),
        })?;

        let file: ConfigFile = toml::from_str(&contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;

        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(Self::from_config_file(file).with_env_overrides())
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/bulkport/` on macOS)
    /// 2. XDG config dir (`~/.config/bulkport/` for Unix compatibility)
    ///
    /// Falls back to defaults (plus environment overrides) if no file is found
    /// or the file is invalid.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default().with_env_overrides();
        };

        let candidates = [
            base_dirs.config_dir().join("bulkport").join("config.toml"),
            base_dirs
                .home_dir()
                .join(".config")
                .join("bulkport")
                .join("config.toml"),
        ];

        for path in candidates.iter().filter(|p| p.exists()) {
            match Self::load_from_file(path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config file");
                },
            }
        }

        Self::default().with_env_overrides()
    }

    /// Parses configuration from TOML text, without environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid config file.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;
        Ok(Self::from_config_file(file))
    }

    /// Applies `BULKPORT_*` environment variables.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from any key lookup. Unparseable values are logged
    /// and ignored.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = parse_override(&lookup, ENV_ROW_SHAPE, str::parse::<RowShapePolicy>) {
            self.row_shape = v;
        }
        if let Some(v) = parse_override(&lookup, ENV_SKIP_BLANK_ROWS, parse_flag) {
            self.skip_blank_rows = v;
        }
        if let Some(v) = parse_override(&lookup, ENV_LINE_TERMINATOR, str::parse::<LineTerminator>)
        {
            self.line_terminator = v;
        }
        if let Some(v) = parse_override(&lookup, ENV_BOM, parse_flag) {
            self.byte_order_mark = v;
        }
        if let Some(v) = parse_override(&lookup, ENV_MAX_DOCUMENT_BYTES, |s| {
            s.trim()
                .parse::<usize>()
                .map_err(|e| Error::InvalidInput(e.to_string()))
        }) {
            self.max_document_bytes = (v > 0).then_some(v);
        }
        self
    }

    /// Sets the row shape policy.
    #[must_use]
    pub const fn with_row_shape(mut self, policy: RowShapePolicy) -> Self {
        self.row_shape = policy;
        self
    }

    /// Enables or disables blank row skipping.
    #[must_use]
    pub const fn with_skip_blank_rows(mut self, skip: bool) -> Self {
        self.skip_blank_rows = skip;
        self
    }

    /// Sets the export line terminator.
    #[must_use]
    pub const fn with_line_terminator(mut self, terminator: LineTerminator) -> Self {
        self.line_terminator = terminator;
        self
    }

    /// Enables or disables the export byte-order mark.
    #[must_use]
    pub const fn with_byte_order_mark(mut self, enabled: bool) -> Self {
        self.byte_order_mark = enabled;
        self
    }

    /// Sets the import size limit.
    #[must_use]
    pub const fn with_max_document_bytes(mut self, limit: Option<usize>) -> Self {
        self.max_document_bytes = limit;
        self
    }

    /// Encoder options derived from this configuration.
    #[must_use]
    pub const fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            terminator: self.line_terminator,
            byte_order_mark: self.byte_order_mark,
        }
    }

    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(policy) = file.row_shape {
            config.row_shape = policy;
        }
        if let Some(skip) = file.skip_blank_rows {
            config.skip_blank_rows = skip;
        }
        if let Some(terminator) = file.line_terminator {
            config.line_terminator = terminator;
        }
        if let Some(bom) = file.byte_order_mark {
            config.byte_order_mark = bom;
        }
        if let Some(limit) = file.max_document_bytes {
            config.max_document_bytes = (limit > 0).then_some(limit);
        }

        config
    }
}

fn parse_override<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    parse: impl Fn(&str) -> Result<T>,
) -> Option<T> {
    let raw = lookup(key)?;
    match parse(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, value = %raw, error = %e, "ignoring invalid override");
            None
        },
    }
}

fn parse_flag(s: &str) -> Result<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::InvalidInput(format!("not a boolean flag: {s}"))),
    }
}
