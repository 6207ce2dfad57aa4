//! CSV codec.
//!
//! A standalone encoder and decoder for rectangular text documents. The codec
//! knows nothing about schemas or rules; it only guarantees faithful
//! tokenization, so that for every list of rows `R` with at least one cell
//! per row:
//!
//! ```rust
//! use bulkport::io::codec::{decode_csv, encode_csv};
//!
//! let rows = vec![
//!     vec!["A, Inc.".to_string(), "say \"hi\"".to_string()],
//!     vec![String::new(), "two\nlines".to_string()],
//! ];
//! let document = encode_csv(&["name", "note"], &rows, true).unwrap();
//! let decoded = decode_csv(&document).unwrap();
//! assert_eq!(&decoded[1..], rows.as_slice());
//! ```

mod decoder;
mod encoder;

pub use decoder::decode_csv;
pub use encoder::{encode_csv, encode_csv_with};

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Record terminator written by the encoder.
///
/// The decoder accepts LF, CRLF and lone CR regardless of this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineTerminator {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    Crlf,
}

impl LineTerminator {
    const fn to_csv(self) -> csv::Terminator {
        match self {
            Self::Lf => csv::Terminator::Any(b'\n'),
            Self::Crlf => csv::Terminator::CRLF,
        }
    }
}

impl FromStr for LineTerminator {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "lf" | "\n" | "unix" => Ok(Self::Lf),
            "crlf" | "\r\n" | "windows" => Ok(Self::Crlf),
            _ => Err(crate::Error::InvalidInput(format!(
                "unknown line terminator: {s}"
            ))),
        }
    }
}

/// Encoder settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Record terminator.
    pub terminator: LineTerminator,
    /// Prefix the document with a UTF-8 byte-order mark (spreadsheet tools
    /// use it to detect the encoding).
    pub byte_order_mark: bool,
}

impl EncodeOptions {
    /// Sets the record terminator.
    #[must_use]
    pub const fn with_terminator(mut self, terminator: LineTerminator) -> Self {
        self.terminator = terminator;
        self
    }

    /// Enables or disables the byte-order mark.
    #[must_use]
    pub const fn with_byte_order_mark(mut self, enabled: bool) -> Self {
        self.byte_order_mark = enabled;
        self
    }
}
