//! CSV encoder on top of the `csv` crate writer.

use super::EncodeOptions;
use crate::{Error, Result};

/// Encodes rows with the default options (LF terminator, no BOM).
///
/// Cells are quoted only when they contain a comma, a quote or a line break;
/// embedded quotes are doubled. Every row, the last included, ends with the
/// terminator. A row made of one empty cell is written as `""` so it cannot
/// be read back as a blank line, and a leading cell that starts with U+FEFF
/// is quoted so it cannot be read back as a byte-order mark.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for a row with no cells, since no
/// document can represent one. Returns [`Error::OperationFailed`] if the
/// underlying writer fails, which does not happen for an in-memory buffer.
pub fn encode_csv<H: AsRef<str>>(
    header: &[H],
    rows: &[Vec<String>],
    include_header: bool,
) -> Result<String> {
    encode_csv_with(header, rows, include_header, EncodeOptions::default())
}

/// Encodes rows with explicit options.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for a row with no cells and
/// [`Error::OperationFailed`] if the underlying writer fails.
pub fn encode_csv_with<H: AsRef<str>>(
    header: &[H],
    rows: &[Vec<String>],
    include_header: bool,
    options: EncodeOptions,
) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true) // Shape is the orchestrator's concern
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(options.terminator.to_csv())
        .from_writer(Vec::new());

    if include_header && header.is_empty() {
        return Err(Error::InvalidInput("header has no cells".to_string()));
    }
    if let Some(index) = rows.iter().position(Vec::is_empty) {
        return Err(Error::InvalidInput(format!("row {index} has no cells")));
    }

    if include_header {
        writer
            .write_record(header.iter().map(AsRef::<str>::as_ref))
            .map_err(|e| encode_error("write_csv_header", &e))?;
    }
    for row in rows {
        writer
            .write_record(row)
            .map_err(|e| encode_error("write_csv_row", &e))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| encode_error("flush_csv", &e))?;
    let body = String::from_utf8(bytes).map_err(|e| encode_error("encode_csv_utf8", &e))?;
    let body = quote_leading_bom(body);

    if options.byte_order_mark {
        let mut document = String::with_capacity(body.len() + 3);
        document.push('\u{feff}');
        document.push_str(&body);
        Ok(document)
    } else {
        Ok(body)
    }
}

/// Wraps an unquoted first cell that starts with U+FEFF in quotes.
///
/// An unquoted cell holds no delimiter, quote or line break, so it ends at
/// the first of those and needs no escaping.
fn quote_leading_bom(body: String) -> String {
    if !body.starts_with('\u{feff}') {
        return body;
    }
    let end = body.find([',', '\r', '\n']).unwrap_or(body.len());
    let mut quoted = String::with_capacity(body.len() + 2);
    quoted.push('"');
    quoted.push_str(&body[..end]);
    quoted.push('"');
    quoted.push_str(&body[end..]);
    quoted
}

fn encode_error(operation: &str, cause: &dyn std::fmt::Display) -> Error {
    Error::OperationFailed {
        operation: operation.to_string(),
        cause: cause.to_string(),
    }
}
