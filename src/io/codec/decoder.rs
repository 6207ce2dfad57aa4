//! Strict CSV tokenizer.
//!
//! Hand-written so that malformed quoting is reported with a line number
//! instead of being silently repaired.

use crate::models::MalformedDocument;
use std::iter::Peekable;
use std::str::Chars;

/// Decodes a document into rows of cells.
///
/// - LF, CRLF and lone CR end a record outside quotes and are kept verbatim
///   inside quotes.
/// - A leading byte-order mark is skipped.
/// - The empty remainder after the final line break is not a row; an
///   interior blank line is a row of one empty cell.
/// - Rows may have different lengths; the caller checks shape.
///
/// # Errors
///
/// Returns [`MalformedDocument`] when a quoted field is never closed, when a
/// closing quote is followed by anything but a comma or a line break, or
/// when a quote appears inside an unquoted field.
pub fn decode_csv(document: &str) -> Result<Vec<Vec<String>>, MalformedDocument> {
    let text = document.strip_prefix('\u{feff}').unwrap_or(document);
    Tokenizer::new(text).run()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Nothing consumed for the current field yet.
    FieldStart,
    /// Inside a field that did not start with a quote.
    Unquoted,
    /// Inside a quoted field.
    Quoted,
    /// Just after the closing quote of a quoted field.
    QuoteClosed,
}

struct Tokenizer<'a> {
    chars: Peekable<Chars<'a>>,
    state: State,
    /// Current physical line, 1-based.
    line: usize,
    /// Line where the open quoted field started.
    quote_line: usize,
    field: String,
    row: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl<'a> Tokenizer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            state: State::FieldStart,
            line: 1,
            quote_line: 1,
            field: String::new(),
            row: Vec::new(),
            rows: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Vec<String>>, MalformedDocument> {
        while let Some(c) = self.chars.next() {
            match self.state {
                State::FieldStart => match c {
                    '"' => {
                        self.state = State::Quoted;
                        self.quote_line = self.line;
                    },
                    ',' => self.end_field(),
                    '\r' | '\n' => self.end_record(c),
                    _ => {
                        self.field.push(c);
                        self.state = State::Unquoted;
                    },
                },
                State::Unquoted => match c {
                    ',' => self.end_field(),
                    '\r' | '\n' => self.end_record(c),
                    '"' => {
                        return Err(MalformedDocument::new(
                            self.line,
                            "quote inside an unquoted field",
                        ));
                    },
                    _ => self.field.push(c),
                },
                State::Quoted => match c {
                    '"' => {
                        if self.chars.peek() == Some(&'"') {
                            self.chars.next();
                            self.field.push('"');
                        } else {
                            self.state = State::QuoteClosed;
                        }
                    },
                    '\n' => {
                        self.field.push(c);
                        self.line += 1;
                    },
                    '\r' => {
                        self.field.push(c);
                        // CRLF is counted once, at the LF
                        if self.chars.peek() != Some(&'\n') {
                            self.line += 1;
                        }
                    },
                    _ => self.field.push(c),
                },
                State::QuoteClosed => match c {
                    ',' => self.end_field(),
                    '\r' | '\n' => self.end_record(c),
                    _ => {
                        return Err(MalformedDocument::new(
                            self.line,
                            format!("unexpected '{}' after closing quote", c.escape_default()),
                        ));
                    },
                },
            }
        }

        self.finish()
    }

    fn end_field(&mut self) {
        self.row.push(std::mem::take(&mut self.field));
        self.state = State::FieldStart;
    }

    fn end_record(&mut self, terminator: char) {
        if terminator == '\r' && self.chars.peek() == Some(&'\n') {
            self.chars.next();
        }
        self.end_field();
        self.rows.push(std::mem::take(&mut self.row));
        self.line += 1;
    }

    fn finish(mut self) -> Result<Vec<Vec<String>>, MalformedDocument> {
        match self.state {
            State::Quoted => Err(MalformedDocument::new(
                self.quote_line,
                "unterminated quoted field",
            )),
            // Nothing after the last line break: no row
            State::FieldStart if self.row.is_empty() => Ok(self.rows),
            _ => {
                self.end_field();
                self.rows.push(self.row);
                Ok(self.rows)
            },
        }
    }
}
