//! Property-based tests for the codec and the exchange round trip.
//!
//! Uses proptest to verify invariants across random inputs:
//! - Decoding an encoded document yields the original rows
//! - Export is deterministic
//! - Exported records import back to equal records
//! - An invalid row never affects the errors of another row

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use bulkport::io::codec::{EncodeOptions, LineTerminator, decode_csv, encode_csv, encode_csv_with};
use bulkport::models::{CandidateRecord, ColumnSpec, Constraint, HeaderSchema, Record, RuleSet};
use bulkport::{ExportService, ImportService, Value};
use chrono::NaiveDate;
use proptest::prelude::*;

const ENUM_VALUES: [&str; 3] = ["Open", "In Progress", "Closed"];

/// Cells drawn from an alphabet heavy in delimiters, quotes and line breaks.
fn cell() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            4 => "[a-zA-Z0-9]",
            1 => Just(" ".to_string()),
            1 => Just(",".to_string()),
            1 => Just("\"".to_string()),
            1 => Just("\n".to_string()),
            1 => Just("\r".to_string()),
            1 => Just("é".to_string()),
            1 => Just("漢".to_string()),
        ],
        0..12,
    )
    .prop_map(|parts| parts.concat())
}

fn rows() -> impl Strategy<Value = Vec<Vec<String>>> {
    (1usize..=5).prop_flat_map(|width| prop::collection::vec(prop::collection::vec(cell(), width), 0..8))
}

/// Trimmed, non-blank text that may still carry awkward interior characters.
fn trimmed_text() -> impl Strategy<Value = String> {
    ("[a-zA-Z0-9]", "[a-zA-Z0-9 ,\"\n]{0,10}", "[a-zA-Z0-9]")
        .prop_map(|(first, middle, last)| format!("{first}{middle}{last}"))
}

fn date() -> impl Strategy<Value = NaiveDate> {
    (1i32..1_000_000).prop_map(|days| NaiveDate::from_num_days_from_ce_opt(days).unwrap())
}

fn schema() -> HeaderSchema {
    HeaderSchema::new(vec![
        ColumnSpec::text("name", "Name"),
        ColumnSpec::integer("count", "Count"),
        ColumnSpec::decimal("score", "Score"),
        ColumnSpec::boolean("active", "Active"),
        ColumnSpec::date("since", "Since"),
        ColumnSpec::enumeration("state", "State", ENUM_VALUES),
    ])
    .unwrap()
}

fn record() -> impl Strategy<Value = Record> {
    (
        prop::option::of(trimmed_text()),
        prop::option::of(any::<i64>()),
        prop::option::of(-1.0e9f64..1.0e9),
        prop::option::of(any::<bool>()),
        prop::option::of(date()),
        prop::option::of(prop::sample::select(ENUM_VALUES.to_vec())),
    )
        .prop_map(|(name, count, score, active, since, state)| {
            let mut record = Record::new();
            record.set("name", name.map(Value::Text));
            record.set("count", count.map(Value::Integer));
            record.set("score", score.map(Value::Decimal));
            record.set("active", active.map(Value::Boolean));
            record.set("since", since.map(Value::Date));
            record.set("state", state.map(Value::enumeration));
            record
        })
}

proptest! {
    /// Property: decode(encode(rows)) returns the rows, header included.
    #[test]
    fn prop_codec_round_trip(rows in rows()) {
        let width = rows.first().map_or(1, Vec::len);
        let header: Vec<String> = (0..width).map(|i| format!("c{i}")).collect();

        let document = encode_csv(&header, &rows, true).unwrap();
        let decoded = decode_csv(&document).unwrap();

        prop_assert_eq!(&decoded[0], &header);
        prop_assert_eq!(&decoded[1..], rows.as_slice());
    }

    /// Property: the round trip holds for CRLF output with a byte order mark.
    #[test]
    fn prop_codec_round_trip_crlf_bom(rows in rows()) {
        let width = rows.first().map_or(1, Vec::len);
        let header: Vec<String> = (0..width).map(|i| format!("c{i}")).collect();
        let options = EncodeOptions::default()
            .with_terminator(LineTerminator::Crlf)
            .with_byte_order_mark(true);

        let document = encode_csv_with(&header, &rows, true, options).unwrap();
        let decoded = decode_csv(&document).unwrap();

        prop_assert_eq!(&decoded[1..], rows.as_slice());
    }

    /// Property: exporting the same records twice yields identical bytes.
    #[test]
    fn prop_export_is_deterministic(records in prop::collection::vec(record(), 0..10)) {
        let service = ExportService::default();
        let first = service.export_records(&records, &schema()).unwrap();
        let second = service.export_records(&records, &schema()).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Property: exported records import back as equal records, in order.
    #[test]
    fn prop_export_import_round_trip(records in prop::collection::vec(record(), 0..10)) {
        let schema = schema();
        let document = ExportService::default().export_records(&records, &schema).unwrap();
        let report = ImportService::default().import_document(&document, &schema, &RuleSet::new());

        prop_assert!(report.succeeded(), "{:?}", report.errors());
        let imported: Vec<Record> = report
            .into_candidates()
            .into_iter()
            .map(CandidateRecord::into_record)
            .collect();
        prop_assert_eq!(imported, records);
    }

    /// Property: adding an invalid row leaves the other rows' errors untouched.
    #[test]
    fn prop_row_isolation(
        counts in prop::collection::vec(-5i64..5, 1..8),
        insert_at in any::<prop::sample::Index>(),
    ) {
        let schema = HeaderSchema::new(vec![
            ColumnSpec::text("id", "ID"),
            ColumnSpec::integer("count", "Count"),
        ])
        .unwrap();
        let rules = RuleSet::new().required("id").rule("count", Constraint::MinValue(0.0));
        let service = ImportService::default();

        let lines: Vec<String> = counts.iter().enumerate().map(|(i, c)| format!("r{i},{c}")).collect();
        let baseline = service.import_document(
            &format!("ID,Count\n{}\n", lines.join("\n")),
            &schema,
            &rules,
        );

        let at = insert_at.index(lines.len() + 1);
        let mut poisoned = lines.clone();
        poisoned.insert(at, ",not-a-number".to_string());
        let report = service.import_document(
            &format!("ID,Count\n{}\n", poisoned.join("\n")),
            &schema,
            &rules,
        );

        prop_assert_eq!(report.candidates().len(), counts.len() + 1);
        let inserted_row = at + 2;
        for error in baseline.errors() {
            let shifted = if error.row >= inserted_row { error.row + 1 } else { error.row };
            let matching: Vec<_> = report.errors_for_row(shifted).collect();
            prop_assert!(matching.iter().any(|e| e.field == error.field && e.code == error.code));
        }
        prop_assert_eq!(report.errors_for_row(inserted_row).count(), 2);
        prop_assert_eq!(report.errors().len(), baseline.errors().len() + 2);
    }
}
