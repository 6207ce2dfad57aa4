//! Integration tests for bulkport.
//!
//! Exercises the public API end to end: export, import, form validation,
//! configuration and the builtin entity profiles.
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::too_many_lines,
    clippy::cast_precision_loss
)]

use bulkport::config::{ExchangeConfig, RowShapePolicy};
use bulkport::io::codec::LineTerminator;
use bulkport::models::{
    CandidateRecord, ColumnSpec, Comparison, Constraint, DocumentError, ErrorCode, HeaderSchema,
    Record, RuleKind, RuleSet, ROW_FIELD,
};
use bulkport::profiles::{self, EntityProfile};
use bulkport::{Error, ExportService, ImportService, Value};
use chrono::NaiveDate;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn people_schema() -> HeaderSchema {
    HeaderSchema::new(vec![
        ColumnSpec::text("name", "name"),
        ColumnSpec::integer("age", "age"),
    ])
    .unwrap()
}

#[test]
fn test_error_types() {
    let err = Error::InvalidRule("invalid pattern '['".to_string());
    assert!(err.to_string().contains("invalid rule"));

    let err = Error::OperationFailed {
        operation: "read_import_file".to_string(),
        cause: "file not found".to_string(),
    };
    let display = err.to_string();
    assert!(display.contains("read_import_file"));
    assert!(display.contains("file not found"));
}

#[test]
fn test_import_happy_path_with_row_error() {
    let rules = RuleSet::new()
        .required("name")
        .rule("age", Constraint::MinValue(0.0));

    let report = bulkport::import_document("name,age\nAda,36\n,5\n", &people_schema(), &rules);

    assert!(!report.succeeded());
    assert_eq!(report.candidates().len(), 2);
    assert_eq!(report.candidates()[0].get("name"), Some(&Value::text("Ada")));
    assert_eq!(report.candidates()[0].get("age"), Some(&Value::Integer(36)));
    assert_eq!(report.candidates()[1].get("name"), None);

    assert_eq!(report.errors().len(), 1);
    let error = &report.errors()[0];
    assert_eq!(error.row, 3);
    assert_eq!(error.field, "name");
    assert_eq!(error.rule_kind, RuleKind::Required);
    assert_eq!(error.code, ErrorCode::Required);

    let accepted: Vec<usize> = report.accepted().map(CandidateRecord::source_row).collect();
    assert_eq!(accepted, vec![2]);
}

#[test]
fn test_import_header_mismatch_rejects_document() {
    let report = bulkport::import_document("nom,age\nAda,36\n", &people_schema(), &RuleSet::new());

    assert!(!report.succeeded());
    assert!(report.candidates().is_empty());
    assert!(report.errors().is_empty());
    assert_eq!(
        report.document_error(),
        Some(&DocumentError::HeaderMismatch {
            position: 1,
            expected: "name".to_string(),
            found: "nom".to_string(),
        })
    );
}

#[test]
fn test_export_import_round_trip_fifty_records() {
    let schema = HeaderSchema::new(vec![
        ColumnSpec::text("id", "ID"),
        ColumnSpec::text("note", "Note"),
        ColumnSpec::decimal("amount", "Amount"),
        ColumnSpec::boolean("flag", "Flag"),
        ColumnSpec::date("due", "Due"),
        ColumnSpec::enumeration("tier", "Tier", ["gold", "silver"]),
    ])
    .unwrap();

    let records: Vec<Record> = (0..50_i64)
        .map(|i| {
            let mut record = Record::new()
                .with("id", format!("R-{i:03}"))
                .with("note", format!("line one, \"{i}\"\nline two ✓"))
                .with("flag", i % 2 == 0)
                .with("due", date(2024, 1, 1) + chrono::Days::new(i.unsigned_abs()));
            record.set(
                "amount",
                (i % 3 != 0).then(|| Value::Decimal(i as f64 * 1.25)),
            );
            record.set(
                "tier",
                Some(Value::enumeration(if i < 25 { "gold" } else { "silver" })),
            );
            record
        })
        .collect();

    let document = bulkport::export_records(&records, &schema).unwrap();
    let report = bulkport::import_document(&document, &schema, &RuleSet::new());

    assert!(report.succeeded());
    let imported: Vec<Record> = report
        .into_candidates()
        .into_iter()
        .map(CandidateRecord::into_record)
        .collect();
    assert_eq!(imported.len(), 50);
    for (original, back) in records.iter().zip(&imported) {
        for column in schema.columns() {
            assert_eq!(original.get(&column.key), back.get(&column.key));
        }
    }
}

#[test]
fn test_record_with_every_field_absent_round_trips() {
    let schema = HeaderSchema::new(vec![
        ColumnSpec::text("id", "ID"),
        ColumnSpec::integer("qty", "Qty"),
        ColumnSpec::date("due", "Due"),
    ])
    .unwrap();
    let records = vec![
        Record::new()
            .with("id", "A")
            .with("qty", 1_i64)
            .with("due", date(2024, 3, 1)),
        Record::new()
            .with_absent("id")
            .with_absent("qty")
            .with_absent("due"),
        Record::new().with("id", "B").with_absent("qty").with_absent("due"),
    ];

    let document = bulkport::export_records(&records, &schema).unwrap();
    assert_eq!(document, "ID,Qty,Due\nA,1,2024-03-01\n,,\nB,,\n");

    for skip_blank_rows in [false, true] {
        let config = ExchangeConfig::default().with_skip_blank_rows(skip_blank_rows);
        let report = ImportService::new(config).import_document(&document, &schema, &RuleSet::new());
        assert!(report.succeeded());
        let rows: Vec<usize> = report.candidates().iter().map(CandidateRecord::source_row).collect();
        assert_eq!(rows, vec![2, 3, 4]);
        let imported: Vec<Record> = report
            .into_candidates()
            .into_iter()
            .map(CandidateRecord::into_record)
            .collect();
        assert_eq!(imported, records);
    }
}

#[test]
fn test_single_column_empty_cell_round_trips() {
    let schema = HeaderSchema::new(vec![ColumnSpec::text("note", "Note")]).unwrap();
    let records = vec![
        Record::new().with("note", "x"),
        Record::new().with_absent("note"),
    ];

    let document = bulkport::export_records(&records, &schema).unwrap();
    assert_eq!(document, "Note\nx\n\"\"\n");

    let config = ExchangeConfig::default().with_skip_blank_rows(true);
    let report = ImportService::new(config).import_document(&document, &schema, &RuleSet::new());
    assert!(report.succeeded());
    assert_eq!(report.candidates().len(), 2);
    assert_eq!(report.candidates()[1].get("note"), None);
}

#[test]
fn test_blank_row_reports_each_required_field_once() {
    let schema = HeaderSchema::new(vec![
        ColumnSpec::text("id", "ID"),
        ColumnSpec::integer("qty", "Qty"),
        ColumnSpec::text("note", "Note"),
    ])
    .unwrap();
    let rules = RuleSet::new()
        .required("id")
        .rule("id", Constraint::MinLength(2))
        .required("qty")
        .rule("qty", Constraint::MinValue(1.0));

    let report = bulkport::import_document("ID,Qty,Note\nAB,2,ok\n,,\n", &schema, &rules);

    assert_eq!(report.candidates().len(), 2);
    assert_eq!(report.errors_for_row(2).count(), 0);
    let errors: Vec<(&str, ErrorCode)> = report
        .errors_for_row(3)
        .map(|e| (e.field.as_str(), e.code))
        .collect();
    assert_eq!(
        errors,
        vec![("id", ErrorCode::Required), ("qty", ErrorCode::Required)]
    );
    let accepted: Vec<usize> = report.accepted().map(CandidateRecord::source_row).collect();
    assert_eq!(accepted, vec![2]);
}

#[test]
fn test_every_violated_field_is_reported() {
    let schema = HeaderSchema::new(vec![
        ColumnSpec::text("email", "Email"),
        ColumnSpec::integer("age", "Age"),
    ])
    .unwrap();
    let rules = RuleSet::new()
        .rule("email", Constraint::pattern("[^@]+@[^@]+").unwrap())
        .rule("age", Constraint::MaxValue(120.0));

    let report = bulkport::import_document("Email,Age\nnot-an-email,130\n", &schema, &rules);

    let fields: Vec<&str> = report.errors().iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["email", "age"]);
    assert_eq!(report.errors()[0].code, ErrorCode::PatternMismatch);
    assert_eq!(report.errors()[1].code, ErrorCode::AboveMaximum);
}

#[test]
fn test_required_distinguishes_absent_from_blank() {
    let rules = RuleSet::new()
        .required("name")
        .rule("name", Constraint::MinLength(3));

    let absent = bulkport::validate_form(&Record::new(), &rules);
    assert_eq!(absent.errors.len(), 1);
    assert_eq!(absent.errors[0].code, ErrorCode::Required);

    let blank = bulkport::validate_form(&Record::new().with("name", "   "), &rules);
    assert!(!blank.is_valid);
    assert_eq!(blank.errors_for("name").next().unwrap().code, ErrorCode::Required);

    let short = bulkport::validate_form(&Record::new().with("name", "Al"), &rules);
    assert_eq!(short.errors.len(), 1);
    assert_eq!(short.errors[0].code, ErrorCode::TooShort);
    assert_eq!(short.errors[0].row, 0);

    // Optional fields with no value are not checked by other rules
    let optional = RuleSet::new().rule("nickname", Constraint::MinLength(3));
    assert!(bulkport::validate_form(&Record::new().with_absent("nickname"), &optional).is_valid);
}

#[test]
fn test_pad_policy_from_toml() {
    let config = ExchangeConfig::from_toml_str(
        r#"
row_shape = "pad"
skip_blank_rows = true
"#,
    )
    .unwrap();
    assert_eq!(config.row_shape, RowShapePolicy::Pad);

    let service = ImportService::new(config);
    let report = service.import_document(
        "name,age\nAda\nBob,40,extra\n\nCy,9\n",
        &people_schema(),
        &RuleSet::new(),
    );

    assert!(report.document_error().is_none());
    let rows: Vec<usize> = report.candidates().iter().map(CandidateRecord::source_row).collect();
    assert_eq!(rows, vec![2, 3, 5]);

    let mismatches: Vec<usize> = report
        .errors()
        .iter()
        .filter(|e| e.field == ROW_FIELD)
        .map(|e| e.row)
        .collect();
    assert_eq!(mismatches, vec![2, 3]);
    assert!(report.errors().iter().all(|e| e.code == ErrorCode::CellCountMismatch));
    assert_eq!(report.candidates()[1].get("age"), Some(&Value::Integer(40)));
}

#[test]
fn test_strict_policy_rejects_ragged_rows() {
    let report =
        bulkport::import_document("name,age\nAda,36\nBob\n", &people_schema(), &RuleSet::new());
    assert_eq!(
        report.document_error(),
        Some(&DocumentError::RaggedRow {
            row: 3,
            expected: 2,
            found: 1,
        })
    );
    assert!(report.candidates().is_empty());
}

#[test]
fn test_import_crlf_and_bom() {
    let document = "\u{feff}name,age\r\n\"Lovelace, Ada\",36\r\n\"multi\r\nline\",7\r\n";
    let report = bulkport::import_document(document, &people_schema(), &RuleSet::new());

    assert!(report.succeeded(), "{:?}", report.document_error());
    assert_eq!(
        report.candidates()[0].get("name"),
        Some(&Value::text("Lovelace, Ada"))
    );
    assert_eq!(
        report.candidates()[1].get("name"),
        Some(&Value::text("multi\r\nline"))
    );
}

#[test]
fn test_export_with_crlf_and_bom() {
    let config = ExchangeConfig::default()
        .with_line_terminator(LineTerminator::Crlf)
        .with_byte_order_mark(true);
    let records = vec![Record::new().with("name", "Ada").with("age", 36_i64)];

    let document = ExportService::new(config.clone())
        .export_records(&records, &people_schema())
        .unwrap();
    assert_eq!(document, "\u{feff}name,age\r\nAda,36\r\n");

    let report = ImportService::new(config).import_document(&document, &people_schema(), &RuleSet::new());
    assert!(report.succeeded());
}

#[test]
fn test_malformed_document_reports_line() {
    let report = bulkport::import_document(
        "name,age\nAda,36\n\"Bob,40\n",
        &people_schema(),
        &RuleSet::new(),
    );
    match report.document_error() {
        Some(DocumentError::Malformed(err)) => assert_eq!(err.line, 3),
        other => panic!("expected malformed document, got {other:?}"),
    }
}

#[test]
fn test_coercion_failure_reports_and_skips_rules() {
    let rules = RuleSet::new()
        .required("age")
        .rule("age", Constraint::MinValue(18.0));
    let report = bulkport::import_document("name,age\nAda,forty\n", &people_schema(), &rules);

    // The rejected cell is absent: Required fires, MinValue does not
    let codes: Vec<ErrorCode> = report.errors().iter().map(|e| e.code).collect();
    assert_eq!(codes, vec![ErrorCode::InvalidInteger, ErrorCode::Required]);
    assert!(report.errors().iter().all(|e| e.field == "age"));
    assert!(report.candidates()[0].is_rejected("age"));
    assert!(!report.candidates()[0].record().contains_key("age"));
}

#[test]
fn test_report_serializes_to_json() {
    let rules = RuleSet::new().rule("age", Constraint::MinValue(0.0));
    let report = bulkport::import_document("name,age\nAda,-1\n", &people_schema(), &rules);

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["errors"][0]["row"], 2);
    assert_eq!(json["errors"][0]["field"], "age");
    assert_eq!(json["errors"][0]["code"], "below_minimum");
    assert_eq!(json["candidates"][0]["source_row"], 2);
    assert!(json.get("document_error").is_none());

    let rejected = bulkport::import_document("", &people_schema(), &rules);
    let json: serde_json::Value = serde_json::from_str(&rejected.to_json().unwrap()).unwrap();
    assert_eq!(json["document_error"]["type"], "empty");
}

#[test]
fn test_import_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.csv");
    std::fs::write(&path, "name,age\nAda,36\n").unwrap();

    let report = ImportService::default()
        .import_file(&path, &people_schema(), &RuleSet::new())
        .unwrap();
    assert!(report.succeeded());

    let missing = ImportService::default().import_file(
        &dir.path().join("missing.csv"),
        &people_schema(),
        &RuleSet::new(),
    );
    assert!(matches!(missing, Err(Error::OperationFailed { .. })));
}

#[test]
fn test_builtin_profiles_load() {
    let names = profiles::builtin_names();
    for expected in ["asset", "incident", "sla", "vulnerability"] {
        assert!(names.contains(&expected), "missing builtin {expected}");
        let profile = profiles::builtin(expected).unwrap();
        assert_eq!(profile.name(), expected);
        assert!(!profile.schema().is_empty());
    }
    assert!(matches!(profiles::builtin("ticket"), Err(Error::InvalidProfile(_))));
}

#[test]
fn test_incident_profile_import() {
    let profile = profiles::builtin("incident").unwrap();
    let header: Vec<&str> = profile.schema().labels().collect();
    let document = format!(
        "{}\n{}\n{}\n",
        header.join(","),
        "INC000123,Mail outage,P1,New,jo,2024-05-02,2024-05-03,40",
        "INC12,Bad,P9,New,,2024-05-02,2024-05-01,-3",
    );

    let report = profile.import(&document);
    assert!(!report.succeeded());
    assert_eq!(report.errors_for_row(2).count(), 0);

    let codes: Vec<ErrorCode> = report.errors_for_row(3).map(|e| e.code).collect();
    assert_eq!(
        codes,
        vec![
            ErrorCode::PatternMismatch,
            ErrorCode::TooShort,
            ErrorCode::InvalidEnum,
            ErrorCode::Required,
            ErrorCode::ComparisonFailed,
            ErrorCode::BelowMinimum,
        ]
    );
}

#[test]
fn test_custom_profile_with_reference_values() {
    let schema = HeaderSchema::new(vec![
        ColumnSpec::text("asset", "Asset"),
        ColumnSpec::date("from", "From"),
        ColumnSpec::date("to", "To"),
    ])
    .unwrap();
    let rules = RuleSet::new()
        .required("asset")
        .rule("to", Constraint::cross_field("from", Comparison::GreaterThan));
    let profile = EntityProfile::new("lease", schema, rules)
        .unwrap()
        .with_reference_values("asset", ["LAP-001", "LAP-002"])
        .unwrap();

    let form = profile.validate_form(
        &Record::new()
            .with("asset", "LAP-009")
            .with("from", date(2024, 1, 2))
            .with("to", date(2024, 1, 1)),
    );
    let codes: Vec<ErrorCode> = form.errors.iter().map(|e| e.code).collect();
    assert_eq!(codes, vec![ErrorCode::NotAllowed, ErrorCode::ComparisonFailed]);

    assert!(matches!(
        profile.clone().with_reference_values("owner", ["x"]),
        Err(Error::InvalidProfile(_))
    ));
}
