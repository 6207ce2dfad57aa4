//! Benchmarks for the codec and the import pipeline.
//!
//! Benchmark targets:
//! - 1,000 rows: <5ms to encode, decode or import
//! - 10,000 rows: <50ms
//!
//! These benchmarks cover:
//! - Encoding rows with quoting
//! - Decoding with the strict tokenizer
//! - Full import of a builtin profile (coercion and rules)

// Criterion macros generate items without docs - this is expected for benchmarks
// Benchmarks use expect/unwrap for simplicity - panics are acceptable in benchmarks
#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use bulkport::io::codec::{decode_csv, encode_csv};
use bulkport::profiles;
use bulkport::{Record, Value};
use chrono::NaiveDate;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

// ============================================================================
// Helper Functions
// ============================================================================

/// Builds rows that exercise quoting: commas, quotes and line breaks.
fn sample_rows(count: usize) -> Vec<Vec<String>> {
    (0..count)
        .map(|i| {
            vec![
                format!("ID-{i:06}"),
                format!("Name {i}, \"quoted\""),
                if i % 10 == 0 {
                    "two\nlines".to_string()
                } else {
                    "plain".to_string()
                },
                i.to_string(),
            ]
        })
        .collect()
}

/// Builds valid incident records.
fn sample_incidents(count: usize) -> Vec<Record> {
    let opened = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    (0..count)
        .map(|i| {
            Record::new()
                .with("number", format!("INC{i:07}"))
                .with("title", format!("Service degraded #{i}"))
                .with("priority", Value::enumeration("P2"))
                .with("state", Value::enumeration("New"))
                .with("assignee", "ops")
                .with("opened_on", opened)
                .with("impacted_users", i64::try_from(i).unwrap())
        })
        .collect()
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    for size in [1_000, 10_000] {
        let rows = sample_rows(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &rows, |b, rows| {
            b.iter(|| encode_csv(&["id", "name", "note", "n"], black_box(rows), true).unwrap());
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for size in [1_000, 10_000] {
        let document = encode_csv(&["id", "name", "note", "n"], &sample_rows(size), true).unwrap();
        group.throughput(Throughput::Bytes(document.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &document, |b, doc| {
            b.iter(|| decode_csv(black_box(doc)).unwrap());
        });
    }
    group.finish();
}

fn bench_import(c: &mut Criterion) {
    let profile = profiles::builtin("incident").unwrap();
    let mut group = c.benchmark_group("import_incident");
    for size in [1_000, 10_000] {
        let document = profile.export(&sample_incidents(size)).unwrap();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &document, |b, doc| {
            b.iter(|| {
                let report = profile.import(black_box(doc));
                assert!(report.succeeded());
                report
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_import);
criterion_main!(benches);
