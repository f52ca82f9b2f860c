//! Feature builder benchmark: a full-size batch through normalization,
//! aggregation and per-row features.

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ledger_anomaly::features::FeatureBuilder;
use ledger_anomaly::ingest::{validate_batch, RawTransaction};
use serde_json::{json, Value};

fn make_batch(n: usize) -> Vec<RawTransaction> {
    (0..n)
        .map(|i| {
            RawTransaction::new(
                format!("2024-{:02}-{:02}", i % 12 + 1, i % 28 + 1),
                (i % 997) as f64 * 3.5 + 10.0,
                format!("vendor_{}", i % 250),
                format!("dept_{}", i % 12),
            )
        })
        .collect()
}

fn make_payload(n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| {
            json!({
                "date": "2024-03-15T09:30:00Z",
                "amount": format!("{}.25", i % 5000),
                "vendor": format!("vendor_{}", i % 250),
                "department": if i % 50 == 0 { Value::Null } else { json!("Ops") },
            })
        })
        .collect()
}

fn bench_build_features(c: &mut Criterion) {
    let builder = FeatureBuilder::at(Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap());
    let rows = make_batch(10_000);

    c.bench_function("build_features_10k_rows", |b| {
        b.iter(|| black_box(builder.build(black_box(&rows))))
    });
}

fn bench_validate_and_build(c: &mut Criterion) {
    let builder = FeatureBuilder::at(Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap());
    let payload = make_payload(10_000);

    c.bench_function("validate_and_build_10k_rows", |b| {
        b.iter(|| {
            let raw = validate_batch(black_box(&payload), 10_000).unwrap();
            black_box(builder.build(&raw))
        })
    });
}

criterion_group!(benches, bench_build_features, bench_validate_and_build);
criterion_main!(benches);
