//! Classification benchmark: threshold and explanation rules over a scored
//! batch. The scorer is a stand-in so the numbers exclude model inference.

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ledger_anomaly::error::ScoringError;
use ledger_anomaly::features::{build_features, FeatureVector};
use ledger_anomaly::ingest::RawTransaction;
use ledger_anomaly::model::Scorer;
use ledger_anomaly::risk::classify;

/// Flags large vendor outliers, roughly like a trained forest would.
struct RatioScorer;

impl Scorer for RatioScorer {
    fn score(&self, features: &[FeatureVector]) -> Result<Vec<f64>, ScoringError> {
        Ok(features.iter().map(|f| 1.0 - f.vendor_amount_ratio).collect())
    }
    fn name(&self) -> &str {
        "ratio"
    }
}

fn make_batch(n: usize) -> Vec<RawTransaction> {
    (0..n)
        .map(|i| {
            let amount = if i % 100 == 0 { 50_000.0 } else { 120.0 + (i % 40) as f64 };
            RawTransaction::new("2024-06-30", amount, format!("vendor_{}", i % 40), "Finance")
        })
        .collect()
}

fn bench_classify(c: &mut Criterion) {
    let raw = make_batch(10_000);
    let features = build_features(&raw, Utc::now());

    c.bench_function("classify_10k_rows", |b| {
        b.iter(|| black_box(classify(&raw, black_box(&features), &RatioScorer, 0.0).unwrap()))
    });
}

criterion_group!(benches, bench_classify);
criterion_main!(benches);
