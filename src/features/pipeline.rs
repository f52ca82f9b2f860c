//! Feature builder: raw batch -> batch aggregates -> one vector per row.

use super::aggregates::{safe_ratio, BatchAggregates};
use super::{FeatureVector, UNKNOWN_DEPARTMENT, UNKNOWN_VENDOR};
use crate::ingest::{parse_timestamp, RawTransaction};
use chrono::{DateTime, Datelike, Utc};
use tracing::debug;

/// Stateless apart from its clock. `doc_age_days` is the only feature that
/// depends on "now"; pin it with [`FeatureBuilder::at`] for reproducible output.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureBuilder {
    now: Option<DateTime<Utc>>,
}

impl FeatureBuilder {
    /// Builder that reads the wall clock once per batch.
    pub fn new() -> Self {
        Self { now: None }
    }

    /// Builder with a fixed "now".
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now: Some(now) }
    }

    pub fn build(&self, rows: &[RawTransaction]) -> Vec<FeatureVector> {
        build_features(rows, self.now.unwrap_or_else(Utc::now))
    }
}

struct Normalized<'a> {
    amount: f64,
    date: Option<DateTime<Utc>>,
    vendor: &'a str,
    department: &'a str,
}

/// Output has the same length and order as `rows`.
pub fn build_features(rows: &[RawTransaction], now: DateTime<Utc>) -> Vec<FeatureVector> {
    let normalized: Vec<Normalized<'_>> = rows
        .iter()
        .enumerate()
        .map(|(index, raw)| normalize(index, raw))
        .collect();

    let aggregates = BatchAggregates::from_rows(
        normalized
            .iter()
            .map(|n| (n.vendor, n.department, n.amount)),
    );

    let today = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(now);

    normalized
        .iter()
        .map(|n| {
            let vendor = aggregates.vendor(n.vendor);
            let dept = aggregates.department(n.department);
            let vendor_avg = vendor.mean();
            let dept_avg = dept.mean();
            let (day_of_week, month, is_month_end, doc_age_days) = match n.date {
                Some(date) => (
                    date.weekday().num_days_from_monday() as i32,
                    date.month(),
                    is_month_end(date),
                    (today - date).num_days().max(0),
                ),
                None => (-1, 0, false, 0),
            };

            FeatureVector {
                amount: n.amount,
                log_amount: n.amount.max(0.0).ln_1p(),
                day_of_week,
                month,
                is_month_end,
                doc_age_days,
                vendor_txn_freq: vendor.count,
                dept_txn_freq: dept.count,
                vendor_avg_amount: vendor_avg,
                dept_avg_amount: dept_avg,
                vendor_amount_ratio: safe_ratio(n.amount, vendor_avg),
                dept_amount_ratio: safe_ratio(n.amount, dept_avg),
                global_amount_zscore: aggregates.zscore(n.amount),
                vendor: n.vendor.to_string(),
                department: n.department.to_string(),
            }
        })
        .collect()
}

fn normalize(index: usize, raw: &RawTransaction) -> Normalized<'_> {
    let amount = raw.amount.filter(|a| a.is_finite()).unwrap_or_else(|| {
        debug!(row = index, "amount missing or not finite; using 0.0");
        0.0
    });
    let date = raw.date.as_deref().and_then(|text| {
        let parsed = parse_timestamp(text);
        if parsed.is_none() {
            debug!(row = index, date = %text, "unparseable date; using neutral date features");
        }
        parsed
    });
    Normalized {
        amount,
        date,
        vendor: raw.vendor.as_deref().unwrap_or(UNKNOWN_VENDOR),
        department: raw.department.as_deref().unwrap_or(UNKNOWN_DEPARTMENT),
    }
}

fn is_month_end(date: DateTime<Utc>) -> bool {
    date.date_naive()
        .succ_opt()
        .map_or(true, |next| next.month() != date.month())
}
