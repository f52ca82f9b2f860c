//! Deterministic batch-relative feature engineering over raw transactions.

mod aggregates;
mod pipeline;

pub use aggregates::{BatchAggregates, GroupStats};
pub use pipeline::{build_features, FeatureBuilder};

use serde::{Deserialize, Serialize};

/// Numeric model inputs, in the order the scorer expects them.
pub const NUMERIC_FEATURES: [&str; 13] = [
    "amount",
    "log_amount",
    "day_of_week",
    "month",
    "is_month_end",
    "doc_age_days",
    "vendor_txn_freq",
    "dept_txn_freq",
    "vendor_avg_amount",
    "dept_avg_amount",
    "vendor_amount_ratio",
    "dept_amount_ratio",
    "global_amount_zscore",
];

pub const CATEGORICAL_FEATURES: [&str; 2] = ["vendor", "department"];

pub const UNKNOWN_VENDOR: &str = "Unknown Vendor";
pub const UNKNOWN_DEPARTMENT: &str = "Unknown Department";

/// Full canonical column list: numeric block, then categorical block.
pub fn feature_columns() -> Vec<&'static str> {
    NUMERIC_FEATURES
        .iter()
        .chain(CATEGORICAL_FEATURES.iter())
        .copied()
        .collect()
}

/// One derived record per raw transaction. Field order matches
/// [`NUMERIC_FEATURES`] followed by [`CATEGORICAL_FEATURES`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub amount: f64,
    pub log_amount: f64,
    /// Monday = 0; -1 when the date is unparseable.
    pub day_of_week: i32,
    /// 1..=12; 0 when the date is unparseable.
    pub month: u32,
    pub is_month_end: bool,
    pub doc_age_days: i64,
    pub vendor_txn_freq: usize,
    pub dept_txn_freq: usize,
    pub vendor_avg_amount: f64,
    pub dept_avg_amount: f64,
    pub vendor_amount_ratio: f64,
    pub dept_amount_ratio: f64,
    pub global_amount_zscore: f64,
    pub vendor: String,
    pub department: String,
}

impl FeatureVector {
    /// Numeric block as model input.
    pub fn numeric(&self) -> [f64; 13] {
        [
            self.amount,
            self.log_amount,
            f64::from(self.day_of_week),
            f64::from(self.month),
            if self.is_month_end { 1.0 } else { 0.0 },
            self.doc_age_days as f64,
            self.vendor_txn_freq as f64,
            self.dept_txn_freq as f64,
            self.vendor_avg_amount,
            self.dept_avg_amount,
            self.vendor_amount_ratio,
            self.dept_amount_ratio,
            self.global_amount_zscore,
        ]
    }

    pub fn categorical(&self) -> [&str; 2] {
        [&self.vendor, &self.department]
    }
}
