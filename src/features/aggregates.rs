//! Batch-wide statistics: per-vendor and per-department groups, plus the
//! global amount distribution.

use std::collections::HashMap;

/// Population stddev at or below this is treated as 1.0.
const MIN_STDDEV: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroupStats {
    pub count: usize,
    pub sum: f64,
}

impl GroupStats {
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchAggregates {
    pub vendors: HashMap<String, GroupStats>,
    pub departments: HashMap<String, GroupStats>,
    pub mean: f64,
    /// Population (N-denominator) standard deviation of amount.
    pub stddev: f64,
}

impl BatchAggregates {
    /// `rows` are (normalized vendor, normalized department, amount).
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = (&'a str, &'a str, f64)>) -> Self {
        let mut agg = BatchAggregates::default();
        let mut amounts: Vec<f64> = Vec::new();

        for (vendor, department, amount) in rows {
            let v = agg.vendors.entry(vendor.to_string()).or_default();
            v.count += 1;
            v.sum += amount;
            let d = agg.departments.entry(department.to_string()).or_default();
            d.count += 1;
            d.sum += amount;
            amounts.push(amount);
        }

        if amounts.is_empty() {
            return agg;
        }

        let first = amounts[0];
        if amounts.iter().all(|&a| a == first) {
            // Exact mean, so every deviation is exactly zero.
            agg.mean = first;
            agg.stddev = 0.0;
            return agg;
        }

        let n = amounts.len() as f64;
        agg.mean = amounts.iter().sum::<f64>() / n;
        let variance = amounts.iter().map(|a| (a - agg.mean).powi(2)).sum::<f64>() / n;
        agg.stddev = variance.sqrt();
        agg
    }

    pub fn vendor(&self, vendor: &str) -> GroupStats {
        self.vendors.get(vendor).copied().unwrap_or_default()
    }

    pub fn department(&self, department: &str) -> GroupStats {
        self.departments.get(department).copied().unwrap_or_default()
    }

    pub fn zscore(&self, amount: f64) -> f64 {
        let denom = if self.stddev > MIN_STDDEV { self.stddev } else { 1.0 };
        let z = (amount - self.mean) / denom;
        if z.is_finite() {
            z
        } else {
            0.0
        }
    }
}

/// `numerator / denominator`, or 0.0 when the denominator is zero or the
/// result is not finite.
pub(crate) fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    let ratio = numerator / denominator;
    if ratio.is_finite() {
        ratio
    } else {
        0.0
    }
}
