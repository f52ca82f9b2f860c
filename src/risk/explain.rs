//! Rule cascade that turns a flagged row into a short explanation.

use crate::features::FeatureVector;
use crate::ingest::RawTransaction;

const OUTLIER_RATIO: f64 = 5.0;
const OUTLIER_ZSCORE: f64 = 3.0;
/// At most this many matching rules make it into the reason.
const MAX_REASONS: usize = 2;

const FALLBACK: &str = "Model flagged this entry as unusual compared to prior transactions.";

/// Explanation for a flagged row. Rules are checked in fixed priority order
/// (vendor outlier, department outlier, global outlier, vendor novelty,
/// department novelty); the first two that match are joined with a space.
pub fn explain(raw: &RawTransaction, features: &FeatureVector) -> String {
    // Display names come from the raw row, not the feature sentinels.
    let vendor = display_name(raw.vendor.as_deref(), "this vendor");
    let department = display_name(raw.department.as_deref(), "this department");
    let amount = raw.amount.unwrap_or(features.amount);

    let mut reasons: Vec<String> = Vec::with_capacity(MAX_REASONS);

    if features.vendor_amount_ratio >= OUTLIER_RATIO && features.vendor_avg_amount > 0.0 {
        reasons.push(format!(
            "Amount {} is {:.1}× higher than {}'s usual spend (~{}).",
            format_amount(amount),
            features.vendor_amount_ratio,
            vendor,
            format_amount(features.vendor_avg_amount)
        ));
    }
    if features.dept_amount_ratio >= OUTLIER_RATIO && features.dept_avg_amount > 0.0 {
        reasons.push(format!(
            "Amount {} is {:.1}× the average for {} (~{}).",
            format_amount(amount),
            features.dept_amount_ratio,
            department,
            format_amount(features.dept_avg_amount)
        ));
    }
    if features.global_amount_zscore >= OUTLIER_ZSCORE {
        reasons.push(format!(
            "Value is {:.1} standard deviations above the dataset average.",
            features.global_amount_zscore
        ));
    }
    if features.vendor_txn_freq <= 1 {
        reasons.push(format!("First transaction recorded for {vendor} in this file."));
    }
    if features.dept_txn_freq <= 1 {
        reasons.push(format!(
            "{department} only appears once, so this entry has no comparable peers."
        ));
    }

    if reasons.is_empty() {
        return FALLBACK.to_string();
    }
    reasons.truncate(MAX_REASONS);
    reasons.join(" ")
}

fn display_name<'a>(raw: Option<&'a str>, fallback: &'a str) -> &'a str {
    match raw.map(str::trim) {
        Some(name) if !name.is_empty() => name,
        _ => fallback,
    }
}

/// Two decimals with thousands separators: `1234567.891` -> `"1,234,567.89"`.
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if value.is_sign_negative() { "-" } else { "" };
    format!("{sign}{}.{frac_part}", group_digits(int_part))
}

/// Insert a comma every three digits from the right.
pub(crate) fn group_digits(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
