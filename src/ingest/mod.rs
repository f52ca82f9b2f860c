//! Raw transaction records as submitted by the caller, plus the boundary
//! checks a batch must pass before it reaches the feature builder.

mod batch;
mod parse;

pub use batch::{extract_rows, validate_batch, REQUIRED_RAW_FIELDS};
pub use parse::{parse_amount, parse_text, parse_timestamp};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One input record. Every field is optional: a missing or malformed value is
/// a modeled state, not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    /// Timestamp text exactly as submitted; parsed later by the feature builder.
    pub date: Option<String>,
    /// `None` when absent, null, or not numerically parseable.
    pub amount: Option<f64>,
    pub vendor: Option<String>,
    pub department: Option<String>,
}

impl RawTransaction {
    pub fn new(
        date: impl Into<String>,
        amount: f64,
        vendor: impl Into<String>,
        department: impl Into<String>,
    ) -> Self {
        Self {
            date: Some(date.into()),
            amount: Some(amount),
            vendor: Some(vendor.into()),
            department: Some(department.into()),
        }
    }

    /// Build from one element of the caller's batch. Never fails: anything
    /// that is not an object yields an all-absent record.
    pub fn from_json(row: &Value) -> Self {
        let field = |name: &str| row.get(name).unwrap_or(&Value::Null);
        Self {
            date: parse_text(field("date")),
            amount: parse_amount(field("amount")),
            vendor: parse_text(field("vendor")),
            department: parse_text(field("department")),
        }
    }
}
