//! Caller-boundary validation: batch shape, size ceiling, required columns.
//! The feature builder assumes these checks already passed.

use super::RawTransaction;
use crate::error::PipelineError;
use serde_json::Value;

/// Keys every batch must carry (in at least one row). Values may still be
/// null or blank.
pub const REQUIRED_RAW_FIELDS: [&str; 4] = ["date", "amount", "vendor", "department"];

const EMPTY_BATCH: &str = "Provide a non-empty 'transactions' array.";

/// Pull the row list out of a request payload. Accepts the
/// `{"transactions": [...]}` envelope or a bare array.
pub fn extract_rows(payload: &Value) -> Result<&[Value], PipelineError> {
    let rows = match payload {
        Value::Array(rows) => rows,
        Value::Object(map) => match map.get("transactions") {
            Some(Value::Array(rows)) => rows,
            _ => return Err(PipelineError::InvalidShape(EMPTY_BATCH.to_string())),
        },
        _ => return Err(PipelineError::InvalidShape(EMPTY_BATCH.to_string())),
    };
    if rows.is_empty() {
        return Err(PipelineError::InvalidShape(EMPTY_BATCH.to_string()));
    }
    Ok(rows)
}

/// Check a row list against the boundary contract and convert it into typed
/// records, preserving order.
pub fn validate_batch(
    rows: &[Value],
    max_rows: usize,
) -> Result<Vec<RawTransaction>, PipelineError> {
    if rows.is_empty() {
        return Err(PipelineError::InvalidShape(EMPTY_BATCH.to_string()));
    }
    if rows.len() > max_rows {
        return Err(PipelineError::BatchTooLarge {
            rows: rows.len(),
            limit: max_rows,
        });
    }
    if let Some(index) = rows.iter().position(|r| !r.is_object()) {
        return Err(PipelineError::InvalidShape(format!(
            "Transaction at index {index} is not an object."
        )));
    }

    // Column-level check: a field is missing only if no row has the key.
    let missing: Vec<String> = REQUIRED_RAW_FIELDS
        .iter()
        .filter(|field| !rows.iter().any(|r| r.get(**field).is_some()))
        .map(|field| field.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::MissingFields(missing));
    }

    Ok(rows.iter().map(RawTransaction::from_json).collect())
}
