//! Batch-level error taxonomy. Row-level defects never surface here; they
//! degrade to neutral feature values instead.

use thiserror::Error;

/// Failure reported by a [`crate::model::Scorer`].
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("scorer returned {got} scores for {expected} rows")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("scorer returned a non-finite score at row {index}")]
    NonFinite { index: usize },

    #[error("scoring backend failed: {0}")]
    Backend(String),

    #[error("model inputs do not match the feature layout: {0}")]
    InputLayout(String),
}

/// Batch-level failure. Any of these aborts the whole batch; no partial
/// results are ever returned.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Anomaly model unavailable")]
    ModelUnavailable,

    #[error("{0}")]
    InvalidShape(String),

    #[error("Batch size limit exceeded. Maximum {} transactions per request.", rows_limit(.limit))]
    BatchTooLarge { rows: usize, limit: usize },

    #[error("Missing fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("Scoring failed")]
    Scoring(#[from] ScoringError),
}

impl PipelineError {
    /// HTTP-equivalent status for the layer that exposes the pipeline.
    pub fn status_code(&self) -> u16 {
        match self {
            PipelineError::ModelUnavailable => 503,
            PipelineError::InvalidShape(_)
            | PipelineError::BatchTooLarge { .. }
            | PipelineError::MissingFields(_) => 400,
            PipelineError::Scoring(_) => 500,
        }
    }
}

fn rows_limit(limit: &usize) -> String {
    crate::risk::group_digits(&limit.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_boundary_contract() {
        let e = PipelineError::BatchTooLarge { rows: 10_001, limit: 10_000 };
        assert_eq!(
            e.to_string(),
            "Batch size limit exceeded. Maximum 10,000 transactions per request."
        );
        let e = PipelineError::MissingFields(vec!["date".into(), "vendor".into()]);
        assert_eq!(e.to_string(), "Missing fields: date, vendor");
        let e = PipelineError::from(ScoringError::ShapeMismatch { expected: 3, got: 2 });
        assert_eq!(e.to_string(), "Scoring failed");
    }

    #[test]
    fn status_codes() {
        assert_eq!(PipelineError::ModelUnavailable.status_code(), 503);
        assert_eq!(PipelineError::InvalidShape("x".into()).status_code(), 400);
        assert_eq!(
            PipelineError::Scoring(ScoringError::Backend("boom".into())).status_code(),
            500
        );
    }
}
