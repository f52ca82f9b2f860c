//! End-to-end scoring contract consumed by the HTTP layer: request shape
//! checks, feature building, classification, and the response payloads.

use crate::config::LimitsConfig;
use crate::error::PipelineError;
use crate::features::FeatureBuilder;
use crate::ingest::{extract_rows, validate_batch, REQUIRED_RAW_FIELDS};
use crate::model::{LoadedModel, ScorerHandle};
use crate::risk::{classify, ScoredResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, info_span, warn};
use uuid::Uuid;

const NOT_TRAINED: &str = "Isolation Forest model not trained yet.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResponse {
    pub results: Vec<ScoredResult>,
    pub threshold: f64,
    pub required_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaResponse {
    pub available: bool,
    pub required_fields: Vec<String>,
    /// Threshold recorded by the trainer, if any.
    pub threshold: Option<f64>,
    pub trained_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body returned alongside a non-2xx status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<&PipelineError> for ErrorResponse {
    fn from(e: &PipelineError) -> Self {
        Self { error: e.to_string() }
    }
}

fn required_fields() -> Vec<String> {
    REQUIRED_RAW_FIELDS.iter().map(|f| f.to_string()).collect()
}

pub struct ScoringService {
    handle: Arc<ScorerHandle>,
    limits: LimitsConfig,
    builder: FeatureBuilder,
}

impl ScoringService {
    pub fn new(handle: Arc<ScorerHandle>, limits: LimitsConfig) -> Self {
        Self {
            handle,
            limits,
            builder: FeatureBuilder::new(),
        }
    }

    /// Pin the feature builder's clock (reproducible `doc_age_days`).
    pub fn with_builder(mut self, builder: FeatureBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn handle(&self) -> &Arc<ScorerHandle> {
        &self.handle
    }

    /// Swap in a freshly loaded model. In-flight batches finish on the old one.
    pub fn reload(&self, model: Option<LoadedModel>) {
        match model {
            Some(model) => self.handle.install(model),
            None => {
                warn!("model reload produced no model; scoring disabled");
                self.handle.clear();
            }
        }
    }

    pub fn meta(&self) -> MetaResponse {
        let snapshot = self.handle.snapshot();
        let metadata = snapshot.as_ref().map(|m| &m.metadata);
        MetaResponse {
            available: snapshot.is_some(),
            required_fields: required_fields(),
            threshold: metadata.and_then(|m| m.threshold),
            trained_at: metadata.and_then(|m| m.trained_at.clone()),
            message: snapshot.is_none().then(|| NOT_TRAINED.to_string()),
        }
    }

    /// Score one request payload (`{"transactions": [...]}` or a bare array).
    pub fn score(&self, payload: &Value) -> Result<ScoreResponse, PipelineError> {
        let span = info_span!("score_batch", batch_id = %Uuid::new_v4());
        let _enter = span.enter();

        let result = self.score_inner(payload);
        match &result {
            Ok(response) => info!(
                rows = response.results.len(),
                flagged = response.results.iter().filter(|r| r.is_anomaly).count(),
                threshold = response.threshold,
                "batch scored"
            ),
            Err(e) => warn!(status = e.status_code(), error = %e, "batch rejected"),
        }
        result
    }

    fn score_inner(&self, payload: &Value) -> Result<ScoreResponse, PipelineError> {
        // One snapshot per call: a concurrent reload never changes the
        // scorer/threshold pair halfway through a batch.
        let model = self.handle.snapshot().ok_or(PipelineError::ModelUnavailable)?;

        let rows = extract_rows(payload)?;
        let raw = validate_batch(rows, self.limits.max_batch_rows)?;
        let features = self.builder.build(&raw);
        let threshold = model.threshold();
        let results = classify(&raw, &features, model.scorer.as_ref(), threshold)?;

        Ok(ScoreResponse {
            results,
            threshold,
            required_fields: required_fields(),
        })
    }
}
