//! Ledger Anomaly: batch feature engineering, anomaly scoring and
//! explanations for financial transaction ledgers.
//!
//! Modular structure:
//! - [`ingest`]: Raw transaction records and batch boundary checks
//! - [`features`]: Deterministic batch-relative feature builder
//! - [`model`]: Scorer trait, hot-swappable handle, ONNX scorer, metadata
//! - [`risk`]: Threshold classification and explanation rules
//! - [`service`]: End-to-end score/meta contract for the HTTP layer
//! - [`logging`]: Structured logging

pub mod config;
pub mod error;
pub mod features;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod risk;
pub mod service;

pub use config::AppConfig;
pub use error::{PipelineError, ScoringError};
pub use features::{build_features, FeatureBuilder, FeatureVector};
pub use ingest::RawTransaction;
pub use model::{LoadedModel, ModelLoader, ModelMetadata, OnnxScorer, Scorer, ScorerHandle};
pub use risk::{classify, explain, AnomalyClassifier, ScoredResult};
pub use service::{MetaResponse, ScoreResponse, ScoringService};
pub use logging::StructuredLogger;
