//! The external anomaly scorer and everything needed to hand it to the
//! pipeline: the [`Scorer`] trait, trained-model metadata, and a handle that
//! can be reloaded while requests are in flight.

mod handle;
mod loader;
mod metadata;
mod onnx;

pub use handle::{LoadedModel, ScorerHandle};
pub use loader::ModelLoader;
pub use metadata::ModelMetadata;
pub use onnx::OnnxScorer;

use crate::error::ScoringError;
use crate::features::FeatureVector;

/// Batch anomaly scorer. Lower scores are more anomalous.
///
/// Implementations return exactly one score per input row, in input order,
/// and must be safe to call from several threads at once.
pub trait Scorer: Send + Sync {
    fn score(&self, features: &[FeatureVector]) -> Result<Vec<f64>, ScoringError>;

    /// Short identifier for logs.
    fn name(&self) -> &str;

    /// Decision offset baked into the model, if it carries one. Used as the
    /// threshold when the metadata sidecar has none.
    fn offset(&self) -> Option<f64> {
        None
    }
}
