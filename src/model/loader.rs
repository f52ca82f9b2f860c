//! Builds a [`LoadedModel`] from configuration at startup or on reload.

use super::{LoadedModel, ModelMetadata, OnnxScorer};
use crate::config::AppConfig;
use tracing::{info, warn};

pub struct ModelLoader<'a> {
    config: &'a AppConfig,
}

impl<'a> ModelLoader<'a> {
    pub fn new(config: &'a AppConfig) -> Self {
        Self { config }
    }

    /// `Ok(None)` when no model file exists yet (model unavailable).
    pub fn load(&self) -> Result<Option<LoadedModel>, Box<dyn std::error::Error + Send + Sync>> {
        let model_path = &self.config.model_path;
        if !model_path.exists() {
            warn!(path = %model_path.display(), "anomaly model not found; scoring disabled");
            return Ok(None);
        }

        let metadata = ModelMetadata::load(&self.config.metadata_path)?;
        let scorer = OnnxScorer::load(model_path, self.config.onnx.intra_threads)?
            .with_fallback_offset(metadata.offset);
        info!(
            path = %model_path.display(),
            trained_at = ?metadata.trained_at,
            "anomaly model ready"
        );
        Ok(Some(LoadedModel::new(
            Box::new(scorer),
            metadata,
            self.config.scoring.default_threshold,
        )))
    }
}
