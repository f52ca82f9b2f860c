//! Hot-swappable scorer + threshold pair.

use super::{ModelMetadata, Scorer};
use arc_swap::ArcSwapOption;
use std::sync::Arc;
use tracing::info;

/// A scorer together with the metadata it was trained with.
pub struct LoadedModel {
    pub scorer: Box<dyn Scorer>,
    pub metadata: ModelMetadata,
    default_threshold: f64,
}

impl LoadedModel {
    pub fn new(scorer: Box<dyn Scorer>, metadata: ModelMetadata, default_threshold: f64) -> Self {
        Self {
            scorer,
            metadata,
            default_threshold,
        }
    }

    /// Metadata threshold, else the scorer's own offset, else the configured
    /// default.
    pub fn threshold(&self) -> f64 {
        self.metadata
            .threshold
            .or_else(|| self.scorer.offset())
            .unwrap_or(self.default_threshold)
    }
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("scorer", &self.scorer.name())
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// Shared, lock-free handle. Readers take a [`snapshot`](Self::snapshot) at
/// the start of a call and keep using it even if a reload happens meanwhile.
#[derive(Default)]
pub struct ScorerHandle {
    current: ArcSwapOption<LoadedModel>,
}

impl ScorerHandle {
    /// Empty handle: model unavailable.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_model(model: LoadedModel) -> Self {
        let handle = Self::empty();
        handle.install(model);
        handle
    }

    /// Atomically replace the current model.
    pub fn install(&self, model: LoadedModel) {
        info!(
            scorer = model.scorer.name(),
            threshold = model.threshold(),
            trained_at = ?model.metadata.trained_at,
            "scorer installed"
        );
        self.current.store(Some(Arc::new(model)));
    }

    pub fn clear(&self) {
        self.current.store(None);
    }

    pub fn snapshot(&self) -> Option<Arc<LoadedModel>> {
        self.current.load_full()
    }

    pub fn is_available(&self) -> bool {
        self.current.load().is_some()
    }
}
