//! JSON sidecar written by the trainer next to the model file.

use crate::features::feature_columns;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    #[serde(default)]
    pub threshold: Option<f64>,
    /// Decision offset of the trained forest, for models whose graph does
    /// not carry one.
    #[serde(default)]
    pub offset: Option<f64>,
    #[serde(default)]
    pub trained_at: Option<String>,
    #[serde(default)]
    pub dataset: Option<String>,
    #[serde(default)]
    pub contamination: Option<f64>,
    #[serde(default)]
    pub features: Option<Vec<String>>,
    #[serde(default)]
    pub training_rows: Option<u64>,
    #[serde(default)]
    pub validation_rows: Option<u64>,
    #[serde(default)]
    pub validation_anomalies: Option<u64>,
}

impl ModelMetadata {
    /// Read the sidecar. A missing file is not an error (empty metadata).
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        let meta: ModelMetadata = serde_json::from_str(&data)?;
        if !meta.features_match() {
            warn!(
                path = %path.display(),
                trained = ?meta.features,
                "model was trained on a different feature layout"
            );
        }
        Ok(meta)
    }

    /// True when no feature list was recorded or it equals the canonical one.
    pub fn features_match(&self) -> bool {
        match &self.features {
            None => true,
            Some(trained) => trained.iter().map(String::as_str).eq(feature_columns()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty_metadata() {
        let meta = ModelMetadata::load(Path::new("nonexistent.json")).unwrap();
        assert_eq!(meta, ModelMetadata::default());
    }

    #[test]
    fn parses_trainer_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("isolation_forest.json");
        std::fs::write(
            &path,
            r#"{"trained_at": "2024-05-01T10:00:00", "threshold": -0.0123,
                "contamination": 0.03, "training_rows": 800, "offset": -0.5, "extra": true}"#,
        )
        .unwrap();
        let meta = ModelMetadata::load(&path).unwrap();
        assert_eq!(meta.threshold, Some(-0.0123));
        assert_eq!(meta.trained_at.as_deref(), Some("2024-05-01T10:00:00"));
        assert_eq!(meta.training_rows, Some(800));
        assert_eq!(meta.offset, Some(-0.5));
        assert!(meta.features_match());
    }

    #[test]
    fn feature_layout_check() {
        let mut meta = ModelMetadata {
            features: Some(feature_columns().iter().map(|c| c.to_string()).collect()),
            ..Default::default()
        };
        assert!(meta.features_match());
        meta.features = Some(vec!["amount".into()]);
        assert!(!meta.features_match());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(ModelMetadata::load(&path).is_err());
    }
}
