//! Application configuration. JSON file, every section optional.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "LEDGER_ANOMALY_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Trained anomaly model (ONNX)
    pub model_path: PathBuf,
    /// Trainer metadata sidecar (threshold, trained_at, feature list)
    pub metadata_path: PathBuf,
    pub limits: LimitsConfig,
    pub scoring: ScoringConfig,
    pub onnx: OnnxConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest accepted batch; larger batches are rejected before feature building.
    pub max_batch_rows: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Threshold when neither metadata nor the model provides one.
    pub default_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OnnxConfig {
    pub intra_threads: i16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/isolation_forest.onnx"),
            metadata_path: PathBuf::from("models/isolation_forest.json"),
            limits: LimitsConfig::default(),
            scoring: ScoringConfig::default(),
            onnx: OnnxConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_batch_rows: 10_000,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            default_threshold: 0.0,
        }
    }
}

impl Default for OnnxConfig {
    fn default() -> Self {
        Self { intra_threads: 1 }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load from JSON file if present and valid; otherwise return default.
    pub fn load(path: &Path) -> Self {
        Self::try_load(path).ok().flatten().unwrap_or_default()
    }

    /// `Ok(None)` if the file does not exist; `Err` if it exists but is not
    /// valid configuration.
    pub fn try_load(path: &Path) -> Result<Option<Self>, Box<dyn std::error::Error + Send + Sync>> {
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&data)?))
    }

    /// Path from [`CONFIG_ENV`], else `config.json`.
    pub fn default_path() -> PathBuf {
        std::env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let c = AppConfig::load(Path::new("nonexistent.json"));
        assert_eq!(c.limits.max_batch_rows, 10_000);
        assert_eq!(c.scoring.default_threshold, 0.0);
        assert!(!c.log.json);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"limits": {"max_batch_rows": 500}, "log": {"json": true}}"#).unwrap();
        let c = AppConfig::load(&path);
        assert_eq!(c.limits.max_batch_rows, 500);
        assert!(c.log.json);
        assert_eq!(c.log.level, "info");
        assert_eq!(c.model_path, PathBuf::from("models/isolation_forest.onnx"));
    }

    #[test]
    fn invalid_file_is_reported_by_try_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "[1, 2").unwrap();
        assert!(AppConfig::try_load(&path).is_err());
        assert_eq!(AppConfig::load(&path).limits.max_batch_rows, 10_000);
    }
}
