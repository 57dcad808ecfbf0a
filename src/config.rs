//! Service configuration. Loaded once at startup from a JSON file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Data directory (history database)
    pub data_dir: PathBuf,
    /// Model artifact and metadata
    pub model: ModelConfig,
    /// Prediction/history logging
    pub store: StoreConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the trained classifier (`.json` tree ensemble or `.onnx`)
    pub path: PathBuf,
    /// Path to metadata listing the ordered feature names the model expects
    pub meta_path: PathBuf,
    /// What to do with expected feature names the service cannot supply
    pub feature_policy: FeaturePolicy,
}

/// Handling of model feature names outside the known catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeaturePolicy {
    /// Fill unknown features with 0.0 on every request
    #[default]
    ZeroFill,
    /// Refuse to load a model that expects unknown features
    Strict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Persist predictions and student history
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".student-risk"),
            model: ModelConfig::default(),
            store: StoreConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("model/risk_model.json"),
            meta_path: PathBuf::from("model/model_meta.json"),
            feature_policy: FeaturePolicy::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl ServiceConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            if let Ok(data) = std::fs::read_to_string(path) {
                if let Ok(c) = serde_json::from_str::<ServiceConfig>(&data) {
                    return c;
                }
            }
        }
        Self::default()
    }

    /// Location of the SQLite history database
    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join("history.db")
    }
}
