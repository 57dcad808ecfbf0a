//! Classifier abstraction, model artifact loading and guarded invocation.
//!
//! A model is loaded once at startup together with its metadata (ordered feature
//! names) and shared read-only between requests behind `Arc<dyn Classifier>`.

mod forest;
mod invoke;
#[cfg(feature = "onnx")]
mod onnx;

pub use forest::{Node, Scaler, Tree, TreeEnsemble};
pub use invoke::{invoke, Invocation};
#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;

use crate::config::{FeaturePolicy, ModelConfig};
use crate::error::{ModelError, ModelLoadError};
use crate::features::FeatureLayout;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Label as emitted by a classifier, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawLabel {
    Numeric(i64),
    Float(f64),
    Text(String),
}

/// Trained classifier contract. Implementations must be safe to call concurrently.
pub trait Classifier: Send + Sync {
    /// One label per batch row.
    fn predict(&self, batch: &Array2<f64>) -> Result<Vec<RawLabel>, ModelError>;

    /// Per-class probabilities, shape `[rows, classes]`. `None` when unsupported.
    fn predict_proba(&self, _batch: &Array2<f64>) -> Option<Result<Array2<f64>, ModelError>> {
        None
    }

    /// Input width the model was trained on, when known.
    fn expected_width(&self) -> Option<usize> {
        None
    }
}

/// Metadata shipped next to the model artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMeta {
    #[serde(default)]
    pub features: Vec<String>,
}

impl ModelMeta {
    /// Missing or unreadable metadata yields an empty feature list.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            warn!(path = %path.display(), "model metadata not found; using fallback feature order");
            return Self::default();
        }
        match std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|data| serde_json::from_str::<ModelMeta>(&data).map_err(|e| e.to_string()))
        {
            Ok(meta) => meta,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unable to read model metadata");
                Self::default()
            }
        }
    }
}

/// Classifier plus the feature layout resolved from its metadata.
#[derive(Clone)]
pub struct LoadedModel {
    pub classifier: Arc<dyn Classifier>,
    pub layout: FeatureLayout,
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

/// Load the configured artifact and resolve its feature layout.
pub fn load_model(config: &ModelConfig) -> Result<LoadedModel, ModelLoadError> {
    let meta = ModelMeta::load(&config.meta_path);
    let layout = FeatureLayout::resolve(meta.features.as_slice());

    let unknown = layout.unknown_names();
    if !unknown.is_empty() {
        warn!(
            features = ?unknown,
            policy = ?config.feature_policy,
            "model expects features the service cannot supply; they will be sent as 0.0"
        );
        if config.feature_policy == FeaturePolicy::Strict {
            return Err(ModelLoadError::UnknownFeatures {
                names: unknown.into_iter().map(str::to_string).collect(),
            });
        }
    }

    let classifier = load_classifier(&config.path)?;
    if let Some(width) = classifier.expected_width() {
        if width != layout.len() {
            warn!(
                model_width = width,
                layout_width = layout.len(),
                "model input width differs from feature layout; predictions will fail"
            );
        }
    }

    info!(path = %config.path.display(), features = ?layout.names(), "model loaded");
    Ok(LoadedModel { classifier, layout })
}

fn load_classifier(path: &Path) -> Result<Arc<dyn Classifier>, ModelLoadError> {
    if !path.exists() {
        return Err(ModelLoadError::NotFound {
            path: path.to_path_buf(),
        });
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(Arc::new(TreeEnsemble::load(path)?)),
        #[cfg(feature = "onnx")]
        Some("onnx") => Ok(Arc::new(OnnxClassifier::load(path)?)),
        _ => Err(ModelLoadError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const MODEL: &str = r#"{
        "n_features": 4,
        "classes": [0, 1, 2],
        "trees": [{"nodes": [{"value": [1.0, 0.0, 0.0]}]}]
    }"#;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let p = dir.join(name);
        std::fs::write(&p, body).unwrap();
        p
    }

    #[test]
    fn raw_labels_decode_by_shape() {
        let labels: Vec<RawLabel> = serde_json::from_str(r#"[2, 1.5, "High"]"#).unwrap();
        assert_eq!(
            labels,
            vec![RawLabel::Numeric(2), RawLabel::Float(1.5), RawLabel::Text("High".into())]
        );
    }

    #[test]
    fn missing_meta_uses_fallback_layout() {
        let dir = tempfile::tempdir().unwrap();
        let config = ModelConfig {
            path: write(dir.path(), "m.json", MODEL),
            meta_path: dir.path().join("absent.json"),
            feature_policy: FeaturePolicy::ZeroFill,
        };
        let loaded = load_model(&config).unwrap();
        assert_eq!(loaded.layout, FeatureLayout::fallback());
    }

    #[test]
    fn corrupt_meta_uses_fallback_layout() {
        let dir = tempfile::tempdir().unwrap();
        let meta = write(dir.path(), "meta.json", "{not json");
        assert_eq!(ModelMeta::load(&meta), ModelMeta::default());
    }

    #[test]
    fn strict_policy_rejects_unknown_features() {
        let dir = tempfile::tempdir().unwrap();
        let config = ModelConfig {
            path: write(dir.path(), "m.json", MODEL),
            meta_path: write(
                dir.path(),
                "meta.json",
                r#"{"features":["attendance_trend","marks_std","engagement_score","quiz_rate"]}"#,
            ),
            feature_policy: FeaturePolicy::Strict,
        };
        match load_model(&config) {
            Err(ModelLoadError::UnknownFeatures { names }) => assert_eq!(names, vec!["quiz_rate"]),
            other => panic!("expected UnknownFeatures, got {:?}", other),
        }

        let lenient = ModelConfig {
            feature_policy: FeaturePolicy::ZeroFill,
            ..config
        };
        let loaded = load_model(&lenient).unwrap();
        assert_eq!(loaded.layout.unknown_names(), vec!["quiz_rate"]);
    }

    #[test]
    fn missing_model_is_fatal() {
        let config = ModelConfig {
            path: PathBuf::from("nonexistent.json"),
            ..ModelConfig::default()
        };
        assert!(matches!(load_model(&config), Err(ModelLoadError::NotFound { .. })));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let config = ModelConfig {
            path: write(dir.path(), "risk_model.pkl", "binary"),
            meta_path: dir.path().join("absent.json"),
            feature_policy: FeaturePolicy::ZeroFill,
        };
        assert!(matches!(
            load_model(&config),
            Err(ModelLoadError::UnsupportedFormat { .. })
        ));
    }
}
