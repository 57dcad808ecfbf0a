//! Error kinds for each pipeline boundary and the failure payload returned to callers.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Failure raised by a classifier while predicting.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("input has {got} features, model expects {expected}")]
    Shape { expected: usize, got: usize },

    #[error("model returned {got} outputs for {expected} rows")]
    RowCount { expected: usize, got: usize },

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("model panicked: {0}")]
    Panicked(String),
}

/// Failure while loading a model artifact at startup.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("model artifact not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid model artifact: {0}")]
    Invalid(String),

    #[error("unsupported model format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("model expects features the service cannot supply: {}", names.join(", "))]
    UnknownFeatures { names: Vec<String> },

    #[cfg(feature = "onnx")]
    #[error("onnx runtime: {0}")]
    Onnx(#[from] ort::Error),
}

/// Failure of a single prediction request.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PredictError {
    #[error("model prediction failed: {source}")]
    ModelPrediction {
        #[source]
        source: ModelError,
        feature_order: Vec<String>,
        x: Vec<Vec<f64>>,
    },

    #[error("unexpected server error: {details}")]
    Internal { details: String },
}

/// History store failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Structured failure payload handed back instead of a result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionFailure {
    pub error: String,
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_order: Option<Vec<String>>,
    #[serde(rename = "X", default, skip_serializing_if = "Option::is_none")]
    pub x: Option<Vec<Vec<f64>>>,
}

impl PredictionFailure {
    pub const MODEL_FAILED: &'static str = "Model prediction failed";
    pub const UNEXPECTED: &'static str = "Unexpected server error";
    pub const INVALID_INPUT: &'static str = "Invalid input";

    pub fn invalid_input(details: impl Into<String>) -> Self {
        Self {
            error: Self::INVALID_INPUT.to_string(),
            details: details.into(),
            feature_order: None,
            x: None,
        }
    }
}

impl From<&PredictError> for PredictionFailure {
    fn from(err: &PredictError) -> Self {
        match err {
            PredictError::ModelPrediction {
                source,
                feature_order,
                x,
            } => Self {
                error: Self::MODEL_FAILED.to_string(),
                details: source.to_string(),
                feature_order: Some(feature_order.clone()),
                x: Some(x.clone()),
            },
            PredictError::Internal { details } => Self {
                error: Self::UNEXPECTED.to_string(),
                details: details.clone(),
                feature_order: None,
                x: None,
            },
        }
    }
}

impl From<PredictError> for PredictionFailure {
    fn from(err: PredictError) -> Self {
        Self::from(&err)
    }
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
