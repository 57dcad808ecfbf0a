//! ONNX Runtime classifier. Input: `[rows, n_features]` f32. Outputs: a label
//! tensor (int64 or string) and, when the graph exposes one, a float
//! probability tensor `[rows, classes]`.
//!
//! Classifiers exported with a ZipMap probability output (sequence of maps)
//! are served label-only with confidence 0.0.

use super::{Classifier, RawLabel};
use crate::error::{ModelError, ModelLoadError};
use ndarray::Array2;
use ort::{GraphOptimizationLevel, Session, ValueType};
use std::path::Path;

pub struct OnnxClassifier {
    session: Session,
    input_name: String,
    label_output: String,
    proba_output: Option<String>,
}

fn inference(e: ort::Error) -> ModelError {
    ModelError::Inference(e.to_string())
}

impl OnnxClassifier {
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(path)?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| ModelLoadError::Invalid("onnx graph has no inputs".into()))?;
        let label_output = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| ModelLoadError::Invalid("onnx graph has no outputs".into()))?;
        let proba_output = session
            .outputs
            .get(1)
            .filter(|o| matches!(o.output_type, ValueType::Tensor { .. }))
            .map(|o| o.name.clone());

        tracing::debug!(
            input = %input_name,
            label = %label_output,
            proba = ?proba_output,
            "onnx session ready"
        );

        Ok(Self {
            session,
            input_name,
            label_output,
            proba_output,
        })
    }

    fn labels(&self, batch: &Array2<f64>) -> Result<Vec<RawLabel>, ModelError> {
        let input = ort::Value::from_array(batch.mapv(|v| v as f32)).map_err(inference)?;
        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input].map_err(inference)?)
            .map_err(inference)?;
        let value = &outputs[self.label_output.as_str()];

        if let Ok((_, codes)) = value.try_extract_raw_tensor::<i64>() {
            return Ok(codes.iter().map(|c| RawLabel::Numeric(*c)).collect());
        }
        let (_, names) = value.try_extract_raw_string_tensor().map_err(inference)?;
        Ok(names.into_iter().map(RawLabel::Text).collect())
    }

    fn probabilities(&self, batch: &Array2<f64>, name: &str) -> Result<Array2<f64>, ModelError> {
        let input = ort::Value::from_array(batch.mapv(|v| v as f32)).map_err(inference)?;
        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input].map_err(inference)?)
            .map_err(inference)?;
        let (shape, data) = outputs[name]
            .try_extract_raw_tensor::<f32>()
            .map_err(inference)?;

        let rows = batch.nrows();
        let classes = shape.last().copied().unwrap_or(0).max(0) as usize;
        Array2::from_shape_vec((rows, classes), data.iter().map(|p| *p as f64).collect())
            .map_err(|e| ModelError::Inference(format!("probability output shape {:?}: {}", shape, e)))
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, batch: &Array2<f64>) -> Result<Vec<RawLabel>, ModelError> {
        self.labels(batch)
    }

    fn predict_proba(&self, batch: &Array2<f64>) -> Option<Result<Array2<f64>, ModelError>> {
        let name = self.proba_output.as_deref()?;
        Some(self.probabilities(batch, name))
    }

    fn expected_width(&self) -> Option<usize> {
        match &self.session.inputs.first()?.input_type {
            ValueType::Tensor { dimensions, .. } => dimensions
                .last()
                .copied()
                .filter(|d| *d > 0)
                .map(|d| d as usize),
            _ => None,
        }
    }
}
