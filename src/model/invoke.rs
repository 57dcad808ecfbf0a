//! Guarded model call: every classifier failure, including a panic, becomes a
//! diagnosable `PredictError::ModelPrediction`.

use super::{Classifier, RawLabel};
use crate::error::{panic_message, ModelError, PredictError};
use crate::features::FeatureVector;
use ndarray::Array2;
use std::panic::{self, AssertUnwindSafe};
use tracing::error;

/// Raw outcome of one model call.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub label: RawLabel,
    /// Highest class probability, 0.0 when the model has no probabilities
    pub confidence: f64,
}

pub fn invoke(model: &dyn Classifier, vector: &FeatureVector) -> Result<Invocation, PredictError> {
    let batch = vector.to_batch();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| run(model, &batch)))
        .unwrap_or_else(|payload| Err(ModelError::Panicked(panic_message(payload.as_ref()))));

    outcome.map_err(|source| {
        error!(
            error = %source,
            feature_order = ?vector.order,
            x = ?vector.values,
            "model prediction failed"
        );
        PredictError::ModelPrediction {
            source,
            feature_order: vector.order.clone(),
            x: vec![vector.values.clone()],
        }
    })
}

fn run(model: &dyn Classifier, batch: &Array2<f64>) -> Result<Invocation, ModelError> {
    let labels = model.predict(batch)?;
    if labels.len() != batch.nrows() {
        return Err(ModelError::RowCount {
            expected: batch.nrows(),
            got: labels.len(),
        });
    }
    let label = labels.into_iter().next().ok_or(ModelError::RowCount {
        expected: batch.nrows(),
        got: 0,
    })?;

    let confidence = match model.predict_proba(batch) {
        None => 0.0,
        Some(proba) => {
            let proba = proba?;
            if proba.nrows() != batch.nrows() {
                return Err(ModelError::RowCount {
                    expected: batch.nrows(),
                    got: proba.nrows(),
                });
            }
            let best = proba
                .row(0)
                .iter()
                .copied()
                .filter(|p| p.is_finite())
                .fold(f64::NEG_INFINITY, f64::max);
            if best.is_finite() {
                best.clamp(0.0, 1.0)
            } else {
                0.0
            }
        }
    };

    Ok(Invocation { label, confidence })
}
