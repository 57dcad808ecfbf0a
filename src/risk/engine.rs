//! Prediction engine: observation → features → model → canonical label → explained result.

use super::{explain_risk, recommend_intervention, RiskLevel};
use crate::error::{panic_message, PredictError, PredictionFailure, StoreError};
use crate::features::{DerivedFeatures, FeatureLayout, LoggedFeatures, StudentObservation};
use crate::model::{invoke, Classifier, Invocation, LoadedModel};
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of one successful prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub student_id: String,
    pub risk_level: RiskLevel,
    pub confidence: f64,
    pub recommended_action: String,
    pub reasons: Vec<String>,
}

/// Downstream consumer of successful predictions (history, audit).
pub trait PredictionSink: Send + Sync {
    fn record(&self, features: &LoggedFeatures, result: &PredictionResult) -> Result<(), StoreError>;
}

pub struct RiskEngine {
    model: Arc<dyn Classifier>,
    layout: FeatureLayout,
    sinks: Vec<Arc<dyn PredictionSink>>,
}

impl RiskEngine {
    pub fn new(model: Arc<dyn Classifier>, layout: FeatureLayout) -> Self {
        Self {
            model,
            layout,
            sinks: Vec::new(),
        }
    }

    pub fn from_loaded(loaded: LoadedModel) -> Self {
        Self::new(loaded.classifier, loaded.layout)
    }

    pub fn with_sink(mut self, sink: Arc<dyn PredictionSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    /// Run the pipeline without notifying sinks.
    pub fn predict(&self, obs: &StudentObservation) -> Result<PredictionResult, PredictError> {
        self.evaluate(obs).map(|(_, result)| result)
    }

    /// Outermost boundary: always yields a result or a structured failure, and
    /// hands successful results to the sinks.
    pub fn handle(&self, obs: &StudentObservation) -> Result<PredictionResult, PredictionFailure> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.evaluate(obs)))
            .unwrap_or_else(|payload| {
                Err(PredictError::Internal {
                    details: panic_message(payload.as_ref()),
                })
            });

        match outcome {
            Ok((derived, result)) => {
                self.notify(&LoggedFeatures::from(&derived), &result);
                Ok(result)
            }
            Err(e) => {
                warn!(student_id = %obs.student_id, error = %e, "prediction failed");
                Err(PredictionFailure::from(&e))
            }
        }
    }

    fn evaluate(
        &self,
        obs: &StudentObservation,
    ) -> Result<(DerivedFeatures, PredictionResult), PredictError> {
        let derived = DerivedFeatures::from_observation(obs);
        let vector = self.layout.align(&derived);
        let Invocation { label, confidence } = invoke(self.model.as_ref(), &vector)?;
        let risk_level = RiskLevel::from_raw(&label);
        debug!(
            student_id = %obs.student_id,
            raw = ?label,
            risk_level = %risk_level,
            confidence,
            "model output normalized"
        );

        let recommended_action = recommend_intervention(
            risk_level,
            derived.attendance_trend,
            derived.assignment_delay_avg,
        )
        .to_string();
        let reasons = explain_risk(
            derived.attendance_trend,
            derived.assignment_delay_avg,
            derived.marks_std,
            derived.engagement_score,
        );

        let result = PredictionResult {
            student_id: obs.student_id.clone(),
            risk_level,
            confidence: round2(confidence),
            recommended_action,
            reasons,
        };
        Ok((derived, result))
    }

    /// Sink failures are logged and never affect the caller.
    fn notify(&self, features: &LoggedFeatures, result: &PredictionResult) {
        for sink in &self.sinks {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| sink.record(features, result)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(student_id = %result.student_id, error = %e, "failed to record prediction")
                }
                Err(payload) => warn!(
                    student_id = %result.student_id,
                    error = %panic_message(payload.as_ref()),
                    "prediction sink panicked"
                ),
            }
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
