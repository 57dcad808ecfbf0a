//! Student academic risk prediction.
//!
//! Modular structure:
//! - [`features`] — Feature derivation and alignment to the model's input order
//! - [`model`] — Classifier contract, artifact loading, guarded invocation
//! - [`risk`] — Label normalization, explanations, interventions, prediction engine
//! - [`storage`] — Prediction/history log and aggregate reports
//! - [`logging`] — Structured logging and JSON-lines output

pub mod config;
pub mod error;
pub mod features;
pub mod logging;
pub mod model;
pub mod risk;
pub mod storage;

pub use config::ServiceConfig;
pub use error::{ModelError, ModelLoadError, PredictError, PredictionFailure, StoreError};
pub use features::{DerivedFeatures, FeatureLayout, FeatureVector, StudentObservation};
pub use logging::StructuredLogger;
pub use model::{load_model, Classifier, LoadedModel, RawLabel, TreeEnsemble};
pub use risk::{PredictionResult, PredictionSink, RiskEngine, RiskLevel};
pub use storage::HistoryStore;
