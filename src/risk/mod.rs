//! Risk labelling, explanation, intervention and the end-to-end prediction engine.

mod engine;
mod explain;
mod intervention;
mod label;

pub use engine::{PredictionResult, PredictionSink, RiskEngine};
pub use explain::explain_risk;
pub use intervention::recommend_intervention;
pub use label::RiskLevel;

/// Fixed reason and action strings.
pub mod messages {
    pub use super::explain::{
        ATTENDANCE_DROP, INCONSISTENT_MARKS, LOW_ENGAGEMENT, SUBMISSION_DELAYS, WITHIN_SAFE_RANGE,
    };
    pub use super::intervention::{
        ACADEMIC_MENTORING, CONTINUE_PLAN, SKILLS_WORKSHOP, STRICT_MONITORING,
    };
}
