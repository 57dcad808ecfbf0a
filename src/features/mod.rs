//! Student feature derivation and alignment to the model's expected input order.

mod derive;
mod pipeline;

pub use pipeline::{FeatureLayout, Slot};

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raw per-student input for one prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentObservation {
    pub student_id: String,
    pub attendance_current: f64,
    pub attendance_prev: f64,
    /// Average days late per assignment
    pub assignment_delay_avg: f64,
    /// Standard deviation of marks
    pub marks_std: f64,
    #[serde(deserialize_with = "whole_number")]
    pub lms_logins: i64,
    #[serde(deserialize_with = "whole_number")]
    pub total_days: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_marks: Option<f64>,
}

/// Counts arrive as `40` or `40.0` depending on the client; fractional values are rejected.
fn whole_number<'de, D: Deserializer<'de>>(de: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Int(i64),
        Float(f64),
    }

    match Count::deserialize(de)? {
        Count::Int(n) => Ok(n),
        Count::Float(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 => {
            Ok(v as i64)
        }
        Count::Float(v) => Err(serde::de::Error::custom(format!(
            "expected a whole number, got {}",
            v
        ))),
    }
}

/// Features computed once per request from a [`StudentObservation`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedFeatures {
    pub attendance_trend: f64,
    pub attendance_change_pct: f64,
    pub attendance_drop_flag: bool,
    /// LMS logins per observed day
    pub engagement_score: f64,
    pub assignment_delay_avg: f64,
    pub marks_std: f64,
    pub avg_marks: f64,
}

/// Every feature name the service knows how to supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureName {
    AttendanceTrend,
    AttendanceChangePct,
    AttendanceDropFlag,
    AssignmentDelayAvg,
    MarksStd,
    AvgMarks,
    EngagementScore,
    LmsLoginsPerDay,
}

impl FeatureName {
    pub const ALL: [FeatureName; 8] = [
        FeatureName::AttendanceTrend,
        FeatureName::AttendanceChangePct,
        FeatureName::AttendanceDropFlag,
        FeatureName::AssignmentDelayAvg,
        FeatureName::MarksStd,
        FeatureName::AvgMarks,
        FeatureName::EngagementScore,
        FeatureName::LmsLoginsPerDay,
    ];

    /// Order used when the model ships without feature metadata.
    pub const FALLBACK_ORDER: [FeatureName; 4] = [
        FeatureName::AttendanceTrend,
        FeatureName::AssignmentDelayAvg,
        FeatureName::MarksStd,
        FeatureName::EngagementScore,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FeatureName::AttendanceTrend => "attendance_trend",
            FeatureName::AttendanceChangePct => "attendance_change_pct",
            FeatureName::AttendanceDropFlag => "attendance_drop_flag",
            FeatureName::AssignmentDelayAvg => "assignment_delay_avg",
            FeatureName::MarksStd => "marks_std",
            FeatureName::AvgMarks => "avg_marks",
            FeatureName::EngagementScore => "engagement_score",
            FeatureName::LmsLoginsPerDay => "lms_logins_per_day",
        }
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFeature(pub String);

impl FromStr for FeatureName {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeatureName::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| UnknownFeature(s.to_string()))
    }
}

/// Ordered model input built for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Feature names in the order the values were laid out
    pub order: Vec<String>,
    pub values: Vec<f64>,
}

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Single-row batch, shape `[1, n]`.
    pub fn to_batch(&self) -> Array2<f64> {
        Array1::from_vec(self.values.clone()).insert_axis(Axis(0))
    }
}

/// Subset of features persisted alongside each prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoggedFeatures {
    pub attendance_trend: f64,
    pub assignment_delay_avg: f64,
    pub marks_std: f64,
    pub engagement_score: f64,
}

impl From<&DerivedFeatures> for LoggedFeatures {
    fn from(d: &DerivedFeatures) -> Self {
        Self {
            attendance_trend: d.attendance_trend,
            assignment_delay_avg: d.assignment_delay_avg,
            marks_std: d.marks_std,
            engagement_score: d.engagement_score,
        }
    }
}
