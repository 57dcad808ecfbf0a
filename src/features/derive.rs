//! Per-request feature derivation from raw student inputs.

use super::{DerivedFeatures, FeatureName, StudentObservation};

/// Attendance falling by more than this percentage sets the drop flag.
const DROP_FLAG_PCT: f64 = -5.0;

impl DerivedFeatures {
    /// Derive all features. Never fails: arithmetic anomalies collapse to 0.0.
    pub fn from_observation(obs: &StudentObservation) -> Self {
        let attendance_trend = obs.attendance_current - obs.attendance_prev;
        let engagement_score = if obs.total_days > 0 {
            obs.lms_logins as f64 / obs.total_days as f64
        } else {
            0.0
        };

        let attendance_change_pct = change_pct(obs.attendance_current, obs.attendance_prev);
        let avg_marks = obs.avg_marks.filter(|m| m.is_finite()).unwrap_or(0.0);

        Self {
            attendance_trend,
            attendance_change_pct,
            attendance_drop_flag: attendance_change_pct < DROP_FLAG_PCT,
            engagement_score,
            assignment_delay_avg: obs.assignment_delay_avg,
            marks_std: obs.marks_std,
            avg_marks,
        }
    }

    /// LMS logins per observed day; same quantity as `engagement_score`.
    pub fn lms_logins_per_day(&self) -> f64 {
        self.engagement_score
    }

    /// Value of a known feature.
    pub fn value(&self, name: FeatureName) -> f64 {
        match name {
            FeatureName::AttendanceTrend => self.attendance_trend,
            FeatureName::AttendanceChangePct => self.attendance_change_pct,
            FeatureName::AttendanceDropFlag => {
                if self.attendance_drop_flag {
                    1.0
                } else {
                    0.0
                }
            }
            FeatureName::AssignmentDelayAvg => self.assignment_delay_avg,
            FeatureName::MarksStd => self.marks_std,
            FeatureName::AvgMarks => self.avg_marks,
            FeatureName::EngagementScore => self.engagement_score,
            FeatureName::LmsLoginsPerDay => self.lms_logins_per_day(),
        }
    }
}

fn change_pct(current: f64, prev: f64) -> f64 {
    if prev == 0.0 || prev.is_nan() {
        return 0.0;
    }
    let pct = (current - prev) / prev * 100.0;
    if pct.is_finite() {
        pct
    } else {
        0.0
    }
}
