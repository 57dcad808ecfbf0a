//! Rule-based reasons attached to every prediction.

pub const ATTENDANCE_DROP: &str = "Significant drop in attendance";
pub const SUBMISSION_DELAYS: &str = "Frequent assignment submission delays";
pub const INCONSISTENT_MARKS: &str = "Inconsistent academic performance";
pub const LOW_ENGAGEMENT: &str = "Low LMS engagement";
pub const WITHIN_SAFE_RANGE: &str = "All parameters are within safe range";

/// Every triggered rule contributes its reason, in rule order. Never empty.
pub fn explain_risk(
    attendance_trend: f64,
    assignment_delay_avg: f64,
    marks_std: f64,
    engagement_score: f64,
) -> Vec<String> {
    let rules = [
        (attendance_trend < -5.0, ATTENDANCE_DROP),
        (assignment_delay_avg > 3.0, SUBMISSION_DELAYS),
        (marks_std > 15.0, INCONSISTENT_MARKS),
        (engagement_score < 0.3, LOW_ENGAGEMENT),
    ];

    let mut reasons: Vec<String> = rules
        .iter()
        .filter(|(hit, _)| *hit)
        .map(|(_, reason)| reason.to_string())
        .collect();

    if reasons.is_empty() {
        reasons.push(WITHIN_SAFE_RANGE.to_string());
    }
    reasons
}
