//! Intervention recommendation. Rules are checked in order and the first match wins.

use super::RiskLevel;

pub const STRICT_MONITORING: &str = "Immediate counseling and strict attendance monitoring";
pub const ACADEMIC_MENTORING: &str = "Academic mentoring and assignment deadline tracking";
pub const SKILLS_WORKSHOP: &str = "Time management and study skills workshop";
pub const CONTINUE_PLAN: &str = "Continue current academic plan";

pub fn recommend_intervention(
    risk_level: RiskLevel,
    attendance_trend: f64,
    assignment_delay_avg: f64,
) -> &'static str {
    match risk_level {
        RiskLevel::High if attendance_trend < 0.0 => STRICT_MONITORING,
        RiskLevel::High if assignment_delay_avg > 4.0 => ACADEMIC_MENTORING,
        RiskLevel::Medium => SKILLS_WORKSHOP,
        _ => CONTINUE_PLAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attendance_rule_wins_over_delay() {
        for delay in [0.0, 4.5, 30.0] {
            assert_eq!(recommend_intervention(RiskLevel::High, -1.0, delay), STRICT_MONITORING);
        }
    }

    #[test]
    fn high_with_delays() {
        assert_eq!(recommend_intervention(RiskLevel::High, 0.0, 5.0), ACADEMIC_MENTORING);
        assert_eq!(recommend_intervention(RiskLevel::High, 2.0, 4.0), CONTINUE_PLAN);
    }

    #[test]
    fn medium_and_others() {
        assert_eq!(recommend_intervention(RiskLevel::Medium, -10.0, 9.0), SKILLS_WORKSHOP);
        assert_eq!(recommend_intervention(RiskLevel::Low, -10.0, 9.0), CONTINUE_PLAN);
        assert_eq!(recommend_intervention(RiskLevel::Unknown, -10.0, 9.0), CONTINUE_PLAN);
    }
}
