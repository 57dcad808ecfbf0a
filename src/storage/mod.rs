//! Prediction/history persistence and the aggregate views built on it.

mod export;
mod history;

pub use export::render_csv;
pub use history::HistoryStore;

use crate::features::LoggedFeatures;
use crate::risk::RiskLevel;
use serde::{Deserialize, Serialize};

/// One persisted student-history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub timestamp: String,
    pub student_id: String,
    #[serde(flatten)]
    pub features: LoggedFeatures,
    pub risk_level: RiskLevel,
}

/// Risk trajectory of one student, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentHistory {
    pub timestamps: Vec<String>,
    pub risks: Vec<RiskLevel>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskCounts {
    #[serde(rename = "Low")]
    pub low: u64,
    #[serde(rename = "Medium")]
    pub medium: u64,
    #[serde(rename = "High")]
    pub high: u64,
    #[serde(rename = "Unknown")]
    pub unknown: u64,
}

impl RiskCounts {
    pub fn add(&mut self, level: RiskLevel, n: u64) {
        match level {
            RiskLevel::Low => self.low += n,
            RiskLevel::Medium => self.medium += n,
            RiskLevel::High => self.high += n,
            RiskLevel::Unknown => self.unknown += n,
        }
    }

    pub fn merge(&mut self, other: &RiskCounts) {
        self.low += other.low;
        self.medium += other.medium;
        self.high += other.high;
        self.unknown += other.unknown;
    }

    pub fn total(&self) -> u64 {
        self.low + self.medium + self.high + self.unknown
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentHighCount {
    pub student_id: String,
    pub high_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortStats {
    pub cohort: String,
    pub counts: RiskCounts,
    pub top_students: Vec<StudentHighCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CohortReport {
    pub cohorts: Vec<CohortStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherSummary {
    pub total_students: u64,
    pub counts: RiskCounts,
    pub top_high_students: Vec<StudentHighCount>,
    pub avg_confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub timestamp: String,
    pub student_id: String,
    pub message: String,
    pub method: String,
    pub status: String,
}

/// Cohort key: the first two characters of a student id.
pub fn cohort_of(student_id: &str) -> String {
    student_id.chars().take(2).collect()
}
