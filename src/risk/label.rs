//! Canonical risk labels and normalization of raw classifier output.

use crate::model::RawLabel;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Unknown,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Unknown => "Unknown",
        }
    }

    /// Normalize whatever the model emitted. Unrecognized output maps to `Unknown`.
    pub fn from_raw(raw: &RawLabel) -> Self {
        match raw {
            RawLabel::Text(s) => Self::from_text(s),
            RawLabel::Numeric(code) => Self::from_code(*code),
            RawLabel::Float(v) if v.is_finite() => Self::from_code(v.trunc() as i64),
            RawLabel::Float(_) => RiskLevel::Unknown,
        }
    }

    fn from_code(code: i64) -> Self {
        match code {
            0 => RiskLevel::Low,
            1 => RiskLevel::Medium,
            2 => RiskLevel::High,
            _ => RiskLevel::Unknown,
        }
    }

    fn from_text(s: &str) -> Self {
        match capitalize(s).as_str() {
            "Low" => RiskLevel::Low,
            "Medium" => RiskLevel::Medium,
            "High" => RiskLevel::High,
            _ => RiskLevel::Unknown,
        }
    }

    /// Parse a label already in canonical form (e.g. read back from the store).
    pub fn parse_canonical(s: &str) -> Self {
        RiskLevel::ALL
            .into_iter()
            .find(|l| l.as_str() == s)
            .unwrap_or(RiskLevel::Unknown)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First character upper-cased, the rest lower-cased.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
