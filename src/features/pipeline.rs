//! Feature alignment: derived features → ordered vector in the model's expected layout.

use super::{DerivedFeatures, FeatureName, FeatureVector};

/// One position in the model's input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Known(FeatureName),
    /// Name the service cannot supply; always filled with 0.0
    Unknown(String),
}

impl Slot {
    pub fn name(&self) -> &str {
        match self {
            Slot::Known(f) => f.as_str(),
            Slot::Unknown(s) => s,
        }
    }
}

/// Feature order resolved once per loaded model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureLayout {
    slots: Vec<Slot>,
}

impl FeatureLayout {
    /// Resolve model metadata names. An empty list yields the fallback order.
    pub fn resolve<S: AsRef<str>>(names: &[S]) -> Self {
        if names.is_empty() {
            return Self::fallback();
        }
        let slots = names
            .iter()
            .map(|n| {
                let n = n.as_ref();
                n.parse::<FeatureName>()
                    .map(Slot::Known)
                    .unwrap_or_else(|_| Slot::Unknown(n.to_string()))
            })
            .collect();
        Self { slots }
    }

    pub fn fallback() -> Self {
        Self {
            slots: FeatureName::FALLBACK_ORDER
                .into_iter()
                .map(Slot::Known)
                .collect(),
        }
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.slots.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn unknown_names(&self) -> Vec<&str> {
        self.slots
            .iter()
            .filter_map(|s| match s {
                Slot::Unknown(n) => Some(n.as_str()),
                Slot::Known(_) => None,
            })
            .collect()
    }

    /// Lay out derived values in model order.
    pub fn align(&self, derived: &DerivedFeatures) -> FeatureVector {
        let values = self
            .slots
            .iter()
            .map(|s| match s {
                Slot::Known(f) => derived.value(*f),
                Slot::Unknown(_) => 0.0,
            })
            .collect();
        FeatureVector {
            order: self.names(),
            values,
        }
    }
}

impl Default for FeatureLayout {
    fn default() -> Self {
        Self::fallback()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn derived() -> DerivedFeatures {
        DerivedFeatures {
            attendance_trend: -7.0,
            attendance_change_pct: -8.25,
            attendance_drop_flag: true,
            engagement_score: 0.25,
            assignment_delay_avg: 4.0,
            marks_std: 12.0,
            avg_marks: 64.0,
        }
    }

    #[test]
    fn unknown_feature_is_zero() {
        let layout = FeatureLayout::resolve(&["unknown_feature_x"]);
        let fv = layout.align(&derived());
        assert_eq!(fv.values, vec![0.0]);
        assert_eq!(fv.order, vec!["unknown_feature_x".to_string()]);
        assert_eq!(layout.unknown_names(), vec!["unknown_feature_x"]);
    }

    #[test]
    fn empty_metadata_uses_fallback() {
        let layout = FeatureLayout::resolve::<&str>(&[]);
        assert_eq!(layout, FeatureLayout::fallback());
        let fv = layout.align(&derived());
        assert_eq!(
            fv.order,
            vec!["attendance_trend", "assignment_delay_avg", "marks_std", "engagement_score"]
        );
        assert_eq!(fv.values, vec![-7.0, 4.0, 12.0, 0.25]);
    }

    #[test]
    fn follows_metadata_order() {
        let layout = FeatureLayout::resolve(&[
            "avg_marks",
            "attendance_drop_flag",
            "lms_logins_per_day",
            "mystery",
            "attendance_change_pct",
        ]);
        let fv = layout.align(&derived());
        assert_eq!(fv.values, vec![64.0, 1.0, 0.25, 0.0, -8.25]);
        assert_eq!(fv.order.len(), layout.len());
        assert_eq!(layout.unknown_names(), vec!["mystery"]);
    }
}
