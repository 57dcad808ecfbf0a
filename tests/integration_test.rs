//! Integration test: config load, model artifact load, end-to-end prediction, history store.

use std::path::Path;
use std::sync::Arc;
use student_risk::{
    config::{FeaturePolicy, ModelConfig, ServiceConfig},
    model::load_model,
    risk::{messages, RiskEngine, RiskLevel},
    storage::HistoryStore,
    PredictionFailure, StudentObservation,
};

/// Four-feature forest in the fallback order, classes encoded as integers.
const FOREST: &str = r#"{
    "n_features": 4,
    "classes": [0, 1, 2],
    "scaler": {"mean": [0.0, 0.0, 0.0, 0.0], "scale": [1.0, 1.0, 1.0, 1.0]},
    "trees": [
        {"nodes": [
            {"feature": 0, "threshold": -5.0, "left": 1, "right": 2},
            {"value": [0.0, 2.0, 8.0]},
            {"feature": 3, "threshold": 0.3, "left": 3, "right": 4},
            {"value": [1.0, 7.0, 2.0]},
            {"value": [9.0, 1.0, 0.0]}
        ]},
        {"nodes": [
            {"feature": 1, "threshold": 3.0, "left": 1, "right": 2},
            {"value": [7.0, 3.0, 0.0]},
            {"value": [0.0, 4.0, 6.0]}
        ]}
    ]
}"#;

fn write(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    let p = dir.join(name);
    std::fs::write(&p, body).unwrap();
    p
}

fn student(id: &str, current: f64, prev: f64, delay: f64, logins: i64) -> StudentObservation {
    StudentObservation {
        student_id: id.into(),
        attendance_current: current,
        attendance_prev: prev,
        assignment_delay_avg: delay,
        marks_std: 12.0,
        lms_logins: logins,
        total_days: 120,
        avg_marks: None,
    }
}

#[test]
fn config_load_default() {
    let c = ServiceConfig::load(Path::new("nonexistent.json"));
    assert_eq!(c.model.feature_policy, FeaturePolicy::ZeroFill);
    assert!(c.store.enabled);
}

#[test]
fn reference_student_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let config = ModelConfig {
        path: write(dir.path(), "risk_model.json", FOREST),
        meta_path: dir.path().join("model_meta.json"),
        feature_policy: FeaturePolicy::ZeroFill,
    };
    let store = Arc::new(HistoryStore::open(&dir.path().join("history.db")).unwrap());
    let engine = RiskEngine::from_loaded(load_model(&config).unwrap()).with_sink(store.clone());

    let r = engine.handle(&student("0112", 78.0, 85.0, 4.0, 40)).unwrap();
    // tree 1: trend -7 <= -5 → [0, .2, .8]; tree 2: delay 4 > 3 → [0, .4, .6]
    assert_eq!(r.risk_level, RiskLevel::High);
    assert_eq!(r.confidence, 0.7);
    assert_eq!(r.recommended_action, messages::STRICT_MONITORING);
    assert!(r.reasons.iter().any(|s| s == messages::ATTENDANCE_DROP));
    assert!(r.reasons.iter().any(|s| s == messages::SUBMISSION_DELAYS));
    assert_eq!(r.reasons.len(), 2);

    let safe = engine.handle(&student("0113", 90.0, 88.0, 1.0, 100)).unwrap();
    assert_eq!(safe.risk_level, RiskLevel::Low);
    assert_eq!(safe.reasons, vec![messages::WITHIN_SAFE_RANGE]);
    assert_eq!(safe.recommended_action, messages::CONTINUE_PLAN);

    let history = store.student_history("0112").unwrap();
    assert_eq!(history.risks, vec![RiskLevel::High]);
    let summary = store.teacher_summary().unwrap();
    assert_eq!(summary.total_students, 2);
    assert_eq!(summary.counts.high, 1);
    assert_eq!(summary.counts.low, 1);
}

#[test]
fn metadata_order_mismatch_is_a_structured_failure() {
    let dir = tempfile::tempdir().unwrap();
    let config = ModelConfig {
        path: write(dir.path(), "risk_model.json", FOREST),
        meta_path: write(
            dir.path(),
            "model_meta.json",
            r#"{"features":["attendance_trend","attendance_change_pct","attendance_drop_flag",
                "assignment_delay_avg","marks_std","engagement_score"]}"#,
        ),
        feature_policy: FeaturePolicy::ZeroFill,
    };
    let store = Arc::new(HistoryStore::open(&dir.path().join("history.db")).unwrap());
    let engine = RiskEngine::from_loaded(load_model(&config).unwrap()).with_sink(store.clone());

    let failure = engine.handle(&student("0112", 78.0, 85.0, 4.0, 40)).unwrap_err();
    assert_eq!(failure.error, PredictionFailure::MODEL_FAILED);
    assert_eq!(failure.details, "input has 6 features, model expects 4");
    assert_eq!(failure.feature_order.as_ref().map(Vec::len), Some(6));
    let x = failure.x.unwrap();
    assert_eq!(x[0][0], -7.0);
    assert_eq!(x[0][2], 1.0);

    assert!(store.history_rows(None).unwrap().is_empty());
}

#[test]
fn unknown_metadata_feature_is_sent_as_zero() {
    let dir = tempfile::tempdir().unwrap();
    let config = ModelConfig {
        path: write(dir.path(), "risk_model.json", FOREST),
        meta_path: write(
            dir.path(),
            "model_meta.json",
            r#"{"features":["attendance_trend","assignment_delay_avg","marks_std","forum_posts"]}"#,
        ),
        feature_policy: FeaturePolicy::ZeroFill,
    };
    let loaded = load_model(&config).unwrap();
    assert_eq!(loaded.layout.unknown_names(), vec!["forum_posts"]);

    let engine = RiskEngine::from_loaded(loaded);
    // forum_posts is zero-filled, so tree 1 takes its low-engagement branch
    let r = engine.predict(&student("0301", 90.0, 88.0, 1.0, 100)).unwrap();
    assert_eq!(r.risk_level, RiskLevel::Medium);
    assert_eq!(r.confidence, 0.5);
}
