//! History store benchmark: record predictions and build aggregate reports.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use student_risk::features::LoggedFeatures;
use student_risk::storage::HistoryStore;
use student_risk::{PredictionResult, RiskLevel};
use tempfile::tempdir;

fn sample(i: usize) -> (LoggedFeatures, PredictionResult) {
    let features = LoggedFeatures {
        attendance_trend: -7.0 + (i % 10) as f64,
        assignment_delay_avg: (i % 5) as f64,
        marks_std: 12.0,
        engagement_score: 0.33,
    };
    let result = PredictionResult {
        student_id: format!("{:02}{:02}", i % 8, i % 50),
        risk_level: RiskLevel::ALL[i % 3],
        confidence: 0.7,
        recommended_action: "Continue current academic plan".into(),
        reasons: vec![],
    };
    (features, result)
}

fn bench_record_prediction(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let store = HistoryStore::open(&dir.path().join("history.db")).unwrap();
    let (features, result) = sample(0);

    c.bench_function("storage_record_prediction", |b| {
        b.iter(|| store.record_prediction(black_box(&features), black_box(&result)).unwrap())
    });
}

fn bench_reports(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let store = HistoryStore::open(&dir.path().join("history.db")).unwrap();
    for i in 0..1_000 {
        let (features, result) = sample(i);
        store.record_prediction(&features, &result).unwrap();
    }

    c.bench_function("storage_teacher_summary_1k", |b| {
        b.iter(|| black_box(store.teacher_summary()).unwrap())
    });
    c.bench_function("storage_cohort_stats_1k", |b| {
        b.iter(|| black_box(store.cohort_stats()).unwrap())
    });
    c.bench_function("storage_cohort_export_1k", |b| {
        b.iter(|| black_box(store.cohort_export(Some("03"))).unwrap())
    });
}

criterion_group!(benches, bench_record_prediction, bench_reports);
criterion_main!(benches);
