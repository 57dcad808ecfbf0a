//! Inference benchmark: aligned feature batch → tree-ensemble predict.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array2;
use student_risk::model::{invoke, Classifier, TreeEnsemble};
use student_risk::{DerivedFeatures, FeatureLayout, StudentObservation};

/// Balanced tree of `depth` levels alternating over the four fallback features.
fn forest_json(n_trees: usize, depth: u32) -> String {
    let mut trees = Vec::with_capacity(n_trees);
    for t in 0..n_trees {
        let internal = (1usize << depth) - 1;
        let total = (1usize << (depth + 1)) - 1;
        let mut nodes = Vec::with_capacity(total);
        for i in 0..total {
            if i < internal {
                nodes.push(format!(
                    r#"{{"feature":{},"threshold":{:.1},"left":{},"right":{}}}"#,
                    (i + t) % 4,
                    (i % 7) as f64 - 3.0,
                    2 * i + 1,
                    2 * i + 2
                ));
            } else {
                let c = (i + t) % 3;
                let w: Vec<&str> = (0..3).map(|k| if k == c { "3.0" } else { "1.0" }).collect();
                nodes.push(format!(r#"{{"value":[{}]}}"#, w.join(",")));
            }
        }
        trees.push(format!(r#"{{"nodes":[{}]}}"#, nodes.join(",")));
    }
    format!(
        r#"{{"n_features":4,"classes":["Low","Medium","High"],"trees":[{}]}}"#,
        trees.join(",")
    )
}

fn observation() -> StudentObservation {
    StudentObservation {
        student_id: "0112".into(),
        attendance_current: 78.0,
        attendance_prev: 85.0,
        assignment_delay_avg: 4.0,
        marks_std: 12.0,
        lms_logins: 40,
        total_days: 120,
        avg_marks: None,
    }
}

fn bench_predict_single(c: &mut Criterion) {
    let model = TreeEnsemble::from_json_str(&forest_json(100, 6)).unwrap();
    let batch = Array2::from_shape_vec((1, 4), vec![-7.0, 4.0, 12.0, 0.33]).unwrap();

    c.bench_function("forest_predict_100x6", |b| {
        b.iter(|| model.predict(black_box(&batch)))
    });
}

fn bench_invoke(c: &mut Criterion) {
    let model = TreeEnsemble::from_json_str(&forest_json(100, 6)).unwrap();
    let fv = FeatureLayout::fallback().align(&DerivedFeatures::from_observation(&observation()));

    c.bench_function("invoke_guarded_100x6", |b| {
        b.iter(|| invoke(&model, black_box(&fv)))
    });
}

fn bench_forest_size(c: &mut Criterion) {
    let batch = Array2::from_shape_vec((1, 4), vec![-7.0, 4.0, 12.0, 0.33]).unwrap();

    let mut g = c.benchmark_group("forest_by_trees");
    for n in [10, 50, 100, 300] {
        let model = TreeEnsemble::from_json_str(&forest_json(n, 6)).unwrap();
        g.bench_function(format!("trees_{}", n).as_str(), |b| {
            b.iter(|| model.predict_proba(black_box(&batch)))
        });
    }
    g.finish();
}

criterion_group!(benches, bench_predict_single, bench_invoke, bench_forest_size);
criterion_main!(benches);
