//! Scoring benchmark: baseline fit and max z-score per vector.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sentinel_engine::model::Baseline;

fn training_window(n: usize) -> Vec<[f64; 4]> {
    (0..n)
        .map(|i| [60.0 + (i % 40) as f64 * 25.0, (i % 2) as f64, ((i + 1) % 2) as f64, 443.0])
        .collect()
}

fn bench_fit(c: &mut Criterion) {
    let mut g = c.benchmark_group("baseline_fit");
    for n in [10, 100, 1000] {
        let samples = training_window(n);
        g.bench_function(format!("samples_{}", n).as_str(), |b| {
            b.iter(|| Baseline::fit(black_box(&samples)).unwrap())
        });
    }
    g.finish();
}

fn bench_score(c: &mut Criterion) {
    let baseline = Baseline::fit(&training_window(10)).unwrap();
    let v = [1500.0, 1.0, 0.0, 8080.0];

    c.bench_function("score_one_vector", |b| {
        b.iter(|| baseline.score(black_box(&v)))
    });
}

criterion_group!(benches, bench_fit, bench_score);
criterion_main!(benches);
