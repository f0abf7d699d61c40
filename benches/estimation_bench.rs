//! Benchmarks for load estimation and scenario analysis.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fluxo_engine::{analyze_series, estimate_load, VolumeSeries, SECONDS_PER_DAY};

/// One year of synthetic daily volumes with a weekly swing.
fn yearly_volumes() -> Vec<f64> {
    (0..365)
        .map(|day| 100_000.0 + 25_000.0 * ((day % 7) as f64))
        .collect()
}

fn bench_estimate(c: &mut Criterion) {
    let volumes = yearly_volumes();
    c.bench_function("estimate_load/365", |b| {
        b.iter(|| estimate_load(black_box(&volumes), black_box(SECONDS_PER_DAY)))
    });
}

fn bench_analyze(c: &mut Criterion) {
    let series = VolumeSeries::from_volumes(yearly_volumes());
    c.bench_function("analyze_series/365", |b| {
        b.iter(|| {
            analyze_series(
                black_box(&series),
                black_box(10.0),
                black_box(2),
                black_box(SECONDS_PER_DAY),
            )
        })
    });
}

criterion_group!(benches, bench_estimate, bench_analyze);
criterion_main!(benches);
