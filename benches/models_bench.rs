//! Benchmarks for the closed-form queueing models.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fluxo_engine::{mm1_metrics, mmc_metrics};

fn bench_mm1(c: &mut Criterion) {
    c.bench_function("mm1_metrics", |b| {
        b.iter(|| mm1_metrics(black_box(30.0), black_box(50.0)))
    });
}

fn bench_mmc_small(c: &mut Criterion) {
    c.bench_function("mmc_metrics/c=2", |b| {
        b.iter(|| mmc_metrics(black_box(30.0), black_box(20.0), black_box(2)))
    });
}

fn bench_mmc_large(c: &mut Criterion) {
    // The partial sum is O(c); this is the worst case the engine accepts in
    // everyday use.
    c.bench_function("mmc_metrics/c=500", |b| {
        b.iter(|| mmc_metrics(black_box(400.0), black_box(1.0), black_box(500)))
    });
}

criterion_group!(benches, bench_mm1, bench_mmc_small, bench_mmc_large);
criterion_main!(benches);
