//! Criterion benchmarks for `dg-math` generator stepping.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dg_math::{CosineGenerator, DataGenerator};

fn bench_next(c: &mut Criterion) {
    let mut group = c.benchmark_group("cosine_next");

    group.bench_function("unit_rotation", |b| {
        let mut g = CosineGenerator::new(0.0, 1.0).unwrap();
        b.iter(|| black_box(g.next()));
    });

    // Every step overflows and resets.
    group.bench_function("overflow_reset", |b| {
        b.iter(|| {
            let mut g = CosineGenerator::new(1e300, f64::MAX).unwrap();
            black_box(g.next_with_event())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_next);
criterion_main!(benches);
