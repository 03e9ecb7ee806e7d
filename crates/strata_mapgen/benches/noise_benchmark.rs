//! Benchmark for fractal noise sampling.
//!
//! Bulk fills are the hot path: one 80x80 2-D map and one 80x82x80 3-D
//! volume per chunk.
//!
//! Run with: cargo bench --package strata_mapgen --bench noise_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use strata_mapgen::noise::{NoiseField, NoiseParams, SimplexNoise, Spread, WorldSeed};

fn terrain_params() -> NoiseParams {
    NoiseParams::new(4.0, 70.0, Spread::uniform(600.0), 82341, 5, 0.6)
}

fn mountain_params() -> NoiseParams {
    NoiseParams::new(-0.6, 1.0, Spread::new(250.0, 350.0, 250.0), 5333, 5, 0.63)
}

fn benchmark_simplex_million(c: &mut Criterion) {
    let noise = SimplexNoise::new(WorldSeed::new(42));

    let mut group = c.benchmark_group("simplex_2d");
    group.throughput(Throughput::Elements(1_000_000));
    group.sample_size(10);
    group.bench_function("1M_samples", |b| {
        b.iter(|| {
            let mut acc = 0.0;
            for i in 0..1_000_000 {
                let x = f64::from(i % 10000) * 0.01;
                let y = f64::from(i / 10000) * 0.01;
                acc += noise.sample(x, y);
            }
            black_box(acc)
        });
    });
    group.finish();
}

fn benchmark_point_sample(c: &mut Criterion) {
    let field = NoiseField::new(terrain_params(), 42);

    c.bench_function("point_sample_2d_5_octaves", |b| {
        let mut x = 0.0f32;
        b.iter(|| {
            x += 1.0;
            black_box(field.sample_2d(black_box(x), black_box(x * 0.7)))
        });
    });
}

fn benchmark_fill_2d(c: &mut Criterion) {
    let mut field = NoiseField::new(terrain_params(), 42);

    let mut group = c.benchmark_group("fill_2d");
    group.throughput(Throughput::Elements(80 * 80));
    group.bench_function("chunk_80x80", |b| {
        b.iter(|| {
            field.fill_2d(black_box(-32), black_box(-32), 80, 80);
            black_box(field.result()[0])
        });
    });
    group.finish();
}

fn benchmark_fill_3d(c: &mut Criterion) {
    let mut field = NoiseField::new(mountain_params(), 42);

    let mut group = c.benchmark_group("fill_3d");
    group.throughput(Throughput::Elements(80 * 82 * 80));
    group.sample_size(10);
    group.bench_function("chunk_80x82x80", |b| {
        b.iter(|| {
            field.fill_3d(black_box(-32), black_box(-33), black_box(-32), 80, 82, 80);
            black_box(field.result()[0])
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_simplex_million,
    benchmark_point_sample,
    benchmark_fill_2d,
    benchmark_fill_3d
);
criterion_main!(benches);
