//! Benchmark for whole-chunk generation.
//!
//! Run with: cargo bench --package strata_mapgen --bench chunk_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use strata_core::{ContentRegistry, Vec3i, VoxelBuffer};
use strata_mapgen::{ChunkRequest, MapgenKind, Mapgen, MapgenParams, VariantParams};

fn mapgen(kind: MapgenKind) -> Mapgen {
    let params = MapgenParams {
        seed: 42,
        variant: kind,
        ..MapgenParams::default()
    };
    let variant = VariantParams::defaults_for(kind);
    Mapgen::new(params, variant, &ContentRegistry::with_defaults()).expect("default content resolves")
}

fn benchmark_make_chunk(c: &mut Criterion) {
    let mut group = c.benchmark_group("make_chunk");
    group.sample_size(10);

    for kind in [MapgenKind::V7, MapgenKind::Valleys] {
        let mut mg = mapgen(kind);
        let request = mg.request_for(Vec3i::ZERO);
        let mut buffer = Some(VoxelBuffer::new());
        group.bench_function(kind.name(), |b| {
            b.iter(|| {
                let result = mg
                    .make_chunk_into(black_box(&request), buffer.take().unwrap_or_default())
                    .expect("origin chunk is within limits");
                let level = result.ground_level;
                buffer = Some(result.buffer);
                black_box(level)
            });
        });
    }
    group.finish();
}

fn benchmark_underground_chunk(c: &mut Criterion) {
    let mut mg = mapgen(MapgenKind::V7);
    let request = ChunkRequest::new(Vec3i::new(-2, -17, -2), 5, 42);

    let mut group = c.benchmark_group("underground");
    group.sample_size(10);
    group.bench_function("caves_and_caverns", |b| {
        b.iter(|| black_box(mg.make_chunk(&request).expect("within limits").ground_level));
    });
    group.finish();
}

criterion_group!(benches, benchmark_make_chunk, benchmark_underground_chunk);
criterion_main!(benches);
