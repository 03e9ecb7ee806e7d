//! # Chunk Generation Tests
//!
//! End-to-end checks of the chunk pipeline: reproducibility, seamless
//! borders, settings-driven generation and the stored format.

use strata_core::{ContentRegistry, Vec3i, CONTENT_IGNORE};
use strata_mapgen::params::{MG_BIOMES, MG_CAVES, MG_DUNGEONS};
use strata_mapgen::{
    decode_chunk, encode_chunk, read_all, ChunkRequest, Mapgen, MapgenKind, MapgenParams, NoiseField, NoiseParams,
    Settings, Spread, TerrainShaper, VariantParams,
};

fn params(kind: MapgenKind, seed: u64) -> MapgenParams {
    MapgenParams {
        seed,
        variant: kind,
        chunk_size: 1,
        ..MapgenParams::default()
    }
}

fn mapgen(kind: MapgenKind, seed: u64) -> Mapgen {
    let p = params(kind, seed);
    Mapgen::new(p, VariantParams::defaults_for(kind), &ContentRegistry::with_defaults()).unwrap()
}

/// Test: two independent generators produce byte-identical chunks.
#[test]
fn test_same_chunk_twice_is_identical() {
    for kind in [MapgenKind::V7, MapgenKind::Valleys] {
        for blockpos in [Vec3i::new(0, 0, 0), Vec3i::new(-3, -2, 5), Vec3i::new(7, 1, -4)] {
            let request = ChunkRequest::new(blockpos, 1, 1234);
            let a = mapgen(kind, 1234).make_chunk(&request).unwrap();
            let b = mapgen(kind, 1234).make_chunk(&request).unwrap();
            assert_eq!(a.buffer.nodes(), b.buffer.nodes(), "{kind:?} at {blockpos}");
            assert_eq!(a.ground_level, b.ground_level);
            assert_eq!(a.heightmap, b.heightmap);
            assert_eq!(a.biomemap, b.biomemap);
        }
    }
}

/// Test: a different seed gives a different world.
#[test]
fn test_seed_changes_terrain() {
    let request = ChunkRequest::new(Vec3i::new(0, 0, 0), 1, 1);
    let a = mapgen(MapgenKind::V7, 1).make_chunk(&request).unwrap();
    let other = ChunkRequest { seed: 2, ..request };
    let b = mapgen(MapgenKind::V7, 2).make_chunk(&other).unwrap();
    assert_ne!(a.buffer.nodes(), b.buffer.nodes());
}

/// Test: bulk noise over two neighbouring chunks equals one fill over both.
#[test]
fn test_bulk_noise_is_world_absolute() {
    let np = NoiseParams::new(0.0, 1.0, Spread::new(40.0, 30.0, 40.0), 77, 3, 0.5);
    let mut wide = NoiseField::new(np, 9);
    let mut half = NoiseField::new(np, 9);

    wide.fill_3d(0, -4, 0, 32, 4, 4);
    half.fill_3d(16, -4, 0, 16, 4, 4);
    for z in 0..4 {
        for y in 0..4 {
            for x in 0..16 {
                let w = wide.result()[(z * 4 + y) * 32 + x + 16];
                let h = half.result()[(z * 4 + y) * 16 + x];
                assert!((w - h).abs() < 1e-6, "mismatch at ({x}, {y}, {z})");
            }
        }
    }
}

/// Test: terrain height changes by a bounded step across chunk borders.
#[test]
fn test_border_continuity() {
    for kind in [MapgenKind::V7, MapgenKind::Valleys] {
        let p = params(kind, 42);
        let shaper = TerrainShaper::new(&p, &VariantParams::defaults_for(kind));
        let mut worst = 0.0f32;
        for chunk in -20..20 {
            let border = chunk * 16;
            for z in (-400..400).step_by(37) {
                let last = shaper.base_terrain_level_at_point(border - 1, z);
                let first = shaper.base_terrain_level_at_point(border, z);
                worst = worst.max((last - first).abs());
            }
        }
        assert!(worst < 16.0, "{kind:?} border step {worst}");
    }
}

/// Test: adjacent generated chunks agree on the shape of the shared border.
#[test]
fn test_adjacent_chunk_heightmaps_meet() {
    let mut mg = mapgen(MapgenKind::V7, 42);
    let left = mg.make_chunk(&ChunkRequest::new(Vec3i::new(0, 0, 0), 1, 42)).unwrap();
    let right = mg.make_chunk(&ChunkRequest::new(Vec3i::new(1, 0, 0), 1, 42)).unwrap();
    for z in 0..16 {
        let a = i32::from(left.heightmap[z * 16 + 15]);
        let b = i32::from(right.heightmap[z * 16]);
        // Both clipped to the chunk's own range, so only compare when inside
        if (0..16).contains(&a) && (0..16).contains(&b) {
            assert!((a - b).abs() <= 12, "row {z}: {a} vs {b}");
        }
    }
}

/// Test: the chunk's node box is fully written.
#[test]
fn test_chunk_is_fully_populated() {
    for kind in [MapgenKind::V7, MapgenKind::Valleys] {
        let request = ChunkRequest::new(Vec3i::new(2, 0, 2), 1, 5);
        let result = mapgen(kind, 5).make_chunk(&request).unwrap();
        let area = request.node_area();
        for p in area.iter() {
            assert_ne!(result.buffer.get(p).content, CONTENT_IGNORE, "{kind:?} at {p}");
        }
    }
}

/// Test: the heightmap points at the first walkable node of each column.
#[test]
fn test_heightmap_matches_buffer() {
    let request = ChunkRequest::new(Vec3i::new(0, 0, 0), 1, 8);
    let mut p = params(MapgenKind::V7, 8);
    p.flags &= !(MG_CAVES | MG_DUNGEONS | MG_BIOMES);
    let mut mg = Mapgen::new(p, VariantParams::defaults_for(MapgenKind::V7), &ContentRegistry::with_defaults()).unwrap();
    let ids = *mg.content();
    let result = mg.make_chunk(&request).unwrap();
    let area = request.node_area();
    for (i, &h) in result.heightmap.iter().enumerate() {
        let x = area.min_edge.x + i32::try_from(i % 16).unwrap();
        let z = area.min_edge.z + i32::try_from(i / 16).unwrap();
        let h = i32::from(h);
        for y in (h + 1)..=area.max_edge.y {
            let c = result.buffer.get(Vec3i::new(x, y, z)).content;
            assert!(c == ids.air || c == ids.water || c == ids.river_water, "({x}, {y}, {z})");
        }
        if h >= area.min_edge.y {
            let c = result.buffer.get(Vec3i::new(x, h, z)).content;
            assert!(c != ids.air && c != ids.water);
        }
    }
}

/// Test: deep chunks are solid rock apart from carved space.
#[test]
fn test_deep_chunk_has_no_sky() {
    let request = ChunkRequest::new(Vec3i::new(0, -10, 0), 1, 3);
    let mut mg = mapgen(MapgenKind::V7, 3);
    let stone = mg.content().stone;
    let result = mg.make_chunk(&request).unwrap();
    let area = request.node_area();
    assert!(i32::from(result.ground_level) >= area.max_edge.y);
    let rock = area.iter().filter(|&p| result.buffer.get(p).content == stone).count();
    assert!(rock * 2 > area.volume(), "{rock} of {} nodes are stone", area.volume());
}

/// Test: a TOML world file drives the generator.
#[test]
fn test_generation_from_settings_file() {
    let text = r#"
seed = "77"
mg_name = "valleys"
chunksize = 1
water_level = 4
mg_flags = "caves, nodungeons"
mgvalleys_river_depth = 7
"#;
    let settings = Settings::from_toml_str(text).unwrap();
    let (params, variant) = read_all(&settings).unwrap();
    assert_eq!(params.seed, 77);
    assert_eq!(params.variant, MapgenKind::Valleys);
    assert_eq!(variant.kind(), MapgenKind::Valleys);

    let mut mg = Mapgen::new(params, variant, &ContentRegistry::with_defaults()).unwrap();
    let request = mg.request_for(Vec3i::ZERO);
    assert_eq!(request.seed, 77);
    let result = mg.make_chunk(&request).unwrap();
    let cobble = mg.content().cobble;
    assert!(result.buffer.nodes().iter().all(|n| n.content != cobble));
}

/// Test: a real chunk survives the stored format.
#[test]
fn test_stored_chunk_matches_generated() {
    let request = ChunkRequest::new(Vec3i::new(1, -1, 1), 1, 21);
    let result = mapgen(MapgenKind::V7, 21).make_chunk(&request).unwrap();
    let bytes = encode_chunk(&result);
    assert!(bytes.len() < result.buffer.nodes().len() * 4);

    let stored = decode_chunk(&bytes).unwrap();
    assert_eq!(stored.heightmap, result.heightmap);
    let buffer = stored.into_buffer().unwrap();
    assert_eq!(buffer.nodes(), result.buffer.nodes());
    assert_eq!(buffer.area(), result.buffer.area());
}

/// Test: spawn search returns a height above the sea or nothing.
#[test]
fn test_spawn_levels() {
    for kind in [MapgenKind::V7, MapgenKind::Valleys] {
        let mg = mapgen(kind, 42);
        let mut found = 0;
        for i in 0..64 {
            if let Some(y) = mg.spawn_level_at_point(i * 97, i * -53) {
                assert!(y > i32::from(mg.params().water_level), "{kind:?} spawn {y}");
                found += 1;
            }
        }
        assert!(found > 0, "{kind:?} found no spawn point");
    }
}

/// Test: a request covering no nodes yields an empty result, not a panic.
#[test]
fn test_empty_request_is_a_no_op() {
    let mut mg = mapgen(MapgenKind::V7, 3);
    for size in [0, -1, -5] {
        let request = ChunkRequest::new(Vec3i::ZERO, size, 3);
        assert!(request.node_area().has_empty_extent());
        let result = mg.make_chunk(&request).unwrap();
        assert_eq!(result.buffer.area().volume(), 0, "size {size}");
        assert!(result.buffer.nodes().is_empty());
        assert!(result.heightmap.is_empty());
        assert!(result.biomemap.is_empty());

        let stored = decode_chunk(&encode_chunk(&result)).unwrap();
        assert!(stored.nodes.is_empty());
    }
    let extreme = mg.make_chunk(&ChunkRequest::new(Vec3i::ZERO, i32::MIN, 3)).unwrap();
    assert_eq!(extreme.buffer.area().volume(), 0);

    // The generator is still usable afterwards
    let result = mg.make_chunk(&ChunkRequest::new(Vec3i::ZERO, 1, 3)).unwrap();
    assert_eq!(result.heightmap.len(), 256);
}
