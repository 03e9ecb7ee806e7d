//! # Chunk Orchestrator
//!
//! [`Mapgen`] turns one [`ChunkRequest`] into a populated [`VoxelBuffer`].
//!
//! ## Stages
//!
//! ```text
//! Requested ─► NoiseComputed ─► TerrainShaped ─► Carved ─► Decorated ─► Complete
//!                climate +        shaper,          caverns,   optional
//!                shaper noise     heightmap,       tunnels,   Decorator
//!                                 biome cover      walks,
//!                                                  dungeons
//! ```
//!
//! Every stage runs exactly once. The only failure is a request that lies
//! entirely beyond the generation limit, which is rejected before any
//! stage starts, so a partial chunk is never returned. A request covering
//! no nodes is not an error: it returns an empty result.
//!
//! ## Reuse
//!
//! A `Mapgen` owns its noise fields and reuses them from chunk to chunk.
//! A request carrying a different world seed re-seeds them in place.
//! [`Mapgen::make_chunk_into`] also reuses the caller's buffer allocation.

use std::fmt;

use strata_core::{
    ContentId, ContentRegistry, Vec3i, VoxelArea, VoxelBuffer, CONTENT_AIR, CONTENT_IGNORE, MAP_BLOCKSIZE,
};

use crate::biome::{generate_biomes, Biome, BiomeAssigner, BiomeContent};
use crate::caves::CaveCarver;
use crate::dungeon::DungeonGen;
use crate::error::{MapgenError, MapgenResult};
use crate::params::{
    MapgenKind, MapgenParams, VariantParams, MAX_MAP_GENERATION_LIMIT, MG_BIOMES, MG_CAVES, MG_DECORATIONS, MG_DUNGEONS,
};
use crate::shaper::{ShapeContext, TerrainShaper};

// ============================================================================
// CONTENT
// ============================================================================

/// Content ids every shaper and carver needs, resolved once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TerrainContent {
    /// Raw terrain rock.
    pub stone: ContentId,
    /// Sea water.
    pub water: ContentId,
    /// River water.
    pub river_water: ContentId,
    /// Deep flooded caves.
    pub lava: ContentId,
    /// Dungeon walls above water.
    pub cobble: ContentId,
    /// Dungeon walls at or below water.
    pub mossycobble: ContentId,
    /// Always [`CONTENT_AIR`].
    pub air: ContentId,
    /// Always [`CONTENT_IGNORE`].
    pub ignore: ContentId,
}

impl TerrainContent {
    /// Looks up every terrain node by name.
    ///
    /// # Errors
    ///
    /// [`MapgenError::UnknownContent`] naming the first missing node.
    pub fn resolve(registry: &ContentRegistry) -> MapgenResult<Self> {
        let id = |name: &str| -> MapgenResult<ContentId> {
            registry
                .lookup(name)
                .ok_or_else(|| MapgenError::UnknownContent(name.to_owned()))
        };
        Ok(Self {
            stone: id("stone")?,
            water: id("water_source")?,
            river_water: id("river_water_source")?,
            lava: id("lava_source")?,
            cobble: id("cobble")?,
            mossycobble: id("mossycobble")?,
            air: CONTENT_AIR,
            ignore: CONTENT_IGNORE,
        })
    }
}

// ============================================================================
// REQUESTS AND RESULTS
// ============================================================================

/// Pipeline stage of one chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum GenerationStage {
    /// Accepted, nothing computed.
    Requested,
    /// Climate and shaper noise filled.
    NoiseComputed,
    /// Raw terrain, heightmap and biome cover written.
    TerrainShaped,
    /// Caves, caverns and dungeons carved.
    Carved,
    /// External decoration hook ran.
    Decorated,
    /// Ready to hand off.
    Complete,
}

impl GenerationStage {
    /// Stage name for logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::NoiseComputed => "noise_computed",
            Self::TerrainShaped => "terrain_shaped",
            Self::Carved => "carved",
            Self::Decorated => "decorated",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A request for one chunk.
///
/// Positions are in 16-node blocks. A chunk is `chunk_size` blocks along
/// every axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkRequest {
    /// Lowest block of the chunk.
    pub blockpos_min: Vec3i,
    /// Chunk edge length in blocks.
    pub chunk_size: i32,
    /// World seed to generate with.
    pub seed: u64,
}

impl ChunkRequest {
    /// A request for the chunk starting at `blockpos_min`.
    #[inline]
    #[must_use]
    pub const fn new(blockpos_min: Vec3i, chunk_size: i32, seed: u64) -> Self {
        Self {
            blockpos_min,
            chunk_size,
            seed,
        }
    }

    /// The request for the chunk containing `blockpos`.
    ///
    /// Chunks are offset by half a chunk so that the default five-block
    /// chunk straddles y = 0 with two blocks below and three above.
    #[must_use]
    pub fn containing(blockpos: Vec3i, params: &MapgenParams) -> Self {
        let cs = i32::from(params.chunk_size);
        let coff = -cs / 2;
        let rel = blockpos - Vec3i::splat(coff);
        let chunk = Vec3i::new(rel.x.div_euclid(cs), rel.y.div_euclid(cs), rel.z.div_euclid(cs));
        Self::new(chunk.scale(cs) + Vec3i::splat(coff), cs, params.seed)
    }

    /// Highest block of the chunk.
    #[inline]
    #[must_use]
    pub fn blockpos_max(&self) -> Vec3i {
        self.blockpos_min + Vec3i::splat(self.chunk_size - 1)
    }

    /// The chunk's node box.
    #[must_use]
    pub fn node_area(&self) -> VoxelArea {
        VoxelArea::new(
            self.blockpos_min.block_to_node(),
            self.blockpos_max().block_to_node() + Vec3i::splat(MAP_BLOCKSIZE - 1),
        )
    }

    /// The node box padded by one block on every side.
    #[must_use]
    pub fn full_area(&self) -> VoxelArea {
        self.node_area().pad(Vec3i::splat(MAP_BLOCKSIZE))
    }
}

/// A generated chunk, ready for storage.
#[derive(Clone, Debug)]
pub struct ChunkResult {
    /// What was asked for.
    pub request: ChunkRequest,
    /// Nodes over [`ChunkRequest::full_area`].
    pub buffer: VoxelBuffer,
    /// Y of the first walkable node from the top, per column, x fastest.
    pub heightmap: Vec<i16>,
    /// Surface biome per column, x fastest.
    pub biomemap: Vec<Biome>,
    /// Highest stone Y of the chunk.
    pub ground_level: i16,
}

/// Read-only view of a chunk handed to a [`Decorator`].
#[derive(Clone, Copy, Debug)]
pub struct ChunkContext<'a> {
    /// Lowest node of the chunk.
    pub node_min: Vec3i,
    /// Highest node of the chunk.
    pub node_max: Vec3i,
    /// Deterministic seed of this chunk.
    pub blockseed: u64,
    /// Sea level.
    pub water_level: i32,
    /// Surface Y per column.
    pub heightmap: &'a [i16],
    /// Surface biome per column.
    pub biomemap: &'a [Biome],
}

/// External decoration pass (plants, ores, schematics) run after carving.
pub trait Decorator: Send {
    /// Decorates the chunk in place.
    fn decorate(&mut self, vm: &mut VoxelBuffer, ctx: &ChunkContext<'_>);
}

/// Deterministic per-chunk seed derived from the chunk's lowest node.
#[inline]
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub fn blockseed(node_min: Vec3i, seed: u64) -> u64 {
    seed.wrapping_add(i64::from(node_min.z).wrapping_mul(38_134_234) as u64)
        .wrapping_add(i64::from(node_min.y).wrapping_mul(42_123) as u64)
        .wrapping_add(i64::from(node_min.x).wrapping_mul(23) as u64)
}

/// Narrows a node Y to `i16`, saturating at the type bounds.
#[inline]
fn saturate_i16(y: i32) -> i16 {
    i16::try_from(y).unwrap_or(if y < 0 { i16::MIN } else { i16::MAX })
}

// ============================================================================
// MAPGEN
// ============================================================================

/// Generates chunks for one world with one terrain variant.
///
/// Not shared between threads: each emerge worker owns its own.
pub struct Mapgen {
    params: MapgenParams,
    world_seed: u64,
    ids: TerrainContent,
    ground: Vec<bool>,
    walkable: Vec<bool>,
    shaper: TerrainShaper,
    assigner: BiomeAssigner,
    biome_content: BiomeContent,
    carver: CaveCarver,
    dungeons: DungeonGen,
    decorator: Option<Box<dyn Decorator>>,
}

impl Mapgen {
    /// Builds a generator and resolves every content id it will write.
    ///
    /// # Errors
    ///
    /// - [`MapgenError::UnknownContent`] if the registry lacks a terrain or
    ///   biome node
    /// - [`MapgenError::InvalidSetting`] if `variant` does not match
    ///   `params.variant`
    pub fn new(params: MapgenParams, variant: VariantParams, registry: &ContentRegistry) -> MapgenResult<Self> {
        if variant.kind() != params.variant {
            return Err(MapgenError::InvalidSetting {
                key: "mg_name".to_owned(),
                reason: format!(
                    "variant parameters are for {}, world uses {}",
                    variant.kind().name(),
                    params.variant.name()
                ),
            });
        }

        let ids = TerrainContent::resolve(registry)?;
        let biome_content = BiomeContent::resolve(registry)?;
        let ground = registry.ground_content_table();
        let walkable = (0..=ContentId::MAX)
            .take(ground.len())
            .map(|id| {
                id != CONTENT_AIR && id != CONTENT_IGNORE && !registry.features(id).is_liquid
            })
            .collect();

        let shaper = TerrainShaper::new(&params, &variant);
        let carver = CaveCarver::new(variant.caves(), params.seed, shaper.has_caverns());
        let dungeons = DungeonGen::new(variant.caves(), params.seed);

        Ok(Self {
            world_seed: params.seed,
            ids,
            ground,
            walkable,
            assigner: BiomeAssigner::new(&params),
            biome_content,
            shaper,
            carver,
            dungeons,
            decorator: None,
            params,
        })
    }

    /// World parameters.
    #[must_use]
    pub const fn params(&self) -> &MapgenParams {
        &self.params
    }

    /// Terrain variant.
    #[must_use]
    pub const fn kind(&self) -> MapgenKind {
        self.shaper.kind()
    }

    /// Resolved terrain content.
    #[must_use]
    pub const fn content(&self) -> &TerrainContent {
        &self.ids
    }

    /// Installs the decoration pass.
    pub fn set_decorator(&mut self, decorator: Box<dyn Decorator>) {
        self.decorator = Some(decorator);
    }

    /// A request for the chunk containing `blockpos` in this world.
    #[must_use]
    pub fn request_for(&self, blockpos: Vec3i) -> ChunkRequest {
        ChunkRequest::containing(blockpos, &self.params)
    }

    /// Y at which a player may spawn in column `(x, z)`.
    ///
    /// `None` if the column is unsuitable or beyond the generation limit.
    #[must_use]
    pub fn spawn_level_at_point(&self, x: i32, z: i32) -> Option<i32> {
        let limit = i32::from(self.params.mapgen_limit);
        if x.abs() > limit || z.abs() > limit {
            return None;
        }
        self.shaper.spawn_level_at_point(x, z)
    }

    /// Generates a chunk into a fresh buffer.
    ///
    /// # Errors
    ///
    /// [`MapgenError::OutOfLimits`] if the chunk lies entirely beyond the
    /// generation limit.
    pub fn make_chunk(&mut self, request: &ChunkRequest) -> MapgenResult<ChunkResult> {
        self.make_chunk_into(request, VoxelBuffer::new())
    }

    /// Generates a chunk into `buffer`, reusing its allocation.
    ///
    /// A request with `chunk_size < 1` covers no nodes: the result has an
    /// empty buffer, heightmap and biome map, and no stage runs.
    ///
    /// # Errors
    ///
    /// [`MapgenError::OutOfLimits`] if the chunk lies entirely beyond the
    /// generation limit.
    pub fn make_chunk_into(&mut self, request: &ChunkRequest, mut buffer: VoxelBuffer) -> MapgenResult<ChunkResult> {
        if request.chunk_size < 1 {
            tracing::debug!("chunk {} has no nodes (size {})", request.blockpos_min, request.chunk_size);
            buffer.reset(VoxelArea::EMPTY);
            return Ok(ChunkResult {
                request: *request,
                buffer,
                heightmap: Vec::new(),
                biomemap: Vec::new(),
                ground_level: -MAX_MAP_GENERATION_LIMIT,
            });
        }
        let node_area = request.node_area();
        let (node_min, node_max) = (node_area.min_edge, node_area.max_edge);
        let limit = i32::from(self.params.mapgen_limit);
        if fully_beyond(node_min, node_max, limit) {
            return Err(MapgenError::OutOfLimits(request.blockpos_min));
        }

        let mut stage = GenerationStage::Requested;
        tracing::trace!("chunk {} stage {}", request.blockpos_min, stage);

        if request.seed != self.world_seed {
            self.reseed(request.seed);
        }
        buffer.reset(request.full_area());

        let water_level = i32::from(self.params.water_level);
        let ctx = ShapeContext {
            node_min,
            node_max,
            water_level,
            mapgen_limit: limit,
            ids: self.ids,
        };
        let seed = blockseed(node_min, request.seed);

        // Noise
        self.assigner
            .calc_climate(node_min.x, node_min.z, ctx.size_x(), ctx.size_z());
        self.shaper.compute_noise(&ctx);
        stage = advance(request, stage, GenerationStage::NoiseComputed);

        // Terrain
        let stone_surface_max_y = self.shaper.generate_terrain(&mut buffer, &ctx, &mut self.assigner);
        let heightmap = self.update_heightmap(&buffer, node_min, node_max);
        let mut biomemap = Vec::new();
        if self.params.flags & MG_BIOMES != 0 {
            generate_biomes(
                &mut buffer,
                node_min,
                node_max,
                water_level,
                &self.ids,
                &self.assigner,
                &self.biome_content,
                self.shaper.filler_depth(),
                &mut biomemap,
            );
        } else {
            let surface_y = node_max.y.min(water_level);
            biomemap.extend((0..heightmap.len()).map(|i| self.assigner.biome_at_index(i, surface_y)));
        }
        stage = advance(request, stage, GenerationStage::TerrainShaped);

        // Carving
        if self.params.flags & MG_CAVES != 0 {
            self.carver.carve(
                &mut buffer,
                &ctx,
                &self.ground,
                &heightmap,
                &biomemap,
                &self.biome_content,
                stone_surface_max_y,
                seed,
            );
        }
        let mut rooms = 0;
        if self.params.flags & MG_DUNGEONS != 0 {
            rooms = self
                .dungeons
                .generate(&mut buffer, &ctx, &self.ground, stone_surface_max_y, seed);
        }
        stage = advance(request, stage, GenerationStage::Carved);

        // Decoration
        if self.params.flags & MG_DECORATIONS != 0 {
            if let Some(decorator) = self.decorator.as_mut() {
                let chunk = ChunkContext {
                    node_min,
                    node_max,
                    blockseed: seed,
                    water_level,
                    heightmap: &heightmap,
                    biomemap: &biomemap,
                };
                decorator.decorate(&mut buffer, &chunk);
            }
        }
        stage = advance(request, stage, GenerationStage::Decorated);

        let ground_level = saturate_i16(stone_surface_max_y);
        advance(request, stage, GenerationStage::Complete);
        tracing::debug!(
            "chunk {} generated: {} nodes, ground level {}, {} dungeon rooms",
            request.blockpos_min,
            buffer.area().volume(),
            ground_level,
            rooms
        );

        Ok(ChunkResult {
            request: *request,
            buffer,
            heightmap,
            biomemap,
            ground_level,
        })
    }

    fn reseed(&mut self, seed: u64) {
        self.world_seed = seed;
        self.shaper.reseed(seed);
        self.assigner.reseed(seed);
        self.carver.reseed(seed);
        self.dungeons.reseed(seed);
    }

    /// First walkable node from the top of every column, or `node_min.y - 1`.
    fn update_heightmap(&self, vm: &VoxelBuffer, node_min: Vec3i, node_max: Vec3i) -> Vec<i16> {
        let area = vm.area();
        let ystride = area.ystride();
        let sx = usize::try_from(node_max.x - node_min.x + 1).unwrap_or(0);
        let sz = usize::try_from(node_max.z - node_min.z + 1).unwrap_or(0);
        let mut heightmap = Vec::with_capacity(sx * sz);
        for z in node_min.z..=node_max.z {
            for x in node_min.x..=node_max.x {
                let mut vi = area.index(x, node_max.y, z);
                let mut level = node_min.y - 1;
                for y in (node_min.y..=node_max.y).rev() {
                    let c = usize::from(vm.node_at(vi).content);
                    if self.walkable.get(c).copied().unwrap_or(false) {
                        level = y;
                        break;
                    }
                    vi -= ystride;
                }
                heightmap.push(saturate_i16(level));
            }
        }
        heightmap
    }
}

fn advance(request: &ChunkRequest, from: GenerationStage, to: GenerationStage) -> GenerationStage {
    debug_assert!(to > from, "stage {from} cannot advance to {to}");
    tracing::trace!("chunk {} stage {}", request.blockpos_min, to);
    to
}

/// True if no node of the box lies within `limit` of the origin.
fn fully_beyond(node_min: Vec3i, node_max: Vec3i, limit: i32) -> bool {
    node_min.x > limit
        || node_min.y > limit
        || node_min.z > limit
        || node_max.x < -limit
        || node_max.y < -limit
        || node_max.z < -limit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::V7Params;

    fn small_params() -> MapgenParams {
        MapgenParams {
            chunk_size: 1,
            seed: 4,
            ..MapgenParams::default()
        }
    }

    fn mapgen(params: MapgenParams) -> Mapgen {
        let variant = VariantParams::defaults_for(params.variant);
        Mapgen::new(params, variant, &ContentRegistry::with_defaults()).unwrap()
    }

    #[test]
    fn test_resolve_terrain_content() {
        let reg = ContentRegistry::with_defaults();
        let ids = TerrainContent::resolve(&reg).unwrap();
        assert_eq!(Some(ids.stone), reg.lookup("stone"));
        assert_eq!(ids.air, CONTENT_AIR);
        assert!(matches!(
            TerrainContent::resolve(&ContentRegistry::new()),
            Err(MapgenError::UnknownContent(name)) if name == "stone"
        ));
    }

    #[test]
    fn test_request_areas() {
        let req = ChunkRequest::new(Vec3i::new(-2, -2, -2), 5, 0);
        let area = req.node_area();
        assert_eq!(area.min_edge, Vec3i::splat(-32));
        assert_eq!(area.max_edge, Vec3i::splat(47));
        let full = req.full_area();
        assert_eq!(full.min_edge, Vec3i::splat(-48));
        assert_eq!(full.max_edge, Vec3i::splat(63));
    }

    #[test]
    fn test_containing_chunk() {
        let params = MapgenParams::default();
        let origin = ChunkRequest::containing(Vec3i::ZERO, &params);
        assert_eq!(origin.blockpos_min, Vec3i::splat(-2));
        let edge = ChunkRequest::containing(Vec3i::new(2, -2, 3), &params);
        assert_eq!(edge.blockpos_min, Vec3i::new(-2, -2, 3));
        let below = ChunkRequest::containing(Vec3i::new(0, -3, 0), &params);
        assert_eq!(below.blockpos_min, Vec3i::new(-2, -7, -2));
    }

    #[test]
    fn test_blockseed_varies_by_position() {
        let a = blockseed(Vec3i::new(0, 0, 0), 1);
        let b = blockseed(Vec3i::new(16, 0, 0), 1);
        let c = blockseed(Vec3i::new(0, 0, 0), 2);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, blockseed(Vec3i::new(0, 0, 0), 1));
    }

    #[test]
    fn test_variant_mismatch_rejected() {
        let params = MapgenParams::default();
        let variant = VariantParams::defaults_for(MapgenKind::Valleys);
        assert!(matches!(
            Mapgen::new(params, variant, &ContentRegistry::with_defaults()),
            Err(MapgenError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn test_out_of_limits() {
        let mut mg = mapgen(MapgenParams {
            mapgen_limit: 100,
            ..small_params()
        });
        let far = ChunkRequest::new(Vec3i::new(10, 0, 0), 1, 4);
        assert!(matches!(mg.make_chunk(&far), Err(MapgenError::OutOfLimits(_))));
        let near = ChunkRequest::new(Vec3i::new(6, 0, 0), 1, 4);
        assert!(mg.make_chunk(&near).is_ok());
    }

    #[test]
    fn test_chunk_summary_shapes() {
        let mut mg = mapgen(small_params());
        let req = ChunkRequest::new(Vec3i::new(0, -1, 0), 1, 4);
        let result = mg.make_chunk(&req).unwrap();
        assert_eq!(*result.buffer.area(), req.full_area());
        assert_eq!(result.heightmap.len(), 256);
        assert_eq!(result.biomemap.len(), 256);
        for &h in &result.heightmap {
            assert!((-17..=-1).contains(&h));
        }
    }

    #[test]
    fn test_make_chunk_is_deterministic() {
        let req = ChunkRequest::new(Vec3i::new(1, -1, 2), 1, 4);
        let a = mapgen(small_params()).make_chunk(&req).unwrap();
        let b = mapgen(small_params()).make_chunk(&req).unwrap();
        assert_eq!(a.buffer.nodes(), b.buffer.nodes());
        assert_eq!(a.ground_level, b.ground_level);
        assert_eq!(a.heightmap, b.heightmap);
    }

    #[test]
    fn test_reseed_matches_fresh_generator() {
        let req = ChunkRequest::new(Vec3i::new(0, -1, 0), 1, 99);
        let reseeded = mapgen(small_params()).make_chunk(&req).unwrap();
        let fresh = mapgen(MapgenParams {
            seed: 99,
            ..small_params()
        })
        .make_chunk(&req)
        .unwrap();
        assert_eq!(reseeded.buffer.nodes(), fresh.buffer.nodes());
    }

    #[test]
    fn test_buffer_reuse() {
        let mut mg = mapgen(small_params());
        let req = ChunkRequest::new(Vec3i::new(0, -1, 0), 1, 4);
        let first = mg.make_chunk(&req).unwrap();
        let other = ChunkRequest::new(Vec3i::new(3, -1, 3), 1, 4);
        let reused = mg.make_chunk_into(&other, first.buffer).unwrap();
        let fresh = mg.make_chunk(&other).unwrap();
        assert_eq!(reused.buffer.nodes(), fresh.buffer.nodes());
    }

    struct MarkTop(u32);

    impl Decorator for MarkTop {
        fn decorate(&mut self, vm: &mut VoxelBuffer, ctx: &ChunkContext<'_>) {
            self.0 += 1;
            vm.set(ctx.node_max, strata_core::MapNode::new(CONTENT_IGNORE));
        }
    }

    #[test]
    fn test_decorator_runs_when_enabled() {
        let mut mg = mapgen(small_params());
        mg.set_decorator(Box::new(MarkTop(0)));
        let req = ChunkRequest::new(Vec3i::new(0, -1, 0), 1, 4);
        let result = mg.make_chunk(&req).unwrap();
        assert!(result.buffer.get(req.node_area().max_edge).is_ignore());

        let mut plain = mapgen(MapgenParams {
            flags: small_params().flags & !MG_DECORATIONS,
            ..small_params()
        });
        plain.set_decorator(Box::new(MarkTop(0)));
        let result = plain.make_chunk(&req).unwrap();
        assert!(!result.buffer.get(req.node_area().max_edge).is_ignore());
    }

    #[test]
    fn test_spawn_level_beyond_limit() {
        let mg = mapgen(MapgenParams {
            mapgen_limit: 100,
            ..small_params()
        });
        assert_eq!(mg.spawn_level_at_point(5000, 0), None);
    }

    #[test]
    fn test_v7_defaults_build() {
        let params = MapgenParams::default();
        let mg = Mapgen::new(
            params,
            VariantParams::V7(V7Params::default()),
            &ContentRegistry::with_defaults(),
        )
        .unwrap();
        assert_eq!(mg.kind(), MapgenKind::V7);
    }
}
