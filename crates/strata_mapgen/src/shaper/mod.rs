//! # Terrain Shapers
//!
//! A shaper turns the noise fields of one chunk into raw terrain: stone,
//! sea water, river water and air. Biome cover, caves and dungeons come
//! afterwards.
//!
//! ## Contract
//!
//! - Only cells that are still `CONTENT_IGNORE` are written, so terrain
//!   overgenerated by a neighbouring chunk is never clobbered
//! - The shaped Y range is `node_min.y - 1 ..= node_max.y + 1`
//! - Every noise is sampled at world-absolute coordinates, so two chunks
//!   that share a border agree on it
//! - Cells beyond the generation limit stay `CONTENT_IGNORE`

mod v7;
mod valleys;

pub use v7::V7Shaper;
pub use valleys::ValleysShaper;

use strata_core::{ContentId, Vec3i, VoxelBuffer};

use crate::biome::BiomeAssigner;
use crate::mapgen::TerrainContent;
use crate::params::{MapgenKind, MapgenParams, VariantParams};

/// Cells in `min ..= max` widened by `pad - 1`; zero for an empty range.
#[inline]
fn extent(min: i32, max: i32, pad: i32) -> usize {
    usize::try_from(max - min + pad).unwrap_or(0)
}

/// Per-chunk inputs shared by every shaper.
#[derive(Clone, Copy, Debug)]
pub struct ShapeContext {
    /// Lowest node of the chunk.
    pub node_min: Vec3i,
    /// Highest node of the chunk.
    pub node_max: Vec3i,
    /// Sea level.
    pub water_level: i32,
    /// Nothing is written beyond this distance from the origin.
    pub mapgen_limit: i32,
    /// Resolved terrain content.
    pub ids: TerrainContent,
}

impl ShapeContext {
    /// Columns along X.
    #[inline]
    #[must_use]
    pub fn size_x(&self) -> usize {
        extent(self.node_min.x, self.node_max.x, 1)
    }

    /// Columns along Z.
    #[inline]
    #[must_use]
    pub fn size_z(&self) -> usize {
        extent(self.node_min.z, self.node_max.z, 1)
    }

    /// Rows of the shaped range (chunk height plus one above and below).
    #[inline]
    #[must_use]
    pub fn size_y_padded(&self) -> usize {
        extent(self.node_min.y, self.node_max.y, 3)
    }

    /// True if `(x, y, z)` lies beyond the generation limit.
    #[inline]
    #[must_use]
    pub const fn beyond_limit(&self, x: i32, y: i32, z: i32) -> bool {
        x.abs() > self.mapgen_limit || y.abs() > self.mapgen_limit || z.abs() > self.mapgen_limit
    }
}

/// Writes `c` into every still-ignore cell of the column `(x, z)` that
/// `decide` maps to `Some`, over the padded Y range.
///
/// `decide(y, k)` receives the world Y and the row offset `k` into a
/// padded 3-D noise column.
#[inline]
pub(crate) fn shape_column<F>(vm: &mut VoxelBuffer, ctx: &ShapeContext, x: i32, z: i32, mut decide: F)
where
    F: FnMut(i32, usize) -> Option<ContentId>,
{
    let area = *vm.area();
    let ystride = area.ystride();
    let y0 = ctx.node_min.y - 1;
    let mut vi = area.index(x, y0, z);
    for (k, y) in (y0..=ctx.node_max.y + 1).enumerate() {
        if vm.node_at(vi).is_ignore() && !ctx.beyond_limit(x, y, z) {
            if let Some(c) = decide(y, k) {
                vm.set_at(vi, strata_core::MapNode::new(c));
            }
        }
        vi += ystride;
    }
}

/// The terrain variant of a generator, with its noise fields.
pub enum TerrainShaper {
    /// Ridged mountains and river channels.
    V7(V7Shaper),
    /// River valleys.
    Valleys(ValleysShaper),
}

impl TerrainShaper {
    /// Builds the shaper selected by `variant`.
    #[must_use]
    pub fn new(params: &MapgenParams, variant: &VariantParams) -> Self {
        match variant {
            VariantParams::V7(p) => Self::V7(V7Shaper::new(p.clone(), params)),
            VariantParams::Valleys(p) => Self::Valleys(ValleysShaper::new(p.clone(), params)),
        }
    }

    /// Which variant this is.
    #[must_use]
    pub const fn kind(&self) -> MapgenKind {
        match self {
            Self::V7(_) => MapgenKind::V7,
            Self::Valleys(_) => MapgenKind::Valleys,
        }
    }

    /// Re-seeds every noise in place.
    pub fn reseed(&mut self, seed: u64) {
        match self {
            Self::V7(s) => s.reseed(seed),
            Self::Valleys(s) => s.reseed(seed),
        }
    }

    /// Fills every noise field the variant uses for the chunk.
    pub fn compute_noise(&mut self, ctx: &ShapeContext) {
        match self {
            Self::V7(s) => s.compute_noise(ctx),
            Self::Valleys(s) => s.compute_noise(ctx),
        }
    }

    /// Shapes raw terrain and returns the highest stone Y in the chunk.
    ///
    /// The climate maps in `assigner` must already be filled; the valleys
    /// variant adjusts them per column.
    pub fn generate_terrain(
        &mut self,
        vm: &mut VoxelBuffer,
        ctx: &ShapeContext,
        assigner: &mut BiomeAssigner,
    ) -> i32 {
        match self {
            Self::V7(s) => s.generate_terrain(vm, ctx),
            Self::Valleys(s) => s.generate_terrain(vm, ctx, assigner),
        }
    }

    /// Estimated terrain height of the column at `(x, z)`.
    #[must_use]
    pub fn base_terrain_level_at_point(&self, x: i32, z: i32) -> f32 {
        match self {
            Self::V7(s) => s.base_terrain_level_at_point(x, z),
            Self::Valleys(s) => s.base_terrain_level_at_point(x, z),
        }
    }

    /// Y at which a player may spawn in column `(x, z)`, or `None` if the
    /// column is unsuitable (river, underwater, too high).
    #[must_use]
    pub fn spawn_level_at_point(&self, x: i32, z: i32) -> Option<i32> {
        match self {
            Self::V7(s) => s.spawn_level_at_point(x, z),
            Self::Valleys(s) => s.spawn_level_at_point(x, z),
        }
    }

    /// Filler depth per column of the last computed chunk.
    #[must_use]
    pub fn filler_depth(&self) -> &[f32] {
        match self {
            Self::V7(s) => s.filler_depth(),
            Self::Valleys(s) => s.filler_depth(),
        }
    }

    /// True if the variant generates caverns.
    #[must_use]
    pub const fn has_caverns(&self) -> bool {
        match self {
            Self::V7(s) => s.has_caverns(),
            Self::Valleys(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::ContentRegistry;

    fn ctx(limit: i32) -> ShapeContext {
        ShapeContext {
            node_min: Vec3i::new(0, -16, 0),
            node_max: Vec3i::new(15, -1, 15),
            water_level: 1,
            mapgen_limit: limit,
            ids: TerrainContent::resolve(&ContentRegistry::with_defaults()).unwrap(),
        }
    }

    #[test]
    fn test_context_sizes() {
        let c = ctx(31000);
        assert_eq!(c.size_x(), 16);
        assert_eq!(c.size_z(), 16);
        assert_eq!(c.size_y_padded(), 18);

        let inverted = ShapeContext { node_max: Vec3i::new(-5, -20, -5), ..c };
        assert_eq!(inverted.size_x(), 0);
        assert_eq!(inverted.size_z(), 0);
        assert_eq!(inverted.size_y_padded(), 0);
    }

    #[test]
    fn test_beyond_limit() {
        let c = ctx(100);
        assert!(!c.beyond_limit(100, -100, 0));
        assert!(c.beyond_limit(101, 0, 0));
        assert!(c.beyond_limit(0, 0, -101));
    }

    #[test]
    fn test_shape_column_skips_written_cells() {
        let c = ctx(31000);
        let area = strata_core::VoxelArea::new(Vec3i::new(0, -17, 0), Vec3i::new(0, 0, 0));
        let mut vm = VoxelBuffer::with_area(area);
        vm.set(Vec3i::new(0, -5, 0), strata_core::MapNode::AIR);

        let mut rows = Vec::new();
        shape_column(&mut vm, &c, 0, 0, |y, k| {
            rows.push((y, k));
            Some(c.ids.stone)
        });

        assert_eq!(rows.first(), Some(&(-17, 0)));
        assert_eq!(rows.len(), 17);
        assert!(vm.get(Vec3i::new(0, -5, 0)).is_air());
        assert_eq!(vm.get(Vec3i::new(0, -6, 0)).content, c.ids.stone);
    }
}
