//! v7 terrain: two blended 2-D height fields, 3-D mountains rising from a
//! density gradient, river channels cut along ridge noise, and an optional
//! floatland layer high above.

// Terrain coordinates stay inside the map generation limit, exact in f32.
#![allow(clippy::cast_precision_loss)]

use strata_core::{ContentId, VoxelBuffer};

use super::{shape_column, ShapeContext};
use crate::noise::NoiseField;
use crate::params::{MapgenParams, V7Params, MGV7_CAVERNS, MGV7_FLOATLANDS, MGV7_MOUNTAINS, MGV7_RIDGES};

/// River channel half-width in `ridge_uwater` units.
const RIVER_WIDTH: f32 = 0.2;

/// Upward search budget of the spawn finder.
const SPAWN_SEARCH_ITERS: i32 = 256;

/// v7 shaper state.
pub struct V7Shaper {
    params: V7Params,
    water_level: i32,

    noise_terrain_base: NoiseField,
    noise_terrain_alt: NoiseField,
    noise_terrain_persist: NoiseField,
    noise_height_select: NoiseField,
    noise_filler_depth: NoiseField,
    noise_mount_height: NoiseField,
    noise_ridge_uwater: NoiseField,
    noise_mountain: NoiseField,
    noise_ridge: NoiseField,
    noise_floatland: NoiseField,

    /// Floatland taper offset per padded row, rebuilt per chunk.
    float_offset_cache: Vec<f32>,
    /// Floatlands intersect the current chunk.
    gen_floatlands: bool,
    /// River noise was computed for the current chunk.
    gen_rivers: bool,
}

impl V7Shaper {
    /// Builds every noise field for `params`.
    #[must_use]
    pub fn new(params: V7Params, global: &MapgenParams) -> Self {
        let seed = global.seed;
        Self {
            noise_terrain_base: NoiseField::new(params.np_terrain_base, seed),
            noise_terrain_alt: NoiseField::new(params.np_terrain_alt, seed),
            noise_terrain_persist: NoiseField::new(params.np_terrain_persist, seed),
            noise_height_select: NoiseField::new(params.np_height_select, seed),
            noise_filler_depth: NoiseField::new(params.np_filler_depth, seed),
            noise_mount_height: NoiseField::new(params.np_mount_height, seed),
            noise_ridge_uwater: NoiseField::new(params.np_ridge_uwater, seed),
            noise_mountain: NoiseField::new(params.np_mountain, seed),
            noise_ridge: NoiseField::new(params.np_ridge, seed),
            noise_floatland: NoiseField::new(params.np_floatland, seed),
            water_level: i32::from(global.water_level),
            params,
            float_offset_cache: Vec::new(),
            gen_floatlands: false,
            gen_rivers: false,
        }
    }

    fn has(&self, flag: u32) -> bool {
        self.params.spflags & flag != 0
    }

    /// True if caverns are enabled.
    #[must_use]
    pub const fn has_caverns(&self) -> bool {
        self.params.spflags & MGV7_CAVERNS != 0
    }

    /// Re-seeds every noise.
    pub fn reseed(&mut self, seed: u64) {
        for field in [
            &mut self.noise_terrain_base,
            &mut self.noise_terrain_alt,
            &mut self.noise_terrain_persist,
            &mut self.noise_height_select,
            &mut self.noise_filler_depth,
            &mut self.noise_mount_height,
            &mut self.noise_ridge_uwater,
            &mut self.noise_mountain,
            &mut self.noise_ridge,
            &mut self.noise_floatland,
        ] {
            field.reseed(seed);
        }
    }

    /// Filler depth per column.
    #[must_use]
    pub fn filler_depth(&self) -> &[f32] {
        self.noise_filler_depth.result()
    }

    fn float_taper_ymin(&self) -> i32 {
        i32::from(self.params.floatland_ymin) + i32::from(self.params.floatland_taper)
    }

    fn float_taper_ymax(&self) -> i32 {
        i32::from(self.params.floatland_ymax) - i32::from(self.params.floatland_taper)
    }

    /// Fills the noise fields of one chunk.
    pub fn compute_noise(&mut self, ctx: &ShapeContext) {
        let (x0, z0) = (ctx.node_min.x, ctx.node_min.z);
        let y0 = ctx.node_min.y - 1;
        let (sx, sy, sz) = (ctx.size_x(), ctx.size_y_padded(), ctx.size_z());

        self.noise_terrain_persist.fill_2d(x0, z0, sx, sz);
        self.noise_terrain_base
            .fill_2d_with_persistence(x0, z0, sx, sz, self.noise_terrain_persist.result());
        self.noise_terrain_alt.fill_2d(x0, z0, sx, sz);
        self.noise_height_select.fill_2d(x0, z0, sx, sz);
        self.noise_filler_depth.fill_2d(x0, z0, sx, sz);

        if self.has(MGV7_MOUNTAINS) {
            self.noise_mount_height.fill_2d(x0, z0, sx, sz);
            self.noise_mountain.fill_3d(x0, y0, z0, sx, sy, sz);
        }

        self.gen_rivers = self.has(MGV7_RIDGES) && ctx.node_max.y >= ctx.water_level - 16;
        if self.gen_rivers {
            self.noise_ridge_uwater.fill_2d(x0, z0, sx, sz);
            self.noise_ridge.fill_3d(x0, y0, z0, sx, sy, sz);
        }

        self.gen_floatlands = self.has(MGV7_FLOATLANDS)
            && ctx.node_max.y >= i32::from(self.params.floatland_ymin)
            && ctx.node_min.y <= i32::from(self.params.floatland_ymax);
        self.float_offset_cache.clear();
        if self.gen_floatlands {
            self.noise_floatland.fill_3d(x0, y0, z0, sx, sy, sz);
            let taper = f32::from(self.params.floatland_taper.max(1));
            let exp = self.params.float_taper_exp;
            let (tmin, tmax) = (self.float_taper_ymin(), self.float_taper_ymax());
            for y in y0..=ctx.node_max.y + 1 {
                let offset = if y > tmax {
                    ((y - tmax) as f32 / taper).powf(exp) * 4.0
                } else if y < tmin {
                    ((tmin - y) as f32 / taper).powf(exp) * 4.0
                } else {
                    0.0
                };
                self.float_offset_cache.push(offset);
            }
        }
    }

    fn base_level(height_select: f32, base: f32, alt: f32) -> f32 {
        if alt > base {
            return alt;
        }
        let hselect = height_select.clamp(0.0, 1.0);
        base * hselect + alt * (1.0 - hselect)
    }

    fn mountain_density(&self, mount_height: f32, mountain: f32, y: i32) -> bool {
        let mnt_h = mount_height.max(1.0);
        let gradient = -((y - i32::from(self.params.mount_zero_level)) as f32 / mnt_h);
        mountain + gradient >= 0.0
    }

    fn in_river_channel(&self, uwater: f32, ridge: f32, y: i32) -> bool {
        let uwatern = (uwater * 2.0).abs();
        if uwatern > RIVER_WIDTH {
            return false;
        }
        let altitude = (y - self.water_level) as f32;
        let height_mod = (altitude + 17.0) / 2.5;
        let width_mod = RIVER_WIDTH - uwatern;
        let nridge = ridge * altitude.max(0.0) / 7.0;
        nridge + width_mod * height_mod >= 0.6
    }

    /// Estimated terrain height of column `(x, z)`.
    #[must_use]
    pub fn base_terrain_level_at_point(&self, x: i32, z: i32) -> f32 {
        let (fx, fz) = (x as f32, z as f32);
        let hselect = self.noise_height_select.sample_2d(fx, fz);
        let persist = self.noise_terrain_persist.sample_2d(fx, fz);
        let base = self.noise_terrain_base.sample_2d_with_persistence(fx, fz, persist);
        let alt = self.noise_terrain_alt.sample_2d(fx, fz);
        Self::base_level(hselect, base, alt)
    }

    fn mountain_at_point(&self, x: i32, y: i32, z: i32) -> bool {
        let mount_height = self.noise_mount_height.sample_2d(x as f32, z as f32);
        let mountain = self.noise_mountain.sample_3d(x as f32, y as f32, z as f32);
        self.mountain_density(mount_height, mountain, y)
    }

    /// Spawn Y of column `(x, z)`.
    ///
    /// Rejects river columns. Without mountains the base level is used
    /// directly; with mountains the first non-mountain node above the base
    /// level is searched for.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn spawn_level_at_point(&self, x: i32, z: i32) -> Option<i32> {
        if self.has(MGV7_RIDGES) {
            let uwatern = self.noise_ridge_uwater.sample_2d(x as f32, z as f32) * 2.0;
            if uwatern.abs() <= RIVER_WIDTH {
                return None;
            }
        }

        // Half of all terrain lies below the larger terrain offset
        let max_spawn_y = (self.params.np_terrain_alt.offset)
            .max(self.params.np_terrain_base.offset)
            .max((self.water_level + 16) as f32) as i32;

        let mut y = self.base_terrain_level_at_point(x, z) as i32;

        if !self.has(MGV7_MOUNTAINS) {
            if y < self.water_level || y > max_spawn_y {
                return None;
            }
            return Some(y + 2);
        }

        let mut iters = SPAWN_SEARCH_ITERS;
        while iters > 0 && y <= max_spawn_y {
            if !self.mountain_at_point(x, y + 1, z) {
                if y <= self.water_level {
                    return None;
                }
                return Some(y + 1);
            }
            y += 1;
            iters -= 1;
        }
        None
    }

    /// Shapes the chunk, returning the highest stone Y.
    #[allow(clippy::cast_possible_truncation)]
    pub fn generate_terrain(&mut self, vm: &mut VoxelBuffer, ctx: &ShapeContext) -> i32 {
        let ids = ctx.ids;
        let (sx, sy) = (ctx.size_x(), ctx.size_y_padded());
        let zstride_3d = sx * sy;
        let mountains = self.has(MGV7_MOUNTAINS);
        let floatland_ymin = i32::from(self.params.floatland_ymin);
        let floatland_ymax = i32::from(self.params.floatland_ymax);
        let floatland_ywater = i32::from(self.params.floatland_ywater);
        let float_taper_ymax = self.float_taper_ymax();
        let water_level = ctx.water_level;

        let mut stone_surface_max_y = -i32::from(crate::params::MAX_MAP_GENERATION_LIMIT);

        for (zi, z) in (ctx.node_min.z..=ctx.node_max.z).enumerate() {
            for (xi, x) in (ctx.node_min.x..=ctx.node_max.x).enumerate() {
                let index2d = zi * sx + xi;
                let index3d_base = zi * zstride_3d + xi;

                let surface_y = Self::base_level(
                    self.noise_height_select.result()[index2d],
                    self.noise_terrain_base.result()[index2d],
                    self.noise_terrain_alt.result()[index2d],
                ) as i32;
                stone_surface_max_y = stone_surface_max_y.max(surface_y);

                let this = &*self;
                let mut column_max = stone_surface_max_y;
                shape_column(vm, ctx, x, z, |y, k| {
                    let index3d = index3d_base + k * sx;
                    let mut c: ContentId = if y <= surface_y {
                        ids.stone
                    } else if mountains
                        && this.mountain_density(
                            this.noise_mount_height.result()[index2d],
                            this.noise_mountain.result()[index3d],
                            y,
                        )
                    {
                        column_max = column_max.max(y);
                        ids.stone
                    } else if this.gen_floatlands
                        && y >= floatland_ymin
                        && y <= floatland_ymax
                        && this.noise_floatland.result()[index3d] + this.params.floatland_density
                            - this.float_offset_cache[k]
                            >= 0.0
                    {
                        column_max = column_max.max(y);
                        return Some(ids.stone);
                    } else if y <= water_level {
                        ids.water
                    } else if this.gen_floatlands && y >= float_taper_ymax && y <= floatland_ywater {
                        ids.water
                    } else {
                        ids.air
                    };

                    // Floatland stone returned above; rivers only cut ground terrain
                    if c == ids.stone
                        && this.gen_rivers
                        && this.in_river_channel(
                            this.noise_ridge_uwater.result()[index2d],
                            this.noise_ridge.result()[index3d],
                            y,
                        )
                    {
                        c = if y <= water_level { ids.water } else { ids.air };
                    }
                    Some(c)
                });
                stone_surface_max_y = stone_surface_max_y.max(column_max);
            }
        }

        stone_surface_max_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapgen::TerrainContent;
    use strata_core::{ContentRegistry, Vec3i, VoxelArea};

    fn setup(spflags: u32, node_min: Vec3i, node_max: Vec3i) -> (V7Shaper, ShapeContext, VoxelBuffer) {
        let global = MapgenParams {
            seed: 42,
            ..MapgenParams::default()
        };
        let params = V7Params {
            spflags,
            ..V7Params::default()
        };
        let ctx = ShapeContext {
            node_min,
            node_max,
            water_level: 1,
            mapgen_limit: 31000,
            ids: TerrainContent::resolve(&ContentRegistry::with_defaults()).unwrap(),
        };
        let area = VoxelArea::new(node_min - Vec3i::splat(1), node_max + Vec3i::splat(1));
        (V7Shaper::new(params, &global), ctx, VoxelBuffer::with_area(area))
    }

    #[test]
    fn test_base_level_blend() {
        assert_eq!(V7Shaper::base_level(0.5, 10.0, 20.0), 20.0);
        assert_eq!(V7Shaper::base_level(1.0, 40.0, 20.0), 40.0);
        assert_eq!(V7Shaper::base_level(0.0, 40.0, 20.0), 20.0);
        assert_eq!(V7Shaper::base_level(0.5, 40.0, 20.0), 30.0);
        // Clamped selector
        assert_eq!(V7Shaper::base_level(-3.0, 40.0, 20.0), 20.0);
    }

    #[test]
    fn test_deep_chunk_is_solid() {
        let (mut shaper, ctx, mut vm) = setup(0, Vec3i::new(0, -800, 0), Vec3i::new(15, -785, 15));
        shaper.compute_noise(&ctx);
        let top = shaper.generate_terrain(&mut vm, &ctx);
        assert!(top > -785);
        let p = Vec3i::new(7, -790, 7);
        assert_eq!(vm.get(p).content, ctx.ids.stone);
    }

    #[test]
    fn test_high_chunk_is_air_without_floatlands() {
        let (mut shaper, ctx, mut vm) = setup(0, Vec3i::new(0, 2000, 0), Vec3i::new(15, 2015, 15));
        shaper.compute_noise(&ctx);
        shaper.generate_terrain(&mut vm, &ctx);
        assert!(vm.nodes().iter().filter(|n| !n.is_ignore()).all(|n| n.content == ctx.ids.air));
    }

    #[test]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn test_map_and_point_agree() {
        let (mut shaper, ctx, _) = setup(MGV7_MOUNTAINS, Vec3i::new(-40, 0, 100), Vec3i::new(-25, 15, 115));
        shaper.compute_noise(&ctx);
        for (xi, zi) in [(0usize, 0usize), (5, 9), (15, 15)] {
            let i = zi * ctx.size_x() + xi;
            let from_map = V7Shaper::base_level(
                shaper.noise_height_select.result()[i],
                shaper.noise_terrain_base.result()[i],
                shaper.noise_terrain_alt.result()[i],
            );
            let at_point = shaper.base_terrain_level_at_point(-40 + xi as i32, 100 + zi as i32);
            assert!((from_map - at_point).abs() < 1e-3, "{from_map} vs {at_point}");
        }
    }

    #[test]
    fn test_spawn_level_is_above_water() {
        let (shaper, _, _) = setup(MGV7_MOUNTAINS | MGV7_RIDGES, Vec3i::ZERO, Vec3i::splat(15));
        for x in (-200..200).step_by(37) {
            if let Some(y) = shaper.spawn_level_at_point(x, x / 3) {
                assert!(y > 1);
            }
        }
    }

    #[test]
    fn test_river_channel_shape() {
        let (shaper, _, _) = setup(MGV7_RIDGES, Vec3i::ZERO, Vec3i::splat(15));
        // Centre of a channel just above water is carved
        assert!(shaper.in_river_channel(0.0, 0.0, 2));
        // Outside the channel width nothing is carved
        assert!(!shaper.in_river_channel(0.3, 1.0, 2));
        // Deep below water the gradient closes the channel
        assert!(!shaper.in_river_channel(0.0, 0.0, -40));
    }

    #[test]
    fn test_floatland_taper_cache() {
        let (mut shaper, ctx, _) = setup(
            MGV7_FLOATLANDS,
            Vec3i::new(0, 1024, 0),
            Vec3i::new(15, 1039, 15),
        );
        shaper.compute_noise(&ctx);
        assert!(shaper.gen_floatlands);
        assert_eq!(shaper.float_offset_cache.len(), ctx.size_y_padded());
        // Below the taper start the offset grows toward the layer bottom
        assert!(shaper.float_offset_cache[0] > shaper.float_offset_cache[17]);
    }
}
