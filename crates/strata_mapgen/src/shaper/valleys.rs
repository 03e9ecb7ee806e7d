//! Valleys terrain: river courses follow the zero line of a 2-D noise,
//! each river sits in a valley whose sides rise along `1 - exp(-t²)`, and a
//! 3-D fill noise roughens the slopes into cliffs and overhangs.
//!
//! ```text
//!            valley side            valley side
//!   ─────╮                                     ╭────── base + valley
//!         ╲                                   ╱
//!          ╲________~~~~~~~~~~~~~~~~________╱          river_y = base - 1
//!                   ╲_______________╱                  riverbed (circular)
//! ```

// Terrain coordinates stay inside the map generation limit, exact in f32.
#![allow(clippy::cast_precision_loss)]

use strata_core::VoxelBuffer;

use super::{shape_column, ShapeContext};
use crate::biome::BiomeAssigner;
use crate::noise::NoiseField;
use crate::params::{
    MapgenParams, ValleysParams, MAX_MAP_GENERATION_LIMIT, MGVALLEYS_ALT_CHILL, MGVALLEYS_ALT_DRY,
    MGVALLEYS_HUMID_RIVERS, MGVALLEYS_VARY_RIVER_DEPTH,
};

/// Column profile derived from the 2-D noises.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Column {
    /// Level of the river banks.
    base: f32,
    /// Terrain height before the 3-D fill.
    surface_y: f32,
    /// Amplitude of the 3-D fill.
    slope: f32,
    /// River water surface.
    river_y: f32,
    /// Distance from the river edge; negative inside the river.
    river: f32,
}

/// Valleys shaper state.
pub struct ValleysShaper {
    params: ValleysParams,
    water_level: i32,
    river_size_factor: f32,
    river_depth_bed: f32,

    noise_filler_depth: NoiseField,
    noise_inter_valley_fill: NoiseField,
    noise_inter_valley_slope: NoiseField,
    noise_rivers: NoiseField,
    noise_terrain_height: NoiseField,
    noise_valley_depth: NoiseField,
    noise_valley_profile: NoiseField,
}

impl ValleysShaper {
    /// Builds every noise field for `params`.
    #[must_use]
    pub fn new(params: ValleysParams, global: &MapgenParams) -> Self {
        let seed = global.seed;
        Self {
            water_level: i32::from(global.water_level),
            river_size_factor: f32::from(params.river_size) / 100.0,
            river_depth_bed: f32::from(params.river_depth) + 1.0,
            noise_filler_depth: NoiseField::new(params.np_filler_depth, seed),
            noise_inter_valley_fill: NoiseField::new(params.np_inter_valley_fill, seed),
            noise_inter_valley_slope: NoiseField::new(params.np_inter_valley_slope, seed),
            noise_rivers: NoiseField::new(params.np_rivers, seed),
            noise_terrain_height: NoiseField::new(params.np_terrain_height, seed),
            noise_valley_depth: NoiseField::new(params.np_valley_depth, seed),
            noise_valley_profile: NoiseField::new(params.np_valley_profile, seed),
            params,
        }
    }

    fn has(&self, flag: u32) -> bool {
        self.params.spflags & flag != 0
    }

    /// Re-seeds every noise.
    pub fn reseed(&mut self, seed: u64) {
        for field in [
            &mut self.noise_filler_depth,
            &mut self.noise_inter_valley_fill,
            &mut self.noise_inter_valley_slope,
            &mut self.noise_rivers,
            &mut self.noise_terrain_height,
            &mut self.noise_valley_depth,
            &mut self.noise_valley_profile,
        ] {
            field.reseed(seed);
        }
    }

    /// Filler depth per column.
    #[must_use]
    pub fn filler_depth(&self) -> &[f32] {
        self.noise_filler_depth.result()
    }

    /// Fills the noise fields of one chunk.
    pub fn compute_noise(&mut self, ctx: &ShapeContext) {
        let (x0, z0) = (ctx.node_min.x, ctx.node_min.z);
        let (sx, sy, sz) = (ctx.size_x(), ctx.size_y_padded(), ctx.size_z());

        self.noise_filler_depth.fill_2d(x0, z0, sx, sz);
        self.noise_inter_valley_slope.fill_2d(x0, z0, sx, sz);
        self.noise_rivers.fill_2d(x0, z0, sx, sz);
        self.noise_terrain_height.fill_2d(x0, z0, sx, sz);
        self.noise_valley_depth.fill_2d(x0, z0, sx, sz);
        self.noise_valley_profile.fill_2d(x0, z0, sx, sz);
        self.noise_inter_valley_fill
            .fill_3d(x0, ctx.node_min.y - 1, z0, sx, sy, sz);
    }

    /// Valley profile without the riverbed.
    fn valley_column(&self, slope_n: f32, rivers_n: f32, height_n: f32, valley_n: f32, profile_n: f32) -> Column {
        let valley_d = valley_n * valley_n;
        let base = height_n + valley_d;
        let river = rivers_n.abs() - self.river_size_factor;
        let tv = (river / profile_n).max(0.0);
        let valley = valley_d * (1.0 - (-tv * tv).exp());
        Column {
            base,
            surface_y: base + valley,
            slope: slope_n * valley,
            river_y: base - 1.0,
            river,
        }
    }

    /// Full column profile with the circular riverbed cut in.
    fn river_column(&self, slope_n: f32, rivers_n: f32, height_n: f32, valley_n: f32, profile_n: f32) -> Column {
        let mut col = self.valley_column(slope_n, rivers_n, height_n, valley_n, profile_n);
        if col.river < 0.0 {
            let tr = col.river / self.river_size_factor + 1.0;
            let depth = self.river_depth_bed * (1.0 - tr * tr).max(0.0).sqrt();
            col.surface_y = (col.base - depth)
                .max((self.water_level - 3) as f32)
                .min(col.surface_y);
            col.slope = 0.0;
        }
        col
    }

    fn column_at_point(&self, x: i32, z: i32) -> Column {
        let (fx, fz) = (x as f32, z as f32);
        self.river_column(
            self.noise_inter_valley_slope.sample_2d(fx, fz),
            self.noise_rivers.sample_2d(fx, fz),
            self.noise_terrain_height.sample_2d(fx, fz),
            self.noise_valley_depth.sample_2d(fx, fz),
            self.noise_valley_profile.sample_2d(fx, fz),
        )
    }

    /// Terrain height of column `(x, z)` before the 3-D fill.
    #[must_use]
    pub fn base_terrain_level_at_point(&self, x: i32, z: i32) -> f32 {
        self.column_at_point(x, z).surface_y
    }

    /// Spawn Y of column `(x, z)`.
    ///
    /// Rejects river columns, and columns whose ground is underwater, below
    /// the river surface, or higher than the spawn ceiling.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn spawn_level_at_point(&self, x: i32, z: i32) -> Option<i32> {
        let (fx, fz) = (x as f32, z as f32);
        if self.noise_rivers.sample_2d(fx, fz).abs() <= self.river_size_factor {
            return None;
        }
        let col = self.column_at_point(x, z);

        let np_height = &self.params.np_terrain_height;
        let np_valley = &self.params.np_valley_depth;
        let max_spawn_y = (np_height.offset + np_valley.offset * np_valley.offset)
            .max((self.water_level + 16) as f32) as i32;

        for y in (self.water_level..=max_spawn_y + 128).rev() {
            let fill = self.noise_inter_valley_fill.sample_3d(fx, y as f32, fz);
            let density = col.slope * fill - (y as f32 - col.surface_y);
            if density > 0.0 {
                if y < self.water_level || y > max_spawn_y || y < col.river_y as i32 {
                    return None;
                }
                return Some(y + 2);
            }
        }
        None
    }

    /// Shapes the chunk and adjusts the climate maps, returning the highest
    /// stone Y.
    #[allow(clippy::cast_possible_truncation)]
    pub fn generate_terrain(
        &mut self,
        vm: &mut VoxelBuffer,
        ctx: &ShapeContext,
        assigner: &mut BiomeAssigner,
    ) -> i32 {
        let ids = ctx.ids;
        let (sx, sy) = (ctx.size_x(), ctx.size_y_padded());
        let zstride_3d = sx * sy;
        let water_level = ctx.water_level;
        let wl = water_level as f32;
        let chill = f32::from(self.params.altitude_chill);
        let vary_depth = self.has(MGVALLEYS_VARY_RIVER_DEPTH);
        let alt_chill = self.has(MGVALLEYS_ALT_CHILL);
        let humid_rivers = self.has(MGVALLEYS_HUMID_RIVERS);
        let alt_dry = self.has(MGVALLEYS_ALT_DRY);

        let mut surface_max_y = -i32::from(MAX_MAP_GENERATION_LIMIT);
        let (heat_map, humidity_map) = assigner.climate_maps_mut();

        for (zi, z) in (ctx.node_min.z..=ctx.node_max.z).enumerate() {
            for (xi, x) in (ctx.node_min.x..=ctx.node_max.x).enumerate() {
                let index2d = zi * sx + xi;
                let index3d_base = zi * zstride_3d + xi;

                let mut col = self.river_column(
                    self.noise_inter_valley_slope.result()[index2d],
                    self.noise_rivers.result()[index2d],
                    self.noise_terrain_height.result()[index2d],
                    self.noise_valley_depth.result()[index2d],
                    self.noise_valley_profile.result()[index2d],
                );

                // Shallower rivers where hot and dry
                if vary_depth {
                    let t_heat = heat_map[index2d];
                    let heat = if alt_chill {
                        t_heat + 5.0 - (col.base - wl) * 20.0 / chill
                    } else {
                        t_heat
                    };
                    let delta = humidity_map[index2d] - 50.0;
                    if delta < 0.0 {
                        let t_evap = (heat - 32.0) / 300.0;
                        col.river_y += delta * t_evap.max(0.08);
                    }
                }

                let fill = self.noise_inter_valley_fill.result();
                let river_y = col.river_y as i32;
                let mut column_max_y = col.surface_y as i32;
                shape_column(vm, ctx, x, z, |y, k| {
                    let n_fill = fill[index3d_base + k * sx];
                    let density = col.slope * n_fill - (y as f32 - col.surface_y);
                    Some(if density > 0.0 {
                        column_max_y = column_max_y.max(y);
                        ids.stone
                    } else if y <= water_level {
                        ids.water
                    } else if y <= river_y {
                        ids.river_water
                    } else {
                        ids.air
                    })
                });
                surface_max_y = surface_max_y.max(column_max_y);

                // Ground height ignoring riverbeds
                let t_alt = col.base.max(column_max_y as f32);

                if humid_rivers {
                    humidity_map[index2d] *= 0.8;
                    let water_depth = (t_alt - col.base) / 4.0;
                    humidity_map[index2d] *= 1.0 + 0.5f32.powf(water_depth.max(1.0));
                }
                if alt_dry && t_alt > wl {
                    humidity_map[index2d] -= (t_alt - wl) * 10.0 / chill;
                }
                if alt_chill {
                    heat_map[index2d] += 5.0;
                    if t_alt > wl {
                        heat_map[index2d] -= (t_alt - wl) * 20.0 / chill;
                    }
                }
            }
        }

        surface_max_y
    }
}
