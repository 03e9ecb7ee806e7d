//! # Cave Carvers
//!
//! Three carvers run over shaped terrain, in this order:
//!
//! | Carver                      | Shape                          | Driven by               |
//! |-----------------------------|--------------------------------|-------------------------|
//! | [`CavernsNoise`]            | huge chambers deep underground | one 3-D noise           |
//! | [`CavesNoiseIntersection`]  | long winding tunnels           | two 3-D noises near 0   |
//! | [`CavesRandomWalk`]         | small and large blob caves     | seeded random walk      |
//!
//! Only ground content is ever excavated. Cobble from a dungeon or liquid
//! overgenerated by a neighbour survives every carver.
//!
//! The noise carvers work on a column range of `node_min.y - 1 ..= node_max.y`.
//! The overgenerated layer at `node_max.y + 1` is left as a roof; the chunk
//! above removes it when it is generated.

// Cave coordinates stay inside the map generation limit, exact in f32.
#![allow(clippy::cast_precision_loss)]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use strata_core::{ContentId, MapNode, Vec3i, VoxelBuffer, CONTENT_AIR, MAP_BLOCKSIZE};

use crate::biome::{Biome, BiomeContent};
use crate::noise::NoiseField;
use crate::params::CaveParams;
use crate::shaper::ShapeContext;

/// Offset mixed into the block seed for the random-walk generator.
const RANDOM_WALK_SEED_OFFSET: u64 = 21343;

/// Margin kept between a widened route box and the padded buffer edge.
const ROUTE_INSURE: i32 = 10;

/// True if `c` may be excavated.
#[inline]
pub(crate) fn is_ground(ground: &[bool], c: ContentId) -> bool {
    ground.get(usize::from(c)).copied().unwrap_or(false)
}

/// Peaks at 1 where the noise crosses zero.
#[inline]
fn contour(v: f32) -> f32 {
    (1.0 - v.abs()).max(0.0)
}

#[inline]
const fn rangelim(v: i32, lo: i32, hi: i32) -> i32 {
    if v < lo {
        lo
    } else if v > hi {
        hi
    } else {
        v
    }
}

/// Layout of a 3-D noise result sampled from `node_min.y - 1` to `node_max.y`.
#[derive(Clone, Copy)]
struct NoiseColumns {
    sx: usize,
    rows: usize,
}

impl NoiseColumns {
    fn new(ctx: &ShapeContext) -> Self {
        Self {
            sx: ctx.size_x(),
            rows: ctx.size_y_padded() - 1,
        }
    }

    #[inline]
    const fn index(self, x: usize, k: usize, z: usize) -> usize {
        (z * self.rows + k) * self.sx + x
    }
}

// ============================================================================
// NOISE TUNNELS
// ============================================================================

/// Tunnels where two independent 3-D noises are both close to zero.
pub struct CavesNoiseIntersection {
    noise_cave1: NoiseField,
    noise_cave2: NoiseField,
    cave_width: f32,
}

impl CavesNoiseIntersection {
    /// Builds both tunnel noises.
    #[must_use]
    pub fn new(params: &CaveParams, world_seed: u64) -> Self {
        Self {
            noise_cave1: NoiseField::new(params.np_cave1, world_seed),
            noise_cave2: NoiseField::new(params.np_cave2, world_seed),
            cave_width: params.cave_width,
        }
    }

    /// Re-seeds both noises.
    pub fn reseed(&mut self, world_seed: u64) {
        self.noise_cave1.reseed(world_seed);
        self.noise_cave2.reseed(world_seed);
    }

    /// Excavates tunnels through the chunk.
    ///
    /// Where a tunnel breaks the surface the floor of the opening gets the
    /// column biome's top and filler nodes (riverbed under rivers), and a
    /// top or filler node left hanging as a tunnel roof turns to stone.
    pub fn generate(
        &mut self,
        vm: &mut VoxelBuffer,
        ctx: &ShapeContext,
        ground: &[bool],
        biomemap: &[Biome],
        content: &BiomeContent,
    ) {
        let nmin = ctx.node_min;
        let nmax = ctx.node_max;
        let cols = NoiseColumns::new(ctx);
        self.noise_cave1
            .fill_3d(nmin.x, nmin.y - 1, nmin.z, cols.sx, cols.rows, ctx.size_z());
        self.noise_cave2
            .fill_3d(nmin.x, nmin.y - 1, nmin.z, cols.sx, cols.rows, ctx.size_z());
        let cave1 = self.noise_cave1.result();
        let cave2 = self.noise_cave2.result();

        let area = *vm.area();
        let ystride = area.ystride();
        let ids = ctx.ids;
        let mut index2d = 0;

        for (zo, z) in (nmin.z..=nmax.z).enumerate() {
            for (xo, x) in (nmin.x..=nmax.x).enumerate() {
                let nodes = content.nodes(biomemap[index2d]);
                let water_top = nodes.water_top.map(|n| n.content);
                let depth_top = nodes.depth_top;
                let base_filler = nodes.depth_top + nodes.depth_filler;

                let mut column_is_open = false;
                let mut is_under_river = false;
                let mut is_under_tunnel = false;
                let mut is_top_filler_above = false;
                let mut nplaced: u16 = 0;

                let bottom = area.index(x, nmin.y - 1, z);
                for k in (0..cols.rows).rev() {
                    let vi = bottom + k * ystride;
                    let c = vm.node_at(vi).content;

                    if c == CONTENT_AIR || c == ids.water || Some(c) == water_top {
                        column_is_open = true;
                        is_top_filler_above = false;
                        continue;
                    }
                    if c == ids.river_water {
                        column_is_open = true;
                        is_under_river = true;
                        is_top_filler_above = false;
                        continue;
                    }

                    let i3 = cols.index(xo, k, zo);
                    let d1 = contour(cave1[i3]);
                    let d2 = contour(cave2[i3]);

                    if d1 * d2 > self.cave_width && is_ground(ground, c) {
                        vm.set_at(vi, MapNode::AIR);
                        is_under_tunnel = true;
                        if is_top_filler_above {
                            vm.set_at(vi + ystride, nodes.stone);
                        }
                        is_top_filler_above = false;
                    } else if column_is_open
                        && is_under_tunnel
                        && (c == nodes.stone.content || c == nodes.filler.content)
                    {
                        // Floor of a tunnel entrance
                        if is_under_river {
                            if nplaced < nodes.depth_riverbed {
                                vm.set_at(vi, nodes.riverbed);
                                is_top_filler_above = true;
                                nplaced += 1;
                            } else {
                                column_is_open = false;
                                is_under_river = false;
                                is_under_tunnel = false;
                            }
                        } else if nplaced < depth_top {
                            vm.set_at(vi, nodes.top);
                            is_top_filler_above = true;
                            nplaced += 1;
                        } else if nplaced < base_filler {
                            vm.set_at(vi, nodes.filler);
                            is_top_filler_above = true;
                            nplaced += 1;
                        } else {
                            column_is_open = false;
                            is_under_tunnel = false;
                        }
                    } else {
                        if c == nodes.top.content || c == nodes.filler.content {
                            is_top_filler_above = true;
                        }
                        column_is_open = false;
                    }
                }
                index2d += 1;
            }
        }
    }
}

// ============================================================================
// CAVERNS
// ============================================================================

/// Giant chambers below `cavern_limit`, tapering in over `cavern_taper`.
pub struct CavernsNoise {
    noise_cavern: NoiseField,
    cavern_limit: i32,
    cavern_taper: i32,
    cavern_threshold: f32,
    amp: Vec<f32>,
}

impl CavernsNoise {
    /// Builds the cavern noise.
    #[must_use]
    pub fn new(params: &CaveParams, world_seed: u64) -> Self {
        Self {
            noise_cavern: NoiseField::new(params.np_cavern, world_seed),
            cavern_limit: i32::from(params.cavern_limit),
            cavern_taper: i32::from(params.cavern_taper),
            cavern_threshold: params.cavern_threshold,
            amp: Vec::new(),
        }
    }

    /// Re-seeds the noise.
    pub fn reseed(&mut self, world_seed: u64) {
        self.noise_cavern.reseed(world_seed);
    }

    /// Amplitude multiplier at height `y`.
    #[inline]
    #[must_use]
    pub fn amplitude(&self, y: i32) -> f32 {
        ((self.cavern_limit - y) as f32 / self.cavern_taper.max(1) as f32).min(1.0)
    }

    /// Excavates caverns and reports whether any cell came near one.
    ///
    /// Skipped when the chunk starts above the highest stone or above the
    /// cavern limit.
    pub fn generate(&mut self, vm: &mut VoxelBuffer, ctx: &ShapeContext, ground: &[bool], max_stone_y: i32) -> bool {
        let nmin = ctx.node_min;
        let nmax = ctx.node_max;
        if nmin.y > max_stone_y || nmin.y > self.cavern_limit {
            return false;
        }

        let cols = NoiseColumns::new(ctx);
        self.noise_cavern
            .fill_3d(nmin.x, nmin.y - 1, nmin.z, cols.sx, cols.rows, ctx.size_z());

        self.amp.clear();
        for y in (nmin.y - 1..).take(cols.rows) {
            let amp = self.amplitude(y);
            self.amp.push(amp);
        }

        let cavern = self.noise_cavern.result();
        let area = *vm.area();
        let ystride = area.ystride();
        let near_threshold = self.cavern_threshold - 0.1;
        let mut near_cavern = false;

        for (zo, z) in (nmin.z..=nmax.z).enumerate() {
            for (xo, x) in (nmin.x..=nmax.x).enumerate() {
                let bottom = area.index(x, nmin.y - 1, z);
                for k in (0..cols.rows).rev() {
                    let n = cavern[cols.index(xo, k, zo)].abs() * self.amp[k];
                    if n > near_threshold {
                        near_cavern = true;
                        let vi = bottom + k * ystride;
                        if n > self.cavern_threshold && is_ground(ground, vm.node_at(vi).content) {
                            vm.set_at(vi, MapNode::AIR);
                        }
                    }
                }
            }
        }
        near_cavern
    }
}

// ============================================================================
// RANDOM WALK
// ============================================================================

/// Caves carved by a seeded walk of spheres.
///
/// ```text
///   orp ──► rp ──► rp ──► ...     each step: random vector + main direction,
///    ○○○○○○○○○○○○○○○○○            clamped to the route box, then a sphere
///                                 of radius rs/2 carved every node along it
/// ```
#[derive(Clone, Debug)]
pub struct CavesRandomWalk {
    small_num: (u16, u16),
    large_num: (u16, u16),
    large_cave_depth: i32,
    large_cave_flooded: f32,
    cavern_limit: i32,
}

impl CavesRandomWalk {
    /// Reads the cave counts and flooding ratio.
    #[must_use]
    pub fn new(params: &CaveParams) -> Self {
        let ordered = |a: u16, b: u16| (a.min(b), a.max(b));
        Self {
            small_num: ordered(params.small_cave_num_min, params.small_cave_num_max),
            large_num: ordered(params.large_cave_num_min, params.large_cave_num_max),
            large_cave_depth: i32::from(params.large_cave_depth),
            large_cave_flooded: params.large_cave_flooded,
            cavern_limit: i32::from(params.cavern_limit),
        }
    }

    /// Carves this chunk's small caves, then its large ones.
    ///
    /// Large caves only appear when the chunk top is at or below
    /// `large_cave_depth` and no cavern is nearby. `heightmap` holds one
    /// surface Y per column and keeps routes underground.
    #[allow(clippy::too_many_arguments)]
    pub fn generate(
        &self,
        vm: &mut VoxelBuffer,
        ctx: &ShapeContext,
        ground: &[bool],
        heightmap: &[i16],
        max_stone_y: i32,
        near_cavern: bool,
        blockseed: u64,
    ) {
        if ctx.node_min.y > max_stone_y {
            return;
        }
        let mut rng = ChaCha8Rng::seed_from_u64(blockseed.wrapping_add(RANDOM_WALK_SEED_OFFSET));

        let small = rng.gen_range(self.small_num.0..=self.small_num.1);
        for _ in 0..small {
            self.make_cave(vm, ctx, ground, heightmap, max_stone_y, &mut rng, false);
        }

        if near_cavern || ctx.node_max.y > self.large_cave_depth {
            return;
        }
        let large = rng.gen_range(self.large_num.0..=self.large_num.1);
        for _ in 0..large {
            self.make_cave(vm, ctx, ground, heightmap, max_stone_y, &mut rng, true);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn make_cave<R: Rng>(
        &self,
        vm: &mut VoxelBuffer,
        ctx: &ShapeContext,
        ground: &[bool],
        heightmap: &[i16],
        max_stone_y: i32,
        rng: &mut R,
        large: bool,
    ) {
        let flooded = large && rng.gen_range(1..=1000) as f32 <= self.large_cave_flooded * 1000.0;
        let dswitchint = rng.gen_range(1..=14);

        let (part_max_length_rs, routepoints, min_d, max_d) = if large {
            let part = rng.gen_range(2..=4);
            let hi = rng.gen_range(15..=30);
            let points = rng.gen_range(5..=hi);
            let hi_d = rng.gen_range(8..=24);
            (part, points, 5, rng.gen_range(7..=hi_d))
        } else {
            let part = rng.gen_range(2..=9);
            let hi = rng.gen_range(15..=30);
            let points = rng.gen_range(10..=hi);
            (part, points, 2, rng.gen_range(2..=6))
        };
        let large_flat = rng.gen_range(0..=1) == 0;

        // Route box: the chunk widened on X and Z so tunnels can enter from
        // neighbouring chunks.
        let more = (MAP_BLOCKSIZE - max_d / 2 - ROUTE_INSURE).max(1);
        let ar = ctx.node_max - ctx.node_min + Vec3i::new(1 + more * 2, 1, 1 + more * 2);
        let of = ctx.node_min - Vec3i::new(more, 0, more);

        let mut route_y_min = 0;
        let mut route_y_max = rangelim(-of.y + max_stone_y + max_d / 2 + 7, 0, ar.y - 1);
        if large {
            let mut minpos = 0;
            if ctx.node_min.y < ctx.water_level && ctx.node_max.y > ctx.water_level {
                minpos = ctx.water_level - max_d / 3 - of.y;
                route_y_max = ctx.water_level + max_d / 3 - of.y;
            }
            route_y_min = rangelim(rng.gen_range(minpos..=minpos + max_d), 0, route_y_max);
        }
        let start_y_min = rangelim(route_y_min, 0, ar.y - 1);
        let start_y_max = rangelim(route_y_max, start_y_min, ar.y - 1);

        let orp = [
            rng.gen_range(0..ar.x) as f32 + 0.5,
            rng.gen_range(start_y_min..=start_y_max) as f32 + 0.5,
            rng.gen_range(0..ar.z) as f32 + 0.5,
        ];

        let liquid = if ctx.node_max.y < self.cavern_limit {
            ctx.ids.lava
        } else {
            ctx.ids.water
        };

        let mut walk = Walk {
            ctx,
            ground,
            heightmap,
            large,
            large_flat,
            flooded,
            liquid: MapNode::new(liquid),
            water: MapNode::new(ctx.ids.water),
            part_max_length_rs,
            min_d,
            max_d,
            route_y_min,
            route_y_max,
            of,
            ar,
            orp,
            main_direction: [0.0; 3],
        };
        for j in 0..routepoints {
            walk.make_tunnel(vm, rng, j % dswitchint == 0);
        }
    }
}

/// State of one cave's walk.
struct Walk<'a> {
    ctx: &'a ShapeContext,
    ground: &'a [bool],
    heightmap: &'a [i16],
    large: bool,
    large_flat: bool,
    flooded: bool,
    liquid: MapNode,
    water: MapNode,
    part_max_length_rs: i32,
    min_d: i32,
    max_d: i32,
    route_y_min: i32,
    route_y_max: i32,
    /// Route box origin in world nodes.
    of: Vec3i,
    /// Route box size.
    ar: Vec3i,
    /// Current route point, relative to `of`.
    orp: [f32; 3],
    main_direction: [f32; 3],
}

impl Walk<'_> {
    fn above_surface(&self, p: Vec3i) -> bool {
        let (nmin, nmax) = (self.ctx.node_min, self.ctx.node_max);
        if (nmin.x..=nmax.x).contains(&p.x) && (nmin.z..=nmax.z).contains(&p.z) {
            let zo = usize::try_from(p.z - nmin.z).unwrap_or(0);
            let xo = usize::try_from(p.x - nmin.x).unwrap_or(0);
            let index = zo * self.ctx.size_x() + xo;
            i32::from(self.heightmap[index]) < p.y
        } else {
            p.y > self.ctx.water_level
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn make_tunnel<R: Rng>(&mut self, vm: &mut VoxelBuffer, rng: &mut R, dirswitch: bool) {
        if dirswitch && !self.large {
            let mut dir = [
                (rng.gen_range(0..20) as f32 - 10.0) / 10.0,
                (rng.gen_range(0..20) as f32 - 10.0) / 30.0,
                (rng.gen_range(0..20) as f32 - 10.0) / 10.0,
            ];
            let k = rng.gen_range(0..=10) as f32 / 10.0;
            for d in &mut dir {
                *d *= k;
            }
            self.main_direction = dir;
        }

        let rs = rng.gen_range(self.min_d..=self.max_d);
        let part = rs * self.part_max_length_rs;
        let maxlen = if self.large {
            Vec3i::new(part, part / 2, part)
        } else {
            Vec3i::new(part, rng.gen_range(1..=part), part)
        };

        let jump_down = !self.large && rng.gen_range(0..=12) == 0;
        let mut vec = [
            rng.gen_range(0..maxlen.x) as f32 - maxlen.x as f32 / 2.0,
            if jump_down {
                rng.gen_range(0..maxlen.y * 2) as f32 - maxlen.y as f32
            } else {
                rng.gen_range(0..maxlen.y) as f32 - maxlen.y as f32 / 2.0
            },
            rng.gen_range(0..maxlen.z) as f32 - maxlen.z as f32 / 2.0,
        ];

        // Checking both ends is enough to keep the tunnel underground
        let p1 = Vec3i::new(self.orp[0] as i32, self.orp[1] as i32, self.orp[2] as i32)
            + self.of
            + Vec3i::splat(rs / 2);
        let p2 = Vec3i::new(vec[0] as i32, vec[1] as i32, vec[2] as i32) + p1;
        if self.above_surface(p1) || self.above_surface(p2) {
            return;
        }

        for (v, d) in vec.iter_mut().zip(self.main_direction) {
            *v += d;
        }
        let mut rp = [self.orp[0] + vec[0], self.orp[1] + vec[1], self.orp[2] + vec[2]];
        rp[0] = rp[0].clamp(0.0, (self.ar.x - 1) as f32);
        if rp[1] < self.route_y_min as f32 {
            rp[1] = self.route_y_min as f32;
        } else if rp[1] >= self.route_y_max as f32 {
            rp[1] = (self.route_y_max - 1) as f32;
        }
        rp[2] = rp[2].clamp(0.0, (self.ar.z - 1) as f32);
        let vec = [rp[0] - self.orp[0], rp[1] - self.orp[1], rp[2] - self.orp[2]];

        let mut veclen = (vec[0] * vec[0] + vec[1] * vec[1] + vec[2] * vec[2]).sqrt();
        if veclen < 0.05 {
            veclen = 1.0;
        }

        // Every second section is rough
        let randomize_xz = rng.gen_range(1..=2) == 1;
        let step = 1.0 / veclen;
        let mut f = 0.0;
        while f < 1.0 {
            self.carve_route(vm, rng, vec, f, rs, randomize_xz);
            f += step;
        }
        self.orp = rp;
    }

    #[allow(clippy::cast_possible_truncation)]
    fn carve_route<R: Rng>(&self, vm: &mut VoxelBuffer, rng: &mut R, vec: [f32; 3], f: f32, rs: i32, randomize_xz: bool) {
        let start_y = self.orp[1] as i32 + self.of.y;
        let fp = [
            self.orp[0] + vec[0] * f + 0.1 * rng.gen_range(-10..=10) as f32,
            self.orp[1] + vec[1] * f,
            self.orp[2] + vec[2] * f + 0.1 * rng.gen_range(-10..=10) as f32,
        ];
        let cp = Vec3i::new(fp[0] as i32, fp[1] as i32, fp[2] as i32) + self.of;

        let mut d0 = -rs / 2;
        let mut d1 = d0 + rs;
        if randomize_xz {
            d0 += rng.gen_range(-1..=1);
            d1 += rng.gen_range(-1..=1);
        }
        let flat_cave_floor = !self.large && rng.gen_range(0..=2) == 2;

        let area = *vm.area();
        let water_level = self.ctx.water_level;
        let full_ymin = self.ctx.node_min.y - MAP_BLOCKSIZE;
        let full_ymax = self.ctx.node_max.y + MAP_BLOCKSIZE;

        for z0 in d0..=d1 {
            let si = rs / 2 - (z0.abs() - rs / 7 - 1).max(0);
            let x_lo = -si - rng.gen_range(0..=1);
            let x_hi = si - 1 + rng.gen_range(0..=1);
            for x0 in x_lo..=x_hi {
                let maxabsxz = x0.abs().max(z0.abs());
                let si2 = rs / 2 - (maxabsxz - rs / 7 - 1).max(0);
                for y0 in -si2..=si2 {
                    if flat_cave_floor && y0 <= -rs / 2 && rs <= 7 {
                        continue;
                    }
                    // Large caves stay low
                    if self.large_flat && rs > 7 && y0.abs() >= rs / 3 {
                        continue;
                    }
                    let p = cp + Vec3i::new(x0, y0, z0);
                    if !area.contains(p) {
                        continue;
                    }
                    let i = area.index_p(p);
                    if !is_ground(self.ground, vm.node_at(i).content) {
                        continue;
                    }
                    let node = if !self.large || !self.flooded {
                        MapNode::AIR
                    } else if full_ymin < water_level && full_ymax > water_level {
                        if p.y <= water_level {
                            self.water
                        } else {
                            MapNode::AIR
                        }
                    } else if full_ymax < water_level && p.y < start_y - 4 {
                        self.liquid
                    } else {
                        MapNode::AIR
                    };
                    vm.set_at(i, node);
                }
            }
        }
    }
}

// ============================================================================
// CARVER SET
// ============================================================================

/// Every carver of one generator, run in a fixed order.
pub struct CaveCarver {
    intersection: CavesNoiseIntersection,
    caverns: Option<CavernsNoise>,
    random_walk: CavesRandomWalk,
}

impl CaveCarver {
    /// Builds the carvers. Caverns only exist if `with_caverns` is set.
    #[must_use]
    pub fn new(params: &CaveParams, world_seed: u64, with_caverns: bool) -> Self {
        Self {
            intersection: CavesNoiseIntersection::new(params, world_seed),
            caverns: with_caverns.then(|| CavernsNoise::new(params, world_seed)),
            random_walk: CavesRandomWalk::new(params),
        }
    }

    /// Re-seeds every noise.
    pub fn reseed(&mut self, world_seed: u64) {
        self.intersection.reseed(world_seed);
        if let Some(caverns) = &mut self.caverns {
            caverns.reseed(world_seed);
        }
    }

    /// Runs caverns, tunnels and random-walk caves over the chunk.
    #[allow(clippy::too_many_arguments)]
    pub fn carve(
        &mut self,
        vm: &mut VoxelBuffer,
        ctx: &ShapeContext,
        ground: &[bool],
        heightmap: &[i16],
        biomemap: &[Biome],
        content: &BiomeContent,
        max_stone_y: i32,
        blockseed: u64,
    ) {
        if ctx.node_min.y > max_stone_y {
            return;
        }
        let near_cavern = self
            .caverns
            .as_mut()
            .is_some_and(|c| c.generate(vm, ctx, ground, max_stone_y));
        self.intersection.generate(vm, ctx, ground, biomemap, content);
        self.random_walk
            .generate(vm, ctx, ground, heightmap, max_stone_y, near_cavern, blockseed);
    }
}
