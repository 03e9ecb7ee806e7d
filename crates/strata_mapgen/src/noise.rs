//! # Fractal Noise
//!
//! Deterministic multi-octave simplex noise, sampled either at single points
//! or in bulk over a whole chunk.
//!
//! ## Value of a sample
//!
//! ```text
//! v(p) = offset + scale * Σ persistence^i * octave_i(p * lacunarity^i / spread)
//! ```
//!
//! Each octave is an independently seeded simplex function, so octaves never
//! line up with each other.
//!
//! ## Determinism Guarantee
//!
//! Given the same `NoiseParams` and world seed, every sample is a pure
//! function of the world-absolute coordinate. Permutation tables come from
//! a fixed xorshift shuffle and all arithmetic is plain IEEE `f64`, so the
//! same value comes out on any platform, any time.

use serde::{Deserialize, Serialize};

use crate::error::{MapgenError, MapgenResult};
use crate::flags::{apply_flags, write_flags, FlagDesc};

/// World seed for deterministic generation.
///
/// All procedural generation derives from this seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldSeed(u64);

impl WorldSeed {
    /// Creates a new world seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Derives a sub-seed for a specific purpose (e.g., one noise octave).
    ///
    /// Uses a hash function to create independent streams from one seed.
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        let mut hash = self.0;
        hash ^= purpose;
        hash = hash.wrapping_mul(0x517c_c1b7_2722_0a95);
        hash ^= hash >> 32;
        Self(hash)
    }
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self(0xDEAD_BEEF_CAFE_BABE)
    }
}

/// Pre-computed permutation table for one octave.
#[derive(Clone)]
struct PermutationTable {
    /// 512-entry permutation table (256 entries, doubled for overflow handling).
    perm: [u8; 512],
}

/// 12 gradient vectors for 2D simplex (vertices of a regular 12-gon).
const GRAD2: [[i8; 2]; 12] = [
    [1, 0], [1, 1], [0, 1], [-1, 1],
    [-1, 0], [-1, -1], [0, -1], [1, -1],
    [1, 0], [0, 1], [-1, 0], [0, -1],
];

/// 12 gradient vectors for 3D simplex (cube edge midpoints).
const GRAD3: [[i8; 3]; 12] = [
    [1, 1, 0], [-1, 1, 0], [1, -1, 0], [-1, -1, 0],
    [1, 0, 1], [-1, 0, 1], [1, 0, -1], [-1, 0, -1],
    [0, 1, 1], [0, -1, 1], [0, 1, -1], [0, -1, -1],
];

impl PermutationTable {
    /// Creates a new permutation table from a seed.
    fn new(seed: WorldSeed) -> Self {
        let mut table = Self { perm: [0u8; 512] };
        table.reshuffle(seed);
        table
    }

    /// Rebuilds the table in place for a new seed.
    fn reshuffle(&mut self, seed: WorldSeed) {
        let perm = &mut self.perm;
        for (p, v) in perm.iter_mut().zip(0..=u8::MAX) {
            *p = v;
        }

        // xorshift64 never leaves zero, so mix a zero seed first
        let mut rng_state = seed.value();
        if rng_state == 0 {
            rng_state = WorldSeed::default().value();
        }
        for i in (1..256).rev() {
            rng_state ^= rng_state << 13;
            rng_state ^= rng_state >> 7;
            rng_state ^= rng_state << 17;

            let j = usize::try_from(rng_state % (i as u64 + 1)).unwrap_or(0);
            perm.swap(i, j);
        }

        for i in 0..256 {
            perm[256 + i] = perm[i];
        }
    }

    /// Gets a permutation value (with automatic wrapping).
    #[inline]
    fn get(&self, index: usize) -> usize {
        usize::from(self.perm[index & 511])
    }
}

/// Seeded simplex noise, one octave's worth.
///
/// Produces smooth, continuous values in roughly [-1, 1].
#[derive(Clone)]
pub struct SimplexNoise {
    /// The permutation table.
    perm_table: PermutationTable,
}

impl SimplexNoise {
    /// Skewing factor for 2D simplex grid.
    const F2: f64 = 0.366_025_403_784_439; // (sqrt(3) - 1) / 2
    /// Unskewing factor for 2D simplex grid.
    const G2: f64 = 0.211_324_865_405_187; // (3 - sqrt(3)) / 6
    /// Skewing factor for 3D simplex grid.
    const F3: f64 = 1.0 / 3.0;
    /// Unskewing factor for 3D simplex grid.
    const G3: f64 = 1.0 / 6.0;

    /// Creates a new simplex noise generator from a seed.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            perm_table: PermutationTable::new(seed),
        }
    }

    /// Re-seeds without reallocating.
    pub fn reseed(&mut self, seed: WorldSeed) {
        self.perm_table.reshuffle(seed);
    }

    /// Samples 2D simplex noise.
    #[must_use]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let skew = (x + y) * Self::F2;
        let i = fast_floor(x + skew);
        let j = fast_floor(y + skew);

        let unskew = f64::from(i + j) * Self::G2;
        let x0 = x - (f64::from(i) - unskew);
        let y0 = y - (f64::from(j) - unskew);

        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - unit(i1) + Self::G2;
        let y1 = y0 - unit(j1) + Self::G2;
        let x2 = x0 - 1.0 + 2.0 * Self::G2;
        let y2 = y0 - 1.0 + 2.0 * Self::G2;

        let ii = lattice_index(i);
        let jj = lattice_index(j);
        let p = &self.perm_table;

        let gi0 = p.get(ii + p.get(jj));
        let gi1 = p.get(ii + i1 + p.get(jj + j1));
        let gi2 = p.get(ii + 1 + p.get(jj + 1));

        let n0 = Self::corner2(x0, y0, gi0);
        let n1 = Self::corner2(x1, y1, gi1);
        let n2 = Self::corner2(x2, y2, gi2);

        // 70 normalizes the sum to [-1, 1]
        70.0 * (n0 + n1 + n2)
    }

    #[inline]
    fn corner2(x: f64, y: f64, hash: usize) -> f64 {
        let t = 0.5 - x * x - y * y;
        if t < 0.0 {
            return 0.0;
        }
        let g = GRAD2[hash % 12];
        let t2 = t * t;
        t2 * t2 * (x * f64::from(g[0]) + y * f64::from(g[1]))
    }

    /// Samples 3D simplex noise.
    #[must_use]
    pub fn sample3(&self, x: f64, y: f64, z: f64) -> f64 {
        let skew = (x + y + z) * Self::F3;
        let i = fast_floor(x + skew);
        let j = fast_floor(y + skew);
        let k = fast_floor(z + skew);

        let unskew = f64::from(i + j + k) * Self::G3;
        let x0 = x - (f64::from(i) - unskew);
        let y0 = y - (f64::from(j) - unskew);
        let z0 = z - (f64::from(k) - unskew);

        // Which of the six tetrahedra we are in
        let (i1, j1, k1, i2, j2, k2) = if x0 >= y0 {
            if y0 >= z0 {
                (1, 0, 0, 1, 1, 0)
            } else if x0 >= z0 {
                (1, 0, 0, 1, 0, 1)
            } else {
                (0, 0, 1, 1, 0, 1)
            }
        } else if y0 < z0 {
            (0, 0, 1, 0, 1, 1)
        } else if x0 < z0 {
            (0, 1, 0, 0, 1, 1)
        } else {
            (0, 1, 0, 1, 1, 0)
        };

        let x1 = x0 - unit(i1) + Self::G3;
        let y1 = y0 - unit(j1) + Self::G3;
        let z1 = z0 - unit(k1) + Self::G3;
        let x2 = x0 - unit(i2) + 2.0 * Self::G3;
        let y2 = y0 - unit(j2) + 2.0 * Self::G3;
        let z2 = z0 - unit(k2) + 2.0 * Self::G3;
        let x3 = x0 - 1.0 + 3.0 * Self::G3;
        let y3 = y0 - 1.0 + 3.0 * Self::G3;
        let z3 = z0 - 1.0 + 3.0 * Self::G3;

        let ii = lattice_index(i);
        let jj = lattice_index(j);
        let kk = lattice_index(k);
        let p = &self.perm_table;

        let gi0 = p.get(ii + p.get(jj + p.get(kk)));
        let gi1 = p.get(ii + i1 + p.get(jj + j1 + p.get(kk + k1)));
        let gi2 = p.get(ii + i2 + p.get(jj + j2 + p.get(kk + k2)));
        let gi3 = p.get(ii + 1 + p.get(jj + 1 + p.get(kk + 1)));

        let n0 = Self::corner3(x0, y0, z0, gi0);
        let n1 = Self::corner3(x1, y1, z1, gi1);
        let n2 = Self::corner3(x2, y2, z2, gi2);
        let n3 = Self::corner3(x3, y3, z3, gi3);

        // 32 normalizes the sum to [-1, 1]
        32.0 * (n0 + n1 + n2 + n3)
    }

    #[inline]
    fn corner3(x: f64, y: f64, z: f64, hash: usize) -> f64 {
        let t = 0.6 - x * x - y * y - z * z;
        if t < 0.0 {
            return 0.0;
        }
        let g = GRAD3[hash % 12];
        let t2 = t * t;
        t2 * t2 * (x * f64::from(g[0]) + y * f64::from(g[1]) + z * f64::from(g[2]))
    }
}

/// Fast floor function.
#[inline]
#[allow(clippy::cast_possible_truncation)]
fn fast_floor(x: f64) -> i32 {
    let xi = x as i32;
    if x < f64::from(xi) {
        xi - 1
    } else {
        xi
    }
}

/// Noise sums are computed in `f64` and stored as `f32`.
#[inline]
#[allow(clippy::cast_possible_truncation)]
fn narrow(v: f64) -> f32 {
    v as f32
}

/// Wraps a lattice coordinate into the permutation table.
#[inline]
fn lattice_index(i: i32) -> usize {
    usize::try_from(i & 255).unwrap_or(0)
}

/// Simplex corner offset (0 or 1) as a float.
#[inline]
fn unit(offset: usize) -> f64 {
    if offset == 0 {
        0.0
    } else {
        1.0
    }
}

/// Smoothstep applied to a value in [-1, 1].
#[inline]
fn ease(v: f64) -> f64 {
    let t = ((v + 1.0) * 0.5).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t) * 2.0 - 1.0
}

/// Per-noise option bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct NoiseFlags(pub u32);

impl NoiseFlags {
    /// Marker: the flags were not customised. No effect on sampling.
    pub const DEFAULTS: u32 = 0x01;
    /// Each octave passes through the smoothstep ease curve.
    pub const EASED: u32 = 0x02;
    /// Each octave contributes its absolute value.
    pub const ABSVALUE: u32 = 0x04;

    /// Name table for the flags string.
    pub const DESC: FlagDesc = &[
        ("defaults", Self::DEFAULTS),
        ("eased", Self::EASED),
        ("absvalue", Self::ABSVALUE),
    ];

    /// True if every bit in `mask` is set.
    #[inline]
    #[must_use]
    pub const fn contains(self, mask: u32) -> bool {
        self.0 & mask == mask
    }
}

impl Serialize for NoiseFlags {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&write_flags(self.0, Self::DESC))
    }
}

impl<'de> Deserialize<'de> for NoiseFlags {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self(apply_flags(0, &s, Self::DESC)))
    }
}

/// Per-axis sampling scale (a feature is roughly `spread` nodes wide).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Spread {
    /// X spread.
    pub x: f32,
    /// Y spread.
    pub y: f32,
    /// Z spread.
    pub z: f32,
}

impl Spread {
    /// Creates a spread.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Same spread on every axis.
    #[must_use]
    pub const fn uniform(v: f32) -> Self {
        Self { x: v, y: v, z: v }
    }
}

fn default_lacunarity() -> f32 {
    2.0
}

fn default_noise_flags() -> NoiseFlags {
    NoiseFlags(NoiseFlags::DEFAULTS)
}

/// Parameters of one noise channel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoiseParams {
    /// Added to the scaled fractal sum.
    pub offset: f32,
    /// Multiplies the fractal sum.
    pub scale: f32,
    /// Per-axis feature size in nodes.
    pub spread: Spread,
    /// Per-noise seed, mixed with the world seed.
    pub seed: i32,
    /// Number of octaves.
    pub octaves: u16,
    /// Amplitude ratio between successive octaves.
    pub persistence: f32,
    /// Frequency ratio between successive octaves.
    #[serde(default = "default_lacunarity")]
    pub lacunarity: f32,
    /// Option bits.
    #[serde(default = "default_noise_flags")]
    pub flags: NoiseFlags,
}

impl NoiseParams {
    /// Most octaves a noise may have.
    pub const MAX_OCTAVES: u16 = 16;

    /// Creates noise params with lacunarity 2 and default flags.
    #[must_use]
    pub const fn new(
        offset: f32,
        scale: f32,
        spread: Spread,
        seed: i32,
        octaves: u16,
        persistence: f32,
    ) -> Self {
        Self {
            offset,
            scale,
            spread,
            seed,
            octaves,
            persistence,
            lacunarity: 2.0,
            flags: NoiseFlags(NoiseFlags::DEFAULTS),
        }
    }

    /// Same params with another lacunarity.
    #[must_use]
    pub const fn with_lacunarity(mut self, lacunarity: f32) -> Self {
        self.lacunarity = lacunarity;
        self
    }

    /// Same params with other flags.
    #[must_use]
    pub const fn with_flags(mut self, flags: u32) -> Self {
        self.flags = NoiseFlags(flags);
        self
    }

    /// Checks that the sampler can work with these params.
    ///
    /// The sampler itself never re-validates; this runs once when the
    /// settings are loaded.
    ///
    /// # Errors
    ///
    /// Returns [`MapgenError::InvalidNoiseParams`] naming `key`.
    pub fn validate(&self, key: &str) -> MapgenResult<()> {
        let bad = |reason: String| {
            Err(MapgenError::InvalidNoiseParams {
                key: key.to_owned(),
                reason,
            })
        };
        let s = self.spread;
        if !(s.x > 0.0 && s.y > 0.0 && s.z > 0.0) {
            return bad(format!("spread must be positive, got ({}, {}, {})", s.x, s.y, s.z));
        }
        if self.octaves == 0 || self.octaves > Self::MAX_OCTAVES {
            return bad(format!(
                "octaves must be in 1..={}, got {}",
                Self::MAX_OCTAVES,
                self.octaves
            ));
        }
        let finite = [self.offset, self.scale, self.persistence, self.lacunarity, s.x, s.y, s.z]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return bad("non-finite value".to_owned());
        }
        Ok(())
    }

    /// Octave table seed for this noise under `world_seed`.
    #[allow(clippy::cast_sign_loss)]
    fn octave_seed(&self, world_seed: u64, octave: u16) -> WorldSeed {
        WorldSeed::new(world_seed)
            .derive(u64::from(self.seed as u32))
            .derive(u64::from(octave) + 1)
    }
}

/// Samples a 2-D noise at one point. Builds the octave tables per call; use
/// a [`NoiseField`] for repeated queries.
#[must_use]
pub fn noise_2d(np: &NoiseParams, x: f32, z: f32, world_seed: u64) -> f32 {
    NoiseField::new(*np, world_seed).sample_2d(x, z)
}

/// Samples a 3-D noise at one point. Builds the octave tables per call; use
/// a [`NoiseField`] for repeated queries.
#[must_use]
pub fn noise_3d(np: &NoiseParams, x: f32, y: f32, z: f32, world_seed: u64) -> f32 {
    NoiseField::new(*np, world_seed).sample_3d(x, y, z)
}

/// A noise channel with its octave tables and a reusable result buffer.
///
/// Bulk fills write into `result` in [`VoxelArea`](strata_core::VoxelArea)
/// order (x fastest, then y, then z; 2-D fills are x then z). Fills reuse
/// the buffer's allocation from chunk to chunk.
///
/// # Example
///
/// ```rust,ignore
/// let mut field = NoiseField::new(np_terrain_base, seed);
/// field.fill_2d(node_min.x, node_min.z, 80, 80);
/// let height = field.result()[z * 80 + x];
/// ```
pub struct NoiseField {
    /// Channel parameters.
    params: NoiseParams,
    /// World seed the tables were built for.
    world_seed: u64,
    /// One table per octave.
    octaves: Vec<SimplexNoise>,
    /// Last bulk fill.
    result: Vec<f32>,
}

impl NoiseField {
    /// Builds the octave tables for `params` under `world_seed`.
    #[must_use]
    pub fn new(params: NoiseParams, world_seed: u64) -> Self {
        let octaves = (0..params.octaves)
            .map(|o| SimplexNoise::new(params.octave_seed(world_seed, o)))
            .collect();
        Self {
            params,
            world_seed,
            octaves,
            result: Vec::new(),
        }
    }

    /// Channel parameters.
    #[inline]
    #[must_use]
    pub const fn params(&self) -> &NoiseParams {
        &self.params
    }

    /// World seed the tables are built for.
    #[inline]
    #[must_use]
    pub const fn world_seed(&self) -> u64 {
        self.world_seed
    }

    /// Rebuilds the octave tables in place for another world seed.
    /// No-op if the seed is unchanged.
    pub fn reseed(&mut self, world_seed: u64) {
        if world_seed == self.world_seed {
            return;
        }
        self.world_seed = world_seed;
        for (o, table) in (0..self.params.octaves).zip(self.octaves.iter_mut()) {
            table.reseed(self.params.octave_seed(world_seed, o));
        }
    }

    /// Result of the last bulk fill.
    #[inline]
    #[must_use]
    pub fn result(&self) -> &[f32] {
        &self.result
    }

    /// Mutable result of the last bulk fill, for in-place adjustment.
    #[inline]
    pub fn result_mut(&mut self) -> &mut [f32] {
        &mut self.result
    }

    #[inline]
    fn shape(&self, v: f64) -> f64 {
        let mut v = v;
        if self.params.flags.contains(NoiseFlags::ABSVALUE) {
            v = v.abs();
        }
        if self.params.flags.contains(NoiseFlags::EASED) {
            v = ease(v);
        }
        v
    }

    #[inline]
    fn fractal_2d(&self, x: f64, z: f64, persistence: f64) -> f64 {
        let np = &self.params;
        let x = x / f64::from(np.spread.x);
        let z = z / f64::from(np.spread.z);
        let lacunarity = f64::from(np.lacunarity);

        let mut freq = 1.0;
        let mut amp = 1.0;
        let mut total = 0.0;
        for octave in &self.octaves {
            total += amp * self.shape(octave.sample(x * freq, z * freq));
            freq *= lacunarity;
            amp *= persistence;
        }
        f64::from(np.offset) + f64::from(np.scale) * total
    }

    #[inline]
    fn fractal_3d(&self, x: f64, y: f64, z: f64) -> f64 {
        let np = &self.params;
        let x = x / f64::from(np.spread.x);
        let y = y / f64::from(np.spread.y);
        let z = z / f64::from(np.spread.z);
        let lacunarity = f64::from(np.lacunarity);
        let persistence = f64::from(np.persistence);

        let mut freq = 1.0;
        let mut amp = 1.0;
        let mut total = 0.0;
        for octave in &self.octaves {
            total += amp * self.shape(octave.sample3(x * freq, y * freq, z * freq));
            freq *= lacunarity;
            amp *= persistence;
        }
        f64::from(np.offset) + f64::from(np.scale) * total
    }

    /// Point sample of the 2-D channel at world `(x, z)`.
    #[must_use]
    pub fn sample_2d(&self, x: f32, z: f32) -> f32 {
        narrow(self.fractal_2d(f64::from(x), f64::from(z), f64::from(self.params.persistence)))
    }

    /// Point sample of the 2-D channel with an overridden persistence.
    #[must_use]
    pub fn sample_2d_with_persistence(&self, x: f32, z: f32, persistence: f32) -> f32 {
        narrow(self.fractal_2d(f64::from(x), f64::from(z), f64::from(persistence)))
    }

    /// Point sample of the 3-D channel at world `(x, y, z)`.
    #[must_use]
    pub fn sample_3d(&self, x: f32, y: f32, z: f32) -> f32 {
        narrow(self.fractal_3d(f64::from(x), f64::from(y), f64::from(z)))
    }

    /// Fills `sx * sz` columns starting at world `(x0, z0)`.
    pub fn fill_2d(&mut self, x0: i32, z0: i32, sx: usize, sz: usize) {
        let persistence = f64::from(self.params.persistence);
        let mut out = std::mem::take(&mut self.result);
        out.clear();
        out.reserve(sx * sz);
        for wz in (z0..).take(sz) {
            for wx in (x0..).take(sx) {
                out.push(narrow(self.fractal_2d(f64::from(wx), f64::from(wz), persistence)));
            }
        }
        self.result = out;
    }

    /// Like [`fill_2d`](Self::fill_2d) but with a per-column persistence
    /// taken from `persist` (same layout, `sx * sz` entries).
    pub fn fill_2d_with_persistence(&mut self, x0: i32, z0: i32, sx: usize, sz: usize, persist: &[f32]) {
        debug_assert_eq!(persist.len(), sx * sz);
        let mut out = std::mem::take(&mut self.result);
        out.clear();
        out.reserve(sx * sz);
        for (z, wz) in (z0..).take(sz).enumerate() {
            for (x, wx) in (x0..).take(sx).enumerate() {
                let p = f64::from(persist[z * sx + x]);
                out.push(narrow(self.fractal_2d(f64::from(wx), f64::from(wz), p)));
            }
        }
        self.result = out;
    }

    /// Fills an `sx * sy * sz` box starting at world `(x0, y0, z0)`.
    pub fn fill_3d(&mut self, x0: i32, y0: i32, z0: i32, sx: usize, sy: usize, sz: usize) {
        let mut out = std::mem::take(&mut self.result);
        out.clear();
        out.reserve(sx * sy * sz);
        for wz in (z0..).take(sz) {
            for wy in (y0..).take(sy) {
                for wx in (x0..).take(sx) {
                    out.push(narrow(self.fractal_3d(f64::from(wx), f64::from(wy), f64::from(wz))));
                }
            }
        }
        self.result = out;
    }
}
