//! # Generation Parameters
//!
//! Global parameters shared by every variant, plus one parameter block per
//! terrain variant. Each block reads itself from a [`Settings`] store under
//! stable key names, falls back to the defaults below for missing keys, and
//! can write itself back.
//!
//! ## Key names
//!
//! | Block            | Prefix        | Example                      |
//! |------------------|---------------|------------------------------|
//! | [`MapgenParams`] | none / `mg_`  | `water_level`, `mg_flags`    |
//! | [`V7Params`]     | `mgv7_`       | `mgv7_np_mountain`           |
//! | [`ValleysParams`]| `mgvalleys_`  | `mgvalleys_river_size`       |

use tracing::warn;

use crate::error::{MapgenError, MapgenResult};
use crate::flags::{apply_flags, write_flags, FlagDesc};
use crate::noise::{NoiseParams, Spread};
use crate::settings::Settings;

/// Generate caves.
pub const MG_CAVES: u32 = 0x01;
/// Generate dungeons.
pub const MG_DUNGEONS: u32 = 0x02;
/// Compute light downstream (carried for the emerge layer).
pub const MG_LIGHT: u32 = 0x04;
/// Run the decoration pass.
pub const MG_DECORATIONS: u32 = 0x08;
/// Replace raw stone with biome nodes.
pub const MG_BIOMES: u32 = 0x10;

/// Names of the global flags.
pub const MG_FLAG_DESC: FlagDesc = &[
    ("caves", MG_CAVES),
    ("dungeons", MG_DUNGEONS),
    ("light", MG_LIGHT),
    ("decorations", MG_DECORATIONS),
    ("biomes", MG_BIOMES),
];

/// v7: mountains.
pub const MGV7_MOUNTAINS: u32 = 0x01;
/// v7: river channels.
pub const MGV7_RIDGES: u32 = 0x02;
/// v7: floatlands.
pub const MGV7_FLOATLANDS: u32 = 0x04;
/// v7: caverns.
pub const MGV7_CAVERNS: u32 = 0x08;

/// Names of the v7 flags.
pub const MGV7_SPFLAG_DESC: FlagDesc = &[
    ("mountains", MGV7_MOUNTAINS),
    ("ridges", MGV7_RIDGES),
    ("floatlands", MGV7_FLOATLANDS),
    ("caverns", MGV7_CAVERNS),
];

/// Valleys: temperature drops with altitude.
pub const MGVALLEYS_ALT_CHILL: u32 = 0x01;
/// Valleys: humidity rises near rivers.
pub const MGVALLEYS_HUMID_RIVERS: u32 = 0x02;
/// Valleys: rivers run shallower in hot, dry columns.
pub const MGVALLEYS_VARY_RIVER_DEPTH: u32 = 0x04;
/// Valleys: humidity drops with altitude.
pub const MGVALLEYS_ALT_DRY: u32 = 0x08;

/// Names of the valleys flags.
pub const MGVALLEYS_SPFLAG_DESC: FlagDesc = &[
    ("altitude_chill", MGVALLEYS_ALT_CHILL),
    ("humid_rivers", MGVALLEYS_HUMID_RIVERS),
    ("vary_river_depth", MGVALLEYS_VARY_RIVER_DEPTH),
    ("altitude_dry", MGVALLEYS_ALT_DRY),
];

/// Hard limit of the generation area, in nodes from the origin.
pub const MAX_MAP_GENERATION_LIMIT: i16 = 31007;

fn read_i16(s: &Settings, key: &str, slot: &mut i16) -> MapgenResult<()> {
    if let Some(v) = s.get_i16(key)? {
        *slot = v;
    }
    Ok(())
}

fn read_u16(s: &Settings, key: &str, slot: &mut u16) -> MapgenResult<()> {
    if let Some(v) = s.get_u16(key)? {
        *slot = v;
    }
    Ok(())
}

fn read_f32(s: &Settings, key: &str, slot: &mut f32) -> MapgenResult<()> {
    if let Some(v) = s.get_f32(key)? {
        *slot = v;
    }
    Ok(())
}

fn read_np(s: &Settings, key: &str, slot: &mut NoiseParams) -> MapgenResult<()> {
    if let Some(np) = s.get_noise_params(key)? {
        *slot = np;
    }
    Ok(())
}

fn read_flags(s: &Settings, key: &str, table: FlagDesc, slot: &mut u32) -> MapgenResult<()> {
    if let Some(text) = s.get_str(key)? {
        *slot = apply_flags(*slot, text, table);
    }
    Ok(())
}

fn invalid(key: &str, reason: impl Into<String>) -> MapgenError {
    MapgenError::InvalidSetting {
        key: key.to_owned(),
        reason: reason.into(),
    }
}

/// Terrain variant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MapgenKind {
    /// Ridged mountains, river channels, optional floatlands.
    #[default]
    V7,
    /// Valleys carved by rivers with a circular profile.
    Valleys,
}

impl MapgenKind {
    /// Settings name of the variant.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::V7 => "v7",
            Self::Valleys => "valleys",
        }
    }

    /// Parses a settings name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "v7" => Some(Self::V7),
            "valleys" => Some(Self::Valleys),
            _ => None,
        }
    }
}

/// Parameters shared by all variants.
#[derive(Clone, Debug, PartialEq)]
pub struct MapgenParams {
    /// World seed.
    pub seed: u64,
    /// Sea level.
    pub water_level: i16,
    /// Chunk edge length in 16-node blocks.
    pub chunk_size: i16,
    /// Nothing is generated beyond this distance from the origin.
    pub mapgen_limit: i16,
    /// `MG_*` bits.
    pub flags: u32,
    /// Terrain variant.
    pub variant: MapgenKind,
    /// Biome heat.
    pub np_heat: NoiseParams,
    /// Biome humidity.
    pub np_humidity: NoiseParams,
    /// Small-scale heat jitter at biome borders.
    pub np_heat_blend: NoiseParams,
    /// Small-scale humidity jitter at biome borders.
    pub np_humidity_blend: NoiseParams,
}

impl Default for MapgenParams {
    fn default() -> Self {
        Self {
            seed: 0,
            water_level: 1,
            chunk_size: 5,
            mapgen_limit: 31000,
            flags: MG_CAVES | MG_DUNGEONS | MG_LIGHT | MG_DECORATIONS | MG_BIOMES,
            variant: MapgenKind::V7,
            np_heat: NoiseParams::new(50.0, 50.0, Spread::uniform(1000.0), 5349, 3, 0.5),
            np_humidity: NoiseParams::new(50.0, 50.0, Spread::uniform(1000.0), 842, 3, 0.5),
            np_heat_blend: NoiseParams::new(0.0, 1.5, Spread::uniform(8.0), 13, 2, 1.0),
            np_humidity_blend: NoiseParams::new(0.0, 1.5, Spread::uniform(8.0), 90003, 2, 1.0),
        }
    }
}

impl MapgenParams {
    /// Chunk edge length in nodes.
    #[inline]
    #[must_use]
    pub fn chunk_nodes(&self) -> i32 {
        i32::from(self.chunk_size) * strata_core::MAP_BLOCKSIZE
    }

    /// Reads every global key present in `s`.
    ///
    /// # Errors
    ///
    /// A value of the wrong type, an out-of-range value, or invalid noise.
    pub fn read_params(&mut self, s: &Settings) -> MapgenResult<()> {
        if let Some(seed) = s.get_u64("seed")? {
            self.seed = seed;
        }
        read_i16(s, "water_level", &mut self.water_level)?;
        read_i16(s, "chunksize", &mut self.chunk_size)?;
        read_i16(s, "mapgen_limit", &mut self.mapgen_limit)?;
        read_flags(s, "mg_flags", MG_FLAG_DESC, &mut self.flags)?;
        if let Some(name) = s.get_str("mg_name")? {
            self.variant = MapgenKind::from_name(name)
                .ok_or_else(|| invalid("mg_name", format!("unknown terrain variant {name:?}")))?;
        }
        read_np(s, "mg_biome_np_heat", &mut self.np_heat)?;
        read_np(s, "mg_biome_np_humidity", &mut self.np_humidity)?;
        read_np(s, "mg_biome_np_heat_blend", &mut self.np_heat_blend)?;
        read_np(s, "mg_biome_np_humidity_blend", &mut self.np_humidity_blend)?;

        if !(1..=10).contains(&self.chunk_size) {
            return Err(invalid("chunksize", format!("must be in 1..=10, got {}", self.chunk_size)));
        }
        if !(0..=MAX_MAP_GENERATION_LIMIT).contains(&self.mapgen_limit) {
            return Err(invalid(
                "mapgen_limit",
                format!("must be in 0..={MAX_MAP_GENERATION_LIMIT}, got {}", self.mapgen_limit),
            ));
        }
        Ok(())
    }

    /// Writes every global key.
    ///
    /// # Errors
    ///
    /// Serialization failure of a noise table.
    pub fn write_params(&self, s: &mut Settings) -> MapgenResult<()> {
        s.set_u64("seed", self.seed);
        s.set("water_level", i64::from(self.water_level));
        s.set("chunksize", i64::from(self.chunk_size));
        s.set("mapgen_limit", i64::from(self.mapgen_limit));
        s.set("mg_flags", write_flags(self.flags, MG_FLAG_DESC));
        s.set("mg_name", self.variant.name());
        s.set_noise_params("mg_biome_np_heat", &self.np_heat)?;
        s.set_noise_params("mg_biome_np_humidity", &self.np_humidity)?;
        s.set_noise_params("mg_biome_np_heat_blend", &self.np_heat_blend)?;
        s.set_noise_params("mg_biome_np_humidity_blend", &self.np_humidity_blend)?;
        Ok(())
    }
}

/// Cave, cavern and dungeon knobs, shared by both variants.
#[derive(Clone, Debug, PartialEq)]
pub struct CaveParams {
    /// Noise-intersection tunnel width threshold.
    pub cave_width: f32,
    /// Large caves only start in chunks whose top is at or below this Y.
    pub large_cave_depth: i16,
    /// Fewest random-walk small caves per chunk.
    pub small_cave_num_min: u16,
    /// Most random-walk small caves per chunk.
    pub small_cave_num_max: u16,
    /// Fewest large caves per chunk.
    pub large_cave_num_min: u16,
    /// Most large caves per chunk.
    pub large_cave_num_max: u16,
    /// Probability that a large cave is flooded.
    pub large_cave_flooded: f32,
    /// Caverns only exist below this Y.
    pub cavern_limit: i16,
    /// Vertical distance over which caverns fade in below the limit.
    pub cavern_taper: i16,
    /// Cavern noise threshold.
    pub cavern_threshold: f32,
    /// Lowest Y for dungeons.
    pub dungeon_ymin: i16,
    /// Highest Y for dungeons.
    pub dungeon_ymax: i16,
    /// First tunnel noise.
    pub np_cave1: NoiseParams,
    /// Second tunnel noise.
    pub np_cave2: NoiseParams,
    /// Cavern noise.
    pub np_cavern: NoiseParams,
    /// Dungeon count noise.
    pub np_dungeons: NoiseParams,
}

impl CaveParams {
    /// Defaults used by v7.
    #[must_use]
    pub fn v7_defaults() -> Self {
        Self {
            cave_width: 0.09,
            large_cave_depth: -33,
            small_cave_num_min: 0,
            small_cave_num_max: 0,
            large_cave_num_min: 0,
            large_cave_num_max: 2,
            large_cave_flooded: 0.5,
            cavern_limit: -256,
            cavern_taper: 256,
            cavern_threshold: 0.7,
            dungeon_ymin: -31000,
            dungeon_ymax: 31000,
            np_cave1: NoiseParams::new(0.0, 12.0, Spread::uniform(61.0), 52534, 3, 0.5),
            np_cave2: NoiseParams::new(0.0, 12.0, Spread::uniform(67.0), 10325, 3, 0.5),
            np_cavern: NoiseParams::new(0.0, 1.0, Spread::new(384.0, 128.0, 384.0), 723, 5, 0.63),
            np_dungeons: NoiseParams::new(0.9, 0.5, Spread::uniform(500.0), 0, 2, 0.8),
        }
    }

    /// Defaults used by valleys.
    #[must_use]
    pub fn valleys_defaults() -> Self {
        Self {
            cavern_taper: 192,
            cavern_threshold: 0.6,
            dungeon_ymax: 63,
            np_cavern: NoiseParams::new(0.0, 1.0, Spread::new(768.0, 256.0, 768.0), 59033, 6, 0.63),
            ..Self::v7_defaults()
        }
    }

    fn read_params(&mut self, s: &Settings, prefix: &str) -> MapgenResult<()> {
        let key = |name: &str| format!("{prefix}{name}");
        read_f32(s, &key("cave_width"), &mut self.cave_width)?;
        read_i16(s, &key("large_cave_depth"), &mut self.large_cave_depth)?;
        read_u16(s, &key("small_cave_num_min"), &mut self.small_cave_num_min)?;
        read_u16(s, &key("small_cave_num_max"), &mut self.small_cave_num_max)?;
        read_u16(s, &key("large_cave_num_min"), &mut self.large_cave_num_min)?;
        read_u16(s, &key("large_cave_num_max"), &mut self.large_cave_num_max)?;
        read_f32(s, &key("large_cave_flooded"), &mut self.large_cave_flooded)?;
        read_i16(s, &key("cavern_limit"), &mut self.cavern_limit)?;
        read_i16(s, &key("cavern_taper"), &mut self.cavern_taper)?;
        read_f32(s, &key("cavern_threshold"), &mut self.cavern_threshold)?;
        read_i16(s, &key("dungeon_ymin"), &mut self.dungeon_ymin)?;
        read_i16(s, &key("dungeon_ymax"), &mut self.dungeon_ymax)?;
        read_np(s, &key("np_cave1"), &mut self.np_cave1)?;
        read_np(s, &key("np_cave2"), &mut self.np_cave2)?;
        read_np(s, &key("np_cavern"), &mut self.np_cavern)?;
        read_np(s, &key("np_dungeons"), &mut self.np_dungeons)?;

        if self.cavern_taper <= 0 {
            return Err(invalid(&key("cavern_taper"), "must be positive"));
        }
        if self.small_cave_num_min > self.small_cave_num_max {
            return Err(invalid(&key("small_cave_num_min"), "exceeds small_cave_num_max"));
        }
        if self.large_cave_num_min > self.large_cave_num_max {
            return Err(invalid(&key("large_cave_num_min"), "exceeds large_cave_num_max"));
        }
        if !(0.0..=1.0).contains(&self.large_cave_flooded) {
            return Err(invalid(&key("large_cave_flooded"), "must be a probability"));
        }
        Ok(())
    }

    fn write_params(&self, s: &mut Settings, prefix: &str) -> MapgenResult<()> {
        let key = |name: &str| format!("{prefix}{name}");
        s.set_f32(&key("cave_width"), self.cave_width);
        s.set(&key("large_cave_depth"), i64::from(self.large_cave_depth));
        s.set(&key("small_cave_num_min"), i64::from(self.small_cave_num_min));
        s.set(&key("small_cave_num_max"), i64::from(self.small_cave_num_max));
        s.set(&key("large_cave_num_min"), i64::from(self.large_cave_num_min));
        s.set(&key("large_cave_num_max"), i64::from(self.large_cave_num_max));
        s.set_f32(&key("large_cave_flooded"), self.large_cave_flooded);
        s.set(&key("cavern_limit"), i64::from(self.cavern_limit));
        s.set(&key("cavern_taper"), i64::from(self.cavern_taper));
        s.set_f32(&key("cavern_threshold"), self.cavern_threshold);
        s.set(&key("dungeon_ymin"), i64::from(self.dungeon_ymin));
        s.set(&key("dungeon_ymax"), i64::from(self.dungeon_ymax));
        s.set_noise_params(&key("np_cave1"), &self.np_cave1)?;
        s.set_noise_params(&key("np_cave2"), &self.np_cave2)?;
        s.set_noise_params(&key("np_cavern"), &self.np_cavern)?;
        s.set_noise_params(&key("np_dungeons"), &self.np_dungeons)?;
        Ok(())
    }
}

/// Parameters of the v7 variant.
#[derive(Clone, Debug, PartialEq)]
pub struct V7Params {
    /// `MGV7_*` bits.
    pub spflags: u32,
    /// Y where the mountain density gradient crosses zero.
    pub mount_zero_level: i16,
    /// Bottom of the floatland layer.
    pub floatland_ymin: i16,
    /// Top of the floatland layer.
    pub floatland_ymax: i16,
    /// Distance over which floatlands taper at both ends.
    pub floatland_taper: i16,
    /// Exponent of the taper curve.
    pub float_taper_exp: f32,
    /// Base floatland density; higher means more solid.
    pub floatland_density: f32,
    /// Floatland lakes fill up to this Y.
    pub floatland_ywater: i16,
    /// Caves, caverns and dungeons.
    pub caves: CaveParams,
    /// Base terrain height.
    pub np_terrain_base: NoiseParams,
    /// Alternate (flatter) terrain height.
    pub np_terrain_alt: NoiseParams,
    /// Per-column persistence of the base terrain.
    pub np_terrain_persist: NoiseParams,
    /// Blend between base and alternate terrain.
    pub np_height_select: NoiseParams,
    /// Depth of biome filler.
    pub np_filler_depth: NoiseParams,
    /// Mountain height scale.
    pub np_mount_height: NoiseParams,
    /// River channel width modifier.
    pub np_ridge_uwater: NoiseParams,
    /// Mountain density (3-D).
    pub np_mountain: NoiseParams,
    /// River channel shape (3-D).
    pub np_ridge: NoiseParams,
    /// Floatland density (3-D).
    pub np_floatland: NoiseParams,
}

impl Default for V7Params {
    fn default() -> Self {
        Self {
            spflags: MGV7_MOUNTAINS | MGV7_RIDGES | MGV7_CAVERNS,
            mount_zero_level: 0,
            floatland_ymin: 1024,
            floatland_ymax: 4096,
            floatland_taper: 256,
            float_taper_exp: 2.0,
            floatland_density: -0.6,
            floatland_ywater: -31000,
            caves: CaveParams::v7_defaults(),
            np_terrain_base: NoiseParams::new(4.0, 70.0, Spread::uniform(600.0), 82341, 5, 0.6),
            np_terrain_alt: NoiseParams::new(4.0, 25.0, Spread::uniform(600.0), 5934, 5, 0.6),
            np_terrain_persist: NoiseParams::new(0.6, 0.1, Spread::uniform(2000.0), 539, 3, 0.6),
            np_height_select: NoiseParams::new(-8.0, 16.0, Spread::uniform(500.0), 4213, 6, 0.7),
            np_filler_depth: NoiseParams::new(0.0, 1.2, Spread::uniform(150.0), 261, 3, 0.7),
            np_mount_height: NoiseParams::new(256.0, 112.0, Spread::uniform(1000.0), 72449, 3, 0.6),
            np_ridge_uwater: NoiseParams::new(0.0, 1.0, Spread::uniform(1000.0), 85039, 5, 0.6),
            np_mountain: NoiseParams::new(-0.6, 1.0, Spread::new(250.0, 350.0, 250.0), 5333, 5, 0.63),
            np_ridge: NoiseParams::new(0.0, 1.0, Spread::uniform(100.0), 6467, 4, 0.75),
            np_floatland: NoiseParams::new(0.0, 0.7, Spread::new(384.0, 96.0, 384.0), 1009, 4, 0.75)
                .with_lacunarity(1.618),
        }
    }
}

impl V7Params {
    const PREFIX: &'static str = "mgv7_";

    /// Reads every `mgv7_` key present in `s`.
    ///
    /// # Errors
    ///
    /// A value of the wrong type, an out-of-range value, or invalid noise.
    pub fn read_params(&mut self, s: &Settings) -> MapgenResult<()> {
        read_flags(s, "mgv7_spflags", MGV7_SPFLAG_DESC, &mut self.spflags)?;
        read_i16(s, "mgv7_mount_zero_level", &mut self.mount_zero_level)?;
        read_i16(s, "mgv7_floatland_ymin", &mut self.floatland_ymin)?;
        read_i16(s, "mgv7_floatland_ymax", &mut self.floatland_ymax)?;
        read_i16(s, "mgv7_floatland_taper", &mut self.floatland_taper)?;
        read_f32(s, "mgv7_float_taper_exp", &mut self.float_taper_exp)?;
        read_f32(s, "mgv7_floatland_density", &mut self.floatland_density)?;
        read_i16(s, "mgv7_floatland_ywater", &mut self.floatland_ywater)?;
        self.caves.read_params(s, Self::PREFIX)?;

        read_np(s, "mgv7_np_terrain_base", &mut self.np_terrain_base)?;
        read_np(s, "mgv7_np_terrain_alt", &mut self.np_terrain_alt)?;
        read_np(s, "mgv7_np_terrain_persist", &mut self.np_terrain_persist)?;
        read_np(s, "mgv7_np_height_select", &mut self.np_height_select)?;
        read_np(s, "mgv7_np_filler_depth", &mut self.np_filler_depth)?;
        read_np(s, "mgv7_np_mount_height", &mut self.np_mount_height)?;
        read_np(s, "mgv7_np_ridge_uwater", &mut self.np_ridge_uwater)?;
        read_np(s, "mgv7_np_mountain", &mut self.np_mountain)?;
        read_np(s, "mgv7_np_ridge", &mut self.np_ridge)?;
        read_np(s, "mgv7_np_floatland", &mut self.np_floatland)?;

        if self.floatland_taper < 0 {
            return Err(invalid("mgv7_floatland_taper", "must not be negative"));
        }
        if !self.float_taper_exp.is_finite() || self.float_taper_exp <= 0.0 {
            return Err(invalid("mgv7_float_taper_exp", "must be a positive number"));
        }
        Ok(())
    }

    /// Writes every `mgv7_` key.
    ///
    /// # Errors
    ///
    /// Serialization failure of a noise table.
    pub fn write_params(&self, s: &mut Settings) -> MapgenResult<()> {
        s.set("mgv7_spflags", write_flags(self.spflags, MGV7_SPFLAG_DESC));
        s.set("mgv7_mount_zero_level", i64::from(self.mount_zero_level));
        s.set("mgv7_floatland_ymin", i64::from(self.floatland_ymin));
        s.set("mgv7_floatland_ymax", i64::from(self.floatland_ymax));
        s.set("mgv7_floatland_taper", i64::from(self.floatland_taper));
        s.set_f32("mgv7_float_taper_exp", self.float_taper_exp);
        s.set_f32("mgv7_floatland_density", self.floatland_density);
        s.set("mgv7_floatland_ywater", i64::from(self.floatland_ywater));
        self.caves.write_params(s, Self::PREFIX)?;

        s.set_noise_params("mgv7_np_terrain_base", &self.np_terrain_base)?;
        s.set_noise_params("mgv7_np_terrain_alt", &self.np_terrain_alt)?;
        s.set_noise_params("mgv7_np_terrain_persist", &self.np_terrain_persist)?;
        s.set_noise_params("mgv7_np_height_select", &self.np_height_select)?;
        s.set_noise_params("mgv7_np_filler_depth", &self.np_filler_depth)?;
        s.set_noise_params("mgv7_np_mount_height", &self.np_mount_height)?;
        s.set_noise_params("mgv7_np_ridge_uwater", &self.np_ridge_uwater)?;
        s.set_noise_params("mgv7_np_mountain", &self.np_mountain)?;
        s.set_noise_params("mgv7_np_ridge", &self.np_ridge)?;
        s.set_noise_params("mgv7_np_floatland", &self.np_floatland)?;
        Ok(())
    }
}

/// Parameters of the valleys variant.
#[derive(Clone, Debug, PartialEq)]
pub struct ValleysParams {
    /// `MGVALLEYS_*` bits.
    pub spflags: u32,
    /// Height over which the temperature drops by 20.
    pub altitude_chill: u16,
    /// River depth below the banks.
    pub river_depth: u16,
    /// River width, in hundredths of the river noise range.
    pub river_size: u16,
    /// Caves, caverns and dungeons.
    pub caves: CaveParams,
    /// Depth of biome filler.
    pub np_filler_depth: NoiseParams,
    /// 3-D fill between valleys (cliffs and overhangs).
    pub np_inter_valley_fill: NoiseParams,
    /// Slope of valley sides.
    pub np_inter_valley_slope: NoiseParams,
    /// River course.
    pub np_rivers: NoiseParams,
    /// Base terrain height.
    pub np_terrain_height: NoiseParams,
    /// Valley depth.
    pub np_valley_depth: NoiseParams,
    /// Valley profile (narrow to wide).
    pub np_valley_profile: NoiseParams,
}

impl Default for ValleysParams {
    fn default() -> Self {
        Self {
            spflags: MGVALLEYS_ALT_CHILL
                | MGVALLEYS_HUMID_RIVERS
                | MGVALLEYS_VARY_RIVER_DEPTH
                | MGVALLEYS_ALT_DRY,
            altitude_chill: 90,
            river_depth: 4,
            river_size: 5,
            caves: CaveParams::valleys_defaults(),
            np_filler_depth: NoiseParams::new(0.0, 1.2, Spread::uniform(256.0), 1605, 3, 0.5),
            np_inter_valley_fill: NoiseParams::new(0.0, 1.0, Spread::new(256.0, 512.0, 256.0), 1993, 6, 0.8),
            np_inter_valley_slope: NoiseParams::new(0.5, 0.5, Spread::uniform(128.0), 746, 1, 1.0),
            np_rivers: NoiseParams::new(0.0, 1.0, Spread::uniform(256.0), -6050, 5, 0.6),
            np_terrain_height: NoiseParams::new(-10.0, 50.0, Spread::uniform(1024.0), 5202, 6, 0.4),
            np_valley_depth: NoiseParams::new(5.0, 4.0, Spread::uniform(512.0), -1914, 1, 1.0),
            np_valley_profile: NoiseParams::new(0.6, 0.5, Spread::uniform(512.0), 777, 1, 1.0),
        }
    }
}

impl ValleysParams {
    const PREFIX: &'static str = "mgvalleys_";

    /// Reads every `mgvalleys_` key present in `s`.
    ///
    /// # Errors
    ///
    /// A value of the wrong type, an out-of-range value, or invalid noise.
    pub fn read_params(&mut self, s: &Settings) -> MapgenResult<()> {
        read_flags(s, "mgvalleys_spflags", MGVALLEYS_SPFLAG_DESC, &mut self.spflags)?;
        read_u16(s, "mgvalleys_altitude_chill", &mut self.altitude_chill)?;
        read_u16(s, "mgvalleys_river_depth", &mut self.river_depth)?;
        read_u16(s, "mgvalleys_river_size", &mut self.river_size)?;
        self.caves.read_params(s, Self::PREFIX)?;

        read_np(s, "mgvalleys_np_filler_depth", &mut self.np_filler_depth)?;
        read_np(s, "mgvalleys_np_inter_valley_fill", &mut self.np_inter_valley_fill)?;
        read_np(s, "mgvalleys_np_inter_valley_slope", &mut self.np_inter_valley_slope)?;
        read_np(s, "mgvalleys_np_rivers", &mut self.np_rivers)?;
        read_np(s, "mgvalleys_np_terrain_height", &mut self.np_terrain_height)?;
        read_np(s, "mgvalleys_np_valley_depth", &mut self.np_valley_depth)?;
        read_np(s, "mgvalleys_np_valley_profile", &mut self.np_valley_profile)?;

        if self.river_size == 0 {
            return Err(invalid("mgvalleys_river_size", "must be positive"));
        }
        if self.altitude_chill == 0 {
            return Err(invalid("mgvalleys_altitude_chill", "must be positive"));
        }
        Ok(())
    }

    /// Writes every `mgvalleys_` key.
    ///
    /// # Errors
    ///
    /// Serialization failure of a noise table.
    pub fn write_params(&self, s: &mut Settings) -> MapgenResult<()> {
        s.set("mgvalleys_spflags", write_flags(self.spflags, MGVALLEYS_SPFLAG_DESC));
        s.set("mgvalleys_altitude_chill", i64::from(self.altitude_chill));
        s.set("mgvalleys_river_depth", i64::from(self.river_depth));
        s.set("mgvalleys_river_size", i64::from(self.river_size));
        self.caves.write_params(s, Self::PREFIX)?;

        s.set_noise_params("mgvalleys_np_filler_depth", &self.np_filler_depth)?;
        s.set_noise_params("mgvalleys_np_inter_valley_fill", &self.np_inter_valley_fill)?;
        s.set_noise_params("mgvalleys_np_inter_valley_slope", &self.np_inter_valley_slope)?;
        s.set_noise_params("mgvalleys_np_rivers", &self.np_rivers)?;
        s.set_noise_params("mgvalleys_np_terrain_height", &self.np_terrain_height)?;
        s.set_noise_params("mgvalleys_np_valley_depth", &self.np_valley_depth)?;
        s.set_noise_params("mgvalleys_np_valley_profile", &self.np_valley_profile)?;
        Ok(())
    }
}

/// Parameters of whichever variant is selected.
#[derive(Clone, Debug, PartialEq)]
pub enum VariantParams {
    /// v7.
    V7(V7Params),
    /// Valleys.
    Valleys(ValleysParams),
}

impl VariantParams {
    /// Defaults for `kind`.
    #[must_use]
    pub fn defaults_for(kind: MapgenKind) -> Self {
        match kind {
            MapgenKind::V7 => Self::V7(V7Params::default()),
            MapgenKind::Valleys => Self::Valleys(ValleysParams::default()),
        }
    }

    /// Which variant these are.
    #[must_use]
    pub const fn kind(&self) -> MapgenKind {
        match self {
            Self::V7(_) => MapgenKind::V7,
            Self::Valleys(_) => MapgenKind::Valleys,
        }
    }

    /// Cave block of the variant.
    #[must_use]
    pub const fn caves(&self) -> &CaveParams {
        match self {
            Self::V7(p) => &p.caves,
            Self::Valleys(p) => &p.caves,
        }
    }

    /// Filler depth noise of the variant.
    #[must_use]
    pub const fn np_filler_depth(&self) -> &NoiseParams {
        match self {
            Self::V7(p) => &p.np_filler_depth,
            Self::Valleys(p) => &p.np_filler_depth,
        }
    }

    /// Reads the variant's keys.
    ///
    /// # Errors
    ///
    /// See the variant's `read_params`.
    pub fn read_params(&mut self, s: &Settings) -> MapgenResult<()> {
        match self {
            Self::V7(p) => p.read_params(s),
            Self::Valleys(p) => p.read_params(s),
        }
    }

    /// Writes the variant's keys.
    ///
    /// # Errors
    ///
    /// See the variant's `write_params`.
    pub fn write_params(&self, s: &mut Settings) -> MapgenResult<()> {
        match self {
            Self::V7(p) => p.write_params(s),
            Self::Valleys(p) => p.write_params(s),
        }
    }
}

/// Reads the global block and the selected variant's block.
///
/// Keys that neither block knows are logged and otherwise ignored.
///
/// # Errors
///
/// Any read error of either block.
pub fn read_all(s: &Settings) -> MapgenResult<(MapgenParams, VariantParams)> {
    let mut params = MapgenParams::default();
    params.read_params(s)?;
    let mut variant = VariantParams::defaults_for(params.variant);
    variant.read_params(s)?;

    let mut known = Settings::new();
    params.write_params(&mut known)?;
    for kind in [MapgenKind::V7, MapgenKind::Valleys] {
        VariantParams::defaults_for(kind).write_params(&mut known)?;
    }
    for key in s.keys().filter(|k| !known.contains(k)) {
        warn!(key, "ignoring unknown setting");
    }

    Ok((params, variant))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_settings() {
        let (params, variant) = read_all(&Settings::new()).unwrap();
        assert_eq!(params, MapgenParams::default());
        assert_eq!(variant, VariantParams::V7(V7Params::default()));
        assert_eq!(params.chunk_nodes(), 80);
    }

    #[test]
    fn test_write_read_roundtrip() {
        let mut v7 = V7Params::default();
        v7.spflags |= MGV7_FLOATLANDS;
        v7.caves.cave_width = 0.2;
        v7.np_ridge.octaves = 2;
        let params = MapgenParams {
            seed: 987_654_321,
            water_level: -3,
            ..MapgenParams::default()
        };

        let mut s = Settings::new();
        params.write_params(&mut s).unwrap();
        v7.write_params(&mut s).unwrap();

        let text = s.to_toml_string().unwrap();
        let reloaded = Settings::from_toml_str(&text).unwrap();
        let (p2, v2) = read_all(&reloaded).unwrap();
        assert_eq!(p2, params);
        assert_eq!(v2, VariantParams::V7(v7));
    }

    #[test]
    fn test_spflags_applied_over_defaults() {
        let s = Settings::from_toml_str("mgv7_spflags = \"floatlands, nocaverns\"\n").unwrap();
        let mut v7 = V7Params::default();
        v7.read_params(&s).unwrap();
        assert_eq!(v7.spflags, MGV7_MOUNTAINS | MGV7_RIDGES | MGV7_FLOATLANDS);
    }

    #[test]
    fn test_variant_selection() {
        let s = Settings::from_toml_str("mg_name = \"valleys\"\nmgvalleys_river_size = 8\n").unwrap();
        let (params, variant) = read_all(&s).unwrap();
        assert_eq!(params.variant, MapgenKind::Valleys);
        match variant {
            VariantParams::Valleys(v) => assert_eq!(v.river_size, 8),
            VariantParams::V7(_) => panic!("expected valleys params"),
        }
    }

    #[test]
    fn test_unknown_variant_rejected() {
        let s = Settings::from_toml_str("mg_name = \"carpathian\"\n").unwrap();
        assert!(matches!(read_all(&s), Err(MapgenError::InvalidSetting { .. })));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let s = Settings::from_toml_str("mgv7_np_volcano = 3\nfancy_trees = true\n").unwrap();
        assert!(read_all(&s).is_ok());
    }

    #[test]
    fn test_range_validation() {
        for text in [
            "chunksize = 0\n",
            "chunksize = 11\n",
            "mgv7_cavern_taper = 0\n",
            "mgv7_floatland_taper = -1\n",
            "mgv7_large_cave_flooded = 1.5\n",
            "mg_name = \"valleys\"\nmgvalleys_river_size = 0\n",
            "mgv7_np_mountain = { offset = 0.0, scale = 1.0, spread = { x = 1.0, y = 1.0, z = 1.0 }, seed = 1, octaves = 0, persistence = 0.5 }\n",
        ] {
            let s = Settings::from_toml_str(text).unwrap();
            assert!(read_all(&s).is_err(), "should reject {text:?}");
        }
    }

    #[test]
    fn test_valleys_cave_defaults_differ() {
        let v = ValleysParams::default();
        assert_eq!(v.caves.cavern_taper, 192);
        assert_eq!(v.caves.dungeon_ymax, 63);
        assert_eq!(v.caves.np_cave1, CaveParams::v7_defaults().np_cave1);
    }
}
