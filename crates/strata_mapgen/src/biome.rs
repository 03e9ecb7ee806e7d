//! # Biomes
//!
//! Climate-driven surface cover.
//!
//! Each biome sits at a point in heat/humidity space and covers a Y range.
//! A column's biome is the one whose climate point is nearest to the
//! column's heat and humidity, among those covering the surface Y:
//!
//! ```text
//!  humidity
//!   100 ┤ icesheet        rainforest
//!       │   taiga  coniferous  deciduous
//!    50 ┤ tundra   grassland     savanna
//!       │ snowy              desert
//!     0 ┤      sandstone desert
//!       └──────────────────────────── heat
//!         0          50          100
//! ```
//!
//! The surface pass then replaces raw terrain stone with the biome's top,
//! filler, stone and riverbed nodes.

use strata_core::{ContentId, ContentRegistry, MapNode, Vec3i, VoxelBuffer, CONTENT_AIR};

use crate::error::{MapgenError, MapgenResult};
use crate::mapgen::TerrainContent;
use crate::noise::NoiseField;
use crate::params::MapgenParams;

/// Biome types in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Biome {
    /// Temperate grassland
    Grassland = 0,
    /// Broadleaf forest
    DeciduousForest = 1,
    /// Pine forest
    ConiferousForest = 2,
    /// Snowy pine forest
    Taiga = 3,
    /// Cold, stony barrens
    Tundra = 4,
    /// Snow-dusted grassland
    SnowyGrassland = 5,
    /// Hot sand desert
    Desert = 6,
    /// Dry sandstone desert
    SandstoneDesert = 7,
    /// Dry grass plains
    Savanna = 8,
    /// Hot, wet jungle
    Rainforest = 9,
    /// Permanent ice
    Icesheet = 10,
    /// Sea floor and shore
    Beach = 11,
}

/// Static description of a biome.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiomeDef {
    /// Registry-style name.
    pub name: &'static str,
    /// Heat point.
    pub heat_point: f32,
    /// Humidity point.
    pub humidity_point: f32,
    /// Lowest Y the biome covers.
    pub y_min: i16,
    /// Highest Y the biome covers.
    pub y_max: i16,
    /// Surface node.
    pub node_top: &'static str,
    /// Surface depth.
    pub depth_top: u8,
    /// Node under the surface.
    pub node_filler: &'static str,
    /// Base filler depth (noise is added).
    pub depth_filler: u8,
    /// Replaces raw stone.
    pub node_stone: &'static str,
    /// Under river water.
    pub node_riverbed: &'static str,
    /// Riverbed depth.
    pub depth_riverbed: u8,
    /// Replaces the top layers of sea water.
    pub node_water_top: Option<&'static str>,
    /// Depth of `node_water_top`.
    pub depth_water_top: u8,
}

const fn land(
    name: &'static str,
    heat_point: f32,
    humidity_point: f32,
    top: &'static str,
    filler: &'static str,
    depth_filler: u8,
    riverbed: &'static str,
) -> BiomeDef {
    BiomeDef {
        name,
        heat_point,
        humidity_point,
        y_min: 4,
        y_max: 31000,
        node_top: top,
        depth_top: 1,
        node_filler: filler,
        depth_filler,
        node_stone: "stone",
        node_riverbed: riverbed,
        depth_riverbed: 2,
        node_water_top: None,
        depth_water_top: 0,
    }
}

impl Biome {
    /// Every biome, in discriminant order.
    pub const ALL: [Self; 12] = [
        Self::Grassland,
        Self::DeciduousForest,
        Self::ConiferousForest,
        Self::Taiga,
        Self::Tundra,
        Self::SnowyGrassland,
        Self::Desert,
        Self::SandstoneDesert,
        Self::Savanna,
        Self::Rainforest,
        Self::Icesheet,
        Self::Beach,
    ];

    /// Description of this biome.
    #[must_use]
    pub const fn def(self) -> BiomeDef {
        match self {
            Self::Grassland => land("grassland", 50.0, 35.0, "dirt_with_grass", "dirt", 1, "sand"),
            Self::DeciduousForest => land("deciduous_forest", 60.0, 68.0, "dirt_with_grass", "dirt", 3, "sand"),
            Self::ConiferousForest => land(
                "coniferous_forest",
                45.0,
                70.0,
                "dirt_with_coniferous_litter",
                "dirt",
                3,
                "sand",
            ),
            Self::Taiga => land("taiga", 25.0, 70.0, "dirt_with_snow", "dirt", 3, "sand"),
            Self::Tundra => land("tundra", 0.0, 40.0, "permafrost_with_stones", "gravel", 1, "gravel"),
            Self::SnowyGrassland => land("snowy_grassland", 20.0, 35.0, "dirt_with_snow", "dirt", 1, "gravel"),
            Self::Desert => BiomeDef {
                node_stone: "desert_stone",
                ..land("desert", 92.0, 16.0, "desert_sand", "desert_sand", 1, "sand")
            },
            Self::SandstoneDesert => BiomeDef {
                node_stone: "sandstone",
                ..land("sandstone_desert", 60.0, 0.0, "sand", "sand", 1, "sand")
            },
            Self::Savanna => land("savanna", 89.0, 42.0, "dry_dirt_with_dry_grass", "dry_dirt", 1, "sand"),
            Self::Rainforest => land(
                "rainforest",
                86.0,
                65.0,
                "dirt_with_rainforest_litter",
                "dirt",
                3,
                "sand",
            ),
            Self::Icesheet => BiomeDef {
                y_min: -8,
                node_water_top: Some("ice"),
                depth_water_top: 10,
                ..land("icesheet", 0.0, 73.0, "snowblock", "snowblock", 3, "gravel")
            },
            Self::Beach => BiomeDef {
                y_min: -31000,
                y_max: 3,
                ..land("beach", 50.0, 50.0, "sand", "sand", 3, "sand")
            },
        }
    }

    /// Converts from u8.
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Grassland,
            1 => Self::DeciduousForest,
            2 => Self::ConiferousForest,
            3 => Self::Taiga,
            4 => Self::Tundra,
            5 => Self::SnowyGrassland,
            6 => Self::Desert,
            7 => Self::SandstoneDesert,
            8 => Self::Savanna,
            9 => Self::Rainforest,
            10 => Self::Icesheet,
            _ => Self::Beach,
        }
    }

    /// Nearest climate point among biomes covering `y`.
    #[must_use]
    pub fn from_climate(heat: f32, humidity: f32, y: i32) -> Self {
        let mut best = Self::Beach;
        let mut best_dist = f32::INFINITY;
        for biome in Self::ALL {
            let d = biome.def();
            if y < i32::from(d.y_min) || y > i32::from(d.y_max) {
                continue;
            }
            let dh = heat - d.heat_point;
            let dw = humidity - d.humidity_point;
            let dist = dh * dh + dw * dw;
            if dist < best_dist {
                best_dist = dist;
                best = biome;
            }
        }
        best
    }
}

/// Node ids of one biome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BiomeNodes {
    /// Surface node.
    pub top: MapNode,
    /// Filler node.
    pub filler: MapNode,
    /// Stone.
    pub stone: MapNode,
    /// Riverbed.
    pub riverbed: MapNode,
    /// Sea surface replacement.
    pub water_top: Option<MapNode>,
    /// Surface depth.
    pub depth_top: u16,
    /// Base filler depth.
    pub depth_filler: u16,
    /// Riverbed depth.
    pub depth_riverbed: u16,
    /// Sea surface replacement depth.
    pub depth_water_top: i32,
    /// Lowest Y the biome covers.
    pub y_min: i32,
}

/// Biome node names resolved to ids once per generator.
#[derive(Clone, Debug)]
pub struct BiomeContent {
    nodes: Vec<BiomeNodes>,
}

impl BiomeContent {
    /// Resolves every biome's nodes.
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
        let mut nodes = Vec::with_capacity(Biome::ALL.len());
        for biome in Biome::ALL {
            let d = biome.def();
            nodes.push(BiomeNodes {
                top: MapNode::new(id(d.node_top)?),
                filler: MapNode::new(id(d.node_filler)?),
                stone: MapNode::new(id(d.node_stone)?),
                riverbed: MapNode::new(id(d.node_riverbed)?),
                water_top: d.node_water_top.map(id).transpose()?.map(MapNode::new),
                depth_top: u16::from(d.depth_top),
                depth_filler: u16::from(d.depth_filler),
                depth_riverbed: u16::from(d.depth_riverbed),
                depth_water_top: i32::from(d.depth_water_top),
                y_min: i32::from(d.y_min),
            });
        }
        Ok(Self { nodes })
    }

    /// Nodes of `biome`.
    #[inline]
    #[must_use]
    pub fn nodes(&self, biome: Biome) -> &BiomeNodes {
        &self.nodes[biome as usize]
    }
}

/// Per-chunk heat and humidity maps.
///
/// The maps are public to the shaper between [`calc_climate`] and the
/// surface pass so a variant can adjust them (altitude chill, humid rivers).
///
/// [`calc_climate`]: BiomeAssigner::calc_climate
pub struct BiomeAssigner {
    heat: NoiseField,
    humidity: NoiseField,
    heat_blend: NoiseField,
    humidity_blend: NoiseField,
    heat_map: Vec<f32>,
    humidity_map: Vec<f32>,
}

impl BiomeAssigner {
    /// Builds the climate noises.
    #[must_use]
    pub fn new(params: &MapgenParams) -> Self {
        Self {
            heat: NoiseField::new(params.np_heat, params.seed),
            humidity: NoiseField::new(params.np_humidity, params.seed),
            heat_blend: NoiseField::new(params.np_heat_blend, params.seed),
            humidity_blend: NoiseField::new(params.np_humidity_blend, params.seed),
            heat_map: Vec::new(),
            humidity_map: Vec::new(),
        }
    }

    /// Re-seeds every climate noise.
    pub fn reseed(&mut self, seed: u64) {
        self.heat.reseed(seed);
        self.humidity.reseed(seed);
        self.heat_blend.reseed(seed);
        self.humidity_blend.reseed(seed);
    }

    /// Fills the heat and humidity maps for `sx * sz` columns at `(x0, z0)`.
    pub fn calc_climate(&mut self, x0: i32, z0: i32, sx: usize, sz: usize) {
        self.heat.fill_2d(x0, z0, sx, sz);
        self.humidity.fill_2d(x0, z0, sx, sz);
        self.heat_blend.fill_2d(x0, z0, sx, sz);
        self.humidity_blend.fill_2d(x0, z0, sx, sz);

        self.heat_map.clear();
        self.heat_map
            .extend(self.heat.result().iter().zip(self.heat_blend.result()).map(|(h, b)| h + b));
        self.humidity_map.clear();
        self.humidity_map.extend(
            self.humidity
                .result()
                .iter()
                .zip(self.humidity_blend.result())
                .map(|(h, b)| h + b),
        );
    }

    /// Heat per column.
    #[must_use]
    pub fn heat_map(&self) -> &[f32] {
        &self.heat_map
    }

    /// Humidity per column.
    #[must_use]
    pub fn humidity_map(&self) -> &[f32] {
        &self.humidity_map
    }

    /// Both maps, mutably.
    pub fn climate_maps_mut(&mut self) -> (&mut [f32], &mut [f32]) {
        (&mut self.heat_map, &mut self.humidity_map)
    }

    /// Biome of column `index` at height `y`.
    #[must_use]
    pub fn biome_at_index(&self, index: usize, y: i32) -> Biome {
        Biome::from_climate(self.heat_map[index], self.humidity_map[index], y)
    }

    /// Point lookup of the climate at `(x, z)`, blend included.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn climate_at_point(&self, x: i32, z: i32) -> (f32, f32) {
        let (x, z) = (x as f32, z as f32);
        let heat = self.heat.sample_2d(x, z) + self.heat_blend.sample_2d(x, z);
        let humidity = self.humidity.sample_2d(x, z) + self.humidity_blend.sample_2d(x, z);
        (heat, humidity)
    }
}

/// Replaces raw stone in the chunk columns with biome nodes.
///
/// Walks each column top-down from `node_max.y` to `node_min.y`. The biome
/// is picked at each new surface and whenever the walk drops below the
/// current biome's range. `filler_depth` holds one value per column.
/// Returns the biome of the topmost stone surface of every column, or the
/// biome at `min(node_max.y, water_level)` for columns without one.
#[allow(clippy::too_many_arguments)]
pub fn generate_biomes(
    vm: &mut VoxelBuffer,
    node_min: Vec3i,
    node_max: Vec3i,
    water_level: i32,
    ids: &TerrainContent,
    assigner: &BiomeAssigner,
    content: &BiomeContent,
    filler_depth: &[f32],
    biomemap: &mut Vec<Biome>,
) {
    const DISABLED: u16 = u16::MAX;

    let sx = usize::try_from(node_max.x - node_min.x + 1).unwrap_or(0);
    let sz = usize::try_from(node_max.z - node_min.z + 1).unwrap_or(0);
    biomemap.clear();
    biomemap.resize(sx * sz, Biome::Beach);
    let area = *vm.area();
    let ystride = area.ystride();

    for (zi, z) in (node_min.z..=node_max.z).enumerate() {
        for (xi, x) in (node_min.x..=node_max.x).enumerate() {
            let index = zi * sx + xi;
            let mut biome: Option<Biome> = None;
            let mut surface_found = false;
            let mut nodes = content.nodes(Biome::Beach);
            let mut base_filler = 0.0f32;

            let above = vm.node_at(area.index(x, node_max.y + 1, z)).content;
            let mut air_above = above == CONTENT_AIR;
            let mut water_above = above == ids.water || above == ids.river_water;
            let mut river_water_above = above == ids.river_water;
            let mut nplaced: u16 = if air_above || water_above { 0 } else { DISABLED };

            let mut vi = area.index(x, node_max.y, z);
            for y in (node_min.y..=node_max.y).rev() {
                let c = vm.node_at(vi).content;
                let is_terrain = c == ids.stone || c == ids.water || c == ids.river_water;
                let below_range = biome.is_some_and(|_| y < nodes.y_min);
                if is_terrain && (air_above || water_above || biome.is_none() || below_range) {
                    let b = assigner.biome_at_index(index, y);
                    biome = Some(b);
                    nodes = content.nodes(b);
                    if !surface_found && c == ids.stone {
                        biomemap[index] = b;
                        surface_found = true;
                    }
                    base_filler = (f32::from(nodes.depth_top) + f32::from(nodes.depth_filler) + filler_depth[index])
                        .max(0.0);
                }

                if c == ids.stone {
                    let below = vm.node_at(vi - ystride).content;
                    // Unsupported surfaces stay stone
                    if below == CONTENT_AIR || below == ids.water || below == ids.river_water {
                        nplaced = DISABLED;
                    }
                    if river_water_above {
                        if nplaced < nodes.depth_riverbed {
                            vm.set_at(vi, nodes.riverbed);
                            nplaced += 1;
                        } else {
                            nplaced = DISABLED;
                            river_water_above = false;
                        }
                    } else if nplaced < nodes.depth_top {
                        vm.set_at(vi, nodes.top);
                        nplaced += 1;
                    } else if f32::from(nplaced) < base_filler {
                        vm.set_at(vi, nodes.filler);
                        nplaced += 1;
                    } else {
                        vm.set_at(vi, nodes.stone);
                        nplaced = DISABLED;
                    }
                    air_above = false;
                    water_above = false;
                } else if c == ids.water {
                    if let Some(top) = nodes.water_top {
                        if y > water_level - nodes.depth_water_top {
                            vm.set_at(vi, top);
                        }
                    }
                    nplaced = 0;
                    air_above = false;
                    water_above = true;
                } else if c == ids.river_water {
                    nplaced = 0;
                    air_above = false;
                    water_above = true;
                    river_water_above = true;
                } else if c == CONTENT_AIR {
                    nplaced = 0;
                    air_above = true;
                    water_above = false;
                } else {
                    // Overgenerated structures from a neighbouring chunk
                    nplaced = DISABLED;
                    air_above = false;
                    water_above = false;
                }

                vi -= ystride;
            }

            if !surface_found {
                biomemap[index] = assigner.biome_at_index(index, node_max.y.min(water_level));
            }
        }
    }
}
