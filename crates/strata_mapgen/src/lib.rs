//! # STRATA Mapgen
//!
//! Deterministic procedural terrain for a voxel world.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: same seed and chunk position give the same bytes
//! 2. **Seamless**: every noise is sampled at world-absolute coordinates
//! 3. **Bulk**: noise is filled for a whole chunk at once, never per voxel
//! 4. **Owned**: one worker owns one `Mapgen` and its buffer per chunk
//!
//! ## Core Components
//!
//! - `NoiseField`: seeded fractal noise, point and bulk sampling
//! - `Settings` / `read_all`: TOML-backed parameters with documented defaults
//! - `TerrainShaper`: v7 (mountains, ridges, floatlands) or valleys (rivers)
//! - `BiomeAssigner`: heat/humidity climate and per-column biome cover
//! - `CaveCarver` / `DungeonGen`: caverns, tunnels, random walks, dungeons
//! - `Mapgen`: the per-chunk pipeline
//! - `EmergeManager`: worker pool handing results to storage
//! - `chunk_store`: the persisted chunk format
//!
//! ## Example
//!
//! ```rust,ignore
//! use strata_core::{ContentRegistry, Vec3i};
//! use strata_mapgen::{read_all, Mapgen, Settings};
//!
//! let settings = Settings::load("world.toml")?;
//! let (params, variant) = read_all(&settings)?;
//! let mut mapgen = Mapgen::new(params, variant, &ContentRegistry::with_defaults())?;
//!
//! let request = mapgen.request_for(Vec3i::ZERO);
//! let chunk = mapgen.make_chunk(&request)?;
//! println!("ground level {}", chunk.ground_level);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod biome;
pub mod caves;
pub mod chunk_store;
pub mod dungeon;
pub mod emerge;
pub mod error;
pub mod flags;
pub mod mapgen;
pub mod noise;
pub mod params;
pub mod settings;
pub mod shaper;

pub use biome::{generate_biomes, Biome, BiomeAssigner, BiomeContent, BiomeDef};
pub use caves::{CaveCarver, CavernsNoise, CavesNoiseIntersection, CavesRandomWalk};
pub use chunk_store::{decode_chunk, encode_chunk, load_chunk, save_chunk, StoredChunk, CHUNK_FORMAT_VERSION};
pub use dungeon::DungeonGen;
pub use emerge::{EmergeConfig, EmergeManager, EmergeStats};
pub use error::{MapgenError, MapgenResult};
pub use mapgen::{
    blockseed, ChunkContext, ChunkRequest, ChunkResult, Decorator, GenerationStage, Mapgen, TerrainContent,
};
pub use noise::{noise_2d, noise_3d, NoiseField, NoiseFlags, NoiseParams, SimplexNoise, Spread, WorldSeed};
pub use params::{read_all, CaveParams, MapgenKind, MapgenParams, V7Params, ValleysParams, VariantParams};
pub use settings::Settings;
pub use shaper::{ShapeContext, TerrainShaper, V7Shaper, ValleysShaper};
