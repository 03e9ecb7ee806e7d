//! # Voxel Storage
//!
//! - `area`: integer boxes and the index function
//! - `node`: map nodes and reserved content ids
//! - `buffer`: the growable node + flag arrays

pub mod area;
pub mod buffer;
pub mod node;

pub use area::VoxelArea;
pub use buffer::{VoxelBuffer, FLAG_CHECKED1, FLAG_CHECKED2, FLAG_NO_DATA, FLAG_UNUSED};
pub use node::{ContentId, MapNode, CONTENT_AIR, CONTENT_IGNORE, CONTENT_UNKNOWN};
