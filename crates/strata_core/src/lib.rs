//! # STRATA Core
//!
//! Voxel addressing and storage shared by every generation pass.
//!
//! ## Core Components
//!
//! - `VoxelArea`: inclusive integer box + row-major index function
//! - `VoxelBuffer`: dense node and flag arrays, growable in place
//! - `MapNode`: content id + two opaque parameters
//! - `ContentRegistry`: node name to content id resolution
//!
//! ## Example
//!
//! ```rust,ignore
//! use strata_core::{MapNode, Vec3i, VoxelArea, VoxelBuffer};
//!
//! let mut vm = VoxelBuffer::with_area(VoxelArea::new(Vec3i::splat(0), Vec3i::splat(1)));
//! vm.add_area(&VoxelArea::new(Vec3i::splat(2), Vec3i::splat(3)));
//! assert_eq!(vm.area().volume(), 64);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod content;
pub mod error;
pub mod vector;
pub mod voxel;

pub use content::{ContentFeatures, ContentRegistry};
pub use error::{CoreError, CoreResult};
pub use vector::{Vec3i, MAP_BLOCKSIZE};
pub use voxel::{
    ContentId, MapNode, VoxelArea, VoxelBuffer, CONTENT_AIR, CONTENT_IGNORE, CONTENT_UNKNOWN,
    FLAG_CHECKED1, FLAG_CHECKED2, FLAG_NO_DATA, FLAG_UNUSED,
};
