//! # Core Error Types

use thiserror::Error;

/// Errors raised by the voxel storage and content registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A node or flag array does not match its area's volume.
    #[error("array length {found} does not match area volume {expected}")]
    SizeMismatch {
        /// Volume of the area.
        expected: usize,
        /// Length that was supplied.
        found: usize,
    },

    /// Every non-reserved content id is taken.
    #[error("content id space exhausted while registering {0:?}")]
    RegistryFull(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
