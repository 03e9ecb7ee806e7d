//! # Mapgen Error Types
//!
//! All errors that can occur while configuring or running generation.
//! Carving that finds no room (no dungeon site, no cave start) is not an
//! error; it just places nothing.

use strata_core::Vec3i;
use thiserror::Error;

/// Errors that can occur in terrain generation.
#[derive(Error, Debug)]
pub enum MapgenError {
    /// A node name the generator needs is not registered.
    #[error("content not registered: {0}")]
    UnknownContent(String),

    /// A settings value has the wrong type or is out of range.
    #[error("invalid setting {key}: {reason}")]
    InvalidSetting {
        /// Settings key.
        key: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Noise parameters that the sampler cannot work with.
    #[error("invalid noise params {key}: {reason}")]
    InvalidNoiseParams {
        /// Settings key of the noise.
        key: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Persisted chunk written by a newer format.
    #[error("unsupported chunk format version {found} (supported up to {supported})")]
    UnsupportedVersion {
        /// Version found in the data.
        found: u8,
        /// Newest version this build reads.
        supported: u8,
    },

    /// Persisted chunk that cannot be decoded.
    #[error("corrupt chunk data: {0}")]
    CorruptChunk(String),

    /// Requested chunk lies outside the generation limit.
    #[error("chunk at block {0} is outside the generation limit")]
    OutOfLimits(Vec3i),

    /// The emerge worker pool is shut down.
    #[error("emerge workers are gone")]
    WorkerGone,

    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file is not valid TOML.
    #[error("toml parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Settings could not be written as TOML.
    #[error("toml write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),
}

/// Result type for mapgen operations.
pub type MapgenResult<T> = Result<T, MapgenError>;
