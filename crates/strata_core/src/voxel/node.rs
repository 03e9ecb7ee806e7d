//! # Map Nodes
//!
//! A node is a content id plus two opaque per-content parameters.

use bytemuck::{Pod, Zeroable};

/// Opaque content handle, resolved through a
/// [`ContentRegistry`](crate::content::ContentRegistry).
pub type ContentId = u16;

/// Placeholder for content that is registered but has no definition.
pub const CONTENT_UNKNOWN: ContentId = 125;

/// Empty space.
pub const CONTENT_AIR: ContentId = 126;

/// "No authoritative value here". Never copied over real data during merges.
pub const CONTENT_IGNORE: ContentId = 127;

/// A single node in the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct MapNode {
    /// Content id.
    pub content: ContentId,
    /// First per-content parameter (usually light).
    pub param1: u8,
    /// Second per-content parameter (facedir, liquid level, ...).
    pub param2: u8,
}

impl Default for MapNode {
    fn default() -> Self {
        Self::IGNORE
    }
}

impl MapNode {
    /// Air node.
    pub const AIR: Self = Self::new(CONTENT_AIR);
    /// Ignore node.
    pub const IGNORE: Self = Self::new(CONTENT_IGNORE);

    /// Creates a node with zeroed parameters.
    #[inline]
    #[must_use]
    pub const fn new(content: ContentId) -> Self {
        Self {
            content,
            param1: 0,
            param2: 0,
        }
    }

    /// Creates a node with explicit parameters.
    #[inline]
    #[must_use]
    pub const fn with_params(content: ContentId, param1: u8, param2: u8) -> Self {
        Self {
            content,
            param1,
            param2,
        }
    }

    /// True for [`CONTENT_IGNORE`].
    #[inline]
    #[must_use]
    pub const fn is_ignore(self) -> bool {
        self.content == CONTENT_IGNORE
    }

    /// True for [`CONTENT_AIR`].
    #[inline]
    #[must_use]
    pub const fn is_air(self) -> bool {
        self.content == CONTENT_AIR
    }
}
