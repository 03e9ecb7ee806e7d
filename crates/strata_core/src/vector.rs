//! # Integer Vectors
//!
//! Node positions in the world are integer 3-vectors. Block (16³ node)
//! positions use the same type.

use std::ops::{Add, AddAssign, Sub};

/// Edge length of a map block in nodes.
pub const MAP_BLOCKSIZE: i32 = 16;

/// Integer 3-vector used for node and block positions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Vec3i {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate (up).
    pub y: i32,
    /// Z coordinate.
    pub z: i32,
}

impl Vec3i {
    /// The origin.
    pub const ZERO: Self = Self::new(0, 0, 0);

    /// Creates a new vector.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Creates a vector with all three components equal to `v`.
    #[inline]
    #[must_use]
    pub const fn splat(v: i32) -> Self {
        Self { x: v, y: v, z: v }
    }

    /// Component-wise minimum.
    #[inline]
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Component-wise maximum.
    #[inline]
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    /// Scales every component by `k`.
    #[inline]
    #[must_use]
    pub const fn scale(self, k: i32) -> Self {
        Self::new(self.x * k, self.y * k, self.z * k)
    }

    /// Position of the block containing this node.
    #[inline]
    #[must_use]
    pub const fn node_to_block(self) -> Self {
        Self::new(
            self.x.div_euclid(MAP_BLOCKSIZE),
            self.y.div_euclid(MAP_BLOCKSIZE),
            self.z.div_euclid(MAP_BLOCKSIZE),
        )
    }

    /// First node of the block at this block position.
    #[inline]
    #[must_use]
    pub const fn block_to_node(self) -> Self {
        self.scale(MAP_BLOCKSIZE)
    }
}

impl Add for Vec3i {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3i {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3i {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::fmt::Display for Vec3i {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
