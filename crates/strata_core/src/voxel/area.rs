//! # Voxel Areas
//!
//! An axis-aligned, inclusive integer box and the row-major index function
//! over it. Every offset into a [`VoxelBuffer`](super::VoxelBuffer) or a
//! noise result array is computed here and nowhere else, so layout stays
//! consistent between buffer growth and bulk copies.
//!
//! ## Layout
//!
//! ```text
//! index(x, y, z) = (z - min.z) * ysize * xsize + (y - min.y) * xsize + (x - min.x)
//! ```
//!
//! X varies fastest; a "row" is a run of `xsize` cells with fixed `(y, z)`.

use crate::vector::Vec3i;

/// Inclusive integer box.
///
/// An area whose extent is ≤ 0 on any axis is empty. The default area is
/// empty (`min = (1,1,1)`, `max = (0,0,0)`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VoxelArea {
    /// Lowest corner (inclusive).
    pub min_edge: Vec3i,
    /// Highest corner (inclusive).
    pub max_edge: Vec3i,
}

impl Default for VoxelArea {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl VoxelArea {
    /// The canonical empty area.
    pub const EMPTY: Self = Self {
        min_edge: Vec3i::splat(1),
        max_edge: Vec3i::splat(0),
    };

    /// Creates an area from inclusive corners.
    #[inline]
    #[must_use]
    pub const fn new(min_edge: Vec3i, max_edge: Vec3i) -> Self {
        Self { min_edge, max_edge }
    }

    /// Creates a single-cell area.
    #[inline]
    #[must_use]
    pub const fn from_point(p: Vec3i) -> Self {
        Self { min_edge: p, max_edge: p }
    }

    /// Number of cells along each axis.
    #[inline]
    #[must_use]
    pub fn extent(&self) -> Vec3i {
        self.max_edge - self.min_edge + Vec3i::splat(1)
    }

    /// True if any axis has a non-positive extent.
    #[inline]
    #[must_use]
    pub fn has_empty_extent(&self) -> bool {
        let e = self.extent();
        e.x <= 0 || e.y <= 0 || e.z <= 0
    }

    /// Number of cells. Zero for empty areas.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn volume(&self) -> usize {
        if self.has_empty_extent() {
            return 0;
        }
        let e = self.extent();
        e.x as usize * e.y as usize * e.z as usize
    }

    /// Number of cells, computed without overflow.
    ///
    /// `None` if the box is inverted on any axis, an axis is longer than
    /// `i32::MAX` cells, or the product does not fit in `usize`. Used on
    /// boxes read from untrusted data before any other method touches them.
    #[must_use]
    pub fn checked_volume(&self) -> Option<usize> {
        fn axis(min: i32, max: i32) -> Option<usize> {
            let len = i64::from(max) - i64::from(min) + 1;
            let len = i32::try_from(len).ok().filter(|&l| l >= 0)?;
            usize::try_from(len).ok()
        }
        axis(self.min_edge.x, self.max_edge.x)?
            .checked_mul(axis(self.min_edge.y, self.max_edge.y)?)?
            .checked_mul(axis(self.min_edge.z, self.max_edge.z)?)
    }

    /// Index distance between two vertically adjacent cells.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn ystride(&self) -> usize {
        self.extent().x as usize
    }

    /// Index distance between two cells adjacent along Z.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn zstride(&self) -> usize {
        let e = self.extent();
        e.x as usize * e.y as usize
    }

    /// True if `p` lies inside the box. Empty areas contain nothing.
    #[inline]
    #[must_use]
    pub fn contains(&self, p: Vec3i) -> bool {
        !self.has_empty_extent()
            && p.x >= self.min_edge.x
            && p.x <= self.max_edge.x
            && p.y >= self.min_edge.y
            && p.y <= self.max_edge.y
            && p.z >= self.min_edge.z
            && p.z <= self.max_edge.z
    }

    /// True if `other` lies entirely inside this box.
    ///
    /// No area contains an empty area; growth code relies on this to never
    /// skip a non-empty request.
    #[inline]
    #[must_use]
    pub fn contains_area(&self, other: &Self) -> bool {
        if other.has_empty_extent() {
            return false;
        }
        self.contains(other.min_edge) && self.contains(other.max_edge)
    }

    /// True if the two boxes share at least one cell.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        if self.has_empty_extent() || other.has_empty_extent() {
            return false;
        }
        self.min_edge.x <= other.max_edge.x
            && other.min_edge.x <= self.max_edge.x
            && self.min_edge.y <= other.max_edge.y
            && other.min_edge.y <= self.max_edge.y
            && self.min_edge.z <= other.max_edge.z
            && other.min_edge.z <= self.max_edge.z
    }

    /// The overlapping box (empty if the areas do not intersect).
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        if !self.intersects(other) {
            return Self::EMPTY;
        }
        Self::new(
            self.min_edge.max(other.min_edge),
            self.max_edge.min(other.max_edge),
        )
    }

    /// Grows this box in place to the union bounding box with `other`.
    ///
    /// Adding an empty area is a no-op; adding to an empty area replaces it.
    pub fn add_area(&mut self, other: &Self) {
        if other.has_empty_extent() {
            return;
        }
        if self.has_empty_extent() {
            *self = *other;
            return;
        }
        self.min_edge = self.min_edge.min(other.min_edge);
        self.max_edge = self.max_edge.max(other.max_edge);
    }

    /// Grows this box in place to include `p`.
    pub fn add_point(&mut self, p: Vec3i) {
        self.add_area(&Self::from_point(p));
    }

    /// Returns the box grown by `d` on every side.
    #[must_use]
    pub fn pad(&self, d: Vec3i) -> Self {
        Self::new(self.min_edge - d, self.max_edge + d)
    }

    /// Row-major index of `(x, y, z)`.
    ///
    /// Only valid for points inside the area. Checked with a debug
    /// assertion; callers must test [`contains`](Self::contains) first.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn index(&self, x: i32, y: i32, z: i32) -> usize {
        debug_assert!(
            self.contains(Vec3i::new(x, y, z)),
            "index ({x}, {y}, {z}) outside area {self:?}"
        );
        let e = self.extent();
        (z - self.min_edge.z) as usize * e.y as usize * e.x as usize
            + (y - self.min_edge.y) as usize * e.x as usize
            + (x - self.min_edge.x) as usize
    }

    /// Row-major index of `p`.
    #[inline]
    #[must_use]
    pub fn index_p(&self, p: Vec3i) -> usize {
        self.index(p.x, p.y, p.z)
    }

    /// Inverse of [`index`](Self::index).
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    pub fn position_of(&self, index: usize) -> Vec3i {
        debug_assert!(index < self.volume(), "index {index} outside area {self:?}");
        let e = self.extent();
        let xs = e.x as usize;
        let ys = e.y as usize;
        let x = index % xs;
        let y = (index / xs) % ys;
        let z = index / (xs * ys);
        self.min_edge + Vec3i::new(x as i32, y as i32, z as i32)
    }

    /// Iterates every position in index order.
    pub fn iter(&self) -> impl Iterator<Item = Vec3i> {
        let area = *self;
        (0..area.volume()).map(move |i| area.position_of(i))
    }
}

impl std::fmt::Display for VoxelArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let e = self.extent();
        write!(
            f,
            "{}-{} ({}x{}x{}={})",
            self.min_edge,
            self.max_edge,
            e.x,
            e.y,
            e.z,
            self.volume()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(min: i32, max: i32) -> VoxelArea {
        VoxelArea::new(Vec3i::splat(min), Vec3i::splat(max))
    }

    #[test]
    fn test_default_is_empty() {
        let a = VoxelArea::default();
        assert!(a.has_empty_extent());
        assert_eq!(a.volume(), 0);
        assert!(!a.contains(Vec3i::ZERO));
    }

    #[test]
    fn test_checked_volume() {
        assert_eq!(cube(0, 1).checked_volume(), Some(8));
        assert_eq!(VoxelArea::EMPTY.checked_volume(), Some(0));
        assert_eq!(cube(3, 0).checked_volume(), None);
        assert_eq!(cube(i32::MIN, i32::MAX).checked_volume(), None);
        let wide = VoxelArea::new(Vec3i::new(0, 0, 0), Vec3i::new(i32::MAX - 1, 0, 0));
        assert_eq!(wide.checked_volume(), usize::try_from(i32::MAX).ok());
    }

    #[test]
    fn test_union_of_disjoint_cubes() {
        let mut a = cube(0, 1);
        let b = cube(2, 3);
        assert_eq!(a.volume(), 8);
        assert_eq!(b.volume(), 8);

        a.add_area(&b);
        assert_eq!(a, cube(0, 3));
        assert_eq!(a.volume(), 64);
    }

    #[test]
    fn test_union_contains_both_inputs() {
        let pairs = [
            (cube(0, 1), cube(2, 3)),
            (cube(-5, 5), cube(0, 1)),
            (
                VoxelArea::new(Vec3i::new(0, -10, 3), Vec3i::new(4, 0, 9)),
                VoxelArea::new(Vec3i::new(-7, 2, 0), Vec3i::new(-1, 8, 1)),
            ),
        ];
        for (a, b) in pairs {
            let mut u = a;
            u.add_area(&b);
            assert!(u.contains_area(&a), "{u} should contain {a}");
            assert!(u.contains_area(&b), "{u} should contain {b}");
            assert!(u.volume() >= a.volume().max(b.volume()));
        }
    }

    #[test]
    fn test_add_to_empty_replaces() {
        let mut a = VoxelArea::EMPTY;
        a.add_area(&cube(3, 4));
        assert_eq!(a, cube(3, 4));

        a.add_area(&VoxelArea::EMPTY);
        assert_eq!(a, cube(3, 4));
    }

    #[test]
    fn test_empty_never_contained() {
        assert!(!cube(-100, 100).contains_area(&VoxelArea::EMPTY));
    }

    #[test]
    fn test_index_row_major() {
        let a = VoxelArea::new(Vec3i::new(-1, -1, -1), Vec3i::new(2, 1, 0));
        // extent 4 x 3 x 2
        assert_eq!(a.index(-1, -1, -1), 0);
        assert_eq!(a.index(0, -1, -1), 1);
        assert_eq!(a.index(-1, 0, -1), 4);
        assert_eq!(a.index(-1, -1, 0), 12);
        assert_eq!(a.index(2, 1, 0), 23);
        assert_eq!(a.ystride(), 4);
        assert_eq!(a.zstride(), 12);
    }

    #[test]
    fn test_position_of_inverts_index() {
        let a = VoxelArea::new(Vec3i::new(-3, 7, 2), Vec3i::new(1, 9, 5));
        for (i, p) in a.iter().enumerate() {
            assert_eq!(a.index_p(p), i);
        }
        assert_eq!(a.iter().count(), a.volume());
    }

    #[test]
    fn test_intersection() {
        let a = cube(0, 4);
        let b = cube(3, 8);
        assert!(a.intersects(&b));
        assert_eq!(a.intersection(&b), cube(3, 4));
        assert!(!a.intersects(&cube(5, 6)));
        assert!(a.intersection(&cube(5, 6)).has_empty_extent());
    }

    #[test]
    fn test_pad() {
        let a = cube(0, 15).pad(Vec3i::splat(16));
        assert_eq!(a, cube(-16, 31));
    }
}
