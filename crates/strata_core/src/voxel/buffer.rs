//! # Voxel Buffer
//!
//! A dense node array plus a parallel per-node flag array, both sized to a
//! [`VoxelArea`]. The buffer can grow in place: growth unions the current
//! box with the requested one and copies the old contents row by row into
//! their new offsets.
//!
//! ## Invariants
//!
//! - `nodes.len() == flags.len() == area.volume()` at all times
//! - A cell whose flags contain [`FLAG_NO_DATA`] has never been written
//! - Growth preserves every existing cell's node and flags

use super::area::VoxelArea;
use super::node::MapNode;
use crate::error::{CoreError, CoreResult};
use crate::vector::Vec3i;

/// Free for use by algorithms.
pub const FLAG_UNUSED: u8 = 0x01;
/// Cell has never been written.
pub const FLAG_NO_DATA: u8 = 0x02;
/// Scratch flag for search algorithms.
pub const FLAG_CHECKED1: u8 = 0x04;
/// Scratch flag for search algorithms.
pub const FLAG_CHECKED2: u8 = 0x08;

/// Growable dense 3-D node storage.
///
/// # Example
///
/// ```rust,ignore
/// let mut vm = VoxelBuffer::new();
/// vm.add_area(&VoxelArea::new(Vec3i::splat(0), Vec3i::splat(15)));
/// vm.set(Vec3i::new(5, 5, 5), MapNode::new(42));
///
/// // Grows to the union box, keeping (5,5,5)
/// vm.add_area(&VoxelArea::from_point(Vec3i::splat(20)));
/// assert_eq!(vm.get(Vec3i::new(5, 5, 5)).content, 42);
/// ```
#[derive(Clone, Debug, Default)]
pub struct VoxelBuffer {
    /// Current box.
    area: VoxelArea,
    /// Node data, indexed by `area.index()`.
    nodes: Vec<MapNode>,
    /// Per-node flags, same indexing.
    flags: Vec<u8>,
}

impl VoxelBuffer {
    /// Creates an empty buffer (zero volume, no allocation).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            area: VoxelArea::EMPTY,
            nodes: Vec::new(),
            flags: Vec::new(),
        }
    }

    /// Creates a buffer covering `area`, every cell ignore + no-data.
    #[must_use]
    pub fn with_area(area: VoxelArea) -> Self {
        let mut vm = Self::new();
        vm.add_area(&area);
        vm
    }

    /// Rebuilds a buffer from its parts.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SizeMismatch`] if either array does not match the
    /// area's volume.
    pub fn from_parts(area: VoxelArea, nodes: Vec<MapNode>, flags: Vec<u8>) -> CoreResult<Self> {
        let expected = area.volume();
        for found in [nodes.len(), flags.len()] {
            if found != expected {
                return Err(CoreError::SizeMismatch { expected, found });
            }
        }
        Ok(Self { area, nodes, flags })
    }

    /// Splits the buffer into its area, nodes and flags.
    #[must_use]
    pub fn into_parts(self) -> (VoxelArea, Vec<MapNode>, Vec<u8>) {
        (self.area, self.nodes, self.flags)
    }

    /// Current box.
    #[inline]
    #[must_use]
    pub const fn area(&self) -> &VoxelArea {
        &self.area
    }

    /// Node array in index order.
    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[MapNode] {
        &self.nodes
    }

    /// Flag array in index order.
    #[inline]
    #[must_use]
    pub fn flags(&self) -> &[u8] {
        &self.flags
    }

    /// Releases both arrays and resets to the empty area.
    pub fn clear(&mut self) {
        self.area = VoxelArea::EMPTY;
        self.nodes = Vec::new();
        self.flags = Vec::new();
    }

    /// Re-targets the buffer to `area`, reusing the existing allocations.
    ///
    /// Every cell becomes ignore + [`FLAG_NO_DATA`]. Used to keep one buffer
    /// per worker across chunks.
    pub fn reset(&mut self, area: VoxelArea) {
        let volume = area.volume();
        self.area = if volume == 0 { VoxelArea::EMPTY } else { area };
        self.nodes.clear();
        self.nodes.resize(volume, MapNode::IGNORE);
        self.flags.clear();
        self.flags.resize(volume, FLAG_NO_DATA);
    }

    /// Grows the buffer to cover `requested`.
    ///
    /// - No-op if `requested` is empty or already contained
    /// - If the buffer is empty, `requested` becomes the area outright
    /// - Otherwise the union box is allocated, new cells are ignore +
    ///   [`FLAG_NO_DATA`], and every old row is copied to its new offset
    ///
    /// The old arrays are only replaced once the copy is complete.
    pub fn add_area(&mut self, requested: &VoxelArea) {
        if requested.has_empty_extent() || self.area.contains_area(requested) {
            return;
        }

        let mut new_area = self.area;
        new_area.add_area(requested);

        let new_size = new_area.volume();
        let mut new_nodes = vec![MapNode::IGNORE; new_size];
        let mut new_flags = vec![FLAG_NO_DATA; new_size];

        if !self.area.has_empty_extent() {
            let old = &self.area;
            let width = old.ystride();
            for z in old.min_edge.z..=old.max_edge.z {
                for y in old.min_edge.y..=old.max_edge.y {
                    let old_index = old.index(old.min_edge.x, y, z);
                    let new_index = new_area.index(old.min_edge.x, y, z);
                    new_nodes[new_index..new_index + width]
                        .copy_from_slice(&self.nodes[old_index..old_index + width]);
                    new_flags[new_index..new_index + width]
                        .copy_from_slice(&self.flags[old_index..old_index + width]);
                }
            }
        }

        self.area = new_area;
        self.nodes = new_nodes;
        self.flags = new_flags;
    }

    /// Bulk copy of a `size` box from an external dense array.
    ///
    /// `src` is laid out over `src_area`; the box starts at `from_pos` there
    /// and lands at `to_pos` here. Copied cells get their flags cleared to 0.
    /// Row offsets are advanced by stride instead of re-indexing per cell.
    pub fn copy_from(
        &mut self,
        src: &[MapNode],
        src_area: &VoxelArea,
        from_pos: Vec3i,
        to_pos: Vec3i,
        size: Vec3i,
    ) {
        if size.x <= 0 || size.y <= 0 || size.z <= 0 {
            return;
        }
        debug_assert!(src_area.contains(from_pos) && src_area.contains(from_pos + size - Vec3i::splat(1)));
        debug_assert!(self.area.contains(to_pos) && self.area.contains(to_pos + size - Vec3i::splat(1)));

        let width = size.x.unsigned_abs() as usize;
        let rows = size.y.unsigned_abs() as usize;

        let src_step = src_area.ystride();
        let src_mod = src_area.zstride() - src_step * rows;
        let dest_step = self.area.ystride();
        let dest_mod = self.area.zstride() - dest_step * rows;

        let mut i_src = src_area.index_p(from_pos);
        let mut i_local = self.area.index_p(to_pos);

        for _ in 0..size.z {
            for _ in 0..rows {
                self.nodes[i_local..i_local + width].copy_from_slice(&src[i_src..i_src + width]);
                self.flags[i_local..i_local + width].fill(0);
                i_src += src_step;
                i_local += dest_step;
            }
            i_src += src_mod;
            i_local += dest_mod;
        }
    }

    /// Bulk copy of a `size` box out into an external dense array.
    ///
    /// Cells whose content is ignore are skipped, leaving the destination
    /// untouched, so sparse overlays never clobber authoritative data.
    pub fn copy_to(
        &self,
        dst: &mut [MapNode],
        dst_area: &VoxelArea,
        dst_pos: Vec3i,
        from_pos: Vec3i,
        size: Vec3i,
    ) {
        if size.x <= 0 || size.y <= 0 || size.z <= 0 {
            return;
        }
        let width = size.x.unsigned_abs() as usize;
        for z in 0..size.z {
            for y in 0..size.y {
                let i_dst = dst_area.index(dst_pos.x, dst_pos.y + y, dst_pos.z + z);
                let i_local = self.area.index(from_pos.x, from_pos.y + y, from_pos.z + z);
                let src_row = &self.nodes[i_local..i_local + width];
                let dst_row = &mut dst[i_dst..i_dst + width];
                for (d, s) in dst_row.iter_mut().zip(src_row) {
                    if !s.is_ignore() {
                        *d = *s;
                    }
                }
            }
        }
    }

    /// Merges the overlapping region into another buffer.
    ///
    /// Same ignore rule as [`copy_to`](Self::copy_to); written cells in
    /// `dst` lose [`FLAG_NO_DATA`].
    pub fn merge_into(&self, dst: &mut VoxelBuffer) {
        let overlap = self.area.intersection(&dst.area);
        if overlap.has_empty_extent() {
            return;
        }
        let width = overlap.ystride();
        for z in overlap.min_edge.z..=overlap.max_edge.z {
            for y in overlap.min_edge.y..=overlap.max_edge.y {
                let i_src = self.area.index(overlap.min_edge.x, y, z);
                let i_dst = dst.area.index(overlap.min_edge.x, y, z);
                for k in 0..width {
                    let n = self.nodes[i_src + k];
                    if !n.is_ignore() {
                        dst.nodes[i_dst + k] = n;
                        dst.flags[i_dst + k] &= !FLAG_NO_DATA;
                    }
                }
            }
        }
    }

    /// Clears the bits in `mask` on every cell, leaving other bits alone.
    pub fn clear_flag(&mut self, mask: u8) {
        for f in &mut self.flags {
            *f &= !mask;
        }
    }

    /// Node at `p`. `p` must be inside the area.
    #[inline]
    #[must_use]
    pub fn get(&self, p: Vec3i) -> MapNode {
        self.nodes[self.area.index_p(p)]
    }

    /// Node at `p`, or ignore if `p` is outside or was never written.
    #[inline]
    #[must_use]
    pub fn get_or_ignore(&self, p: Vec3i) -> MapNode {
        if !self.area.contains(p) {
            return MapNode::IGNORE;
        }
        let i = self.area.index_p(p);
        if self.flags[i] & FLAG_NO_DATA != 0 {
            return MapNode::IGNORE;
        }
        self.nodes[i]
    }

    /// Writes `node` at `p` and marks the cell as holding data.
    /// `p` must be inside the area.
    #[inline]
    pub fn set(&mut self, p: Vec3i, node: MapNode) {
        let i = self.area.index_p(p);
        self.set_at(i, node);
    }

    /// Node at a precomputed index.
    #[inline]
    #[must_use]
    pub fn node_at(&self, i: usize) -> MapNode {
        self.nodes[i]
    }

    /// Flags at a precomputed index.
    #[inline]
    #[must_use]
    pub fn flags_at(&self, i: usize) -> u8 {
        self.flags[i]
    }

    /// Sets bits in the flags at a precomputed index.
    #[inline]
    pub fn set_flag_at(&mut self, i: usize, mask: u8) {
        self.flags[i] |= mask;
    }

    /// Writes `node` at a precomputed index and marks the cell as holding data.
    #[inline]
    pub fn set_at(&mut self, i: usize, node: MapNode) {
        self.nodes[i] = node;
        self.flags[i] &= !FLAG_NO_DATA;
    }

    /// Writes `node` into every cell of `area` that overlaps the buffer.
    pub fn fill_area(&mut self, area: &VoxelArea, node: MapNode) {
        let overlap = self.area.intersection(area);
        if overlap.has_empty_extent() {
            return;
        }
        let width = overlap.ystride();
        for z in overlap.min_edge.z..=overlap.max_edge.z {
            for y in overlap.min_edge.y..=overlap.max_edge.y {
                let i = self.area.index(overlap.min_edge.x, y, z);
                self.nodes[i..i + width].fill(node);
                for f in &mut self.flags[i..i + width] {
                    *f &= !FLAG_NO_DATA;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(min: i32, max: i32) -> VoxelArea {
        VoxelArea::new(Vec3i::splat(min), Vec3i::splat(max))
    }

    #[test]
    fn test_new_is_empty() {
        let vm = VoxelBuffer::new();
        assert_eq!(vm.area().volume(), 0);
        assert!(vm.nodes().is_empty());
        assert!(vm.flags().is_empty());
    }

    #[test]
    fn test_add_area_on_empty_takes_request() {
        let mut vm = VoxelBuffer::new();
        vm.add_area(&cube(0, 3));
        assert_eq!(*vm.area(), cube(0, 3));
        assert_eq!(vm.nodes().len(), 64);
        assert_eq!(vm.flags().len(), 64);
        assert!(vm.flags().iter().all(|&f| f == FLAG_NO_DATA));
        assert!(vm.nodes().iter().all(|n| n.is_ignore()));
    }

    #[test]
    fn test_empty_request_is_noop() {
        let mut vm = VoxelBuffer::with_area(cube(0, 1));
        vm.add_area(&VoxelArea::EMPTY);
        assert_eq!(*vm.area(), cube(0, 1));
    }

    #[test]
    fn test_growth_preserves_cell() {
        let mut vm = VoxelBuffer::with_area(cube(0, 15));
        vm.set(Vec3i::splat(5), MapNode::new(42));

        vm.add_area(&VoxelArea::from_point(Vec3i::splat(20)));

        assert_eq!(*vm.area(), cube(0, 20));
        assert_eq!(vm.get(Vec3i::splat(5)).content, 42);
        assert_eq!(vm.flags_at(vm.area().index(5, 5, 5)), 0);
        assert_eq!(vm.flags_at(vm.area().index(20, 20, 20)), FLAG_NO_DATA);
        assert_eq!(vm.nodes().len(), vm.area().volume());
        assert_eq!(vm.flags().len(), vm.area().volume());
    }

    #[test]
    fn test_growth_in_negative_direction_preserves_rows() {
        let mut vm = VoxelBuffer::with_area(cube(0, 3));
        for (i, p) in cube(0, 3).iter().enumerate() {
            vm.set(p, MapNode::new(u16::try_from(i).unwrap()));
        }
        vm.set_flag_at(vm.area().index(1, 2, 3), FLAG_CHECKED1);

        vm.add_area(&VoxelArea::new(Vec3i::new(-2, -1, -3), Vec3i::new(0, 0, 0)));

        for (i, p) in cube(0, 3).iter().enumerate() {
            assert_eq!(usize::from(vm.get(p).content), i, "mismatch at {p}");
        }
        assert_eq!(vm.flags_at(vm.area().index(1, 2, 3)), FLAG_CHECKED1);
    }

    #[test]
    fn test_contained_request_keeps_allocation() {
        let mut vm = VoxelBuffer::with_area(cube(0, 7));
        let ptr = vm.nodes().as_ptr();
        vm.add_area(&cube(2, 5));
        assert_eq!(vm.nodes().as_ptr(), ptr);
    }

    #[test]
    fn test_clear_flag_masks_exact_bits() {
        let mut vm = VoxelBuffer::with_area(cube(0, 1));
        vm.set_at(0, MapNode::AIR);
        vm.set_flag_at(0, 0b011);
        assert_eq!(vm.flags_at(0), 0b011);

        vm.clear_flag(0b001);
        assert_eq!(vm.flags_at(0), 0b010);
        // Never-written cells keep NO_DATA
        assert!(vm.flags()[1..].iter().all(|&f| f == FLAG_NO_DATA));

        vm.clear_flag(FLAG_NO_DATA);
        assert!(vm.flags().iter().all(|&f| f == 0));
    }

    #[test]
    fn test_copy_from_clears_flags_and_places_rows() {
        let src_area = VoxelArea::new(Vec3i::ZERO, Vec3i::new(3, 3, 3));
        let src: Vec<MapNode> = (0..src_area.volume()).map(|i| MapNode::new(u16::try_from(i).unwrap())).collect();

        let mut vm = VoxelBuffer::with_area(cube(10, 19));
        vm.copy_from(
            &src,
            &src_area,
            Vec3i::new(1, 1, 1),
            Vec3i::new(12, 13, 14),
            Vec3i::new(2, 2, 2),
        );

        for dz in 0..2 {
            for dy in 0..2 {
                for dx in 0..2 {
                    let local = Vec3i::new(12 + dx, 13 + dy, 14 + dz);
                    let expect = src_area.index(1 + dx, 1 + dy, 1 + dz);
                    assert_eq!(usize::from(vm.get(local).content), expect);
                    assert_eq!(vm.flags_at(vm.area().index_p(local)), 0);
                }
            }
        }
        // Outside the copied box nothing changed
        assert!(vm.get(Vec3i::new(11, 13, 14)).is_ignore());
        assert_eq!(vm.flags_at(vm.area().index(14, 13, 14)), FLAG_NO_DATA);
    }

    #[test]
    fn test_copy_to_skips_ignore() {
        let mut vm = VoxelBuffer::with_area(cube(0, 1));
        vm.set(Vec3i::new(0, 0, 0), MapNode::new(7));
        // (1,0,0) stays ignore

        let dst_area = cube(0, 1);
        let mut dst = vec![MapNode::new(3); dst_area.volume()];
        vm.copy_to(&mut dst, &dst_area, Vec3i::ZERO, Vec3i::ZERO, Vec3i::splat(2));

        assert_eq!(dst[dst_area.index(0, 0, 0)].content, 7);
        assert_eq!(dst[dst_area.index(1, 0, 0)].content, 3);
        assert_eq!(dst[dst_area.index(1, 1, 1)].content, 3);
    }

    #[test]
    fn test_merge_into_overlap_only() {
        let mut src = VoxelBuffer::with_area(cube(0, 3));
        src.fill_area(&cube(0, 3), MapNode::new(9));
        src.set(Vec3i::splat(3), MapNode::IGNORE);

        let mut dst = VoxelBuffer::with_area(cube(2, 5));
        src.merge_into(&mut dst);

        assert_eq!(dst.get(Vec3i::splat(2)).content, 9);
        assert!(dst.get(Vec3i::splat(3)).is_ignore());
        assert!(dst.get(Vec3i::splat(4)).is_ignore());
        assert_eq!(dst.flags_at(dst.area().index(2, 2, 2)), 0);
        assert_eq!(dst.flags_at(dst.area().index(4, 4, 4)), FLAG_NO_DATA);
    }

    #[test]
    fn test_get_or_ignore() {
        let mut vm = VoxelBuffer::with_area(cube(0, 1));
        vm.set(Vec3i::ZERO, MapNode::AIR);
        assert!(vm.get_or_ignore(Vec3i::ZERO).is_air());
        assert!(vm.get_or_ignore(Vec3i::new(1, 0, 0)).is_ignore());
        assert!(vm.get_or_ignore(Vec3i::splat(-1)).is_ignore());
    }

    #[test]
    fn test_reset_reuses_capacity() {
        let mut vm = VoxelBuffer::with_area(cube(0, 15));
        vm.fill_area(&cube(0, 15), MapNode::AIR);
        let cap = vm.nodes().as_ptr();

        vm.reset(cube(100, 107));
        assert_eq!(*vm.area(), cube(100, 107));
        assert_eq!(vm.nodes().len(), 512);
        assert_eq!(vm.nodes().as_ptr(), cap);
        assert!(vm.nodes().iter().all(|n| n.is_ignore()));
        assert!(vm.flags().iter().all(|&f| f == FLAG_NO_DATA));
    }

    #[test]
    fn test_from_parts_validates_size() {
        let err = VoxelBuffer::from_parts(cube(0, 1), vec![MapNode::AIR; 7], vec![0; 8]).unwrap_err();
        assert_eq!(err, CoreError::SizeMismatch { expected: 8, found: 7 });

        let vm = VoxelBuffer::from_parts(cube(0, 1), vec![MapNode::AIR; 8], vec![0; 8]).unwrap();
        assert!(vm.get(Vec3i::splat(1)).is_air());
    }

    #[test]
    fn test_clear_releases() {
        let mut vm = VoxelBuffer::with_area(cube(0, 3));
        vm.clear();
        assert_eq!(vm.area().volume(), 0);
        assert!(vm.nodes().is_empty());
    }
}
