//! Addressing for the padded voxel lattice.
//!
//! The stock occupies voxel indices `[0, maxstep)` on each axis. Storage adds a
//! one-voxel air border on every side, so valid storage indices run from `-1`
//! to `maxstep` inclusive.

use bytemuck::{Pod, Zeroable};
use glam::{DVec3, IVec3};
use serde::{Deserialize, Serialize};

use crate::constants::PADDING;

/// Corner offsets of a unit cube, in marching-cubes corner order.
pub const CUBE_CORNERS: [[i32; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [1, 0, 1],
    [0, 0, 1],
    [0, 1, 0],
    [1, 1, 0],
    [1, 1, 1],
    [0, 1, 1],
];

/// Integer position of a voxel in the lattice.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
#[repr(C)]
pub struct VoxelIndex {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl VoxelIndex {
    /// Create a new voxel index
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Index shifted by the given amounts
    #[inline]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// The eight corners of the unit cube whose minimum corner is `self`.
    #[inline]
    pub fn cube_corners(self) -> [Self; 8] {
        CUBE_CORNERS.map(|[dx, dy, dz]| self.offset(dx, dy, dz))
    }

    /// Minimum corners of the eight cubes that have `self` as a corner
    /// (`self` included).
    #[inline]
    pub fn cubes_containing(self) -> [Self; 8] {
        CUBE_CORNERS.map(|[dx, dy, dz]| self.offset(-dx, -dy, -dz))
    }

    /// Convert to glam IVec3
    #[inline]
    pub const fn to_ivec3(self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z)
    }

    /// Convert to floating point DVec3
    #[inline]
    pub fn to_dvec3(self) -> DVec3 {
        DVec3::new(f64::from(self.x), f64::from(self.y), f64::from(self.z))
    }
}

impl From<IVec3> for VoxelIndex {
    fn from(v: IVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

/// Dimensions of a padded voxel lattice and its flat-offset formula.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridDims {
    maxstep: IVec3,
    stride_x: usize,
    stride_y: usize,
}

impl GridDims {
    /// Dimensions for a stock of `maxstep` voxels per axis.
    ///
    /// The padded size must fit in `usize`; see [`GridDims::checked_padded_len`].
    pub fn new(maxstep: IVec3) -> Self {
        debug_assert!(maxstep.cmpge(IVec3::ZERO).all());
        let side = maxstep + IVec3::splat(2 * PADDING);
        let stride_y = side.z as usize;
        let stride_x = side.y as usize * stride_y;
        Self {
            maxstep,
            stride_x,
            stride_y,
        }
    }

    /// Stored voxel count for `maxstep`, or `None` if it overflows.
    pub fn checked_padded_len(maxstep: IVec3) -> Option<usize> {
        if maxstep.cmplt(IVec3::ZERO).any() {
            return None;
        }
        let side = |n: i32| usize::try_from(i64::from(n) + i64::from(2 * PADDING)).ok();
        side(maxstep.x)?
            .checked_mul(side(maxstep.y)?)?
            .checked_mul(side(maxstep.z)?)
    }

    /// Number of stock voxels per axis
    #[inline]
    pub const fn maxstep(&self) -> IVec3 {
        self.maxstep
    }

    /// Number of stored voxels including the air border
    #[inline]
    pub const fn padded_len(&self) -> usize {
        (self.maxstep.x + 2 * PADDING) as usize * self.stride_x
    }

    /// Number of stock voxels, border excluded
    #[inline]
    pub const fn voxel_count(&self) -> usize {
        self.maxstep.x as usize * self.maxstep.y as usize * self.maxstep.z as usize
    }

    /// Flat storage offset of a padded index.
    #[inline]
    pub const fn flat(&self, index: VoxelIndex) -> usize {
        debug_assert!(self.in_padded(index));
        (index.x + PADDING) as usize * self.stride_x
            + (index.y + PADDING) as usize * self.stride_y
            + (index.z + PADDING) as usize
    }

    /// Inverse of [`GridDims::flat`]
    #[inline]
    pub const fn unflat(&self, offset: usize) -> VoxelIndex {
        let x = offset / self.stride_x;
        let rem = offset % self.stride_x;
        VoxelIndex::new(
            x as i32 - PADDING,
            (rem / self.stride_y) as i32 - PADDING,
            (rem % self.stride_y) as i32 - PADDING,
        )
    }

    /// True for indices inside the stock, `[0, maxstep)` on every axis.
    #[inline]
    pub const fn contains(&self, index: VoxelIndex) -> bool {
        index.x >= 0
            && index.y >= 0
            && index.z >= 0
            && index.x < self.maxstep.x
            && index.y < self.maxstep.y
            && index.z < self.maxstep.z
    }

    /// True for indices that have storage, `[-1, maxstep]` on every axis.
    #[inline]
    pub const fn in_padded(&self, index: VoxelIndex) -> bool {
        index.x >= -PADDING
            && index.y >= -PADDING
            && index.z >= -PADDING
            && index.x < self.maxstep.x + PADDING
            && index.y < self.maxstep.y + PADDING
            && index.z < self.maxstep.z + PADDING
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_offset_roundtrip() {
        let dims = GridDims::new(IVec3::new(4, 3, 5));
        for x in -1..=4 {
            for y in -1..=3 {
                for z in -1..=5 {
                    let index = VoxelIndex::new(x, y, z);
                    assert_eq!(dims.unflat(dims.flat(index)), index);
                }
            }
        }
    }

    #[test]
    fn padded_len_covers_border() {
        let dims = GridDims::new(IVec3::new(10, 10, 10));
        assert_eq!(dims.padded_len(), 12 * 12 * 12);
        assert_eq!(dims.voxel_count(), 1000);
        assert_eq!(dims.flat(VoxelIndex::new(-1, -1, -1)), 0);
        assert_eq!(
            dims.flat(VoxelIndex::new(10, 10, 10)),
            dims.padded_len() - 1
        );
    }

    #[test]
    fn checked_len_rejects_overflow() {
        assert_eq!(GridDims::checked_padded_len(IVec3::new(10, 10, 10)), Some(12 * 12 * 12));
        assert_eq!(GridDims::checked_padded_len(IVec3::new(0, 0, 0)), Some(8));
        assert_eq!(GridDims::checked_padded_len(IVec3::new(-1, 4, 4)), None);
        assert_eq!(GridDims::checked_padded_len(IVec3::splat(i32::MAX / 4)), None);
    }

    #[test]
    fn offsets_follow_x_major_order() {
        let dims = GridDims::new(IVec3::new(3, 4, 5));
        let base = dims.flat(VoxelIndex::new(0, 0, 0));
        assert_eq!(dims.flat(VoxelIndex::new(0, 0, 1)), base + 1);
        assert_eq!(dims.flat(VoxelIndex::new(0, 1, 0)), base + 7);
        assert_eq!(dims.flat(VoxelIndex::new(1, 0, 0)), base + 6 * 7);
    }

    #[test]
    fn contains_excludes_border() {
        let dims = GridDims::new(IVec3::new(2, 2, 2));
        assert!(dims.contains(VoxelIndex::new(0, 1, 1)));
        assert!(!dims.contains(VoxelIndex::new(-1, 0, 0)));
        assert!(!dims.contains(VoxelIndex::new(0, 2, 0)));
        assert!(dims.in_padded(VoxelIndex::new(2, -1, 2)));
        assert!(!dims.in_padded(VoxelIndex::new(3, 0, 0)));
    }

    #[test]
    fn cube_corner_order() {
        let corners = VoxelIndex::new(5, 5, 5).cube_corners();
        assert_eq!(corners[0], VoxelIndex::new(5, 5, 5));
        assert_eq!(corners[2], VoxelIndex::new(6, 5, 6));
        assert_eq!(corners[7], VoxelIndex::new(5, 6, 6));

        let owners = VoxelIndex::new(5, 5, 5).cubes_containing();
        assert!(owners.contains(&VoxelIndex::new(4, 4, 4)));
        assert!(owners.iter().all(|o| o.cube_corners().contains(&VoxelIndex::new(5, 5, 5))));
    }
}
