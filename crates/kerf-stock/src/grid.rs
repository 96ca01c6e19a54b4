//! The voxel stock and its subtraction and meshing passes.

use glam::{DVec3, IVec3};
use kerf_core::{GridDims, Result, VoxelIndex};
use kerf_tool::Bit;
use kerf_voxel::VoxelBits;
use rayon::prelude::*;
use tracing::{debug, info, trace_span};

use crate::config::GridConfig;
use crate::surface::SurfaceMesh;
use crate::tile::Tile;

/// Read-only view of the lattice handed to tiles while meshing.
pub(crate) struct Lattice<'a> {
    pub dims: GridDims,
    pub deleted: &'a VoxelBits,
    pub entrenched: &'a VoxelBits,
    pub start: DVec3,
    pub resolution: f64,
}

impl Lattice<'_> {
    #[inline]
    pub fn coords(&self, index: VoxelIndex) -> DVec3 {
        self.start + index.to_dvec3() * self.resolution
    }
}

/// Binary solid/air lattice over the stock.
///
/// Voxels start solid and only ever become air. The lattice is padded with a
/// one-voxel air border, so every index in `[-1, maxstep]` has storage.
#[derive(Debug)]
pub struct VoxelGrid {
    config: GridConfig,
    dims: GridDims,
    tile_size: IVec3,
    tile_counts: IVec3,
    pub(crate) deleted: VoxelBits,
    entrenched: VoxelBits,
    tiles: Vec<Tile>,
    dirty: bool,
    surface: SurfaceMesh,
}

impl VoxelGrid {
    /// Create a fully solid stock.
    pub fn new(config: GridConfig) -> Result<Self> {
        config.validate()?;
        let dims = GridDims::new(config.maxstep());
        let maxstep = dims.maxstep();

        let mut deleted = VoxelBits::repeat(true, dims.padded_len());
        for x in 0..maxstep.x {
            for y in 0..maxstep.y {
                let row = dims.flat(VoxelIndex::new(x, y, 0));
                for z in 0..maxstep.z as usize {
                    deleted.set(row + z, false);
                }
            }
        }

        let tile_size = IVec3::splat(config.tile_size).min(maxstep + IVec3::ONE);
        let tile_counts = maxstep / tile_size + IVec3::ONE;
        let tile_total = (tile_counts.x * tile_counts.y * tile_counts.z) as usize;

        let mut grid = Self {
            config,
            dims,
            tile_size,
            tile_counts,
            deleted,
            entrenched: VoxelBits::repeat(false, dims.padded_len()),
            tiles: Vec::with_capacity(tile_total),
            dirty: true,
            surface: SurfaceMesh::new(tile_total),
        };
        grid.rebuild_entrenched();
        grid.build_tiles();

        info!(
            maxstep = %maxstep,
            resolution = config.resolution,
            tiles = tile_total,
            "created voxel grid"
        );
        Ok(grid)
    }

    fn build_tiles(&mut self) {
        let lattice = self.lattice();
        let mut tiles = Vec::with_capacity(self.tiles.capacity());
        for tx in 0..self.tile_counts.x {
            for ty in 0..self.tile_counts.y {
                for tz in 0..self.tile_counts.z {
                    let origin = IVec3::new(tx, ty, tz) * self.tile_size;
                    tiles.push(Tile::new(tiles.len(), origin.into(), self.tile_size, &lattice));
                }
            }
        }
        self.tiles = tiles;
    }

    pub(crate) fn lattice(&self) -> Lattice<'_> {
        Lattice {
            dims: self.dims,
            deleted: &self.deleted,
            entrenched: &self.entrenched,
            start: self.config.start,
            resolution: self.config.resolution,
        }
    }

    #[inline]
    pub const fn config(&self) -> &GridConfig {
        &self.config
    }

    #[inline]
    pub const fn dims(&self) -> GridDims {
        self.dims
    }

    /// Stock voxels per axis
    #[inline]
    pub const fn maxstep(&self) -> IVec3 {
        self.dims.maxstep()
    }

    #[inline]
    pub const fn resolution(&self) -> f64 {
        self.config.resolution
    }

    #[inline]
    pub const fn start(&self) -> DVec3 {
        self.config.start
    }

    #[inline]
    pub const fn bounds(&self) -> DVec3 {
        self.config.bounds
    }

    /// World position of a voxel.
    #[inline]
    pub fn coords(&self, index: VoxelIndex) -> DVec3 {
        self.config.start + index.to_dvec3() * self.config.resolution
    }

    /// Nearest voxel to a world position.
    #[inline]
    pub fn index(&self, world: DVec3) -> VoxelIndex {
        ((world - self.config.start) / self.config.resolution)
            .round()
            .as_ivec3()
            .into()
    }

    /// Air test with the boundary policy: everything outside the stock is air.
    #[inline]
    pub fn is_deleted(&self, index: VoxelIndex) -> bool {
        !self.dims.contains(index) || self.deleted.get(self.dims.flat(index))
    }

    /// Air test for an index known to be in `[-1, maxstep]`.
    #[inline]
    pub fn is_deleted_fast(&self, index: VoxelIndex) -> bool {
        self.deleted.get(self.dims.flat(index))
    }

    /// Whether the cube `index + {0,1}^3` is entirely solid. False beyond
    /// the padded lattice.
    #[inline]
    pub fn is_entrenched(&self, index: VoxelIndex) -> bool {
        self.dims.in_padded(index) && self.entrenched.get(self.dims.flat(index))
    }

    /// Remove one voxel. Indices outside the stock are ignored.
    pub fn mark_deleted(&mut self, index: VoxelIndex) -> bool {
        self.dims.contains(index) && self.mark_deleted_fast(index)
    }

    /// Remove a voxel known to be in `[-1, maxstep]`. Returns false if it
    /// was already air.
    pub fn mark_deleted_fast(&mut self, index: VoxelIndex) -> bool {
        if self.deleted.replace(self.dims.flat(index), true) {
            return false;
        }
        for owner in index.cubes_containing() {
            if self.dims.in_padded(owner) {
                self.entrenched.set(self.dims.flat(owner), false);
            }
        }
        self.mark_tiles_dirty(index);
        self.dirty = true;
        true
    }

    /// Dirty every tile meshing a cube with `index` as a corner.
    fn mark_tiles_dirty(&mut self, index: VoxelIndex) {
        let axis = |v: i32, size: i32, count: i32| {
            let first = v.max(0) / size;
            let second = (v.rem_euclid(size) == size - 1 && first + 1 < count).then_some(first + 1);
            (first.min(count - 1), second)
        };
        let (x0, x1) = axis(index.x, self.tile_size.x, self.tile_counts.x);
        let (y0, y1) = axis(index.y, self.tile_size.y, self.tile_counts.y);
        let (z0, z1) = axis(index.z, self.tile_size.z, self.tile_counts.z);

        for tx in std::iter::once(x0).chain(x1) {
            for ty in std::iter::once(y0).chain(y1) {
                for tz in std::iter::once(z0).chain(z1) {
                    let slot = self.tile_slot(IVec3::new(tx, ty, tz));
                    self.tiles[slot].mark_dirty();
                }
            }
        }
    }

    #[inline]
    fn tile_slot(&self, tile: IVec3) -> usize {
        ((tile.x * self.tile_counts.y + tile.y) * self.tile_counts.z + tile.z) as usize
    }

    /// Recompute `entrenched` from `deleted` over the whole lattice.
    pub fn rebuild_entrenched(&mut self) {
        let dims = self.dims;
        let maxstep = dims.maxstep();
        self.entrenched.fill(false);
        for x in -1..maxstep.x {
            for y in -1..maxstep.y {
                for z in -1..maxstep.z {
                    let index = VoxelIndex::new(x, y, z);
                    let solid = index
                        .cube_corners()
                        .iter()
                        .all(|&c| !self.deleted.get(dims.flat(c)));
                    if solid {
                        self.entrenched.set(dims.flat(index), true);
                    }
                }
            }
        }
    }

    /// Carve away every voxel inside the bit at its current pose. Returns
    /// the number of voxels removed.
    pub fn remove_intersection(&mut self, bit: &Bit) -> usize {
        let bbox = bit.bounding_box();
        if bbox.is_empty() || !bbox.min.is_finite() || !bbox.max.is_finite() {
            return 0;
        }
        let limit_hi = self.maxstep() - IVec3::ONE;
        let clamp = |index: VoxelIndex| {
            index
                .to_ivec3()
                .clamp(IVec3::ONE, limit_hi.max(IVec3::ONE))
                .min(limit_hi)
        };
        let first = clamp(self.index(bbox.min)) - IVec3::ONE;
        let last = clamp(self.index(bbox.max));

        let mut removed = 0;
        for i in first.x..=last.x {
            for j in first.y..=last.y {
                for k in first.z..=last.z {
                    let index = VoxelIndex::new(i, j, k);
                    if self.is_deleted_fast(index) {
                        continue;
                    }
                    if bit.point_in(self.coords(index)) && self.mark_deleted_fast(index) {
                        removed += 1;
                    }
                }
            }
        }
        removed
    }

    /// Remesh every dirty tile if anything changed since the last pass, then
    /// flag the surface for upload. Returns the number of tiles remeshed.
    pub fn marching_cubes(&mut self) -> usize {
        if !self.dirty {
            return 0;
        }
        let _span = trace_span!("marching_cubes").entered();

        let lattice = Lattice {
            dims: self.dims,
            deleted: &self.deleted,
            entrenched: &self.entrenched,
            start: self.config.start,
            resolution: self.config.resolution,
        };
        let surface = &self.surface;
        let (tiles, triangles) = self
            .tiles
            .par_iter_mut()
            .filter(|tile| tile.is_dirty())
            .map(|tile| (1, tile.remesh(&lattice, surface)))
            .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1));

        self.dirty = false;
        self.surface.mark_needs_upload();
        debug!(tiles, triangles, "remeshed dirty tiles");
        tiles
    }

    /// True when voxels changed since the last meshing pass
    #[inline]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark every tile for remeshing.
    pub fn mark_all_dirty(&mut self) {
        self.tiles.iter_mut().for_each(Tile::mark_dirty);
        self.dirty = true;
    }

    #[inline]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Tiles per axis
    #[inline]
    pub const fn tile_counts(&self) -> IVec3 {
        self.tile_counts
    }

    /// Tile containing the owned voxel `index`, if it is inside the stock.
    pub fn tile_at(&self, index: VoxelIndex) -> Option<&Tile> {
        if !self.dims.contains(index) {
            return None;
        }
        let tile = index.to_ivec3() / self.tile_size;
        self.tiles.get(self.tile_slot(tile))
    }

    /// Handle for reading published meshes from another thread.
    pub fn surface(&self) -> SurfaceMesh {
        self.surface.clone()
    }

    /// Slots of the tiles a straight tool move from `a` to `b` crosses.
    pub fn tiles_touching_segment(&self, a: DVec3, b: DVec3) -> Vec<usize> {
        self.tiles
            .iter()
            .filter(|tile| tile.intersects_segment(a, b))
            .map(Tile::slot)
            .collect()
    }

    /// Number of air voxels inside the stock.
    pub fn deleted_count(&self) -> usize {
        self.deleted.count_ones() - (self.dims.padded_len() - self.dims.voxel_count())
    }

    /// Replace the `deleted` bits wholesale and rebuild derived state.
    pub(crate) fn install_deleted(&mut self, deleted: VoxelBits) {
        debug_assert_eq!(deleted.len(), self.dims.padded_len());
        self.deleted = deleted;
        self.rebuild_entrenched();
        self.mark_all_dirty();
    }
}
