//! Fixed-size partitions of the grid, each with its own incremental mesh.

use glam::{DVec3, IVec3};
use kerf_core::{Aabb, VoxelIndex};
use kerf_voxel::{case_table, cube_config};

use crate::grid::Lattice;
use crate::surface::{MeshBuffers, SurfaceMesh};

/// One tile of the grid.
///
/// A tile owns the voxels `origin .. origin + extent` and meshes the unit
/// cubes whose minimum corner lies in `origin - 1 .. origin + size - 1`, so
/// neighbouring tiles never emit the same cube.
#[derive(Debug)]
pub struct Tile {
    slot: usize,
    origin: VoxelIndex,
    extent: IVec3,
    sweep_min: IVec3,
    sweep_max: IVec3,
    bounds: Aabb,
    dirty: bool,
    in_progress: bool,
    back: MeshBuffers,
}

impl Tile {
    pub(crate) fn new(slot: usize, origin: VoxelIndex, size: IVec3, lattice: &Lattice<'_>) -> Self {
        let maxstep = lattice.dims.maxstep();
        let o = origin.to_ivec3();
        let extent = (o + size).min(maxstep) - o;
        let sweep_min = o - IVec3::ONE;
        let sweep_max = (o + size - IVec3::ONE).min(maxstep);
        let bounds = Aabb::new(
            lattice.coords(sweep_min.into()),
            lattice.coords(sweep_max.into()),
        );
        Self {
            slot,
            origin,
            extent: extent.max(IVec3::ZERO),
            sweep_min,
            sweep_max,
            bounds,
            dirty: true,
            in_progress: false,
            back: MeshBuffers::default(),
        }
    }

    /// Slot of this tile in the grid's [`SurfaceMesh`]
    #[inline]
    pub const fn slot(&self) -> usize {
        self.slot
    }

    /// First voxel owned by the tile
    #[inline]
    pub const fn origin(&self) -> VoxelIndex {
        self.origin
    }

    /// Owned voxels per axis, clipped at the grid edge
    #[inline]
    pub const fn extent(&self) -> IVec3 {
        self.extent
    }

    /// World box of the cubes this tile meshes
    #[inline]
    pub const fn bounds(&self) -> Aabb {
        self.bounds
    }

    #[inline]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub const fn in_progress(&self) -> bool {
        self.in_progress
    }

    #[inline]
    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether the straight tool move `a -> b` passes through this tile.
    pub fn intersects_segment(&self, a: DVec3, b: DVec3) -> bool {
        self.bounds.intersects_segment(a, b)
    }

    /// Rebuild the mesh into the back buffer, then publish it. Returns the
    /// number of triangles emitted.
    pub(crate) fn remesh(&mut self, lattice: &Lattice<'_>, surface: &SurfaceMesh) -> usize {
        self.in_progress = true;
        let table = case_table();
        let dims = lattice.dims;
        self.back.reset();

        for i in self.sweep_min.x..self.sweep_max.x {
            for j in self.sweep_min.y..self.sweep_max.y {
                for k in self.sweep_min.z..self.sweep_max.z {
                    let base = VoxelIndex::new(i, j, k);
                    if lattice.entrenched.get(dims.flat(base)) {
                        continue;
                    }
                    let solid = base
                        .cube_corners()
                        .map(|corner| !lattice.deleted.get(dims.flat(corner)));
                    let case = table.case(cube_config(solid));
                    if case.is_empty() {
                        continue;
                    }
                    let min_corner = base.to_dvec3();
                    for (n, local) in case.vertices.iter().enumerate() {
                        let world = lattice.start + (min_corner + *local) * lattice.resolution;
                        self.back.push(world.as_vec3(), case.normals[n / 3]);
                    }
                }
            }
        }

        let triangles = self.back.triangle_count();
        surface.publish(self.slot, &mut self.back);
        self.dirty = false;
        self.in_progress = false;
        triangles
    }
}
