//! Tile meshes as seen by a renderer.
//!
//! The simulation side fills a private back buffer per tile and publishes it
//! by swapping it with the shared front buffer under a short lock. A renderer
//! holds a cloned [`SurfaceMesh`] handle and polls [`SurfaceMesh::needs_upload`]
//! once per frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use glam::Vec3;
use kerf_core::constants::TILE_MESH_CAPACITY;
use parking_lot::Mutex;

/// Triangle soup of one tile: three vertices per triangle, one normal per
/// vertex.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshBuffers {
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
}

impl MeshBuffers {
    /// Empty the buffers, keeping their allocation. A buffer that was never
    /// filled gets the initial tile capacity.
    pub(crate) fn reset(&mut self) {
        self.vertices.clear();
        self.normals.clear();
        if self.vertices.capacity() == 0 {
            self.vertices.reserve(TILE_MESH_CAPACITY);
            self.normals.reserve(TILE_MESH_CAPACITY);
        }
    }

    #[inline]
    pub(crate) fn push(&mut self, vertex: Vec3, normal: Vec3) {
        self.vertices.push(vertex);
        self.normals.push(normal);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }
}

#[derive(Debug, Default)]
struct TileSlot {
    front: MeshBuffers,
    upload_pending: bool,
}

#[derive(Debug)]
struct Shared {
    slots: Vec<Mutex<TileSlot>>,
    needs_upload: AtomicBool,
}

/// Shared handle to the published tile meshes of one grid.
#[derive(Clone, Debug)]
pub struct SurfaceMesh {
    shared: Arc<Shared>,
}

impl SurfaceMesh {
    pub(crate) fn new(tiles: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                slots: (0..tiles).map(|_| Mutex::new(TileSlot::default())).collect(),
                needs_upload: AtomicBool::new(false),
            }),
        }
    }

    /// Swap `back` into the front slot of `tile` and flag it for upload.
    /// `back` receives the previous front buffer for reuse.
    pub(crate) fn publish(&self, tile: usize, back: &mut MeshBuffers) {
        let mut slot = self.shared.slots[tile].lock();
        std::mem::swap(&mut slot.front, back);
        slot.upload_pending = true;
    }

    /// Raise the grid-wide upload flag after a meshing pass.
    pub(crate) fn mark_needs_upload(&self) {
        self.shared.needs_upload.store(true, Ordering::Release);
    }

    pub fn tile_count(&self) -> usize {
        self.shared.slots.len()
    }

    /// Whether any tile was republished since the last [`SurfaceMesh::take_uploads`].
    pub fn needs_upload(&self) -> bool {
        self.shared.needs_upload.load(Ordering::Acquire)
    }

    /// Whether `tile` holds a mesh the renderer has not taken yet.
    pub fn upload_pending(&self, tile: usize) -> bool {
        self.shared
            .slots
            .get(tile)
            .is_some_and(|slot| slot.lock().upload_pending)
    }

    /// Hand every pending tile mesh to `upload` and clear the flags.
    /// Returns the number of tiles handed over.
    pub fn take_uploads<F>(&self, mut upload: F) -> usize
    where
        F: FnMut(usize, &MeshBuffers),
    {
        if !self.shared.needs_upload.swap(false, Ordering::AcqRel) {
            return 0;
        }
        let mut taken = 0;
        for (index, slot) in self.shared.slots.iter().enumerate() {
            let mut slot = slot.lock();
            if slot.upload_pending {
                upload(index, &slot.front);
                slot.upload_pending = false;
                taken += 1;
            }
        }
        taken
    }

    /// Read access to the published mesh of `tile`.
    pub fn with_tile<F, R>(&self, tile: usize, f: F) -> Option<R>
    where
        F: FnOnce(&MeshBuffers) -> R,
    {
        self.shared.slots.get(tile).map(|slot| f(&slot.lock().front))
    }

    /// Triangles across all published tile meshes
    pub fn triangle_count(&self) -> usize {
        self.shared
            .slots
            .iter()
            .map(|slot| slot.lock().front.triangle_count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_swaps_buffers() {
        let surface = SurfaceMesh::new(2);
        let mut back = MeshBuffers::default();
        back.reset();
        back.push(Vec3::X, Vec3::Y);
        back.push(Vec3::Y, Vec3::Y);
        back.push(Vec3::Z, Vec3::Y);

        surface.publish(1, &mut back);
        surface.mark_needs_upload();
        assert!(back.is_empty());
        assert!(surface.upload_pending(1));
        assert!(!surface.upload_pending(0));
        assert_eq!(surface.triangle_count(), 1);
    }

    #[test]
    fn uploads_are_taken_once() {
        let surface = SurfaceMesh::new(3);
        let mut back = MeshBuffers::default();
        surface.publish(0, &mut back);
        surface.publish(2, &mut back);
        surface.mark_needs_upload();

        let mut seen = Vec::new();
        assert_eq!(surface.take_uploads(|i, _| seen.push(i)), 2);
        assert_eq!(seen, vec![0, 2]);
        assert!(!surface.needs_upload());
        assert_eq!(surface.take_uploads(|_, _| unreachable!()), 0);
    }

    #[test]
    fn out_of_range_tile_is_not_pending() {
        let surface = SurfaceMesh::new(1);
        assert!(!surface.upload_pending(5));
        assert!(surface.with_tile(5, MeshBuffers::len).is_none());
    }
}
