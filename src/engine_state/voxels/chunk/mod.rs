//! # Chunk Module
//!
//! A chunk is one `width x width x height` column of the world. It owns:
//! - its block set ([`BlockStore`]), shared with the world index behind an
//!   [`MtResource`] so neighbouring chunks can read its boundary planes
//! - a dense array of [`FaceMask`]s indexed by linear key
//!   (`y * width² + z * width + x`)
//! - the last built [`ChunkMesh`] and the mask revision it was built from; any change
//!   to the masks bumps the revision and leaves the old mesh in place, marked stale,
//!   until a rebuild lands
//!
//! Revisions come from one process-wide counter, so a revision is never reused, not
//! even by a later chunk loaded at the same coordinate.
//!
//! Every occupied position has a mask entry, and every non-empty mask belongs to an
//! occupied position.

use std::sync::atomic::{AtomicU64, Ordering};

use cgmath::Point3;

use crate::core::MtResource;
use crate::engine_state::rendering::meshing::ChunkMesh;
use crate::engine_state::rendering::textures::TextureLookup;

use super::block::block_side::BlockSide;
use super::block::face_mask::FaceMask;

pub mod block_store;
pub mod chunk_coordinate;
pub mod chunk_creation;
pub mod visibility;

use block_store::{BlockStore, ChunkDimensions, LocalPosition};
use chunk_coordinate::ChunkCoordinate;
use visibility::{boundary_positions, compute_neighbor_mask, BoundaryPlane, NeighborPlanes};

static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

fn next_revision() -> u64 {
    NEXT_REVISION.fetch_add(1, Ordering::Relaxed)
}

/// One generated column of the world.
#[derive(Debug)]
pub struct Chunk {
    coordinate: ChunkCoordinate,
    dims: ChunkDimensions,
    blocks: MtResource<BlockStore>,
    masks: Vec<FaceMask>,
    mesh: Option<ChunkMesh>,
    mesh_revision: u64,
    /// Bumped whenever the masks change, so stale background mesh builds are dropped.
    revision: u64,
}

impl Chunk {
    /// Wraps a generated block set.
    ///
    /// Occupied positions start fully exposed until [`Chunk::compute_visibility`] runs.
    pub fn new(coordinate: ChunkCoordinate, blocks: MtResource<BlockStore>) -> Self {
        let (dims, masks) = {
            let store = blocks.get();
            let dims = store.dims();
            let mut masks = vec![FaceMask::NONE; dims.volume()];
            for (position, _) in store.iter() {
                masks[dims.linear_index(position)] = FaceMask::ALL;
            }
            (dims, masks)
        };

        Self {
            coordinate,
            dims,
            blocks,
            masks,
            mesh: None,
            mesh_revision: 0,
            revision: next_revision(),
        }
    }

    /// Grid position of the chunk.
    pub fn coordinate(&self) -> ChunkCoordinate {
        self.coordinate
    }

    /// Chunk extents.
    pub fn dims(&self) -> ChunkDimensions {
        self.dims
    }

    /// Shared handle to the block set.
    pub fn blocks(&self) -> &MtResource<BlockStore> {
        &self.blocks
    }

    /// Visibility masks indexed by linear key.
    pub fn masks(&self) -> &[FaceMask] {
        &self.masks
    }

    /// Mask of the block at `position`; empty for air and out-of-bounds positions.
    pub fn mask(&self, position: LocalPosition) -> FaceMask {
        if !self.dims.in_bounds(position) {
            return FaceMask::NONE;
        }
        self.masks[self.dims.linear_index(position)]
    }

    /// Overwrites the mask at `position` and invalidates the mesh if it changed.
    pub fn set_mask(&mut self, position: LocalPosition, mask: FaceMask) -> bool {
        if !self.dims.in_bounds(position) {
            debug_assert!(false, "mask position {:?} outside {:?}", position, self.dims);
            return false;
        }
        let slot = &mut self.masks[self.dims.linear_index(position)];
        if *slot == mask {
            return false;
        }
        *slot = mask;
        self.invalidate_mesh();
        true
    }

    /// Recomputes every mask against the chunk's blocks and the given neighbour planes.
    pub fn compute_visibility(&mut self, neighbors: &NeighborPlanes) {
        let store = self.blocks.get();
        self.masks.fill(FaceMask::NONE);
        for (position, _) in store.iter() {
            self.masks[self.dims.linear_index(position)] =
                compute_neighbor_mask(&store, neighbors, position);
        }
        drop(store);
        self.invalidate_mesh();
    }

    /// Recomputes only the `side` bit of the blocks in the boundary plane on `side`.
    ///
    /// `plane` is the facing plane of the neighbour across `side`, `None` when that
    /// neighbour is absent. Returns whether any mask changed.
    pub fn refresh_edge(&mut self, side: BlockSide, plane: Option<&BoundaryPlane>) -> bool {
        if !side.is_horizontal() {
            return false;
        }

        let store = self.blocks.get();
        let mut changed = false;
        for position in boundary_positions(self.dims, side) {
            if !store.contains(position) {
                continue;
            }
            let neighbor = Self::across_edge(self.dims, position, side);
            let exposed = plane.map_or(true, |plane| !plane.is_occupied(neighbor));
            let slot = &mut self.masks[self.dims.linear_index(position)];
            if slot.is_exposed(side) != exposed {
                slot.set_exposed(side, exposed);
                changed = true;
            }
        }
        drop(store);

        if changed {
            self.invalidate_mesh();
        }
        changed
    }

    /// Number of indices the mesh of this chunk has: six per exposed face.
    pub fn element_count(&self) -> usize {
        self.masks.iter().map(|mask| mask.count() as usize * 6).sum()
    }

    /// Builds the mesh synchronously from the current masks.
    pub fn rebuild_mesh(&mut self, textures: &dyn TextureLookup) -> anyhow::Result<()> {
        let mesh = ChunkMesh::build(&self.blocks.get(), &self.masks, textures)?;
        self.mesh = Some(mesh);
        self.mesh_revision = self.revision;
        Ok(())
    }

    /// The last built mesh, possibly older than the masks.
    pub fn mesh(&self) -> Option<&ChunkMesh> {
        self.mesh.as_ref()
    }

    /// Whether the mesh was built from the current masks.
    pub fn mesh_is_current(&self) -> bool {
        self.mesh.is_some() && self.mesh_revision == self.revision
    }

    /// Installs a mesh built elsewhere from the masks of `revision`.
    ///
    /// Meshes built from an older revision are rejected and `false` is returned.
    pub fn set_mesh(&mut self, mesh: ChunkMesh, revision: u64) -> bool {
        if revision != self.revision {
            return false;
        }
        self.mesh = Some(mesh);
        self.mesh_revision = revision;
        true
    }

    /// Current mask revision.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Marks the mesh stale, e.g. after a block changed type without changing any mask.
    pub fn invalidate_mesh(&mut self) {
        self.revision = next_revision();
    }

    /// Position in the neighbouring chunk across `side` touching `position`.
    fn across_edge(dims: ChunkDimensions, position: LocalPosition, side: BlockSide) -> LocalPosition {
        let last = dims.width - 1;
        match side {
            BlockSide::RIGHT => Point3::new(0, position.y, position.z),
            BlockSide::LEFT => Point3::new(last, position.y, position.z),
            BlockSide::BACK => Point3::new(position.x, position.y, 0),
            _ => Point3::new(position.x, position.y, last),
        }
    }
}
