//! # World Index
//!
//! The shared map from [`ChunkCoordinate`] to the block set of every generated chunk.
//! It is the single authority on whether a block exists at a given chunk and local
//! position, and it is mutated from several threads: workers insert freshly generated
//! chunks, the main thread erases evicted ones.
//!
//! ## Locking
//! The map sits behind one mutex that is held only long enough to clone or move a
//! handle. Block sets have their own read-write locks, taken after the map lock is
//! released and never two at a time, so lookups cannot deadlock against each other or
//! against generation.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::MtResource;

use super::block::block_side::BlockSide;
use super::block::face_mask::FaceMask;
use super::chunk::block_store::{BlockStore, LocalPosition};
use super::chunk::chunk_coordinate::ChunkCoordinate;
use super::chunk::visibility::{self, BoundaryPlane, NeighborPlanes};

type ChunkMap = HashMap<ChunkCoordinate, MtResource<BlockStore>>;

/// Thread-safe chunk lookup. Clones share the same map.
#[derive(Clone, Default)]
pub struct WorldIndex {
    chunks: Arc<Mutex<ChunkMap>>,
}

impl WorldIndex {
    /// An empty index.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ChunkMap> {
        self.chunks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers the block set of the chunk at `coordinate`, returning any previous one.
    pub fn insert(
        &self,
        coordinate: ChunkCoordinate,
        blocks: MtResource<BlockStore>,
    ) -> Option<MtResource<BlockStore>> {
        self.lock().insert(coordinate, blocks)
    }

    /// Erases the chunk at `coordinate`.
    pub fn remove(&self, coordinate: ChunkCoordinate) -> Option<MtResource<BlockStore>> {
        self.lock().remove(&coordinate)
    }

    /// A handle to the block set at `coordinate`.
    pub fn get(&self, coordinate: ChunkCoordinate) -> Option<MtResource<BlockStore>> {
        self.lock().get(&coordinate).cloned()
    }

    /// Whether a chunk is registered at `coordinate`.
    pub fn contains(&self, coordinate: ChunkCoordinate) -> bool {
        self.lock().contains_key(&coordinate)
    }

    /// Number of registered chunks.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no chunk is registered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Registered coordinates, in no particular order.
    pub fn coordinates(&self) -> Vec<ChunkCoordinate> {
        self.lock().keys().copied().collect()
    }

    /// Whether a block exists at `position` in the chunk at `coordinate`.
    ///
    /// Missing chunks and out-of-bounds positions hold no blocks.
    pub fn block_exists(&self, coordinate: ChunkCoordinate, position: LocalPosition) -> bool {
        self.get(coordinate)
            .map(|blocks| blocks.get().contains(position))
            .unwrap_or(false)
    }

    /// Snapshot of the boundary plane on `side` of the chunk at `coordinate`.
    pub fn boundary_plane(
        &self,
        coordinate: ChunkCoordinate,
        side: BlockSide,
    ) -> Option<BoundaryPlane> {
        let blocks = self.get(coordinate)?;
        let store = blocks.get();
        Some(BoundaryPlane::capture(&store, side))
    }

    /// The facing boundary planes of the four horizontal neighbours of `coordinate`.
    pub fn neighbor_planes(&self, coordinate: ChunkCoordinate) -> NeighborPlanes {
        let mut planes = NeighborPlanes::none();
        for side in BlockSide::horizontal() {
            planes.set(
                side,
                self.boundary_plane(coordinate.neighbor(side), side.opposite()),
            );
        }
        planes
    }

    /// The exposure mask of the block at `position` in the chunk at `coordinate`,
    /// resolving neighbours across chunk edges through the index.
    ///
    /// Returns an empty mask when the chunk is not registered or the position is air.
    pub fn compute_neighbor_mask(
        &self,
        coordinate: ChunkCoordinate,
        position: LocalPosition,
    ) -> FaceMask {
        let planes = self.neighbor_planes(coordinate);
        let Some(blocks) = self.get(coordinate) else {
            return FaceMask::NONE;
        };
        let store = blocks.get();
        visibility::compute_neighbor_mask(&store, &planes, position)
    }
}

impl fmt::Debug for WorldIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldIndex")
            .field("chunks", &self.len())
            .finish()
    }
}
