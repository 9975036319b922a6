//! # World Module
//!
//! [`WorldState`] is the main-thread half of the chunk streamer. It owns the arena of
//! chunks (coordinate to [`Chunk`] value), the per-coordinate streaming state and the
//! render hand-off, and it is the context every task result is applied to.
//!
//! ## Chunk lifecycle
//! ```text
//! Unloaded -> Generating -> Ready -> Evicting -> (removed)
//! ```
//! - A coordinate becomes `Generating` when it enters the visible window and a
//!   generation task is published for it.
//! - The worker inserts the block set into the [`WorldIndex`], computes visibility and
//!   builds the mesh; the main thread then uploads the buffers, fixes up the shared
//!   edges and the chunk is `Ready`.
//! - A chunk outside the retention window is marked `Evicting` when the window is
//!   recomputed. The eviction completes on the next update: buffers are released, the
//!   index entry erased and the neighbours' facing edges exposed again. A chunk that
//!   re-enters the retention window before then goes straight back to `Ready`.
//!
//! Only the main thread touches this state. Workers share the [`WorldIndex`] and the
//! block sets, never the arena.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use anyhow::{bail, Context};
use cgmath::Point3;
use log::{debug, trace, warn};

use crate::config::WorldConfig;
use crate::engine_state::buffer_state::{BufferStats, ChunkBufferStore};
use crate::engine_state::rendering::meshing::ChunkMesh;
use crate::engine_state::rendering::tasks::chunk_mesh_generation_task::ChunkMeshGenerationTask;
use crate::engine_state::rendering::textures::TextureLookup;
use crate::engine_state::task_management::task::Task;

use super::block::block_side::BlockSide;
use super::block::block_type::BlockType;
use super::block::face_mask::FaceMask;
use super::block::Block;
use super::chunk::block_store::{ChunkDimensions, LocalPosition};
use super::chunk::chunk_coordinate::ChunkCoordinate;
use super::chunk::chunk_creation::TerrainGenerator;
use super::chunk::visibility::{neighbor_location, NeighborLocation};
use super::chunk::Chunk;
use super::streaming;
use super::tasks::chunk_generation_task::ChunkGenerationTask;
use super::world_index::WorldIndex;

/// A task applied to the [`WorldState`] when it completes.
pub type WorldTask = Box<dyn Task<WorldState> + Send>;

/// Streaming state of one chunk coordinate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChunkState {
    /// Not resident and not requested.
    Unloaded,
    /// A generation task is in flight.
    Generating,
    /// Resident, registered in the index and drawable.
    Ready,
    /// Outside the retention window; removed on the next update.
    Evicting,
}

/// What the renderer needs to draw one chunk.
#[derive(Copy, Clone, Debug)]
pub struct RenderChunk<'a> {
    /// Grid position of the chunk
    pub coordinate: ChunkCoordinate,
    /// World-space offset of the chunk's local origin
    pub origin: Point3<i32>,
    /// Packed vertices and indices
    pub mesh: &'a ChunkMesh,
}

/// Main-thread state of a streamed world.
pub struct WorldState {
    config: WorldConfig,
    dims: ChunkDimensions,
    index: WorldIndex,
    terrain: TerrainGenerator,
    textures: Arc<dyn TextureLookup>,
    chunks: HashMap<ChunkCoordinate, Chunk>,
    generating: HashSet<ChunkCoordinate>,
    evicting: HashSet<ChunkCoordinate>,
    viewpoint: ChunkCoordinate,
    buffers: Box<dyn ChunkBufferStore>,
    /// First upload failure seen while initializing.
    fatal: Option<anyhow::Error>,
    initializing: bool,
}

impl WorldState {
    /// Creates an empty world centred on chunk (0, 0). Nothing is requested yet.
    pub fn new(
        config: WorldConfig,
        buffers: Box<dyn ChunkBufferStore>,
        textures: Arc<dyn TextureLookup>,
    ) -> Self {
        let terrain = TerrainGenerator::from_config(&config);
        Self {
            dims: ChunkDimensions::from_config(&config),
            config,
            index: WorldIndex::new(),
            terrain,
            textures,
            chunks: HashMap::new(),
            generating: HashSet::new(),
            evicting: HashSet::new(),
            viewpoint: ChunkCoordinate::default(),
            buffers,
            fatal: None,
            initializing: false,
        }
    }

    /// The configuration the world was built from.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Extents of every chunk.
    pub fn dims(&self) -> ChunkDimensions {
        self.dims
    }

    /// The shared block index.
    pub fn index(&self) -> &WorldIndex {
        &self.index
    }

    /// The chunk the viewpoint is in.
    pub fn viewpoint(&self) -> ChunkCoordinate {
        self.viewpoint
    }

    /// Streaming state of `coordinate`.
    pub fn chunk_state(&self, coordinate: ChunkCoordinate) -> ChunkState {
        if self.evicting.contains(&coordinate) {
            ChunkState::Evicting
        } else if self.chunks.contains_key(&coordinate) {
            ChunkState::Ready
        } else if self.generating.contains(&coordinate) {
            ChunkState::Generating
        } else {
            ChunkState::Unloaded
        }
    }

    /// The resident chunk at `coordinate`, Ready or Evicting.
    pub fn chunk(&self, coordinate: ChunkCoordinate) -> Option<&Chunk> {
        self.chunks.get(&coordinate)
    }

    /// Coordinates of every resident chunk, sorted.
    pub fn resident_chunks(&self) -> Vec<ChunkCoordinate> {
        let mut coordinates: Vec<_> = self.chunks.keys().copied().collect();
        coordinates.sort_unstable();
        coordinates
    }

    /// Number of coordinates with generation in flight.
    pub fn generating(&self) -> usize {
        self.generating.len()
    }

    /// Drawable chunks, sorted by coordinate.
    pub fn render_chunks(&self) -> Vec<RenderChunk<'_>> {
        let width = self.dims.width;
        let mut render_chunks: Vec<RenderChunk<'_>> = self
            .chunks
            .iter()
            .filter(|(coordinate, _)| !self.evicting.contains(*coordinate))
            .filter_map(|(&coordinate, chunk)| {
                chunk.mesh().map(|mesh| RenderChunk {
                    coordinate,
                    origin: coordinate.origin(width),
                    mesh,
                })
            })
            .collect();
        render_chunks.sort_unstable_by_key(|chunk| chunk.coordinate);
        render_chunks
    }

    /// Usage counters of the buffer store.
    pub fn buffer_stats(&self) -> BufferStats {
        self.buffers.stats()
    }

    pub(crate) fn set_initializing(&mut self, initializing: bool) {
        self.initializing = initializing;
    }

    pub(crate) fn take_fatal(&mut self) -> Option<anyhow::Error> {
        self.fatal.take()
    }

    /// Moves the viewpoint to `viewpoint` and recomputes the window.
    pub(crate) fn move_viewpoint(&mut self, viewpoint: ChunkCoordinate) -> Vec<WorldTask> {
        let movement = (
            viewpoint.x.saturating_sub(self.viewpoint.x),
            viewpoint.z.saturating_sub(self.viewpoint.z),
        );
        self.viewpoint = viewpoint;
        self.recompute_window(movement)
    }

    /// Marks resident chunks outside the retention window for eviction, revives marked
    /// chunks back inside it, and requests generation of every missing coordinate of the
    /// visible window, one task per edge batch.
    pub(crate) fn recompute_window(&mut self, movement: (i32, i32)) -> Vec<WorldTask> {
        let center = self.viewpoint;
        let retention = self.config.retention_radius();

        for &coordinate in self.chunks.keys() {
            if streaming::in_window(center, coordinate, retention) {
                if self.evicting.remove(&coordinate) {
                    trace!("Chunk {} re-entered the retention window", coordinate);
                }
            } else if self.evicting.insert(coordinate) {
                trace!("Chunk {} left the retention window", coordinate);
            }
        }

        let missing: Vec<ChunkCoordinate> =
            streaming::desired_window(center, self.config.visible_radius)
                .into_iter()
                .filter(|coordinate| {
                    !self.chunks.contains_key(coordinate) && !self.generating.contains(coordinate)
                })
                .collect();
        if missing.is_empty() {
            return Vec::new();
        }

        let batches = streaming::edge_batches(&missing, center, movement);
        debug!(
            "Viewpoint chunk {}: requesting {} chunks in {} batches",
            center,
            missing.len(),
            batches.len()
        );
        self.generating.extend(missing.iter().copied());

        batches
            .into_iter()
            .map(|batch| {
                Box::new(ChunkGenerationTask::new(
                    batch,
                    self.terrain.clone(),
                    self.index.clone(),
                    self.textures.clone(),
                )) as WorldTask
            })
            .collect()
    }

    /// Completes every pending eviction.
    pub(crate) fn finish_evictions(&mut self) -> Vec<WorldTask> {
        if self.evicting.is_empty() {
            return Vec::new();
        }
        let mut evicting: Vec<_> = self.evicting.drain().collect();
        evicting.sort_unstable();

        let mut tasks = Vec::new();
        for &coordinate in &evicting {
            tasks.extend(self.drop_chunk(coordinate));
        }
        debug!(
            "Evicted {} chunks, {} resident",
            evicting.len(),
            self.chunks.len()
        );
        tasks
    }

    /// Takes a generated chunk into the arena.
    pub(crate) fn accept_generated(&mut self, mut chunk: Chunk) -> Vec<WorldTask> {
        let coordinate = chunk.coordinate();
        self.generating.remove(&coordinate);

        if let Some(mesh) = chunk.mesh() {
            let uploaded = self
                .buffers
                .upload(coordinate, mesh)
                .with_context(|| format!("Failed to upload chunk {coordinate}"));
            if let Err(error) = uploaded {
                self.index.remove(coordinate);
                if self.initializing {
                    if self.fatal.is_none() {
                        self.fatal = Some(error);
                    }
                } else {
                    warn!("{:#}", error);
                }
                return self.expose_edges_toward(coordinate);
            }
        }

        // Neighbours may have loaded or left since the worker captured their planes.
        for side in BlockSide::horizontal() {
            let plane = self
                .index
                .boundary_plane(coordinate.neighbor(side), side.opposite());
            chunk.refresh_edge(side, plane.as_ref());
        }
        self.chunks.insert(coordinate, chunk);

        let mut tasks = Vec::new();
        for side in BlockSide::horizontal() {
            let neighbor = coordinate.neighbor(side);
            if !self.chunks.contains_key(&neighbor) {
                continue;
            }
            let plane = self.index.boundary_plane(coordinate, side);
            let changed = self
                .chunks
                .get_mut(&neighbor)
                .is_some_and(|chunk| chunk.refresh_edge(side.opposite(), plane.as_ref()));
            if changed {
                trace!("Hid edge {:?} of chunk {} against {}", side.opposite(), neighbor, coordinate);
                tasks.extend(self.mesh_task(neighbor));
            }
        }

        let stale = self
            .chunks
            .get(&coordinate)
            .is_some_and(|chunk| !chunk.mesh_is_current());
        if stale {
            tasks.extend(self.mesh_task(coordinate));
        }

        if !streaming::in_window(self.viewpoint, coordinate, self.config.retention_radius()) {
            trace!("Chunk {} arrived outside the retention window", coordinate);
            self.evicting.insert(coordinate);
        }
        tasks
    }

    /// Records that generation of `coordinate` produced nothing.
    pub(crate) fn generation_failed(&mut self, coordinate: ChunkCoordinate) -> Vec<WorldTask> {
        self.generating.remove(&coordinate);
        if self.chunks.contains_key(&coordinate) {
            return Vec::new();
        }
        self.index.remove(coordinate);
        self.expose_edges_toward(coordinate)
    }

    /// Installs a mesh built in the background from the masks of `revision`.
    pub(crate) fn install_mesh(
        &mut self,
        coordinate: ChunkCoordinate,
        revision: u64,
        mesh: anyhow::Result<ChunkMesh>,
    ) -> Vec<WorldTask> {
        let Some(chunk) = self.chunks.get_mut(&coordinate) else {
            trace!("Dropped mesh of chunk {} evicted meanwhile", coordinate);
            return Vec::new();
        };
        if revision != chunk.revision() {
            trace!("Dropped stale mesh of chunk {}", coordinate);
            return Vec::new();
        }

        let uploaded = match mesh {
            Ok(mesh) => {
                chunk.set_mesh(mesh, revision);
                match chunk.mesh() {
                    Some(mesh) => self.buffers.upload(coordinate, mesh),
                    None => Ok(()),
                }
            }
            Err(error) => Err(error),
        };
        match uploaded {
            Ok(()) => Vec::new(),
            Err(error) => {
                warn!("Dropping chunk {}: {:#}", coordinate, error);
                self.drop_chunk(coordinate)
            }
        }
    }

    /// Places a block of `block_type` at `position` of the Ready chunk `coordinate`.
    ///
    /// Returns whether anything changed.
    pub(crate) fn set_block(
        &mut self,
        coordinate: ChunkCoordinate,
        position: LocalPosition,
        block_type: BlockType,
    ) -> anyhow::Result<bool> {
        self.edit_block(coordinate, position, Some(block_type))
    }

    /// Clears `position` of the Ready chunk `coordinate`.
    ///
    /// Returns whether a block was removed.
    pub(crate) fn remove_block(
        &mut self,
        coordinate: ChunkCoordinate,
        position: LocalPosition,
    ) -> anyhow::Result<bool> {
        self.edit_block(coordinate, position, None)
    }

    fn edit_block(
        &mut self,
        coordinate: ChunkCoordinate,
        position: LocalPosition,
        block_type: Option<BlockType>,
    ) -> anyhow::Result<bool> {
        if !self.dims.in_bounds(position) {
            bail!("Position {:?} is outside the chunk bounds {:?}", position, self.dims);
        }
        if self.chunk_state(coordinate) != ChunkState::Ready {
            bail!("Chunk {} is not loaded", coordinate);
        }
        let blocks = match self.chunks.get(&coordinate) {
            Some(chunk) => chunk.blocks().clone(),
            None => bail!("Chunk {} is not loaded", coordinate),
        };

        let changed = {
            let mut store = blocks.get_mut();
            match block_type {
                Some(block_type) => {
                    let block = Block::new(block_type);
                    store.insert(position, block) != Some(block)
                }
                None => store.remove(position).is_some(),
            }
        };
        if !changed {
            return Ok(false);
        }

        let occupied = block_type.is_some();
        let own_mask = if occupied {
            self.index.compute_neighbor_mask(coordinate, position)
        } else {
            FaceMask::NONE
        };
        if let Some(chunk) = self.chunks.get_mut(&coordinate) {
            chunk.set_mask(position, own_mask);
            chunk.invalidate_mesh();
        }

        let mut touched = BTreeSet::from([coordinate]);
        for side in BlockSide::all() {
            let (neighbor, neighbor_position) = match neighbor_location(self.dims, position, side) {
                NeighborLocation::Local(local) => (coordinate, local),
                NeighborLocation::Adjacent { side, position } => (coordinate.neighbor(side), position),
                NeighborLocation::OutOfWorld => continue,
            };
            let Some(chunk) = self.chunks.get_mut(&neighbor) else {
                continue;
            };
            if !chunk.blocks().get().contains(neighbor_position) {
                continue;
            }
            let mask = chunk
                .mask(neighbor_position)
                .with(side.opposite(), !occupied);
            if chunk.set_mask(neighbor_position, mask) {
                touched.insert(neighbor);
            }
        }

        trace!(
            "{} block at {:?} in chunk {}; rebuilding {} meshes",
            if occupied { "Placed" } else { "Removed" },
            position,
            coordinate,
            touched.len()
        );
        for coordinate in touched {
            self.rebuild_and_upload(coordinate)?;
        }
        Ok(true)
    }

    fn rebuild_and_upload(&mut self, coordinate: ChunkCoordinate) -> anyhow::Result<()> {
        let Some(chunk) = self.chunks.get_mut(&coordinate) else {
            return Ok(());
        };
        chunk
            .rebuild_mesh(self.textures.as_ref())
            .with_context(|| format!("Failed to rebuild the mesh of chunk {coordinate}"))?;
        if let Some(mesh) = chunk.mesh() {
            self.buffers
                .upload(coordinate, mesh)
                .with_context(|| format!("Failed to upload chunk {coordinate}"))?;
        }
        Ok(())
    }

    /// Removes `coordinate` from the arena, the index and the buffer store.
    fn drop_chunk(&mut self, coordinate: ChunkCoordinate) -> Vec<WorldTask> {
        self.evicting.remove(&coordinate);
        self.buffers.release(coordinate);
        self.index.remove(coordinate);
        if self.chunks.remove(&coordinate).is_none() {
            return Vec::new();
        }
        trace!("Removed chunk {}", coordinate);
        self.expose_edges_toward(coordinate)
    }

    /// Exposes the edges of resident neighbours facing the now absent `coordinate`.
    fn expose_edges_toward(&mut self, coordinate: ChunkCoordinate) -> Vec<WorldTask> {
        let mut tasks = Vec::new();
        for side in BlockSide::horizontal() {
            let neighbor = coordinate.neighbor(side);
            let changed = self
                .chunks
                .get_mut(&neighbor)
                .is_some_and(|chunk| chunk.refresh_edge(side.opposite(), None));
            if changed {
                trace!("Exposed edge {:?} of chunk {}", side.opposite(), neighbor);
                tasks.extend(self.mesh_task(neighbor));
            }
        }
        tasks
    }

    /// A background rebuild of the mesh of `coordinate` from its current masks.
    fn mesh_task(&self, coordinate: ChunkCoordinate) -> Option<WorldTask> {
        let chunk = self.chunks.get(&coordinate)?;
        Some(Box::new(ChunkMeshGenerationTask::new(
            coordinate,
            chunk.revision(),
            chunk.blocks().clone(),
            chunk.masks().to_vec(),
            self.textures.clone(),
        )))
    }
}
