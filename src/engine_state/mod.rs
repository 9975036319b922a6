//! # Engine State Module
//!
//! The coordinator of a streamed voxel world.
//!
//! ## Key Components
//!
//! * [`World`] - The world as seen by the frame loop: viewpoint updates, task polling,
//!   block queries and edits, render hand-off
//! * `buffer_state` - Render hand-off of chunk meshes (host memory or wgpu buffers)
//! * `rendering` - Vertex packing, face textures and mesh building
//! * `task_management` - The worker pool
//! * `voxels` - Blocks, chunks, noise, the world index and the main-thread world state
//!
//! ## Frame loop
//!
//! ```no_run
//! use voxel_world::config::WorldConfig;
//! use voxel_world::engine_state::buffer_state::HostBufferStore;
//! use voxel_world::engine_state::World;
//!
//! let mut world = World::new(WorldConfig::default(), Box::new(HostBufferStore::new()))?;
//! for frame in 0..600 {
//!     world.update_viewpoint(frame as f64 * 0.5, 0.0);
//!     world.update();
//!     for chunk in world.render_chunks() {
//!         // bind chunk.mesh buffers, offset by chunk.origin, draw indexed
//!         let _ = (chunk.origin, chunk.mesh.element_count());
//!     }
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! The main thread never blocks on a worker except in [`World::new`], which joins the
//! initial window, and [`World::wait_for_pending`].

use std::sync::Arc;

use anyhow::Context;
use cgmath::Point3;
use log::info;
use web_time::Instant;

use crate::config::WorldConfig;

pub mod buffer_state;
pub mod rendering;
pub mod task_management;
pub mod voxels;

use buffer_state::{BufferStats, ChunkBufferStore};
use rendering::textures::{BlockTextures, TextureLookup};
use task_management::TaskManager;
use voxels::block::block_type::BlockType;
use voxels::chunk::block_store::LocalPosition;
use voxels::chunk::chunk_coordinate::ChunkCoordinate;
use voxels::chunk::Chunk;
use voxels::world_index::WorldIndex;

pub use voxels::world::{ChunkState, RenderChunk, WorldState, WorldTask};

/// A streamed voxel world and the workers generating it.
pub struct World {
    state: WorldState,
    task_manager: TaskManager,
}

impl World {
    /// Creates a world with the default block textures and loads the visible window
    /// around chunk (0, 0).
    ///
    /// # Errors
    /// Fails on an invalid configuration, when the workers cannot be started, or when
    /// uploading the initial chunks fails.
    pub fn new(config: WorldConfig, buffers: Box<dyn ChunkBufferStore>) -> anyhow::Result<Self> {
        Self::with_textures(config, buffers, Arc::new(BlockTextures))
    }

    /// Like [`World::new`] with a custom texture table.
    pub fn with_textures(
        config: WorldConfig,
        buffers: Box<dyn ChunkBufferStore>,
        textures: Arc<dyn TextureLookup>,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        let start = Instant::now();
        let task_manager =
            TaskManager::new(config.worker_count()).context("Failed to start world workers")?;

        let mut world = World {
            state: WorldState::new(config, buffers, textures),
            task_manager,
        };

        world.state.set_initializing(true);
        for task in world.state.recompute_window((0, 0)) {
            world.task_manager.publish_task(task);
        }
        world.wait_for_pending();
        world.state.set_initializing(false);

        if let Some(error) = world.state.take_fatal() {
            return Err(error.context("World initialization failed"));
        }

        info!(
            "World ready with {} chunks on {} workers in {:?}",
            world.state.resident_chunks().len(),
            world.task_manager.worker_count(),
            start.elapsed()
        );
        Ok(world)
    }

    /// Moves the viewpoint to world-space (`x`, `z`).
    ///
    /// Positions beyond the chunk grid are clamped so the retention window stays inside
    /// it. When this crosses into another chunk the window is recomputed: chunks outside
    /// the retention window are marked for eviction and generation of the newly
    /// entered edge is published. Returns whether the viewpoint chunk changed.
    pub fn update_viewpoint(&mut self, x: f64, z: f64) -> bool {
        let margin = self.state.config().retention_radius().saturating_add(1);
        let chunk = ChunkCoordinate::from_world_position(x, z, self.state.dims().width)
            .clamped_to_grid(margin);
        if chunk == self.state.viewpoint() {
            return false;
        }

        info!("Viewpoint entered chunk {}", chunk);
        for task in self.state.move_viewpoint(chunk) {
            self.task_manager.publish_task(task);
        }
        true
    }

    /// Applies every finished task, completes pending evictions and hands queued tasks
    /// to idle workers. Never blocks; call once per frame.
    ///
    /// Returns the number of task results applied.
    pub fn update(&mut self) -> usize {
        let handled = self.task_manager.process_completed_tasks(&mut self.state);
        for task in self.state.finish_evictions() {
            self.task_manager.publish_task(task);
        }
        self.task_manager.process_queued_tasks();
        handled
    }

    /// Blocks until every published task, and everything they trigger, has been
    /// applied and every pending eviction completed.
    pub fn wait_for_pending(&mut self) {
        loop {
            self.task_manager.wait_for_all(&mut self.state);
            let tasks = self.state.finish_evictions();
            if tasks.is_empty() {
                break;
            }
            for task in tasks {
                self.task_manager.publish_task(task);
            }
        }
    }

    /// Whether any task is queued or in flight.
    pub fn tasks_pending(&self) -> bool {
        self.task_manager.tasks_pending()
    }

    /// Whether a block exists at `position` of the chunk at `coordinate`.
    pub fn block_exists(&self, coordinate: ChunkCoordinate, position: LocalPosition) -> bool {
        self.state.index().block_exists(coordinate, position)
    }

    /// Whether a block exists at world-space block position `position`.
    pub fn block_exists_at(&self, position: Point3<i64>) -> bool {
        let dims = self.state.dims();
        if position.y < 0 || position.y >= dims.height as i64 {
            return false;
        }
        let width = dims.width as i64;
        let coordinate = ChunkCoordinate::new(
            position.x.div_euclid(width) as i32,
            position.z.div_euclid(width) as i32,
        );
        let local = Point3::new(
            position.x.rem_euclid(width) as usize,
            position.y as usize,
            position.z.rem_euclid(width) as usize,
        );
        self.block_exists(coordinate, local)
    }

    /// Places a block of `block_type` at `position` of the Ready chunk `coordinate`,
    /// updating its mask and the masks of its six neighbours and rebuilding the
    /// affected meshes.
    ///
    /// Returns whether anything changed.
    ///
    /// # Errors
    /// Fails when the chunk is not Ready, the position is out of bounds, or a rebuilt
    /// mesh cannot be built or uploaded.
    pub fn set_block(
        &mut self,
        coordinate: ChunkCoordinate,
        position: LocalPosition,
        block_type: BlockType,
    ) -> anyhow::Result<bool> {
        self.state.set_block(coordinate, position, block_type)
    }

    /// Clears `position` of the Ready chunk `coordinate`, exposing the faces of its
    /// neighbours. Returns whether a block was removed.
    ///
    /// # Errors
    /// As for [`World::set_block`].
    pub fn remove_block(
        &mut self,
        coordinate: ChunkCoordinate,
        position: LocalPosition,
    ) -> anyhow::Result<bool> {
        self.state.remove_block(coordinate, position)
    }

    /// Streaming state of `coordinate`.
    pub fn chunk_state(&self, coordinate: ChunkCoordinate) -> ChunkState {
        self.state.chunk_state(coordinate)
    }

    /// The resident chunk at `coordinate`.
    pub fn chunk(&self, coordinate: ChunkCoordinate) -> Option<&Chunk> {
        self.state.chunk(coordinate)
    }

    /// Coordinates of every resident chunk, sorted.
    pub fn resident_chunks(&self) -> Vec<ChunkCoordinate> {
        self.state.resident_chunks()
    }

    /// Drawable chunks with their world-space origins.
    pub fn render_chunks(&self) -> Vec<RenderChunk<'_>> {
        self.state.render_chunks()
    }

    /// The chunk the viewpoint is in.
    pub fn viewpoint(&self) -> ChunkCoordinate {
        self.state.viewpoint()
    }

    /// Usage counters of the buffer store.
    pub fn buffer_stats(&self) -> BufferStats {
        self.state.buffer_stats()
    }

    /// The shared block index, for occupancy queries from other threads.
    pub fn index(&self) -> &WorldIndex {
        self.state.index()
    }

    /// The configuration the world was built from.
    pub fn config(&self) -> &WorldConfig {
        self.state.config()
    }

    /// The main-thread world state.
    pub fn state(&self) -> &WorldState {
        &self.state
    }
}
