//! # Chunk Generation Task
//!
//! This module defines the `ChunkGenerationTask`, which builds a batch of chunks off the
//! main thread. One task is published per newly entered window edge, not per chunk.

use std::sync::Arc;

use log::{debug, warn};
use web_time::Instant;

use crate::{
    core::MtResource,
    engine_state::{
        rendering::textures::TextureLookup,
        task_management::task::{Task, TaskResult},
        voxels::{
            chunk::{chunk_coordinate::ChunkCoordinate, chunk_creation::TerrainGenerator, Chunk},
            world::{WorldState, WorldTask},
            world_index::WorldIndex,
        },
    },
};

/// Generates terrain, visibility and the mesh of a batch of chunks.
///
/// Every block set is registered in the [`WorldIndex`] as soon as its terrain exists,
/// before visibility runs, so chunks of the same batch and of concurrent batches see
/// each other's boundaries.
pub struct ChunkGenerationTask {
    coordinates: Vec<ChunkCoordinate>,
    terrain: TerrainGenerator,
    index: WorldIndex,
    textures: Arc<dyn TextureLookup>,
}

impl ChunkGenerationTask {
    /// Creates a task generating `coordinates`, nearest first.
    pub fn new(
        coordinates: Vec<ChunkCoordinate>,
        terrain: TerrainGenerator,
        index: WorldIndex,
        textures: Arc<dyn TextureLookup>,
    ) -> Self {
        ChunkGenerationTask {
            coordinates,
            terrain,
            index,
            textures,
        }
    }

    /// The coordinates this task generates.
    pub fn coordinates(&self) -> &[ChunkCoordinate] {
        &self.coordinates
    }

    fn generate(&self, coordinate: ChunkCoordinate) -> anyhow::Result<Chunk> {
        let blocks = MtResource::new(self.terrain.generate(coordinate));
        self.index.insert(coordinate, blocks.clone());

        let neighbors = self.index.neighbor_planes(coordinate);
        let mut chunk = Chunk::new(coordinate, blocks);
        chunk.compute_visibility(&neighbors);
        chunk.rebuild_mesh(self.textures.as_ref())?;
        Ok(chunk)
    }
}

impl Task for ChunkGenerationTask {
    /// Generates every chunk of the batch. A chunk that fails is erased from the index
    /// again and reported as failed; the rest of the batch carries on.
    fn process(&self) -> Box<dyn TaskResult + Send> {
        let mut generated = Vec::with_capacity(self.coordinates.len());
        let mut failed = Vec::new();

        for &coordinate in &self.coordinates {
            let start = Instant::now();
            match self.generate(coordinate) {
                Ok(chunk) => {
                    debug!(
                        "Generated chunk {} ({} elements) in {:?}",
                        coordinate,
                        chunk.element_count(),
                        start.elapsed()
                    );
                    generated.push(chunk);
                }
                Err(error) => {
                    warn!("Generation of chunk {} failed: {:#}", coordinate, error);
                    self.index.remove(coordinate);
                    failed.push(coordinate);
                }
            }
        }

        Box::new(ChunkGenerationTaskResult { generated, failed })
    }

    /// Erases whatever the batch registered before it panicked and reports every
    /// coordinate as failed.
    fn abandon(&self) -> Box<dyn TaskResult + Send> {
        for &coordinate in &self.coordinates {
            self.index.remove(coordinate);
        }
        Box::new(ChunkGenerationTaskResult {
            generated: Vec::new(),
            failed: self.coordinates.clone(),
        })
    }
}

/// The result of a chunk generation task.
pub struct ChunkGenerationTaskResult {
    generated: Vec<Chunk>,
    failed: Vec<ChunkCoordinate>,
}

impl TaskResult for ChunkGenerationTaskResult {
    /// Moves the generated chunks into the world, uploads their buffers and fixes up
    /// shared edges. Follow-up tasks rebuild the meshes those fix-ups changed.
    fn handle_result(self: Box<Self>, world: &mut WorldState) -> Vec<WorldTask> {
        let mut tasks = Vec::new();
        for coordinate in self.failed {
            tasks.extend(world.generation_failed(coordinate));
        }
        for chunk in self.generated {
            tasks.extend(world.accept_generated(chunk));
        }
        tasks
    }
}
