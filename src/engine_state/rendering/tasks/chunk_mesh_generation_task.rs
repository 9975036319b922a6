//! Task for rebuilding chunk meshes in a background thread.
//!
//! Edge fix-ups change the masks of chunks that are already drawn. Their meshes are
//! rebuilt here from a snapshot of the masks; the result is installed only if the chunk
//! has not changed again in the meantime.

use std::sync::Arc;

use log::trace;
use web_time::Instant;

use crate::{
    core::MtResource,
    engine_state::{
        rendering::{meshing::ChunkMesh, textures::TextureLookup},
        task_management::task::{Task, TaskResult},
        voxels::{
            block::face_mask::FaceMask,
            chunk::{block_store::BlockStore, chunk_coordinate::ChunkCoordinate},
            world::{WorldState, WorldTask},
        },
    },
};

/// A task that builds the mesh of one chunk from a snapshot of its masks.
pub struct ChunkMeshGenerationTask {
    coordinate: ChunkCoordinate,
    /// Mask revision the snapshot was taken at
    revision: u64,
    blocks: MtResource<BlockStore>,
    masks: Vec<FaceMask>,
    textures: Arc<dyn TextureLookup>,
}

impl ChunkMeshGenerationTask {
    /// Creates a mesh rebuild for the chunk at `coordinate`.
    pub fn new(
        coordinate: ChunkCoordinate,
        revision: u64,
        blocks: MtResource<BlockStore>,
        masks: Vec<FaceMask>,
        textures: Arc<dyn TextureLookup>,
    ) -> Self {
        ChunkMeshGenerationTask {
            coordinate,
            revision,
            blocks,
            masks,
            textures,
        }
    }

    fn build(&self) -> anyhow::Result<ChunkMesh> {
        ChunkMesh::build(&self.blocks.get(), &self.masks, self.textures.as_ref())
    }
}

impl Task for ChunkMeshGenerationTask {
    fn process(&self) -> Box<dyn TaskResult + Send> {
        let start = Instant::now();
        let mesh = self.build();
        trace!(
            "Rebuilt mesh of chunk {} at revision {} in {:?}",
            self.coordinate,
            self.revision,
            start.elapsed()
        );

        Box::new(ChunkMeshGenerationTaskResult {
            coordinate: self.coordinate,
            revision: self.revision,
            mesh,
        })
    }
}

/// The result of a mesh rebuild.
pub struct ChunkMeshGenerationTaskResult {
    coordinate: ChunkCoordinate,
    revision: u64,
    mesh: anyhow::Result<ChunkMesh>,
}

impl TaskResult for ChunkMeshGenerationTaskResult {
    /// Installs and uploads the mesh, unless the chunk was evicted or changed since the
    /// snapshot.
    fn handle_result(self: Box<Self>, world: &mut WorldState) -> Vec<WorldTask> {
        world.install_mesh(self.coordinate, self.revision, self.mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::rendering::textures::BlockTextures;
    use crate::engine_state::voxels::block::block_side::BlockSide;
    use crate::engine_state::voxels::block::{block_type::BlockType, Block};
    use crate::engine_state::voxels::chunk::block_store::ChunkDimensions;
    use cgmath::Point3;

    #[test]
    fn builds_from_the_mask_snapshot() {
        let dims = ChunkDimensions::new(4, 4);
        let mut store = BlockStore::new(dims);
        store.insert(Point3::new(1, 1, 1), Block::new(BlockType::STONE));
        let mut masks = vec![FaceMask::NONE; dims.volume()];
        masks[dims.linear_index(Point3::new(1, 1, 1))] = FaceMask::NONE.with(BlockSide::TOP, true);

        let task = ChunkMeshGenerationTask::new(
            ChunkCoordinate::new(0, 0),
            3,
            MtResource::new(store),
            masks,
            Arc::new(BlockTextures),
        );
        let mesh = task.build().unwrap();
        assert_eq!(mesh.element_count(), 6);
        assert_eq!(mesh.face_count(), 1);
    }
}
