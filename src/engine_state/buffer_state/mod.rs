//! # Buffer State Module
//!
//! Render hand-off for chunk meshes. Once a chunk's mesh is built, the main thread
//! uploads it through a [`ChunkBufferStore`]; when the chunk is evicted its buffers are
//! released. Uploads and releases only ever happen on the thread that owns the store,
//! never on a worker.
//!
//! ## Implementations
//! * [`HostBufferStore`] keeps CPU-side copies; used headless and in tests
//! * [`WgpuBufferStore`] creates GPU vertex/index buffers through wgpu
//!
//! Both keep the same [`BufferStats`] so residency can be logged and asserted on.

use std::collections::HashMap;

use crate::engine_state::rendering::meshing::ChunkMesh;
use crate::engine_state::voxels::chunk::chunk_coordinate::ChunkCoordinate;

mod wgpu_store;

pub use wgpu_store::WgpuBufferStore;

/// Usage counters of a buffer store.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BufferStats {
    /// Chunks that currently have buffers
    pub live_chunks: usize,
    /// Bytes held across all live vertex and index buffers
    pub allocated_bytes: u64,
    /// Uploads performed since creation
    pub uploads: u64,
    /// Releases performed since creation
    pub releases: u64,
}

impl BufferStats {
    fn record_upload(&mut self, replaced_bytes: Option<u64>, new_bytes: u64) {
        match replaced_bytes {
            Some(bytes) => self.allocated_bytes -= bytes,
            None => self.live_chunks += 1,
        }
        self.allocated_bytes += new_bytes;
        self.uploads += 1;
    }

    fn record_release(&mut self, released_bytes: Option<u64>) {
        if let Some(bytes) = released_bytes {
            self.live_chunks -= 1;
            self.allocated_bytes -= bytes;
            self.releases += 1;
        }
    }
}

/// Destination of chunk meshes on the rendering side.
pub trait ChunkBufferStore {
    /// Creates or replaces the buffers of the chunk at `coordinate`.
    ///
    /// # Errors
    /// Fails when the buffers cannot be allocated.
    fn upload(&mut self, coordinate: ChunkCoordinate, mesh: &ChunkMesh) -> anyhow::Result<()>;

    /// Frees the buffers of the chunk at `coordinate`, if any.
    fn release(&mut self, coordinate: ChunkCoordinate);

    /// Current usage counters.
    fn stats(&self) -> BufferStats;
}

/// A chunk's buffers held in host memory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostChunkBuffers {
    /// Vertex buffer bytes
    pub vertices: Vec<u8>,
    /// Index buffer bytes
    pub indices: Vec<u8>,
    /// Number of indices to draw
    pub element_count: u32,
}

impl HostChunkBuffers {
    fn byte_len(&self) -> u64 {
        (self.vertices.len() + self.indices.len()) as u64
    }
}

/// [`ChunkBufferStore`] keeping byte copies of every uploaded mesh.
///
/// Like the GPU store, chunks with an empty mesh hold no buffers.
#[derive(Debug, Default)]
pub struct HostBufferStore {
    buffers: HashMap<ChunkCoordinate, HostChunkBuffers>,
    stats: BufferStats,
}

impl HostBufferStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The buffers of the chunk at `coordinate`.
    pub fn buffers(&self, coordinate: ChunkCoordinate) -> Option<&HostChunkBuffers> {
        self.buffers.get(&coordinate)
    }
}

impl ChunkBufferStore for HostBufferStore {
    fn upload(&mut self, coordinate: ChunkCoordinate, mesh: &ChunkMesh) -> anyhow::Result<()> {
        if mesh.is_empty() {
            self.release(coordinate);
            return Ok(());
        }

        let buffers = HostChunkBuffers {
            vertices: mesh.vertex_bytes().to_vec(),
            indices: mesh.index_bytes().to_vec(),
            element_count: mesh.element_count() as u32,
        };
        let new_bytes = buffers.byte_len();
        let replaced = self
            .buffers
            .insert(coordinate, buffers)
            .map(|old| old.byte_len());
        self.stats.record_upload(replaced, new_bytes);
        Ok(())
    }

    fn release(&mut self, coordinate: ChunkCoordinate) {
        let released = self.buffers.remove(&coordinate).map(|old| old.byte_len());
        self.stats.record_release(released);
    }

    fn stats(&self) -> BufferStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::rendering::textures::BlockTextures;
    use crate::engine_state::voxels::block::face_mask::FaceMask;
    use crate::engine_state::voxels::block::{block_type::BlockType, Block};
    use crate::engine_state::voxels::chunk::block_store::{BlockStore, ChunkDimensions};
    use cgmath::Point3;

    fn one_block_mesh() -> ChunkMesh {
        let dims = ChunkDimensions::new(4, 4);
        let mut store = BlockStore::new(dims);
        store.insert(Point3::new(0, 0, 0), Block::new(BlockType::DIRT));
        let mut masks = vec![FaceMask::NONE; dims.volume()];
        masks[0] = FaceMask::ALL;
        ChunkMesh::build(&store, &masks, &BlockTextures).unwrap()
    }

    #[test]
    fn uploads_replace_and_release() {
        let mut store = HostBufferStore::new();
        let mesh = one_block_mesh();
        let coordinate = ChunkCoordinate::new(1, 2);

        store.upload(coordinate, &mesh).unwrap();
        let bytes = (24 * 8 + 36 * 4) as u64;
        assert_eq!(
            store.stats(),
            BufferStats {
                live_chunks: 1,
                allocated_bytes: bytes,
                uploads: 1,
                releases: 0
            }
        );
        assert_eq!(store.buffers(coordinate).map(|b| b.element_count), Some(36));

        store.upload(coordinate, &mesh).unwrap();
        assert_eq!(store.stats().live_chunks, 1);
        assert_eq!(store.stats().allocated_bytes, bytes);
        assert_eq!(store.stats().uploads, 2);

        // Empty meshes hold no buffers.
        store.upload(coordinate, &ChunkMesh::default()).unwrap();
        assert_eq!(store.stats().live_chunks, 0);
        assert_eq!(store.stats().allocated_bytes, 0);
        assert!(store.buffers(coordinate).is_none());

        store.release(coordinate);
        assert_eq!(store.stats().releases, 1);
    }
}
