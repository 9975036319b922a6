//! Chunk mesh serialization.
//!
//! Turns a chunk's blocks and visibility masks into a vertex buffer holding four packed
//! vertices per exposed face and an index buffer holding six indices per exposed face.
//!
//! # Build
//! 1. Blocks with at least one exposed face are sorted by their linear key
//!    (`y * width² + z * width + x`).
//! 2. A prefix sum over their face counts gives every block its first face slot.
//! 3. Both buffers are allocated once, split into disjoint contiguous ranges, and the
//!    ranges are filled in parallel on the rayon pool.
//!
//! Output is identical regardless of how the work is split.

use anyhow::Context;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::engine_state::voxels::block::face_mask::FaceMask;
use crate::engine_state::voxels::chunk::block_store::{BlockStore, LocalPosition};

use super::textures::{BlockTexture, TextureLookup};
use super::vertex::PackedVertex;

pub mod face;

use face::{face_indices, face_vertices, INDICES_PER_FACE, VERTICES_PER_FACE};

/// Smallest number of blocks handed to one parallel job.
const MIN_BLOCKS_PER_JOB: usize = 256;

/// Vertex and index buffers of one chunk, ready for upload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChunkMesh {
    vertices: Vec<PackedVertex>,
    indices: Vec<u32>,
}

/// A block contributing faces to the mesh.
struct MeshEntry {
    key: usize,
    position: LocalPosition,
    mask: FaceMask,
    texture: BlockTexture,
}

/// A contiguous run of entries and the buffer ranges it owns.
struct MeshJob<'a> {
    entries: &'a [MeshEntry],
    first_face: usize,
    vertices: &'a mut [PackedVertex],
    indices: &'a mut [u32],
}

impl MeshJob<'_> {
    fn write(self) {
        let mut face = 0;
        for entry in self.entries {
            for side in entry.mask.exposed_sides() {
                let vertex_start = face * VERTICES_PER_FACE;
                let index_start = face * INDICES_PER_FACE;
                self.vertices[vertex_start..vertex_start + VERTICES_PER_FACE].copy_from_slice(
                    &face_vertices(
                        entry.position,
                        side,
                        entry.texture.layer(side),
                        entry.texture.tint(side),
                    ),
                );
                let base_vertex = ((self.first_face + face) * VERTICES_PER_FACE) as u32;
                self.indices[index_start..index_start + INDICES_PER_FACE]
                    .copy_from_slice(&face_indices(base_vertex));
                face += 1;
            }
        }
    }
}

impl ChunkMesh {
    /// Builds the mesh of `store` given its visibility `masks` (indexed by linear key).
    ///
    /// # Errors
    /// Fails if the buffers cannot be allocated.
    pub fn build(
        store: &BlockStore,
        masks: &[FaceMask],
        textures: &dyn TextureLookup,
    ) -> anyhow::Result<ChunkMesh> {
        let dims = store.dims();
        let mut entries: Vec<MeshEntry> = store
            .iter()
            .filter_map(|(position, block)| {
                let key = dims.linear_index(position);
                let mask = masks.get(key).copied().unwrap_or(FaceMask::NONE);
                if mask.is_empty() {
                    return None;
                }
                let Some(block_type) = block.kind() else {
                    debug_assert!(false, "corrupt block tag {} at {:?}", block.block_type, position);
                    return None;
                };
                Some(MeshEntry {
                    key,
                    position,
                    mask,
                    texture: textures.texture(block_type),
                })
            })
            .collect();
        entries.sort_unstable_by_key(|entry| entry.key);

        let mut face_offsets = Vec::with_capacity(entries.len() + 1);
        let mut running = 0usize;
        face_offsets.push(running);
        for entry in &entries {
            running += entry.mask.count() as usize;
            face_offsets.push(running);
        }
        let face_count = running;

        let mut vertices = Vec::new();
        vertices
            .try_reserve_exact(face_count * VERTICES_PER_FACE)
            .context("Failed to allocate chunk vertex buffer")?;
        vertices.resize(face_count * VERTICES_PER_FACE, PackedVertex::default());

        let mut indices = Vec::new();
        indices
            .try_reserve_exact(face_count * INDICES_PER_FACE)
            .context("Failed to allocate chunk index buffer")?;
        indices.resize(face_count * INDICES_PER_FACE, 0u32);

        let job_size = entries
            .len()
            .div_ceil(rayon::current_num_threads().max(1))
            .max(MIN_BLOCKS_PER_JOB);

        let mut vertex_rest: &mut [PackedVertex] = &mut vertices;
        let mut index_rest: &mut [u32] = &mut indices;
        let mut jobs = Vec::new();
        for (job_index, job_entries) in entries.chunks(job_size).enumerate() {
            let start = job_index * job_size;
            let first_face = face_offsets[start];
            let faces = face_offsets[start + job_entries.len()] - first_face;

            let (job_vertices, rest) =
                std::mem::take(&mut vertex_rest).split_at_mut(faces * VERTICES_PER_FACE);
            vertex_rest = rest;
            let (job_indices, rest) =
                std::mem::take(&mut index_rest).split_at_mut(faces * INDICES_PER_FACE);
            index_rest = rest;

            jobs.push(MeshJob {
                entries: job_entries,
                first_face,
                vertices: job_vertices,
                indices: job_indices,
            });
        }

        jobs.into_par_iter().for_each(MeshJob::write);

        Ok(ChunkMesh { vertices, indices })
    }

    /// Packed vertices, four per exposed face.
    pub fn vertices(&self) -> &[PackedVertex] {
        &self.vertices
    }

    /// Triangle indices, six per exposed face.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of exposed faces in the mesh.
    pub fn face_count(&self) -> usize {
        self.vertices.len() / VERTICES_PER_FACE
    }

    /// Length of the index buffer.
    pub fn element_count(&self) -> usize {
        self.indices.len()
    }

    /// Whether the mesh draws nothing.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// The vertex buffer as bytes.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// The index buffer as bytes.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::rendering::textures::BlockTextures;
    use crate::engine_state::voxels::block::block_side::BlockSide;
    use crate::engine_state::voxels::block::{block_type::BlockType, Block};
    use crate::engine_state::voxels::chunk::block_store::ChunkDimensions;
    use crate::engine_state::voxels::chunk::visibility::{compute_neighbor_mask, NeighborPlanes};
    use cgmath::Point3;

    fn masks_for(store: &BlockStore) -> Vec<FaceMask> {
        let dims = store.dims();
        let mut masks = vec![FaceMask::NONE; dims.volume()];
        for (position, _) in store.iter() {
            masks[dims.linear_index(position)] =
                compute_neighbor_mask(store, &NeighborPlanes::none(), position);
        }
        masks
    }

    fn slab(dims: ChunkDimensions, height: usize) -> BlockStore {
        let mut store = BlockStore::new(dims);
        for y in 0..height {
            for z in 0..dims.width {
                for x in 0..dims.width {
                    store.insert(Point3::new(x, y, z), Block::new(BlockType::GRASS));
                }
            }
        }
        store
    }

    #[test]
    fn single_block_emits_six_faces_in_canonical_order() {
        let mut store = BlockStore::new(ChunkDimensions::new(4, 4));
        store.insert(Point3::new(1, 2, 3), Block::new(BlockType::STONE));
        let mesh = ChunkMesh::build(&store, &masks_for(&store), &BlockTextures).unwrap();

        assert_eq!(mesh.face_count(), 6);
        assert_eq!(mesh.vertices().len(), 24);
        assert_eq!(mesh.element_count(), 36);
        for (face, side) in BlockSide::all().into_iter().enumerate() {
            let base = (face * 4) as u32;
            assert_eq!(&mesh.indices()[face * 6..face * 6 + 6], &face_indices(base));
            for vertex in &mesh.vertices()[face * 4..face * 4 + 4] {
                let attributes = vertex.attributes();
                assert_eq!(attributes.normal, side as u32);
                assert_eq!((attributes.x, attributes.y, attributes.z), (1, 2, 3));
            }
        }
    }

    #[test]
    fn element_count_matches_mask_popcount() {
        let dims = ChunkDimensions::new(16, 32);
        let mut store = slab(dims, 5);
        store.remove(Point3::new(4, 4, 4));
        store.remove(Point3::new(0, 2, 9));
        let masks = masks_for(&store);
        let mesh = ChunkMesh::build(&store, &masks, &BlockTextures).unwrap();

        let expected: usize = masks.iter().map(|mask| mask.count() as usize * 6).sum();
        assert_eq!(mesh.element_count(), expected);
        assert_eq!(mesh.vertices().len() * 6, expected * 4);
        let vertex_count = mesh.vertices().len() as u32;
        assert!(mesh.indices().iter().all(|index| *index < vertex_count));
    }

    #[test]
    fn faces_follow_linear_key_order() {
        let dims = ChunkDimensions::new(16, 16);
        let store = slab(dims, 3);
        let mesh = ChunkMesh::build(&store, &masks_for(&store), &BlockTextures).unwrap();
        let keys: Vec<usize> = mesh
            .vertices()
            .chunks(4)
            .map(|face| {
                let a = face[0].attributes();
                dims.linear_index(Point3::new(a.x as usize, a.y as usize, a.z as usize))
            })
            .collect();
        assert!(keys.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn build_is_deterministic_across_parallel_splits() {
        let dims = ChunkDimensions::new(32, 16);
        let store = slab(dims, 4);
        let masks = masks_for(&store);
        let first = ChunkMesh::build(&store, &masks, &BlockTextures).unwrap();
        let second = ChunkMesh::build(&store, &masks, &BlockTextures).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.vertex_bytes().len(), first.vertices().len() * 8);
        assert_eq!(first.index_bytes().len(), first.element_count() * 4);
    }

    #[test]
    fn empty_store_builds_empty_mesh() {
        let store = BlockStore::new(ChunkDimensions::new(16, 16));
        let mesh = ChunkMesh::build(&store, &[], &BlockTextures).unwrap();
        assert!(mesh.is_empty());
    }
}
