//! Background tasks for the rendering system.
//!
//! # Available Tasks
//! - `ChunkMeshGenerationTask`: rebuilds the mesh of a chunk whose masks changed

pub mod chunk_mesh_generation_task;
