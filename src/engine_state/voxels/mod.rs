//! # Voxel World Core
//!
//! Representing, generating and streaming the voxel world.
//!
//! ## Architecture
//!
//! * **Block**: block types, faces and the 6-bit face masks
//! * **Noise**: seeded Perlin noise, its fractal sum and an 8-lane batch path
//! * **Chunk**: a `width x width x height` column of blocks with terrain generation,
//!   visibility and its mesh
//! * **World index**: the shared coordinate to block-set map used for cross-chunk
//!   neighbour queries
//! * **Streaming / World**: the window around the viewpoint and the main-thread chunk
//!   arena
//! * **Tasks**: chunk generation on the worker pool
//!
//! ## Data Flow
//!
//! 1. The viewpoint crosses a chunk boundary and the window is recomputed
//! 2. Generation tasks build terrain, register it in the index, compute visibility and
//!    build meshes on workers
//! 3. The main thread uploads the buffers and fixes up the edges shared with resident
//!    neighbours, which may schedule mesh rebuilds
//! 4. Chunks outside the retention window are evicted on the next update
//!
//! ## Thread Safety
//!
//! * The world index is a mutex-guarded map of shared block sets
//! * Block sets are read-write locked and never locked two at a time
//! * The chunk arena and the buffer store are only touched by the main thread

pub mod block;
pub mod chunk;
pub mod noise;
pub mod streaming;
pub mod tasks;
pub mod world;
pub mod world_index;
