#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel World
//!
//! The world subsystem of a voxel engine: seeded terrain, per-block face visibility,
//! packed chunk meshes and streaming of chunks around a moving viewpoint.
//!
//! ## Key Modules
//!
//! * `config` - World parameters, loadable from JSON
//! * `core` - Shared-ownership primitives used throughout the crate
//! * `engine_state` - The [`World`] coordinator with its worker pool, voxel data,
//!   meshing and render hand-off
//!
//! ## Architecture
//!
//! * Terrain generation and meshing run on a fixed worker pool
//! * A shared, mutex-guarded index maps chunk coordinates to block sets for
//!   cross-chunk visibility queries
//! * The main thread owns the chunk arena and every buffer upload and release
//!
//! ## Usage
//!
//! ```no_run
//! use voxel_world::{config::WorldConfig, HostBufferStore, World};
//!
//! voxel_world::init_logging();
//! let mut world = World::new(WorldConfig::default(), Box::new(HostBufferStore::new()))?;
//! world.update_viewpoint(40.0, 0.0);
//! world.update();
//! println!("{} chunks resident", world.resident_chunks().len());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod config;
pub mod core;
pub mod engine_state;

pub use config::WorldConfig;
pub use engine_state::buffer_state::{
    BufferStats, ChunkBufferStore, HostBufferStore, WgpuBufferStore,
};
pub use engine_state::voxels::chunk::chunk_coordinate::ChunkCoordinate;
pub use engine_state::{ChunkState, RenderChunk, World};

/// Installs the `env_logger` backend writing to stdout, filtered by `RUST_LOG`.
///
/// Does nothing if a logger is already installed.
pub fn init_logging() {
    let mut log_builder = env_logger::Builder::new();
    let _ = log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .try_init();
}
