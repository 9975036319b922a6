//! # Voxel Task System
//!
//! Tasks related to world generation. They run on the worker pool and report back to
//! the [`WorldState`](super::world::WorldState) on the main thread.

pub mod chunk_generation_task;
