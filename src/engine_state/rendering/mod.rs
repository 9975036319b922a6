//! Rendering side of the world.
//!
//! Turns chunk visibility into the packed vertex and index buffers handed to the
//! renderer. Drawing itself happens outside this crate; see
//! [`buffer_state`](super::buffer_state) for the hand-off.

pub mod meshing;
pub mod tasks;
pub mod textures;
pub mod vertex;

pub use vertex::PackedVertex;
