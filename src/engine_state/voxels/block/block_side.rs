//! # Block Side Module
//!
//! This module defines the six faces of a voxel block and the single face convention
//! shared by visibility masks, mesh serialization and the vertex encoder.
//!
//! | Side     | Normal | Value / mask bit |
//! |----------|--------|------------------|
//! | `TOP`    | +Y     | 0                |
//! | `BOTTOM` | -Y     | 1                |
//! | `FRONT`  | -Z     | 2                |
//! | `RIGHT`  | +X     | 3                |
//! | `BACK`   | +Z     | 4                |
//! | `LEFT`   | -X     | 5                |

use cgmath::Vector3;

/// Represents the six possible faces of a voxel block.
///
/// The discriminant is the face's normal type in the packed vertex and its bit
/// position in a [`FaceMask`](super::face_mask::FaceMask).
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum BlockSide {
    /// The top face (facing positive Y)
    TOP = 0,

    /// The bottom face (facing negative Y)
    BOTTOM = 1,

    /// The front face (facing negative Z)
    FRONT = 2,

    /// The right face (facing positive X)
    RIGHT = 3,

    /// The back face (facing positive Z)
    BACK = 4,

    /// The left face (facing negative X)
    LEFT = 5,
}

impl BlockSide {
    /// Returns all six faces in canonical order.
    ///
    /// This is the order faces are visited when serializing a block's mesh.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::TOP,
            BlockSide::BOTTOM,
            BlockSide::FRONT,
            BlockSide::RIGHT,
            BlockSide::BACK,
            BlockSide::LEFT,
        ]
    }

    /// The four faces that can border another chunk.
    pub fn horizontal() -> [BlockSide; 4] {
        [
            BlockSide::FRONT,
            BlockSide::RIGHT,
            BlockSide::BACK,
            BlockSide::LEFT,
        ]
    }

    /// Converts a normal type back to a side.
    pub fn from_index(index: u32) -> Option<BlockSide> {
        Self::all().get(index as usize).copied()
    }

    /// The face pointing the other way along the same axis.
    pub fn opposite(self) -> BlockSide {
        match self {
            BlockSide::TOP => BlockSide::BOTTOM,
            BlockSide::BOTTOM => BlockSide::TOP,
            BlockSide::FRONT => BlockSide::BACK,
            BlockSide::BACK => BlockSide::FRONT,
            BlockSide::RIGHT => BlockSide::LEFT,
            BlockSide::LEFT => BlockSide::RIGHT,
        }
    }

    /// Unit offset to the block this face touches.
    pub fn normal(self) -> Vector3<i32> {
        match self {
            BlockSide::TOP => Vector3::new(0, 1, 0),
            BlockSide::BOTTOM => Vector3::new(0, -1, 0),
            BlockSide::FRONT => Vector3::new(0, 0, -1),
            BlockSide::RIGHT => Vector3::new(1, 0, 0),
            BlockSide::BACK => Vector3::new(0, 0, 1),
            BlockSide::LEFT => Vector3::new(-1, 0, 0),
        }
    }

    /// Whether this face lies on a chunk's horizontal boundary when the block is on the edge.
    pub fn is_horizontal(self) -> bool {
        !matches!(self, BlockSide::TOP | BlockSide::BOTTOM)
    }
}
