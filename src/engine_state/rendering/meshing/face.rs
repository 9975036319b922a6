//! Quad layout of a single block face: the (u, v) emission order, the two-triangle
//! index pattern and the corner each vertex sits on.

use cgmath::Vector3;

use crate::engine_state::rendering::vertex::{PackedVertex, VertexAttributes};
use crate::engine_state::voxels::block::block_side::BlockSide;
use crate::engine_state::voxels::chunk::block_store::LocalPosition;

/// Vertices emitted per exposed face.
pub const VERTICES_PER_FACE: usize = 4;
/// Indices emitted per exposed face (two triangles).
pub const INDICES_PER_FACE: usize = 6;

/// (U, V) of the four vertices of a face, in emission order.
pub const UV_ORDER: [(u32, u32); VERTICES_PER_FACE] = [(0, 0), (1, 0), (0, 1), (1, 1)];

/// Offsets from a face's first vertex forming its two triangles.
pub const INDEX_PATTERN: [u32; INDICES_PER_FACE] = [0, 1, 2, 3, 2, 1];

/// Offset of the corner at (`u`, `v`) of `side` from the block's minimum corner.
///
/// Every face winds counter-clockwise when seen from outside the block, given
/// [`UV_ORDER`] and [`INDEX_PATTERN`].
pub fn corner_offset(side: BlockSide, u: u32, v: u32) -> Vector3<u32> {
    match side {
        BlockSide::TOP => Vector3::new(u, 1, 1 - v),
        BlockSide::BOTTOM => Vector3::new(u, 0, v),
        BlockSide::FRONT => Vector3::new(1 - u, v, 0),
        BlockSide::RIGHT => Vector3::new(1, v, 1 - u),
        BlockSide::BACK => Vector3::new(u, v, 1),
        BlockSide::LEFT => Vector3::new(0, v, u),
    }
}

/// The four packed vertices of the face of the block at `position` on `side`.
pub fn face_vertices(
    position: LocalPosition,
    side: BlockSide,
    texture_layer: u8,
    tint: u32,
) -> [PackedVertex; VERTICES_PER_FACE] {
    UV_ORDER.map(|(u, v)| {
        PackedVertex::new(
            VertexAttributes {
                x: position.x as u32,
                z: position.z as u32,
                y: position.y as u32,
                texture_layer: u32::from(texture_layer),
                u,
                v,
                normal: side as u32,
            },
            tint,
        )
    })
}

/// Indices of a face whose first vertex is `base_vertex`.
pub fn face_indices(base_vertex: u32) -> [u32; INDICES_PER_FACE] {
    INDEX_PATTERN.map(|offset| base_vertex + offset)
}
