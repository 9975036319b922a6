//! Chunk grid addressing.

use std::fmt;

use cgmath::Point3;

use crate::engine_state::voxels::block::block_side::BlockSide;

/// Position of a chunk column in the infinite chunk grid.
///
/// One unit is one chunk width in world space.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ChunkCoordinate {
    /// Grid position along world X
    pub x: i32,
    /// Grid position along world Z
    pub z: i32,
}

impl ChunkCoordinate {
    /// Creates a coordinate.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The chunk containing world-space position (`x`, `z`).
    pub fn from_world_position(x: f64, z: f64, chunk_width: usize) -> Self {
        let width = chunk_width as f64;
        Self {
            x: (x / width).floor() as i32,
            z: (z / width).floor() as i32,
        }
    }

    /// The coordinate shifted by (`dx`, `dz`) chunks, saturating at the edge of the grid.
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            z: self.z.saturating_add(dz),
        }
    }

    /// The coordinate pulled at least `margin` chunks inside the edges of the grid, so
    /// that every coordinate within `margin` of it is distinct and addressable.
    pub fn clamped_to_grid(self, margin: i32) -> Self {
        let margin = margin.clamp(0, i32::MAX / 2);
        let (low, high) = (i32::MIN + margin, i32::MAX - margin);
        Self {
            x: self.x.clamp(low, high),
            z: self.z.clamp(low, high),
        }
    }

    /// The adjacent chunk across `side`. Vertical sides have no neighbour and return `self`.
    pub fn neighbor(self, side: BlockSide) -> Self {
        let normal = side.normal();
        self.offset(normal.x, normal.z)
    }

    /// World-space position of the chunk's (0, 0, 0) block.
    pub fn origin(self, chunk_width: usize) -> Point3<i32> {
        let width = chunk_width as i32;
        Point3::new(self.x.saturating_mul(width), 0, self.z.saturating_mul(width))
    }

    /// Distance in the square (Chebyshev) metric used for streaming windows.
    pub fn chebyshev_distance(self, other: ChunkCoordinate) -> i32 {
        let dx = self.x.saturating_sub(other.x).saturating_abs();
        let dz = self.z.saturating_sub(other.z).saturating_abs();
        dx.max(dz)
    }
}

impl fmt::Display for ChunkCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}
