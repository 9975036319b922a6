//! # Block Store
//!
//! Sparse block storage for one chunk. Only occupied positions have an entry; air is the
//! absence of one. The store is the payload registered in the world index, so the
//! streamer and neighbour-visibility queries share it through an
//! [`MtResource`](crate::core::MtResource).

use std::collections::HashMap;

use cgmath::Point3;

use crate::config::WorldConfig;
use crate::engine_state::voxels::block::Block;

/// A block position inside a chunk: `x`, `z` in `[0, width)`, `y` in `[0, height)`.
pub type LocalPosition = Point3<usize>;

/// Fixed chunk extents shared by every chunk of a world.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChunkDimensions {
    /// Width and depth in blocks
    pub width: usize,
    /// Height in blocks
    pub height: usize,
}

impl ChunkDimensions {
    /// Creates chunk extents.
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Extents configured for a world.
    pub fn from_config(config: &WorldConfig) -> Self {
        Self::new(config.chunk_width, config.chunk_height)
    }

    /// Blocks in one horizontal layer.
    pub fn plane_size(&self) -> usize {
        self.width * self.width
    }

    /// Blocks in the whole chunk.
    pub fn volume(&self) -> usize {
        self.plane_size() * self.height
    }

    /// Whether a signed local position lies inside the chunk.
    pub fn contains(&self, position: Point3<i32>) -> bool {
        position.x >= 0
            && position.z >= 0
            && position.y >= 0
            && (position.x as usize) < self.width
            && (position.z as usize) < self.width
            && (position.y as usize) < self.height
    }

    /// Whether a local position lies inside the chunk.
    pub fn in_bounds(&self, position: LocalPosition) -> bool {
        position.x < self.width && position.z < self.width && position.y < self.height
    }

    /// Linear key `y * width² + z * width + x` used for visibility masks and mesh order.
    pub fn linear_index(&self, position: LocalPosition) -> usize {
        position.y * self.plane_size() + position.z * self.width + position.x
    }

    /// Inverse of [`ChunkDimensions::linear_index`].
    pub fn position_of(&self, index: usize) -> LocalPosition {
        let y = index / self.plane_size();
        let rest = index % self.plane_size();
        Point3::new(rest % self.width, y, rest / self.width)
    }
}

/// Occupied blocks of one chunk, keyed by local position.
#[derive(Clone, Debug)]
pub struct BlockStore {
    dims: ChunkDimensions,
    blocks: HashMap<LocalPosition, Block>,
}

impl BlockStore {
    /// An empty (all air) store.
    pub fn new(dims: ChunkDimensions) -> Self {
        Self {
            dims,
            blocks: HashMap::new(),
        }
    }

    /// The chunk extents this store addresses.
    pub fn dims(&self) -> ChunkDimensions {
        self.dims
    }

    /// The block at `position`, if occupied.
    pub fn get(&self, position: LocalPosition) -> Option<&Block> {
        self.blocks.get(&position)
    }

    /// Whether `position` is occupied.
    pub fn contains(&self, position: LocalPosition) -> bool {
        self.blocks.contains_key(&position)
    }

    /// Places a block, returning the one it replaced.
    ///
    /// Out-of-bounds positions are a programming error: they assert in debug builds and
    /// are ignored in release builds.
    pub fn insert(&mut self, position: LocalPosition, block: Block) -> Option<Block> {
        if !self.dims.in_bounds(position) {
            debug_assert!(false, "block position {:?} outside {:?}", position, self.dims);
            return None;
        }
        self.blocks.insert(position, block)
    }

    /// Clears `position`, returning the removed block.
    pub fn remove(&mut self, position: LocalPosition) -> Option<Block> {
        self.blocks.remove(&position)
    }

    /// Number of occupied positions.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the chunk is all air.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Occupied positions and their blocks, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (LocalPosition, &Block)> {
        self.blocks.iter().map(|(position, block)| (*position, block))
    }

    /// Highest occupied `y` in column (`x`, `z`).
    pub fn top_y(&self, x: usize, z: usize) -> Option<usize> {
        (0..self.dims.height)
            .rev()
            .find(|y| self.contains(Point3::new(x, *y, z)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::block_type::BlockType;

    #[test]
    fn linear_index_round_trips() {
        let dims = ChunkDimensions::new(16, 256);
        for index in [0, 1, 15, 16, 255, 256, 4097, dims.volume() - 1] {
            let position = dims.position_of(index);
            assert!(dims.in_bounds(position));
            assert_eq!(dims.linear_index(position), index);
        }
        assert_eq!(dims.linear_index(Point3::new(3, 2, 1)), 2 * 256 + 16 + 3);
    }

    #[test]
    fn signed_bounds_check() {
        let dims = ChunkDimensions::new(16, 128);
        assert!(dims.contains(Point3::new(0, 0, 0)));
        assert!(dims.contains(Point3::new(15, 127, 15)));
        assert!(!dims.contains(Point3::new(-1, 0, 0)));
        assert!(!dims.contains(Point3::new(0, 128, 0)));
        assert!(!dims.contains(Point3::new(0, 0, 16)));
    }

    #[test]
    fn insert_remove_and_top() {
        let mut store = BlockStore::new(ChunkDimensions::new(4, 8));
        assert!(store.is_empty());
        store.insert(Point3::new(1, 2, 3), Block::new(BlockType::STONE));
        store.insert(Point3::new(1, 5, 3), Block::new(BlockType::GRASS));
        assert_eq!(store.len(), 2);
        assert_eq!(store.top_y(1, 3), Some(5));
        assert_eq!(store.top_y(0, 0), None);
        assert_eq!(
            store.remove(Point3::new(1, 5, 3)).and_then(|b| b.kind()),
            Some(BlockType::GRASS)
        );
        assert_eq!(store.top_y(1, 3), Some(2));
    }
}
