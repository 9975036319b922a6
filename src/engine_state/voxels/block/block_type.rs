//! # Block Type Module
//!
//! This module defines the different types of blocks in the voxel world.
//! Air is not a block type: empty space is represented by the absence of a block.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use super::BlockTypeSize;

/// Enumerates all block types that can occupy a position.
///
/// The `FromPrimitive` derive allows conversion from the compact integer tag
/// stored in [`Block`](super::Block).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u8)]
pub enum BlockType {
    /// Bulk terrain below the surface layers.
    STONE = 1,

    /// Plain dirt, placed by edits.
    DIRT = 2,

    /// Surface layers of generated terrain; the top face is tinted green.
    GRASS = 3,
}

impl BlockType {
    /// Converts a compact tag back to a `BlockType`, `None` for unknown tags.
    pub fn from_tag(tag: BlockTypeSize) -> Option<Self> {
        FromPrimitive::from_u8(tag)
    }

    /// The compact tag stored in a [`Block`](super::Block).
    pub fn tag(self) -> BlockTypeSize {
        self as BlockTypeSize
    }
}
