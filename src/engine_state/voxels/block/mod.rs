//! # Block Module
//!
//! Block data, block types, face naming and per-block visibility masks.

use block_type::BlockType;

pub mod block_side;
pub mod block_type;
pub mod face_mask;

/// The underlying integer type used to represent block types in memory.
pub type BlockTypeSize = u8;

/// Light falloff carried by every generated block.
pub const DEFAULT_LIGHT_FALLOFF: u8 = 1;

/// Represents a single solid voxel.
///
/// Blocks only exist for occupied positions; air is the absence of a `Block`.
///
/// # Memory Layout
/// The `#[repr(C)]` attribute keeps the two bytes tightly packed so block sets can be
/// copied as plain data.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug, PartialEq, Eq)]
pub struct Block {
    /// The type of this block, encoded as a `BlockTypeSize` for compact storage.
    pub block_type: BlockTypeSize,
    /// How much light is lost passing next to this block.
    pub light_falloff: u8,
}

impl Block {
    /// Creates a new block of the specified type.
    pub fn new(block_type: BlockType) -> Self {
        Block {
            block_type: block_type.tag(),
            light_falloff: DEFAULT_LIGHT_FALLOFF,
        }
    }

    /// The decoded block type, `None` if the tag is corrupt.
    pub fn kind(&self) -> Option<BlockType> {
        BlockType::from_tag(self.block_type)
    }
}
