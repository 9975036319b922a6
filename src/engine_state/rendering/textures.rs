//! Texture layer and tint lookup for block faces.
//!
//! Mesh building only needs, per block type and face, the texture array layer and an
//! RGBA tint. Both come from a [`TextureLookup`] passed into the build, so tests and
//! alternative resource packs can supply their own tables.

use phf::phf_map;

use crate::engine_state::voxels::block::block_side::BlockSide;
use crate::engine_state::voxels::block::block_type::BlockType;
use crate::engine_state::voxels::block::BlockTypeSize;

use super::vertex::pack_rgba;

/// Untinted white.
pub const NO_TINT: u32 = pack_rgba(255, 255, 255, 255);

const GRASS_TINT: u32 = pack_rgba(124, 189, 107, 255);

const STONE_LAYER: u8 = 0;
const DIRT_LAYER: u8 = 1;
const GRASS_TOP_LAYER: u8 = 2;
const GRASS_SIDE_LAYER: u8 = 3;

/// Per-face texture layers and tints of one block type, indexed by [`BlockSide`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlockTexture {
    /// Texture array layer for each face
    pub layers: [u8; 6],
    /// Packed RGBA tint for each face
    pub tints: [u32; 6],
}

impl BlockTexture {
    /// The same layer on every face, untinted.
    pub const fn uniform(layer: u8) -> Self {
        Self {
            layers: [layer; 6],
            tints: [NO_TINT; 6],
        }
    }

    /// Layer of `side`.
    pub fn layer(&self, side: BlockSide) -> u8 {
        self.layers[side as usize]
    }

    /// Tint of `side`.
    pub fn tint(&self, side: BlockSide) -> u32 {
        self.tints[side as usize]
    }
}

/// Source of face textures consumed by mesh building.
pub trait TextureLookup: Send + Sync {
    /// Textures of `block_type`.
    fn texture(&self, block_type: BlockType) -> BlockTexture;
}

static BLOCK_TEXTURES: phf::Map<BlockTypeSize, BlockTexture> = phf_map! {
    1u8 => BlockTexture::uniform(STONE_LAYER),
    2u8 => BlockTexture::uniform(DIRT_LAYER),
    // TOP, BOTTOM, FRONT, RIGHT, BACK, LEFT
    3u8 => BlockTexture {
        layers: [
            GRASS_TOP_LAYER,
            DIRT_LAYER,
            GRASS_SIDE_LAYER,
            GRASS_SIDE_LAYER,
            GRASS_SIDE_LAYER,
            GRASS_SIDE_LAYER,
        ],
        tints: [GRASS_TINT, NO_TINT, NO_TINT, NO_TINT, NO_TINT, NO_TINT],
    },
};

/// The built-in texture table.
#[derive(Copy, Clone, Debug, Default)]
pub struct BlockTextures;

impl TextureLookup for BlockTextures {
    fn texture(&self, block_type: BlockType) -> BlockTexture {
        BLOCK_TEXTURES
            .get(&block_type.tag())
            .copied()
            .unwrap_or(BlockTexture::uniform(STONE_LAYER))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::rendering::vertex::{unpack_rgba, MAX_TEXTURE_LAYER};

    #[test]
    fn every_block_type_has_an_entry() {
        for block_type in [BlockType::STONE, BlockType::DIRT, BlockType::GRASS] {
            assert!(BLOCK_TEXTURES.contains_key(&block_type.tag()));
            let texture = BlockTextures.texture(block_type);
            assert!(texture.layers.iter().all(|l| u32::from(*l) <= MAX_TEXTURE_LAYER));
        }
    }

    #[test]
    fn only_grass_tops_are_tinted() {
        let grass = BlockTextures.texture(BlockType::GRASS);
        assert_eq!(grass.layer(BlockSide::TOP), GRASS_TOP_LAYER);
        assert_eq!(grass.layer(BlockSide::BOTTOM), DIRT_LAYER);
        let [r, g, b, a] = unpack_rgba(grass.tint(BlockSide::TOP));
        assert!(g > r && g > b);
        assert_eq!(a, 255);
        assert_eq!(grass.tint(BlockSide::RIGHT), NO_TINT);
        assert_eq!(BlockTextures.texture(BlockType::STONE).tints, [NO_TINT; 6]);
    }
}
