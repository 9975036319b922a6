//! Packed vertex format for chunk meshes.
//!
//! Every vertex is two 32-bit words. The first carries the block's chunk-local position
//! and face attributes, the second a per-face RGBA tint:
//!
//! | Bits  | Word 1 field         |
//! |-------|----------------------|
//! | 0-4   | local X              |
//! | 5-9   | local Z              |
//! | 10-17 | local Y              |
//! | 18-20 | texture layer        |
//! | 21    | U                    |
//! | 22    | V                    |
//! | 23-25 | normal type (face)   |
//!
//! The shader derives the corner from the block position, the face and (U, V); see
//! [`corner_offset`](super::meshing::face::corner_offset).

const X_SHIFT: u32 = 0;
const Z_SHIFT: u32 = 5;
const Y_SHIFT: u32 = 10;
const LAYER_SHIFT: u32 = 18;
const U_SHIFT: u32 = 21;
const V_SHIFT: u32 = 22;
const NORMAL_SHIFT: u32 = 23;

const HORIZONTAL_MASK: u32 = 0x1F;
const Y_MASK: u32 = 0xFF;
const LAYER_MASK: u32 = 0x7;
const UV_MASK: u32 = 0x1;
const NORMAL_MASK: u32 = 0x7;

/// Largest texture layer the encoding can address.
pub const MAX_TEXTURE_LAYER: u32 = LAYER_MASK;

/// The unpacked fields of a vertex's first word.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct VertexAttributes {
    /// Local block X, 0-31
    pub x: u32,
    /// Local block Z, 0-31
    pub z: u32,
    /// Local block Y, 0-255
    pub y: u32,
    /// Texture array layer, 0-7
    pub texture_layer: u32,
    /// Horizontal texture coordinate, 0 or 1
    pub u: u32,
    /// Vertical texture coordinate, 0 or 1
    pub v: u32,
    /// Face direction, 0-5, see [`BlockSide`](crate::engine_state::voxels::block::block_side::BlockSide)
    pub normal: u32,
}

impl VertexAttributes {
    /// Packs the fields into word 1. Out-of-range values are truncated to their field width.
    pub fn pack(&self) -> u32 {
        debug_assert!(self.x <= HORIZONTAL_MASK && self.z <= HORIZONTAL_MASK);
        debug_assert!(self.y <= Y_MASK && self.texture_layer <= LAYER_MASK);
        debug_assert!(self.u <= UV_MASK && self.v <= UV_MASK && self.normal < 6);

        ((self.x & HORIZONTAL_MASK) << X_SHIFT)
            | ((self.z & HORIZONTAL_MASK) << Z_SHIFT)
            | ((self.y & Y_MASK) << Y_SHIFT)
            | ((self.texture_layer & LAYER_MASK) << LAYER_SHIFT)
            | ((self.u & UV_MASK) << U_SHIFT)
            | ((self.v & UV_MASK) << V_SHIFT)
            | ((self.normal & NORMAL_MASK) << NORMAL_SHIFT)
    }

    /// Decodes word 1.
    pub fn unpack(word: u32) -> Self {
        Self {
            x: (word >> X_SHIFT) & HORIZONTAL_MASK,
            z: (word >> Z_SHIFT) & HORIZONTAL_MASK,
            y: (word >> Y_SHIFT) & Y_MASK,
            texture_layer: (word >> LAYER_SHIFT) & LAYER_MASK,
            u: (word >> U_SHIFT) & UV_MASK,
            v: (word >> V_SHIFT) & UV_MASK,
            normal: (word >> NORMAL_SHIFT) & NORMAL_MASK,
        }
    }
}

/// Packs an RGBA tint as `R | G << 8 | B << 16 | A << 24`.
pub const fn pack_rgba(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (r as u32) | (g as u32) << 8 | (b as u32) << 16 | (a as u32) << 24
}

/// Splits a packed tint into `[r, g, b, a]`.
pub const fn unpack_rgba(tint: u32) -> [u8; 4] {
    [
        tint as u8,
        (tint >> 8) as u8,
        (tint >> 16) as u8,
        (tint >> 24) as u8,
    ]
}

/// A vertex as uploaded to the GPU.
///
/// # Memory Layout
/// - Word 1: packed position and face attributes (4 bytes)
/// - Word 2: packed RGBA tint (4 bytes)
///
/// Total size: 8 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PackedVertex {
    words: [u32; 2],
}

impl PackedVertex {
    /// Packs a vertex.
    pub fn new(attributes: VertexAttributes, tint: u32) -> Self {
        PackedVertex {
            words: [attributes.pack(), tint],
        }
    }

    /// The raw words.
    pub fn words(&self) -> [u32; 2] {
        self.words
    }

    /// The decoded first word.
    pub fn attributes(&self) -> VertexAttributes {
        VertexAttributes::unpack(self.words[0])
    }

    /// The packed RGBA tint.
    pub fn tint(&self) -> u32 {
        self.words[1]
    }

    /// Returns the vertex buffer layout description for the shader pipeline.
    ///
    /// # Shader Attributes
    /// - `location = 0`: packed position/face word (u32)
    /// - `location = 1`: packed tint (u32)
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] = [
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Uint32,
            },
            wgpu::VertexAttribute {
                offset: std::mem::size_of::<u32>() as wgpu::BufferAddress,
                shader_location: 1,
                format: wgpu::VertexFormat::Uint32,
            },
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PackedVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_field_round_trips_at_its_extremes() {
        for x in [0, 1, 16, 31] {
            for z in [0, 7, 31] {
                for y in [0, 1, 128, 255] {
                    for texture_layer in 0..=7 {
                        for u in 0..=1 {
                            for v in 0..=1 {
                                for normal in 0..6 {
                                    let attributes = VertexAttributes {
                                        x,
                                        z,
                                        y,
                                        texture_layer,
                                        u,
                                        v,
                                        normal,
                                    };
                                    assert_eq!(VertexAttributes::unpack(attributes.pack()), attributes);
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn fields_land_on_documented_bits() {
        let word = VertexAttributes {
            x: 1,
            z: 1,
            y: 1,
            texture_layer: 1,
            u: 1,
            v: 1,
            normal: 1,
        }
        .pack();
        assert_eq!(word, 1 | 1 << 5 | 1 << 10 | 1 << 18 | 1 << 21 | 1 << 22 | 1 << 23);
        assert!(VertexAttributes {
            x: 31,
            z: 31,
            y: 255,
            texture_layer: 7,
            u: 1,
            v: 1,
            normal: 5,
        }
        .pack()
            < 1 << 26);
    }

    #[test]
    fn rgba_packing_is_little_endian_by_channel() {
        let tint = pack_rgba(0x11, 0x22, 0x33, 0x44);
        assert_eq!(tint, 0x4433_2211);
        assert_eq!(unpack_rgba(tint), [0x11, 0x22, 0x33, 0x44]);
    }

    #[test]
    fn packed_vertex_is_two_words() {
        assert_eq!(std::mem::size_of::<PackedVertex>(), 8);
        let vertex = PackedVertex::new(VertexAttributes::default(), pack_rgba(1, 2, 3, 4));
        assert_eq!(vertex.words()[1], vertex.tint());
        assert_eq!(bytemuck::cast_slice::<PackedVertex, u32>(&[vertex]).len(), 2);
    }
}
