//! # Chunk Creation Module
//!
//! Terrain generation from a fractal noise height field.
//!
//! Each `(x, z)` column samples fractal noise at its world-space position scaled by
//! `horizontal_scale`, maps the sample to a height
//! `H = trunc(sample * height_amplitude + base_height)` clamped to the chunk height, and
//! fills `y` in `[0, H)`. The top [`GRASS_DEPTH`] layers are grass, the rest stone.
//!
//! A chunk's terrain depends only on its coordinate and the generator, never on which
//! other chunks exist, so chunks can be generated in any order on any thread.

use std::sync::Arc;

use cgmath::Point3;

use crate::config::WorldConfig;
use crate::engine_state::voxels::block::{block_type::BlockType, Block};
use crate::engine_state::voxels::noise::{FractalNoise, PerlinNoise, LANES};

use super::block_store::{BlockStore, ChunkDimensions};
use super::chunk_coordinate::ChunkCoordinate;

/// Number of grass layers at the top of each column.
pub const GRASS_DEPTH: usize = 3;

/// The `y` coordinate at which the 2D height field is sampled from 3D noise.
const HEIGHT_FIELD_SAMPLE_Y: f64 = 0.5;

/// Builds the block set of a chunk from its coordinate.
///
/// Cheap to clone; the permutation table is shared.
#[derive(Clone, Debug)]
pub struct TerrainGenerator {
    fractal: FractalNoise,
    dims: ChunkDimensions,
    base_height: f64,
    height_amplitude: f64,
    horizontal_scale: f64,
}

impl TerrainGenerator {
    /// Creates a generator sampling `noise` with the terrain parameters of `config`.
    pub fn new(noise: Arc<PerlinNoise>, config: &WorldConfig) -> Self {
        Self {
            fractal: FractalNoise::new(noise, config.noise),
            dims: ChunkDimensions::from_config(config),
            base_height: config.base_height,
            height_amplitude: config.height_amplitude,
            horizontal_scale: config.horizontal_scale,
        }
    }

    /// Creates a generator with its own permutation table seeded from `config.seed`.
    pub fn from_config(config: &WorldConfig) -> Self {
        Self::new(Arc::new(PerlinNoise::new(config.seed)), config)
    }

    /// The extents of generated chunks.
    pub fn dims(&self) -> ChunkDimensions {
        self.dims
    }

    /// Terrain height of the column at world block position (`world_x`, `world_z`).
    pub fn column_height(&self, world_x: i64, world_z: i64) -> usize {
        let sample = self.fractal.sample(
            world_x as f64 * self.horizontal_scale,
            HEIGHT_FIELD_SAMPLE_Y,
            world_z as f64 * self.horizontal_scale,
        );
        self.height_from_sample(sample)
    }

    /// Column heights of a chunk, indexed `z * width + x`, sampled eight columns at a time.
    pub fn height_field(&self, coordinate: ChunkCoordinate) -> Vec<usize> {
        let width = self.dims.width;
        // World-space block origin, widened so chunks near the grid edge stay distinct.
        let (origin_x, origin_z) = (
            i64::from(coordinate.x) * width as i64,
            i64::from(coordinate.z) * width as i64,
        );
        let columns = self.dims.plane_size();
        let mut heights = Vec::with_capacity(columns);

        let column_indices: Vec<usize> = (0..columns).collect();
        for batch in column_indices.chunks(LANES) {
            // Short final batches repeat their last column; the extra lanes are dropped.
            let lane_column = |lane: usize| batch[lane.min(batch.len() - 1)];
            let xs: [f64; LANES] = std::array::from_fn(|lane| {
                let column = lane_column(lane);
                (origin_x + (column % width) as i64) as f64 * self.horizontal_scale
            });
            let zs: [f64; LANES] = std::array::from_fn(|lane| {
                let column = lane_column(lane);
                (origin_z + (column / width) as i64) as f64 * self.horizontal_scale
            });
            let ys = [HEIGHT_FIELD_SAMPLE_Y; LANES];

            let samples = self.fractal.sample8(&xs, &ys, &zs);
            heights.extend(
                samples[..batch.len()]
                    .iter()
                    .map(|sample| self.height_from_sample(*sample)),
            );
        }

        heights
    }

    /// Generates the block set of the chunk at `coordinate`.
    pub fn generate(&self, coordinate: ChunkCoordinate) -> BlockStore {
        let width = self.dims.width;
        let heights = self.height_field(coordinate);
        let mut store = BlockStore::new(self.dims);

        for z in 0..width {
            for x in 0..width {
                let column_height = heights[z * width + x];
                let grass_start = column_height.saturating_sub(GRASS_DEPTH);
                for y in 0..column_height {
                    let block_type = if y >= grass_start {
                        BlockType::GRASS
                    } else {
                        BlockType::STONE
                    };
                    store.insert(Point3::new(x, y, z), Block::new(block_type));
                }
            }
        }

        store
    }

    fn height_from_sample(&self, sample: f64) -> usize {
        let height = (sample * self.height_amplitude + self.base_height).trunc();
        height.clamp(0.0, self.dims.height as f64) as usize
    }
}
