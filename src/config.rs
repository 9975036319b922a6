//! # World Configuration
//!
//! Every tunable the world subsystem consumes: chunk dimensions, streaming radii,
//! terrain shape and noise parameters. Values are supplied from outside (JSON file or
//! code); nothing in the chunk, noise or streaming logic hardcodes them.
//!
//! ```
//! use voxel_world::config::WorldConfig;
//!
//! let config = WorldConfig::from_json_str(r#"{ "seed": 7, "visible_radius": 2 }"#).unwrap();
//! assert_eq!(config.seed, 7);
//! assert_eq!(config.chunk_width, 16);
//! ```

use std::path::Path;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

/// Largest chunk width the vertex encoding can address (5 bits per horizontal axis).
pub const MAX_CHUNK_WIDTH: usize = 32;
/// Largest chunk height the vertex encoding can address (8 bits of Y).
pub const MAX_CHUNK_HEIGHT: usize = 256;

/// Parameters of the fractal (multi-octave) noise used for the height field.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    /// Number of octaves summed per sample
    pub octaves: u32,
    /// Amplitude multiplier applied per octave
    pub persistence: f64,
    /// Amplitude of the first octave
    pub amplitude: f64,
    /// Frequency of the first octave; doubled each octave
    pub frequency: f64,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            octaves: 4,
            persistence: 0.5,
            amplitude: 1.0,
            frequency: 1.0,
        }
    }
}

/// Configuration for a streamed voxel world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Width and depth of a chunk in blocks
    pub chunk_width: usize,
    /// Height of a chunk in blocks
    pub chunk_height: usize,
    /// Chebyshev radius (in chunks) of the window that must be resident and drawn
    pub visible_radius: i32,
    /// Extra ring of chunks kept resident beyond the visible window
    pub retention_margin: i32,
    /// Terrain height offset in blocks
    pub base_height: f64,
    /// Scale applied to the fractal noise sample before offsetting by `base_height`
    pub height_amplitude: f64,
    /// Inverse scale applied to world-space column coordinates before sampling noise
    pub horizontal_scale: f64,
    /// Seed of the permutation table
    pub seed: u32,
    /// Fractal noise parameters
    pub noise: NoiseSettings,
    /// Worker thread count; `None` uses the available hardware parallelism
    pub worker_threads: Option<usize>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunk_width: 16,
            chunk_height: 256,
            visible_radius: 4,
            retention_margin: 1,
            base_height: 100.0,
            height_amplitude: 24.0,
            horizontal_scale: 1.0 / 96.0,
            seed: 44,
            noise: NoiseSettings::default(),
            worker_threads: None,
        }
    }
}

impl WorldConfig {
    /// Parses a configuration from JSON. Missing fields take their default values.
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let config: WorldConfig =
            serde_json::from_str(json).context("Failed to parse world configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read world configuration {}", path.display()))?;
        Self::from_json_str(&contents)
            .with_context(|| format!("Invalid world configuration {}", path.display()))
    }

    /// Rejects values the chunk storage or the vertex encoding cannot represent.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.chunk_width == 0 || self.chunk_width > MAX_CHUNK_WIDTH {
            bail!(
                "chunk_width must be in 1..={}, got {}",
                MAX_CHUNK_WIDTH,
                self.chunk_width
            );
        }
        if self.chunk_height == 0 || self.chunk_height > MAX_CHUNK_HEIGHT {
            bail!(
                "chunk_height must be in 1..={}, got {}",
                MAX_CHUNK_HEIGHT,
                self.chunk_height
            );
        }
        if self.visible_radius < 0 || self.retention_margin < 0 {
            bail!("visible_radius and retention_margin must not be negative");
        }
        if self.noise.octaves == 0 {
            bail!("noise.octaves must be at least 1");
        }
        if !(self.noise.persistence > 0.0 && self.noise.persistence <= 1.0) {
            bail!(
                "noise.persistence must be in (0, 1], got {}",
                self.noise.persistence
            );
        }
        if !(self.horizontal_scale > 0.0) || !self.horizontal_scale.is_finite() {
            bail!("horizontal_scale must be a positive finite number");
        }
        if self.worker_threads == Some(0) {
            bail!("worker_threads must be at least 1 when set");
        }
        Ok(())
    }

    /// Chebyshev radius of the retention window.
    pub fn retention_radius(&self) -> i32 {
        self.visible_radius.saturating_add(self.retention_margin)
    }

    /// Number of worker threads to spawn.
    pub fn worker_count(&self) -> usize {
        self.worker_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }
}
