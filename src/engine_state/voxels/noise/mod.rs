//! # Noise Module
//!
//! Deterministic gradient noise and its fractal composition, used to build terrain
//! height fields. Generators are explicit values shared by reference (usually behind an
//! `Arc`), never process-wide tables, so parallel generation and tests stay
//! reproducible.
//!
//! * `perlin` - the scalar sampler, the normative contract
//! * `batch` - an eight-lane variant, bit-identical to the scalar path

use std::sync::Arc;

use noise::NoiseFn;

use crate::config::NoiseSettings;

pub mod batch;
pub mod perlin;

pub use batch::LANES;
pub use perlin::PerlinNoise;

/// A [`PerlinNoise`] bound to fixed octave parameters.
#[derive(Clone, Debug)]
pub struct FractalNoise {
    noise: Arc<PerlinNoise>,
    settings: NoiseSettings,
}

impl FractalNoise {
    /// Binds `settings` to a shared generator.
    pub fn new(noise: Arc<PerlinNoise>, settings: NoiseSettings) -> Self {
        Self { noise, settings }
    }

    /// The octave parameters in use.
    pub fn settings(&self) -> &NoiseSettings {
        &self.settings
    }

    /// Samples one point.
    pub fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        let s = &self.settings;
        self.noise
            .fractal_noise(x, y, z, s.octaves, s.persistence, s.amplitude, s.frequency)
    }

    /// Samples eight points at once.
    pub fn sample8(&self, x: &[f64; LANES], y: &[f64; LANES], z: &[f64; LANES]) -> [f64; LANES] {
        let s = &self.settings;
        self.noise
            .fractal_noise8(x, y, z, s.octaves, s.persistence, s.amplitude, s.frequency)
    }
}

impl NoiseFn<f64, 3> for FractalNoise {
    fn get(&self, point: [f64; 3]) -> f64 {
        self.sample(point[0], point[1], point[2])
    }
}
