//! Seeded gradient noise.
//!
//! The permutation table holds the values 0..=255 shuffled by the seed and then
//! duplicated, so corner hashes can index up to 511 without wrapping.

use noise::NoiseFn;

/// Number of distinct lattice cells along each axis before the pattern repeats.
pub const PERMUTATION_SIZE: usize = 256;

/// Deterministic Perlin-style gradient noise.
///
/// Two generators built from the same seed produce bit-identical output for the same
/// coordinates, on every run.
#[derive(Clone, Debug)]
pub struct PerlinNoise {
    permutation: [u8; PERMUTATION_SIZE * 2],
}

impl PerlinNoise {
    /// Builds the permutation table for `seed`.
    pub fn new(seed: u32) -> Self {
        let mut table = [0u8; PERMUTATION_SIZE];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = i as u8;
        }

        let mut rng = fastrand::Rng::with_seed(u64::from(seed));
        rng.shuffle(&mut table);

        let mut permutation = [0u8; PERMUTATION_SIZE * 2];
        permutation[..PERMUTATION_SIZE].copy_from_slice(&table);
        permutation[PERMUTATION_SIZE..].copy_from_slice(&table);

        Self { permutation }
    }

    /// The duplicated 512-entry permutation table.
    pub fn permutation(&self) -> &[u8; PERMUTATION_SIZE * 2] {
        &self.permutation
    }

    #[inline]
    pub(super) fn p(&self, index: usize) -> usize {
        self.permutation[index] as usize
    }

    /// Samples noise at a point. The result lies in `[-1, 1]`.
    pub fn noise(&self, x: f64, y: f64, z: f64) -> f64 {
        let (xi, xf) = lattice(x);
        let (yi, yf) = lattice(y);
        let (zi, zf) = lattice(z);

        let u = fade(xf);
        let v = fade(yf);
        let w = fade(zf);

        let a = self.p(xi) + yi;
        let aa = self.p(a) + zi;
        let ab = self.p(a + 1) + zi;
        let b = self.p(xi + 1) + yi;
        let ba = self.p(b) + zi;
        let bb = self.p(b + 1) + zi;

        let corners = [
            grad(self.p(aa), xf, yf, zf),
            grad(self.p(ba), xf - 1.0, yf, zf),
            grad(self.p(ab), xf, yf - 1.0, zf),
            grad(self.p(bb), xf - 1.0, yf - 1.0, zf),
            grad(self.p(aa + 1), xf, yf, zf - 1.0),
            grad(self.p(ba + 1), xf - 1.0, yf, zf - 1.0),
            grad(self.p(ab + 1), xf, yf - 1.0, zf - 1.0),
            grad(self.p(bb + 1), xf - 1.0, yf - 1.0, zf - 1.0),
        ];

        trilinear(u, v, w, &corners).clamp(-1.0, 1.0)
    }

    /// Sums `octaves` samples at doubling frequency and decaying amplitude, normalized
    /// by the total amplitude so the result stays in `[-1, 1]`.
    #[allow(clippy::too_many_arguments)]
    pub fn fractal_noise(
        &self,
        x: f64,
        y: f64,
        z: f64,
        octaves: u32,
        persistence: f64,
        amplitude: f64,
        frequency: f64,
    ) -> f64 {
        let mut total = 0.0;
        let mut amplitude_sum = 0.0;
        let mut amplitude = amplitude;
        let mut frequency = frequency;

        for _ in 0..octaves {
            total += self.noise(x * frequency, y * frequency, z * frequency) * amplitude;
            amplitude_sum += amplitude;
            amplitude *= persistence;
            frequency *= 2.0;
        }

        normalize(total, amplitude_sum)
    }
}

impl NoiseFn<f64, 3> for PerlinNoise {
    fn get(&self, point: [f64; 3]) -> f64 {
        self.noise(point[0], point[1], point[2])
    }
}

/// Splits a coordinate into its wrapped lattice cell and fractional offset.
#[inline]
pub(super) fn lattice(coordinate: f64) -> (usize, f64) {
    let floor = coordinate.floor();
    (((floor as i64) & 255) as usize, coordinate - floor)
}

/// `6t^5 - 15t^4 + 10t^3`
#[inline]
pub(super) fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
pub(super) fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

/// Dot product of the offset with one of 12 edge gradients picked by the low hash bits.
#[inline]
pub(super) fn grad(hash: usize, x: f64, y: f64, z: f64) -> f64 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        z
    };
    (if h & 1 == 0 { u } else { -u }) + (if h & 2 == 0 { v } else { -v })
}

/// Corner order: (x,y,z) bits 000, 100, 010, 110, 001, 101, 011, 111.
#[inline]
pub(super) fn trilinear(u: f64, v: f64, w: f64, corners: &[f64; 8]) -> f64 {
    lerp(
        w,
        lerp(
            v,
            lerp(u, corners[0], corners[1]),
            lerp(u, corners[2], corners[3]),
        ),
        lerp(
            v,
            lerp(u, corners[4], corners[5]),
            lerp(u, corners[6], corners[7]),
        ),
    )
}

#[inline]
pub(super) fn normalize(total: f64, amplitude_sum: f64) -> f64 {
    if amplitude_sum == 0.0 {
        0.0
    } else {
        total / amplitude_sum
    }
}
