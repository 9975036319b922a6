//! Eight-lane noise sampling.
//!
//! Each stage of the scalar sampler runs over all lanes before the next one starts,
//! which lets the compiler vectorize the arithmetic. Every lane performs exactly the
//! scalar operations in the same order, so results are bit-identical to
//! [`PerlinNoise::noise`].

use super::perlin::{fade, grad, lattice, normalize, trilinear, PerlinNoise};

/// Samples computed per batched call.
pub const LANES: usize = 8;

impl PerlinNoise {
    /// Samples eight independent points.
    pub fn noise8(&self, x: &[f64; LANES], y: &[f64; LANES], z: &[f64; LANES]) -> [f64; LANES] {
        let mut cells = [[0usize; 3]; LANES];
        let mut offsets = [[0.0f64; 3]; LANES];
        for lane in 0..LANES {
            let (xi, xf) = lattice(x[lane]);
            let (yi, yf) = lattice(y[lane]);
            let (zi, zf) = lattice(z[lane]);
            cells[lane] = [xi, yi, zi];
            offsets[lane] = [xf, yf, zf];
        }

        let mut weights = [[0.0f64; 3]; LANES];
        for lane in 0..LANES {
            let [xf, yf, zf] = offsets[lane];
            weights[lane] = [fade(xf), fade(yf), fade(zf)];
        }

        let mut hashes = [[0usize; 8]; LANES];
        for lane in 0..LANES {
            let [xi, yi, zi] = cells[lane];
            let a = self.p(xi) + yi;
            let aa = self.p(a) + zi;
            let ab = self.p(a + 1) + zi;
            let b = self.p(xi + 1) + yi;
            let ba = self.p(b) + zi;
            let bb = self.p(b + 1) + zi;
            hashes[lane] = [
                self.p(aa),
                self.p(ba),
                self.p(ab),
                self.p(bb),
                self.p(aa + 1),
                self.p(ba + 1),
                self.p(ab + 1),
                self.p(bb + 1),
            ];
        }

        let mut corners = [[0.0f64; 8]; LANES];
        for lane in 0..LANES {
            let [xf, yf, zf] = offsets[lane];
            let h = &hashes[lane];
            corners[lane] = [
                grad(h[0], xf, yf, zf),
                grad(h[1], xf - 1.0, yf, zf),
                grad(h[2], xf, yf - 1.0, zf),
                grad(h[3], xf - 1.0, yf - 1.0, zf),
                grad(h[4], xf, yf, zf - 1.0),
                grad(h[5], xf - 1.0, yf, zf - 1.0),
                grad(h[6], xf, yf - 1.0, zf - 1.0),
                grad(h[7], xf - 1.0, yf - 1.0, zf - 1.0),
            ];
        }

        let mut out = [0.0f64; LANES];
        for lane in 0..LANES {
            let [u, v, w] = weights[lane];
            out[lane] = trilinear(u, v, w, &corners[lane]).clamp(-1.0, 1.0);
        }
        out
    }

    /// Batched [`PerlinNoise::fractal_noise`].
    #[allow(clippy::too_many_arguments)]
    pub fn fractal_noise8(
        &self,
        x: &[f64; LANES],
        y: &[f64; LANES],
        z: &[f64; LANES],
        octaves: u32,
        persistence: f64,
        amplitude: f64,
        frequency: f64,
    ) -> [f64; LANES] {
        let mut total = [0.0f64; LANES];
        let mut amplitude_sum = 0.0;
        let mut amplitude = amplitude;
        let mut frequency = frequency;

        for _ in 0..octaves {
            let xs = x.map(|value| value * frequency);
            let ys = y.map(|value| value * frequency);
            let zs = z.map(|value| value * frequency);
            let samples = self.noise8(&xs, &ys, &zs);
            for lane in 0..LANES {
                total[lane] += samples[lane] * amplitude;
            }
            amplitude_sum += amplitude;
            amplitude *= persistence;
            frequency *= 2.0;
        }

        total.map(|value| normalize(value, amplitude_sum))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lanes(start: f64, step: f64) -> [f64; LANES] {
        std::array::from_fn(|lane| start + step * lane as f64)
    }

    #[test]
    fn batched_noise_matches_scalar_bits() {
        let noise = PerlinNoise::new(44);
        for batch in 0..64 {
            let base = batch as f64 * 3.7 - 100.0;
            let x = lanes(base, 0.613);
            let y = lanes(base * 0.1, -0.27);
            let z = lanes(-base, 1.91);
            let batched = noise.noise8(&x, &y, &z);
            for lane in 0..LANES {
                let scalar = noise.noise(x[lane], y[lane], z[lane]);
                assert_eq!(batched[lane].to_bits(), scalar.to_bits(), "lane {lane}");
            }
        }
    }

    #[test]
    fn batched_fractal_matches_scalar_bits() {
        let noise = PerlinNoise::new(1234);
        let x = lanes(-7.3, 0.9);
        let y = [0.5; LANES];
        let z = lanes(12.1, -0.45);
        let batched = noise.fractal_noise8(&x, &y, &z, 6, 0.55, 1.5, 0.02);
        for lane in 0..LANES {
            let scalar = noise.fractal_noise(x[lane], y[lane], z[lane], 6, 0.55, 1.5, 0.02);
            assert_eq!(batched[lane].to_bits(), scalar.to_bits());
        }
    }

    #[test]
    fn negative_coordinates_wrap_like_scalar() {
        let noise = PerlinNoise::new(3);
        let x = lanes(-300.25, -64.5);
        let batched = noise.noise8(&x, &x, &x);
        for lane in 0..LANES {
            assert_eq!(
                batched[lane].to_bits(),
                noise.noise(x[lane], x[lane], x[lane]).to_bits()
            );
        }
    }
}
