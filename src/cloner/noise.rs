//! Coherent 3D noise sampling

use libnoise::{Generator, Source};

/// Deterministic, continuous 3D noise in roughly [-1, 1]
pub trait NoiseSampler {
    fn sample(&self, seed: u32, point: [f64; 3]) -> f64;
}

/// Perlin gradient noise backed by `libnoise`
#[derive(Debug, Clone, Copy, Default)]
pub struct PerlinNoise;

impl NoiseSampler for PerlinNoise {
    fn sample(&self, seed: u32, point: [f64; 3]) -> f64 {
        // The unit scale pins the generator to three dimensions
        let generator = Source::perlin(seed as u64).scale([1.0; 3]);
        generator.sample(point).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let noise = PerlinNoise;
        let a = noise.sample(3, [0.3, 1.7, -2.2]);
        let b = noise.sample(3, [0.3, 1.7, -2.2]);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn test_range_and_continuity() {
        let noise = PerlinNoise;
        let mut prev = noise.sample(9, [0.0, 0.5, 0.25]);
        for i in 1..200 {
            let x = i as f64 * 0.01;
            let v = noise.sample(9, [x, 0.5, 0.25]);
            assert!((-1.0..=1.0).contains(&v));
            assert!((v - prev).abs() < 0.2, "jump at x={}", x);
            prev = v;
        }
    }
}
