//! Coherent noise field

use std::collections::BTreeMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{ColorSpec, Contribution, Deltas, EffectorInput, SeedSource};
use crate::clamp01;
use crate::cloner::noise::NoiseSampler;
use crate::consts::{NOISE_POSITION_OFFSET, NOISE_ROTATION_OFFSET, NOISE_SCALE_OFFSET, NOISE_SEED_BIAS};

/// Sampling frequency, uniform or per axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Frequency {
    Uniform(f32),
    PerAxis(Vec3),
}

impl Default for Frequency {
    fn default() -> Self {
        Frequency::Uniform(1.0)
    }
}

impl Frequency {
    pub fn as_vec3(&self) -> Vec3 {
        match self {
            Frequency::Uniform(f) => Vec3::splat(*f),
            Frequency::PerAxis(v) => *v,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NoiseEffector {
    pub enabled: bool,
    pub seed: SeedSource,
    pub strength: f32,
    pub frequency: Frequency,
    /// Shift of the sample point in noise space
    pub offset: Vec3,
    #[serde(flatten)]
    pub deltas: Deltas,
    pub hidden: bool,
    pub hide_threshold: f32,
    pub color: Option<ColorSpec>,
    pub material_colors: BTreeMap<String, ColorSpec>,
}

impl Default for NoiseEffector {
    fn default() -> Self {
        Self {
            enabled: true,
            seed: SeedSource::default(),
            strength: 1.0,
            frequency: Frequency::default(),
            offset: Vec3::ZERO,
            deltas: Deltas::default(),
            hidden: false,
            hide_threshold: 0.5,
            color: None,
            material_colors: BTreeMap::new(),
        }
    }
}

impl NoiseEffector {
    /// Base sample point for a clone
    pub fn sample_point(&self, local_position: Vec3, seed: u32) -> [f64; 3] {
        let p = local_position * self.frequency.as_vec3() + self.offset;
        let bias = (seed % 1024) as f64 * NOISE_SEED_BIAS;
        [p.x as f64 + bias, p.y as f64 + bias, p.z as f64 + bias]
    }

    pub fn apply<'a>(&'a self, input: &EffectorInput<'_>, noise: &dyn NoiseSampler, acc: &mut Contribution<'a>) {
        let p = self.sample_point(input.cell.local_position, input.seed);
        let shifted = |o: [f64; 3]| [p[0] + o[0], p[1] + o[1], p[2] + o[2]];

        let base = noise.sample(input.seed, p) as f32;
        let weights = [
            noise.sample(input.seed, shifted(NOISE_POSITION_OFFSET)) as f32 * self.strength,
            noise.sample(input.seed, shifted(NOISE_ROTATION_OFFSET)) as f32 * self.strength,
            noise.sample(input.seed, shifted(NOISE_SCALE_OFFSET)) as f32 * self.strength,
        ];
        acc.add_split(&self.deltas, weights, input.unit);

        let normalized = clamp01((base + 1.0) / 2.0);
        if self.hidden && normalized >= self.hide_threshold {
            acc.hidden = true;
        }
        let gate = normalized <= self.strength;
        if let Some(color) = &self.color {
            acc.paint(color.pick(normalized, gate));
        }
        for (key, color) in &self.material_colors {
            acc.paint_material(key, color.pick(normalized, gate));
        }
    }
}
