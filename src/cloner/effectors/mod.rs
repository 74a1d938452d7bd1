//! Effector pipeline
//!
//! Effectors run strictly in declared order. Position, rotation and scale
//! contributions are additive across effectors; `hidden` and colors are last
//! writer wins. Each effector's position in the flattened list is its hash
//! salt, so disabled effectors still hold their slot.

pub mod color;
pub mod linear;
pub mod noise_field;
pub mod random;
pub mod time;

use std::collections::BTreeMap;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

pub use color::{ColorCache, ColorSpec};
pub use linear::{Axis, LinearFieldEffector};
pub use noise_field::{Frequency, NoiseEffector};
pub use random::RandomEffector;
pub use time::{LoopMode, TimeEffector};

use super::layout::LayoutCell;
use super::noise::{NoiseSampler, PerlinNoise};
use super::transform::CloneTransform;

/// Per-axis deltas scaled by an effector's weight
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Deltas {
    /// World units (scaled by the grid unit)
    pub position: Vec3,
    /// Radians
    pub rotation: Vec3,
    pub scale: Vec3,
}

/// Effector seed, either fixed or drawn once from the cloner's master seed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedSource {
    Seeded(u32),
    Unseeded,
}

impl Default for SeedSource {
    fn default() -> Self {
        SeedSource::Seeded(0)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SeedRepr {
    Number(f64),
    Name(String),
}

impl Serialize for SeedSource {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SeedSource::Seeded(seed) => SeedRepr::Number(*seed as f64),
            SeedSource::Unseeded => SeedRepr::Name("unseeded".to_string()),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SeedSource {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match SeedRepr::deserialize(deserializer)? {
            // Saturating; negative and NaN seeds become 0
            SeedRepr::Number(n) => SeedSource::Seeded(n as u32),
            SeedRepr::Name(_) => SeedSource::Unseeded,
        })
    }
}

/// A declared effector. The discriminant is fixed at declaration time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Effector {
    LinearField(LinearFieldEffector),
    Random(RandomEffector),
    Noise(NoiseEffector),
    Time(TimeEffector),
}

impl Effector {
    pub fn is_enabled(&self) -> bool {
        match self {
            Effector::LinearField(e) => e.enabled,
            Effector::Random(e) => e.enabled,
            Effector::Noise(e) => e.enabled,
            Effector::Time(e) => e.enabled,
        }
    }

    fn seed(&self) -> Option<SeedSource> {
        match self {
            Effector::Random(e) => Some(e.seed),
            Effector::Noise(e) => Some(e.seed),
            _ => None,
        }
    }
}

/// Everything an effector may read about the clone it is shaping
#[derive(Debug, Clone, Copy)]
pub struct EffectorInput<'c> {
    pub cell: &'c LayoutCell,
    /// Position of the effector in the pipeline
    pub salt: u32,
    /// Resolved seed (0 for effectors without one)
    pub seed: u32,
    pub elapsed: f32,
    pub unit: f32,
}

/// Running sum of effector contributions for one clone
#[derive(Debug, Clone, Default)]
pub struct Contribution<'a> {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
    pub hidden: bool,
    pub color: Option<&'a str>,
    pub material_colors: BTreeMap<&'a str, &'a str>,
}

impl<'a> Contribution<'a> {
    /// Add `deltas * weight`; position deltas are in world units
    pub fn add_deltas(&mut self, deltas: &Deltas, weight: f32, unit: f32) {
        self.position += deltas.position * weight * unit;
        self.rotation += deltas.rotation * weight;
        self.scale += deltas.scale * weight;
    }

    pub fn add_split(&mut self, deltas: &Deltas, weights: [f32; 3], unit: f32) {
        self.position += deltas.position * weights[0] * unit;
        self.rotation += deltas.rotation * weights[1];
        self.scale += deltas.scale * weights[2];
    }

    pub fn paint(&mut self, color: Option<&'a str>) {
        if color.is_some() {
            self.color = color;
        }
    }

    pub fn paint_material(&mut self, key: &'a str, color: Option<&'a str>) {
        if let Some(color) = color {
            self.material_colors.insert(key, color);
        }
    }
}

/// Timing and unit context for one evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalContext {
    pub elapsed: f32,
    pub unit: f32,
}

impl Default for EvalContext {
    fn default() -> Self {
        Self {
            elapsed: 0.0,
            unit: 1.0,
        }
    }
}

/// Ordered effector list plus the caches it owns
pub struct EffectorPipeline {
    effectors: Vec<Effector>,
    seeds: Vec<u32>,
    colors: ColorCache,
    noise: Box<dyn NoiseSampler>,
}

impl std::fmt::Debug for EffectorPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectorPipeline")
            .field("effectors", &self.effectors)
            .field("seeds", &self.seeds)
            .finish_non_exhaustive()
    }
}

impl Default for EffectorPipeline {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new(), 0)
    }
}

impl EffectorPipeline {
    /// Build a pipeline; child-declared effectors run before the listed ones
    pub fn new(child_effectors: Vec<Effector>, effectors: Vec<Effector>, master_seed: u64) -> Self {
        Self::with_noise(child_effectors, effectors, master_seed, Box::new(PerlinNoise))
    }

    pub fn with_noise(
        child_effectors: Vec<Effector>,
        effectors: Vec<Effector>,
        master_seed: u64,
        noise: Box<dyn NoiseSampler>,
    ) -> Self {
        let mut all = child_effectors;
        all.extend(effectors);

        let mut rng = Pcg32::seed_from_u64(master_seed);
        let seeds = all
            .iter()
            .map(|effector| match effector.seed() {
                Some(SeedSource::Seeded(seed)) => seed,
                Some(SeedSource::Unseeded) => rng.random::<u32>(),
                None => 0,
            })
            .collect();

        Self {
            effectors: all,
            seeds,
            colors: ColorCache::new(),
            noise,
        }
    }

    pub fn effectors(&self) -> &[Effector] {
        &self.effectors
    }

    /// Resolved seeds, one per effector
    pub fn seeds(&self) -> &[u32] {
        &self.seeds
    }

    pub fn color_cache(&self) -> &ColorCache {
        &self.colors
    }

    /// Whether output depends on elapsed time
    pub fn is_time_driven(&self) -> bool {
        self.effectors
            .iter()
            .any(|e| matches!(e, Effector::Time(t) if t.enabled))
    }

    /// Whether a Time effector animates scale (colliders must then follow)
    pub fn animates_scale(&self) -> bool {
        self.effectors
            .iter()
            .any(|e| matches!(e, Effector::Time(t) if t.enabled && t.deltas.scale != Vec3::ZERO))
    }

    /// Evaluate every effector for one cell
    pub fn evaluate(&mut self, cell: &LayoutCell, ctx: &EvalContext) -> CloneTransform {
        let mut acc = Contribution::default();
        for (salt, effector) in self.effectors.iter().enumerate() {
            if !effector.is_enabled() {
                continue;
            }
            let input = EffectorInput {
                cell,
                salt: salt as u32,
                seed: self.seeds[salt],
                elapsed: ctx.elapsed,
                unit: ctx.unit,
            };
            match effector {
                Effector::LinearField(e) => e.apply(&input, &mut acc),
                Effector::Random(e) => e.apply(&input, &mut acc),
                Effector::Noise(e) => e.apply(&input, self.noise.as_ref(), &mut acc),
                Effector::Time(e) => e.apply(&input, &mut acc),
            }
        }

        let color = acc.color.and_then(|c| self.colors.resolve(c));
        let material_colors = acc
            .material_colors
            .iter()
            .filter_map(|(key, c)| self.colors.resolve(c).map(|rgb| (key.to_string(), rgb)))
            .collect();

        CloneTransform::new(
            cell,
            cell.local_position + acc.position,
            acc.rotation,
            Vec3::ONE + acc.scale,
            acc.hidden,
            color,
            material_colors,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloner::layout::{GridSpec, generate_layout};

    fn cells() -> Vec<LayoutCell> {
        let spec = GridSpec {
            count: [4.0, 2.0, 3.0],
            ..Default::default()
        };
        generate_layout(&spec, 1.0)
    }

    fn random(seed: SeedSource) -> Effector {
        Effector::Random(RandomEffector {
            seed,
            deltas: Deltas {
                position: Vec3::splat(1.0),
                rotation: Vec3::splat(0.5),
                scale: Vec3::splat(0.25),
            },
            ..Default::default()
        })
    }

    #[test]
    fn test_empty_pipeline_is_identity() {
        let mut pipeline = EffectorPipeline::default();
        for cell in cells() {
            let t = pipeline.evaluate(&cell, &EvalContext::default());
            assert_eq!(t.position, cell.local_position);
            assert_eq!(t.rotation, Vec3::ZERO);
            assert_eq!(t.scale, Vec3::ONE);
            assert!(!t.hidden);
        }
    }

    #[test]
    fn test_idempotent_without_time() {
        let effectors = vec![random(SeedSource::Seeded(11)), random(SeedSource::Unseeded)];
        let mut a = EffectorPipeline::new(Vec::new(), effectors.clone(), 5);
        let mut b = EffectorPipeline::new(Vec::new(), effectors, 5);
        let ctx = EvalContext::default();
        for cell in cells() {
            let first = a.evaluate(&cell, &ctx);
            let second = a.evaluate(&cell, &ctx);
            let other = b.evaluate(&cell, &ctx);
            assert_eq!(first, second);
            assert_eq!(first, other);
        }
    }

    #[test]
    fn test_contributions_are_additive() {
        let lift = Effector::LinearField(LinearFieldEffector {
            size: 100.0,
            deltas: Deltas {
                position: Vec3::Y,
                ..Default::default()
            },
            ..Default::default()
        });
        let mut one = EffectorPipeline::new(Vec::new(), vec![lift.clone()], 0);
        let mut two = EffectorPipeline::new(Vec::new(), vec![lift.clone(), lift], 0);
        let cell = cells()[5];
        let a = one.evaluate(&cell, &EvalContext::default());
        let b = two.evaluate(&cell, &EvalContext::default());
        let da = a.position - cell.local_position;
        let db = b.position - cell.local_position;
        assert!(da.y > 0.0);
        assert!((db.y - 2.0 * da.y).abs() < 1e-5);
    }

    #[test]
    fn test_children_run_first() {
        let child = Effector::LinearField(LinearFieldEffector {
            color: Some(ColorSpec::Single("#ff0000".into())),
            size: 100.0,
            ..Default::default()
        });
        let listed = Effector::LinearField(LinearFieldEffector {
            color: Some(ColorSpec::Single("#0000ff".into())),
            size: 100.0,
            ..Default::default()
        });
        let mut pipeline = EffectorPipeline::new(vec![child], vec![listed], 0);
        let t = pipeline.evaluate(&cells()[0], &EvalContext::default());
        assert_eq!(t.color, Some(Vec3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_unseeded_resolution_is_reproducible() {
        let a = EffectorPipeline::new(Vec::new(), vec![random(SeedSource::Unseeded)], 42);
        let b = EffectorPipeline::new(Vec::new(), vec![random(SeedSource::Unseeded)], 42);
        let c = EffectorPipeline::new(Vec::new(), vec![random(SeedSource::Unseeded)], 43);
        assert_eq!(a.seeds(), b.seeds());
        assert_ne!(a.seeds(), c.seeds());
    }

    #[test]
    fn test_disabled_effector_keeps_salt() {
        let mut disabled = random(SeedSource::Seeded(1));
        if let Effector::Random(r) = &mut disabled {
            r.enabled = false;
        }
        let mut with_gap = EffectorPipeline::new(Vec::new(), vec![disabled, random(SeedSource::Seeded(9))], 0);
        let mut direct = EffectorPipeline::new(Vec::new(), vec![random(SeedSource::Seeded(9))], 0);
        let cell = cells()[2];
        let a = with_gap.evaluate(&cell, &EvalContext::default());
        let b = direct.evaluate(&cell, &EvalContext::default());
        assert_ne!(a.position, b.position);
    }

    #[test]
    fn test_scale_never_collapses() {
        let shrink = Effector::LinearField(LinearFieldEffector {
            size: 100.0,
            deltas: Deltas {
                scale: Vec3::splat(-5.0),
                ..Default::default()
            },
            ..Default::default()
        });
        let mut pipeline = EffectorPipeline::new(Vec::new(), vec![shrink], 0);
        let t = pipeline.evaluate(&cells()[0], &EvalContext::default());
        assert!(t.scale.min_element() > 0.0);
    }

    #[test]
    fn test_time_flags() {
        let time = Effector::Time(TimeEffector {
            deltas: Deltas {
                scale: Vec3::Y,
                ..Default::default()
            },
            ..Default::default()
        });
        let pipeline = EffectorPipeline::new(Vec::new(), vec![time], 0);
        assert!(pipeline.is_time_driven());
        assert!(pipeline.animates_scale());
        assert!(!EffectorPipeline::default().is_time_driven());
    }

    #[test]
    fn test_effector_json_tags() {
        let json = r##"[
            {"type": "linearField", "axis": "x", "size": 4, "position": [0, 1, 0]},
            {"type": "random", "seed": "unseeded", "hideProbability": 0.2},
            {"type": "noise", "frequency": [1, 2, 3], "color": ["#fff", "#000"]},
            {"type": "time", "loopMode": "pingpong", "easing": "easeInOutSine"}
        ]"##;
        let effectors: Vec<Effector> = serde_json::from_str(json).unwrap();
        assert!(matches!(&effectors[0], Effector::LinearField(e) if e.axis == Axis::X));
        assert!(matches!(&effectors[1], Effector::Random(e) if e.seed == SeedSource::Unseeded));
        assert!(matches!(&effectors[2], Effector::Noise(e) if e.frequency == Frequency::PerAxis(Vec3::new(1.0, 2.0, 3.0))));
        assert!(matches!(&effectors[3], Effector::Time(e) if e.loop_mode == LoopMode::PingPong));
    }
}
