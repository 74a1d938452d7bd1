//! Hashed per-instance jitter

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ColorSpec, Contribution, Deltas, EffectorInput, SeedSource};
use crate::cloner::hash::{self, channel};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RandomEffector {
    pub enabled: bool,
    pub seed: SeedSource,
    pub strength: f32,
    #[serde(flatten)]
    pub deltas: Deltas,
    /// One draw for all three scale axes
    pub uniform_scale: bool,
    /// Hide outright, gated by a draw against `strength`
    pub hidden: bool,
    pub hide_probability: f32,
    pub color: Option<ColorSpec>,
    pub material_colors: BTreeMap<String, ColorSpec>,
}

impl Default for RandomEffector {
    fn default() -> Self {
        Self {
            enabled: true,
            seed: SeedSource::default(),
            strength: 1.0,
            deltas: Deltas::default(),
            uniform_scale: false,
            hidden: false,
            hide_probability: 0.0,
            color: None,
            material_colors: BTreeMap::new(),
        }
    }
}

impl RandomEffector {
    pub fn apply<'a>(&'a self, input: &EffectorInput<'_>, acc: &mut Contribution<'a>) {
        let index = input.cell.index;
        let unit_draw = |ch: u32| hash::unit(input.seed, index, input.salt, ch);
        let signed = |ch: u32| hash::signed(input.seed, index, input.salt, ch);

        let s = self.strength;
        for axis in 0..3 {
            acc.position[axis] += self.deltas.position[axis] * signed(channel::POSITION[axis]) * s * input.unit;
            acc.rotation[axis] += self.deltas.rotation[axis] * signed(channel::ROTATION[axis]) * s;
            let scale_channel = if self.uniform_scale { channel::SCALE[0] } else { channel::SCALE[axis] };
            acc.scale[axis] += self.deltas.scale[axis] * signed(scale_channel) * s;
        }

        if unit_draw(channel::HIDE_PROBABILITY) < self.hide_probability * s {
            acc.hidden = true;
        }
        if self.hidden && unit_draw(channel::HIDE_GATE) < s {
            acc.hidden = true;
        }

        if let Some(color) = &self.color {
            acc.paint(color.pick(unit_draw(channel::COLOR_PICK), unit_draw(channel::COLOR_GATE) < s));
        }
        for (key, color) in &self.material_colors {
            let ch = channel::MATERIAL_BASE.wrapping_add(hash::fnv1a(key));
            let draw = unit_draw(ch);
            acc.paint_material(key, color.pick(draw, draw < s));
        }
    }
}
