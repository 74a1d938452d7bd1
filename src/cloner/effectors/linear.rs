//! Linear falloff field along one axis

use std::collections::BTreeMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{ColorSpec, Contribution, Deltas, EffectorInput};
use crate::cloner::contour::Remap;
use crate::cloner::easing::Easing;
use crate::{clamp01, consts::EPSILON};

/// Field axis; anything unrecognized is `Y`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Axis {
    X,
    #[default]
    Y,
    Z,
}

impl Axis {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "x" => Some(Axis::X),
            "y" => Some(Axis::Y),
            "z" => Some(Axis::Z),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }

    #[inline]
    pub fn component(&self, v: Vec3) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
        }
    }
}

impl From<String> for Axis {
    fn from(s: String) -> Self {
        Axis::from_str(&s).unwrap_or_else(|| {
            log::debug!("Unknown axis {:?}, using y", s);
            Axis::Y
        })
    }
}

impl From<Axis> for String {
    fn from(axis: Axis) -> Self {
        axis.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinearFieldEffector {
    pub enabled: bool,
    pub axis: Axis,
    /// Field center along `axis` (world units)
    pub center: f32,
    /// Field extent along `axis` (world units)
    pub size: f32,
    pub invert: bool,
    pub strength: f32,
    pub easing: Easing,
    pub remap: Remap,
    #[serde(flatten)]
    pub deltas: Deltas,
    pub hidden: bool,
    pub hide_threshold: f32,
    pub color: Option<ColorSpec>,
    pub material_colors: BTreeMap<String, ColorSpec>,
}

impl Default for LinearFieldEffector {
    fn default() -> Self {
        Self {
            enabled: true,
            axis: Axis::Y,
            center: 0.0,
            size: 1.0,
            invert: false,
            strength: 1.0,
            easing: Easing::Linear,
            remap: Remap::default(),
            deltas: Deltas::default(),
            hidden: false,
            hide_threshold: 0.5,
            color: None,
            material_colors: BTreeMap::new(),
        }
    }
}

impl LinearFieldEffector {
    /// Raw progress through the field: 0 at `center - size/2`, 1 at `center + size/2`
    /// (before inversion)
    pub fn progress(&self, local_position: Vec3, unit: f32) -> f32 {
        let size = (self.size * unit).max(EPSILON);
        let start = self.center * unit - size / 2.0;
        (self.axis.component(local_position) - start) / size
    }

    /// Field weight including strength
    pub fn weight(&self, local_position: Vec3, unit: f32) -> f32 {
        let mut progress = self.progress(local_position, unit);
        if self.invert {
            progress = 1.0 - progress;
        }
        if self.remap.enabled {
            self.remap.apply(progress) * self.strength
        } else {
            self.easing.apply(clamp01(progress)) * self.strength
        }
    }

    pub fn apply<'a>(&'a self, input: &EffectorInput<'_>, acc: &mut Contribution<'a>) {
        let weight = self.weight(input.cell.local_position, input.unit);
        acc.add_deltas(&self.deltas, weight, input.unit);

        let clamped = clamp01(weight);
        if self.hidden && clamped >= self.hide_threshold {
            acc.hidden = true;
        }
        let inside = clamped > 0.0;
        if let Some(color) = &self.color {
            acc.paint(color.pick(clamped, inside));
        }
        for (key, color) in &self.material_colors {
            acc.paint_material(key, color.pick(clamped, inside));
        }
    }
}
