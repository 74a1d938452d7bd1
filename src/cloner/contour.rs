//! Remap and contour shaping for field weights

use serde::{Deserialize, Serialize};

use super::easing::Easing;
use crate::safe_div;

/// Secondary reshaping applied to a normalized weight
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContourMode {
    #[default]
    None,
    /// Signed square
    Quadratic,
    /// Hard threshold at 0.5
    Step,
    /// Round to `contour_steps` equal levels
    Quantize,
    /// Piecewise-linear over the remap block's control points
    Curve,
    /// Any other name is looked up in the easing catalog
    Eased(Easing),
}

impl ContourMode {
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "" | "none" => ContourMode::None,
            "quadratic" => ContourMode::Quadratic,
            "step" => ContourMode::Step,
            "quantize" => ContourMode::Quantize,
            "curve" => ContourMode::Curve,
            _ => ContourMode::Eased(Easing::from_name_or_linear(name)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContourMode::None => "none",
            ContourMode::Quadratic => "quadratic",
            ContourMode::Step => "step",
            ContourMode::Quantize => "quantize",
            ContourMode::Curve => "curve",
            ContourMode::Eased(easing) => easing.as_str(),
        }
    }
}

impl From<String> for ContourMode {
    fn from(name: String) -> Self {
        ContourMode::from_name(&name)
    }
}

impl From<ContourMode> for String {
    fn from(mode: ContourMode) -> Self {
        mode.as_str().to_string()
    }
}

/// Remap block of a linear field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Remap {
    pub enabled: bool,
    pub inner_offset: f32,
    pub remap_min: f32,
    pub remap_max: f32,
    pub clamp_min: bool,
    pub clamp_max: bool,
    pub contour_mode: ContourMode,
    pub contour_steps: u32,
    /// Control points `[x, y]` for `ContourMode::Curve`; sorted on use
    pub contour_curve: Vec<[f32; 2]>,
    pub contour_multiplier: f32,
}

impl Default for Remap {
    fn default() -> Self {
        Self {
            enabled: false,
            inner_offset: 0.0,
            remap_min: 0.0,
            remap_max: 1.0,
            clamp_min: true,
            clamp_max: true,
            contour_mode: ContourMode::None,
            contour_steps: 4,
            contour_curve: Vec::new(),
            contour_multiplier: 1.0,
        }
    }
}

impl Remap {
    /// Map a raw progress value through inner offset, range remap, clamps,
    /// contour and multiplier (strength is applied by the caller)
    pub fn apply(&self, progress: f32) -> f32 {
        let mut value = safe_div(progress - self.inner_offset, 1.0 - self.inner_offset);
        value = safe_div(value - self.remap_min, self.remap_max - self.remap_min);
        if self.clamp_min {
            value = value.max(0.0);
        }
        if self.clamp_max {
            value = value.min(1.0);
        }
        let shaped = match self.contour_mode {
            ContourMode::None => value,
            ContourMode::Quadratic => value * value.abs(),
            ContourMode::Step => {
                if value >= 0.5 { 1.0 } else { 0.0 }
            }
            ContourMode::Quantize => quantize(value, self.contour_steps),
            ContourMode::Curve => sample_curve(&self.contour_curve, value),
            ContourMode::Eased(easing) => easing.apply(value),
        };
        shaped * self.contour_multiplier
    }
}

/// Round to `steps` evenly spaced levels spanning [0, 1]
pub fn quantize(value: f32, steps: u32) -> f32 {
    let intervals = steps.max(2) as f32 - 1.0;
    (value * intervals).round() / intervals
}

/// Piecewise-linear interpolation; fewer than two points is the identity
pub fn sample_curve(points: &[[f32; 2]], value: f32) -> f32 {
    if points.len() < 2 {
        return value;
    }
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a[0].partial_cmp(&b[0]).unwrap_or(std::cmp::Ordering::Equal));

    let first = sorted[0];
    let last = sorted[sorted.len() - 1];
    if value <= first[0] {
        return first[1];
    }
    if value >= last[0] {
        return last[1];
    }
    for pair in sorted.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if value <= b[0] {
            let t = safe_div(value - a[0], b[0] - a[0]);
            return a[1] + (b[1] - a[1]) * t;
        }
    }
    last[1]
}
