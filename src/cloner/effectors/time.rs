//! Time-driven animation

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ColorSpec, Contribution, Deltas, EffectorInput};
use crate::clamp01;
use crate::cloner::easing::Easing;
use crate::consts::EPSILON;

/// How progress past one duration is folded back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LoopMode {
    /// Clamp to [0, 1]
    #[default]
    None,
    /// Wrap into [0, 1)
    Loop,
    /// Triangle wave over [0, 1]
    PingPong,
}

impl LoopMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoopMode::None => "none",
            LoopMode::Loop => "loop",
            LoopMode::PingPong => "pingpong",
        }
    }

    pub fn fold(&self, raw: f32) -> f32 {
        match self {
            LoopMode::None => clamp01(raw),
            LoopMode::Loop => {
                let t = raw.rem_euclid(1.0);
                // rem_euclid can round up to exactly 1.0 for tiny negative inputs
                if t >= 1.0 { 0.0 } else { t }
            }
            LoopMode::PingPong => {
                let t = raw.rem_euclid(2.0);
                if t <= 1.0 { t } else { 2.0 - t }
            }
        }
    }
}

impl From<String> for LoopMode {
    fn from(s: String) -> Self {
        match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "loop" | "repeat" => LoopMode::Loop,
            "pingpong" => LoopMode::PingPong,
            _ => LoopMode::None,
        }
    }
}

impl From<LoopMode> for String {
    fn from(mode: LoopMode) -> Self {
        mode.as_str().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimeEffector {
    pub enabled: bool,
    pub strength: f32,
    pub loop_mode: LoopMode,
    pub easing: Easing,
    /// Seconds for progress to go from 0 to 1
    pub duration: f32,
    pub speed: f32,
    /// Seconds added to elapsed time
    pub time_offset: f32,
    /// Seconds added per flat index
    pub clone_offset: f32,
    #[serde(flatten)]
    pub deltas: Deltas,
    pub hidden: bool,
    pub hide_threshold: f32,
    pub color: Option<ColorSpec>,
    pub material_colors: BTreeMap<String, ColorSpec>,
}

impl Default for TimeEffector {
    fn default() -> Self {
        Self {
            enabled: true,
            strength: 1.0,
            loop_mode: LoopMode::Loop,
            easing: Easing::Linear,
            duration: 1.0,
            speed: 1.0,
            time_offset: 0.0,
            clone_offset: 0.0,
            deltas: Deltas::default(),
            hidden: false,
            hide_threshold: 0.5,
            color: None,
            material_colors: BTreeMap::new(),
        }
    }
}

impl TimeEffector {
    /// Unfolded progress in durations
    pub fn raw_progress(&self, elapsed: f32, index: u32) -> f32 {
        let t = elapsed * self.speed + self.time_offset + index as f32 * self.clone_offset;
        t / self.duration.max(EPSILON)
    }

    /// Folded progress before easing
    pub fn progress(&self, elapsed: f32, index: u32) -> f32 {
        self.loop_mode.fold(self.raw_progress(elapsed, index))
    }

    /// Eased progress times strength
    pub fn amount(&self, elapsed: f32, index: u32) -> f32 {
        self.easing.apply(self.progress(elapsed, index)) * self.strength
    }

    pub fn apply<'a>(&'a self, input: &EffectorInput<'_>, acc: &mut Contribution<'a>) {
        let amount = self.amount(input.elapsed, input.cell.index);
        acc.add_deltas(&self.deltas, amount, input.unit);

        if self.hidden && amount >= self.hide_threshold {
            acc.hidden = true;
        }
        let t = clamp01(amount);
        if let Some(color) = &self.color {
            acc.paint(color.pick(t, t > 0.0));
        }
        for (key, color) in &self.material_colors {
            acc.paint_material(key, color.pick(t, t > 0.0));
        }
    }
}
