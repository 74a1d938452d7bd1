//! Easing catalog
//!
//! Names are matched leniently: case-insensitive, with `-`, `_` and spaces
//! ignored, so `ease-in-out-quad`, `ease_in_out_quad` and `easeInOutQuad` are
//! the same curve. Unknown names fall back to linear.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use crate::consts::BACK_OVERSHOOT;

/// Named easing curve over t in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Easing {
    #[default]
    Linear,
    Smooth,
    EaseIn,
    EaseOut,
    EaseInOut,
    InSine,
    OutSine,
    InOutSine,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
    InQuart,
    OutQuart,
    InOutQuart,
    InQuint,
    OutQuint,
    InOutQuint,
    InExpo,
    OutExpo,
    InOutExpo,
    InCirc,
    OutCirc,
    InOutCirc,
    InBack,
    OutBack,
    InOutBack,
    InElastic,
    OutElastic,
    InOutElastic,
    InBounce,
    OutBounce,
    InOutBounce,
}

const ALL: [Easing; 35] = [
    Easing::Linear,
    Easing::Smooth,
    Easing::EaseIn,
    Easing::EaseOut,
    Easing::EaseInOut,
    Easing::InSine,
    Easing::OutSine,
    Easing::InOutSine,
    Easing::InQuad,
    Easing::OutQuad,
    Easing::InOutQuad,
    Easing::InCubic,
    Easing::OutCubic,
    Easing::InOutCubic,
    Easing::InQuart,
    Easing::OutQuart,
    Easing::InOutQuart,
    Easing::InQuint,
    Easing::OutQuint,
    Easing::InOutQuint,
    Easing::InExpo,
    Easing::OutExpo,
    Easing::InOutExpo,
    Easing::InCirc,
    Easing::OutCirc,
    Easing::InOutCirc,
    Easing::InBack,
    Easing::OutBack,
    Easing::InOutBack,
    Easing::InElastic,
    Easing::OutElastic,
    Easing::InOutElastic,
    Easing::InBounce,
    Easing::OutBounce,
    Easing::InOutBounce,
];

impl Easing {
    /// Every curve in the catalog
    pub fn all() -> &'static [Easing] {
        &ALL
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::Smooth => "smooth",
            Easing::EaseIn => "easeIn",
            Easing::EaseOut => "easeOut",
            Easing::EaseInOut => "easeInOut",
            Easing::InSine => "easeInSine",
            Easing::OutSine => "easeOutSine",
            Easing::InOutSine => "easeInOutSine",
            Easing::InQuad => "easeInQuad",
            Easing::OutQuad => "easeOutQuad",
            Easing::InOutQuad => "easeInOutQuad",
            Easing::InCubic => "easeInCubic",
            Easing::OutCubic => "easeOutCubic",
            Easing::InOutCubic => "easeInOutCubic",
            Easing::InQuart => "easeInQuart",
            Easing::OutQuart => "easeOutQuart",
            Easing::InOutQuart => "easeInOutQuart",
            Easing::InQuint => "easeInQuint",
            Easing::OutQuint => "easeOutQuint",
            Easing::InOutQuint => "easeInOutQuint",
            Easing::InExpo => "easeInExpo",
            Easing::OutExpo => "easeOutExpo",
            Easing::InOutExpo => "easeInOutExpo",
            Easing::InCirc => "easeInCirc",
            Easing::OutCirc => "easeOutCirc",
            Easing::InOutCirc => "easeInOutCirc",
            Easing::InBack => "easeInBack",
            Easing::OutBack => "easeOutBack",
            Easing::InOutBack => "easeInOutBack",
            Easing::InElastic => "easeInElastic",
            Easing::OutElastic => "easeOutElastic",
            Easing::InOutElastic => "easeInOutElastic",
            Easing::InBounce => "easeInBounce",
            Easing::OutBounce => "easeOutBounce",
            Easing::InOutBounce => "easeInOutBounce",
        }
    }

    /// Parse a curve name; `None` if the name is not in the catalog
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = normalize_name(name);
        ALL.iter()
            .copied()
            .find(|e| normalize_name(e.as_str()) == wanted)
    }

    /// Parse a curve name, falling back to linear
    pub fn from_name_or_linear(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            log::debug!("Unknown easing {:?}, using linear", name);
            Easing::Linear
        })
    }

    /// Evaluate the curve; input is clamped to [0, 1]
    pub fn apply(&self, t: f32) -> f32 {
        let t = crate::clamp01(t);
        match self {
            Easing::Linear => t,
            Easing::Smooth => t * t * t * (t * (t * 6.0 - 15.0) + 10.0),
            Easing::EaseIn => t * t,
            Easing::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOut => t * t * (3.0 - 2.0 * t),

            Easing::InSine => 1.0 - (t * PI / 2.0).cos(),
            Easing::OutSine => (t * PI / 2.0).sin(),
            Easing::InOutSine => -((PI * t).cos() - 1.0) / 2.0,

            Easing::InQuad => t.powi(2),
            Easing::OutQuad => 1.0 - (1.0 - t).powi(2),
            Easing::InOutQuad => in_out_pow(t, 2),
            Easing::InCubic => t.powi(3),
            Easing::OutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::InOutCubic => in_out_pow(t, 3),
            Easing::InQuart => t.powi(4),
            Easing::OutQuart => 1.0 - (1.0 - t).powi(4),
            Easing::InOutQuart => in_out_pow(t, 4),
            Easing::InQuint => t.powi(5),
            Easing::OutQuint => 1.0 - (1.0 - t).powi(5),
            Easing::InOutQuint => in_out_pow(t, 5),

            Easing::InExpo => {
                if t == 0.0 { 0.0 } else { 2f32.powf(10.0 * t - 10.0) }
            }
            Easing::OutExpo => {
                if t == 1.0 { 1.0 } else { 1.0 - 2f32.powf(-10.0 * t) }
            }
            Easing::InOutExpo => {
                if t == 0.0 {
                    0.0
                } else if t == 1.0 {
                    1.0
                } else if t < 0.5 {
                    2f32.powf(20.0 * t - 10.0) / 2.0
                } else {
                    (2.0 - 2f32.powf(-20.0 * t + 10.0)) / 2.0
                }
            }

            Easing::InCirc => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
            Easing::OutCirc => (1.0 - (t - 1.0).powi(2)).max(0.0).sqrt(),
            Easing::InOutCirc => {
                if t < 0.5 {
                    (1.0 - (1.0 - (2.0 * t).powi(2)).max(0.0).sqrt()) / 2.0
                } else {
                    ((1.0 - (-2.0 * t + 2.0).powi(2)).max(0.0).sqrt() + 1.0) / 2.0
                }
            }

            Easing::InBack => {
                let c3 = BACK_OVERSHOOT + 1.0;
                c3 * t * t * t - BACK_OVERSHOOT * t * t
            }
            Easing::OutBack => {
                let c3 = BACK_OVERSHOOT + 1.0;
                1.0 + c3 * (t - 1.0).powi(3) + BACK_OVERSHOOT * (t - 1.0).powi(2)
            }
            Easing::InOutBack => {
                let c2 = BACK_OVERSHOOT * 1.525;
                if t < 0.5 {
                    ((2.0 * t).powi(2) * ((c2 + 1.0) * 2.0 * t - c2)) / 2.0
                } else {
                    ((2.0 * t - 2.0).powi(2) * ((c2 + 1.0) * (t * 2.0 - 2.0) + c2) + 2.0) / 2.0
                }
            }

            Easing::InElastic => {
                let c4 = (2.0 * PI) / 3.0;
                if t == 0.0 {
                    0.0
                } else if t == 1.0 {
                    1.0
                } else {
                    -(2f32.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * c4).sin()
                }
            }
            Easing::OutElastic => {
                let c4 = (2.0 * PI) / 3.0;
                if t == 0.0 {
                    0.0
                } else if t == 1.0 {
                    1.0
                } else {
                    2f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
                }
            }
            Easing::InOutElastic => {
                let c5 = (2.0 * PI) / 4.5;
                if t == 0.0 {
                    0.0
                } else if t == 1.0 {
                    1.0
                } else if t < 0.5 {
                    -(2f32.powf(20.0 * t - 10.0) * ((20.0 * t - 11.125) * c5).sin()) / 2.0
                } else {
                    (2f32.powf(-20.0 * t + 10.0) * ((20.0 * t - 11.125) * c5).sin()) / 2.0 + 1.0
                }
            }

            Easing::InBounce => 1.0 - out_bounce(1.0 - t),
            Easing::OutBounce => out_bounce(t),
            Easing::InOutBounce => {
                if t < 0.5 {
                    (1.0 - out_bounce(1.0 - 2.0 * t)) / 2.0
                } else {
                    (1.0 + out_bounce(2.0 * t - 1.0)) / 2.0
                }
            }
        }
    }
}

impl From<String> for Easing {
    fn from(name: String) -> Self {
        Easing::from_name_or_linear(&name)
    }
}

impl From<Easing> for String {
    fn from(easing: Easing) -> Self {
        easing.as_str().to_string()
    }
}

fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

#[inline]
fn in_out_pow(t: f32, n: i32) -> f32 {
    if t < 0.5 {
        2f32.powi(n - 1) * t.powi(n)
    } else {
        1.0 - (-2.0 * t + 2.0).powi(n) / 2.0
    }
}

/// Four piecewise parabolic segments
fn out_bounce(t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;
    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_name_parsing() {
        assert_eq!(Easing::from_name("easeInOutQuad"), Some(Easing::InOutQuad));
        assert_eq!(Easing::from_name("ease-in-out-quad"), Some(Easing::InOutQuad));
        assert_eq!(Easing::from_name("EASE_OUT_BOUNCE"), Some(Easing::OutBounce));
        assert_eq!(Easing::from_name("smooth"), Some(Easing::Smooth));
        assert_eq!(Easing::from_name("wobble"), None);
        assert_eq!(Easing::from_name_or_linear("wobble"), Easing::Linear);
    }

    #[test]
    fn test_serde_round_trip_name() {
        let json = serde_json::to_string(&Easing::InOutElastic).unwrap();
        assert_eq!(json, "\"easeInOutElastic\"");
        let back: Easing = serde_json::from_str("\"not-a-curve\"").unwrap();
        assert_eq!(back, Easing::Linear);
    }

    #[test]
    fn test_endpoints() {
        for easing in Easing::all() {
            assert!(easing.apply(0.0).abs() < 1e-4, "{:?} at 0", easing);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-4, "{:?} at 1", easing);
        }
    }

    #[test]
    fn test_midpoints() {
        assert!((Easing::Linear.apply(0.5) - 0.5).abs() < 1e-6);
        assert!((Easing::EaseInOut.apply(0.5) - 0.5).abs() < 1e-6);
        assert!((Easing::InOutCubic.apply(0.5) - 0.5).abs() < 1e-6);
        assert!((Easing::InQuad.apply(0.5) - 0.25).abs() < 1e-6);
        assert!((Easing::OutQuad.apply(0.5) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_back_overshoots() {
        assert!(Easing::InBack.apply(0.2) < 0.0);
        assert!(Easing::OutBack.apply(0.8) > 1.0);
    }

    #[test]
    fn test_bounce_segments_continuous() {
        for boundary in [1.0 / 2.75, 2.0 / 2.75, 2.5 / 2.75] {
            let before = out_bounce(boundary - 1e-4);
            let after = out_bounce(boundary + 1e-4);
            assert!((before - after).abs() < 0.01);
        }
    }

    proptest! {
        #[test]
        fn prop_input_is_clamped(t in -10.0f32..10.0) {
            for easing in Easing::all() {
                let clamped = easing.apply(t.clamp(0.0, 1.0));
                prop_assert_eq!(easing.apply(t).to_bits(), clamped.to_bits());
            }
        }
    }
}
