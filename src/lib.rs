//! Grid Clone - procedural instance placement with collision-activated physics
//!
//! Core modules:
//! - `cloner`: Deterministic evaluation (grid layout, effectors, orchestration)
//! - `physics`: Body taxonomy, collider inference, activation state machine
//! - `config`: Serializable cloner configuration

pub mod cloner;
pub mod config;
pub mod physics;

pub use cloner::{CloneTransform, GridCloner, GridKey, GridSpec, advance_frame};
pub use config::{ClonerConfig, ConfigError, GridUnit, PhysicsConfig};
pub use physics::{ColliderDescriptor, PhysicsBodyType};

use glam::Vec3;

/// Shared numeric constants
pub mod consts {
    /// Floor applied to every divisor that comes from configuration
    pub const EPSILON: f32 = 1e-6;
    /// Smallest scale component a clone may end up with
    pub const MIN_SCALE: f32 = 1e-4;

    /// Noise sample offsets that decorrelate the position/rotation/scale channels
    /// from the base sample used for hide/color decisions
    pub const NOISE_POSITION_OFFSET: [f64; 3] = [11.31, 7.77, 3.19];
    pub const NOISE_ROTATION_OFFSET: [f64; 3] = [5.23, 17.91, 13.37];
    pub const NOISE_SCALE_OFFSET: [f64; 3] = [23.17, 2.71, 19.03];
    /// Per-seed shift of the noise sample point
    pub const NOISE_SEED_BIAS: f64 = 1.618;

    /// Overshoot used by the back easing family
    pub const BACK_OVERSHOOT: f32 = 1.70158;
}

/// Clamp to [0, 1]; NaN maps to 0
#[inline]
pub fn clamp01(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

/// Divide with the divisor floored away from zero by `consts::EPSILON`
#[inline]
pub fn safe_div(numerator: f32, denominator: f32) -> f32 {
    let d = if denominator.abs() < consts::EPSILON {
        if denominator < 0.0 { -consts::EPSILON } else { consts::EPSILON }
    } else {
        denominator
    };
    numerator / d
}

/// Floor every scale axis to `consts::MIN_SCALE`
#[inline]
pub fn floor_scale(scale: Vec3) -> Vec3 {
    Vec3::new(
        scale.x.max(consts::MIN_SCALE),
        scale.y.max(consts::MIN_SCALE),
        scale.z.max(consts::MIN_SCALE),
    )
}
