//! Deterministic clone evaluation
//!
//! Everything here is a pure function of configuration, flat index and
//! elapsed time, except the frozen snapshots of activated clones.

pub mod contour;
pub mod easing;
pub mod effectors;
pub mod frozen;
pub mod grid;
pub mod hash;
pub mod layout;
pub mod noise;
pub mod transform;

pub use effectors::{Effector, EffectorPipeline, EvalContext};
pub use frozen::FrozenTable;
pub use grid::{ActivationCallback, ClonerOutput, GridCloner, advance_frame};
pub use layout::{GridKey, GridSpec, LayoutCell, generate_layout};
pub use transform::CloneTransform;
