//! Physics descriptors and activation
//!
//! Nothing here integrates forces. This module decides which bodies and
//! colliders a clone needs, talks to an engine through [`PhysicsBackend`],
//! and runs the one-way collision activation of dormant clones.

pub mod activation;
pub mod backend;
pub mod body_type;
pub mod collider;
pub mod world;

pub use activation::{ActivationState, InstancePhysics, PhysicsPlan, Representation};
pub use backend::{BodyHandle, ColliderHandle, ContactKind, Handle, PhysicsBackend, PhysicsEvent, Pose};
pub use body_type::{ActivationTrigger, EngineBodyType, PhysicsBodyType};
pub use collider::{
    Anchor, BlockShape, BoxShape, ColliderDescriptor, ColliderShape, CylinderShape, ExplicitCollider,
    InferredCollider, SphereShape, block_preset_size, needs_manual_collider,
};
pub use world::SceneWorld;
