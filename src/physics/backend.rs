//! Physics engine seam
//!
//! The cloner talks to a physics engine only through [`PhysicsBackend`].
//! Every mutation takes a handle that may have gone stale; implementations
//! return `false`/`None` instead of panicking and callers skip the mutation.

use glam::{Quat, Vec3};

use super::body_type::EngineBodyType;
use super::collider::ColliderDescriptor;

/// Generational slot reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
    pub index: u32,
    pub generation: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub Handle);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColliderHandle(pub Handle);

/// World-space position and orientation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// World position of a point given in this pose's local frame
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    /// Solid contact between two non-sensor colliders
    CollisionEnter,
    /// Overlap involving at least one sensor
    IntersectionEnter,
}

/// Enter event delivered by a physics step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicsEvent {
    pub kind: ContactKind,
    pub collider1: ColliderHandle,
    pub collider2: ColliderHandle,
}

impl PhysicsEvent {
    pub fn involves(&self, collider: ColliderHandle) -> bool {
        self.collider1 == collider || self.collider2 == collider
    }
}

/// Operations the cloner needs from a physics engine
pub trait PhysicsBackend {
    fn create_body(&mut self, body_type: EngineBodyType, pose: Pose) -> BodyHandle;

    /// Create a collider attached to `parent`, or free-standing at `pose` when
    /// `parent` is `None`. Returns `None` if `parent` is stale.
    fn create_collider(
        &mut self,
        shape: ColliderDescriptor,
        offset: Vec3,
        sensor: bool,
        parent: Option<BodyHandle>,
        pose: Pose,
    ) -> Option<ColliderHandle>;

    /// Move a free-standing collider onto a body, keeping its offset
    fn attach_collider(&mut self, collider: ColliderHandle, body: BodyHandle) -> bool;

    fn body_colliders(&self, body: BodyHandle) -> Vec<ColliderHandle>;

    fn is_body_valid(&self, body: BodyHandle) -> bool;

    fn is_collider_valid(&self, collider: ColliderHandle) -> bool;

    fn set_sensor(&mut self, collider: ColliderHandle, sensor: bool) -> bool;

    fn is_sensor(&self, collider: ColliderHandle) -> Option<bool>;

    fn set_body_type(&mut self, body: BodyHandle, body_type: EngineBodyType) -> bool;

    fn body_type(&self, body: BodyHandle) -> Option<EngineBodyType>;

    fn wake_body(&mut self, body: BodyHandle) -> bool;

    fn set_body_pose(&mut self, body: BodyHandle, pose: Pose) -> bool;

    fn body_pose(&self, body: BodyHandle) -> Option<Pose>;

    /// Reposition a free-standing collider; attached colliders follow their body
    fn set_collider_pose(&mut self, collider: ColliderHandle, pose: Pose) -> bool;

    /// Replace a collider's shape and its offset from the body or pose origin
    fn resize_collider(&mut self, collider: ColliderHandle, shape: ColliderDescriptor, offset: Vec3) -> bool;

    /// Remove a body and every collider attached to it
    fn remove_body(&mut self, body: BodyHandle) -> bool;

    fn remove_collider(&mut self, collider: ColliderHandle) -> bool;

    /// Advance the simulation once and return the enter events it raised
    fn step(&mut self, dt: f32) -> Vec<PhysicsEvent>;
}
