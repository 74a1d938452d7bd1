//! Per-instance physics lifecycle
//!
//! Collision-activated instances start `Unarmed`: free-standing colliders (or
//! none at all) and no body. The first qualifying contact arms them with a
//! dynamic body. The transition is one-way; only a change of the configured
//! body type re-arms an instance, and that goes through a full rebuild.

use glam::Vec3;

use super::backend::{BodyHandle, ColliderHandle, PhysicsBackend, Pose};
use super::body_type::{EngineBodyType, PhysicsBodyType};
use super::collider::{
    ColliderDescriptor, ColliderShape, ExplicitCollider, InferredCollider, needs_manual_collider,
};
use crate::cloner::transform::CloneTransform;
use crate::consts::EPSILON;

/// One-way activation guard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActivationState {
    fired: bool,
}

impl ActivationState {
    pub fn is_fired(&self) -> bool {
        self.fired
    }

    /// Mark as fired; true only on the first call
    pub fn fire(&mut self) -> bool {
        !std::mem::replace(&mut self.fired, true)
    }
}

/// How an instance is represented in the physics world
#[derive(Debug, Clone, PartialEq)]
pub enum Representation {
    /// No body; dormant colliders stand on their own. Empty means a plain group.
    Unarmed { colliders: Vec<ColliderHandle> },
    /// A body owning its colliders
    Armed { body: BodyHandle },
}

/// Physics settings resolved once per configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsPlan {
    pub body_type: PhysicsBodyType,
    pub explicit: Vec<ExplicitCollider>,
    /// Set when the collider must be inferred instead of engine-generated
    pub inferred: Option<InferredCollider>,
}

impl PhysicsPlan {
    pub fn new(
        body_type: PhysicsBodyType,
        explicit: Vec<ExplicitCollider>,
        shape_source: Option<&dyn ColliderShape>,
        animates_scale: bool,
    ) -> Self {
        let inferred = if explicit.is_empty() && needs_manual_collider(body_type, animates_scale) {
            Some(match shape_source {
                Some(shape) => shape.collider(),
                None => {
                    log::debug!("No shape to infer a collider from, using a unit cuboid");
                    InferredCollider {
                        shape: ColliderDescriptor::Cuboid {
                            half_extents: Vec3::splat(0.5),
                        },
                        offset: Vec3::ZERO,
                    }
                }
            })
        } else {
            None
        };
        Self {
            body_type,
            explicit,
            inferred,
        }
    }

    /// Colliders an armed body carries, unscaled
    pub fn body_colliders(&self) -> Vec<ExplicitCollider> {
        if !self.explicit.is_empty() {
            return self.explicit.clone();
        }
        let collider = match self.inferred {
            Some(inferred) => ExplicitCollider {
                shape: inferred.shape,
                offset: inferred.offset,
                sensor: false,
            },
            None => ExplicitCollider {
                shape: ColliderDescriptor::Auto,
                offset: Vec3::ZERO,
                sensor: false,
            },
        };
        vec![collider]
    }
}

/// A created collider and the unscaled declaration it came from
#[derive(Debug, Clone, PartialEq)]
struct Attached {
    handle: ColliderHandle,
    base: ExplicitCollider,
}

/// Physics state of one clone
#[derive(Debug, Clone, PartialEq)]
pub struct InstancePhysics {
    state: ActivationState,
    repr: Representation,
    attached: Vec<Attached>,
    scale: Vec3,
}

fn pose_of(transform: &CloneTransform) -> Pose {
    Pose::new(transform.position, transform.quat())
}

fn create(
    backend: &mut dyn PhysicsBackend,
    base: &ExplicitCollider,
    scale: Vec3,
    sensor: bool,
    parent: Option<BodyHandle>,
    pose: Pose,
) -> Option<Attached> {
    let handle = backend.create_collider(base.shape.scaled(scale), base.offset * scale, sensor, parent, pose)?;
    Some(Attached {
        handle,
        base: base.clone(),
    })
}

impl InstancePhysics {
    /// Create the dormant (or, for plain body types, final) representation
    pub fn build(plan: &PhysicsPlan, transform: &CloneTransform, backend: &mut dyn PhysicsBackend) -> Self {
        let pose = pose_of(transform);
        let scale = transform.scale;

        if plan.body_type.is_collision_activated() {
            let sensor = plan.body_type.dormant_sensors();
            let attached: Vec<Attached> = plan
                .explicit
                .iter()
                .filter_map(|c| create(backend, c, scale, sensor, None, pose))
                .collect();
            return Self {
                state: ActivationState::default(),
                repr: Representation::Unarmed {
                    colliders: attached.iter().map(|a| a.handle).collect(),
                },
                attached,
                scale,
            };
        }

        let body = backend.create_body(plan.body_type.resolve(false), pose);
        let attached = plan
            .body_colliders()
            .iter()
            .filter_map(|c| create(backend, c, scale, c.sensor, Some(body), pose))
            .collect();
        Self {
            state: ActivationState::default(),
            repr: Representation::Armed { body },
            attached,
            scale,
        }
    }

    pub fn state(&self) -> ActivationState {
        self.state
    }

    pub fn representation(&self) -> &Representation {
        &self.repr
    }

    pub fn body(&self) -> Option<BodyHandle> {
        match self.repr {
            Representation::Armed { body } => Some(body),
            Representation::Unarmed { .. } => None,
        }
    }

    pub fn colliders(&self) -> impl Iterator<Item = ColliderHandle> + '_ {
        self.attached.iter().map(|a| a.handle)
    }

    /// Engine body type this instance currently resolves to
    pub fn resolved_type(&self, plan: &PhysicsPlan) -> EngineBodyType {
        plan.body_type.resolve(self.state.is_fired())
    }

    /// Promote to a dynamic body. Returns true only on the first call for a
    /// collision-activated instance.
    pub fn promote(&mut self, plan: &PhysicsPlan, transform: &CloneTransform, backend: &mut dyn PhysicsBackend) -> bool {
        if !plan.body_type.is_collision_activated() || !self.state.fire() {
            return false;
        }
        let pose = pose_of(transform);

        let body = match &self.repr {
            Representation::Unarmed { colliders } => {
                let body = backend.create_body(EngineBodyType::Dynamic, pose);
                if colliders.is_empty() {
                    self.attached = plan
                        .body_colliders()
                        .iter()
                        .filter_map(|c| create(backend, c, self.scale, false, Some(body), pose))
                        .collect();
                } else {
                    self.attached.retain(|a| {
                        let ok = backend.is_collider_valid(a.handle) && backend.attach_collider(a.handle, body);
                        if !ok {
                            log::debug!("Skipping stale collider {:?} on activation", a.handle);
                        }
                        ok
                    });
                }
                body
            }
            Representation::Armed { body } => {
                let body = *body;
                if backend.is_body_valid(body) {
                    backend.set_body_type(body, EngineBodyType::Dynamic);
                }
                body
            }
        };

        for collider in backend.body_colliders(body) {
            if backend.is_collider_valid(collider) {
                backend.set_sensor(collider, false);
            }
        }
        if backend.is_body_valid(body) {
            backend.wake_body(body);
        }
        self.repr = Representation::Armed { body };
        log::debug!("Instance armed with body {:?}", body);
        true
    }

    /// Follow a recomputed transform. Dynamic bodies belong to the engine and
    /// are left alone.
    pub fn sync(&mut self, plan: &PhysicsPlan, transform: &CloneTransform, backend: &mut dyn PhysicsBackend) {
        let pose = pose_of(transform);
        match &self.repr {
            Representation::Unarmed { colliders } => {
                for &collider in colliders {
                    if backend.is_collider_valid(collider) {
                        backend.set_collider_pose(collider, pose);
                    }
                }
            }
            Representation::Armed { body } => {
                if self.resolved_type(plan) == EngineBodyType::Dynamic {
                    return;
                }
                if backend.is_body_valid(*body) {
                    backend.set_body_pose(*body, pose);
                }
            }
        }

        if (transform.scale - self.scale).abs().max_element() > EPSILON {
            self.scale = transform.scale;
            for a in &self.attached {
                if backend.is_collider_valid(a.handle) {
                    backend.resize_collider(a.handle, a.base.shape.scaled(self.scale), a.base.offset * self.scale);
                }
            }
        }
    }

    /// Remove everything this instance created
    pub fn teardown(self, backend: &mut dyn PhysicsBackend) {
        match self.repr {
            Representation::Armed { body } => {
                backend.remove_body(body);
            }
            Representation::Unarmed { colliders } => {
                for collider in colliders {
                    backend.remove_collider(collider);
                }
            }
        }
    }
}
