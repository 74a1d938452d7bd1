//! In-memory physics world
//!
//! A minimal engine behind [`PhysicsBackend`]: generational slots for bodies
//! and colliders, sensor flags, queued contacts turned into enter events at
//! step time, and gravity for awake dynamic bodies. Used by tests and the demo.
//!
//! This is a stand-in for a real engine, not a simulator: there is no
//! narrow phase, no contact resolution and no forces besides gravity. Embed
//! the cloner in a real engine by implementing [`PhysicsBackend`] for it.

use glam::Vec3;

use super::backend::{
    BodyHandle, ColliderHandle, ContactKind, Handle, PhysicsBackend, PhysicsEvent, Pose,
};
use super::body_type::EngineBodyType;
use super::collider::ColliderDescriptor;

/// Default downward acceleration (m/s^2)
pub const GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot storage that invalidates handles on removal
#[derive(Debug, Clone)]
struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<T> Arena<T> {
    fn insert(&mut self, value: T) -> Handle {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation += 1;
            slot.value = Some(value);
            Handle {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                value: Some(value),
            });
            Handle { index, generation: 0 }
        }
    }

    fn get(&self, handle: Handle) -> Option<&T> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    fn remove(&mut self, handle: Handle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.value.take()?;
        self.free.push(handle.index);
        Some(value)
    }

    fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.value.as_ref().map(|v| {
                (
                    Handle {
                        index: i as u32,
                        generation: slot.generation,
                    },
                    v,
                )
            })
        })
    }

    fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.value.is_some()).count()
    }
}

#[derive(Debug, Clone)]
pub struct Body {
    pub body_type: EngineBodyType,
    pub pose: Pose,
    pub velocity: Vec3,
    pub awake: bool,
}

#[derive(Debug, Clone)]
pub struct Collider {
    pub shape: ColliderDescriptor,
    pub offset: Vec3,
    pub sensor: bool,
    pub parent: Option<BodyHandle>,
    /// Pose of a free-standing collider (ignored when attached)
    pub pose: Pose,
}

/// In-memory physics world
#[derive(Debug, Clone)]
pub struct SceneWorld {
    bodies: Arena<Body>,
    colliders: Arena<Collider>,
    pending: Vec<(ColliderHandle, ColliderHandle)>,
    pub gravity: Vec3,
    /// Number of completed steps
    pub steps: u64,
}

impl Default for SceneWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneWorld {
    pub fn new() -> Self {
        Self {
            bodies: Arena::default(),
            colliders: Arena::default(),
            pending: Vec::new(),
            gravity: GRAVITY,
            steps: 0,
        }
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(handle.0)
    }

    pub fn collider(&self, handle: ColliderHandle) -> Option<&Collider> {
        self.colliders.get(handle.0)
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    pub fn colliders(&self) -> impl Iterator<Item = (ColliderHandle, &Collider)> {
        self.colliders.iter().map(|(h, c)| (ColliderHandle(h), c))
    }

    /// World-space center of a collider
    pub fn collider_position(&self, handle: ColliderHandle) -> Option<Vec3> {
        let collider = self.colliders.get(handle.0)?;
        let pose = match collider.parent {
            Some(parent) => self.bodies.get(parent.0)?.pose,
            None => collider.pose,
        };
        Some(pose.transform_point(collider.offset))
    }

    /// Queue a contact between two colliders for the next step
    pub fn queue_contact(&mut self, a: ColliderHandle, b: ColliderHandle) {
        self.pending.push((a, b));
    }

    /// Spawn a free-standing solid ball, e.g. a projectile to hit clones with
    pub fn spawn_probe(&mut self, position: Vec3, radius: f32) -> ColliderHandle {
        ColliderHandle(self.colliders.insert(Collider {
            shape: ColliderDescriptor::Ball { radius },
            offset: Vec3::ZERO,
            sensor: false,
            parent: None,
            pose: Pose::new(position, glam::Quat::IDENTITY),
        }))
    }

    /// Queue contacts between `probe` and every collider whose bounds overlap it
    pub fn queue_overlaps(&mut self, probe: ColliderHandle) -> usize {
        let Some(center) = self.collider_position(probe) else {
            return 0;
        };
        let Some(probe_half) = self.collider(probe).map(|c| c.shape.half_bounds()) else {
            return 0;
        };
        let hits: Vec<ColliderHandle> = self
            .colliders()
            .filter(|(h, _)| *h != probe)
            .filter_map(|(h, c)| {
                let other = self.collider_position(h)?;
                let reach = probe_half + c.shape.half_bounds();
                let d = (other - center).abs();
                (d.x <= reach.x && d.y <= reach.y && d.z <= reach.z).then_some(h)
            })
            .collect();
        let count = hits.len();
        for hit in hits {
            self.queue_contact(probe, hit);
        }
        count
    }
}

impl PhysicsBackend for SceneWorld {
    fn create_body(&mut self, body_type: EngineBodyType, pose: Pose) -> BodyHandle {
        BodyHandle(self.bodies.insert(Body {
            body_type,
            pose,
            velocity: Vec3::ZERO,
            awake: body_type == EngineBodyType::Dynamic,
        }))
    }

    fn create_collider(
        &mut self,
        shape: ColliderDescriptor,
        offset: Vec3,
        sensor: bool,
        parent: Option<BodyHandle>,
        pose: Pose,
    ) -> Option<ColliderHandle> {
        if parent.is_some_and(|p| !self.is_body_valid(p)) {
            return None;
        }
        Some(ColliderHandle(self.colliders.insert(Collider {
            shape,
            offset,
            sensor,
            parent,
            pose,
        })))
    }

    fn attach_collider(&mut self, collider: ColliderHandle, body: BodyHandle) -> bool {
        if !self.is_body_valid(body) {
            return false;
        }
        match self.colliders.get_mut(collider.0) {
            Some(c) => {
                c.parent = Some(body);
                true
            }
            None => false,
        }
    }

    fn body_colliders(&self, body: BodyHandle) -> Vec<ColliderHandle> {
        self.colliders
            .iter()
            .filter(|(_, c)| c.parent == Some(body))
            .map(|(h, _)| ColliderHandle(h))
            .collect()
    }

    fn is_body_valid(&self, body: BodyHandle) -> bool {
        self.bodies.get(body.0).is_some()
    }

    fn is_collider_valid(&self, collider: ColliderHandle) -> bool {
        self.colliders.get(collider.0).is_some()
    }

    fn set_sensor(&mut self, collider: ColliderHandle, sensor: bool) -> bool {
        match self.colliders.get_mut(collider.0) {
            Some(c) => {
                c.sensor = sensor;
                true
            }
            None => false,
        }
    }

    fn is_sensor(&self, collider: ColliderHandle) -> Option<bool> {
        self.colliders.get(collider.0).map(|c| c.sensor)
    }

    fn set_body_type(&mut self, body: BodyHandle, body_type: EngineBodyType) -> bool {
        match self.bodies.get_mut(body.0) {
            Some(b) => {
                b.body_type = body_type;
                if body_type != EngineBodyType::Dynamic {
                    b.velocity = Vec3::ZERO;
                }
                true
            }
            None => false,
        }
    }

    fn body_type(&self, body: BodyHandle) -> Option<EngineBodyType> {
        self.bodies.get(body.0).map(|b| b.body_type)
    }

    fn wake_body(&mut self, body: BodyHandle) -> bool {
        match self.bodies.get_mut(body.0) {
            Some(b) => {
                b.awake = true;
                true
            }
            None => false,
        }
    }

    fn set_body_pose(&mut self, body: BodyHandle, pose: Pose) -> bool {
        match self.bodies.get_mut(body.0) {
            Some(b) => {
                b.pose = pose;
                true
            }
            None => false,
        }
    }

    fn body_pose(&self, body: BodyHandle) -> Option<Pose> {
        self.bodies.get(body.0).map(|b| b.pose)
    }

    fn set_collider_pose(&mut self, collider: ColliderHandle, pose: Pose) -> bool {
        match self.colliders.get_mut(collider.0) {
            Some(c) if c.parent.is_none() => {
                c.pose = pose;
                true
            }
            _ => false,
        }
    }

    fn resize_collider(&mut self, collider: ColliderHandle, shape: ColliderDescriptor, offset: Vec3) -> bool {
        match self.colliders.get_mut(collider.0) {
            Some(c) => {
                c.shape = shape;
                c.offset = offset;
                true
            }
            None => false,
        }
    }

    fn remove_body(&mut self, body: BodyHandle) -> bool {
        if self.bodies.remove(body.0).is_none() {
            return false;
        }
        for collider in self.body_colliders(body) {
            self.colliders.remove(collider.0);
        }
        true
    }

    fn remove_collider(&mut self, collider: ColliderHandle) -> bool {
        self.colliders.remove(collider.0).is_some()
    }

    fn step(&mut self, dt: f32) -> Vec<PhysicsEvent> {
        let gravity = self.gravity;
        for body in self.bodies.slots.iter_mut().filter_map(|slot| slot.value.as_mut()) {
            if body.body_type == EngineBodyType::Dynamic && body.awake {
                body.velocity += gravity * dt;
                body.pose.position += body.velocity * dt;
            }
        }
        self.steps += 1;

        let pending = std::mem::take(&mut self.pending);
        pending
            .into_iter()
            .filter_map(|(a, b)| {
                let ca = self.colliders.get(a.0)?;
                let cb = self.colliders.get(b.0)?;
                let kind = if ca.sensor || cb.sensor {
                    ContactKind::IntersectionEnter
                } else {
                    ContactKind::CollisionEnter
                };
                Some(PhysicsEvent {
                    kind,
                    collider1: a,
                    collider2: b,
                })
            })
            .collect()
    }
}
