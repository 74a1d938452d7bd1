//! Grid cloner orchestration
//!
//! Per frame: evaluate layout and effectors for every clone that is not
//! frozen, keep the physics representation in step with the result, then
//! let the caller run exactly one physics step and hand its contact events
//! back. Activated clones keep the transform they had when they fired.

use std::collections::HashMap;

use super::effectors::{Effector, EffectorPipeline, EvalContext};
use super::frozen::FrozenTable;
use super::layout::{GridKey, GridSpec, LayoutCell, generate_layout};
use super::transform::CloneTransform;
use crate::config::{ChildDecl, ClonerConfig, GridUnit, PhysicsConfig};
use crate::physics::{
    ActivationTrigger, ColliderHandle, ContactKind, EngineBodyType, InstancePhysics, PhysicsBackend,
    PhysicsBodyType, PhysicsEvent, PhysicsPlan, Pose,
};

/// Called once per clone when its physics activates
pub type ActivationCallback = Box<dyn FnMut(GridKey, &CloneTransform)>;

/// What a consumer should render
#[derive(Debug, Clone, Copy)]
pub enum ClonerOutput<'a> {
    /// Cloning is disabled; render the declared children once, unmodified
    Passthrough(&'a [ChildDecl]),
    Clones(&'a [CloneTransform]),
}

pub struct GridCloner {
    config: ClonerConfig,
    pipeline: EffectorPipeline,
    layout: Vec<LayoutCell>,
    transforms: Vec<CloneTransform>,
    frozen: FrozenTable,
    plan: Option<PhysicsPlan>,
    instances: Vec<Option<InstancePhysics>>,
    owners: HashMap<ColliderHandle, u32>,
    on_activate: Option<ActivationCallback>,
    transforms_dirty: bool,
    physics_dirty: bool,
}

impl std::fmt::Debug for GridCloner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridCloner")
            .field("config", &self.config)
            .field("instances", &self.layout.len())
            .field("frozen", &self.frozen.len())
            .field("plan", &self.plan)
            .finish_non_exhaustive()
    }
}

impl GridCloner {
    pub fn new(config: ClonerConfig) -> Self {
        let pipeline = EffectorPipeline::new(config.child_effectors(), config.effectors.clone(), config.seed);
        let layout = generate_layout(&config.grid, config.grid_unit.multiplier());
        let transforms = layout.iter().map(CloneTransform::identity).collect();
        let frozen = FrozenTable::new(layout.len());
        Self {
            config,
            pipeline,
            layout,
            transforms,
            frozen,
            plan: None,
            instances: Vec::new(),
            owners: HashMap::new(),
            on_activate: None,
            transforms_dirty: true,
            physics_dirty: true,
        }
    }

    pub fn config(&self) -> &ClonerConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &EffectorPipeline {
        &self.pipeline
    }

    pub fn layout(&self) -> &[LayoutCell] {
        &self.layout
    }

    pub fn instance_count(&self) -> usize {
        self.layout.len()
    }

    /// Whether transforms change with elapsed time
    pub fn is_animated(&self) -> bool {
        self.pipeline.is_time_driven()
    }

    pub fn set_activation_callback(&mut self, callback: impl FnMut(GridKey, &CloneTransform) + 'static) {
        self.on_activate = Some(Box::new(callback));
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.config.enabled == enabled {
            return;
        }
        self.config.enabled = enabled;
        self.transforms_dirty = true;
        self.physics_dirty = true;
    }

    /// Reconfigure the grid; clears every frozen transform if anything changed
    pub fn set_grid(&mut self, grid: GridSpec) {
        if self.config.grid == grid {
            return;
        }
        self.config.grid = grid;
        self.relayout();
    }

    pub fn set_grid_unit(&mut self, unit: GridUnit) {
        if self.config.grid_unit == unit {
            return;
        }
        self.config.grid_unit = unit;
        self.relayout();
    }

    fn relayout(&mut self) {
        self.layout = generate_layout(&self.config.grid, self.config.grid_unit.multiplier());
        self.transforms = self.layout.iter().map(CloneTransform::identity).collect();
        self.frozen.reset(self.layout.len());
        self.transforms_dirty = true;
        self.physics_dirty = true;
        log::debug!("Grid reconfigured: {} clones", self.layout.len());
    }

    /// Replace the listed effectors. Frozen clones stay frozen and their
    /// bodies are rebuilt where the engine last had them.
    pub fn set_effectors(&mut self, effectors: Vec<Effector>) {
        self.config.effectors = effectors;
        self.pipeline = EffectorPipeline::new(
            self.config.child_effectors(),
            self.config.effectors.clone(),
            self.config.seed,
        );
        self.transforms_dirty = true;
        self.physics_dirty = true;
    }

    fn active_body_type(&self) -> Option<PhysicsBodyType> {
        self.config.active_physics().map(|p| p.body_type)
    }

    /// Replace the physics block. A different body type (including turning
    /// physics off) clears the frozen table and re-arms every clone.
    pub fn set_physics(&mut self, physics: Option<PhysicsConfig>) {
        if self.config.physics == physics {
            return;
        }
        let before = self.active_body_type();
        self.config.physics = physics;
        if self.active_body_type() != before {
            self.frozen.reset(self.layout.len());
            self.transforms_dirty = true;
        }
        self.physics_dirty = true;
    }

    pub fn set_body_type(&mut self, body_type: PhysicsBodyType) {
        let mut physics = self.config.physics.clone().unwrap_or_default();
        physics.body_type = body_type;
        self.set_physics(Some(physics));
    }

    /// Evaluate clones and bring physics in line. Call once per frame before
    /// stepping the physics engine.
    pub fn update(&mut self, elapsed: f32, backend: &mut dyn PhysicsBackend) {
        if !self.config.enabled {
            if !self.instances.is_empty() {
                self.teardown(backend);
            }
            self.physics_dirty = true;
            return;
        }

        if self.transforms_dirty || self.pipeline.is_time_driven() {
            self.evaluate(elapsed);
        }
        if self.physics_dirty {
            self.rebuild_physics(backend);
        } else if let Some(plan) = &self.plan {
            for (slot, transform) in self.instances.iter_mut().zip(&self.transforms) {
                if let Some(instance) = slot {
                    instance.sync(plan, transform, backend);
                }
            }
        }
    }

    fn evaluate(&mut self, elapsed: f32) {
        let ctx = EvalContext {
            elapsed,
            unit: self.config.grid_unit.multiplier(),
        };
        let pipeline = &mut self.pipeline;
        let frozen = &self.frozen;
        self.transforms.clear();
        self.transforms.extend(self.layout.iter().map(|cell| match frozen.get_index(cell.index as usize) {
            Some(snapshot) => snapshot.clone(),
            None => pipeline.evaluate(cell, &ctx),
        }));
        self.transforms_dirty = false;
    }

    fn rebuild_physics(&mut self, backend: &mut dyn PhysicsBackend) {
        // Engine-owned poses of fired clones survive the rebuild; velocity does not
        let live: Vec<Option<Pose>> = self
            .instances
            .iter()
            .map(|slot| {
                slot.as_ref()
                    .filter(|instance| instance.state().is_fired())
                    .and_then(InstancePhysics::body)
                    .and_then(|body| backend.body_pose(body))
            })
            .collect();
        self.teardown(backend);
        self.physics_dirty = false;

        let Some(physics) = self.config.active_physics() else {
            self.frozen.reset(self.layout.len());
            return;
        };
        let plan = PhysicsPlan::new(
            physics.body_type,
            self.config.explicit_colliders(),
            self.config.shape_source().and_then(ChildDecl::shape),
            self.pipeline.animates_scale(),
        );

        self.instances = self
            .transforms
            .iter()
            .enumerate()
            .map(|(index, transform)| {
                let mut instance = InstancePhysics::build(&plan, transform, backend);
                // Clones that already fired come back armed, without a second callback
                if self.frozen.get_index(index).is_some() {
                    instance.promote(&plan, transform, backend);
                    if let (Some(Some(pose)), Some(body)) = (live.get(index), instance.body()) {
                        backend.set_body_pose(body, *pose);
                    }
                }
                Some(instance)
            })
            .collect();

        for (index, instance) in self.instances.iter().enumerate() {
            if let Some(instance) = instance {
                for collider in instance.colliders() {
                    self.owners.insert(collider, index as u32);
                }
            }
        }
        log::info!(
            "Built {} physics for {} clones ({} frozen)",
            physics.body_type.as_str(),
            self.instances.len(),
            self.frozen.len()
        );
        self.plan = Some(plan);
    }

    /// Remove every body and collider this cloner created
    pub fn teardown(&mut self, backend: &mut dyn PhysicsBackend) {
        for instance in self.instances.drain(..).flatten() {
            instance.teardown(backend);
        }
        self.owners.clear();
        self.plan = None;
        self.physics_dirty = true;
    }

    /// Dispatch contact events from one physics step. Returns the number of
    /// clones activated.
    pub fn handle_contacts(&mut self, events: &[PhysicsEvent], backend: &mut dyn PhysicsBackend) -> usize {
        let Some(trigger) = self.plan.as_ref().and_then(|p| p.body_type.trigger()) else {
            return 0;
        };
        let mut activated = 0;
        for event in events {
            let kind = match event.kind {
                ContactKind::CollisionEnter => ActivationTrigger::Collision,
                ContactKind::IntersectionEnter => ActivationTrigger::Intersection,
            };
            if kind != trigger {
                continue;
            }
            for collider in [event.collider1, event.collider2] {
                let Some(&index) = self.owners.get(&collider) else {
                    continue;
                };
                if self.activate_index(index as usize, backend) {
                    activated += 1;
                }
            }
        }
        activated
    }

    /// Activate a clone without a contact event
    pub fn activate(&mut self, key: GridKey, backend: &mut dyn PhysicsBackend) -> bool {
        match self.config.grid.flat_index(key) {
            Some(index) => self.activate_index(index, backend),
            None => false,
        }
    }

    fn activate_index(&mut self, index: usize, backend: &mut dyn PhysicsBackend) -> bool {
        let Some(plan) = &self.plan else {
            return false;
        };
        let (Some(Some(instance)), Some(transform)) = (self.instances.get_mut(index), self.transforms.get(index))
        else {
            return false;
        };
        if !instance.promote(plan, transform, backend) {
            return false;
        }
        for collider in instance.colliders() {
            self.owners.insert(collider, index as u32);
        }

        let snapshot = transform.clone();
        self.frozen.freeze(index, snapshot.clone());
        log::info!("Clone {:?} activated", snapshot.key);
        if let Some(callback) = self.on_activate.as_mut() {
            callback(snapshot.key, &snapshot);
        }
        true
    }

    pub fn output(&self) -> ClonerOutput<'_> {
        if self.config.enabled {
            ClonerOutput::Clones(&self.transforms)
        } else {
            ClonerOutput::Passthrough(&self.config.children)
        }
    }

    pub fn transforms(&self) -> &[CloneTransform] {
        &self.transforms
    }

    pub fn transform(&self, key: GridKey) -> Option<&CloneTransform> {
        self.transforms.get(self.config.grid.flat_index(key)?)
    }

    pub fn frozen(&self) -> &FrozenTable {
        &self.frozen
    }

    pub fn instance_physics(&self, key: GridKey) -> Option<&InstancePhysics> {
        self.instances.get(self.config.grid.flat_index(key)?)?.as_ref()
    }

    pub fn is_fired(&self, key: GridKey) -> bool {
        self.instance_physics(key).is_some_and(|i| i.state().is_fired())
    }

    /// Engine body type a clone currently resolves to
    pub fn resolved_body_type(&self, key: GridKey) -> Option<EngineBodyType> {
        let plan = self.plan.as_ref()?;
        Some(self.instance_physics(key)?.resolved_type(plan))
    }
}

/// Run one frame: evaluate, step physics once, dispatch its events.
/// Returns the number of clones activated during the step.
pub fn advance_frame(cloner: &mut GridCloner, backend: &mut dyn PhysicsBackend, elapsed: f32, dt: f32) -> usize {
    cloner.update(elapsed, backend);
    let events = backend.step(dt);
    cloner.handle_contacts(&events, backend)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use glam::Vec3;

    use super::*;
    use crate::cloner::effectors::{Deltas, LoopMode, TimeEffector};
    use crate::physics::{BoxShape, ExplicitCollider, SceneWorld};

    fn grid(count: [f32; 3], spacing: Vec3) -> GridSpec {
        GridSpec {
            count,
            spacing,
            ..Default::default()
        }
    }

    fn drifting() -> Effector {
        Effector::Time(TimeEffector {
            loop_mode: LoopMode::None,
            duration: 10.0,
            deltas: Deltas {
                position: Vec3::X,
                ..Default::default()
            },
            ..Default::default()
        })
    }

    fn collision_cloner(body_type: PhysicsBodyType) -> GridCloner {
        GridCloner::new(ClonerConfig {
            grid: grid([2.0, 1.0, 1.0], Vec3::new(4.0, 0.0, 0.0)),
            physics: Some(PhysicsConfig::new(body_type)),
            children: vec![
                ChildDecl::Box(BoxShape::default()),
                ChildDecl::Collider(ExplicitCollider::default()),
            ],
            effectors: vec![drifting()],
            ..Default::default()
        })
    }

    fn first_collider(cloner: &GridCloner, key: GridKey) -> ColliderHandle {
        cloner.instance_physics(key).and_then(|i| i.colliders().next()).unwrap()
    }

    #[test]
    fn test_two_by_two_scenario() {
        let mut cloner = GridCloner::new(ClonerConfig {
            grid: grid([2.0, 2.0, 1.0], Vec3::new(2.0, 2.0, 0.0)),
            ..Default::default()
        });
        cloner.update(0.0, &mut SceneWorld::new());
        let positions: Vec<Vec3> = cloner.transforms().iter().map(|t| t.position).collect();
        assert_eq!(
            positions,
            vec![
                Vec3::new(-1.0, -1.0, 0.0),
                Vec3::new(1.0, -1.0, 0.0),
                Vec3::new(-1.0, 1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_solid_dormant_then_dynamic() {
        let mut world = SceneWorld::new();
        let mut cloner = collision_cloner(PhysicsBodyType::SolidNoneToDynamicOnCollision);
        let key = GridKey::new(0, 0, 0);
        advance_frame(&mut cloner, &mut world, 1.0, 0.0);

        assert_eq!(cloner.resolved_body_type(key), Some(EngineBodyType::Fixed));
        let collider = first_collider(&cloner, key);
        assert_eq!(world.is_sensor(collider), Some(false));
        let before = cloner.transform(key).unwrap().clone();

        let probe = world.spawn_probe(before.position, 0.25);
        world.queue_contact(probe, collider);
        let activated = advance_frame(&mut cloner, &mut world, 1.0, 0.0);
        assert_eq!(activated, 1);
        assert_eq!(cloner.resolved_body_type(key), Some(EngineBodyType::Dynamic));
        let body = cloner.instance_physics(key).unwrap().body().unwrap();
        assert_eq!(world.body_type(body), Some(EngineBodyType::Dynamic));
        assert_eq!(cloner.frozen().get(&cloner.config().grid, key), Some(&before));
        assert_eq!(cloner.resolved_body_type(GridKey::new(1, 0, 0)), Some(EngineBodyType::Fixed));
    }

    #[test]
    fn test_activation_is_one_way() {
        let mut world = SceneWorld::new();
        let mut cloner = collision_cloner(PhysicsBodyType::NoneToDynamicOnCollision);
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        cloner.set_activation_callback(move |_, _| counter.set(counter.get() + 1));

        let key = GridKey::new(1, 0, 0);
        advance_frame(&mut cloner, &mut world, 1.0, 0.0);
        let collider = first_collider(&cloner, key);
        let probe = world.spawn_probe(Vec3::ZERO, 0.1);
        world.queue_contact(probe, collider);
        advance_frame(&mut cloner, &mut world, 1.0, 0.0);
        let frozen = cloner.transform(key).unwrap().clone();

        for frame in 2..6 {
            world.queue_contact(probe, collider);
            world.queue_contact(collider, probe);
            assert_eq!(advance_frame(&mut cloner, &mut world, frame as f32, 0.0), 0);
            assert!(!cloner.activate(key, &mut world));
        }
        assert_eq!(fired.get(), 1);
        assert_eq!(cloner.transform(key), Some(&frozen));
        // The other clone keeps animating
        assert!(cloner.transform(GridKey::new(0, 0, 0)).unwrap().position.x > -2.0 + 0.1 * 1.5);
    }

    #[test]
    fn test_wrong_event_kind_is_ignored() {
        let mut world = SceneWorld::new();
        let mut cloner = collision_cloner(PhysicsBodyType::SolidNoneToDynamicOnCollision);
        cloner.update(0.0, &mut world);
        let collider = first_collider(&cloner, GridKey::new(0, 0, 0));
        let probe = world.spawn_probe(Vec3::ZERO, 0.1);
        let event = PhysicsEvent {
            kind: ContactKind::IntersectionEnter,
            collider1: probe,
            collider2: collider,
        };
        assert_eq!(cloner.handle_contacts(&[event], &mut world), 0);
        assert!(!cloner.is_fired(GridKey::new(0, 0, 0)));
    }

    #[test]
    fn test_body_type_change_rearms() {
        let mut world = SceneWorld::new();
        let mut cloner = collision_cloner(PhysicsBodyType::NoneToDynamicOnCollision);
        let key = GridKey::new(0, 0, 0);
        cloner.update(0.0, &mut world);
        assert!(cloner.activate(key, &mut world));
        assert!(cloner.is_fired(key));

        cloner.set_body_type(PhysicsBodyType::SolidNoneToDynamicOnCollision);
        cloner.update(0.0, &mut world);
        assert!(!cloner.is_fired(key));
        assert!(cloner.frozen().is_empty());
        assert_eq!(cloner.resolved_body_type(key), Some(EngineBodyType::Fixed));
        // Old bodies are gone; two dormant colliders remain
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.collider_count(), 2);
    }

    #[test]
    fn test_rebuild_keeps_fired_clones_armed() {
        let mut world = SceneWorld::new();
        let mut cloner = collision_cloner(PhysicsBodyType::NoneToDynamicOnCollision);
        let key = GridKey::new(0, 0, 0);
        cloner.update(0.0, &mut world);
        cloner.activate(key, &mut world);

        cloner.set_effectors(Vec::new());
        cloner.update(0.0, &mut world);
        assert!(cloner.is_fired(key));
        assert_eq!(cloner.frozen().len(), 1);
        assert_eq!(world.body_count(), 1);
    }

    #[test]
    fn test_rebuild_keeps_live_body_pose() {
        let mut world = SceneWorld::new();
        let mut cloner = collision_cloner(PhysicsBodyType::NoneToDynamicOnCollision);
        let key = GridKey::new(0, 0, 0);
        cloner.update(0.0, &mut world);
        cloner.activate(key, &mut world);
        for _ in 0..10 {
            advance_frame(&mut cloner, &mut world, 0.0, 0.1);
        }
        let body = cloner.instance_physics(key).and_then(InstancePhysics::body).unwrap();
        let fallen = world.body_pose(body).unwrap();
        assert!(fallen.position.y < cloner.transform(key).unwrap().position.y);

        cloner.set_effectors(Vec::new());
        cloner.update(0.0, &mut world);
        let body = cloner.instance_physics(key).and_then(InstancePhysics::body).unwrap();
        assert_eq!(world.body_pose(body), Some(fallen));
    }

    #[test]
    fn test_any_collider_activates_whole_clone() {
        let two_colliders = |body_type| {
            let mut config = collision_cloner(body_type).config().clone();
            config.children.push(ChildDecl::Collider(ExplicitCollider {
                offset: Vec3::Y,
                ..Default::default()
            }));
            let mut cloner = GridCloner::new(config);
            let fired = Rc::new(Cell::new(0));
            let counter = fired.clone();
            cloner.set_activation_callback(move |_, _| counter.set(counter.get() + 1));
            (cloner, fired)
        };
        let key = GridKey::new(0, 0, 0);

        // Only the second collider is hit
        let mut world = SceneWorld::new();
        let (mut cloner, fired) = two_colliders(PhysicsBodyType::SolidNoneToDynamicOnCollision);
        cloner.update(0.0, &mut world);
        let colliders: Vec<ColliderHandle> = cloner.instance_physics(key).unwrap().colliders().collect();
        assert_eq!(colliders.len(), 2);
        let probe = world.spawn_probe(Vec3::ZERO, 0.1);
        world.queue_contact(probe, colliders[1]);
        assert_eq!(advance_frame(&mut cloner, &mut world, 0.0, 0.0), 1);
        assert_eq!(fired.get(), 1);
        assert!(cloner.is_fired(key));
        let body = cloner.instance_physics(key).and_then(InstancePhysics::body).unwrap();
        assert_eq!(world.body_colliders(body).len(), 2);

        // Both colliders in the same step
        let mut world = SceneWorld::new();
        let (mut cloner, fired) = two_colliders(PhysicsBodyType::SolidNoneToDynamicOnCollision);
        cloner.update(0.0, &mut world);
        let colliders: Vec<ColliderHandle> = cloner.instance_physics(key).unwrap().colliders().collect();
        let probe = world.spawn_probe(Vec3::ZERO, 0.1);
        world.queue_contact(probe, colliders[1]);
        world.queue_contact(colliders[0], probe);
        assert_eq!(advance_frame(&mut cloner, &mut world, 0.0, 0.0), 1);
        assert_eq!(fired.get(), 1);
        assert!(cloner.is_fired(key));
        assert!(!cloner.is_fired(GridKey::new(1, 0, 0)));
    }

    #[test]
    fn test_grid_change_clears_frozen() {
        let mut world = SceneWorld::new();
        let mut cloner = collision_cloner(PhysicsBodyType::NoneToDynamicOnCollision);
        cloner.update(0.0, &mut world);
        cloner.activate(GridKey::new(0, 0, 0), &mut world);
        cloner.set_grid(grid([3.0, 1.0, 1.0], Vec3::ONE));
        cloner.update(0.0, &mut world);
        assert!(cloner.frozen().is_empty());
        assert_eq!(cloner.instance_count(), 3);
        assert_eq!(world.collider_count(), 3);
    }

    #[test]
    fn test_disabled_passes_children_through() {
        let mut world = SceneWorld::new();
        let mut cloner = collision_cloner(PhysicsBodyType::Fixed);
        cloner.update(0.0, &mut world);
        assert_eq!(world.body_count(), 2);

        cloner.set_enabled(false);
        cloner.update(0.0, &mut world);
        assert_eq!(world.body_count(), 0);
        match cloner.output() {
            ClonerOutput::Passthrough(children) => assert_eq!(children.len(), 2),
            ClonerOutput::Clones(_) => panic!("expected passthrough"),
        }

        cloner.set_enabled(true);
        cloner.update(0.0, &mut world);
        assert_eq!(world.body_count(), 2);
    }

    #[test]
    fn test_plain_dynamic_bodies_fall() {
        let mut world = SceneWorld::new();
        let mut cloner = GridCloner::new(ClonerConfig {
            physics: Some(PhysicsConfig::new(PhysicsBodyType::Dynamic)),
            ..Default::default()
        });
        let key = GridKey::new(0, 0, 0);
        advance_frame(&mut cloner, &mut world, 0.0, 0.1);
        let body = cloner.instance_physics(key).unwrap().body().unwrap();
        assert!(world.body_pose(body).unwrap().position.y < 0.0);
        assert!(!cloner.activate(key, &mut world));
    }

    #[test]
    fn test_kinematic_follows_animation() {
        let mut world = SceneWorld::new();
        let mut cloner = GridCloner::new(ClonerConfig {
            physics: Some(PhysicsConfig::new(PhysicsBodyType::KinematicPosition)),
            effectors: vec![drifting()],
            ..Default::default()
        });
        let key = GridKey::new(0, 0, 0);
        cloner.update(0.0, &mut world);
        cloner.update(5.0, &mut world);
        let body = cloner.instance_physics(key).unwrap().body().unwrap();
        assert!((world.body_pose(body).unwrap().position.x - 0.5).abs() < 1e-5);
    }
}
