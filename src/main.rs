//! Grid Clone demo
//!
//! Loads a cloner config (or a built-in one), runs a few frames against the
//! in-memory physics world, drops a probe onto the grid and prints the final
//! transforms as JSON.
//!
//! Usage: `gridclone [config.json] [frames]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Grid Clone (native) starting...");

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => match gridclone::ClonerConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => demo::config(),
    };
    let frames: u32 = args.next().and_then(|f| f.parse().ok()).unwrap_or(120);

    if let Err(e) = demo::run(config, frames) {
        log::error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::cell::Cell;
    use std::rc::Rc;

    use glam::Vec3;
    use gridclone::cloner::ClonerOutput;
    use gridclone::cloner::effectors::{ColorSpec, Deltas, Effector, LinearFieldEffector, LoopMode, RandomEffector, TimeEffector};
    use gridclone::config::ChildDecl;
    use gridclone::physics::{BlockShape, ColliderDescriptor, ExplicitCollider, PhysicsBackend, SceneWorld};
    use gridclone::{ClonerConfig, ConfigError, GridCloner, GridSpec, PhysicsBodyType, PhysicsConfig, advance_frame};

    /// Simulation timestep (60 Hz)
    const DT: f32 = 1.0 / 60.0;

    /// A 5x1x5 slab floor that waits to be knocked loose
    pub fn config() -> ClonerConfig {
        ClonerConfig {
            grid: GridSpec {
                count: [5.0, 1.0, 5.0],
                spacing: Vec3::new(1.1, 0.0, 1.1),
                ..Default::default()
            },
            seed: 7,
            physics: Some(PhysicsConfig::new(PhysicsBodyType::NoneToDynamicOnCollision)),
            children: vec![
                ChildDecl::Block(BlockShape {
                    preset: "slab".to_string(),
                    ..Default::default()
                }),
                ChildDecl::Collider(ExplicitCollider {
                    shape: ColliderDescriptor::Cuboid {
                        half_extents: Vec3::new(0.5, 0.25, 0.5),
                    },
                    offset: Vec3::new(0.0, 0.25, 0.0),
                    sensor: false,
                }),
            ],
            effectors: vec![
                Effector::Random(RandomEffector {
                    deltas: Deltas {
                        rotation: Vec3::new(0.0, 0.2, 0.0),
                        ..Default::default()
                    },
                    ..Default::default()
                }),
                Effector::LinearField(LinearFieldEffector {
                    size: 6.0,
                    color: Some(ColorSpec::Palette(vec!["#264653".into(), "#2a9d8f".into(), "#e9c46a".into()])),
                    ..Default::default()
                }),
                Effector::Time(TimeEffector {
                    loop_mode: LoopMode::PingPong,
                    duration: 2.0,
                    clone_offset: 0.1,
                    deltas: Deltas {
                        position: Vec3::new(0.0, 0.25, 0.0),
                        ..Default::default()
                    },
                    ..Default::default()
                }),
            ],
            ..Default::default()
        }
    }

    pub fn run(config: ClonerConfig, frames: u32) -> Result<(), ConfigError> {
        let mut world = SceneWorld::new();
        let mut cloner = GridCloner::new(config);

        let activated = Rc::new(Cell::new(0u32));
        let counter = activated.clone();
        cloner.set_activation_callback(move |key, transform| {
            counter.set(counter.get() + 1);
            log::info!("Activated {:?} at {:?}", key, transform.position);
        });

        let mut probe = None;
        for frame in 0..frames {
            let elapsed = frame as f32 * DT;
            advance_frame(&mut cloner, &mut world, elapsed, DT);

            // Halfway through, drop a probe into the middle of the grid
            if frame == frames / 2 {
                let target = cloner.transforms().get(cloner.instance_count() / 2).map(|t| t.position);
                if let Some(target) = target {
                    let handle = world.spawn_probe(target, 0.75);
                    let hits = world.queue_overlaps(handle);
                    log::info!("Probe at {:?} touches {} colliders", target, hits);
                    probe = Some(handle);
                }
            }
        }
        if let Some(handle) = probe {
            world.remove_collider(handle);
        }

        log::info!(
            "{} frames, {} clones, {} activated, {} bodies",
            frames,
            cloner.instance_count(),
            activated.get(),
            world.body_count()
        );

        match cloner.output() {
            ClonerOutput::Clones(transforms) => println!("{}", serde_json::to_string_pretty(transforms)?),
            ClonerOutput::Passthrough(children) => println!("{}", serde_json::to_string_pretty(children)?),
        }
        Ok(())
    }
}
