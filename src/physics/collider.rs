//! Collider descriptors and shape inference
//!
//! Primitive children describe their own collider through [`ColliderShape`];
//! the cloner never inspects concrete child types to pick a shape.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::body_type::PhysicsBodyType;
use crate::consts::EPSILON;

/// Collider primitive handed to the physics engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ColliderDescriptor {
    #[serde(rename_all = "camelCase")]
    Cuboid { half_extents: Vec3 },
    Ball { radius: f32 },
    #[serde(rename_all = "camelCase")]
    Cylinder { half_height: f32, radius: f32 },
    /// Let the engine derive a collider from rendered geometry
    Auto,
}

impl ColliderDescriptor {
    /// Scale by the absolute per-axis scale; balls take the largest axis
    pub fn scaled(&self, scale: Vec3) -> Self {
        let s = scale.abs();
        match *self {
            ColliderDescriptor::Cuboid { half_extents } => ColliderDescriptor::Cuboid {
                half_extents: (half_extents * s).max(Vec3::splat(EPSILON)),
            },
            ColliderDescriptor::Ball { radius } => ColliderDescriptor::Ball {
                radius: (radius * s.max_element()).max(EPSILON),
            },
            ColliderDescriptor::Cylinder { half_height, radius } => ColliderDescriptor::Cylinder {
                half_height: (half_height * s.y).max(EPSILON),
                radius: (radius * s.x.max(s.z)).max(EPSILON),
            },
            ColliderDescriptor::Auto => ColliderDescriptor::Auto,
        }
    }

    /// Half size of an axis-aligned box enclosing the shape
    pub fn half_bounds(&self) -> Vec3 {
        match *self {
            ColliderDescriptor::Cuboid { half_extents } => half_extents,
            ColliderDescriptor::Ball { radius } => Vec3::splat(radius),
            ColliderDescriptor::Cylinder { half_height, radius } => Vec3::new(radius, half_height, radius),
            ColliderDescriptor::Auto => Vec3::splat(0.5),
        }
    }
}

/// A collider plus its offset from the instance origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InferredCollider {
    pub shape: ColliderDescriptor,
    pub offset: Vec3,
}

impl InferredCollider {
    pub fn scaled(&self, scale: Vec3) -> Self {
        Self {
            shape: self.shape.scaled(scale),
            offset: self.offset * scale,
        }
    }
}

/// Collider declared directly on the cloner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplicitCollider {
    pub shape: ColliderDescriptor,
    pub offset: Vec3,
    /// Sensor flag for plain body types; collision-activated bodies drive it
    /// from their activation state
    pub sensor: bool,
}

impl Default for ExplicitCollider {
    fn default() -> Self {
        Self {
            shape: ColliderDescriptor::Cuboid {
                half_extents: Vec3::splat(0.5),
            },
            offset: Vec3::ZERO,
            sensor: false,
        }
    }
}

/// Where a primitive sits relative to its origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Anchor {
    #[default]
    Center,
    /// Origin at the bottom face; the shape extends up
    Bottom,
    /// Origin at the top face; the shape extends down
    Top,
}

impl Anchor {
    /// Offset from origin to shape center for a shape of the given half height
    pub fn offset(&self, half_height: f32) -> Vec3 {
        match self {
            Anchor::Center => Vec3::ZERO,
            Anchor::Bottom => Vec3::new(0.0, half_height, 0.0),
            Anchor::Top => Vec3::new(0.0, -half_height, 0.0),
        }
    }
}

/// Implemented by every child that can describe its own collider
pub trait ColliderShape {
    fn collider(&self) -> InferredCollider;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxShape {
    pub size: Vec3,
    pub anchor: Anchor,
}

impl Default for BoxShape {
    fn default() -> Self {
        Self {
            size: Vec3::ONE,
            anchor: Anchor::Center,
        }
    }
}

impl ColliderShape for BoxShape {
    fn collider(&self) -> InferredCollider {
        let half = self.size.abs() * 0.5;
        InferredCollider {
            shape: ColliderDescriptor::Cuboid { half_extents: half },
            offset: self.anchor.offset(half.y),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereShape {
    pub radius: f32,
    pub anchor: Anchor,
}

impl Default for SphereShape {
    fn default() -> Self {
        Self {
            radius: 0.5,
            anchor: Anchor::Center,
        }
    }
}

impl ColliderShape for SphereShape {
    fn collider(&self) -> InferredCollider {
        let radius = self.radius.abs();
        InferredCollider {
            shape: ColliderDescriptor::Ball { radius },
            offset: self.anchor.offset(radius),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CylinderShape {
    pub radius: f32,
    pub height: f32,
    pub anchor: Anchor,
}

impl Default for CylinderShape {
    fn default() -> Self {
        Self {
            radius: 0.5,
            height: 1.0,
            anchor: Anchor::Center,
        }
    }
}

impl ColliderShape for CylinderShape {
    fn collider(&self) -> InferredCollider {
        let half_height = self.height.abs() * 0.5;
        InferredCollider {
            shape: ColliderDescriptor::Cylinder {
                half_height,
                radius: self.radius.abs(),
            },
            offset: self.anchor.offset(half_height),
        }
    }
}

/// Named block sizes (full extents, meters)
const BLOCK_PRESETS: [(&str, [f32; 3]); 7] = [
    ("cube", [1.0, 1.0, 1.0]),
    ("slab", [1.0, 0.5, 1.0]),
    ("brick", [1.0, 0.5, 0.5]),
    ("plank", [2.0, 0.125, 0.5]),
    ("pillar", [0.5, 2.0, 0.5]),
    ("tile", [1.0, 0.0625, 1.0]),
    ("beam", [4.0, 0.25, 0.25]),
];

/// Size of a block preset; unknown names resolve to a unit cube
pub fn block_preset_size(name: &str) -> Vec3 {
    let lower = name.trim().to_lowercase();
    match BLOCK_PRESETS.iter().find(|(preset, _)| *preset == lower) {
        Some((_, size)) => Vec3::from_array(*size),
        None => {
            log::debug!("Unknown block preset {:?}, using cube", name);
            Vec3::ONE
        }
    }
}

/// Composite block resolved through the preset table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockShape {
    pub preset: String,
    pub anchor: Anchor,
}

impl Default for BlockShape {
    fn default() -> Self {
        Self {
            preset: "cube".to_string(),
            anchor: Anchor::Bottom,
        }
    }
}

impl ColliderShape for BlockShape {
    fn collider(&self) -> InferredCollider {
        BoxShape {
            size: block_preset_size(&self.preset),
            anchor: self.anchor,
        }
        .collider()
    }
}

/// Whether the collider has to be inferred rather than engine-generated
pub fn needs_manual_collider(body_type: PhysicsBodyType, animates_scale: bool) -> bool {
    animates_scale || body_type.forces_manual_collider()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_anchor_offsets() {
        let bottom = BoxShape {
            size: Vec3::new(2.0, 4.0, 2.0),
            anchor: Anchor::Bottom,
        }
        .collider();
        assert_eq!(bottom.offset, Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(
            bottom.shape,
            ColliderDescriptor::Cuboid {
                half_extents: Vec3::new(1.0, 2.0, 1.0)
            }
        );
        let top = BoxShape {
            size: Vec3::ONE,
            anchor: Anchor::Top,
        }
        .collider();
        assert_eq!(top.offset, Vec3::new(0.0, -0.5, 0.0));
    }

    #[test]
    fn test_ball_uses_max_axis_scale() {
        let ball = SphereShape::default().collider().scaled(Vec3::new(1.0, -3.0, 2.0));
        assert_eq!(ball.shape, ColliderDescriptor::Ball { radius: 1.5 });
    }

    #[test]
    fn test_cylinder_scaling() {
        let cyl = CylinderShape {
            radius: 1.0,
            height: 2.0,
            anchor: Anchor::Center,
        }
        .collider()
        .scaled(Vec3::new(2.0, 3.0, -4.0));
        assert_eq!(
            cyl.shape,
            ColliderDescriptor::Cylinder {
                half_height: 3.0,
                radius: 4.0
            }
        );
    }

    #[test]
    fn test_cuboid_uses_absolute_scale() {
        let shape = ColliderDescriptor::Cuboid {
            half_extents: Vec3::ONE,
        };
        assert_eq!(
            shape.scaled(Vec3::new(-2.0, 0.5, 1.0)),
            ColliderDescriptor::Cuboid {
                half_extents: Vec3::new(2.0, 0.5, 1.0)
            }
        );
        assert_eq!(ColliderDescriptor::Auto.scaled(Vec3::splat(9.0)), ColliderDescriptor::Auto);
    }

    #[test]
    fn test_block_presets() {
        assert_eq!(block_preset_size("Slab"), Vec3::new(1.0, 0.5, 1.0));
        assert_eq!(block_preset_size("nonsense"), Vec3::ONE);
        let block = BlockShape {
            preset: "pillar".into(),
            anchor: Anchor::Bottom,
        }
        .collider();
        assert_eq!(block.offset, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_manual_collider_rules() {
        assert!(needs_manual_collider(PhysicsBodyType::NoneToDynamicOnCollision, false));
        assert!(needs_manual_collider(PhysicsBodyType::SolidNoneToDynamicOnCollision, false));
        assert!(!needs_manual_collider(PhysicsBodyType::AnimNoneToDynamicOnCollision, false));
        assert!(!needs_manual_collider(PhysicsBodyType::Fixed, false));
        assert!(needs_manual_collider(PhysicsBodyType::Fixed, true));
    }

    #[test]
    fn test_descriptor_json() {
        let json = r#"{"shape": {"type": "cylinder", "halfHeight": 1, "radius": 0.25}, "sensor": true}"#;
        let collider: ExplicitCollider = serde_json::from_str(json).unwrap();
        assert!(collider.sensor);
        assert_eq!(
            collider.shape,
            ColliderDescriptor::Cylinder {
                half_height: 1.0,
                radius: 0.25
            }
        );
        assert_eq!(collider.offset, Vec3::ZERO);
    }
}
