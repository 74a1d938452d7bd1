//! Physics body taxonomy
//!
//! Four engine body types plus three collision-activated variants that act
//! as `Fixed` until a qualifying contact promotes them to `Dynamic`.

use serde::{Deserialize, Serialize};

/// Body types the physics engine itself understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EngineBodyType {
    Fixed,
    Dynamic,
    KinematicPosition,
    KinematicVelocity,
}

/// Configured body type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PhysicsBodyType {
    #[default]
    Fixed,
    Dynamic,
    KinematicPosition,
    KinematicVelocity,
    /// Sensor colliders while dormant, promoted on an intersection event
    NoneToDynamicOnCollision,
    /// Solid colliders while dormant, promoted on a collision event
    SolidNoneToDynamicOnCollision,
    /// Same as `NoneToDynamicOnCollision`; dormant animation is driven externally
    AnimNoneToDynamicOnCollision,
}

/// Which contact event promotes a dormant body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivationTrigger {
    /// Sensor overlap
    Intersection,
    /// Solid contact
    Collision,
}

impl PhysicsBodyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhysicsBodyType::Fixed => "fixed",
            PhysicsBodyType::Dynamic => "dynamic",
            PhysicsBodyType::KinematicPosition => "kinematicPosition",
            PhysicsBodyType::KinematicVelocity => "kinematicVelocity",
            PhysicsBodyType::NoneToDynamicOnCollision => "noneToDynamicOnCollision",
            PhysicsBodyType::SolidNoneToDynamicOnCollision => "solidNoneToDynamicOnCollision",
            PhysicsBodyType::AnimNoneToDynamicOnCollision => "animNoneToDynamicOnCollision",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "fixed" => Some(PhysicsBodyType::Fixed),
            "dynamic" => Some(PhysicsBodyType::Dynamic),
            "kinematicPosition" => Some(PhysicsBodyType::KinematicPosition),
            "kinematicVelocity" => Some(PhysicsBodyType::KinematicVelocity),
            "noneToDynamicOnCollision" => Some(PhysicsBodyType::NoneToDynamicOnCollision),
            "solidNoneToDynamicOnCollision" => Some(PhysicsBodyType::SolidNoneToDynamicOnCollision),
            "animNoneToDynamicOnCollision" => Some(PhysicsBodyType::AnimNoneToDynamicOnCollision),
            _ => None,
        }
    }

    pub fn is_collision_activated(&self) -> bool {
        self.trigger().is_some()
    }

    pub fn trigger(&self) -> Option<ActivationTrigger> {
        match self {
            PhysicsBodyType::NoneToDynamicOnCollision | PhysicsBodyType::AnimNoneToDynamicOnCollision => {
                Some(ActivationTrigger::Intersection)
            }
            PhysicsBodyType::SolidNoneToDynamicOnCollision => Some(ActivationTrigger::Collision),
            _ => None,
        }
    }

    /// Whether dormant colliders are attached as sensors
    pub fn dormant_sensors(&self) -> bool {
        self.trigger() == Some(ActivationTrigger::Intersection)
    }

    /// Whether an explicit collider shape must be inferred instead of letting
    /// the engine generate one from geometry
    pub fn forces_manual_collider(&self) -> bool {
        matches!(
            self,
            PhysicsBodyType::NoneToDynamicOnCollision | PhysicsBodyType::SolidNoneToDynamicOnCollision
        )
    }

    /// Engine body type given the activation state
    pub fn resolve(&self, fired: bool) -> EngineBodyType {
        match self {
            PhysicsBodyType::Fixed => EngineBodyType::Fixed,
            PhysicsBodyType::Dynamic => EngineBodyType::Dynamic,
            PhysicsBodyType::KinematicPosition => EngineBodyType::KinematicPosition,
            PhysicsBodyType::KinematicVelocity => EngineBodyType::KinematicVelocity,
            PhysicsBodyType::NoneToDynamicOnCollision
            | PhysicsBodyType::SolidNoneToDynamicOnCollision
            | PhysicsBodyType::AnimNoneToDynamicOnCollision => {
                if fired { EngineBodyType::Dynamic } else { EngineBodyType::Fixed }
            }
        }
    }
}

impl From<String> for PhysicsBodyType {
    fn from(s: String) -> Self {
        PhysicsBodyType::from_str(&s).unwrap_or_else(|| {
            log::debug!("Unknown body type {:?}, using fixed", s);
            PhysicsBodyType::Fixed
        })
    }
}

impl From<PhysicsBodyType> for String {
    fn from(body_type: PhysicsBodyType) -> Self {
        body_type.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLLISION_ACTIVATED: [PhysicsBodyType; 3] = [
        PhysicsBodyType::NoneToDynamicOnCollision,
        PhysicsBodyType::SolidNoneToDynamicOnCollision,
        PhysicsBodyType::AnimNoneToDynamicOnCollision,
    ];

    #[test]
    fn test_collision_activated_resolution() {
        for body in COLLISION_ACTIVATED {
            assert!(body.is_collision_activated());
            assert_eq!(body.resolve(false), EngineBodyType::Fixed);
            assert_eq!(body.resolve(true), EngineBodyType::Dynamic);
        }
    }

    #[test]
    fn test_plain_types_ignore_fired() {
        assert_eq!(PhysicsBodyType::Dynamic.resolve(false), EngineBodyType::Dynamic);
        assert_eq!(PhysicsBodyType::Fixed.resolve(true), EngineBodyType::Fixed);
        assert!(!PhysicsBodyType::KinematicPosition.is_collision_activated());
    }

    #[test]
    fn test_triggers_and_sensors() {
        assert!(PhysicsBodyType::NoneToDynamicOnCollision.dormant_sensors());
        assert!(PhysicsBodyType::AnimNoneToDynamicOnCollision.dormant_sensors());
        assert!(!PhysicsBodyType::SolidNoneToDynamicOnCollision.dormant_sensors());
        assert_eq!(
            PhysicsBodyType::SolidNoneToDynamicOnCollision.trigger(),
            Some(ActivationTrigger::Collision)
        );
        assert!(!PhysicsBodyType::AnimNoneToDynamicOnCollision.forces_manual_collider());
    }

    #[test]
    fn test_names_round_trip() {
        for body in COLLISION_ACTIVATED {
            let json = serde_json::to_string(&body).unwrap();
            let name: String = serde_json::from_str(&json).unwrap();
            assert_eq!(PhysicsBodyType::from_str(&name), Some(body));
        }
    }

    #[test]
    fn test_unknown_name_is_fixed() {
        let body: PhysicsBodyType = serde_json::from_str(r#""ragdoll""#).unwrap();
        assert_eq!(body, PhysicsBodyType::Fixed);
    }
}
