//! Cloner configuration
//!
//! Field values never fail to load: unknown names and out-of-range numbers
//! degrade to defaults. Only reading or writing the document itself can fail.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cloner::effectors::Effector;
use crate::cloner::layout::GridSpec;
use crate::physics::{
    BlockShape, BoxShape, ColliderShape, CylinderShape, ExplicitCollider, PhysicsBodyType, SphereShape,
};

/// Failure reading or writing a configuration document
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config io error: {}", e),
            ConfigError::Parse(e) => write!(f, "config parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// World-space multiplier, given as a number or a preset name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GridUnit {
    Multiplier(f32),
    Preset(String),
}

impl Default for GridUnit {
    fn default() -> Self {
        GridUnit::Multiplier(1.0)
    }
}

impl GridUnit {
    pub fn preset_multiplier(name: &str) -> Option<f32> {
        match name.trim().to_lowercase().as_str() {
            "m" | "meter" | "meters" => Some(1.0),
            "dm" => Some(0.1),
            "cm" => Some(0.01),
            "mm" => Some(0.001),
            "ft" | "foot" | "feet" => Some(0.3048),
            "in" | "inch" | "inches" => Some(0.0254),
            "half" => Some(0.5),
            "double" => Some(2.0),
            _ => None,
        }
    }

    /// Resolved multiplier; invalid values fall back to 1
    pub fn multiplier(&self) -> f32 {
        match self {
            GridUnit::Multiplier(m) if m.is_finite() && *m > 0.0 => *m,
            GridUnit::Multiplier(m) => {
                log::debug!("Invalid grid unit {}, using 1", m);
                1.0
            }
            GridUnit::Preset(name) => Self::preset_multiplier(name).unwrap_or_else(|| {
                log::debug!("Unknown grid unit {:?}, using 1", name);
                1.0
            }),
        }
    }
}

/// Physics block of a cloner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PhysicsConfig {
    /// Master switch; off removes every body and clears frozen transforms
    pub enabled: bool,
    pub body_type: PhysicsBodyType,
    pub colliders: Vec<ExplicitCollider>,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            body_type: PhysicsBodyType::Fixed,
            colliders: Vec::new(),
        }
    }
}

impl PhysicsConfig {
    pub fn new(body_type: PhysicsBodyType) -> Self {
        Self {
            body_type,
            ..Default::default()
        }
    }
}

/// A child declared inside the cloner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ChildDecl {
    Box(BoxShape),
    Sphere(SphereShape),
    Cylinder(CylinderShape),
    Block(BlockShape),
    /// Arbitrary geometry that cannot describe its own collider
    Mesh { name: String },
    Effector { effector: Effector },
    Collider(ExplicitCollider),
}

impl ChildDecl {
    /// Collider capability of this child, if it has one
    pub fn shape(&self) -> Option<&dyn ColliderShape> {
        match self {
            ChildDecl::Box(s) => Some(s),
            ChildDecl::Sphere(s) => Some(s),
            ChildDecl::Cylinder(s) => Some(s),
            ChildDecl::Block(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_effector(&self) -> bool {
        matches!(self, ChildDecl::Effector { .. })
    }

    /// Whether this child is rendered geometry
    pub fn is_geometry(&self) -> bool {
        !matches!(self, ChildDecl::Effector { .. } | ChildDecl::Collider(_))
    }
}

/// Complete cloner declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClonerConfig {
    pub enabled: bool,
    pub grid: GridSpec,
    pub grid_unit: GridUnit,
    /// Master seed for effectors declared `"unseeded"`
    pub seed: u64,
    pub physics: Option<PhysicsConfig>,
    pub children: Vec<ChildDecl>,
    pub effectors: Vec<Effector>,
}

impl Default for ClonerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            grid: GridSpec::default(),
            grid_unit: GridUnit::default(),
            seed: 0,
            physics: None,
            children: Vec::new(),
            effectors: Vec::new(),
        }
    }
}

impl ClonerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded cloner config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json_string()?)?;
        log::info!("Cloner config saved to {}", path.display());
        Ok(())
    }

    /// Effectors declared as children, in declaration order
    pub fn child_effectors(&self) -> Vec<Effector> {
        self.children
            .iter()
            .filter_map(|child| match child {
                ChildDecl::Effector { effector } => Some(effector.clone()),
                _ => None,
            })
            .collect()
    }

    /// Explicit colliders: the physics block's list followed by collider children
    pub fn explicit_colliders(&self) -> Vec<ExplicitCollider> {
        let mut colliders = self.physics.as_ref().map(|p| p.colliders.clone()).unwrap_or_default();
        colliders.extend(self.children.iter().filter_map(|child| match child {
            ChildDecl::Collider(c) => Some(c.clone()),
            _ => None,
        }));
        colliders
    }

    /// First non-effector, non-collider child; the collider inference source
    pub fn shape_source(&self) -> Option<&ChildDecl> {
        self.children.iter().find(|child| child.is_geometry())
    }

    /// Physics block when physics is switched on
    pub fn active_physics(&self) -> Option<&PhysicsConfig> {
        self.physics.as_ref().filter(|p| p.enabled)
    }
}
