//! Per-clone evaluated transform

use std::collections::BTreeMap;

use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::layout::{GridKey, LayoutCell};
use crate::floor_scale;

/// Final transform, visibility and color of one clone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneTransform {
    pub key: GridKey,
    pub index: u32,
    pub local_position: Vec3,
    pub position: Vec3,
    /// XYZ Euler angles in radians
    pub rotation: Vec3,
    /// Every component is at least `consts::MIN_SCALE`
    pub scale: Vec3,
    pub hidden: bool,
    pub color: Option<Vec3>,
    pub material_colors: BTreeMap<String, Vec3>,
}

impl CloneTransform {
    pub fn new(
        cell: &LayoutCell,
        position: Vec3,
        rotation: Vec3,
        scale: Vec3,
        hidden: bool,
        color: Option<Vec3>,
        material_colors: BTreeMap<String, Vec3>,
    ) -> Self {
        Self {
            key: cell.key,
            index: cell.index,
            local_position: cell.local_position,
            position,
            rotation,
            scale: floor_scale(scale),
            hidden,
            color,
            material_colors,
        }
    }

    /// Untouched transform at the cell's layout position
    pub fn identity(cell: &LayoutCell) -> Self {
        Self::new(cell, cell.local_position, Vec3::ZERO, Vec3::ONE, false, None, BTreeMap::new())
    }

    pub fn quat(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.position)
    }
}
