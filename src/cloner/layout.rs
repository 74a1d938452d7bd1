//! Grid layout generation
//!
//! Instances are visited `y` outer, `z` middle, `x` inner. The flat index
//! assigned in that order salts the Random/Noise effectors and multiplies
//! `step_offset` and the Time effector's `clone_offset`, so the order is part
//! of the public contract.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Upper bound on clones per grid; keeps flat indices inside `u32`
pub const MAX_INSTANCES: u32 = 1 << 20;

/// Integer grid coordinate of a clone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridKey {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl GridKey {
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }
}

/// Grid shape and spacing (all world-space fields are in grid units)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridSpec {
    /// Clones per axis; truncated, minimum 1
    pub count: [f32; 3],
    pub spacing: Vec3,
    pub offset: Vec3,
    /// Extra offset multiplied by the flat index
    pub step_offset: Vec3,
    /// Center the grid on the origin instead of growing from it
    pub centered: bool,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            count: [1.0, 1.0, 1.0],
            spacing: Vec3::ONE,
            offset: Vec3::ZERO,
            step_offset: Vec3::ZERO,
            centered: true,
        }
    }
}

impl GridSpec {
    /// Truncated per-axis counts before the instance cap
    fn requested_counts(&self) -> [u32; 3] {
        // `as` saturates and maps NaN to 0
        self.count.map(|c| (c as u32).max(1))
    }

    /// Resolved per-axis counts (x, y, z). Axes are filled x, y, z until
    /// the product reaches [`MAX_INSTANCES`].
    pub fn counts(&self) -> [u32; 3] {
        let [rx, ry, rz] = self.requested_counts();
        let cx = rx.min(MAX_INSTANCES);
        let cy = ry.min(MAX_INSTANCES / cx);
        let cz = rz.min(MAX_INSTANCES / (cx * cy));
        [cx, cy, cz]
    }

    /// Total number of clones
    pub fn instance_count(&self) -> usize {
        self.counts().iter().fold(1usize, |acc, &c| acc.saturating_mul(c as usize))
    }

    /// Flat index of a key in y/z/x nesting order, if the key lies inside the grid
    pub fn flat_index(&self, key: GridKey) -> Option<usize> {
        let [cx, cy, cz] = self.counts();
        if key.x >= cx || key.y >= cy || key.z >= cz {
            return None;
        }
        Some((key.y as usize * cz as usize + key.z as usize) * cx as usize + key.x as usize)
    }
}

/// One generated grid cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutCell {
    pub key: GridKey,
    pub index: u32,
    pub local_position: Vec3,
}

/// Generate every cell of the grid, scaling world-space fields by `unit`
pub fn generate_layout(spec: &GridSpec, unit: f32) -> Vec<LayoutCell> {
    let [cx, cy, cz] = spec.counts();
    if [cx, cy, cz] != spec.requested_counts() {
        log::debug!(
            "Grid count {:?} exceeds {} clones, clamped to {:?}",
            spec.count,
            MAX_INSTANCES,
            [cx, cy, cz]
        );
    }
    let counts = Vec3::new(cx as f32, cy as f32, cz as f32);

    let spacing = spec.spacing * unit;
    let offset = spec.offset * unit;
    let step_offset = spec.step_offset * unit;

    let start = if spec.centered {
        -((counts - Vec3::ONE) * spacing) / 2.0
    } else {
        Vec3::ZERO
    };

    let mut cells = Vec::with_capacity(spec.instance_count());
    let mut index: u32 = 0;
    for y in 0..cy {
        for z in 0..cz {
            for x in 0..cx {
                let coord = Vec3::new(x as f32, y as f32, z as f32);
                let local_position = start + coord * spacing + offset + step_offset * index as f32;
                cells.push(LayoutCell {
                    key: GridKey::new(x, y, z),
                    index,
                    local_position,
                });
                index += 1;
            }
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn spec(count: [f32; 3], spacing: Vec3, centered: bool) -> GridSpec {
        GridSpec {
            count,
            spacing,
            centered,
            ..Default::default()
        }
    }

    #[test]
    fn test_centered_row() {
        let cells = generate_layout(&spec([3.0, 1.0, 1.0], Vec3::new(1.0, 0.0, 0.0), true), 1.0);
        let xs: Vec<f32> = cells.iter().map(|c| c.local_position.x).collect();
        assert_eq!(xs, vec![-1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_two_by_two_scenario() {
        let cells = generate_layout(&spec([2.0, 2.0, 1.0], Vec3::new(2.0, 2.0, 0.0), true), 1.0);
        let positions: Vec<Vec3> = cells.iter().map(|c| c.local_position).collect();
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
    fn test_uncentered_with_offset_and_step() {
        let spec = GridSpec {
            count: [3.0, 1.0, 1.0],
            spacing: Vec3::new(2.0, 0.0, 0.0),
            offset: Vec3::new(0.0, 1.0, 0.0),
            step_offset: Vec3::new(0.0, 0.0, 0.5),
            centered: false,
        };
        let cells = generate_layout(&spec, 1.0);
        assert_eq!(cells[0].local_position, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(cells[2].local_position, Vec3::new(4.0, 1.0, 1.0));
    }

    #[test]
    fn test_unit_scales_world_fields() {
        let spec = GridSpec {
            count: [2.0, 1.0, 1.0],
            spacing: Vec3::new(1.0, 0.0, 0.0),
            offset: Vec3::new(0.0, 1.0, 0.0),
            step_offset: Vec3::ZERO,
            centered: false,
        };
        let cells = generate_layout(&spec, 0.5);
        assert_eq!(cells[1].local_position, Vec3::new(0.5, 0.5, 0.0));
    }

    #[test]
    fn test_count_truncation_and_floor() {
        let s = spec([2.9, 0.0, f32::NAN], Vec3::ONE, false);
        assert_eq!(s.counts(), [2, 1, 1]);
        assert_eq!(generate_layout(&s, 1.0).len(), 2);
        let s = spec([-4.0, 1.0, 1.0], Vec3::ONE, false);
        assert_eq!(s.counts(), [1, 1, 1]);
    }

    #[test]
    fn test_huge_counts_are_capped() {
        let s = spec([1e10, 1e10, 1e10], Vec3::ONE, false);
        assert_eq!(s.counts(), [MAX_INSTANCES, 1, 1]);
        assert_eq!(s.instance_count(), MAX_INSTANCES as usize);

        let s = spec([2048.0, 2048.0, 4.0], Vec3::ONE, false);
        assert_eq!(s.counts(), [2048, 512, 1]);
        let cells = generate_layout(&s, 1.0);
        assert_eq!(cells.len(), MAX_INSTANCES as usize);
        assert_eq!(cells.last().map(|c| c.index), Some(MAX_INSTANCES - 1));
    }

    #[test]
    fn test_flat_index_matches_layout() {
        let s = spec([3.0, 2.0, 4.0], Vec3::ONE, false);
        for cell in generate_layout(&s, 1.0) {
            assert_eq!(s.flat_index(cell.key), Some(cell.index as usize));
        }
        assert_eq!(s.flat_index(GridKey::new(3, 0, 0)), None);
    }

    proptest! {
        #[test]
        fn prop_count_and_order(cx in 1u32..6, cy in 1u32..6, cz in 1u32..6) {
            let s = spec([cx as f32, cy as f32, cz as f32], Vec3::ONE, true);
            let cells = generate_layout(&s, 1.0);
            prop_assert_eq!(cells.len(), (cx * cy * cz) as usize);

            let mut expected = Vec::new();
            for y in 0..cy {
                for z in 0..cz {
                    for x in 0..cx {
                        expected.push(GridKey::new(x, y, z));
                    }
                }
            }
            for (i, cell) in cells.iter().enumerate() {
                prop_assert_eq!(cell.index as usize, i);
                prop_assert_eq!(cell.key, expected[i]);
            }
        }
    }
}
