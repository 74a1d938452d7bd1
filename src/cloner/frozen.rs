//! Frozen transforms of activated clones
//!
//! Dense slots hold the snapshots; a sparse vector indexed by flat grid index
//! points into them. Entries are never overwritten, only cleared wholesale.

use super::layout::{GridKey, GridSpec};
use super::transform::CloneTransform;

#[derive(Debug, Clone, Default)]
pub struct FrozenTable {
    dense: Vec<CloneTransform>,
    sparse: Vec<Option<u32>>,
}

impl FrozenTable {
    pub fn new(instance_count: usize) -> Self {
        Self {
            dense: Vec::new(),
            sparse: vec![None; instance_count],
        }
    }

    /// Drop every snapshot and resize for a (possibly new) grid
    pub fn reset(&mut self, instance_count: usize) {
        self.dense.clear();
        self.sparse.clear();
        self.sparse.resize(instance_count, None);
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    pub fn get_index(&self, index: usize) -> Option<&CloneTransform> {
        let slot = (*self.sparse.get(index)?)?;
        self.dense.get(slot as usize)
    }

    pub fn get(&self, grid: &GridSpec, key: GridKey) -> Option<&CloneTransform> {
        self.get_index(grid.flat_index(key)?)
    }

    /// Store a snapshot; returns false if the index already holds one or is out of range
    pub fn freeze(&mut self, index: usize, snapshot: CloneTransform) -> bool {
        match self.sparse.get_mut(index) {
            Some(entry) if entry.is_none() => {
                *entry = Some(self.dense.len() as u32);
                self.dense.push(snapshot);
                true
            }
            _ => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &CloneTransform> {
        self.dense.iter()
    }
}
