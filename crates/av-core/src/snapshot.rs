//! Immutable position snapshots shared between a render loop and writers
//!
//! Readers take the whole map once per frame; writers build a new map and
//! swap it in. A map is never patched in place after publication.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec3;
use parking_lot::RwLock;

/// Resolved assembled positions keyed by part name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionSnapshot(Arc<HashMap<String, Vec3>>);

impl PositionSnapshot {
    pub fn new(positions: HashMap<String, Vec3>) -> Self {
        Self(Arc::new(positions))
    }

    pub fn get(&self, name: &str) -> Option<Vec3> {
        self.0.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Vec3)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Check if two snapshots are the same published map
    pub fn ptr_eq(&self, other: &PositionSnapshot) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<HashMap<String, Vec3>> for PositionSnapshot {
    fn from(positions: HashMap<String, Vec3>) -> Self {
        Self::new(positions)
    }
}

/// Single-writer, many-reader slot holding the current snapshot
#[derive(Debug, Default)]
pub struct SnapshotCell {
    current: RwLock<PositionSnapshot>,
}

impl SnapshotCell {
    pub fn new(snapshot: PositionSnapshot) -> Self {
        Self {
            current: RwLock::new(snapshot),
        }
    }

    /// The currently published snapshot
    pub fn load(&self) -> PositionSnapshot {
        self.current.read().clone()
    }

    /// Publish a fully built snapshot, replacing the previous one
    pub fn store(&self, snapshot: PositionSnapshot) {
        *self.current.write() = snapshot;
    }
}
