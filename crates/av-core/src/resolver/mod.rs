//! Assembly constraint resolver
//!
//! Holds the part registry, non-owning mesh references with their measured
//! bounding boxes, and a memo of resolved assembled positions. Positions are
//! resolved on demand, depth first, and memoized until an input changes.
//!
//! One resolver belongs to one viewing session. Readers on other threads get
//! positions through published [`PositionSnapshot`]s, never through the memo.

mod resolve;

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec3;

use crate::bounds::BoundingBox;
use crate::constraint::AssemblyConstraint;
use crate::mesh::{SharedMesh, WeakMesh, measure_intrinsic_bounds};
use crate::part::{InferredPlacement, Part};
use crate::snapshot::PositionSnapshot;

/// Resolves assembled-state positions from placement constraints
#[derive(Debug, Default)]
pub struct AssemblyConstraintResolver {
    /// Registered parts by name
    parts: HashMap<String, Part>,
    /// Registration order (assembly order unless reordered)
    order: Vec<String>,
    /// Non-owning mesh references
    meshes: HashMap<String, WeakMesh>,
    /// Intrinsic boxes multiplied by the logical scale
    bounds: HashMap<String, BoundingBox>,
    /// Memoized assembled positions
    resolved: HashMap<String, Vec3>,
    /// Last snapshot built by `resolve_all`
    snapshot: PositionSnapshot,
}

impl AssemblyConstraintResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver over a list of parts, keeping their order
    pub fn with_parts(parts: impl IntoIterator<Item = Part>) -> Self {
        let mut resolver = Self::new();
        for part in parts {
            resolver.register_part(part);
        }
        resolver
    }

    /// Add or replace a part
    pub fn register_part(&mut self, part: Part) {
        if !self.parts.contains_key(&part.name) {
            self.order.push(part.name.clone());
        }
        self.parts.insert(part.name.clone(), part);
        self.invalidate_positions();
    }

    /// Record a non-owning mesh reference and measure its bounding box
    ///
    /// The mesh is measured at unit display scale (restored afterwards) and
    /// the box is multiplied by `logical_scale`.
    pub fn register_mesh(&mut self, part_id: &str, mesh: &SharedMesh, logical_scale: f32) {
        let bbox = {
            let mut guard = mesh.write();
            measure_intrinsic_bounds(&mut *guard, logical_scale)
        };
        self.meshes.insert(part_id.to_string(), Arc::downgrade(mesh));
        match bbox {
            Some(bbox) => {
                self.bounds.insert(part_id.to_string(), bbox);
            }
            None => {
                tracing::warn!("Mesh for '{}' has no geometry to measure", part_id);
                self.bounds.remove(part_id);
            }
        }
        self.invalidate_positions();
    }

    /// Re-measure every registered mesh under a new scale
    ///
    /// Meshes dropped by their owner lose their bounding box.
    pub fn set_global_scale(&mut self, scale: f32) {
        let mut dropped = Vec::new();
        for (part_id, weak) in &self.meshes {
            let Some(mesh) = weak.upgrade() else {
                dropped.push(part_id.clone());
                continue;
            };
            let bbox = {
                let mut guard = mesh.write();
                measure_intrinsic_bounds(&mut *guard, scale)
            };
            match bbox {
                Some(bbox) => {
                    self.bounds.insert(part_id.clone(), bbox);
                }
                None => {
                    self.bounds.remove(part_id);
                }
            }
        }
        for part_id in dropped {
            tracing::warn!("Mesh for '{}' was dropped; discarding its bounds", part_id);
            self.meshes.remove(&part_id);
            self.bounds.remove(&part_id);
        }
        self.invalidate_positions();
    }

    /// Replace a part's constraint
    ///
    /// Unknown parts are logged and ignored (returns false). Dependents may
    /// move too, so every memoized position is dropped.
    pub fn update_part_constraint(
        &mut self,
        part_id: &str,
        constraint: Option<AssemblyConstraint>,
    ) -> bool {
        let Some(part) = self.parts.get_mut(part_id) else {
            tracing::warn!("Cannot update constraint: unknown part '{}'", part_id);
            return false;
        };
        part.constraint = constraint;
        self.invalidate_positions();
        true
    }

    /// Attach an inferred placement; does not affect resolved positions
    pub fn set_inferred_placement(&mut self, part_id: &str, inferred: InferredPlacement) -> bool {
        match self.parts.get_mut(part_id) {
            Some(part) => {
                part.inferred = Some(inferred);
                true
            }
            None => {
                tracing::warn!("Cannot attach inferred placement: unknown part '{}'", part_id);
                false
            }
        }
    }

    /// Reorder parts; unknown names are ignored, unlisted parts keep their
    /// relative order after the listed ones
    pub fn set_assembly_order(&mut self, order: &[String]) {
        let mut next: Vec<String> = Vec::with_capacity(self.order.len());
        for name in order {
            if self.parts.contains_key(name) && !next.contains(name) {
                next.push(name.clone());
            }
        }
        for name in &self.order {
            if !next.contains(name) {
                next.push(name.clone());
            }
        }
        self.order = next;
    }

    /// Drop every cache: positions, mesh references and bounding boxes
    pub fn clear_cache(&mut self) {
        self.resolved.clear();
        self.meshes.clear();
        self.bounds.clear();
        self.snapshot = PositionSnapshot::default();
    }

    pub(crate) fn invalidate_positions(&mut self) {
        self.resolved.clear();
    }

    /// Capture parts and order so a batch of updates can be undone
    pub(crate) fn checkpoint(&self) -> PartCheckpoint {
        PartCheckpoint {
            parts: self.parts.clone(),
            order: self.order.clone(),
        }
    }

    /// Restore parts and order captured by [`Self::checkpoint`]
    ///
    /// Meshes and bounding boxes are left alone; memoized positions are dropped.
    pub(crate) fn rollback(&mut self, checkpoint: PartCheckpoint) {
        self.parts = checkpoint.parts;
        self.order = checkpoint.order;
        self.invalidate_positions();
    }

    // ============== Accessors ==============

    /// Bounding box of a part (a copy)
    pub fn get_bounding_box(&self, part_id: &str) -> Option<BoundingBox> {
        self.bounds.get(part_id).copied()
    }

    /// All bounding boxes (a copy)
    pub fn get_all_bounding_boxes(&self) -> HashMap<String, BoundingBox> {
        self.bounds.clone()
    }

    /// Last snapshot published by `resolve_all`
    pub fn snapshot(&self) -> PositionSnapshot {
        self.snapshot.clone()
    }

    pub fn part(&self, name: &str) -> Option<&Part> {
        self.parts.get(name)
    }

    /// Parts in assembly order
    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.order.iter().filter_map(|name| self.parts.get(name))
    }

    /// Part names in assembly order
    pub fn part_names(&self) -> &[String] {
        &self.order
    }

    /// Position of a part in the assembly order
    pub fn order_index(&self, name: &str) -> Option<usize> {
        self.order.iter().position(|n| n == name)
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Check if a mesh is registered and still alive
    pub fn has_live_mesh(&self, part_id: &str) -> bool {
        self.meshes
            .get(part_id)
            .is_some_and(|weak| weak.strong_count() > 0)
    }
}

/// Saved part state of a resolver
#[derive(Debug, Clone)]
pub(crate) struct PartCheckpoint {
    parts: HashMap<String, Part>,
    order: Vec<String>,
}

/// Resolution errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error("Part not found: {0}")]
    PartNotFound(String),
    #[error("Cyclic dependency: {}", .chain.join(" -> "))]
    CyclicDependency { chain: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{MeshHandle, TriangleMesh, share_mesh};

    fn cuboid(min: Vec3, max: Vec3) -> SharedMesh {
        share_mesh(TriangleMesh::cuboid(min, max))
    }

    #[test]
    fn test_register_mesh_scales_bounds() {
        let mut resolver = AssemblyConstraintResolver::new();
        let mesh = cuboid(Vec3::ZERO, Vec3::new(1.0, 2.0, 1.0));
        resolver.register_mesh("rod", &mesh, 10.0);
        let bbox = resolver.get_bounding_box("rod").unwrap();
        assert_eq!(bbox.max, Vec3::new(10.0, 20.0, 10.0));
        assert!(resolver.has_live_mesh("rod"));
    }

    #[test]
    fn test_register_mesh_restores_display_scale() {
        let mut resolver = AssemblyConstraintResolver::new();
        let mesh = cuboid(Vec3::ZERO, Vec3::ONE);
        mesh.write().set_scale(Vec3::splat(0.25));
        resolver.register_mesh("a", &mesh, 1.0);
        assert_eq!(mesh.read().scale(), Vec3::splat(0.25));
        assert_eq!(resolver.get_bounding_box("a").unwrap().max, Vec3::ONE);
    }

    #[test]
    fn test_set_global_scale_remeasures() {
        let mut resolver = AssemblyConstraintResolver::new();
        let mesh = cuboid(Vec3::ZERO, Vec3::ONE);
        resolver.register_mesh("a", &mesh, 1.0);
        resolver.set_global_scale(3.0);
        assert_eq!(resolver.get_bounding_box("a").unwrap().max, Vec3::splat(3.0));
    }

    #[test]
    fn test_dropped_mesh_loses_bounds_on_rescale() {
        let mut resolver = AssemblyConstraintResolver::new();
        {
            let mesh = cuboid(Vec3::ZERO, Vec3::ONE);
            resolver.register_mesh("gone", &mesh, 1.0);
        }
        assert!(!resolver.has_live_mesh("gone"));
        resolver.set_global_scale(2.0);
        assert!(resolver.get_bounding_box("gone").is_none());
    }

    #[test]
    fn test_update_unknown_part_is_ignored() {
        let mut resolver = AssemblyConstraintResolver::with_parts([Part::new("a")]);
        assert!(!resolver.update_part_constraint("missing", None));
        assert!(resolver.update_part_constraint("a", Some(AssemblyConstraint::fixed(Vec3::X))));
    }

    #[test]
    fn test_clear_cache_drops_everything() {
        let mut resolver = AssemblyConstraintResolver::with_parts([Part::new("a")]);
        let mesh = cuboid(Vec3::ZERO, Vec3::ONE);
        resolver.register_mesh("a", &mesh, 1.0);
        resolver.resolve_all().unwrap();
        resolver.clear_cache();
        assert!(resolver.get_all_bounding_boxes().is_empty());
        assert!(resolver.snapshot().is_empty());
        assert!(!resolver.has_live_mesh("a"));
        assert_eq!(resolver.part_count(), 1);
    }

    #[test]
    fn test_set_assembly_order() {
        let mut resolver =
            AssemblyConstraintResolver::with_parts([Part::new("a"), Part::new("b"), Part::new("c")]);
        resolver.set_assembly_order(&["c".to_string(), "ghost".to_string(), "a".to_string()]);
        assert_eq!(resolver.part_names(), ["c", "a", "b"]);
        assert_eq!(resolver.order_index("b"), Some(2));
    }

    #[test]
    fn test_returned_boxes_are_copies() {
        let mut resolver = AssemblyConstraintResolver::new();
        let mesh = cuboid(Vec3::ZERO, Vec3::ONE);
        resolver.register_mesh("a", &mesh, 1.0);
        let mut boxes = resolver.get_all_bounding_boxes();
        boxes.get_mut("a").unwrap().max = Vec3::splat(100.0);
        assert_eq!(resolver.get_bounding_box("a").unwrap().max, Vec3::ONE);
    }
}
