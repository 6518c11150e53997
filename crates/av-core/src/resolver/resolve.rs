//! Recursive, memoized position resolution

use std::collections::HashMap;

use glam::Vec3;

use super::{AssemblyConstraintResolver, ResolveError};
use crate::constraint::AssemblyConstraint;
use crate::snapshot::PositionSnapshot;

impl AssemblyConstraintResolver {
    /// Assembled-state position of a part
    ///
    /// Memoized until the next invalidation. Missing references degrade to
    /// the origin with a warning; a cycle is reported as an error.
    pub fn resolve_position(&mut self, part_id: &str) -> Result<Vec3, ResolveError> {
        if !self.parts.contains_key(part_id) {
            return Err(ResolveError::PartNotFound(part_id.to_string()));
        }
        let mut in_progress = Vec::new();
        self.resolve_inner(part_id, &mut in_progress)
    }

    /// Resolve every part from scratch and publish the result as a snapshot
    pub fn resolve_all(&mut self) -> Result<PositionSnapshot, ResolveError> {
        self.invalidate_positions();
        let order = self.order.clone();
        let mut positions = HashMap::with_capacity(order.len());
        for name in &order {
            let mut in_progress = Vec::new();
            let position = self.resolve_inner(name, &mut in_progress)?;
            positions.insert(name.clone(), position);
        }
        self.snapshot = PositionSnapshot::new(positions);
        Ok(self.snapshot.clone())
    }

    fn resolve_inner(
        &mut self,
        part_id: &str,
        in_progress: &mut Vec<String>,
    ) -> Result<Vec3, ResolveError> {
        if let Some(&cached) = self.resolved.get(part_id) {
            return Ok(cached);
        }
        if in_progress.iter().any(|id| id == part_id) {
            let mut chain = in_progress.clone();
            chain.push(part_id.to_string());
            return Err(ResolveError::CyclicDependency { chain });
        }

        let Some(part) = self.parts.get(part_id) else {
            tracing::warn!("Referenced part '{}' is not registered", part_id);
            return Ok(Vec3::ZERO);
        };

        if part.is_ground {
            self.resolved.insert(part_id.to_string(), Vec3::ZERO);
            return Ok(Vec3::ZERO);
        }

        let literal = part.literal_position();
        let Some(constraint) = part.constraint.clone() else {
            self.resolved.insert(part_id.to_string(), literal);
            return Ok(literal);
        };

        in_progress.push(part_id.to_string());
        let position = self.resolve_constraint(part_id, &constraint, in_progress);
        in_progress.pop();
        let position = position?;

        self.resolved.insert(part_id.to_string(), position);
        Ok(position)
    }

    fn resolve_constraint(
        &mut self,
        part_id: &str,
        constraint: &AssemblyConstraint,
        in_progress: &mut Vec<String>,
    ) -> Result<Vec3, ResolveError> {
        if let Some(dependency) = constraint.dependency()
            && !self.parts.contains_key(dependency)
        {
            tracing::warn!(
                "{} constraint on '{}' references missing part '{}'",
                constraint.display_name(),
                part_id,
                dependency
            );
            return Ok(Vec3::ZERO);
        }

        let position = match constraint {
            AssemblyConstraint::Fixed { offset } => *offset,

            AssemblyConstraint::StackedOn {
                parent_part,
                offset,
            } => {
                let parent_position = self.resolve_inner(parent_part, in_progress)?;
                self.stacked_position(part_id, parent_part, parent_position, *offset)
            }

            AssemblyConstraint::Threaded {
                threaded_on,
                thread_depth,
                offset,
            } => {
                let rod_position = self.resolve_inner(threaded_on, in_progress)?;
                let rod_height = match self.bounds.get(threaded_on.as_str()) {
                    Some(bbox) => bbox.height(),
                    None => {
                        tracing::warn!(
                            "Rod '{}' for '{}' has no bounding box; using zero height",
                            threaded_on,
                            part_id
                        );
                        0.0
                    }
                };
                rod_position + Vec3::new(0.0, rod_height * thread_depth, 0.0) + *offset
            }

            AssemblyConstraint::RadialAroundCenter {
                center_part,
                angle,
                radius,
                offset,
            } => {
                let center_position = self.resolve_inner(center_part, in_progress)?;
                let (sin, cos) = sin_cos_degrees(*angle);
                center_position + Vec3::new(radius * cos, 0.0, radius * sin) + *offset
            }

            AssemblyConstraint::Unknown => {
                tracing::warn!("Unknown constraint type on '{}'", part_id);
                Vec3::ZERO
            }
        };

        Ok(position)
    }

    /// Bottom of the child flush with the top of the parent
    ///
    /// A nonzero manual Y replaces the flush offset. Without both boxes the
    /// child sits one parent height above the parent.
    fn stacked_position(
        &self,
        part_id: &str,
        parent_id: &str,
        parent_position: Vec3,
        offset: Vec3,
    ) -> Vec3 {
        match (self.bounds.get(parent_id), self.bounds.get(part_id)) {
            (Some(parent_box), Some(child_box)) => {
                let auto_y = parent_box.top() - child_box.bottom();
                let y = if offset.y != 0.0 { offset.y } else { auto_y };
                parent_position + Vec3::new(offset.x, y, offset.z)
            }
            (parent_box, _) => {
                tracing::warn!(
                    "Missing bounding box for '{}' or '{}'; stacking by parent height",
                    part_id,
                    parent_id
                );
                let height = parent_box.map(|b| b.height()).unwrap_or(0.0);
                parent_position + Vec3::new(0.0, height, 0.0)
            }
        }
    }
}

/// Sine and cosine of an angle in degrees, exact on multiples of 90
fn sin_cos_degrees(degrees: f32) -> (f32, f32) {
    if degrees % 90.0 == 0.0 {
        let quadrant = (degrees / 90.0).rem_euclid(4.0) as i32;
        return match quadrant {
            0 => (0.0, 1.0),
            1 => (1.0, 0.0),
            2 => (0.0, -1.0),
            _ => (-1.0, 0.0),
        };
    }
    degrees.to_radians().sin_cos()
}
