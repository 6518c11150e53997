//! Part definitions

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_EXPLODE_SPEED;
use crate::constraint::AssemblyConstraint;

/// One physical component of an assembly
///
/// The name is the sole key across caches and constraint references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub name: String,
    /// Fixed reference part; always at its own assembled position
    #[serde(default)]
    pub is_ground: bool,
    /// Placement rule; `None` falls back to the literal offset
    #[serde(default)]
    pub constraint: Option<AssemblyConstraint>,
    /// Literal assembled position (preferred over `position`)
    #[serde(default)]
    pub assembly_offset: Option<Vec3>,
    /// Literal position used when no assembly offset is given
    #[serde(default)]
    pub position: Option<Vec3>,
    /// Explode direction (normalized before use)
    #[serde(default)]
    pub explode_direction: Option<Vec3>,
    /// Explode distance at full progress
    #[serde(default)]
    pub explode_distance: Option<f32>,
    /// Progress multiplier; values above 1 finish exploding early
    #[serde(default)]
    pub explode_speed: Option<f32>,
    /// Turns about the explode direction at full progress (fasteners)
    #[serde(default)]
    pub unscrew_turns: Option<f32>,
    /// Placement proposed by an external inference service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inferred: Option<InferredPlacement>,
    /// Material name from the machine catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    /// Functional role from the machine catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Inferred placement layered under the resolved position
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InferredPlacement {
    pub position: Option<Vec3>,
    pub explode_direction: Option<Vec3>,
    /// Confidence of the inference run that produced this entry
    pub confidence: f32,
}

impl Part {
    /// Create a new unconstrained part at the origin
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_ground: false,
            constraint: None,
            assembly_offset: None,
            position: None,
            explode_direction: None,
            explode_distance: None,
            explode_speed: None,
            unscrew_turns: None,
            inferred: None,
            material: None,
            role: None,
        }
    }

    /// Create the ground part
    pub fn ground(name: impl Into<String>) -> Self {
        Self {
            is_ground: true,
            ..Self::new(name)
        }
    }

    pub fn with_constraint(mut self, constraint: AssemblyConstraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_assembly_offset(mut self, offset: Vec3) -> Self {
        self.assembly_offset = Some(offset);
        self
    }

    pub fn with_explode(mut self, direction: Vec3, distance: f32) -> Self {
        self.explode_direction = Some(direction);
        self.explode_distance = Some(distance);
        self
    }

    pub fn with_explode_speed(mut self, speed: f32) -> Self {
        self.explode_speed = Some(speed);
        self
    }

    pub fn with_unscrew_turns(mut self, turns: f32) -> Self {
        self.unscrew_turns = Some(turns);
        self
    }

    /// Literal assembled position: assembly offset, then position, then origin
    pub fn literal_position(&self) -> Vec3 {
        self.assembly_offset.or(self.position).unwrap_or(Vec3::ZERO)
    }

    /// Explode speed with the default applied
    pub fn speed(&self) -> f32 {
        self.explode_speed.unwrap_or(DEFAULT_EXPLODE_SPEED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_position_precedence() {
        let part = Part::new("a");
        assert_eq!(part.literal_position(), Vec3::ZERO);

        let part = part.with_position(Vec3::X);
        assert_eq!(part.literal_position(), Vec3::X);

        let part = part.with_assembly_offset(Vec3::Y);
        assert_eq!(part.literal_position(), Vec3::Y);
    }

    #[test]
    fn test_defaults() {
        let part = Part::ground("base");
        assert!(part.is_ground);
        assert_eq!(part.speed(), DEFAULT_EXPLODE_SPEED);
        assert!(part.constraint.is_none());
    }

    #[test]
    fn test_deserialize_minimal_json() {
        let part: Part = serde_json::from_str(r#"{"name":"NUT"}"#).unwrap();
        assert_eq!(part, Part::new("NUT"));
    }
}
