//! Placement constraints
//!
//! Symbolic rules that place a part relative to other parts. Resolution
//! lives in [`crate::resolver`]; face mates live in [`crate::mate`].

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_THREAD_DEPTH;

/// Placement rule attached to a part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssemblyConstraint {
    /// Absolute position, ignoring the rest of the graph
    Fixed {
        #[serde(default)]
        offset: Vec3,
    },

    /// Bottom of this part flush against the top of the parent
    StackedOn {
        parent_part: String,
        /// Manual offset; a nonzero Y replaces the flush calculation
        #[serde(default)]
        offset: Vec3,
    },

    /// Threaded along the local Y axis of a rod
    Threaded {
        threaded_on: String,
        /// Fraction of the rod height, nominally in 0..=1 (not enforced)
        #[serde(default = "default_thread_depth")]
        thread_depth: f32,
        #[serde(default)]
        offset: Vec3,
    },

    /// On a circle in the XZ plane around a center part
    RadialAroundCenter {
        center_part: String,
        /// Degrees, measured from +X towards +Z
        angle: f32,
        radius: f32,
        #[serde(default)]
        offset: Vec3,
    },

    /// Constraint kind this build does not understand; resolves to the origin
    #[serde(other)]
    Unknown,
}

fn default_thread_depth() -> f32 {
    DEFAULT_THREAD_DEPTH
}

impl AssemblyConstraint {
    /// Create a fixed constraint
    pub fn fixed(offset: Vec3) -> Self {
        Self::Fixed { offset }
    }

    /// Create a stacked-on constraint
    pub fn stacked_on(parent_part: impl Into<String>, offset: Vec3) -> Self {
        Self::StackedOn {
            parent_part: parent_part.into(),
            offset,
        }
    }

    /// Create a threaded constraint without manual offset
    pub fn threaded(threaded_on: impl Into<String>, thread_depth: f32) -> Self {
        Self::Threaded {
            threaded_on: threaded_on.into(),
            thread_depth,
            offset: Vec3::ZERO,
        }
    }

    /// Create a radial constraint without manual offset
    pub fn radial(center_part: impl Into<String>, angle: f32, radius: f32) -> Self {
        Self::RadialAroundCenter {
            center_part: center_part.into(),
            angle,
            radius,
            offset: Vec3::ZERO,
        }
    }

    /// The part this constraint depends on, if any
    pub fn dependency(&self) -> Option<&str> {
        match self {
            Self::Fixed { .. } | Self::Unknown => None,
            Self::StackedOn { parent_part, .. } => Some(parent_part),
            Self::Threaded { threaded_on, .. } => Some(threaded_on),
            Self::RadialAroundCenter { center_part, .. } => Some(center_part),
        }
    }

    /// Rename the referenced part (used by id reconciliation)
    pub fn set_dependency(&mut self, id: impl Into<String>) {
        match self {
            Self::Fixed { .. } | Self::Unknown => {}
            Self::StackedOn { parent_part, .. } => *parent_part = id.into(),
            Self::Threaded { threaded_on, .. } => *threaded_on = id.into(),
            Self::RadialAroundCenter { center_part, .. } => *center_part = id.into(),
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Fixed { .. } => "Fixed",
            Self::StackedOn { .. } => "Stacked On",
            Self::Threaded { .. } => "Threaded",
            Self::RadialAroundCenter { .. } => "Radial",
            Self::Unknown => "Unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency() {
        assert_eq!(AssemblyConstraint::fixed(Vec3::ZERO).dependency(), None);
        assert_eq!(
            AssemblyConstraint::threaded("rod", 0.2).dependency(),
            Some("rod")
        );
    }

    #[test]
    fn test_json_tag_and_thread_default() {
        let c: AssemblyConstraint =
            serde_json::from_str(r#"{"type":"threaded","threaded_on":"ROD"}"#).unwrap();
        assert_eq!(c, AssemblyConstraint::threaded("ROD", DEFAULT_THREAD_DEPTH));
    }

    #[test]
    fn test_unknown_tag_maps_to_unknown() {
        let c: AssemblyConstraint = serde_json::from_str(r#"{"type":"welded"}"#).unwrap();
        assert_eq!(c, AssemblyConstraint::Unknown);
        assert_eq!(c.dependency(), None);
    }

    #[test]
    fn test_set_dependency() {
        let mut c = AssemblyConstraint::stacked_on("base", Vec3::ZERO);
        c.set_dependency("BASE");
        assert_eq!(c.dependency(), Some("BASE"));
    }
}
