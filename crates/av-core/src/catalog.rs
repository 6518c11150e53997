//! Machine catalog
//!
//! Per-machine configuration data: part metadata, catalog parent links and
//! explode overrides. Anything specific to one machine lives here rather
//! than in the resolver or the interpolation code.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::constraint::AssemblyConstraint;
use crate::part::Part;
use crate::reconcile::reconcile_id;

/// Catalog entry for one part
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogPart {
    pub name: String,
    pub material: Option<String>,
    pub role: Option<String>,
    /// Part this one stacks on when it has no constraint of its own
    pub parent: Option<String>,
    pub explode_direction: Option<Vec3>,
    pub explode_distance: Option<f32>,
    pub explode_speed: Option<f32>,
    pub unscrew_turns: Option<f32>,
}

/// Configuration for one machine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub id: String,
    pub name: String,
    pub description: String,
    pub parts: Vec<CatalogPart>,
    /// Ground part name
    pub ground: Option<String>,
    /// Axis every explosion of this machine is constrained to
    pub forced_axis: Option<Vec3>,
}

impl MachineConfig {
    /// Parts described by the catalog alone
    pub fn to_parts(&self) -> Vec<Part> {
        let mut parts: Vec<Part> = self.parts.iter().map(|c| Part::new(c.name.clone())).collect();
        self.apply(&mut parts);
        parts
    }

    /// Merge catalog data into parts
    ///
    /// Catalog values only fill fields the part leaves unset. Parts are
    /// matched to catalog entries by reconciled name.
    pub fn apply(&self, parts: &mut [Part]) {
        let names: Vec<String> = parts.iter().map(|p| p.name.clone()).collect();
        let ground = self
            .ground
            .as_deref()
            .and_then(|g| reconcile_id(g, &names))
            .map(str::to_string);

        for part in parts.iter_mut() {
            if ground.as_deref() == Some(part.name.as_str()) {
                part.is_ground = true;
            }
        }

        for entry in &self.parts {
            let Some(target) = reconcile_id(&entry.name, &names).map(str::to_string) else {
                tracing::debug!("Catalog part '{}' not present in '{}'", entry.name, self.id);
                continue;
            };
            let parent = entry
                .parent
                .as_deref()
                .and_then(|p| reconcile_id(p, &names))
                .map(str::to_string);
            let Some(part) = parts.iter_mut().find(|p| p.name == target) else {
                continue;
            };

            part.material = part.material.take().or_else(|| entry.material.clone());
            part.role = part.role.take().or_else(|| entry.role.clone());
            part.explode_direction = part.explode_direction.or(entry.explode_direction);
            part.explode_distance = part.explode_distance.or(entry.explode_distance);
            part.explode_speed = part.explode_speed.or(entry.explode_speed);
            part.unscrew_turns = part.unscrew_turns.or(entry.unscrew_turns);

            if part.constraint.is_none() && !part.is_ground {
                match parent {
                    Some(parent) if parent != part.name => {
                        part.constraint = Some(AssemblyConstraint::stacked_on(parent, Vec3::ZERO));
                    }
                    Some(_) => {
                        tracing::warn!("Catalog part '{}' lists itself as parent", entry.name);
                    }
                    None => {}
                }
            }
        }
    }
}

/// Collection of machine configurations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineCatalog {
    pub machines: Vec<MachineConfig>,
}

impl MachineCatalog {
    /// Load a catalog from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| CatalogError::Io(e.to_string()))?;
        Self::from_ron(&content)
    }

    /// Parse a catalog from RON text
    pub fn from_ron(content: &str) -> Result<Self, CatalogError> {
        ron::from_str(content).map_err(|e| CatalogError::Deserialize(e.to_string()))
    }

    /// Find a machine by id (reconciled, so "leaf_spring" finds "Leaf Spring")
    pub fn get(&self, id: &str) -> Option<&MachineConfig> {
        let ids: Vec<&str> = self.machines.iter().map(|m| m.id.as_str()).collect();
        let found = reconcile_id(id, &ids)?;
        self.machines.iter().find(|m| m.id == found)
    }
}

/// Catalog-related errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUSPENSION: &str = r#"(
        machines: [
            (
                id: "Suspension",
                name: "Suspension",
                ground: Some("BASE"),
                forced_axis: Some((0.0, 1.0, 0.0)),
                parts: [
                    (name: "BASE", material: Some("Steel")),
                    (name: "ROD", parent: Some("BASE")),
                    (name: "SPRING", parent: Some("ROD"), explode_distance: Some(60.0)),
                    (name: "NUT", unscrew_turns: Some(3.0)),
                ],
            ),
            (id: "Leaf Spring", name: "Leaf Spring"),
        ],
    )"#;

    #[test]
    fn test_parse_and_lookup() {
        let catalog = MachineCatalog::from_ron(SUSPENSION).unwrap();
        assert_eq!(catalog.machines.len(), 2);
        assert_eq!(catalog.get("leaf_spring").unwrap().id, "Leaf Spring");
        assert_eq!(catalog.get("suspension").unwrap().forced_axis, Some(Vec3::Y));
        assert!(catalog.get("drone").is_none());
    }

    #[test]
    fn test_to_parts_links_parents() {
        let catalog = MachineCatalog::from_ron(SUSPENSION).unwrap();
        let parts = catalog.get("Suspension").unwrap().to_parts();
        assert!(parts[0].is_ground);
        assert_eq!(parts[0].material.as_deref(), Some("Steel"));
        assert_eq!(
            parts[2].constraint,
            Some(AssemblyConstraint::stacked_on("ROD", Vec3::ZERO))
        );
        assert_eq!(parts[2].explode_distance, Some(60.0));
        assert_eq!(parts[3].unscrew_turns, Some(3.0));
        assert!(parts[3].constraint.is_none());
    }

    #[test]
    fn test_apply_keeps_existing_values() {
        let catalog = MachineCatalog::from_ron(SUSPENSION).unwrap();
        let mut parts = vec![
            Part::new("base"),
            Part::new("Rod").with_constraint(AssemblyConstraint::fixed(Vec3::ONE)),
            Part::new("spring").with_explode(Vec3::X, 5.0),
        ];
        catalog.get("Suspension").unwrap().apply(&mut parts);
        assert!(parts[0].is_ground);
        assert_eq!(parts[1].constraint, Some(AssemblyConstraint::fixed(Vec3::ONE)));
        assert_eq!(parts[2].explode_distance, Some(5.0));
        assert_eq!(
            parts[2].constraint,
            Some(AssemblyConstraint::stacked_on("Rod", Vec3::ZERO))
        );
    }

    #[test]
    fn test_malformed_catalog() {
        assert!(matches!(
            MachineCatalog::from_ron("(machines: 5)"),
            Err(CatalogError::Deserialize(_))
        ));
    }
}
