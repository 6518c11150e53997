//! Ingestion of externally inferred assembly layouts
//!
//! An inference service proposes per-part positions, explode directions and
//! constraints together with a confidence score and an assembly order. The
//! proposal is best effort: ids may be misspelled, fields may be missing,
//! and constraint kinds may be unknown. Nothing here fails on such input;
//! unmatched ids are logged and skipped.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::config::InferenceConfig;
use crate::constraint::AssemblyConstraint;
use crate::part::InferredPlacement;
use crate::reconcile::reconcile_id;
use crate::resolver::{AssemblyConstraintResolver, ResolveError};
use crate::snapshot::PositionSnapshot;

/// One inferred part entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferredPart {
    pub part_id: String,
    pub position: Option<Vec3>,
    pub explode_direction: Option<Vec3>,
    /// Malformed constraints are logged and treated as absent
    #[serde(deserialize_with = "lenient_constraint")]
    pub constraint: Option<AssemblyConstraint>,
}

fn lenient_constraint<'de, D>(deserializer: D) -> Result<Option<AssemblyConstraint>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match serde_json::from_value(value) {
        Ok(constraint) => Some(constraint),
        Err(e) => {
            tracing::warn!("Ignoring malformed inferred constraint: {}", e);
            None
        }
    }))
}

/// Result of one inference run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceResult {
    pub confidence: f32,
    pub assembly_order: Vec<String>,
    pub parts: Vec<InferredPart>,
}

impl InferenceResult {
    /// Parse an inference response body
    pub fn from_json(json: &str) -> Result<Self, InferenceError> {
        serde_json::from_str(json).map_err(|e| InferenceError::Malformed(e.to_string()))
    }
}

/// Outcome of applying an inference result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InferenceReport {
    /// (proposed id, canonical id) pairs that were applied
    pub matched: Vec<(String, String)>,
    /// Proposed ids with no canonical counterpart
    pub skipped: Vec<String>,
    /// Parts whose constraint was replaced
    pub constraints_updated: Vec<String>,
    /// Snapshot rebuilt after applying the result
    pub snapshot: PositionSnapshot,
}

/// Apply an inference result to a resolver and rebuild its snapshot
///
/// Constraint references are reconciled against canonical ids as well; a
/// constraint whose reference cannot be reconciled is dropped. The returned
/// error is only a cycle introduced by the new constraints; in that case the
/// whole result is rolled back and the resolver keeps its prior parts, order
/// and snapshot.
pub fn apply_inference(
    resolver: &mut AssemblyConstraintResolver,
    result: &InferenceResult,
    config: &InferenceConfig,
) -> Result<InferenceReport, ResolveError> {
    let canonical: Vec<String> = resolver.part_names().to_vec();
    let checkpoint = resolver.checkpoint();
    let confidence = result.confidence.clamp(0.0, 1.0);
    let mut report = InferenceReport::default();

    for entry in &result.parts {
        let Some(id) = reconcile_id(&entry.part_id, &canonical) else {
            tracing::warn!("Inferred part '{}' matches no known part; skipping", entry.part_id);
            report.skipped.push(entry.part_id.clone());
            continue;
        };
        let id = id.to_string();

        resolver.set_inferred_placement(
            &id,
            InferredPlacement {
                position: entry.position.filter(|p| p.is_finite()),
                explode_direction: entry.explode_direction.filter(|d| d.is_finite()),
                confidence,
            },
        );

        if config.apply_constraints
            && confidence >= config.confidence_threshold
            && let Some(constraint) = &entry.constraint
            && let Some(constraint) = reconcile_constraint(constraint, &canonical, &entry.part_id)
        {
            resolver.update_part_constraint(&id, Some(constraint));
            report.constraints_updated.push(id.clone());
        }

        report.matched.push((entry.part_id.clone(), id));
    }

    let order: Vec<String> = result
        .assembly_order
        .iter()
        .filter_map(|proposed| match reconcile_id(proposed, &canonical) {
            Some(id) => Some(id.to_string()),
            None => {
                tracing::debug!("Assembly order entry '{}' matches no known part", proposed);
                None
            }
        })
        .collect();
    if !order.is_empty() {
        resolver.set_assembly_order(&order);
    }

    report.snapshot = match resolver.resolve_all() {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!("Inference result rejected, rolling back: {}", e);
            resolver.rollback(checkpoint);
            if let Err(prior) = resolver.resolve_all() {
                tracing::warn!("Prior assembly state does not resolve either: {}", prior);
            }
            return Err(e);
        }
    };
    tracing::info!(
        "Applied inference: {} matched, {} skipped, {} constraints updated",
        report.matched.len(),
        report.skipped.len(),
        report.constraints_updated.len()
    );
    Ok(report)
}

fn reconcile_constraint(
    constraint: &AssemblyConstraint,
    canonical: &[String],
    owner: &str,
) -> Option<AssemblyConstraint> {
    let mut constraint = constraint.clone();
    if let Some(dependency) = constraint.dependency().map(str::to_string) {
        match reconcile_id(&dependency, canonical) {
            Some(id) => {
                let id = id.to_string();
                constraint.set_dependency(id);
            }
            None => {
                tracing::warn!(
                    "Inferred constraint for '{}' references unknown part '{}'; dropping it",
                    owner,
                    dependency
                );
                return None;
            }
        }
    }
    Some(constraint)
}

/// Inference ingestion errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum InferenceError {
    #[error("Malformed inference result: {0}")]
    Malformed(String),
}
