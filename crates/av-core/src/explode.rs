//! Exploded-view interpolation
//!
//! Displayed positions are a pure function of the explode factor: no time,
//! no history. Evaluating the same factor twice yields the same frame, and
//! factor 0 reproduces the assembled positions exactly.

use std::f32::consts::TAU;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::ExplodeConfig;
use crate::constraint::AssemblyConstraint;
use crate::constants::{DEFAULT_CONFIDENCE_THRESHOLD, DIRECTION_EPSILON};
use crate::part::Part;
use crate::snapshot::PositionSnapshot;

/// Where a part's assembled position came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionSource {
    /// Constraint resolution
    Resolved,
    /// Confident external inference
    Inferred,
    /// Literal per-part offset
    Literal,
}

/// A part's transform for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayedPart {
    pub name: String,
    pub position: Vec3,
    pub rotation: Quat,
    pub assembled: Vec3,
    pub source: PositionSource,
    /// Explosion progress in 0..=1 after the speed multiplier
    pub progress: f32,
}

/// Explosion progress for a factor and speed, clamped so it never overshoots
pub fn explode_progress(factor: f32, speed: f32) -> f32 {
    (factor.clamp(0.0, 1.0) * speed.max(0.0)).min(1.0)
}

/// Displayed position: `assembled + direction * progress * distance`
pub fn explode_position(
    assembled: Vec3,
    direction: Vec3,
    distance: f32,
    speed: f32,
    factor: f32,
) -> Vec3 {
    assembled + direction.normalize_or_zero() * explode_progress(factor, speed) * distance
}

/// Pick the assembled position: resolved, then confident inference, then literal
///
/// Resolved positions are only preferred for constrained parts; for the
/// others the resolver merely echoes the literal offset.
pub fn assembled_position(
    part: &Part,
    snapshot: &PositionSnapshot,
    confidence_threshold: f32,
) -> (Vec3, PositionSource) {
    if (part.constraint.is_some() || part.is_ground)
        && let Some(position) = snapshot.get(&part.name)
    {
        return (position, PositionSource::Resolved);
    }
    if let Some(inferred) = &part.inferred
        && inferred.confidence >= confidence_threshold
        && let Some(position) = inferred.position
    {
        return (position, PositionSource::Inferred);
    }
    (part.literal_position(), PositionSource::Literal)
}

/// Normalized explode direction
///
/// Uses the part's own direction, then a confident inferred one, then the
/// radial direction from the centroid, then +Y. A forced axis keeps only the
/// sign of the chosen direction along that axis.
pub fn explode_direction(
    part: &Part,
    assembled: Vec3,
    centroid: Vec3,
    confidence_threshold: f32,
    forced_axis: Option<Vec3>,
) -> Vec3 {
    let inferred = part
        .inferred
        .as_ref()
        .filter(|i| i.confidence >= confidence_threshold)
        .and_then(|i| i.explode_direction);

    let direction = part
        .explode_direction
        .or(inferred)
        .and_then(try_unit)
        .or_else(|| try_unit(assembled - centroid))
        .unwrap_or(Vec3::Y);

    match forced_axis.and_then(try_unit) {
        Some(axis) => {
            let along = direction.dot(axis);
            if along.abs() <= DIRECTION_EPSILON {
                axis
            } else {
                axis * along.signum()
            }
        }
        None => direction,
    }
}

fn try_unit(v: Vec3) -> Option<Vec3> {
    (v.length_squared() > DIRECTION_EPSILON * DIRECTION_EPSILON).then(|| v.normalize())
}

/// Mean of a set of positions, origin when empty
pub fn centroid(positions: impl IntoIterator<Item = Vec3>) -> Vec3 {
    let (sum, count) = positions
        .into_iter()
        .fold((Vec3::ZERO, 0usize), |(sum, n), p| (sum + p, n + 1));
    if count == 0 { Vec3::ZERO } else { sum / count as f32 }
}

/// Computes whole frames of displayed transforms
#[derive(Debug, Clone)]
pub struct ExplodedView {
    pub config: ExplodeConfig,
    pub confidence_threshold: f32,
    /// Per-machine axis every explosion is constrained to
    pub forced_axis: Option<Vec3>,
}

impl Default for ExplodedView {
    fn default() -> Self {
        Self::new(ExplodeConfig::default(), DEFAULT_CONFIDENCE_THRESHOLD)
    }
}

impl ExplodedView {
    pub fn new(config: ExplodeConfig, confidence_threshold: f32) -> Self {
        Self {
            config,
            confidence_threshold,
            forced_axis: None,
        }
    }

    pub fn with_forced_axis(mut self, axis: Option<Vec3>) -> Self {
        self.forced_axis = axis;
        self
    }

    /// Explode distance, defaulting to a multiple of the order index
    pub fn distance_for(&self, part: &Part, order_index: Option<usize>) -> f32 {
        part.explode_distance.unwrap_or_else(|| match order_index {
            Some(index) => index as f32 * self.config.distance_step,
            None => self.config.default_distance,
        })
    }

    /// Unscrew turns of a part; threaded parts fall back to the configured default
    pub fn unscrew_turns_for(&self, part: &Part) -> Option<f32> {
        part.unscrew_turns.or_else(|| match part.constraint {
            Some(AssemblyConstraint::Threaded { .. }) => self.config.default_unscrew_turns,
            _ => None,
        })
    }

    /// Displayed transforms of `parts` (in assembly order) at `factor`
    pub fn frame<'a>(
        &self,
        parts: impl IntoIterator<Item = &'a Part>,
        snapshot: &PositionSnapshot,
        factor: f32,
    ) -> Vec<DisplayedPart> {
        let assembled: Vec<(&Part, Vec3, PositionSource)> = parts
            .into_iter()
            .map(|part| {
                let (position, source) =
                    assembled_position(part, snapshot, self.confidence_threshold);
                (part, position, source)
            })
            .collect();
        let center = centroid(assembled.iter().map(|(_, p, _)| *p));

        assembled
            .into_iter()
            .enumerate()
            .map(|(index, (part, position, source))| {
                self.displayed(part, position, source, center, Some(index), factor)
            })
            .collect()
    }

    /// Displayed transform of a single part
    pub fn displayed(
        &self,
        part: &Part,
        assembled: Vec3,
        source: PositionSource,
        centroid: Vec3,
        order_index: Option<usize>,
        factor: f32,
    ) -> DisplayedPart {
        if part.is_ground {
            return DisplayedPart {
                name: part.name.clone(),
                position: assembled,
                rotation: Quat::IDENTITY,
                assembled,
                source,
                progress: 0.0,
            };
        }

        let direction = explode_direction(
            part,
            assembled,
            centroid,
            self.confidence_threshold,
            self.forced_axis,
        );
        let speed = part.explode_speed.unwrap_or(self.config.default_speed);
        let progress = explode_progress(factor, speed);
        let distance = self.distance_for(part, order_index);
        let rotation = match self.unscrew_turns_for(part) {
            Some(turns) => Quat::from_axis_angle(direction, turns * TAU * progress),
            None => Quat::IDENTITY,
        };

        DisplayedPart {
            name: part.name.clone(),
            position: explode_position(assembled, direction, distance, speed, factor),
            rotation,
            assembled,
            source,
            progress,
        }
    }
}
