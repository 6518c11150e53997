//! Mate-driven assembly sequences
//!
//! An [`AssemblySequence`] places parts one mate at a time, starting from a
//! ground part at the identity pose. Each step mates a face of an already
//! placed part A with a face of part B and poses B in the world frame.
//! Steps that cannot be solved are skipped and reported; they never abort
//! the sequence.

use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::face::Face;
use crate::mate::{MateOptions, MateType, Pose, calculate_mate_transform};

/// Faces of each part, in the part's local frame
pub type FaceTable = HashMap<String, Vec<Face>>;

/// One mate between a face on part A and a face on part B
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MateConstraint {
    pub part_a: String,
    pub face_a: String,
    pub part_b: String,
    pub face_b: String,
    #[serde(default)]
    pub mate_type: MateType,
    #[serde(default)]
    pub flip: bool,
    #[serde(default)]
    pub offset: f32,
}

impl MateConstraint {
    pub fn new(
        mate_type: MateType,
        part_a: impl Into<String>,
        face_a: impl Into<String>,
        part_b: impl Into<String>,
        face_b: impl Into<String>,
    ) -> Self {
        Self {
            part_a: part_a.into(),
            face_a: face_a.into(),
            part_b: part_b.into(),
            face_b: face_b.into(),
            mate_type,
            flip: false,
            offset: 0.0,
        }
    }

    pub fn with_flip(mut self, flip: bool) -> Self {
        self.flip = flip;
        self
    }

    pub fn with_offset(mut self, offset: f32) -> Self {
        self.offset = offset;
        self
    }

    pub fn options(&self) -> MateOptions {
        MateOptions::new(self.mate_type)
            .with_flip(self.flip)
            .with_offset(self.offset)
    }
}

/// A step that could not be solved
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedStep {
    pub index: usize,
    pub reason: String,
}

/// Result of solving a sequence
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SequenceSolution {
    /// World pose of every placed part
    pub poses: HashMap<String, Pose>,
    /// Parts in the order they were first placed, ground first
    pub order: Vec<String>,
    pub skipped: Vec<SkippedStep>,
}

impl SequenceSolution {
    pub fn pose(&self, part: &str) -> Option<Pose> {
        self.poses.get(part).copied()
    }

    /// World positions of placed parts
    pub fn positions(&self) -> HashMap<String, Vec3> {
        self.poses
            .iter()
            .map(|(name, pose)| (name.clone(), pose.position))
            .collect()
    }

    fn place(&mut self, part: &str, pose: Pose) {
        if self.poses.insert(part.to_string(), pose).is_none() {
            self.order.push(part.to_string());
        } else {
            tracing::debug!("Part '{}' re-placed by a later mate", part);
        }
    }
}

/// Ordered list of mates rooted at a ground part
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssemblySequence {
    pub ground: String,
    #[serde(default)]
    pub steps: Vec<MateConstraint>,
}

impl AssemblySequence {
    pub fn new(ground: impl Into<String>) -> Self {
        Self {
            ground: ground.into(),
            steps: Vec::new(),
        }
    }

    pub fn with_step(mut self, step: MateConstraint) -> Self {
        self.steps.push(step);
        self
    }

    /// Solve every step in order
    pub fn solve(&self, faces: &FaceTable) -> SequenceSolution {
        let mut solution = SequenceSolution::default();
        solution.place(&self.ground, Pose::IDENTITY);

        for (index, step) in self.steps.iter().enumerate() {
            match solve_step(step, &self.ground, faces, &solution) {
                Ok(pose) => solution.place(&step.part_b, pose),
                Err(reason) => {
                    tracing::warn!(
                        "Skipping mate {} ({} '{}' -> '{}'): {}",
                        index,
                        step.mate_type.display_name(),
                        step.part_a,
                        step.part_b,
                        reason
                    );
                    solution.skipped.push(SkippedStep { index, reason });
                }
            }
        }

        tracing::debug!(
            "Solved sequence: {} placed, {} skipped",
            solution.order.len(),
            solution.skipped.len()
        );
        solution
    }
}

fn solve_step(
    step: &MateConstraint,
    ground: &str,
    faces: &FaceTable,
    solution: &SequenceSolution,
) -> Result<Pose, String> {
    if step.part_b == ground {
        return Err("ground part cannot be moved".to_string());
    }
    if step.part_a == step.part_b {
        return Err("part cannot be mated to itself".to_string());
    }
    let pose_a = solution
        .pose(&step.part_a)
        .ok_or_else(|| format!("part '{}' is not placed yet", step.part_a))?;
    let face_a = find_face(faces, &step.part_a, &step.face_a)?;
    let face_b = find_face(faces, &step.part_b, &step.face_b)?;

    let world_a = face_a.transformed(pose_a.rotation, pose_a.position);
    let result = calculate_mate_transform(&world_a, face_b, &step.options());
    let pose = result
        .pose()
        .ok_or_else(|| result.error.clone().unwrap_or_else(|| "mate failed".to_string()))?;

    if step.mate_type.is_rotation_only() {
        let position = solution.pose(&step.part_b).map_or(Vec3::ZERO, |p| p.position);
        return Ok(Pose::new(position, pose.rotation));
    }
    Ok(pose)
}

fn find_face<'a>(faces: &'a FaceTable, part: &str, face: &str) -> Result<&'a Face, String> {
    faces
        .get(part)
        .ok_or_else(|| format!("part '{}' has no faces", part))?
        .iter()
        .find(|f| f.id == face)
        .ok_or_else(|| format!("part '{}' has no face '{}'", part, face))
}
