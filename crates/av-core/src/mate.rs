//! Face mate transform calculator
//!
//! Pure functions computing the rigid transform that moves part B so one of
//! its faces satisfies a mate against a face of part A. No caching and no
//! knowledge of the part graph.
//!
//! Failures are values: a result with `success == false` carries an error
//! message, an identity rotation and a zero position. Callers must check
//! `success` (or use [`MateTransform::pose`]) before using the transform.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::face::Face;

/// Mate type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MateType {
    #[default]
    Coincident,
    Parallel,
    Perpendicular,
    Concentric,
    Distance,
    /// Mate kind this build does not understand
    #[serde(other)]
    Unknown,
}

impl MateType {
    /// Check if this mate type only constrains rotation
    pub fn is_rotation_only(&self) -> bool {
        matches!(self, MateType::Parallel | MateType::Perpendicular)
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            MateType::Coincident => "Coincident",
            MateType::Parallel => "Parallel",
            MateType::Perpendicular => "Perpendicular",
            MateType::Concentric => "Concentric",
            MateType::Distance => "Distance",
            MateType::Unknown => "Unknown",
        }
    }
}

/// Rigid placement (rotation applied first, then translation)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Map a point from the posed frame into the parent frame
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * point + self.position
    }
}

/// Result of a mate calculation
#[derive(Debug, Clone, PartialEq)]
pub struct MateTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub success: bool,
    pub error: Option<String>,
}

impl MateTransform {
    /// Successful transform
    pub fn ok(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            success: true,
            error: None,
        }
    }

    /// Failed transform; position and rotation are neutral and must not be used
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            success: false,
            error: Some(error.into()),
        }
    }

    /// The transform as a pose, only when the calculation succeeded
    pub fn pose(&self) -> Option<Pose> {
        self.success.then_some(Pose::new(self.position, self.rotation))
    }
}

/// Mate parameters shared by all mate types
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MateOptions {
    pub mate_type: MateType,
    /// Coincident/distance: B's normal points the same way as A's.
    /// Parallel: normals point in opposite directions.
    #[serde(default)]
    pub flip: bool,
    /// Separation along the shared normal (the distance for distance mates)
    #[serde(default)]
    pub offset: f32,
}

impl MateOptions {
    pub fn new(mate_type: MateType) -> Self {
        Self {
            mate_type,
            ..Default::default()
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
}

/// Dispatch to the calculation for `options.mate_type`
pub fn calculate_mate_transform(face_a: &Face, face_b: &Face, options: &MateOptions) -> MateTransform {
    match options.mate_type {
        MateType::Coincident => coincident(face_a, face_b, options.flip, options.offset),
        MateType::Parallel => parallel(face_a, face_b, !options.flip),
        MateType::Perpendicular => perpendicular(face_a, face_b),
        MateType::Concentric => concentric(face_a, face_b),
        MateType::Distance => distance(face_a, face_b, options.offset, options.flip),
        MateType::Unknown => MateTransform::failed("Unknown mate type"),
    }
}

/// Place B's face against A's face, separated by `offset` along the shared normal
pub fn coincident(face_a: &Face, face_b: &Face, flip: bool, offset: f32) -> MateTransform {
    let Some((normal_a, normal_b)) = unit_normals(face_a, face_b) else {
        return MateTransform::failed("Face normal is degenerate");
    };
    let target = if flip { normal_a } else { -normal_a };
    let rotation = Quat::from_rotation_arc(normal_b, target);
    let position = face_a.center - rotation * face_b.center + target * offset;
    MateTransform::ok(position, rotation)
}

/// Rotate B so its face normal is parallel to A's
pub fn parallel(face_a: &Face, face_b: &Face, same_direction: bool) -> MateTransform {
    let Some((normal_a, normal_b)) = unit_normals(face_a, face_b) else {
        return MateTransform::failed("Face normal is degenerate");
    };
    let target = if same_direction { normal_a } else { -normal_a };
    MateTransform::ok(Vec3::ZERO, Quat::from_rotation_arc(normal_b, target))
}

/// Rotate B so its face normal is perpendicular to A's
///
/// Infinitely many perpendicular directions exist; this always picks the
/// canonical one obtained by orthogonalizing the world axis least aligned
/// with A's normal (X, or Y when A's normal is close to X).
pub fn perpendicular(face_a: &Face, face_b: &Face) -> MateTransform {
    let Some((normal_a, normal_b)) = unit_normals(face_a, face_b) else {
        return MateTransform::failed("Face normal is degenerate");
    };
    let target = canonical_perpendicular(normal_a);
    MateTransform::ok(Vec3::ZERO, Quat::from_rotation_arc(normal_b, target))
}

/// Concentric mates need cylindrical axes, which faces do not carry yet
pub fn concentric(_face_a: &Face, _face_b: &Face) -> MateTransform {
    MateTransform::failed("Concentric mate is not implemented")
}

/// Coincident placement with an explicit separation distance
pub fn distance(face_a: &Face, face_b: &Face, distance: f32, flip: bool) -> MateTransform {
    coincident(face_a, face_b, flip, distance)
}

/// Transform equivalent to applying `b` within the frame of `a`
pub fn compose_transforms(a: &MateTransform, b: &MateTransform) -> MateTransform {
    if !a.success || !b.success {
        let error = a
            .error
            .clone()
            .or_else(|| b.error.clone())
            .unwrap_or_else(|| "Cannot compose a failed transform".to_string());
        return MateTransform::failed(error);
    }
    MateTransform::ok(a.position + a.rotation * b.position, a.rotation * b.rotation)
}

/// Transform that undoes `t`
pub fn inverse_transform(t: &MateTransform) -> MateTransform {
    if !t.success {
        return MateTransform::failed(
            t.error
                .clone()
                .unwrap_or_else(|| "Cannot invert a failed transform".to_string()),
        );
    }
    let inverse = t.rotation.inverse();
    MateTransform::ok(inverse * -t.position, inverse)
}

fn unit_normals(face_a: &Face, face_b: &Face) -> Option<(Vec3, Vec3)> {
    Some((face_a.normal.try_normalize()?, face_b.normal.try_normalize()?))
}

fn canonical_perpendicular(normal: Vec3) -> Vec3 {
    let axis = if normal.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    (axis - normal * axis.dot(normal)).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_vec_eq(a: Vec3, b: Vec3) {
        assert_relative_eq!(a.x, b.x, epsilon = 1e-5);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-5);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-5);
    }

    fn top_face() -> Face {
        Face::planar("top", Vec3::Y, Vec3::new(0.0, 5.0, 0.0), 4.0)
    }

    fn bottom_face() -> Face {
        Face::planar("bottom", Vec3::NEG_Y, Vec3::new(0.0, -1.0, 0.0), 4.0)
    }

    #[test]
    fn test_coincident_rests_face_on_face() {
        let result = coincident(&top_face(), &bottom_face(), false, 0.0);
        assert!(result.success);
        assert_vec_eq(result.rotation * Vec3::NEG_Y, Vec3::NEG_Y);
        // B's bottom face center lands on A's top face center
        assert_vec_eq(result.position + result.rotation * bottom_face().center, top_face().center);
    }

    #[test]
    fn test_coincident_offset_separates_along_normal() {
        let result = coincident(&top_face(), &bottom_face(), false, 2.0);
        let landed = result.position + result.rotation * bottom_face().center;
        // Target normal is -Y, so a positive offset moves B along -Y
        assert_vec_eq(landed, Vec3::new(0.0, 3.0, 0.0));
    }

    #[test]
    fn test_coincident_flip_aligns_normals() {
        let result = coincident(&top_face(), &bottom_face(), true, 0.0);
        assert_vec_eq(result.rotation * bottom_face().normal, Vec3::Y);
    }

    #[test]
    fn test_distance_matches_coincident_with_offset() {
        let d = distance(&top_face(), &bottom_face(), 1.5, false);
        let c = coincident(&top_face(), &bottom_face(), false, 1.5);
        assert_eq!(d, c);
    }

    #[test]
    fn test_parallel_same_and_opposite() {
        let side = Face::planar("side", Vec3::X, Vec3::ZERO, 1.0);
        let same = parallel(&top_face(), &side, true);
        assert_eq!(same.position, Vec3::ZERO);
        assert_vec_eq(same.rotation * Vec3::X, Vec3::Y);

        let opposite = calculate_mate_transform(
            &top_face(),
            &side,
            &MateOptions::new(MateType::Parallel).with_flip(true),
        );
        assert_vec_eq(opposite.rotation * Vec3::X, Vec3::NEG_Y);
    }

    #[test]
    fn test_perpendicular_is_canonical() {
        let result = perpendicular(&top_face(), &bottom_face());
        assert!(result.success);
        let normal = result.rotation * bottom_face().normal;
        assert_relative_eq!(normal.dot(Vec3::Y), 0.0, epsilon = 1e-5);
        assert_vec_eq(normal, Vec3::X);
        assert_eq!(result.position, Vec3::ZERO);
    }

    #[test]
    fn test_concentric_always_fails() {
        let result = calculate_mate_transform(
            &top_face(),
            &bottom_face(),
            &MateOptions::new(MateType::Concentric),
        );
        assert!(!result.success);
        assert!(!result.error.as_deref().unwrap_or_default().is_empty());
        assert!(result.pose().is_none());
    }

    #[test]
    fn test_unknown_mate_type_fails() {
        let options: MateOptions =
            serde_json::from_str(r#"{"mate_type":"tangent"}"#).unwrap();
        let result = calculate_mate_transform(&top_face(), &bottom_face(), &options);
        assert!(!result.success);
    }

    #[test]
    fn test_degenerate_normal_fails() {
        let bad = Face::planar("bad", Vec3::ZERO, Vec3::ZERO, 1.0);
        assert!(!coincident(&top_face(), &bad, false, 0.0).success);
    }

    #[test]
    fn test_compose_then_inverse_is_identity() {
        let a = MateTransform::ok(Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_y(0.7));
        let b = MateTransform::ok(Vec3::new(-4.0, 0.5, 2.0), Quat::from_rotation_x(-1.2));
        let ab = compose_transforms(&a, &b);
        let identity = compose_transforms(&ab, &inverse_transform(&ab));
        assert!(identity.success);
        assert_vec_eq(identity.position, Vec3::ZERO);
        assert_vec_eq(identity.rotation * Vec3::X, Vec3::X);
        assert_vec_eq(identity.rotation * Vec3::Y, Vec3::Y);
    }

    #[test]
    fn test_compose_applies_a_then_b() {
        let a = MateTransform::ok(Vec3::new(10.0, 0.0, 0.0), Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        let b = MateTransform::ok(Vec3::new(1.0, 0.0, 0.0), Quat::IDENTITY);
        let ab = compose_transforms(&a, &b);
        assert_vec_eq(ab.position, Vec3::new(10.0, 1.0, 0.0));
    }

    #[test]
    fn test_compose_propagates_failure() {
        let ok = MateTransform::ok(Vec3::ONE, Quat::IDENTITY);
        let failed = concentric(&top_face(), &bottom_face());
        let composed = compose_transforms(&ok, &failed);
        assert!(!composed.success);
        assert_eq!(composed.error, failed.error);
        assert!(!inverse_transform(&failed).success);
    }
}
