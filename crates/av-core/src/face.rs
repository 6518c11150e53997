//! Part faces consumed by the mate calculator
//!
//! Faces are extracted once per part from its mesh and are immutable
//! afterwards. Only planar faces are produced by extraction.

use std::collections::HashMap;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::constants::{FACE_NORMAL_PRECISION, FACE_OFFSET_PRECISION};
use crate::mesh::{TriangleMesh, triangle_area, triangle_normal};

/// Surface classification of a face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FaceKind {
    #[default]
    Planar,
    Cylindrical,
    Spherical,
}

/// A surface on a part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub id: String,
    /// Unit outward normal
    pub normal: Vec3,
    pub center: Vec3,
    pub area: f32,
    /// Boundary vertices in the part's local frame
    #[serde(default)]
    pub boundary: Vec<Vec3>,
    #[serde(default)]
    pub kind: FaceKind,
}

impl Face {
    /// Create a planar face; the normal is normalized
    pub fn planar(id: impl Into<String>, normal: Vec3, center: Vec3, area: f32) -> Self {
        Self {
            id: id.into(),
            normal: normal.normalize_or_zero(),
            center,
            area,
            boundary: Vec::new(),
            kind: FaceKind::Planar,
        }
    }

    /// This face after rotating then translating its part
    pub fn transformed(&self, rotation: Quat, translation: Vec3) -> Face {
        Face {
            id: self.id.clone(),
            normal: rotation * self.normal,
            center: rotation * self.center + translation,
            area: self.area,
            boundary: self
                .boundary
                .iter()
                .map(|p| rotation * *p + translation)
                .collect(),
            kind: self.kind,
        }
    }
}

#[derive(Default)]
struct FaceAccumulator {
    normal: Vec3,
    weighted_center: Vec3,
    area: f32,
    vertices: Vec<u32>,
}

/// Group coplanar triangles of a mesh into planar faces
///
/// Triangles are grouped by quantized normal and plane offset. Faces are
/// returned largest first with ids `face_0`, `face_1`, ...
pub fn extract_planar_faces(mesh: &TriangleMesh) -> Vec<Face> {
    let mut groups: HashMap<[i32; 4], FaceAccumulator> = HashMap::new();
    let mut order: Vec<[i32; 4]> = Vec::new();

    for tri in mesh.indices.chunks_exact(3) {
        let (Some(&a), Some(&b), Some(&c)) = (
            mesh.vertices.get(tri[0] as usize),
            mesh.vertices.get(tri[1] as usize),
            mesh.vertices.get(tri[2] as usize),
        ) else {
            continue;
        };

        let area = triangle_area(a, b, c);
        if area <= f32::EPSILON {
            continue;
        }
        let normal = triangle_normal(a, b, c);
        let offset = normal.dot(a);
        let key = [
            (normal.x * FACE_NORMAL_PRECISION).round() as i32,
            (normal.y * FACE_NORMAL_PRECISION).round() as i32,
            (normal.z * FACE_NORMAL_PRECISION).round() as i32,
            (offset * FACE_OFFSET_PRECISION).round() as i32,
        ];

        let acc = groups.entry(key).or_insert_with(|| {
            order.push(key);
            FaceAccumulator {
                normal,
                ..Default::default()
            }
        });
        acc.weighted_center += (a + b + c) / 3.0 * area;
        acc.area += area;
        for &idx in tri {
            if !acc.vertices.contains(&idx) {
                acc.vertices.push(idx);
            }
        }
    }

    let mut faces: Vec<Face> = order
        .iter()
        .filter_map(|key| groups.remove(key))
        .map(|acc| Face {
            id: String::new(),
            normal: acc.normal,
            center: acc.weighted_center / acc.area,
            area: acc.area,
            boundary: acc
                .vertices
                .iter()
                .map(|&i| mesh.vertices[i as usize])
                .collect(),
            kind: FaceKind::Planar,
        })
        .collect();

    faces.sort_by(|a, b| b.area.total_cmp(&a.area));
    for (i, face) in faces.iter_mut().enumerate() {
        face.id = format!("face_{i}");
    }
    faces
}

/// Find the face whose normal is closest to `direction`
pub fn face_facing(faces: &[Face], direction: Vec3) -> Option<&Face> {
    let direction = direction.normalize_or_zero();
    faces
        .iter()
        .max_by(|a, b| a.normal.dot(direction).total_cmp(&b.normal.dot(direction)))
}
