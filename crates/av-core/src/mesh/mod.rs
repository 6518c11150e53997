//! Mesh handles and triangle meshes
//!
//! The rendering layer owns meshes; the resolver only measures them. A mesh is
//! measured at unit scale so the recorded box reflects intrinsic geometry.

mod normals;
mod stl;

use std::sync::{Arc, Weak};

use glam::Vec3;
use parking_lot::RwLock;

use crate::bounds::BoundingBox;

pub use normals::{triangle_area, triangle_normal};
pub use stl::{MeshError, load_stl, load_stl_from_bytes};

/// Geometry handle the resolver can measure
pub trait MeshHandle {
    /// Current display scale
    fn scale(&self) -> Vec3;

    /// Replace the display scale
    fn set_scale(&mut self, scale: Vec3);

    /// Axis-aligned box of the geometry under its current scale
    fn compute_bounding_box(&self) -> Option<BoundingBox>;
}

/// Mesh shared between the rendering layer (owner) and the resolver
pub type SharedMesh = Arc<RwLock<dyn MeshHandle + Send + Sync>>;

/// Non-owning reference kept by the resolver
pub type WeakMesh = Weak<RwLock<dyn MeshHandle + Send + Sync>>;

/// Wrap a mesh for sharing
pub fn share_mesh<M>(mesh: M) -> SharedMesh
where
    M: MeshHandle + Send + Sync + 'static,
{
    Arc::new(RwLock::new(mesh))
}

/// Measure a mesh's intrinsic box, then multiply it by `logical_scale`
///
/// The display scale is reset to one for the measurement and restored
/// exactly afterwards.
pub fn measure_intrinsic_bounds(
    mesh: &mut (dyn MeshHandle + Send + Sync),
    logical_scale: f32,
) -> Option<BoundingBox> {
    let original = mesh.scale();
    mesh.set_scale(Vec3::ONE);
    let bbox = mesh.compute_bounding_box();
    mesh.set_scale(original);
    bbox.map(|b| b.scaled(logical_scale))
}

/// Indexed triangle mesh with a display scale
#[derive(Debug, Clone)]
pub struct TriangleMesh {
    /// Vertex positions in the mesh's local frame
    pub vertices: Vec<Vec3>,
    /// Triangle indices (3 per triangle)
    pub indices: Vec<u32>,
    /// Display scale applied on top of local positions
    pub scale: Vec3,
}

impl Default for TriangleMesh {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

impl TriangleMesh {
    /// Create a mesh at unit scale
    pub fn new(vertices: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            scale: Vec3::ONE,
        }
    }

    /// Load a mesh from an STL file
    pub fn from_stl(path: impl AsRef<std::path::Path>) -> Result<Self, MeshError> {
        load_stl(path)
    }

    /// Load a mesh from STL bytes
    pub fn from_stl_bytes(data: &[u8]) -> Result<Self, MeshError> {
        load_stl_from_bytes(data)
    }

    /// Axis-aligned box mesh spanning `min..max` (24 vertices, 12 triangles)
    pub fn cuboid(min: Vec3, max: Vec3) -> Self {
        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        let mut add_face = |corners: [Vec3; 4]| {
            let base = vertices.len() as u32;
            vertices.extend_from_slice(&corners);
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        };

        let (x0, y0, z0) = (min.x, min.y, min.z);
        let (x1, y1, z1) = (max.x, max.y, max.z);

        // +X
        add_face([
            Vec3::new(x1, y0, z0),
            Vec3::new(x1, y1, z0),
            Vec3::new(x1, y1, z1),
            Vec3::new(x1, y0, z1),
        ]);
        // -X
        add_face([
            Vec3::new(x0, y1, z0),
            Vec3::new(x0, y0, z0),
            Vec3::new(x0, y0, z1),
            Vec3::new(x0, y1, z1),
        ]);
        // +Y
        add_face([
            Vec3::new(x1, y1, z0),
            Vec3::new(x0, y1, z0),
            Vec3::new(x0, y1, z1),
            Vec3::new(x1, y1, z1),
        ]);
        // -Y
        add_face([
            Vec3::new(x0, y0, z0),
            Vec3::new(x1, y0, z0),
            Vec3::new(x1, y0, z1),
            Vec3::new(x0, y0, z1),
        ]);
        // +Z
        add_face([
            Vec3::new(x0, y0, z1),
            Vec3::new(x1, y0, z1),
            Vec3::new(x1, y1, z1),
            Vec3::new(x0, y1, z1),
        ]);
        // -Z
        add_face([
            Vec3::new(x0, y1, z0),
            Vec3::new(x1, y1, z0),
            Vec3::new(x1, y0, z0),
            Vec3::new(x0, y0, z0),
        ]);

        Self::new(vertices, indices)
    }

    /// Iterate triangles as vertex triples in local coordinates
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|tri| {
            let a = *self.vertices.get(tri[0] as usize)?;
            let b = *self.vertices.get(tri[1] as usize)?;
            let c = *self.vertices.get(tri[2] as usize)?;
            Some([a, b, c])
        })
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

impl MeshHandle for TriangleMesh {
    fn scale(&self) -> Vec3 {
        self.scale
    }

    fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    fn compute_bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.vertices.iter().map(|v| *v * self.scale))
    }
}
