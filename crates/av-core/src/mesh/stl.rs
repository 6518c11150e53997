//! STL loading into triangle meshes

use std::collections::HashMap;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use glam::Vec3;

use super::TriangleMesh;
use crate::constants::STL_VERTEX_PRECISION;

/// Load an STL file at unit scale
pub fn load_stl(path: impl AsRef<Path>) -> Result<TriangleMesh, MeshError> {
    let file = std::fs::File::open(path.as_ref()).map_err(|e| MeshError::Io(e.to_string()))?;
    read_stl(&mut BufReader::new(file))
}

/// Load an STL mesh from bytes
pub fn load_stl_from_bytes(data: &[u8]) -> Result<TriangleMesh, MeshError> {
    read_stl(&mut Cursor::new(data))
}

fn read_stl<R: Read + Seek>(reader: &mut R) -> Result<TriangleMesh, MeshError> {
    let mesh = stl_io::read_stl(reader).map_err(|e| MeshError::Parse(e.to_string()))?;
    let (vertices, indices) = weld_vertices(&mesh);
    if indices.is_empty() {
        return Err(MeshError::Empty);
    }
    Ok(TriangleMesh::new(vertices, indices))
}

/// Merge vertices that quantize to the same position
fn weld_vertices(mesh: &stl_io::IndexedMesh) -> (Vec<Vec3>, Vec<u32>) {
    let mut unique: Vec<Vec3> = Vec::new();
    let mut vertex_map: HashMap<[i32; 3], u32> = HashMap::new();
    let mut indices = Vec::with_capacity(mesh.faces.len() * 3);

    for face in &mesh.faces {
        for &vertex_idx in &face.vertices {
            let Some(vertex) = mesh.vertices.get(vertex_idx) else {
                continue;
            };
            let v = Vec3::new(vertex[0], vertex[1], vertex[2]);
            let key = [
                (v.x * STL_VERTEX_PRECISION).round() as i32,
                (v.y * STL_VERTEX_PRECISION).round() as i32,
                (v.z * STL_VERTEX_PRECISION).round() as i32,
            ];
            let index = *vertex_map.entry(key).or_insert_with(|| {
                unique.push(v);
                (unique.len() - 1) as u32
            });
            indices.push(index);
        }
    }

    // Drop a trailing partial triangle left by a skipped vertex
    indices.truncate(indices.len() - indices.len() % 3);
    (unique, indices)
}

/// Mesh loading errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum MeshError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Mesh contains no triangles")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASCII_TRIANGLE: &str = "solid tri
facet normal 0 0 1
  outer loop
    vertex 0 0 0
    vertex 1 0 0
    vertex 0 1 0
  endloop
endfacet
facet normal 0 0 1
  outer loop
    vertex 1 0 0
    vertex 1 1 0
    vertex 0 1 0
  endloop
endfacet
endsolid tri
";

    #[test]
    fn test_load_ascii_stl_welds_shared_vertices() {
        let mesh = load_stl_from_bytes(ASCII_TRIANGLE.as_bytes()).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.scale, Vec3::ONE);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_stl("/nonexistent/part.stl").unwrap_err();
        assert!(matches!(err, MeshError::Io(_)));
    }
}
