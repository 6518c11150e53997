//! Project file serialization

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::constants::PROJECT_VERSION;
use crate::face::extract_planar_faces;
use crate::mesh::{MeshError, SharedMesh, TriangleMesh, share_mesh};
use crate::part::Part;
use crate::resolver::AssemblyConstraintResolver;
use crate::sequence::{AssemblySequence, FaceTable, SequenceSolution};

/// Where a part's geometry comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeometrySource {
    /// Axis-aligned box
    Cuboid { min: Vec3, max: Vec3 },
    /// STL file, relative paths resolved against the project directory
    Stl { path: PathBuf },
}

impl GeometrySource {
    fn load(&self, base_dir: &Path) -> Result<TriangleMesh, MeshError> {
        match self {
            GeometrySource::Cuboid { min, max } => Ok(TriangleMesh::cuboid(*min, *max)),
            GeometrySource::Stl { path } => TriangleMesh::from_stl(base_dir.join(path)),
        }
    }
}

/// Assembly project file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyProject {
    /// File format version
    pub version: u32,
    pub name: String,
    /// Parts in assembly order
    pub parts: Vec<Part>,
    /// Geometry per part name
    #[serde(default)]
    pub geometry: BTreeMap<String, GeometrySource>,
    /// Optional mate sequence placing unconstrained parts
    #[serde(default)]
    pub sequence: Option<AssemblySequence>,
}

impl Default for AssemblyProject {
    fn default() -> Self {
        Self::new("New Assembly")
    }
}

/// Parts, meshes and faces loaded from a project
///
/// The session owns the meshes; the resolver only holds weak references to
/// them, so the session must outlive any re-measurement.
pub struct AssemblySession {
    pub resolver: AssemblyConstraintResolver,
    pub meshes: HashMap<String, SharedMesh>,
    pub faces: FaceTable,
    pub solution: Option<SequenceSolution>,
}

impl AssemblyProject {
    /// Create a new empty project
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: PROJECT_VERSION,
            name: name.into(),
            parts: Vec::new(),
            geometry: BTreeMap::new(),
            sequence: None,
        }
    }

    pub fn with_part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    pub fn with_geometry(mut self, part: impl Into<String>, source: GeometrySource) -> Self {
        self.geometry.insert(part.into(), source);
        self
    }

    pub fn with_sequence(mut self, sequence: AssemblySequence) -> Self {
        self.sequence = Some(sequence);
        self
    }

    /// Save project to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ProjectError> {
        let content = self.to_bytes()?;
        std::fs::write(path.as_ref(), content).map_err(|e| ProjectError::Io(e.to_string()))?;
        Ok(())
    }

    /// Serialize project to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProjectError> {
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ProjectError::Serialize(e.to_string()))?;
        Ok(content.into_bytes())
    }

    /// Load project from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let content =
            std::fs::read(path.as_ref()).map_err(|e| ProjectError::Io(e.to_string()))?;
        Self::load_from_bytes(&content)
    }

    /// Load project from bytes
    pub fn load_from_bytes(data: &[u8]) -> Result<Self, ProjectError> {
        let content =
            std::str::from_utf8(data).map_err(|e| ProjectError::Deserialize(e.to_string()))?;
        let project: AssemblyProject =
            ron::from_str(content).map_err(|e| ProjectError::Deserialize(e.to_string()))?;
        if project.version > PROJECT_VERSION {
            return Err(ProjectError::UnsupportedVersion(project.version));
        }
        Ok(project)
    }

    /// Load geometry, solve the mate sequence and register everything in a
    /// fresh resolver
    ///
    /// Parts placed by the sequence that have neither a constraint nor a
    /// literal offset take the solved position as their assembly offset.
    /// Solved positions are multiplied by `scale`, like the bounding boxes.
    pub fn build_session(&self, base_dir: &Path, scale: f32) -> Result<AssemblySession, ProjectError> {
        let mut meshes = HashMap::new();
        let mut faces = FaceTable::new();
        for (name, source) in &self.geometry {
            if !self.parts.iter().any(|p| &p.name == name) {
                tracing::warn!("Geometry for unknown part '{}' ignored", name);
                continue;
            }
            let mesh = source
                .load(base_dir)
                .map_err(|e| ProjectError::Mesh(name.clone(), e))?;
            faces.insert(name.clone(), extract_planar_faces(&mesh));
            meshes.insert(name.clone(), share_mesh(mesh));
        }

        // Faces are in mesh units; bring solved positions into the same
        // logical scale as the measured bounding boxes
        let solution = self.sequence.as_ref().map(|sequence| {
            let mut solution = sequence.solve(&faces);
            for pose in solution.poses.values_mut() {
                pose.position *= scale;
            }
            solution
        });

        let mut parts = self.parts.clone();
        if let Some(solution) = &solution {
            for part in &mut parts {
                if part.is_ground || part.constraint.is_some() || part.assembly_offset.is_some() {
                    continue;
                }
                if let Some(pose) = solution.pose(&part.name) {
                    part.assembly_offset = Some(pose.position);
                }
            }
        }

        let mut resolver = AssemblyConstraintResolver::with_parts(parts);
        for (name, mesh) in &meshes {
            resolver.register_mesh(name, mesh, scale);
        }
        tracing::info!(
            "Loaded project '{}': {} parts, {} meshes",
            self.name,
            resolver.part_count(),
            meshes.len()
        );

        Ok(AssemblySession {
            resolver,
            meshes,
            faces,
            solution,
        })
    }
}

/// Project-related errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProjectError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
    #[error("Unsupported project version: {0}")]
    UnsupportedVersion(u32),
    #[error("Failed to load geometry for '{0}': {1}")]
    Mesh(String, MeshError),
}
