use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use super::vertex::{Vertex3D, FLOATS_PER_VERTEX};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to load model '{path}': {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },
    #[error("malformed mesh: {0}")]
    MalformedMesh(String),
}

/// Process-unique model identity, used to key GPU-side mesh caches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(u64);

impl ModelId {
    fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// CPU-side geometry of one sub-mesh
///
/// Vertices are interleaved `[px, py, pz, nx, ny, nz, u, v]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    vertices: Vec<f32>,
    indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<f32>, indices: Vec<u32>) -> Result<Self, ModelError> {
        if vertices.len() % FLOATS_PER_VERTEX != 0 {
            return Err(ModelError::MalformedMesh(format!(
                "vertex stream of {} floats is not a multiple of {}",
                vertices.len(),
                FLOATS_PER_VERTEX
            )));
        }

        let vertex_count = vertices.len() / FLOATS_PER_VERTEX;
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(ModelError::MalformedMesh(format!(
                "index {} out of range for {} vertices",
                bad, vertex_count
            )));
        }

        Ok(Self { vertices, indices })
    }

    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// The vertex stream viewed as structured vertices
    pub fn as_vertices(&self) -> &[Vertex3D] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / FLOATS_PER_VERTEX
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }
}

/// A loaded mesh file: an ordered list of sub-meshes
#[derive(Debug)]
pub struct Model {
    id: ModelId,
    path: Option<PathBuf>,
    meshes: Vec<MeshData>,
    is_loaded: bool,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    /// An empty, unloaded model
    pub fn new() -> Self {
        Self {
            id: ModelId::next(),
            path: None,
            meshes: Vec::new(),
            is_loaded: false,
        }
    }

    /// Wraps geometry that was built in code rather than read from disk
    pub fn from_meshes(meshes: Vec<MeshData>) -> Self {
        Self {
            id: ModelId::next(),
            path: None,
            meshes,
            is_loaded: true,
        }
    }

    /// Loads every sub-mesh of an OBJ file
    ///
    /// Faces are triangulated and re-indexed so that position, normal and
    /// texture coordinate share a single index. Missing normals are generated
    /// by averaging adjacent face normals; missing texture coordinates become
    /// `(0, 0)`.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let (models, materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|source| ModelError::Load {
            path: path.to_path_buf(),
            source,
        })?;

        if let Err(e) = materials {
            log::debug!("No materials for {}: {}", path.display(), e);
        }

        let meshes = models
            .iter()
            .map(|m| flatten_mesh(&m.mesh))
            .collect::<Result<Vec<_>, _>>()?;

        let model = Self {
            id: ModelId::next(),
            path: Some(path.to_path_buf()),
            meshes,
            is_loaded: true,
        };

        log::info!(
            "Loaded model {} ({} mesh(es), {} vertices, {} indices)",
            path.display(),
            model.mesh_count(),
            model.meshes.iter().map(MeshData::vertex_count).sum::<usize>(),
            model.meshes.iter().map(MeshData::index_count).sum::<usize>(),
        );

        Ok(model)
    }

    pub fn id(&self) -> ModelId {
        self.id
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn meshes(&self) -> &[MeshData] {
        &self.meshes
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_loaded(&self) -> bool {
        self.is_loaded
    }
}

fn flatten_mesh(mesh: &tobj::Mesh) -> Result<MeshData, ModelError> {
    let vertex_count = mesh.positions.len() / 3;

    let normals = if !mesh.normals.is_empty() && mesh.normals.len() == mesh.positions.len() {
        mesh.normals.clone()
    } else {
        calculate_vertex_normals(&mesh.positions, &mesh.indices)
    };
    let has_tex_coords = mesh.texcoords.len() == vertex_count * 2;

    let mut vertices = Vec::with_capacity(vertex_count * FLOATS_PER_VERTEX);
    for i in 0..vertex_count {
        vertices.extend_from_slice(&mesh.positions[i * 3..i * 3 + 3]);
        vertices.extend_from_slice(&normals[i * 3..i * 3 + 3]);
        if has_tex_coords {
            // OBJ puts v=0 at the bottom, wgpu samples from the top
            vertices.push(mesh.texcoords[i * 2]);
            vertices.push(1.0 - mesh.texcoords[i * 2 + 1]);
        } else {
            vertices.extend_from_slice(&[0.0, 0.0]);
        }
    }

    MeshData::new(vertices, mesh.indices.clone())
}

/// Smooth per-vertex normals from the faces that share each vertex
///
/// Vertices not referenced by any triangle get an up-facing normal.
pub fn calculate_vertex_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
    use cgmath::{InnerSpace, Vector3};

    let vertex_count = positions.len() / 3;
    let position = |i: usize| {
        Vector3::new(positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2])
    };

    let mut accumulated = vec![Vector3::new(0.0f32, 0.0, 0.0); vertex_count];
    for triangle in indices.chunks_exact(3) {
        let (i0, i1, i2) = (
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        );
        if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
            continue;
        }
        let v0 = position(i0);
        let face_normal = (position(i1) - v0).cross(position(i2) - v0);
        for idx in [i0, i1, i2] {
            accumulated[idx] += face_normal;
        }
    }

    let mut normals = Vec::with_capacity(positions.len());
    for n in accumulated {
        let n = if n.magnitude2() > 0.0 {
            n.normalize()
        } else {
            Vector3::unit_y()
        };
        normals.extend_from_slice(&[n.x, n.y, n.z]);
    }
    normals
}
