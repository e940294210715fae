//! Model file loading
//!
//! Reads Wavefront OBJ files (with their MTL materials) into model parts.

use crate::assets::model_store::ModelPart;
use crate::graphics::{Material, Mesh, Vertex};
use glam::Vec3;
use std::path::Path;
use tracing::{debug, info, warn};

/// Errors that can occur during mesh loading
#[derive(Debug, thiserror::Error)]
pub enum MeshLoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OBJ loading error: {0}")]
    ObjLoad(#[from] tobj::LoadError),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("No mesh data found in file")]
    NoMeshData,
}

/// Load every object of a model file as a separate part
pub fn load_model_parts(path: &Path) -> Result<Vec<ModelPart>, MeshLoadError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "obj" => load_obj(path),
        ext => Err(MeshLoadError::UnsupportedFormat(ext.to_string())),
    }
}

fn load_obj(path: &Path) -> Result<Vec<ModelPart>, MeshLoadError> {
    info!("Loading OBJ file: {:?}", path);

    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )?;

    let materials = materials.unwrap_or_else(|err| {
        warn!(path = ?path, error = %err, "Failed to load materials, using white");
        Vec::new()
    });

    let parts: Vec<ModelPart> = models
        .into_iter()
        .filter(|model| !model.mesh.indices.is_empty())
        .map(|model| {
            let material = model
                .mesh
                .material_id
                .and_then(|id| materials.get(id))
                .map(Material::from_obj_material)
                .unwrap_or_default();
            let mesh = convert_mesh(&model.mesh);

            debug!(
                part = %model.name,
                vertices = mesh.vertices.len(),
                indices = mesh.indices.len(),
                "Loaded OBJ part"
            );
            ModelPart::new(model.name, mesh, material)
        })
        .collect();

    if parts.is_empty() {
        return Err(MeshLoadError::NoMeshData);
    }

    Ok(parts)
}

/// Convert tobj's flat arrays into our vertex format
fn convert_mesh(mesh: &tobj::Mesh) -> Mesh {
    let vertex_count = mesh.positions.len() / 3;
    let has_normals = mesh.normals.len() >= vertex_count * 3;
    let has_uvs = mesh.texcoords.len() >= vertex_count * 2;

    let mut vertices: Vec<Vertex> = (0..vertex_count)
        .map(|i| {
            let position = [
                mesh.positions[i * 3],
                mesh.positions[i * 3 + 1],
                mesh.positions[i * 3 + 2],
            ];
            let normal = if has_normals {
                [
                    mesh.normals[i * 3],
                    mesh.normals[i * 3 + 1],
                    mesh.normals[i * 3 + 2],
                ]
            } else {
                [0.0, 1.0, 0.0]
            };
            let uv = if has_uvs {
                [mesh.texcoords[i * 2], 1.0 - mesh.texcoords[i * 2 + 1]]
            } else {
                [0.0, 0.0]
            };
            Vertex::new(position, normal, uv)
        })
        .collect();

    if !has_normals {
        calculate_normals(&mut vertices, &mesh.indices);
    }

    Mesh::new(vertices, mesh.indices.clone())
}

/// Calculate smooth vertex normals from face geometry
fn calculate_normals(vertices: &mut [Vertex], indices: &[u32]) {
    let mut accumulated = vec![Vec3::ZERO; vertices.len()];

    for triangle in indices.chunks_exact(3) {
        let [i0, i1, i2] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
        if i0 >= vertices.len() || i1 >= vertices.len() || i2 >= vertices.len() {
            continue;
        }

        let v0 = Vec3::from(vertices[i0].position);
        let v1 = Vec3::from(vertices[i1].position);
        let v2 = Vec3::from(vertices[i2].position);
        // Area-weighted: the unnormalized cross product
        let face_normal = (v1 - v0).cross(v2 - v0);

        for i in [i0, i1, i2] {
            accumulated[i] += face_normal;
        }
    }

    for (vertex, normal) in vertices.iter_mut().zip(accumulated) {
        vertex.normal = normal.try_normalize().unwrap_or(Vec3::Y).to_array();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const TRIANGLE_OBJ: &str = "\
mtllib triangle.mtl
o tri
v 0 0 0
v 1 0 0
v 0 1 0
usemtl red
f 1 2 3
";

    const TRIANGLE_MTL: &str = "\
newmtl red
Kd 1.0 0.0 0.0
";

    #[test]
    fn test_unsupported_format() {
        let result = load_model_parts(Path::new("test.fbx"));
        assert!(matches!(result, Err(MeshLoadError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_load_obj_with_material() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("triangle.obj"), TRIANGLE_OBJ).unwrap();
        fs::write(dir.path().join("triangle.mtl"), TRIANGLE_MTL).unwrap();

        let parts = load_model_parts(&dir.path().join("triangle.obj")).unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].name, "tri");
        assert_eq!(parts[0].mesh.vertices.len(), 3);
        assert_eq!(parts[0].mesh.indices, vec![0, 1, 2]);
        assert_eq!(parts[0].material.color, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_missing_normals_are_computed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("triangle.obj"), TRIANGLE_OBJ).unwrap();
        fs::write(dir.path().join("triangle.mtl"), TRIANGLE_MTL).unwrap();

        let parts = load_model_parts(&dir.path().join("triangle.obj")).unwrap();
        for vertex in &parts[0].mesh.vertices {
            assert_eq!(vertex.normal, [0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn test_missing_mtl_falls_back_to_white() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("UPPER.OBJ");
        fs::write(&path, TRIANGLE_OBJ).unwrap();

        let parts = load_model_parts(&path).unwrap();
        assert_eq!(parts[0].material, Material::white());
    }

    #[test]
    fn test_file_without_faces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.obj");
        fs::write(&path, "v 0 0 0\nv 1 1 1\n").unwrap();

        assert!(matches!(
            load_model_parts(&path),
            Err(MeshLoadError::NoMeshData)
        ));
    }

    #[test]
    fn test_calculate_normals_flat_quad() {
        let mut vertices = vec![
            Vertex::new([0.0, 0.0, 0.0], [0.0; 3], [0.0; 2]),
            Vertex::new([1.0, 0.0, 0.0], [0.0; 3], [0.0; 2]),
            Vertex::new([1.0, 0.0, -1.0], [0.0; 3], [0.0; 2]),
            Vertex::new([0.0, 0.0, -1.0], [0.0; 3], [0.0; 2]),
        ];
        calculate_normals(&mut vertices, &[0, 1, 2, 0, 2, 3]);
        for vertex in &vertices {
            assert_eq!(vertex.normal, [0.0, 1.0, 0.0]);
        }
    }
}
