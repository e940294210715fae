//! Named store of loaded models
//!
//! Models are inserted during setup and read during rendering. Each model
//! keeps its convex hull points next to the mesh parts so bounding
//! computations never touch full meshes.

use crate::assets::hull::convex_hull_points;
use crate::assets::mesh_loader::{load_model_parts, MeshLoadError};
use crate::graphics::{Material, Mesh};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// One drawable piece of a model with its own material
#[derive(Debug, Clone)]
pub struct ModelPart {
    pub name: String,
    pub mesh: Mesh,
    pub material: Material,
}

impl ModelPart {
    pub fn new(name: impl Into<String>, mesh: Mesh, material: Material) -> Self {
        Self {
            name: name.into(),
            mesh,
            material,
        }
    }
}

/// A loaded model: mesh parts plus the convex hull of all their vertices
#[derive(Debug, Clone)]
pub struct Model {
    parts: Vec<ModelPart>,
    hull: Vec<Vec3>,
}

impl Model {
    /// Build a model and compute its convex hull
    pub fn from_parts(parts: Vec<ModelPart>) -> Self {
        let positions: Vec<Vec3> = parts.iter().flat_map(|part| part.mesh.positions()).collect();
        let hull = convex_hull_points(&positions);
        debug!(
            vertices = positions.len(),
            hull_points = hull.len(),
            "Computed model convex hull"
        );
        Self { parts, hull }
    }

    /// Model with an explicit hull and no drawable parts
    pub fn from_hull_points(hull: Vec<Vec3>) -> Self {
        Self {
            parts: Vec::new(),
            hull,
        }
    }

    pub fn parts(&self) -> &[ModelPart] {
        &self.parts
    }

    pub fn hull_points(&self) -> &[Vec3] {
        &self.hull
    }

    /// Axis-aligned extent of the hull in model space, `None` for an empty hull
    pub fn extent(&self) -> Option<Extent> {
        let (first, rest) = self.hull.split_first()?;
        Some(rest.iter().fold(
            Extent {
                min: *first,
                max: *first,
            },
            |extent, &point| Extent {
                min: extent.min.min(point),
                max: extent.max.max(point),
            },
        ))
    }
}

/// Axis-aligned box in model space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min: Vec3,
    pub max: Vec3,
}

impl Extent {
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// Extent of one named model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelExtent {
    pub name: String,
    pub extent: Option<Extent>,
}

/// Models keyed by name
#[derive(Debug, Default)]
pub struct ModelStore {
    models: HashMap<String, Model>,
}

impl ModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a model file and store it under `name`, replacing any previous model
    pub fn load(&mut self, name: &str, path: &Path) -> Result<&Model, MeshLoadError> {
        info!(name = %name, path = ?path, "Loading model");
        let parts = load_model_parts(path)?;
        Ok(self.insert(name, Model::from_parts(parts)))
    }

    /// Store a model under `name`; duplicate names overwrite silently
    pub fn insert(&mut self, name: &str, model: Model) -> &Model {
        if self.models.contains_key(name) {
            debug!(name = %name, "Replacing previously loaded model");
        }
        self.models.insert(name.to_string(), model);
        &self.models[name]
    }

    pub fn get(&self, name: &str) -> Option<&Model> {
        self.models.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Extent of a single model
    pub fn extent(&self, name: &str) -> Option<Extent> {
        self.models.get(name)?.extent()
    }

    /// Extents of all models, sorted by name
    pub fn extent_all(&self) -> Vec<ModelExtent> {
        let mut extents: Vec<ModelExtent> = self
            .models
            .iter()
            .map(|(name, model)| ModelExtent {
                name: name.clone(),
                extent: model.extent(),
            })
            .collect();
        extents.sort_by(|a, b| a.name.cmp(&b.name));
        extents
    }
}
