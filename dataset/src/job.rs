//! Dataset job files
//!
//! A job names the backgrounds and models to load, where to write output and
//! the scenes to render. Relative paths are resolved against the directory
//! holding the job file.

use anyhow::{bail, Context as _};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use synth::core::result::MAX_CLASS_ID;
use synth::core::{CameraPose, ObjectAttributes, Placement};
use synth::graphics::{Lighting, RenderRequest};
use synth::RendererConfig;
use tracing::debug;

/// One scene of a job
#[derive(Debug, Clone, Deserialize)]
pub struct SceneSpec {
    pub background_index: usize,
    #[serde(default)]
    pub camera: CameraPose,
    #[serde(default)]
    pub lighting: Lighting,
    #[serde(default)]
    pub objects: Vec<Placement>,
    /// Also render the segmentation map
    #[serde(default)]
    pub segmentation: bool,
}

impl SceneSpec {
    pub fn to_request(&self) -> RenderRequest {
        RenderRequest::new(self.objects.clone(), self.background_index, self.camera)
            .with_lighting(self.lighting)
            .with_segmentation(self.segmentation)
    }
}

/// A complete dataset job
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    #[serde(default)]
    pub renderer: RendererConfig,
    /// Directories scanned for background images, in order
    #[serde(default)]
    pub backgrounds: Vec<PathBuf>,
    /// Model files keyed by the name placements refer to
    #[serde(default)]
    pub models: BTreeMap<String, PathBuf>,
    pub output_dir: PathBuf,
    #[serde(default)]
    pub scenes: Vec<SceneSpec>,
}

impl JobConfig {
    /// Read, resolve and validate a job file
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read job file {}", path.display()))?;
        let mut job: Self = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse job file {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        job.resolve_paths(base);
        job.validate()?;

        debug!(
            path = ?path,
            models = job.models.len(),
            scenes = job.scenes.len(),
            "Loaded job"
        );
        Ok(job)
    }

    /// Make every relative path relative to `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };

        self.backgrounds.iter_mut().for_each(resolve);
        self.models.values_mut().for_each(resolve);
        resolve(&mut self.output_dir);
        if let Some(dir) = self.renderer.shader_dir.as_mut() {
            resolve(dir);
        }
    }

    /// Reject scenes that reference unknown models or carry unusable attributes
    pub fn validate(&self) -> anyhow::Result<()> {
        self.renderer.validate()?;

        for (index, scene) in self.scenes.iter().enumerate() {
            for placement in &scene.objects {
                if !self.models.contains_key(&placement.model) {
                    bail!("scene {index}: model '{}' is not listed in models", placement.model);
                }
                validate_attributes(&placement.attributes)
                    .with_context(|| format!("scene {index}: object '{}'", placement.model))?;
            }
        }

        Ok(())
    }

    /// `(name, path)` pairs in name order, as the renderer loads them
    pub fn model_list(&self) -> Vec<(&str, &Path)> {
        self.models
            .iter()
            .map(|(name, path)| (name.as_str(), path.as_path()))
            .collect()
    }
}

fn validate_attributes(attributes: &ObjectAttributes) -> anyhow::Result<()> {
    let values = [
        ("scale", attributes.scale),
        ("x", attributes.x),
        ("y", attributes.y),
        ("z", attributes.z),
        ("yaw", attributes.yaw),
        ("pitch", attributes.pitch),
        ("roll", attributes.roll),
    ];
    for (key, value) in values {
        if !value.is_finite() {
            bail!("attribute '{key}' is not a finite number");
        }
    }

    if attributes.scale <= 0.0 {
        bail!("scale must be positive, got {}", attributes.scale);
    }
    if attributes.semantic_class_id > MAX_CLASS_ID {
        bail!(
            "semantic class {} does not fit in 24 bits",
            attributes.semantic_class_id
        );
    }

    Ok(())
}
