//! Configuration types for the renderer

use crate::error::{Result, SynthError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration for the offscreen renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Width of generated images in pixels
    pub width: u32,
    /// Height of generated images in pixels
    pub height: u32,
    /// Vertical field of view of the camera in degrees
    pub fov_y_degrees: f32,
    /// Near clipping plane distance
    pub z_near: f32,
    /// Far clipping plane distance
    pub z_far: f32,
    /// Depth of the background quad in normalized device coordinates
    pub background_depth: f32,
    /// Directory holding `background.wgsl`, `lit.wgsl` and `semantic.wgsl`
    /// to use instead of the embedded shaders
    pub shader_dir: Option<PathBuf>,
    /// Request the software fallback adapter
    pub force_fallback_adapter: bool,
}

impl RendererConfig {
    /// Create a configuration for the given output size with default camera settings
    pub fn new(width: u32, height: u32) -> Self {
        debug!(width, height, "Creating new RendererConfig");
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Load a configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| SynthError::InvalidConfig(format!("{}: {e}", path.display())))?;
        debug!(path = ?path, "Loaded renderer config");
        config.validate()?;
        Ok(config)
    }

    /// Width divided by height
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Check that the configuration describes a usable camera and target
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SynthError::InvalidConfig(format!(
                "image size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }

        if !(self.fov_y_degrees > 0.0 && self.fov_y_degrees < 180.0) {
            return Err(SynthError::InvalidConfig(format!(
                "field of view must be in (0, 180) degrees, got {}",
                self.fov_y_degrees
            )));
        }

        if !(self.z_near > 0.0 && self.z_near < self.z_far) {
            return Err(SynthError::InvalidConfig(format!(
                "clip planes must satisfy 0 < near < far, got near={} far={}",
                self.z_near, self.z_far
            )));
        }

        if !(self.background_depth > 0.0 && self.background_depth < 1.0) {
            return Err(SynthError::InvalidConfig(format!(
                "background depth must be in (0, 1), got {}",
                self.background_depth
            )));
        }

        if let Some(dir) = &self.shader_dir {
            if !dir.is_dir() {
                return Err(SynthError::InvalidConfig(format!(
                    "shader directory not found: {dir:?}"
                )));
            }
        }

        Ok(())
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fov_y_degrees: 45.0,
            z_near: 0.1,
            z_far: 100.0,
            background_depth: 0.999,
            shader_dir: None,
            force_fallback_adapter: false,
        }
    }
}
