//! Surface material of a model part

use serde::{Deserialize, Serialize};

/// Material defining the base color a part is shaded with
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Base (diffuse) color of the material (RGBA)
    pub color: [f32; 4],
}

impl Default for Material {
    fn default() -> Self {
        Self::white()
    }
}

impl Material {
    pub fn new(color: [f32; 4]) -> Self {
        Self { color }
    }

    /// Create a material from RGB values (alpha = 1.0)
    pub fn from_rgb(r: f32, g: f32, b: f32) -> Self {
        Self {
            color: [r, g, b, 1.0],
        }
    }

    pub fn white() -> Self {
        Self::from_rgb(1.0, 1.0, 1.0)
    }

    /// Material from an MTL entry, using its diffuse color and dissolve
    pub fn from_obj_material(material: &tobj::Material) -> Self {
        let [r, g, b] = material.diffuse.unwrap_or([1.0, 1.0, 1.0]);
        let alpha = material.dissolve.unwrap_or(1.0);
        Self::new([r, g, b, alpha])
    }
}
