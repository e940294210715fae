//! GPU uniform buffer types
//!
//! Layouts here must match the `SceneUniform` and `ObjectUniform` structs
//! declared in the model shaders.

use crate::core::camera::CameraPose;
use crate::core::result::class_id_color;
use crate::graphics::material::Material;
use crate::graphics::renderer::Lighting;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Per-render scene data shared by every model draw
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SceneUniform {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    /// Eye position, w unused
    pub view_position: [f32; 4],
    /// The searchlight sits at the eye
    pub search_light_position: [f32; 4],
    pub search_light_direction: [f32; 4],
    /// Direction the sunlight travels
    pub sun_direction: [f32; 4],
    pub sun_color: [f32; 4],
    pub ambient_color: [f32; 4],
    /// rgb is the color, w is the sine of the cone half-angle
    pub search_light_color: [f32; 4],
}

impl SceneUniform {
    pub fn new(projection: Mat4, pose: &CameraPose, lighting: &Lighting) -> Self {
        let eye = pose.position.extend(1.0).to_array();
        Self {
            projection: projection.to_cols_array_2d(),
            view: pose.view_matrix().to_cols_array_2d(),
            view_position: eye,
            search_light_position: eye,
            search_light_direction: pose.front().extend(0.0).to_array(),
            sun_direction: lighting
                .sun_direction
                .try_normalize()
                .unwrap_or(Vec3::NEG_Y)
                .extend(0.0)
                .to_array(),
            sun_color: lighting.sun_color.extend(1.0).to_array(),
            ambient_color: lighting.ambient_color.extend(1.0).to_array(),
            search_light_color: lighting
                .searchlight_color
                .extend(lighting.searchlight_angle_radians.sin())
                .to_array(),
        }
    }
}

/// Per-draw object data
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ObjectUniform {
    /// Model matrix for world transformation
    pub model: [[f32; 4]; 4],
    /// Semantic class id packed into normalized rgb, w is 1
    pub class_id_color: [f32; 4],
    /// Material diffuse color (RGBA)
    pub base_color: [f32; 4],
}

impl ObjectUniform {
    pub fn new(model: Mat4, semantic_class_id: u32, material: &Material) -> Self {
        let [r, g, b] = class_id_color(semantic_class_id);
        Self {
            model: model.to_cols_array_2d(),
            class_id_color: [r, g, b, 1.0],
            base_color: material.color,
        }
    }
}

impl Default for ObjectUniform {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, 0, &Material::white())
    }
}

/// Helper trait for creating GPU buffers from uniform types
pub trait UniformBuffer: Pod {
    /// Create a GPU buffer containing this uniform data
    fn create_buffer(&self, device: &wgpu::Device, label: Option<&str>) -> wgpu::Buffer {
        use wgpu::util::DeviceExt;

        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label,
            contents: bytemuck::cast_slice(&[*self]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        })
    }
}

impl UniformBuffer for SceneUniform {}
impl UniformBuffer for ObjectUniform {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;

    #[test]
    fn test_uniform_sizes() {
        // Two matrices plus seven vec4s
        assert_eq!(mem::size_of::<SceneUniform>(), 240);
        // One matrix plus two vec4s
        assert_eq!(mem::size_of::<ObjectUniform>(), 96);
    }

    #[test]
    fn test_object_uniform_packs_class_id() {
        let uniform = ObjectUniform::new(Mat4::IDENTITY, 0x00_01_02, &Material::white());
        assert_eq!(uniform.class_id_color, [2.0 / 255.0, 1.0 / 255.0, 0.0, 1.0]);
        assert_eq!(uniform.base_color, [1.0; 4]);
    }

    #[test]
    fn test_scene_uniform_lighting() {
        let pose = CameraPose {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
        };
        let lighting = Lighting {
            sun_direction: Vec3::new(0.0, -2.0, 0.0),
            searchlight_angle_radians: std::f32::consts::FRAC_PI_6,
            ..Default::default()
        };
        let uniform = SceneUniform::new(Mat4::IDENTITY, &pose, &lighting);

        assert_eq!(uniform.view_position, [0.0, 0.0, 5.0, 1.0]);
        assert_eq!(uniform.search_light_direction, [0.0, 0.0, -1.0, 0.0]);
        assert_eq!(uniform.sun_direction, [0.0, -1.0, 0.0, 0.0]);
        assert!((uniform.search_light_color[3] - 0.5).abs() < 1e-6);
    }
}
