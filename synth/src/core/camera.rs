//! Camera pose and projection
//!
//! Builds the view and projection matrices used by every render pass and by
//! the bounding rectangle projector.

use crate::config::RendererConfig;
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Where the camera sits and what it looks at
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    /// Eye position in world space
    pub position: Vec3,
    /// Point the camera looks at
    pub target: Vec3,
    /// Up direction used to orient the view
    pub up: Vec3,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
        }
    }
}

impl CameraPose {
    /// Unit vector from the eye towards the target
    pub fn front(&self) -> Vec3 {
        (self.target - self.position).normalize()
    }

    /// Right-handed look-at view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }
}

/// Perspective camera with a fixed field of view
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Field of view in radians
    pub fov_y_radians: f32,
    /// Aspect ratio (width / height)
    pub aspect_ratio: f32,
    /// Near clipping plane distance
    pub z_near: f32,
    /// Far clipping plane distance
    pub z_far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(45.0, 4.0 / 3.0, 0.1, 100.0)
    }
}

impl Camera {
    /// Create a perspective camera
    ///
    /// # Arguments
    /// * `fov_y_degrees` - Vertical field of view in degrees
    /// * `aspect_ratio` - Width divided by height
    /// * `z_near` - Near clipping plane distance
    /// * `z_far` - Far clipping plane distance
    pub fn perspective(fov_y_degrees: f32, aspect_ratio: f32, z_near: f32, z_far: f32) -> Self {
        Self {
            fov_y_radians: fov_y_degrees.to_radians(),
            aspect_ratio,
            z_near,
            z_far,
        }
    }

    /// Camera matching the renderer's output size and clip planes
    pub fn from_config(config: &RendererConfig) -> Self {
        Self::perspective(
            config.fov_y_degrees,
            config.aspect_ratio(),
            config.z_near,
            config.z_far,
        )
    }

    /// Calculate the projection matrix for this camera
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_radians, self.aspect_ratio, self.z_near, self.z_far)
    }

    /// Calculate the combined projection-view matrix for a pose
    pub fn projection_view_matrix(&self, pose: &CameraPose) -> Mat4 {
        self.projection_matrix() * pose.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_perspective_projection() {
        let camera = Camera::perspective(45.0, 16.0 / 9.0, 0.1, 100.0);
        let proj = camera.projection_matrix();

        // Perspective projection has w=0 in the last row
        assert_eq!(proj.w_axis.w, 0.0);
        assert!(proj.z_axis.z < 0.0);
    }

    #[test]
    fn test_from_config_uses_output_aspect() {
        let config = RendererConfig::new(200, 100);
        let camera = Camera::from_config(&config);
        assert_eq!(camera.aspect_ratio, 2.0);
        assert!((camera.fov_y_radians - 45.0_f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn test_view_matrix_moves_eye_to_origin() {
        let pose = CameraPose {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
        };

        let eye = pose.view_matrix().transform_point3(pose.position);
        assert!(eye.length() < 1e-5);

        // The target lies straight ahead, down the -Z axis of view space
        let target = pose.view_matrix().transform_point3(pose.target);
        assert!((target - Vec3::new(0.0, 0.0, -5.0)).length() < 1e-5);
    }

    #[test]
    fn test_front_is_normalized() {
        let pose = CameraPose {
            position: Vec3::new(3.0, 0.0, 0.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
        };
        assert!((pose.front() - Vec3::NEG_X).length() < 1e-6);
    }

    #[test]
    fn test_target_projects_to_screen_center() {
        let pose = CameraPose::default();
        let camera = Camera::default();
        let clip = camera.projection_view_matrix(&pose) * pose.target.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-6);
        assert!(ndc.y.abs() < 1e-6);
    }
}
