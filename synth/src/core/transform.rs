//! Object placement and model matrix construction

use glam::{EulerRot, Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Position, orientation, scale and semantic class of one placed object
///
/// Angles are in degrees. Rotation is applied as yaw (around Y), then pitch
/// (around X), then roll (around Z), composed intrinsically.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectAttributes {
    /// Uniform scale factor
    pub scale: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Rotation around the Y axis in degrees
    pub yaw: f32,
    /// Rotation around the X axis in degrees
    pub pitch: f32,
    /// Rotation around the Z axis in degrees
    pub roll: f32,
    /// Class label written into the segmentation map (24 bits are used)
    #[serde(default, alias = "semantic_class")]
    pub semantic_class_id: u32,
}

impl Default for ObjectAttributes {
    fn default() -> Self {
        Self {
            scale: 1.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
            semantic_class_id: 0,
        }
    }
}

impl ObjectAttributes {
    /// Create attributes at a position with unit scale and no rotation
    pub fn at(position: Vec3) -> Self {
        Self {
            x: position.x,
            y: position.y,
            z: position.z,
            ..Default::default()
        }
    }

    /// Set the yaw, pitch and roll angles in degrees
    pub fn with_rotation(mut self, yaw: f32, pitch: f32, roll: f32) -> Self {
        self.yaw = yaw;
        self.pitch = pitch;
        self.roll = roll;
        self
    }

    /// Set the uniform scale
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Set the semantic class label
    pub fn with_class(mut self, semantic_class_id: u32) -> Self {
        self.semantic_class_id = semantic_class_id;
        self
    }

    pub fn position(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Rotation matrix built from yaw, pitch and roll
    pub fn rotation_matrix(&self) -> Mat4 {
        Mat4::from_euler(
            EulerRot::YXZ,
            self.yaw.to_radians(),
            self.pitch.to_radians(),
            self.roll.to_radians(),
        )
    }
}

/// A model referenced by name together with its placement for one render call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Name of a model in the model store
    pub model: String,
    pub attributes: ObjectAttributes,
}

impl Placement {
    pub fn new(model: impl Into<String>, attributes: ObjectAttributes) -> Self {
        Self {
            model: model.into(),
            attributes,
        }
    }
}

/// Model-to-world matrix `T * S * R`
pub fn model_matrix(attributes: &ObjectAttributes) -> Mat4 {
    let translation = Mat4::from_translation(attributes.position());
    let scale = Mat4::from_scale(Vec3::splat(attributes.scale));
    translation * scale * attributes.rotation_matrix()
}
