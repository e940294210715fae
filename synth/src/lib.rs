//! Synthetic training image generator
//!
//! This crate renders 3D models over background photographs in an offscreen
//! WebGPU context and produces the rendered image, per-object bounding
//! rectangles and an optional semantic segmentation map.

pub mod assets;
pub mod config;
pub mod core;
pub mod error;
pub mod graphics;
pub mod shaders;

pub use config::RendererConfig;
pub use error::{Result, SynthError};
pub use graphics::SynthRenderer;

// Re-export commonly used types
pub mod prelude {
    // Placement and camera types
    pub use crate::core::camera::{Camera, CameraPose};
    pub use crate::core::transform::{model_matrix, ObjectAttributes, Placement};

    // Bounding rectangles
    pub use crate::core::bounds::{compute_bounding_rects, BoundingRect, ObjectBounds};

    // Render results
    pub use crate::core::result::{Image, SegmentationMap, SyntheticResult};

    // Assets
    pub use crate::assets::model_store::{Extent, Model, ModelExtent, ModelStore};

    // Renderer
    pub use crate::graphics::renderer::{Lighting, RenderRequest, SynthRenderer};

    pub use crate::config::RendererConfig;
    pub use crate::error::{Result, SynthError};

    // Math types
    pub use glam::{Mat4, Vec2, Vec3, Vec4};
}

/// Initialize logging for the renderer
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,wgpu_core=warn,wgpu_hal=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
