//! Error types surfaced by the renderer

use crate::assets::mesh_loader::MeshLoadError;

/// Errors that can occur while setting up or running the renderer
#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    /// No adapter or device could be obtained for the offscreen context
    #[error("Failed to create rendering context: {0}")]
    ContextCreation(String),

    /// A shading program failed to compile or its pipeline failed validation
    #[error("Shader '{label}' failed to compile: {message}")]
    ShaderCompileFailure { label: String, message: String },

    /// A render target could not be allocated at the requested size
    #[error("Render target is not complete: {0}")]
    IncompleteFramebuffer(String),

    #[error("Background index {index} is out of range (catalog holds {count} images)")]
    InvalidBackgroundIndex { index: usize, count: usize },

    /// A background image exceeds the device's 2D texture size limit
    #[error("Background {path:?} is {width}x{height}, larger than the {max} texel limit")]
    BackgroundTooLarge {
        path: std::path::PathBuf,
        width: u32,
        height: u32,
        max: u32,
    },

    #[error("Failed to load model '{name}': {source}")]
    ModelLoadFailure {
        name: String,
        #[source]
        source: MeshLoadError,
    },

    #[error("Model '{0}' has not been loaded")]
    UnknownModel(String),

    #[error("Failed to read back rendered pixels: {0}")]
    Readback(String),

    /// The renderer was used from a thread other than the one that created it
    #[error("Renderer used from a thread other than its owner")]
    WrongThread,

    #[error("Invalid renderer configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, SynthError>;
