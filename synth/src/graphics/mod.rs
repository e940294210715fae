//! Graphics module
//!
//! Headless GPU context, pipelines, render targets, readback and the
//! synthetic image renderer.

pub mod background;
pub mod context;
pub mod material;
pub mod mesh;
pub mod pipeline;
pub mod readback;
pub mod render_target;
pub mod renderer;
pub mod uniform;

// Re-export commonly used types
pub use background::BackgroundCatalog;
pub use context::RenderContext;
pub use material::Material;
pub use mesh::{Mesh, Vertex};
pub use pipeline::RenderPipelines;
pub use render_target::RenderTarget;
pub use renderer::{Lighting, RenderRequest, SynthRenderer};
pub use uniform::{ObjectUniform, SceneUniform, UniformBuffer};
