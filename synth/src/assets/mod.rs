//! CPU-side asset loading: models, convex hulls and background images

pub mod backgrounds;
pub mod hull;
pub mod mesh_loader;
pub mod model_store;

pub use backgrounds::{decode_backgrounds, scan_image_files, DecodedBackground};
pub use mesh_loader::{load_model_parts, MeshLoadError};
pub use model_store::{Extent, Model, ModelExtent, ModelPart, ModelStore};
