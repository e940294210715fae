//! Core math and data types
//!
//! Camera and placement transforms, bounding rectangle projection and the
//! result types returned by a render call. Nothing in here touches the GPU.

pub mod bounds;
pub mod camera;
pub mod result;
pub mod transform;

pub use bounds::{compute_bounding_rects, BoundingRect, ObjectBounds};
pub use camera::{Camera, CameraPose};
pub use result::{Image, SegmentationMap, SyntheticResult};
pub use transform::{model_matrix, ObjectAttributes, Placement};
