//! Screen-space bounding rectangles from projected convex hulls
//!
//! Rectangles are computed from the hull points alone, with no GPU readback.

use crate::assets::model_store::ModelStore;
use crate::core::transform::{model_matrix, Placement};
use crate::error::{Result, SynthError};
use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Points whose clip-space `w` is at or below this lie on or behind the eye plane
const MIN_CLIP_W: f32 = 1e-6;

/// Axis-aligned rectangle spanned by `bottom_left` and `top_right`
///
/// In normalized device coordinates y grows upwards, so `bottom_left` holds
/// the minimum of both axes. After [`BoundingRect::to_pixels`] y grows
/// downwards: `bottom_left.y` is then the bottom row (the larger value) and
/// `top_right.y` the top row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingRect {
    pub bottom_left: Vec2,
    pub top_right: Vec2,
}

impl BoundingRect {
    /// Rectangle that contains nothing; any included point replaces both corners
    pub const EMPTY: Self = Self {
        bottom_left: Vec2::splat(f32::INFINITY),
        top_right: Vec2::splat(f32::NEG_INFINITY),
    };

    /// Grow the rectangle to contain a point
    pub fn include(&mut self, point: Vec2) {
        self.bottom_left = self.bottom_left.min(point);
        self.top_right = self.top_right.max(point);
    }

    /// True until at least one point has been included
    pub fn is_empty(&self) -> bool {
        self.bottom_left.x > self.top_right.x || self.bottom_left.y > self.top_right.y
    }

    /// Convert an NDC rectangle to pixel coordinates of a `width` x `height` image
    pub fn to_pixels(&self, width: u32, height: u32) -> Self {
        let (width, height) = (width as f32, height as f32);
        let convert = |ndc: Vec2| {
            Vec2::new(
                (1.0 + ndc.x) / 2.0 * width,
                (1.0 - ndc.y) / 2.0 * height,
            )
        };

        Self {
            bottom_left: convert(self.bottom_left),
            top_right: convert(self.top_right),
        }
    }

    pub fn left(&self) -> f32 {
        self.bottom_left.x.min(self.top_right.x)
    }

    pub fn right(&self) -> f32 {
        self.bottom_left.x.max(self.top_right.x)
    }

    /// Smallest row of a pixel-space rectangle
    pub fn top(&self) -> f32 {
        self.bottom_left.y.min(self.top_right.y)
    }

    /// Largest row of a pixel-space rectangle
    pub fn bottom(&self) -> f32 {
        self.bottom_left.y.max(self.top_right.y)
    }

    pub fn width(&self) -> f32 {
        self.right() - self.left()
    }

    pub fn height(&self) -> f32 {
        self.bottom() - self.top()
    }
}

impl Default for BoundingRect {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Bounding rectangle of one placed object, in pixels
///
/// `rect` is `None` when no hull point landed in front of the camera,
/// including the case of a model without hull points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectBounds {
    pub name: String,
    pub rect: Option<BoundingRect>,
}

/// Project hull points through `combined` and return their NDC rectangle
pub fn project_hull(points: &[Vec3], combined: &Mat4) -> Option<BoundingRect> {
    let mut rect = BoundingRect::EMPTY;

    for point in points {
        let clip = *combined * point.extend(1.0);
        if clip.w <= MIN_CLIP_W {
            continue;
        }
        let ndc = clip.truncate() / clip.w;
        rect.include(Vec2::new(ndc.x, ndc.y));
    }

    if rect.is_empty() {
        None
    } else {
        Some(rect)
    }
}

/// Compute the pixel-space bounding rectangle of every placement
///
/// The output has one entry per placement, in input order.
pub fn compute_bounding_rects(
    models: &ModelStore,
    placements: &[Placement],
    projection_view: &Mat4,
    width: u32,
    height: u32,
) -> Result<Vec<ObjectBounds>> {
    placements
        .iter()
        .map(|placement| {
            let model = models
                .get(&placement.model)
                .ok_or_else(|| SynthError::UnknownModel(placement.model.clone()))?;

            let combined = *projection_view * model_matrix(&placement.attributes);
            let rect = project_hull(model.hull_points(), &combined)
                .map(|ndc| ndc.to_pixels(width, height));

            if rect.is_none() {
                debug!(model = %placement.model, "Object has no visible hull points");
            }

            Ok(ObjectBounds {
                name: placement.model.clone(),
                rect,
            })
        })
        .collect()
}
