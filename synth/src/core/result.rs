//! Render results and the semantic id color encoding
//!
//! A semantic class id is stored as a color: bits 0-7 in red, 8-15 in green
//! and 16-23 in blue. Decoding a pixel is `r + g * 256 + b * 65536`.

use crate::core::bounds::ObjectBounds;
use image::{ImageResult, RgbImage};
use std::path::Path;

/// Largest class id that survives the RGB encoding
pub const MAX_CLASS_ID: u32 = 0x00FF_FFFF;

/// Split a class id into its low, mid and high bytes
pub fn encode_class_id(id: u32) -> [u8; 3] {
    [
        (id & 0xFF) as u8,
        ((id >> 8) & 0xFF) as u8,
        ((id >> 16) & 0xFF) as u8,
    ]
}

/// Class id bytes normalized to [0, 1], as fed to the shaders
pub fn class_id_color(id: u32) -> [f32; 3] {
    encode_class_id(id).map(|byte| byte as f32 / 255.0)
}

/// Recover a class id from the RGB bytes of one pixel
pub fn decode_class_id(rgb: [u8; 3]) -> u32 {
    rgb[0] as u32 + rgb[1] as u32 * 256 + rgb[2] as u32 * 256 * 256
}

/// Tightly packed 8-bit image, row-major, top row first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub channels: u32,
}

impl Image {
    /// Build a 3-channel image from RGBA rows by dropping alpha
    pub fn rgb_from_rgba(rgba: &[u8], width: u32, height: u32) -> Self {
        let data = rgba
            .chunks_exact(4)
            .flat_map(|pixel| [pixel[0], pixel[1], pixel[2]])
            .collect();

        Self {
            data,
            width,
            height,
            channels: 3,
        }
    }

    /// Channel values of the pixel at column `x`, row `y`
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let channels = self.channels as usize;
        let offset = (y as usize * self.width as usize + x as usize) * channels;
        &self.data[offset..offset + channels]
    }

    /// Write a 3-channel image as PNG
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        image::save_buffer_with_format(
            path,
            &self.data,
            self.width,
            self.height,
            image::ExtendedColorType::Rgb8,
            image::ImageFormat::Png,
        )
    }
}

/// Per-pixel semantic class ids, row-major, top row first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentationMap {
    pub ids: Vec<u32>,
    pub width: u32,
    pub height: u32,
}

impl SegmentationMap {
    /// Decode RGBA readback rows into class ids
    pub fn from_rgba(rgba: &[u8], width: u32, height: u32) -> Self {
        let ids = rgba
            .chunks_exact(4)
            .map(|pixel| decode_class_id([pixel[0], pixel[1], pixel[2]]))
            .collect();

        Self { ids, width, height }
    }

    pub fn id_at(&self, x: u32, y: u32) -> u32 {
        self.ids[y as usize * self.width as usize + x as usize]
    }

    /// Number of pixels labelled with `id`
    pub fn count(&self, id: u32) -> usize {
        self.ids.iter().filter(|&&pixel| pixel == id).count()
    }

    /// Re-encode the ids as RGB so they can be stored losslessly
    pub fn to_rgb_image(&self) -> Image {
        let data = self.ids.iter().flat_map(|&id| encode_class_id(id)).collect();
        Image {
            data,
            width: self.width,
            height: self.height,
            channels: 3,
        }
    }

    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        self.to_rgb_image().save_png(path)
    }

    /// Decode an RGB-encoded segmentation image
    pub fn from_rgb_image(image: &RgbImage) -> Self {
        let ids = image.pixels().map(|pixel| decode_class_id(pixel.0)).collect();
        Self {
            ids,
            width: image.width(),
            height: image.height(),
        }
    }
}

/// Everything produced by one render call
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticResult {
    /// Shaded image composited over the background
    pub image: Image,
    /// Class id per pixel, when requested
    pub segmentation: Option<SegmentationMap>,
    /// Bounding rectangle per placement, in placement order
    pub bounding_rects: Vec<ObjectBounds>,
}

impl SyntheticResult {
    pub fn new(
        image: Image,
        segmentation: Option<SegmentationMap>,
        bounding_rects: Vec<ObjectBounds>,
    ) -> Self {
        Self {
            image,
            segmentation,
            bounding_rects,
        }
    }
}
