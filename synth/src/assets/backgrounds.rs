//! Background image discovery and decoding
//!
//! Directory scanning and decoding happen on the CPU; the decoded images are
//! uploaded to the GPU by the background catalog.

use image::{imageops::FilterType, RgbaImage};
use rayon::prelude::*;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File extensions accepted as background images (compared lowercase)
pub const KNOWN_IMAGE_EXTENSIONS: [&str; 9] =
    ["jpg", "jpeg", "png", "bmp", "tga", "gif", "psd", "hdr", "pic"];

/// A decoded background image with its full mip chain
#[derive(Debug, Clone)]
pub struct DecodedBackground {
    pub path: PathBuf,
    /// Level 0 is the full-size image; each next level halves both sides
    pub mip_levels: Vec<RgbaImage>,
}

impl DecodedBackground {
    pub fn width(&self) -> u32 {
        self.mip_levels[0].width()
    }

    pub fn height(&self) -> u32 {
        self.mip_levels[0].height()
    }
}

/// True when the file name carries a known image extension
pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            KNOWN_IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// List image files directly inside `directory`, sorted by file name
pub fn scan_image_files(directory: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && has_image_extension(&path) {
            files.push(path);
        } else {
            debug!(path = ?path, "Skipping non-image entry");
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Number of mip levels for a full chain down to 1x1
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Downsample repeatedly until both sides reach one pixel
pub fn build_mip_chain(base: RgbaImage) -> Vec<RgbaImage> {
    let levels = mip_level_count(base.width(), base.height());
    let mut chain = Vec::with_capacity(levels as usize);
    chain.push(base);

    for _ in 1..levels {
        let previous = &chain[chain.len() - 1];
        let width = (previous.width() / 2).max(1);
        let height = (previous.height() / 2).max(1);
        let next = image::imageops::resize(previous, width, height, FilterType::Triangle);
        chain.push(next);
    }

    chain
}

/// Decode a single image file into RGBA with mips
pub fn decode_background(path: &Path) -> image::ImageResult<DecodedBackground> {
    let base = image::open(path)?.to_rgba8();
    Ok(DecodedBackground {
        path: path.to_path_buf(),
        mip_levels: build_mip_chain(base),
    })
}

/// Decode images in parallel, keeping input order and skipping failures
pub fn decode_backgrounds(paths: &[PathBuf]) -> Vec<DecodedBackground> {
    paths
        .par_iter()
        .filter_map(|path| match decode_background(path) {
            Ok(decoded) => {
                debug!(
                    path = ?path,
                    width = decoded.width(),
                    height = decoded.height(),
                    "Image decoded"
                );
                Some(decoded)
            }
            Err(err) => {
                warn!(path = ?path, error = %err, "Failed to load image, skipping");
                None
            }
        })
        .collect()
}
