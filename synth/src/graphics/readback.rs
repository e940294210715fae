//! Copy rendered textures back to host memory

use crate::error::{Result, SynthError};
use crate::graphics::context::RenderContext;
use std::sync::mpsc;
use tracing::debug;

const BYTES_PER_PIXEL: u32 = 4;

/// Row pitch of a texture-to-buffer copy, padded to the copy alignment
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * BYTES_PER_PIXEL;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Drop the per-row padding, keeping `height` rows of `width` RGBA pixels
pub fn strip_row_padding(padded: &[u8], width: u32, height: u32) -> Vec<u8> {
    let row_bytes = (width * BYTES_PER_PIXEL) as usize;
    let padded_row_bytes = padded_bytes_per_row(width) as usize;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in padded.chunks(padded_row_bytes).take(height as usize) {
        pixels.extend_from_slice(&row[..row_bytes]);
    }
    pixels
}

/// Read a 4-byte-per-pixel texture into tightly packed rows, top row first
pub fn read_texture_rgba8(
    context: &RenderContext,
    texture: &wgpu::Texture,
    width: u32,
    height: u32,
) -> Result<Vec<u8>> {
    let padded_row = padded_bytes_per_row(width);
    let buffer_size = padded_row as u64 * height as u64;

    let buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback Buffer"),
        size: buffer_size,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = context.create_command_encoder(Some("Readback Encoder"));
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    context.submit(std::iter::once(encoder.finish()));

    let slice = buffer.slice(..);
    let (sender, receiver) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });

    context
        .device
        .poll(wgpu::PollType::Wait)
        .map_err(|e| SynthError::Readback(format!("device poll failed: {e}")))?;

    receiver
        .recv()
        .map_err(|e| SynthError::Readback(format!("map callback dropped: {e}")))?
        .map_err(|e| SynthError::Readback(format!("buffer mapping failed: {e}")))?;

    let pixels = {
        let mapped = slice.get_mapped_range();
        strip_row_padding(&mapped, width, height)
    };
    buffer.unmap();

    debug!(width, height, bytes = pixels.len(), "Texture read back");
    Ok(pixels)
}
