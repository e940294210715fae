//! Background textures and the full-screen quad
//!
//! Decoded images are uploaded with their whole mip chain. Each entry owns
//! a ready-made bind group so drawing a background is a single bind.

use crate::assets::backgrounds::{decode_backgrounds, scan_image_files, DecodedBackground};
use crate::error::{Result, SynthError};
use crate::graphics::context::RenderContext;
use bytemuck::{Pod, Zeroable};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use wgpu::util::DeviceExt;

/// Vertex of the background quad, position already in clip space
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct BackgroundVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl BackgroundVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<BackgroundVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Triangle strip covering the viewport at `depth`
///
/// Texture row 0 is the top of the image, so v runs downwards.
pub fn quad_vertices(depth: f32) -> [BackgroundVertex; 4] {
    [
        BackgroundVertex {
            position: [-1.0, 1.0, depth],
            uv: [0.0, 0.0],
        },
        BackgroundVertex {
            position: [-1.0, -1.0, depth],
            uv: [0.0, 1.0],
        },
        BackgroundVertex {
            position: [1.0, 1.0, depth],
            uv: [1.0, 0.0],
        },
        BackgroundVertex {
            position: [1.0, -1.0, depth],
            uv: [1.0, 1.0],
        },
    ]
}

/// Upload the quad for a given depth
pub fn create_quad_buffer(device: &wgpu::Device, depth: f32) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Background Quad Vertex Buffer"),
        contents: bytemuck::cast_slice(&quad_vertices(depth)),
        usage: wgpu::BufferUsages::VERTEX,
    })
}

/// Reject sizes a 2D texture on this device cannot hold
pub fn check_texture_size(path: &Path, width: u32, height: u32, max: u32) -> Result<()> {
    if width > max || height > max {
        return Err(SynthError::BackgroundTooLarge {
            path: path.to_path_buf(),
            width,
            height,
            max,
        });
    }
    Ok(())
}

/// One uploaded background image
#[derive(Debug)]
pub struct BackgroundTexture {
    pub path: PathBuf,
    pub size: (u32, u32),
    pub texture: wgpu::Texture,
    pub bind_group: wgpu::BindGroup,
}

/// Ordered list of uploaded background images
pub struct BackgroundCatalog {
    entries: Vec<BackgroundTexture>,
    sampler: wgpu::Sampler,
}

impl BackgroundCatalog {
    pub fn new(device: &wgpu::Device) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Background Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            entries: Vec::new(),
            sampler,
        }
    }

    /// Decode and upload every image in `directory`, returning how many were added
    pub fn add_directory(
        &mut self,
        context: &RenderContext,
        layout: &wgpu::BindGroupLayout,
        directory: &Path,
    ) -> Result<usize> {
        let files = scan_image_files(directory)?;
        info!(directory = ?directory, files = files.len(), "Scanning background images");

        let mut added = 0;
        for background in &decode_backgrounds(&files) {
            match self.upload(context, layout, background) {
                Ok(()) => added += 1,
                Err(e) => warn!(path = ?background.path, error = %e, "Skipping background image"),
            }
        }

        info!(added, total = self.entries.len(), "Background images loaded");
        Ok(added)
    }

    /// Upload one decoded image and append it to the catalog
    ///
    /// Images wider or taller than the device allows are rejected before any
    /// GPU resource is created.
    pub fn upload(
        &mut self,
        context: &RenderContext,
        layout: &wgpu::BindGroupLayout,
        background: &DecodedBackground,
    ) -> Result<()> {
        let (width, height) = (background.width(), background.height());
        check_texture_size(&background.path, width, height, context.max_texture_dimension())?;

        let texture = context.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Background Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: background.mip_levels.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (level, image) in background.mip_levels.iter().enumerate() {
            context.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: level as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                image.as_raw(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * image.width()),
                    rows_per_image: Some(image.height()),
                },
                wgpu::Extent3d {
                    width: image.width(),
                    height: image.height(),
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = context.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Background Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        debug!(
            path = ?background.path,
            width,
            height,
            mip_levels = background.mip_levels.len(),
            "Background uploaded"
        );

        self.entries.push(BackgroundTexture {
            path: background.path.clone(),
            size: (width, height),
            texture,
            bind_group,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`, or `InvalidBackgroundIndex`
    pub fn get(&self, index: usize) -> Result<&BackgroundTexture> {
        self.entries
            .get(index)
            .ok_or(SynthError::InvalidBackgroundIndex {
                index,
                count: self.entries.len(),
            })
    }
}
