//! Offscreen render targets
//!
//! A render target pairs a copyable color texture with a depth-stencil
//! texture of the same size. Targets live only for the duration of one
//! render call.

use crate::error::{Result, SynthError};
use crate::graphics::context::RenderContext;
use crate::graphics::pipeline::{COLOR_FORMAT, DEPTH_FORMAT};
use crate::graphics::readback::read_texture_rgba8;
use tracing::debug;

/// Color plus depth attachments for one pass chain
#[derive(Debug)]
pub struct RenderTarget {
    /// The texture to render to
    pub texture: wgpu::Texture,
    /// The texture view for render passes
    pub view: wgpu::TextureView,
    /// The depth-stencil texture for this render target
    pub depth_texture: wgpu::Texture,
    /// The depth texture view
    pub depth_view: wgpu::TextureView,
    /// The size of the render target (width, height)
    pub size: (u32, u32),
}

impl RenderTarget {
    /// Allocate color and depth attachments, failing with
    /// `IncompleteFramebuffer` if the device rejects them
    pub fn new(context: &RenderContext, width: u32, height: u32, label: &str) -> Result<Self> {
        let max = context.max_texture_dimension();
        if width == 0 || height == 0 || width > max || height > max {
            return Err(SynthError::IncompleteFramebuffer(format!(
                "{label}: {width}x{height} outside supported range 1..={max}"
            )));
        }

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let ((texture, depth_texture), error) = context.with_validation(|| {
            let texture = context.device.create_texture(&wgpu::TextureDescriptor {
                label: Some(&format!("{label} Color Texture")),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: COLOR_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
                view_formats: &[],
            });

            let depth_texture = context.device.create_texture(&wgpu::TextureDescriptor {
                label: Some(&format!("{label} Depth Texture")),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: DEPTH_FORMAT,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            });

            (texture, depth_texture)
        });

        if let Some(error) = error {
            return Err(SynthError::IncompleteFramebuffer(format!("{label}: {error}")));
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());
        debug!(label, width, height, "Render target allocated");

        Ok(Self {
            texture,
            view,
            depth_texture,
            depth_view,
            size: (width, height),
        })
    }

    /// Color attachment that either clears to `clear` or keeps existing contents
    pub fn color_attachment(
        &self,
        clear: Option<wgpu::Color>,
    ) -> wgpu::RenderPassColorAttachment<'_> {
        wgpu::RenderPassColorAttachment {
            view: &self.view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: match clear {
                    Some(color) => wgpu::LoadOp::Clear(color),
                    None => wgpu::LoadOp::Load,
                },
                store: wgpu::StoreOp::Store,
            },
        }
    }

    /// Depth-stencil attachment cleared to the far plane
    pub fn cleared_depth_attachment(&self) -> wgpu::RenderPassDepthStencilAttachment<'_> {
        wgpu::RenderPassDepthStencilAttachment {
            view: &self.depth_view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(1.0),
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(0),
                store: wgpu::StoreOp::Discard,
            }),
        }
    }

    /// Read the color attachment as tightly packed RGBA rows, top row first
    pub fn read_pixels(&self, context: &RenderContext) -> Result<Vec<u8>> {
        read_texture_rgba8(context, &self.texture, self.size.0, self.size.1)
    }
}
