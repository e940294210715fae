//! Render pipelines
//!
//! Three pipelines are built once per renderer: the background quad, the
//! shaded model pass and the flat-colored segmentation pass. The two model
//! pipelines share bind group layouts so the same scene and object bind
//! groups serve both.

use crate::error::{Result, SynthError};
use crate::graphics::background::BackgroundVertex;
use crate::graphics::context::RenderContext;
use crate::graphics::mesh::Vertex;
use crate::shaders::ShaderSet;
use tracing::info;

/// Color format of every render target
pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
/// Depth format of every render target
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

/// All render pipelines and their bind group layouts
pub struct RenderPipelines {
    pub background: wgpu::RenderPipeline,
    pub lit: wgpu::RenderPipeline,
    pub semantic: wgpu::RenderPipeline,
    /// Background texture and sampler (group 0 of the background pipeline)
    pub background_bind_group_layout: wgpu::BindGroupLayout,
    /// Scene uniforms (group 0 of the model pipelines)
    pub scene_bind_group_layout: wgpu::BindGroupLayout,
    /// Object uniforms (group 1 of the model pipelines)
    pub object_bind_group_layout: wgpu::BindGroupLayout,
}

impl RenderPipelines {
    /// Compile the shaders and build every pipeline
    pub fn new(context: &RenderContext, shaders: &ShaderSet) -> Result<Self> {
        info!("Creating render pipelines");
        let device = &context.device;

        let background_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Background Bind Group Layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            view_dimension: wgpu::TextureViewDimension::D2,
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let scene_bind_group_layout = uniform_layout(
            device,
            "Scene Bind Group Layout",
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        );
        let object_bind_group_layout = uniform_layout(
            device,
            "Object Bind Group Layout",
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        );

        let background_module = compile(context, "Background Shader", &shaders.background)?;
        let lit_module = compile(context, "Lit Shader", &shaders.lit)?;
        let semantic_module = compile(context, "Semantic Shader", &shaders.semantic)?;

        let background_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Background Pipeline Layout"),
            bind_group_layouts: &[&background_bind_group_layout],
            push_constant_ranges: &[],
        });

        let model_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Model Pipeline Layout"),
            bind_group_layouts: &[&scene_bind_group_layout, &object_bind_group_layout],
            push_constant_ranges: &[],
        });

        let background = link(context, "Background Pipeline", || {
            create_pipeline(
                device,
                "Background Pipeline",
                &background_layout,
                &background_module,
                BackgroundVertex::desc(),
                wgpu::PrimitiveTopology::TriangleStrip,
            )
        })?;
        let lit = link(context, "Lit Pipeline", || {
            create_pipeline(
                device,
                "Lit Pipeline",
                &model_layout,
                &lit_module,
                Vertex::desc(),
                wgpu::PrimitiveTopology::TriangleList,
            )
        })?;
        let semantic = link(context, "Semantic Pipeline", || {
            create_pipeline(
                device,
                "Semantic Pipeline",
                &model_layout,
                &semantic_module,
                Vertex::desc(),
                wgpu::PrimitiveTopology::TriangleList,
            )
        })?;

        Ok(Self {
            background,
            lit,
            semantic,
            background_bind_group_layout,
            scene_bind_group_layout,
            object_bind_group_layout,
        })
    }

    /// Create a bind group for scene uniforms
    pub fn create_scene_bind_group(
        &self,
        device: &wgpu::Device,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Scene Bind Group"),
            layout: &self.scene_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        })
    }

    /// Create a bind group for object uniforms
    pub fn create_object_bind_group(
        &self,
        device: &wgpu::Device,
        buffer: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Object Bind Group"),
            layout: &self.object_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        })
    }
}

fn uniform_layout(
    device: &wgpu::Device,
    label: &str,
    visibility: wgpu::ShaderStages,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

/// Compile WGSL, turning validation errors into `ShaderCompileFailure`
fn compile(context: &RenderContext, label: &str, source: &str) -> Result<wgpu::ShaderModule> {
    let (module, error) = context.with_validation(|| {
        context
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
    });

    match error {
        Some(error) => Err(SynthError::ShaderCompileFailure {
            label: label.to_string(),
            message: error.to_string(),
        }),
        None => Ok(module),
    }
}

/// Create a pipeline, turning interface mismatches into `ShaderCompileFailure`
fn link(
    context: &RenderContext,
    label: &str,
    create: impl FnOnce() -> wgpu::RenderPipeline,
) -> Result<wgpu::RenderPipeline> {
    match context.with_validation(create) {
        (_, Some(error)) => Err(SynthError::ShaderCompileFailure {
            label: label.to_string(),
            message: error.to_string(),
        }),
        (pipeline, None) => Ok(pipeline),
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    vertex_layout: wgpu::VertexBufferLayout<'_>,
    topology: wgpu::PrimitiveTopology,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: Some("vs_main"),
            buffers: &[vertex_layout],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: COLOR_FORMAT,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // Imported models have no reliable winding
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}
