//! Offscreen synthetic image renderer
//!
//! `SynthRenderer` owns the headless GPU context, the pipelines, the loaded
//! models and the background catalog. Each call to `render_image` allocates
//! fresh render targets, draws the background and the placed models, reads
//! the pixels back and releases the targets again, so no state is carried
//! from one render to the next.
//!
//! Loading takes `&mut self` while rendering and queries take `&self`. Every
//! operation on loaded state or the GPU checks that it runs on the thread that
//! created the renderer; `config`, `adapter_info` and `max_texture_dimension`
//! only return values fixed at construction.

use crate::assets::model_store::{Model, ModelExtent, ModelStore};
use crate::config::RendererConfig;
use crate::core::bounds::{compute_bounding_rects, ObjectBounds};
use crate::core::camera::{Camera, CameraPose};
use crate::core::result::{Image, SegmentationMap, SyntheticResult};
use crate::core::transform::{model_matrix, Placement};
use crate::error::{Result, SynthError};
use crate::graphics::{
    background::{create_quad_buffer, BackgroundCatalog, BackgroundTexture},
    context::RenderContext,
    material::Material,
    mesh::Mesh,
    pipeline::RenderPipelines,
    render_target::RenderTarget,
    uniform::{ObjectUniform, SceneUniform, UniformBuffer},
};
use crate::shaders::ShaderSet;
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::thread::{self, ThreadId};
use tracing::{debug, info};
use wgpu::util::DeviceExt;

/// Light setup for one render
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lighting {
    /// Direction the sunlight travels, in world space
    pub sun_direction: Vec3,
    pub sun_color: Vec3,
    pub ambient_color: Vec3,
    /// Color of the searchlight mounted on the camera
    pub searchlight_color: Vec3,
    /// Half-angle of the searchlight cone
    pub searchlight_angle_radians: f32,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            sun_direction: Vec3::new(-0.3, -1.0, -0.5),
            sun_color: Vec3::splat(0.8),
            ambient_color: Vec3::splat(0.25),
            searchlight_color: Vec3::splat(0.5),
            searchlight_angle_radians: 0.35,
        }
    }
}

/// Everything needed to produce one synthetic sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub placements: Vec<Placement>,
    pub background_index: usize,
    pub camera: CameraPose,
    #[serde(default)]
    pub lighting: Lighting,
    #[serde(default)]
    pub generate_segmentation: bool,
}

impl RenderRequest {
    pub fn new(placements: Vec<Placement>, background_index: usize, camera: CameraPose) -> Self {
        Self {
            placements,
            background_index,
            camera,
            lighting: Lighting::default(),
            generate_segmentation: false,
        }
    }

    pub fn with_lighting(mut self, lighting: Lighting) -> Self {
        self.lighting = lighting;
        self
    }

    pub fn with_segmentation(mut self, generate: bool) -> Self {
        self.generate_segmentation = generate;
        self
    }
}

/// Progress of a single render call, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenderStage {
    Init,
    BackgroundDrawn,
    MainPassDrawn,
    SegmentationPassDrawn,
    Readback,
    Done,
}

/// GPU buffers of one model part
struct GpuMeshPart {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
    material: Material,
}

/// One part of one placement, ready to draw
struct DrawItem<'a> {
    part: &'a GpuMeshPart,
    bind_group: wgpu::BindGroup,
    _uniform_buffer: wgpu::Buffer,
}

/// Headless renderer producing labeled synthetic images
pub struct SynthRenderer {
    context: RenderContext,
    config: RendererConfig,
    pipelines: RenderPipelines,
    quad_buffer: wgpu::Buffer,
    backgrounds: BackgroundCatalog,
    models: ModelStore,
    /// Uploaded mesh parts per model name
    gpu_models: HashMap<String, Vec<GpuMeshPart>>,
    owner: ThreadId,
}

impl SynthRenderer {
    /// Create the GPU context, compile shaders and build pipelines
    pub fn new(config: RendererConfig) -> Result<Self> {
        config.validate()?;
        info!(
            width = config.width,
            height = config.height,
            "Initializing synthetic renderer"
        );

        let context = pollster::block_on(RenderContext::new_headless(
            config.force_fallback_adapter,
        ))?;
        let shaders = ShaderSet::load(config.shader_dir.as_deref())?;
        let pipelines = RenderPipelines::new(&context, &shaders)?;
        let quad_buffer = create_quad_buffer(&context.device, config.background_depth);
        let backgrounds = BackgroundCatalog::new(&context.device);

        Ok(Self {
            context,
            config,
            pipelines,
            quad_buffer,
            backgrounds,
            models: ModelStore::new(),
            gpu_models: HashMap::new(),
            owner: thread::current().id(),
        })
    }

    fn check_thread(&self) -> Result<()> {
        if thread::current().id() == self.owner {
            Ok(())
        } else {
            Err(SynthError::WrongThread)
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn adapter_info(&self) -> &wgpu::AdapterInfo {
        &self.context.adapter_info
    }

    /// Largest background width or height the device accepts
    pub fn max_texture_dimension(&self) -> u32 {
        self.context.max_texture_dimension()
    }

    /// Load every image in `directory` into the background catalog
    ///
    /// Returns the number of images added. Unreadable files and images larger
    /// than `max_texture_dimension` are skipped.
    pub fn add_background_images_directory<P: AsRef<Path>>(&mut self, directory: P) -> Result<usize> {
        self.check_thread()?;
        self.backgrounds.add_directory(
            &self.context,
            &self.pipelines.background_bind_group_layout,
            directory.as_ref(),
        )
    }

    pub fn background_images_count(&self) -> Result<usize> {
        self.check_thread()?;
        Ok(self.backgrounds.len())
    }

    /// Load `(name, path)` pairs in order
    ///
    /// Stops at the first model that fails to load; models loaded before it
    /// stay available.
    pub fn load_models<S, P>(&mut self, models: &[(S, P)]) -> Result<()>
    where
        S: AsRef<str>,
        P: AsRef<Path>,
    {
        self.check_thread()?;
        for (name, path) in models {
            let name = name.as_ref();
            let model = self
                .models
                .load(name, path.as_ref())
                .map_err(|source| SynthError::ModelLoadFailure {
                    name: name.to_string(),
                    source,
                })?;
            let parts = upload_model(&self.context.device, name, model);
            self.gpu_models.insert(name.to_string(), parts);
        }
        Ok(())
    }

    /// Store an already-built model under `name`
    pub fn insert_model(&mut self, name: &str, model: Model) -> Result<()> {
        self.check_thread()?;
        let model = self.models.insert(name, model);
        let parts = upload_model(&self.context.device, name, model);
        self.gpu_models.insert(name.to_string(), parts);
        Ok(())
    }

    pub fn models(&self) -> Result<&ModelStore> {
        self.check_thread()?;
        Ok(&self.models)
    }

    /// Model-space extents of all loaded models, sorted by name
    pub fn models_extent(&self) -> Result<Vec<ModelExtent>> {
        self.check_thread()?;
        Ok(self.models.extent_all())
    }

    /// Projection times view for a camera pose, using the configured lens
    pub fn projection_view(&self, pose: &CameraPose) -> Result<Mat4> {
        self.check_thread()?;
        Ok(Camera::from_config(&self.config).projection_view_matrix(pose))
    }

    /// Pixel-space bounding rectangles of `placements` under `projection_view`
    pub fn compute_objects_bounding_rects(
        &self,
        placements: &[Placement],
        projection_view: Mat4,
    ) -> Result<Vec<ObjectBounds>> {
        self.check_thread()?;
        compute_bounding_rects(
            &self.models,
            placements,
            &projection_view,
            self.config.width,
            self.config.height,
        )
    }

    /// Render one sample: shaded image, bounding rectangles and optionally
    /// the segmentation map
    pub fn render_image(&self, request: &RenderRequest) -> Result<SyntheticResult> {
        self.check_thread()?;
        let background = self.backgrounds.get(request.background_index)?;
        for placement in &request.placements {
            if !self.models.contains(&placement.model) {
                return Err(SynthError::UnknownModel(placement.model.clone()));
            }
        }

        let (width, height) = (self.config.width, self.config.height);
        let projection = Camera::from_config(&self.config).projection_matrix();
        let projection_view = projection * request.camera.view_matrix();
        debug!(
            stage = ?RenderStage::Init,
            objects = request.placements.len(),
            background = request.background_index,
            "Rendering synthetic image"
        );

        let main_target = RenderTarget::new(&self.context, width, height, "Main")?;

        let scene_uniform = SceneUniform::new(projection, &request.camera, &request.lighting);
        let scene_buffer = scene_uniform.create_buffer(&self.context.device, Some("Scene Uniform"));
        let scene_bind_group = self
            .pipelines
            .create_scene_bind_group(&self.context.device, &scene_buffer);
        let draw_items = self.prepare_draw_items(&request.placements);

        let mut encoder = self.context.create_command_encoder(Some("Main Encoder"));
        self.draw_background(&mut encoder, &main_target, background);
        debug!(stage = ?RenderStage::BackgroundDrawn);

        self.draw_models(
            &mut encoder,
            &main_target,
            &self.pipelines.lit,
            &scene_bind_group,
            &draw_items,
            None,
            "Lit Model Pass",
        );
        self.context.submit(std::iter::once(encoder.finish()));
        debug!(stage = ?RenderStage::MainPassDrawn);

        let segmentation = if request.generate_segmentation {
            let target = RenderTarget::new(&self.context, width, height, "Segmentation")?;
            let mut encoder = self
                .context
                .create_command_encoder(Some("Segmentation Encoder"));
            self.draw_models(
                &mut encoder,
                &target,
                &self.pipelines.semantic,
                &scene_bind_group,
                &draw_items,
                Some(wgpu::Color::BLACK),
                "Semantic Model Pass",
            );
            self.context.submit(std::iter::once(encoder.finish()));
            debug!(stage = ?RenderStage::SegmentationPassDrawn);

            let rgba = target.read_pixels(&self.context)?;
            Some(SegmentationMap::from_rgba(&rgba, width, height))
        } else {
            None
        };

        let rgba = main_target.read_pixels(&self.context)?;
        drop(main_target);
        let image = Image::rgb_from_rgba(&rgba, width, height);
        debug!(stage = ?RenderStage::Readback);

        let bounding_rects = compute_bounding_rects(
            &self.models,
            &request.placements,
            &projection_view,
            width,
            height,
        )?;
        debug!(stage = ?RenderStage::Done, "Synthetic image rendered");

        Ok(SyntheticResult::new(image, segmentation, bounding_rects))
    }

    /// Per-part object uniforms for every placement, in placement order
    fn prepare_draw_items(&self, placements: &[Placement]) -> Vec<DrawItem<'_>> {
        let device = &self.context.device;
        let mut items = Vec::new();

        for placement in placements {
            let Some(parts) = self.gpu_models.get(&placement.model) else {
                continue;
            };
            let model = model_matrix(&placement.attributes);

            for part in parts {
                let uniform =
                    ObjectUniform::new(model, placement.attributes.semantic_class_id, &part.material);
                let buffer = uniform.create_buffer(device, Some("Object Uniform"));
                let bind_group = self.pipelines.create_object_bind_group(device, &buffer);
                items.push(DrawItem {
                    part,
                    bind_group,
                    _uniform_buffer: buffer,
                });
            }
        }

        items
    }

    fn draw_background(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &RenderTarget,
        background: &BackgroundTexture,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Background Pass"),
            color_attachments: &[Some(target.color_attachment(Some(wgpu::Color::BLACK)))],
            depth_stencil_attachment: Some(target.cleared_depth_attachment()),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_pass.set_pipeline(&self.pipelines.background);
        render_pass.set_bind_group(0, &background.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.quad_buffer.slice(..));
        render_pass.draw(0..4, 0..1);
    }

    /// Draw all items in a pass that starts from a cleared depth buffer
    ///
    /// `clear` of `None` keeps the color already in the target.
    #[allow(clippy::too_many_arguments)]
    fn draw_models(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        target: &RenderTarget,
        pipeline: &wgpu::RenderPipeline,
        scene_bind_group: &wgpu::BindGroup,
        items: &[DrawItem<'_>],
        clear: Option<wgpu::Color>,
        label: &str,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(target.color_attachment(clear))],
            depth_stencil_attachment: Some(target.cleared_depth_attachment()),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, scene_bind_group, &[]);

        for item in items {
            render_pass.set_bind_group(1, &item.bind_group, &[]);
            render_pass.set_vertex_buffer(0, item.part.vertex_buffer.slice(..));
            render_pass.set_index_buffer(item.part.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..item.part.num_indices, 0, 0..1);
        }
    }
}

/// Upload the non-empty parts of a model
fn upload_model(device: &wgpu::Device, name: &str, model: &Model) -> Vec<GpuMeshPart> {
    model
        .parts()
        .iter()
        .filter(|part| !part.mesh.is_empty())
        .map(|part| {
            upload_mesh(
                device,
                &format!("{name}/{}", part.name),
                &part.mesh,
                part.material,
            )
        })
        .collect()
}

fn upload_mesh(
    device: &wgpu::Device,
    label: &str,
    mesh: &Mesh,
    material: Material,
) -> GpuMeshPart {
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{label} Vertex Buffer")),
        contents: bytemuck::cast_slice(&mesh.vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{label} Index Buffer")),
        contents: bytemuck::cast_slice(&mesh.indices),
        usage: wgpu::BufferUsages::INDEX,
    });

    debug!(
        part = %label,
        vertices = mesh.vertices.len(),
        indices = mesh.indices.len(),
        "Uploaded mesh to GPU"
    );

    GpuMeshPart {
        vertex_buffer,
        index_buffer,
        num_indices: mesh.indices.len() as u32,
        material,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lighting_defaults_from_partial_json() {
        let lighting: Lighting = serde_json::from_str(r#"{"sun_color": [1.0, 0.5, 0.25]}"#).unwrap();
        assert_eq!(lighting.sun_color, Vec3::new(1.0, 0.5, 0.25));
        assert_eq!(lighting.ambient_color, Lighting::default().ambient_color);
    }

    #[test]
    fn test_render_request_json() {
        let request: RenderRequest = serde_json::from_str(
            r#"{
                "placements": [
                    {"model": "cube", "attributes": {"scale": 1.0, "x": 0.0, "y": 0.0, "z": 0.0,
                     "yaw": 0.0, "pitch": 0.0, "roll": 0.0, "semantic_class": 7}}
                ],
                "background_index": 2,
                "camera": {"position": [0.0, 0.0, 5.0], "target": [0.0, 0.0, 0.0], "up": [0.0, 1.0, 0.0]}
            }"#,
        )
        .unwrap();

        assert_eq!(request.background_index, 2);
        assert_eq!(request.placements[0].attributes.semantic_class_id, 7);
        assert!(!request.generate_segmentation);
        assert_eq!(request.lighting, Lighting::default());
    }

    #[test]
    fn test_request_builders() {
        let request = RenderRequest::new(Vec::new(), 0, CameraPose::default())
            .with_segmentation(true)
            .with_lighting(Lighting {
                ambient_color: Vec3::ONE,
                ..Default::default()
            });
        assert!(request.generate_segmentation);
        assert_eq!(request.lighting.ambient_color, Vec3::ONE);
    }
}
