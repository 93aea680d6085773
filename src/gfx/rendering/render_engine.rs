//! WGPU-based renderer
//!
//! Owns the surface, device, depth buffer, pipeline and uniform buffers for a
//! single window and drives them through the `begin_frame → draw_model* →
//! end_frame` lifecycle.

use std::path::PathBuf;
use std::sync::Arc;

use cgmath::{Matrix4, SquareMatrix};

use super::{
    gpu_mesh::{DrawMesh, GpuMesh},
    mesh_cache::MeshCache,
    pipeline_manager::{PipelineConfig, PipelineManager},
    renderer::{FrameLifecycle, RenderError, Renderer, RendererBackend, RendererState},
    shader::{ShaderError, ShaderSource},
};
use crate::{
    gfx::{
        camera::convert_matrix4_to_array,
        resources::{
            light::{LightConfig, LightUBO, LightUniform},
            texture_resource::{DepthBuffer, TextureResource, DEPTH_FORMAT},
        },
        scene::model::Model,
    },
    wgpu_utils::{sampler_entry, texture_entry, uniform_entry, UniformBuffer},
    window::Window,
};

const BASIC_PIPELINE: &str = "Basic";

/// Per-draw constant buffer contents, must match `Transform` in the shader
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TransformUniform {
    pub world_view_proj: [[f32; 4]; 4],
    pub world: [[f32; 4]; 4],
}

impl TransformUniform {
    pub fn new(view_projection: Matrix4<f32>, world: Matrix4<f32>) -> Self {
        Self {
            world_view_proj: convert_matrix4_to_array(view_projection * world),
            world: convert_matrix4_to_array(world),
        }
    }
}

/// User-facing knobs of a renderer, filled from its descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub shader: ShaderSource,
    pub texture: Option<PathBuf>,
    pub clear_color: [f32; 4],
    pub vsync: bool,
    pub light: LightConfig,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            shader: ShaderSource::Builtin,
            texture: None,
            clear_color: [0.2, 0.3, 0.3, 1.0],
            vsync: true,
            light: LightConfig::default(),
        }
    }
}

impl RenderSettings {
    fn present_mode(&self) -> wgpu::PresentMode {
        if self.vsync {
            wgpu::PresentMode::Fifo
        } else {
            wgpu::PresentMode::AutoNoVsync
        }
    }

    fn wgpu_clear_color(&self) -> wgpu::Color {
        let [r, g, b, a] = self.clear_color;
        wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: a as f64,
        }
    }
}

struct TransformSlot {
    ubo: UniformBuffer<TransformUniform>,
    bind_group: wgpu::BindGroup,
}

impl TransformSlot {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout) -> Self {
        let ubo = UniformBuffer::new(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Transform Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.binding_resource(),
            }],
        });
        Self { ubo, bind_group }
    }
}

/// Everything created by `initialize`
struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_buffer: DepthBuffer,
    pipeline_manager: PipelineManager,
    transform_layout: wgpu::BindGroupLayout,
    // One slot per draw in a frame; queued writes land before submission so
    // draws must not share a buffer.
    transform_slots: Vec<TransformSlot>,
    material_bind_group: wgpu::BindGroup,
    _light_ubo: LightUBO,
    _diffuse: TextureResource,
}

impl GpuState {
    async fn new(
        window: Arc<winit::window::Window>,
        width: u32,
        height: u32,
        backends: wgpu::Backends,
        settings: &RenderSettings,
    ) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(|e| RenderError::Surface(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        let info = adapter.get_info();
        log::info!("Using adapter '{}' ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("SnapEngine Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or_else(|| {
                RenderError::Surface("surface is not supported by the adapter".to_string())
            })?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: settings.present_mode(),
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_buffer = DepthBuffer::new(&device, width, height);

        let diffuse = match &settings.texture {
            Some(path) => TextureResource::from_image_file(&device, &queue, path).map_err(
                |source| RenderError::Texture {
                    path: path.display().to_string(),
                    source,
                },
            )?,
            None => TextureResource::white(&device, &queue),
        };

        let light_ubo = UniformBuffer::new_with_data(&device, &LightUniform::from(settings.light));

        let transform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Transform Bind Group Layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT)],
        });

        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Bind Group Layout"),
            entries: &[
                texture_entry(0),
                sampler_entry(1),
                uniform_entry(2, wgpu::ShaderStages::FRAGMENT),
            ],
        });

        let material_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Material Bind Group"),
            layout: &material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&diffuse.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&diffuse.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: light_ubo.binding_resource(),
                },
            ],
        });

        let shader_label = settings.shader.label();
        let shader_source = settings.shader.load()?;
        let mut pipeline_manager = PipelineManager::new(device.clone());
        pipeline_manager.load_shader(&shader_label, &shader_source)?;
        pipeline_manager.register_pipeline(
            BASIC_PIPELINE,
            PipelineConfig::default_with_shader(&shader_label)
                .with_label("Basic Pipeline")
                .with_cull_mode(None)
                .with_bind_group_layouts(vec![transform_layout.clone(), material_layout])
                .with_depth_format(DEPTH_FORMAT)
                .with_color_format(format),
        );
        pipeline_manager.create_all_pipelines()?;

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_buffer,
            pipeline_manager,
            transform_layout,
            transform_slots: Vec::new(),
            material_bind_group,
            _light_ubo: light_ubo,
            _diffuse: diffuse,
        })
    }

    fn reconfigure(&mut self, width: u32, height: u32) {
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_buffer = DepthBuffer::new(&self.device, width, height);
    }
}

/// Work recorded between `begin_frame` and `end_frame`
struct FrameInFlight {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
    draws: usize,
}

/// Renderer backed by wgpu
pub struct RenderEngine {
    backend: RendererBackend,
    settings: RenderSettings,
    lifecycle: FrameLifecycle,
    gpu: Option<GpuState>,
    frame: Option<FrameInFlight>,
    meshes: MeshCache<GpuMesh>,
    view_projection: Matrix4<f32>,
    size: (u32, u32),
    pending_resize: Option<(u32, u32)>,
}

impl RenderEngine {
    pub fn new(backend: RendererBackend, settings: RenderSettings) -> Self {
        Self {
            backend,
            settings,
            lifecycle: FrameLifecycle::default(),
            gpu: None,
            frame: None,
            meshes: MeshCache::new(),
            view_projection: Matrix4::identity(),
            size: (0, 0),
            pending_resize: None,
        }
    }

    fn missing_gpu(&self, operation: &'static str) -> RenderError {
        RenderError::InvalidState {
            operation,
            state: self.lifecycle.state(),
        }
    }
}

impl Renderer for RenderEngine {
    fn backend(&self) -> RendererBackend {
        self.backend
    }

    fn state(&self) -> RendererState {
        self.lifecycle.state()
    }

    fn initialize(&mut self, window: &Window) -> Result<(), RenderError> {
        self.lifecycle.require(RendererState::Uninitialized, "initialize")?;

        let handle = window
            .handle()
            .cloned()
            .ok_or_else(|| RenderError::MissingWindowHandle(window.title().to_string()))?;

        let inner = handle.inner_size();
        let (width, height) = if inner.width > 0 && inner.height > 0 {
            (inner.width, inner.height)
        } else {
            (window.width().max(1), window.height().max(1))
        };

        let backends = self
            .backend
            .wgpu_backends()
            .unwrap_or_else(wgpu::Backends::all);
        let gpu = pollster::block_on(GpuState::new(
            handle,
            width,
            height,
            backends,
            &self.settings,
        ))?;

        self.gpu = Some(gpu);
        self.size = (width, height);
        self.lifecycle.initialized()?;
        log::info!(
            "Renderer ({}) initialized for '{}' at {}x{}",
            self.backend.name(),
            window.title(),
            width,
            height
        );
        Ok(())
    }

    fn begin_frame(&mut self) -> Result<(), RenderError> {
        self.lifecycle.require(RendererState::Initialized, "begin a frame")?;
        let clear_color = self.settings.wgpu_clear_color();
        let Some(gpu) = self.gpu.as_mut() else {
            return Err(self.missing_gpu("begin a frame"));
        };

        let surface_texture = match gpu.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return Err(RenderError::FrameSkipped(
                    "surface lost or outdated, reconfigured".to_string(),
                ));
            }
            Err(wgpu::SurfaceError::Timeout) => {
                return Err(RenderError::FrameSkipped(
                    "timed out acquiring the back buffer".to_string(),
                ));
            }
            Err(e) => return Err(RenderError::Surface(e.to_string())),
        };

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let _clear_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &gpu.depth_buffer.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
        }

        self.frame = Some(FrameInFlight {
            surface_texture,
            view,
            encoder,
            draws: 0,
        });
        self.lifecycle.begin()
    }

    fn set_view_projection(&mut self, view_projection: Matrix4<f32>) {
        self.view_projection = view_projection;
    }

    fn draw_model(&mut self, model: &Model, world: Matrix4<f32>) -> Result<(), RenderError> {
        self.lifecycle.require(RendererState::Drawing, "draw a model")?;

        if !model.is_loaded() || model.mesh_count() == 0 {
            log::warn!("Model {:?} has no meshes to draw", model.id());
            return Ok(());
        }

        let Self {
            gpu,
            frame,
            meshes,
            view_projection,
            lifecycle,
            ..
        } = self;
        let (Some(gpu), Some(frame)) = (gpu.as_mut(), frame.as_mut()) else {
            return Err(RenderError::InvalidState {
                operation: "draw a model",
                state: lifecycle.state(),
            });
        };

        let slot = frame.draws;
        if slot == gpu.transform_slots.len() {
            gpu.transform_slots
                .push(TransformSlot::new(&gpu.device, &gpu.transform_layout));
        }
        gpu.transform_slots[slot]
            .ubo
            .update_content(&gpu.queue, TransformUniform::new(*view_projection, world));

        let device = &gpu.device;
        let label = model
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| format!("{:?}", model.id()));
        let gpu_meshes = meshes.get_or_upload(model, |i, mesh| {
            log::debug!("Uploading mesh {} of {}", i, label);
            GpuMesh::from_mesh_data(device, mesh, &format!("{} #{}", label, i))
        });

        let pipeline = gpu
            .pipeline_manager
            .pipeline(BASIC_PIPELINE)
            .ok_or_else(|| ShaderError::Compile {
                label: BASIC_PIPELINE.to_string(),
                message: "pipeline was not created".to_string(),
            })?;

        let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Model Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &gpu.depth_buffer.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &gpu.transform_slots[slot].bind_group, &[]);
        pass.set_bind_group(1, &gpu.material_bind_group, &[]);
        for mesh in gpu_meshes {
            pass.draw_mesh(mesh);
        }
        drop(pass);

        frame.draws += 1;
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        self.lifecycle.require(RendererState::Drawing, "end a frame")?;
        let (Some(gpu), Some(frame)) = (self.gpu.as_mut(), self.frame.take()) else {
            return Err(self.missing_gpu("end a frame"));
        };

        gpu.queue.submit(std::iter::once(frame.encoder.finish()));
        frame.surface_texture.present();

        if let Some((width, height)) = self.pending_resize.take() {
            gpu.reconfigure(width, height);
        }
        self.lifecycle.end()
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.size = (width, height);

        if self.lifecycle.state() == RendererState::Drawing {
            // The acquired back buffer still has the old size
            self.pending_resize = Some((width, height));
        } else if let Some(gpu) = &mut self.gpu {
            gpu.reconfigure(width, height);
        }
    }

    fn surface_size(&self) -> (u32, u32) {
        self.size
    }

    fn destroy(&mut self) {
        self.frame = None;
        let cached = self.meshes.len();
        self.meshes.clear();
        self.gpu = None;
        self.lifecycle.destroy();
        log::debug!(
            "Renderer ({}) destroyed, released {} cached model(s)",
            self.backend.name(),
            cached
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    #[test]
    fn initialize_requires_native_window() {
        let mut engine = RenderEngine::new(RendererBackend::Auto, RenderSettings::default());
        let window = Window::new("No Handle", 640, 480);

        let err = engine.initialize(&window).unwrap_err();
        assert!(matches!(err, RenderError::MissingWindowHandle(ref t) if t == "No Handle"));
        assert_eq!(engine.state(), RendererState::Uninitialized);
    }

    #[test]
    fn frame_calls_fail_before_initialize() {
        let mut engine = RenderEngine::new(RendererBackend::Auto, RenderSettings::default());
        assert!(matches!(
            engine.begin_frame(),
            Err(RenderError::InvalidState { .. })
        ));
        assert!(matches!(
            engine.draw_model(&Model::new(), Matrix4::identity()),
            Err(RenderError::InvalidState { .. })
        ));
        assert!(matches!(
            engine.end_frame(),
            Err(RenderError::InvalidState { .. })
        ));
    }

    #[test]
    fn destroyed_engine_rejects_initialize() {
        let mut engine = RenderEngine::new(RendererBackend::Gl, RenderSettings::default());
        engine.destroy();
        assert_eq!(engine.state(), RendererState::Destroyed);
        let window = Window::new("Test", 640, 480);
        assert!(matches!(
            engine.initialize(&window),
            Err(RenderError::InvalidState { .. })
        ));
    }

    #[test]
    fn resize_without_gpu_records_size() {
        let mut engine = RenderEngine::new(RendererBackend::Auto, RenderSettings::default());
        engine.resize(0, 100);
        assert_eq!(engine.surface_size(), (0, 0));
        engine.resize(800, 400);
        assert_eq!(engine.surface_size(), (800, 400));
        assert_eq!(engine.aspect_ratio(), 2.0);
    }

    #[test]
    fn transform_uniform_combines_matrices() {
        let world = Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0));
        let view_proj = Matrix4::from_scale(2.0);
        let uniform = TransformUniform::new(view_proj, world);
        assert_eq!(uniform.world[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(uniform.world_view_proj[3], [2.0, 4.0, 6.0, 1.0]);
        assert_eq!(std::mem::size_of::<TransformUniform>(), 128);
    }

    #[test]
    fn vsync_selects_present_mode() {
        let mut settings = RenderSettings::default();
        assert_eq!(settings.present_mode(), wgpu::PresentMode::Fifo);
        settings.vsync = false;
        assert_eq!(settings.present_mode(), wgpu::PresentMode::AutoNoVsync);
    }
}
