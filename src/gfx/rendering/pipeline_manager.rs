//! Render pipeline management for wgpu
//!
//! Shaders are compiled as they are loaded; pipelines are registered by name
//! and built together once every layout they need exists.

use std::collections::HashMap;

use super::shader::{self, ShaderError};
use crate::gfx::scene::vertex::Vertex3D;

/// Everything needed to build one render pipeline over [`Vertex3D`]
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub shader: String,
    pub bind_group_layouts: Vec<wgpu::BindGroupLayout>,
    pub cull_mode: Option<wgpu::Face>,
    pub depth_format: Option<wgpu::TextureFormat>,
    pub color_format: wgpu::TextureFormat,
}

impl PipelineConfig {
    pub fn default_with_shader(shader: &str) -> Self {
        Self {
            label: format!("{} Pipeline", shader),
            shader: shader.to_string(),
            bind_group_layouts: Vec::new(),
            cull_mode: Some(wgpu::Face::Back),
            depth_format: None,
            color_format: wgpu::TextureFormat::Bgra8Unorm,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_owned();
        self
    }

    pub fn with_cull_mode(mut self, face: Option<wgpu::Face>) -> Self {
        self.cull_mode = face;
        self
    }

    pub fn with_bind_group_layouts(mut self, layouts: Vec<wgpu::BindGroupLayout>) -> Self {
        self.bind_group_layouts = layouts;
        self
    }

    /// Enables depth testing against a buffer of the given format
    pub fn with_depth_format(mut self, format: wgpu::TextureFormat) -> Self {
        self.depth_format = Some(format);
        self
    }

    pub fn with_color_format(mut self, format: wgpu::TextureFormat) -> Self {
        self.color_format = format;
        self
    }

    fn depth_stencil(&self) -> Option<wgpu::DepthStencilState> {
        self.depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        })
    }
}

/// Owns shader modules and the pipelines built from them, both by name
pub struct PipelineManager {
    device: wgpu::Device,
    shader_modules: HashMap<String, wgpu::ShaderModule>,
    pending: Vec<(String, PipelineConfig)>,
    pipelines: HashMap<String, wgpu::RenderPipeline>,
}

impl PipelineManager {
    pub fn new(device: wgpu::Device) -> Self {
        Self {
            device,
            shader_modules: HashMap::new(),
            pending: Vec::new(),
            pipelines: HashMap::new(),
        }
    }

    pub fn load_shader(&mut self, name: &str, source: &str) -> Result<(), ShaderError> {
        let module = shader::compile(&self.device, name, source)?;
        self.shader_modules.insert(name.to_string(), module);
        log::debug!("Compiled shader '{}'", name);
        Ok(())
    }

    /// Queues a pipeline for the next `create_all_pipelines`
    pub fn register_pipeline(&mut self, name: &str, config: PipelineConfig) {
        self.pending.push((name.to_string(), config));
    }

    /// Builds every registered pipeline; stops at the first failure
    pub fn create_all_pipelines(&mut self) -> Result<usize, ShaderError> {
        let pending = std::mem::take(&mut self.pending);
        let count = pending.len();
        for (name, config) in pending {
            let pipeline = self.build(&config)?;
            log::debug!("Created pipeline '{}'", name);
            self.pipelines.insert(name, pipeline);
        }
        Ok(count)
    }

    pub fn pipeline(&self, name: &str) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(name)
    }

    fn build(&self, config: &PipelineConfig) -> Result<wgpu::RenderPipeline, ShaderError> {
        let compile_error = |message: String| ShaderError::Compile {
            label: config.label.clone(),
            message,
        };

        let module = self
            .shader_modules
            .get(&config.shader)
            .ok_or_else(|| compile_error(format!("shader '{}' was not loaded", config.shader)))?;

        let layouts: Vec<&wgpu::BindGroupLayout> = config.bind_group_layouts.iter().collect();
        let layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&config.label),
                bind_group_layouts: &layouts,
                push_constant_ranges: &[],
            });

        let targets = [Some(wgpu::ColorTargetState {
            format: config.color_format,
            blend: Some(wgpu::BlendState::REPLACE),
            write_mask: wgpu::ColorWrites::ALL,
        })];

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&config.label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module,
                    entry_point: Some("vs_main"),
                    buffers: &[Vertex3D::desc()],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module,
                    entry_point: Some("fs_main"),
                    targets: &targets,
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: config.cull_mode,
                    ..Default::default()
                },
                depth_stencil: config.depth_stencil(),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        match pollster::block_on(self.device.pop_error_scope()) {
            Some(error) => Err(compile_error(error.to_string())),
            None => Ok(pipeline),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let config = PipelineConfig::default_with_shader("basic.wgsl")
            .with_label("Basic")
            .with_cull_mode(None)
            .with_depth_format(wgpu::TextureFormat::Depth32Float)
            .with_color_format(wgpu::TextureFormat::Rgba8Unorm);

        assert_eq!(config.label, "Basic");
        assert_eq!(config.shader, "basic.wgsl");
        assert_eq!(config.cull_mode, None);
        assert_eq!(config.color_format, wgpu::TextureFormat::Rgba8Unorm);
        let depth = config.depth_stencil().unwrap();
        assert_eq!(depth.format, wgpu::TextureFormat::Depth32Float);
        assert_eq!(depth.depth_compare, wgpu::CompareFunction::Less);
    }

    #[test]
    fn no_depth_by_default() {
        let config = PipelineConfig::default_with_shader("basic.wgsl");
        assert!(config.depth_stencil().is_none());
        assert_eq!(config.cull_mode, Some(wgpu::Face::Back));
    }
}
