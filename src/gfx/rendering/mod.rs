// src/gfx/rendering/mod.rs
//! Core rendering functionality
//!
//! The [`Renderer`] trait, its wgpu and headless implementations, and the
//! pipeline/shader/mesh plumbing behind them.

pub mod gpu_mesh;
pub mod headless_renderer;
pub mod mesh_cache;
pub mod pipeline_manager;
pub mod render_engine;
pub mod renderer;
pub mod shader;

// Re-export main types
pub use headless_renderer::HeadlessRenderer;
pub use mesh_cache::MeshCache;
pub use pipeline_manager::{PipelineConfig, PipelineManager};
pub use render_engine::{RenderEngine, RenderSettings};
pub use renderer::{FrameLifecycle, RenderError, Renderer, RendererBackend, RendererState};
pub use shader::{ShaderError, ShaderSource};
