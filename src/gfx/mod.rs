//! # Graphics Module
//!
//! Camera, rendering backends, GPU resources and scene management.
//!
//! - **Camera System** ([`camera`]) - Free-fly camera driven by yaw/pitch
//! - **Rendering** ([`rendering`]) - [`Renderer`] trait with wgpu and headless backends
//! - **Scene Management** ([`scene`]) - Models, placed objects and per-frame drawing
//! - **Resource Management** ([`resources`]) - Textures and the light uniform
//!
//! [`Renderer`]: rendering::Renderer

pub mod camera;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::FlyCamera;
pub use rendering::{HeadlessRenderer, RenderEngine, Renderer};
pub use scene::{Model, Scene};
