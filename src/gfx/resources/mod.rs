// src/gfx/resources/mod.rs
//! GPU resource management
//!
//! Textures, the depth buffer and the light uniform bound next to them.

pub mod light;
pub mod texture_resource;

// Re-export main types
pub use light::LightConfig;
pub use texture_resource::{DepthBuffer, TextureResource, DEPTH_FORMAT};
