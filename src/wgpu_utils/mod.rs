// src/wgpu_utils/mod.rs
//! Small wgpu helpers shared by the renderer

pub mod binding_types;
pub mod uniform_buffer;

// Re-export main types
pub use binding_types::{sampler_entry, texture_entry, uniform_entry};
pub use uniform_buffer::UniformBuffer;
