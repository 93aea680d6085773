// src/lib.rs
//! SnapEngine
//!
//! A small 3D engine built on wgpu and winit. Windows, renderers and models
//! are declared in a JSON object list and materialized by the [`data`]
//! managers; [`app`] then drives the frame loop.

pub mod app;
pub mod config;
pub mod data;
pub mod gfx;
pub mod smoke;
pub mod wgpu_utils;
pub mod window;

// Re-export main types for convenience
pub use app::{run, EngineApp};
pub use config::EngineConfig;
pub use data::DataManager;
