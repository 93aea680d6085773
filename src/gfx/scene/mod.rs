//! # Scene Management Module
//!
//! Loaded models, the objects that place them in the world, and the scene
//! that owns the camera and issues draw calls.

pub mod model;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use model::{MeshData, Model, ModelError, ModelId};
pub use scene::{Scene, SceneObject};
pub use vertex::Vertex3D;
