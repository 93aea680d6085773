//! JSON-driven object managers
//!
//! [`DataManager`] parses the object list and routes each record by its
//! `"class"` tag; the specialised managers turn records into windows,
//! renderers and scene objects.

pub mod data_manager;
pub mod manager;
pub mod model_manager;
pub mod renderer_manager;
pub mod window_manager;

pub use data_manager::{DataError, DataManager};
pub use manager::Manager;
pub use model_manager::{ModelDescriptor, ModelManager};
pub use renderer_manager::{ManagedRenderer, RendererDescriptor, RendererManager};
pub use window_manager::{WindowDescriptor, WindowManager};
