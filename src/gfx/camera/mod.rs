pub mod camera_controller;
pub mod camera_utils;
pub mod fly_camera;

pub use camera_controller::CameraController;
pub use camera_utils::{convert_matrix4_to_array, Camera, OPENGL_TO_WGPU_MATRIX};
pub use fly_camera::{CameraMovement, FlyCamera};
