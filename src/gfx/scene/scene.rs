use std::sync::Arc;

use cgmath::{Deg, Matrix4, Vector3};
use winit::{
    event::{ElementState, MouseButton, MouseScrollDelta},
    keyboard::KeyCode,
};

use super::model::Model;
use crate::gfx::{
    camera::{Camera, CameraController, FlyCamera},
    rendering::{RenderError, Renderer},
};

/// A model placed in the world
///
/// Rotation is in degrees around x, y and z.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub model: Arc<Model>,
    pub position: Vector3<f32>,
    pub scale: Vector3<f32>,
    pub rotation: Vector3<f32>,
}

impl SceneObject {
    /// World matrix `T * S * Rx * Ry * Rz`
    pub fn world_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
            * Matrix4::from_angle_x(Deg(self.rotation.x))
            * Matrix4::from_angle_y(Deg(self.rotation.y))
            * Matrix4::from_angle_z(Deg(self.rotation.z))
    }
}

/// Camera, input state and the list of objects drawn each frame
pub struct Scene {
    pub camera: FlyCamera,
    pub camera_controller: CameraController,
    objects: Vec<SceneObject>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            camera: FlyCamera::default(),
            camera_controller: CameraController::new(),
            objects: Vec::new(),
        }
    }

    pub fn add_model(
        &mut self,
        model: Arc<Model>,
        position: Vector3<f32>,
        scale: Vector3<f32>,
        rotation: Vector3<f32>,
    ) {
        self.objects.push(SceneObject {
            model,
            position,
            scale,
            rotation,
        });
    }

    pub fn add_object(&mut self, object: SceneObject) {
        self.objects.push(object);
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    /// Advances held-key camera movement by `delta_time` seconds
    pub fn update(&mut self, delta_time: f32) {
        self.camera_controller
            .update_camera(&mut self.camera, delta_time);
    }

    pub fn view_projection(&self, aspect: f32) -> Matrix4<f32> {
        self.camera.build_view_projection_matrix(aspect)
    }

    /// Issues one `draw_model` per object; the renderer must be mid-frame
    pub fn render(&self, renderer: &mut dyn Renderer) -> Result<(), RenderError> {
        renderer.set_view_projection(self.view_projection(renderer.aspect_ratio()));
        for object in &self.objects {
            renderer.draw_model(&object.model, object.world_matrix())?;
        }
        Ok(())
    }

    pub fn on_key_input(&mut self, key: KeyCode, state: ElementState) -> bool {
        self.camera_controller.process_keyboard(key, state)
    }

    pub fn on_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        self.camera_controller.process_mouse_button(button, state);
    }

    /// Mouse look is drag-based: the camera turns only while the left button
    /// is held, and the first move of each drag sets the reference point
    pub fn on_mouse_move(&mut self, x: f64, y: f64) {
        self.camera_controller
            .process_cursor_moved(x, y, &mut self.camera);
    }

    pub fn on_mouse_scroll(&mut self, delta: &MouseScrollDelta) {
        self.camera_controller
            .process_scroll(delta, &mut self.camera);
    }
}
