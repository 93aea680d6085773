use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta},
    keyboard::KeyCode,
};

use super::fly_camera::{CameraMovement, FlyCamera};

/// Translates raw window input into `FlyCamera` updates
///
/// Movement keys are tracked as held state and applied once per frame in
/// `update_camera`, so speed does not depend on keyboard repeat rate.
#[derive(Debug, Default)]
pub struct CameraController {
    is_forward_pressed: bool,
    is_backward_pressed: bool,
    is_left_pressed: bool,
    is_right_pressed: bool,
    is_mouse_pressed: bool,
    last_cursor: Option<(f64, f64)>,
}

impl CameraController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the key is one the controller consumes
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) -> bool {
        let is_pressed = state == ElementState::Pressed;
        match key {
            KeyCode::KeyW | KeyCode::ArrowUp => {
                self.is_forward_pressed = is_pressed;
                true
            }
            KeyCode::KeyS | KeyCode::ArrowDown => {
                self.is_backward_pressed = is_pressed;
                true
            }
            KeyCode::KeyA | KeyCode::ArrowLeft => {
                self.is_left_pressed = is_pressed;
                true
            }
            KeyCode::KeyD | KeyCode::ArrowRight => {
                self.is_right_pressed = is_pressed;
                true
            }
            _ => false,
        }
    }

    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.is_mouse_pressed = state == ElementState::Pressed;
            // Re-latch on the next move so a new drag does not jump
            if !self.is_mouse_pressed {
                self.last_cursor = None;
            }
        }
    }

    pub fn process_cursor_moved(&mut self, x: f64, y: f64, camera: &mut FlyCamera) {
        if !self.is_mouse_pressed {
            return;
        }

        let (last_x, last_y) = self.last_cursor.unwrap_or((x, y));
        self.last_cursor = Some((x, y));

        // Window y grows downwards
        let x_offset = (x - last_x) as f32;
        let y_offset = (last_y - y) as f32;

        if x_offset != 0.0 || y_offset != 0.0 {
            camera.process_mouse_movement(x_offset, y_offset, true);
        }
    }

    pub fn process_scroll(&mut self, delta: &MouseScrollDelta, camera: &mut FlyCamera) {
        let amount = match delta {
            MouseScrollDelta::LineDelta(_, scroll) => *scroll,
            MouseScrollDelta::PixelDelta(PhysicalPosition { y: scroll, .. }) => {
                *scroll as f32 / 20.0
            }
        };
        camera.process_mouse_scroll(amount);
    }

    pub fn update_camera(&self, camera: &mut FlyCamera, delta_time: f32) {
        if self.is_forward_pressed {
            camera.process_keyboard(CameraMovement::Forward, delta_time);
        }
        if self.is_backward_pressed {
            camera.process_keyboard(CameraMovement::Backward, delta_time);
        }
        if self.is_left_pressed {
            camera.process_keyboard(CameraMovement::Left, delta_time);
        }
        if self.is_right_pressed {
            camera.process_keyboard(CameraMovement::Right, delta_time);
        }
    }

    pub fn is_mouse_pressed(&self) -> bool {
        self.is_mouse_pressed
    }
}
