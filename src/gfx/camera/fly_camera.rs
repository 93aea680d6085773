use cgmath::*;

use super::camera_utils::{Camera, OPENGL_TO_WGPU_MATRIX};

// Default camera values
pub const YAW: f32 = -90.0;
pub const PITCH: f32 = 0.0;
pub const SPEED: f32 = 2.5;
pub const SENSITIVITY: f32 = 0.1;
pub const ZOOM: f32 = 45.0;

const MAX_PITCH: f32 = 89.0;
const MIN_ZOOM: f32 = 1.0;
const MAX_ZOOM: f32 = 45.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMovement {
    Forward,
    Backward,
    Left,
    Right,
}

/// Free-fly camera driven by yaw/pitch Euler angles (in degrees)
///
/// `front`, `right` and `up` are recomputed on every orientation change and
/// stay mutually orthonormal.
#[derive(Debug, Clone, Copy)]
pub struct FlyCamera {
    pub position: Vector3<f32>,
    front: Vector3<f32>,
    up: Vector3<f32>,
    right: Vector3<f32>,
    world_up: Vector3<f32>,
    yaw: f32,
    pitch: f32,
    pub movement_speed: f32,
    pub mouse_sensitivity: f32,
    zoom: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::new(Vector3::new(0.0, 0.0, 3.0))
    }
}

impl Camera for FlyCamera {
    fn build_view_matrix(&self) -> Matrix4<f32> {
        let eye = Point3::from_vec(self.position);
        Matrix4::look_at_rh(eye, eye + self.front, self.up)
    }

    fn build_projection_matrix(&self, aspect: f32) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(Deg(self.zoom), aspect, self.znear, self.zfar)
    }
}

impl FlyCamera {
    pub fn new(position: Vector3<f32>) -> Self {
        let mut camera = Self {
            position,
            front: Vector3::new(0.0, 0.0, -1.0),
            up: Vector3::unit_y(),
            right: Vector3::unit_x(),
            world_up: Vector3::unit_y(),
            yaw: YAW,
            pitch: PITCH,
            movement_speed: SPEED,
            mouse_sensitivity: SENSITIVITY,
            zoom: ZOOM,
            znear: 0.1,
            zfar: 100.0,
        };
        camera.update_camera_vectors();
        camera
    }

    pub fn process_keyboard(&mut self, direction: CameraMovement, delta_time: f32) {
        let velocity = self.movement_speed * delta_time;
        match direction {
            CameraMovement::Forward => self.position += self.front * velocity,
            CameraMovement::Backward => self.position -= self.front * velocity,
            CameraMovement::Left => self.position -= self.right * velocity,
            CameraMovement::Right => self.position += self.right * velocity,
        }
    }

    pub fn process_mouse_movement(&mut self, x_offset: f32, y_offset: f32, constrain_pitch: bool) {
        self.yaw += x_offset * self.mouse_sensitivity;
        self.pitch += y_offset * self.mouse_sensitivity;

        // Past +-90 degrees the view flips over
        if constrain_pitch {
            self.pitch = self.pitch.clamp(-MAX_PITCH, MAX_PITCH);
        }

        self.update_camera_vectors();
    }

    pub fn process_mouse_scroll(&mut self, y_offset: f32) {
        self.zoom = (self.zoom - y_offset).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn front(&self) -> Vector3<f32> {
        self.front
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    pub fn right(&self) -> Vector3<f32> {
        self.right
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Vertical field of view in degrees
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    fn update_camera_vectors(&mut self) {
        let (yaw, pitch) = (Deg(self.yaw), Deg(self.pitch));
        let front = Vector3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        );
        self.front = front.normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    const EPS: f32 = 1e-5;

    fn close(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < EPS
    }

    fn assert_orthonormal(camera: &FlyCamera) {
        let (f, r, u) = (camera.front(), camera.right(), camera.up());
        assert!((f.magnitude() - 1.0).abs() < EPS);
        assert!((r.magnitude() - 1.0).abs() < EPS);
        assert!((u.magnitude() - 1.0).abs() < EPS);
        assert!(f.dot(r).abs() < EPS);
        assert!(f.dot(u).abs() < EPS);
        assert!(r.dot(u).abs() < EPS);
    }

    #[test]
    fn default_state() {
        let camera = FlyCamera::default();
        assert_eq!(camera.position, Vector3::new(0.0, 0.0, 3.0));
        assert!(close(camera.front(), Vector3::new(0.0, 0.0, -1.0)));
        assert!(close(camera.up(), Vector3::unit_y()));
        assert!(close(camera.right(), Vector3::unit_x()));
        assert_eq!(camera.zoom(), 45.0);
        assert_orthonormal(&camera);
    }

    #[test]
    fn keyboard_moves_along_camera_axes() {
        let mut camera = FlyCamera::default();
        camera.process_keyboard(CameraMovement::Forward, 1.0);
        assert!(camera.position.z < 3.0);

        camera.process_keyboard(CameraMovement::Right, 1.0);
        assert!(camera.position.x > 0.0);

        let before = camera.position;
        camera.process_keyboard(CameraMovement::Left, 0.5);
        camera.process_keyboard(CameraMovement::Right, 0.5);
        assert!(close(camera.position, before));
    }

    #[test]
    fn mouse_movement_turns_camera() {
        let mut camera = FlyCamera::default();
        camera.process_mouse_movement(10.0, 0.0, true);
        assert!(!close(camera.front(), Vector3::new(0.0, 0.0, -1.0)));
        assert!((camera.yaw() - (YAW + 1.0)).abs() < EPS);
        assert_orthonormal(&camera);
    }

    #[test]
    fn pitch_is_constrained() {
        let mut camera = FlyCamera::default();
        camera.process_mouse_movement(0.0, 10_000.0, true);
        assert_eq!(camera.pitch(), 89.0);
        camera.process_mouse_movement(0.0, -20_000.0, true);
        assert_eq!(camera.pitch(), -89.0);

        camera.process_mouse_movement(0.0, -1_000.0, false);
        assert!(camera.pitch() < -89.0);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = FlyCamera::default();
        camera.process_mouse_scroll(1.0);
        assert!(camera.zoom() < 45.0);
        camera.process_mouse_scroll(100.0);
        assert_eq!(camera.zoom(), 1.0);
        camera.process_mouse_scroll(-100.0);
        assert_eq!(camera.zoom(), 45.0);
    }

    #[test]
    fn stays_orthonormal_under_random_input() {
        let mut rng = rand::rng();
        let mut camera = FlyCamera::default();
        for _ in 0..500 {
            let dx = rng.random_range(-200.0..200.0);
            let dy = rng.random_range(-200.0..200.0);
            camera.process_mouse_movement(dx, dy, true);
            assert_orthonormal(&camera);
        }
    }

    #[test]
    fn view_matrix_maps_target_onto_negative_z() {
        let camera = FlyCamera::default();
        let view = camera.build_view_matrix();
        let p = view * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!(p.x.abs() < EPS && p.y.abs() < EPS);
        assert!((p.z + 3.0).abs() < EPS);
    }
}
