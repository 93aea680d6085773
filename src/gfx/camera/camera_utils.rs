use cgmath::Matrix4;

/// Converts OpenGL-style clip space (z in -1..1) to wgpu's (z in 0..1).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Anything that can produce view and projection matrices for the renderer
pub trait Camera {
    fn build_view_matrix(&self) -> Matrix4<f32>;

    fn build_projection_matrix(&self, aspect: f32) -> Matrix4<f32>;

    fn build_view_projection_matrix(&self, aspect: f32) -> Matrix4<f32> {
        self.build_projection_matrix(aspect) * self.build_view_matrix()
    }
}

/// Column-major array layout expected by WGSL `mat4x4<f32>`
pub fn convert_matrix4_to_array(matrix4: Matrix4<f32>) -> [[f32; 4]; 4] {
    matrix4.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::SquareMatrix;

    #[test]
    fn converts_column_major() {
        let m = Matrix4::from_translation(cgmath::Vector3::new(1.0, 2.0, 3.0));
        let array = convert_matrix4_to_array(m);
        assert_eq!(array[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(convert_matrix4_to_array(Matrix4::identity())[0], [1.0, 0.0, 0.0, 0.0]);
    }
}
