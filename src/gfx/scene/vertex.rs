//! # Vertex Data Structures
//!
//! GPU-compatible vertex format shared by every mesh the engine draws.

/// Number of `f32` values per interleaved vertex (position, normal, uv)
pub const FLOATS_PER_VERTEX: usize = 8;

/// A 3D vertex with position, normal and texture coordinates.
///
/// The `#[repr(C)]` layout matches the interleaved float stream produced by
/// model loading, so a `MeshData` vertex slice can be cast directly.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3D {
    /// 3D position coordinates [x, y, z]
    pub position: [f32; 3],
    /// 3D normal vector [nx, ny, nz] for lighting calculations
    pub normal: [f32; 3],
    /// Texture coordinates [u, v]
    pub tex_coords: [f32; 2],
}

impl Vertex3D {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    /// Returns the vertex buffer layout for wgpu rendering.
    ///
    /// - Attribute 0: Position (Float32x3)
    /// - Attribute 1: Normal (Float32x3)
    /// - Attribute 2: Texture coordinates (Float32x2)
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex3D>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_matches_interleaved_floats() {
        assert_eq!(
            std::mem::size_of::<Vertex3D>(),
            FLOATS_PER_VERTEX * std::mem::size_of::<f32>()
        );
        assert_eq!(Vertex3D::desc().array_stride, 32);
    }

    #[test]
    fn casts_from_float_stream() {
        let floats: [f32; 8] = [1.0, 2.0, 3.0, 0.0, 1.0, 0.0, 0.5, 0.25];
        let vertices: &[Vertex3D] = bytemuck::cast_slice(&floats);
        assert_eq!(vertices.len(), 1);
        assert_eq!(vertices[0].position, [1.0, 2.0, 3.0]);
        assert_eq!(vertices[0].tex_coords, [0.5, 0.25]);
    }
}
