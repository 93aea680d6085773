//! Directional light uniform bound to the fragment stage

use cgmath::{InnerSpace, Vector3};

use crate::wgpu_utils::uniform_buffer::UniformBuffer;

/// GPU layout of the light, must match `Light` in the shader
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    direction: [f32; 4],
    // rgb color, alpha is the ambient term
    color: [f32; 4],
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LightConfig {
    pub direction: [f32; 3],
    pub color: [f32; 3],
    pub ambient: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            direction: [-0.5, -1.0, -0.3],
            color: [1.0, 1.0, 1.0],
            ambient: 0.15,
        }
    }
}

impl From<LightConfig> for LightUniform {
    fn from(light: LightConfig) -> Self {
        let dir = Vector3::from(light.direction);
        let dir = if dir.magnitude2() > 0.0 {
            dir.normalize()
        } else {
            -Vector3::unit_y()
        };
        Self {
            direction: [dir.x, dir.y, dir.z, 0.0],
            color: [light.color[0], light.color[1], light.color[2], light.ambient],
        }
    }
}

pub type LightUBO = UniformBuffer<LightUniform>;
