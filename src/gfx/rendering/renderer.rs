//! Renderer interface shared by the GPU and headless backends

use std::{fmt, str::FromStr};

use cgmath::Matrix4;
use thiserror::Error;

use super::shader::ShaderError;
use crate::{gfx::scene::model::Model, window::Window};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot {operation} while renderer is {state}")]
    InvalidState {
        operation: &'static str,
        state: RendererState,
    },
    #[error("window '{0}' has no native handle")]
    MissingWindowHandle(String),
    #[error("surface error: {0}")]
    Surface(String),
    #[error("no suitable graphics adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error("failed to load texture '{path}': {source}")]
    Texture {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("frame skipped: {0}")]
    FrameSkipped(String),
}

/// Where a renderer is in its frame lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    Uninitialized,
    Initialized,
    Drawing,
    Destroyed,
}

impl fmt::Display for RendererState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RendererState::Uninitialized => "uninitialized",
            RendererState::Initialized => "initialized",
            RendererState::Drawing => "drawing",
            RendererState::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// State machine guarding `initialize → (begin_frame → draw* → end_frame)*`
#[derive(Debug, Clone, Copy)]
pub struct FrameLifecycle {
    state: RendererState,
}

impl Default for FrameLifecycle {
    fn default() -> Self {
        Self {
            state: RendererState::Uninitialized,
        }
    }
}

impl FrameLifecycle {
    pub fn state(&self) -> RendererState {
        self.state
    }

    /// Fails unless the lifecycle is currently in `expected`
    pub fn require(
        &self,
        expected: RendererState,
        operation: &'static str,
    ) -> Result<(), RenderError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(RenderError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    pub fn initialized(&mut self) -> Result<(), RenderError> {
        self.require(RendererState::Uninitialized, "initialize")?;
        self.state = RendererState::Initialized;
        Ok(())
    }

    pub fn begin(&mut self) -> Result<(), RenderError> {
        self.require(RendererState::Initialized, "begin a frame")?;
        self.state = RendererState::Drawing;
        Ok(())
    }

    pub fn end(&mut self) -> Result<(), RenderError> {
        self.require(RendererState::Drawing, "end a frame")?;
        self.state = RendererState::Initialized;
        Ok(())
    }

    pub fn destroy(&mut self) {
        self.state = RendererState::Destroyed;
    }
}

/// Graphics API requested by a renderer descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RendererBackend {
    #[default]
    Auto,
    Vulkan,
    Dx12,
    Metal,
    Gl,
    Headless,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown renderer backend '{0}'")]
pub struct UnknownBackend(pub String);

impl FromStr for RendererBackend {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" | "default" => Ok(RendererBackend::Auto),
            "vulkan" | "vk" => Ok(RendererBackend::Vulkan),
            "dx12" | "d3d12" => Ok(RendererBackend::Dx12),
            "d3d11" | "d3d" | "direct3d" | "dx11" => {
                log::warn!("Direct3D 11 is not available, using Direct3D 12 for '{}'", s);
                Ok(RendererBackend::Dx12)
            }
            "metal" => Ok(RendererBackend::Metal),
            "gl" | "opengl" | "gles" => Ok(RendererBackend::Gl),
            "headless" | "null" | "none" => Ok(RendererBackend::Headless),
            _ => Err(UnknownBackend(s.to_string())),
        }
    }
}

impl RendererBackend {
    /// wgpu backends to request, or `None` for the headless renderer
    pub fn wgpu_backends(self) -> Option<wgpu::Backends> {
        match self {
            RendererBackend::Auto => Some(wgpu::Backends::all()),
            RendererBackend::Vulkan => Some(wgpu::Backends::VULKAN),
            RendererBackend::Dx12 => Some(wgpu::Backends::DX12),
            RendererBackend::Metal => Some(wgpu::Backends::METAL),
            RendererBackend::Gl => Some(wgpu::Backends::GL),
            RendererBackend::Headless => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RendererBackend::Auto => "auto",
            RendererBackend::Vulkan => "vulkan",
            RendererBackend::Dx12 => "dx12",
            RendererBackend::Metal => "metal",
            RendererBackend::Gl => "gl",
            RendererBackend::Headless => "headless",
        }
    }
}

/// A per-window renderer with an explicit frame lifecycle
///
/// Every call made out of order returns [`RenderError::InvalidState`].
pub trait Renderer {
    fn backend(&self) -> RendererBackend;

    fn state(&self) -> RendererState;

    /// Creates all device resources for `window`. On failure the renderer
    /// stays `Uninitialized`.
    fn initialize(&mut self, window: &Window) -> Result<(), RenderError>;

    /// Acquires the back buffer and clears color and depth
    fn begin_frame(&mut self) -> Result<(), RenderError>;

    /// Camera matrix applied to every following `draw_model`
    fn set_view_projection(&mut self, view_projection: Matrix4<f32>);

    fn draw_model(&mut self, model: &Model, world: Matrix4<f32>) -> Result<(), RenderError>;

    /// Submits recorded work and presents the frame
    fn end_frame(&mut self) -> Result<(), RenderError>;

    fn resize(&mut self, width: u32, height: u32);

    fn surface_size(&self) -> (u32, u32);

    /// Releases every resource; the renderer cannot be used afterwards
    fn destroy(&mut self);

    fn aspect_ratio(&self) -> f32 {
        let (width, height) = self.surface_size();
        if height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_follows_frame_order() {
        let mut lifecycle = FrameLifecycle::default();
        assert_eq!(lifecycle.state(), RendererState::Uninitialized);
        assert!(lifecycle.begin().is_err());

        lifecycle.initialized().unwrap();
        assert!(lifecycle.initialized().is_err());
        assert!(lifecycle.end().is_err());

        lifecycle.begin().unwrap();
        assert_eq!(lifecycle.state(), RendererState::Drawing);
        assert!(lifecycle.begin().is_err());
        lifecycle.end().unwrap();
        assert_eq!(lifecycle.state(), RendererState::Initialized);

        lifecycle.destroy();
        assert!(matches!(
            lifecycle.begin(),
            Err(RenderError::InvalidState {
                state: RendererState::Destroyed,
                ..
            })
        ));
    }

    #[test]
    fn parses_backend_names() {
        assert_eq!("auto".parse::<RendererBackend>(), Ok(RendererBackend::Auto));
        assert_eq!("Vulkan".parse::<RendererBackend>(), Ok(RendererBackend::Vulkan));
        assert_eq!("D3D11".parse::<RendererBackend>(), Ok(RendererBackend::Dx12));
        assert_eq!("direct3d".parse::<RendererBackend>(), Ok(RendererBackend::Dx12));
        assert_eq!("OpenGL".parse::<RendererBackend>(), Ok(RendererBackend::Gl));
        assert_eq!("null".parse::<RendererBackend>(), Ok(RendererBackend::Headless));
        assert_eq!(
            "glide".parse::<RendererBackend>(),
            Err(UnknownBackend("glide".to_string()))
        );
    }

    #[test]
    fn headless_has_no_wgpu_backends() {
        assert!(RendererBackend::Headless.wgpu_backends().is_none());
        assert_eq!(
            RendererBackend::Metal.wgpu_backends(),
            Some(wgpu::Backends::METAL)
        );
    }
}
