use std::path::{Path, PathBuf};

use thiserror::Error;

/// WGSL source compiled into the binary
pub const BASIC_SHADER: &str = include_str!("shaders/basic.wgsl");

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to read shader '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to compile shader '{label}': {message}")]
    Compile { label: String, message: String },
}

/// Where a renderer gets its WGSL from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ShaderSource {
    #[default]
    Builtin,
    File(PathBuf),
}

impl ShaderSource {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        ShaderSource::File(path.as_ref().to_path_buf())
    }

    pub fn label(&self) -> String {
        match self {
            ShaderSource::Builtin => "basic.wgsl".to_string(),
            ShaderSource::File(path) => path.display().to_string(),
        }
    }

    pub fn load(&self) -> Result<String, ShaderError> {
        match self {
            ShaderSource::Builtin => Ok(BASIC_SHADER.to_string()),
            ShaderSource::File(path) => {
                std::fs::read_to_string(path).map_err(|source| ShaderError::Read {
                    path: path.clone(),
                    source,
                })
            }
        }
    }
}

/// Compiles WGSL, surfacing validation failures as an error instead of
/// the device's uncaptured-error panic
pub fn compile(
    device: &wgpu::Device,
    label: &str,
    source: &str,
) -> Result<wgpu::ShaderModule, ShaderError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    match pollster::block_on(device.pop_error_scope()) {
        Some(error) => Err(ShaderError::Compile {
            label: label.to_string(),
            message: error.to_string(),
        }),
        None => Ok(module),
    }
}
