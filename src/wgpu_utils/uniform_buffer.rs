// src/wgpu_utils/uniform_buffer.rs
use wgpu::util::DeviceExt;

/// `Foo` for `crate::module::Foo`
fn short_type_name<T>() -> &'static str {
    let name = std::any::type_name::<T>();
    name.rsplit("::").next().unwrap_or(name)
}

/// Typed constant buffer holding a single `T`
///
/// Remembers what it last wrote so identical updates skip the queue.
pub struct UniformBuffer<T> {
    buffer: wgpu::Buffer,
    last_written: Option<T>,
}

impl<T: bytemuck::Pod> UniformBuffer<T> {
    fn label() -> String {
        format!("{} Uniform", short_type_name::<T>())
    }

    /// Zero-filled buffer, written on the first `update_content`
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&Self::label()),
            size: std::mem::size_of::<T>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            buffer,
            last_written: None,
        }
    }

    pub fn new_with_data(device: &wgpu::Device, content: &T) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&Self::label()),
            contents: bytemuck::bytes_of(content),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            buffer,
            last_written: Some(*content),
        }
    }

    /// Queues a write of `content`; returns false when it matches the last write
    pub fn update_content(&mut self, queue: &wgpu::Queue, content: T) -> bool {
        let unchanged = self
            .last_written
            .as_ref()
            .is_some_and(|last| bytemuck::bytes_of(last) == bytemuck::bytes_of(&content));
        if unchanged {
            return false;
        }
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(&content));
        self.last_written = Some(content);
        true
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource<'_> {
        self.buffer.as_entire_binding()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(C)]
    #[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
    struct Params {
        scale: f32,
    }

    #[test]
    fn labels_use_short_type_name() {
        assert_eq!(short_type_name::<Params>(), "Params");
        assert_eq!(UniformBuffer::<Params>::label(), "Params Uniform");
        assert_eq!(short_type_name::<u32>(), "u32");
    }
}
