//! Textures owned by a renderer
//!
//! A depth buffer sized to the surface, and the diffuse texture sampled by
//! the basic shader (a decoded image or a 1x1 white fallback).

use std::path::Path;

use image::{Rgba, RgbaImage};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Depth attachment recreated whenever the surface is resized
pub struct DepthBuffer {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl DepthBuffer {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Buffer"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

/// Sampled color texture with its view and sampler
pub struct TextureResource {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl TextureResource {
    /// Uploads an sRGB image; texture coordinates outside 0..1 wrap
    pub fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &RgbaImage,
        label: &str,
        filter: wgpu::FilterMode,
    ) -> Self {
        let (width, height) = image.dimensions();
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: filter,
            min_filter: filter,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    pub fn from_image_file(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: &Path,
    ) -> Result<Self, image::ImageError> {
        let image = load_rgba_image(path)?;
        log::info!(
            "Loaded texture {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );
        Ok(Self::from_rgba(
            device,
            queue,
            &image,
            &path.display().to_string(),
            wgpu::FilterMode::Linear,
        ))
    }

    /// Used when a renderer has no texture configured
    pub fn white(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self::from_rgba(
            device,
            queue,
            &white_pixel(),
            "White Texture",
            wgpu::FilterMode::Nearest,
        )
    }
}

fn white_pixel() -> RgbaImage {
    RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255]))
}

/// Decodes an image file into tightly packed RGBA8
pub fn load_rgba_image(path: &Path) -> Result<RgbaImage, image::ImageError> {
    Ok(image::open(path)?.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_image_is_an_error() {
        assert!(load_rgba_image(Path::new("no/such/texture.png")).is_err());
    }

    #[test]
    fn decodes_png_to_rgba() {
        let dir = std::env::temp_dir().join(format!("snap-engine-tex-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("checker.png");

        let mut img = image::RgbImage::new(2, 2);
        img.put_pixel(1, 0, image::Rgb([255, 0, 0]));
        img.save(&path).unwrap();

        let rgba = load_rgba_image(&path).unwrap();
        assert_eq!(rgba.dimensions(), (2, 2));
        assert_eq!(rgba.get_pixel(1, 0).0, [255, 0, 0, 255]);
        assert_eq!(rgba.get_pixel(0, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn fallback_is_one_opaque_white_pixel() {
        let pixel = white_pixel();
        assert_eq!(pixel.as_raw().as_slice(), &[255, 255, 255, 255]);
    }
}
