//! GPU textures and texture creation utilities.
//!
//! This module provides [`Texture`], a wrapper around WGPU GPU texture resources,
//! and helper methods for creating depth textures, solid fallback textures and loading
//! textures from image data.

use anyhow::Result;
use image::{
    GenericImageView, ImageFormat, imageops::{self, FilterType},
    load_from_memory_with_format,
};

use crate::error::LoadError;

/// A GPU texture with a view and optional sampler.
///
/// Typically created via [`from_bytes`](Self::from_bytes),
/// [`create_solid`](Self::create_solid) or [`create_depth_texture`](Self::create_depth_texture).
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: Option<wgpu::Sampler>,
}

impl Texture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Create a depth texture for depth-testing during rendering.
    ///
    /// # Arguments
    ///
    /// * `size` is [width, height] of the texture in pixels
    /// * `label` is used as a debug label for the GPU resource
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[Self::DEPTH_FORMAT],
        };
        let texture = device.create_texture(&desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            lod_min_clamp: 0.0,
            lod_max_clamp: 100.0,
            ..Default::default()
        }));

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Create a 1x1 texture filled with `rgba`.
    ///
    /// Used as the neutral value of a material channel whose image is missing, so that the
    /// PBR pipeline never has to change shape. `linear` picks a non-sRGB format for data
    /// channels (normals, roughness, ...).
    pub fn create_solid(
        rgba: [u8; 4],
        linear: bool,
        label: &str,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Texture {
        let size = wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: color_format(linear),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            &rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4),
                rows_per_image: Some(1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(create_repeat_sampler(device));
        Texture {
            texture,
            view,
            sampler,
        }
    }

    /// Load a texture from raw byte data (image file contents).
    ///
    /// # Arguments
    ///
    /// * `bytes` represent raw image file data (PNG, JPEG, etc.)
    /// * `label` is used as a debug name for the GPU resource
    /// * `format`  is an optional file format hint (e.g., "png"). If None, auto-detect.
    /// * `linear` toggles between sRGB (false) and linear (true) color space
    pub fn from_bytes(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bytes: &[u8],
        label: &str,
        format: Option<&str>,
        linear: bool,
    ) -> Result<Self> {
        let decoded = match format.and_then(ImageFormat::from_extension) {
            None => image::load_from_memory(bytes),
            Some(fmt) => load_from_memory_with_format(bytes, fmt),
        };
        let img = decoded.map_err(|source| LoadError::Image {
            name: label.to_string(),
            source,
        })?;
        Ok(Self::from_image(device, queue, &img, Some(label), linear))
    }

    /// Uploads `img` with a full mip chain.
    ///
    /// Images larger than the device's 2D texture limit (2048 on WebGL2) are scaled down to
    /// fit first, keeping their aspect ratio.
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &image::DynamicImage,
        label: Option<&str>,
        linear: bool,
    ) -> Self {
        let limit = device.limits().max_texture_dimension_2d;
        let mut rgba = match fit_within(img.dimensions(), limit) {
            Some((width, height)) => {
                log::warn!(
                    "Image {} is {}x{}, larger than the texture limit {}; scaling it to {}x{}",
                    label.unwrap_or("<unnamed>"),
                    img.width(),
                    img.height(),
                    limit,
                    width,
                    height
                );
                img.resize_exact(width, height, FilterType::Triangle).to_rgba8()
            }
            None => img.to_rgba8(),
        };
        let (width, height) = rgba.dimensions();
        let mip_level_count = mip_level_count(width, height);

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: color_format(linear),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for level in 0..mip_level_count {
            let (level_width, level_height) = mip_extent(width, height, level);
            if level > 0 {
                rgba = imageops::resize(&rgba, level_width, level_height, FilterType::Triangle);
            }
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &texture,
                    mip_level: level,
                    origin: wgpu::Origin3d::ZERO,
                },
                &rgba,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * level_width),
                    rows_per_image: Some(level_height),
                },
                wgpu::Extent3d {
                    width: level_width,
                    height: level_height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(create_repeat_sampler(device));

        Self {
            texture,
            view,
            sampler,
        }
    }
}

/// The size `dimensions` shrinks to so that neither side exceeds `limit`, or `None` when it
/// already fits. The aspect ratio is kept and no side drops below one pixel.
pub fn fit_within(dimensions: (u32, u32), limit: u32) -> Option<(u32, u32)> {
    let (width, height) = dimensions;
    if width <= limit && height <= limit {
        return None;
    }
    let scale = |side: u32, longest: u32| ((side as u64 * limit as u64) / longest as u64).max(1) as u32;
    Some(if width >= height {
        (limit, scale(height, width))
    } else {
        (scale(width, height), limit)
    })
}

/// Levels down to and including 1x1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    u32::BITS - width.max(height).max(1).leading_zeros()
}

pub fn mip_extent(width: u32, height: u32, level: u32) -> (u32, u32) {
    ((width >> level).max(1), (height >> level).max(1))
}

fn color_format(linear: bool) -> wgpu::TextureFormat {
    if linear {
        wgpu::TextureFormat::Rgba8Unorm
    } else {
        wgpu::TextureFormat::Rgba8UnormSrgb
    }
}

/// Repeat addressing on every axis; UVs outside 0..1 tile the image.
pub fn create_repeat_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Linear,
        ..Default::default()
    })
}

/// Clamped sampler for images that must not wrap, such as the backdrop.
pub fn create_clamp_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn images_within_the_limit_keep_their_size() {
        assert_eq!(fit_within((2048, 2048), 2048), None);
        assert_eq!(fit_within((1, 300), 2048), None);
    }

    #[test]
    fn oversized_images_shrink_to_the_limit() {
        assert_eq!(fit_within((4096, 4096), 2048), Some((2048, 2048)));
        assert_eq!(fit_within((8192, 2048), 2048), Some((2048, 512)));
        assert_eq!(fit_within((3000, 6000), 2048), Some((1024, 2048)));
        assert_eq!(fit_within((100_000, 10), 2048), Some((2048, 1)));
    }

    #[test]
    fn mip_chain_ends_at_one_pixel() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(2048, 2048), 12);
        assert_eq!(mip_level_count(1024, 200), 11);
        assert_eq!(mip_extent(1024, 200, 10), (1, 1));
        assert_eq!(mip_extent(1024, 200, 3), (128, 25));
    }
}
