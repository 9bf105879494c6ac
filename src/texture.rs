//! Texture ingestion: LDR color maps and HDR panoramas.
//!
//! Decoding is split from upload so the fallback and channel-expansion
//! behavior can be tested without a GPU. [`DecodedImage`] is the CPU side;
//! [`Texture`] owns the GPU resources.

use std::path::Path;

use crate::gpu::GpuContext;

/// A decoded image, always expanded to tightly packed RGBA8.
///
/// Single-channel and RGB sources are expanded on the CPU since there is no
/// 8-bit three-channel GPU texture format. The original channel count is
/// kept for diagnostics.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    /// Tightly packed RGBA pixel data, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Channel count of the source file before expansion.
    pub source_channels: u8,
}

impl DecodedImage {
    /// A 1x1 opaque white image, the universal fallback.
    ///
    /// White is multiplicative identity for the base-color map and reads as
    /// "fully on" for roughness/metallic/AO masks, so a missing file leaves
    /// the material well-defined.
    pub fn white() -> Self {
        Self {
            pixels: vec![255, 255, 255, 255],
            width: 1,
            height: 1,
            source_channels: 4,
        }
    }

    /// Decode an image file, falling back to 1x1 white on any failure.
    ///
    /// `flip` mirrors the image vertically, for textures authored with a
    /// bottom-left UV origin (the usual OBJ convention).
    pub fn open(path: impl AsRef<Path>, flip: bool) -> Self {
        let path = path.as_ref();
        match image::open(path) {
            Ok(img) => {
                let source_channels = img.color().channel_count();
                let img = if flip { img.flipv() } else { img };
                let rgba = img.to_rgba8();
                let (width, height) = rgba.dimensions();
                Self {
                    pixels: rgba.into_raw(),
                    width,
                    height,
                    source_channels,
                }
            }
            Err(e) => {
                log::warn!(
                    "Failed to load texture '{}' ({}); using 1x1 white",
                    path.display(),
                    e
                );
                Self::white()
            }
        }
    }
}

/// A GPU texture that can be bound to shaders.
#[derive(Debug)]
pub struct Texture {
    #[allow(dead_code)]
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

impl Texture {
    /// Upload a decoded image as a linear RGBA8 texture.
    ///
    /// When `mipmaps` is true a full mip chain is generated on the CPU with
    /// a triangle filter and every level is uploaded.
    pub fn from_decoded(
        gpu: &GpuContext,
        img: &DecodedImage,
        mipmaps: bool,
        label: &str,
    ) -> Self {
        let levels = if mipmaps {
            mip_level_count(img.width, img.height)
        } else {
            1
        };

        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: img.width,
                height: img.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: levels,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let base = image::RgbaImage::from_raw(img.width, img.height, img.pixels.clone())
            .unwrap_or_else(|| {
                image::RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]))
            });

        for level in 0..levels {
            let w = (img.width >> level).max(1);
            let h = (img.height >> level).max(1);
            let data = if level == 0 {
                base.as_raw().clone()
            } else {
                image::imageops::resize(&base, w, h, image::imageops::FilterType::Triangle)
                    .into_raw()
            };

            gpu.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: level,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &data,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * w),
                    rows_per_image: Some(h),
                },
                wgpu::Extent3d {
                    width: w,
                    height: h,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: if mipmaps {
                wgpu::FilterMode::Linear
            } else {
                wgpu::FilterMode::Nearest
            },
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            width: img.width,
            height: img.height,
        }
    }

    /// Load a color/mask texture from an image file.
    ///
    /// Never fails: a missing or undecodable file becomes a 1x1 white
    /// texture after a logged warning.
    pub fn load_color(gpu: &GpuContext, path: impl AsRef<Path>, mipmaps: bool, flip: bool) -> Self {
        let path = path.as_ref();
        let img = DecodedImage::open(path, flip);
        Self::from_decoded(gpu, &img, mipmaps, &path.to_string_lossy())
    }

    /// Load an equirectangular HDR panorama as an Rgba16Float texture.
    ///
    /// The image is flipped vertically on load and sampled with clamped
    /// linear filtering. Returns `None` if the file cannot be decoded; the
    /// caller decides whether to keep a previous environment.
    pub fn load_hdr(gpu: &GpuContext, path: impl AsRef<Path>) -> Option<Self> {
        use wgpu::util::DeviceExt;

        let path = path.as_ref();
        let img = match image::open(path) {
            Ok(img) => img.flipv().to_rgb32f(),
            Err(e) => {
                log::warn!("Failed to load HDR panorama '{}': {}", path.display(), e);
                return None;
            }
        };
        let (width, height) = img.dimensions();

        // Rgba32Float is not filterable on all adapters; pack to f16 instead.
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for rgb in img.pixels() {
            pixels.push(half::f16::from_f32(rgb.0[0]).to_bits());
            pixels.push(half::f16::from_f32(rgb.0[1]).to_bits());
            pixels.push(half::f16::from_f32(rgb.0[2]).to_bits());
            pixels.push(half::f16::from_f32(1.0).to_bits());
        }

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(&path.to_string_lossy()),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba16Float,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            bytemuck::cast_slice(&pixels),
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("HDR Panorama Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        log::info!(
            "Loaded HDR panorama '{}' ({}x{})",
            path.display(),
            width,
            height
        );

        Some(Self {
            texture,
            view,
            sampler,
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn white_fallback_is_1x1_opaque() {
        let img = DecodedImage::white();
        assert_eq!((img.width, img.height), (1, 1));
        assert_eq!(img.pixels, vec![255, 255, 255, 255]);
    }

    #[test]
    fn missing_file_falls_back_to_white() {
        let img = DecodedImage::open("no/such/texture.png", true);
        assert_eq!((img.width, img.height), (1, 1));
        assert_eq!(img.pixels, vec![255, 255, 255, 255]);
    }

    #[test]
    fn gray_source_expands_to_rgba() {
        let dir = std::env::temp_dir();
        let path = dir.join("helion_test_gray.png");
        let gray = image::GrayImage::from_pixel(2, 2, image::Luma([137]));
        gray.save(&path).unwrap();

        let img = DecodedImage::open(&path, false);
        std::fs::remove_file(&path).ok();

        assert_eq!(img.source_channels, 1);
        assert_eq!(img.pixels.len(), 2 * 2 * 4);
        for px in img.pixels.chunks(4) {
            assert_eq!(px, &[137, 137, 137, 255]);
        }
    }

    #[test]
    fn rgb_source_expands_to_rgba() {
        let dir = std::env::temp_dir();
        let path = dir.join("helion_test_rgb.png");
        let rgb = image::RgbImage::from_pixel(1, 1, image::Rgb([10, 20, 30]));
        rgb.save(&path).unwrap();

        let img = DecodedImage::open(&path, false);
        std::fs::remove_file(&path).ok();

        assert_eq!(img.source_channels, 3);
        assert_eq!(img.pixels, vec![10, 20, 30, 255]);
    }

    #[test]
    fn flipped_load_reverses_rows() {
        let dir = std::env::temp_dir();
        let path = dir.join("helion_test_rows.png");
        let mut img = image::RgbaImage::new(1, 2);
        img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        img.put_pixel(0, 1, image::Rgba([0, 0, 255, 255]));
        img.save(&path).unwrap();

        let plain = DecodedImage::open(&path, false);
        let flipped = DecodedImage::open(&path, true);
        std::fs::remove_file(&path).ok();

        // Unflipped keeps the red top row first; flipped starts at the
        // blue bottom row.
        assert_eq!(&plain.pixels[0..4], &[255, 0, 0, 255]);
        assert_eq!(&flipped.pixels[0..4], &[0, 0, 255, 255]);
    }

    #[test]
    fn mip_chain_depth() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(256, 256), 9);
        assert_eq!(mip_level_count(512, 256), 10);
        assert_eq!(mip_level_count(300, 200), 9);
    }
}
