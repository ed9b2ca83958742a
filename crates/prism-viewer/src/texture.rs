use std::path::Path;

use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};

/// Decoded RGBA8 image with its full mip chain, level 0 first.
#[derive(Debug, Clone)]
pub struct TextureImage {
    pub mips: Vec<RgbaImage>,
}

impl TextureImage {
    /// Decodes `path`. Grey, grey+alpha and RGB images are expanded to RGBA8.
    pub fn load(path: &Path, flip_vertically: bool) -> Result<Self> {
        let img = image::open(path).with_context(|| format!("failed to decode {}", path.display()))?;
        Ok(Self::from_dynamic(img, flip_vertically))
    }

    pub fn from_dynamic(img: DynamicImage, flip_vertically: bool) -> Self {
        let img = if flip_vertically { img.flipv() } else { img };
        Self {
            mips: mip_chain(img.into_rgba8()),
        }
    }

    /// Opaque 1x1 white, used when a texture cannot be loaded.
    pub fn white() -> Self {
        Self {
            mips: vec![RgbaImage::from_pixel(1, 1, image::Rgba([255; 4]))],
        }
    }

    pub fn width(&self) -> u32 {
        self.mips[0].width()
    }

    pub fn height(&self) -> u32 {
        self.mips[0].height()
    }
}

pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Halves each level (rounding down, at least 1 px) until 1x1.
pub fn mip_chain(base: RgbaImage) -> Vec<RgbaImage> {
    let levels = mip_level_count(base.width(), base.height()) as usize;
    let mut mips = Vec::with_capacity(levels);
    mips.push(base);

    while mips.len() < levels {
        let prev = &mips[mips.len() - 1];
        let (w, h) = ((prev.width() / 2).max(1), (prev.height() / 2).max(1));
        let next = imageops::resize(prev, w, h, FilterType::Triangle);
        mips.push(next);
    }
    mips
}

/// Sampled texture with its view and sampler.
pub struct GpuTexture {
    // Owns the storage `view` points into.
    _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl GpuTexture {
    /// Loads `path`, substituting white on failure so rendering continues.
    pub fn load_or_white(device: &wgpu::Device, queue: &wgpu::Queue, path: &Path, flip_vertically: bool) -> Self {
        let image = match TextureImage::load(path, flip_vertically) {
            Ok(img) => {
                log::debug!("loaded texture {} ({}x{})", path.display(), img.width(), img.height());
                img
            }
            Err(e) => {
                log::error!("texture failed to load at path: {} ({e:#})", path.display());
                TextureImage::white()
            }
        };
        Self::upload(device, queue, &image, &path.display().to_string())
    }

    pub fn upload(device: &wgpu::Device, queue: &wgpu::Queue, image: &TextureImage, label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: image.width(),
            height: image.height(),
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: image.mips.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (level, mip) in image.mips.iter().enumerate() {
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: level as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                mip.as_raw(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * mip.width()),
                    rows_per_image: Some(mip.height()),
                },
                wgpu::Extent3d {
                    width: mip.width(),
                    height: mip.height(),
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("prism material sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            ..Default::default()
        });

        Self {
            _texture: texture,
            view,
            sampler,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn level_count_follows_longest_side() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(2, 1), 2);
        assert_eq!(mip_level_count(512, 512), 10);
        assert_eq!(mip_level_count(300, 17), 9);
        assert_eq!(mip_level_count(0, 0), 1);
    }

    #[test]
    fn chain_halves_down_to_one_pixel() {
        let mips = mip_chain(RgbaImage::new(8, 2));
        let dims: Vec<_> = mips.iter().map(|m| (m.width(), m.height())).collect();
        assert_eq!(dims, [(8, 2), (4, 1), (2, 1), (1, 1)]);
    }

    #[test]
    fn grey_expands_to_opaque_rgba() {
        let grey = GrayImage::from_pixel(2, 2, Luma([100]));
        let tex = TextureImage::from_dynamic(DynamicImage::ImageLuma8(grey), false);
        assert_eq!(tex.mips[0].get_pixel(0, 0).0, [100, 100, 100, 255]);
    }

    #[test]
    fn flip_swaps_rows() {
        let mut rgb = RgbImage::new(1, 2);
        rgb.put_pixel(0, 0, Rgb([255, 0, 0]));
        rgb.put_pixel(0, 1, Rgb([0, 0, 255]));

        let tex = TextureImage::from_dynamic(DynamicImage::ImageRgb8(rgb.clone()), true);
        assert_eq!(tex.mips[0].get_pixel(0, 0).0, [0, 0, 255, 255]);

        let tex = TextureImage::from_dynamic(DynamicImage::ImageRgb8(rgb), false);
        assert_eq!(tex.mips[0].get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn white_fallback_is_single_texel() {
        let tex = TextureImage::white();
        assert_eq!((tex.width(), tex.height(), tex.mips.len()), (1, 1, 1));
        assert_eq!(tex.mips[0].get_pixel(0, 0).0, [255; 4]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = TextureImage::load(Path::new("/no/such/brickWall.png"), false).unwrap_err();
        assert!(format!("{err:#}").contains("brickWall.png"));
    }
}
