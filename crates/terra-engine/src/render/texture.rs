//! 2D textures and texture units.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use image::{DynamicImage, GenericImageView};

use crate::render::{RenderCtx, RendererError};

/// Number of texture units a [`Context`](super::Context) exposes.
pub const TEXTURE_UNIT_COUNT: usize = 8;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureColorSpace {
    /// Colour data; sampled values are converted to linear.
    Srgb,
    /// Non-colour data (masks, blend factors); sampled as stored.
    Linear,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureWrap {
    Clamp,
    Repeat,
    MirroredRepeat,
}

/// How a texture is stored and sampled.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Texture2DDescription {
    pub color_space: TextureColorSpace,
    pub filter: TextureFilter,
    pub wrap_s: TextureWrap,
    pub wrap_t: TextureWrap,
}

impl Default for Texture2DDescription {
    fn default() -> Self {
        Self {
            color_space: TextureColorSpace::Srgb,
            filter: TextureFilter::Linear,
            wrap_s: TextureWrap::Clamp,
            wrap_t: TextureWrap::Clamp,
        }
    }
}

impl Texture2DDescription {
    pub fn linear() -> Self {
        Self {
            color_space: TextureColorSpace::Linear,
            ..Self::default()
        }
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        match self.color_space {
            TextureColorSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            TextureColorSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
        }
    }

    fn filter_mode(&self) -> wgpu::FilterMode {
        match self.filter {
            TextureFilter::Nearest => wgpu::FilterMode::Nearest,
            TextureFilter::Linear => wgpu::FilterMode::Linear,
        }
    }
}

fn address_mode(wrap: TextureWrap) -> wgpu::AddressMode {
    match wrap {
        TextureWrap::Clamp => wgpu::AddressMode::ClampToEdge,
        TextureWrap::Repeat => wgpu::AddressMode::Repeat,
        TextureWrap::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
    }
}

/// Number of RGBA8 bytes expected for a `width` x `height` image.
pub fn rgba8_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

fn check_dimensions(width: u32, height: u32, max: u32) -> Result<(), RendererError> {
    if width > max || height > max {
        return Err(RendererError::TextureTooLarge { width, height, max });
    }
    Ok(())
}

fn write_rgba8(queue: &wgpu::Queue, texture: &wgpu::Texture, width: u32, height: u32, pixels: &[u8]) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}

/// GPU texture with its default view and sampler.
pub struct Texture2D {
    id: u64,
    width: u32,
    height: u32,
    description: Texture2DDescription,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

impl Texture2D {
    /// Creates a texture from tightly packed RGBA8 rows, top row first.
    pub fn from_rgba8(
        ctx: &RenderCtx<'_>,
        label: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
        description: Texture2DDescription,
    ) -> Result<Arc<Self>, RendererError> {
        let expected = rgba8_len(width, height);
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(RendererError::InvalidTextureData {
                expected,
                actual: pixels.len(),
            });
        }

        check_dimensions(width, height, ctx.device.limits().max_texture_dimension_2d)?;

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: description.format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        write_rgba8(ctx.queue, &texture, width, height, pixels);

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let filter = description.filter_mode();
        let sampler = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: address_mode(description.wrap_s),
            address_mode_v: address_mode(description.wrap_t),
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: filter,
            min_filter: filter,
            ..Default::default()
        });

        log::debug!("texture `{label}`: {width}x{height} {:?}", description.format());

        Ok(Arc::new(Self {
            id: crate::render::next_resource_id(),
            width,
            height,
            description,
            texture,
            view,
            sampler,
        }))
    }

    pub fn from_image(
        ctx: &RenderCtx<'_>,
        label: &str,
        image: &DynamicImage,
        description: Texture2DDescription,
    ) -> Result<Arc<Self>, RendererError> {
        let (width, height) = image.dimensions();
        let rgba = image.to_rgba8();
        Self::from_rgba8(ctx, label, width, height, rgba.as_raw(), description)
    }

    /// Loads an image file and uploads it.
    pub fn load(
        ctx: &RenderCtx<'_>,
        path: impl AsRef<Path>,
        description: Texture2DDescription,
    ) -> Result<Arc<Self>> {
        let path = path.as_ref();
        log::info!("loading texture {}", path.display());

        let image = image::open(path)
            .with_context(|| format!("failed to load texture {}", path.display()))?;
        let label = path.display().to_string();
        Ok(Self::from_image(ctx, &label, &image, description)?)
    }

    /// Replaces the whole image. `pixels` must match the texture size.
    pub fn copy_from_rgba8(&self, queue: &wgpu::Queue, pixels: &[u8]) -> Result<(), RendererError> {
        let expected = rgba8_len(self.width, self.height);
        if pixels.len() != expected {
            return Err(RendererError::InvalidTextureData {
                expected,
                actual: pixels.len(),
            });
        }
        write_rgba8(queue, &self.texture, self.width, self.height, pixels);
        Ok(())
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn description(&self) -> Texture2DDescription {
        self.description
    }

    #[inline]
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    #[inline]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    #[inline]
    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }
}

impl std::fmt::Debug for Texture2D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture2D")
            .field("id", &self.id)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("description", &self.description)
            .finish()
    }
}

/// The texture bound to each unit. Units are numbered from 0.
#[derive(Debug, Clone, Default)]
pub struct TextureUnits {
    units: [Option<Arc<Texture2D>>; TEXTURE_UNIT_COUNT],
}

impl TextureUnits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `texture` to `unit`. Out-of-range units are ignored with a warning.
    pub fn set(&mut self, unit: usize, texture: Option<Arc<Texture2D>>) {
        match self.units.get_mut(unit) {
            Some(slot) => *slot = texture,
            None => log::warn!("texture unit {unit} out of range (max {TEXTURE_UNIT_COUNT})"),
        }
    }

    pub fn get(&self, unit: usize) -> Option<&Arc<Texture2D>> {
        self.units.get(unit)?.as_ref()
    }

    pub fn clear(&mut self) {
        self.units = Default::default();
    }
}
