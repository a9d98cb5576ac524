//! Texture types and descriptors.

use bitflags::bitflags;
use glam::Vec4;
use half::f16;

use super::{CpuSampler, Extent3d, TextureDimension};

/// Texture format enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFormat {
    /// 8-bit RGBA channels, unsigned normalized.
    Rgba8Unorm,
    /// 16-bit RG channels, float.
    Rg16Float,
    /// 16-bit RGBA channels, float.
    #[default]
    Rgba16Float,
    /// 32-bit RGBA channels, float.
    Rgba32Float,
}

impl TextureFormat {
    /// Returns the size in bytes per pixel.
    pub fn block_size(&self) -> u32 {
        match self {
            Self::Rgba8Unorm | Self::Rg16Float => 4,
            Self::Rgba16Float => 8,
            Self::Rgba32Float => 16,
        }
    }

    /// Number of stored channels.
    pub fn channel_count(&self) -> usize {
        match self {
            Self::Rg16Float => 2,
            Self::Rgba8Unorm | Self::Rgba16Float | Self::Rgba32Float => 4,
        }
    }

    /// Whether linear filtering is available on every backend.
    pub fn is_filterable(&self) -> bool {
        !matches!(self, Self::Rgba32Float)
    }

    /// Round-trip a color through this format's storage precision.
    ///
    /// Missing channels read back as `0` (color) and `1` (alpha).
    pub fn quantize(&self, value: Vec4) -> Vec4 {
        let half = |v: f32| f16::from_f32(v).to_f32();
        match self {
            Self::Rgba8Unorm => {
                (value.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round() / 255.0
            }
            Self::Rg16Float => Vec4::new(half(value.x), half(value.y), 0.0, 1.0),
            Self::Rgba16Float => Vec4::new(half(value.x), half(value.y), half(value.z), half(value.w)),
            Self::Rgba32Float => value,
        }
    }

    /// Encode texels into tightly packed little-endian bytes.
    pub fn encode_texels(&self, texels: &[Vec4]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(texels.len() * self.block_size() as usize);
        for texel in texels {
            let channels = texel.to_array();
            match self {
                Self::Rgba8Unorm => {
                    for c in channels {
                        bytes.push((c.clamp(0.0, 1.0) * 255.0).round() as u8);
                    }
                }
                Self::Rg16Float | Self::Rgba16Float => {
                    for c in &channels[..self.channel_count()] {
                        bytes.extend_from_slice(&f16::from_f32(*c).to_le_bytes());
                    }
                }
                Self::Rgba32Float => {
                    for c in channels {
                        bytes.extend_from_slice(&c.to_le_bytes());
                    }
                }
            }
        }
        bytes
    }

    /// Decode tightly packed little-endian bytes; a trailing partial texel is ignored.
    pub fn decode_texels(&self, bytes: &[u8]) -> Vec<Vec4> {
        bytes
            .chunks_exact(self.block_size() as usize)
            .map(|texel| match self {
                Self::Rgba8Unorm => Vec4::new(
                    texel[0] as f32,
                    texel[1] as f32,
                    texel[2] as f32,
                    texel[3] as f32,
                ) / 255.0,
                Self::Rg16Float => {
                    let r = f16::from_le_bytes([texel[0], texel[1]]).to_f32();
                    let g = f16::from_le_bytes([texel[2], texel[3]]).to_f32();
                    Vec4::new(r, g, 0.0, 1.0)
                }
                Self::Rgba16Float => {
                    let mut v = [0.0f32; 4];
                    for (i, c) in texel.chunks_exact(2).enumerate() {
                        v[i] = f16::from_le_bytes([c[0], c[1]]).to_f32();
                    }
                    Vec4::from_array(v)
                }
                Self::Rgba32Float => {
                    let mut v = [0.0f32; 4];
                    for (i, c) in texel.chunks_exact(4).enumerate() {
                        v[i] = f32::from_le_bytes([c[0], c[1], c[2], c[3]]);
                    }
                    Vec4::from_array(v)
                }
            })
            .collect()
    }
}

bitflags! {
    /// Usage flags for textures.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        /// Texture can be copied from.
        const COPY_SRC = 1 << 0;
        /// Texture can be copied to.
        const COPY_DST = 1 << 1;
        /// Texture can be sampled in a shader.
        const TEXTURE_BINDING = 1 << 2;
        /// Texture can be used as a render attachment.
        const RENDER_ATTACHMENT = 1 << 4;
    }
}

impl Default for TextureUsage {
    fn default() -> Self {
        Self::empty()
    }
}

/// Descriptor for creating a texture.
///
/// Textures carry their sampling policy with them; a program that reads a
/// texture always samples it with [`TextureDescriptor::sampler`].
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDescriptor {
    /// Debug label for the texture.
    pub label: Option<String>,
    /// Size of the texture.
    pub size: Extent3d,
    /// 2D or cube.
    pub dimension: TextureDimension,
    /// Mip level count.
    pub mip_level_count: u32,
    /// Texture format.
    pub format: TextureFormat,
    /// Usage flags.
    pub usage: TextureUsage,
    /// Filtering and addressing used when the texture is sampled.
    pub sampler: CpuSampler,
}

impl TextureDescriptor {
    /// Create a new 2D texture descriptor.
    pub fn new_2d(width: u32, height: u32, format: TextureFormat, usage: TextureUsage) -> Self {
        Self {
            label: None,
            size: Extent3d::new_2d(width, height),
            dimension: TextureDimension::D2,
            mip_level_count: 1,
            format,
            usage,
            sampler: CpuSampler::bilinear_clamp(),
        }
    }

    /// Create a new cube texture descriptor with `size`-wide faces.
    pub fn new_cube(size: u32, format: TextureFormat, usage: TextureUsage) -> Self {
        Self {
            label: None,
            size: Extent3d::new_cube(size),
            dimension: TextureDimension::Cube,
            mip_level_count: 1,
            format,
            usage,
            sampler: CpuSampler::bilinear_clamp(),
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the mip level count.
    pub fn with_mip_levels(mut self, count: u32) -> Self {
        self.mip_level_count = count;
        self
    }

    /// Set the sampling policy.
    pub fn with_sampler(mut self, sampler: CpuSampler) -> Self {
        self.sampler = sampler;
        self
    }

    /// Label for log messages.
    pub fn debug_name(&self) -> &str {
        self.label.as_deref().unwrap_or("<unnamed>")
    }

    /// Number of array layers.
    pub fn layer_count(&self) -> u32 {
        self.dimension.layer_count()
    }

    /// Size of one layer at mip level `mip`.
    pub fn mip_level_size(&self, mip: u32) -> (u32, u32) {
        self.size.mip_level_size(mip)
    }

    /// Bytes of one tightly packed layer at mip level `mip`.
    pub fn level_byte_size(&self, mip: u32) -> usize {
        let (w, h) = self.mip_level_size(mip);
        w as usize * h as usize * self.format.block_size() as usize
    }
}
