//! Texture storage and sampling.

use glam::{Vec2, Vec3, Vec4};

use crate::cubemap::direction_to_face_uv;
use crate::sampler::{AddressMode, CpuSampler, FilterMode};

/// Texture dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureDimension {
    /// A single 2D image.
    #[default]
    D2,
    /// Six square 2D images addressed by direction.
    Cube,
}

impl TextureDimension {
    /// Number of array layers a texture of this dimension has.
    #[inline]
    pub fn layer_count(self) -> u32 {
        match self {
            TextureDimension::D2 => 1,
            TextureDimension::Cube => 6,
        }
    }
}

/// Length of the full mip chain for a `width x height` level 0.
#[inline]
pub fn mip_chain_length(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Linear RGBA float texture kept in host memory.
///
/// Levels are stored layer-major: all mips of layer 0, then all mips of layer 1.
/// Each level is row-major with row 0 first.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuTexture {
    pub name: Option<String>,
    dimension: TextureDimension,
    width: u32,
    height: u32,
    mip_level_count: u32,
    levels: Vec<Vec<Vec4>>,
}

impl CpuTexture {
    /// Create a zero-filled texture.
    ///
    /// `mip_level_count` is clamped to `1..=mip_chain_length(width, height)`.
    pub fn new(dimension: TextureDimension, width: u32, height: u32, mip_level_count: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let mip_level_count = mip_level_count.clamp(1, mip_chain_length(width, height));

        let mut levels = Vec::with_capacity((dimension.layer_count() * mip_level_count) as usize);
        for _ in 0..dimension.layer_count() {
            for mip in 0..mip_level_count {
                let w = (width >> mip).max(1);
                let h = (height >> mip).max(1);
                levels.push(vec![Vec4::ZERO; (w * h) as usize]);
            }
        }

        Self {
            name: None,
            dimension,
            width,
            height,
            mip_level_count,
            levels,
        }
    }

    /// Create a zero-filled 2D texture.
    pub fn new_2d(width: u32, height: u32, mip_level_count: u32) -> Self {
        Self::new(TextureDimension::D2, width, height, mip_level_count)
    }

    /// Create a zero-filled cube texture with square faces.
    pub fn new_cube(size: u32, mip_level_count: u32) -> Self {
        Self::new(TextureDimension::Cube, size, size, mip_level_count)
    }

    /// Create a single-level 2D texture from row-major texels.
    ///
    /// Returns `None` when `texels.len() != width * height`.
    pub fn from_texels(width: u32, height: u32, texels: Vec<Vec4>) -> Option<Self> {
        if width == 0 || height == 0 || texels.len() != (width * height) as usize {
            return None;
        }
        let mut texture = Self::new_2d(width, height, 1);
        texture.levels[0] = texels;
        Some(texture)
    }

    /// Set the texture name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn dimension(&self) -> TextureDimension {
        self.dimension
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn mip_level_count(&self) -> u32 {
        self.mip_level_count
    }

    pub fn layer_count(&self) -> u32 {
        self.dimension.layer_count()
    }

    /// Size of mip level `mip`.
    #[inline]
    pub fn mip_extent(&self, mip: u32) -> (u32, u32) {
        ((self.width >> mip).max(1), (self.height >> mip).max(1))
    }

    #[inline]
    fn level_index(&self, layer: u32, mip: u32) -> Option<usize> {
        (layer < self.layer_count() && mip < self.mip_level_count)
            .then(|| (layer * self.mip_level_count + mip) as usize)
    }

    /// Texels of one layer and mip, or `None` if out of range.
    pub fn level(&self, layer: u32, mip: u32) -> Option<&[Vec4]> {
        self.level_index(layer, mip).map(|i| self.levels[i].as_slice())
    }

    /// Mutable texels of one layer and mip, or `None` if out of range.
    pub fn level_mut(&mut self, layer: u32, mip: u32) -> Option<&mut [Vec4]> {
        self.level_index(layer, mip)
            .map(|i| self.levels[i].as_mut_slice())
    }

    /// Texel at `(x, y)`, zero when out of range.
    pub fn texel(&self, layer: u32, mip: u32, x: u32, y: u32) -> Vec4 {
        let (w, h) = self.mip_extent(mip);
        if x >= w || y >= h {
            return Vec4::ZERO;
        }
        self.level(layer, mip)
            .map_or(Vec4::ZERO, |level| level[(y * w + x) as usize])
    }

    /// Fill every texel of every level with `value`.
    pub fn fill(&mut self, value: Vec4) {
        for level in &mut self.levels {
            level.fill(value);
        }
    }

    /// Sample a 2D texture (layer 0) at normalized `uv` and level of detail `lod`.
    pub fn sample_2d(&self, sampler: &CpuSampler, uv: Vec2, lod: f32) -> Vec4 {
        self.sample_layer(
            0,
            sampler,
            (sampler.address_mode_u, sampler.address_mode_v),
            uv,
            lod,
        )
    }

    /// Sample a cube texture along `dir` at level of detail `lod`.
    ///
    /// Filtering stays within the selected face; texels are clamped at face edges.
    pub fn sample_cube(&self, sampler: &CpuSampler, dir: Vec3, lod: f32) -> Vec4 {
        let (face, uv) = direction_to_face_uv(dir);
        let uv = (uv + Vec2::ONE) * 0.5;
        self.sample_layer(
            face.index(),
            sampler,
            (AddressMode::ClampToEdge, AddressMode::ClampToEdge),
            uv,
            lod,
        )
    }

    fn sample_layer(
        &self,
        layer: u32,
        sampler: &CpuSampler,
        address: (AddressMode, AddressMode),
        uv: Vec2,
        lod: f32,
    ) -> Vec4 {
        let max_lod = (self.mip_level_count - 1) as f32;
        let lod = lod
            .max(sampler.lod_min_clamp)
            .min(sampler.lod_max_clamp)
            .clamp(0.0, max_lod);
        let filter = if lod <= 0.0 {
            sampler.mag_filter
        } else {
            sampler.min_filter
        };

        match sampler.mipmap_filter {
            FilterMode::Nearest => {
                let mip = lod.round() as u32;
                self.sample_level(layer, mip, filter, address, uv)
            }
            FilterMode::Linear => {
                let lower = lod.floor();
                let t = lod - lower;
                let a = self.sample_level(layer, lower as u32, filter, address, uv);
                if t <= 0.0 {
                    return a;
                }
                let b = self.sample_level(layer, lower as u32 + 1, filter, address, uv);
                a.lerp(b, t)
            }
        }
    }

    fn sample_level(
        &self,
        layer: u32,
        mip: u32,
        filter: FilterMode,
        (address_u, address_v): (AddressMode, AddressMode),
        uv: Vec2,
    ) -> Vec4 {
        let (w, h) = self.mip_extent(mip);
        let Some(level) = self.level(layer, mip) else {
            return Vec4::ZERO;
        };
        let fetch = |x: i64, y: i64| {
            let x = address_u.resolve(x, w);
            let y = address_v.resolve(y, h);
            level[(y * w + x) as usize]
        };

        let x = uv.x * w as f32;
        let y = uv.y * h as f32;
        match filter {
            FilterMode::Nearest => fetch(x.floor() as i64, y.floor() as i64),
            FilterMode::Linear => {
                let x = x - 0.5;
                let y = y - 0.5;
                let x0 = x.floor();
                let y0 = y.floor();
                let fx = x - x0;
                let fy = y - y0;
                let (x0, y0) = (x0 as i64, y0 as i64);
                let top = fetch(x0, y0).lerp(fetch(x0 + 1, y0), fx);
                let bottom = fetch(x0, y0 + 1).lerp(fetch(x0 + 1, y0 + 1), fx);
                top.lerp(bottom, fy)
            }
        }
    }

    /// Rebuild mips `1..` of every layer with a 2x2 box filter.
    pub fn generate_mipmaps(&mut self) {
        for layer in 0..self.layer_count() {
            for mip in 1..self.mip_level_count {
                let (src_w, src_h) = self.mip_extent(mip - 1);
                let (dst_w, dst_h) = self.mip_extent(mip);
                let src_index = (layer * self.mip_level_count + mip - 1) as usize;
                let dst_index = src_index + 1;

                let mut dst = vec![Vec4::ZERO; (dst_w * dst_h) as usize];
                let src = &self.levels[src_index];
                for y in 0..dst_h {
                    for x in 0..dst_w {
                        let x0 = (2 * x).min(src_w - 1);
                        let x1 = (2 * x + 1).min(src_w - 1);
                        let y0 = (2 * y).min(src_h - 1);
                        let y1 = (2 * y + 1).min(src_h - 1);
                        let sum = src[(y0 * src_w + x0) as usize]
                            + src[(y0 * src_w + x1) as usize]
                            + src[(y1 * src_w + x0) as usize]
                            + src[(y1 * src_w + x1) as usize];
                        dst[(y * dst_w + x) as usize] = sum * 0.25;
                    }
                }
                self.levels[dst_index] = dst;
            }
        }
    }
}
