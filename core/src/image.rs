//! High dynamic range environment images.

use std::path::Path;

use glam::{Vec3, Vec4};
use half::f16;

use crate::error::AssetError;
use crate::texture::CpuTexture;

/// Linear RGB float raster of an equirectangular panorama.
///
/// Rows are stored bottom-up: row 0 is the bottom of the picture as it would be
/// displayed, which is where `v = 0` of the panorama addressing lands.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentImage {
    width: u32,
    height: u32,
    pixels: Vec<Vec3>,
}

impl EnvironmentImage {
    /// Decode an HDR image file and flip it so that row 0 is the bottom row.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        log::info!("Loading environment image: {}", path.display());

        let data = std::fs::read(path).map_err(|e| AssetError::from_io(path, e))?;
        Self::decode(&data).map_err(|message| AssetError::Decode {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Decode an in-memory image in any format the `image` crate recognizes.
    pub fn from_memory(data: &[u8]) -> Result<Self, AssetError> {
        Self::decode(data).map_err(|message| AssetError::Decode {
            path: "<memory>".into(),
            message,
        })
    }

    fn decode(data: &[u8]) -> Result<Self, String> {
        let img = image::load_from_memory(data).map_err(|e| e.to_string())?;
        let rgb = img.flipv().into_rgb32f();
        let (width, height) = rgb.dimensions();
        log::debug!("Environment image: {}x{}", width, height);

        let pixels = rgb
            .pixels()
            .map(|p| Vec3::new(p[0], p[1], p[2]))
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build an image from bottom-up row-major pixels.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Vec3>) -> Result<Self, AssetError> {
        if width == 0 || height == 0 || pixels.len() != width as usize * height as usize {
            return Err(AssetError::InvalidDimensions {
                width,
                height,
                texels: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Uniform environment of a single radiance value.
    pub fn constant(width: u32, height: u32, color: Vec3) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            pixels: vec![color; width.max(1) as usize * height.max(1) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Vec3] {
        &self.pixels
    }

    /// Pixel at column `x` of row `y` (row 0 = bottom).
    pub fn pixel(&self, x: u32, y: u32) -> Option<Vec3> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get((y * self.width + x) as usize).copied()
    }

    /// RGBA half-float upload payload, alpha set to one.
    pub fn to_rgba16f_bytes(&self) -> Vec<u8> {
        let halves: Vec<f16> = self
            .pixels
            .iter()
            .flat_map(|p| [p.x, p.y, p.z, 1.0])
            .map(f16::from_f32)
            .collect();
        bytemuck::cast_slice(&halves).to_vec()
    }

    /// Copy into a single-level [`CpuTexture`].
    pub fn to_cpu_texture(&self) -> CpuTexture {
        let texels = self.pixels.iter().map(|p| p.extend(1.0)).collect::<Vec<Vec4>>();
        let mut texture = CpuTexture::new_2d(self.width, self.height, 1);
        if let Some(level) = texture.level_mut(0, 0) {
            level.copy_from_slice(&texels);
        }
        texture
    }
}
