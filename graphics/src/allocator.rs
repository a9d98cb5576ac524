//! Texture allocation with per-role sampling policies.
//!
//! | Role | Dimension | Mips | Sampler |
//! |------|-----------|------|---------|
//! | environment cube | cube | full chain | trilinear, clamp |
//! | irradiance cube | cube | 1 | bilinear, clamp |
//! | prefiltered cube | cube | roughness bands | trilinear, clamp |
//! | BRDF LUT | 2D | 1 | bilinear, clamp |
//! | HDR panorama | 2D | 1 | bilinear, repeat u / clamp v |

use std::sync::Arc;

use prism_core::profiling::profile_scope;

use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::resources::Texture;
use crate::types::{CpuSampler, TextureDescriptor, TextureFormat, TextureUsage};

/// Creates bake targets and input textures on one device.
#[derive(Debug, Clone)]
pub struct TextureAllocator {
    device: Arc<GraphicsDevice>,
}

impl TextureAllocator {
    /// Usage given to every allocated texture: sampled, renderable and copyable.
    pub const USAGE: TextureUsage = TextureUsage::TEXTURE_BINDING
        .union(TextureUsage::RENDER_ATTACHMENT)
        .union(TextureUsage::COPY_SRC)
        .union(TextureUsage::COPY_DST);

    pub fn new(device: Arc<GraphicsDevice>) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    /// Create an uninitialized cube render target.
    ///
    /// Filtering is trilinear when the texture has more than one mip and
    /// bilinear otherwise; addressing always clamps.
    pub fn create_cube_texture(
        &self,
        label: &str,
        resolution: u32,
        mip_levels: u32,
        format: TextureFormat,
    ) -> Result<Arc<Texture>, GraphicsError> {
        profile_scope!("create_cube_texture");

        let sampler = if mip_levels > 1 {
            CpuSampler::trilinear_clamp()
        } else {
            CpuSampler::bilinear_clamp()
        };
        let descriptor = TextureDescriptor::new_cube(resolution, format, Self::USAGE)
            .with_label(label)
            .with_mip_levels(mip_levels)
            .with_sampler(sampler);

        let texture = self.device.create_texture(&descriptor)?;
        log::debug!(
            "Allocated cube texture {label}: {resolution}x{resolution}, {mip_levels} mips, {format:?}"
        );
        Ok(texture)
    }

    /// Create a single-mip 2D texture, optionally filled with `initial_data`.
    ///
    /// `initial_data` must be exactly `width * height` tightly packed texels
    /// in `format`.
    pub fn create_2d_texture(
        &self,
        label: &str,
        width: u32,
        height: u32,
        format: TextureFormat,
        sampler: CpuSampler,
        initial_data: Option<&[u8]>,
    ) -> Result<Arc<Texture>, GraphicsError> {
        profile_scope!("create_2d_texture");

        let descriptor = TextureDescriptor::new_2d(width, height, format, Self::USAGE)
            .with_label(label)
            .with_sampler(sampler);

        if let Some(data) = initial_data {
            let expected = descriptor.level_byte_size(0);
            if data.len() != expected {
                return Err(GraphicsError::InvalidParameter(format!(
                    "initial data for {label} is {} bytes, expected {expected}",
                    data.len()
                )));
            }
        }

        let texture = self.device.create_texture(&descriptor)?;
        if let Some(data) = initial_data {
            self.device.write_texture(&texture, 0, 0, data)?;
        }

        log::debug!(
            "Allocated 2D texture {label}: {width}x{height}, {format:?}, initialized={}",
            initial_data.is_some()
        );
        Ok(texture)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendType;
    use crate::types::FilterMode;

    fn allocator() -> TextureAllocator {
        TextureAllocator::new(GraphicsDevice::new(BackendType::Software).unwrap())
    }

    #[test]
    fn cube_sampler_follows_mip_count() {
        let allocator = allocator();
        let mipped = allocator
            .create_cube_texture("prefiltered", 16, 5, TextureFormat::Rgba16Float)
            .unwrap();
        assert!(mipped.sampler().is_trilinear());
        assert_eq!(mipped.layer_count(), 6);

        let single = allocator
            .create_cube_texture("irradiance", 8, 1, TextureFormat::Rgba16Float)
            .unwrap();
        assert_eq!(single.sampler().mag_filter, FilterMode::Linear);
        assert_eq!(single.sampler().mipmap_filter, FilterMode::Nearest);
    }

    #[test]
    fn rejects_bad_cube_parameters() {
        let allocator = allocator();
        assert!(matches!(
            allocator.create_cube_texture("zero", 0, 1, TextureFormat::Rgba16Float),
            Err(GraphicsError::InvalidParameter(_))
        ));
        assert!(matches!(
            allocator.create_cube_texture("deep", 8, 5, TextureFormat::Rgba16Float),
            Err(GraphicsError::InvalidParameter(_))
        ));
    }

    #[test]
    fn uploads_initial_data() {
        let allocator = allocator();
        let texels = vec![glam::Vec4::new(0.25, 0.75, 0.0, 1.0); 4];
        let bytes = TextureFormat::Rg16Float.encode_texels(&texels);
        let lut = allocator
            .create_2d_texture(
                "lut",
                2,
                2,
                TextureFormat::Rg16Float,
                CpuSampler::bilinear_clamp(),
                Some(&bytes),
            )
            .unwrap();
        let read = allocator.device().read_texture(&lut, 0, 0).unwrap();
        assert_eq!(read, texels);
    }

    #[test]
    fn rejects_mismatched_payload() {
        let allocator = allocator();
        let err = allocator
            .create_2d_texture(
                "short",
                4,
                4,
                TextureFormat::Rgba16Float,
                CpuSampler::panorama(),
                Some(&[0u8; 16]),
            )
            .unwrap_err();
        assert!(matches!(err, GraphicsError::InvalidParameter(_)));
        assert_eq!(allocator.device().texture_count(), 0);
    }
}
