//! Precomputed BRDF integration map.
//!
//! The asset is a 128-byte header followed by `size * size` RG half-float
//! texels in row-major order. The header is skipped without inspection.

use std::path::Path;
use std::sync::Arc;

use prism_core::AssetError;

use crate::allocator::TextureAllocator;
use crate::error::GraphicsError;
use crate::resources::Texture;
use crate::types::{CpuSampler, TextureFormat};

/// Bytes skipped at the start of the asset.
pub const BRDF_LUT_HEADER_SIZE: usize = 128;

/// Edge length of the shipped asset.
pub const DEFAULT_BRDF_LUT_SIZE: u32 = 512;

/// Payload size of a `size x size` RG16F table.
pub fn brdf_lut_payload_size(size: u32) -> usize {
    TextureFormat::Rg16Float.block_size() as usize * size as usize * size as usize
}

/// Read the texel payload of a LUT asset.
///
/// Trailing bytes past the payload are ignored.
///
/// # Errors
///
/// - [`AssetError::NotFound`] / [`AssetError::Io`] when the file cannot be read.
/// - [`AssetError::Truncated`] when it is shorter than header plus payload.
pub fn read_brdf_lut_asset(path: impl AsRef<Path>, size: u32) -> Result<Vec<u8>, AssetError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| AssetError::from_io(path, e))?;

    let expected = BRDF_LUT_HEADER_SIZE + brdf_lut_payload_size(size);
    if bytes.len() < expected {
        return Err(AssetError::Truncated {
            path: path.to_path_buf(),
            expected,
            actual: bytes.len(),
        });
    }

    log::debug!("Read BRDF LUT {} ({size}x{size})", path.display());
    Ok(bytes[BRDF_LUT_HEADER_SIZE..expected].to_vec())
}

/// Upload a LUT payload as a bilinear, edge-clamped `Rg16Float` texture.
pub fn upload_brdf_lut(
    allocator: &TextureAllocator,
    payload: &[u8],
    size: u32,
) -> Result<Arc<Texture>, GraphicsError> {
    allocator.create_2d_texture(
        "brdf_lut",
        size,
        size,
        TextureFormat::Rg16Float,
        CpuSampler::bilinear_clamp(),
        Some(payload),
    )
}

/// Read and upload a precomputed LUT asset.
pub fn load_precomputed_brdf_lut(
    allocator: &TextureAllocator,
    path: impl AsRef<Path>,
    size: u32,
) -> Result<Arc<Texture>, GraphicsError> {
    let payload = read_brdf_lut_asset(path, size)?;
    upload_brdf_lut(allocator, &payload, size)
}
