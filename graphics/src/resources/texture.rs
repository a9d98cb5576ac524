//! GPU texture resource.

use std::sync::Arc;

use crate::backend::GpuTexture;
use crate::device::GraphicsDevice;
use crate::types::{CpuSampler, Extent3d, TextureDescriptor, TextureDimension, TextureFormat, TextureUsage};

/// A GPU texture resource.
///
/// Textures are created by [`GraphicsDevice::create_texture`] and are reference-counted.
/// They hold a strong reference to their parent device, keeping it alive.
/// Dropping the last [`Arc`] releases the backend storage.
///
/// # Example
///
/// ```ignore
/// let texture = device.create_texture(&TextureDescriptor::new_cube(
///     512,
///     TextureFormat::Rgba16Float,
///     TextureUsage::TEXTURE_BINDING | TextureUsage::RENDER_ATTACHMENT,
/// ))?;
/// println!("Face size: {}x{}", texture.width(), texture.height());
/// ```
pub struct Texture {
    device: Arc<GraphicsDevice>,
    descriptor: TextureDescriptor,
    gpu: GpuTexture,
}

impl Texture {
    /// Create a new texture (called by GraphicsDevice).
    pub(crate) fn new(
        device: Arc<GraphicsDevice>,
        descriptor: TextureDescriptor,
        gpu: GpuTexture,
    ) -> Self {
        Self {
            device,
            descriptor,
            gpu,
        }
    }

    /// Get the parent device.
    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    /// Get the texture descriptor.
    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }

    /// Get the backend storage.
    pub fn gpu_handle(&self) -> &GpuTexture {
        &self.gpu
    }

    /// Get the texture size.
    pub fn size(&self) -> Extent3d {
        self.descriptor.size
    }

    /// Get the texture width.
    pub fn width(&self) -> u32 {
        self.descriptor.size.width
    }

    /// Get the texture height.
    pub fn height(&self) -> u32 {
        self.descriptor.size.height
    }

    pub fn dimension(&self) -> TextureDimension {
        self.descriptor.dimension
    }

    /// Number of array layers (6 for cubes).
    pub fn layer_count(&self) -> u32 {
        self.descriptor.layer_count()
    }

    /// Get the texture format.
    pub fn format(&self) -> TextureFormat {
        self.descriptor.format
    }

    pub fn usage(&self) -> TextureUsage {
        self.descriptor.usage
    }

    /// Get the mip level count.
    pub fn mip_level_count(&self) -> u32 {
        self.descriptor.mip_level_count
    }

    /// Size of one layer at mip level `mip`.
    pub fn mip_level_size(&self, mip: u32) -> (u32, u32) {
        self.descriptor.mip_level_size(mip)
    }

    /// Sampling policy applied when a program reads this texture.
    pub fn sampler(&self) -> &CpuSampler {
        &self.descriptor.sampler
    }

    /// Get the texture label, if set.
    pub fn label(&self) -> Option<&str> {
        self.descriptor.label.as_deref()
    }
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("size", &self.descriptor.size)
            .field("dimension", &self.descriptor.dimension)
            .field("mip_level_count", &self.descriptor.mip_level_count)
            .field("format", &self.descriptor.format)
            .field("label", &self.descriptor.label)
            .finish()
    }
}

// Ensure Texture is Send + Sync
static_assertions::assert_impl_all!(Texture: Send, Sync);
