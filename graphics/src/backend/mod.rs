//! GPU backend abstraction layer.
//!
//! Each backend implements the [`GpuBackend`] trait, which provides:
//! - Texture creation, upload and readback per `(layer, mip)` level
//! - Program creation from validated WGSL
//! - Fullscreen-triangle draws into one cube face or 2D level
//! - Box-filter mip generation
//!
//! # Available Backends
//!
//! - `software` (always built): CPU rasterizer running the reference kernels
//!   from `prism_core`, one fragment per texel center
//! - `wgpu-backend` (default feature): cross-platform GPU backend using wgpu

pub mod software;

#[cfg(feature = "wgpu-backend")]
pub mod wgpu_impl;

use std::sync::Arc;

use parking_lot::RwLock;
use prism_core::texture::CpuTexture;

use crate::error::GraphicsError;
use crate::resources::{Program, Texture};
use crate::shader::{BakeUniforms, ProgramKind};
use crate::types::{TextureDescriptor, Viewport};

/// Which backend a [`GraphicsDevice`](crate::GraphicsDevice) should run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackendType {
    /// CPU reference backend, always available.
    Software,
    /// wgpu on whatever native API the adapter offers.
    Wgpu,
    /// wgpu when an adapter is available, software otherwise.
    #[default]
    Auto,
}

/// Backend storage behind a [`Texture`].
#[allow(clippy::large_enum_variant)]
pub enum GpuTexture {
    /// CPU storage; one `Vec4` per texel, already rounded to the texture format.
    Software(Arc<RwLock<CpuTexture>>),
    /// wgpu texture with a view over every layer and mip, and the sampler
    /// built from the descriptor's sampling policy.
    #[cfg(feature = "wgpu-backend")]
    Wgpu {
        texture: wgpu::Texture,
        view: wgpu::TextureView,
        sampler: wgpu::Sampler,
    },
}

impl std::fmt::Debug for GpuTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Software(texture) => {
                let texture = texture.read();
                f.debug_struct("GpuTexture::Software")
                    .field("width", &texture.width())
                    .field("height", &texture.height())
                    .field("mip_level_count", &texture.mip_level_count())
                    .finish()
            }
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu { texture, view, .. } => f
                .debug_struct("GpuTexture::Wgpu")
                .field("texture", texture)
                .field("view", view)
                .finish_non_exhaustive(),
        }
    }
}

/// Backend state behind a [`Program`].
#[allow(clippy::large_enum_variant)]
pub enum GpuProgram {
    /// The software backend dispatches on the program kind.
    Software(ProgramKind),
    #[cfg(feature = "wgpu-backend")]
    Wgpu {
        pipeline: wgpu::RenderPipeline,
        bind_group_layout: wgpu::BindGroupLayout,
    },
}

impl std::fmt::Debug for GpuProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Software(kind) => f.debug_tuple("GpuProgram::Software").field(kind).finish(),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu { pipeline, .. } => f
                .debug_struct("GpuProgram::Wgpu")
                .field("pipeline", pipeline)
                .finish_non_exhaustive(),
        }
    }
}

/// One fullscreen-triangle draw into a single `(face, mip)` level.
///
/// Callers validate the attachment first; see
/// [`Framebuffer::attach`](crate::offscreen::Framebuffer::attach).
#[derive(Debug, Clone, Copy)]
pub struct FullscreenDraw<'a> {
    pub program: &'a Program,
    pub target: &'a Texture,
    pub face: u32,
    pub mip: u32,
    pub viewport: Viewport,
    pub uniforms: &'a BakeUniforms,
    /// Sampled inputs, bound from binding 1 on.
    pub inputs: &'a [&'a Texture],
}

/// Operations every backend provides to the device.
pub trait GpuBackend: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn backend_type(&self) -> BackendType;

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<GpuTexture, GraphicsError>;

    /// Upload one tightly packed level in the texture's format.
    fn write_texture(
        &self,
        texture: &GpuTexture,
        descriptor: &TextureDescriptor,
        layer: u32,
        mip: u32,
        data: &[u8],
    ) -> Result<(), GraphicsError>;

    /// Read back one level, tightly packed in the texture's format.
    fn read_texture(
        &self,
        texture: &GpuTexture,
        descriptor: &TextureDescriptor,
        layer: u32,
        mip: u32,
    ) -> Result<Vec<u8>, GraphicsError>;

    /// Build a program from a source that already passed validation.
    fn create_program(&self, kind: ProgramKind, source: &str) -> Result<GpuProgram, GraphicsError>;

    fn draw_fullscreen_triangle(&self, draw: &FullscreenDraw<'_>) -> Result<(), GraphicsError>;

    /// Rebuild mips `1..` of every layer from mip 0.
    fn generate_mipmaps(
        &self,
        texture: &GpuTexture,
        descriptor: &TextureDescriptor,
    ) -> Result<(), GraphicsError>;
}

/// Create the backend selected by `backend_type`.
///
/// # Errors
///
/// [`BackendType::Wgpu`] fails with [`GraphicsError::InitializationFailed`]
/// when no adapter is available or the feature is disabled.
/// [`BackendType::Auto`] never fails; it falls back to software.
pub fn create_backend(backend_type: BackendType) -> Result<Arc<dyn GpuBackend>, GraphicsError> {
    match backend_type {
        BackendType::Software => {
            log::info!("Using software backend");
            Ok(Arc::new(software::SoftwareBackend::new()))
        }
        BackendType::Wgpu => create_wgpu_backend(),
        BackendType::Auto => match create_wgpu_backend() {
            Ok(backend) => Ok(backend),
            Err(e) => {
                log::warn!("Failed to create wgpu backend: {e}; falling back to software");
                Ok(Arc::new(software::SoftwareBackend::new()))
            }
        },
    }
}

#[cfg(feature = "wgpu-backend")]
fn create_wgpu_backend() -> Result<Arc<dyn GpuBackend>, GraphicsError> {
    let backend = wgpu_impl::WgpuBackend::new()?;
    log::info!("Using wgpu backend");
    Ok(Arc::new(backend))
}

#[cfg(not(feature = "wgpu-backend"))]
fn create_wgpu_backend() -> Result<Arc<dyn GpuBackend>, GraphicsError> {
    Err(GraphicsError::InitializationFailed(
        "built without the wgpu-backend feature".to_string(),
    ))
}
