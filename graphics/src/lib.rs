//! # Prism Graphics
//!
//! Offscreen precomputation of image-based lighting.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`GraphicsDevice`] - Resource creation and render state over a [`backend`]
//! - [`TextureAllocator`] - Cube and 2D textures with bake sampler policies
//! - [`OffscreenRenderer`] - Fullscreen-triangle draws into one face and mip
//! - [`shader`] - The WGSL bake programs and their uniform block
//! - [`ibl`] - The environment baker and the BRDF lookup table loader
//! - Software (CPU reference) and wgpu backends
//!
//! ## Example
//!
//! ```ignore
//! use prism_graphics::{BackendType, GraphicsDevice};
//! use prism_graphics::ibl::{BakeConfig, BakerContext, BrdfLutSource};
//!
//! let device = GraphicsDevice::new(BackendType::Auto)?;
//! let mut baker = BakerContext::new(device)?;
//! let targets = baker.bake_file("env.hdr", &BrdfLutSource::generated(128), &BakeConfig::default())?;
//! ```

pub mod allocator;
pub mod backend;
pub mod device;
pub mod error;
pub mod ibl;
pub mod offscreen;
pub mod resources;
pub mod shader;
pub mod types;

// Re-export main types for convenience
pub use allocator::TextureAllocator;
pub use backend::{BackendType, GpuBackend};
pub use device::{DeviceCapabilities, FramebufferBinding, GraphicsDevice, RenderState};
pub use error::GraphicsError;
pub use ibl::{BakeConfig, BakeTargets, BakerContext, BrdfLutSource, SkyboxMaterial};
pub use offscreen::{Framebuffer, OffscreenDraw, OffscreenRenderer};
pub use resources::{Program, Texture};
pub use shader::{BakeUniforms, ProgramKind};
pub use types::{
    AddressMode, CpuSampler, Extent3d, FilterMode, TextureDescriptor, TextureDimension,
    TextureFormat, TextureUsage, Viewport,
};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library version once at startup.
pub fn init() {
    log::info!("Prism Graphics v{} initialized", VERSION);
}
