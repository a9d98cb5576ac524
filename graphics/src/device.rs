//! Graphics device.
//!
//! The [`GraphicsDevice`] is the main interface for creating GPU resources and
//! issuing bake draws. It owns one backend and the bound render state
//! (framebuffer and viewport) that offscreen passes save and restore.

use std::sync::{Arc, RwLock, Weak};

use glam::Vec4;
use parking_lot::Mutex;
use prism_core::texture::{CpuTexture, mip_chain_length};

use crate::backend::{BackendType, FullscreenDraw, GpuBackend, create_backend};
use crate::error::GraphicsError;
use crate::resources::{Program, Texture};
use crate::shader::{ProgramKind, validate_program};
use crate::types::{TextureDescriptor, TextureDimension, TextureUsage, Viewport};

/// Capabilities of a graphics device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceCapabilities {
    /// Maximum texture dimension.
    pub max_texture_dimension: u32,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            max_texture_dimension: 8192,
        }
    }
}

/// Framebuffer that draws currently land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FramebufferBinding {
    /// The presentation target; draws are discarded.
    #[default]
    Default,
    /// An offscreen framebuffer, by id.
    Offscreen(u64),
}

/// Bound framebuffer and viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderState {
    pub framebuffer: FramebufferBinding,
    pub viewport: Viewport,
}

/// A graphics device for creating GPU resources.
///
/// # Thread Safety
///
/// `GraphicsDevice` is `Send + Sync` and can be safely shared across threads.
/// Resource creation uses interior mutability; the render state is a single
/// mutex-guarded value, so bake passes that bind framebuffers must not run
/// concurrently on one device.
///
/// # Example
///
/// ```ignore
/// let device = GraphicsDevice::new(BackendType::Auto)?;
/// let texture = device.create_texture(&TextureDescriptor::new_cube(
///     512,
///     TextureFormat::Rgba16Float,
///     TextureUsage::TEXTURE_BINDING | TextureUsage::RENDER_ATTACHMENT,
/// ))?;
/// ```
pub struct GraphicsDevice {
    backend: Arc<dyn GpuBackend>,
    capabilities: DeviceCapabilities,
    render_state: Mutex<RenderState>,
    // Track allocated resources (weak references for cleanup/debugging)
    textures: RwLock<Vec<Weak<Texture>>>,
    programs: RwLock<Vec<Weak<Program>>>,
}

impl GraphicsDevice {
    /// Create a device on the requested backend.
    ///
    /// # Errors
    ///
    /// See [`create_backend`].
    pub fn new(backend_type: BackendType) -> Result<Arc<Self>, GraphicsError> {
        Ok(Self::with_backend(create_backend(backend_type)?))
    }

    /// Create a device on an existing backend.
    pub fn with_backend(backend: Arc<dyn GpuBackend>) -> Arc<Self> {
        log::debug!("GraphicsDevice: created on {} backend", backend.name());
        Arc::new(Self {
            backend,
            capabilities: DeviceCapabilities::default(),
            render_state: Mutex::new(RenderState::default()),
            textures: RwLock::new(Vec::new()),
            programs: RwLock::new(Vec::new()),
        })
    }

    /// Get the backend name.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Get the concrete backend type (never [`BackendType::Auto`]).
    pub fn backend_type(&self) -> BackendType {
        self.backend.backend_type()
    }

    /// Get the device capabilities.
    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    /// Create a texture.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::InvalidParameter`] for zero or oversized
    /// dimensions, non-square cube faces, or a mip count outside
    /// `1..=mip_chain_length`.
    pub fn create_texture(
        self: &Arc<Self>,
        descriptor: &TextureDescriptor,
    ) -> Result<Arc<Texture>, GraphicsError> {
        // Validate
        let max_dim = self.capabilities.max_texture_dimension;
        let (width, height) = (descriptor.size.width, descriptor.size.height);
        if width > max_dim || height > max_dim {
            return Err(GraphicsError::InvalidParameter(format!(
                "texture dimension exceeds maximum {max_dim}"
            )));
        }

        if width == 0 || height == 0 {
            return Err(GraphicsError::InvalidParameter(
                "texture dimensions cannot be zero".to_string(),
            ));
        }

        if descriptor.dimension == TextureDimension::Cube && width != height {
            return Err(GraphicsError::InvalidParameter(format!(
                "cube faces must be square, got {width}x{height}"
            )));
        }

        let max_mips = mip_chain_length(width, height);
        if descriptor.mip_level_count == 0 || descriptor.mip_level_count > max_mips {
            return Err(GraphicsError::InvalidParameter(format!(
                "mip level count {} outside 1..={max_mips} for {width}x{height}",
                descriptor.mip_level_count
            )));
        }

        // Create the texture
        let gpu = self.backend.create_texture(descriptor)?;
        let texture = Arc::new(Texture::new(Arc::clone(self), descriptor.clone(), gpu));

        // Track it
        if let Ok(mut textures) = self.textures.write() {
            textures.push(Arc::downgrade(&texture));
        }

        log::trace!(
            "GraphicsDevice: created texture {}, size={}x{}, mips={}",
            descriptor.debug_name(),
            width,
            height,
            descriptor.mip_level_count
        );

        Ok(texture)
    }

    fn check_level(texture: &Texture, layer: u32, mip: u32) -> Result<(), GraphicsError> {
        if layer >= texture.layer_count() || mip >= texture.mip_level_count() {
            return Err(GraphicsError::InvalidParameter(format!(
                "level (layer {layer}, mip {mip}) out of range for {}",
                texture.descriptor().debug_name()
            )));
        }
        Ok(())
    }

    /// Upload one tightly packed `(layer, mip)` level.
    ///
    /// # Errors
    ///
    /// Returns [`GraphicsError::InvalidParameter`] if the texture lacks
    /// `COPY_DST`, the level is out of range or `data` has the wrong length.
    pub fn write_texture(
        &self,
        texture: &Texture,
        layer: u32,
        mip: u32,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        let descriptor = texture.descriptor();
        if !descriptor.usage.contains(TextureUsage::COPY_DST) {
            return Err(GraphicsError::InvalidParameter(format!(
                "texture {} is not a copy destination",
                descriptor.debug_name()
            )));
        }
        Self::check_level(texture, layer, mip)?;

        let expected = descriptor.level_byte_size(mip);
        if data.len() != expected {
            return Err(GraphicsError::InvalidParameter(format!(
                "expected {expected} bytes for {} mip {mip}, got {}",
                descriptor.debug_name(),
                data.len()
            )));
        }

        self.backend
            .write_texture(texture.gpu_handle(), descriptor, layer, mip, data)
    }

    /// Read back one `(layer, mip)` level as linear colors, row 0 first.
    ///
    /// Channels the format does not store read back as `0` (color) and `1` (alpha).
    pub fn read_texture(
        &self,
        texture: &Texture,
        layer: u32,
        mip: u32,
    ) -> Result<Vec<Vec4>, GraphicsError> {
        let descriptor = texture.descriptor();
        if !descriptor.usage.contains(TextureUsage::COPY_SRC) {
            return Err(GraphicsError::InvalidParameter(format!(
                "texture {} is not a copy source",
                descriptor.debug_name()
            )));
        }
        Self::check_level(texture, layer, mip)?;

        let bytes = self
            .backend
            .read_texture(texture.gpu_handle(), descriptor, layer, mip)?;
        Ok(descriptor.format.decode_texels(&bytes))
    }

    /// Read back every level of a texture into host memory.
    pub fn download_texture(&self, texture: &Texture) -> Result<CpuTexture, GraphicsError> {
        let mut cpu = CpuTexture::new(
            texture.dimension(),
            texture.width(),
            texture.height(),
            texture.mip_level_count(),
        );
        if let Some(label) = texture.label() {
            cpu = cpu.with_name(label);
        }

        for layer in 0..texture.layer_count() {
            for mip in 0..texture.mip_level_count() {
                let texels = self.read_texture(texture, layer, mip)?;
                if let Some(level) = cpu.level_mut(layer, mip) {
                    level.copy_from_slice(&texels);
                }
            }
        }
        Ok(cpu)
    }

    /// Rebuild mips `1..` of every layer from mip 0.
    pub fn generate_mipmaps(&self, texture: &Texture) -> Result<(), GraphicsError> {
        if texture.mip_level_count() <= 1 {
            return Ok(());
        }
        self.backend
            .generate_mipmaps(texture.gpu_handle(), texture.descriptor())
    }

    /// Compile one of the built-in bake programs.
    pub fn create_program(self: &Arc<Self>, kind: ProgramKind) -> Result<Arc<Program>, GraphicsError> {
        self.create_program_from_source(kind, &kind.source())
    }

    /// Compile `source` in place of the built-in source for `kind`.
    ///
    /// The source must keep the binding layout of `kind`.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::ShaderCompilation`] or [`GraphicsError::ProgramLink`]
    /// when validation fails.
    pub fn create_program_from_source(
        self: &Arc<Self>,
        kind: ProgramKind,
        source: &str,
    ) -> Result<Arc<Program>, GraphicsError> {
        validate_program(kind.name(), source)?;
        let gpu = self.backend.create_program(kind, source)?;
        let program = Arc::new(Program::new(Arc::clone(self), kind, gpu));

        if let Ok(mut programs) = self.programs.write() {
            programs.push(Arc::downgrade(&program));
        }

        log::debug!("GraphicsDevice: compiled program {}", kind.name());
        Ok(program)
    }

    /// Issue one fullscreen-triangle draw. The attachment must be validated.
    pub(crate) fn draw_fullscreen_triangle(
        &self,
        draw: &FullscreenDraw<'_>,
    ) -> Result<(), GraphicsError> {
        self.backend.draw_fullscreen_triangle(draw)
    }

    /// Snapshot of the bound framebuffer and viewport.
    pub fn render_state(&self) -> RenderState {
        *self.render_state.lock()
    }

    pub fn set_viewport(&self, viewport: Viewport) {
        self.render_state.lock().viewport = viewport;
    }

    pub fn bind_framebuffer(&self, framebuffer: FramebufferBinding) {
        self.render_state.lock().framebuffer = framebuffer;
    }

    /// Restore a snapshot taken with [`render_state`](Self::render_state).
    pub fn restore_render_state(&self, state: RenderState) {
        *self.render_state.lock() = state;
    }

    /// Get the number of live textures created by this device.
    pub fn texture_count(&self) -> usize {
        self.textures
            .read()
            .map(|t| t.iter().filter(|w| w.strong_count() > 0).count())
            .unwrap_or(0)
    }

    /// Get the number of live programs created by this device.
    pub fn program_count(&self) -> usize {
        self.programs
            .read()
            .map(|p| p.iter().filter(|w| w.strong_count() > 0).count())
            .unwrap_or(0)
    }

    /// Clean up dead weak references to released resources.
    pub fn cleanup_dead_resources(&self) {
        if let Ok(mut textures) = self.textures.write() {
            textures.retain(|w| w.strong_count() > 0);
        }
        if let Ok(mut programs) = self.programs.write() {
            programs.retain(|w| w.strong_count() > 0);
        }
    }
}

impl std::fmt::Debug for GraphicsDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphicsDevice")
            .field("backend", &self.backend.name())
            .field("capabilities", &self.capabilities)
            .field("render_state", &*self.render_state.lock())
            .finish()
    }
}

// Ensure GraphicsDevice is Send + Sync
static_assertions::assert_impl_all!(GraphicsDevice: Send, Sync);
