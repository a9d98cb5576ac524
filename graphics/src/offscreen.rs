//! Offscreen rendering into one face and mip of a texture.
//!
//! [`OffscreenRenderer`] owns a scratch [`Framebuffer`]. Each draw attaches the
//! requested `(face, mip)` level as the only color attachment, binds it on the
//! device with a viewport, draws one procedurally generated triangle and
//! detaches again. The device's previous framebuffer binding and viewport are
//! restored when the draw returns, whether it succeeded or not.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use prism_core::profiling::profile_scope;

use crate::backend::FullscreenDraw;
use crate::device::{FramebufferBinding, GraphicsDevice, RenderState};
use crate::error::GraphicsError;
use crate::resources::{Program, Texture};
use crate::shader::BakeUniforms;
use crate::types::{TextureUsage, Viewport};

static NEXT_FRAMEBUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// The level a framebuffer currently renders into.
#[derive(Debug, Clone)]
pub struct ColorAttachment {
    pub texture: Arc<Texture>,
    pub face: u32,
    pub mip: u32,
}

/// Scratch framebuffer with at most one color attachment.
#[derive(Debug)]
pub struct Framebuffer {
    id: u64,
    attachment: Option<ColorAttachment>,
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framebuffer {
    pub fn new() -> Self {
        Self {
            id: NEXT_FRAMEBUFFER_ID.fetch_add(1, Ordering::Relaxed),
            attachment: None,
        }
    }

    /// Unique id used for the device binding.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn attachment(&self) -> Option<&ColorAttachment> {
        self.attachment.as_ref()
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    /// Attach `(face, mip)` of `texture` for a draw of `viewport_size` pixels.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::FramebufferIncomplete`] when the texture is not a
    /// render attachment, the level does not exist, or the viewport is empty
    /// or larger than the level. The framebuffer is left detached.
    pub fn attach(
        &mut self,
        texture: &Arc<Texture>,
        face: u32,
        mip: u32,
        viewport_size: (u32, u32),
    ) -> Result<(), GraphicsError> {
        self.attachment = None;
        let name = texture.descriptor().debug_name();

        if !texture.usage().contains(TextureUsage::RENDER_ATTACHMENT) {
            return Err(GraphicsError::FramebufferIncomplete(format!(
                "{name} is not a render attachment"
            )));
        }
        if face >= texture.layer_count() {
            return Err(GraphicsError::FramebufferIncomplete(format!(
                "{name} has {} layers, face {face} requested",
                texture.layer_count()
            )));
        }
        if mip >= texture.mip_level_count() {
            return Err(GraphicsError::FramebufferIncomplete(format!(
                "{name} has {} mips, mip {mip} requested",
                texture.mip_level_count()
            )));
        }

        let (level_width, level_height) = texture.mip_level_size(mip);
        let (width, height) = viewport_size;
        if width == 0 || height == 0 || width > level_width || height > level_height {
            return Err(GraphicsError::FramebufferIncomplete(format!(
                "viewport {width}x{height} does not fit {name} mip {mip} ({level_width}x{level_height})"
            )));
        }

        self.attachment = Some(ColorAttachment {
            texture: Arc::clone(texture),
            face,
            mip,
        });
        Ok(())
    }

    /// Drop the attachment, releasing this framebuffer's hold on the texture.
    pub fn detach(&mut self) {
        self.attachment = None;
    }
}

/// One offscreen draw request.
#[derive(Debug, Clone, Copy)]
pub struct OffscreenDraw<'a> {
    pub program: &'a Program,
    pub target: &'a Arc<Texture>,
    pub face: u32,
    pub mip: u32,
    pub viewport_size: (u32, u32),
    pub uniforms: &'a BakeUniforms,
    /// Sampled inputs in binding order.
    pub inputs: &'a [&'a Texture],
}

/// Restores the device state and detaches the framebuffer when dropped.
struct BindingScope<'a> {
    device: &'a GraphicsDevice,
    framebuffer: &'a mut Framebuffer,
    saved: RenderState,
}

impl<'a> BindingScope<'a> {
    fn enter(device: &'a GraphicsDevice, framebuffer: &'a mut Framebuffer) -> Self {
        let saved = device.render_state();
        Self {
            device,
            framebuffer,
            saved,
        }
    }
}

impl Drop for BindingScope<'_> {
    fn drop(&mut self) {
        self.framebuffer.detach();
        self.device.restore_render_state(self.saved);
    }
}

/// Drives fullscreen-triangle passes into cube faces and 2D levels.
#[derive(Debug, Default)]
pub struct OffscreenRenderer {
    framebuffer: Framebuffer,
    draw_count: u64,
}

impl OffscreenRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// Number of draws issued so far.
    pub fn draw_count(&self) -> u64 {
        self.draw_count
    }

    /// Inputs must match what the program binds: count, dimension and a
    /// filterable format, all on the target's device.
    fn check_inputs(
        device: &Arc<GraphicsDevice>,
        draw: &OffscreenDraw<'_>,
    ) -> Result<(), GraphicsError> {
        let kind = draw.program.kind();
        let expected = kind.input_dimension();
        let expected_count = usize::from(expected.is_some());
        if draw.inputs.len() != expected_count {
            return Err(GraphicsError::InvalidParameter(format!(
                "{kind} binds {expected_count} input(s), got {}",
                draw.inputs.len()
            )));
        }

        for input in draw.inputs {
            let name = input.descriptor().debug_name();
            if !Arc::ptr_eq(input.device(), device)
                || !input.usage().contains(TextureUsage::TEXTURE_BINDING)
            {
                return Err(GraphicsError::InvalidParameter(format!(
                    "input {name} cannot be sampled by {kind}"
                )));
            }
            if Some(input.dimension()) != expected {
                return Err(GraphicsError::InvalidParameter(format!(
                    "{kind} samples a {expected:?} input, {name} is {:?}",
                    input.dimension()
                )));
            }
            if !input.format().is_filterable() {
                return Err(GraphicsError::InvalidParameter(format!(
                    "input {name} has unfilterable format {:?}",
                    input.format()
                )));
            }
        }
        Ok(())
    }

    /// Render `draw.program` over the whole viewport of `(face, mip)`.
    ///
    /// # Errors
    ///
    /// - [`GraphicsError::FramebufferIncomplete`] for an invalid attachment or a
    ///   target whose format differs from what the program writes.
    /// - [`GraphicsError::InvalidParameter`] when the program, target and inputs
    ///   belong to different devices, or the inputs do not match the program's
    ///   bindings in count, dimension or filterability.
    ///
    /// The device render state is restored on every path.
    pub fn render_fullscreen_triangle_into(
        &mut self,
        draw: &OffscreenDraw<'_>,
    ) -> Result<(), GraphicsError> {
        profile_scope!("render_fullscreen_triangle_into");

        let device = draw.target.device();
        let scope = BindingScope::enter(device, &mut self.framebuffer);

        if !Arc::ptr_eq(draw.program.device(), device) {
            return Err(GraphicsError::InvalidParameter(format!(
                "program {} belongs to another device",
                draw.program.name()
            )));
        }
        Self::check_inputs(device, draw)?;

        let expected_format = draw.program.kind().target_format();
        if draw.target.format() != expected_format {
            return Err(GraphicsError::FramebufferIncomplete(format!(
                "{} writes {expected_format:?}, target {} is {:?}",
                draw.program.name(),
                draw.target.descriptor().debug_name(),
                draw.target.format()
            )));
        }

        scope
            .framebuffer
            .attach(draw.target, draw.face, draw.mip, draw.viewport_size)?;

        let viewport = Viewport::from_dimensions(draw.viewport_size.0, draw.viewport_size.1);
        device.bind_framebuffer(FramebufferBinding::Offscreen(scope.framebuffer.id()));
        device.set_viewport(viewport);

        log::trace!(
            "Offscreen draw {} -> {} face {} mip {}",
            draw.program.name(),
            draw.target.descriptor().debug_name(),
            draw.face,
            draw.mip
        );

        device.draw_fullscreen_triangle(&FullscreenDraw {
            program: draw.program,
            target: draw.target,
            face: draw.face,
            mip: draw.mip,
            viewport,
            uniforms: draw.uniforms,
            inputs: draw.inputs,
        })?;

        drop(scope);
        self.draw_count += 1;
        Ok(())
    }
}
