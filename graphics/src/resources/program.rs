//! Compiled bake program.

use std::sync::Arc;

use crate::backend::GpuProgram;
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::shader::ProgramKind;

/// A validated fullscreen program, ready to draw.
///
/// Created by [`GraphicsDevice::create_program`]. Keeps its device alive.
pub struct Program {
    device: Arc<GraphicsDevice>,
    kind: ProgramKind,
    gpu: GpuProgram,
}

impl Program {
    pub(crate) fn new(device: Arc<GraphicsDevice>, kind: ProgramKind, gpu: GpuProgram) -> Self {
        Self { device, kind, gpu }
    }

    /// Validate and build the built-in program `kind` on `device`.
    pub fn compile(device: &Arc<GraphicsDevice>, kind: ProgramKind) -> Result<Arc<Self>, GraphicsError> {
        device.create_program(kind)
    }

    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    pub fn kind(&self) -> ProgramKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Get the backend pipeline.
    pub fn gpu_handle(&self) -> &GpuProgram {
        &self.gpu
    }
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("kind", &self.kind)
            .field("gpu", &self.gpu)
            .finish()
    }
}

static_assertions::assert_impl_all!(Program: Send, Sync);
