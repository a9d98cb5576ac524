//! wgpu GPU backend implementation.
//!
//! This backend uses wgpu for cross-platform GPU access, supporting
//! Vulkan, Metal, DX12, and WebGPU. Every draw is recorded into its own
//! encoder and submitted immediately; readback blocks until the queue drains.

pub(crate) mod conversion;
mod draw;
mod mipmaps;
mod resources;

use std::sync::Arc;

use crate::error::GraphicsError;
use crate::shader::ProgramKind;
use crate::types::TextureDescriptor;

use super::{BackendType, FullscreenDraw, GpuBackend, GpuProgram, GpuTexture};
use mipmaps::MipmapGenerator;

/// wgpu-based GPU backend.
pub struct WgpuBackend {
    #[allow(dead_code)]
    instance: wgpu::Instance,
    adapter: wgpu::Adapter,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    mipmaps: MipmapGenerator,
}

impl std::fmt::Debug for WgpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuBackend")
            .field("adapter", &self.adapter.get_info().name)
            .finish()
    }
}

impl WgpuBackend {
    /// Create a wgpu backend on the best available adapter.
    pub fn new() -> Result<Self, GraphicsError> {
        let mut flags = wgpu::InstanceFlags::default();
        if cfg!(debug_assertions) {
            flags |= wgpu::InstanceFlags::VALIDATION;
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags,
            backend_options: wgpu::BackendOptions::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
        });

        // Request adapter
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| {
            GraphicsError::InitializationFailed(format!("No compatible GPU adapter: {e}"))
        })?;

        log::info!("wgpu adapter: {:?}", adapter.get_info());

        // Request device
        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Prism Bake Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            trace: wgpu::Trace::Off,
        }))
        .map_err(|e| {
            GraphicsError::InitializationFailed(format!("Device creation failed: {e}"))
        })?;

        let mipmaps = MipmapGenerator::new(&device);

        Ok(Self {
            instance,
            adapter,
            device: Arc::new(device),
            queue: Arc::new(queue),
            mipmaps,
        })
    }

    /// Get the wgpu adapter.
    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    /// Get the wgpu device.
    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    /// Get the wgpu queue.
    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }

    /// Block until everything submitted so far has finished.
    fn wait_idle(&self, submission_index: wgpu::SubmissionIndex) -> Result<(), GraphicsError> {
        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: Some(submission_index),
                timeout: Some(std::time::Duration::from_secs(10)),
            })
            .map(|_| ())
            .map_err(|e| match e {
                wgpu::PollError::Timeout => GraphicsError::DeviceLost,
                other => GraphicsError::Internal(format!("poll failed: {other}")),
            })
    }
}

impl GpuBackend for WgpuBackend {
    fn name(&self) -> &'static str {
        "wgpu Backend"
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Wgpu
    }

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<GpuTexture, GraphicsError> {
        WgpuBackend::create_texture(self, descriptor)
    }

    fn write_texture(
        &self,
        texture: &GpuTexture,
        descriptor: &TextureDescriptor,
        layer: u32,
        mip: u32,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        WgpuBackend::write_texture(self, texture, descriptor, layer, mip, data)
    }

    fn read_texture(
        &self,
        texture: &GpuTexture,
        descriptor: &TextureDescriptor,
        layer: u32,
        mip: u32,
    ) -> Result<Vec<u8>, GraphicsError> {
        WgpuBackend::read_texture(self, texture, descriptor, layer, mip)
    }

    fn create_program(&self, kind: ProgramKind, source: &str) -> Result<GpuProgram, GraphicsError> {
        WgpuBackend::create_program(self, kind, source)
    }

    fn draw_fullscreen_triangle(&self, draw: &FullscreenDraw<'_>) -> Result<(), GraphicsError> {
        WgpuBackend::draw_fullscreen_triangle(self, draw)
    }

    fn generate_mipmaps(
        &self,
        texture: &GpuTexture,
        descriptor: &TextureDescriptor,
    ) -> Result<(), GraphicsError> {
        self.mipmaps
            .generate(&self.device, &self.queue, texture, descriptor)
    }
}
