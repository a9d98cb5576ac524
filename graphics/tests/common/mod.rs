//! Common utilities for bake integration tests.
//!
//! Every test runs against each backend through `rstest` cases. Backends that
//! cannot be created on this machine (no adapter, feature disabled) are
//! skipped rather than failed.

// Each test binary uses a different subset of the helpers.
#![allow(dead_code)]

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use glam::{Vec3, Vec4};
use half::f16;
use prism_graphics::{BackendType, BakeConfig, BakerContext, GraphicsDevice, Texture};

/// Available backends for testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// CPU reference rasterizer, always available.
    Software,
    /// wgpu on whatever adapter the platform offers.
    Wgpu,
}

impl Backend {
    /// Check if this backend is compiled in.
    pub fn is_available(&self) -> bool {
        match self {
            Backend::Software => true,
            #[cfg(feature = "wgpu-backend")]
            Backend::Wgpu => true,
            #[cfg(not(feature = "wgpu-backend"))]
            Backend::Wgpu => false,
        }
    }

    pub fn backend_type(self) -> BackendType {
        match self {
            Backend::Software => BackendType::Software,
            Backend::Wgpu => BackendType::Wgpu,
        }
    }
}

/// Device plus baker for one backend.
pub struct TestContext {
    pub backend: Backend,
    pub device: Arc<GraphicsDevice>,
}

impl TestContext {
    /// Create a new test context for the given backend.
    ///
    /// Returns `None` if the backend is not available.
    pub fn new(backend: Backend) -> Option<Self> {
        let _ = env_logger::builder().is_test(true).try_init();

        if !backend.is_available() {
            return None;
        }
        let device = GraphicsDevice::new(backend.backend_type()).ok()?;
        Some(Self { backend, device })
    }

    pub fn baker(&self) -> BakerContext {
        BakerContext::new(Arc::clone(&self.device)).expect("Failed to create baker")
    }

    /// Read one level back as linear colors.
    pub fn read(&self, texture: &Texture, layer: u32, mip: u32) -> Vec<Vec4> {
        self.device
            .read_texture(texture, layer, mip)
            .expect("Failed to read texture")
    }
}

/// Small but complete configuration that keeps software bakes fast.
pub fn small_config() -> BakeConfig {
    BakeConfig::default()
        .with_base_resolution(64)
        .with_irradiance_resolution(4)
        .with_irradiance_angular_step(0.1)
        .with_prefilter_resolution(16)
        .with_prefilter_mip_count(5)
        .with_sample_count(64)
}

/// 4x2 panorama, red on the left half and blue on the right half.
pub fn red_blue_image() -> prism_core::image::EnvironmentImage {
    let red = Vec3::new(1.0, 0.0, 0.0);
    let blue = Vec3::new(0.0, 0.0, 1.0);
    let row = [red, red, blue, blue];
    let pixels = row.iter().chain(row.iter()).copied().collect();
    prism_core::image::EnvironmentImage::from_pixels(4, 2, pixels).expect("Failed to build image")
}

/// Write a LUT asset: zeroed header, then `size * size` RG16F texels of `(rg.0, rg.1)`.
pub fn write_lut_asset(path: &Path, size: u32, rg: (f32, f32), truncate_by: usize) {
    let mut bytes = vec![0u8; prism_graphics::ibl::BRDF_LUT_HEADER_SIZE];
    for _ in 0..size * size {
        bytes.extend_from_slice(&f16::from_f32(rg.0).to_le_bytes());
        bytes.extend_from_slice(&f16::from_f32(rg.1).to_le_bytes());
    }
    bytes.truncate(bytes.len() - truncate_by);

    let mut file = std::fs::File::create(path).expect("Failed to create LUT file");
    file.write_all(&bytes).expect("Failed to write LUT file");
}

/// Assert two colors agree in RGB within `tolerance`.
pub fn assert_rgb_near(actual: Vec4, expected: Vec4, tolerance: f32, context: &str) {
    let diff = (actual.truncate() - expected.truncate()).abs().max_element();
    assert!(
        diff <= tolerance,
        "{context}: expected {expected:?}, got {actual:?} (diff {diff})"
    );
}

/// Variance of the red channel over a set of texels.
pub fn red_variance(texels: &[Vec4]) -> f32 {
    let n = texels.len().max(1) as f32;
    let mean = texels.iter().map(|t| t.x).sum::<f32>() / n;
    texels.iter().map(|t| (t.x - mean).powi(2)).sum::<f32>() / n
}
