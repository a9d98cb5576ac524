//! Bake configuration.

use std::f32::consts::FRAC_PI_2;

use prism_core::ibl::MIN_IRRADIANCE_ANGULAR_STEP;
use prism_core::texture::mip_chain_length;

use crate::error::GraphicsError;

/// Resolutions and sample budgets for one environment bake.
///
/// Defaults reproduce the standard quality level: a 512 environment cube,
/// 32 irradiance, 128 prefiltered with 5 roughness bands.
#[derive(Debug, Clone, PartialEq)]
pub struct BakeConfig {
    /// Edge length of the environment cube. Higher values keep more detail in
    /// the skybox and in mip 0 of the prefiltered cube.
    pub base_resolution: u32,
    /// Edge length of the diffuse irradiance cube. Irradiance is very low
    /// frequency, so small sizes lose little.
    pub irradiance_resolution: u32,
    /// Edge length of mip 0 of the prefiltered specular cube.
    pub prefilter_resolution: u32,
    /// Number of roughness bands; mip `i` holds roughness `i / (count - 1)`.
    pub prefilter_mip_count: u32,
    /// GGX samples per prefiltered texel. More samples reduce noise in the
    /// rough mips at linear GPU cost.
    pub sample_count: u32,
    /// Irradiance integration step in radians. Halving it quarters the error
    /// and quadruples the cost.
    pub irradiance_angular_step: f32,
}

impl Default for BakeConfig {
    fn default() -> Self {
        Self {
            base_resolution: 512,
            irradiance_resolution: 32,
            prefilter_resolution: 128,
            prefilter_mip_count: 5,
            sample_count: 1024,
            irradiance_angular_step: 0.025,
        }
    }
}

impl BakeConfig {
    /// Higher resolution environment cube for close-up reflections.
    pub fn high_quality() -> Self {
        Self {
            base_resolution: 1024,
            ..Self::default()
        }
    }

    pub fn with_base_resolution(mut self, resolution: u32) -> Self {
        self.base_resolution = resolution;
        self
    }

    pub fn with_irradiance_resolution(mut self, resolution: u32) -> Self {
        self.irradiance_resolution = resolution;
        self
    }

    pub fn with_prefilter_resolution(mut self, resolution: u32) -> Self {
        self.prefilter_resolution = resolution;
        self
    }

    pub fn with_prefilter_mip_count(mut self, count: u32) -> Self {
        self.prefilter_mip_count = count;
        self
    }

    pub fn with_sample_count(mut self, count: u32) -> Self {
        self.sample_count = count;
        self
    }

    pub fn with_irradiance_angular_step(mut self, step: f32) -> Self {
        self.irradiance_angular_step = step;
        self
    }

    /// Edge length of prefilter mip `mip`.
    pub fn prefilter_mip_resolution(&self, mip: u32) -> u32 {
        (self.prefilter_resolution >> mip).max(1)
    }

    /// Check every field.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::InvalidParameter`] naming the first offending field.
    pub fn validate(&self) -> Result<(), GraphicsError> {
        for (name, value) in [
            ("base_resolution", self.base_resolution),
            ("irradiance_resolution", self.irradiance_resolution),
            ("prefilter_resolution", self.prefilter_resolution),
        ] {
            if !value.is_power_of_two() {
                return Err(GraphicsError::InvalidParameter(format!(
                    "{name} must be a non-zero power of two, got {value}"
                )));
            }
        }

        let max_mips = mip_chain_length(self.prefilter_resolution, self.prefilter_resolution);
        if self.prefilter_mip_count == 0 || self.prefilter_mip_count > max_mips {
            return Err(GraphicsError::InvalidParameter(format!(
                "prefilter_mip_count must be in 1..={max_mips}, got {}",
                self.prefilter_mip_count
            )));
        }

        if self.sample_count == 0 {
            return Err(GraphicsError::InvalidParameter(
                "sample_count must be positive".to_string(),
            ));
        }

        let step = self.irradiance_angular_step;
        if !(MIN_IRRADIANCE_ANGULAR_STEP..=FRAC_PI_2).contains(&step) {
            return Err(GraphicsError::InvalidParameter(format!(
                "irradiance_angular_step must be in [{MIN_IRRADIANCE_ANGULAR_STEP}, pi/2], got {step}"
            )));
        }

        Ok(())
    }
}
