//! Baked lighting handed to the forward-shading pass.

use std::path::Path;
use std::sync::Arc;

use super::config::BakeConfig;
use super::context::{BakeTargets, BakerContext, BrdfLutSource};
use crate::error::GraphicsError;
use crate::resources::Texture;

/// Skybox plus the three IBL inputs a PBR material samples.
///
/// Owns the textures of one bake for as long as the material lives.
#[derive(Debug, Clone)]
pub struct SkyboxMaterial {
    targets: BakeTargets,
}

impl SkyboxMaterial {
    /// Bake the panorama at `hdr_path` using the precomputed LUT at `brdf_lut_path`.
    pub fn from_files(
        baker: &mut BakerContext,
        hdr_path: impl AsRef<Path>,
        brdf_lut_path: impl AsRef<Path>,
        config: &BakeConfig,
    ) -> Result<Self, GraphicsError> {
        let lut = BrdfLutSource::precomputed(brdf_lut_path.as_ref());
        let targets = baker.bake_file(hdr_path, &lut, config)?;
        Ok(Self { targets })
    }

    /// Wrap textures baked elsewhere.
    pub fn from_targets(targets: BakeTargets) -> Self {
        Self { targets }
    }

    /// The environment cube drawn as the skybox.
    pub fn environment(&self) -> &Arc<Texture> {
        &self.targets.environment
    }

    pub fn irradiance(&self) -> &Arc<Texture> {
        &self.targets.irradiance
    }

    pub fn prefiltered(&self) -> &Arc<Texture> {
        &self.targets.prefiltered
    }

    pub fn brdf_lut(&self) -> &Arc<Texture> {
        &self.targets.brdf_lut
    }

    /// Highest mip of the prefiltered cube, i.e. the lod for roughness 1.
    pub fn max_reflection_lod(&self) -> f32 {
        self.targets.prefiltered.mip_level_count().saturating_sub(1) as f32
    }

    pub fn into_targets(self) -> BakeTargets {
        self.targets
    }
}
