//! The environment baker.
//!
//! A [`BakerContext`] compiles the bake programs once and owns the scratch
//! framebuffer. Each [`bake`](BakerContext::bake) call runs three stages in
//! order:
//!
//! 1. Remap the panorama onto the six faces of the environment cube, then
//!    build its mip chain.
//! 2. Convolve the environment cube into the diffuse irradiance cube.
//! 3. Prefilter the environment cube into one roughness band per mip.
//!
//! and finally uploads or renders the BRDF lookup table.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use prism_core::ibl::prefilter_roughness;
use prism_core::image::EnvironmentImage;
use prism_core::profiling::profile_scope;
use prism_core::texture::mip_chain_length;

use super::brdf_lut::{DEFAULT_BRDF_LUT_SIZE, read_brdf_lut_asset, upload_brdf_lut};
use super::config::BakeConfig;
use crate::allocator::TextureAllocator;
use crate::device::GraphicsDevice;
use crate::error::GraphicsError;
use crate::offscreen::{OffscreenDraw, OffscreenRenderer};
use crate::resources::{Program, Texture};
use crate::shader::{BakeUniforms, ProgramKind};
use crate::types::{CpuSampler, TextureFormat};

const CUBE_FACES: u32 = 6;

/// Where the BRDF lookup table comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum BrdfLutSource {
    /// A 128-byte header followed by `size * size` RG16F texels.
    Precomputed { path: PathBuf, size: u32 },
    /// Integrate the table on the device.
    Generated { size: u32, sample_count: u32 },
}

impl BrdfLutSource {
    /// The shipped 512x512 asset at `path`.
    pub fn precomputed(path: impl Into<PathBuf>) -> Self {
        Self::Precomputed {
            path: path.into(),
            size: DEFAULT_BRDF_LUT_SIZE,
        }
    }

    /// Integrate a `size` table with 1024 samples per texel.
    pub fn generated(size: u32) -> Self {
        Self::Generated {
            size,
            sample_count: 1024,
        }
    }

    /// Edge length of the resulting texture.
    pub fn size(&self) -> u32 {
        match self {
            Self::Precomputed { size, .. } | Self::Generated { size, .. } => *size,
        }
    }
}

/// Host-side LUT input, resolved before any GPU work.
enum LutInput {
    Payload(Vec<u8>),
    Generate { sample_count: u32 },
}

/// Output textures of one bake, owned by the caller.
#[derive(Debug, Clone)]
pub struct BakeTargets {
    /// Environment cube with a full mip chain; also the skybox.
    pub environment: Arc<Texture>,
    /// Single-mip diffuse irradiance cube.
    pub irradiance: Arc<Texture>,
    /// Specular cube, mip `i` = roughness `i / (mips - 1)`.
    pub prefiltered: Arc<Texture>,
    /// `Rg16Float` split-sum table, x = N.V, y = roughness.
    pub brdf_lut: Arc<Texture>,
}

/// Compiled programs, allocator and scratch framebuffer for baking.
#[derive(Debug)]
pub struct BakerContext {
    device: Arc<GraphicsDevice>,
    allocator: TextureAllocator,
    renderer: OffscreenRenderer,
    equirect_to_cube: Arc<Program>,
    irradiance: Arc<Program>,
    prefilter: Arc<Program>,
    brdf_integration: Arc<Program>,
}

impl BakerContext {
    /// Compile every bake program on `device`.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::ShaderCompilation`] or [`GraphicsError::ProgramLink`]
    /// if a program fails validation.
    pub fn new(device: Arc<GraphicsDevice>) -> Result<Self, GraphicsError> {
        profile_scope!("BakerContext::new");

        let equirect_to_cube = Program::compile(&device, ProgramKind::EquirectToCube)?;
        let irradiance = Program::compile(&device, ProgramKind::IrradianceConvolution)?;
        let prefilter = Program::compile(&device, ProgramKind::SpecularPrefilter)?;
        let brdf_integration = Program::compile(&device, ProgramKind::BrdfIntegration)?;

        log::info!("Baker ready on {} backend", device.backend_name());

        Ok(Self {
            allocator: TextureAllocator::new(Arc::clone(&device)),
            device,
            renderer: OffscreenRenderer::new(),
            equirect_to_cube,
            irradiance,
            prefilter,
            brdf_integration,
        })
    }

    pub fn device(&self) -> &Arc<GraphicsDevice> {
        &self.device
    }

    pub fn allocator(&self) -> &TextureAllocator {
        &self.allocator
    }

    pub fn renderer(&self) -> &OffscreenRenderer {
        &self.renderer
    }

    /// Load an HDR panorama from disk and bake it.
    ///
    /// The image and the LUT asset are both read before any texture is created.
    pub fn bake_file(
        &mut self,
        hdr_path: impl AsRef<Path>,
        lut: &BrdfLutSource,
        config: &BakeConfig,
    ) -> Result<BakeTargets, GraphicsError> {
        config.validate()?;
        let image = EnvironmentImage::load(hdr_path)?;
        let lut_input = Self::resolve_lut(lut)?;
        self.run(&image, lut.size(), lut_input, config)
    }

    /// Bake `image` into environment, irradiance and prefiltered cubes plus the LUT.
    ///
    /// # Errors
    ///
    /// - [`GraphicsError::InvalidParameter`] for an invalid `config`.
    /// - [`GraphicsError::Asset`] when the LUT asset cannot be read; no GPU
    ///   resource has been created at that point.
    /// - Any backend error from allocation or drawing.
    pub fn bake(
        &mut self,
        image: &EnvironmentImage,
        lut: &BrdfLutSource,
        config: &BakeConfig,
    ) -> Result<BakeTargets, GraphicsError> {
        config.validate()?;
        let lut_input = Self::resolve_lut(lut)?;
        self.run(image, lut.size(), lut_input, config)
    }

    fn resolve_lut(lut: &BrdfLutSource) -> Result<LutInput, GraphicsError> {
        match lut {
            BrdfLutSource::Precomputed { path, size } => {
                if *size == 0 {
                    return Err(GraphicsError::InvalidParameter(format!(
                        "precomputed LUT {} needs a non-zero size",
                        path.display()
                    )));
                }
                Ok(LutInput::Payload(read_brdf_lut_asset(path, *size)?))
            }
            BrdfLutSource::Generated { size, sample_count } => {
                if !size.is_power_of_two() || *sample_count == 0 {
                    return Err(GraphicsError::InvalidParameter(format!(
                        "generated LUT needs a power-of-two size and samples, got {size} / {sample_count}"
                    )));
                }
                Ok(LutInput::Generate {
                    sample_count: *sample_count,
                })
            }
        }
    }

    fn run(
        &mut self,
        image: &EnvironmentImage,
        lut_size: u32,
        lut_input: LutInput,
        config: &BakeConfig,
    ) -> Result<BakeTargets, GraphicsError> {
        profile_scope!("bake");
        log::info!(
            "Baking {}x{} environment: base {}, irradiance {}, prefilter {} x {} mips, {} samples",
            image.width(),
            image.height(),
            config.base_resolution,
            config.irradiance_resolution,
            config.prefilter_resolution,
            config.prefilter_mip_count,
            config.sample_count
        );

        let environment = self.render_environment(image, config)?;
        let irradiance = self.render_irradiance(&environment, config)?;
        let prefiltered = self.render_prefiltered(&environment, config)?;
        let brdf_lut = match lut_input {
            LutInput::Payload(payload) => upload_brdf_lut(&self.allocator, &payload, lut_size)?,
            LutInput::Generate { sample_count } => self.render_brdf_lut(lut_size, sample_count)?,
        };

        log::info!("Bake complete ({} draws so far)", self.renderer.draw_count());
        Ok(BakeTargets {
            environment,
            irradiance,
            prefiltered,
            brdf_lut,
        })
    }

    /// Stage 1: panorama to cube faces, then the environment mip chain.
    fn render_environment(
        &mut self,
        image: &EnvironmentImage,
        config: &BakeConfig,
    ) -> Result<Arc<Texture>, GraphicsError> {
        profile_scope!("bake_environment");
        log::info!("Stage 1: remapping panorama onto cube faces");

        let resolution = config.base_resolution;
        let environment = self.allocator.create_cube_texture(
            "environment",
            resolution,
            mip_chain_length(resolution, resolution),
            TextureFormat::Rgba16Float,
        )?;

        // Released at the end of this scope, before the convolutions run.
        let panorama = self.allocator.create_2d_texture(
            "environment_hdr",
            image.width(),
            image.height(),
            TextureFormat::Rgba16Float,
            CpuSampler::panorama(),
            Some(&image.to_rgba16f_bytes()),
        )?;

        for face in 0..CUBE_FACES {
            let uniforms = BakeUniforms::for_face(face, resolution);
            self.renderer.render_fullscreen_triangle_into(&OffscreenDraw {
                program: &self.equirect_to_cube,
                target: &environment,
                face,
                mip: 0,
                viewport_size: (resolution, resolution),
                uniforms: &uniforms,
                inputs: &[panorama.as_ref()],
            })?;
            log::debug!("environment face {face} written");
        }
        drop(panorama);

        self.device.generate_mipmaps(&environment)?;
        log::debug!(
            "environment mip chain generated ({} levels)",
            environment.mip_level_count()
        );
        Ok(environment)
    }

    /// Stage 2: cosine-weighted hemisphere integral per texel.
    fn render_irradiance(
        &mut self,
        environment: &Arc<Texture>,
        config: &BakeConfig,
    ) -> Result<Arc<Texture>, GraphicsError> {
        profile_scope!("bake_irradiance");
        log::info!(
            "Stage 2: irradiance convolution, step {} rad",
            config.irradiance_angular_step
        );

        let resolution = config.irradiance_resolution;
        let irradiance =
            self.allocator
                .create_cube_texture("irradiance", resolution, 1, TextureFormat::Rgba16Float)?;

        for face in 0..CUBE_FACES {
            let uniforms = BakeUniforms::for_face(face, resolution)
                .with_angular_step(config.irradiance_angular_step)
                .with_source_resolution(environment.width());
            self.renderer.render_fullscreen_triangle_into(&OffscreenDraw {
                program: &self.irradiance,
                target: &irradiance,
                face,
                mip: 0,
                viewport_size: (resolution, resolution),
                uniforms: &uniforms,
                inputs: &[environment.as_ref()],
            })?;
            log::debug!("irradiance face {face} written");
        }
        Ok(irradiance)
    }

    /// Stage 3: GGX prefilter, one roughness band per mip.
    fn render_prefiltered(
        &mut self,
        environment: &Arc<Texture>,
        config: &BakeConfig,
    ) -> Result<Arc<Texture>, GraphicsError> {
        profile_scope!("bake_prefilter");
        log::info!(
            "Stage 3: specular prefilter, {} mips x {} samples",
            config.prefilter_mip_count,
            config.sample_count
        );

        let mip_count = config.prefilter_mip_count;
        let prefiltered = self.allocator.create_cube_texture(
            "prefiltered",
            config.prefilter_resolution,
            mip_count,
            TextureFormat::Rgba16Float,
        )?;

        for mip in 0..mip_count {
            let roughness = prefilter_roughness(mip, mip_count);
            let size = config.prefilter_mip_resolution(mip);
            for face in 0..CUBE_FACES {
                let uniforms = BakeUniforms::for_face(face, size)
                    .with_mip_level(mip)
                    .with_roughness(roughness)
                    .with_sample_count(config.sample_count)
                    .with_source_resolution(environment.width());
                self.renderer.render_fullscreen_triangle_into(&OffscreenDraw {
                    program: &self.prefilter,
                    target: &prefiltered,
                    face,
                    mip,
                    viewport_size: (size, size),
                    uniforms: &uniforms,
                    inputs: &[environment.as_ref()],
                })?;
            }
            log::debug!("prefilter mip {mip} ({size}x{size}, roughness {roughness:.2}) written");
        }
        Ok(prefiltered)
    }

    /// Integrate the split-sum table into a fresh `Rg16Float` texture.
    fn render_brdf_lut(&mut self, size: u32, sample_count: u32) -> Result<Arc<Texture>, GraphicsError> {
        profile_scope!("bake_brdf_lut");
        log::info!("Integrating {size}x{size} BRDF LUT");

        let lut = self.allocator.create_2d_texture(
            "brdf_lut",
            size,
            size,
            TextureFormat::Rg16Float,
            CpuSampler::bilinear_clamp(),
            None,
        )?;
        let uniforms = BakeUniforms::for_face(0, size).with_sample_count(sample_count);
        self.renderer.render_fullscreen_triangle_into(&OffscreenDraw {
            program: &self.brdf_integration,
            target: &lut,
            face: 0,
            mip: 0,
            viewport_size: (size, size),
            uniforms: &uniforms,
            inputs: &[],
        })?;
        Ok(lut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendType;
    use crate::ibl::BRDF_LUT_HEADER_SIZE;

    #[test]
    fn lut_source_sizes() {
        assert_eq!(BrdfLutSource::precomputed("brdf.dds").size(), 512);
        assert_eq!(BrdfLutSource::generated(64).size(), 64);
    }

    #[test]
    fn invalid_config_creates_nothing() {
        let device = GraphicsDevice::new(BackendType::Software).unwrap();
        let mut baker = BakerContext::new(Arc::clone(&device)).unwrap();
        let image = EnvironmentImage::constant(4, 2, glam::Vec3::ONE);
        let config = BakeConfig::default().with_sample_count(0);

        let err = baker
            .bake(&image, &BrdfLutSource::generated(8), &config)
            .unwrap_err();
        assert!(matches!(err, GraphicsError::InvalidParameter(_)));
        assert_eq!(device.texture_count(), 0);
    }

    #[test]
    fn zero_sized_precomputed_lut_fails_before_drawing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brdf.dds");
        std::fs::write(&path, [0u8; BRDF_LUT_HEADER_SIZE]).unwrap();

        let device = GraphicsDevice::new(BackendType::Software).unwrap();
        let mut baker = BakerContext::new(Arc::clone(&device)).unwrap();
        let image = EnvironmentImage::constant(4, 2, glam::Vec3::ONE);
        let lut = BrdfLutSource::Precomputed { path, size: 0 };

        let err = baker.bake(&image, &lut, &BakeConfig::default()).unwrap_err();
        assert!(matches!(err, GraphicsError::InvalidParameter(_)), "{err}");
        assert_eq!(device.texture_count(), 0);
        assert_eq!(baker.renderer().draw_count(), 0);
    }

    #[test]
    fn programs_compiled_once() {
        let device = GraphicsDevice::new(BackendType::Software).unwrap();
        let baker = BakerContext::new(Arc::clone(&device)).unwrap();
        assert_eq!(device.program_count(), 4);
        assert_eq!(baker.renderer().draw_count(), 0);
    }
}
