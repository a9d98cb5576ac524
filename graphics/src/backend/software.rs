//! CPU reference backend.
//!
//! Runs each bake program as a loop over the texel centers covered by the
//! viewport, calling the same kernels the WGSL programs implement. Results are
//! rounded to the target format on store so readback matches a GPU target.

use std::sync::Arc;

use glam::{Vec2, Vec4};
use parking_lot::RwLock;
use prism_core::brdf::integrate_brdf;
use prism_core::cubemap::{CubeFace, face_uv_to_direction};
use prism_core::equirect::direction_to_uv;
use prism_core::ibl::{IrradianceParams, PrefilterParams, convolve_irradiance, prefilter_specular};
use prism_core::profiling::profile_scope;
use prism_core::sampler::CpuSampler;
use prism_core::texture::CpuTexture;

use super::{BackendType, FullscreenDraw, GpuBackend, GpuProgram, GpuTexture};
use crate::error::GraphicsError;
use crate::shader::{BakeUniforms, ProgramKind};
use crate::types::{TextureDescriptor, TextureFormat};

/// Backend that renders on the CPU.
#[derive(Debug, Default)]
pub struct SoftwareBackend;

impl SoftwareBackend {
    pub fn new() -> Self {
        Self
    }
}

fn software_storage(texture: &GpuTexture) -> Result<&Arc<RwLock<CpuTexture>>, GraphicsError> {
    match texture {
        GpuTexture::Software(storage) => Ok(storage),
        #[cfg(feature = "wgpu-backend")]
        _ => Err(GraphicsError::Internal(
            "software backend received a non-software texture".to_string(),
        )),
    }
}

/// Sampled input of a draw: texel storage plus its sampling policy.
struct BoundInput<'a> {
    texture: parking_lot::RwLockReadGuard<'a, CpuTexture>,
    sampler: &'a CpuSampler,
}

fn shade(kind: ProgramKind, uniforms: &BakeUniforms, input: Option<&BoundInput<'_>>, frag: Vec2) -> Vec4 {
    let face_direction = || {
        let face = CubeFace::from_index(uniforms.face).unwrap_or(CubeFace::PositiveX);
        let uv = frag / uniforms.target_size * 2.0 - Vec2::ONE;
        face_uv_to_direction(face, uv).normalize()
    };

    match (kind, input) {
        (ProgramKind::EquirectToCube, Some(input)) => {
            let uv = direction_to_uv(face_direction());
            input
                .texture
                .sample_2d(input.sampler, uv, 0.0)
                .truncate()
                .extend(1.0)
        }
        (ProgramKind::IrradianceConvolution, Some(input)) => {
            let params = IrradianceParams {
                angular_step: uniforms.angular_step,
                source_resolution: uniforms.source_resolution as u32,
            };
            convolve_irradiance(face_direction(), &params, |dir, lod| {
                input.texture.sample_cube(input.sampler, dir, lod).truncate()
            })
            .extend(1.0)
        }
        (ProgramKind::SpecularPrefilter, Some(input)) => {
            let params = PrefilterParams {
                roughness: uniforms.roughness,
                sample_count: uniforms.sample_count,
                source_resolution: uniforms.source_resolution as u32,
            };
            prefilter_specular(face_direction(), &params, |dir, lod| {
                input.texture.sample_cube(input.sampler, dir, lod).truncate()
            })
            .extend(1.0)
        }
        (ProgramKind::BrdfIntegration, _) => {
            let n_dot_v = frag.x / uniforms.target_size;
            let roughness = frag.y / uniforms.target_size;
            let lut = integrate_brdf(n_dot_v, roughness, uniforms.sample_count);
            Vec4::new(lut.x, lut.y, 0.0, 1.0)
        }
        // Unbound inputs sample as zero, like an empty binding.
        (_, None) => Vec4::new(0.0, 0.0, 0.0, 1.0),
    }
}

impl GpuBackend for SoftwareBackend {
    fn name(&self) -> &'static str {
        "Software"
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Software
    }

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<GpuTexture, GraphicsError> {
        let mut texture = CpuTexture::new(
            descriptor.dimension,
            descriptor.size.width,
            descriptor.size.height,
            descriptor.mip_level_count,
        );
        if let Some(label) = &descriptor.label {
            texture = texture.with_name(label.clone());
        }
        Ok(GpuTexture::Software(Arc::new(RwLock::new(texture))))
    }

    fn write_texture(
        &self,
        texture: &GpuTexture,
        descriptor: &TextureDescriptor,
        layer: u32,
        mip: u32,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        let texels = descriptor.format.decode_texels(data);
        let mut storage = software_storage(texture)?.write();
        let level = storage.level_mut(layer, mip).ok_or_else(|| {
            GraphicsError::InvalidParameter(format!("level ({layer}, {mip}) out of range"))
        })?;
        if texels.len() != level.len() {
            return Err(GraphicsError::InvalidParameter(format!(
                "expected {} texels, got {}",
                level.len(),
                texels.len()
            )));
        }
        level.copy_from_slice(&texels);
        Ok(())
    }

    fn read_texture(
        &self,
        texture: &GpuTexture,
        descriptor: &TextureDescriptor,
        layer: u32,
        mip: u32,
    ) -> Result<Vec<u8>, GraphicsError> {
        let storage = software_storage(texture)?.read();
        let level = storage.level(layer, mip).ok_or_else(|| {
            GraphicsError::InvalidParameter(format!("level ({layer}, {mip}) out of range"))
        })?;
        Ok(descriptor.format.encode_texels(level))
    }

    fn create_program(&self, kind: ProgramKind, _source: &str) -> Result<GpuProgram, GraphicsError> {
        Ok(GpuProgram::Software(kind))
    }

    fn draw_fullscreen_triangle(&self, draw: &FullscreenDraw<'_>) -> Result<(), GraphicsError> {
        profile_scope!("software_draw");

        let kind = match draw.program.gpu_handle() {
            GpuProgram::Software(kind) => *kind,
            #[cfg(feature = "wgpu-backend")]
            _ => {
                return Err(GraphicsError::Internal(
                    "software backend received a non-software program".to_string(),
                ));
            }
        };

        let target_descriptor = draw.target.descriptor();
        let (level_width, level_height) = target_descriptor.mip_level_size(draw.mip);
        let (x0, y0) = (draw.viewport.x.max(0.0) as u32, draw.viewport.y.max(0.0) as u32);
        let (width, height) = draw.viewport.pixel_size();
        let x1 = (x0 + width).min(level_width);
        let y1 = (y0 + height).min(level_height);

        // Shade into a scratch buffer while only the inputs are locked.
        let mut shaded = Vec::with_capacity(((x1 - x0.min(x1)) * (y1 - y0.min(y1))) as usize);
        {
            let input = match draw.inputs.first() {
                Some(texture) => Some(BoundInput {
                    texture: software_storage(texture.gpu_handle())?.read(),
                    sampler: &texture.descriptor().sampler,
                }),
                None => None,
            };
            for y in y0..y1 {
                for x in x0..x1 {
                    let frag = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                    shaded.push(shade(kind, draw.uniforms, input.as_ref(), frag));
                }
            }
        }

        let format = target_descriptor.format;
        let mut target = software_storage(draw.target.gpu_handle())?.write();
        let level = target.level_mut(draw.face, draw.mip).ok_or_else(|| {
            GraphicsError::InvalidParameter(format!(
                "level ({}, {}) out of range",
                draw.face, draw.mip
            ))
        })?;
        let mut values = shaded.into_iter();
        for y in y0..y1 {
            for x in x0..x1 {
                if let Some(value) = values.next() {
                    level[(y * level_width + x) as usize] = format.quantize(value);
                }
            }
        }
        Ok(())
    }

    fn generate_mipmaps(
        &self,
        texture: &GpuTexture,
        descriptor: &TextureDescriptor,
    ) -> Result<(), GraphicsError> {
        profile_scope!("software_generate_mipmaps");

        let mut storage = software_storage(texture)?.write();
        storage.generate_mipmaps();
        if descriptor.format != TextureFormat::Rgba32Float {
            for layer in 0..storage.layer_count() {
                for mip in 1..storage.mip_level_count() {
                    if let Some(level) = storage.level_mut(layer, mip) {
                        for texel in level.iter_mut() {
                            *texel = descriptor.format.quantize(*texel);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TextureUsage;

    fn cube_descriptor(size: u32, mips: u32) -> TextureDescriptor {
        TextureDescriptor::new_cube(
            size,
            TextureFormat::Rgba16Float,
            TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST | TextureUsage::COPY_SRC,
        )
        .with_mip_levels(mips)
    }

    #[test]
    fn write_then_read_level() {
        let backend = SoftwareBackend::new();
        let descriptor = cube_descriptor(4, 3);
        let texture = backend.create_texture(&descriptor).unwrap();

        let texels = vec![Vec4::new(0.5, 0.25, 2.0, 1.0); 4];
        let bytes = descriptor.format.encode_texels(&texels);
        backend.write_texture(&texture, &descriptor, 5, 1, &bytes).unwrap();

        assert_eq!(backend.read_texture(&texture, &descriptor, 5, 1).unwrap(), bytes);
        let untouched = backend.read_texture(&texture, &descriptor, 4, 1).unwrap();
        assert!(untouched.iter().all(|b| *b == 0));
    }

    #[test]
    fn write_rejects_wrong_size() {
        let backend = SoftwareBackend::new();
        let descriptor = cube_descriptor(4, 1);
        let texture = backend.create_texture(&descriptor).unwrap();
        let err = backend
            .write_texture(&texture, &descriptor, 0, 0, &[0u8; 8])
            .unwrap_err();
        assert!(matches!(err, GraphicsError::InvalidParameter(_)));
    }

    #[test]
    fn mipmaps_average_and_quantize() {
        let backend = SoftwareBackend::new();
        let descriptor = cube_descriptor(2, 2);
        let texture = backend.create_texture(&descriptor).unwrap();
        let texels = [
            Vec4::splat(0.1),
            Vec4::splat(0.2),
            Vec4::splat(0.3),
            Vec4::splat(0.4),
        ];
        let bytes = descriptor.format.encode_texels(&texels);
        for face in 0..6 {
            backend.write_texture(&texture, &descriptor, face, 0, &bytes).unwrap();
        }
        backend.generate_mipmaps(&texture, &descriptor).unwrap();

        let top = backend.read_texture(&texture, &descriptor, 2, 1).unwrap();
        let value = descriptor.format.decode_texels(&top)[0];
        assert!((value.x - 0.25).abs() < 1e-3);
        assert_eq!(value, descriptor.format.quantize(value));
    }

    #[test]
    fn brdf_fragment_matches_reference_kernel() {
        let uniforms = BakeUniforms::for_face(0, 16).with_sample_count(64);
        let value = shade(ProgramKind::BrdfIntegration, &uniforms, None, Vec2::new(8.5, 3.5));
        let expected = integrate_brdf(8.5 / 16.0, 3.5 / 16.0, 64);
        assert!((value.x - expected.x).abs() < 1e-6);
        assert!((value.y - expected.y).abs() < 1e-6);
    }

    #[test]
    fn offscreen_draw_shades_lut_texels() {
        use crate::allocator::TextureAllocator;
        use crate::device::GraphicsDevice;
        use crate::offscreen::{OffscreenDraw, OffscreenRenderer};
        use crate::resources::Program;

        let device = GraphicsDevice::with_backend(Arc::new(SoftwareBackend::new()));
        let program = Program::compile(&device, ProgramKind::BrdfIntegration).unwrap();
        let lut = TextureAllocator::new(Arc::clone(&device))
            .create_2d_texture(
                "lut",
                4,
                4,
                TextureFormat::Rg16Float,
                CpuSampler::bilinear_clamp(),
                None,
            )
            .unwrap();
        let uniforms = BakeUniforms::for_face(0, 4).with_sample_count(32);

        OffscreenRenderer::new()
            .render_fullscreen_triangle_into(&OffscreenDraw {
                program: &program,
                target: &lut,
                face: 0,
                mip: 0,
                viewport_size: (4, 4),
                uniforms: &uniforms,
                inputs: &[],
            })
            .unwrap();

        let texels = device.read_texture(&lut, 0, 0).unwrap();
        let expected = integrate_brdf(2.5 / 4.0, 1.5 / 4.0, 32);
        let texel = texels[4 + 2];
        assert!((texel.x - expected.x).abs() < 1e-3, "{texel:?} vs {expected:?}");
        assert!((texel.y - expected.y).abs() < 1e-3, "{texel:?} vs {expected:?}");
    }
}
