//! Bake program catalog and WGSL validation.
//!
//! Programs are written in WGSL and checked with naga before any backend sees
//! them, so both backends report the same diagnostics for a broken source.
//!
//! | Program | Input | Target |
//! |---------|-------|--------|
//! | [`ProgramKind::EquirectToCube`] | 2D panorama | `Rgba16Float` cube face |
//! | [`ProgramKind::IrradianceConvolution`] | cube | `Rgba16Float` cube face |
//! | [`ProgramKind::SpecularPrefilter`] | cube | `Rgba16Float` cube face |
//! | [`ProgramKind::BrdfIntegration`] | none | `Rg16Float` 2D |

pub mod library;

use bytemuck::{Pod, Zeroable};
use prism_core::profiling::profile_scope;

use crate::error::GraphicsError;
use crate::types::{TextureDimension, TextureFormat};

/// Vertex stage entry point every bake program must export.
pub const VERTEX_ENTRY: &str = "vs_main";
/// Fragment stage entry point every bake program must export.
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// The fragment programs the baker runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    EquirectToCube,
    IrradianceConvolution,
    SpecularPrefilter,
    BrdfIntegration,
}

impl ProgramKind {
    pub const ALL: [ProgramKind; 4] = [
        ProgramKind::EquirectToCube,
        ProgramKind::IrradianceConvolution,
        ProgramKind::SpecularPrefilter,
        ProgramKind::BrdfIntegration,
    ];

    /// Name used in labels, logs and diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::EquirectToCube => "equirect_to_cube",
            Self::IrradianceConvolution => "irradiance_convolution",
            Self::SpecularPrefilter => "specular_prefilter",
            Self::BrdfIntegration => "brdf_integration",
        }
    }

    /// Complete WGSL source: shared prelude plus this program's fragment stage.
    pub fn source(self) -> String {
        let fragment = match self {
            Self::EquirectToCube => library::EQUIRECT_TO_CUBE_FRAGMENT,
            Self::IrradianceConvolution => library::IRRADIANCE_FRAGMENT,
            Self::SpecularPrefilter => library::SPECULAR_PREFILTER_FRAGMENT,
            Self::BrdfIntegration => library::BRDF_INTEGRATION_FRAGMENT,
        };
        library::compose(fragment)
    }

    /// Dimension of the sampled input at binding 1, if the program reads one.
    pub fn input_dimension(self) -> Option<TextureDimension> {
        match self {
            Self::EquirectToCube => Some(TextureDimension::D2),
            Self::IrradianceConvolution | Self::SpecularPrefilter => Some(TextureDimension::Cube),
            Self::BrdfIntegration => None,
        }
    }

    /// Format of the color attachment the program writes.
    pub fn target_format(self) -> TextureFormat {
        match self {
            Self::BrdfIntegration => TextureFormat::Rg16Float,
            _ => TextureFormat::Rgba16Float,
        }
    }
}

impl std::fmt::Display for ProgramKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Uniform block shared by all bake programs (`@group(0) @binding(0)`).
///
/// Layout matches `BakeUniforms` in `common.wgsl`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct BakeUniforms {
    /// Cube face index, `+X, -X, +Y, -Y, +Z, -Z`.
    pub face: u32,
    pub mip_level: u32,
    pub sample_count: u32,
    pub padding: u32,
    pub roughness: f32,
    /// Edge length of mip 0 of the sampled cube.
    pub source_resolution: f32,
    /// Irradiance integration step in radians.
    pub angular_step: f32,
    /// Edge length in pixels of the level being rendered.
    pub target_size: f32,
}

static_assertions::const_assert_eq!(std::mem::size_of::<BakeUniforms>(), 32);

impl BakeUniforms {
    /// Uniforms for rendering `face` of a `target_size`-wide level.
    pub fn for_face(face: u32, target_size: u32) -> Self {
        Self {
            face,
            target_size: target_size as f32,
            ..Default::default()
        }
    }

    pub fn with_mip_level(mut self, mip_level: u32) -> Self {
        self.mip_level = mip_level;
        self
    }

    pub fn with_sample_count(mut self, sample_count: u32) -> Self {
        self.sample_count = sample_count;
        self
    }

    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness;
        self
    }

    pub fn with_source_resolution(mut self, resolution: u32) -> Self {
        self.source_resolution = resolution as f32;
        self
    }

    pub fn with_angular_step(mut self, angular_step: f32) -> Self {
        self.angular_step = angular_step;
        self
    }
}

/// Parse and validate a bake program.
///
/// Parse and validation failures become [`GraphicsError::ShaderCompilation`]
/// carrying naga's rendered diagnostics. A module that is valid on its own but
/// lacks the `vs_main`/`fs_main` pair is a [`GraphicsError::ProgramLink`].
pub fn validate_program(program: &'static str, source: &str) -> Result<naga::Module, GraphicsError> {
    profile_scope!("validate_program");

    let module = naga::front::wgsl::parse_str(source).map_err(|e| {
        GraphicsError::ShaderCompilation {
            program,
            diagnostics: e.emit_to_string(source),
        }
    })?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::empty(),
    );
    validator
        .validate(&module)
        .map_err(|e| GraphicsError::ShaderCompilation {
            program,
            diagnostics: format!("{}", e.as_inner()),
        })?;

    for (entry, stage) in [
        (VERTEX_ENTRY, naga::ShaderStage::Vertex),
        (FRAGMENT_ENTRY, naga::ShaderStage::Fragment),
    ] {
        let found = module
            .entry_points
            .iter()
            .any(|ep| ep.name == entry && ep.stage == stage);
        if !found {
            return Err(GraphicsError::ProgramLink {
                program,
                message: format!("missing {stage:?} entry point '{entry}'"),
            });
        }
    }

    log::trace!("Validated program {program}");
    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::equirect(ProgramKind::EquirectToCube)]
    #[case::irradiance(ProgramKind::IrradianceConvolution)]
    #[case::prefilter(ProgramKind::SpecularPrefilter)]
    #[case::brdf(ProgramKind::BrdfIntegration)]
    fn builtin_programs_validate(#[case] kind: ProgramKind) {
        let module = validate_program(kind.name(), &kind.source()).unwrap();
        assert_eq!(module.entry_points.len(), 2);
    }

    #[test]
    fn downsample_program_validates() {
        validate_program("downsample", library::DOWNSAMPLE_SOURCE).unwrap();
    }

    #[test]
    fn syntax_error_is_compilation_failure() {
        let source = format!("{}\nfn fs_main( -> {{", library::COMMON_MODULE);
        let err = validate_program("broken", &source).unwrap_err();
        match err {
            GraphicsError::ShaderCompilation {
                program,
                diagnostics,
            } => {
                assert_eq!(program, "broken");
                assert!(!diagnostics.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn type_error_is_compilation_failure() {
        let source = library::compose(
            "@fragment\nfn fs_main() -> @location(0) vec4<f32> { let x: u32 = 1.5; return vec4<f32>(1.0); }",
        );
        let err = validate_program("typed", &source).unwrap_err();
        assert!(matches!(err, GraphicsError::ShaderCompilation { .. }));
    }

    #[test]
    fn missing_fragment_stage_is_link_failure() {
        let err = validate_program("vertex_only", library::COMMON_MODULE).unwrap_err();
        match err {
            GraphicsError::ProgramLink { program, message } => {
                assert_eq!(program, "vertex_only");
                assert!(message.contains(FRAGMENT_ENTRY));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn program_metadata() {
        assert_eq!(ProgramKind::BrdfIntegration.target_format(), TextureFormat::Rg16Float);
        assert_eq!(ProgramKind::BrdfIntegration.input_dimension(), None);
        assert_eq!(
            ProgramKind::SpecularPrefilter.input_dimension(),
            Some(TextureDimension::Cube)
        );
        assert_eq!(ProgramKind::EquirectToCube.to_string(), "equirect_to_cube");
    }

    #[test]
    fn uniforms_are_tightly_packed() {
        let uniforms = BakeUniforms::for_face(3, 128)
            .with_roughness(0.5)
            .with_sample_count(64);
        let bytes = bytemuck::bytes_of(&uniforms);
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[0..4], &3u32.to_ne_bytes());
        assert_eq!(&bytes[28..32], &128.0f32.to_ne_bytes());
    }
}
