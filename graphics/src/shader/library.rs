//! Built-in bake program sources.
//!
//! Every program is the shared prelude in `shaders/common.wgsl` followed by
//! one fragment stage. The prelude carries the uniform block, the fullscreen
//! triangle vertex stage and the lighting kernels.

/// Uniform block, vertex stage and shared kernels.
pub const COMMON_MODULE: &str = include_str!("../../shaders/common.wgsl");

/// Equirectangular panorama to cube face remap.
pub const EQUIRECT_TO_CUBE_FRAGMENT: &str = include_str!("../../shaders/equirect_to_cube.wgsl");

/// Diffuse irradiance convolution.
pub const IRRADIANCE_FRAGMENT: &str = include_str!("../../shaders/irradiance_convolution.wgsl");

/// GGX specular prefilter.
pub const SPECULAR_PREFILTER_FRAGMENT: &str = include_str!("../../shaders/specular_prefilter.wgsl");

/// Split-sum BRDF integration.
pub const BRDF_INTEGRATION_FRAGMENT: &str = include_str!("../../shaders/brdf_integration.wgsl");

/// Internal 2x2 downsample used for cube mip generation on the GPU.
pub const DOWNSAMPLE_SOURCE: &str = include_str!("../../shaders/downsample.wgsl");

/// Prepend the shared prelude to a fragment stage.
pub fn compose(fragment: &str) -> String {
    format!("{COMMON_MODULE}\n{fragment}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_keeps_prelude_first() {
        let source = compose(IRRADIANCE_FRAGMENT);
        assert!(source.starts_with(COMMON_MODULE));
        assert!(source.ends_with(IRRADIANCE_FRAGMENT));
    }

    #[test]
    fn fragments_do_not_redeclare_vertex_stage() {
        for fragment in [
            EQUIRECT_TO_CUBE_FRAGMENT,
            IRRADIANCE_FRAGMENT,
            SPECULAR_PREFILTER_FRAGMENT,
            BRDF_INTEGRATION_FRAGMENT,
        ] {
            assert!(!fragment.contains("fn vs_main"));
            assert!(fragment.contains("fn fs_main"));
        }
    }

    #[test]
    fn irradiance_step_floor_matches_cpu_kernel() {
        let clamp = "max(params.angular_step, ";
        let start = IRRADIANCE_FRAGMENT.find(clamp).unwrap() + clamp.len();
        let literal = &IRRADIANCE_FRAGMENT[start..];
        let literal = &literal[..literal.find(')').unwrap()];
        assert_eq!(
            literal.parse::<f32>().unwrap(),
            prism_core::ibl::MIN_IRRADIANCE_ANGULAR_STEP
        );
    }
}
