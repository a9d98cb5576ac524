//! End-to-end bake tests.
//!
//! Each test bakes a small synthetic environment and reads the results back.
//! Cases run on the software backend and, when an adapter exists, on wgpu.
//!
//! ```bash
//! cargo test -p prism-graphics --test bake_tests
//! ```

mod common;

use std::sync::Arc;

use glam::{Vec3, Vec4};
use rstest::rstest;

use common::{Backend, TestContext, assert_rgb_near, red_blue_image, red_variance, small_config};
use prism_core::cubemap::{CubeFace, texel_direction};
use prism_core::image::EnvironmentImage;
use prism_graphics::{BrdfLutSource, GraphicsError, TextureFormat};

/// Tiny generated LUT so the bakes stay independent of asset files.
fn lut() -> BrdfLutSource {
    BrdfLutSource::Generated {
        size: 8,
        sample_count: 16,
    }
}

// ============================================================================
// Orientation
// ============================================================================

/// The left half of the panorama lands on -Z, the right half on +Z.
#[rstest]
#[case::software(Backend::Software)]
#[case::wgpu(Backend::Wgpu)]
fn test_red_blue_panorama_orientation(#[case] backend: Backend) {
    let Some(ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };
    let mut baker = ctx.baker();
    let targets = baker
        .bake(&red_blue_image(), &lut(), &small_config())
        .expect("Bake failed");

    let red = Vec4::new(1.0, 0.0, 0.0, 1.0);
    let blue = Vec4::new(0.0, 0.0, 1.0, 1.0);
    let size = targets.environment.width();
    let center = (size / 2) * size + size / 2;

    let negative_z = ctx.read(&targets.environment, CubeFace::NegativeZ.index(), 0);
    let positive_z = ctx.read(&targets.environment, CubeFace::PositiveZ.index(), 0);

    assert_rgb_near(negative_z[center as usize], red, 1e-3, "-Z center");
    assert_rgb_near(positive_z[center as usize], blue, 1e-3, "+Z center");

    // Whole faces, not just the centers.
    assert!(negative_z.iter().all(|t| t.x > 0.99 && t.z < 0.01));
    assert!(positive_z.iter().all(|t| t.z > 0.99 && t.x < 0.01));
}

// ============================================================================
// Irradiance
// ============================================================================

/// A constant environment irradiates every normal with its own radiance.
#[rstest]
#[case::software(Backend::Software)]
#[case::wgpu(Backend::Wgpu)]
fn test_constant_environment_energy(#[case] backend: Backend) {
    let Some(ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };
    let color = Vec3::new(0.5, 0.25, 1.0);
    let image = EnvironmentImage::constant(16, 8, color);
    let mut baker = ctx.baker();
    let targets = baker.bake(&image, &lut(), &small_config()).expect("Bake failed");

    for face in CubeFace::ALL {
        for texel in ctx.read(&targets.irradiance, face.index(), 0) {
            assert_rgb_near(texel, color.extend(1.0), 0.01, "irradiance");
        }
    }
    for mip in 0..targets.prefiltered.mip_level_count() {
        for texel in ctx.read(&targets.prefiltered, CubeFace::PositiveY.index(), mip) {
            assert_rgb_near(texel, color.extend(1.0), 0.01, "prefiltered");
        }
    }
}

// ============================================================================
// Determinism
// ============================================================================

#[rstest]
#[case::software(Backend::Software)]
#[case::wgpu(Backend::Wgpu)]
fn test_bake_is_idempotent(#[case] backend: Backend) {
    let Some(ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };
    let mut baker = ctx.baker();
    let config = small_config();
    let first = baker.bake(&red_blue_image(), &lut(), &config).expect("Bake failed");
    let second = baker.bake(&red_blue_image(), &lut(), &config).expect("Bake failed");

    for (a, b) in [
        (&first.environment, &second.environment),
        (&first.irradiance, &second.irradiance),
        (&first.prefiltered, &second.prefiltered),
        (&first.brdf_lut, &second.brdf_lut),
    ] {
        let a = ctx.device.download_texture(a).expect("Download failed");
        let b = ctx.device.download_texture(b).expect("Download failed");
        for layer in 0..a.layer_count() {
            for mip in 0..a.mip_level_count() {
                assert_eq!(a.level(layer, mip), b.level(layer, mip));
            }
        }
    }
}

// ============================================================================
// Prefilter
// ============================================================================

/// Roughness 0 reproduces the environment along each texel normal.
#[rstest]
#[case::software(Backend::Software, 1e-3)]
#[case::wgpu(Backend::Wgpu, 0.02)]
fn test_prefilter_mip0_matches_environment(#[case] backend: Backend, #[case] tolerance: f32) {
    let Some(ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };
    let mut baker = ctx.baker();
    let targets = baker
        .bake(&red_blue_image(), &lut(), &small_config())
        .expect("Bake failed");

    let environment = ctx
        .device
        .download_texture(&targets.environment)
        .expect("Download failed");
    let sampler = targets.environment.sampler().clone();
    let size = targets.prefiltered.width();

    for face in CubeFace::ALL {
        let texels = ctx.read(&targets.prefiltered, face.index(), 0);
        for y in 0..size {
            for x in 0..size {
                let n = texel_direction(face, x, y, size).normalize();
                let expected = environment.sample_cube(&sampler, n, 0.0);
                let actual = texels[(y * size + x) as usize];
                assert_rgb_near(actual, expected, tolerance, &format!("{face:?} ({x}, {y})"));
            }
        }
    }
}

/// Rougher mips are blurrier.
#[rstest]
#[case::software(Backend::Software)]
#[case::wgpu(Backend::Wgpu)]
fn test_prefilter_variance_non_increasing(#[case] backend: Backend) {
    let Some(ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };
    let mut baker = ctx.baker();
    let targets = baker
        .bake(&red_blue_image(), &lut(), &small_config())
        .expect("Bake failed");

    let variances: Vec<f32> = (0..targets.prefiltered.mip_level_count())
        .map(|mip| {
            let texels: Vec<Vec4> = CubeFace::ALL
                .iter()
                .flat_map(|face| ctx.read(&targets.prefiltered, face.index(), mip))
                .collect();
            red_variance(&texels)
        })
        .collect();

    assert!(variances[0] > 0.1, "mip 0 should be sharp: {variances:?}");
    for pair in variances.windows(2) {
        assert!(pair[1] <= pair[0] + 1e-3, "variance increased: {variances:?}");
    }
}

// ============================================================================
// Resources
// ============================================================================

#[rstest]
#[case::software(Backend::Software)]
#[case::wgpu(Backend::Wgpu)]
fn test_bake_targets_layout(#[case] backend: Backend) {
    let Some(ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };
    let mut baker = ctx.baker();
    let config = small_config();
    let targets = baker.bake(&red_blue_image(), &lut(), &config).expect("Bake failed");

    assert_eq!(targets.environment.width(), 64);
    assert_eq!(targets.environment.mip_level_count(), 7);
    assert_eq!(targets.irradiance.width(), 4);
    assert_eq!(targets.irradiance.mip_level_count(), 1);
    assert_eq!(targets.prefiltered.width(), 16);
    assert_eq!(targets.prefiltered.mip_level_count(), 5);
    assert_eq!(targets.brdf_lut.format(), TextureFormat::Rg16Float);
    assert_eq!(targets.brdf_lut.width(), 8);

    // Only the four outputs outlive the bake.
    assert_eq!(ctx.device.texture_count(), 4);
    assert!(!baker.renderer().framebuffer().is_attached());
    assert_eq!(baker.renderer().draw_count(), 6 + 6 + 5 * 6 + 1);

    drop(targets);
    assert_eq!(ctx.device.texture_count(), 0);
}

/// A missing LUT fails before any texture exists.
#[rstest]
#[case::software(Backend::Software)]
#[case::wgpu(Backend::Wgpu)]
fn test_missing_lut_fails_before_allocation(#[case] backend: Backend) {
    let Some(ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut baker = ctx.baker();

    let err = baker
        .bake(
            &red_blue_image(),
            &BrdfLutSource::precomputed(dir.path().join("missing.dds")),
            &small_config(),
        )
        .unwrap_err();

    assert!(matches!(
        err,
        GraphicsError::Asset(prism_core::AssetError::NotFound { .. })
    ));
    assert_eq!(ctx.device.texture_count(), 0);
    assert_eq!(baker.renderer().draw_count(), 0);
}

/// A missing panorama fails before any texture exists.
#[rstest]
#[case::software(Backend::Software)]
fn test_missing_panorama_fails_before_allocation(#[case] backend: Backend) {
    let Some(ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let mut baker = ctx.baker();

    let err = baker
        .bake_file(dir.path().join("missing.hdr"), &lut(), &small_config())
        .unwrap_err();

    assert!(matches!(err, GraphicsError::Asset(_)));
    assert_eq!(ctx.device.texture_count(), 0);
}

/// Bakes against the same device share nothing but the device.
#[rstest]
#[case::software(Backend::Software)]
fn test_independent_bakers(#[case] backend: Backend) {
    let Some(ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };
    let mut first = ctx.baker();
    let mut second = ctx.baker();
    let image = EnvironmentImage::constant(8, 4, Vec3::ONE);

    let a = first.bake(&image, &lut(), &small_config()).expect("Bake failed");
    let b = second.bake(&image, &lut(), &small_config()).expect("Bake failed");

    assert!(!Arc::ptr_eq(&a.environment, &b.environment));
    assert_eq!(ctx.device.texture_count(), 8);
}
