//! BRDF lookup table tests: the precomputed asset path and device integration.

mod common;

use std::sync::Arc;

use rstest::rstest;

use common::{Backend, TestContext, write_lut_asset};
use prism_core::AssetError;
use prism_core::brdf::integrate_brdf;
use prism_graphics::ibl::{brdf_lut_payload_size, load_precomputed_brdf_lut};
use prism_graphics::{BrdfLutSource, GraphicsError, TextureAllocator, TextureFormat};

#[rstest]
#[case::software(Backend::Software)]
#[case::wgpu(Backend::Wgpu)]
fn test_precomputed_lut_upload(#[case] backend: Backend) {
    let Some(ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("brdf.dds");
    write_lut_asset(&path, 16, (0.75, 0.125), 0);

    let allocator = TextureAllocator::new(Arc::clone(&ctx.device));
    let lut = load_precomputed_brdf_lut(&allocator, &path, 16).expect("Load failed");

    assert_eq!(lut.format(), TextureFormat::Rg16Float);
    assert_eq!((lut.width(), lut.height()), (16, 16));
    assert!(lut.sampler().address_mode_u == prism_graphics::AddressMode::ClampToEdge);
    for texel in ctx.read(&lut, 0, 0) {
        assert_eq!((texel.x, texel.y), (0.75, 0.125));
    }
}

#[rstest]
#[case::one_byte(1)]
#[case::one_texel(4)]
#[case::whole_payload(4 * 16 * 16)]
fn test_truncated_lut_rejected(#[case] missing: usize) {
    let ctx = TestContext::new(Backend::Software).expect("Software backend");
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("brdf.dds");
    write_lut_asset(&path, 16, (1.0, 0.0), missing);

    let allocator = TextureAllocator::new(Arc::clone(&ctx.device));
    let err = load_precomputed_brdf_lut(&allocator, &path, 16).unwrap_err();

    match err {
        GraphicsError::Asset(AssetError::Truncated {
            expected, actual, ..
        }) => {
            assert_eq!(expected, 128 + brdf_lut_payload_size(16));
            assert_eq!(actual, expected - missing);
        }
        other => panic!("expected truncation error, got {other}"),
    }
    assert_eq!(ctx.device.texture_count(), 0);
}

#[test]
fn test_missing_lut_not_found() {
    let ctx = TestContext::new(Backend::Software).expect("Software backend");
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let allocator = TextureAllocator::new(Arc::clone(&ctx.device));

    let err = load_precomputed_brdf_lut(&allocator, dir.path().join("nope.dds"), 512).unwrap_err();
    assert!(matches!(err, GraphicsError::Asset(AssetError::NotFound { .. })));
}

/// The integrated table matches the CPU kernel and stays within the split-sum range.
#[rstest]
#[case::software(Backend::Software, 1e-3)]
#[case::wgpu(Backend::Wgpu, 0.01)]
fn test_generated_lut(#[case] backend: Backend, #[case] tolerance: f32) {
    let Some(ctx) = TestContext::new(backend) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };
    let mut baker = ctx.baker();
    let size = 16;
    let targets = baker
        .bake(
            &common::red_blue_image(),
            &BrdfLutSource::Generated {
                size,
                sample_count: 64,
            },
            &common::small_config(),
        )
        .expect("Bake failed");

    let texels = ctx.read(&targets.brdf_lut, 0, 0);
    for y in 0..size {
        for x in 0..size {
            let texel = texels[(y * size + x) as usize];
            let n_dot_v = (x as f32 + 0.5) / size as f32;
            let roughness = (y as f32 + 0.5) / size as f32;
            let expected = integrate_brdf(n_dot_v, roughness, 64);

            assert!(texel.x >= 0.0 && texel.y >= 0.0);
            assert!(texel.x + texel.y <= 1.02, "({x}, {y}): {texel:?}");
            assert!(
                (texel.x - expected.x).abs() <= tolerance && (texel.y - expected.y).abs() <= tolerance,
                "({x}, {y}): expected {expected:?}, got {texel:?}"
            );
        }
    }

    // Smooth and head-on: nearly all energy in the scale term.
    let smooth_head_on = texels[(size - 1) as usize];
    assert!(smooth_head_on.x > 0.9, "{smooth_head_on:?}");
}
