//! Cook-Torrance microfacet terms.
//!
//! GGX normal distribution, Smith-Schlick geometry and Schlick Fresnel, plus
//! the split-sum integration that produces the two-channel BRDF lookup table.

use std::f32::consts::PI;

use glam::{Vec2, Vec3};

use crate::importance::{hammersley, importance_sample_ggx};

/// GGX / Trowbridge-Reitz normal distribution `D(h)`.
///
/// `roughness` is perceptual roughness; the distribution uses `alpha = roughness^2`.
#[inline]
pub fn distribution_ggx(n_dot_h: f32, roughness: f32) -> f32 {
    let a = roughness * roughness;
    let a2 = a * a;
    let n_dot_h = n_dot_h.max(0.0);
    let denom = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    a2 / (PI * denom * denom).max(f32::MIN_POSITIVE)
}

/// Geometry remapping used for analytic (punctual) lights: `k = (r + 1)^2 / 8`.
#[inline]
pub fn k_direct(roughness: f32) -> f32 {
    let r = roughness + 1.0;
    r * r / 8.0
}

/// Geometry remapping used for image-based lighting: `k = r^2 / 2`.
#[inline]
pub fn k_ibl(roughness: f32) -> f32 {
    roughness * roughness / 2.0
}

/// Schlick-GGX shadowing for a single direction.
#[inline]
pub fn geometry_schlick_ggx(n_dot_v: f32, k: f32) -> f32 {
    n_dot_v / (n_dot_v * (1.0 - k) + k)
}

/// Smith's method: shadowing for the view direction times masking for the light.
#[inline]
pub fn geometry_smith(n_dot_v: f32, n_dot_l: f32, k: f32) -> f32 {
    geometry_schlick_ggx(n_dot_v.max(0.0), k) * geometry_schlick_ggx(n_dot_l.max(0.0), k)
}

/// Schlick's Fresnel approximation.
#[inline]
pub fn fresnel_schlick(cos_theta: f32, f0: Vec3) -> Vec3 {
    f0 + (Vec3::ONE - f0) * (1.0 - cos_theta).clamp(0.0, 1.0).powi(5)
}

/// Schlick's Fresnel with the grazing term damped by roughness, for ambient lighting.
#[inline]
pub fn fresnel_schlick_roughness(cos_theta: f32, f0: Vec3, roughness: f32) -> Vec3 {
    let grazing = Vec3::splat(1.0 - roughness).max(f0);
    f0 + (grazing - f0) * (1.0 - cos_theta).clamp(0.0, 1.0).powi(5)
}

/// Integrate the specular BRDF over the hemisphere for the split-sum approximation.
///
/// Returns `(scale, bias)` such that the environment BRDF is `f0 * scale + bias`.
/// The normal is fixed at +Z and `V` lies in the XZ plane.
pub fn integrate_brdf(n_dot_v: f32, roughness: f32, sample_count: u32) -> Vec2 {
    let n_dot_v = n_dot_v.clamp(1e-4, 1.0);
    let v = Vec3::new((1.0 - n_dot_v * n_dot_v).sqrt(), 0.0, n_dot_v);
    let n = Vec3::Z;
    let k = k_ibl(roughness);

    let mut scale = 0.0;
    let mut bias = 0.0;
    for i in 0..sample_count {
        let xi = hammersley(i, sample_count);
        let h = importance_sample_ggx(xi, n, roughness);
        let l = (2.0 * v.dot(h) * h - v).normalize();

        let n_dot_l = l.z.max(0.0);
        let n_dot_h = h.z.max(0.0);
        let v_dot_h = v.dot(h).max(0.0);

        if n_dot_l > 0.0 {
            let g = geometry_smith(n_dot_v, n_dot_l, k);
            let g_vis = g * v_dot_h / (n_dot_h * n_dot_v).max(1e-6);
            let fc = (1.0 - v_dot_h).powi(5);
            scale += (1.0 - fc) * g_vis;
            bias += fc * g_vis;
        }
    }

    if sample_count == 0 {
        return Vec2::ZERO;
    }
    Vec2::new(scale, bias) / sample_count as f32
}
