//! Per-texel image-based lighting kernels.
//!
//! These are the reference versions of the irradiance and specular prefilter
//! fragment programs. They are generic over a radiance lookup
//! `Fn(direction, lod) -> Vec3`, so the same code runs against a CPU texture, a
//! closed-form environment in tests, or anything else that can answer
//! "what arrives from this direction at this blur level".

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::Vec3;

use crate::brdf::distribution_ggx;
use crate::importance::{hammersley, importance_sample_ggx, tangent_frame};

/// Inputs of the diffuse irradiance convolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IrradianceParams {
    /// Integration step in radians, for both azimuth and elevation.
    pub angular_step: f32,
    /// Edge length of mip 0 of the source cubemap.
    pub source_resolution: u32,
}

/// Inputs of the specular prefilter convolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrefilterParams {
    pub roughness: f32,
    pub sample_count: u32,
    /// Edge length of mip 0 of the source cubemap.
    pub source_resolution: u32,
}

/// Solid angle covered by one texel of a `resolution`-wide cubemap face.
#[inline]
pub fn texel_solid_angle(resolution: u32) -> f32 {
    let res = resolution.max(1) as f32;
    4.0 * PI / (6.0 * res * res)
}

/// Smallest irradiance step the convolution honors; finer steps are clamped.
pub const MIN_IRRADIANCE_ANGULAR_STEP: f32 = 1e-4;

/// Number of `(azimuth, elevation)` cells for a given angular step.
#[inline]
pub fn irradiance_cell_counts(angular_step: f32) -> (u32, u32) {
    let step = angular_step.max(MIN_IRRADIANCE_ANGULAR_STEP);
    let phi = (TAU / step).ceil() as u32;
    let theta = (FRAC_PI_2 / step).ceil() as u32;
    (phi.max(1), theta.max(1))
}

/// Source mip that matches the footprint of one integration cell.
#[inline]
pub fn irradiance_source_lod(angular_step: f32, source_resolution: u32) -> f32 {
    let cell = angular_step * angular_step;
    (0.5 * (cell / texel_solid_angle(source_resolution)).log2()).max(0.0)
}

/// Source mip for one prefilter sample.
///
/// Compares the solid angle the sample stands for with the solid angle of a
/// source texel. Peaky lobes select sharper mips; roughness 0 always reads mip 0.
#[inline]
pub fn prefilter_source_lod(pdf: f32, sample_count: u32, source_resolution: u32, roughness: f32) -> f32 {
    if roughness <= 0.0 {
        return 0.0;
    }
    let sa_sample = 1.0 / (sample_count as f32 * pdf + 1e-4);
    (0.5 * (sa_sample / texel_solid_angle(source_resolution)).log2()).max(0.0)
}

/// Roughness band stored in prefilter mip `mip` of a `mip_count` chain.
#[inline]
pub fn prefilter_roughness(mip: u32, mip_count: u32) -> f32 {
    if mip_count <= 1 {
        return 0.0;
    }
    mip as f32 / (mip_count - 1) as f32
}

/// Cosine-weighted irradiance arriving around `normal`, scaled so that a
/// constant environment reproduces its own radiance.
///
/// Midpoint rule over the hemisphere in spherical coordinates:
/// `pi / count * sum(L(w) cos(theta) sin(theta))`.
pub fn convolve_irradiance<F>(normal: Vec3, params: &IrradianceParams, radiance: F) -> Vec3
where
    F: Fn(Vec3, f32) -> Vec3,
{
    let (tangent, bitangent) = tangent_frame(normal);
    let (phi_steps, theta_steps) = irradiance_cell_counts(params.angular_step);
    let d_phi = TAU / phi_steps as f32;
    let d_theta = FRAC_PI_2 / theta_steps as f32;
    let lod = irradiance_source_lod(params.angular_step, params.source_resolution);

    let mut irradiance = Vec3::ZERO;
    for i in 0..phi_steps {
        let phi = (i as f32 + 0.5) * d_phi;
        let (sin_phi, cos_phi) = phi.sin_cos();
        for j in 0..theta_steps {
            let theta = (j as f32 + 0.5) * d_theta;
            let (sin_theta, cos_theta) = theta.sin_cos();
            let dir = tangent * (sin_theta * cos_phi)
                + bitangent * (sin_theta * sin_phi)
                + normal * cos_theta;
            irradiance += radiance(dir, lod) * cos_theta * sin_theta;
        }
    }

    PI * irradiance / (phi_steps * theta_steps) as f32
}

/// GGX-prefiltered radiance for a surface facing `normal`, with `V = R = N`.
pub fn prefilter_specular<F>(normal: Vec3, params: &PrefilterParams, radiance: F) -> Vec3
where
    F: Fn(Vec3, f32) -> Vec3,
{
    let n = normal;
    let v = normal;

    let mut color = Vec3::ZERO;
    let mut weight = 0.0;
    for i in 0..params.sample_count {
        let xi = hammersley(i, params.sample_count);
        let h = importance_sample_ggx(xi, n, params.roughness);
        let l = (2.0 * v.dot(h) * h - v).normalize();

        let n_dot_l = n.dot(l);
        if n_dot_l > 0.0 {
            let n_dot_h = n.dot(h).max(0.0);
            let h_dot_v = h.dot(v).max(0.0);
            let d = distribution_ggx(n_dot_h, params.roughness);
            let pdf = d * n_dot_h / (4.0 * h_dot_v).max(1e-6) + 1e-4;
            let lod = prefilter_source_lod(
                pdf,
                params.sample_count,
                params.source_resolution,
                params.roughness,
            );
            color += radiance(l, lod) * n_dot_l;
            weight += n_dot_l;
        }
    }

    if weight <= 0.0 {
        return radiance(n, 0.0);
    }
    color / weight
}
