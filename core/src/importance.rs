//! Low-discrepancy sampling and GGX importance sampling.

use std::f32::consts::PI;

use glam::{Vec2, Vec3};

/// Van der Corput radical inverse in base 2.
#[inline]
pub fn radical_inverse_vdc(bits: u32) -> f32 {
    bits.reverse_bits() as f32 * 2.328_306_4e-10
}

/// `i`-th point of an `n`-point Hammersley set in `[0, 1)^2`.
#[inline]
pub fn hammersley(i: u32, n: u32) -> Vec2 {
    Vec2::new(i as f32 / n as f32, radical_inverse_vdc(i))
}

/// Orthonormal `(tangent, bitangent)` around `n`.
///
/// World up is +Y; normals within ~2.5 degrees of it use +X instead so the
/// cross product never degenerates.
#[inline]
pub fn tangent_frame(n: Vec3) -> (Vec3, Vec3) {
    let up = if n.y.abs() < 0.999 { Vec3::Y } else { Vec3::X };
    let tangent = up.cross(n).normalize();
    let bitangent = n.cross(tangent);
    (tangent, bitangent)
}

/// Half vector around `n` distributed proportionally to `D_ggx(h) * (n . h)`.
pub fn importance_sample_ggx(xi: Vec2, n: Vec3, roughness: f32) -> Vec3 {
    let a = roughness * roughness;

    let phi = 2.0 * PI * xi.x;
    let cos_theta = ((1.0 - xi.y) / (1.0 + (a * a - 1.0) * xi.y)).max(0.0).sqrt();
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();

    let h = Vec3::new(phi.cos() * sin_theta, phi.sin() * sin_theta, cos_theta);
    let (tangent, bitangent) = tangent_frame(n);

    (tangent * h.x + bitangent * h.y + n * h.z).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn radical_inverse_known_values() {
        assert_eq!(radical_inverse_vdc(0), 0.0);
        assert_eq!(radical_inverse_vdc(1), 0.5);
        assert_eq!(radical_inverse_vdc(2), 0.25);
        assert_eq!(radical_inverse_vdc(3), 0.75);
        assert_eq!(radical_inverse_vdc(4), 0.125);
    }

    #[test]
    fn hammersley_points_are_in_unit_square_and_distinct() {
        let n = 64;
        let points: Vec<Vec2> = (0..n).map(|i| hammersley(i, n)).collect();
        for p in &points {
            assert!((0.0..1.0).contains(&p.x) && (0.0..1.0).contains(&p.y));
        }
        let mut ys: Vec<u32> = points.iter().map(|p| (p.y * n as f32) as u32).collect();
        ys.sort_unstable();
        ys.dedup();
        // One point per row stratum.
        assert_eq!(ys.len(), n as usize);
    }

    #[rstest]
    #[case(Vec3::Y)]
    #[case(Vec3::NEG_Y)]
    #[case(Vec3::X)]
    #[case(Vec3::new(0.3, 0.9, -0.2).normalize())]
    #[case(Vec3::new(0.0, 0.9995, 0.0316).normalize())]
    fn tangent_frame_is_orthonormal(#[case] n: Vec3) {
        let (t, b) = tangent_frame(n);
        assert!(t.is_finite() && b.is_finite());
        assert!((t.length() - 1.0).abs() < 1e-5);
        assert!((b.length() - 1.0).abs() < 1e-5);
        assert!(t.dot(n).abs() < 1e-5);
        assert!(b.dot(n).abs() < 1e-5);
        assert!(t.dot(b).abs() < 1e-5);
    }

    #[test]
    fn smooth_surface_samples_the_normal() {
        let n = Vec3::new(0.2, 0.5, 0.8).normalize();
        for i in 0..16 {
            let h = importance_sample_ggx(hammersley(i, 16), n, 0.0);
            assert!((h - n).length() < 1e-4, "{h:?}");
        }
    }

    #[test]
    fn samples_stay_in_upper_hemisphere() {
        let n = Vec3::NEG_Y;
        for roughness in [0.25, 0.5, 1.0] {
            for i in 0..256 {
                let h = importance_sample_ggx(hammersley(i, 256), n, roughness);
                assert!((h.length() - 1.0).abs() < 1e-4);
                assert!(h.dot(n) >= -1e-6);
            }
        }
    }

    #[test]
    fn rougher_lobes_spread_wider() {
        let spread = |roughness: f32| -> f32 {
            (0..128)
                .map(|i| importance_sample_ggx(hammersley(i, 128), Vec3::Z, roughness).z)
                .sum::<f32>()
                / 128.0
        };
        assert!(spread(0.2) > spread(0.6));
        assert!(spread(0.6) > spread(1.0));
    }
}
