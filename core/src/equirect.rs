//! Equirectangular (latitude/longitude) panorama addressing.
//!
//! Horizontal position encodes azimuth around +Y and vertical position encodes
//! elevation. `v = 1` is the zenith, which after the vertical flip applied on
//! load is the last row of an [`EnvironmentImage`](crate::image::EnvironmentImage).

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

/// Map a unit direction to panorama coordinates in `[0, 1]^2`.
///
/// `u = 0.5 + atan2(z, x) / 2pi`, `v = 1 - acos(y) / pi`. `y` is clamped
/// before `acos` so directions straight up or down never produce NaN.
#[inline]
pub fn direction_to_uv(dir: Vec3) -> Vec2 {
    let u = 0.5 + dir.z.atan2(dir.x) / TAU;
    let v = 1.0 - dir.y.clamp(-1.0, 1.0).acos() / PI;
    Vec2::new(u, v)
}

/// Inverse of [`direction_to_uv`], returning a unit direction.
///
/// Singular at the poles, where every `u` maps to the same direction.
#[inline]
pub fn uv_to_direction(uv: Vec2) -> Vec3 {
    let phi = (uv.x - 0.5) * TAU;
    let theta = (1.0 - uv.y) * PI;
    let sin_theta = theta.sin();
    Vec3::new(sin_theta * phi.cos(), theta.cos(), sin_theta * phi.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec3_near(a: Vec3, b: Vec3, eps: f32) {
        assert!((a - b).length() < eps, "{a:?} != {b:?}");
    }

    #[test]
    fn cardinal_directions() {
        assert!((direction_to_uv(Vec3::X) - Vec2::new(0.5, 0.5)).length() < 1e-6);
        assert!((direction_to_uv(Vec3::Z) - Vec2::new(0.75, 0.5)).length() < 1e-6);
        assert!((direction_to_uv(Vec3::NEG_Z) - Vec2::new(0.25, 0.5)).length() < 1e-6);
        assert!((direction_to_uv(Vec3::Y).y - 1.0).abs() < 1e-6);
        assert!(direction_to_uv(Vec3::NEG_Y).y.abs() < 1e-6);
    }

    #[test]
    fn poles_do_not_produce_nan() {
        // Slightly denormalized input must still clamp into acos' domain.
        for dir in [Vec3::new(0.0, 1.000_001, 0.0), Vec3::new(0.0, -1.000_001, 0.0)] {
            let uv = direction_to_uv(dir);
            assert!(uv.is_finite());
            assert!((0.0..=1.0).contains(&uv.y));
        }
    }

    #[test]
    fn round_trip_over_all_octants() {
        let mut count = 0;
        for i in 0..12 {
            for j in 1..12 {
                let phi = (i as f32 + 0.25) / 12.0 * TAU - PI;
                let theta = j as f32 / 12.0 * PI;
                let dir = Vec3::new(
                    theta.sin() * phi.cos(),
                    theta.cos(),
                    theta.sin() * phi.sin(),
                );
                let back = uv_to_direction(direction_to_uv(dir));
                assert_vec3_near(back, dir, 1e-4);
                count += 1;
            }
        }
        assert!(count >= 100);
    }

    #[test]
    fn uv_range_is_unit_square() {
        for i in 0..64 {
            let a = i as f32 * 0.37;
            let dir = Vec3::new(a.cos(), (a * 0.5).sin(), a.sin()).normalize();
            let uv = direction_to_uv(dir);
            assert!((0.0..=1.0).contains(&uv.x), "{uv:?}");
            assert!((0.0..=1.0).contains(&uv.y), "{uv:?}");
        }
    }
}
