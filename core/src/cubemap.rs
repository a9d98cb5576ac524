//! Cubemap face parameterization.
//!
//! Faces are stored in layer order `+X, -X, +Y, -Y, +Z, -Z`. Face-local
//! coordinates run over `[-1, 1]^2` with `v = -1` on the first (top) row. The
//! per-face bases below agree with the cube sampling rules of Vulkan, Metal and
//! D3D, so a texel written at `(face, uv)` is read back by a hardware lookup
//! along [`face_uv_to_direction`]`(face, uv)`.

use glam::{Vec2, Vec3};

/// One face of a cubemap, in array-layer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PositiveX = 0,
    NegativeX = 1,
    PositiveY = 2,
    NegativeY = 3,
    PositiveZ = 4,
    NegativeZ = 5,
}

impl CubeFace {
    /// All faces in layer order.
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    /// Face for an array layer index, or `None` past the sixth layer.
    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Array layer index of this face.
    #[inline]
    pub fn index(self) -> u32 {
        self as u32
    }

    /// Unnormalized direction through `uv` on this face.
    #[inline]
    pub fn direction(self, uv: Vec2) -> Vec3 {
        face_uv_to_direction(self, uv)
    }

    /// Outward axis of the face.
    pub fn normal(self) -> Vec3 {
        self.direction(Vec2::ZERO)
    }
}

/// Direction through face-local `uv` in `[-1, 1]^2`.
///
/// The result is not normalized; callers normalize before any lighting math.
#[inline]
pub fn face_uv_to_direction(face: CubeFace, uv: Vec2) -> Vec3 {
    let (u, v) = (uv.x, uv.y);
    match face {
        CubeFace::PositiveX => Vec3::new(1.0, -v, -u),
        CubeFace::NegativeX => Vec3::new(-1.0, -v, u),
        CubeFace::PositiveY => Vec3::new(u, 1.0, v),
        CubeFace::NegativeY => Vec3::new(u, -1.0, -v),
        CubeFace::PositiveZ => Vec3::new(u, -v, 1.0),
        CubeFace::NegativeZ => Vec3::new(-u, -v, -1.0),
    }
}

/// Face and face-local coordinates hit by `dir` (need not be normalized).
///
/// Ties between axes resolve toward X, then Y.
pub fn direction_to_face_uv(dir: Vec3) -> (CubeFace, Vec2) {
    let abs = dir.abs();
    let (face, sc, tc, ma) = if abs.x >= abs.y && abs.x >= abs.z {
        if dir.x >= 0.0 {
            (CubeFace::PositiveX, -dir.z, -dir.y, abs.x)
        } else {
            (CubeFace::NegativeX, dir.z, -dir.y, abs.x)
        }
    } else if abs.y >= abs.z {
        if dir.y >= 0.0 {
            (CubeFace::PositiveY, dir.x, dir.z, abs.y)
        } else {
            (CubeFace::NegativeY, dir.x, -dir.z, abs.y)
        }
    } else if dir.z >= 0.0 {
        (CubeFace::PositiveZ, dir.x, -dir.y, abs.z)
    } else {
        (CubeFace::NegativeZ, -dir.x, -dir.y, abs.z)
    };

    if ma <= 0.0 {
        return (face, Vec2::ZERO);
    }
    (face, Vec2::new(sc / ma, tc / ma))
}

/// Face-local coordinates of the center of texel `(x, y)` on a `size`-wide face.
#[inline]
pub fn texel_center_uv(x: u32, y: u32, size: u32) -> Vec2 {
    let inv = 1.0 / size as f32;
    Vec2::new(
        (x as f32 + 0.5) * inv * 2.0 - 1.0,
        (y as f32 + 0.5) * inv * 2.0 - 1.0,
    )
}

/// Normalized direction through the center of texel `(x, y)`.
#[inline]
pub fn texel_direction(face: CubeFace, x: u32, y: u32, size: u32) -> Vec3 {
    face.direction(texel_center_uv(x, y, size)).normalize()
}
