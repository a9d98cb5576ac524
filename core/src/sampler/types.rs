//! Filter and address mode definitions.

/// Texture filtering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// Nearest neighbor filtering.
    #[default]
    Nearest,
    /// Linear filtering.
    Linear,
}

/// Texture address mode (wrapping behavior).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    /// Clamp to edge.
    #[default]
    ClampToEdge,
    /// Repeat.
    Repeat,
    /// Mirrored repeat.
    MirrorRepeat,
}

impl AddressMode {
    /// Resolve an integer texel coordinate against an axis of `size` texels.
    #[inline]
    pub fn resolve(self, coord: i64, size: u32) -> u32 {
        let size = size.max(1) as i64;
        let resolved = match self {
            AddressMode::ClampToEdge => coord.clamp(0, size - 1),
            AddressMode::Repeat => coord.rem_euclid(size),
            AddressMode::MirrorRepeat => {
                let period = coord.rem_euclid(2 * size);
                if period < size {
                    period
                } else {
                    2 * size - 1 - period
                }
            }
        };
        resolved as u32
    }
}

/// CPU-side sampler configuration.
///
/// Describes filtering, address modes and LOD clamping independently of any
/// GPU resource. Every texture created by the allocator carries one of these as
/// its sampling policy.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuSampler {
    /// Sampler name.
    pub name: Option<String>,
    /// Address mode for U coordinate.
    pub address_mode_u: AddressMode,
    /// Address mode for V coordinate.
    pub address_mode_v: AddressMode,
    /// Address mode for W coordinate.
    pub address_mode_w: AddressMode,
    /// Magnification filter.
    pub mag_filter: FilterMode,
    /// Minification filter.
    pub min_filter: FilterMode,
    /// Mipmap filter.
    pub mipmap_filter: FilterMode,
    /// Minimum LOD clamp.
    pub lod_min_clamp: f32,
    /// Maximum LOD clamp.
    pub lod_max_clamp: f32,
}

impl CpuSampler {
    /// Create a nearest neighbor filtering sampler.
    pub fn nearest() -> Self {
        Self::default()
    }

    /// Linear filtering inside a level, nearest level, clamped at edges.
    pub fn bilinear_clamp() -> Self {
        Self {
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            ..Default::default()
        }
        .with_name("bilinear_clamp")
    }

    /// Linear filtering inside and between levels, clamped at edges.
    pub fn trilinear_clamp() -> Self {
        Self {
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            mipmap_filter: FilterMode::Linear,
            ..Default::default()
        }
        .with_name("trilinear_clamp")
    }

    /// Bilinear sampler for equirectangular panoramas: wraps around in azimuth,
    /// clamps at the poles.
    pub fn panorama() -> Self {
        Self {
            address_mode_u: AddressMode::Repeat,
            ..Self::bilinear_clamp()
        }
        .with_name("panorama")
    }

    /// Set the sampler name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set address mode for all coordinates.
    pub fn with_address_mode(mut self, mode: AddressMode) -> Self {
        self.address_mode_u = mode;
        self.address_mode_v = mode;
        self.address_mode_w = mode;
        self
    }

    /// Clamp the level of detail to `[min, max]`.
    pub fn with_lod_clamp(mut self, min: f32, max: f32) -> Self {
        self.lod_min_clamp = min;
        self.lod_max_clamp = max;
        self
    }

    /// Whether lookups blend between mip levels.
    pub fn is_trilinear(&self) -> bool {
        self.min_filter == FilterMode::Linear && self.mipmap_filter == FilterMode::Linear
    }
}

impl Default for CpuSampler {
    fn default() -> Self {
        Self {
            name: None,
            address_mode_u: AddressMode::ClampToEdge,
            address_mode_v: AddressMode::ClampToEdge,
            address_mode_w: AddressMode::ClampToEdge,
            mag_filter: FilterMode::Nearest,
            min_filter: FilterMode::Nearest,
            mipmap_filter: FilterMode::Nearest,
            lod_min_clamp: 0.0,
            lod_max_clamp: 32.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_modes_resolve_out_of_range_texels() {
        assert_eq!(AddressMode::ClampToEdge.resolve(-3, 4), 0);
        assert_eq!(AddressMode::ClampToEdge.resolve(9, 4), 3);
        assert_eq!(AddressMode::Repeat.resolve(-1, 4), 3);
        assert_eq!(AddressMode::Repeat.resolve(5, 4), 1);
        assert_eq!(AddressMode::MirrorRepeat.resolve(4, 4), 3);
        assert_eq!(AddressMode::MirrorRepeat.resolve(-1, 4), 0);
    }

    #[test]
    fn presets() {
        assert!(CpuSampler::trilinear_clamp().is_trilinear());
        assert!(!CpuSampler::bilinear_clamp().is_trilinear());
        let panorama = CpuSampler::panorama();
        assert_eq!(panorama.address_mode_u, AddressMode::Repeat);
        assert_eq!(panorama.address_mode_v, AddressMode::ClampToEdge);
        assert_eq!(panorama.mag_filter, FilterMode::Linear);
        assert_eq!(panorama.name.as_deref(), Some("panorama"));
    }
}
