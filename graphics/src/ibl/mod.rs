//! Image-based lighting precomputation.
//!
//! [`BakerContext::bake`] turns an equirectangular HDR panorama into:
//!
//! - an environment cubemap with a full mip chain (also drawn as the skybox),
//! - a low-resolution diffuse irradiance cubemap,
//! - a specular cubemap prefiltered per mip with increasing GGX roughness,
//! - the split-sum BRDF lookup table, loaded from disk or integrated on the device.
//!
//! ```ignore
//! use prism_graphics::{BackendType, GraphicsDevice};
//! use prism_graphics::ibl::{BakeConfig, BakerContext, BrdfLutSource};
//!
//! let device = GraphicsDevice::new(BackendType::Auto)?;
//! let mut baker = BakerContext::new(device)?;
//! let targets = baker.bake_file(
//!     "newport_loft.hdr",
//!     &BrdfLutSource::precomputed("brdf_lut.dds"),
//!     &BakeConfig::default(),
//! )?;
//! ```

mod brdf_lut;
mod config;
mod context;
mod material;

pub use brdf_lut::{
    BRDF_LUT_HEADER_SIZE, DEFAULT_BRDF_LUT_SIZE, brdf_lut_payload_size,
    load_precomputed_brdf_lut, read_brdf_lut_asset, upload_brdf_lut,
};
pub use config::BakeConfig;
pub use context::{BakeTargets, BakerContext, BrdfLutSource};
pub use material::SkyboxMaterial;
