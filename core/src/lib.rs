//! # Prism Core
//!
//! CPU side of the prism image-based lighting baker.
//!
//! - [`equirect`] and [`cubemap`] define how directions map onto panoramas and
//!   cube faces.
//! - [`brdf`], [`importance`] and [`ibl`] hold the numeric kernels: microfacet
//!   terms, Hammersley/GGX sampling and the per-texel irradiance and specular
//!   prefilter integrals.
//! - [`texture`] and [`sampler`] provide host texel storage with the filtering
//!   rules the GPU programs assume.
//! - [`image`] loads the HDR panoramas that feed a bake.

pub mod brdf;
pub mod cubemap;
pub mod equirect;
pub mod error;
pub mod ibl;
pub mod image;
pub mod importance;
pub mod profiling;
pub mod sampler;
pub mod texture;

pub use error::AssetError;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
