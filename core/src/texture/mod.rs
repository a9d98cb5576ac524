//! CPU-side texel storage.
//!
//! Provides [`CpuTexture`], a linear-float 2D or cube texture with a full set of
//! mip levels and the sampling rules the bake programs rely on, along with the
//! [`TextureDimension`] enum shared between CPU and GPU code.

mod types;

pub use types::{CpuTexture, TextureDimension, mip_chain_length};
