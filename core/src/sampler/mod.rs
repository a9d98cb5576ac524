//! CPU-side sampler types.
//!
//! Provides [`CpuSampler`] for describing texture sampling parameters, along
//! with [`FilterMode`] and [`AddressMode`]. The GPU backends translate the same
//! description into native sampler objects.

mod types;

pub use types::{AddressMode, CpuSampler, FilterMode};
