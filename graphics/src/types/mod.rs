//! Common types and descriptors for graphics resources.
//!
//! This module contains format enums, usage flags, and descriptor structs
//! used throughout the graphics system.

mod common;
mod texture;

pub use common::{Extent3d, Viewport};
pub use texture::{TextureDescriptor, TextureFormat, TextureUsage};

// Re-export CPU-side types from core.
pub use prism_core::sampler::{AddressMode, CpuSampler, FilterMode};
pub use prism_core::texture::TextureDimension;
