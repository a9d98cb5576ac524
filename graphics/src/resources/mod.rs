//! GPU resources.
//!
//! This module contains the GPU resource types that are created by [`GraphicsDevice`]:
//! - [`Texture`] - 2D or cube texture with its sampling policy
//! - [`Program`] - validated fullscreen bake program
//!
//! Resources are reference-counted with [`Arc`] and can be shared across threads.
//! Each resource holds a strong reference to its parent device.
//!
//! [`GraphicsDevice`]: crate::GraphicsDevice
//! [`Arc`]: std::sync::Arc

mod program;
mod texture;

pub use program::Program;
pub use texture::Texture;
