//! Common types shared across the graphics system.

// ============================================================================
// Viewport
// ============================================================================

/// Rectangular region of the bound render target that draws write to.
///
/// Origin is the top-left corner, matching the wgpu convention; row 0 of a
/// texture is the top row of the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// X coordinate of the viewport's top-left corner.
    pub x: f32,
    /// Y coordinate of the viewport's top-left corner.
    pub y: f32,
    /// Width of the viewport.
    pub width: f32,
    /// Height of the viewport.
    pub height: f32,
    /// Minimum depth value (default: 0.0).
    pub min_depth: f32,
    /// Maximum depth value (default: 1.0).
    pub max_depth: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

impl Viewport {
    /// Create a new viewport with standard `[0, 1]` depth range.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }

    /// Create a viewport from dimensions with origin at (0, 0).
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f32, height as f32)
    }

    /// Viewport size rounded to whole pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.width.max(0.0) as u32, self.height.max(0.0) as u32)
    }
}

// ============================================================================
// Extent3d
// ============================================================================

/// Extent of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Extent3d {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Array layers (6 for cube textures, 1 otherwise).
    pub depth_or_array_layers: u32,
}

impl Extent3d {
    /// Create a new 2D extent.
    pub fn new_2d(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            depth_or_array_layers: 1,
        }
    }

    /// Create the extent of a cube texture with `size`-wide faces.
    pub fn new_cube(size: u32) -> Self {
        Self {
            width: size,
            height: size,
            depth_or_array_layers: 6,
        }
    }

    /// Extent of one layer at mip level `mip`.
    pub fn mip_level_size(&self, mip: u32) -> (u32, u32) {
        ((self.width >> mip).max(1), (self.height >> mip).max(1))
    }
}
