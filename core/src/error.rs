//! Errors raised while reading lighting assets from disk.

use std::path::PathBuf;

/// Failure to load an environment image or a precomputed lookup table.
///
/// Asset errors are always reported before any GPU resource is created for
/// the bake that needed the asset.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// The file does not exist.
    #[error("asset not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file contents could not be decoded as an image.
    #[error("failed to decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    /// The file is shorter than its declared payload.
    #[error("{} is truncated: expected at least {expected} bytes, found {actual}", path.display())]
    Truncated {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    /// Pixel data does not match the stated dimensions.
    #[error("invalid image dimensions {width}x{height} for {texels} texels")]
    InvalidDimensions {
        width: u32,
        height: u32,
        texels: usize,
    },
}

impl AssetError {
    /// Map an I/O error on `path` to `NotFound` or `Io`.
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound { path }
        } else {
            Self::Io { path, source }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_maps_to_not_found() {
        let err = AssetError::from_io(
            "env.hdr",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, AssetError::NotFound { .. }));
        assert_eq!(err.to_string(), "asset not found: env.hdr");
    }

    #[test]
    fn other_io_errors_keep_source() {
        let err = AssetError::from_io(
            "lut.dds",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, AssetError::Io { .. }));
        assert!(err.to_string().contains("denied"));
    }
}
