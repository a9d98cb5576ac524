//! Graphics error types.

use prism_core::AssetError;

/// Errors that can occur while allocating, rendering or baking.
#[derive(Debug, thiserror::Error)]
pub enum GraphicsError {
    /// An input asset could not be loaded.
    #[error(transparent)]
    Asset(#[from] AssetError),
    /// A bake program failed to parse or validate.
    #[error("shader compilation failed for {program}:\n{diagnostics}")]
    ShaderCompilation {
        program: &'static str,
        diagnostics: String,
    },
    /// A bake program is missing a required stage entry point.
    #[error("program link failed for {program}: {message}")]
    ProgramLink {
        program: &'static str,
        message: String,
    },
    /// An offscreen target cannot be rendered to as configured.
    #[error("framebuffer incomplete: {0}")]
    FramebufferIncomplete(String),
    /// Failed to initialize the graphics system.
    #[error("initialization failed: {0}")]
    InitializationFailed(String),
    /// Failed to create a resource.
    #[error("resource creation failed: {0}")]
    ResourceCreationFailed(String),
    /// A requested feature is not supported.
    #[error("feature not supported: {0}")]
    FeatureNotSupported(String),
    /// The GPU device was lost.
    #[error("GPU device lost")]
    DeviceLost,
    /// An invalid parameter was provided.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GraphicsError::DeviceLost;
        assert_eq!(err.to_string(), "GPU device lost");

        let err = GraphicsError::InitializationFailed("no GPU found".to_string());
        assert_eq!(err.to_string(), "initialization failed: no GPU found");

        let err = GraphicsError::ShaderCompilation {
            program: "irradiance_convolution",
            diagnostics: "error: expected ';'".to_string(),
        };
        assert!(err.to_string().contains("irradiance_convolution"));
        assert!(err.to_string().ends_with("expected ';'"));
    }

    #[test]
    fn asset_errors_convert() {
        let err: GraphicsError = AssetError::NotFound {
            path: "brdf.dds".into(),
        }
        .into();
        assert!(matches!(err, GraphicsError::Asset(AssetError::NotFound { .. })));
        assert_eq!(err.to_string(), "asset not found: brdf.dds");
    }
}
