//! Rendering error types.

use thiserror::Error;

/// Errors that can occur while creating or using a render context.
#[derive(Error, Debug)]
pub enum RenderError {
    /// No graphics adapter is available.
    #[error("failed to create graphics adapter")]
    AdapterCreationFailed,

    /// Failed to create the wgpu device.
    #[error("failed to create graphics device: {0}")]
    DeviceCreationFailed(#[from] wgpu::RequestDeviceError),

    /// The requested surface has no pixels.
    #[error("surface size {0}x{1} is empty")]
    EmptySurface(u32, u32),

    /// The requested surface exceeds the device texture limit.
    #[error("surface size {width}x{height} exceeds device limit {max}")]
    SurfaceTooLarge { width: u32, height: u32, max: u32 },

    /// The model has no geometry to frame.
    #[error("model has no geometry")]
    EmptyModel,

    /// Reading the rendered frame back from the GPU failed.
    #[error("failed to map readback buffer")]
    BufferMapFailed,
}

/// A specialized Result type for rendering operations.
pub type RenderResult<T> = std::result::Result<T, RenderError>;

impl From<RenderError> for catalog_preview_core::PreviewError {
    fn from(err: RenderError) -> Self {
        catalog_preview_core::PreviewError::Render(err.to_string())
    }
}
