//! Error types for catalog-preview.

use thiserror::Error;

/// The main error type for preview operations.
///
/// None of these ever reach the catalog layer: the cache turns them into slot
/// placeholders and a log line.
#[derive(Error, Debug)]
pub enum PreviewError {
    /// The asset bytes could not be fetched.
    #[error("failed to fetch asset '{path}': {reason}")]
    AssetFetch { path: String, reason: String },

    /// The asset bytes were fetched but could not be parsed.
    #[error("failed to parse asset '{path}': {reason}")]
    AssetParse { path: String, reason: String },

    /// The asset data is not in a recognized format.
    #[error("unsupported asset format: {0}")]
    UnsupportedFormat(String),

    /// The asset parsed but contains no renderable geometry.
    #[error("asset '{0}' contains no geometry")]
    EmptyAsset(String),

    /// Declared catalog dimensions are not usable as a target size.
    #[error("invalid dimensions ({x}, {y}, {z})")]
    InvalidDimensions { x: f32, y: f32, z: f32 },

    /// Invalid configuration.
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// Render context creation or drawing failed.
    #[error("render error: {0}")]
    Render(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PreviewError {
    /// Returns true for failures that happened before any asset bytes arrived.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, PreviewError::AssetFetch { .. } | PreviewError::Io(_))
    }
}

/// A specialized Result type for preview operations.
pub type Result<T> = std::result::Result<T, PreviewError>;
