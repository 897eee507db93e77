//! Error types for the comparison engine.
//!
//! Errors defined here only ever escape at process level (missing rasterizer,
//! unreadable input tree, unwritable artifacts). Failures while scoring a single
//! document are captured in its [`DocumentResult`](crate::document::DocumentResult)
//! instead of being returned.

use std::path::PathBuf;

/// Result type alias for comparison operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while rasterizing, scoring or reporting.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decode or encode error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The external rasterizer could not be found or started
    #[error("Rasterizer unavailable: {0}")]
    RasterizerUnavailable(String),

    /// The rasterizer ran but did not produce usable pages
    #[error("Rasterization of {path} failed: {reason}")]
    Rasterization {
        /// PDF that was being rasterized
        path: PathBuf,
        /// Reason for the failure
        reason: String,
    },

    /// Input directory missing or not a directory
    #[error("Input directory not found: {0}")]
    InputDirectory(PathBuf),

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
