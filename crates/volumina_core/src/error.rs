//! # Overlay Pipeline Error Types
//!
//! Every fault inside the pipeline is expressed as an [`OverlayError`].
//! None of them is allowed to cross the per-frame boundary: the host and the
//! processor driver convert them into a skipped draw, a log line, or a
//! disabled processor.

use thiserror::Error;

/// Errors that can occur in the overlay pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OverlayError {
    /// A channel capacity of zero was requested.
    #[error("invalid channel capacity: {0} (must be at least 1)")]
    InvalidCapacity(usize),

    /// A processor computation failed for this frame.
    #[error("processor '{processor}' failed: {reason}")]
    ProcessingFailed {
        /// Name of the failing processor.
        processor: String,
        /// Human readable cause.
        reason: String,
    },

    /// A processor needs voxel data but the request carried none.
    #[error("processor '{0}' needs voxel data but none was provided")]
    MissingVolume(String),

    /// An asset (font, shader source, ...) could not be loaded.
    #[error("asset '{path}' unavailable: {reason}")]
    Asset {
        /// Asset path relative to the asset root.
        path: String,
        /// Human readable cause.
        reason: String,
    },

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Filesystem error while reading configuration or assets.
    #[error("i/o error: {0}")]
    Io(String),
}

impl From<std::io::Error> for OverlayError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type for overlay pipeline operations.
pub type OverlayResult<T> = Result<T, OverlayError>;
