//! Error types for the core handle library.
//!
//! Handle getters are total: an invalid handle answers with a neutral value.
//! The few operations that have no safe neutral answer report one of the
//! errors below instead.

use thiserror::Error;

/// Errors from image accessors that cannot fabricate a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    /// The image handle is invalid, so there is no calibration grid
    #[error("Distortion grid unavailable: image is invalid")]
    InvalidImage,

    /// The service delivered a grid whose size does not match its dimensions
    #[error("Malformed distortion grid: got {got} values, expected {expected}")]
    MalformedDistortion {
        /// Number of values delivered
        got: usize,
        /// Number of values implied by the grid dimensions
        expected: usize,
    },
}

/// Result type for image operations.
pub type ImageResult<T> = Result<T, ImageError>;
