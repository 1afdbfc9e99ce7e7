//! Error types for fftreg.

use thiserror::Error;

/// Result alias for fftreg operations.
pub type FftRegResult<T> = std::result::Result<T, FftRegError>;

/// Errors that can occur when estimating a translation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FftRegError {
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// An image extent is zero or overflows the addressable buffer size.
    #[error("invalid dimensions: {size:?}")]
    InvalidDimensions { size: Vec<usize> },
    /// A pixel buffer is shorter than the grid it is attached to.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Two images (or an image and its mask) that must share a size do not.
    #[error("size mismatch: expected {expected:?}, got {got:?}")]
    SizeMismatch { expected: Vec<usize>, got: Vec<usize> },
    /// The direction cosine matrix cannot be inverted.
    #[error("direction matrix is singular")]
    SingularDirection,
    /// The correlation surface has no regional maxima to pick a peak from.
    #[error("no correlation peak found")]
    NoPeakFound,
    /// Image decoding failed.
    #[error("image io error: {reason}")]
    ImageIo { reason: String },
}
