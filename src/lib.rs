//! fftreg estimates the translation that aligns two 2-D or 3-D images by
//! FFT-based normalized cross-correlation.
//!
//! Images carry physical geometry (spacing, origin, direction). The moving
//! image is resampled onto the fixed grid when needed, both images are
//! smoothed, correlated over every relative shift (optionally ignoring a
//! sentinel pixel value), and the strongest regional maximum of the
//! correlation surface gives the displacement. The result can seed an
//! iterative registration, optionally composed onto an initial transform.
//!
//! The default build is single-threaded; the `rayon` feature parallelises
//! the FFTs and `tracing` reports pipeline stages.

pub mod correlation;
pub mod estimate;
pub mod filter;
pub mod image;
pub mod peak;
pub mod resample;
mod trace;
pub mod transform;
pub mod util;

pub use correlation::{masked_normalized_correlation, normalized_correlation, CorrelationParams};
pub use estimate::{
    estimate_translation, estimate_translation_with_report, fft_based_translation_initialization,
    EstimateConfig, EstimateReport,
};
pub use filter::{smoothing_recursive_gaussian, Sigma};
pub use image::{Grid, Grid2, Grid3, Image, Image2, Image3};
pub use resample::{make_isotropic, resample_onto, resize, Interpolator, ResampleParams, ResizeParams};
pub use transform::{
    compose_translation, AffineTransform, EstimatedTransform, Transform, TranslationTransform,
};
pub use util::{FftRegError, FftRegResult};
