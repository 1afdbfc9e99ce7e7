//! Image filters used by the estimation pipeline.

pub mod gaussian;

pub use gaussian::{smoothing_recursive_gaussian, Sigma};
