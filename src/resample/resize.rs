//! Geometry-preserving resizing helpers built on [`resample_onto`].

use super::{resample_onto, ResampleParams};
use crate::image::{Grid, Image};
use crate::transform::Transform;
use crate::util::{FftRegError, FftRegResult};

/// Options for [`resize`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResizeParams {
    /// Use the largest per-axis spacing on every axis.
    pub isotropic: bool,
    /// Keep the requested size; otherwise shrink axes to the data extent.
    pub fill: bool,
    /// Interpolation and padding.
    pub resample: ResampleParams,
}

impl Default for ResizeParams {
    fn default() -> Self {
        Self {
            isotropic: true,
            fill: true,
            resample: ResampleParams::default(),
        }
    }
}

/// Resamples an anisotropic image to isotropic spacing over the same region.
///
/// `spacing` defaults to the smallest input spacing. Already isotropic
/// images are returned as a copy.
pub fn make_isotropic<const D: usize>(
    image: &Image<D>,
    spacing: Option<f64>,
    params: ResampleParams,
) -> FftRegResult<Image<D>> {
    let original = image.spacing();
    if original.iter().all(|&s| s == original[0]) {
        return Ok(image.clone());
    }

    let spacing = spacing.unwrap_or_else(|| original.iter().copied().fold(f64::INFINITY, f64::min));
    if !spacing.is_finite() || spacing <= 0.0 {
        return Err(FftRegError::InvalidInput("isotropic spacing must be positive"));
    }
    let size = image.size();
    let new_size: [usize; D] =
        std::array::from_fn(|i| ((size[i] as f64 * original[i] / spacing).round() as usize).max(1));

    let grid = Grid::new(new_size)?
        .with_direction(image.direction())?
        .with_spacing([spacing; D])?
        .with_origin(image.origin())?;
    resample_onto(image, &grid, &Transform::identity(), params)
}

/// Resizes to `new_size` pixels while keeping the image centred in space.
///
/// The spacing is stretched so the original extent fits the new size; with
/// `isotropic` the largest stretched spacing is used on all axes and the
/// data is padded with the default value.
pub fn resize<const D: usize>(
    image: &Image<D>,
    new_size: [usize; D],
    params: ResizeParams,
) -> FftRegResult<Image<D>> {
    if new_size.iter().any(|&s| s == 0) {
        return Err(FftRegError::InvalidDimensions {
            size: new_size.to_vec(),
        });
    }
    let size = image.size();
    let spacing = image.spacing();

    let mut new_spacing: [f64; D] =
        std::array::from_fn(|i| size[i] as f64 * spacing[i] / new_size[i] as f64);
    if params.isotropic {
        let widest = new_spacing.iter().copied().fold(0.0, f64::max);
        new_spacing = [widest; D];
    }
    let new_size: [usize; D] = if params.fill {
        new_size
    } else {
        std::array::from_fn(|i| (size[i] as f64 * spacing[i] / new_spacing[i]).ceil() as usize)
    };

    // centre of the new grid, expressed as a continuous index of the original
    let origin_cidx: [f64; D] = std::array::from_fn(|i| {
        let center = 0.5 * (size[i] as f64 - 1.0);
        let new_center = 0.5 * (new_size[i] as f64 - 1.0);
        center - new_center * new_spacing[i] / spacing[i]
    });
    let origin = image.grid().continuous_index_to_physical_point(&origin_cidx);

    let grid = Grid::new(new_size)?
        .with_direction(image.direction())?
        .with_spacing(new_spacing)?
        .with_origin(origin)?;
    resample_onto(image, &grid, &Transform::identity(), params.resample)
}
