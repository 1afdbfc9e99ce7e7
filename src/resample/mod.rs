//! Resampling images onto a reference grid through a transform.
//!
//! Output pixel `i` of the reference grid is mapped to a physical point,
//! pushed through the transform (fixed to moving space), converted to a
//! continuous index of the input and interpolated. Points whose continuous
//! index falls outside `[-0.5, size - 0.5)` on any axis take the default
//! value.

use crate::image::{Grid, Image};
use crate::trace::{trace_debug, trace_span};
use crate::transform::Transform;
use crate::util::FftRegResult;

mod resize;

pub use resize::{make_isotropic, resize, ResizeParams};

/// Interpolation scheme used when sampling the input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Interpolator {
    /// Multilinear interpolation over the `2^D` surrounding pixels.
    #[default]
    Linear,
    /// Value of the nearest pixel (half-integers round up).
    NearestNeighbor,
}

/// Resampling options.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResampleParams {
    /// Interpolation scheme.
    pub interpolator: Interpolator,
    /// Value for output pixels that map outside the input.
    pub default_value: f32,
}

impl Default for ResampleParams {
    fn default() -> Self {
        Self {
            interpolator: Interpolator::Linear,
            default_value: 0.0,
        }
    }
}

/// Resamples `image` onto `reference` through `transform`.
pub fn resample_onto<const D: usize>(
    image: &Image<D>,
    reference: &Grid<D>,
    transform: &Transform<D>,
    params: ResampleParams,
) -> FftRegResult<Image<D>> {
    let _span = trace_span!("resample", pixels = reference.num_pixels()).entered();
    trace_debug!(
        "resample_grid",
        input_pixels = image.grid().num_pixels(),
        output_pixels = reference.num_pixels()
    );

    let src_grid = image.grid();
    let mut data = Vec::with_capacity(reference.num_pixels());
    for linear in 0..reference.num_pixels() {
        let index = reference.index_of(linear);
        let point = reference.index_to_physical_point(&index);
        let mapped = transform.transform_point(&point);
        let cidx = src_grid.physical_point_to_continuous_index(&mapped);
        let value = match params.interpolator {
            Interpolator::Linear => sample_linear(image, &cidx),
            Interpolator::NearestNeighbor => sample_nearest(image, &cidx),
        };
        data.push(value.unwrap_or(params.default_value));
    }
    Image::new(reference.clone(), data)
}

fn inside<const D: usize>(size: &[usize; D], cidx: &[f64; D]) -> bool {
    cidx.iter()
        .zip(size.iter())
        .all(|(&c, &s)| c >= -0.5 && c < s as f64 - 0.5)
}

/// Multilinear sample at a continuous index; `None` outside the buffer.
pub fn sample_linear<const D: usize>(image: &Image<D>, cidx: &[f64; D]) -> Option<f32> {
    let size = image.size();
    if !inside(&size, cidx) {
        return None;
    }

    let base: [i64; D] = std::array::from_fn(|i| cidx[i].floor() as i64);
    let frac: [f64; D] = std::array::from_fn(|i| cidx[i] - base[i] as f64);
    let grid = image.grid();
    let data = image.data();

    let mut acc = 0.0f64;
    for corner in 0..(1usize << D) {
        let mut weight = 1.0f64;
        let mut index = [0usize; D];
        for axis in 0..D {
            let upper = (corner >> axis) & 1 == 1;
            let w = if upper { frac[axis] } else { 1.0 - frac[axis] };
            weight *= w;
            let raw = base[axis] + i64::from(upper);
            index[axis] = raw.clamp(0, size[axis] as i64 - 1) as usize;
        }
        if weight == 0.0 {
            continue;
        }
        acc += weight * f64::from(data[grid.linear_index(&index)]);
    }
    Some(acc as f32)
}

/// Nearest-neighbour sample at a continuous index; `None` outside the buffer.
pub fn sample_nearest<const D: usize>(image: &Image<D>, cidx: &[f64; D]) -> Option<f32> {
    let size = image.size();
    if !inside(&size, cidx) {
        return None;
    }
    let index: [usize; D] = std::array::from_fn(|i| {
        ((cidx[i] + 0.5).floor() as i64).clamp(0, size[i] as i64 - 1) as usize
    });
    image.get(index)
}
