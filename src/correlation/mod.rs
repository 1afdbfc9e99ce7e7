//! Frequency-domain normalized cross-correlation, plain and masked.
//!
//! The masked variant follows Padfield's formulation: six correlations of
//! the images, their squares and their masks give, for every shift, the
//! overlap count and the masked first and second moments, from which the
//! normalized correlation is assembled.
//!
//! Output index `k` holds the score for the moving image shifted by
//! `s = k - (moving.size - 1)`, i.e. fixed pixel `x` compared with moving
//! pixel `x - s`. The output has `fixed.size + moving.size - 1` pixels per
//! axis and the fixed image's spacing, origin and direction.

use crate::image::{Grid, Image};
use crate::trace::{trace_debug, trace_event, trace_span};
use crate::util::math::next_smooth_size;
use crate::util::{FftRegError, FftRegResult};
use num_complex::Complex;

pub(crate) mod fft;

use fft::FftNd;

/// Overlap variance below this fraction of the overlap energy counts as zero.
const RELATIVE_VARIANCE_EPS: f64 = 1e-10;

/// Scores whose denominator is below this multiple of `f32::EPSILON` times
/// the largest denominator are set to zero.
const PRECISION_FACTOR: f64 = 1000.0;

/// Correlation options.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CorrelationParams {
    /// Shifts overlapping fewer than this fraction of the largest overlap
    /// (in unmasked pixels) score zero. `0` disables the test.
    pub required_fraction_of_overlapping_pixels: f64,
}

impl Default for CorrelationParams {
    fn default() -> Self {
        Self {
            required_fraction_of_overlapping_pixels: 0.0,
        }
    }
}

/// Normalized cross-correlation of `fixed` and `moving` over all shifts.
pub fn normalized_correlation<const D: usize>(
    fixed: &Image<D>,
    moving: &Image<D>,
    params: CorrelationParams,
) -> FftRegResult<Image<D>> {
    let fixed_mask = Image::filled(fixed.grid().clone(), 1.0);
    let moving_mask = Image::filled(moving.grid().clone(), 1.0);
    masked_normalized_correlation(fixed, moving, &fixed_mask, &moving_mask, params)
}

/// Masked normalized cross-correlation; mask pixels that are zero are
/// ignored, any other value counts as inside.
pub fn masked_normalized_correlation<const D: usize>(
    fixed: &Image<D>,
    moving: &Image<D>,
    fixed_mask: &Image<D>,
    moving_mask: &Image<D>,
    params: CorrelationParams,
) -> FftRegResult<Image<D>> {
    check_same_size(fixed, fixed_mask)?;
    check_same_size(moving, moving_mask)?;

    let fs = fixed.size();
    let ms = moving.size();
    let out_size: [usize; D] = std::array::from_fn(|i| fs[i] + ms[i] - 1);
    let padded: [usize; D] = out_size.map(next_smooth_size);
    let _span = trace_span!("correlate", padded_pixels = padded.iter().product::<usize>()).entered();
    trace_debug!(
        "correlate_sizes",
        fixed_pixels = fixed.grid().num_pixels(),
        moving_pixels = moving.grid().num_pixels()
    );

    let plan = FftNd::new(padded);
    let binarize = |v: f32| if v != 0.0 { 1.0 } else { 0.0 };

    let mf = spectrum(&plan, fixed_mask, false, |_, m| binarize(m));
    let mg = spectrum(&plan, moving_mask, true, |_, m| binarize(m));

    let overlap = correlate(&plan, &mf, &mg, &out_size);

    let f1 = spectrum_masked(&plan, fixed, fixed_mask, false, |v| v);
    let sum_f = correlate(&plan, &f1, &mg, &out_size);
    let g1 = spectrum_masked(&plan, moving, moving_mask, true, |v| v);
    let sum_g = correlate(&plan, &mf, &g1, &out_size);
    let sum_fg = correlate(&plan, &f1, &g1, &out_size);
    drop(f1);
    drop(g1);

    let f2 = spectrum_masked(&plan, fixed, fixed_mask, false, |v| v * v);
    let sum_ff = correlate(&plan, &f2, &mg, &out_size);
    drop(f2);
    let g2 = spectrum_masked(&plan, moving, moving_mask, true, |v| v * v);
    let sum_gg = correlate(&plan, &mf, &g2, &out_size);
    drop(g2);

    let counts: Vec<f64> = overlap.iter().map(|n| n.round()).collect();
    let max_count = counts.iter().copied().fold(0.0, f64::max);
    let required = params.required_fraction_of_overlapping_pixels * max_count;

    let mut numerators = vec![0.0f64; counts.len()];
    let mut denominators = vec![0.0f64; counts.len()];
    let mut max_den = 0.0f64;
    for i in 0..counts.len() {
        let n = counts[i];
        if n < 1.0 || n < required {
            continue;
        }
        let var_f = sum_ff[i] - sum_f[i] * sum_f[i] / n;
        let var_g = sum_gg[i] - sum_g[i] * sum_g[i] / n;
        if var_f <= RELATIVE_VARIANCE_EPS * sum_ff[i].abs()
            || var_g <= RELATIVE_VARIANCE_EPS * sum_gg[i].abs()
        {
            continue;
        }
        let den = (var_f * var_g).sqrt();
        numerators[i] = sum_fg[i] - sum_f[i] * sum_g[i] / n;
        denominators[i] = den;
        max_den = max_den.max(den);
    }

    let tolerance = PRECISION_FACTOR * f64::from(f32::EPSILON) * max_den;
    let data: Vec<f32> = numerators
        .iter()
        .zip(denominators.iter())
        .map(|(&num, &den)| {
            if den <= tolerance {
                0.0
            } else {
                (num / den).clamp(-1.0, 1.0) as f32
            }
        })
        .collect();

    trace_event!("correlation_surface", max_overlap = max_count, required = required);

    let grid = Grid::new(out_size)?
        .with_direction(fixed.direction())?
        .with_spacing(fixed.spacing())?
        .with_origin(fixed.origin())?;
    Image::new(grid, data)
}

fn check_same_size<const D: usize>(image: &Image<D>, mask: &Image<D>) -> FftRegResult<()> {
    if image.size() != mask.size() {
        return Err(FftRegError::SizeMismatch {
            expected: image.size().to_vec(),
            got: mask.size().to_vec(),
        });
    }
    Ok(())
}

/// Zero-pads `image` into the plan's shape (optionally mirrored on every
/// axis) after mapping each pixel with `f(value, mask_value)`, then
/// transforms it.
fn spectrum<const D: usize>(
    plan: &FftNd<D>,
    image: &Image<D>,
    flip: bool,
    f: impl Fn(f32, f32) -> f64,
) -> Vec<Complex<f64>> {
    spectrum_with(plan, image, None, flip, f)
}

/// Like [`spectrum`] for `value * mask`-style inputs: masked-out pixels
/// contribute zero, the rest contribute `f(value)`.
fn spectrum_masked<const D: usize>(
    plan: &FftNd<D>,
    image: &Image<D>,
    mask: &Image<D>,
    flip: bool,
    f: impl Fn(f64) -> f64,
) -> Vec<Complex<f64>> {
    spectrum_with(plan, image, Some(mask), flip, |v, m| {
        if m != 0.0 {
            f(f64::from(v))
        } else {
            0.0
        }
    })
}

fn spectrum_with<const D: usize>(
    plan: &FftNd<D>,
    image: &Image<D>,
    mask: Option<&Image<D>>,
    flip: bool,
    f: impl Fn(f32, f32) -> f64,
) -> Vec<Complex<f64>> {
    let shape = plan.shape();
    let size = image.size();
    let grid = image.grid();
    let mut buf = vec![Complex::new(0.0, 0.0); plan.len()];

    for (linear, &value) in image.data().iter().enumerate() {
        let mask_value = mask.map_or(value, |m| m.data()[linear]);
        let v = f(value, mask_value);
        if v == 0.0 {
            continue;
        }
        let index = grid.index_of(linear);
        let mut dst = 0usize;
        for axis in (0..D).rev() {
            let i = if flip {
                size[axis] - 1 - index[axis]
            } else {
                index[axis]
            };
            dst = dst * shape[axis] + i;
        }
        buf[dst] = Complex::new(v, 0.0);
    }

    plan.forward(&mut buf);
    buf
}

/// Inverse transform of `a * b`, cropped to `out_size`, real part only.
fn correlate<const D: usize>(
    plan: &FftNd<D>,
    a: &[Complex<f64>],
    b: &[Complex<f64>],
    out_size: &[usize; D],
) -> Vec<f64> {
    let mut product: Vec<Complex<f64>> = a.iter().zip(b.iter()).map(|(x, y)| x * y).collect();
    plan.inverse(&mut product);

    let shape = plan.shape();
    let total: usize = out_size.iter().product();
    let mut out = Vec::with_capacity(total);
    let mut index = [0usize; D];
    for _ in 0..total {
        let mut src = 0usize;
        for axis in (0..D).rev() {
            src = src * shape[axis] + index[axis];
        }
        out.push(product[src].re);

        for axis in 0..D {
            index[axis] += 1;
            if index[axis] < out_size[axis] {
                break;
            }
            index[axis] = 0;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{masked_normalized_correlation, normalized_correlation, CorrelationParams};
    use crate::image::{Grid, Image};

    fn pattern(size: [usize; 2]) -> Image<2> {
        Image::from_fn(Grid::new(size).unwrap(), |[x, y]| {
            let h = (x as u64).wrapping_mul(73_856_093) ^ (y as u64).wrapping_mul(19_349_663);
            (h % 1000) as f32 / 100.0
        })
    }

    // tiny overlaps score +-1 by chance; keep them out of argmax checks
    fn central() -> CorrelationParams {
        CorrelationParams {
            required_fraction_of_overlapping_pixels: 0.25,
        }
    }

    fn argmax(img: &Image<2>) -> ([usize; 2], f32) {
        let (i, v) = img
            .data()
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap();
        (img.grid().index_of(i), *v)
    }

    #[test]
    fn autocorrelation_peaks_at_zero_shift() {
        let img = pattern([12, 9]);
        let ncc = normalized_correlation(&img, &img, central()).unwrap();
        assert_eq!(ncc.size(), [23, 17]);
        let (index, value) = argmax(&ncc);
        assert_eq!(index, [11, 8]);
        assert!((value - 1.0).abs() < 1e-5);
    }

    #[test]
    fn shifted_copy_peaks_at_shift() {
        let big = pattern([30, 30]);
        let crop = |x0: usize, y0: usize| {
            Image::from_fn(Grid::new([16, 16]).unwrap(), |[x, y]| {
                big.get([x + x0, y + y0]).unwrap()
            })
        };
        // fixed(x) == moving(x - s) with s = (-3, 2)
        let fixed = crop(5, 5);
        let moving = crop(2, 7);
        let ncc = normalized_correlation(&fixed, &moving, central()).unwrap();
        let (index, value) = argmax(&ncc);
        assert_eq!(index, [15 - 3, 15 + 2]);
        assert!(value > 0.999);
    }

    #[test]
    fn masked_pixels_do_not_contribute() {
        let img = pattern([10, 10]);
        let mut corrupted = img.clone();
        corrupted.fill_region([0, 0], [4, 10], 500.0);
        let fixed_mask = Image::filled(img.grid().clone(), 1.0);
        let moving_mask = corrupted.mask_not_equal(500.0);
        let ncc = masked_normalized_correlation(
            &img,
            &corrupted,
            &fixed_mask,
            &moving_mask,
            CorrelationParams::default(),
        )
        .unwrap();
        let zero_shift = ncc.get([9, 9]).unwrap();
        assert!((zero_shift - 1.0).abs() < 1e-5, "got {zero_shift}");
    }

    #[test]
    fn flat_images_correlate_to_zero() {
        let a = Image::filled(Grid::new([8, 6]).unwrap(), 3.0);
        let ncc = normalized_correlation(&a, &a, CorrelationParams::default()).unwrap();
        assert!(ncc.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn required_overlap_zeroes_edge_shifts() {
        let img = pattern([10, 10]);
        let params = CorrelationParams {
            required_fraction_of_overlapping_pixels: 0.5,
        };
        let ncc = normalized_correlation(&img, &img, params).unwrap();
        // a 2x2 corner overlap is far below half of the full 10x10 overlap
        assert_eq!(ncc.get([1, 1]), Some(0.0));
        assert_eq!(ncc.get([17, 17]), Some(0.0));
        assert!(ncc.get([9, 9]).unwrap() > 0.99);
    }

    #[test]
    fn mask_size_must_match() {
        let img = pattern([6, 6]);
        let bad = Image::filled(Grid::new([5, 6]).unwrap(), 1.0);
        assert!(masked_normalized_correlation(&img, &img, &bad, &img, CorrelationParams::default())
            .is_err());
    }
}
