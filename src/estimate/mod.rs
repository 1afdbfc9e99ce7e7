//! Translation estimation by FFT-based normalized cross-correlation.
//!
//! The pipeline brings the moving image onto the fixed grid, smooths both
//! images, correlates them over every shift, smooths the correlation
//! surface and takes the strongest connected regional maximum as the
//! displacement peak. The translation is the offset of that peak from the
//! zero-displacement point of the surface, and maps fixed points to moving
//! points.

use crate::correlation::{masked_normalized_correlation, normalized_correlation, CorrelationParams};
use crate::filter::{smoothing_recursive_gaussian, Sigma};
use crate::image::Image;
use crate::peak::{label_components, label_statistics, regional_maxima, select_peak};
use crate::resample::{resample_onto, Interpolator, ResampleParams};
use crate::trace::{trace_debug, trace_event, trace_span};
use crate::transform::{compose_translation, EstimatedTransform, Transform, TranslationTransform};
use crate::util::math::sub;
use crate::util::FftRegResult;
use std::borrow::Cow;

/// Configuration for [`estimate_translation`].
#[derive(Clone, Debug, PartialEq)]
pub struct EstimateConfig<const D: usize> {
    /// Minimum overlap, as a fraction of the largest overlap, for a shift to
    /// be scored. `0` disables the test; values are not range checked.
    pub required_fraction_of_overlapping_pixels: f64,
    /// Transform applied to the moving image before correlation; the
    /// estimate is composed onto it.
    pub initial_transform: Option<Transform<D>>,
    /// Pixels with this value are excluded from the correlation.
    pub masked_pixel_value: Option<f32>,
}

impl<const D: usize> Default for EstimateConfig<D> {
    fn default() -> Self {
        Self {
            required_fraction_of_overlapping_pixels: 0.0,
            initial_transform: None,
            masked_pixel_value: None,
        }
    }
}

impl<const D: usize> EstimateConfig<D> {
    pub fn with_required_overlap(mut self, fraction: f64) -> Self {
        self.required_fraction_of_overlapping_pixels = fraction;
        self
    }

    pub fn with_initial_transform(mut self, transform: impl Into<Transform<D>>) -> Self {
        self.initial_transform = Some(transform.into());
        self
    }

    pub fn with_masked_pixel_value(mut self, value: f32) -> Self {
        self.masked_pixel_value = Some(value);
        self
    }
}

/// Estimate plus details about the correlation peak it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct EstimateReport<const D: usize> {
    pub transform: EstimatedTransform<D>,
    /// Mean smoothed correlation over the winning region.
    pub peak_value: f64,
    /// Peak position as a continuous index of the correlation surface.
    pub peak_index: [f64; D],
    /// Number of regional-maximum regions that competed.
    pub regions: usize,
}

/// Estimates the translation that aligns `moving` to `fixed` with default
/// settings.
pub fn fft_based_translation_initialization<const D: usize>(
    fixed: &Image<D>,
    moving: &Image<D>,
) -> FftRegResult<EstimatedTransform<D>> {
    estimate_translation(fixed, moving, &EstimateConfig::default())
}

/// Estimates the translation that aligns `moving` to `fixed`.
///
/// Without an initial transform the result is a bare translation; with one
/// it is that transform with the estimate added to its translation.
pub fn estimate_translation<const D: usize>(
    fixed: &Image<D>,
    moving: &Image<D>,
    config: &EstimateConfig<D>,
) -> FftRegResult<EstimatedTransform<D>> {
    estimate_translation_with_report(fixed, moving, config).map(|report| report.transform)
}

/// Like [`estimate_translation`], also reporting the peak it selected.
///
/// # Errors
/// [`FftRegError::NoPeakFound`](crate::FftRegError::NoPeakFound) when the
/// correlation surface has no regional maximum, e.g. for featureless
/// images. Failures of the resampling, smoothing and correlation stages are
/// returned unchanged.
pub fn estimate_translation_with_report<const D: usize>(
    fixed: &Image<D>,
    moving: &Image<D>,
    config: &EstimateConfig<D>,
) -> FftRegResult<EstimateReport<D>> {
    let _span = trace_span!("estimate_translation", dims = D).entered();

    let moving = reconcile_grid(fixed, moving, config)?;
    let moving: &Image<D> = &moving;

    let masks = config
        .masked_pixel_value
        .map(|value| (fixed.mask_not_equal(value), moving.mask_not_equal(value)));

    let sigma = Sigma::Isotropic(fixed.spacing()[0]);
    let (fixed_smooth, moving_smooth) = {
        let _span = trace_span!("smooth").entered();
        (
            smoothing_recursive_gaussian(fixed, sigma)?,
            smoothing_recursive_gaussian(moving, sigma)?,
        )
    };

    let params = CorrelationParams {
        required_fraction_of_overlapping_pixels: config.required_fraction_of_overlapping_pixels,
    };
    let surface = match &masks {
        Some((fixed_mask, moving_mask)) => masked_normalized_correlation(
            &fixed_smooth,
            &moving_smooth,
            fixed_mask,
            moving_mask,
            params,
        )?,
        None => normalized_correlation(&fixed_smooth, &moving_smooth, params)?,
    };
    drop(fixed_smooth);
    drop(moving_smooth);
    let surface = smoothing_recursive_gaussian(&surface, sigma)?;

    let (peak_index, peak_value, regions) = extract_peak(&surface)?;

    let peak = surface.grid().continuous_index_to_physical_point(&peak_index);
    let center_index = surface.size().map(|s| s as f64 / 2.0);
    let center = surface.grid().continuous_index_to_physical_point(&center_index);
    let translation = sub(&center, &peak);
    trace_event!(
        "translation",
        peak_value = peak_value,
        regions = regions,
        t0 = translation[0]
    );

    let transform = match &config.initial_transform {
        Some(initial) => EstimatedTransform::Composed(compose_translation(initial, &translation)),
        None => EstimatedTransform::Translation(TranslationTransform::new(translation)),
    };
    Ok(EstimateReport {
        transform,
        peak_value,
        peak_index,
        regions,
    })
}

/// Resampled moving image when it does not already share the fixed grid or
/// an initial transform is given; otherwise the input itself.
fn reconcile_grid<'a, const D: usize>(
    fixed: &Image<D>,
    moving: &'a Image<D>,
    config: &EstimateConfig<D>,
) -> FftRegResult<Cow<'a, Image<D>>> {
    if config.initial_transform.is_none() && fixed.grid().is_congruent(moving.grid()) {
        return Ok(Cow::Borrowed(moving));
    }
    let _span = trace_span!("reconcile_grid").entered();
    let transform = config
        .initial_transform
        .clone()
        .unwrap_or_else(Transform::identity);
    let params = ResampleParams {
        interpolator: Interpolator::Linear,
        default_value: config.masked_pixel_value.unwrap_or(0.0),
    };
    let resampled = resample_onto(moving, fixed.grid(), &transform, params)?;
    Ok(Cow::Owned(resampled))
}

/// Strongest regional-maximum region of `surface`: its bounding box centre
/// (continuous index), mean value and the number of candidate regions.
fn extract_peak<const D: usize>(surface: &Image<D>) -> FftRegResult<([f64; D], f64, usize)> {
    let _span = trace_span!("extract_peak").entered();
    let maxima = regional_maxima(surface);
    let labels = label_components(&maxima, surface.size())?;
    let stats = label_statistics(surface, &labels)?;
    trace_debug!("regions", count = stats.len());

    let best = select_peak(&stats)?;
    trace_debug!("selected_region", label = best.label, mean = best.mean);
    Ok((best.bounding_box_center(), best.mean, stats.len()))
}

#[cfg(test)]
mod tests {
    use super::{estimate_translation, estimate_translation_with_report, EstimateConfig};
    use crate::image::{Grid, Image};
    use crate::transform::TranslationTransform;
    use crate::util::FftRegError;

    fn blob(size: [usize; 2], center: [f64; 2]) -> Image<2> {
        Image::from_fn(Grid::new(size).unwrap(), |[x, y]| {
            let dx = x as f64 - center[0];
            let dy = y as f64 - center[1];
            (10.0 * (-(dx * dx + dy * dy) / 12.5).exp()) as f32
        })
    }

    #[test]
    fn identical_images_give_zero_translation() {
        let img = blob([64, 64], [30.0, 33.0]);
        let tx = estimate_translation(&img, &img, &EstimateConfig::default()).unwrap();
        assert!(!tx.is_composed());
        for t in tx.translation() {
            assert!(t.abs() < 1e-6, "got {t}");
        }
    }

    #[test]
    fn report_counts_regions() {
        let fixed = blob([64, 64], [30.0, 33.0]);
        let moving = blob([64, 64], [35.0, 30.0]);
        let report =
            estimate_translation_with_report(&fixed, &moving, &EstimateConfig::default()).unwrap();
        assert!(report.regions >= 1);
        assert!(report.peak_value > 0.9);
        let t = report.transform.translation();
        assert!((t[0] - 5.0).abs() < 0.5, "got {t:?}");
        assert!((t[1] + 3.0).abs() < 0.5, "got {t:?}");
    }

    #[test]
    fn flat_images_have_no_peak() {
        let img = Image::filled(Grid::new([16, 16]).unwrap(), 4.0);
        let err = estimate_translation(&img, &img, &EstimateConfig::default()).unwrap_err();
        assert_eq!(err, FftRegError::NoPeakFound);
    }

    #[test]
    fn builder_sets_fields() {
        let cfg = EstimateConfig::<2>::default()
            .with_required_overlap(0.3)
            .with_masked_pixel_value(-1.0)
            .with_initial_transform(TranslationTransform::new([1.0, 2.0]));
        assert_eq!(cfg.required_fraction_of_overlapping_pixels, 0.3);
        assert_eq!(cfg.masked_pixel_value, Some(-1.0));
        assert_eq!(cfg.initial_transform.unwrap().translation(), [1.0, 2.0]);
    }
}
