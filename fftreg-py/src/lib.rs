//! Python bindings for the fftreg translation estimator.
//!
//! Arrays arrive in numpy axis order (`z, y, x`); geometry arguments and the
//! returned translation use image axis order (`x, y, z`).

use numpy::{PyReadonlyArrayDyn, PyUntypedArrayMethods};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use fftreg::{
    estimate_translation_with_report, EstimateConfig, FftRegError, Grid, Image,
    TranslationTransform,
};

fn to_py_err(err: FftRegError) -> PyErr {
    match err {
        FftRegError::NoPeakFound => PyRuntimeError::new_err(err.to_string()),
        _ => PyValueError::new_err(err.to_string()),
    }
}

/// Estimated translation with details about the correlation peak.
#[pyclass]
#[derive(Clone)]
pub struct TranslationResult {
    /// Translation in physical units, x first.
    #[pyo3(get)]
    pub translation: Vec<f64>,
    /// True when the estimate was added onto an initial translation.
    #[pyo3(get)]
    pub composed: bool,
    /// Mean correlation of the winning peak region.
    #[pyo3(get)]
    pub peak_value: f64,
    /// Number of candidate peak regions.
    #[pyo3(get)]
    pub regions: usize,
}

#[pymethods]
impl TranslationResult {
    fn __repr__(&self) -> String {
        format!(
            "TranslationResult(translation={:?}, composed={}, peak_value={:.4}, regions={})",
            self.translation,
            if self.composed { "True" } else { "False" },
            self.peak_value,
            self.regions
        )
    }
}

struct Options {
    fixed_spacing: Option<Vec<f64>>,
    fixed_origin: Option<Vec<f64>>,
    moving_spacing: Option<Vec<f64>>,
    moving_origin: Option<Vec<f64>>,
    required_fraction_of_overlapping_pixels: f64,
    initial_translation: Option<Vec<f64>>,
    masked_pixel_value: Option<f32>,
}

fn to_array<const D: usize>(values: &[f64], what: &str) -> PyResult<[f64; D]> {
    <[f64; D]>::try_from(values)
        .map_err(|_| PyValueError::new_err(format!("{what} must have {D} entries")))
}

fn to_image<const D: usize>(
    array: &PyReadonlyArrayDyn<'_, f32>,
    spacing: Option<&[f64]>,
    origin: Option<&[f64]>,
) -> PyResult<Image<D>> {
    let shape = array.shape();
    let size: [usize; D] = std::array::from_fn(|i| shape[D - 1 - i]);
    let mut grid = Grid::new(size).map_err(to_py_err)?;
    if let Some(spacing) = spacing {
        grid = grid
            .with_spacing(to_array(spacing, "spacing")?)
            .map_err(to_py_err)?;
    }
    if let Some(origin) = origin {
        grid = grid
            .with_origin(to_array(origin, "origin")?)
            .map_err(to_py_err)?;
    }
    // logical C order is x fastest once the axes are reversed
    let data = array.as_array().iter().copied().collect();
    Image::new(grid, data).map_err(to_py_err)
}

fn run<const D: usize>(
    fixed: &PyReadonlyArrayDyn<'_, f32>,
    moving: &PyReadonlyArrayDyn<'_, f32>,
    options: &Options,
) -> PyResult<TranslationResult> {
    let fixed = to_image::<D>(
        fixed,
        options.fixed_spacing.as_deref(),
        options.fixed_origin.as_deref(),
    )?;
    let moving = to_image::<D>(
        moving,
        options.moving_spacing.as_deref(),
        options.moving_origin.as_deref(),
    )?;

    let mut config =
        EstimateConfig::default().with_required_overlap(options.required_fraction_of_overlapping_pixels);
    if let Some(offset) = &options.initial_translation {
        config = config.with_initial_transform(TranslationTransform::new(to_array(
            offset,
            "initial_translation",
        )?));
    }
    if let Some(value) = options.masked_pixel_value {
        config = config.with_masked_pixel_value(value);
    }

    let report = estimate_translation_with_report(&fixed, &moving, &config).map_err(to_py_err)?;
    Ok(TranslationResult {
        translation: report.transform.translation().to_vec(),
        composed: report.transform.is_composed(),
        peak_value: report.peak_value,
        regions: report.regions,
    })
}

/// Estimate the translation aligning `moving` to `fixed`.
///
/// Args:
///     fixed: 2-D or 3-D float32 numpy array
///     moving: float32 numpy array with the same number of dimensions
///     fixed_spacing, fixed_origin: geometry of `fixed`, x first (default: unit spacing, zero origin)
///     moving_spacing, moving_origin: geometry of `moving`, x first
///     required_fraction_of_overlapping_pixels: minimum overlap fraction (default: 0.0)
///     initial_translation: translation applied to `moving` first; the estimate is added to it
///     masked_pixel_value: pixels with this value are ignored
///
/// Returns:
///     TranslationResult mapping fixed points to moving points
#[pyfunction]
#[pyo3(signature = (
    fixed,
    moving,
    *,
    fixed_spacing = None,
    fixed_origin = None,
    moving_spacing = None,
    moving_origin = None,
    required_fraction_of_overlapping_pixels = 0.0,
    initial_translation = None,
    masked_pixel_value = None
))]
#[allow(clippy::too_many_arguments)]
fn fft_based_translation_initialization(
    fixed: PyReadonlyArrayDyn<'_, f32>,
    moving: PyReadonlyArrayDyn<'_, f32>,
    fixed_spacing: Option<Vec<f64>>,
    fixed_origin: Option<Vec<f64>>,
    moving_spacing: Option<Vec<f64>>,
    moving_origin: Option<Vec<f64>>,
    required_fraction_of_overlapping_pixels: f64,
    initial_translation: Option<Vec<f64>>,
    masked_pixel_value: Option<f32>,
) -> PyResult<TranslationResult> {
    if fixed.ndim() != moving.ndim() {
        return Err(PyValueError::new_err(
            "fixed and moving must have the same number of dimensions",
        ));
    }
    let options = Options {
        fixed_spacing,
        fixed_origin,
        moving_spacing,
        moving_origin,
        required_fraction_of_overlapping_pixels,
        initial_translation,
        masked_pixel_value,
    };
    match fixed.ndim() {
        2 => run::<2>(&fixed, &moving, &options),
        3 => run::<3>(&fixed, &moving, &options),
        n => Err(PyValueError::new_err(format!(
            "expected 2-D or 3-D arrays, got {n}-D"
        ))),
    }
}

/// Python module for FFT-based translation initialization.
#[pymodule]
fn _fftreg(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<TranslationResult>()?;
    m.add_function(wrap_pyfunction!(fft_based_translation_initialization, m)?)?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    Ok(())
}
