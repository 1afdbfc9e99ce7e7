//! Recursive (IIR) Gaussian smoothing.
//!
//! Each axis is filtered with the third-order causal/anti-causal recursion
//! of Young and van Vliet, whose cost does not depend on sigma. Sigma is
//! given in physical units and converted to pixels with the axis spacing.
//! Lines start from the steady state of a constant extension of the border
//! pixel, so constant images pass through unchanged.

use crate::image::Image;
use crate::trace::{trace_debug, trace_span};
use crate::util::{FftRegError, FftRegResult};

/// Smallest pixel sigma the recursion coefficients are valid for.
const MIN_PIXEL_SIGMA: f64 = 0.5;

/// Smoothing scale in physical units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Sigma<const D: usize> {
    /// Same sigma on every axis.
    Isotropic(f64),
    /// One sigma per axis.
    PerAxis([f64; D]),
}

impl<const D: usize> Sigma<D> {
    fn per_axis(&self) -> [f64; D] {
        match *self {
            Sigma::Isotropic(s) => [s; D],
            Sigma::PerAxis(s) => s,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Coefficients {
    gain: f64,
    b1: f64,
    b2: f64,
    b3: f64,
}

impl Coefficients {
    fn for_sigma(sigma: f64) -> Self {
        let sigma = sigma.max(MIN_PIXEL_SIGMA);
        let q = if sigma >= 2.5 {
            0.98711 * sigma - 0.96330
        } else {
            3.97156 - 4.14554 * (1.0 - 0.26891 * sigma).sqrt()
        };
        let q2 = q * q;
        let q3 = q2 * q;
        let b0 = 1.57825 + 2.44413 * q + 1.4281 * q2 + 0.422205 * q3;
        let b1 = (2.44413 * q + 2.85619 * q2 + 1.26661 * q3) / b0;
        let b2 = -(1.4281 * q2 + 1.26661 * q3) / b0;
        let b3 = (0.422205 * q3) / b0;
        Self {
            gain: 1.0 - (b1 + b2 + b3),
            b1,
            b2,
            b3,
        }
    }

    /// Filters `line` in place: causal pass, then anti-causal pass.
    fn apply(&self, line: &mut [f64]) {
        let n = line.len();
        if n < 2 {
            return;
        }

        let first = line[0];
        let (mut w1, mut w2, mut w3) = (first, first, first);
        for v in line.iter_mut() {
            let w = self.gain * *v + self.b1 * w1 + self.b2 * w2 + self.b3 * w3;
            w3 = w2;
            w2 = w1;
            w1 = w;
            *v = w;
        }

        let last = line[n - 1];
        let (mut y1, mut y2, mut y3) = (last, last, last);
        for v in line.iter_mut().rev() {
            let y = self.gain * *v + self.b1 * y1 + self.b2 * y2 + self.b3 * y3;
            y3 = y2;
            y2 = y1;
            y1 = y;
            *v = y;
        }
    }
}

/// Smooths `image` with a recursive Gaussian of the given physical sigma.
///
/// Filtering runs in `f64`; the result is stored as `f32`. Axes with a
/// single pixel are left untouched.
pub fn smoothing_recursive_gaussian<const D: usize>(
    image: &Image<D>,
    sigma: Sigma<D>,
) -> FftRegResult<Image<D>> {
    let sigmas = sigma.per_axis();
    if sigmas.iter().any(|s| !s.is_finite() || *s <= 0.0) {
        return Err(FftRegError::InvalidInput("sigma must be positive and finite"));
    }
    let _span = trace_span!("gaussian", sigma0 = sigmas[0]).entered();

    let size = image.size();
    let spacing = image.spacing();
    let strides = image.grid().strides();
    let mut buf: Vec<f64> = image.data().iter().map(|&v| f64::from(v)).collect();

    for axis in 0..D {
        let len = size[axis];
        if len < 2 {
            continue;
        }
        let pixel_sigma = sigmas[axis] / spacing[axis];
        trace_debug!("gaussian_axis", axis = axis, pixel_sigma = pixel_sigma);
        let coeffs = Coefficients::for_sigma(pixel_sigma);

        let stride = strides[axis];
        let mut line = vec![0.0f64; len];
        for start in line_starts(&size, axis) {
            for (k, v) in line.iter_mut().enumerate() {
                *v = buf[start + k * stride];
            }
            coeffs.apply(&mut line);
            for (k, v) in line.iter().enumerate() {
                buf[start + k * stride] = *v;
            }
        }
    }

    let data = buf.into_iter().map(|v| v as f32).collect();
    Image::new(image.grid().clone(), data)
}

/// Flat offsets of the first pixel of every line running along `axis`.
pub(crate) fn line_starts<const D: usize>(size: &[usize; D], axis: usize) -> Vec<usize> {
    let total: usize = size.iter().product();
    let stride: usize = size[..axis].iter().product();
    let len = size[axis];
    let block = stride * len;
    let mut starts = Vec::with_capacity(total / len.max(1));
    let mut outer = 0;
    while outer < total {
        for inner in 0..stride {
            starts.push(outer + inner);
        }
        outer += block;
    }
    starts
}
