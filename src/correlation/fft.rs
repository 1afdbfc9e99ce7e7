//! N-dimensional complex FFT over a flat buffer (axis 0 fastest).

use crate::filter::gaussian::line_starts;
use num_complex::Complex;
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Planned forward and inverse transforms for one buffer shape.
pub(crate) struct FftNd<const D: usize> {
    shape: [usize; D],
    forward: Vec<Arc<dyn Fft<f64>>>,
    inverse: Vec<Arc<dyn Fft<f64>>>,
}

impl<const D: usize> FftNd<D> {
    pub(crate) fn new(shape: [usize; D]) -> Self {
        let mut planner = FftPlanner::new();
        let forward = shape.iter().map(|&n| planner.plan_fft_forward(n)).collect();
        let inverse = shape.iter().map(|&n| planner.plan_fft_inverse(n)).collect();
        Self {
            shape,
            forward,
            inverse,
        }
    }

    pub(crate) fn shape(&self) -> [usize; D] {
        self.shape
    }

    pub(crate) fn len(&self) -> usize {
        self.shape.iter().product()
    }

    /// Unnormalized forward transform.
    pub(crate) fn forward(&self, buf: &mut [Complex<f64>]) {
        self.transform(buf, &self.forward);
    }

    /// Inverse transform scaled by `1 / len`, so `inverse(forward(x)) == x`.
    pub(crate) fn inverse(&self, buf: &mut [Complex<f64>]) {
        self.transform(buf, &self.inverse);
        let scale = 1.0 / self.len() as f64;
        for v in buf.iter_mut() {
            *v *= scale;
        }
    }

    fn transform(&self, buf: &mut [Complex<f64>], plans: &[Arc<dyn Fft<f64>>]) {
        debug_assert_eq!(buf.len(), self.len());
        for (axis, plan) in plans.iter().enumerate() {
            let len = self.shape[axis];
            if len < 2 {
                continue;
            }
            if axis == 0 {
                // contiguous lines
                #[cfg(feature = "rayon")]
                buf.par_chunks_mut(len).for_each(|line| plan.process(line));
                #[cfg(not(feature = "rayon"))]
                plan.process(buf);
                continue;
            }
            let stride: usize = self.shape[..axis].iter().product();
            let starts = line_starts(&self.shape, axis);
            transform_strided(buf, plan, &starts, len, stride);
        }
    }
}

#[cfg(not(feature = "rayon"))]
fn transform_strided(
    buf: &mut [Complex<f64>],
    plan: &Arc<dyn Fft<f64>>,
    starts: &[usize],
    len: usize,
    stride: usize,
) {
    let mut line = vec![Complex::new(0.0, 0.0); len];
    for &start in starts {
        for (k, v) in line.iter_mut().enumerate() {
            *v = buf[start + k * stride];
        }
        plan.process(&mut line);
        for (k, v) in line.iter().enumerate() {
            buf[start + k * stride] = *v;
        }
    }
}

#[cfg(feature = "rayon")]
fn transform_strided(
    buf: &mut [Complex<f64>],
    plan: &Arc<dyn Fft<f64>>,
    starts: &[usize],
    len: usize,
    stride: usize,
) {
    let src: &[Complex<f64>] = &*buf;
    let lines: Vec<Vec<Complex<f64>>> = starts
        .par_iter()
        .map(|&start| {
            let mut line: Vec<Complex<f64>> = (0..len).map(|k| src[start + k * stride]).collect();
            plan.process(&mut line);
            line
        })
        .collect();
    for (&start, line) in starts.iter().zip(lines.iter()) {
        for (k, v) in line.iter().enumerate() {
            buf[start + k * stride] = *v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FftNd;
    use num_complex::Complex;

    #[test]
    fn forward_inverse_roundtrip_3d() {
        let fft = FftNd::new([4, 3, 5]);
        let original: Vec<Complex<f64>> = (0..fft.len())
            .map(|i| Complex::new((i * 7 % 11) as f64, 0.0))
            .collect();
        let mut buf = original.clone();
        fft.forward(&mut buf);
        fft.inverse(&mut buf);
        for (a, b) in buf.iter().zip(original.iter()) {
            assert!((a - b).norm() < 1e-9);
        }
    }

    #[test]
    fn dc_term_is_sum() {
        let fft = FftNd::new([6, 4]);
        let mut buf: Vec<Complex<f64>> = (0..24).map(|i| Complex::new(i as f64, 0.0)).collect();
        fft.forward(&mut buf);
        assert!((buf[0].re - 276.0).abs() < 1e-9);
        assert!(buf[0].im.abs() < 1e-9);
        assert_eq!(fft.shape(), [6, 4]);
    }
}
