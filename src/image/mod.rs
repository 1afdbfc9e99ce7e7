//! Owned scalar images with physical geometry.
//!
//! `Image` pairs a flat `f32` buffer (axis 0 fastest) with a [`Grid`]. The
//! estimator never mutates caller images; every stage returns a new image.

use crate::util::{FftRegError, FftRegResult};

pub mod grid;
#[cfg(feature = "image-io")]
pub mod io;

pub use grid::Grid;

/// Scalar image of dimension `D`.
#[derive(Clone, Debug, PartialEq)]
pub struct Image<const D: usize> {
    grid: Grid<D>,
    data: Vec<f32>,
}

/// 2-D image.
pub type Image2 = Image<2>;
/// 3-D image.
pub type Image3 = Image<3>;
/// 2-D grid.
pub type Grid2 = Grid<2>;
/// 3-D grid.
pub type Grid3 = Grid<3>;

impl<const D: usize> Image<D> {
    /// Wraps a pixel buffer; its length must equal the grid's pixel count.
    pub fn new(grid: Grid<D>, data: Vec<f32>) -> FftRegResult<Self> {
        let needed = grid.num_pixels();
        if data.len() < needed {
            return Err(FftRegError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(FftRegError::InvalidDimensions {
                size: grid.size().to_vec(),
            });
        }
        Ok(Self { grid, data })
    }

    /// Creates an image with every pixel set to `value`.
    pub fn filled(grid: Grid<D>, value: f32) -> Self {
        let data = vec![value; grid.num_pixels()];
        Self { grid, data }
    }

    /// Creates an image by evaluating `f` at every index.
    pub fn from_fn(grid: Grid<D>, mut f: impl FnMut([usize; D]) -> f32) -> Self {
        let data = (0..grid.num_pixels()).map(|i| f(grid.index_of(i))).collect();
        Self { grid, data }
    }

    /// Converts an 8-bit buffer to an `f32` image.
    pub fn from_u8(grid: Grid<D>, data: &[u8]) -> FftRegResult<Self> {
        Self::new(grid, data.iter().map(|&v| f32::from(v)).collect())
    }

    /// Returns the sampling grid.
    pub fn grid(&self) -> &Grid<D> {
        &self.grid
    }

    /// Extent in pixels along each axis.
    pub fn size(&self) -> [usize; D] {
        self.grid.size()
    }

    /// Pixel spacing.
    pub fn spacing(&self) -> [f64; D] {
        self.grid.spacing()
    }

    /// Origin.
    pub fn origin(&self) -> [f64; D] {
        self.grid.origin()
    }

    /// Direction cosine matrix.
    pub fn direction(&self) -> [[f64; D]; D] {
        self.grid.direction()
    }

    /// Pixel buffer (axis 0 fastest).
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable pixel buffer.
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consumes the image and returns its buffer.
    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    /// Returns the pixel at `index` if it is inside the image.
    pub fn get(&self, index: [usize; D]) -> Option<f32> {
        if index.iter().zip(self.size().iter()).any(|(i, s)| i >= s) {
            return None;
        }
        self.data.get(self.grid.linear_index(&index)).copied()
    }

    /// Sets the pixel at `index`; out-of-range indices are rejected.
    pub fn set(&mut self, index: [usize; D], value: f32) -> FftRegResult<()> {
        let size = self.size();
        if index.iter().zip(size.iter()).any(|(i, s)| i >= s) {
            return Err(FftRegError::InvalidInput("pixel index out of bounds"));
        }
        let linear = self.grid.linear_index(&index);
        self.data[linear] = value;
        Ok(())
    }

    /// Sets every pixel of the box `start .. start + extent` to `value`.
    ///
    /// The box is clipped to the image.
    pub fn fill_region(&mut self, start: [usize; D], extent: [usize; D], value: f32) {
        let size = self.size();
        let end: [usize; D] = std::array::from_fn(|i| (start[i] + extent[i]).min(size[i]));
        if (0..D).any(|i| start[i] >= end[i]) {
            return;
        }
        for linear in 0..self.data.len() {
            let index = self.grid.index_of(linear);
            if (0..D).all(|i| index[i] >= start[i] && index[i] < end[i]) {
                self.data[linear] = value;
            }
        }
    }

    /// Replaces the geometry while keeping the pixels; sizes must agree.
    pub fn with_grid(self, grid: Grid<D>) -> FftRegResult<Self> {
        if grid.size() != self.size() {
            return Err(FftRegError::SizeMismatch {
                expected: self.size().to_vec(),
                got: grid.size().to_vec(),
            });
        }
        Ok(Self {
            grid,
            data: self.data,
        })
    }

    /// Applies `f` to every pixel.
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        Self {
            grid: self.grid.clone(),
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Binary mask image: `1.0` where the pixel differs from `value`.
    pub fn mask_not_equal(&self, value: f32) -> Self {
        self.map(|v| if v != value { 1.0 } else { 0.0 })
    }

    /// Minimum and maximum pixel values.
    pub fn min_max(&self) -> (f32, f32) {
        self.data
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }
}
