//! Sampling grid: size, spacing, origin and direction of an image.
//!
//! A continuous index `i` maps to the physical point
//! `origin + direction * diag(spacing) * i`. Integer indices address pixel
//! centres, so a pixel's continuous footprint is `[i - 0.5, i + 0.5)`.

use crate::util::math::{identity, invert, mat_vec, sub};
use crate::util::{FftRegError, FftRegResult};

/// Geometry of a `D`-dimensional sampled image.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<const D: usize> {
    size: [usize; D],
    spacing: [f64; D],
    origin: [f64; D],
    direction: [[f64; D]; D],
    index_to_physical: [[f64; D]; D],
    physical_to_index: [[f64; D]; D],
}

impl<const D: usize> Grid<D> {
    /// Creates a grid with unit spacing, zero origin and identity direction.
    pub fn new(size: [usize; D]) -> FftRegResult<Self> {
        check_size(&size)?;
        let eye = identity::<D>();
        Ok(Self {
            size,
            spacing: [1.0; D],
            origin: [0.0; D],
            direction: eye,
            index_to_physical: eye,
            physical_to_index: eye,
        })
    }

    /// Replaces the pixel spacing; every entry must be positive and finite.
    pub fn with_spacing(mut self, spacing: [f64; D]) -> FftRegResult<Self> {
        if spacing.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(FftRegError::InvalidInput("spacing must be positive and finite"));
        }
        self.spacing = spacing;
        self.refresh()?;
        Ok(self)
    }

    /// Replaces the origin.
    pub fn with_origin(mut self, origin: [f64; D]) -> FftRegResult<Self> {
        if origin.iter().any(|o| !o.is_finite()) {
            return Err(FftRegError::InvalidInput("origin must be finite"));
        }
        self.origin = origin;
        Ok(self)
    }

    /// Replaces the direction cosine matrix (row-major; column `j` is axis `j`).
    pub fn with_direction(mut self, direction: [[f64; D]; D]) -> FftRegResult<Self> {
        self.direction = direction;
        self.refresh()?;
        Ok(self)
    }

    /// Replaces the size, keeping spacing, origin and direction.
    pub fn with_size(mut self, size: [usize; D]) -> FftRegResult<Self> {
        check_size(&size)?;
        self.size = size;
        Ok(self)
    }

    fn refresh(&mut self) -> FftRegResult<()> {
        let mut m = self.direction;
        for row in m.iter_mut() {
            for (v, s) in row.iter_mut().zip(self.spacing.iter()) {
                *v *= s;
            }
        }
        let inv = invert(&m).ok_or(FftRegError::SingularDirection)?;
        self.index_to_physical = m;
        self.physical_to_index = inv;
        Ok(())
    }

    /// Extent in pixels along each axis.
    pub fn size(&self) -> [usize; D] {
        self.size
    }

    /// Physical distance between neighbouring pixels along each axis.
    pub fn spacing(&self) -> [f64; D] {
        self.spacing
    }

    /// Physical position of the pixel at index zero.
    pub fn origin(&self) -> [f64; D] {
        self.origin
    }

    /// Direction cosine matrix.
    pub fn direction(&self) -> [[f64; D]; D] {
        self.direction
    }

    /// Total number of pixels.
    pub fn num_pixels(&self) -> usize {
        self.size.iter().product()
    }

    /// Maps a continuous index to a physical point.
    pub fn continuous_index_to_physical_point(&self, index: &[f64; D]) -> [f64; D] {
        let offset = mat_vec(&self.index_to_physical, index);
        std::array::from_fn(|i| self.origin[i] + offset[i])
    }

    /// Maps a physical point to a continuous index.
    pub fn physical_point_to_continuous_index(&self, point: &[f64; D]) -> [f64; D] {
        mat_vec(&self.physical_to_index, &sub(point, &self.origin))
    }

    /// Maps an integer index to a physical point.
    pub fn index_to_physical_point(&self, index: &[usize; D]) -> [f64; D] {
        let cidx = index.map(|i| i as f64);
        self.continuous_index_to_physical_point(&cidx)
    }

    /// Returns true when both grids sample space at the same locations.
    ///
    /// Comparison is exact, matching a tuple equality on the metadata.
    pub fn is_congruent(&self, other: &Grid<D>) -> bool {
        self.size == other.size
            && self.spacing == other.spacing
            && self.origin == other.origin
            && self.direction == other.direction
    }

    /// Flattens an index (axis 0 fastest).
    pub fn linear_index(&self, index: &[usize; D]) -> usize {
        let mut linear = 0usize;
        for axis in (0..D).rev() {
            linear = linear * self.size[axis] + index[axis];
        }
        linear
    }

    /// Inverse of [`Grid::linear_index`].
    pub fn index_of(&self, mut linear: usize) -> [usize; D] {
        let mut index = [0usize; D];
        for axis in 0..D {
            index[axis] = linear % self.size[axis];
            linear /= self.size[axis];
        }
        index
    }

    /// Element stride of each axis in the flat buffer.
    pub fn strides(&self) -> [usize; D] {
        let mut strides = [1usize; D];
        for axis in 1..D {
            strides[axis] = strides[axis - 1] * self.size[axis - 1];
        }
        strides
    }
}

fn check_size<const D: usize>(size: &[usize; D]) -> FftRegResult<()> {
    if D == 0 || size.iter().any(|&s| s == 0) {
        return Err(FftRegError::InvalidDimensions {
            size: size.to_vec(),
        });
    }
    size.iter()
        .try_fold(1usize, |acc, &s| acc.checked_mul(s))
        .ok_or(FftRegError::InvalidDimensions {
            size: size.to_vec(),
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Grid;
    use crate::util::FftRegError;

    #[test]
    fn index_physical_roundtrip_with_direction() {
        let grid = Grid::new([10, 20])
            .unwrap()
            .with_spacing([0.5, 2.0])
            .unwrap()
            .with_origin([3.0, -1.0])
            .unwrap()
            .with_direction([[0.0, -1.0], [1.0, 0.0]])
            .unwrap();

        let p = grid.continuous_index_to_physical_point(&[2.0, 1.5]);
        // axis 0 points along +y, axis 1 along -x
        assert!((p[0] - (3.0 - 3.0)).abs() < 1e-12);
        assert!((p[1] - (-1.0 + 1.0)).abs() < 1e-12);

        let back = grid.physical_point_to_continuous_index(&p);
        assert!((back[0] - 2.0).abs() < 1e-12);
        assert!((back[1] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn linear_index_is_axis0_fastest() {
        let grid = Grid::new([4, 3, 2]).unwrap();
        assert_eq!(grid.linear_index(&[1, 0, 0]), 1);
        assert_eq!(grid.linear_index(&[0, 1, 0]), 4);
        assert_eq!(grid.linear_index(&[0, 0, 1]), 12);
        assert_eq!(grid.index_of(17), [1, 1, 1]);
        assert_eq!(grid.strides(), [1, 4, 12]);
    }

    #[test]
    fn rejects_bad_geometry() {
        assert_eq!(
            Grid::new([0, 4]).err(),
            Some(FftRegError::InvalidDimensions { size: vec![0, 4] })
        );
        assert!(Grid::new([4, 4]).unwrap().with_spacing([1.0, 0.0]).is_err());
        assert_eq!(
            Grid::new([4, 4])
                .unwrap()
                .with_direction([[1.0, 1.0], [1.0, 1.0]])
                .err(),
            Some(FftRegError::SingularDirection)
        );
    }

    #[test]
    fn congruence_is_exact() {
        let a = Grid::new([8, 8]).unwrap();
        let b = a.clone().with_origin([0.0, 1e-9]).unwrap();
        assert!(a.is_congruent(&a.clone()));
        assert!(!a.is_congruent(&b));
        assert!(!a.is_congruent(&a.clone().with_size([8, 9]).unwrap()));
    }
}
