//! Centred affine transform: `p -> M (p - c) + c + t`.

use crate::util::math::{add, identity, mat_vec, sub};

/// Affine transform with a matrix, translation and fixed centre.
///
/// Covers rigid (Euler), similarity and general affine initial transforms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffineTransform<const D: usize> {
    matrix: [[f64; D]; D],
    translation: [f64; D],
    center: [f64; D],
}

impl<const D: usize> AffineTransform<D> {
    /// Creates a transform from its parts.
    pub fn new(matrix: [[f64; D]; D], translation: [f64; D], center: [f64; D]) -> Self {
        Self {
            matrix,
            translation,
            center,
        }
    }

    /// Identity matrix, zero translation, centre at the origin.
    pub fn identity() -> Self {
        Self::new(identity::<D>(), [0.0; D], [0.0; D])
    }

    /// Axis-aligned scaling about `center`.
    pub fn scaling(factors: [f64; D], center: [f64; D]) -> Self {
        let mut matrix = [[0.0; D]; D];
        for (i, row) in matrix.iter_mut().enumerate() {
            row[i] = factors[i];
        }
        Self::new(matrix, [0.0; D], center)
    }

    /// Linear part.
    pub fn matrix(&self) -> [[f64; D]; D] {
        self.matrix
    }

    /// Translation part.
    pub fn translation(&self) -> [f64; D] {
        self.translation
    }

    /// Fixed point of the linear part.
    pub fn center(&self) -> [f64; D] {
        self.center
    }

    /// Copy with a new translation.
    pub fn with_translation(&self, translation: [f64; D]) -> Self {
        Self {
            translation,
            ..*self
        }
    }

    /// Maps a point.
    pub fn transform_point(&self, point: &[f64; D]) -> [f64; D] {
        let rotated = mat_vec(&self.matrix, &sub(point, &self.center));
        add(&add(&rotated, &self.center), &self.translation)
    }

    /// Maps a vector (the translation and centre do not apply).
    pub fn transform_vector(&self, vector: &[f64; D]) -> [f64; D] {
        mat_vec(&self.matrix, vector)
    }
}

impl AffineTransform<2> {
    /// Counter-clockwise rotation by `angle_rad` about `center`.
    pub fn rotation_2d(angle_rad: f64, center: [f64; 2]) -> Self {
        let (sin, cos) = angle_rad.sin_cos();
        Self::new([[cos, -sin], [sin, cos]], [0.0; 2], center)
    }
}

impl AffineTransform<3> {
    /// Rotation by `angle_rad` about the z axis through `center`.
    pub fn rotation_z(angle_rad: f64, center: [f64; 3]) -> Self {
        let (sin, cos) = angle_rad.sin_cos();
        Self::new(
            [[cos, -sin, 0.0], [sin, cos, 0.0], [0.0, 0.0, 1.0]],
            [0.0; 3],
            center,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::AffineTransform;

    #[test]
    fn rotation_keeps_center_fixed() {
        let tx = AffineTransform::rotation_2d(0.7, [3.0, -2.0]);
        let p = tx.transform_point(&[3.0, -2.0]);
        assert!((p[0] - 3.0).abs() < 1e-12);
        assert!((p[1] + 2.0).abs() < 1e-12);
    }

    #[test]
    fn scaling_then_translation() {
        let tx = AffineTransform::scaling([2.0, 0.5, 1.0], [1.0, 1.0, 1.0]).with_translation([0.0, 0.0, 5.0]);
        let p = tx.transform_point(&[2.0, 3.0, 0.0]);
        assert_eq!(p, [3.0, 2.0, 5.0]);
        assert_eq!(tx.transform_vector(&[1.0, 1.0, 1.0]), [2.0, 0.5, 1.0]);
    }

    #[test]
    fn rotation_z_leaves_z_axis() {
        let tx = AffineTransform::rotation_z(std::f64::consts::PI, [0.0; 3]);
        let v = tx.transform_vector(&[1.0, 0.0, 4.0]);
        assert!((v[0] + 1.0).abs() < 1e-12);
        assert!(v[1].abs() < 1e-12);
        assert_eq!(v[2], 4.0);
    }
}
