//! Spatial transforms mapping fixed-image points to moving-image points.
//!
//! Transforms are immutable values: updating a translation produces a new
//! transform through [`Transform::with_translation`] and never aliases the
//! caller's instance.

use crate::util::math::{add, identity};

mod affine;

pub use affine::AffineTransform;

/// Pure translation: `p -> p + t`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TranslationTransform<const D: usize> {
    offset: [f64; D],
}

impl<const D: usize> TranslationTransform<D> {
    /// Creates a translation by `offset`.
    pub fn new(offset: [f64; D]) -> Self {
        Self { offset }
    }

    /// The zero translation.
    pub fn identity() -> Self {
        Self { offset: [0.0; D] }
    }

    /// The translation vector.
    pub fn offset(&self) -> [f64; D] {
        self.offset
    }

    /// Maps a point.
    pub fn transform_point(&self, point: &[f64; D]) -> [f64; D] {
        add(point, &self.offset)
    }
}

impl<const D: usize> Default for TranslationTransform<D> {
    fn default() -> Self {
        Self::identity()
    }
}

/// Any transform the estimator accepts as an initial transform.
#[derive(Clone, Debug, PartialEq)]
pub enum Transform<const D: usize> {
    /// Pure translation.
    Translation(TranslationTransform<D>),
    /// Matrix, translation and centre of rotation.
    Affine(AffineTransform<D>),
}

impl<const D: usize> Transform<D> {
    /// The identity transform.
    pub fn identity() -> Self {
        Transform::Translation(TranslationTransform::identity())
    }

    /// Maps a point from fixed to moving space.
    pub fn transform_point(&self, point: &[f64; D]) -> [f64; D] {
        match self {
            Transform::Translation(t) => t.transform_point(point),
            Transform::Affine(a) => a.transform_point(point),
        }
    }

    /// Maps a displacement vector located at `at_point`.
    ///
    /// Neither variant is position dependent, so `at_point` only documents
    /// where the vector is anchored.
    pub fn transform_vector(&self, vector: &[f64; D], at_point: &[f64; D]) -> [f64; D] {
        let _ = at_point;
        match self {
            Transform::Translation(_) => *vector,
            Transform::Affine(a) => a.transform_vector(vector),
        }
    }

    /// The translation component.
    pub fn translation(&self) -> [f64; D] {
        match self {
            Transform::Translation(t) => t.offset(),
            Transform::Affine(a) => a.translation(),
        }
    }

    /// Returns a copy of this transform with its translation replaced.
    pub fn with_translation(&self, translation: [f64; D]) -> Self {
        match self {
            Transform::Translation(_) => {
                Transform::Translation(TranslationTransform::new(translation))
            }
            Transform::Affine(a) => Transform::Affine(a.with_translation(translation)),
        }
    }

    /// Linear part of the transform.
    pub fn matrix(&self) -> [[f64; D]; D] {
        match self {
            Transform::Translation(_) => identity::<D>(),
            Transform::Affine(a) => a.matrix(),
        }
    }
}

impl<const D: usize> From<TranslationTransform<D>> for Transform<D> {
    fn from(value: TranslationTransform<D>) -> Self {
        Transform::Translation(value)
    }
}

impl<const D: usize> From<AffineTransform<D>> for Transform<D> {
    fn from(value: AffineTransform<D>) -> Self {
        Transform::Affine(value)
    }
}

/// Adds a translation correction, expressed in the initial transform's
/// output frame, to `initial`.
///
/// The correction is mapped through the transform's vector rule at the
/// origin and added to the existing translation; the rest of the transform
/// is kept.
pub fn compose_translation<const D: usize>(
    initial: &Transform<D>,
    correction: &[f64; D],
) -> Transform<D> {
    let offset = initial.transform_vector(correction, &[0.0; D]);
    initial.with_translation(add(&initial.translation(), &offset))
}

/// Outcome of a translation estimate.
#[derive(Clone, Debug, PartialEq)]
pub enum EstimatedTransform<const D: usize> {
    /// No initial transform was supplied: the bare translation.
    Translation(TranslationTransform<D>),
    /// The initial transform with its translation updated.
    Composed(Transform<D>),
}

impl<const D: usize> EstimatedTransform<D> {
    /// Translation component of the result.
    pub fn translation(&self) -> [f64; D] {
        match self {
            EstimatedTransform::Translation(t) => t.offset(),
            EstimatedTransform::Composed(t) => t.translation(),
        }
    }

    /// True when the result was composed with an initial transform.
    pub fn is_composed(&self) -> bool {
        matches!(self, EstimatedTransform::Composed(_))
    }

    /// Converts into a general [`Transform`].
    pub fn into_transform(self) -> Transform<D> {
        match self {
            EstimatedTransform::Translation(t) => Transform::Translation(t),
            EstimatedTransform::Composed(t) => t,
        }
    }

    /// Maps a point from fixed to moving space.
    pub fn transform_point(&self, point: &[f64; D]) -> [f64; D] {
        match self {
            EstimatedTransform::Translation(t) => t.transform_point(point),
            EstimatedTransform::Composed(t) => t.transform_point(point),
        }
    }
}
