//! Transform trait for spatial coordinate transformations.
//!
//! This module defines the core Transform trait that all spatial transforms
//! implement.

use crate::error::Result;
use crate::spatial::Point;

/// Transform trait for spatial coordinate transformations.
///
/// Maps points from one physical space to another. Implementations are pure
/// reads over their configured state: evaluation never mutates the transform,
/// so a configured transform can be queried from many threads at once.
///
/// # Type Parameters
/// * `D` - The spatial dimensionality
pub trait Transform<const D: usize> {
    /// Apply the transform to a single physical point.
    ///
    /// Fails only when the transform is not in a queryable state (for
    /// parametric transforms, before parameters were ever assigned).
    fn transform_point(&self, point: &Point<D>) -> Result<Point<D>>;

    /// Total number of parameters that define the transform.
    fn num_parameters(&self) -> usize;
}
