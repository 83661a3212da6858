//! Transform types and operations.
//!
//! This module provides the transform trait, control-grid geometry, and the
//! B-spline free-form deformation transform.

pub mod bspline;
pub mod grid;
pub mod trait_;

pub use bspline::{BSplineTransform, ParameterOwnership, SupportJacobian};
pub use grid::GridGeometry;
pub use trait_::Transform;

/// Cubic B-spline deformation over a 2D grid.
pub type BSplineTransform2<'a> = BSplineTransform<'a, 2>;
/// Cubic B-spline deformation over a 3D grid.
pub type BSplineTransform3<'a> = BSplineTransform<'a, 3>;
