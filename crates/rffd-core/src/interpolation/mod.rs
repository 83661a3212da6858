//! Interpolation weight evaluation.
//!
//! This module provides the weight-evaluation capability used by grid
//! transforms: given a continuous grid coordinate, produce the local
//! interpolation weights and the anchor of their support region.

pub mod bspline;
pub mod trait_;

pub use bspline::BSplineWeightsFunction;
pub use trait_::WeightsFunction;
