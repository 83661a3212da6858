//! Weight-evaluation trait for grid transforms.
//!
//! This module defines the capability a grid transform needs from its
//! interpolation kernel, keeping the kernel pluggable by spline order.

use crate::support::SupportRegion;

/// Local interpolation weights over a control-point lattice.
///
/// An implementation is stateless and reusable across queries. For a
/// continuous grid coordinate it produces `(order + 1)^D` weights together
/// with the support anchor: the lexicographically-first node of the minimal
/// box containing every lattice node that influences the coordinate.
///
/// Weights are laid out in the canonical [`SupportRegion`] order (axis 0
/// fastest); weight k always refers to the k-th node of that enumeration.
pub trait WeightsFunction<const D: usize> {
    /// Spline order of the kernel.
    fn order(&self) -> usize;

    /// Number of weights in one evaluation (`(order + 1)^D`).
    fn num_weights(&self) -> usize {
        (self.order() + 1).pow(D as u32)
    }

    /// Anchor of the support box for a continuous grid coordinate.
    fn support_anchor(&self, index: &[f64; D]) -> [i64; D];

    /// Fill `weights` (length [`num_weights`](Self::num_weights)) for the
    /// given continuous grid coordinate and return the support anchor.
    ///
    /// Inside the valid region the weights form a partition of unity.
    fn evaluate(&self, index: &[f64; D], weights: &mut [f64]) -> [i64; D];

    /// True iff the full support box for `index` lies within
    /// `[0, size - 1]` on every axis, so no out-of-grid coefficient access
    /// is needed. Coordinates outside this region must not be evaluated;
    /// callers apply their boundary policy instead.
    fn inside_valid_region(&self, index: &[f64; D], grid_size: &[usize; D]) -> bool {
        let region = SupportRegion::new(self.support_anchor(index), self.order());
        let top = (region.width() - 1) as i64;
        (0..D).all(|j| {
            let anchor = region.anchor()[j];
            anchor >= 0 && anchor + top <= grid_size[j] as i64 - 1
        })
    }
}
