//! Direction type for representing grid orientation.
//!
//! Direction matrices represent the orientation of grid axes in physical space.

use super::Vector;
use nalgebra::SMatrix;
use serde::{Deserialize, Serialize};

/// Direction matrix representing grid orientation.
///
/// The direction matrix is a D×D matrix where column i represents the
/// direction of the i-th grid axis in physical space.
///
/// This is a thin wrapper around nalgebra's SMatrix to provide
/// domain-specific functionality while maintaining all nalgebra operations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Direction<const D: usize>(pub SMatrix<f64, D, D>);

impl<const D: usize> Direction<D> {
    /// Create an identity direction matrix (no rotation).
    pub fn identity() -> Self {
        Self(SMatrix::identity())
    }

    /// Build a direction matrix from a row-major slice of D*D entries.
    pub fn from_row_major(entries: &[f64]) -> Self {
        assert!(entries.len() == D * D, "Direction slice length must be D*D");
        let mut m = SMatrix::zeros();
        for r in 0..D {
            for c in 0..D {
                m[(r, c)] = entries[r * D + c];
            }
        }
        Self(m)
    }

    /// Flatten the matrix into a row-major vector of D*D entries.
    pub fn to_row_major(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(D * D);
        for r in 0..D {
            for c in 0..D {
                out.push(self.0[(r, c)]);
            }
        }
        out
    }

    /// Check if direction matrix is orthogonal (rotation matrix).
    pub fn is_orthogonal(&self) -> bool {
        let product = self.0 * self.0.transpose();
        let identity = Self::identity();
        (0..D).all(|i| (0..D).all(|j| (product[(i, j)] - identity.0[(i, j)]).abs() < 1e-6))
    }

    /// Try to compute the inverse of the direction matrix.
    pub fn try_inverse(&self) -> Option<Self> {
        self.0.try_inverse().map(Self)
    }

    /// Get the inner nalgebra matrix.
    pub fn inner(&self) -> &SMatrix<f64, D, D> {
        &self.0
    }
}

impl<const D: usize> std::ops::Index<(usize, usize)> for Direction<D> {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &Self::Output {
        &self.0[index]
    }
}

impl<const D: usize> std::ops::IndexMut<(usize, usize)> for Direction<D> {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut Self::Output {
        &mut self.0[index]
    }
}

impl<const D: usize> std::ops::Mul<Vector<D>> for Direction<D> {
    type Output = Vector<D>;

    fn mul(self, vector: Vector<D>) -> Self::Output {
        Vector(self.0 * vector.0)
    }
}
