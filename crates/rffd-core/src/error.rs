//! Error types for transform operations.
//!
//! This module provides structured error types for grid-geometry and
//! parameter-buffer handling. Out-of-bounds query coordinates are not
//! errors; they fall under the transform's boundary policy.

use thiserror::Error;

/// Contributing cause attached to a parameter size mismatch when the
/// control grid has no lattice nodes.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("the control grid has zero lattice nodes; perhaps the grid geometry was never set")]
pub struct DegenerateGeometry;

/// Main error type for transform operations.
#[derive(Error, Debug)]
pub enum TransformError {
    /// Geometry descriptor vector has the wrong length.
    #[error("descriptor length mismatch: expected {expected} values, got {actual}")]
    DescriptorSizeMismatch { expected: usize, actual: usize },

    /// Parameter buffer length does not match D x number of lattice nodes.
    #[error("parameter size mismatch: expected {expected} values, got {actual}")]
    ParameterSizeMismatch {
        expected: usize,
        actual: usize,
        #[source]
        cause: Option<DegenerateGeometry>,
    },

    /// A coefficient grid's shape does not match the grid geometry.
    #[error("coefficient grid shape mismatch: expected {expected:?}, got {actual:?}")]
    GridShapeMismatch { expected: Vec<usize>, actual: Vec<usize> },

    /// A query was made before any parameters were ever set.
    #[error("parameters have not been set")]
    ParametersNotSet,

    /// The grid direction matrix is not invertible.
    #[error("direction matrix is singular and cannot map physical points to grid coordinates")]
    SingularDirection,
}

/// Result type for transform operations.
pub type Result<T> = std::result::Result<T, TransformError>;

impl TransformError {
    /// Create a parameter size mismatch, attaching the degenerate-grid
    /// cause when the grid has no lattice nodes.
    pub fn parameter_size_mismatch(expected: usize, actual: usize, lattice_nodes: usize) -> Self {
        Self::ParameterSizeMismatch {
            expected,
            actual,
            cause: (lattice_nodes == 0).then_some(DegenerateGeometry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = TransformError::DescriptorSizeMismatch { expected: 10, actual: 7 };
        assert_eq!(err.to_string(), "descriptor length mismatch: expected 10 values, got 7");
    }

    #[test]
    fn test_degenerate_cause_attached() {
        let err = TransformError::parameter_size_mismatch(0, 5, 0);
        assert!(err.source().is_some());
        assert!(err.source().unwrap().to_string().contains("zero lattice nodes"));
    }

    #[test]
    fn test_no_cause_for_plain_mismatch() {
        let err = TransformError::parameter_size_mismatch(200, 100, 100);
        assert!(err.source().is_none());
    }
}
