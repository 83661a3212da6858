//! B-spline free-form deformation transform.
//!
//! A smooth deformation field defined by a regular grid of control-point
//! coefficients. The flat parameter vector holds one coefficient grid per
//! output dimension, dimension-major; the transform reinterprets that single
//! buffer as D same-shaped grids without copying and evaluates displacements
//! from the local B-spline support of each queried point.

use std::borrow::Cow;
use std::fmt;

use ndarray::{ArrayD, ArrayViewD, Dimension, IxDyn, ShapeBuilder};

use crate::error::{Result, TransformError};
use crate::interpolation::{BSplineWeightsFunction, WeightsFunction};
use crate::spatial::{Point, Vector};
use crate::support::SupportRegion;
use crate::transform::grid::GridGeometry;
use crate::transform::trait_::Transform;

/// Ownership state of the transform's parameter buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterOwnership {
    /// No parameters have been assigned yet.
    Unset,
    /// The transform aliases a caller-owned buffer.
    Borrowed,
    /// The transform owns its buffer internally.
    Owned,
}

/// Interpolation weights and flat parameter offsets of the support region
/// used at one evaluated point.
///
/// `weights[k]` and `indexes[k]` refer to the same lattice node for every k.
/// Offsets are relative to dimension 0's coefficient grid; applying them to
/// output dimension j requires adding `j * num_parameters_per_dimension`.
///
/// A point outside the valid region yields all-zero weights and all-zero
/// indexes, signalling "no influence" rather than a zero Jacobian at a
/// valid support.
#[derive(Debug, Clone, PartialEq)]
pub struct SupportJacobian {
    pub weights: Vec<f64>,
    pub indexes: Vec<usize>,
}

impl SupportJacobian {
    fn zeroed(len: usize) -> Self {
        Self { weights: vec![0.0; len], indexes: vec![0; len] }
    }

    /// True for the "no influence" result produced outside the valid region.
    pub fn is_zero(&self) -> bool {
        self.weights.iter().all(|&w| w == 0.0)
    }
}

/// B-spline free-form deformation transform.
///
/// The lifetime `'a` ties the transform to a parameter buffer assigned with
/// [`set_parameters`](Self::set_parameters); buffers assigned by value are
/// owned internally and place no constraint on `'a`.
///
/// Evaluation takes `&self` only, so a configured transform may be queried
/// concurrently from many threads between mutations.
#[derive(Debug)]
pub struct BSplineTransform<'a, const D: usize, const ORDER: usize = 3> {
    geometry: GridGeometry<D>,
    weights_function: BSplineWeightsFunction<D, ORDER>,
    parameters: Option<Cow<'a, [f64]>>,
    modified_count: u64,
}

impl<'a, const D: usize, const ORDER: usize> BSplineTransform<'a, D, ORDER> {
    /// Create a transform over the given control grid, with no parameters
    /// assigned.
    pub fn new(geometry: GridGeometry<D>) -> Self {
        Self {
            geometry,
            weights_function: BSplineWeightsFunction::new(),
            parameters: None,
            modified_count: 0,
        }
    }

    /// Create a transform from a packed geometry descriptor.
    pub fn from_descriptor(descriptor: &[f64]) -> Result<Self> {
        Ok(Self::new(GridGeometry::from_descriptor(descriptor)?))
    }

    /// The control grid geometry.
    pub fn geometry(&self) -> &GridGeometry<D> {
        &self.geometry
    }

    /// Replace the control grid geometry.
    ///
    /// A previously assigned parameter buffer whose length no longer matches
    /// the new grid is invalidated and must be re-assigned before the next
    /// query.
    pub fn set_geometry(&mut self, geometry: GridGeometry<D>) {
        let required = D * geometry.num_lattice_nodes();
        if self.parameters.as_ref().is_some_and(|p| p.len() != required) {
            self.parameters = None;
        }
        self.geometry = geometry;
        self.mark_modified();
        tracing::debug!(lattice_nodes = self.geometry.num_lattice_nodes(), "grid geometry replaced");
    }

    /// Total number of parameters: D coefficient grids of
    /// [`num_parameters_per_dimension`](Self::num_parameters_per_dimension)
    /// values each.
    pub fn num_parameters(&self) -> usize {
        D * self.num_parameters_per_dimension()
    }

    /// Number of coefficients in one output dimension's grid.
    pub fn num_parameters_per_dimension(&self) -> usize {
        self.geometry.num_lattice_nodes()
    }

    /// Number of weights affecting any single evaluated point.
    pub fn num_affected_weights(&self) -> usize {
        self.weights_function.num_weights()
    }

    /// Monotone counter incremented by every successful mutation.
    ///
    /// Downstream caches key on this value. Assigning a buffer always counts
    /// as a modification: only a reference is held, so old and new contents
    /// are never compared.
    pub fn modified_count(&self) -> u64 {
        self.modified_count
    }

    /// Current ownership state of the parameter buffer.
    pub fn parameter_ownership(&self) -> ParameterOwnership {
        match &self.parameters {
            None => ParameterOwnership::Unset,
            Some(Cow::Borrowed(_)) => ParameterOwnership::Borrowed,
            Some(Cow::Owned(_)) => ParameterOwnership::Owned,
        }
    }

    /// Assign a caller-owned parameter buffer without copying.
    ///
    /// The buffer must stay alive and unchanged in length for as long as the
    /// transform is queried; the borrow checker enforces this through `'a`.
    /// Its length must equal [`num_parameters`](Self::num_parameters).
    pub fn set_parameters(&mut self, buffer: &'a [f64]) -> Result<()> {
        self.check_parameter_length(buffer.len())?;
        self.parameters = Some(Cow::Borrowed(buffer));
        self.mark_modified();
        tracing::debug!(len = buffer.len(), "parameter buffer borrowed");
        Ok(())
    }

    /// Copy a parameter buffer into internal storage and assign it.
    pub fn set_parameters_by_value(&mut self, buffer: &[f64]) -> Result<()> {
        self.check_parameter_length(buffer.len())?;
        self.parameters = Some(Cow::Owned(buffer.to_vec()));
        self.mark_modified();
        tracing::debug!(len = buffer.len(), "parameter buffer copied");
        Ok(())
    }

    /// Reset to the identity mapping (all-zero coefficients).
    ///
    /// An internally owned buffer is zeroed in place; otherwise the transform
    /// switches to a fresh zeroed buffer it owns.
    pub fn set_identity(&mut self) {
        match &mut self.parameters {
            Some(Cow::Owned(buffer)) => buffer.iter_mut().for_each(|c| *c = 0.0),
            _ => self.parameters = Some(Cow::Owned(vec![0.0; self.num_parameters()])),
        }
        self.mark_modified();
    }

    /// The currently active parameter buffer.
    pub fn parameters(&self) -> Result<&[f64]> {
        self.parameters.as_deref().ok_or(TransformError::ParametersNotSet)
    }

    /// Zero-copy view of output dimension `dimension`'s coefficients, shaped
    /// per the grid geometry with axis 0 varying fastest.
    ///
    /// Views are derived from the current buffer on every call; they can
    /// never outlive a buffer swap or geometry change.
    pub fn coefficient_grid(&self, dimension: usize) -> Result<ArrayViewD<'_, f64>> {
        assert!(dimension < D, "Coefficient grid dimension out of range");
        let per_dim = self.num_parameters_per_dimension();
        let buffer = self.parameters()?;
        let slice = &buffer[dimension * per_dim..(dimension + 1) * per_dim];
        let size = self.geometry.size();
        let view = ArrayViewD::from_shape(IxDyn(&size).f(), slice)
            .expect("buffer length is validated against the grid shape on assignment");
        Ok(view)
    }

    /// Pack D per-dimension coefficient grids into a fresh owned buffer.
    ///
    /// Each grid's shape must equal the geometry's size.
    pub fn set_coefficient_grids(&mut self, grids: &[ArrayD<f64>; D]) -> Result<()> {
        let size = self.geometry.size();
        for grid in grids {
            if grid.shape() != size.as_slice() {
                return Err(TransformError::GridShapeMismatch {
                    expected: size.to_vec(),
                    actual: grid.shape().to_vec(),
                });
            }
        }

        let per_dim = self.num_parameters_per_dimension();
        let mut buffer = vec![0.0; self.num_parameters()];
        for (j, grid) in grids.iter().enumerate() {
            for (node, &value) in grid.indexed_iter() {
                let flat = self.geometry.flat_offset(node.slice());
                buffer[j * per_dim + flat] = value;
            }
        }

        self.parameters = Some(Cow::Owned(buffer));
        self.mark_modified();
        Ok(())
    }

    /// True iff the full B-spline support of `point` lies inside the grid.
    ///
    /// Points for which this is false are passed through unchanged by
    /// [`transform_point`](Self::transform_point): displacement is assumed
    /// zero there. This boundary policy is a known approximation near grid
    /// borders, not a guarantee about the underlying field.
    pub fn is_inside_valid_region(&self, point: &Point<D>) -> bool {
        let index = self.geometry.continuous_index(point);
        self.weights_function.inside_valid_region(&index, &self.geometry.size())
    }

    /// Transform a physical point through the deformation field.
    pub fn transform_point(&self, point: &Point<D>) -> Result<Point<D>> {
        Ok(self.transform_point_with_support(point)?.0)
    }

    /// Transform a physical point, also yielding the support weights and
    /// flat offsets used and whether the point lay inside the valid region.
    pub fn transform_point_with_support(
        &self,
        point: &Point<D>,
    ) -> Result<(Point<D>, SupportJacobian, bool)> {
        let buffer = self.parameters()?;
        let index = self.geometry.continuous_index(point);

        if !self.weights_function.inside_valid_region(&index, &self.geometry.size()) {
            let zero = SupportJacobian::zeroed(self.num_affected_weights());
            return Ok((*point, zero, false));
        }

        let support = self.evaluate_support(&index);
        let per_dim = self.num_parameters_per_dimension();
        let mut displacement = Vector::<D>::zeros();
        for (&w, &flat) in support.weights.iter().zip(&support.indexes) {
            for j in 0..D {
                displacement[j] += w * buffer[j * per_dim + flat];
            }
        }

        Ok((*point + displacement, support, true))
    }

    /// Interpolation weights and flat parameter offsets of the support
    /// region at a physical point.
    ///
    /// Outside the valid region, all weights and all indexes are zero.
    /// Offsets are relative to dimension 0's grid; see [`SupportJacobian`].
    pub fn compute_support_jacobian(&self, point: &Point<D>) -> Result<SupportJacobian> {
        self.parameters()?;
        let index = self.geometry.continuous_index(point);

        if !self.weights_function.inside_valid_region(&index, &self.geometry.size()) {
            return Ok(SupportJacobian::zeroed(self.num_affected_weights()));
        }

        Ok(self.evaluate_support(&index))
    }

    /// Evaluate weights and flat offsets over one support-region walk, so
    /// entry k of both sequences names the same lattice node.
    fn evaluate_support(&self, index: &[f64; D]) -> SupportJacobian {
        let mut weights = vec![0.0; self.num_affected_weights()];
        let anchor = self.weights_function.evaluate(index, &mut weights);

        let region = SupportRegion::new(anchor, ORDER);
        let indexes = region
            .nodes()
            .map(|node| self.geometry.flat_offset(&node.map(|c| c as usize)))
            .collect();

        SupportJacobian { weights, indexes }
    }

    fn check_parameter_length(&self, actual: usize) -> Result<()> {
        let expected = self.num_parameters();
        if actual != expected {
            return Err(TransformError::parameter_size_mismatch(
                expected,
                actual,
                self.geometry.num_lattice_nodes(),
            ));
        }
        Ok(())
    }

    fn mark_modified(&mut self) {
        self.modified_count += 1;
    }
}

impl<const D: usize, const ORDER: usize> Transform<D> for BSplineTransform<'_, D, ORDER> {
    fn transform_point(&self, point: &Point<D>) -> Result<Point<D>> {
        BSplineTransform::transform_point(self, point)
    }

    fn num_parameters(&self) -> usize {
        BSplineTransform::num_parameters(self)
    }
}

impl<const D: usize, const ORDER: usize> fmt::Display for BSplineTransform<'_, D, ORDER> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ownership = match self.parameter_ownership() {
            ParameterOwnership::Unset => "unset",
            ParameterOwnership::Borrowed => "borrowed",
            ParameterOwnership::Owned => "owned",
        };
        write!(
            f,
            "BSplineTransform<{D}, order {ORDER}>: grid {:?}, {} parameters ({ownership})",
            self.geometry.size(),
            self.num_parameters(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::{Direction, Spacing};

    fn grid_10x10() -> GridGeometry<2> {
        GridGeometry::new([10, 10], Point::origin(), Spacing::uniform(1.0), Direction::identity())
            .unwrap()
    }

    #[test]
    fn test_unset_parameters_rejected() {
        let transform = BSplineTransform::<2>::new(grid_10x10());
        assert!(matches!(transform.parameters(), Err(TransformError::ParametersNotSet)));
        assert!(matches!(
            transform.transform_point(&Point::new([5.0, 5.0])),
            Err(TransformError::ParametersNotSet)
        ));
        assert!(matches!(
            transform.compute_support_jacobian(&Point::new([5.0, 5.0])),
            Err(TransformError::ParametersNotSet)
        ));
    }

    #[test]
    fn test_ownership_transitions() {
        let buffer = vec![0.0; 200];
        let mut transform = BSplineTransform::<2>::new(grid_10x10());
        assert_eq!(transform.parameter_ownership(), ParameterOwnership::Unset);

        transform.set_parameters(&buffer).unwrap();
        assert_eq!(transform.parameter_ownership(), ParameterOwnership::Borrowed);

        transform.set_identity();
        assert_eq!(transform.parameter_ownership(), ParameterOwnership::Owned);

        transform.set_parameters(&buffer).unwrap();
        assert_eq!(transform.parameter_ownership(), ParameterOwnership::Borrowed);
    }

    #[test]
    fn test_modified_count_increments() {
        let buffer = vec![0.0; 200];
        let mut transform = BSplineTransform::<2>::new(grid_10x10());
        let before = transform.modified_count();
        transform.set_identity();
        let after_identity = transform.modified_count();
        assert!(after_identity > before);

        // Re-assigning identical contents still counts as a modification.
        transform.set_parameters(&buffer).unwrap();
        transform.set_parameters(&buffer).unwrap();
        assert_eq!(transform.modified_count(), after_identity + 2);
    }

    #[test]
    fn test_geometry_change_invalidates_mismatched_buffer() {
        let mut transform = BSplineTransform::<2>::new(grid_10x10());
        transform.set_identity();
        assert!(transform.parameters().is_ok());

        let smaller =
            GridGeometry::new([5, 5], Point::origin(), Spacing::uniform(1.0), Direction::identity())
                .unwrap();
        transform.set_geometry(smaller);
        assert!(matches!(transform.parameters(), Err(TransformError::ParametersNotSet)));
    }

    #[test]
    fn test_degenerate_grid_reported_as_cause() {
        use std::error::Error as _;

        let degenerate =
            GridGeometry::new([0, 4], Point::origin(), Spacing::uniform(1.0), Direction::identity())
                .unwrap();
        let mut transform = BSplineTransform::<2>::new(degenerate);
        let err = transform.set_parameters_by_value(&[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, TransformError::ParameterSizeMismatch { expected: 0, actual: 3, .. }));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_coefficient_grid_view_shape_and_aliasing() {
        let mut buffer = vec![0.0; 200];
        buffer[0] = 1.5; // dimension 0, node (0, 0)
        buffer[23] = 2.5; // dimension 0, node (3, 2)
        buffer[100] = -4.0; // dimension 1, node (0, 0)

        let mut transform = BSplineTransform::<2>::new(grid_10x10());
        transform.set_parameters(&buffer).unwrap();

        let grid0 = transform.coefficient_grid(0).unwrap();
        assert_eq!(grid0.shape(), &[10, 10]);
        assert_eq!(grid0[[0, 0]], 1.5);
        assert_eq!(grid0[[3, 2]], 2.5);

        let grid1 = transform.coefficient_grid(1).unwrap();
        assert_eq!(grid1[[0, 0]], -4.0);
    }

    #[test]
    fn test_set_coefficient_grids_packs_dimension_major() {
        let mut transform = BSplineTransform::<2>::new(grid_10x10());

        let mut grid0 = ArrayD::zeros(IxDyn(&[10, 10]));
        grid0[[3, 2]] = 7.0;
        let mut grid1 = ArrayD::zeros(IxDyn(&[10, 10]));
        grid1[[1, 0]] = -2.0;

        transform.set_coefficient_grids(&[grid0, grid1]).unwrap();
        let buffer = transform.parameters().unwrap();
        assert_eq!(buffer[23], 7.0); // 3 + 2 * 10
        assert_eq!(buffer[101], -2.0); // 100 + 1

        let bad = ArrayD::zeros(IxDyn(&[5, 5]));
        let err = transform
            .set_coefficient_grids(&[bad, ArrayD::zeros(IxDyn(&[10, 10]))])
            .unwrap_err();
        assert!(matches!(err, TransformError::GridShapeMismatch { .. }));
    }

    #[test]
    fn test_display_summary() {
        let mut transform = BSplineTransform::<2>::new(grid_10x10());
        let unset = format!("{transform}");
        assert!(unset.contains("200 parameters"));
        assert!(unset.contains("unset"));

        transform.set_identity();
        assert!(format!("{transform}").contains("owned"));
    }
}
