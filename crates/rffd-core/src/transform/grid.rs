//! Control-point grid geometry.
//!
//! This module describes the regular lattice a free-form deformation is
//! defined over: per-axis size, origin, spacing and orientation, shared by
//! every output dimension of the transform.

use nalgebra::{SMatrix, SVector};

use crate::error::{Result, TransformError};
use crate::spatial::{Direction, Point, Spacing, Vector};

/// Geometry of the control-point lattice.
///
/// Packs and unpacks to a fixed-length descriptor vector of `D * (D + 3)`
/// values, grouped `[D sizes][D origin][D spacing][D*D direction, row-major]`
/// — the persistence contract for transform-domain round-tripping.
///
/// The index-to-physical mapping and its inverse are precomputed at
/// construction; a geometry with a singular direction matrix cannot be built.
#[derive(Debug, Clone, PartialEq)]
pub struct GridGeometry<const D: usize> {
    size: [usize; D],
    origin: Point<D>,
    spacing: Spacing<D>,
    direction: Direction<D>,
    index_to_physical: SMatrix<f64, D, D>,
    physical_to_index: SMatrix<f64, D, D>,
}

impl<const D: usize> GridGeometry<D> {
    /// Length of the geometry descriptor vector.
    pub const DESCRIPTOR_LEN: usize = D * (D + 3);

    /// Create a new grid geometry.
    ///
    /// Fails with [`TransformError::SingularDirection`] when the combined
    /// direction/spacing mapping cannot be inverted (zero spacing or a
    /// rank-deficient direction matrix).
    pub fn new(
        size: [usize; D],
        origin: Point<D>,
        spacing: Spacing<D>,
        direction: Direction<D>,
    ) -> Result<Self> {
        let mut scaled = *direction.inner();
        for c in 0..D {
            for r in 0..D {
                scaled[(r, c)] *= spacing[c];
            }
        }
        let physical_to_index = scaled.try_inverse().ok_or(TransformError::SingularDirection)?;

        Ok(Self {
            size,
            origin,
            spacing,
            direction,
            index_to_physical: scaled,
            physical_to_index,
        })
    }

    /// Unpack a geometry from its fixed-length descriptor.
    pub fn from_descriptor(descriptor: &[f64]) -> Result<Self> {
        if descriptor.len() != Self::DESCRIPTOR_LEN {
            return Err(TransformError::DescriptorSizeMismatch {
                expected: Self::DESCRIPTOR_LEN,
                actual: descriptor.len(),
            });
        }

        let size = std::array::from_fn(|j| descriptor[j].round() as usize);
        let origin = Point::from_slice(&descriptor[D..2 * D]);
        let spacing = Spacing::from_slice(&descriptor[2 * D..3 * D]);
        let direction = Direction::from_row_major(&descriptor[3 * D..]);

        Self::new(size, origin, spacing, direction)
    }

    /// Pack the geometry into its fixed-length descriptor.
    pub fn to_descriptor(&self) -> Vec<f64> {
        let mut descriptor = Vec::with_capacity(Self::DESCRIPTOR_LEN);
        descriptor.extend(self.size.iter().map(|&s| s as f64));
        descriptor.extend(self.origin.to_vec());
        descriptor.extend(self.spacing.to_vec());
        descriptor.extend(self.direction.to_row_major());
        descriptor
    }

    /// Number of lattice nodes (product of per-axis sizes).
    pub fn num_lattice_nodes(&self) -> usize {
        self.size.iter().product()
    }

    /// Per-axis grid size.
    pub fn size(&self) -> [usize; D] {
        self.size
    }

    /// Physical coordinate of lattice node (0, 0, ...).
    pub fn origin(&self) -> &Point<D> {
        &self.origin
    }

    /// Physical distance between adjacent nodes along each axis.
    pub fn spacing(&self) -> &Spacing<D> {
        &self.spacing
    }

    /// Orientation of the grid axes.
    pub fn direction(&self) -> &Direction<D> {
        &self.direction
    }

    /// Map a physical point to a continuous lattice coordinate.
    pub fn continuous_index(&self, point: &Point<D>) -> [f64; D] {
        let offset = *point - self.origin;
        let index = self.physical_to_index * offset.inner();
        std::array::from_fn(|j| index[j])
    }

    /// Map a continuous lattice coordinate back to a physical point.
    pub fn index_to_point(&self, index: &[f64; D]) -> Point<D> {
        let offset = self.index_to_physical * SVector::from(*index);
        self.origin + Vector(offset)
    }

    /// Flat offset of a lattice node within one coefficient grid.
    ///
    /// Axis 0 varies fastest: `flat = node[0] + node[1] * size[0] + ...`.
    pub fn flat_offset(&self, node: &[usize]) -> usize {
        debug_assert_eq!(node.len(), D);
        let mut flat = 0;
        let mut stride = 1;
        for j in 0..D {
            flat += node[j] * stride;
            stride *= self.size[j];
        }
        flat
    }
}
