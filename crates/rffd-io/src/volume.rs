//! Scalar image volume paired with its grid geometry.

use anyhow::Result;
use ndarray::ArrayD;
use rffd_core::spatial::{Direction, Point, Spacing};
use rffd_core::transform::GridGeometry;

/// A 3D scalar volume and the geometry placing it in physical space.
///
/// The geometry's per-axis size always equals the data shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageVolume {
    data: ArrayD<f64>,
    geometry: GridGeometry<3>,
}

impl ImageVolume {
    /// Create a volume, deriving the geometry's size from the data shape.
    pub fn new(
        data: ArrayD<f64>,
        origin: Point<3>,
        spacing: Spacing<3>,
        direction: Direction<3>,
    ) -> Result<Self> {
        let shape = data.shape();
        if shape.len() != 3 {
            anyhow::bail!("Expected a 3D volume, found {} dimensions", shape.len());
        }
        let size = [shape[0], shape[1], shape[2]];
        let geometry = GridGeometry::new(size, origin, spacing, direction)?;
        Ok(Self { data, geometry })
    }

    /// The voxel data, indexed `[x, y, z]`.
    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    /// The grid geometry of the volume.
    pub fn geometry(&self) -> &GridGeometry<3> {
        &self.geometry
    }
}
