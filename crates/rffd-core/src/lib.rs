pub mod error;
pub mod interpolation;
pub mod spatial;
pub mod support;
pub mod transform;

pub use error::{Result, TransformError};
pub use interpolation::{BSplineWeightsFunction, WeightsFunction};
pub use spatial::{Direction, Point, Spacing, Vector};
pub use support::SupportRegion;
pub use transform::{BSplineTransform, GridGeometry, ParameterOwnership, SupportJacobian, Transform};
