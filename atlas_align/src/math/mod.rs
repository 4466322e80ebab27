//! Small numeric helpers shared by the registration stages.

mod affine3;
pub(crate) mod polygon;
pub(crate) mod statistics;

pub use affine3::AffineTransform3D;
