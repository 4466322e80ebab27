//! Planar slice through the atlas volume.

use std::fmt;

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

use crate::math::AffineTransform3D;

/// Anatomical plane the sections are cut in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaneOfSection {
    /// Constant z.
    #[default]
    Coronal,
    /// Constant x.
    Sagittal,
    /// Constant y.
    Horizontal,
}

impl PlaneOfSection {
    /// Volume axis held constant within one section (0 = x, 1 = y, 2 = z).
    pub fn held_axis(&self) -> usize {
        match self {
            PlaneOfSection::Coronal => 2,
            PlaneOfSection::Sagittal => 0,
            PlaneOfSection::Horizontal => 1,
        }
    }

    /// Volume axes that the section image's x and y run along.
    pub fn in_plane_axes(&self) -> (DVec3, DVec3) {
        match self {
            PlaneOfSection::Coronal => (DVec3::X, DVec3::Y),
            PlaneOfSection::Sagittal => (DVec3::Z, DVec3::Y),
            PlaneOfSection::Horizontal => (DVec3::X, DVec3::Z),
        }
    }
}

impl fmt::Display for PlaneOfSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlaneOfSection::Coronal => "coronal",
            PlaneOfSection::Sagittal => "sagittal",
            PlaneOfSection::Horizontal => "horizontal",
        })
    }
}

/// Voxel edge lengths in physical units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoxelResolution {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl VoxelResolution {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub const fn isotropic(size: f64) -> Self {
        Self::new(size, size, size)
    }

    pub fn as_dvec3(&self) -> DVec3 {
        DVec3::new(self.x, self.y, self.z)
    }

    /// Physical position of a voxel-space point.
    pub fn to_physical(&self, voxel: DVec3) -> DVec3 {
        voxel * self.as_dvec3()
    }
}

impl Default for VoxelResolution {
    fn default() -> Self {
        Self::isotropic(1.0)
    }
}

impl fmt::Display for VoxelResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {} x {}", self.x, self.y, self.z)
    }
}

/// A plane in voxel space: `origin + u * px + v * py` is the volume position
/// of section pixel `(px, py)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeSection {
    pub origin: DVec3,
    pub u: DVec3,
    pub v: DVec3,
}

impl VolumeSection {
    pub fn new(origin: DVec3, u: DVec3, v: DVec3) -> Self {
        Self { origin, u, v }
    }

    /// Axis-aligned slice number `index` of `plane`.
    pub fn from_plane(plane: PlaneOfSection, index: f64) -> Self {
        let (u, v) = plane.in_plane_axes();
        let mut origin = DVec3::ZERO;
        origin[plane.held_axis()] = index;
        Self { origin, u, v }
    }

    pub fn point_at(&self, pixel: DVec2) -> DVec3 {
        self.origin + self.u * pixel.x + self.v * pixel.y
    }

    /// Unit normal `u × v`, or zero for a degenerate plane.
    pub fn normal(&self) -> DVec3 {
        self.u.cross(self.v).normalize_or_zero()
    }

    /// The plane after `transform`: the origin moves as a point, the basis
    /// vectors as directions.
    pub fn transformed(&self, transform: &AffineTransform3D) -> Self {
        Self {
            origin: transform.apply_point(self.origin),
            u: transform.apply_vector(self.u),
            v: transform.apply_vector(self.v),
        }
    }
}

impl Default for VolumeSection {
    fn default() -> Self {
        Self::from_plane(PlaneOfSection::default(), 0.0)
    }
}
