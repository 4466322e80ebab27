//! 3D affine map persisted as its flattened row-major coefficients.

use glam::{DAffine3, DMat3, DVec3};
use serde::{Deserialize, Serialize};

/// 3D affine transform.
///
/// Stored row-major including translation:
/// ```text
/// | c[0] c[1] c[2]  c[3]  |   | m00 m01 m02 tx |
/// | c[4] c[5] c[6]  c[7]  | = | m10 m11 m12 ty |
/// | c[8] c[9] c[10] c[11] |   | m20 m21 m22 tz |
/// ```
/// Arithmetic is delegated to [`DAffine3`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform3D {
    coefficients: [f64; 12],
}

impl Default for AffineTransform3D {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform3D {
    pub const fn identity() -> Self {
        Self {
            coefficients: [
                1.0, 0.0, 0.0, 0.0, //
                0.0, 1.0, 0.0, 0.0, //
                0.0, 0.0, 1.0, 0.0,
            ],
        }
    }

    pub const fn from_coefficients(coefficients: [f64; 12]) -> Self {
        Self { coefficients }
    }

    pub fn translation(t: DVec3) -> Self {
        Self::from_daffine3(DAffine3::from_translation(t))
    }

    pub fn scale(s: DVec3) -> Self {
        Self::from_daffine3(DAffine3::from_scale(s))
    }

    /// Row-major coefficients, translation included.
    pub const fn coefficients(&self) -> &[f64; 12] {
        &self.coefficients
    }

    pub fn to_daffine3(&self) -> DAffine3 {
        let c = &self.coefficients;
        DAffine3 {
            matrix3: DMat3::from_cols(
                DVec3::new(c[0], c[4], c[8]),
                DVec3::new(c[1], c[5], c[9]),
                DVec3::new(c[2], c[6], c[10]),
            ),
            translation: DVec3::new(c[3], c[7], c[11]),
        }
    }

    pub fn from_daffine3(affine: DAffine3) -> Self {
        let m = affine.matrix3;
        let t = affine.translation;
        Self {
            coefficients: [
                m.x_axis.x, m.y_axis.x, m.z_axis.x, t.x, //
                m.x_axis.y, m.y_axis.y, m.z_axis.y, t.y, //
                m.x_axis.z, m.y_axis.z, m.z_axis.z, t.z,
            ],
        }
    }

    pub fn apply_point(&self, p: DVec3) -> DVec3 {
        self.to_daffine3().transform_point3(p)
    }

    /// Apply the linear part only (no translation).
    pub fn apply_vector(&self, v: DVec3) -> DVec3 {
        self.to_daffine3().transform_vector3(v)
    }

    pub fn determinant(&self) -> f64 {
        self.to_daffine3().matrix3.determinant()
    }

    /// Inverse map, or `None` when the linear part is singular.
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < 1e-12 {
            return None;
        }
        Some(Self::from_daffine3(self.to_daffine3().inverse()))
    }

    /// Compose two transforms: `self * other` (apply `other` first, then `self`).
    pub fn compose(&self, other: &Self) -> Self {
        Self::from_daffine3(self.to_daffine3() * other.to_daffine3())
    }
}
