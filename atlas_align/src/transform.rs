//! 2D point transforms.
//!
//! [`PointTransform`] is the seam through which callers hand the core a
//! mapping between coordinate frames (for example the reference slice into
//! the section's local frame), and through which images are resampled.

use glam::{DAffine2, DMat2, DVec2};
use serde::{Deserialize, Serialize};

/// Anything that maps a 2D point to another 2D point.
pub trait PointTransform {
    fn apply(&self, p: DVec2) -> DVec2;

    fn apply_all(&self, points: &[DVec2]) -> Vec<DVec2> {
        points.iter().map(|&p| self.apply(p)).collect()
    }
}

impl<T: PointTransform + ?Sized> PointTransform for &T {
    fn apply(&self, p: DVec2) -> DVec2 {
        (**self).apply(p)
    }
}

/// 2D affine transform.
///
/// Stored row-major:
/// ```text
/// | a  b  tx |   | c[0] c[1] c[2] |
/// | c  d  ty | = | c[3] c[4] c[5] |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affine2D {
    coefficients: [f64; 6],
}

impl Default for Affine2D {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::fmt::Display for Affine2D {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let t = self.translation_components();
        write!(
            f,
            "Affine(dx={:.2}, dy={:.2}, rot={:.3}°, scale={:.4})",
            t.x,
            t.y,
            self.rotation_angle().to_degrees(),
            self.scale_factor()
        )
    }
}

impl Affine2D {
    /// Create identity transform.
    pub const fn identity() -> Self {
        Self {
            coefficients: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        }
    }

    /// Create from 6 parameters [a, b, tx, c, d, ty].
    pub const fn from_coefficients(coefficients: [f64; 6]) -> Self {
        Self { coefficients }
    }

    /// Create translation transform.
    pub fn translation(t: DVec2) -> Self {
        Self::from_coefficients([1.0, 0.0, t.x, 0.0, 1.0, t.y])
    }

    /// Create similarity transform (translation + rotation + uniform scale).
    pub fn similarity(t: DVec2, angle: f64, scale: f64) -> Self {
        let cos_a = angle.cos() * scale;
        let sin_a = angle.sin() * scale;
        Self::from_coefficients([cos_a, -sin_a, t.x, sin_a, cos_a, t.y])
    }

    /// Create rotation transform around a specified center point.
    pub fn rotation_around(center: DVec2, angle: f64) -> Self {
        let cos_a = angle.cos();
        let sin_a = angle.sin();
        // T(c) * R(angle) * T(-c)
        let tx = center.x - cos_a * center.x + sin_a * center.y;
        let ty = center.y - sin_a * center.x - cos_a * center.y;
        Self::from_coefficients([cos_a, -sin_a, tx, sin_a, cos_a, ty])
    }

    /// Create a pure scale about the origin.
    pub fn scale(s: DVec2) -> Self {
        Self::from_coefficients([s.x, 0.0, 0.0, 0.0, s.y, 0.0])
    }

    pub const fn coefficients(&self) -> &[f64; 6] {
        &self.coefficients
    }

    pub fn to_daffine2(&self) -> DAffine2 {
        let c = &self.coefficients;
        DAffine2 {
            matrix2: DMat2::from_cols(DVec2::new(c[0], c[3]), DVec2::new(c[1], c[4])),
            translation: DVec2::new(c[2], c[5]),
        }
    }

    pub fn from_daffine2(affine: DAffine2) -> Self {
        let m = affine.matrix2;
        let t = affine.translation;
        Self::from_coefficients([m.x_axis.x, m.y_axis.x, t.x, m.x_axis.y, m.y_axis.y, t.y])
    }

    pub fn determinant(&self) -> f64 {
        let c = &self.coefficients;
        c[0] * c[4] - c[1] * c[3]
    }

    /// Whether the linear part mirrors the plane.
    pub fn is_reflection(&self) -> bool {
        self.determinant() < 0.0
    }

    /// Matrix inverse, or `None` when the transform is degenerate.
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < 1e-10 {
            return None;
        }
        Some(Self::from_daffine2(self.to_daffine2().inverse()))
    }

    /// Compose two transforms: self * other (apply other first, then self).
    pub fn compose(&self, other: &Self) -> Self {
        Self::from_daffine2(self.to_daffine2() * other.to_daffine2())
    }

    /// Extract translation components as DVec2.
    pub fn translation_components(&self) -> DVec2 {
        DVec2::new(self.coefficients[2], self.coefficients[5])
    }

    /// Extract rotation angle in radians (valid for similarity transforms).
    pub fn rotation_angle(&self) -> f64 {
        self.coefficients[3].atan2(self.coefficients[0])
    }

    /// Extract scale factor (valid for similarity transforms).
    pub fn scale_factor(&self) -> f64 {
        let a = self.coefficients[0];
        let c = self.coefficients[3];
        (a * a + c * c).sqrt()
    }
}

impl PointTransform for Affine2D {
    fn apply(&self, p: DVec2) -> DVec2 {
        let c = &self.coefficients;
        DVec2::new(
            c[0] * p.x + c[1] * p.y + c[2],
            c[3] * p.x + c[4] * p.y + c[5],
        )
    }
}
