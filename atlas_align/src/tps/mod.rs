//! Weighted thin-plate spline (TPS) deformation.
//!
//! Smooth RBF interpolation that minimizes bending energy:
//!
//! ```text
//! f(x,y) = a₀ + a₁x + a₂y + Σᵢ wᵢ U(||(x,y) - (xᵢ,yᵢ)||)
//! ```
//!
//! where U(r) = r² log(r). Each control point carries a fit weight; with
//! non-zero regularization the kernel diagonal gets `λ / weightᵢ`, so heavy
//! points are followed closely and light ones may be smoothed over.
//!
//! Control points are normalized to roughly [-1, 1]² before solving, which
//! keeps the kernel block well conditioned for pixel-scale coordinates.

#[cfg(test)]
mod tests;

use glam::DVec2;
use serde::{Deserialize, Serialize};

pub use crate::config::TpsConfig;
use crate::correspondence::CorrespondenceSet;
use crate::error::{RegistrationError, Result};
use crate::transform::PointTransform;

/// Pivot magnitude below which the system is treated as singular.
const PIVOT_EPSILON: f64 = 1e-12;

/// Smallest normalized triangle area (twice) that counts as non-collinear.
const COLLINEAR_EPSILON: f64 = 1e-9;

/// Similarity that maps source coordinates into the solver's frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Normalization {
    center: DVec2,
    scale: f64,
}

impl Normalization {
    /// Bounding-box centre and larger half extent of `points`.
    fn from_points(points: &[DVec2]) -> Result<Self> {
        let (min, max) = points.iter().fold(
            (DVec2::splat(f64::INFINITY), DVec2::splat(f64::NEG_INFINITY)),
            |(min, max), &p| (min.min(p), max.max(p)),
        );
        let scale = ((max - min) * 0.5).max_element();
        if !scale.is_finite() || scale <= f64::EPSILON {
            return Err(RegistrationError::singular(
                "control points are coincident or not finite",
            ));
        }
        Ok(Self {
            center: (min + max) * 0.5,
            scale,
        })
    }

    #[inline]
    fn apply(&self, p: DVec2) -> DVec2 {
        (p - self.center) / self.scale
    }

    #[inline]
    fn invert(&self, p: DVec2) -> DVec2 {
        p * self.scale + self.center
    }
}

/// Thin-plate spline mapping source points onto target points.
///
/// Coefficients are stored as solved, so a deserialized spline evaluates
/// exactly like the one that was saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinPlateSpline {
    normalization: Normalization,
    /// Control points in the normalized frame.
    control_points: Vec<DVec2>,
    /// RBF weight per control point, x and y output components.
    rbf_weights: Vec<DVec2>,
    /// Affine part `a₀ + a₁x + a₂y` per output component, in the normalized
    /// input frame.
    affine: [DVec2; 3],
}

impl ThinPlateSpline {
    /// Fit from a correspondence set: `source` side to `target` side, one
    /// weight per pair.
    pub fn fit(set: &CorrespondenceSet, weights: &[f64], config: TpsConfig) -> Result<Self> {
        Self::fit_points(set.source(), set.target(), weights, config)
    }

    /// Fit from parallel point slices.
    ///
    /// Fails with `SingularSystem` for fewer than 3 points, collinear or
    /// duplicate control points (the latter only without regularization),
    /// and for missing or non-positive weights.
    pub fn fit_points(
        source_points: &[DVec2],
        target_points: &[DVec2],
        weights: &[f64],
        config: TpsConfig,
    ) -> Result<Self> {
        let n = source_points.len();
        if n < 3 {
            return Err(RegistrationError::singular(format!(
                "need at least 3 control points, got {n}"
            )));
        }
        if target_points.len() != n {
            return Err(RegistrationError::LengthMismatch {
                reference: n,
                section: target_points.len(),
            });
        }
        if weights.len() != n {
            return Err(RegistrationError::singular(format!(
                "got {} weights for {n} control points",
                weights.len()
            )));
        }
        if let Some(bad) = weights.iter().find(|w| !(w.is_finite() && **w > 0.0)) {
            return Err(RegistrationError::singular(format!(
                "weights must be positive, got {bad}"
            )));
        }

        let normalization = Normalization::from_points(source_points)?;
        let points: Vec<DVec2> = source_points
            .iter()
            .map(|&p| normalization.apply(p))
            .collect();
        if are_collinear(&points) {
            return Err(RegistrationError::singular("control points are collinear"));
        }

        // [K + Λ  P] [w]   [v]
        // [Pᵀ     0] [a] = [0]
        //
        // K[i,j] = U(|p_i - p_j|), Λ[i,i] = λ / weight_i, P[i,:] = [1, x_i, y_i]
        let size = n + 3;
        let mut matrix = vec![0.0; size * size];
        for i in 0..n {
            let row = &mut matrix[i * size..(i + 1) * size];
            for j in 0..n {
                row[j] = if i == j {
                    config.regularization / weights[i]
                } else {
                    tps_kernel(points[i].distance(points[j]))
                };
            }
            let p = points[i];
            row[n] = 1.0;
            row[n + 1] = p.x;
            row[n + 2] = p.y;

            matrix[n * size + i] = 1.0;
            matrix[(n + 1) * size + i] = p.x;
            matrix[(n + 2) * size + i] = p.y;
        }

        let lu = LuDecomposition::factor(matrix, size)?;

        let mut rhs_x = vec![0.0; size];
        let mut rhs_y = vec![0.0; size];
        for (i, t) in target_points.iter().enumerate() {
            rhs_x[i] = t.x;
            rhs_y[i] = t.y;
        }
        let solution_x = lu.solve(&rhs_x);
        let solution_y = lu.solve(&rhs_y);

        let rbf_weights = solution_x[..n]
            .iter()
            .zip(&solution_y[..n])
            .map(|(&wx, &wy)| DVec2::new(wx, wy))
            .collect();
        let affine = [
            DVec2::new(solution_x[n], solution_y[n]),
            DVec2::new(solution_x[n + 1], solution_y[n + 1]),
            DVec2::new(solution_x[n + 2], solution_y[n + 2]),
        ];

        let tps = Self {
            normalization,
            control_points: points,
            rbf_weights,
            affine,
        };
        tracing::debug!(
            control_points = n,
            regularization = config.regularization,
            bending_energy = tps.bending_energy(),
            "Fitted thin-plate spline"
        );
        Ok(tps)
    }

    /// Evaluate the spline at `p`.
    pub fn transform(&self, p: DVec2) -> DVec2 {
        let q = self.normalization.apply(p);
        let mut out = self.affine[0] + self.affine[1] * q.x + self.affine[2] * q.y;
        for (cp, w) in self.control_points.iter().zip(&self.rbf_weights) {
            out += *w * tps_kernel(q.distance(*cp));
        }
        out
    }

    pub fn transform_points(&self, points: &[DVec2]) -> Vec<DVec2> {
        points.iter().map(|&p| self.transform(p)).collect()
    }

    /// Bending energy of the non-affine part, in the normalized frame.
    ///
    /// Lower values mean a smoother warp; zero for a purely affine fit.
    pub fn bending_energy(&self) -> f64 {
        let n = self.control_points.len();
        let mut energy = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                let u = tps_kernel(self.control_points[i].distance(self.control_points[j]));
                energy += 2.0 * u * self.rbf_weights[i].dot(self.rbf_weights[j]);
            }
        }
        energy
    }

    pub fn num_control_points(&self) -> usize {
        self.control_points.len()
    }

    /// Control points in input coordinates.
    pub fn control_points(&self) -> Vec<DVec2> {
        self.control_points
            .iter()
            .map(|&p| self.normalization.invert(p))
            .collect()
    }

    /// Distance between each transformed control point and its target.
    ///
    /// Zero (up to rounding) without regularization.
    pub fn compute_residuals(&self, target_points: &[DVec2]) -> Vec<f64> {
        self.control_points()
            .into_iter()
            .zip(target_points)
            .map(|(src, tgt)| self.transform(src).distance(*tgt))
            .collect()
    }
}

impl PointTransform for ThinPlateSpline {
    #[inline]
    fn apply(&self, p: DVec2) -> DVec2 {
        self.transform(p)
    }
}

/// TPS radial basis function: U(r) = r² log(r), with U(0) = 0.
#[inline]
pub(crate) fn tps_kernel(r: f64) -> f64 {
    if r < 1e-10 { 0.0 } else { r * r * r.ln() }
}

/// Whether every point lies on one line through `points[0]`.
fn are_collinear(points: &[DVec2]) -> bool {
    let origin = points[0];
    let Some(far) = points
        .iter()
        .map(|&p| p - origin)
        .max_by(|a, b| a.length_squared().total_cmp(&b.length_squared()))
    else {
        return true;
    };
    let Some(dir) = far.try_normalize() else {
        return true;
    };
    points
        .iter()
        .all(|&p| dir.perp_dot(p - origin).abs() < COLLINEAR_EPSILON)
}

/// LU factorization with partial pivoting of a dense row-major matrix.
struct LuDecomposition {
    size: usize,
    lu: Vec<f64>,
    permutation: Vec<usize>,
}

impl LuDecomposition {
    #[allow(clippy::needless_range_loop)]
    fn factor(mut lu: Vec<f64>, size: usize) -> Result<Self> {
        debug_assert_eq!(lu.len(), size * size);
        let mut permutation: Vec<usize> = (0..size).collect();

        for col in 0..size {
            let (pivot_row, pivot_abs) = (col..size)
                .map(|row| (row, lu[row * size + col].abs()))
                .fold((col, -1.0), |best, cur| if cur.1 > best.1 { cur } else { best });

            if !(pivot_abs >= PIVOT_EPSILON) {
                return Err(RegistrationError::singular(format!(
                    "pivot {pivot_abs:.3e} in column {col} (duplicate control points?)"
                )));
            }

            if pivot_row != col {
                for j in 0..size {
                    lu.swap(col * size + j, pivot_row * size + j);
                }
                permutation.swap(col, pivot_row);
            }

            let pivot = lu[col * size + col];
            for row in (col + 1)..size {
                let factor = lu[row * size + col] / pivot;
                lu[row * size + col] = factor;
                if factor != 0.0 {
                    for j in (col + 1)..size {
                        lu[row * size + j] -= factor * lu[col * size + j];
                    }
                }
            }
        }

        Ok(Self {
            size,
            lu,
            permutation,
        })
    }

    fn solve(&self, b: &[f64]) -> Vec<f64> {
        let n = self.size;
        let mut x: Vec<f64> = self.permutation.iter().map(|&p| b[p]).collect();

        // Forward substitution with the unit lower triangle.
        for i in 0..n {
            let row = &self.lu[i * n..i * n + i];
            let sum: f64 = row.iter().zip(&x[..i]).map(|(l, xj)| l * xj).sum();
            x[i] -= sum;
        }
        // Back substitution with the upper triangle.
        for i in (0..n).rev() {
            let row = &self.lu[i * n + i + 1..(i + 1) * n];
            let sum: f64 = row.iter().zip(&x[i + 1..]).map(|(u, xj)| u * xj).sum();
            x[i] = (x[i] - sum) / self.lu[i * n + i];
        }
        x
    }
}
